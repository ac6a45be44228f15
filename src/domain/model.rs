use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type PackageId = String;
pub type GroupId = String;

/// Snapshot returned by one successful probe of a server address.
///
/// Every field is optional on the wire: an endpoint that answers is
/// reachable even when the body leaves out its identity or version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub locked: bool,
}

/// Connection state shown next to the server address field.
///
/// `None` means "not determined yet". Flags only become `Some` after a
/// completed, non-cancelled probe. `loading` is cosmetic and may lag behind
/// the flags by the loading hold delay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidityStatus {
    pub loading: bool,
    pub is_valid_server: Option<bool>,
    pub is_valid_version: Option<bool>,
    pub is_reachable: Option<bool>,
    pub is_locked: Option<bool>,
    pub version: Option<String>,
    pub checked_at: Option<DateTime<Utc>>,
}

impl ValidityStatus {
    /// Fresh status for an address whose probe is about to run.
    pub fn probing() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    pub fn overall_valid(&self) -> bool {
        self.is_valid_server == Some(true)
            && self.is_valid_version == Some(true)
            && self.is_reachable == Some(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: PackageId,
    pub name: String,
    #[serde(rename = "foreignWordLanguage")]
    pub foreign_language: String,
    #[serde(rename = "translatedWordLanguage")]
    pub translated_language: String,
    #[serde(rename = "Groups", default)]
    pub groups: Vec<Group>,
}

impl Package {
    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn contains_group(&self, id: &str) -> bool {
        self.group(id).is_some()
    }
}

/// The chosen (package, group) pair of a dependent two-level picker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub package_id: Option<PackageId>,
    pub group_id: Option<GroupId>,
}

impl Selection {
    pub fn new(package_id: Option<&str>, group_id: Option<&str>) -> Self {
        Self {
            package_id: package_id.map(str::to_string),
            group_id: group_id.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPackage {
    pub name: String,
    #[serde(rename = "foreignWordLanguage")]
    pub foreign_language: String,
    #[serde(rename = "translatedWordLanguage")]
    pub translated_language: String,
    #[serde(rename = "vocabsPerDay")]
    pub vocabs_per_day: u32,
    #[serde(rename = "rightWords")]
    pub right_words: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGroup {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// Local field state of the vocabulary form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabDraft {
    pub foreign_word: String,
    pub translations: Vec<String>,
    pub description: String,
    pub active: bool,
    pub activate: bool,
}

impl Default for VocabDraft {
    fn default() -> Self {
        Self {
            foreign_word: String::new(),
            translations: vec![String::new()],
            description: String::new(),
            active: true,
            activate: true,
        }
    }
}

impl VocabDraft {
    /// Foreign word and at least one translation.
    pub fn required_fields_filled(&self) -> bool {
        !self.foreign_word.trim().is_empty()
            && self.translations.iter().any(|t| !t.trim().is_empty())
    }

    /// Clears the text fields and keeps the toggles.
    pub fn clear_text(&mut self) {
        self.foreign_word.clear();
        self.translations = vec![String::new()];
        self.description.clear();
    }

    /// Prefills the fields from a stored vocabulary for editing.
    pub fn from_vocabulary(vocabulary: &Vocabulary) -> Self {
        let mut translations: Vec<String> = vocabulary
            .translations
            .iter()
            .map(|t| t.name.clone())
            .collect();
        if translations.is_empty() {
            translations.push(String::new());
        }
        Self {
            foreign_word: vocabulary.name.clone(),
            translations,
            description: vocabulary.description.clone().unwrap_or_default(),
            active: vocabulary.active,
            activate: true,
        }
    }

    pub fn to_new_vocabulary(&self) -> NewVocabulary {
        NewVocabulary {
            name: self.foreign_word.trim().to_string(),
            translations: self
                .translations
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(|t| TranslationInput { name: t.to_string() })
                .collect(),
            description: self.description.clone(),
            active: self.active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationInput {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVocabulary {
    pub name: String,
    pub translations: Vec<TranslationInput>,
    pub description: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(rename = "Translations", default)]
    pub translations: Vec<TranslationInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A short user-facing message, the equivalent of a snackbar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}
