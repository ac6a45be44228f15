//! Pure "can submit" derivations. Always computed from current inputs,
//! never from a previous result.

use crate::domain::model::{Selection, ValidityStatus};

pub fn can_submit(required_fields_filled: bool, selection: &Selection, can_save: bool) -> bool {
    required_fields_filled
        && selection.package_id.is_some()
        && selection.group_id.is_some()
        && can_save
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionForm {
    pub self_hosted: bool,
    pub server_address: String,
    pub email: String,
    pub password: String,
}

/// Sign-in gate. A self-hosted server needs an address.
pub fn can_connect(form: &ConnectionForm, status: &ValidityStatus) -> bool {
    if form.self_hosted && form.server_address.trim().is_empty() {
        return false;
    }
    !form.email.is_empty() && !form.password.is_empty() && status.overall_valid()
}

#[derive(Debug, Clone)]
pub struct PackageDraft {
    pub name: String,
    pub foreign_language: Option<String>,
    pub translated_language: Option<String>,
    pub vocabs_per_day: u32,
    pub right_words: u32,
}

impl Default for PackageDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            foreign_language: None,
            translated_language: None,
            vocabs_per_day: 100,
            right_words: 2,
        }
    }
}

pub fn can_save_package(draft: &PackageDraft) -> bool {
    !draft.name.trim().is_empty()
        && draft.foreign_language.is_some()
        && draft.translated_language.is_some()
        && draft.vocabs_per_day >= 1
        && draft.right_words >= 1
}
