use async_trait::async_trait;
use httpmock::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vocab_sync::config::toml_config::FormConfig;
use vocab_sync::domain::model::{
    Group, NewGroup, NewPackage, NewVocabulary, Notice, NoticeLevel, Package, Selection,
    TranslationInput, Vocabulary,
};
use vocab_sync::domain::ports::{Notifier, PackageRepository};
use vocab_sync::{LogNotifier, Result, SyncError, VocabForm, VocascanClient};

#[derive(Default)]
struct InMemoryRepository {
    packages: Mutex<Vec<Package>>,
    created_vocabulary: Mutex<Vec<(String, String, NewVocabulary, bool)>>,
    modified_vocabulary: Mutex<Vec<(String, NewVocabulary)>>,
    fail_fetch: Mutex<bool>,
    fail_create_vocabulary: Mutex<bool>,
    next_id: Mutex<u32>,
}

impl InMemoryRepository {
    fn with_packages(packages: Vec<Package>) -> Self {
        Self {
            packages: Mutex::new(packages),
            ..Self::default()
        }
    }

    fn id(&self, prefix: &str) -> String {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        format!("{}{}", prefix, next)
    }

    fn fail(&self, message: &str) -> SyncError {
        SyncError::RequestFailed {
            operation: "fake".to_string(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl PackageRepository for InMemoryRepository {
    async fn fetch_packages(&self, _include_groups: bool) -> Result<Vec<Package>> {
        if *self.fail_fetch.lock().unwrap() {
            return Err(self.fail("server exploded"));
        }
        Ok(self.packages.lock().unwrap().clone())
    }

    async fn create_package(&self, data: &NewPackage) -> Result<Package> {
        let package = Package {
            id: self.id("p"),
            name: data.name.clone(),
            foreign_language: data.foreign_language.clone(),
            translated_language: data.translated_language.clone(),
            groups: Vec::new(),
        };
        self.packages.lock().unwrap().push(package.clone());
        Ok(package)
    }

    async fn modify_package(&self, package_id: &str, data: &NewPackage) -> Result<Package> {
        let mut packages = self.packages.lock().unwrap();
        let package = packages
            .iter_mut()
            .find(|p| p.id == package_id)
            .ok_or_else(|| self.fail("no such package"))?;
        package.name = data.name.clone();
        package.foreign_language = data.foreign_language.clone();
        package.translated_language = data.translated_language.clone();
        // the server answers without the group list
        Ok(Package {
            groups: Vec::new(),
            ..package.clone()
        })
    }

    async fn create_group(&self, package_id: &str, data: &NewGroup) -> Result<Group> {
        let group = Group {
            id: self.id("g"),
            name: data.name.clone(),
            description: data.description.clone(),
        };
        let mut packages = self.packages.lock().unwrap();
        let package = packages
            .iter_mut()
            .find(|p| p.id == package_id)
            .ok_or_else(|| self.fail("no such package"))?;
        package.groups.push(group.clone());
        Ok(group)
    }

    async fn create_vocabulary(
        &self,
        package_id: &str,
        group_id: &str,
        data: &NewVocabulary,
        activate: bool,
    ) -> Result<Vocabulary> {
        if *self.fail_create_vocabulary.lock().unwrap() {
            return Err(self.fail("insert failed"));
        }
        self.created_vocabulary.lock().unwrap().push((
            package_id.to_string(),
            group_id.to_string(),
            data.clone(),
            activate,
        ));
        Ok(Vocabulary {
            id: self.id("v"),
            name: data.name.clone(),
            description: Some(data.description.clone()),
            active: data.active,
            translations: data.translations.clone(),
        })
    }

    async fn modify_vocabulary(
        &self,
        vocabulary_id: &str,
        data: &NewVocabulary,
    ) -> Result<Vocabulary> {
        self.modified_vocabulary
            .lock()
            .unwrap()
            .push((vocabulary_id.to_string(), data.clone()));
        Ok(Vocabulary {
            id: vocabulary_id.to_string(),
            name: data.name.clone(),
            description: Some(data.description.clone()),
            active: data.active,
            translations: data.translations.clone(),
        })
    }
}

#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    fn levels(&self) -> Vec<NoticeLevel> {
        self.notices.lock().unwrap().iter().map(|n| n.level).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

fn group(id: &str) -> Group {
    Group {
        id: id.to_string(),
        name: format!("Group {}", id),
        description: None,
    }
}

fn package(id: &str, groups: &[&str]) -> Package {
    Package {
        id: id.to_string(),
        name: format!("Package {}", id),
        foreign_language: "es".to_string(),
        translated_language: "en".to_string(),
        groups: groups.iter().map(|g| group(g)).collect(),
    }
}

fn new_package(name: &str) -> NewPackage {
    NewPackage {
        name: name.to_string(),
        foreign_language: "fr".to_string(),
        translated_language: "en".to_string(),
        vocabs_per_day: 100,
        right_words: 2,
    }
}

fn fill_draft<R: PackageRepository, N: Notifier>(form: &mut VocabForm<R, N>) {
    form.draft.foreign_word = "perro".to_string();
    form.draft.translations = vec!["dog".to_string(), "  ".to_string()];
    form.draft.description = "animal".to_string();
}

#[tokio::test]
async fn test_selecting_package_and_group_enables_submit() -> anyhow::Result<()> {
    let repository = Arc::new(InMemoryRepository::with_packages(vec![package("1", &["10"])]));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut form = VocabForm::new(Arc::clone(&repository), Arc::clone(&notifier));

    form.refresh().await?;
    form.select_package("1");
    assert_eq!(form.selection().selection(), &Selection::new(Some("1"), None));
    assert!(!form.can_submit());

    form.select_group("10");
    assert_eq!(
        form.selection().selection(),
        &Selection::new(Some("1"), Some("10"))
    );
    // other fields still empty
    assert!(!form.can_submit());

    fill_draft(&mut form);
    assert!(form.can_submit());

    form.set_can_save(false);
    assert!(!form.can_submit());
    form.set_can_save(true);

    let vocabulary = form.submit().await?;
    assert_eq!(vocabulary.name, "perro");

    let created = repository.created_vocabulary.lock().unwrap().clone();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].0, "1");
    assert_eq!(created[0].1, "10");
    assert_eq!(created[0].2.translations.len(), 1);
    assert!(created[0].3);

    // text cleared, selection kept for the next word
    assert!(form.draft.foreign_word.is_empty());
    assert_eq!(
        form.selection().selection(),
        &Selection::new(Some("1"), Some("10"))
    );
    assert_eq!(notifier.levels(), vec![NoticeLevel::Success]);
    Ok(())
}

#[tokio::test]
async fn test_refetch_without_selected_package_clears_selection() -> anyhow::Result<()> {
    let repository = Arc::new(InMemoryRepository::with_packages(vec![package("1", &["10"])]));
    let mut form = VocabForm::new(Arc::clone(&repository), Arc::new(RecordingNotifier::default()));

    form.refresh().await?;
    form.select_package("1");
    form.select_group("10");

    *repository.packages.lock().unwrap() = vec![package("2", &["20"])];
    form.refresh().await?;

    assert_eq!(form.selection().selection(), &Selection::default());
    assert!(form.groups().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_failed_fetch_keeps_collection_and_notifies() -> anyhow::Result<()> {
    let repository = Arc::new(InMemoryRepository::with_packages(vec![package("1", &["10"])]));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut form = VocabForm::new(Arc::clone(&repository), Arc::clone(&notifier));

    form.refresh().await?;
    form.select_package("1");

    *repository.fail_fetch.lock().unwrap() = true;
    let err = form.refresh().await.unwrap_err();

    assert!(matches!(err, SyncError::RequestFailed { .. }));
    assert_eq!(form.packages().len(), 1);
    assert_eq!(form.selection().selection(), &Selection::new(Some("1"), None));
    assert_eq!(notifier.levels(), vec![NoticeLevel::Error]);
    Ok(())
}

#[tokio::test]
async fn test_created_package_and_group_are_selected() -> anyhow::Result<()> {
    let repository = Arc::new(InMemoryRepository::with_packages(vec![package("1", &["10"])]));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut form = VocabForm::new(Arc::clone(&repository), Arc::clone(&notifier));

    form.refresh().await?;
    form.select_package("1");
    form.select_group("10");

    let created = form.create_package(&new_package("French")).await?;
    assert_eq!(
        form.selection().selection(),
        &Selection::new(Some(created.id.as_str()), None)
    );
    assert_eq!(form.packages().len(), 2);

    let group = form
        .create_group(&NewGroup {
            name: "Food".to_string(),
            description: None,
            active: true,
        })
        .await?;
    assert_eq!(
        form.selection().selection(),
        &Selection::new(Some(created.id.as_str()), Some(group.id.as_str()))
    );
    assert_eq!(form.groups().len(), 1);
    assert_eq!(
        notifier.levels(),
        vec![NoticeLevel::Success, NoticeLevel::Success]
    );
    Ok(())
}

#[tokio::test]
async fn test_create_group_without_package_is_blocked() {
    let repository = Arc::new(InMemoryRepository::default());
    let mut form = VocabForm::new(repository, Arc::new(RecordingNotifier::default()));

    let err = form
        .create_group(&NewGroup {
            name: "Orphans".to_string(),
            description: None,
            active: true,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::SubmitBlocked { .. }));
}

#[tokio::test]
async fn test_deep_link_applies_once_packages_arrive() -> anyhow::Result<()> {
    let repository = Arc::new(InMemoryRepository::with_packages(vec![
        package("1", &["10"]),
        package("2", &["20", "21"]),
    ]));
    let mut form = VocabForm::new(repository, Arc::new(RecordingNotifier::default()))
        .with_external_selection("2", Some("21"));

    assert!(form.package_locked());
    assert!(form.group_locked());
    assert_eq!(form.selection().selection(), &Selection::default());

    form.refresh().await?;
    assert_eq!(
        form.selection().selection(),
        &Selection::new(Some("2"), Some("21"))
    );
    assert!(!form.selection().has_pending_external());
    Ok(())
}

#[tokio::test]
async fn test_submit_is_blocked_without_remote_call() {
    let repository = Arc::new(InMemoryRepository::with_packages(vec![package("1", &["10"])]));
    let mut form = VocabForm::new(Arc::clone(&repository), Arc::new(RecordingNotifier::default()));
    fill_draft(&mut form);

    let err = form.submit().await.unwrap_err();
    assert!(matches!(err, SyncError::SubmitBlocked { .. }));
    assert!(repository.created_vocabulary.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_submit_keeps_draft() -> anyhow::Result<()> {
    let repository = Arc::new(InMemoryRepository::with_packages(vec![package("1", &["10"])]));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut form = VocabForm::new(Arc::clone(&repository), Arc::clone(&notifier))
        .with_clear_on_submit(true);

    form.refresh().await?;
    form.select_package("1");
    form.select_group("10");
    fill_draft(&mut form);

    *repository.fail_create_vocabulary.lock().unwrap() = true;
    let err = form.submit().await.unwrap_err();
    assert!(matches!(err, SyncError::RequestFailed { .. }));
    assert_eq!(form.draft.foreign_word, "perro");
    assert_eq!(notifier.levels(), vec![NoticeLevel::Error]);

    form.reset();
    assert_eq!(form.selection().selection(), &Selection::default());
    assert!(!form.can_submit());
    Ok(())
}

#[tokio::test]
async fn test_form_against_http_server() -> anyhow::Result<()> {
    let server = MockServer::start();
    let packages_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/package")
            .query_param("groups", "true");
        then.status(200).json_body(serde_json::json!([
            {
                "id": "p1",
                "name": "Spanish",
                "foreignWordLanguage": "es",
                "translatedWordLanguage": "en",
                "Groups": [{"id": "g1", "name": "Animals"}]
            }
        ]));
    });
    let create_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/package/p1/group/g1/vocabulary")
            .query_param("activate", "true");
        then.status(201)
            .json_body(serde_json::json!({"id": "v9", "name": "gato"}));
    });

    let client = VocascanClient::new(&server.base_url(), Duration::from_secs(5))?;
    let mut form = VocabForm::new(Arc::new(client), Arc::new(LogNotifier));

    form.refresh().await?;
    form.select_package("p1");
    form.select_group("g1");
    form.draft.foreign_word = "gato".to_string();
    form.draft.translations = vec!["cat".to_string()];

    let vocabulary = form.submit().await?;
    packages_mock.assert();
    create_mock.assert();
    assert_eq!(vocabulary.id, "v9");
    Ok(())
}

#[tokio::test]
async fn test_package_picked_before_first_fetch_is_kept() -> anyhow::Result<()> {
    let repository = Arc::new(InMemoryRepository::with_packages(vec![package("1", &["10"])]));
    let mut form = VocabForm::new(Arc::clone(&repository), Arc::new(RecordingNotifier::default()));

    form.select_package("1");
    form.refresh().await?;
    assert_eq!(form.selection().selection(), &Selection::new(Some("1"), None));
    assert_eq!(form.groups().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_form_config_controls_clearing_and_saving() -> anyhow::Result<()> {
    let repository = Arc::new(InMemoryRepository::with_packages(vec![package("1", &["10"])]));
    let config = FormConfig {
        clear_on_submit: false,
        can_save: false,
    };
    let mut form = VocabForm::from_config(
        Arc::clone(&repository),
        Arc::new(RecordingNotifier::default()),
        &config,
    );

    form.refresh().await?;
    form.select_package("1");
    form.select_group("10");
    fill_draft(&mut form);
    assert!(!form.can_submit());

    form.set_can_save(true);
    form.submit().await?;
    assert_eq!(form.draft.foreign_word, "perro");
    Ok(())
}

#[tokio::test]
async fn test_editing_modifies_existing_vocabulary() -> anyhow::Result<()> {
    let repository = Arc::new(InMemoryRepository::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let stored = Vocabulary {
        id: "v3".to_string(),
        name: "casa".to_string(),
        description: Some("building".to_string()),
        active: false,
        translations: vec![TranslationInput {
            name: "house".to_string(),
        }],
    };
    let mut form = VocabForm::editing(Arc::clone(&repository), Arc::clone(&notifier), &stored)
        .with_clear_on_submit(false);

    assert!(form.is_editing());
    assert_eq!(form.draft.foreign_word, "casa");
    assert_eq!(form.draft.translations, vec!["house".to_string()]);
    assert!(!form.draft.active);
    // no package or group needed to edit
    assert!(form.can_submit());

    form.draft.translations.push("home".to_string());
    let updated = form.submit().await?;

    assert_eq!(updated.id, "v3");
    assert_eq!(updated.translations.len(), 2);
    let modified = repository.modified_vocabulary.lock().unwrap().clone();
    assert_eq!(modified.len(), 1);
    assert_eq!(modified[0].0, "v3");
    assert!(repository.created_vocabulary.lock().unwrap().is_empty());
    assert!(form.draft.foreign_word.is_empty());
    assert_eq!(notifier.levels(), vec![NoticeLevel::Success]);
    Ok(())
}

#[tokio::test]
async fn test_updated_package_keeps_selection_and_groups() -> anyhow::Result<()> {
    let repository = Arc::new(InMemoryRepository::with_packages(vec![package("1", &["10"])]));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut form = VocabForm::new(Arc::clone(&repository), Arc::clone(&notifier));

    form.refresh().await?;
    form.select_package("1");
    form.select_group("10");

    let updated = form.update_package("1", &new_package("Français")).await?;
    assert_eq!(updated.name, "Français");
    assert_eq!(form.selection().selection(), &Selection::new(Some("1"), Some("10")));
    assert_eq!(form.packages()[0].name, "Français");
    assert_eq!(form.groups().len(), 1);
    assert_eq!(notifier.levels(), vec![NoticeLevel::Success]);
    Ok(())
}

#[tokio::test]
async fn test_failed_package_update_notifies() {
    let repository = Arc::new(InMemoryRepository::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let mut form = VocabForm::new(Arc::clone(&repository), Arc::clone(&notifier));

    let err = form.update_package("404", &new_package("x")).await.unwrap_err();
    assert!(matches!(err, SyncError::RequestFailed { .. }));
    assert_eq!(notifier.levels(), vec![NoticeLevel::Error]);
}
