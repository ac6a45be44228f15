use crate::config::toml_config::FormConfig;
use crate::core::form_gate;
use crate::core::selection::SelectionSync;
use crate::domain::model::{Group, NewGroup, NewPackage, Notice, Package, VocabDraft, Vocabulary};
use crate::domain::ports::{Notifier, PackageRepository};
use crate::utils::error::{Result, SyncError};
use std::sync::Arc;

/// Controller of the vocabulary form.
///
/// Drives fetch → selection → gate → submit → re-fetch for one form. Built
/// with [`VocabForm::editing`] it updates an existing vocabulary instead.
pub struct VocabForm<R: PackageRepository, N: Notifier> {
    repository: Arc<R>,
    notifier: Arc<N>,
    selection: SelectionSync,
    pub draft: VocabDraft,
    can_save: bool,
    clear_on_submit: bool,
    editing: Option<String>,
}

impl<R: PackageRepository, N: Notifier> VocabForm<R, N> {
    pub fn new(repository: Arc<R>, notifier: Arc<N>) -> Self {
        Self {
            repository,
            notifier,
            selection: SelectionSync::new(),
            draft: VocabDraft::default(),
            can_save: true,
            clear_on_submit: true,
            editing: None,
        }
    }

    pub fn from_config(repository: Arc<R>, notifier: Arc<N>, config: &FormConfig) -> Self {
        let mut form =
            Self::new(repository, notifier).with_clear_on_submit(config.clear_on_submit);
        form.set_can_save(config.can_save);
        form
    }

    /// Form prefilled from a stored vocabulary; `submit` modifies it in place.
    pub fn editing(repository: Arc<R>, notifier: Arc<N>, vocabulary: &Vocabulary) -> Self {
        let mut form = Self::new(repository, notifier);
        form.draft = VocabDraft::from_vocabulary(vocabulary);
        form.editing = Some(vocabulary.id.clone());
        form
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Package/group ids fixed by the caller, e.g. from a deep link.
    pub fn with_external_selection(mut self, package_id: &str, group_id: Option<&str>) -> Self {
        self.selection.inject_external_selection(package_id, group_id);
        self
    }

    pub fn with_clear_on_submit(mut self, clear_on_submit: bool) -> Self {
        self.clear_on_submit = clear_on_submit;
        self
    }

    pub fn set_can_save(&mut self, can_save: bool) {
        self.can_save = can_save;
    }

    pub fn selection(&self) -> &SelectionSync {
        &self.selection
    }

    pub fn packages(&self) -> &[Package] {
        self.selection.packages()
    }

    pub fn groups(&self) -> &[Group] {
        self.selection.groups()
    }

    pub fn package_locked(&self) -> bool {
        self.selection.package_locked()
    }

    pub fn group_locked(&self) -> bool {
        self.selection.group_locked()
    }

    pub fn select_package(&mut self, id: &str) {
        self.selection.select_package(id);
    }

    pub fn select_group(&mut self, id: &str) {
        self.selection.select_group(id);
    }

    /// Editing targets a known vocabulary, so no package or group is needed.
    pub fn can_submit(&self) -> bool {
        if self.editing.is_some() {
            return self.draft.required_fields_filled() && self.can_save;
        }
        form_gate::can_submit(
            self.draft.required_fields_filled(),
            self.selection.selection(),
            self.can_save,
        )
    }

    /// Re-fetches packages with their groups. A failure leaves the collection as is.
    pub async fn refresh(&mut self) -> Result<()> {
        match self.repository.fetch_packages(true).await {
            Ok(packages) => {
                tracing::debug!("Fetched {} packages", packages.len());
                self.selection.set_packages(packages);
                Ok(())
            }
            Err(e) => Err(self.request_failed("fetch packages", e)),
        }
    }

    pub async fn create_package(&mut self, data: &NewPackage) -> Result<Package> {
        let package = match self.repository.create_package(data).await {
            Ok(package) => package,
            Err(e) => return Err(self.request_failed("create package", e)),
        };
        self.selection.package_created(package.clone());
        self.notifier
            .notify(Notice::success(format!("Package '{}' created", package.name)));
        self.refresh_quietly().await;
        Ok(package)
    }

    pub async fn update_package(&mut self, package_id: &str, data: &NewPackage) -> Result<Package> {
        let package = match self.repository.modify_package(package_id, data).await {
            Ok(package) => package,
            Err(e) => return Err(self.request_failed("modify package", e)),
        };
        self.selection.package_updated(package.clone());
        self.notifier
            .notify(Notice::success(format!("Package '{}' updated", package.name)));
        self.refresh_quietly().await;
        Ok(package)
    }

    pub async fn create_group(&mut self, data: &NewGroup) -> Result<Group> {
        let package_id = self
            .selection
            .selection()
            .package_id
            .clone()
            .ok_or_else(|| SyncError::SubmitBlocked {
                reason: "select a package before creating a group".to_string(),
            })?;

        let group = match self.repository.create_group(&package_id, data).await {
            Ok(group) => group,
            Err(e) => return Err(self.request_failed("create group", e)),
        };
        self.selection.group_created(group.clone(), &package_id)?;
        self.notifier
            .notify(Notice::success(format!("Group '{}' created", group.name)));
        self.refresh_quietly().await;
        Ok(group)
    }

    pub async fn submit(&mut self) -> Result<Vocabulary> {
        if !self.can_submit() {
            return Err(SyncError::SubmitBlocked {
                reason: "fill in the word, a translation, a package and a group".to_string(),
            });
        }
        if let Some(vocabulary_id) = self.editing.clone() {
            return self.submit_edit(&vocabulary_id).await;
        }
        let selection = self.selection.selection();
        let (Some(package_id), Some(group_id)) =
            (selection.package_id.clone(), selection.group_id.clone())
        else {
            return Err(SyncError::SubmitBlocked {
                reason: "no package or group selected".to_string(),
            });
        };

        let payload = self.draft.to_new_vocabulary();
        match self
            .repository
            .create_vocabulary(&package_id, &group_id, &payload, self.draft.activate)
            .await
        {
            Ok(vocabulary) => {
                if self.clear_on_submit {
                    self.draft.clear_text();
                }
                self.notifier.notify(Notice::success("Vocabulary saved"));
                Ok(vocabulary)
            }
            Err(e) => Err(self.request_failed("save vocabulary", e)),
        }
    }

    async fn submit_edit(&mut self, vocabulary_id: &str) -> Result<Vocabulary> {
        let payload = self.draft.to_new_vocabulary();
        match self
            .repository
            .modify_vocabulary(vocabulary_id, &payload)
            .await
        {
            Ok(vocabulary) => {
                // an edited entry is done with; the fields always clear
                self.draft.clear_text();
                self.notifier.notify(Notice::success("Vocabulary updated"));
                Ok(vocabulary)
            }
            Err(e) => Err(self.request_failed("modify vocabulary", e)),
        }
    }

    /// Clears fields and selection.
    pub fn reset(&mut self) {
        self.draft = VocabDraft::default();
        self.selection.reset();
    }

    async fn refresh_quietly(&mut self) {
        if let Err(e) = self.refresh().await {
            tracing::debug!("Refresh after creation failed: {}", e);
        }
    }

    fn request_failed(&self, operation: &str, error: SyncError) -> SyncError {
        tracing::warn!("Could not {}: {}", operation, error);
        self.notifier
            .notify(Notice::error(format!("Could not {}", operation)));
        SyncError::RequestFailed {
            operation: operation.to_string(),
            message: error.to_string(),
        }
    }
}
