//! Package → group selection kept consistent with a changing collection.
//!
//! After every operation: a selected group belongs to the selected package,
//! and no group is selected without a package. Reconciliation runs inline,
//! so the invariant is never observably broken. A package id may be chosen
//! before the collection holding it arrives; `set_packages` drops it only
//! when the arriving collection lacks it.

use crate::domain::model::{Group, GroupId, Package, PackageId, Selection};
use crate::utils::error::{Result, SyncError};

/// Ids supplied from outside (deep link), applied once both can be matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalSelection {
    pub package_id: PackageId,
    pub group_id: Option<GroupId>,
}

#[derive(Debug, Default)]
pub struct SelectionSync {
    packages: Vec<Package>,
    selection: Selection,
    pending_external: Option<ExternalSelection>,
    package_fixed: bool,
    group_fixed: bool,
}

impl SelectionSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_package(&self) -> Option<&Package> {
        let id = self.selection.package_id.as_deref()?;
        self.find_package(id)
    }

    pub fn selected_group(&self) -> Option<&Group> {
        let group_id = self.selection.group_id.as_deref()?;
        self.selected_package()?.group(group_id)
    }

    /// Groups offered by the dependent picker.
    pub fn groups(&self) -> &[Group] {
        self.selected_package()
            .map(|p| p.groups.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_pending_external(&self) -> bool {
        self.pending_external.is_some()
    }

    /// The package picker is fixed while an external id drives it.
    pub fn package_locked(&self) -> bool {
        self.package_fixed
    }

    pub fn group_locked(&self) -> bool {
        self.selection.package_id.is_none() || self.group_fixed
    }

    fn find_package(&self, id: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.id == id)
    }

    /// Replaces the whole collection and reconciles the selection.
    pub fn set_packages(&mut self, packages: Vec<Package>) {
        self.packages = packages;
        self.reconcile();
        self.try_apply_external();
    }

    /// Selects a package; the group survives only if it belongs to it.
    pub fn select_package(&mut self, id: &str) {
        self.selection.package_id = Some(id.to_string());
        let keeps_group = match (self.find_package(id), &self.selection.group_id) {
            (Some(package), Some(group_id)) => package.contains_group(group_id),
            _ => false,
        };
        if !keeps_group {
            self.selection.group_id = None;
        }
        if self.find_package(id).is_none() {
            tracing::debug!("Package {} selected before it was fetched", id);
        }
    }

    /// Selects a group of the current package.
    ///
    /// An id outside the derived group list clears the group selection.
    pub fn select_group(&mut self, id: &str) {
        let valid = self
            .selected_package()
            .map(|p| p.contains_group(id))
            .unwrap_or(false);
        if valid {
            self.selection.group_id = Some(id.to_string());
        } else {
            tracing::warn!("Group {} is not part of the selected package", id);
            self.selection.group_id = None;
        }
    }

    /// Records externally supplied ids; re-attempted on every `set_packages`
    /// until both resolve, then dropped.
    pub fn inject_external_selection(&mut self, package_id: &str, group_id: Option<&str>) {
        self.pending_external = Some(ExternalSelection {
            package_id: package_id.to_string(),
            group_id: group_id.map(str::to_string),
        });
        self.package_fixed = true;
        self.group_fixed = group_id.is_some();
        self.try_apply_external();
    }

    /// Appends a freshly created package and selects it.
    pub fn package_created(&mut self, package: Package) {
        let id = package.id.clone();
        match self.packages.iter_mut().find(|p| p.id == id) {
            Some(existing) => *existing = package,
            None => self.packages.push(package),
        }
        self.select_package(&id);
    }

    /// Replaces an edited package in place; the selection is left alone.
    ///
    /// Edit responses omit the group list, so an empty one keeps the groups
    /// already known.
    pub fn package_updated(&mut self, mut package: Package) {
        match self.packages.iter_mut().find(|p| p.id == package.id) {
            Some(existing) => {
                if package.groups.is_empty() {
                    package.groups = std::mem::take(&mut existing.groups);
                }
                *existing = package;
            }
            None => self.packages.push(package),
        }
        self.reconcile();
    }

    /// Appends a freshly created group to the selected package and selects it.
    pub fn group_created(&mut self, group: Group, owner_package_id: &str) -> Result<()> {
        if self.selection.package_id.as_deref() != Some(owner_package_id) {
            return Err(SyncError::OwnerMismatch {
                expected: self.selection.package_id.clone(),
                actual: owner_package_id.to_string(),
            });
        }
        let package = self
            .packages
            .iter_mut()
            .find(|p| p.id == owner_package_id)
            .ok_or_else(|| SyncError::StaleReference {
                kind: "package".to_string(),
                id: owner_package_id.to_string(),
            })?;

        let id = group.id.clone();
        if !package.contains_group(&id) {
            package.groups.push(group);
        }
        self.select_group(&id);
        Ok(())
    }

    /// Form reset: drops selection and any pending external ids.
    pub fn reset(&mut self) {
        self.clear();
        self.pending_external = None;
        self.package_fixed = false;
        self.group_fixed = false;
    }

    fn clear(&mut self) {
        self.selection = Selection::default();
    }

    fn reconcile(&mut self) {
        let Some(package_id) = self.selection.package_id.clone() else {
            self.selection.group_id = None;
            return;
        };
        let Some(package) = self.find_package(&package_id) else {
            tracing::debug!("Package {} disappeared, clearing selection", package_id);
            self.clear();
            return;
        };
        if let Some(group_id) = &self.selection.group_id {
            if !package.contains_group(group_id) {
                tracing::debug!("Group {} no longer in package {}", group_id, package_id);
                self.selection.group_id = None;
            }
        }
    }

    fn try_apply_external(&mut self) {
        let Some(external) = &self.pending_external else {
            return;
        };
        let Some(package) = self.find_package(&external.package_id) else {
            return;
        };
        // mismatched ids stay pending until they resolve together
        if let Some(group_id) = &external.group_id {
            if !package.contains_group(group_id) {
                return;
            }
        }

        let external = external.clone();
        self.pending_external = None;
        tracing::info!(
            "Applied external selection {} / {:?}",
            external.package_id,
            external.group_id
        );
        self.selection = Selection {
            package_id: Some(external.package_id),
            group_id: external.group_id,
        };
    }
}
