use crate::domain::model::{
    Group, NewGroup, NewPackage, NewVocabulary, Notice, Package, ServerInfo, Vocabulary,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Network probe of a server address.
#[async_trait]
pub trait ServerInfoSource: Send + Sync {
    async fn fetch_server_info(&self, address: &str) -> Result<ServerInfo>;
}

/// Remote package/group/vocabulary collection.
#[async_trait]
pub trait PackageRepository: Send + Sync {
    async fn fetch_packages(&self, include_groups: bool) -> Result<Vec<Package>>;
    async fn create_package(&self, data: &NewPackage) -> Result<Package>;
    async fn modify_package(&self, package_id: &str, data: &NewPackage) -> Result<Package>;
    async fn create_group(&self, package_id: &str, data: &NewGroup) -> Result<Group>;
    async fn create_vocabulary(
        &self,
        package_id: &str,
        group_id: &str,
        data: &NewVocabulary,
        activate: bool,
    ) -> Result<Vocabulary>;
    async fn modify_vocabulary(
        &self,
        vocabulary_id: &str,
        data: &NewVocabulary,
    ) -> Result<Vocabulary>;
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}
