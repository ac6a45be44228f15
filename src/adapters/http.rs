use crate::domain::model::{
    Group, NewGroup, NewPackage, NewVocabulary, Package, ServerInfo, Vocabulary,
};
use crate::domain::ports::{PackageRepository, ServerInfoSource};
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Vocascan REST client.
///
/// The probe (`fetch_server_info`) takes the address to check as an
/// argument; repository calls go to `base_url`.
#[derive(Debug, Clone)]
pub struct VocascanClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl VocascanClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        tracing::debug!("Vocascan request: {}", operation);
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| request_failed(operation, e.to_string()))?;
        let response = ensure_success(operation, response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| request_failed(operation, format!("invalid response body: {}", e)))
    }
}

fn request_failed(operation: &str, message: String) -> SyncError {
    SyncError::RequestFailed {
        operation: operation.to_string(),
        message,
    }
}

async fn ensure_success(operation: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(request_failed(
        operation,
        format!("HTTP {}: {}", status.as_u16(), body.trim()),
    ))
}

#[async_trait]
impl ServerInfoSource for VocascanClient {
    async fn fetch_server_info(&self, address: &str) -> Result<ServerInfo> {
        let url = format!("{}/api/info", address.trim_end_matches('/'));
        tracing::debug!("Probing {}", url);

        let unreachable = |message: String| SyncError::Unreachable {
            address: address.to_string(),
            message,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unreachable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(unreachable(format!("HTTP {}", response.status().as_u16())));
        }
        response
            .json::<ServerInfo>()
            .await
            .map_err(|e| unreachable(format!("invalid info response: {}", e)))
    }
}

#[async_trait]
impl PackageRepository for VocascanClient {
    async fn fetch_packages(&self, include_groups: bool) -> Result<Vec<Package>> {
        let request = self
            .client
            .get(self.url("/api/package"))
            .query(&[("groups", include_groups)]);
        self.send_json("fetch packages", request).await
    }

    async fn create_package(&self, data: &NewPackage) -> Result<Package> {
        let request = self.client.post(self.url("/api/package")).json(data);
        self.send_json("create package", request).await
    }

    async fn modify_package(&self, package_id: &str, data: &NewPackage) -> Result<Package> {
        let request = self
            .client
            .put(self.url(&format!("/api/package/{}", package_id)))
            .json(data);
        self.send_json("modify package", request).await
    }

    async fn create_group(&self, package_id: &str, data: &NewGroup) -> Result<Group> {
        let request = self
            .client
            .post(self.url(&format!("/api/package/{}/group", package_id)))
            .json(data);
        self.send_json("create group", request).await
    }

    async fn create_vocabulary(
        &self,
        package_id: &str,
        group_id: &str,
        data: &NewVocabulary,
        activate: bool,
    ) -> Result<Vocabulary> {
        let request = self
            .client
            .post(self.url(&format!(
                "/api/package/{}/group/{}/vocabulary",
                package_id, group_id
            )))
            .query(&[("activate", activate)])
            .json(data);
        self.send_json("create vocabulary", request).await
    }

    async fn modify_vocabulary(
        &self,
        vocabulary_id: &str,
        data: &NewVocabulary,
    ) -> Result<Vocabulary> {
        let request = self
            .client
            .put(self.url(&format!("/api/vocabulary/{}", vocabulary_id)))
            .json(data);
        self.send_json("modify vocabulary", request).await
    }
}
