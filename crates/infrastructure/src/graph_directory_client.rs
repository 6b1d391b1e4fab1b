//! Microsoft Graph adapter for the directory port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use credwatch_application::DirectoryClient;
use credwatch_core::{AppError, AppResult};
use credwatch_domain::{Application, ApplicationId, Credential, CredentialKind, Owner};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

const APPLICATION_SELECT: &str = "id,appId,displayName";
const CREDENTIAL_SELECT: &str = "id,keyCredentials,passwordCredentials";
const OWNER_SELECT: &str = "id,displayName,mail";

/// Directory client backed by the Microsoft Graph REST API.
///
/// Rate limiting (HTTP 429) surfaces as `AppError::Throttled`; every other
/// non-success status is reported as `AppError::Remote`.
#[derive(Clone)]
pub struct GraphDirectoryClient {
    http_client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl GraphDirectoryClient {
    /// Creates a Graph client for `base_url` (for example `https://graph.microsoft.com/v1.0`).
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            access_token: access_token.into(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> AppResult<T> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(self.access_token.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| AppError::Remote(format!("graph request to '{url}' failed: {error}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("unspecified")
                .to_owned();
            return Err(AppError::Throttled(format!(
                "graph throttled '{url}' (retry-after: {retry_after})"
            )));
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("graph resource '{url}' not found")));
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<response body unavailable>".to_owned());
            return Err(AppError::Remote(format!(
                "graph request to '{url}' failed with status {status}: {body}"
            )));
        }

        response.json::<T>().await.map_err(|error| {
            AppError::Remote(format!("failed to decode graph response from '{url}': {error}"))
        })
    }

    async fn get_all_pages<T: DeserializeOwned>(&self, first_url: String) -> AppResult<Vec<T>> {
        let mut items = Vec::new();
        let mut next_url = Some(first_url);
        let mut pages = 0_usize;

        while let Some(url) = next_url {
            let page: GraphPage<T> = self.get_json(url.as_str()).await?;
            pages += 1;
            items.extend(page.value);
            next_url = page.next_link;
        }

        debug!(pages, items = items.len(), "graph collection fetched");
        Ok(items)
    }
}

#[async_trait]
impl DirectoryClient for GraphDirectoryClient {
    async fn list_applications(&self) -> AppResult<Vec<Application>> {
        let url = format!("{}/applications?$select={APPLICATION_SELECT}", self.base_url);
        let payloads: Vec<ApplicationPayload> = self.get_all_pages(url).await?;

        payloads
            .into_iter()
            .map(ApplicationPayload::into_application)
            .collect()
    }

    async fn get_application_credentials(
        &self,
        application_id: &ApplicationId,
    ) -> AppResult<Vec<Credential>> {
        let url = format!(
            "{}/applications/{application_id}?$select={CREDENTIAL_SELECT}",
            self.base_url
        );
        let payload: CredentialsPayload = self.get_json(url.as_str()).await?;

        Ok(payload.into_credentials(application_id))
    }

    async fn list_owners(&self, application_id: &ApplicationId) -> AppResult<Vec<Owner>> {
        let url = format!(
            "{}/applications/{application_id}/owners?$select={OWNER_SELECT}",
            self.base_url
        );
        let payloads: Vec<OwnerPayload> = self.get_all_pages(url).await?;

        Ok(payloads.into_iter().map(OwnerPayload::into_owner).collect())
    }
}

#[derive(Debug, Deserialize)]
struct GraphPage<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationPayload {
    id: String,
    #[serde(default)]
    app_id: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

impl ApplicationPayload {
    fn into_application(self) -> AppResult<Application> {
        Application::new(
            self.id,
            self.app_id.unwrap_or_default(),
            self.display_name.unwrap_or_default(),
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsPayload {
    #[serde(default)]
    key_credentials: Vec<CredentialPayload>,
    #[serde(default)]
    password_credentials: Vec<CredentialPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialPayload {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default, rename = "type")]
    type_tag: Option<String>,
    #[serde(default)]
    start_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    end_date_time: Option<DateTime<Utc>>,
}

impl CredentialsPayload {
    fn into_credentials(self, application_id: &ApplicationId) -> Vec<Credential> {
        let certificates = self.key_credentials.into_iter().map(|payload| {
            let kind = CredentialKind::from_type_tag(payload.type_tag.as_deref());
            (kind, payload)
        });
        let secrets = self
            .password_credentials
            .into_iter()
            .map(|payload| (CredentialKind::Secret, payload));

        certificates
            .chain(secrets)
            .filter_map(|(kind, payload)| payload.into_credential(application_id, kind))
            .collect()
    }
}

impl CredentialPayload {
    fn into_credential(
        self,
        application_id: &ApplicationId,
        kind: CredentialKind,
    ) -> Option<Credential> {
        let (Some(start_time), Some(end_time)) = (self.start_date_time, self.end_date_time) else {
            warn!(
                application_id = %application_id,
                kind = %kind,
                "credential without validity window, ignoring"
            );
            return None;
        };

        Some(Credential::new(
            application_id.clone(),
            kind,
            self.display_name,
            start_time,
            end_time,
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnerPayload {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    mail: Option<String>,
}

impl OwnerPayload {
    fn into_owner(self) -> Owner {
        Owner::new(self.display_name.unwrap_or_default(), self.mail)
    }
}
