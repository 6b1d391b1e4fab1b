//! Read-only observations fetched from the identity-provider directory.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use credwatch_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Opaque directory object identifier of a registered application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(NonEmptyString);

impl ApplicationId {
    /// Creates a validated application identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        Ok(Self(NonEmptyString::new(value)?))
    }

    /// Returns the identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Registered application as listed by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    id: ApplicationId,
    app_id: String,
    display_name: String,
}

impl Application {
    /// Creates an application observation.
    ///
    /// A blank display name falls back to the client identifier so that
    /// reports never carry an empty application column.
    pub fn new(
        id: impl Into<String>,
        app_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> AppResult<Self> {
        let app_id = app_id.into().trim().to_owned();
        let display_name = display_name.into().trim().to_owned();
        let display_name = if display_name.is_empty() {
            app_id.clone()
        } else {
            display_name
        };

        Ok(Self {
            id: ApplicationId::new(id)?,
            app_id,
            display_name,
        })
    }

    /// Returns the stable directory object identifier.
    #[must_use]
    pub fn id(&self) -> &ApplicationId {
        &self.id
    }

    /// Returns the client identifier.
    #[must_use]
    pub fn app_id(&self) -> &str {
        self.app_id.as_str()
    }

    /// Returns the display name. Not guaranteed unique.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }
}

/// Credential classification assigned at ingestion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialKind {
    /// Client secret (password credential).
    Secret,
    /// Certificate-backed key credential.
    Certificate,
}

impl CredentialKind {
    /// Classifies a credential by the native type tag reported by the directory.
    ///
    /// Certificate-typed tags (anything naming an X.509 certificate) map to
    /// [`CredentialKind::Certificate`]; every other tag, including a missing
    /// one, maps to [`CredentialKind::Secret`].
    #[must_use]
    pub fn from_type_tag(tag: Option<&str>) -> Self {
        let Some(tag) = tag else {
            return Self::Secret;
        };

        let tag = tag.to_ascii_lowercase();
        if tag.contains("x509") || tag.contains("cert") {
            Self::Certificate
        } else {
            Self::Secret
        }
    }

    /// Returns the stable report label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Secret => "Secret",
            Self::Certificate => "Certificate",
        }
    }
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for CredentialKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "Secret" => Ok(Self::Secret),
            "Certificate" => Ok(Self::Certificate),
            other => Err(AppError::Validation(format!(
                "unknown credential type '{other}'"
            ))),
        }
    }
}

/// One secret or certificate bound to an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    application_id: ApplicationId,
    kind: CredentialKind,
    display_name: Option<String>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

impl Credential {
    /// Creates a credential observation.
    #[must_use]
    pub fn new(
        application_id: ApplicationId,
        kind: CredentialKind,
        display_name: Option<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        let display_name = display_name.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        Self {
            application_id,
            kind,
            display_name,
            start_time,
            end_time,
        }
    }

    /// Returns the parent application identifier.
    #[must_use]
    pub fn application_id(&self) -> &ApplicationId {
        &self.application_id
    }

    /// Returns the credential kind.
    #[must_use]
    pub fn kind(&self) -> CredentialKind {
        self.kind
    }

    /// Returns the credential display name, if one was set.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns when the credential became valid.
    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Returns when the credential expires.
    #[must_use]
    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }
}

/// Directory principal responsible for an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    display_name: String,
    email: Option<String>,
}

impl Owner {
    /// Creates an owner observation. Blank emails are treated as absent.
    #[must_use]
    pub fn new(display_name: impl Into<String>, email: Option<String>) -> Self {
        let email = email.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        Self {
            display_name: display_name.into().trim().to_owned(),
            email,
        }
    }

    /// Returns the owner display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the raw email, before any normalization.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}
