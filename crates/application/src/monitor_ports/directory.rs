use async_trait::async_trait;
use credwatch_core::AppResult;
use credwatch_domain::{Application, ApplicationId, Credential, Owner};

/// Port for the identity-provider directory.
///
/// Implementations signal rate limiting with `AppError::Throttled` so that
/// callers can back off; every other failure is reported as-is.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Lists every registered application, following pagination internally.
    async fn list_applications(&self) -> AppResult<Vec<Application>>;

    /// Returns certificate and secret credentials of one application in a single call.
    async fn get_application_credentials(
        &self,
        application_id: &ApplicationId,
    ) -> AppResult<Vec<Credential>>;

    /// Lists the owners of one application.
    async fn list_owners(&self, application_id: &ApplicationId) -> AppResult<Vec<Owner>>;
}
