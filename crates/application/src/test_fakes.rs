//! Port fakes shared by the service test suites.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use credwatch_core::{AppError, AppResult};
use credwatch_domain::{Application, ApplicationId, Credential, CredentialKind, Owner};

use crate::{BlobStore, DirectoryClient, EmailService, OutboundEmail};

fn lock_error(error: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("failed to lock fake state: {error}"))
}

pub(crate) fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .unwrap_or_else(|| unreachable!())
}

pub(crate) fn application(id: &str, name: &str) -> Application {
    Application::new(id, format!("client-{id}"), name).unwrap_or_else(|_| unreachable!())
}

pub(crate) fn credential(
    application_id: &str,
    kind: CredentialKind,
    end_time: DateTime<Utc>,
) -> Credential {
    Credential::new(
        ApplicationId::new(application_id).unwrap_or_else(|_| unreachable!()),
        kind,
        Some(format!("{} credential", kind.as_str())),
        utc(2024, 1, 1),
        end_time,
    )
}

#[derive(Default)]
pub(crate) struct FakeDirectory {
    pub applications: Vec<Application>,
    pub credentials: HashMap<String, Vec<Credential>>,
    pub owners: HashMap<String, Vec<Owner>>,
    pub list_fails: bool,
    pub failing_credentials: HashSet<String>,
    pub failing_owners: HashSet<String>,
    /// Number of leading calls per operation key that report throttling.
    pub throttle_budget: Mutex<HashMap<String, u32>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeDirectory {
    fn record_call(&self, key: String) -> AppResult<()> {
        self.calls.lock().map_err(lock_error)?.push(key.clone());

        let mut budget = self.throttle_budget.lock().map_err(lock_error)?;
        if let Some(remaining) = budget.get_mut(&key)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(AppError::Throttled(format!("429 for {key}")));
        }

        Ok(())
    }

    pub(crate) fn throttle(&self, key: &str, times: u32) {
        if let Ok(mut budget) = self.throttle_budget.lock() {
            budget.insert(key.to_owned(), times);
        }
    }

    pub(crate) fn call_count(&self, key: &str) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.iter().filter(|call| call.as_str() == key).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl DirectoryClient for FakeDirectory {
    async fn list_applications(&self) -> AppResult<Vec<Application>> {
        self.record_call("applications".to_owned())?;
        if self.list_fails {
            return Err(AppError::Remote("directory unreachable".to_owned()));
        }

        Ok(self.applications.clone())
    }

    async fn get_application_credentials(
        &self,
        application_id: &ApplicationId,
    ) -> AppResult<Vec<Credential>> {
        self.record_call(format!("credentials:{application_id}"))?;
        if self.failing_credentials.contains(application_id.as_str()) {
            return Err(AppError::Remote(format!(
                "credential detail failed for {application_id}"
            )));
        }

        Ok(self
            .credentials
            .get(application_id.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn list_owners(&self, application_id: &ApplicationId) -> AppResult<Vec<Owner>> {
        self.record_call(format!("owners:{application_id}"))?;
        if self.failing_owners.contains(application_id.as_str()) {
            return Err(AppError::Remote(format!(
                "owner listing failed for {application_id}"
            )));
        }

        Ok(self
            .owners
            .get(application_id.as_str())
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub(crate) struct FakeBlobStore {
    pub blobs: Mutex<BTreeMap<String, Vec<u8>>>,
    pub operations: Mutex<Vec<String>>,
    pub put_fails: bool,
}

impl FakeBlobStore {
    pub(crate) fn with_blobs(names: &[&str]) -> Self {
        let store = Self::default();
        if let Ok(mut blobs) = store.blobs.lock() {
            for name in names {
                blobs.insert((*name).to_owned(), b"stale".to_vec());
            }
        }
        store
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.blobs
            .lock()
            .map(|blobs| blobs.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn operations(&self) -> Vec<String> {
        self.operations
            .lock()
            .map(|operations| operations.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn put_blob(&self, name: &str, bytes: Vec<u8>) -> AppResult<()> {
        self.operations
            .lock()
            .map_err(lock_error)?
            .push(format!("put:{name}"));
        if self.put_fails {
            return Err(AppError::Remote("blob store rejected write".to_owned()));
        }

        self.blobs
            .lock()
            .map_err(lock_error)?
            .insert(name.to_owned(), bytes);
        Ok(())
    }

    async fn get_blob(&self, name: &str) -> AppResult<Vec<u8>> {
        self.blobs
            .lock()
            .map_err(lock_error)?
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("blob '{name}' does not exist")))
    }

    async fn list_blobs(&self, pattern: &str) -> AppResult<Vec<String>> {
        let matcher = glob::Pattern::new(pattern)
            .map_err(|error| AppError::Validation(format!("invalid pattern: {error}")))?;

        Ok(self
            .blobs
            .lock()
            .map_err(lock_error)?
            .keys()
            .filter(|name| matcher.matches(name))
            .cloned()
            .collect())
    }

    async fn delete_blob(&self, name: &str) -> AppResult<()> {
        self.operations
            .lock()
            .map_err(lock_error)?
            .push(format!("delete:{name}"));
        self.blobs.lock().map_err(lock_error)?.remove(name);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeEmailService {
    pub sent: Mutex<Vec<OutboundEmail>>,
    /// Subjects containing this fragment fail to send.
    pub fail_subjects_containing: Option<String>,
}

impl FakeEmailService {
    pub(crate) fn sent(&self) -> Vec<OutboundEmail> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EmailService for FakeEmailService {
    async fn send_email(&self, email: &OutboundEmail) -> AppResult<()> {
        if let Some(fragment) = &self.fail_subjects_containing
            && email.subject.contains(fragment.as_str())
        {
            return Err(AppError::Remote("mail provider rejected message".to_owned()));
        }

        self.sent.lock().map_err(lock_error)?.push(email.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::FakeBlobStore;
    use crate::BlobStore;

    #[tokio::test]
    async fn fake_blob_listing_follows_glob_wildcards() {
        let store = FakeBlobStore::with_blobs(&[
            "report.1.csv",
            "report.12.csv",
            "report.csv",
            "report-eu.1.csv",
        ]);

        let single = store
            .list_blobs("report.?.csv")
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(single, ["report.1.csv"]);

        let any = store
            .list_blobs("report.*.csv")
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(any, ["report.1.csv", "report.12.csv"]);

        assert!(store.list_blobs("report.[.csv").await.is_err());
    }
}
