use std::collections::BTreeSet;

use chrono::NaiveDate;
use credwatch_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::CredentialKind;

/// Denormalized credential row, the unit stored in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    application_name: String,
    expiry_date: NaiveDate,
    kind: CredentialKind,
    owner_names: Vec<String>,
    owner_emails: BTreeSet<String>,
}

impl CredentialRecord {
    /// Creates a record. Blank owner names and emails are dropped and
    /// duplicate emails collapse into one entry.
    #[must_use]
    pub fn new(
        application_name: impl Into<String>,
        expiry_date: NaiveDate,
        kind: CredentialKind,
        owner_names: impl IntoIterator<Item = String>,
        owner_emails: impl IntoIterator<Item = String>,
    ) -> Self {
        let owner_names = owner_names
            .into_iter()
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .collect();
        let owner_emails = owner_emails
            .into_iter()
            .map(|email| email.trim().to_owned())
            .filter(|email| !email.is_empty())
            .collect();

        Self {
            application_name: application_name.into(),
            expiry_date,
            kind,
            owner_names,
            owner_emails,
        }
    }

    /// Returns the owning application display name.
    #[must_use]
    pub fn application_name(&self) -> &str {
        self.application_name.as_str()
    }

    /// Returns the UTC calendar date the credential expires on.
    #[must_use]
    pub fn expiry_date(&self) -> NaiveDate {
        self.expiry_date
    }

    /// Returns the credential kind.
    #[must_use]
    pub fn kind(&self) -> CredentialKind {
        self.kind
    }

    /// Returns owner display names in directory order.
    #[must_use]
    pub fn owner_names(&self) -> &[String] {
        self.owner_names.as_slice()
    }

    /// Returns the deduplicated deliverable owner addresses.
    #[must_use]
    pub fn owner_emails(&self) -> &BTreeSet<String> {
        &self.owner_emails
    }
}

/// Logical name a snapshot is stored under.
///
/// Restricted to ASCII letters, digits, `-` and `_`. Derived blob names never
/// contain wildcards, and `.` stays reserved as the separator between a name
/// and the suffix of its leftover artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotName(NonEmptyString);

impl SnapshotName {
    /// Creates a validated snapshot name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = NonEmptyString::new(value)?;
        if let Some(invalid) = value
            .as_str()
            .chars()
            .find(|character| !(character.is_ascii_alphanumeric() || "-_".contains(*character)))
        {
            return Err(AppError::Validation(format!(
                "snapshot name '{}' contains unsupported character '{invalid}'",
                value.as_str()
            )));
        }

        Ok(Self(value))
    }

    /// Returns the logical name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the canonical blob name of the current snapshot.
    #[must_use]
    pub fn blob_name(&self) -> String {
        format!("{}.csv", self.as_str())
    }

    /// Returns the pattern matching leftover artifacts of this name, such as
    /// `report.2024-12-01.csv`.
    ///
    /// Names cannot contain `.`, so the pattern never reaches the canonical
    /// blob of another name, even one that starts with this name.
    #[must_use]
    pub fn blob_pattern(&self) -> String {
        format!("{}.*.csv", self.as_str())
    }
}

impl std::fmt::Display for SnapshotName {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Every credential record observed in one collection pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    name: SnapshotName,
    records: Vec<CredentialRecord>,
}

impl Snapshot {
    /// Creates a snapshot preserving record order.
    #[must_use]
    pub fn new(name: SnapshotName, records: Vec<CredentialRecord>) -> Self {
        Self { name, records }
    }

    /// Returns the logical snapshot name.
    #[must_use]
    pub fn name(&self) -> &SnapshotName {
        &self.name
    }

    /// Returns records in collection order.
    #[must_use]
    pub fn records(&self) -> &[CredentialRecord] {
        self.records.as_slice()
    }

    /// Consumes the snapshot and returns its records.
    #[must_use]
    pub fn into_records(self) -> Vec<CredentialRecord> {
        self.records
    }
}
