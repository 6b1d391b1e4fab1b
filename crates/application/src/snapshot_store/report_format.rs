//! CSV shape of persisted snapshots.
//!
//! Columns: `DisplayName, ExpiryDate (yyyy-MM-dd), Type (Secret|Certificate),
//! OwnerName, OwnerEmail`. Multiple owners share one cell joined by `"; "`.
//! A `;` or `\` inside an owner value is written as `\;` or `\\`.
//! Audit consumers depend on this layout.

use chrono::NaiveDate;
use credwatch_core::{AppError, AppResult};
use credwatch_domain::{CredentialKind, CredentialRecord};
use serde::{Deserialize, Serialize};

/// Header row of the persisted report.
pub const REPORT_HEADERS: [&str; 5] = [
    "DisplayName",
    "ExpiryDate",
    "Type",
    "OwnerName",
    "OwnerEmail",
];

const DATE_FORMAT: &str = "%Y-%m-%d";
const OWNER_SEPARATOR: &str = "; ";

#[derive(Debug, Serialize, Deserialize)]
struct ReportRow {
    #[serde(rename = "DisplayName")]
    display_name: String,
    #[serde(rename = "ExpiryDate")]
    expiry_date: String,
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "OwnerName")]
    owner_name: String,
    #[serde(rename = "OwnerEmail")]
    owner_email: String,
}

impl From<&CredentialRecord> for ReportRow {
    fn from(record: &CredentialRecord) -> Self {
        Self {
            display_name: record.application_name().to_owned(),
            expiry_date: record.expiry_date().format(DATE_FORMAT).to_string(),
            kind: record.kind().as_str().to_owned(),
            owner_name: join_owners(record.owner_names()),
            owner_email: join_owners(record.owner_emails()),
        }
    }
}

impl ReportRow {
    fn into_record(self, line: u64) -> AppResult<CredentialRecord> {
        let expiry_date = NaiveDate::parse_from_str(self.expiry_date.trim(), DATE_FORMAT)
            .map_err(|error| {
                AppError::Validation(format!(
                    "invalid ExpiryDate '{}' on report line {line}: {error}",
                    self.expiry_date
                ))
            })?;
        let kind = self.kind.parse::<CredentialKind>()?;

        Ok(CredentialRecord::new(
            self.display_name,
            expiry_date,
            kind,
            split_owners(self.owner_name.as_str()),
            split_owners(self.owner_email.as_str()),
        ))
    }
}

fn join_owners<'a>(values: impl IntoIterator<Item = &'a String>) -> String {
    values
        .into_iter()
        .map(|value| value.replace('\\', "\\\\").replace(';', "\\;"))
        .collect::<Vec<_>>()
        .join(OWNER_SEPARATOR)
}

fn split_owners(cell: &str) -> Vec<String> {
    let mut owners = Vec::new();
    let mut current = String::new();
    let mut chars = cell.chars();

    while let Some(character) = chars.next() {
        match character {
            '\\' => current.extend(chars.next()),
            ';' => owners.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    owners.push(current);

    owners
        .into_iter()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Renders records as CSV bytes. The header row is always present.
pub(super) fn encode(records: &[CredentialRecord]) -> AppResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record(REPORT_HEADERS)
        .map_err(|error| AppError::Internal(format!("failed to write report header: {error}")))?;
    for record in records {
        writer.serialize(ReportRow::from(record)).map_err(|error| {
            AppError::Internal(format!("failed to write report row: {error}"))
        })?;
    }

    writer
        .into_inner()
        .map_err(|error| AppError::Internal(format!("failed to flush report: {error}")))
}

/// Parses CSV bytes produced by [`encode`].
pub(super) fn decode(bytes: &[u8]) -> AppResult<Vec<CredentialRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|error| AppError::Validation(format!("failed to read report header: {error}")))?;
    if headers.iter().ne(REPORT_HEADERS) {
        return Err(AppError::Validation(format!(
            "unexpected report header '{}'",
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    reader
        .deserialize::<ReportRow>()
        .zip(2_u64..)
        .map(|(row, line)| {
            let row = row.map_err(|error| {
                AppError::Validation(format!("failed to parse report line {line}: {error}"))
            })?;
            row.into_record(line)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use credwatch_domain::{CredentialKind, CredentialRecord};

    use super::{decode, encode};

    fn record(name: &str, emails: &[&str]) -> CredentialRecord {
        CredentialRecord::new(
            name,
            NaiveDate::from_ymd_opt(2025, 2, 14).unwrap_or_else(|| unreachable!()),
            CredentialKind::Certificate,
            vec!["Alice".to_owned(), "Bob".to_owned()],
            emails.iter().map(|email| (*email).to_owned()),
        )
    }

    #[test]
    fn writes_stable_header_and_row_shape() {
        let bytes = encode(&[record("Payroll, EU", &["a@x.com", "b@x.com"])])
            .unwrap_or_else(|_| unreachable!());
        let text = String::from_utf8(bytes).unwrap_or_else(|_| unreachable!());

        assert_eq!(
            text,
            "DisplayName,ExpiryDate,Type,OwnerName,OwnerEmail\n\
             \"Payroll, EU\",2025-02-14,Certificate,Alice; Bob,a@x.com; b@x.com\n"
        );
    }

    #[test]
    fn empty_report_still_has_header() {
        let bytes = encode(&[]).unwrap_or_else(|_| unreachable!());
        assert_eq!(bytes, b"DisplayName,ExpiryDate,Type,OwnerName,OwnerEmail\n");
        assert!(decode(&bytes).unwrap_or_else(|_| unreachable!()).is_empty());
    }

    #[test]
    fn reads_back_records_with_missing_owners() {
        let records = vec![record("Payroll", &["a@x.com"]), record("Billing", &[])];
        let bytes = encode(&records).unwrap_or_else(|_| unreachable!());

        assert_eq!(decode(&bytes).unwrap_or_else(|_| unreachable!()), records);
    }

    #[test]
    fn owner_values_containing_the_separator_survive() {
        let records = vec![CredentialRecord::new(
            "Payroll",
            NaiveDate::from_ymd_opt(2025, 2, 14).unwrap_or_else(|| unreachable!()),
            CredentialKind::Secret,
            vec!["Smith; John".to_owned(), r"ops\team".to_owned()],
            vec!["john@x.com".to_owned(), "ops@x.com".to_owned()],
        )];
        let bytes = encode(&records).unwrap_or_else(|_| unreachable!());
        let text = String::from_utf8(bytes.clone()).unwrap_or_else(|_| unreachable!());

        assert!(text.contains(r"Smith\; John; ops\\team,john@x.com; ops@x.com"));
        assert_eq!(decode(&bytes).unwrap_or_else(|_| unreachable!()), records);
    }

    #[test]
    fn rejects_unknown_header() {
        let result = decode(b"Name,Expiry\nPayroll,2025-01-01\n");
        assert!(result.is_err());
    }

    #[test]
    fn rejects_malformed_dates_with_line_number() {
        let bytes = b"DisplayName,ExpiryDate,Type,OwnerName,OwnerEmail\n\
                      Payroll,2025-01-01,Secret,Alice,a@x.com\n\
                      Billing,01/02/2025,Secret,Bob,b@x.com\n";
        let error = decode(bytes).err().map(|error| error.to_string());
        assert!(error.is_some_and(|message| message.contains("line 3")));
    }
}
