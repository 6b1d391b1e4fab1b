use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use credwatch_application::{MonitorConfig, SenderIdentity};
use credwatch_core::{AppError, AppResult};
use credwatch_domain::SnapshotName;
use credwatch_infrastructure::SmtpEmailConfig;
use tracing_subscriber::EnvFilter;

const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
const DEFAULT_SNAPSHOT_NAME: &str = "credential-expiry-report";
const DEFAULT_FROM_NAME: &str = "Credential Expiry Monitor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Collect, persist, evaluate and notify.
    Full,
    /// Evaluate and notify from the last persisted snapshot.
    AlertsOnly,
}

impl RunMode {
    pub fn from_arg(arg: Option<&str>) -> AppResult<Self> {
        match arg {
            None | Some("run") => Ok(Self::Full),
            Some("alerts") => Ok(Self::AlertsOnly),
            Some(other) => Err(AppError::Validation(format!(
                "unknown mode '{other}', expected 'run' or 'alerts'"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "run",
            Self::AlertsOnly => "alerts",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerEmailNormalization {
    MailboxPrefix,
    Verbatim,
}

#[derive(Clone)]
pub enum EmailProviderConfig {
    Console,
    Smtp(SmtpEmailConfig),
}

#[derive(Clone)]
pub struct WorkerConfig {
    pub graph_access_token: String,
    pub graph_base_url: String,
    pub snapshot_name: SnapshotName,
    pub snapshot_store_dir: PathBuf,
    pub snapshot_staging_dir: Option<PathBuf>,
    pub monitor: MonitorConfig,
    pub owner_email_normalization: OwnerEmailNormalization,
    pub sender: SenderIdentity,
    pub email_provider: EmailProviderConfig,
}

impl WorkerConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let vars = EnvSource { lookup };

        let graph_access_token = vars.required("GRAPH_ACCESS_TOKEN")?;
        let graph_base_url = vars
            .optional("GRAPH_BASE_URL")
            .unwrap_or_else(|| DEFAULT_GRAPH_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let snapshot_name = SnapshotName::new(
            vars.optional("SNAPSHOT_NAME")
                .unwrap_or_else(|| DEFAULT_SNAPSHOT_NAME.to_owned()),
        )?;
        let snapshot_store_dir = PathBuf::from(vars.required("SNAPSHOT_STORE_DIR")?);
        let snapshot_staging_dir = vars.optional("SNAPSHOT_STAGING_DIR").map(PathBuf::from);

        let defaults = MonitorConfig::default();
        let monitor = MonitorConfig {
            alert_days: vars.parse_or("ALERT_DAYS", defaults.alert_days)?,
            max_retries: vars.parse_or("RETRY_MAX_RETRIES", defaults.max_retries)?,
            base_delay_ms: vars.parse_or("RETRY_BASE_DELAY_MS", defaults.base_delay_ms)?,
            cap_delay_ms: vars.parse_or("RETRY_CAP_DELAY_MS", defaults.cap_delay_ms)?,
            collector_concurrency: vars
                .parse_or("COLLECTOR_CONCURRENCY", defaults.collector_concurrency)?,
            notifier_concurrency: vars
                .parse_or("NOTIFIER_CONCURRENCY", defaults.notifier_concurrency)?,
        };
        monitor.validate()?;

        let owner_email_normalization = match vars
            .optional("OWNER_EMAIL_NORMALIZATION")
            .unwrap_or_else(|| "mailbox-prefix".to_owned())
            .as_str()
        {
            "mailbox-prefix" => OwnerEmailNormalization::MailboxPrefix,
            "none" => OwnerEmailNormalization::Verbatim,
            other => {
                return Err(AppError::Validation(format!(
                    "OWNER_EMAIL_NORMALIZATION must be either 'mailbox-prefix' or 'none', got '{other}'"
                )));
            }
        };

        let sender = SenderIdentity {
            address: vars.required("ALERT_FROM_ADDRESS")?,
            name: vars
                .optional("ALERT_FROM_NAME")
                .unwrap_or_else(|| DEFAULT_FROM_NAME.to_owned()),
        };

        let email_provider = match vars
            .optional("EMAIL_PROVIDER")
            .unwrap_or_else(|| "console".to_owned())
            .as_str()
        {
            "console" => EmailProviderConfig::Console,
            "smtp" => {
                let port = vars
                    .required("SMTP_PORT")?
                    .parse::<u16>()
                    .map_err(|error| AppError::Validation(format!("invalid SMTP_PORT: {error}")))?;
                EmailProviderConfig::Smtp(SmtpEmailConfig {
                    host: vars.required("SMTP_HOST")?,
                    port,
                    username: vars.required("SMTP_USERNAME")?,
                    password: vars.required("SMTP_PASSWORD")?,
                })
            }
            other => {
                return Err(AppError::Validation(format!(
                    "EMAIL_PROVIDER must be either 'console' or 'smtp', got '{other}'"
                )));
            }
        };

        Ok(Self {
            graph_access_token,
            graph_base_url,
            snapshot_name,
            snapshot_store_dir,
            snapshot_staging_dir,
            monitor,
            owner_email_normalization,
            sender,
            email_provider,
        })
    }
}

struct EnvSource<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvSource<F> {
    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, name: &str) -> AppResult<String> {
        self.optional(name)
            .ok_or_else(|| AppError::ConfigurationMissing(format!("{name} is required")))
    }

    fn parse_or<T>(&self, name: &str, default: T) -> AppResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(name) {
            Some(value) => value.parse::<T>().map_err(|error| {
                AppError::Validation(format!("invalid {name} value '{value}': {error}"))
            }),
            None => Ok(default),
        }
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
