//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_email_service;
mod file_system_blob_store;
mod graph_directory_client;
mod in_memory_blob_store;
mod smtp_email_service;

pub use console_email_service::ConsoleEmailService;
pub use file_system_blob_store::FileSystemBlobStore;
pub use graph_directory_client::GraphDirectoryClient;
pub use in_memory_blob_store::InMemoryBlobStore;
pub use smtp_email_service::{SmtpEmailConfig, SmtpEmailService};
