mod blob_store;
mod directory;
mod email;

pub use blob_store::BlobStore;
pub use directory::DirectoryClient;
pub use email::{EmailService, OutboundEmail};
