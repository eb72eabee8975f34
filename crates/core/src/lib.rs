//! dirgroups core library.
//!
//! A read-only data source that lists every group of a directory customer
//! and flattens each one into a fixed attribute schema: configuration, the
//! directory API client, the paginated lister, the projector, host state,
//! and the read operation that ties them together.

pub mod config;
pub mod context;
pub mod data_source;
pub mod directory;
pub mod errors;
pub mod lister;
pub mod projector;
pub mod resource_data;
pub mod schema;

// Re-exports for convenience.
pub use config::ProviderConfig;
pub use context::{CancelHandle, ProviderContext, ReadContext};
pub use data_source::{GroupsDataSource, ReadOutcome, ReadState};
pub use directory::{DirectoryClient, GroupRecord, GroupsApi};
pub use projector::ProjectedGroup;
pub use resource_data::ResourceData;
