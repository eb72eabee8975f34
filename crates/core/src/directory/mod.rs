//! Remote directory service access: wire models, the page-level API seam,
//! and the reqwest-backed client.

pub mod client;
pub mod models;

use std::future::Future;

use crate::errors::DirectoryError;

pub use client::DirectoryClient;
pub use models::{GroupRecord, GroupsPage};

/// One request of the paginated "list groups by customer" protocol.
///
/// Implementations fetch a single page. Chaining pages together is the
/// lister's job.
pub trait GroupsApi {
    fn list_groups_page(
        &self,
        customer: &str,
        page_token: Option<&str>,
    ) -> impl Future<Output = Result<GroupsPage, DirectoryError>> + Send;
}
