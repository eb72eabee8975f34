//! The groups data source read operation.
//!
//! A read moves through `Start -> Listing -> Done`, or detours through
//! `NotFound` when the customer scope has disappeared. Anything else that
//! goes wrong while listing aborts the read before host state is touched.

use std::fmt;

use tracing::{debug, info, instrument, warn};

use crate::context::{ProviderContext, ReadContext};
use crate::directory::GroupsApi;
use crate::errors::DataSourceError;
use crate::lister::list_groups;
use crate::projector::flatten_groups;
use crate::resource_data::ResourceData;
use crate::schema::{groups_data_source_schema, AttrValue, Schema, GROUPS_KEY};

/// Phase of a single read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    Start,
    Listing,
    NotFound,
    Done,
}

impl fmt::Display for ReadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Listing => write!(f, "listing"),
            Self::NotFound => write!(f, "not_found"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Summary of a successful read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOutcome {
    /// States visited, in order.
    pub path: Vec<ReadState>,
    /// Number of groups written to host state.
    pub groups: usize,
}

impl ReadOutcome {
    pub fn was_not_found(&self) -> bool {
        self.path.contains(&ReadState::NotFound)
    }
}

/// Read-only data source listing every group of the provider's customer.
#[derive(Debug, Default, Clone, Copy)]
pub struct GroupsDataSource;

impl GroupsDataSource {
    pub fn schema(&self) -> Schema {
        groups_data_source_schema()
    }

    /// Empty host state bound to this data source's schema.
    pub fn new_state(&self) -> ResourceData {
        ResourceData::new(self.schema())
    }

    #[instrument(skip_all, fields(customer = %provider.customer))]
    pub async fn read<A: GroupsApi>(
        &self,
        ctx: &ReadContext,
        provider: &ProviderContext<A>,
        data: &mut ResourceData,
    ) -> Result<ReadOutcome, DataSourceError> {
        let mut path = vec![ReadState::Start];
        advance(&mut path, ReadState::Listing);

        let groups = match list_groups(ctx, &provider.client, &provider.customer).await {
            Ok(groups) => groups,
            Err(e) if e.is_not_found() => {
                advance(&mut path, ReadState::NotFound);
                warn!(error = %e, "removing {} because it's gone", GROUPS_KEY);
                Vec::new()
            }
            Err(e) => {
                return Err(DataSourceError::Read {
                    resource: GROUPS_KEY.into(),
                    source: e,
                })
            }
        };

        let projected: Vec<AttrValue> = flatten_groups(&groups)
            .into_iter()
            .map(AttrValue::from)
            .collect();
        let count = projected.len();
        data.set(GROUPS_KEY, AttrValue::List(projected))
            .map_err(|source| DataSourceError::Writeback {
                resource: GROUPS_KEY.into(),
                source,
            })?;
        data.set_id(GROUPS_KEY);

        advance(&mut path, ReadState::Done);
        info!(groups = count, "read groups data source");
        Ok(ReadOutcome {
            path,
            groups: count,
        })
    }
}

fn advance(path: &mut Vec<ReadState>, next: ReadState) {
    if let Some(prev) = path.last() {
        debug!(from = %prev, to = %next, "read state transition");
    }
    path.push(next);
}
