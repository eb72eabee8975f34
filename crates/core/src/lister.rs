//! Paginated enumeration of every group in a customer scope.
//!
//! [`GroupPages`] is a lazy, finite sequence of pages that follows the
//! continuation-token chain one request at a time. [`list_groups`] drains
//! it into a single ordered vector, honouring cancellation between and
//! during page fetches.

use std::collections::HashSet;

use tracing::{debug, info, instrument};

use crate::context::ReadContext;
use crate::directory::{GroupRecord, GroupsApi};
use crate::errors::DirectoryError;

/// Lazy page sequence over one customer's groups.
pub struct GroupPages<'a, A> {
    api: &'a A,
    customer: &'a str,
    next_token: Option<String>,
    /// Tokens already sent since the last restart.
    sent_tokens: HashSet<String>,
    pages_fetched: usize,
    finished: bool,
}

impl<'a, A: GroupsApi> GroupPages<'a, A> {
    pub fn new(api: &'a A, customer: &'a str) -> Result<Self, DirectoryError> {
        if customer.trim().is_empty() {
            return Err(DirectoryError::EmptyCustomer);
        }
        Ok(Self {
            api,
            customer,
            next_token: None,
            sent_tokens: HashSet::new(),
            pages_fetched: 0,
            finished: false,
        })
    }

    /// Fetch the next page. Returns `Ok(None)` once the last page has been
    /// handed out; after an error the sequence is finished as well.
    pub async fn next_page(&mut self) -> Result<Option<Vec<GroupRecord>>, DirectoryError> {
        if self.finished {
            return Ok(None);
        }

        let token = self.next_token.take();
        if let Some(ref t) = token {
            self.sent_tokens.insert(t.clone());
        }
        let page = match self
            .api
            .list_groups_page(self.customer, token.as_deref())
            .await
        {
            Ok(page) => page,
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };
        self.pages_fetched += 1;

        match page.continuation() {
            Some(next) if self.sent_tokens.contains(next) => {
                self.finished = true;
                return Err(DirectoryError::PaginationLoop(next.to_string()));
            }
            Some(next) => self.next_token = Some(next.to_string()),
            None => self.finished = true,
        }

        debug!(
            customer = self.customer,
            page = self.pages_fetched,
            count = page.groups.len(),
            "received groups page"
        );
        Ok(Some(page.groups))
    }

    /// Start again from the first page.
    pub fn restart(&mut self) {
        self.next_token = None;
        self.sent_tokens.clear();
        self.pages_fetched = 0;
        self.finished = false;
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Retrieve every group for `customer`, in page-received order.
///
/// Cancellation aborts the in-flight request and discards what has been
/// accumulated so far.
#[instrument(skip(ctx, api))]
pub async fn list_groups<A: GroupsApi>(
    ctx: &ReadContext,
    api: &A,
    customer: &str,
) -> Result<Vec<GroupRecord>, DirectoryError> {
    let mut pages = GroupPages::new(api, customer)?;
    let mut groups = Vec::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                return Err(DirectoryError::Cancelled {
                    pages: pages.pages_fetched(),
                });
            }
            next = pages.next_page() => next?,
        };
        match next {
            Some(page) => groups.extend(page),
            None => break,
        }
    }

    info!(
        customer,
        pages = pages.pages_fetched(),
        groups = groups.len(),
        "listed groups"
    );
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::GroupsPage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves a fixed script of pages, chained by tokens `p1`, `p2`, ...
    struct ScriptedApi {
        pages: Vec<Result<Vec<&'static str>, u16>>,
        calls: AtomicUsize,
        seen_tokens: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedApi {
        fn new(pages: Vec<Result<Vec<&'static str>, u16>>) -> Self {
            Self {
                pages,
                calls: AtomicUsize::new(0),
                seen_tokens: Mutex::new(Vec::new()),
            }
        }
    }

    impl GroupsApi for ScriptedApi {
        async fn list_groups_page(
            &self,
            _customer: &str,
            page_token: Option<&str>,
        ) -> Result<GroupsPage, DirectoryError> {
            self.seen_tokens
                .lock()
                .unwrap()
                .push(page_token.map(String::from));
            let idx = match page_token {
                None => 0,
                Some(t) => t.trim_start_matches('p').parse::<usize>().unwrap(),
            };
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.pages[idx] {
                Ok(ids) => Ok(GroupsPage {
                    groups: ids
                        .iter()
                        .map(|id| GroupRecord {
                            id: id.to_string(),
                            email: format!("{}@x.com", id),
                            ..Default::default()
                        })
                        .collect(),
                    next_page_token: (idx + 1 < self.pages.len()).then(|| format!("p{}", idx + 1)),
                    ..Default::default()
                }),
                Err(404) => Err(DirectoryError::NotFound("customer".into())),
                Err(status) => Err(DirectoryError::ApiError {
                    status: *status,
                    body: "boom".into(),
                }),
            }
        }
    }

    /// Always returns the same token.
    struct LoopingApi;

    impl GroupsApi for LoopingApi {
        async fn list_groups_page(
            &self,
            _customer: &str,
            _page_token: Option<&str>,
        ) -> Result<GroupsPage, DirectoryError> {
            Ok(GroupsPage {
                groups: vec![GroupRecord::default()],
                next_page_token: Some("same".into()),
                ..Default::default()
            })
        }
    }

    /// Hands out `A`, then `B`, then `A` again, forever.
    struct CyclingApi {
        calls: AtomicUsize,
    }

    impl GroupsApi for CyclingApi {
        async fn list_groups_page(
            &self,
            _customer: &str,
            page_token: Option<&str>,
        ) -> Result<GroupsPage, DirectoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = match page_token {
                Some("A") => "B",
                _ => "A",
            };
            Ok(GroupsPage {
                groups: vec![GroupRecord::default()],
                next_page_token: Some(next.into()),
                ..Default::default()
            })
        }
    }

    fn ids(groups: &[GroupRecord]) -> Vec<&str> {
        groups.iter().map(|g| g.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_accumulates_pages_in_order() {
        let api = ScriptedApi::new(vec![Ok(vec!["g1", "g2"]), Ok(vec![]), Ok(vec!["g3"])]);
        let groups = list_groups(&ReadContext::background(), &api, "C1")
            .await
            .unwrap();
        assert_eq!(ids(&groups), vec!["g1", "g2", "g3"]);
        assert_eq!(
            *api.seen_tokens.lock().unwrap(),
            vec![None, Some("p1".to_string()), Some("p2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_single_empty_page() {
        let api = ScriptedApi::new(vec![Ok(vec![])]);
        let groups = list_groups(&ReadContext::background(), &api, "C1")
            .await
            .unwrap();
        assert!(groups.is_empty());
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_mid_pagination_stops() {
        let api = ScriptedApi::new(vec![Ok(vec!["g1"]), Err(500), Ok(vec!["g3"])]);
        let err = list_groups(&ReadContext::background(), &api, "C1")
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::ApiError { status: 500, .. }));
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_not_found_is_distinguishable() {
        let api = ScriptedApi::new(vec![Err(404)]);
        let err = list_groups(&ReadContext::background(), &api, "gone")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_empty_customer_rejected_before_request() {
        let api = ScriptedApi::new(vec![Ok(vec!["g1"])]);
        let err = list_groups(&ReadContext::background(), &api, " ")
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::EmptyCustomer));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancelled_context_aborts() {
        let api = ScriptedApi::new(vec![Ok(vec!["g1"]), Ok(vec!["g2"])]);
        let (ctx, handle) = ReadContext::new();
        handle.cancel();
        let err = list_groups(&ctx, &api, "C1").await.unwrap_err();
        assert!(matches!(err, DirectoryError::Cancelled { pages: 0 }));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_repeated_token_is_a_loop() {
        let mut pages = GroupPages::new(&LoopingApi, "C1").unwrap();
        assert_eq!(pages.next_page().await.unwrap().unwrap().len(), 1);
        let err = pages.next_page().await.unwrap_err();
        assert!(matches!(err, DirectoryError::PaginationLoop(ref t) if t == "same"));
        assert!(pages.is_finished());
        assert!(pages.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_token_cycle_is_a_loop() {
        let api = CyclingApi {
            calls: AtomicUsize::new(0),
        };
        let err = list_groups(&ReadContext::background(), &api, "C1")
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::PaginationLoop(ref t) if t == "A"));
        // None -> A, A -> B, B -> A (already sent).
        assert_eq!(api.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_restart_forgets_sent_tokens() {
        let api = ScriptedApi::new(vec![Ok(vec!["g1"]), Ok(vec!["g2"]), Ok(vec!["g3"])]);
        let mut pages = GroupPages::new(&api, "C1").unwrap();
        while pages.next_page().await.unwrap().is_some() {}

        pages.restart();
        let mut seen = Vec::new();
        while let Some(page) = pages.next_page().await.unwrap() {
            seen.extend(page);
        }
        assert_eq!(ids(&seen), vec!["g1", "g2", "g3"]);
    }

    #[tokio::test]
    async fn test_pages_restart_from_first() {
        let api = ScriptedApi::new(vec![Ok(vec!["g1"]), Ok(vec!["g2"])]);
        let mut pages = GroupPages::new(&api, "C1").unwrap();

        let first = pages.next_page().await.unwrap().unwrap();
        assert_eq!(ids(&first), vec!["g1"]);
        let second = pages.next_page().await.unwrap().unwrap();
        assert_eq!(ids(&second), vec!["g2"]);
        assert!(pages.next_page().await.unwrap().is_none());
        assert_eq!(pages.pages_fetched(), 2);

        pages.restart();
        let again = pages.next_page().await.unwrap().unwrap();
        assert_eq!(ids(&again), vec!["g1"]);
        assert_eq!(pages.pages_fetched(), 1);
    }
}
