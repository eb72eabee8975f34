//! Contexts handed to a data source read: the per-call cancellation
//! context and the provider-wide typed configuration.

use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use crate::config::ProviderConfig;
use crate::directory::DirectoryClient;
use crate::errors::{ConfigError, CoreError};

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Per-read cancellation context supplied by the host runtime.
#[derive(Debug, Clone)]
pub struct ReadContext {
    cancel: watch::Receiver<bool>,
}

/// The sending half of a [`ReadContext`].
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl ReadContext {
    /// Create a context together with the handle that cancels it.
    pub fn new() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (Self { cancel: rx }, CancelHandle { tx })
    }

    /// A context that is never cancelled.
    pub fn background() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { cancel: rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Resolves once the context is cancelled. Never resolves for a
    /// background context or once the handle has been dropped uncancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.cancel.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

// ---------------------------------------------------------------------------
// Provider context
// ---------------------------------------------------------------------------

/// Provider-wide state shared by every read: the customer scope and a
/// constructed directory client.
#[derive(Clone)]
pub struct ProviderContext<A> {
    pub customer: String,
    pub client: A,
}

impl<A> ProviderContext<A> {
    pub fn new(customer: impl Into<String>, client: A) -> Self {
        Self {
            customer: customer.into(),
            client,
        }
    }
}

impl ProviderContext<DirectoryClient> {
    /// Build the context from a resolved configuration.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, CoreError> {
        let token = config
            .directory
            .access_token
            .clone()
            .ok_or_else(|| ConfigError::EnvVarMissing {
                var: config.directory.access_token_env.clone(),
                field: "directory.access_token_env".into(),
            })?;
        let client = DirectoryClient::new(
            &config.directory.api_url,
            token,
            config.directory.page_size,
            Duration::from_secs(config.directory.timeout_secs),
        )?;
        info!(
            customer = %config.provider.customer_id,
            impersonating = config.directory.impersonated_user_email.as_deref().unwrap_or("-"),
            "provider context ready"
        );
        Ok(Self::new(config.provider.customer_id.clone(), client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_resolves_waiters() {
        let (ctx, handle) = ReadContext::new();
        assert!(!ctx.is_cancelled());

        let waiter = {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.cancelled().await })
        };
        handle.cancel();
        waiter.await.unwrap();
        assert!(ctx.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_never_cancels() {
        let ctx = ReadContext::background();
        let result =
            tokio::time::timeout(Duration::from_secs(60), ctx.cancelled()).await;
        assert!(result.is_err());
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn test_from_config_requires_resolved_token() {
        let config: ProviderConfig = toml::from_str(
            r#"
[directory]
access_token_env = "UNRESOLVED_TOKEN"
"#,
        )
        .unwrap();
        let result = ProviderContext::from_config(&config);
        assert!(matches!(
            result,
            Err(CoreError::Config(ConfigError::EnvVarMissing { .. }))
        ));
    }

    #[test]
    fn test_from_config_uses_customer() {
        let mut config: ProviderConfig = toml::from_str(
            r#"
[provider]
customer_id = "C1"
[directory]
api_url = "http://127.0.0.1:9/"
access_token_env = "T"
"#,
        )
        .unwrap();
        config.directory.access_token = Some("tok".into());
        let ctx = ProviderContext::from_config(&config).unwrap();
        assert_eq!(ctx.customer, "C1");
        assert_eq!(ctx.client.api_url(), "http://127.0.0.1:9");
    }
}
