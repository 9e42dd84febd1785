//! Menu page driver
//!
//! Opens one tab, loads the menu page, waits until the client-side
//! rendering has settled and hands out the rendered DOM. Nothing here
//! retries: a failed load is the caller's problem.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::cdp::protocol::{CDPEvent, CreateTargetResult};
use crate::cdp::{CDPClient, CDPError, CDPSession};
use crate::config::PageConfig;
use crate::error::{PageError, Result};

/// Anything that can produce the CDP `DOM.getDocument` JSON of a fully
/// rendered menu page
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Short label for logs
    fn describe(&self) -> String;

    async fn fetch_document(&self) -> Result<Value>;
}

/// A browser tab showing the menu page
pub struct MenuPage {
    run_id: Uuid,
    config: PageConfig,
    client: Arc<CDPClient>,
    session: CDPSession,
}

impl MenuPage {
    /// Connect to the browser and open a blank tab
    pub async fn open(config: PageConfig) -> Result<Self> {
        config.validate()?;

        let run_id = Uuid::now_v7();
        tracing::info!(run = %run_id, cdp = %config.cdp_url, "connecting to browser");

        let client = CDPClient::connect(&config.cdp_url).await?;
        let created = client
            .send_request(
                "Target.createTarget",
                Some(json!({ "url": "about:blank" })),
                None,
            )
            .await?;
        let created: CreateTargetResult =
            serde_json::from_value(created).map_err(CDPError::from)?;

        let session = CDPSession::attach(client.clone(), created.target_id, None).await?;
        session
            .set_viewport(config.viewport_width, config.viewport_height)
            .await?;

        Ok(Self {
            run_id,
            config,
            client,
            session,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Navigate to the menu and wait for load plus the settle delay
    pub async fn load(&self) -> Result<()> {
        let loaded = Arc::new(Notify::new());
        let signal = loaded.clone();
        let session_id = self.session.session_id.clone();

        // Subscribe before navigating so a fast load is not missed;
        // notify_one keeps the permit until we wait on it.
        self.client.subscribe(
            "Page.loadEventFired",
            Arc::new(move |event: CDPEvent| {
                if event.session_id.as_deref() == Some(session_id.as_str()) {
                    signal.notify_one();
                }
            }),
        );

        tracing::info!(run = %self.run_id, url = %self.config.menu_url, "loading menu page");
        let navigation = self.session.navigate(&self.config.menu_url).await?;
        if let Some(reason) = navigation.get("errorText").and_then(Value::as_str) {
            return Err(PageError::Navigation {
                url: self.config.menu_url.clone(),
                reason: reason.to_string(),
            });
        }

        let timeout = self.config.load_timeout();
        tokio::time::timeout(timeout, loaded.notified())
            .await
            .map_err(|_| PageError::LoadTimeout(timeout))?;

        tracing::debug!(run = %self.run_id, settle = ?self.config.settle(), "page loaded, settling");
        tokio::time::sleep(self.config.settle()).await;
        Ok(())
    }

    /// Rendered DOM of the current page
    pub async fn document(&self) -> Result<Value> {
        Ok(self.session.get_document().await?)
    }

    /// Close the tab and the connection
    pub async fn close(self) -> Result<()> {
        if let Err(e) = self.session.close_target().await {
            tracing::warn!(run = %self.run_id, "closing tab failed: {}", e);
        }
        self.client.close().await?;
        tracing::info!(run = %self.run_id, "browser connection closed");
        Ok(())
    }
}

#[async_trait]
impl DocumentSource for MenuPage {
    fn describe(&self) -> String {
        self.config.menu_url.clone()
    }

    async fn fetch_document(&self) -> Result<Value> {
        self.load().await?;
        self.document().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_rejects_invalid_config() {
        let config = PageConfig {
            cdp_url: "localhost:9222".to_string(),
            ..PageConfig::default()
        };

        assert!(matches!(
            MenuPage::open(config).await,
            Err(PageError::InvalidConfig { .. })
        ));
    }

    #[tokio::test]
    #[ignore] // Needs running Chrome
    async fn test_fetch_menu_document() {
        let page = MenuPage::open(PageConfig::default()).await.unwrap();

        let document = page.fetch_document().await.unwrap();
        assert!(document.get("root").is_some());

        page.close().await.unwrap();
    }
}
