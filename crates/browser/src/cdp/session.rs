//! CDP Session - Represents a connection to a specific browser target
//!
//! Lightweight wrapper around CDPClient with target-specific context.
//! All sessions share the same WebSocket.

use super::client::{CDPClient, Result};
use super::protocol::{AttachToTargetResult, SessionId, TargetId, TargetInfo};
use serde_json::{json, Value};
use std::sync::Arc;

/// Domains a menu scrape needs
pub const DEFAULT_DOMAINS: &[&str] = &["Page", "DOM"];

/// CDP Session bound to a specific target
#[derive(Clone)]
pub struct CDPSession {
    /// Shared CDP client
    client: Arc<CDPClient>,

    /// Target this session is attached to
    pub target_id: TargetId,

    /// Session ID assigned by Chrome
    pub session_id: SessionId,

    /// Cached target info
    pub title: String,
    pub url: String,
}

impl CDPSession {
    /// Attach to a target and enable `domains` (default: [`DEFAULT_DOMAINS`])
    pub async fn attach(
        client: Arc<CDPClient>,
        target_id: TargetId,
        domains: Option<&[&str]>,
    ) -> Result<Self> {
        let result = client
            .send_request(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": target_id,
                    "flatten": true,
                })),
                None,
            )
            .await?;

        let attach_result: AttachToTargetResult = serde_json::from_value(result)?;
        let session_id = attach_result.session_id;

        let domains = domains.unwrap_or(DEFAULT_DOMAINS);

        // Enable all domains in parallel
        let enable_futures: Vec<_> = domains
            .iter()
            .map(|domain| {
                let client = client.clone();
                let session_id = session_id.clone();
                async move {
                    client
                        .send_request(format!("{}.enable", domain), None, Some(session_id))
                        .await
                }
            })
            .collect();

        // A failed enable is logged, not fatal: the page may still load
        let results = futures_util::future::join_all(enable_futures).await;
        let failures = results.iter().filter(|r| r.is_err()).count();
        if failures > 0 {
            tracing::warn!("Some domain enables failed: {}/{}", failures, results.len());
        }

        let info_result = client
            .send_request(
                "Target.getTargetInfo",
                Some(json!({ "targetId": &target_id })),
                None,
            )
            .await?;

        let target_info: TargetInfo = serde_json::from_value(info_result["targetInfo"].clone())?;

        Ok(Self {
            client,
            target_id,
            session_id,
            title: target_info.title,
            url: target_info.url,
        })
    }

    /// Send command within this session's context
    pub async fn send(&self, method: impl Into<String>, params: Option<Value>) -> Result<Value> {
        self.client
            .send_request(method, params, Some(self.session_id.clone()))
            .await
    }

    /// Navigate to URL
    pub async fn navigate(&self, url: impl Into<String>) -> Result<Value> {
        self.send("Page.navigate", Some(json!({ "url": url.into() })))
            .await
    }

    /// Full rendered DOM (`DOM.getDocument`, unlimited depth, through
    /// iframes and shadow roots)
    pub async fn get_document(&self) -> Result<Value> {
        self.send(
            "DOM.getDocument",
            Some(json!({ "depth": -1, "pierce": true })),
        )
        .await
    }

    /// Fix the layout viewport so the page renders the desktop menu
    pub async fn set_viewport(&self, width: u32, height: u32) -> Result<Value> {
        self.send(
            "Emulation.setDeviceMetricsOverride",
            Some(json!({
                "width": width,
                "height": height,
                "deviceScaleFactor": 1,
                "mobile": false,
            })),
        )
        .await
    }

    /// Close the tab behind this session
    pub async fn close_target(&self) -> Result<Value> {
        self.client
            .send_request(
                "Target.closeTarget",
                Some(json!({ "targetId": &self.target_id })),
                None,
            )
            .await
    }
}
