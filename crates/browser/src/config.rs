//! Page driver configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::{PageError, Result};

/// Weekly plan of Mensa Flugplatz / Cafe Flugplatz, Freiburg
pub const DEFAULT_MENU_URL: &str =
    "https://www.swfr.de/essen/mensen-cafes-speiseplaene/freiburg/mensa-flugplatz-cafe-flugplatz";

/// Browser-level DevTools WebSocket (as printed by `--remote-debugging-port`)
pub const DEFAULT_CDP_URL: &str = "ws://localhost:9222/devtools/browser";

/// How to reach the browser and the menu page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub cdp_url: String,
    pub menu_url: String,
    /// Upper bound for `Page.loadEventFired` after navigation
    pub load_timeout_ms: u64,
    /// Extra wait after load for client-side rendering
    pub settle_ms: u64,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            cdp_url: DEFAULT_CDP_URL.to_string(),
            menu_url: DEFAULT_MENU_URL.to_string(),
            load_timeout_ms: 15_000,
            settle_ms: 3_000,
            viewport_width: 1279,
            viewport_height: 2000,
        }
    }
}

impl PageConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Reject URLs the driver cannot use before any connection is made
    pub fn validate(&self) -> Result<()> {
        check_url("cdp_url", &self.cdp_url, &["ws", "wss"])?;
        check_url("menu_url", &self.menu_url, &["http", "https"])?;

        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(PageError::InvalidConfig {
                field: "viewport",
                reason: "width and height must be positive".to_string(),
            });
        }

        Ok(())
    }
}

fn check_url(field: &'static str, value: &str, schemes: &[&str]) -> Result<Url> {
    let url = Url::parse(value).map_err(|e| PageError::InvalidConfig {
        field,
        reason: format!("{value}: {e}"),
    })?;

    if !schemes.contains(&url.scheme()) {
        return Err(PageError::InvalidConfig {
            field,
            reason: format!("scheme {} not in {:?}", url.scheme(), schemes),
        });
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[test]
    fn test_default_is_valid() {
        let config = PageConfig::default();
        assert_ok!(config.validate());
        assert_eq!(config.cdp_url, "ws://localhost:9222/devtools/browser");
        assert_eq!(config.load_timeout(), Duration::from_secs(15));
        assert_eq!(config.settle(), Duration::from_secs(3));
    }

    #[test]
    fn test_rejects_bad_urls() {
        let config = PageConfig {
            cdp_url: "http://localhost:9222".to_string(),
            ..PageConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PageError::InvalidConfig { field: "cdp_url", .. })
        ));

        let config = PageConfig {
            menu_url: "not a url".to_string(),
            ..PageConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PageError::InvalidConfig { field: "menu_url", .. })
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: PageConfig =
            serde_json::from_str(r#"{"settle_ms": 500, "cdp_url": "ws://chrome:9222/devtools/browser/abc"}"#)
                .unwrap();

        assert_eq!(config.settle_ms, 500);
        assert_eq!(config.menu_url, DEFAULT_MENU_URL);
        assert_eq!(config.viewport_width, 1279);
    }
}
