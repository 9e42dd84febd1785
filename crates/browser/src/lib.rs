//! Browser driver for the Mensa menu scraper
//!
//! Talks to an already running Chrome over the DevTools Protocol, loads the
//! menu page and returns its rendered DOM. Browser process lifecycle,
//! scheduling and delivery live elsewhere.
//!
//! # Layout
//!
//! 1. `cdp`: one WebSocket, multiplexed sessions, no retries
//! 2. `page`: the menu tab and the [`DocumentSource`] seam the core reads from
//! 3. `config`: where the browser and the page are

pub mod cdp;
pub mod config;
pub mod error;
pub mod page;

pub use cdp::{CDPClient, CDPError, CDPSession};
pub use config::PageConfig;
pub use error::{PageError, Result};
pub use page::{DocumentSource, MenuPage};
