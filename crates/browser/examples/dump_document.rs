//! Load the menu page and print its rendered DOM as CDP JSON.
//!
//! The output can be replayed offline with `mensa --snapshot <file>`.
//!
//! ```text
//! cargo run -p mensa-browser --example dump_document -- ws://localhost:9222/devtools/browser/<id> > menu.json
//! ```

use mensa_browser::{DocumentSource, MenuPage, PageConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let mut config = PageConfig::default();
    if let Some(cdp_url) = std::env::args().nth(1) {
        config.cdp_url = cdp_url;
    }

    let page = MenuPage::open(config).await?;
    let document = page.fetch_document().await?;
    page.close().await?;

    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
