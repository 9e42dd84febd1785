//! One scrape cycle: fetch → availability check → normalize → render

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use clap::ValueEnum;
use mensa_browser::{DocumentSource, PageError};
use mensa_dom::{is_menu_available, DomSerializer, DomService, NormalizeReport};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Html,
}

#[derive(Debug)]
pub enum Scrape {
    /// The page says the canteen is closed today, or shows no day plan
    Closed,
    Menu {
        content: String,
        report: NormalizeReport,
    },
}

/// A CDP document saved earlier (see the `dump_document` example)
pub struct SnapshotFile {
    pub path: PathBuf,
}

#[async_trait]
impl DocumentSource for SnapshotFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch_document(&self) -> mensa_browser::Result<Value> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| PageError::Snapshot(format!("{}: {e}", self.path.display())))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| PageError::Snapshot(format!("{}: {e}", self.path.display())))
    }
}

pub async fn scrape(
    source: &dyn DocumentSource,
    format: Format,
    dump_raw: Option<&Path>,
) -> anyhow::Result<Scrape> {
    let document = source
        .fetch_document()
        .await
        .with_context(|| format!("fetching document from {}", source.describe()))?;

    if let Some(path) = dump_raw {
        let raw = serde_json::to_vec_pretty(&document)?;
        tokio::fs::write(path, raw)
            .await
            .with_context(|| format!("writing raw document to {}", path.display()))?;
        tracing::info!(path = %path.display(), "raw document written");
    }

    render(&document, format)
}

/// Everything after the fetch; synchronous and side-effect free
pub fn render(document: &Value, format: Format) -> anyhow::Result<Scrape> {
    let mut service = DomService::new();
    service
        .parse_cdp_dom_tree(document)
        .context("importing CDP document")?;

    let Some(day_plan) = is_menu_available(service.arena())? else {
        tracing::warn!("no menu available today");
        return Ok(Scrape::Closed);
    };

    let report = service.normalize().context("normalizing menu")?;
    tracing::info!(
        guest_rows = report.guest_rows_removed,
        allergen_notes = report.allergen_notes_removed,
        reordered = report.price_lists_reordered,
        "menu normalized"
    );

    let serializer = DomSerializer::new();
    let content = match format {
        Format::Text => serializer.to_text(service.arena(), day_plan)?,
        Format::Html => serializer.to_html(service.arena(), day_plan)?,
    };

    Ok(Scrape::Menu { content, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StaticSource(Value);

    #[async_trait]
    impl DocumentSource for StaticSource {
        fn describe(&self) -> String {
            "static".to_string()
        }

        async fn fetch_document(&self) -> mensa_browser::Result<Value> {
            Ok(self.0.clone())
        }
    }

    /// Hands out CDP node JSON with unique ids
    #[derive(Default)]
    struct Cdp {
        next: u64,
    }

    impl Cdp {
        fn id(&mut self) -> u64 {
            self.next += 1;
            self.next
        }

        fn el(&mut self, tag: &str, attrs: &[&str], children: Vec<Value>) -> Value {
            let id = self.id();
            json!({
                "nodeId": id, "backendNodeId": id, "nodeType": 1,
                "nodeName": tag, "attributes": attrs, "children": children
            })
        }

        fn text(&mut self, value: &str) -> Value {
            let id = self.id();
            json!({
                "nodeId": id, "backendNodeId": id, "nodeType": 3,
                "nodeName": "#text", "nodeValue": value
            })
        }

        fn document(&mut self, children: Vec<Value>) -> Value {
            let id = self.id();
            json!({
                "root": {
                    "nodeId": id, "backendNodeId": id, "nodeType": 9,
                    "nodeName": "#document", "children": children
                }
            })
        }

        fn price_row(&mut self, label: &str, class: &str, value: &str) -> Value {
            let dt_text = self.text(label);
            let dt = self.el("DT", &[], vec![dt_text]);
            let dd_text = self.text(value);
            let dd = self.el("DD", &["class", class], vec![dd_text]);
            self.el("DIV", &[], vec![dt, dd])
        }

        fn weekday_tabs(&mut self, day_plan_children: Vec<Value>) -> Value {
            let plan = self.el(
                "DIV",
                &["class", "menu-tagesplan", "style", "display: block"],
                day_plan_children,
            );
            let tabs = self.el("DIV", &["id", "tabsWeekdaysMenu"], vec![plan]);
            let body = self.el("BODY", &[], vec![tabs]);
            let html = self.el("HTML", &[], vec![body]);
            self.document(vec![html])
        }
    }

    fn open_day() -> Value {
        let mut cdp = Cdp::default();

        let toggle_text = cdp.text("Mittagessen");
        let toggle = cdp.el(
            "BUTTON",
            &["data-accordion-target", "#accordion-collapse-body-1", "aria-expanded", "false"],
            vec![toggle_text],
        );
        let header = cdp.el("H2", &["id", "accordion-collapse-heading-1"], vec![toggle]);

        let title_text = cdp.text("Linsencurry");
        let title = cdp.el("H3", &[], vec![title_text]);
        let note_text = cdp.text("enthält Allergene: Sellerie");
        let note = cdp.el("SMALL", &["class", "allergen-note"], vec![note_text]);
        let rows = vec![
            cdp.price_row("Gäste", "price-guest", "6,10 €"),
            cdp.price_row("Studierende", "price-student", "3,20 €"),
            cdp.price_row("Mitarbeiter", "price-staff", "4,90 €"),
        ];
        let dl = cdp.el("DL", &[], rows);
        let item = cdp.el("DIV", &["class", "menu-highlight"], vec![title, note, dl]);
        let section = cdp.el(
            "DIV",
            &["id", "accordion-collapse-body-1", "class", "hidden"],
            vec![item],
        );

        cdp.weekday_tabs(vec![header, section])
    }

    fn closed_day() -> Value {
        let mut cdp = Cdp::default();
        let notice_text = cdp.text("Heute keine Essensausgabe");
        let notice = cdp.el("P", &[], vec![notice_text]);
        cdp.weekday_tabs(vec![notice])
    }

    #[tokio::test]
    async fn test_scrape_open_day_as_text() {
        let source = StaticSource(open_day());

        let result = scrape(&source, Format::Text, None).await.unwrap();

        match result {
            Scrape::Menu { content, report } => {
                assert_eq!(content, "Linsencurry\nMitarbeiter 4,90 €\nStudierende 3,20 €");
                assert_eq!(report.guest_rows_removed, 1);
                assert_eq!(report.headers_removed, 1);
            }
            Scrape::Closed => panic!("expected a menu"),
        }
    }

    #[tokio::test]
    async fn test_scrape_closed_day() {
        let source = StaticSource(closed_day());
        let result = scrape(&source, Format::Text, None).await.unwrap();
        assert!(matches!(result, Scrape::Closed));
    }

    #[test]
    fn test_render_html_drops_scaffolding() {
        let Scrape::Menu { content, .. } = render(&open_day(), Format::Html).unwrap() else {
            panic!("expected a menu");
        };

        assert!(content.starts_with("<div class=\"menu-tagesplan\""));
        assert!(!content.contains("accordion-collapse-heading"));
        assert!(!content.contains("price-guest"));
        assert!(!content.contains("Sellerie"));
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("menu.json");
        let raw = dir.path().join("raw.json");
        tokio::fs::write(&snapshot, serde_json::to_vec(&open_day()).unwrap())
            .await
            .unwrap();

        let source = SnapshotFile { path: snapshot };
        let result = scrape(&source, Format::Text, Some(&raw)).await.unwrap();

        assert!(matches!(result, Scrape::Menu { .. }));
        let written: Value = serde_json::from_slice(&std::fs::read(&raw).unwrap()).unwrap();
        assert_eq!(written, open_day());
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_an_error() {
        let source = SnapshotFile {
            path: PathBuf::from("/definitely/not/here.json"),
        };

        let err = scrape(&source, Format::Text, None).await.unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.json"));
    }
}
