use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use url::Url;
use webgeo::{Document, PageController, Site, ViewerConfig};

const USAGE: &str = "usage: webgeo <page-url> [snapshot.html]";
const BLANK_PAGE: &str = "<html><head></head><body></body></html>";

fn main() -> Result<()> {
    let subscriber_result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init();
    if subscriber_result.is_err() {
        // tracing was already initialised; continue silently
    }

    let mut args = env::args().skip(1);
    let raw_url = args.next().context(USAGE)?;
    let location = Url::parse(&raw_url).with_context(|| format!("invalid page URL {raw_url:?}"))?;
    let html = match args.next() {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("failed to read snapshot {path}"))?,
        None => BLANK_PAGE.to_string(),
    };

    let config_path = env::var("WEBGEO_CONFIG").ok().map(PathBuf::from);
    let config = match ViewerConfig::load(config_path) {
        Ok(config) => config,
        Err(err) => {
            warn!("Failed to load viewer configuration: {err}. Using defaults.");
            ViewerConfig::load(None).context("default viewer configuration")?
        }
    };

    let document = Document::parse(location, &html);
    let controller = PageController::install(&document, config);
    document.finish_loading();

    let Some(site) = controller.site() else {
        let supported: Vec<&str> = Site::ALL.iter().map(|site| site.name()).collect();
        println!("no adapter for {raw_url} (supported: {})", supported.join(", "));
        return Ok(());
    };
    let controls = controller.controls();
    if controls.is_empty() {
        println!("{site}: no anchor found, nothing injected");
        return Ok(());
    }

    for control in &controls {
        let before = document.opened_tabs().len();
        control.click();
        document.run_tasks();
        match document.opened_tabs().get(before) {
            Some(link) => println!("{site}: {link}"),
            None => println!("{site}: no viewport in page"),
        }
    }
    Ok(())
}
