use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::viewport::Fragment;

const DEFAULT_VIEWER: &str = "https://webgiss.github.io/webgeo/";
const DEFAULT_ASSETS: &str = "https://webgiss.github.io/webgeo/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read viewer config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse viewer URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    viewer: Option<String>,
    assets: Option<String>,
}

/// Where viewer links point and where injected icons are served from.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    viewer: Url,
    assets: Url,
}

impl ViewerConfig {
    /// Load from a YAML file; a missing path or file yields the defaults.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let raw = match config_path {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path)?;
                serde_yaml::from_str::<Option<RawConfig>>(&contents)?.unwrap_or_default()
            }
            _ => RawConfig::default(),
        };

        let viewer = Url::parse(raw.viewer.as_deref().unwrap_or(DEFAULT_VIEWER))?;
        let assets = Url::parse(raw.assets.as_deref().unwrap_or(DEFAULT_ASSETS))?;
        Ok(Self::new(viewer, assets))
    }

    pub fn new(viewer: Url, assets: Url) -> Self {
        Self {
            viewer,
            assets: with_trailing_slash(assets),
        }
    }

    pub fn viewer(&self) -> &Url {
        &self.viewer
    }

    /// Viewer URL carrying `fragment`.
    pub fn link(&self, fragment: &Fragment) -> Url {
        let mut url = self.viewer.clone();
        url.set_fragment(Some(&fragment.to_string()));
        url
    }

    /// Absolute URL of an icon shipped next to the viewer.
    pub fn asset(&self, name: &str) -> String {
        self.assets
            .join(name)
            .map(String::from)
            .unwrap_or_else(|_| name.to_string())
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::ViewportState;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_default() {
        let config = ViewerConfig::load(None).unwrap();
        assert_eq!(config.viewer().as_str(), DEFAULT_VIEWER);
        assert_eq!(
            config.asset("earth-32.png"),
            "https://webgiss.github.io/webgeo/earth-32.png"
        );
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let config = ViewerConfig::load(Some(PathBuf::from("/nonexistent/webgeo.yaml"))).unwrap();
        assert_eq!(config.viewer().as_str(), DEFAULT_VIEWER);
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        use std::io::Write;
        writeln!(
            file,
            "viewer: https://maps.example/view\nassets: https://cdn.example/icons"
        )
        .unwrap();

        let config = ViewerConfig::load(Some(file.path().to_path_buf())).unwrap();
        let link = config.link(&Fragment::Map(ViewportState::new(48.85, 2.35, 10.0)));
        assert_eq!(link.as_str(), "https://maps.example/view#map=10/48.85/2.35");
        assert_eq!(
            config.asset("earth-16.png"),
            "https://cdn.example/icons/earth-16.png"
        );
    }

    #[test]
    fn empty_file_uses_defaults() {
        let file = NamedTempFile::new().unwrap();
        let config = ViewerConfig::load(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.viewer().as_str(), DEFAULT_VIEWER);
    }

    #[test]
    fn rejects_invalid_url() {
        let mut file = NamedTempFile::new().unwrap();
        use std::io::Write;
        writeln!(file, "viewer: not a url").unwrap();
        assert!(matches!(
            ViewerConfig::load(Some(file.path().to_path_buf())),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn google_links_keep_the_position_segment() {
        let config = ViewerConfig::load(None).unwrap();
        let link = config.link(&Fragment::Google("@48.85,2.35,15z".into()));
        assert_eq!(
            link.as_str(),
            "https://webgiss.github.io/webgeo/#google=@48.85,2.35,15z"
        );
    }
}
