use std::path::PathBuf;

use anyhow::{Context, Result};
use url::Url;

use crate::assembler::AssemblerConfig;
use crate::manifest::Manifest;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";
const DEFAULT_PAGES_DIR: &str = "pages";
pub const DEFAULT_CONTAINER_ID: &str = "pages-container";

/// Application configuration loaded from environment variables.
/// Everything has a default; only malformed values are rejected.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: Url,
    pub pages_dir: String,
    pub container_id: String,
    pub manifest: Manifest,
    pub shell_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub reveal_spoilers: bool,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup("CHEATSHEET_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = parse_base_url(&base_url)?;

        let manifest = match lookup("CHEATSHEET_MANIFEST_FILE") {
            Some(path) => Manifest::from_json_file(path.as_ref())
                .with_context(|| format!("Failed to read manifest file '{path}'"))?,
            None => lookup("CHEATSHEET_MANIFEST")
                .map(|list| Manifest::parse_list(&list))
                .unwrap_or_default(),
        };

        let reveal_spoilers = match lookup("CHEATSHEET_REVEAL_SPOILERS") {
            Some(v) => parse_bool(&v)
                .with_context(|| format!("CHEATSHEET_REVEAL_SPOILERS must be a boolean, got '{v}'"))?,
            None => false,
        };

        Ok(Config {
            base_url,
            pages_dir: lookup("CHEATSHEET_PAGES_DIR")
                .unwrap_or_else(|| DEFAULT_PAGES_DIR.to_string()),
            container_id: lookup("CHEATSHEET_CONTAINER_ID")
                .unwrap_or_else(|| DEFAULT_CONTAINER_ID.to_string()),
            manifest,
            shell_path: lookup("CHEATSHEET_SHELL").map(PathBuf::from),
            output_path: lookup("CHEATSHEET_OUTPUT").map(PathBuf::from),
            reveal_spoilers,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn assembler_config(&self) -> AssemblerConfig {
        AssemblerConfig {
            manifest: self.manifest.clone(),
            container_id: self.container_id.clone(),
        }
    }
}

/// Relative names are joined onto the base, so it must end in `/`.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url =
        Url::parse(raw).with_context(|| format!("CHEATSHEET_BASE_URL is not a valid URL: '{raw}'"))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:8000/");
        assert_eq!(config.pages_dir, "pages");
        assert_eq!(config.container_id, "pages-container");
        assert_eq!(config.manifest, Manifest::default());
        assert!(config.shell_path.is_none());
        assert!(config.output_path.is_none());
        assert!(!config.reveal_spoilers);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = config_from(&[("CHEATSHEET_BASE_URL", "https://example.org/ru")]).unwrap();
        assert_eq!(config.base_url.as_str(), "https://example.org/ru/");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(config_from(&[("CHEATSHEET_BASE_URL", "not a url")]).is_err());
    }

    #[test]
    fn test_manifest_list() {
        let config = config_from(&[("CHEATSHEET_MANIFEST", "a.html,b.html")]).unwrap();
        assert_eq!(config.manifest.names(), ["a.html", "b.html"]);
    }

    #[test]
    fn test_manifest_file_wins_over_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["from-file.html"]"#).unwrap();
        let path = file.path().to_string_lossy().to_string();
        let config = config_from(&[
            ("CHEATSHEET_MANIFEST", "a.html"),
            ("CHEATSHEET_MANIFEST_FILE", &path),
        ])
        .unwrap();
        assert_eq!(config.manifest.names(), ["from-file.html"]);
    }

    #[test]
    fn test_missing_manifest_file_is_an_error() {
        assert!(config_from(&[("CHEATSHEET_MANIFEST_FILE", "/nonexistent/pages.json")]).is_err());
    }

    #[test]
    fn test_reveal_spoilers_flag() {
        assert!(config_from(&[("CHEATSHEET_REVEAL_SPOILERS", "true")]).unwrap().reveal_spoilers);
        assert!(!config_from(&[("CHEATSHEET_REVEAL_SPOILERS", "0")]).unwrap().reveal_spoilers);
        assert!(config_from(&[("CHEATSHEET_REVEAL_SPOILERS", "maybe")]).is_err());
    }

    #[test]
    fn test_assembler_config_carries_manifest_and_container() {
        let config = config_from(&[
            ("CHEATSHEET_MANIFEST", "a.html"),
            ("CHEATSHEET_CONTAINER_ID", "out"),
        ])
        .unwrap();
        let assembler = config.assembler_config();
        assert_eq!(assembler.container_id, "out");
        assert_eq!(assembler.manifest.names(), ["a.html"]);
    }
}
