use std::path::Path;

use serde::Deserialize;

use crate::errors::AppError;

/// Pages shipped with the Russian cheatsheet, in print order.
pub const DEFAULT_PAGES: &[&str] = &[
    "page1-amigas.html",
    "page2-inimigas.html",
    "page3-simbolos1.html",
    "page4-simbolos2.html",
    "page5-especiais.html",
    "page6-essenciais.html",
    "page7-numeros.html",
    "page8-dias-tempo.html",
    "page9-perguntas-cores.html",
    "page10-familia-verbos.html",
];

/// Ordered fragment names. Order is the order pages appear in the document;
/// duplicates are kept and fetched once per occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Manifest(Vec<String>);

impl Default for Manifest {
    fn default() -> Self {
        Self(DEFAULT_PAGES.iter().map(|p| p.to_string()).collect())
    }
}

impl Manifest {
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses a comma-separated list. Blank entries are skipped.
    pub fn parse_list(list: &str) -> Self {
        Self(
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Reads a JSON array of names.
    pub fn from_json_file(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl<S: Into<String>> FromIterator<S> for Manifest {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_manifest_order() {
        let m = Manifest::default();
        assert_eq!(m.len(), 10);
        assert_eq!(m.names()[0], "page1-amigas.html");
        assert_eq!(m.names()[9], "page10-familia-verbos.html");
    }

    #[test]
    fn test_parse_list_trims_and_keeps_duplicates() {
        let m = Manifest::parse_list(" a.html, b.html,,a.html ");
        assert_eq!(m.names(), ["a.html", "b.html", "a.html"]);
    }

    #[test]
    fn test_parse_list_empty() {
        assert!(Manifest::parse_list("  ").is_empty());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["x.html", "y.html"]"#).unwrap();
        let m = Manifest::from_json_file(file.path()).unwrap();
        assert_eq!(m, ["x.html", "y.html"].into_iter().collect());
    }

    #[test]
    fn test_from_json_file_rejects_non_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"pages": []}}"#).unwrap();
        assert!(matches!(
            Manifest::from_json_file(file.path()),
            Err(AppError::Manifest(_))
        ));
    }
}
