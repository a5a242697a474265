use std::path::Path;

use tracing::info;

use crate::dom::Document;
use crate::errors::AppError;
use crate::fragment::escape_html;

/// Page the fragments are assembled into when no shell file is configured.
pub fn default_shell(container_id: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
<meta charset="utf-8">
<title>Russian Cheatsheet</title>
<style>
.spoiler {{ background: #333; color: transparent; cursor: pointer; }}
.spoiler.revealed {{ background: none; color: inherit; }}
.error-page, .error {{ border: 2px solid #c0392b; padding: 1em; }}
@media print {{ .page {{ page-break-after: always; }} }}
</style>
</head>
<body>
<div id="{}"></div>
</body>
</html>
"#,
        escape_html(container_id)
    )
}

/// Loads the document the assembler writes into: the file at `path`, or the
/// built-in shell.
pub async fn load_shell(path: Option<&Path>, container_id: &str) -> Result<Document, AppError> {
    match path {
        Some(path) => {
            let html = tokio::fs::read_to_string(path).await?;
            info!("Loaded shell document from {}", path.display());
            Ok(Document::parse(&html))
        }
        None => Ok(Document::parse(&default_shell(container_id))),
    }
}
