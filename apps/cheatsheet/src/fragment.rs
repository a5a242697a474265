//! Per-entry fetch results and the markup they render to.

use std::borrow::Cow;

use tracing::error;

use crate::fetch::FragmentSource;

/// Shown in the container while fragments are in flight.
pub const LOADING_PLACEHOLDER: &str =
    r#"<div class="loading">Carregando cheatsheet russo...</div>"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Loaded { name: String, html: String },
    Failed { name: String, reason: String },
}

impl Fragment {
    pub fn name(&self) -> &str {
        match self {
            Fragment::Loaded { name, .. } | Fragment::Failed { name, .. } => name,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Fragment::Failed { .. })
    }

    /// Loaded markup is returned untouched; failures become an error page
    /// naming the fragment and the reason.
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Fragment::Loaded { html, .. } => Cow::Borrowed(html),
            Fragment::Failed { name, reason } => Cow::Owned(format!(
                "<div class=\"page error-page\">\n    <h1>Erro ao carregar {}</h1>\n    <p>{}</p>\n</div>",
                escape_html(name),
                escape_html(reason)
            )),
        }
    }
}

/// Fetches one fragment. Never fails: any error is logged and turned into a
/// `Fragment::Failed`.
pub async fn load_page(source: &dyn FragmentSource, name: &str) -> Fragment {
    match source.fetch(name).await {
        Ok(html) => Fragment::Loaded {
            name: name.to_string(),
            html,
        },
        Err(e) => {
            error!("Error loading page {name}: {e}");
            Fragment::Failed {
                name: name.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

/// Replaces the whole container when assembly itself fails.
pub fn assembly_error_block(message: &str) -> String {
    format!(
        "<div class=\"error\">\n    <h1>Erro ao carregar o cheatsheet</h1>\n    <p>{}</p>\n</div>",
        escape_html(message)
    )
}

pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(|c: char| matches!(c, '&' | '<' | '>' | '"' | '\'')) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
