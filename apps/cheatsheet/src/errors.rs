use thiserror::Error;

/// Errors at the edges of the assembler: reading the shell and manifest,
/// printing the document. Fetch failures never reach this type; they are
/// rendered into the page instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}
