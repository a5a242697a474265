use std::io::Write;
use std::sync::Arc;

use crate::assembler::{AssemblerConfig, AssemblyReport, PageAssembler};
use crate::dom::Document;
use crate::errors::AppError;
use crate::fetch::FragmentSource;
use crate::manifest::Manifest;
use crate::spoiler;

/// Public entry point: everything a caller needs to build, interact with and
/// print the cheatsheet.
pub struct Cheatsheet {
    assembler: PageAssembler,
}

impl Cheatsheet {
    pub fn new(config: AssemblerConfig, source: Arc<dyn FragmentSource>) -> Self {
        Self {
            assembler: PageAssembler::new(config, source),
        }
    }

    /// The manifest, in print order.
    pub fn pages(&self) -> &Manifest {
        self.assembler.manifest()
    }

    pub async fn load_all_pages(&self, document: &mut Document) -> AssemblyReport {
        self.assembler.load_all_pages(document).await
    }

    pub fn initialize_spoilers(&self, document: &mut Document) -> bool {
        spoiler::initialize_spoilers(document)
    }

    pub fn reveal_all_spoilers(&self, document: &mut Document) -> usize {
        spoiler::reveal_all_spoilers(document)
    }

    /// Assembles the pages, then attaches the spoiler listener.
    pub async fn on_document_ready(&self, document: &mut Document) -> AssemblyReport {
        let report = self.load_all_pages(document).await;
        self.initialize_spoilers(document);
        report
    }

    /// Writes the whole document as HTML.
    pub fn print_cheatsheet(&self, document: &Document, mut writer: impl Write) -> Result<(), AppError> {
        writer.write_all(document.to_html().as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}
