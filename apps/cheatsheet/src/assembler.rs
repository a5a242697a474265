//! Page assembly: fetch every manifest entry in parallel, join, and write the
//! result into the container element.
//!
//! # Join semantics
//! Each entry gets its own task. `join_all` waits for every task and yields
//! results in spawn order, so the container always receives exactly one
//! fragment per manifest entry, in manifest order, whatever order the
//! responses arrive in. A hung request holds the whole pass.
//!
//! # Failure tiers
//! - Fragment: fetch errors become an error page in place of the fragment.
//! - Assembly: a missing container leaves the document untouched; a task that
//!   panics or is cancelled replaces the container with a generic error block.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::task::JoinError;
use tracing::{error, info, warn};

use crate::dom::{Document, NodeId};
use crate::fetch::FragmentSource;
use crate::fragment::{assembly_error_block, load_page, Fragment, LOADING_PLACEHOLDER};
use crate::manifest::Manifest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblerConfig {
    pub manifest: Manifest,
    /// `id` of the element whose content is replaced.
    pub container_id: String,
}

/// What one assembly pass did to the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AssemblyReport {
    Assembled { loaded: usize, failed: usize },
    ContainerMissing { container_id: String },
    Aborted { reason: String },
}

pub struct PageAssembler {
    config: AssemblerConfig,
    source: Arc<dyn FragmentSource>,
}

impl PageAssembler {
    pub fn new(config: AssemblerConfig, source: Arc<dyn FragmentSource>) -> Self {
        Self { config, source }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.config.manifest
    }

    /// Runs one full pass. Never returns an error and never panics on fetch
    /// failures; the outcome is reported and logged.
    pub async fn load_all_pages(&self, document: &mut Document) -> AssemblyReport {
        let container_id = &self.config.container_id;
        let Some(container) = document.get_element_by_id(container_id) else {
            error!("Container #{container_id} not found");
            return AssemblyReport::ContainerMissing {
                container_id: container_id.clone(),
            };
        };

        if let Err(e) = document.set_inner_html(container, LOADING_PLACEHOLDER) {
            error!("Container #{container_id} cannot hold pages: {e}");
            return AssemblyReport::Aborted {
                reason: e.to_string(),
            };
        }

        match self.fetch_all().await {
            Ok(fragments) => self.write_fragments(document, container, &fragments),
            Err(e) => {
                error!("Error loading pages: {e}");
                let reason = e.to_string();
                if let Err(e) = document.set_inner_html(container, &assembly_error_block(&reason)) {
                    error!("Failed to write error block into #{container_id}: {e}");
                }
                AssemblyReport::Aborted { reason }
            }
        }
    }

    /// One task per manifest entry; results come back in manifest order.
    async fn fetch_all(&self) -> Result<Vec<Fragment>, JoinError> {
        let tasks = self.config.manifest.names().iter().map(|name| {
            let source = Arc::clone(&self.source);
            let name = name.clone();
            tokio::spawn(async move { load_page(source.as_ref(), &name).await })
        });

        join_all(tasks).await.into_iter().collect()
    }

    fn write_fragments(
        &self,
        document: &mut Document,
        container: NodeId,
        fragments: &[Fragment],
    ) -> AssemblyReport {
        let html = fragments
            .iter()
            .map(Fragment::render)
            .collect::<Vec<_>>()
            .join("\n");

        if let Err(e) = document.set_inner_html(container, &html) {
            error!("Failed to write pages into #{}: {e}", self.config.container_id);
            return AssemblyReport::Aborted {
                reason: e.to_string(),
            };
        }

        let failed = fragments.iter().filter(|f| f.is_failed()).count();
        let loaded = fragments.len() - failed;
        if failed == 0 {
            info!("All {loaded} pages loaded");
        } else {
            warn!("Loaded {loaded} pages, {failed} failed");
        }

        AssemblyReport::Assembled { loaded, failed }
    }
}
