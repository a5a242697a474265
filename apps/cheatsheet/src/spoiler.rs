//! Click-to-reveal spoilers.
//!
//! A single document-level listener handles every spoiler, including ones
//! inserted after it was attached.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dom::{ClickEvent, ClickListener, Document};

pub const SPOILER_CLASS: &str = "spoiler";
pub const REVEALED_CLASS: &str = "revealed";
const LISTENER_NAME: &str = "spoiler-toggle";

/// Toggles `revealed` on the nearest `.spoiler` around the click target.
pub struct SpoilerToggle;

impl ClickListener for SpoilerToggle {
    fn name(&self) -> &str {
        LISTENER_NAME
    }

    fn handle(&self, document: &mut Document, event: &ClickEvent) {
        let Some(spoiler) = document.closest_with_class(event.target, SPOILER_CLASS) else {
            return;
        };
        if let Some(revealed) = document.class_list_toggle(spoiler, REVEALED_CLASS) {
            debug!("Spoiler {spoiler:?} revealed={revealed}");
        }
    }
}

/// Attaches the spoiler listener. Returns `false` if it was already attached.
pub fn initialize_spoilers(document: &mut Document) -> bool {
    if document.has_click_listener(LISTENER_NAME) {
        return false;
    }
    document.add_click_listener(Arc::new(SpoilerToggle));
    true
}

/// Clicks every spoiler that is not yet revealed, so a printout shows the
/// answers. Goes through the regular click path, so nothing changes unless
/// the listener is attached. Returns how many spoilers ended up revealed.
pub fn reveal_all_spoilers(document: &mut Document) -> usize {
    let hidden: Vec<_> = document
        .get_elements_by_class_name(SPOILER_CLASS)
        .into_iter()
        .filter(|s| !document.class_list_contains(*s, REVEALED_CLASS))
        .collect();
    for spoiler in &hidden {
        document.click(*spoiler);
    }
    let revealed = hidden
        .iter()
        .filter(|s| document.class_list_contains(**s, REVEALED_CLASS))
        .count();
    if revealed < hidden.len() {
        warn!(
            "{} of {} hidden spoilers were not revealed; is the spoiler listener attached?",
            hidden.len() - revealed,
            hidden.len()
        );
    }
    info!("Revealed {revealed} spoilers");
    revealed
}
