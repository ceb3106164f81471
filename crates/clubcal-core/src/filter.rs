use tracing::debug;

use crate::event::{Event, RegionFilter};

/// Keeps the events visible under `filter`, preserving source order.
///
/// This runs before indexing so that nothing reachable from the built index
/// belongs to a hidden region.
#[tracing::instrument(skip(events), fields(total = events.len()))]
pub fn apply_region_filter(events: &[Event], filter: RegionFilter) -> Vec<Event> {
    let visible: Vec<Event> = events
        .iter()
        .filter(|event| filter.admits(event.region))
        .cloned()
        .collect();

    debug!(
        region = %filter,
        visible = visible.len(),
        "applied region filter"
    );
    visible
}
