use crate::types::{NormalizedObservation, RegionKey, RegionState};
use std::collections::{BTreeMap, BTreeSet};

/// Prefix of the comment derived from an estimated restoration time
pub const RESTORATION_PREFIX: &str = "Відновлення";

/// Merges normalized observations into one `RegionState` per region.
///
/// Status conflicts resolve by severity: the worst status wins and ties keep
/// the first observation seen. Schedules, cities and comments are
/// de-duplicated in first-seen order.
#[derive(Debug, Default, Clone, Copy)]
pub struct Reconciler;

impl Reconciler {
    pub fn new() -> Self {
        Self
    }

    pub fn merge(&self, observations: &[NormalizedObservation]) -> BTreeMap<RegionKey, RegionState> {
        let mut merged: BTreeMap<RegionKey, RegionState> = BTreeMap::new();

        for obs in observations {
            let state = merged
                .entry(obs.region_key.clone())
                .or_insert_with(|| RegionState {
                    region_key: obs.region_key.clone(),
                    display_name: obs.display_name.clone(),
                    status: obs.status,
                    sources: BTreeSet::new(),
                    schedules: Vec::new(),
                    cities: Vec::new(),
                    comments: Vec::new(),
                    last_update: obs.observed_at,
                });
            fold_into(state, obs);
        }

        merged
    }
}

fn fold_into(state: &mut RegionState, obs: &NormalizedObservation) {
    state.sources.insert(obs.source_id.clone());

    // Strictly greater: an equal status never displaces the first one seen
    if obs.status > state.status {
        state.status = obs.status;
    }

    if let Some(schedule) = &obs.schedule {
        push_unique(&mut state.schedules, schedule);
    }
    for city in &obs.cities {
        push_unique(&mut state.cities, city);
    }
    if let Some(restoration) = &obs.estimated_restoration {
        push_unique(&mut state.comments, &format!("{RESTORATION_PREFIX}: {restoration}"));
    }

    if obs.observed_at > state.last_update {
        state.last_update = obs.observed_at;
    }
}

fn push_unique(items: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !items.iter().any(|existing| existing == value) {
        items.push(value.to_string());
    }
}
