pub mod regions;
pub mod status_rules;

use crate::types::{NormalizedObservation, RawObservation};
use tracing::debug;

pub use regions::{display_name, normalize_region_name};
pub use status_rules::normalize_status;

/// Source filler text that means "no value"
const PLACEHOLDERS: &[&str] = &["не вказано", "немає інформації", "нет данных", "n/a", "-", "—"];

/// Canonicalizes region names and status vocabularies across adapters.
///
/// Stateless; every method is a pure function of its input.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObservationNormalizer;

impl ObservationNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, raw: &RawObservation) -> NormalizedObservation {
        let region_key = normalize_region_name(&raw.region_name_raw);
        let status = normalize_status(raw.vocabulary, &raw.status_raw);
        debug!(
            source = %raw.source_id,
            region_raw = %raw.region_name_raw,
            region = %region_key,
            status = %status,
            "normalized observation"
        );

        let mut cities: Vec<String> = Vec::new();
        for city in raw.affected_areas_raw.iter().filter_map(|c| clean_text(c)) {
            if !cities.contains(&city) {
                cities.push(city);
            }
        }

        NormalizedObservation {
            source_id: raw.source_id.clone(),
            display_name: display_name(&raw.region_name_raw),
            region_key,
            status,
            schedule: raw.schedule_raw.as_deref().and_then(clean_text),
            cities,
            estimated_restoration: raw.estimated_restoration.as_deref().and_then(clean_text),
            observed_at: raw.observed_at,
        }
    }

    pub fn normalize_batch(&self, raws: &[RawObservation]) -> Vec<NormalizedObservation> {
        raws.iter().map(|raw| self.normalize(raw)).collect()
    }
}

/// Trimmed text, or `None` for blanks and placeholders
fn clean_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || PLACEHOLDERS.contains(&trimmed.to_lowercase().as_str()) {
        return None;
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OutageStatus, StatusVocabulary};
    use chrono::{TimeZone, Utc};

    fn raw(region: &str, status: &str, vocabulary: StatusVocabulary) -> RawObservation {
        RawObservation::new(
            "test",
            region,
            status,
            vocabulary,
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_normalizes_region_and_status() {
        let normalizer = ObservationNormalizer::new();
        let obs = normalizer.normalize(&raw("Харьков", "Немає світла", StatusVocabulary::FreeText));

        assert_eq!(obs.region_key.as_str(), "kharkiv");
        assert_eq!(obs.display_name, "Харківська область");
        assert_eq!(obs.status, OutageStatus::NoPower);
        assert_eq!(obs.source_id, "test");
    }

    #[test]
    fn test_unrecognized_status_is_unknown_not_error() {
        let obs = ObservationNormalizer::new()
            .normalize(&raw("Lviv", "???", StatusVocabulary::ColorCode));
        assert_eq!(obs.status, OutageStatus::Unknown);
    }

    #[test]
    fn test_cleans_text_fields() {
        let observation = raw("Odesa", "false", StatusVocabulary::BooleanFlag)
            .with_schedule(Some("  Не вказано ".into()))
            .with_areas(vec![" Одеса".into(), "".into(), "Одеса".into(), "Ізмаїл ".into()])
            .with_restoration(Some(" 18:00 ".into()));

        let obs = ObservationNormalizer::new().normalize(&observation);
        assert_eq!(obs.schedule, None);
        assert_eq!(obs.cities, vec!["Одеса".to_string(), "Ізмаїл".to_string()]);
        assert_eq!(obs.estimated_restoration.as_deref(), Some("18:00"));
        assert_eq!(obs.status, OutageStatus::HasPower);
    }

    #[test]
    fn test_unmapped_region_is_kept() {
        let obs = ObservationNormalizer::new()
            .normalize(&raw("Нова Область Х", "є світло", StatusVocabulary::FreeText));
        assert_eq!(obs.region_key.as_str(), "нова_область_х");
        assert_eq!(obs.display_name, "Нова Область Х");
    }
}
