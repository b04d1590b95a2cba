//! Ordered status rule tables, one per source vocabulary.
//!
//! Each table is evaluated top to bottom against the lowercased, trimmed raw
//! status; the first matching rule wins and anything unmatched is `Unknown`.
//! Tables are plain data so they can be inspected and tested without any
//! fetch logic.

use crate::types::{OutageStatus, StatusVocabulary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Contains(&'static str),
    Equals(&'static str),
}

impl Predicate {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Predicate::Contains(needle) => text.contains(needle),
            Predicate::Equals(value) => text == *value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRule {
    pub predicate: Predicate,
    pub status: OutageStatus,
}

const fn contains(needle: &'static str, status: OutageStatus) -> StatusRule {
    StatusRule { predicate: Predicate::Contains(needle), status }
}

const fn equals(value: &'static str, status: OutageStatus) -> StatusRule {
    StatusRule { predicate: Predicate::Equals(value), status }
}

use OutageStatus::{HasPower, NoPower, Possible, Scheduled, Unknown};

// Negations and qualifiers come before the bare "відключення" keyword, which
// also appears inside "можливі відключення" and "без відключень".
pub static FREE_TEXT_RULES: &[StatusRule] = &[
    contains("немає світла", NoPower),
    contains("нет света", NoPower),
    contains("no power", NoPower),
    contains("без відключень", HasPower),
    contains("без отключений", HasPower),
    contains("no outage", HasPower),
    contains("можлив", Possible),
    contains("возможн", Possible),
    contains("часткові", Possible),
    contains("частичн", Possible),
    contains("possible", Possible),
    contains("позапланов", NoPower),
    contains("планов", Scheduled),
    contains("planned", Scheduled),
    contains("за графіком", Scheduled),
    contains("стабілізаційні", Scheduled),
    contains("по графику", Scheduled),
    contains("scheduled", Scheduled),
    contains("аварі", NoPower),
    contains("авари", NoPower),
    contains("відключення", NoPower),
    contains("отключени", NoPower),
    contains("outage", NoPower),
    contains("є світло", HasPower),
    contains("есть свет", HasPower),
    contains("has power", HasPower),
    contains("power on", HasPower),
];

pub static COLOR_CODE_RULES: &[StatusRule] = &[
    contains("червон", NoPower),
    contains("красн", NoPower),
    contains("red", NoPower),
    contains("син", Scheduled),
    contains("blue", Scheduled),
    contains("жовт", Possible),
    contains("желт", Possible),
    contains("yellow", Possible),
    contains("зелен", HasPower),
    contains("green", HasPower),
];

pub static BOOLEAN_FLAG_RULES: &[StatusRule] = &[
    equals("true", NoPower),
    equals("1", NoPower),
    equals("yes", NoPower),
    equals("так", NoPower),
    equals("false", HasPower),
    equals("0", HasPower),
    equals("no", HasPower),
    equals("ні", HasPower),
];

pub static CANONICAL_RULES: &[StatusRule] = &[
    equals("no_power", NoPower),
    equals("scheduled", Scheduled),
    equals("possible", Possible),
    equals("has_power", HasPower),
    equals("unknown", Unknown),
];

pub fn rules_for(vocabulary: StatusVocabulary) -> &'static [StatusRule] {
    match vocabulary {
        StatusVocabulary::FreeText => FREE_TEXT_RULES,
        StatusVocabulary::ColorCode => COLOR_CODE_RULES,
        StatusVocabulary::BooleanFlag => BOOLEAN_FLAG_RULES,
        StatusVocabulary::Canonical => CANONICAL_RULES,
    }
}

pub fn classify(rules: &[StatusRule], raw: &str) -> OutageStatus {
    let text = raw.trim().to_lowercase();
    if text.is_empty() {
        return Unknown;
    }
    rules
        .iter()
        .find(|rule| rule.predicate.matches(&text))
        .map(|rule| rule.status)
        .unwrap_or(Unknown)
}

pub fn normalize_status(vocabulary: StatusVocabulary, raw: &str) -> OutageStatus {
    classify(rules_for(vocabulary), raw)
}

/// True when a feed already reports one of our status codes
pub fn is_canonical_code(raw: &str) -> bool {
    let text = raw.trim().to_lowercase();
    CANONICAL_RULES.iter().any(|rule| rule.predicate.matches(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_text_phrases() {
        let cases = [
            ("Немає світла", NoPower),
            ("Аварійні відключення", NoPower),
            ("Відключення", NoPower),
            ("Стабілізаційні відключення", Scheduled),
            ("Відключення за графіком", Scheduled),
            ("Можливі відключення", Possible),
            ("Часткові обмеження", Possible),
            ("Є світло", HasPower),
            ("Без відключень", HasPower),
            ("Планові відключення", Scheduled),
            ("Плановые отключения", Scheduled),
            ("Позапланові відключення", NoPower),
            ("No outages", HasPower),
            ("Planned outage", Scheduled),
            ("Outage reported", NoPower),
            ("Сонячно", Unknown),
            ("", Unknown),
        ];
        for (raw, expected) in cases {
            assert_eq!(normalize_status(StatusVocabulary::FreeText, raw), expected, "{raw}");
        }
    }

    #[test]
    fn test_color_codes() {
        assert_eq!(normalize_status(StatusVocabulary::ColorCode, "Червона зона"), NoPower);
        assert_eq!(normalize_status(StatusVocabulary::ColorCode, "YELLOW"), Possible);
        assert_eq!(normalize_status(StatusVocabulary::ColorCode, "зелена"), HasPower);
        assert_eq!(normalize_status(StatusVocabulary::ColorCode, "сіра"), Unknown);
    }

    #[test]
    fn test_boolean_flags_require_exact_values() {
        assert_eq!(normalize_status(StatusVocabulary::BooleanFlag, " true "), NoPower);
        assert_eq!(normalize_status(StatusVocabulary::BooleanFlag, "false"), HasPower);
        assert_eq!(normalize_status(StatusVocabulary::BooleanFlag, "trueish"), Unknown);
    }

    #[test]
    fn test_canonical_codes() {
        for status in OutageStatus::ALL {
            assert_eq!(normalize_status(StatusVocabulary::Canonical, status.as_str()), status);
            assert!(is_canonical_code(status.as_str()));
        }
        assert!(!is_canonical_code("Немає світла"));
    }

    #[test]
    fn test_first_match_wins() {
        let rules = [contains("a", Possible), contains("ab", NoPower)];
        assert_eq!(classify(&rules, "ab"), Possible);
    }
}
