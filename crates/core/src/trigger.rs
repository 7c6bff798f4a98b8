//! Trigger, item and expression-part enums with their wire codes.
//!
//! The integer codes are what the form posts and what the database stores,
//! so every enum converts both ways through `code()` / `from_code()`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Trigger severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    NotClassified = 0,
    Information = 1,
    Warning = 2,
    Average = 3,
    High = 4,
    Disaster = 5,
}

impl Severity {
    /// Every severity in selector order.
    pub const ALL: [Severity; 6] = [
        Severity::NotClassified,
        Severity::Information,
        Severity::Warning,
        Severity::Average,
        Severity::High,
        Severity::Disaster,
    ];

    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn from_code(code: i64) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|s| i64::from(s.code()) == code)
            .ok_or_else(|| CoreError::Validation(format!("Unknown severity code {code}")))
    }

    /// Display name used when no custom name is configured.
    pub fn default_name(self) -> &'static str {
        match self {
            Severity::NotClassified => "Not classified",
            Severity::Information => "Information",
            Severity::Warning => "Warning",
            Severity::Average => "Average",
            Severity::High => "High",
            Severity::Disaster => "Disaster",
        }
    }

    /// Key of the `settings` row holding this severity's display name.
    pub fn setting_key(self) -> String {
        format!("severity_name_{}", self.code())
    }
}

/// Configured display names for the six severities, in [`Severity::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityNames([String; 6]);

impl SeverityNames {
    pub fn new(names: [String; 6]) -> Self {
        Self(names)
    }

    pub fn name(&self, severity: Severity) -> &str {
        &self.0[severity as usize]
    }

    /// `(severity, display name)` pairs in selector order.
    pub fn entries(&self) -> impl Iterator<Item = (Severity, &str)> {
        Severity::ALL.into_iter().map(move |s| (s, self.name(s)))
    }
}

impl Default for SeverityNames {
    fn default() -> Self {
        Self(Severity::ALL.map(|s| s.default_name().to_string()))
    }
}

// ---------------------------------------------------------------------------
// Status / type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerStatus {
    Enabled = 0,
    Disabled = 1,
}

impl TriggerStatus {
    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn from_code(code: i64) -> Self {
        if code == TriggerStatus::Disabled as i64 {
            TriggerStatus::Disabled
        } else {
            TriggerStatus::Enabled
        }
    }
}

/// Whether a trigger raises an event on every matching value or only on a
/// state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    SingleEvent = 0,
    MultiEventEnabled = 1,
}

impl TriggerType {
    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn from_code(code: i64) -> Self {
        if code == TriggerType::MultiEventEnabled as i64 {
            TriggerType::MultiEventEnabled
        } else {
            TriggerType::SingleEvent
        }
    }
}

// ---------------------------------------------------------------------------
// Item value types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemValueType {
    Float = 0,
    Character = 1,
    Log = 2,
    Unsigned = 3,
    Text = 4,
}

impl ItemValueType {
    pub fn code(self) -> i16 {
        self as i16
    }
}

/// Value types whose triggers this form edits.
pub const TEXTUAL_VALUE_TYPES: [ItemValueType; 3] = [
    ItemValueType::Log,
    ItemValueType::Text,
    ItemValueType::Character,
];

// ---------------------------------------------------------------------------
// Expression parts and keywords
// ---------------------------------------------------------------------------

/// Whether a pattern part fires on a match or on the absence of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionType {
    Match = 0,
    NoMatch = 1,
}

impl ExpressionType {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Result<Self, CoreError> {
        match code {
            0 => Ok(ExpressionType::Match),
            1 => Ok(ExpressionType::NoMatch),
            other => Err(CoreError::Validation(format!(
                "Unknown expression type {other}"
            ))),
        }
    }

    /// Label shown in the expression table and the type selector.
    pub fn label(self) -> &'static str {
        match self {
            ExpressionType::Match => "Include",
            ExpressionType::NoMatch => "Exclude",
        }
    }
}

/// One pattern clause of a log trigger expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionPart {
    pub value: String,
    #[serde(rename = "type")]
    pub kind: ExpressionType,
}

impl ExpressionPart {
    pub fn new(value: impl Into<String>, kind: ExpressionType) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }
}

/// A keyword row. The type is a free-form classification posted by the
/// client script and echoed back untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Opaque row id from `name[ID][...]` form fields. Stable for one form
/// session; the client never reuses one.
pub type EntryId = u32;

/// A form list entry together with its row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyed<T> {
    pub id: EntryId,
    pub entry: T,
}

/// Attach sequential ids to entries that have none (e.g. freshly decomposed
/// from a stored expression).
pub fn number_entries<T>(entries: Vec<T>) -> Vec<Keyed<T>> {
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| Keyed {
            id: i as EntryId,
            entry,
        })
        .collect()
}

/// The id the client should hand to its next new row.
pub fn next_entry_id<T>(entries: &[Keyed<T>]) -> EntryId {
    entries.iter().map(|k| k.id).max().map_or(1, |max| max + 1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_codes_round_trip() {
        for severity in Severity::ALL {
            let code = i64::from(severity.code());
            assert_eq!(Severity::from_code(code).unwrap(), severity);
        }
        assert!(Severity::from_code(6).is_err());
        assert!(Severity::from_code(-1).is_err());
    }

    #[test]
    fn default_severity_names_are_ordered() {
        let names = SeverityNames::default();
        let labels: Vec<&str> = names.entries().map(|(_, n)| n).collect();
        assert_eq!(
            labels,
            ["Not classified", "Information", "Warning", "Average", "High", "Disaster"]
        );
    }

    #[test]
    fn status_treats_unknown_codes_as_enabled() {
        assert_eq!(TriggerStatus::from_code(1), TriggerStatus::Disabled);
        assert_eq!(TriggerStatus::from_code(0), TriggerStatus::Enabled);
        assert_eq!(TriggerStatus::from_code(7), TriggerStatus::Enabled);
    }

    #[test]
    fn next_entry_id_follows_highest_id() {
        let entries = vec![
            Keyed { id: 4, entry: () },
            Keyed { id: 9, entry: () },
            Keyed { id: 2, entry: () },
        ];
        assert_eq!(next_entry_id(&entries), 10);
    }

    #[test]
    fn next_entry_id_of_empty_list_is_one() {
        let entries: Vec<Keyed<()>> = Vec::new();
        assert_eq!(next_entry_id(&entries), 1);
    }
}
