use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{entry::LedgerEntry, settings::Settings};

/// Calendar days on which the shop did not operate, as ISO date strings.
///
/// Keeps first-insertion order and never holds the same day twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ClosedDaySet {
    days: Vec<String>,
}

impl ClosedDaySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, day: &str) -> bool {
        let day = day.trim();
        self.days.iter().any(|existing| existing == day)
    }

    /// Returns `false` when the day was already present.
    pub fn insert(&mut self, day: &str) -> bool {
        let day = day.trim();
        if self.contains(day) {
            return false;
        }
        self.days.push(day.to_string());
        true
    }

    /// Returns `false` when the day was not present.
    pub fn remove(&mut self, day: &str) -> bool {
        let day = day.trim();
        let before = self.days.len();
        self.days.retain(|existing| existing != day);
        self.days.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.days.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl From<Vec<String>> for ClosedDaySet {
    fn from(values: Vec<String>) -> Self {
        let mut set = ClosedDaySet::new();
        for value in values {
            set.insert(&value);
        }
        set
    }
}

impl From<ClosedDaySet> for Vec<String> {
    fn from(set: ClosedDaySet) -> Self {
        set.days
    }
}

impl<'a> FromIterator<&'a str> for ClosedDaySet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = ClosedDaySet::new();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

/// The single persisted unit: settings, every entry, and the closed days.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerDocument {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub entries: Vec<LedgerEntry>,
    #[serde(default)]
    pub closed_days: ClosedDaySet,
}

/// Result of leniently interpreting a persisted document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub document: LedgerDocument,
    pub warnings: Vec<String>,
}

impl LedgerDocument {
    /// Empty document seeded with shop settings.
    pub fn seeded(business_name: &str, currency: &str) -> Self {
        Self {
            settings: Settings::new(business_name, currency),
            ..Self::default()
        }
    }

    pub fn entry(&self, id: &str) -> Option<&LedgerEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn entry_mut(&mut self, id: &str) -> Option<&mut LedgerEntry> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }

    pub fn push_entry(&mut self, entry: LedgerEntry) -> String {
        let id = entry.id.clone();
        self.entries.push(entry);
        id
    }

    pub fn remove_entry(&mut self, id: &str) -> Option<LedgerEntry> {
        let idx = self.entries.iter().position(|entry| entry.id == id)?;
        Some(self.entries.remove(idx))
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Builds an identifier for a new entry that no existing entry uses.
    /// Collisions within the same millisecond advance the timestamp component.
    pub fn unique_entry_id(&self, date: &str, created_at: DateTime<Utc>) -> String {
        let taken: HashSet<&str> = self.entries.iter().map(|entry| entry.id.as_str()).collect();
        let mut stamp = created_at;
        loop {
            let candidate = LedgerEntry::generate_id(date, stamp);
            if !taken.contains(candidate.as_str()) {
                return candidate;
            }
            stamp += Duration::milliseconds(1);
        }
    }

    /// Serializes the whole document as compact JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses persisted text without ever rejecting it.
    ///
    /// Invalid JSON yields `fallback`. Top-level fields that are missing or of
    /// the wrong shape are replaced with empty defaults. Entries that are not
    /// objects and closed days that are not strings are skipped; entry fields
    /// of the wrong type are coerced. Every repair is described in `warnings`.
    pub fn parse_lenient(text: &str, fallback: &LedgerDocument) -> ParsedDocument {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Self::from_value_lenient(value, fallback),
            Err(err) => ParsedDocument {
                document: fallback.clone(),
                warnings: vec![format!("document is not valid JSON: {err}")],
            },
        }
    }

    pub fn from_value_lenient(value: Value, fallback: &LedgerDocument) -> ParsedDocument {
        let mut warnings = Vec::new();
        let Value::Object(mut root) = value else {
            warnings.push("document root is not an object".to_string());
            return ParsedDocument {
                document: fallback.clone(),
                warnings,
            };
        };

        let settings = match root.remove("settings") {
            None | Some(Value::Null) => Settings::default(),
            Some(raw) => serde_json::from_value(raw).unwrap_or_else(|err| {
                warnings.push(format!("settings were unreadable and have been reset: {err}"));
                Settings::default()
            }),
        };

        let mut entries = Vec::new();
        match root.remove("entries") {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for (idx, item) in items.into_iter().enumerate() {
                    if !item.is_object() {
                        warnings.push(format!("skipped entry #{idx}: not an object"));
                        continue;
                    }
                    match serde_json::from_value::<LedgerEntry>(item) {
                        Ok(entry) => entries.push(entry),
                        Err(err) => warnings.push(format!("skipped entry #{idx}: {err}")),
                    }
                }
            }
            Some(_) => warnings.push("entries is not an array and has been reset".to_string()),
        }

        let mut closed_days = ClosedDaySet::new();
        match root.remove("closedDays") {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for item in items {
                    match item {
                        Value::String(day) => {
                            closed_days.insert(&day);
                        }
                        other => warnings.push(format!("skipped closed day {other}")),
                    }
                }
            }
            Some(_) => warnings.push("closedDays is not an array and has been reset".to_string()),
        }

        let mut document = LedgerDocument {
            settings,
            entries,
            closed_days,
        };
        document.assign_missing_ids(&mut warnings);
        ParsedDocument { document, warnings }
    }

    fn assign_missing_ids(&mut self, warnings: &mut Vec<String>) {
        let mut seen = HashSet::new();
        for idx in 0..self.entries.len() {
            let current = self.entries[idx].id.trim().to_string();
            if !current.is_empty() && seen.insert(current.clone()) {
                continue;
            }
            let replacement = format!("{}_{}", self.entries[idx].date.trim(), idx);
            let mut candidate = replacement.clone();
            let mut suffix = 1;
            while seen.contains(&candidate) || self.entries.iter().any(|e| e.id == candidate) {
                candidate = format!("{replacement}-{suffix}");
                suffix += 1;
            }
            if current.is_empty() {
                warnings.push(format!("entry #{idx} had no id; assigned {candidate}"));
            } else {
                warnings.push(format!("entry #{idx} reused id {current}; assigned {candidate}"));
            }
            seen.insert(candidate.clone());
            self.entries[idx].id = candidate;
        }
    }
}
