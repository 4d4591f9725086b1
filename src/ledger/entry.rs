use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::dates::parse_iso_date;

/// Direction of money for a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum EntryKind {
    Income,
    /// Anything that is not income counts against profit.
    #[default]
    Expense,
}

impl EntryKind {
    /// Strict parser for user input; unlike deserialization it rejects unknown words.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" => Some(EntryKind::Income),
            "expense" => Some(EntryKind::Expense),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Income => "income",
            EntryKind::Expense => "expense",
        }
    }
}

impl From<String> for EntryKind {
    fn from(value: String) -> Self {
        EntryKind::parse(&value).unwrap_or(EntryKind::Expense)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single income or expense record.
///
/// `date` stays a raw string so that documents written by older clients with
/// malformed dates still load; use [`LedgerEntry::parsed_date`] to interpret it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_kind")]
    pub kind: EntryKind,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(
        default,
        deserialize_with = "lenient_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub payment_mode: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub note: String,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl LedgerEntry {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_iso_date(&self.date)
    }

    /// Amount used in totals; anything non-finite contributes nothing.
    pub fn effective_amount(&self) -> f64 {
        if self.amount.is_finite() {
            self.amount
        } else {
            0.0
        }
    }

    pub fn is_income(&self) -> bool {
        self.kind == EntryKind::Income
    }

    /// Identifier derived from the entry date and the creation instant.
    pub fn generate_id(date: &str, created_at: DateTime<Utc>) -> String {
        format!("{}_{}", date.trim(), created_at.timestamp_millis())
    }
}

/// User-supplied fields for creating or editing an entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryInput {
    pub date: String,
    pub kind: Option<EntryKind>,
    pub amount: f64,
    pub category: String,
    pub payment_mode: Option<String>,
    pub note: String,
}

impl EntryInput {
    pub fn new(date: impl Into<String>, kind: EntryKind, amount: f64) -> Self {
        Self {
            date: date.into(),
            kind: Some(kind),
            amount,
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn with_payment_mode(mut self, mode: impl Into<String>) -> Self {
        self.payment_mode = Some(mode.into());
        self
    }
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

/// `null` becomes empty; numbers, booleans and nested values keep their JSON text.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

fn lenient_kind<'de, D>(deserializer: D) -> Result<EntryKind, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?)
        .map(EntryKind::from)
        .unwrap_or_default())
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let amount = match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => text.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(flag) => {
            if flag {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    };
    Ok(if amount.is_finite() { amount } else { 0.0 })
}

/// Accepts RFC 3339 strings or epoch milliseconds; anything else becomes `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|ts| ts.with_timezone(&Utc)),
        Value::Number(number) => number
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    })
}
