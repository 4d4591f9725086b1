use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Shop-wide preferences stored alongside the entries.
///
/// Keys this crate does not know about are kept in `extra` so that a
/// load/save cycle never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Hex-encoded SHA-256 digest of the access PIN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Settings {
    pub fn new(business_name: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            business_name: Some(business_name.into()),
            currency: Some(currency.into()),
            ..Self::default()
        }
    }

    pub fn business_name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.business_name.as_deref().unwrap_or(fallback)
    }

    pub fn currency_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.currency.as_deref().unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_survive_roundtrip() {
        let raw = r#"{"pinHash":"abc","businessName":"Corner Copy","theme":"dark"}"#;
        let settings: Settings = serde_json::from_str(raw).unwrap();
        assert_eq!(settings.pin_hash.as_deref(), Some("abc"));
        assert_eq!(settings.extra.get("theme"), Some(&Value::from("dark")));

        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["theme"], "dark");
        assert_eq!(json["businessName"], "Corner Copy");
        assert!(json.get("currency").is_none());
    }
}
