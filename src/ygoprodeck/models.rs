//! Wire types for the YGOPRODeck v7 API.
//!
//! Decoding is deliberately lenient: every field is optional, numeric fields
//! accept numbers or numeric strings, and prices accept strings or numbers.
//! Required-field checks happen later, when a record becomes a catalog card.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// The upstream database version, compared by whole-value equality.
///
/// The check endpoint returns a JSON object whose exact shape is not relied
/// upon, so the whole value is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionFingerprint(Value);

impl VersionFingerprint {
    pub fn new(value: Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for VersionFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Body of `cardinfo.php`. A missing `data` key decodes as an empty catalog.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogPayload {
    #[serde(default)]
    pub data: Vec<RawCardRecord>,
}

/// The external card id as sent. Anything that is neither absent nor an
/// integer is kept verbatim so it can be reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawId {
    Number(i64),
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawCardRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<RawId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub card_type: Option<String>,
    #[serde(default, rename = "frameType")]
    pub frame_type: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub atk: Option<i64>,
    #[serde(default, rename = "def", deserialize_with = "lenient_int")]
    pub def_stat: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub level: Option<i64>,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub attribute: Option<String>,
    #[serde(default)]
    pub card_sets: Option<Vec<RawPrinting>>,
}

impl RawCardRecord {
    pub fn printings(&self) -> &[RawPrinting] {
        self.card_sets.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPrinting {
    #[serde(default)]
    pub set_name: Option<String>,
    #[serde(default)]
    pub set_code: Option<String>,
    #[serde(default)]
    pub set_rarity: Option<String>,
    #[serde(default)]
    pub set_rarity_code: Option<String>,
    /// Decimal text, e.g. `"0.10"`. Numbers are kept in their JSON rendering.
    #[serde(default, deserialize_with = "lenient_decimal_text")]
    pub set_price: Option<String>,
}

fn int_from_json(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Accepts a JSON integer, an integral float or a numeric string.
/// `null`, empty strings and anything unparsable decode as `None`.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(int_from_json))
}

/// Like [`lenient_int`], but a value that is present and not an integer
/// becomes [`RawId::Invalid`] instead of `None`.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<RawId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(value) => Some(match int_from_json(&value) {
            Some(id) => RawId::Number(id),
            None => RawId::Invalid(match value {
                Value::String(s) => s,
                other => other.to_string(),
            }),
        }),
    })
}

fn lenient_decimal_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
