//! Required-field checks that turn upstream records into catalog cards.

use super::models::Card;
use crate::ygoprodeck::{RawCardRecord, RawId};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was absent or `null`. Empty strings are accepted.
    MissingField {
        field: &'static str,
        card_id: Option<i64>,
    },
    /// A required field was present but could not be decoded.
    InvalidField { field: &'static str, value: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField {
                field,
                card_id: Some(id),
            } => write!(f, "card {} is missing required field '{}'", id, field),
            ValidationError::MissingField {
                field,
                card_id: None,
            } => write!(f, "card record is missing required field '{}'", field),
            ValidationError::InvalidField { field, value } => {
                write!(f, "card record has invalid '{}' value {:?}", field, value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = Result<T, ValidationError>;

fn required<T: Clone>(
    value: &Option<T>,
    field: &'static str,
    card_id: Option<i64>,
) -> ValidationResult<T> {
    value
        .clone()
        .ok_or(ValidationError::MissingField { field, card_id })
}

/// Build a [`Card`] from an upstream record.
///
/// `id`, `name`, `type`, `frameType` and `desc` are required. `race` and
/// `attribute` default to an empty string. Combat stats stay optional.
pub fn validate_card(record: &RawCardRecord) -> ValidationResult<Card> {
    let id = match &record.id {
        Some(RawId::Number(id)) => *id,
        Some(RawId::Invalid(value)) => {
            return Err(ValidationError::InvalidField {
                field: "id",
                value: value.clone(),
            })
        }
        None => {
            return Err(ValidationError::MissingField {
                field: "id",
                card_id: None,
            })
        }
    };
    let card_id = Some(id);

    Ok(Card {
        id,
        name: required(&record.name, "name", card_id)?,
        card_type: required(&record.card_type, "type", card_id)?,
        frame_type: required(&record.frame_type, "frameType", card_id)?,
        description: required(&record.desc, "desc", card_id)?,
        atk: record.atk,
        def_stat: record.def_stat,
        level: record.level,
        race: record.race.clone().unwrap_or_default(),
        attribute: record.attribute.clone().unwrap_or_default(),
    })
}
