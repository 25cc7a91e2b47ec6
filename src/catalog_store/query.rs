//! Single-field card filters for catalog search.

use rusqlite::types::Value;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("unknown search field '{0}'")]
    UnknownField(String),
    #[error("search query is empty")]
    EmptyQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Name,
    CardType,
    Attribute,
    Race,
    Description,
}

impl TextField {
    fn column(&self) -> &'static str {
        match self {
            TextField::Name => "name",
            TextField::CardType => "card_type",
            TextField::Attribute => "attribute",
            TextField::Race => "race",
            TextField::Description => "description",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    Level,
    Atk,
    Def,
}

impl NumericField {
    fn column(&self) -> &'static str {
        match self {
            NumericField::Level => "level",
            NumericField::Atk => "atk",
            NumericField::Def => "def_stat",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exactly,
    AtLeast,
    AtMost,
}

impl Bound {
    fn operator(&self) -> &'static str {
        match self {
            Bound::Exactly => "=",
            Bound::AtLeast => ">=",
            Bound::AtMost => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardFilter {
    /// Case-insensitive substring match.
    Text { field: TextField, needle: String },
    Numeric {
        field: NumericField,
        bound: Bound,
        value: i64,
    },
    /// A numeric field was queried with a non-integer value. Matches nothing.
    NoMatch,
}

impl CardFilter {
    /// Parse a `(field, query)` pair.
    ///
    /// Text fields are `name`, `type`, `attribute`, `race` and `desc`.
    /// Numeric fields are `level`, `atk` and `def`, each also available with
    /// `_gte` and `_lte` suffixes.
    pub fn parse(field: &str, query: &str) -> Result<CardFilter, FilterError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(FilterError::EmptyQuery);
        }

        let text_field = match field {
            "name" => Some(TextField::Name),
            "type" => Some(TextField::CardType),
            "attribute" => Some(TextField::Attribute),
            "race" => Some(TextField::Race),
            "desc" | "description" => Some(TextField::Description),
            _ => None,
        };
        if let Some(field) = text_field {
            return Ok(CardFilter::Text {
                field,
                needle: query.to_lowercase(),
            });
        }

        let (base, bound) = match field.rsplit_once('_') {
            Some((base, "gte")) => (base, Bound::AtLeast),
            Some((base, "lte")) => (base, Bound::AtMost),
            _ => (field, Bound::Exactly),
        };
        let numeric_field = match base {
            "level" => NumericField::Level,
            "atk" => NumericField::Atk,
            "def" => NumericField::Def,
            _ => return Err(FilterError::UnknownField(field.to_string())),
        };

        Ok(match query.parse::<i64>() {
            Ok(value) => CardFilter::Numeric {
                field: numeric_field,
                bound,
                value,
            },
            Err(_) => CardFilter::NoMatch,
        })
    }

    /// SQL condition and its single bound parameter, or `None` when the filter
    /// cannot match anything.
    pub(crate) fn to_sql(&self) -> Option<(String, Value)> {
        match self {
            CardFilter::Text { field, needle } => Some((
                format!("instr(casefold({}), ?1) > 0", field.column()),
                Value::Text(needle.clone()),
            )),
            CardFilter::Numeric {
                field,
                bound,
                value,
            } => Some((
                format!("{} {} ?1", field.column(), bound.operator()),
                Value::Integer(*value),
            )),
            CardFilter::NoMatch => None,
        }
    }
}
