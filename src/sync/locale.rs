use crate::catalog_store::CatalogFamily;
use std::fmt;

pub const DEFAULT_LANGUAGE: &str = "fr";

/// Which upstream catalog to sync and where it lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locale {
    /// A translated catalog. Only one language is stored at a time.
    ///
    /// The version marker does not record the language, so switching to
    /// another language while the upstream version is unchanged reports
    /// up-to-date. Use a forced sync to replace the stored translation.
    Localized { language: String },
    English,
}

impl Locale {
    pub fn localized(language: impl Into<String>) -> Self {
        Locale::Localized {
            language: language.into(),
        }
    }

    pub fn family(&self) -> CatalogFamily {
        match self {
            Locale::Localized { .. } => CatalogFamily::Localized,
            Locale::English => CatalogFamily::English,
        }
    }

    /// Value of the `language` query parameter, absent for English.
    pub fn language_param(&self) -> Option<&str> {
        match self {
            Locale::Localized { language } => Some(language),
            Locale::English => None,
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::localized(DEFAULT_LANGUAGE)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::Localized { language } => write!(f, "localized ({})", language),
            Locale::English => f.write_str("english"),
        }
    }
}
