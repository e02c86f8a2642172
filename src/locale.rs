//! Locale conventions for number rendering
//!
//! Locales are looked up by tag in a catalog loaded from TOML. A builtin
//! catalog covers common locales; applications can load their own.
//!
//! ```toml
//! [locales.pl]
//! decimal = ","
//! grouping = " "
//! ```

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading or parsing locale catalogs
#[derive(Error, Debug)]
pub enum LocaleError {
    #[error("Failed to read locale catalog: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse locale catalog TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("locale '{tag}': {field} separator must be a single character, got {value:?}")]
    InvalidSeparator {
        tag: String,
        field: &'static str,
        value: String,
    },
}

/// Number formatting conventions for one locale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    tag: String,
    decimal_separator: char,
    grouping_separator: Option<char>,
    grouping_size: usize,
}

impl Locale {
    /// Resolve `tag` (`pl`, `pl-PL`, `pl_PL`) against the builtin catalog
    pub fn new(tag: &str) -> Self {
        LocaleCatalog::builtin().resolve_or_default(tag)
    }

    /// Locale-neutral conventions: `.` for decimals, `,` for grouping
    pub fn root() -> Self {
        Self {
            tag: "root".to_string(),
            decimal_separator: '.',
            grouping_separator: Some(','),
            grouping_size: 3,
        }
    }

    pub fn custom(
        tag: impl Into<String>,
        decimal_separator: char,
        grouping_separator: Option<char>,
    ) -> Self {
        Self {
            tag: tag.into(),
            decimal_separator,
            grouping_separator,
            grouping_size: 3,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    pub fn grouping_separator(&self) -> Option<char> {
        self.grouping_separator
    }

    pub fn grouping_size(&self) -> usize {
        self.grouping_size
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::root()
    }
}

/// A set of locales keyed by normalized tag
#[derive(Debug, Clone, Default)]
pub struct LocaleCatalog {
    locales: HashMap<String, Locale>,
}

/// TOML structure for deserializing catalogs
#[derive(Deserialize)]
struct TomlCatalog {
    #[serde(default)]
    locales: HashMap<String, TomlLocale>,
}

#[derive(Deserialize)]
struct TomlLocale {
    decimal: String,
    #[serde(default)]
    grouping: String,
    grouping_size: Option<usize>,
}

const DEFAULT_CATALOG: &str = r#"
[locales.en]
decimal = "."
grouping = ","

[locales.en-gb]
decimal = "."
grouping = ","

[locales.pl]
decimal = ","
grouping = " "

[locales.de]
decimal = ","
grouping = "."

[locales.de-ch]
decimal = "."
grouping = "'"

[locales.fr]
decimal = ","
grouping = " "

[locales.es]
decimal = ","
grouping = "."

[locales.it]
decimal = ","
grouping = "."

[locales.nl]
decimal = ","
grouping = "."

[locales.pt]
decimal = ","
grouping = " "

[locales.pt-br]
decimal = ","
grouping = "."

[locales.ru]
decimal = ","
grouping = " "

[locales.sv]
decimal = ","
grouping = " "

[locales.ja]
decimal = "."
grouping = ","

[locales.zh]
decimal = "."
grouping = ","
"#;

static BUILTIN: Lazy<LocaleCatalog> = Lazy::new(|| {
    LocaleCatalog::from_str(DEFAULT_CATALOG).unwrap_or_else(|err| {
        tracing::error!(error = %err, "builtin locale catalog is invalid");
        LocaleCatalog::default()
    })
});

fn normalize(tag: &str) -> String {
    tag.trim().replace('_', "-").to_ascii_lowercase()
}

fn separator(tag: &str, field: &'static str, value: &str) -> Result<Option<char>, LocaleError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Ok(None),
        (Some(c), None) => Ok(Some(c)),
        _ => Err(LocaleError::InvalidSeparator {
            tag: tag.to_string(),
            field,
            value: value.to_string(),
        }),
    }
}

impl LocaleCatalog {
    /// The catalog compiled into the crate
    pub fn builtin() -> &'static LocaleCatalog {
        &BUILTIN
    }

    /// Load a catalog from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, LocaleError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a catalog from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, LocaleError> {
        let parsed: TomlCatalog = toml::from_str(content)?;
        let mut locales = HashMap::new();
        for (tag, entry) in parsed.locales {
            let key = normalize(&tag);
            let decimal = separator(&tag, "decimal", &entry.decimal)?.ok_or_else(|| {
                LocaleError::InvalidSeparator {
                    tag: tag.clone(),
                    field: "decimal",
                    value: String::new(),
                }
            })?;
            let grouping = separator(&tag, "grouping", &entry.grouping)?;
            locales.insert(
                key.clone(),
                Locale {
                    tag: key,
                    decimal_separator: decimal,
                    grouping_separator: grouping,
                    grouping_size: entry.grouping_size.unwrap_or(3).max(1),
                },
            );
        }
        Ok(Self { locales })
    }

    /// Look up a tag, falling back from `pl-PL` to `pl`
    pub fn resolve(&self, tag: &str) -> Option<&Locale> {
        let key = normalize(tag);
        if let Some(locale) = self.locales.get(&key) {
            return Some(locale);
        }
        let language = key.split('-').next()?;
        self.locales.get(language)
    }

    /// Resolve a tag with fallback to the builtin catalog, then the root locale
    pub fn resolve_or_default(&self, tag: &str) -> Locale {
        if let Some(locale) = self.resolve(tag) {
            return locale.clone();
        }
        if let Some(locale) = BUILTIN.resolve(tag) {
            return locale.clone();
        }
        tracing::debug!(tag, "unknown locale, using root conventions");
        Locale::root()
    }

    pub fn insert(&mut self, locale: Locale) {
        self.locales.insert(normalize(&locale.tag), locale);
    }

    pub fn len(&self) -> usize {
        self.locales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locales.is_empty()
    }
}
