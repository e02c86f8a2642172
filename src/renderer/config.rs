//! Configuration for rendering template instances

use crate::locale::Locale;

/// Options applied to one render call
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    /// Locale handed to attribute renderers
    pub locale: Locale,

    /// Width used by a bare `wrap` option; `None` disables it
    pub line_width: Option<usize>,
}

impl RenderConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the locale
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Set the default wrap width
    pub fn with_line_width(mut self, width: usize) -> Self {
        self.line_width = Some(width);
        self
    }

    /// Disable wrapping for bare `wrap` options
    pub fn without_line_width(mut self) -> Self {
        self.line_width = None;
        self
    }
}
