//! Configuration for template groups

use crate::parser::Delimiters;

/// Options fixed when a group is created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupConfig {
    /// Delimiters for templates that do not declare their own
    pub delimiters: Delimiters,

    /// Maximum include/apply nesting before rendering fails
    pub max_depth: usize,

    /// Extension of single-template files in directory groups
    pub template_extension: String,

    /// Compile every template body while loading instead of on first lookup
    pub eager_compile: bool,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            delimiters: Delimiters::default(),
            max_depth: 64,
            template_extension: "st".to_string(),
            eager_compile: false,
        }
    }
}

impl GroupConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expression delimiters
    pub fn with_delimiters(mut self, start: char, stop: char) -> Self {
        self.delimiters = Delimiters::new(start, stop);
        self
    }

    /// Set the maximum nesting depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the single-template file extension (without the dot)
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.template_extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// Surface body syntax errors while loading
    pub fn with_eager_compile(mut self, eager: bool) -> Self {
        self.eager_compile = eager;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GroupConfig::default();
        assert_eq!(config.delimiters, Delimiters::new('<', '>'));
        assert_eq!(config.max_depth, 64);
        assert_eq!(config.template_extension, "st");
        assert!(!config.eager_compile);
    }

    #[test]
    fn test_builder_pattern() {
        let config = GroupConfig::new()
            .with_delimiters('$', '$')
            .with_max_depth(8)
            .with_extension(".tmpl")
            .with_eager_compile(true);

        assert_eq!(config.delimiters, Delimiters::new('$', '$'));
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.template_extension, "tmpl");
        assert!(config.eager_compile);
    }
}
