//! Merge configuration.
//!
//! [`MergeSettings`] holds the plain, serializable options and can be
//! loaded from `MERGEVIEW__*` environment variables. [`MergeConfig`] adds
//! the pluggable parts the host supplies in code.
//!
//! # Example
//!
//! ```
//! use mergeview_engine::config::MergeSettings;
//!
//! let settings = MergeSettings::load().expect("Failed to load merge settings");
//! assert!(settings.max_edit_distance > 0);
//! ```

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::comparator::{TokenComparatorFactory, default_token_factory};
use crate::diff::{DiffAlgorithm, DiffLimits, MyersDiff};

/// Options controlling how documents are compared.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct MergeSettings {
    /// Compare lines and tokens ignoring whitespace (default: false)
    #[serde(default = "default_false")]
    pub ignore_whitespace: bool,

    /// Report conflicts whose sides are identical (default: false)
    #[serde(default = "default_false")]
    pub show_pseudo_conflicts: bool,

    /// Compare two-way even when an ancestor is bound (default: false)
    #[serde(default = "default_false")]
    pub ignore_ancestor: bool,

    /// Longest edit script a diff may explore (default: 4000)
    #[serde(default = "default_max_edit_distance")]
    pub max_edit_distance: usize,

    /// Wall-clock limit per diff in milliseconds, 0 for none (default: 5000)
    #[serde(default = "default_diff_timeout_ms")]
    pub diff_timeout_ms: u64,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            ignore_whitespace: default_false(),
            show_pseudo_conflicts: default_false(),
            ignore_ancestor: default_false(),
            max_edit_distance: default_max_edit_distance(),
            diff_timeout_ms: default_diff_timeout_ms(),
        }
    }
}

fn default_false() -> bool {
    false
}

fn default_max_edit_distance() -> usize {
    4_000
}

fn default_diff_timeout_ms() -> u64 {
    5_000
}

impl MergeSettings {
    /// Loads settings from defaults and `MERGEVIEW__*` environment
    /// variables, e.g. `MERGEVIEW__IGNORE_WHITESPACE=true`.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed into its setting.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Environment::with_prefix("MERGEVIEW").separator("__"))
    }

    /// Loads settings from defaults and the given environment source.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be parsed into its setting.
    pub fn load_from(environment: Environment) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("ignore_whitespace", default_false())?
            .set_default("show_pseudo_conflicts", default_false())?
            .set_default("ignore_ancestor", default_false())?
            .set_default("max_edit_distance", default_max_edit_distance() as u64)?
            .set_default("diff_timeout_ms", default_diff_timeout_ms())?
            .add_source(environment)
            .build()?;

        s.try_deserialize()
    }

    /// The diff budget these settings describe.
    #[must_use]
    pub fn limits(&self) -> DiffLimits {
        DiffLimits {
            max_edit_distance: self.max_edit_distance,
            timeout: (self.diff_timeout_ms > 0)
                .then(|| Duration::from_millis(self.diff_timeout_ms)),
        }
    }
}

/// Settings plus the pluggable comparison strategies.
#[derive(Clone)]
pub struct MergeConfig {
    /// Plain options.
    pub settings: MergeSettings,
    /// Builds the comparator used to refine a difference into tokens.
    pub token_comparator_factory: TokenComparatorFactory,
    /// The sequence diff algorithm.
    pub diff_algorithm: Rc<dyn DiffAlgorithm>,
}

impl fmt::Debug for MergeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeConfig")
            .field("settings", &self.settings)
            .field("token_comparator_factory", &"<dyn Fn>")
            .field("diff_algorithm", &"<dyn DiffAlgorithm>")
            .finish()
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self::new(MergeSettings::default())
    }
}

impl MergeConfig {
    /// Uses `settings` with the default token comparator and Myers diff.
    #[must_use]
    pub fn new(settings: MergeSettings) -> Self {
        Self {
            settings,
            token_comparator_factory: default_token_factory(),
            diff_algorithm: Rc::new(MyersDiff::new()),
        }
    }

    /// Sets a custom token comparator factory.
    #[must_use]
    pub fn with_token_comparator_factory(mut self, factory: TokenComparatorFactory) -> Self {
        self.token_comparator_factory = factory;
        self
    }

    /// Sets a custom diff algorithm.
    #[must_use]
    pub fn with_algorithm<A: DiffAlgorithm + 'static>(mut self, algorithm: A) -> Self {
        self.diff_algorithm = Rc::new(algorithm);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::{LineComparator, RangeComparator};
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Environment::with_prefix("MERGEVIEW")
            .separator("__")
            .source(Some(map))
    }

    #[test]
    fn defaults_without_environment() {
        let settings = MergeSettings::load_from(env(&[])).unwrap();
        assert_eq!(settings, MergeSettings::default());
        assert_eq!(settings.limits(), DiffLimits::default());
    }

    #[test]
    fn environment_overrides() {
        let settings = MergeSettings::load_from(env(&[
            ("MERGEVIEW__IGNORE_WHITESPACE", "true"),
            ("MERGEVIEW__MAX_EDIT_DISTANCE", "12"),
            ("MERGEVIEW__DIFF_TIMEOUT_MS", "0"),
        ]))
        .unwrap();
        assert!(settings.ignore_whitespace);
        assert!(!settings.show_pseudo_conflicts);
        assert_eq!(settings.max_edit_distance, 12);
        assert_eq!(settings.limits().timeout, None);
    }

    #[test]
    fn bad_values_are_rejected() {
        let result = MergeSettings::load_from(env(&[("MERGEVIEW__MAX_EDIT_DISTANCE", "lots")]));
        assert!(result.is_err());
    }

    #[test]
    fn deserializes_partial_json() {
        let settings: MergeSettings =
            serde_json::from_str(r#"{"show_pseudo_conflicts": true}"#).unwrap();
        assert!(settings.show_pseudo_conflicts);
        assert_eq!(settings.max_edit_distance, 4_000);
    }

    #[test]
    fn custom_factory_is_kept() {
        let config = MergeConfig::default().with_token_comparator_factory(Rc::new(
            |text: &str, ws: bool| Box::new(LineComparator::new(text, ws)) as Box<dyn RangeComparator>,
        ));
        let comparator = (config.token_comparator_factory)("a\nb\n", false);
        assert_eq!(comparator.range_count(), 2);
    }
}
