//! Configuration types for a Sextant resolution pass.
//!
//! All types implement [`serde::Deserialize`] so a configuration can be
//! loaded from TOML. Every section and every field is optional; missing
//! values take the defaults documented on each getter.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining all sections.
//! - [`ResolverConfig`] - Subprocess matching knobs.
//! - [`TreeConfig`] - Root selection and depth limit.
//! - [`FlowConfig`] - Path enumeration limits and error-path keywords.
//! - [`ScheduleConfig`] - Default leaf duration and custom activities.
//!
//! # Example
//!
//! ```
//! # use sextant::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.tree().max_depth(), 64);
//! assert_eq!(config.resolver().loose_min_hint_len(), 3);
//! ```

use serde::Deserialize;

use crate::schedule::CustomActivity;

/// Top-level configuration of a resolution pass.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    resolver: ResolverConfig,

    #[serde(default)]
    tree: TreeConfig,

    #[serde(default)]
    flow: FlowConfig,

    #[serde(default)]
    schedule: ScheduleConfig,
}

impl AppConfig {
    /// Creates a configuration from its sections.
    pub fn new(
        resolver: ResolverConfig,
        tree: TreeConfig,
        flow: FlowConfig,
        schedule: ScheduleConfig,
    ) -> Self {
        Self {
            resolver,
            tree,
            flow,
            schedule,
        }
    }

    pub fn resolver(&self) -> &ResolverConfig {
        &self.resolver
    }

    pub fn tree(&self) -> &TreeConfig {
        &self.tree
    }

    pub fn flow(&self) -> &FlowConfig {
        &self.flow
    }

    pub fn schedule(&self) -> &ScheduleConfig {
        &self.schedule
    }

    /// Replaces the tree section.
    pub fn with_tree(mut self, tree: TreeConfig) -> Self {
        self.tree = tree;
        self
    }

    /// Replaces the resolver section.
    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replaces the flow section.
    pub fn with_flow(mut self, flow: FlowConfig) -> Self {
        self.flow = flow;
        self
    }

    /// Replaces the schedule section.
    pub fn with_schedule(mut self, schedule: ScheduleConfig) -> Self {
        self.schedule = schedule;
        self
    }
}

/// Subprocess resolution settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    filename_prefix: Option<String>,
    loose_min_hint_len: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            filename_prefix: None,
            loose_min_hint_len: 3,
        }
    }
}

impl ResolverConfig {
    /// Sets the corpus-wide file-name prefix (e.g. `mortgage-se-`).
    pub fn with_filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.filename_prefix = Some(prefix.into());
        self
    }

    pub fn with_loose_min_hint_len(mut self, len: usize) -> Self {
        self.loose_min_hint_len = len;
        self
    }

    /// Corpus-wide file-name prefix stripped by filename matching.
    pub fn filename_prefix(&self) -> Option<&str> {
        self.filename_prefix
            .as_deref()
            .filter(|prefix| !prefix.is_empty())
    }

    /// Normalized hints shorter than this skip loose matching. Default 3.
    pub fn loose_min_hint_len(&self) -> usize {
        self.loose_min_hint_len
    }
}

/// Tree construction settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    root: Option<String>,
    max_depth: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            root: None,
            max_depth: 64,
        }
    }
}

impl TreeConfig {
    /// Sets the preferred root: a file name, process id or display name.
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn root(&self) -> Option<&str> {
        self.root.as_deref().filter(|root| !root.trim().is_empty())
    }

    /// Maximum number of nested call levels expanded below the root.
    /// Default 64.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

/// Flow path enumeration settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    max_paths: usize,
    error_keywords: Vec<String>,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            max_paths: 10_000,
            error_keywords: [
                "error", "reject", "fail", "abort", "cancel", "avslag", "avvis", "avbryt",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl FlowConfig {
    pub fn with_max_paths(mut self, max_paths: usize) -> Self {
        self.max_paths = max_paths;
        self
    }

    pub fn with_error_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.error_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Enumeration stops once this many paths were found. Default 10 000.
    pub fn max_paths(&self) -> usize {
        self.max_paths
    }

    /// Case-insensitive keywords marking an end event as an error outcome.
    pub fn error_keywords(&self) -> &[String] {
        &self.error_keywords
    }
}

/// Scheduling settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    default_duration_days: u32,
    custom_activities: Vec<CustomActivity>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            default_duration_days: 1,
            custom_activities: Vec::new(),
        }
    }
}

impl ScheduleConfig {
    pub fn with_default_duration_days(mut self, days: u32) -> Self {
        self.default_duration_days = days;
        self
    }

    pub fn with_custom_activity(mut self, activity: CustomActivity) -> Self {
        self.custom_activities.push(activity);
        self
    }

    /// Duration of every leaf when no duration function is supplied.
    /// Default 1.
    pub fn default_duration_days(&self) -> u32 {
        self.default_duration_days
    }

    pub fn custom_activities(&self) -> &[CustomActivity] {
        &self.custom_activities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Placement;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [resolver]
            filename_prefix = "mortgage-se-"

            [flow]
            max_paths = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.resolver().filename_prefix(), Some("mortgage-se-"));
        assert_eq!(config.resolver().loose_min_hint_len(), 3);
        assert_eq!(config.flow().max_paths(), 50);
        assert!(config.flow().error_keywords().iter().any(|k| k == "avslag"));
        assert_eq!(config.tree().max_depth(), 64);
        assert_eq!(config.schedule().default_duration_days(), 1);
    }

    #[test]
    fn test_custom_activities_from_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [schedule]
            default_duration_days = 2

            [[schedule.custom_activities]]
            name = "Kickoff"
            placement = "before-all"
            duration_days = 3

            [[schedule.custom_activities]]
            name = "Go-live"
            placement = "after-all"
            duration_days = 1
            "#,
        )
        .unwrap();

        let custom = config.schedule().custom_activities();
        assert_eq!(custom.len(), 2);
        assert_eq!(custom[0].placement(), Placement::BeforeAll);
        assert_eq!(custom[1].placement(), Placement::AfterAll);
        assert_eq!(config.schedule().default_duration_days(), 2);
    }

    #[test]
    fn test_blank_root_is_none() {
        let tree = TreeConfig::default().with_root("  ");
        assert_eq!(tree.root(), None);
    }
}
