use serde::{Deserialize, Serialize};

/// Router configuration.
///
/// Deserializes from kebab-case keys; missing keys take their default value.
///
/// ```
/// # use segment_router::RouterOptions;
/// let opts = RouterOptions::new()
///     .case_insensitive(true)
///     .auto_generate_head_endpoints(false);
///
/// assert!(opts.is_case_insensitive());
/// assert!(!opts.auto_generates_head_endpoints());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RouterOptions {
    case_insensitive: bool,
    auto_generate_head_endpoints: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        RouterOptions {
            case_insensitive: false,
            auto_generate_head_endpoints: true,
        }
    }
}

impl RouterOptions {
    /// Constructs default options: case-sensitive matching, `HEAD` derived from `GET`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold ASCII case of literal pattern text when registering and matching.
    pub fn case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = enabled;
        self
    }

    /// Derive a `HEAD` handler from each `GET` handler at build time.
    pub fn auto_generate_head_endpoints(mut self, enabled: bool) -> Self {
        self.auto_generate_head_endpoints = enabled;
        self
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn auto_generates_head_endpoints(&self) -> bool {
        self.auto_generate_head_endpoints
    }
}
