//! Reducer configuration.

use serde::Deserialize;

/// Tunables for a [`crate::StreamReducer`].
#[derive(Debug, Clone, Deserialize)]
pub struct ReducerConfig {
    /// Tool names narrated as web searches
    #[serde(default = "default_search_tools")]
    pub search_tools: Vec<String>,
    /// Max characters of an input field in the tools summary
    #[serde(default = "default_summary_field_chars")]
    pub summary_field_chars: usize,
    /// Max characters of an input field in activity narration
    #[serde(default = "default_narration_field_chars")]
    pub narration_field_chars: usize,
}

fn default_search_tools() -> Vec<String> {
    vec![
        "WebSearch".to_string(),
        "web_search".to_string(),
        "WebFetch".to_string(),
    ]
}

fn default_summary_field_chars() -> usize {
    150
}

fn default_narration_field_chars() -> usize {
    200
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            search_tools: default_search_tools(),
            summary_field_chars: default_summary_field_chars(),
            narration_field_chars: default_narration_field_chars(),
        }
    }
}

impl ReducerConfig {
    pub fn is_search_tool(&self, name: &str) -> bool {
        self.search_tools
            .iter()
            .any(|tool| tool.eq_ignore_ascii_case(name))
    }
}
