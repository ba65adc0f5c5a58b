//! Logging setup for the server and the replay CLI.
//!
//! Presets pick levels for the `chipcheck::` targets (startup, api, replay,
//! reducer, extractor, tables). `--log target=level` adds per-target
//! overrides, `RUST_LOG` replaces the whole filter, and output goes to stderr
//! as text or JSON.

use std::collections::BTreeMap;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const TARGET_PREFIX: &str = "chipcheck::";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("text") {
            Ok(LogFormat::Text)
        } else if s.eq_ignore_ascii_case("json") {
            Ok(LogFormat::Json)
        } else {
            Err(format!("Unknown log format '{}', expected 'text' or 'json'", s))
        }
    }
}

/// Base verbosity selected by CLI flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Lifecycle and API events; reducer internals only on warnings
    #[default]
    Production,
    /// Per-stream activity such as tool starts and completions
    Verbose,
    /// Dropped records, table candidates, observer failures
    Debug,
    /// Every record and chunk
    Trace,
    Quiet,
}

impl LogPreset {
    fn directives(self) -> &'static [&'static str] {
        match self {
            LogPreset::Production => &[
                "chipcheck::startup=info",
                "chipcheck::api=info",
                "chipcheck::replay=info",
                "chipcheck::reducer=warn",
                "chipcheck::extractor=warn",
                "chipcheck::tables=warn",
                "tower_http=warn",
            ],
            LogPreset::Verbose => &[
                "chipcheck=info",
                "chipcheck::extractor=warn",
                "tower_http=info",
            ],
            LogPreset::Debug => &["chipcheck=debug", "tower_http=debug"],
            LogPreset::Trace => &["chipcheck=trace", "tower_http=trace"],
            LogPreset::Quiet => &["chipcheck=warn", "tower_http=error"],
        }
    }
}

/// Logging configuration built from CLI arguments.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub preset: LogPreset,
    /// Per-target levels applied on top of the preset, keyed by full target
    pub overrides: BTreeMap<String, LevelFilter>,
    pub format: LogFormat,
}

impl LogConfig {
    /// Build from CLI flags. Quiet beats trace, trace beats debug, debug beats verbose.
    pub fn from_cli(
        verbose: bool,
        debug: bool,
        trace: bool,
        quiet: bool,
        log_overrides: Vec<String>,
        format: LogFormat,
    ) -> Self {
        let preset = match (quiet, trace, debug, verbose) {
            (true, ..) => LogPreset::Quiet,
            (_, true, ..) => LogPreset::Trace,
            (_, _, true, _) => LogPreset::Debug,
            (_, _, _, true) => LogPreset::Verbose,
            _ => LogPreset::Production,
        };

        // Each flag value may hold several comma-separated "target=level" pairs
        let overrides = log_overrides
            .iter()
            .flat_map(|value| value.split(','))
            .filter_map(|pair| {
                let (target, level) = pair.split_once('=')?;
                let level = level.trim().parse::<LevelFilter>().ok()?;
                Some((normalize_target(target.trim()), level))
            })
            .collect();

        Self {
            preset,
            overrides,
            format,
        }
    }

    /// Build the filter, preferring `RUST_LOG` when it is set.
    pub fn build_filter(&self) -> EnvFilter {
        if let Ok(env_filter) = EnvFilter::try_from_default_env() {
            return env_filter;
        }

        let mut directives: Vec<String> = self
            .preset
            .directives()
            .iter()
            .map(|d| d.to_string())
            .collect();
        directives.extend(
            self.overrides
                .iter()
                .map(|(target, level)| format!("{}={}", target, level)),
        );

        EnvFilter::try_new(directives.join(",")).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// "reducer" -> "chipcheck::reducer"; full targets and tower_http pass through.
fn normalize_target(target: &str) -> String {
    if target.starts_with(TARGET_PREFIX) || target == "chipcheck" || target == "tower_http" {
        target.to_string()
    } else {
        format!("{}{}", TARGET_PREFIX, target)
    }
}

/// Install the global subscriber. Logs go to stderr.
pub fn init(config: &LogConfig) {
    let filter = config.build_filter();
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_preset_priority() {
        let preset = |v, d, t, q| LogConfig::from_cli(v, d, t, q, vec![], LogFormat::Text).preset;

        assert_eq!(preset(true, true, true, true), LogPreset::Quiet);
        assert_eq!(preset(true, true, true, false), LogPreset::Trace);
        assert_eq!(preset(true, true, false, false), LogPreset::Debug);
        assert_eq!(preset(true, false, false, false), LogPreset::Verbose);
        assert_eq!(preset(false, false, false, false), LogPreset::Production);
    }

    #[test]
    fn test_overrides_parsing() {
        let config = LogConfig::from_cli(
            false,
            false,
            false,
            false,
            vec!["extractor=debug".into(), "tables=trace, api=WARN".into()],
            LogFormat::Text,
        );

        assert_eq!(config.overrides.get("chipcheck::extractor"), Some(&LevelFilter::DEBUG));
        assert_eq!(config.overrides.get("chipcheck::tables"), Some(&LevelFilter::TRACE));
        assert_eq!(config.overrides.get("chipcheck::api"), Some(&LevelFilter::WARN));
    }

    #[test]
    fn test_full_targets_and_bad_levels() {
        let config = LogConfig::from_cli(
            false,
            false,
            false,
            false,
            vec![
                "chipcheck::reducer=off".into(),
                "tower_http=trace".into(),
                "replay=loud".into(),
                "no_level".into(),
            ],
            LogFormat::Text,
        );

        assert_eq!(config.overrides.get("chipcheck::reducer"), Some(&LevelFilter::OFF));
        assert_eq!(config.overrides.get("tower_http"), Some(&LevelFilter::TRACE));
        assert_eq!(config.overrides.len(), 2);
    }
}
