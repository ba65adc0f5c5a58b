//! Incremental reduction of agent SDK stream logs into a UI view model.

mod activity;
mod buffer;
mod config;
mod error;
mod escape;
mod extractor;
mod observer;
mod projection;
mod reducer;
mod replay;
mod tables;
mod verdict;

pub use buffer::LineBuffer;
pub use config::ReducerConfig;
pub use error::StreamError;
pub use escape::unescape;
pub use extractor::{is_record_boundary, EventExtractor, ExtractedEvent, RECORD_LABELS};
pub use observer::StreamObserver;
pub use projection::format_output;
pub use reducer::StreamReducer;
pub use replay::{
    parse_complete_log, parse_complete_log_with, replay_file, split_log_segments, ReplayOutcome,
};
pub use tables::{parse_markdown_table, TableDetector};
pub use verdict::{derive_verdict, extract_verdict};

/// Result type for stream reducer operations.
pub type Result<T> = std::result::Result<T, StreamError>;
