//! Push-style notification of stream updates.

use crate::{Result, StreamError};
use chipcheck_types::{ParsedTable, StreamSnapshot, StreamUpdate, ToolUse};
use tokio::sync::{broadcast, mpsc};

/// Receives updates synchronously while a chunk is processed.
///
/// Every callback is optional. Implementors either override the named
/// callbacks or [`StreamObserver::on_update`] to handle every update in one
/// place. A callback returning an error is reported through
/// [`StreamObserver::on_error`] and processing continues.
pub trait StreamObserver: Send + Sync {
    fn on_update(&mut self, update: &StreamUpdate) -> Result<()> {
        match update {
            StreamUpdate::Text { delta, full } => self.on_text(delta, full),
            StreamUpdate::Thinking { delta, full } => self.on_thinking(delta, full),
            StreamUpdate::ToolUseStart { tool } => self.on_tool_use_start(tool),
            StreamUpdate::ToolCommand { fragment, full } => self.on_tool_command(fragment, full),
            StreamUpdate::ToolComplete { tool } => self.on_tool_complete(tool),
            StreamUpdate::TableDetected { table, tables } => self.on_table_detected(table, tables),
            StreamUpdate::StreamComplete { snapshot } => self.on_stream_complete(snapshot),
            StreamUpdate::Error { .. } => Ok(()),
        }
    }

    fn on_text(&mut self, _delta: &str, _full: &str) -> Result<()> {
        Ok(())
    }

    fn on_thinking(&mut self, _delta: &str, _full: &str) -> Result<()> {
        Ok(())
    }

    fn on_tool_use_start(&mut self, _tool: &ToolUse) -> Result<()> {
        Ok(())
    }

    fn on_tool_command(&mut self, _fragment: &str, _full: &str) -> Result<()> {
        Ok(())
    }

    fn on_tool_complete(&mut self, _tool: &ToolUse) -> Result<()> {
        Ok(())
    }

    fn on_table_detected(&mut self, _table: &ParsedTable, _tables: &[ParsedTable]) -> Result<()> {
        Ok(())
    }

    fn on_stream_complete(&mut self, _snapshot: &StreamSnapshot) -> Result<()> {
        Ok(())
    }

    fn on_error(&mut self, _error: &StreamError) {}
}

/// Forwards every update to a channel. A dropped receiver is an error.
impl StreamObserver for mpsc::UnboundedSender<StreamUpdate> {
    fn on_update(&mut self, update: &StreamUpdate) -> Result<()> {
        self.send(update.clone())
            .map_err(|_| StreamError::ChannelClosed)
    }

    fn on_error(&mut self, error: &StreamError) {
        let _ = self.send(StreamUpdate::Error {
            message: error.to_string(),
        });
    }
}

/// Fans updates out to subscribers. Having no subscribers is not an error.
impl StreamObserver for broadcast::Sender<StreamUpdate> {
    fn on_update(&mut self, update: &StreamUpdate) -> Result<()> {
        let _ = self.send(update.clone());
        Ok(())
    }

    fn on_error(&mut self, error: &StreamError) {
        let _ = self.send(StreamUpdate::Error {
            message: error.to_string(),
        });
    }
}
