//! Line buffering for raw stream chunks.
//!
//! Chunks arrive at arbitrary byte boundaries. The buffer hands out only
//! complete lines and keeps the trailing partial line until its newline
//! arrives, so memory is bounded by the longest in-flight line.

/// Accumulates chunks and yields complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    /// Text after the last newline seen so far.
    pending: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw chunk.
    pub fn append(&mut self, chunk: &str) {
        self.pending.push_str(chunk);
    }

    /// Remove and return every complete line, keeping the partial tail.
    pub fn drain_complete_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.pending.rfind('\n') else {
            return Vec::new();
        };

        let tail = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, tail);

        complete[..last_newline]
            .split('\n')
            .map(str::to_string)
            .collect()
    }

    /// Take the partial tail, treating it as a complete line.
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }

    /// The partial line currently held back.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
