//! JSON-lines landmark frame source
//!
//! Reads one `LandmarkFrame` per line, as emitted by the `simulation` binary
//! or a pose-estimation bridge:
//!
//! ```text
//! {"timestamp_ms":0,"landmarks":[{"x":0.51,"y":0.22,"z":-0.1,"visibility":0.99}, ...]}
//! ```

use std::io::BufRead;

use thiserror::Error;

use crate::types::LandmarkFrame;

#[derive(Debug, Error)]
pub enum FrameSourceError {
    #[error("failed to read frame stream: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: invalid landmark frame: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Iterator over frames in a JSON-lines stream. Blank lines are skipped.
pub struct FrameReader<R> {
    reader: R,
    line_buffer: String,
    line_number: usize,
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_buffer: String::with_capacity(4096),
            line_number: 0,
        }
    }

    /// Next frame, `Ok(None)` at end of stream.
    pub fn next_frame(&mut self) -> Result<Option<LandmarkFrame>, FrameSourceError> {
        loop {
            self.line_buffer.clear();
            if self.reader.read_line(&mut self.line_buffer)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.line_buffer.trim();
            if line.is_empty() {
                continue;
            }
            return serde_json::from_str(line)
                .map(Some)
                .map_err(|source| FrameSourceError::Parse {
                    line: self.line_number,
                    source,
                });
        }
    }
}

impl<R: BufRead> Iterator for FrameReader<R> {
    type Item = Result<LandmarkFrame, FrameSourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}
