//! Pull-based byte input for the builder thread.
//!
//! Contract:
//! - `next_chunk` yields successive byte chunks of markup text.
//! - `Ok(None)` is the terminal "done" signal; the source is not polled again.
//! - `Err` aborts the stream; the error surfaces to the reconciler caller.

use std::collections::VecDeque;
use std::io;
use std::thread;
use std::time::Duration;

pub trait ByteSource: Send {
    fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>>;
}

/// Whole input as a single chunk.
pub struct SliceSource {
    data: Option<Vec<u8>>,
}

impl SliceSource {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Some(data.into()),
        }
    }
}

impl ByteSource for SliceSource {
    fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.data.take())
    }
}

/// Pre-split chunks, optionally spaced out with a delay so streaming tests
/// exercise suspension at chunk boundaries.
pub struct ChunkSource {
    chunks: VecDeque<Vec<u8>>,
    delay: Option<Duration>,
    started: bool,
}

impl ChunkSource {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into(),
            delay: None,
            started: false,
        }
    }

    /// Split `input` at the given byte indices. Indices are normalized
    /// (sorted, deduped, clipped to the interior of the input).
    pub fn split(input: &str, boundaries: &[usize]) -> Self {
        let bytes = input.as_bytes();
        let mut points: Vec<usize> = boundaries
            .iter()
            .copied()
            .filter(|&idx| idx > 0 && idx < bytes.len())
            .collect();
        points.sort_unstable();
        points.dedup();

        let mut chunks = Vec::with_capacity(points.len() + 1);
        let mut last = 0usize;
        for idx in points {
            chunks.push(bytes[last..idx].to_vec());
            last = idx;
        }
        chunks.push(bytes[last..].to_vec());
        Self::new(chunks)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl ByteSource for ChunkSource {
    fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        if self.started
            && let Some(delay) = self.delay
            && !self.chunks.is_empty()
        {
            thread::sleep(delay);
        }
        self.started = true;
        Ok(self.chunks.pop_front())
    }
}

/// Yields its chunks, then fails instead of completing. For failure-path
/// tests: the stream never signals "done".
pub struct FailingSource {
    chunks: VecDeque<Vec<u8>>,
    message: String,
    delay: Option<Duration>,
}

impl FailingSource {
    pub fn new(chunks: Vec<Vec<u8>>, message: impl Into<String>) -> Self {
        Self {
            chunks: chunks.into(),
            message: message.into(),
            delay: None,
        }
    }

    /// Sleep before failing, leaving consumers time to drain what arrived.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl ByteSource for FailingSource {
    fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        match self.chunks.pop_front() {
            Some(chunk) => Ok(Some(chunk)),
            None => {
                if let Some(delay) = self.delay {
                    thread::sleep(delay);
                }
                Err(io::Error::other(self.message.clone()))
            }
        }
    }
}
