//! Backward, buffered line streaming over a file.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Chunk size for backward reads.
const DEFAULT_BUF_SIZE: u64 = 8192;

/// Yields a file's lines newest-first without loading the whole file.
///
/// The file is read in fixed-size chunks from the end; a partial line at a
/// chunk boundary is carried over and completed by the next chunk. Empty
/// lines are skipped.
#[derive(Debug)]
pub struct ReverseLines {
    file: File,
    /// Bytes of the file not yet consumed, counted from the start.
    remaining: u64,
    buf_size: u64,
    /// Complete lines from consumed chunks, in file order.
    pending: Vec<String>,
    /// Line fragment waiting for the preceding chunk.
    carry: Vec<u8>,
}

impl ReverseLines {
    pub fn open(path: &Path) -> io::Result<Self> {
        Self::with_buf_size(path, DEFAULT_BUF_SIZE)
    }

    pub fn with_buf_size(path: &Path, buf_size: u64) -> io::Result<Self> {
        let file = File::open(path)?;
        let remaining = file.metadata()?.len();
        Ok(Self {
            file,
            remaining,
            buf_size: buf_size.max(1),
            pending: Vec::new(),
            carry: Vec::new(),
        })
    }

    /// Reads one chunk, splitting it into lines.
    fn fill(&mut self) -> io::Result<()> {
        let take = self.remaining.min(self.buf_size);
        let start = self.remaining - take;
        self.file.seek(SeekFrom::Start(start))?;
        let mut chunk = vec![0u8; usize::try_from(take).unwrap_or_default()];
        self.file.read_exact(&mut chunk)?;
        self.remaining = start;

        chunk.append(&mut self.carry);
        let mut segments: Vec<&[u8]> = chunk.split(|&byte| byte == b'\n').collect();
        if self.remaining > 0 && !segments.is_empty() {
            // The first segment may continue a line from the previous chunk.
            self.carry = segments.remove(0).to_vec();
        }
        for segment in segments {
            if segment.is_empty() {
                continue;
            }
            self.pending.push(into_line(segment)?);
        }
        Ok(())
    }
}

impl Iterator for ReverseLines {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(line) = self.pending.pop() {
                return Some(Ok(line));
            }
            if self.remaining == 0 {
                if self.carry.is_empty() {
                    return None;
                }
                let first = std::mem::take(&mut self.carry);
                return Some(into_line(&first));
            }
            if let Err(err) = self.fill() {
                self.remaining = 0;
                self.carry.clear();
                return Some(Err(err));
            }
        }
    }
}

fn into_line(bytes: &[u8]) -> io::Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}
