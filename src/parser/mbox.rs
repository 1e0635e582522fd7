//! Streaming MBOX splitter.
//!
//! Takeout archives can be many gigabytes; the file is read line-by-line
//! through a large buffer and each message is handed to a callback as soon
//! as its boundary is seen. Tolerant of malformed input.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{PlanemailError, Result};

/// Size of the internal read buffer.
const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Messages larger than this are truncated (attachments, mostly).
const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// One message as it sits in the archive.
#[derive(Debug)]
pub struct MboxEntry<'a> {
    /// Byte offset of the `From ` separator line.
    pub offset: u64,
    /// Raw bytes, separator line included.
    pub raw: &'a [u8],
}

/// Splits an MBOX file into messages.
///
/// Handles mixed `\n`/`\r\n` endings, separators without a preceding blank
/// line (logged), a UTF-8 BOM and a truncated final message.
#[derive(Debug)]
pub struct MboxSplitter {
    path: PathBuf,
    file_size: u64,
    max_message_size: usize,
}

impl MboxSplitter {
    /// Open `path` for splitting. Does not check that it really is an MBOX.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = std::fs::metadata(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlanemailError::FileNotFound(path.clone())
            } else {
                PlanemailError::io(&path, e)
            }
        })?;
        if metadata.is_dir() {
            return Err(PlanemailError::InvalidMbox(path));
        }
        Ok(Self {
            path,
            file_size: metadata.len(),
            max_message_size: MAX_MESSAGE_SIZE,
        })
    }

    /// Walk the archive, calling `on_message` for every message.
    ///
    /// The callback returns `false` to stop early. Returns the number of
    /// messages delivered.
    pub fn for_each(&self, on_message: &mut dyn FnMut(MboxEntry<'_>) -> bool) -> Result<u64> {
        if self.file_size == 0 {
            return Ok(0);
        }

        let file = File::open(&self.path).map_err(|e| PlanemailError::io(&self.path, e))?;
        let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);

        let mut count: u64 = 0;
        let mut offset: u64 = 0;
        let mut message: Vec<u8> = Vec::with_capacity(64 * 1024);
        let mut message_start: u64 = 0;
        let mut prev_blank = true;
        let mut truncated = false;
        let mut line: Vec<u8> = Vec::with_capacity(4096);

        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(|e| PlanemailError::io(&self.path, e))?;
            if read == 0 {
                break;
            }

            if is_mbox_separator(&line) {
                if !prev_blank {
                    warn!(offset, "Found 'From ' separator without preceding blank line");
                }
                if !message.is_empty() {
                    let entry = MboxEntry {
                        offset: message_start,
                        raw: &message,
                    };
                    if !on_message(entry) {
                        return Ok(count);
                    }
                    count += 1;
                }
                message_start = offset;
                message.clear();
                truncated = false;
                message.extend_from_slice(&line);
            } else if message.len() + line.len() <= self.max_message_size {
                message.extend_from_slice(&line);
            } else if !truncated {
                warn!(
                    offset = message_start,
                    max_size = self.max_message_size,
                    "Message exceeds maximum size, truncating body"
                );
                truncated = true;
            }

            prev_blank = is_blank_line(&line);
            offset += read as u64;
        }

        if !message.is_empty() {
            let entry = MboxEntry {
                offset: message_start,
                raw: &message,
            };
            if on_message(entry) {
                count += 1;
            }
        }

        Ok(count)
    }
}

/// Whether a line starts a new message (`From ` at column 0, BOM allowed).
fn is_mbox_separator(line: &[u8]) -> bool {
    let line = line.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(line);
    line.starts_with(b"From ")
}

fn is_blank_line(line: &[u8]) -> bool {
    line.iter()
        .all(|&b| b == b'\n' || b == b'\r' || b == b' ' || b == b'\t')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn split(content: &[u8]) -> Vec<(u64, Vec<u8>)> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        let splitter = MboxSplitter::new(file.path()).unwrap();
        let mut out = Vec::new();
        splitter
            .for_each(&mut |entry| {
                out.push((entry.offset, entry.raw.to_vec()));
                true
            })
            .unwrap();
        out
    }

    #[test]
    fn test_is_mbox_separator() {
        assert!(is_mbox_separator(b"From user@example.com Thu Jan 01 00:00:00 2024\n"));
        assert!(!is_mbox_separator(b"from user@example.com\n"));
        assert!(!is_mbox_separator(b">From user@example.com\n"));
        assert!(!is_mbox_separator(b"Subject: From here\n"));

        let mut line = vec![0xEF, 0xBB, 0xBF];
        line.extend_from_slice(b"From user@example.com Thu Jan 01 00:00:00 2024\n");
        assert!(is_mbox_separator(&line));
    }

    #[test]
    fn test_is_blank_line() {
        assert!(is_blank_line(b"\n"));
        assert!(is_blank_line(b"\r\n"));
        assert!(!is_blank_line(b"hello\n"));
    }

    #[test]
    fn test_splits_messages_with_offsets() {
        let first = b"From a@x Mon Jan 01 00:00:00 2024\nSubject: One\n\nBody one\n\n";
        let second = b"From b@x Tue Jan 02 00:00:00 2024\r\nSubject: Two\r\n\r\nBody two\r\n";
        let mut content = first.to_vec();
        content.extend_from_slice(second);

        let messages = split(&content);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].0, 0);
        assert_eq!(messages[0].1, first.to_vec());
        assert_eq!(messages[1].0, first.len() as u64);
        assert!(messages[1].1.ends_with(b"Body two\r\n"));
    }

    #[test]
    fn test_separator_without_blank_line_still_splits() {
        let content = b"From a@x Mon Jan 01 00:00:00 2024\nSubject: One\n\nBody\nFrom b@x Tue Jan 02 00:00:00 2024\nSubject: Two\n\nBody\n";
        assert_eq!(split(content).len(), 2);
    }

    #[test]
    fn test_empty_file_and_early_stop() {
        assert!(split(b"").is_empty());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"From a@x\n\nA\n\nFrom b@x\n\nB\n").unwrap();
        let splitter = MboxSplitter::new(file.path()).unwrap();
        let count = splitter.for_each(&mut |_| false).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_missing_file() {
        let err = MboxSplitter::new("/nonexistent/archive.mbox").unwrap_err();
        assert!(matches!(err, PlanemailError::FileNotFound(_)));
    }
}
