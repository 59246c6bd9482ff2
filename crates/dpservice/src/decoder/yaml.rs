//! YAML document splitting.
//!
//! Documents are read one line at a time so that nothing past the closing
//! `---` separator is consumed from the underlying reader. A separator that
//! carries content, as in `--- {kind: Route}`, opens the next document.

use std::io::{self, Read};

use serde_json::Value;

use super::CheckpointReader;
use crate::Result;

/// Read the next non-empty YAML document and convert it to a JSON value.
///
/// Blank documents and documents that only hold comments are skipped.
/// Returns `None` at the end of the stream.
pub(crate) fn read_document<R: Read>(reader: &mut CheckpointReader<R>) -> Result<Option<Value>> {
    let mut line = Vec::new();
    loop {
        let mut doc = Vec::new();
        let mut eof = false;
        loop {
            line.clear();
            if read_line(reader, &mut line)? == 0 {
                eof = true;
                break;
            }
            let Some(content) = separator_content(&line) else {
                doc.extend_from_slice(&line);
                continue;
            };
            if content.is_empty() {
                break;
            }
            if doc.iter().all(u8::is_ascii_whitespace) {
                doc.clear();
                doc.extend_from_slice(content);
                doc.push(b'\n');
                continue;
            }
            // Leave the line for the next document.
            reader.unread(line.len());
            break;
        }

        if !doc.iter().all(u8::is_ascii_whitespace) {
            let value: Value = serde_yaml_ng::from_slice(&doc)?;
            if !value.is_null() {
                return Ok(Some(value));
            }
        }
        if eof {
            return Ok(None);
        }
    }
}

/// Append one line, including its newline, to `line`.
fn read_line<R: Read>(reader: &mut R, line: &mut Vec<u8>) -> io::Result<usize> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(line.len()),
            Ok(_) => {
                line.push(byte[0]);
                if byte[0] == b'\n' {
                    return Ok(line.len());
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// If `line` is a `---` marker, return what follows it on the same line.
///
/// A trailing comment counts as no content.
fn separator_content(line: &[u8]) -> Option<&[u8]> {
    let line = line.trim_ascii_end();
    let rest = line.strip_prefix(b"---")?;
    if !rest.is_empty() && !rest[0].is_ascii_whitespace() {
        return None;
    }
    let rest = rest.trim_ascii_start();
    Some(if rest.starts_with(b"#") { &[] } else { rest })
}
