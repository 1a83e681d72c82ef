// src/bank/strings.rs
//! The string-array leaf convention (content type 0x3): NUL-terminated
//! ASCII strings laid end to end, closed by a run of 0x04 bytes that pads
//! the payload to a 32-bit boundary.

use tracing::warn;

use crate::error::{EvioError, Result};

const TERMINATOR: u8 = 0x04;

/// Split a string-array payload into its strings, discarding the
/// terminator run. A single unterminated string is tolerated for files
/// written before the terminator convention, but flagged.
pub fn decode_string_array(bytes: &[u8]) -> Result<Vec<String>> {
    let mut strings = Vec::new();
    let mut start = 0usize;
    let mut terminated = false;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            0 => {
                strings.push(to_utf8(&bytes[start..i])?);
                start = i + 1;
            }
            TERMINATOR => {
                if i > start {
                    warn!(
                        fragment_len = i - start,
                        "string array fragment before terminator run has no NUL, dropping it"
                    );
                }
                terminated = true;
                break;
            }
            _ => {}
        }
    }

    if !terminated && start < bytes.len() {
        let tail = to_utf8(&bytes[start..])?;
        if strings.is_empty() {
            warn!("string array has no 0x04 terminator, accepting single string");
        } else {
            warn!(
                strings = strings.len(),
                "string array tail has no NUL and no 0x04 terminator"
            );
        }
        strings.push(tail);
    }

    Ok(strings)
}

fn to_utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|_| EvioError::InvalidUtf8)
}
