//! Line codec for the data file and the index sidecar.
//!
//! Data lines are `key,value\n`, split on the first comma only. Sidecar
//! lines are `key,offset\n` with a decimal byte offset.

use crate::error::{Result, SstError};

/// Encodes one data-file line. Caller must have validated key and value.
pub(crate) fn encode(key: &str, value: &str) -> String {
    let mut line = String::with_capacity(key.len() + value.len() + 2);
    line.push_str(key);
    line.push(',');
    line.push_str(value);
    line.push('\n');
    line
}

/// Splits a data-file line (without the trailing newline) into key and
/// value at the first comma.
pub(crate) fn split(line: &str) -> Option<(&str, &str)> {
    line.split_once(',')
}

/// Encodes one sidecar line.
pub(crate) fn encode_index_line(key: &str, offset: u64) -> String {
    let mut line = String::with_capacity(key.len() + 22);
    line.push_str(key);
    line.push(',');
    line.push_str(&offset.to_string());
    line.push('\n');
    line
}

/// Validates a key against the on-disk format: non-empty, no comma, no
/// newline.
pub fn check_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(SstError::InvalidKey(key.to_string(), "key is empty"));
    }
    if key.contains(',') {
        return Err(SstError::InvalidKey(key.to_string(), "key contains a comma"));
    }
    if key.contains('\n') {
        return Err(SstError::InvalidKey(
            key.to_string(),
            "key contains a newline",
        ));
    }
    Ok(())
}

/// Validates a value against the on-disk format: no newline. Commas are
/// fine, the reader splits on the first one only.
pub fn check_value(key: &str, value: &str) -> Result<()> {
    if value.contains('\n') {
        return Err(SstError::InvalidValue(
            key.to_string(),
            "value contains a newline",
        ));
    }
    Ok(())
}
