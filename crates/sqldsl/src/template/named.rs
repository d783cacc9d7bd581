//! `:name` to `$n` placeholder rewriting.

use crate::error::{DslError, DslResult};
use crate::render::ParameterMap;
use tokio_postgres::types::ToSql;

/// SQL with positional placeholders plus the bind values in `$n` order.
pub(crate) struct Positional<'p> {
    pub(crate) sql: String,
    pub(crate) params: Vec<&'p (dyn ToSql + Sync)>,
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// End (exclusive) of a quoted section starting at `start`. Doubled quotes escape.
fn skip_quoted(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn skip_line_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |offset| start + offset)
}

fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start + 2..]
        .windows(2)
        .position(|w| w == b"*/")
        .map_or(bytes.len(), |offset| start + 2 + offset + 2)
}

/// Rewrite `:name` placeholders to `$n` and collect the matching values.
///
/// String literals, quoted identifiers, comments and `::type` casts are copied
/// through untouched. A name used twice binds to the same `$n`.
pub(crate) fn to_positional<'p>(sql: &str, params: &'p ParameterMap) -> DslResult<Positional<'p>> {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut names: Vec<&str> = Vec::new();
    let mut values: Vec<&'p (dyn ToSql + Sync)> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let next = bytes.get(i + 1).copied();
        let end = match (bytes[i], next) {
            (b'\'' | b'"', _) => skip_quoted(bytes, i),
            (b'-', Some(b'-')) => skip_line_comment(bytes, i),
            (b'/', Some(b'*')) => skip_block_comment(bytes, i),
            (b':', Some(b':')) => i + 2,
            (b':', Some(b)) if is_name_start(b) => {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && is_name_char(bytes[end]) {
                    end += 1;
                }
                let name = &sql[start..end];
                let index = match names.iter().position(|n| *n == name) {
                    Some(index) => index,
                    None => {
                        let value = params.get(name).ok_or_else(|| {
                            DslError::invalid(format!("no value supplied for parameter '{name}'"))
                        })?;
                        names.push(name);
                        values.push(value as &(dyn ToSql + Sync));
                        names.len() - 1
                    }
                };
                out.push('$');
                out.push_str(&(index + 1).to_string());
                i = end;
                continue;
            }
            _ => {
                // Copy up to the next byte that can start something interesting.
                bytes[i + 1..]
                    .iter()
                    .position(|b| matches!(b, b'\'' | b'"' | b'-' | b'/' | b':'))
                    .map_or(bytes.len(), |offset| i + 1 + offset)
            }
        };
        out.push_str(&sql[i..end]);
        i = end;
    }

    Ok(Positional { sql: out, params: values })
}
