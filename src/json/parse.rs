//! Purpose: Decode request bodies into `serde_json::Value` and classify failures.
//! Exports: `from_slice`, `DecodeError`, `MAX_NESTING_DEPTH`, `ParseFailureCategory`, `categorize`, `hint_for_error`.
//! Role: Parser boundary that centralizes serde_json usage details.
//! Invariants: Numbers keep their source text (`arbitrary_precision`); nothing is rounded.
//! Invariants: Nesting up to `MAX_NESTING_DEPTH` decodes; deeper bodies fail as `DepthLimit`.
//! Invariants: Category labels are stable; hints never include payload text.
//! Notes: Error mapping to crate errors is done by callsites so context stays explicit.

use std::error::Error as StdError;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use serde_json::error::Category;

/// Deepest array/object nesting accepted. Encoding and dropping a `Value`
/// recurse per level, so this bounds stack use on the response path.
pub(crate) const MAX_NESTING_DEPTH: usize = 512;

#[derive(Debug)]
pub(crate) enum DecodeError {
    TooDeep { limit: usize },
    Json(serde_json::Error),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::TooDeep { limit } => {
                write!(f, "nesting deeper than {limit} levels")
            }
            DecodeError::Json(err) => write!(f, "{err}"),
        }
    }
}

impl StdError for DecodeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            DecodeError::TooDeep { .. } => None,
            DecodeError::Json(err) => Some(err),
        }
    }
}

pub(crate) fn from_slice(body: &[u8]) -> Result<Value, DecodeError> {
    if nesting_exceeds(body, MAX_NESTING_DEPTH) {
        return Err(DecodeError::TooDeep {
            limit: MAX_NESTING_DEPTH,
        });
    }
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    // serde_json stops at 128 levels by default; the depth is bounded above instead.
    deserializer.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut deserializer))
        .map_err(DecodeError::Json)?;
    deserializer.end().map_err(DecodeError::Json)?;
    Ok(value)
}

/// Counts open `[`/`{` outside string literals. Runs before decoding, so an
/// unterminated but too-deep body reports the depth limit.
fn nesting_exceeds(body: &[u8], limit: usize) -> bool {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for &byte in body {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                if depth > limit {
                    return true;
                }
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    false
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ParseFailureCategory {
    Empty,
    Syntax,
    Eof,
    Data,
    Io,
    DepthLimit,
}

impl ParseFailureCategory {
    pub(crate) fn label(self) -> &'static str {
        match self {
            ParseFailureCategory::Empty => "empty",
            ParseFailureCategory::Syntax => "syntax",
            ParseFailureCategory::Eof => "eof",
            ParseFailureCategory::Data => "data",
            ParseFailureCategory::Io => "io",
            ParseFailureCategory::DepthLimit => "depth-limit",
        }
    }
}

fn is_json_whitespace(byte: &u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

/// A body made only of JSON whitespace is `Empty` regardless of what the
/// decoder reported; other failures follow `serde_json`'s own class.
pub(crate) fn categorize(body: &[u8], err: &DecodeError) -> ParseFailureCategory {
    let err = match err {
        DecodeError::TooDeep { .. } => return ParseFailureCategory::DepthLimit,
        DecodeError::Json(err) => err,
    };
    if body.iter().all(is_json_whitespace) {
        return ParseFailureCategory::Empty;
    }
    match err.classify() {
        Category::Syntax => ParseFailureCategory::Syntax,
        Category::Eof => ParseFailureCategory::Eof,
        Category::Data => ParseFailureCategory::Data,
        Category::Io => ParseFailureCategory::Io,
    }
}

pub(crate) fn hint_for_error(category: ParseFailureCategory, context: &str) -> String {
    let advice = match category {
        ParseFailureCategory::Empty => "send a JSON document in the request body",
        ParseFailureCategory::Eof => "the body ended before the JSON document was complete",
        ParseFailureCategory::Syntax => "check the body for invalid JSON syntax",
        ParseFailureCategory::Data => "the body is JSON but could not be represented",
        ParseFailureCategory::Io => "the body could not be read",
        ParseFailureCategory::DepthLimit => "reduce how deeply arrays/objects are nested",
    };
    format!(
        "{advice} (parse category: {}; context: {context})",
        category.label()
    )
}
