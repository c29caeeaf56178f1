use std::error::Error;
use std::fmt::{self, Write as _};
use std::num::ParseFloatError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VectorLiteralError {
    MissingBrackets,
    InvalidElement {
        token: String,
        source: ParseFloatError,
    },
}

impl fmt::Display for VectorLiteralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingBrackets => write!(f, "vector must be enclosed in brackets"),
            Self::InvalidElement { token, source } => {
                write!(f, "invalid vector element '{token}': {source}")
            }
        }
    }
}

impl Error for VectorLiteralError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MissingBrackets => None,
            Self::InvalidElement { source, .. } => Some(source),
        }
    }
}

/// Parses a `[v1, v2, ..., vn]` literal into floats.
///
/// Whitespace around brackets, commas and numbers is ignored and empty
/// elements (`[0.1,,0.2]`, `[0.1,]`) are skipped. `[]` yields an empty vector.
pub fn parse_vector(input: &str) -> Result<Vec<f32>, VectorLiteralError> {
    let interior = input
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or(VectorLiteralError::MissingBrackets)?
        .trim();
    if interior.is_empty() {
        return Ok(Vec::new());
    }

    let mut values = Vec::with_capacity(interior.bytes().filter(|byte| *byte == b',').count() + 1);
    for piece in interior.split(',') {
        let token = piece.trim();
        if token.is_empty() {
            continue;
        }
        let value = token
            .parse::<f32>()
            .map_err(|source| VectorLiteralError::InvalidElement {
                token: token.to_string(),
                source,
            })?;
        values.push(value);
    }
    Ok(values)
}

/// Renders `values` as `[0.100000, 0.200000]`.
pub fn format_vector(values: &[f32]) -> String {
    let mut rendered = String::with_capacity(2 + values.len() * 11);
    rendered.push('[');
    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            rendered.push_str(", ");
        }
        // Writing into a String cannot fail.
        let _ = write!(rendered, "{value:.6}");
    }
    rendered.push(']');
    rendered
}
