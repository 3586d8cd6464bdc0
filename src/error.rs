/// Error types for parsing and the command-line front end
use thiserror::Error;

/// A grammar mismatch. Parsing never yields a partial tree: any mismatch,
/// including one inside a nested reparse, aborts the whole parse with this error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parse error at line {line}, column {column}: expected one of [{}]", expected.join(", "))]
pub struct ParseError {
    /// Furthest `char` offset the grammar reached, in top-level coordinates.
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    /// Alternatives that were tried at `offset`.
    pub expected: Vec<String>,
    /// Nesting level of the reparse that failed; 0 for the top-level document.
    pub depth: usize,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Invalid options: {source}")]
    Options {
        #[from]
        source: serde_json::Error,
    },

    #[error("Unknown extension `{0}`")]
    UnknownExtension(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl ParseError {
    /// Builds an error for `offset` within `input`, computing its 1-based line and column.
    pub fn at(input: &[char], offset: usize, expected: Vec<String>, depth: usize) -> Self {
        let offset = offset.min(input.len());
        let mut line = 1;
        let mut column = 1;
        for &ch in &input[..offset] {
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        ParseError {
            offset,
            line,
            column,
            expected,
            depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_position() {
        let input: Vec<char> = "ab\ncd".chars().collect();
        let err = ParseError::at(&input, 4, vec!["'x'".into(), "EOI".into()], 0);
        assert_eq!((err.line, err.column), (2, 2));
        assert_eq!(
            err.to_string(),
            "Parse error at line 2, column 2: expected one of ['x', EOI]"
        );
    }
}
