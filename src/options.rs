/// Parser configuration and the input normalizer
use crate::extensions::Extensions;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub extensions: Extensions,
    /// Expand tabs to this column stop before parsing. `None` keeps tabs as they are.
    pub tab_stop: Option<usize>,
}

impl Options {
    pub fn new(extensions: Extensions) -> Self {
        Options {
            extensions,
            tab_stop: None,
        }
    }

    pub fn with_tab_stop(mut self, tab_stop: usize) -> Self {
        self.tab_stop = Some(tab_stop.max(1));
        self
    }

    /// Reads options from a JSON document such as
    /// `{"extensions": "TABLES | FENCED_CODE_BLOCKS", "tab_stop": 4}`.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Prepares source text for parsing: optional tab expansion plus the two
    /// trailing newlines the block grammar relies on to close the last block.
    pub fn normalize(&self, source: &str) -> Vec<char> {
        let mut chars = Vec::with_capacity(source.len() + 2);
        match self.tab_stop {
            Some(stop) => expand_tabs(source, stop.max(1), &mut chars),
            None => chars.extend(source.chars()),
        }
        chars.push('\n');
        chars.push('\n');
        chars
    }
}

fn expand_tabs(text: &str, stop: usize, out: &mut Vec<char>) {
    let mut col = 0;
    for ch in text.chars() {
        match ch {
            '\t' => {
                let spaces = stop - (col % stop);
                out.extend(std::iter::repeat_n(' ', spaces));
                col += spaces;
            }
            '\n' | '\r' => {
                out.push(ch);
                col = 0;
            }
            _ => {
                out.push(ch);
                col += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_appends_newlines() {
        let chars = Options::default().normalize("a\tb");
        assert_eq!(chars.iter().collect::<String>(), "a\tb\n\n");
    }

    #[test]
    fn test_tab_expansion_is_column_aware() {
        let chars = Options::default().with_tab_stop(4).normalize("ab\tc\n\td");
        assert_eq!(chars.iter().collect::<String>(), "ab  c\n    d\n\n");
    }

    #[test]
    fn test_zero_tab_stop_from_json_is_clamped() {
        let options = Options::from_json(r#"{"tab_stop": 0}"#).unwrap();
        let chars = options.normalize("a\tb");
        assert_eq!(chars.iter().collect::<String>(), "a b\n\n");
    }

    #[test]
    fn test_from_json() {
        let options = Options::from_json(r#"{"extensions": "TABLES | FENCED_CODE_BLOCKS", "tab_stop": 4}"#).unwrap();
        assert_eq!(
            options.extensions,
            Extensions::TABLES | Extensions::FENCED_CODE_BLOCKS
        );
        assert_eq!(options.tab_stop, Some(4));
        assert_eq!(Options::from_json("{}").unwrap(), Options::default());
    }
}
