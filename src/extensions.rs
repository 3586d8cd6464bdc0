/// Optional grammar rules and rendering switches
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Selects which optional grammar rules are active for a parse and how the
    /// renderer treats links. Combine with `|`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Extensions: u32 {
        /// `...`, `--`, `---` and apostrophes become typographic entities.
        const SMARTS = 0x01;
        /// `'single'`, `"double"` and `<<angle>>` quotes.
        const QUOTES = 0x02;
        const SMARTYPANTS = Self::SMARTS.bits() | Self::QUOTES.bits();
        /// `*[HTML]: Hyper Text Markup Language`
        const ABBREVIATIONS = 0x04;
        /// Every newline inside a paragraph becomes `<br/>`.
        const HARDWRAPS = 0x08;
        /// Bare URLs and e-mail addresses without angle brackets.
        const AUTOLINKS = 0x10;
        const TABLES = 0x20;
        const DEFINITIONS = 0x40;
        const FENCED_CODE_BLOCKS = 0x80;
        /// `[[Page Name]]`
        const WIKILINKS = 0x100;
        const ALL = Self::SMARTYPANTS.bits()
            | Self::ABBREVIATIONS.bits()
            | Self::HARDWRAPS.bits()
            | Self::AUTOLINKS.bits()
            | Self::TABLES.bits()
            | Self::DEFINITIONS.bits()
            | Self::FENCED_CODE_BLOCKS.bits()
            | Self::WIKILINKS.bits();
        const SUPPRESS_HTML_BLOCKS = 0x1_0000;
        const SUPPRESS_INLINE_HTML = 0x2_0000;
        const SUPPRESS_ALL_HTML = Self::SUPPRESS_HTML_BLOCKS.bits() | Self::SUPPRESS_INLINE_HTML.bits();
        const NO_FOLLOW_LINKS = 0x4_0000;
    }
}

impl Extensions {
    /// No optional rules (alias for `empty()`).
    pub const NONE: Self = Self::empty();

    /// Looks up a single extension by its lowercase name, as used on the command line.
    pub fn from_cli_name(name: &str) -> Option<Self> {
        let ext = match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "none" => Self::NONE,
            "smarts" => Self::SMARTS,
            "quotes" => Self::QUOTES,
            "smartypants" => Self::SMARTYPANTS,
            "abbreviations" => Self::ABBREVIATIONS,
            "hardwraps" => Self::HARDWRAPS,
            "autolinks" => Self::AUTOLINKS,
            "tables" => Self::TABLES,
            "definitions" => Self::DEFINITIONS,
            "fenced_code_blocks" => Self::FENCED_CODE_BLOCKS,
            "wikilinks" => Self::WIKILINKS,
            "all" => Self::ALL,
            "suppress_html_blocks" => Self::SUPPRESS_HTML_BLOCKS,
            "suppress_inline_html" => Self::SUPPRESS_INLINE_HTML,
            "suppress_all_html" => Self::SUPPRESS_ALL_HTML,
            "no_follow_links" => Self::NO_FOLLOW_LINKS,
            _ => return None,
        };
        Some(ext)
    }

    /// Characters that must be parsed as markup (or escaped) rather than as plain
    /// text. Widens in step with the rules that give these characters a meaning.
    pub fn special_chars(self) -> String {
        let mut chars = String::from("*_`&[]<>!#\\");
        if self.intersects(Self::QUOTES | Self::SMARTS) {
            chars.push('\'');
        }
        if self.contains(Self::QUOTES) {
            chars.push('"');
        }
        if self.contains(Self::SMARTS) {
            chars.push_str(".-");
        }
        if self.contains(Self::AUTOLINKS) {
            chars.push_str("(){}");
        }
        if self.contains(Self::DEFINITIONS) {
            chars.push(':');
        }
        if self.contains(Self::TABLES) {
            chars.push('|');
        }
        if self.intersects(Self::DEFINITIONS | Self::FENCED_CODE_BLOCKS) {
            chars.push('~');
        }
        chars
    }
}
