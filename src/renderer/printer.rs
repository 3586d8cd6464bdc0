/// Output sink for the HTML renderer: an indent-aware string buffer
#[derive(Debug, Default, Clone)]
pub struct Printer {
    buf: String,
    indent: usize,
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn print(&mut self, text: &str) -> &mut Self {
        self.buf.push_str(text);
        self
    }

    pub fn print_char(&mut self, c: char) -> &mut Self {
        self.buf.push(c);
        self
    }

    /// Prints `text` with the five HTML-significant characters escaped.
    pub fn print_encoded(&mut self, text: &str) -> &mut Self {
        for c in text.chars() {
            match entity_for(c) {
                Some(entity) => self.buf.push_str(entity),
                None => self.buf.push(c),
            }
        }
        self
    }

    /// Starts a new line at the current indentation. Does nothing while the
    /// buffer is empty so output never begins with a line break.
    pub fn println(&mut self) -> &mut Self {
        if !self.buf.is_empty() {
            self.buf.push('\n');
            self.buf.extend(std::iter::repeat_n(' ', self.indent));
        }
        self
    }

    pub fn indent(&mut self, delta: isize) -> &mut Self {
        self.indent = self.indent.saturating_add_signed(delta);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

/// Named or numeric entity for characters that may not appear raw in HTML text.
pub fn entity_for(c: char) -> Option<&'static str> {
    match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        _ => None,
    }
}

pub fn escape_html(text: &str) -> String {
    text.chars()
        .map(|c| match entity_for(c) {
            Some(entity) => entity.to_string(),
            None => c.to_string(),
        })
        .collect()
}

/// Reverses [`escape_html`].
pub fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_println_skips_leading_newline() {
        let mut printer = Printer::new();
        printer.println().print("<ul>").indent(2).println().print("<li>");
        printer.indent(-2).println().print("</ul>");
        assert_eq!(printer.as_str(), "<ul>\n  <li>\n</ul>");
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape_html("a<b>&\"'"), "a&lt;b&gt;&amp;&quot;&#39;");
        let mut printer = Printer::new();
        printer.print_encoded("x & y");
        assert_eq!(printer.into_string(), "x &amp; y");
        assert_eq!(unescape_html("&amp;lt; &lt;"), "&lt; <");
    }
}
