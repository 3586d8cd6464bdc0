/// Code block output, selectable per language
use super::printer::Printer;

pub trait VerbatimSerializer {
    /// Writes the complete markup for a code block.
    fn serialize(&self, text: &str, lang: Option<&str>, printer: &mut Printer);
}

/// `<pre><code class="lang">...</code></pre>`. Leading newlines of the code
/// become `<br/>` so they survive HTML whitespace handling.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultVerbatimSerializer;

impl VerbatimSerializer for DefaultVerbatimSerializer {
    fn serialize(&self, text: &str, lang: Option<&str>, printer: &mut Printer) {
        printer.println().print("<pre><code");
        if let Some(lang) = lang.filter(|lang| !lang.is_empty()) {
            printer.print(" class=\"").print_encoded(lang).print("\"");
        }
        printer.print(">");
        let body = text.trim_start_matches('\n');
        for _ in 0..text.len() - body.len() {
            printer.print("<br/>");
        }
        printer.print_encoded(body).print("</code></pre>");
    }
}

impl<F> VerbatimSerializer for F
where
    F: Fn(&str, Option<&str>, &mut Printer),
{
    fn serialize(&self, text: &str, lang: Option<&str>, printer: &mut Printer) {
        self(text, lang, printer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_serializer() {
        let mut printer = Printer::new();
        DefaultVerbatimSerializer.serialize("\n\nx < y\n", Some("rust"), &mut printer);
        assert_eq!(
            printer.as_str(),
            "<pre><code class=\"rust\"><br/><br/>x &lt; y\n</code></pre>"
        );
    }

    #[test]
    fn test_closure_serializer() {
        let upper = |text: &str, _: Option<&str>, printer: &mut Printer| {
            printer.print(&text.to_uppercase());
        };
        let mut printer = Printer::new();
        upper.serialize("abc", None, &mut printer);
        assert_eq!(printer.as_str(), "ABC");
    }
}
