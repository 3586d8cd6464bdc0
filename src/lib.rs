/// A pegdown-style Markdown to HTML converter built on a backtracking PEG parser
pub mod ast;
pub mod error;
pub mod extensions;
pub mod options;
pub mod parser;
pub mod renderer;

pub use error::{Error, ParseError, Result};
pub use extensions::Extensions;
pub use options::Options;

use parser::Parser;
use renderer::HtmlRenderer;

/// Parse markdown text and render to HTML
pub fn markdown_to_html(markdown: &str, extensions: Extensions) -> Result<String> {
    markdown_to_html_with(markdown, Options::new(extensions))
}

pub fn markdown_to_html_with(markdown: &str, options: Options) -> Result<String> {
    let ast = Parser::new(options).parse(markdown)?;
    Ok(HtmlRenderer::new(options.extensions).render(&ast))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_renders_nothing() {
        assert_eq!(markdown_to_html("", Extensions::NONE).unwrap(), "");
    }

    #[test]
    fn test_image_is_self_closing_with_title() {
        let result = markdown_to_html("![foo](/url \"title\")\n", Extensions::NONE).unwrap();
        assert_eq!(result, "<p><img src=\"/url\" alt=\"foo\" title=\"title\"/></p>");
    }

    #[test]
    fn test_image_without_title_omits_attribute() {
        let result = markdown_to_html("![bar](/path)\n", Extensions::NONE).unwrap();
        assert_eq!(result, "<p><img src=\"/path\" alt=\"bar\"/></p>");
    }

    #[test]
    fn test_zero_tab_stop_does_not_panic() {
        let options = Options::from_json(r#"{"tab_stop": 0}"#).unwrap();
        let result = markdown_to_html_with("a\tb\n", options).unwrap();
        assert_eq!(result, "<p>a b</p>");
    }

    #[test]
    fn test_options_tab_stop() {
        let options = Options::new(Extensions::NONE).with_tab_stop(4);
        let result = markdown_to_html_with("\tcode\n", options).unwrap();
        assert_eq!(result, "<pre><code>code\n</code></pre>");
    }
}
