use pegmark::renderer::printer::{escape_html, unescape_html};
use pegmark::{Extensions, markdown_to_html};
use proptest::prelude::*;

proptest! {
    #[test]
    fn escaping_touches_only_markup_characters(text in "\\PC*") {
        let escaped = escape_html(&text);
        prop_assert!(!escaped.contains(['<', '>', '"', '\'']));
        prop_assert_eq!(unescape_html(&escaped), text.clone());
        let stripped: String = text.chars().filter(|c| !"&<>\"'".contains(*c)).collect();
        let escaped_stripped: String = escape_html(&stripped);
        prop_assert_eq!(escaped_stripped, stripped);
    }

    #[test]
    fn plain_words_become_one_paragraph(text in "[a-z]{1,8}( [a-z]{1,8}){0,6}") {
        let html = markdown_to_html(&text, Extensions::NONE).unwrap();
        prop_assert_eq!(html, format!("<p>{}</p>", text));
    }

    #[test]
    fn text_is_escaped_in_paragraphs(text in "[a-z]{1,5}( [&>\"'][a-z]{1,5}){0,5}") {
        let html = markdown_to_html(&text, Extensions::NONE).unwrap();
        prop_assert_eq!(html, format!("<p>{}</p>", escape_html(&text)));
    }

    #[test]
    fn parsing_never_panics(text in "[a-z *_`#>\\-\\[\\]()!<&|:~\n]{0,40}") {
        let _ = markdown_to_html(&text, Extensions::ALL);
        let _ = markdown_to_html(&text, Extensions::NONE);
    }
}
