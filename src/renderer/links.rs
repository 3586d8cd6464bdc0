/// Link policy: how links and images turn into `href`/`src`, text and attributes
use super::printer::{entity_for, escape_html};
use crate::ast::Node;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed of the generator behind e-mail obfuscation.
pub const OBFUSCATION_SEED: u64 = 0x2626;

/// A link or image as seen by a [`LinkRenderer`]. URLs and titles are raw
/// source text; `text` and `alt` are already rendered HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link<'a> {
    Auto {
        url: &'a str,
    },
    Mail {
        address: &'a str,
    },
    Wiki {
        page: &'a str,
    },
    Explicit {
        url: &'a str,
        title: Option<&'a str>,
        text: &'a str,
    },
    /// A reference link whose key resolved to a definition.
    Reference {
        url: &'a str,
        title: Option<&'a str>,
        text: &'a str,
    },
    Image {
        url: &'a str,
        title: Option<&'a str>,
        alt: &'a str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Everything the renderer needs to print a link: `href` (or `src` for
/// images) and `text` (or `alt`) are printed as given, so they must already be
/// valid HTML attribute and content text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendering {
    pub href: String,
    pub text: String,
    pub attributes: Vec<Attribute>,
}

impl Rendering {
    pub fn new(href: impl Into<String>, text: impl Into<String>) -> Self {
        Rendering {
            href: href.into(),
            text: text.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }
}

pub trait LinkRenderer {
    fn render(&mut self, node: &Node, link: Link<'_>) -> Rendering;
}

/// Standard link policy. E-mail addresses are obfuscated character by
/// character with entities chosen by `rng`.
#[derive(Debug, Clone)]
pub struct DefaultLinkRenderer<R = StdRng> {
    rng: R,
}

impl DefaultLinkRenderer<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::seed_from_u64(OBFUSCATION_SEED))
    }
}

impl Default for DefaultLinkRenderer<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> DefaultLinkRenderer<R> {
    pub fn with_rng(rng: R) -> Self {
        DefaultLinkRenderer { rng }
    }

    /// Encodes every character as a decimal or hex character reference, a
    /// named entity or itself, one draw per character.
    pub fn obfuscate(&mut self, email: &str) -> String {
        let mut out = String::with_capacity(email.len() * 6);
        for c in email.chars() {
            match self.rng.gen_range(0..5) {
                0 | 1 => out.push_str(&format!("&#{};", c as u32)),
                2 | 3 => out.push_str(&format!("&#x{:x};", c as u32)),
                _ => match entity_for(c) {
                    Some(entity) => out.push_str(entity),
                    None => out.push(c),
                },
            }
        }
        out
    }
}

impl<R: Rng> LinkRenderer for DefaultLinkRenderer<R> {
    fn render(&mut self, _node: &Node, link: Link<'_>) -> Rendering {
        match link {
            Link::Auto { url } => Rendering::new(escape_html(url), escape_html(url)),
            Link::Mail { address } => {
                let obfuscated = self.obfuscate(address);
                Rendering::new(format!("mailto:{}", obfuscated), obfuscated)
            }
            Link::Wiki { page } => {
                let href = format!("./{}.html", url_encode(&page.replace(' ', "-")));
                Rendering::new(href, escape_html(page))
            }
            Link::Explicit { url, title, text } | Link::Reference { url, title, text } => {
                with_title(Rendering::new(escape_html(url), text), title)
            }
            Link::Image { url, title, alt } => with_title(Rendering::new(escape_html(url), alt), title),
        }
    }
}

fn with_title(rendering: Rendering, title: Option<&str>) -> Rendering {
    match title {
        Some(title) if !title.is_empty() => rendering.with_attribute("title", escape_html(title)),
        _ => rendering,
    }
}

/// Percent-encodes everything but ASCII alphanumerics and URL punctuation.
pub fn url_encode(text: &str) -> String {
    let mut result = String::new();
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric()
            || matches!(
                ch,
                '-' | '_' | '.' | '~' | '!' | '*' | '(' | ')' | ';' | ':' | '@' | '=' | '+' | '$' | ',' | '/'
            )
        {
            result.push(ch);
        } else {
            let mut bytes = [0; 4];
            for byte in ch.encode_utf8(&mut bytes).as_bytes() {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    fn node() -> Node {
        Node::new(NodeKind::Group, 0, 0)
    }

    fn decode(obfuscated: &str) -> String {
        let mut out = String::new();
        let mut rest = obfuscated;
        while let Some(c) = rest.chars().next() {
            if c == '&'
                && let Some(end) = rest.find(';')
            {
                let entity = &rest[1..end];
                let decoded = if let Some(hex) = entity.strip_prefix("#x") {
                    char::from_u32(u32::from_str_radix(hex, 16).unwrap()).unwrap()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    char::from_u32(dec.parse().unwrap()).unwrap()
                } else {
                    crate::renderer::printer::unescape_html(&rest[..=end]).chars().next().unwrap()
                };
                out.push(decoded);
                rest = &rest[end + 1..];
            } else {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
        out
    }

    #[test]
    fn test_obfuscation_is_deterministic_per_seed() {
        let first = DefaultLinkRenderer::new().obfuscate("me@example.com");
        let second = DefaultLinkRenderer::new().obfuscate("me@example.com");
        assert_eq!(first, second);
        assert_eq!(decode(&first), "me@example.com");
    }

    #[test]
    fn test_substituted_generator() {
        let mut renderer = DefaultLinkRenderer::with_rng(StdRng::seed_from_u64(7));
        let rendering = renderer.render(&node(), Link::Mail { address: "a@b" });
        assert!(rendering.href.starts_with("mailto:"));
        assert_eq!(decode(&rendering.text), "a@b");
    }

    #[test]
    fn test_wiki_link_href() {
        let rendering = DefaultLinkRenderer::new().render(&node(), Link::Wiki { page: "Main Page" });
        assert_eq!(rendering.href, "./Main-Page.html");
        assert_eq!(rendering.text, "Main Page");
    }

    #[test]
    fn test_title_attribute_only_when_present() {
        let mut renderer = DefaultLinkRenderer::new();
        let plain = renderer.render(
            &node(),
            Link::Explicit {
                url: "/a?b&c",
                title: Some(""),
                text: "x",
            },
        );
        assert_eq!(plain.href, "/a?b&amp;c");
        assert!(plain.attributes.is_empty());
        let titled = renderer.render(
            &node(),
            Link::Reference {
                url: "/a",
                title: Some("T \"q\""),
                text: "x",
            },
        );
        assert_eq!(titled.attributes[0].value, "T &quot;q&quot;");
    }

    #[test]
    fn test_url_encode() {
        assert_eq!(url_encode("a b/é"), "a%20b/%C3%A9");
    }
}
