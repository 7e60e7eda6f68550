//! Markup to text.
//!
//! The parsers work on text lines, never on the DOM, so the page is reduced
//! to one text node per line.

use scraper::{Html, Node};

const SKIPPED_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// Joins every non-blank text node of the document, trimmed, with `\n`.
///
/// Text inside `script`, `style` and `noscript` elements is dropped.
pub fn flatten_html(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines: Vec<&str> = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| match a.value() {
            Node::Element(el) => SKIPPED_ELEMENTS.contains(&el.name()),
            _ => false,
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed);
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_nodes_become_lines() {
        let html = "<html><body><div>27 DEZ</div><span>3:14</span><span> 0,7 m </span><span>56</span></body></html>";
        assert_eq!(flatten_html(html), "27 DEZ\n3:14\n0,7 m\n56");
    }

    #[test]
    fn test_scripts_and_styles_are_dropped() {
        let html = "<html><head><style>td{}</style><script>var x = '12:00';</script></head>\
                    <body><noscript>ative o javascript</noscript><p>14:00</p></body></html>";
        assert_eq!(flatten_html(html), "14:00");
    }

    #[test]
    fn test_empty_document_is_empty_text() {
        assert_eq!(flatten_html(""), "");
        assert_eq!(flatten_html("<p>   </p>"), "");
    }

    #[test]
    fn test_entities_are_decoded() {
        assert_eq!(flatten_html("<p>C&eacute;u limpo</p>"), "Céu limpo");
    }
}
