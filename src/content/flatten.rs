use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

static BLOCK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("p, h1, h2, h3, h4, h5, h6, ul, ol, blockquote, pre").expect("valid selector")
});
static LIST_ITEM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("li").expect("valid selector"));

/// One renderable unit of an article body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum Block {
    Paragraph(String),
    Subtitle(String),
    List(Vec<String>),
    Quote(String),
}

fn text_of(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn parent_is_list(element: &ElementRef) -> bool {
    element
        .parent()
        .and_then(|parent| parent.value().as_element().map(|e| e.name().to_string()))
        .is_some_and(|name| name == "ul" || name == "ol")
}

fn to_block(element: &ElementRef) -> Option<Block> {
    let block = match element.value().name() {
        "ul" | "ol" => {
            let items: Vec<String> = element
                .select(&LIST_ITEM_SELECTOR)
                .map(|li| text_of(&li))
                .filter(|text| !text.is_empty())
                .collect();
            if items.is_empty() {
                return None;
            }
            Block::List(items)
        }
        name => {
            let text = text_of(element);
            if text.is_empty() {
                return None;
            }
            match name {
                "blockquote" => Block::Quote(text),
                "p" | "pre" => Block::Paragraph(text),
                _ => Block::Subtitle(text),
            }
        }
    };
    Some(block)
}

/// Flattens an HTML body into ordered, de-duplicated blocks.
///
/// A list is dropped when any of its items already appeared; any other block
/// is dropped when its text already appeared. Input the parser cannot make
/// sense of comes back whole as a single paragraph.
pub fn flatten_html(html: &str) -> Vec<Block> {
    if html.trim().is_empty() {
        return Vec::new();
    }

    let fragment = Html::parse_fragment(html);
    let mut seen: HashSet<String> = HashSet::new();
    let mut blocks = Vec::new();

    for element in fragment.select(&BLOCK_SELECTOR) {
        if parent_is_list(&element) {
            continue;
        }
        let Some(block) = to_block(&element) else {
            continue;
        };
        match &block {
            Block::List(items) => {
                if items.iter().any(|item| seen.contains(item)) {
                    continue;
                }
                seen.extend(items.iter().cloned());
            }
            Block::Paragraph(text) | Block::Subtitle(text) | Block::Quote(text) => {
                if !seen.insert(text.clone()) {
                    continue;
                }
            }
        }
        blocks.push(block);
    }

    if blocks.is_empty() && !fragment.errors.is_empty() {
        debug!(
            "HTML body produced no blocks and {} parse errors; keeping it raw",
            fragment.errors.len()
        );
        return vec![Block::Paragraph(html.to_string())];
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn paragraph_then_list() {
        let blocks = flatten_html("<p>A</p><ul><li>B</li><li>C</li></ul>");
        assert_eq!(
            serde_json::to_value(&blocks).unwrap(),
            json!([
                {"type": "paragraph", "content": "A"},
                {"type": "list", "content": ["B", "C"]}
            ])
        );
    }

    #[test]
    fn empty_input_has_no_blocks() {
        assert!(flatten_html("").is_empty());
        assert!(flatten_html("   ").is_empty());
    }

    #[test]
    fn headings_quotes_and_preformatted_text() {
        let blocks = flatten_html(
            "<h2> Requisitos </h2><blockquote>Ahorra hoy</blockquote><pre>línea</pre>",
        );
        assert_eq!(
            blocks,
            vec![
                Block::Subtitle("Requisitos".to_string()),
                Block::Quote("Ahorra hoy".to_string()),
                Block::Paragraph("línea".to_string()),
            ]
        );
    }

    #[test]
    fn nested_lists_are_not_emitted_twice() {
        let blocks = flatten_html("<ul><li>Uno<ul><li>Dos</li></ul></li></ul>");
        assert_eq!(blocks.len(), 1);
        match &blocks[0] {
            Block::List(items) => assert_eq!(items, &vec!["UnoDos".to_string(), "Dos".to_string()]),
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn repeated_text_is_dropped() {
        let blocks = flatten_html("<p>Hola</p><h3>Hola</h3><ul><li>Hola</li><li>Otro</li></ul><p>Otro</p>");
        // The list is dropped whole, so "Otro" is still unseen afterwards.
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph("Hola".to_string()),
                Block::Paragraph("Otro".to_string()),
            ]
        );
    }

    #[test]
    fn blank_blocks_and_lists_are_skipped() {
        let blocks = flatten_html("<p>  </p><ul><li> </li></ul><p>Texto</p>");
        assert_eq!(blocks, vec![Block::Paragraph("Texto".to_string())]);
    }

    #[test]
    fn unparseable_input_falls_back_to_raw_paragraph() {
        let raw = "<<< texto </roto";
        assert_eq!(flatten_html(raw), vec![Block::Paragraph(raw.to_string())]);
    }
}
