//! HTML parsing and text extraction

use super::{collapse_whitespace, ParsedPage};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose text is never shown to a reader
const INVISIBLE_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Parse HTML content, resolving links against `base_url`
pub fn parse_html(content: &str, base_url: Option<&Url>) -> ParsedPage {
    let document = Html::parse_document(content);

    let title = document_title(&document);

    let text = match Selector::parse("body")
        .ok()
        .and_then(|s| document.select(&s).next())
    {
        Some(body) => visible_text(body),
        None => visible_text(document.root_element()),
    };

    let mut links = Vec::new();
    if let Ok(selector) = Selector::parse("a[href]") {
        for elem in document.select(&selector) {
            if let Some(href) = elem.value().attr("href") {
                let href = href.trim();
                if href.is_empty() {
                    continue;
                }

                // Resolve relative URLs
                let url = match base_url {
                    Some(base) => base
                        .join(href)
                        .map(|u| u.to_string())
                        .unwrap_or_else(|_| href.to_string()),
                    None => href.to_string(),
                };
                links.push(url);
            }
        }
    }

    ParsedPage { title, text, links }
}

fn document_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let title = document.select(&selector).next()?;
    let text = collapse_whitespace(&title.text().collect::<String>());
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn visible_text(root: ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| INVISIBLE_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            parts.push(text);
        }
    }
    collapse_whitespace(&parts.join(" "))
}
