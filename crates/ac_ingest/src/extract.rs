//! Readable-content extraction from article HTML.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use ac_core::FetchedContent;

const EXCERPT_CHARS: usize = 300;

/// Pull title, excerpt and body text out of an article page.
///
/// JSON-LD `headline`/`description` win, then OpenGraph and `<meta>` tags,
/// then `<title>`/`<h1>`. Body text is the `<article>` paragraphs when there
/// are any, every `<p>` otherwise.
pub fn extract_content(html: &str) -> FetchedContent {
    let document = Html::parse_document(html);
    let jsonld = jsonld_objects(&document);

    let title = jsonld_field(&jsonld, "headline")
        .or_else(|| meta_content(&document, "meta[property='og:title']"))
        .or_else(|| first_text(&document, "title"))
        .or_else(|| first_text(&document, "h1"))
        .unwrap_or_default();

    let mut paragraphs = texts(&document, "article p");
    if paragraphs.is_empty() {
        paragraphs = texts(&document, "p");
    }
    let text = paragraphs.join("\n\n");

    let excerpt = jsonld_field(&jsonld, "description")
        .or_else(|| meta_content(&document, "meta[property='og:description']"))
        .or_else(|| meta_content(&document, "meta[name='description']"))
        .unwrap_or_else(|| truncate_words(&text, EXCERPT_CHARS));

    FetchedContent {
        title,
        excerpt,
        text,
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn clean(text: impl AsRef<str>) -> Option<String> {
    let collapsed = text.as_ref().split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

fn element_text(el: ElementRef<'_>) -> Option<String> {
    clean(el.text().collect::<String>())
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = selector(css)?;
    document.select(&selector).find_map(element_text)
}

fn texts(document: &Html, css: &str) -> Vec<String> {
    let Some(selector) = selector(css) else {
        return Vec::new();
    };
    document.select(&selector).filter_map(element_text).collect()
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    let selector = selector(css)?;
    document
        .select(&selector)
        .find_map(|el| el.value().attr("content").and_then(clean))
}

/// Every JSON-LD object on the page, flattening top-level arrays and
/// `@graph` lists.
fn jsonld_objects(document: &Html) -> Vec<Value> {
    let Some(script_selector) = selector("script[type='application/ld+json']") else {
        return Vec::new();
    };
    let mut objects = Vec::new();
    for script in document.select(&script_selector) {
        let Ok(json) = serde_json::from_str::<Value>(script.text().collect::<String>().trim()) else {
            continue;
        };
        match json {
            Value::Array(items) => objects.extend(items),
            Value::Object(ref obj) if obj.contains_key("@graph") => {
                if let Some(Value::Array(items)) = obj.get("@graph") {
                    objects.extend(items.iter().cloned());
                }
            }
            other => objects.push(other),
        }
    }
    objects
}

fn jsonld_field(objects: &[Value], key: &str) -> Option<String> {
    objects
        .iter()
        .find_map(|obj| obj.get(key).and_then(Value::as_str).and_then(clean))
}

fn truncate_words(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out = String::new();
    for word in text.split_whitespace() {
        if out.chars().count() + word.chars().count() + 1 > max_chars {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out.push('…');
    out
}
