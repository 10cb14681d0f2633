//! Demo Page
//!
//! Builds the content tree served at `GET /page`: static layout with a
//! per-request greeting and a clock refreshed once per second.

use std::time::Duration;

use crate::render::{Dynamic, Element, Text};

/// Cache key root for the demo page
pub const PAGE_KEY: &str = "page";

/// Builds the demo page for one request.
pub fn demo_page(user: &str) -> Element {
    let greeting = format!("<p class=\"greeting\">Hello, {}!</p>", escape_html(user));

    Element::with_markup(
        "<!DOCTYPE html><html><head><title>Render cache</title></head><body>",
        "</body></html>",
    )
    .child(
        Element::new("nav")
            .child(Text::new("<a href=\"/page\">Home</a>"))
            .child(Text::new("<a href=\"/stats\">Stats</a>")),
    )
    .child(Text::new("<h1>Render cache demo</h1>"))
    .child(Dynamic::new(move || greeting.clone()))
    .child(
        Dynamic::new(|| {
            format!(
                "<p class=\"clock\">Rendered at {}</p>",
                chrono::Utc::now().format("%H:%M:%S")
            )
        })
        .refreshed_every(Duration::from_secs(1)),
    )
    .child(Text::new(
        "<footer>Static runs are cached as merged entries.</footer>",
    ))
}

/// Escapes text for use in HTML content.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
