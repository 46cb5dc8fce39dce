//! HTML to structured markdown conversion.
//!
//! Only the page's `<main>` element is converted. Headings, paragraphs,
//! code, lists and tables keep their structure so the extraction model can
//! read prop tables as markdown tables.

use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, info};

use crate::models::{ParsedDocument, RawPage};

/// Convert a page's `<main>` element to markdown.
///
/// Returns `None` when the page has no `<main>` or it renders to nothing.
pub fn html_to_markdown(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let main_selector = Selector::parse("main").expect("valid selector");
    let main = document.select(&main_selector).next()?;

    let markdown = convert_element(main);
    let trimmed = markdown.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Convert crawled pages, dropping pages without main content.
pub fn parse_pages(pages: &[RawPage]) -> Vec<ParsedDocument> {
    let mut parsed = Vec::new();
    for (i, page) in pages.iter().enumerate() {
        debug!(url = %page.url, n = i + 1, total = pages.len(), "parsing page");
        match html_to_markdown(&page.html) {
            Some(content) => parsed.push(ParsedDocument {
                url: page.url.clone(),
                content,
            }),
            None => debug!(url = %page.url, "no main content, skipping"),
        }
    }
    info!(pages = pages.len(), documents = parsed.len(), "parsing complete");
    parsed
}

fn convert_element(element: ElementRef<'_>) -> String {
    match element.value().name() {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = element.value().name()[1..].parse::<usize>().unwrap_or(1);
            format!("\n{} {}\n", "#".repeat(level), stripped_text(element))
        }
        "p" => format!("{}\n", stripped_text(element)),
        "table" => format!("{}\n", convert_table(element)),
        "pre" => format!("```\n{}\n```\n", element.text().collect::<String>()),
        "code" => format!("`{}`", stripped_text(element)),
        "ul" => {
            let items: Vec<String> = element
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|child| child.value().name() == "li")
                .map(|li| format!("* {}", stripped_text(li)))
                .collect();
            format!("{}\n", items.join("\n"))
        }
        "div" | "main" => element
            .children()
            .map(|child| match child.value() {
                Node::Element(_) => ElementRef::wrap(child).map(convert_element).unwrap_or_default(),
                Node::Text(text) => text.trim().to_string(),
                _ => String::new(),
            })
            .collect(),
        _ => stripped_text(element),
    }
}

/// Convert an HTML table to a markdown table.
///
/// Headers come from `thead th`, falling back to the first row's cells.
/// Body rows whose cell count differs from the header count are dropped.
fn convert_table(table: ElementRef<'_>) -> String {
    let head_selector = Selector::parse("thead th").expect("valid selector");
    let row_selector = Selector::parse("tr").expect("valid selector");
    let body_row_selector = Selector::parse("tbody tr").expect("valid selector");
    let cell_selector = Selector::parse("td").expect("valid selector");

    let mut headers: Vec<String> = table.select(&head_selector).map(stripped_text).collect();

    if headers.is_empty() {
        if let Some(first_row) = table.select(&row_selector).next() {
            headers = first_row
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "th" | "td"))
                .map(stripped_text)
                .collect();
        }
    }

    if headers.is_empty() {
        return String::new();
    }

    let mut lines = vec![
        format!("| {} |", headers.join(" | ")),
        format!("| {} |", vec!["---"; headers.len()].join(" | ")),
    ];

    for row in table.select(&body_row_selector) {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|td| spaced_text(td).replace('\n', " "))
            .collect();
        if cells.len() == headers.len() {
            lines.push(format!("| {} |", cells.join(" | ")));
        }
    }

    lines.join("\n")
}

/// Text fragments trimmed and concatenated without separator.
fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

/// Text fragments trimmed and joined by single spaces.
fn spaced_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
