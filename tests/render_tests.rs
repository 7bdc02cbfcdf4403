//! Integration tests for the HTML + CSS → PDF renderer.
//!
//! These tests validate:
//! - Tag soup is cleaned before layout and the linked stylesheet is inlined
//! - Page geometry follows the render config and `@page`
//! - Long documents paginate and the PDF has one page per layout page
//! - Layout configs survive a JSON round trip

use pdf_mediator::clean::HtmlCleaner;
use pdf_mediator::inline_css::inject_css;
use pdf_mediator::layout_config::{LayoutBox, LayoutConfig};
use pdf_mediator::samples::{SAMPLE_CSS, SAMPLE_HTML};
use pdf_mediator::{compute_layout_config, HtmlToPdf, RenderConfig};

// =====================================================================
// Helper
// =====================================================================

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

fn long_document(paragraphs: usize) -> String {
    let body: String = (1..=paragraphs)
        .map(|i| format!("<p>Paragraph {i} of a long report body.</p>"))
        .collect();
    format!("<html><body><h1>Long report</h1>{body}</body></html>")
}

fn all_boxes(layout: &LayoutConfig) -> Vec<&LayoutBox> {
    fn walk<'a>(b: &'a LayoutBox, out: &mut Vec<&'a LayoutBox>) {
        out.push(b);
        for child in &b.children {
            walk(child, out);
        }
    }
    let mut out = Vec::new();
    for page in &layout.pages {
        for b in &page.boxes {
            walk(b, &mut out);
        }
    }
    out
}

// =====================================================================
// Cleaning and inlining
// =====================================================================

#[test]
fn sample_html_is_cleaned_and_styled() {
    let cleaned = HtmlCleaner::default().clean(SAMPLE_HTML).unwrap();
    assert!(!cleaned.contains("<!DOCTYPE"));
    assert!(cleaned.contains("<table>"));

    let inlined = inject_css(SAMPLE_CSS, &cleaned);
    assert!(!inlined.contains("<link"));
    assert!(inlined.contains("<style>body { font-family"));
}

#[test]
fn unclosed_cells_still_lay_out_as_a_table() {
    let layout = compute_layout_config(SAMPLE_HTML, SAMPLE_CSS, &RenderConfig::default()).unwrap();
    let lines = layout.text_lines();
    for needle in ["Header 1", "Header 2", "Header 3", "Row 1", "Row 2", "Column 3"] {
        assert!(lines.contains(&needle), "missing {needle} in {lines:?}");
    }

    // The three header cells share one row.
    let headers: Vec<&LayoutBox> = all_boxes(&layout)
        .into_iter()
        .filter(|b| {
            b.text
                .as_ref()
                .is_some_and(|t| t.lines.iter().any(|l| l.text.starts_with("Header")))
        })
        .collect();
    assert_eq!(headers.len(), 3);
    assert!(headers.windows(2).all(|w| (w[0].y - w[1].y).abs() < 0.5));
    assert!(headers[0].x < headers[1].x && headers[1].x < headers[2].x);
}

#[test]
fn line_breaks_split_text_lines() {
    let layout = compute_layout_config(SAMPLE_HTML, SAMPLE_CSS, &RenderConfig::default()).unwrap();
    let lines = layout.text_lines();
    assert!(lines.contains(&"Generated"), "{lines:?}");
    assert!(lines.contains(&"report"), "{lines:?}");
}

// =====================================================================
// Geometry and pagination
// =====================================================================

#[test]
fn content_starts_at_the_configured_margin() {
    let config = RenderConfig {
        page_margin: 30.0,
        ..RenderConfig::default()
    };
    let layout = compute_layout_config("<p>Margin</p>", "", &config).unwrap();
    let first = &layout.pages[0].boxes[0];
    assert!((first.x - 30.0).abs() < 0.01, "x = {}", first.x);
    assert!((first.y - 30.0).abs() < 0.01, "y = {}", first.y);
}

#[test]
fn long_documents_span_several_pages() {
    let html = long_document(200);
    let (bytes, layout) = HtmlToPdf::default().render(&html, "p { margin-bottom: 6pt }").unwrap();
    assert_valid_pdf(&bytes);
    assert!(layout.pages.len() > 1, "{} page(s)", layout.pages.len());

    let doc = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), layout.pages.len());

    // Every box stays inside the page it was placed on.
    for page in &layout.pages {
        for b in &page.boxes {
            assert!(b.y + b.height <= layout.page_height_pt - 40.0 + 0.5);
        }
    }
    let lines = layout.text_lines();
    assert!(lines.contains(&"Paragraph 200 of a long report body."));
}

#[test]
fn forced_page_breaks_are_honoured() {
    let html = r#"<p>First</p><p style="page-break-before: always">Second</p>"#;
    let layout = compute_layout_config(html, "", &RenderConfig::default()).unwrap();
    assert_eq!(layout.pages.len(), 2);
}

#[test]
fn landscape_pages_are_wider_than_tall() {
    let (bytes, layout) = HtmlToPdf::new(RenderConfig::a4_landscape())
        .render("<h1>Wide</h1>", "")
        .unwrap();
    assert_valid_pdf(&bytes);
    assert!(layout.page_width_pt > layout.page_height_pt);
}

// =====================================================================
// Layout config
// =====================================================================

#[test]
fn layout_config_round_trips_through_json() {
    let layout = compute_layout_config(SAMPLE_HTML, SAMPLE_CSS, &RenderConfig::default()).unwrap();
    let json = layout.to_json().unwrap();
    let back = LayoutConfig::from_json(&json).unwrap();
    assert_eq!(back.pages.len(), layout.pages.len());
    assert_eq!(back.text_lines(), layout.text_lines());
    assert_eq!(back.title, "Example page");
}
