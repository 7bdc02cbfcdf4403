//! Pagination – splits positioned boxes into pages.
//!
//! Handles:
//! - page boundaries for any page size
//! - page-break-before / page-break-after hints
//! - table row splitting across pages
//! - line splitting for text blocks taller than the space left on a page

use crate::fonts::FontManager;
use crate::layout::{BoxContent, PositionedBox};
use crate::layout_config::*;
use crate::style;

/// Page geometry in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageGeometry {
    pub fn content_height(&self) -> f32 {
        (self.height - 2.0 * self.margin).max(1.0)
    }
}

fn has_break_hint(pbox: &PositionedBox) -> bool {
    pbox.children
        .iter()
        .any(|c| c.page_break_before || c.page_break_after || has_break_hint(c))
}

/// Recursively expand pure-container boxes that are taller than a page, or
/// that hold a forced page break, so their children paginate individually.
fn flatten_for_pagination<'a>(
    boxes: &'a [PositionedBox],
    content_height: f32,
) -> Vec<&'a PositionedBox> {
    let mut result = Vec::new();
    for pbox in boxes {
        let container = matches!(pbox.content, BoxContent::None) && !pbox.children.is_empty();
        if container
            && !is_table_like(pbox)
            && (pbox.height > content_height || has_break_hint(pbox))
        {
            result.extend(flatten_for_pagination(&pbox.children, content_height));
        } else {
            result.push(pbox);
        }
    }
    result
}

struct Paginator<'f> {
    config: LayoutConfig,
    current: PageLayout,
    /// Document-space y at which the current page begins. Box y values are
    /// document coordinates, so `pbox.y - page_start` is the y on the page.
    page_start: f32,
    geometry: PageGeometry,
    fonts: &'f FontManager,
}

impl<'f> Paginator<'f> {
    fn content_height(&self) -> f32 {
        self.geometry.content_height()
    }

    fn y_on_page(&self, doc_y: f32) -> f32 {
        (doc_y - self.page_start).max(0.0)
    }

    fn new_page(&mut self, page_start: f32) {
        let next = PageLayout {
            page_index: self.config.pages.len() + 1,
            boxes: Vec::new(),
        };
        let done = std::mem::replace(&mut self.current, next);
        self.config.pages.push(done);
        self.page_start = page_start;
    }

    fn place(&mut self, pbox: &PositionedBox) {
        let y = self.y_on_page(pbox.y);
        let lb = positioned_to_layout_box(pbox, self.geometry.margin, y, self.fonts);
        self.current.boxes.push(lb);
    }

    fn push(&mut self, pbox: &PositionedBox) {
        if pbox.page_break_before && !self.current.boxes.is_empty() {
            self.new_page(pbox.y);
        }

        let box_bottom = self.y_on_page(pbox.y) + pbox.height;
        if box_bottom > self.content_height() {
            if !pbox.page_break_inside_avoid {
                if is_table_like(pbox) {
                    self.split_table_box(pbox);
                    self.after(pbox);
                    return;
                }
                if is_multiline_text(pbox) {
                    self.split_text_box(pbox);
                    self.after(pbox);
                    return;
                }
            }
            if !self.current.boxes.is_empty() {
                self.new_page(pbox.y);
            }
        }

        self.place(pbox);
        self.after(pbox);
    }

    fn after(&mut self, pbox: &PositionedBox) {
        if pbox.page_break_after {
            self.new_page(pbox.y + pbox.height);
        }
    }

    fn split_table_box(&mut self, pbox: &PositionedBox) {
        for row in &pbox.children {
            let bottom = self.y_on_page(row.y) + row.height;
            if bottom > self.content_height() && !self.current.boxes.is_empty() {
                self.new_page(row.y);
            }
            self.place(row);
        }
    }

    fn split_text_box(&mut self, pbox: &PositionedBox) {
        let BoxContent::Text { text, lines } = &pbox.content else {
            return;
        };
        let line_height = self
            .fonts
            .line_height_px(pbox.style.font_size, pbox.style.line_height)
            .max(0.1);

        let mut start = 0;
        while start < lines.len() {
            let doc_y = pbox.y + start as f32 * line_height;
            let room = ((self.content_height() - self.y_on_page(doc_y)) / line_height).floor();
            let mut fit = if room > 0.0 { room as usize } else { 0 };
            if fit == 0 {
                if !self.current.boxes.is_empty() {
                    self.new_page(doc_y);
                    continue;
                }
                fit = 1;
            }
            let end = (start + fit).min(lines.len());
            let part = PositionedBox {
                y: doc_y,
                height: (end - start) as f32 * line_height,
                content: BoxContent::Text {
                    text: text.clone(),
                    lines: lines[start..end].to_vec(),
                },
                children: Vec::new(),
                ..pbox.clone()
            };
            self.place(&part);
            start = end;
            if start < lines.len() {
                self.new_page(pbox.y + start as f32 * line_height);
            }
        }
    }

    fn finish(mut self) -> LayoutConfig {
        if !self.current.boxes.is_empty() {
            self.config.pages.push(self.current);
        }
        if self.config.pages.is_empty() {
            self.config.pages.push(PageLayout {
                page_index: 0,
                boxes: Vec::new(),
            });
        }
        for (i, page) in self.config.pages.iter_mut().enumerate() {
            page.page_index = i;
        }
        self.config
    }
}

/// Convert positioned boxes into a paginated LayoutConfig.
pub fn paginate(
    boxes: &[PositionedBox],
    title: &str,
    geometry: PageGeometry,
    fonts: &FontManager,
) -> LayoutConfig {
    let config = LayoutConfig {
        title: title.to_string(),
        page_width_pt: geometry.width,
        page_height_pt: geometry.height,
        pages: Vec::new(),
    };

    let mut paginator = Paginator {
        config,
        current: PageLayout {
            page_index: 0,
            boxes: Vec::new(),
        },
        page_start: 0.0,
        geometry,
        fonts,
    };

    for pbox in flatten_for_pagination(boxes, geometry.content_height()) {
        paginator.push(pbox);
    }
    paginator.finish()
}

fn is_table_like(pbox: &PositionedBox) -> bool {
    pbox.style.display == style::Display::Table && !pbox.children.is_empty()
}

fn is_multiline_text(pbox: &PositionedBox) -> bool {
    matches!(&pbox.content, BoxContent::Text { lines, .. } if lines.len() > 1)
}

/// Convert a PositionedBox to a LayoutBox with page-absolute coordinates.
/// Taffy's layout already encodes margins into `pbox.y`, so `y_on_page` is
/// the only vertical offset needed.
fn positioned_to_layout_box(
    pbox: &PositionedBox,
    page_margin: f32,
    y_on_page: f32,
    fonts: &FontManager,
) -> LayoutBox {
    build_layout_box(pbox, pbox.x, page_margin + y_on_page, fonts)
}

/// Recursively build a LayoutBox tree where every box carries page-absolute
/// x/y coordinates (origin = top-left of the physical page).
///
/// PositionedBox y values are document-space absolutes, so a child sits at
/// `parent_abs_y + (child.y - parent.y)`.
fn build_layout_box(
    pbox: &PositionedBox,
    abs_x: f32,
    abs_y: f32,
    fonts: &FontManager,
) -> LayoutBox {
    let mut lb = LayoutBox::new(abs_x, abs_y, pbox.width, pbox.height);
    let s = &pbox.style;

    if !s.background_color.is_transparent() {
        lb.background_color = Some(s.background_color.to_array());
    }

    if s.border_width > 0.0 {
        lb.border = Some(BorderStyle {
            width: s.border_width,
            color: s.border_color.to_array(),
        });
    }

    let bold = s.is_bold();
    let italic = s.is_italic();
    let line_height = fonts.line_height_px(s.font_size, s.line_height);

    match &pbox.content {
        BoxContent::Text { lines, .. } => {
            let text_lines: Vec<TextLine> = lines
                .iter()
                .enumerate()
                .map(|(i, line)| {
                    let width =
                        fonts.measure_text_width(line, s.font_size, bold, italic, &s.font_family);
                    let slack = (pbox.width - width).max(0.0);
                    let x_offset = match s.text_align {
                        style::TextAlign::Left => 0.0,
                        style::TextAlign::Center => slack / 2.0,
                        style::TextAlign::Right => slack,
                    };
                    TextLine {
                        text: line.clone(),
                        x_offset,
                        y_offset: i as f32 * line_height,
                        width,
                    }
                })
                .collect();

            lb.text = Some(TextContent {
                lines: text_lines,
                font_family: s.font_family.clone(),
                font_size: s.font_size,
                bold,
                italic,
                color: s.color.to_array(),
                line_height,
                text_align: s.text_align.as_str().to_string(),
                underline: s.text_decoration == style::TextDecoration::Underline,
                list_marker: None,
            });
        }
        BoxContent::Image { src } => {
            lb.image = Some(ImageContent {
                src: src.clone(),
                width: pbox.width,
                height: pbox.height,
            });
        }
        BoxContent::ListItem { marker } => {
            // The marker is drawn in the gutter left of the li box; the
            // item's own text lives in its child boxes.
            lb.text = Some(TextContent {
                lines: vec![],
                font_family: s.font_family.clone(),
                font_size: s.font_size,
                bold,
                italic: false,
                color: s.color.to_array(),
                line_height,
                text_align: style::TextAlign::Left.as_str().to_string(),
                underline: false,
                list_marker: Some(marker.clone()),
            });
        }
        BoxContent::None => {}
    }

    for child in &pbox.children {
        let child_abs_y = abs_y + (child.y - pbox.y);
        lb.children
            .push(build_layout_box(child, child.x, child_abs_y, fonts));
    }

    lb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::layout::compute_layout;
    use crate::style::build_styled_tree;
    use crate::stylesheet::Stylesheet;

    const A4: PageGeometry = PageGeometry {
        width: 595.0,
        height: 842.0,
        margin: 40.0,
    };

    fn paginate_html(html: &str, css: &str, geometry: PageGeometry) -> LayoutConfig {
        let dom = parse_html(html);
        let styled = build_styled_tree(&dom, None, &Stylesheet::parse(css));
        let fonts = FontManager::default();
        let boxes = compute_layout(&styled, geometry.width, geometry.margin, &fonts).unwrap();
        paginate(&boxes, "Test", geometry, &fonts)
    }

    fn all_boxes(config: &LayoutConfig) -> Vec<&LayoutBox> {
        fn walk<'a>(b: &'a LayoutBox, out: &mut Vec<&'a LayoutBox>) {
            out.push(b);
            b.children.iter().for_each(|c| walk(c, out));
        }
        let mut out = Vec::new();
        for page in &config.pages {
            page.boxes.iter().for_each(|b| walk(b, &mut out));
        }
        out
    }

    #[test]
    fn single_page() {
        let config = paginate_html("<p>Short text</p>", "", A4);
        assert_eq!(config.pages.len(), 1);
        assert_eq!(config.title, "Test");
        assert_eq!(config.text_lines(), vec!["Short text"]);
    }

    #[test]
    fn multiple_pages() {
        let mut html = String::new();
        for i in 0..60 {
            html.push_str(&format!("<p>Paragraph {} with some text</p>", i));
        }
        let config = paginate_html(&html, "", A4);
        assert!(
            config.pages.len() > 1,
            "Expected multiple pages, got {}",
            config.pages.len()
        );
        // Nothing is lost or duplicated across the breaks.
        assert_eq!(config.text_lines().len(), 60);
        for (i, page) in config.pages.iter().enumerate() {
            assert_eq!(page.page_index, i);
        }
    }

    #[test]
    fn boxes_stay_inside_the_page() {
        let mut rows = String::new();
        for i in 0..120 {
            rows.push_str(&format!("<tr><td>Row {i}</td><td>Value</td></tr>"));
        }
        let config = paginate_html(&format!("<table>{rows}</table>"), "", A4);
        assert!(config.pages.len() >= 2);
        for page in &config.pages {
            for b in &page.boxes {
                assert!(b.y >= A4.margin - 0.01);
                assert!(
                    b.y + b.height <= A4.height - A4.margin + 0.5,
                    "box at {} + {}",
                    b.y,
                    b.height
                );
            }
        }
        assert_eq!(
            config.text_lines().iter().filter(|l| l.starts_with("Row ")).count(),
            120
        );
    }

    #[test]
    fn forced_breaks_start_new_pages() {
        let config = paginate_html(
            r#"<div><p>one</p><p class="next">two</p></div>"#,
            ".next { page-break-before: always }",
            A4,
        );
        assert_eq!(config.pages.len(), 2);
    }

    #[test]
    fn long_text_splits_by_line() {
        let small = PageGeometry {
            width: 200.0,
            height: 200.0,
            margin: 20.0,
        };
        let words = "word ".repeat(400);
        let config = paginate_html(&format!("<p>{words}</p>"), "", small);
        assert!(config.pages.len() > 2);
        let total: usize = config
            .text_lines()
            .iter()
            .map(|l| l.split_whitespace().count())
            .sum();
        assert_eq!(total, 400);
    }

    #[test]
    fn alignment_and_colors_reach_the_layout() {
        let config = paginate_html(
            r#"<p style="text-align: center; background-color: #eee; border: 1px solid black">Mid</p>"#,
            "",
            A4,
        );
        let boxes = all_boxes(&config);
        let text = boxes
            .iter()
            .find_map(|b| b.text.as_ref())
            .unwrap();
        assert_eq!(text.text_align, "center");
        assert!(text.lines[0].x_offset > 200.0);
        assert!(boxes.iter().any(|b| b.background_color.is_some() && b.border.is_some()));
    }
}
