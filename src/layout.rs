//! Layout engine – uses Taffy to compute flexbox layout from a styled DOM
//! tree, then converts the result into a tree of positioned boxes.
//!
//! Every block-level element becomes a flex container. Consecutive inline
//! content (text and inline elements) is merged into one anonymous text
//! leaf, word-wrapped at build time against the width the leaf is expected
//! to get. Tables are flex columns of flex rows whose cells share the row
//! width equally unless a cell has an explicit width.

use std::collections::HashMap;

use taffy::prelude::*;

use crate::dom::Tag;
use crate::error::RenderError;
use crate::fonts::{wrap_text, FontManager};
use crate::style::{self, ComputedStyle, StyledNode};

// ---------------------------------------------------------------------------
// Intermediate layout tree (pre-pagination)
// ---------------------------------------------------------------------------

/// A positioned box in document coordinates (before page splitting).
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub style: ComputedStyle,
    pub content: BoxContent,
    pub children: Vec<PositionedBox>,
    pub page_break_before: bool,
    pub page_break_after: bool,
    pub page_break_inside_avoid: bool,
}

impl PositionedBox {
    /// Text of this box and its descendants, one entry per wrapped line.
    pub fn text_lines(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_lines(&mut out);
        out
    }

    fn collect_lines<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let BoxContent::Text { lines, .. } = &self.content {
            out.extend(lines.iter().map(String::as_str));
        }
        for child in &self.children {
            child.collect_lines(out);
        }
    }
}

#[derive(Debug, Clone)]
pub enum BoxContent {
    None,
    Text {
        text: String,
        lines: Vec<String>,
    },
    Image {
        src: String,
    },
    /// List item marker
    ListItem {
        marker: String,
    },
}

// ---------------------------------------------------------------------------
// Build Taffy tree from styled nodes
// ---------------------------------------------------------------------------

/// How a child's width is settled by its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Stacked vertically and stretched to the parent's width.
    Stretch,
    /// Placed side by side, or otherwise sized by its own content.
    Shrink,
}

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontManager,
    node_styles: HashMap<NodeId, ComputedStyle>,
    node_content: HashMap<NodeId, BoxContent>,
    available_width: f32,
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontManager, available_width: f32) -> Self {
        Self {
            taffy: TaffyTree::new(),
            fonts,
            node_styles: HashMap::new(),
            node_content: HashMap::new(),
            available_width,
        }
    }

    /// Text and `display: inline` elements flow together in one text run.
    fn is_inline(node: &StyledNode) -> bool {
        match node {
            StyledNode::Text { .. } => true,
            StyledNode::Element { style, children, .. } => match style.display {
                style::Display::None => true,
                style::Display::Inline => children.iter().all(Self::is_inline),
                _ => false,
            },
        }
    }

    /// Raw text of an inline run. `<br>` becomes a newline.
    fn collect_inline_text(node: &StyledNode, out: &mut String) {
        match node {
            StyledNode::Text { text, .. } => out.push_str(text),
            StyledNode::Element { tag: Tag::Br, .. } => out.push('\n'),
            StyledNode::Element { style, .. } if style.display == style::Display::None => {}
            StyledNode::Element { children, .. } => {
                for child in children {
                    Self::collect_inline_text(child, out);
                }
            }
        }
    }

    /// The style of the first visible text in an inline run.
    fn first_text_style(node: &StyledNode) -> Option<&ComputedStyle> {
        match node {
            StyledNode::Text { text, style } if !text.trim().is_empty() => Some(style),
            StyledNode::Text { .. } => None,
            StyledNode::Element { style, .. } if style.display == style::Display::None => None,
            StyledNode::Element { children, .. } => {
                children.iter().find_map(Self::first_text_style)
            }
        }
    }

    fn build_node(
        &mut self,
        styled: &StyledNode,
        parent_width: f32,
        flow: Flow,
    ) -> Result<Option<NodeId>, RenderError> {
        match styled {
            StyledNode::Text { text, style } => {
                let text = collapse_whitespace(text);
                if text.is_empty() {
                    return Ok(None);
                }
                self.build_text_node(&text, style, parent_width, flow).map(Some)
            }
            StyledNode::Element {
                tag,
                style,
                children,
                attrs,
            } => self.build_element_node(tag, style, children, attrs, parent_width),
        }
    }

    /// Build one anonymous text leaf for a run of inline siblings.
    fn build_inline_run(
        &mut self,
        run: &[&StyledNode],
        container: &ComputedStyle,
        width: f32,
        flow: Flow,
    ) -> Result<Option<NodeId>, RenderError> {
        let mut raw = String::new();
        for node in run {
            Self::collect_inline_text(node, &mut raw);
        }
        let text = collapse_whitespace(&raw);
        if text.trim().is_empty() {
            return Ok(None);
        }
        let style = run
            .iter()
            .find_map(|n| Self::first_text_style(n))
            .cloned()
            .unwrap_or_else(|| container.for_text());
        self.build_text_node(&text, &style, width, flow).map(Some)
    }

    fn build_text_node(
        &mut self,
        text: &str,
        style: &ComputedStyle,
        parent_width: f32,
        flow: Flow,
    ) -> Result<NodeId, RenderError> {
        let bold = style.is_bold();
        let italic = style.is_italic();
        let family = &style.font_family;
        let font_size = style.font_size;
        let line_height_px = self.fonts.line_height_px(font_size, style.line_height);

        let max_w = if parent_width > 0.0 {
            parent_width
        } else {
            self.available_width
        };
        let lines = wrap_text(text, font_size, bold, italic, family, max_w, self.fonts);

        let text_width = lines
            .iter()
            .map(|l| self.fonts.measure_text_width(l, font_size, bold, italic, family))
            .fold(0.0f32, f32::max);
        let text_height = lines.len() as f32 * line_height_px;

        let taffy_style = Style {
            size: Size {
                width: match flow {
                    Flow::Stretch => Dimension::Auto,
                    Flow::Shrink => Dimension::Length(text_width.min(max_w)),
                },
                height: Dimension::Length(text_height),
            },
            min_size: Size {
                width: Dimension::Length(0.0),
                height: Dimension::Length(text_height),
            },
            ..Default::default()
        };

        let node = self.taffy.new_leaf(taffy_style)?;
        self.node_styles.insert(node, style.clone());
        self.node_content.insert(
            node,
            BoxContent::Text {
                text: text.to_string(),
                lines,
            },
        );
        Ok(node)
    }

    /// The children an element lays out. Table row groups are transparent.
    fn flow_children<'n>(style: &ComputedStyle, children: &'n [StyledNode]) -> Vec<&'n StyledNode> {
        if style.display != style::Display::Table {
            return children.iter().collect();
        }
        let mut rows = Vec::new();
        for child in children {
            match child {
                StyledNode::Element {
                    tag,
                    children: group,
                    style: group_style,
                    ..
                } if tag.is_row_group() && group_style.display != style::Display::None => {
                    rows.extend(group.iter());
                }
                other => rows.push(other),
            }
        }
        rows
    }

    fn build_element_node(
        &mut self,
        tag: &Tag,
        style: &ComputedStyle,
        children: &[StyledNode],
        attrs: &HashMap<String, String>,
        parent_width: f32,
    ) -> Result<Option<NodeId>, RenderError> {
        if style.display == style::Display::None {
            return Ok(None);
        }

        if *tag == Tag::Img {
            return self.build_image_node(style, attrs, parent_width).map(Some);
        }

        let my_width = match style.width {
            style::Dimension::Px(w) => w,
            style::Dimension::Percent(p) => parent_width * p / 100.0,
            style::Dimension::Auto => {
                parent_width - style.margin_left - style.margin_right
            }
        };
        let inner_width = (my_width
            - style.padding_left
            - style.padding_right
            - 2.0 * style.border_width)
            .max(1.0);

        let items = Self::flow_children(style, children);

        // Children of rows share the width; estimate each one's share so
        // text is wrapped at roughly the column width.
        let is_row = match style.display {
            style::Display::Flex => style.flex_direction == style::FlexDirection::Row,
            style::Display::TableRow | style::Display::Inline => true,
            _ => false,
        };
        let child_flow = if is_row
            || (style.display == style::Display::Flex
                && style.align_items != style::AlignItems::Stretch)
        {
            Flow::Shrink
        } else {
            Flow::Stretch
        };

        let block_count = items
            .iter()
            .filter(|c| !Self::is_inline(c))
            .count()
            .max(1);
        let child_build_width = if is_row {
            let gap_total = style.gap * block_count.saturating_sub(1) as f32;
            ((inner_width - gap_total) / block_count as f32).max(1.0)
        } else {
            inner_width
        };

        let mut child_nodes = Vec::new();
        let mut list_counter = 0u32;
        let mut run: Vec<&StyledNode> = Vec::new();

        for child in items {
            if Self::is_inline(child) {
                run.push(child);
                continue;
            }
            if let Some(id) = self.build_inline_run(&run, style, child_build_width, child_flow)? {
                child_nodes.push(id);
            }
            run.clear();

            let marker = match child {
                StyledNode::Element { tag: Tag::Li, style: s, .. }
                    if s.display != style::Display::None =>
                {
                    list_counter += 1;
                    Some(if *tag == Tag::Ol {
                        format!("{}. ", list_counter)
                    } else {
                        "\u{2022} ".to_string()
                    })
                }
                _ => None,
            };

            if let Some(child_id) = self.build_node(child, child_build_width, child_flow)? {
                if let Some(marker) = marker {
                    self.node_content
                        .insert(child_id, BoxContent::ListItem { marker });
                }
                child_nodes.push(child_id);
            }
        }
        if let Some(id) = self.build_inline_run(&run, style, child_build_width, child_flow)? {
            child_nodes.push(id);
        }

        let taffy_style = self.computed_to_taffy(style);
        let node = self.taffy.new_with_children(taffy_style, &child_nodes)?;
        self.node_styles.insert(node, style.clone());
        Ok(Some(node))
    }

    fn build_image_node(
        &mut self,
        style: &ComputedStyle,
        attrs: &HashMap<String, String>,
        parent_width: f32,
    ) -> Result<NodeId, RenderError> {
        let src = attrs.get("src").cloned().unwrap_or_default();
        // An auto-sized image without intrinsic dimensions would collapse to
        // 0×0, so take them from the decoded data.
        let sized = if matches!(style.width, style::Dimension::Auto)
            || matches!(style.height, style::Dimension::Auto)
        {
            resolve_img_auto_dimensions(&src, style, parent_width)
        } else {
            None
        };
        let effective = sized.as_ref().unwrap_or(style);
        let mut taffy_style = self.computed_to_taffy(effective);
        taffy_style.flex_shrink = 0.0;
        taffy_style.align_self = Some(taffy::AlignSelf::Start);

        let node = self.taffy.new_leaf(taffy_style)?;
        self.node_styles.insert(node, effective.clone());
        self.node_content.insert(node, BoxContent::Image { src });
        Ok(node)
    }

    fn computed_to_taffy(&self, s: &ComputedStyle) -> Style {
        let mut ts = Style::default();

        match s.display {
            style::Display::Table => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
                ts.size.width = self.dim_to_taffy(s.width);
                ts.size.height = self.dim_to_taffy(s.height);
                ts.min_size.width = Dimension::Length(0.0);
                Self::apply_edges(&mut ts, s);
                return ts;
            }
            style::Display::TableRow => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Row;
                ts.align_items = Some(taffy::AlignItems::Stretch);
                ts.size.width = Dimension::Percent(1.0);
                ts.min_size.width = Dimension::Length(0.0);
                Self::apply_edges(&mut ts, s);
                return ts;
            }
            style::Display::TableCell => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
                match s.width {
                    style::Dimension::Auto => {
                        // Equal columns.
                        ts.flex_grow = 1.0;
                        ts.flex_shrink = 1.0;
                        ts.flex_basis = Dimension::Length(0.0);
                    }
                    width => {
                        ts.flex_grow = 0.0;
                        ts.flex_shrink = 0.0;
                        ts.flex_basis = self.dim_to_taffy(width);
                    }
                }
                ts.size.height = self.dim_to_taffy(s.height);
                ts.min_size.width = Dimension::Length(0.0);
                ts.justify_content = Some(taffy::JustifyContent::Start);
                Self::apply_edges(&mut ts, s);
                return ts;
            }
            style::Display::Flex => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = match s.flex_direction {
                    style::FlexDirection::Row => taffy::FlexDirection::Row,
                    style::FlexDirection::Column => taffy::FlexDirection::Column,
                };
                ts.flex_wrap = match s.flex_wrap {
                    style::FlexWrap::NoWrap => taffy::FlexWrap::NoWrap,
                    style::FlexWrap::Wrap => taffy::FlexWrap::Wrap,
                };
                ts.justify_content = Some(match s.justify_content {
                    style::JustifyContent::Start => taffy::JustifyContent::Start,
                    style::JustifyContent::End => taffy::JustifyContent::End,
                    style::JustifyContent::Center => taffy::JustifyContent::Center,
                    style::JustifyContent::SpaceBetween => taffy::JustifyContent::SpaceBetween,
                    style::JustifyContent::SpaceAround => taffy::JustifyContent::SpaceAround,
                    style::JustifyContent::SpaceEvenly => taffy::JustifyContent::SpaceEvenly,
                });
                ts.align_items = Some(match s.align_items {
                    style::AlignItems::Start => taffy::AlignItems::Start,
                    style::AlignItems::End => taffy::AlignItems::End,
                    style::AlignItems::Center => taffy::AlignItems::Center,
                    style::AlignItems::Stretch => taffy::AlignItems::Stretch,
                });
            }
            style::Display::Grid => {
                ts.display = taffy::Display::Grid;
            }
            style::Display::Block
            | style::Display::ListItem
            | style::Display::InlineBlock => {
                // Block-level elements stack their children vertically.
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
            }
            style::Display::Inline => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Row;
                ts.flex_wrap = taffy::FlexWrap::Wrap;
            }
            style::Display::None => {
                ts.display = taffy::Display::None;
                return ts;
            }
        }

        ts.size = Size {
            width: self.dim_to_taffy(s.width),
            height: self.dim_to_taffy(s.height),
        };
        // Allow flex/shrink items to compress below their natural content size
        ts.min_size = Size {
            width: if s.flex_shrink > 0.0 || s.flex_grow > 0.0 {
                Dimension::Length(0.0)
            } else {
                self.dim_to_taffy(s.min_width)
            },
            height: Dimension::Auto,
        };
        ts.max_size = Size {
            width: self.dim_to_taffy(s.max_width),
            height: Dimension::Auto,
        };

        ts.flex_grow = s.flex_grow;
        ts.flex_shrink = s.flex_shrink;

        Self::apply_edges(&mut ts, s);

        ts.gap = Size {
            width: LengthPercentage::Length(s.gap),
            height: LengthPercentage::Length(s.gap),
        };

        ts
    }

    /// Margin, padding and border.
    fn apply_edges(ts: &mut Style, s: &ComputedStyle) {
        ts.margin = Rect {
            top: LengthPercentageAuto::Length(s.margin_top),
            right: LengthPercentageAuto::Length(s.margin_right),
            bottom: LengthPercentageAuto::Length(s.margin_bottom),
            left: LengthPercentageAuto::Length(s.margin_left),
        };
        ts.padding = Rect {
            top: LengthPercentage::Length(s.padding_top),
            right: LengthPercentage::Length(s.padding_right),
            bottom: LengthPercentage::Length(s.padding_bottom),
            left: LengthPercentage::Length(s.padding_left),
        };
        ts.border = Rect {
            top: LengthPercentage::Length(s.border_width),
            right: LengthPercentage::Length(s.border_width),
            bottom: LengthPercentage::Length(s.border_width),
            left: LengthPercentage::Length(s.border_width),
        };
    }

    fn dim_to_taffy(&self, d: style::Dimension) -> Dimension {
        match d {
            style::Dimension::Auto => Dimension::Auto,
            style::Dimension::Px(v) => Dimension::Length(v),
            style::Dimension::Percent(v) => Dimension::Percent(v / 100.0),
        }
    }

    /// Extract positioned boxes after layout computation.
    fn extract(
        &self,
        node: NodeId,
        offset_x: f32,
        offset_y: f32,
    ) -> Result<PositionedBox, RenderError> {
        let layout = self.taffy.layout(node)?;
        let style = self.node_styles.get(&node).cloned().unwrap_or_default();
        let content = self
            .node_content
            .get(&node)
            .cloned()
            .unwrap_or(BoxContent::None);

        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;
        let (width, height) = (layout.size.width, layout.size.height);

        let children = self
            .taffy
            .children(node)?
            .into_iter()
            .map(|child| self.extract(child, x, y))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PositionedBox {
            x,
            y,
            width,
            height,
            page_break_before: style.page_break_before,
            page_break_after: style.page_break_after,
            page_break_inside_avoid: style.page_break_inside_avoid,
            style,
            content,
            children,
        })
    }
}

/// Collapse runs of whitespace inside each line; keep explicit line breaks.
fn collapse_whitespace(text: &str) -> String {
    let lines: Vec<String> = text
        .split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();
    if lines.iter().all(String::is_empty) {
        return String::new();
    }
    // Source newlines only matter when a <br> put them there; the leading
    // and trailing ones come from markup indentation.
    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(0);
    let end = lines.iter().rposition(|l| !l.is_empty()).map_or(lines.len(), |i| i + 1);
    lines[start..end].join("\n")
}

// ---------------------------------------------------------------------------
// Image intrinsic-size helper
// ---------------------------------------------------------------------------

/// Return a copy of `style` with `Auto` width/height replaced by values
/// derived from the intrinsic size of a base64 data-URI image.
///
/// Returns `None` when the src is not a decodable data URI or when both
/// dimensions are already specified.
fn resolve_img_auto_dimensions(
    src: &str,
    style: &ComputedStyle,
    parent_width: f32,
) -> Option<ComputedStyle> {
    use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};

    if !src.starts_with("data:") || !src.contains(";base64,") {
        return None;
    }
    let comma = src.find(',')?;
    let bytes = BASE64_STD.decode(src[comma + 1..].trim()).ok()?;
    let img = ::image::load_from_memory(&bytes).ok()?;
    let (px_w, px_h) = (img.width() as f32, img.height() as f32);
    if px_w == 0.0 || px_h == 0.0 {
        return None;
    }
    let aspect = px_w / px_h;

    let known_w = match style.width {
        style::Dimension::Px(v) => Some(v),
        style::Dimension::Percent(p) => Some(parent_width * p / 100.0),
        style::Dimension::Auto => None,
    };
    let known_h = match style.height {
        style::Dimension::Px(v) => Some(v),
        _ => None,
    };

    let mut s = style.clone();
    match (known_w, known_h) {
        (Some(w), None) => s.height = style::Dimension::Px((w / aspect).max(1.0)),
        (None, Some(h)) => s.width = style::Dimension::Px((h * aspect).max(1.0)),
        (None, None) => {
            // 1 px = 1 pt, scaled down to fit the line.
            let w = px_w.min(parent_width.max(1.0));
            s.width = style::Dimension::Px(w);
            s.height = style::Dimension::Px(w / aspect);
        }
        (Some(_), Some(_)) => return None,
    }
    Some(s)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute layout for a styled tree, returning the top-level positioned
/// boxes in document coordinates. `x` includes the left page margin, `y`
/// starts at zero.
pub fn compute_layout(
    styled_nodes: &[StyledNode],
    page_width: f32,
    page_margin: f32,
    fonts: &FontManager,
) -> Result<Vec<PositionedBox>, RenderError> {
    let content_width = (page_width - 2.0 * page_margin).max(1.0);
    let mut builder = LayoutBuilder::new(fonts, content_width);

    let mut child_ids = Vec::new();
    for node in styled_nodes {
        if let Some(id) = builder.build_node(node, content_width, Flow::Stretch)? {
            child_ids.push(id);
        }
    }

    let root_style = Style {
        display: taffy::Display::Flex,
        flex_direction: taffy::FlexDirection::Column,
        size: Size {
            width: Dimension::Length(content_width),
            height: Dimension::Auto,
        },
        ..Default::default()
    };
    let root = builder.taffy.new_with_children(root_style, &child_ids)?;

    builder.taffy.compute_layout(
        root,
        Size {
            width: AvailableSpace::Definite(content_width),
            height: AvailableSpace::MaxContent,
        },
    )?;

    let root_box = builder.extract(root, page_margin, 0.0)?;
    Ok(root_box.children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::style::build_styled_tree;
    use crate::stylesheet::Stylesheet;

    fn layout(html: &str, css: &str) -> Vec<PositionedBox> {
        let dom = parse_html(html);
        let styled = build_styled_tree(&dom, None, &Stylesheet::parse(css));
        compute_layout(&styled, 595.0, 40.0, &FontManager::default()).unwrap()
    }

    fn find<'b>(
        boxes: &'b [PositionedBox],
        pred: &dyn Fn(&PositionedBox) -> bool,
    ) -> Option<&'b PositionedBox> {
        for b in boxes {
            if pred(b) {
                return Some(b);
            }
            if let Some(found) = find(&b.children, pred) {
                return Some(found);
            }
        }
        None
    }

    fn text_box<'b>(boxes: &'b [PositionedBox], needle: &str) -> &'b PositionedBox {
        find(boxes, &|b| {
            matches!(&b.content, BoxContent::Text { text, .. } if text.contains(needle))
        })
        .unwrap()
    }

    #[test]
    fn layout_simple_paragraph() {
        let boxes = layout("<p>Hello world</p>", "");
        assert_eq!(boxes.len(), 1, "only the <html> box is top level");
        let first = &boxes[0];
        assert!(first.width > 0.0, "Box should have width");
        assert!(first.height > 0.0, "Box should have height");
        assert_eq!(first.text_lines(), vec!["Hello world"]);
    }

    #[test]
    fn inline_runs_become_one_text_box() {
        let boxes = layout("<p>Hello <b>bold</b> and <i>italic</i><br>next</p>", "");
        let text = text_box(&boxes, "Hello");
        assert_eq!(text.text_lines(), vec!["Hello bold and italic", "next"]);
        // Stretched to the content width.
        assert!((text.width - 515.0).abs() < 0.5, "width {}", text.width);
        assert!((text.x - 40.0).abs() < 0.5);
    }

    #[test]
    fn head_content_is_not_laid_out() {
        let boxes = layout(
            "<html><head><title>Hidden title</title><style>p{}</style></head><body><p>Shown</p></body></html>",
            "",
        );
        let lines = boxes[0].text_lines();
        assert_eq!(lines, vec!["Shown"]);
    }

    #[test]
    fn table_cells_share_the_row() {
        let boxes = layout(
            "<table><thead><tr><th>Column 1</th><th>Column 2</th></tr></thead><tbody><tr><td>Row 1</td><td>x</td></tr></tbody></table>",
            "",
        );
        let table = find(&boxes, &|b| b.style.display == style::Display::Table).unwrap();
        assert_eq!(table.children.len(), 2, "row groups are flattened");
        let row = &table.children[1];
        assert_eq!(row.children.len(), 2);
        let (a, b) = (&row.children[0], &row.children[1]);
        // Taffy rounds to whole points, so an odd row width splits unevenly.
        assert!((a.width - b.width).abs() <= 1.0, "a={} b={}", a.width, b.width);
        assert!(b.x > a.x);
        assert!(text_box(&boxes, "Column 1").style.is_bold());
    }

    #[test]
    fn cell_height_stretches_its_row() {
        let boxes = layout(
            r#"<table><tr><td style="height: 150pt">tall</td><td>short</td></tr></table>"#,
            "",
        );
        let table = find(&boxes, &|b| b.style.display == style::Display::Table).unwrap();
        let row = &table.children[0];
        assert!((row.children[0].height - 150.0).abs() <= 1.0, "h={}", row.children[0].height);
        assert!(row.height >= 149.0);
        assert!((row.children[1].height - row.children[0].height).abs() <= 1.0);
    }

    #[test]
    fn list_items_get_markers() {
        let boxes = layout("<ol><li>one</li><li>two</li></ol><ul><li>dot</li></ul>", "");
        let markers: Vec<String> = {
            let mut out = Vec::new();
            fn walk(b: &PositionedBox, out: &mut Vec<String>) {
                if let BoxContent::ListItem { marker } = &b.content {
                    out.push(marker.clone());
                }
                b.children.iter().for_each(|c| walk(c, out));
            }
            boxes.iter().for_each(|b| walk(b, &mut out));
            out
        };
        assert_eq!(markers, vec!["1. ", "2. ", "\u{2022} "]);
    }

    #[test]
    fn flex_rows_and_fixed_widths() {
        let boxes = layout(
            r#"<div class="row"><div class="cell">A</div><div class="cell">B</div></div><div id="fixed">C</div>"#,
            ".row { display: flex } .cell { flex: 1 } #fixed { width: 100pt; padding: 10pt }",
        );
        let a = text_box(&boxes, "A");
        let b = text_box(&boxes, "B");
        assert!(b.x > a.x);
        let fixed = find(&boxes, &|b| b.style.width == style::Dimension::Px(100.0)).unwrap();
        assert!((fixed.width - 100.0).abs() < 0.5, "border-box width {}", fixed.width);
    }

    #[test]
    fn whitespace_collapses_per_line() {
        assert_eq!(collapse_whitespace("\n   a   b \n"), "a b");
        assert_eq!(collapse_whitespace("a\n\nb"), "a\n\nb");
        assert_eq!(collapse_whitespace(" \n "), "");
    }
}
