//! Style resolver – cascades tag defaults, author stylesheets and inline
//! styles into a flat [`ComputedStyle`] consumed by the layout engine.
//!
//! Lengths are in points. CSS pixels are taken as points, which keeps
//! stylesheets written for screen output at their intended proportions.

use std::collections::HashMap;

use crate::dom::{DomNode, ElementNode, Tag};
use crate::stylesheet::{parse_absolute_length, parse_declarations, Stylesheet};

/// Fully resolved style for a single element.
#[derive(Debug, Clone)]
pub struct ComputedStyle {
    // Display / layout
    pub display: Display,
    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub gap: f32,

    // Sizing
    pub width: Dimension,
    pub height: Dimension,
    pub min_width: Dimension,
    pub max_width: Dimension,

    // Spacing
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub padding_top: f32,
    pub padding_right: f32,
    pub padding_bottom: f32,
    pub padding_left: f32,

    // Border
    pub border_width: f32,
    pub border_color: Color,

    // Typography (inherited)
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_family: String,
    pub color: Color,
    pub text_align: TextAlign,
    pub line_height: f32,
    pub text_decoration: TextDecoration,
    pub font_style: FontStyle,

    // Background
    pub background_color: Color,

    // Page break
    pub page_break_before: bool,
    pub page_break_after: bool,
    pub page_break_inside_avoid: bool,
}

pub const DEFAULT_FONT_SIZE: f32 = 12.0;

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            flex_direction: FlexDirection::Row,
            flex_wrap: FlexWrap::NoWrap,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            gap: 0.0,
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_width: Dimension::Auto,
            max_width: Dimension::Auto,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            padding_top: 0.0,
            padding_right: 0.0,
            padding_bottom: 0.0,
            padding_left: 0.0,
            border_width: 0.0,
            border_color: Color::BLACK,
            font_size: DEFAULT_FONT_SIZE,
            font_weight: FontWeight::Normal,
            font_family: FontFamily::Helvetica.name().to_string(),
            color: Color::BLACK,
            text_align: TextAlign::Left,
            line_height: 1.4,
            text_decoration: TextDecoration::None,
            font_style: FontStyle::Normal,
            background_color: Color::TRANSPARENT,
            page_break_before: false,
            page_break_after: false,
            page_break_inside_avoid: false,
        }
    }
}

impl ComputedStyle {
    /// A style carrying only the inherited text properties of `parent`.
    pub fn inherit(parent: &ComputedStyle) -> Self {
        Self {
            font_size: parent.font_size,
            font_weight: parent.font_weight,
            font_family: parent.font_family.clone(),
            color: parent.color,
            text_align: parent.text_align,
            line_height: parent.line_height,
            text_decoration: parent.text_decoration,
            font_style: parent.font_style,
            ..Self::default()
        }
    }

    /// The style of a run of text inside an element with this style. Text
    /// renders inline, so box-model properties are not carried over.
    pub fn for_text(&self) -> Self {
        Self {
            display: Display::Inline,
            ..Self::inherit(self)
        }
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight == FontWeight::Bold
    }

    pub fn is_italic(&self) -> bool {
        self.font_style == FontStyle::Italic
    }
}

// ---------------------------------------------------------------------------
// Supporting enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Flex,
    Grid,
    Inline,
    InlineBlock,
    ListItem,
    Table,
    TableRow,
    TableCell,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexDirection {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexWrap {
    NoWrap,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JustifyContent {
    Start,
    End,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignItems {
    Start,
    End,
    Center,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDecoration {
    None,
    Underline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

/// The builtin PDF font families text can be set in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    Helvetica,
    Times,
    Courier,
}

impl FontFamily {
    pub fn name(&self) -> &'static str {
        match self {
            FontFamily::Helvetica => "Helvetica",
            FontFamily::Times => "Times",
            FontFamily::Courier => "Courier",
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "Times" => FontFamily::Times,
            "Courier" => FontFamily::Courier,
            _ => FontFamily::Helvetica,
        }
    }

    /// Pick the first family of a CSS `font-family` list we can map.
    pub fn from_css(list: &str) -> Option<Self> {
        list.split(',').find_map(|entry| {
            let name = entry
                .trim()
                .trim_matches(|c| c == '"' || c == '\'')
                .to_ascii_lowercase();
            match name.as_str() {
                "monospace" | "courier" | "courier new" | "consolas" | "menlo" => {
                    Some(FontFamily::Courier)
                }
                "serif" | "times" | "times new roman" | "georgia" | "garamond" => {
                    Some(FontFamily::Times)
                }
                "sans-serif" | "helvetica" | "arial" | "verdana" | "tahoma" => {
                    Some(FontFamily::Helvetica)
                }
                _ => None,
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Px(f32),
    Percent(f32),
}

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => Some(Self::rgb(
                channel(&hex[0..1].repeat(2))?,
                channel(&hex[1..2].repeat(2))?,
                channel(&hex[2..3].repeat(2))?,
            )),
            _ => None,
        }
    }

    /// Parse a hex, `rgb()`/`rgba()` or named colour.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.starts_with('#') {
            return Self::from_hex(value);
        }
        let lower = value.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|s| s.strip_suffix(')'))
        {
            let parts: Vec<&str> = args.split([',', ' ', '/']).filter(|p| !p.is_empty()).collect();
            if parts.len() < 3 {
                return None;
            }
            let channel = |s: &str| -> Option<f32> {
                match s.strip_suffix('%') {
                    Some(p) => p.parse::<f32>().ok().map(|v| v / 100.0),
                    None => s.parse::<f32>().ok().map(|v| v / 255.0),
                }
            };
            let alpha = match parts.get(3) {
                Some(a) => match a.strip_suffix('%') {
                    Some(p) => p.parse::<f32>().ok()? / 100.0,
                    None => a.parse::<f32>().ok()?,
                },
                None => 1.0,
            };
            return Some(Self {
                r: channel(parts[0])?.clamp(0.0, 1.0),
                g: channel(parts[1])?.clamp(0.0, 1.0),
                b: channel(parts[2])?.clamp(0.0, 1.0),
                a: alpha.clamp(0.0, 1.0),
            });
        }
        named_color(&lower)
    }
}

fn named_color(name: &str) -> Option<Color> {
    Some(match name {
        "transparent" => Color::TRANSPARENT,
        "black" => Color::BLACK,
        "white" => Color::WHITE,
        "red" => Color::rgb(255, 0, 0),
        "green" => Color::rgb(0, 128, 0),
        "lime" => Color::rgb(0, 255, 0),
        "blue" => Color::rgb(0, 0, 255),
        "navy" => Color::rgb(0, 0, 128),
        "yellow" => Color::rgb(255, 255, 0),
        "orange" => Color::rgb(255, 165, 0),
        "purple" => Color::rgb(128, 0, 128),
        "maroon" => Color::rgb(128, 0, 0),
        "olive" => Color::rgb(128, 128, 0),
        "teal" => Color::rgb(0, 128, 128),
        "aqua" | "cyan" => Color::rgb(0, 255, 255),
        "fuchsia" | "magenta" => Color::rgb(255, 0, 255),
        "silver" => Color::rgb(192, 192, 192),
        "gray" | "grey" => Color::rgb(128, 128, 128),
        "lightgray" | "lightgrey" => Color::rgb(211, 211, 211),
        "darkgray" | "darkgrey" => Color::rgb(169, 169, 169),
        "whitesmoke" => Color::rgb(245, 245, 245),
        "gainsboro" => Color::rgb(220, 220, 220),
        _ => return None,
    })
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// Resolve the style of `element`.
///
/// Precedence, lowest first: inherited text properties, tag defaults,
/// stylesheet rules by specificity, the `style` attribute.
pub fn resolve_style(
    element: &ElementNode,
    parent: Option<&ComputedStyle>,
    sheet: &Stylesheet,
    ancestors: &[&ElementNode],
) -> ComputedStyle {
    let parent_font_size = parent.map_or(DEFAULT_FONT_SIZE, |p| p.font_size);
    let mut style = match parent {
        Some(p) => ComputedStyle::inherit(p),
        None => ComputedStyle::default(),
    };

    apply_tag_defaults(&mut style, &element.tag);

    for (prop, val) in sheet.matching_declarations(element, ancestors) {
        apply_css_property(&mut style, prop, val, parent_font_size);
    }

    if let Some(inline) = element.inline_style() {
        for (prop, val) in parse_declarations(inline) {
            apply_css_property(&mut style, &prop, &val, parent_font_size);
        }
    }

    style
}

/// Default styles based on tag semantics, relative to the inherited font size.
fn apply_tag_defaults(s: &mut ComputedStyle, tag: &Tag) {
    let heading = |s: &mut ComputedStyle, scale: f32| {
        s.font_size *= scale;
        s.font_weight = FontWeight::Bold;
        s.margin_top = s.font_size * 0.67;
        s.margin_bottom = s.font_size * 0.5;
    };
    match tag {
        Tag::H1 => heading(s, 2.0),
        Tag::H2 => heading(s, 1.5),
        Tag::H3 => heading(s, 1.17),
        Tag::H4 => heading(s, 1.0),
        Tag::H5 => heading(s, 0.83),
        Tag::H6 => heading(s, 0.67),
        Tag::P => {
            s.margin_bottom = s.font_size * 0.8;
        }
        Tag::Ul | Tag::Ol => {
            s.margin_bottom = s.font_size * 0.8;
            s.padding_left = 24.0;
        }
        Tag::Li => {
            s.display = Display::ListItem;
            s.margin_bottom = 4.0;
        }
        Tag::Table => {
            s.display = Display::Table;
            s.margin_bottom = s.font_size * 0.8;
        }
        Tag::Tr => s.display = Display::TableRow,
        Tag::Td | Tag::Th => {
            s.display = Display::TableCell;
            s.padding_top = 2.0;
            s.padding_right = 4.0;
            s.padding_bottom = 2.0;
            s.padding_left = 4.0;
            if *tag == Tag::Th {
                s.font_weight = FontWeight::Bold;
            }
        }
        Tag::B | Tag::Strong => {
            s.display = Display::Inline;
            s.font_weight = FontWeight::Bold;
        }
        Tag::I | Tag::Em => {
            s.display = Display::Inline;
            s.font_style = FontStyle::Italic;
        }
        Tag::U => {
            s.display = Display::Inline;
            s.text_decoration = TextDecoration::Underline;
        }
        Tag::A => {
            s.display = Display::Inline;
            s.text_decoration = TextDecoration::Underline;
            s.color = Color::rgb(0, 0, 238);
        }
        Tag::Span | Tag::Br => s.display = Display::Inline,
        Tag::Img => s.display = Display::InlineBlock,
        Tag::Head | Tag::Title | Tag::Style | Tag::Script => s.display = Display::None,
        Tag::Thead
        | Tag::Tbody
        | Tag::Tfoot
        | Tag::Div
        | Tag::Body
        | Tag::Html
        | Tag::Unknown(_) => {}
    }
}

/// Apply one CSS declaration. Unknown properties and unparsable values are
/// ignored.
pub fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str, parent_font_size: f32) {
    let font_size = s.font_size;
    let len = |v: &str| parse_length(v, font_size);
    match prop {
        "display" => {
            s.display = match val {
                "flex" => Display::Flex,
                "grid" => Display::Grid,
                "block" => Display::Block,
                "inline" => Display::Inline,
                "inline-block" => Display::InlineBlock,
                "list-item" => Display::ListItem,
                "table" => Display::Table,
                "table-row" => Display::TableRow,
                "table-cell" => Display::TableCell,
                "none" => Display::None,
                _ => s.display,
            }
        }
        "flex-direction" => {
            s.flex_direction = match val {
                "row" | "row-reverse" => FlexDirection::Row,
                "column" | "column-reverse" => FlexDirection::Column,
                _ => s.flex_direction,
            }
        }
        "flex-wrap" => {
            s.flex_wrap = match val {
                "wrap" | "wrap-reverse" => FlexWrap::Wrap,
                _ => FlexWrap::NoWrap,
            }
        }
        "flex-grow" => {
            if let Ok(v) = val.parse() {
                s.flex_grow = v;
            }
        }
        "flex-shrink" => {
            if let Ok(v) = val.parse() {
                s.flex_shrink = v;
            }
        }
        "flex" => match val {
            "none" => {
                s.flex_grow = 0.0;
                s.flex_shrink = 0.0;
            }
            "auto" => {
                s.flex_grow = 1.0;
                s.flex_shrink = 1.0;
            }
            _ => {
                let mut parts = val.split_whitespace();
                if let Some(Ok(grow)) = parts.next().map(str::parse::<f32>) {
                    s.flex_grow = grow;
                }
                if let Some(Ok(shrink)) = parts.next().map(str::parse::<f32>) {
                    s.flex_shrink = shrink;
                }
            }
        },
        "justify-content" => {
            s.justify_content = match val {
                "flex-start" | "start" | "left" => JustifyContent::Start,
                "flex-end" | "end" | "right" => JustifyContent::End,
                "center" => JustifyContent::Center,
                "space-between" => JustifyContent::SpaceBetween,
                "space-around" => JustifyContent::SpaceAround,
                "space-evenly" => JustifyContent::SpaceEvenly,
                _ => s.justify_content,
            }
        }
        "align-items" => {
            s.align_items = match val {
                "flex-start" | "start" => AlignItems::Start,
                "flex-end" | "end" => AlignItems::End,
                "center" => AlignItems::Center,
                "stretch" => AlignItems::Stretch,
                _ => s.align_items,
            }
        }
        "font-size" => {
            if let Some(size) = parse_font_size(val, parent_font_size) {
                s.font_size = size;
            }
        }
        "font-weight" => {
            s.font_weight = match val {
                "bold" | "bolder" | "600" | "700" | "800" | "900" => FontWeight::Bold,
                _ => FontWeight::Normal,
            }
        }
        "font-style" => {
            s.font_style = match val {
                "italic" | "oblique" => FontStyle::Italic,
                _ => FontStyle::Normal,
            }
        }
        "font-family" => {
            if let Some(family) = FontFamily::from_css(val) {
                s.font_family = family.name().to_string();
            }
        }
        "font" => apply_font_shorthand(s, val, parent_font_size),
        "color" => {
            if let Some(c) = Color::parse(val) {
                s.color = c;
            }
        }
        "background-color" => {
            if let Some(c) = Color::parse(val) {
                s.background_color = c;
            }
        }
        "background" => {
            if let Some(c) = val.split_whitespace().find_map(Color::parse) {
                s.background_color = c;
            }
        }
        "text-align" => {
            s.text_align = match val {
                "center" => TextAlign::Center,
                "right" | "end" => TextAlign::Right,
                _ => TextAlign::Left,
            }
        }
        "text-decoration" | "text-decoration-line" => {
            s.text_decoration = if val.split_whitespace().any(|v| v == "underline") {
                TextDecoration::Underline
            } else {
                TextDecoration::None
            }
        }
        "line-height" => {
            if val == "normal" {
                s.line_height = 1.4;
            } else if let Ok(v) = val.parse::<f32>() {
                s.line_height = v;
            } else if let Some(pt) = len(val) {
                if font_size > 0.0 {
                    s.line_height = pt / font_size;
                }
            }
        }
        "width" => s.width = parse_dimension(val, font_size),
        "height" => s.height = parse_dimension(val, font_size),
        "min-width" => s.min_width = parse_dimension(val, font_size),
        "max-width" => s.max_width = parse_dimension(val, font_size),
        "margin" => apply_box_shorthand(
            val,
            font_size,
            [
                &mut s.margin_top,
                &mut s.margin_right,
                &mut s.margin_bottom,
                &mut s.margin_left,
            ],
        ),
        "margin-top" => set_length(&mut s.margin_top, len(val)),
        "margin-right" => set_length(&mut s.margin_right, len(val)),
        "margin-bottom" => set_length(&mut s.margin_bottom, len(val)),
        "margin-left" => set_length(&mut s.margin_left, len(val)),
        "padding" => apply_box_shorthand(
            val,
            font_size,
            [
                &mut s.padding_top,
                &mut s.padding_right,
                &mut s.padding_bottom,
                &mut s.padding_left,
            ],
        ),
        "padding-top" => set_length(&mut s.padding_top, len(val)),
        "padding-right" => set_length(&mut s.padding_right, len(val)),
        "padding-bottom" => set_length(&mut s.padding_bottom, len(val)),
        "padding-left" => set_length(&mut s.padding_left, len(val)),
        "border" | "border-top" | "border-right" | "border-bottom" | "border-left" => {
            apply_border_shorthand(s, val)
        }
        "border-width" => {
            if let Some(w) = val.split_whitespace().next().and_then(border_width) {
                s.border_width = w;
            }
        }
        "border-color" => {
            if let Some(c) = val.split_whitespace().next().and_then(Color::parse) {
                s.border_color = c;
            }
        }
        "border-style" => {
            if val == "none" || val == "hidden" {
                s.border_width = 0.0;
            }
        }
        "gap" | "grid-gap" => set_length(&mut s.gap, len(val)),
        "break-before" | "page-break-before" => {
            s.page_break_before = val == "always" || val == "page";
        }
        "break-after" | "page-break-after" => {
            s.page_break_after = val == "always" || val == "page";
        }
        "break-inside" | "page-break-inside" => {
            s.page_break_inside_avoid = val == "avoid" || val == "avoid-page";
        }
        _ => {}
    }
}

fn set_length(target: &mut f32, value: Option<f32>) {
    if let Some(v) = value {
        *target = v;
    }
}

/// Parse a length in points. `em` is relative to `font_size`.
pub fn parse_length(value: &str, font_size: f32) -> Option<f32> {
    let value = value.trim();
    if let Some(n) = value.strip_suffix("rem") {
        return n.trim().parse::<f32>().ok().map(|v| v * DEFAULT_FONT_SIZE);
    }
    if let Some(n) = value.strip_suffix("em") {
        return n.trim().parse::<f32>().ok().map(|v| v * font_size);
    }
    parse_absolute_length(value).or_else(|| {
        // Unitless numbers are accepted as points, as browsers do in quirks mode.
        value.parse::<f32>().ok()
    })
}

fn parse_font_size(value: &str, parent_font_size: f32) -> Option<f32> {
    let keyword = match value {
        "xx-small" => Some(0.6),
        "x-small" => Some(0.75),
        "small" => Some(0.89),
        "medium" => Some(1.0),
        "large" => Some(1.2),
        "x-large" => Some(1.5),
        "xx-large" => Some(2.0),
        _ => None,
    };
    if let Some(scale) = keyword {
        return Some(DEFAULT_FONT_SIZE * scale);
    }
    match value {
        "smaller" => return Some(parent_font_size / 1.2),
        "larger" => return Some(parent_font_size * 1.2),
        _ => {}
    }
    if let Some(p) = value.strip_suffix('%') {
        return p.trim().parse::<f32>().ok().map(|v| parent_font_size * v / 100.0);
    }
    parse_length(value, parent_font_size).filter(|v| *v > 0.0)
}

fn parse_dimension(s: &str, font_size: f32) -> Dimension {
    let s = s.trim();
    if s == "auto" || s == "none" {
        Dimension::Auto
    } else if let Some(p) = s.strip_suffix('%') {
        p.parse::<f32>()
            .map(Dimension::Percent)
            .unwrap_or(Dimension::Auto)
    } else {
        parse_length(s, font_size)
            .map(Dimension::Px)
            .unwrap_or(Dimension::Auto)
    }
}

fn apply_box_shorthand(val: &str, font_size: f32, [top, right, bottom, left]: [&mut f32; 4]) {
    let parts: Vec<f32> = val
        .split_whitespace()
        .map(|p| if p == "auto" { Some(0.0) } else { parse_length(p, font_size) })
        .collect::<Option<Vec<f32>>>()
        .unwrap_or_default();
    let (t, r, b, l) = match parts.as_slice() {
        [a] => (*a, *a, *a, *a),
        [v, h] => (*v, *h, *v, *h),
        [t, h, b] => (*t, *h, *b, *h),
        [t, r, b, l] => (*t, *r, *b, *l),
        _ => return,
    };
    *top = t;
    *right = r;
    *bottom = b;
    *left = l;
}

fn border_width(token: &str) -> Option<f32> {
    match token {
        "thin" => Some(0.5),
        "medium" => Some(1.5),
        "thick" => Some(3.0),
        other => parse_absolute_length(other).or_else(|| other.parse::<f32>().ok()),
    }
}

/// `border: <width> <style> <color>` in any order.
fn apply_border_shorthand(s: &mut ComputedStyle, val: &str) {
    if val == "none" || val == "0" {
        s.border_width = 0.0;
        return;
    }
    let mut width = None;
    let mut color = None;
    let mut hidden = false;
    for token in val.split_whitespace() {
        match token {
            "none" | "hidden" => hidden = true,
            "solid" | "dashed" | "dotted" | "double" | "groove" | "ridge" | "inset" | "outset" => {}
            _ => {
                if let Some(w) = border_width(token) {
                    width = Some(w);
                } else if let Some(c) = Color::parse(token) {
                    color = Some(c);
                }
            }
        }
    }
    s.border_width = if hidden { 0.0 } else { width.unwrap_or(1.0) };
    if let Some(c) = color {
        s.border_color = c;
    }
}

/// `font: [style] [weight] <size>[/<line-height>] <family>`
fn apply_font_shorthand(s: &mut ComputedStyle, val: &str, parent_font_size: f32) {
    let mut tokens = val.split_whitespace();
    while let Some(token) = tokens.next() {
        match token {
            "italic" | "oblique" => s.font_style = FontStyle::Italic,
            "bold" | "bolder" | "600" | "700" | "800" | "900" => s.font_weight = FontWeight::Bold,
            "normal" => {}
            _ => {
                let (size, line_height) = match token.split_once('/') {
                    Some((size, lh)) => (size, Some(lh)),
                    None => (token, None),
                };
                if let Some(pt) = parse_font_size(size, parent_font_size) {
                    s.font_size = pt;
                    if let Some(lh) = line_height {
                        apply_css_property(s, "line-height", lh, parent_font_size);
                    }
                    let family: Vec<&str> = tokens.by_ref().collect();
                    if let Some(f) = FontFamily::from_css(&family.join(" ")) {
                        s.font_family = f.name().to_string();
                    }
                    return;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Styled DOM tree
// ---------------------------------------------------------------------------

/// A DOM node annotated with its computed style.
#[derive(Debug, Clone)]
pub enum StyledNode {
    Element {
        tag: Tag,
        style: ComputedStyle,
        children: Vec<StyledNode>,
        /// Original attributes (for images src, etc.)
        attrs: HashMap<String, String>,
    },
    Text {
        text: String,
        style: ComputedStyle,
    },
}

/// Build a styled tree from a DOM tree, resolving styles top-down.
pub fn build_styled_tree(
    nodes: &[DomNode],
    parent_style: Option<&ComputedStyle>,
    sheet: &Stylesheet,
) -> Vec<StyledNode> {
    let mut ancestors = Vec::new();
    build_level(nodes, parent_style, sheet, &mut ancestors)
}

fn build_level<'a>(
    nodes: &'a [DomNode],
    parent_style: Option<&ComputedStyle>,
    sheet: &Stylesheet,
    ancestors: &mut Vec<&'a ElementNode>,
) -> Vec<StyledNode> {
    let mut result = Vec::new();
    for node in nodes {
        match node {
            DomNode::Element(e) => {
                let style = resolve_style(e, parent_style, sheet, ancestors);
                ancestors.push(e);
                let children = build_level(&e.children, Some(&style), sheet, ancestors);
                ancestors.pop();
                result.push(StyledNode::Element {
                    tag: e.tag.clone(),
                    style,
                    children,
                    attrs: e.attributes.clone(),
                });
            }
            DomNode::Text(text) => {
                // Whitespace-only text still separates inline siblings.
                if !text.is_empty() {
                    let style = parent_style.map(ComputedStyle::for_text).unwrap_or_default();
                    result.push(StyledNode::Text {
                        text: text.clone(),
                        style,
                    });
                }
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{find_element, parse_html};

    fn style_of(html: &str, css: &str, tag: Tag) -> ComputedStyle {
        let dom = parse_html(html);
        let sheet = Stylesheet::parse(css);
        let styled = build_styled_tree(&dom, None, &sheet);
        find_styled(&styled, &tag).unwrap()
    }

    fn find_styled(nodes: &[StyledNode], tag: &Tag) -> Option<ComputedStyle> {
        for node in nodes {
            if let StyledNode::Element {
                tag: t,
                style,
                children,
                ..
            } = node
            {
                if t == tag {
                    return Some(style.clone());
                }
                if let Some(s) = find_styled(children, tag) {
                    return Some(s);
                }
            }
        }
        None
    }

    #[test]
    fn inline_style_font_size() {
        let mut s = ComputedStyle::default();
        for (p, v) in parse_declarations("font-size: 24px; color: #ff0000") {
            apply_css_property(&mut s, &p, &v, DEFAULT_FONT_SIZE);
        }
        assert_eq!(s.font_size, 24.0);
        assert!((s.color.r - 1.0).abs() < 0.01);
    }

    #[test]
    fn colors_in_every_notation() {
        let c = Color::from_hex("#ff8800").unwrap();
        assert!((c.g - 0.533).abs() < 0.01);
        assert_eq!(Color::parse("#fff"), Some(Color::WHITE));
        assert_eq!(Color::parse("rgb(255, 0, 0)"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::parse("Navy"), Some(Color::rgb(0, 0, 128)));
        assert!(Color::parse("rgba(0,0,0,0)").unwrap().is_transparent());
        assert_eq!(Color::parse("nonsense"), None);
    }

    #[test]
    fn headings_keep_their_size_inside_styled_parents() {
        let s = style_of(
            "<div><h1>Title</h1></div>",
            "div { font-size: 10pt; color: red }",
            Tag::H1,
        );
        assert_eq!(s.font_size, 20.0);
        assert_eq!(s.font_weight, FontWeight::Bold);
        assert_eq!(s.color, Color::rgb(255, 0, 0));
    }

    #[test]
    fn cascade_order_is_tag_then_sheet_then_inline() {
        let s = style_of(
            r#"<table><tr><th class="num" style="text-align: right">1</th></tr></table>"#,
            "th { font-weight: normal; text-align: left } .num { padding: 1pt 2pt }",
            Tag::Th,
        );
        assert_eq!(s.font_weight, FontWeight::Normal);
        assert_eq!(s.text_align, TextAlign::Right);
        assert_eq!((s.padding_top, s.padding_right), (1.0, 2.0));
        assert_eq!(s.display, Display::TableCell);
    }

    #[test]
    fn units_convert_to_points() {
        assert_eq!(parse_length("1in", 12.0), Some(72.0));
        assert_eq!(parse_length("2em", 10.0), Some(20.0));
        assert!((parse_length("10mm", 12.0).unwrap() - 28.35).abs() < 0.01);
        assert_eq!(parse_font_size("150%", 10.0), Some(15.0));
    }

    #[test]
    fn border_shorthand_and_fonts() {
        let mut s = ComputedStyle::default();
        apply_css_property(&mut s, "border", "2px solid #00f", DEFAULT_FONT_SIZE);
        assert_eq!(s.border_width, 2.0);
        assert_eq!(s.border_color, Color::rgb(0, 0, 255));
        apply_css_property(&mut s, "border", "none", DEFAULT_FONT_SIZE);
        assert_eq!(s.border_width, 0.0);

        apply_css_property(&mut s, "font-family", "'Courier New', monospace", DEFAULT_FONT_SIZE);
        assert_eq!(s.font_family, "Courier");
        let font = "italic bold 14pt/1.2 Georgia, serif";
        apply_css_property(&mut s, "font", font, DEFAULT_FONT_SIZE);
        assert_eq!(s.font_size, 14.0);
        assert!(s.is_bold() && s.is_italic());
        assert_eq!(s.font_family, "Times");
    }

    #[test]
    fn hidden_elements_and_text_runs() {
        let dom = parse_html(
            "<html><head><title>T</title></head><body><p>Hi <b>there</b></p></body></html>",
        );
        let head = find_element(&dom, &Tag::Head).unwrap();
        let style = resolve_style(head, None, &Stylesheet::new(), &[]);
        assert_eq!(style.display, Display::None);

        let styled = build_styled_tree(&dom, None, &Stylesheet::parse("p { padding: 5pt }"));
        let p = find_styled(&styled, &Tag::P).unwrap();
        assert_eq!(p.padding_top, 5.0);
        assert_eq!(p.for_text().padding_top, 0.0);
    }
}
