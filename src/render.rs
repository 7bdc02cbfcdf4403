//! PDF renderer – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).

use std::collections::{HashMap, HashSet};

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use printpdf::*;

use crate::error::RenderError;
use crate::layout_config::*;
use crate::logging::Logger;

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// Render a LayoutConfig into PDF bytes.
///
/// Images whose `src` is not a base64 data URI, or whose bytes cannot be
/// decoded, are skipped with a warning.
pub fn render_pdf(config: &LayoutConfig, logger: &Logger) -> Result<Vec<u8>, RenderError> {
    if !(config.page_width_pt > 0.0 && config.page_height_pt > 0.0) {
        return Err(RenderError::Pdf(format!(
            "invalid page size {} x {} pt",
            config.page_width_pt, config.page_height_pt
        )));
    }
    let page_w = Mm(config.page_width_pt * 0.352778); // pt → mm
    let page_h = Mm(config.page_height_pt * 0.352778);

    let mut doc = PdfDocument::new(&config.title);

    let mut all_srcs: HashSet<&str> = HashSet::new();
    for page_layout in &config.pages {
        for lbox in &page_layout.boxes {
            collect_image_srcs(lbox, &mut all_srcs);
        }
    }

    let mut image_resources: HashMap<String, ImageResource> = HashMap::new();
    let mut img_warnings: Vec<PdfWarnMsg> = Vec::new();

    for src in &all_srcs {
        let bytes = match parse_data_uri(src) {
            Ok(b) => b,
            Err(e) => {
                logger.warn(format_args!("Skipping image: {e}"));
                continue;
            }
        };

        let dyn_img = match ::image::load_from_memory(&bytes) {
            Ok(img) => img,
            Err(e) => {
                logger.warn(format_args!("Skipping image, decode error: {e}"));
                continue;
            }
        };
        let (px_width, px_height) = (dyn_img.width(), dyn_img.height());

        let raw = match RawImage::decode_from_bytes(&bytes, &mut img_warnings) {
            Ok(r) => r,
            Err(e) => {
                logger.warn(format_args!("Skipping image, PDF encode error: {e}"));
                continue;
            }
        };
        let xobj_id = doc.add_image(&raw);

        image_resources.insert(
            src.to_string(),
            ImageResource {
                xobj_id,
                px_width,
                px_height,
            },
        );
    }

    let mut pages = Vec::new();
    for page_layout in &config.pages {
        let mut ops = Vec::new();
        for lbox in &page_layout.boxes {
            render_box(&mut ops, lbox, config.page_height_pt, &image_resources);
        }
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    doc.with_pages(pages);
    let mut save_warnings = Vec::new();
    // Text is shown through raw `Tj` operators, which the secure mode drops.
    let options = PdfSaveOptions {
        secure: false,
        ..PdfSaveOptions::default()
    };
    let bytes = doc.save(&options, &mut save_warnings);
    if !save_warnings.is_empty() {
        logger.debug(format_args!("PDF writer reported {} warnings", save_warnings.len()));
    }

    Ok(bytes)
}

/// The builtin face for a family name and weight/slant.
fn builtin_font(family: &str, bold: bool, italic: bool) -> BuiltinFont {
    match (family, bold, italic) {
        ("Times", true, true) => BuiltinFont::TimesBoldItalic,
        ("Times", true, false) => BuiltinFont::TimesBold,
        ("Times", false, true) => BuiltinFont::TimesItalic,
        ("Times", false, false) => BuiltinFont::TimesRoman,
        ("Courier", true, true) => BuiltinFont::CourierBoldOblique,
        ("Courier", true, false) => BuiltinFont::CourierBold,
        ("Courier", false, true) => BuiltinFont::CourierOblique,
        ("Courier", false, false) => BuiltinFont::Courier,
        (_, true, true) => BuiltinFont::HelveticaBoldOblique,
        (_, true, false) => BuiltinFont::HelveticaBold,
        (_, false, true) => BuiltinFont::HelveticaOblique,
        (_, false, false) => BuiltinFont::Helvetica,
    }
}

/// Encode a string as Windows-1252 bytes for the builtin fonts'
/// WinAnsiEncoding. Characters outside the code page become `?`.
fn to_winlatin(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{201A}' => 0x82, // single low-9 quote
            '\u{201E}' => 0x84, // double low-9 quote
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201C}' => 0x93, // left double quote
            '\u{201D}' => 0x94, // right double quote
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en dash
            '\u{2014}' => 0x97, // em dash
            '\u{2122}' => 0x99, // trademark
            '\u{00A0}' => 0x20, // non-breaking space
            c if c.is_ascii() || ('\u{00A0}'..='\u{00FF}').contains(&c) => c as u8,
            _ => b'?',
        })
        .collect()
}

/// The `Tj` operator showing `text` as a hex string of WinAnsi bytes.
fn show_winlatin(text: &str) -> Op {
    Op::Unknown {
        key: "Tj".to_string(),
        value: vec![DictItem::String {
            data: to_winlatin(text),
            literal: false,
        }],
    }
}

/// Parse a `data:<mime>;base64,<data>` URI and return the raw decoded bytes.
fn parse_data_uri(src: &str) -> Result<Vec<u8>, String> {
    let Some(rest) = src.strip_prefix("data:") else {
        let preview: String = src.chars().take(80).collect();
        return Err(format!(
            "image src must be a base64 data URI (e.g. `data:image/png;base64,...`), got {preview:?}"
        ));
    };
    let comma_pos = rest
        .find(',')
        .ok_or_else(|| "invalid data URI: missing `,` between header and data".to_string())?;
    let header = &rest[..comma_pos];
    if !header.contains(";base64") {
        return Err("only base64-encoded data URIs are supported".to_string());
    }
    BASE64_STD
        .decode(rest[comma_pos + 1..].trim())
        .map_err(|e| format!("base64 decode error: {e}"))
}

fn collect_image_srcs<'a>(lbox: &'a LayoutBox, srcs: &mut HashSet<&'a str>) {
    if let Some(img) = &lbox.image {
        srcs.insert(img.src.as_str());
    }
    for child in &lbox.children {
        collect_image_srcs(child, srcs);
    }
}

fn rgb(c: &[f32; 4]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

fn write_text(
    ops: &mut Vec<Op>,
    text: &str,
    x: f32,
    y: f32,
    size: f32,
    font: BuiltinFont,
    color: &[f32; 4],
) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point { x: Pt(x), y: Pt(y) },
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(size),
        font,
    });
    ops.push(Op::SetFillColor { col: rgb(color) });
    // Empty run: registers the face in the page resources without
    // printpdf re-encoding the text as UTF-8.
    ops.push(Op::WriteTextBuiltinFont {
        items: Vec::new(),
        font,
    });
    ops.push(show_winlatin(text));
    ops.push(Op::EndTextSection);
}

/// Recursively render a LayoutBox and its children into PDF ops.
fn render_box(
    ops: &mut Vec<Op>,
    lbox: &LayoutBox,
    page_height: f32,
    images: &HashMap<String, ImageResource>,
) {
    // PDF origin is bottom-left, layout origin top-left.
    let top = page_height - lbox.y;
    let bottom = top - lbox.height;
    let (left, right) = (lbox.x, lbox.x + lbox.width);

    if let Some(bg) = &lbox.background_color {
        ops.push(Op::SetFillColor { col: rgb(bg) });
        ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing {
                    points: vec![
                        point(left, bottom),
                        point(right, bottom),
                        point(right, top),
                        point(left, top),
                    ],
                }],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        });
    }

    if let Some(border) = &lbox.border {
        ops.push(Op::SetOutlineColor {
            col: rgb(&border.color),
        });
        ops.push(Op::SetOutlineThickness {
            pt: Pt(border.width),
        });
        // Stroke along the middle of the border band.
        let inset = border.width / 2.0;
        ops.push(Op::DrawLine {
            line: Line {
                points: vec![
                    point(left + inset, top - inset),
                    point(right - inset, top - inset),
                    point(right - inset, bottom + inset),
                    point(left + inset, bottom + inset),
                ],
                is_closed: true,
            },
        });
    }

    if let Some(text) = &lbox.text {
        let font = builtin_font(&text.font_family, text.bold, text.italic);
        // Baseline sits one ascender below the top of the line box, with
        // the extra leading split above and below the glyphs.
        let leading = (text.line_height - text.font_size).max(0.0) / 2.0;
        let ascent = text.font_size * 0.75 + leading;

        for tline in &text.lines {
            if tline.text.is_empty() {
                continue;
            }
            let text_x = lbox.x + tline.x_offset;
            let text_y = top - tline.y_offset - ascent;
            write_text(ops, &tline.text, text_x, text_y, text.font_size, font, &text.color);

            if text.underline {
                let underline_y = text_y - text.font_size * 0.1;
                ops.push(Op::SetOutlineThickness { pt: Pt(0.5) });
                ops.push(Op::SetOutlineColor {
                    col: rgb(&text.color),
                });
                ops.push(Op::DrawLine {
                    line: Line {
                        points: vec![
                            point(text_x, underline_y),
                            point(text_x + tline.width, underline_y),
                        ],
                        is_closed: false,
                    },
                });
            }
        }

        if let Some(marker) = &text.list_marker {
            let marker_font = builtin_font(&text.font_family, false, false);
            write_text(
                ops,
                marker,
                lbox.x - 16.0,
                top - ascent,
                text.font_size,
                marker_font,
                &text.color,
            );
        }
    }

    if let Some(img) = &lbox.image {
        if let Some(res) = images.get(&img.src) {
            // At dpi=72 printpdf renders 1 px = 1 pt, so
            // scale = desired_pt / px_dim.
            let scale_x = if res.px_width > 0 {
                img.width / res.px_width as f32
            } else {
                1.0
            };
            let scale_y = if res.px_height > 0 {
                img.height / res.px_height as f32
            } else {
                1.0
            };

            ops.push(Op::UseXobject {
                id: res.xobj_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(lbox.x)),
                    translate_y: Some(Pt(top - img.height)),
                    dpi: Some(72.0),
                    scale_x: Some(scale_x),
                    scale_y: Some(scale_y),
                    rotate: None,
                },
            });
        }
    }

    for child in &lbox.children {
        render_box(ops, child, page_height, images);
    }
}
