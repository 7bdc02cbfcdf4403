//! Text measurement for the builtin PDF fonts.
//!
//! Documents are set in the standard Type 1 families every PDF viewer ships
//! (Helvetica, Times, Courier), so nothing is embedded. Widths come from
//! average advance heuristics per family, which is enough to give Taffy
//! stable intrinsic sizes and to wrap lines before they hit the page edge.

use std::collections::HashMap;

use crate::style::FontFamily;

/// Metrics for one family/weight/slant combination, in 1/1000 em.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    /// Average horizontal advance of a glyph.
    pub average_advance: f32,
    pub ascender: f32,
    pub descender: f32,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: &str, bold: bool, italic: bool) -> Self {
        Self {
            family: FontFamily::from_name(family).name().to_string(),
            bold,
            italic,
        }
    }
}

/// Registry of font metrics used by layout.
#[derive(Debug, Clone)]
pub struct FontManager {
    fonts: HashMap<FontKey, FontMetrics>,
    fallback: FontMetrics,
}

impl FontManager {
    /// An empty manager; every lookup uses the Helvetica fallback.
    pub fn new() -> Self {
        Self {
            fonts: HashMap::new(),
            fallback: FontMetrics {
                average_advance: 500.0,
                ascender: 718.0,
                descender: -207.0,
            },
        }
    }

    /// Register the builtin families with their heuristic metrics.
    pub fn ensure_default(&mut self) {
        if !self.fonts.is_empty() {
            return;
        }
        let families = [
            (FontFamily::Helvetica, 500.0, 550.0, 718.0, -207.0),
            (FontFamily::Times, 450.0, 500.0, 683.0, -217.0),
            (FontFamily::Courier, 600.0, 600.0, 629.0, -157.0),
        ];
        for (family, regular, bold, ascender, descender) in families {
            for (is_bold, advance) in [(false, regular), (true, bold)] {
                for italic in [false, true] {
                    self.fonts.insert(
                        FontKey::new(family.name(), is_bold, italic),
                        FontMetrics {
                            average_advance: advance,
                            ascender,
                            descender,
                        },
                    );
                }
            }
        }
    }

    pub fn get(&self, key: &FontKey) -> &FontMetrics {
        self.fonts.get(key).unwrap_or(&self.fallback)
    }

    /// Width of `text` in points at `font_size`.
    pub fn measure_text_width(
        &self,
        text: &str,
        font_size: f32,
        bold: bool,
        italic: bool,
        family: &str,
    ) -> f32 {
        let metrics = self.get(&FontKey::new(family, bold, italic));
        text.chars().count() as f32 * font_size * metrics.average_advance / 1000.0
    }

    pub fn line_height_px(&self, font_size: f32, line_height_factor: f32) -> f32 {
        font_size * line_height_factor
    }

    pub fn ascender_px(&self, font_size: f32, bold: bool, italic: bool, family: &str) -> f32 {
        self.get(&FontKey::new(family, bold, italic)).ascender * font_size / 1000.0
    }
}

impl Default for FontManager {
    fn default() -> Self {
        let mut mgr = Self::new();
        mgr.ensure_default();
        mgr
    }
}

/// Word-wrap text to fit within `max_width` points. Explicit newlines always
/// start a new line.
pub fn wrap_text(
    text: &str,
    font_size: f32,
    bold: bool,
    italic: bool,
    family: &str,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }

    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }
        if max_width <= 0.0 {
            lines.push(words.join(" "));
            continue;
        }

        let mut current_line = String::new();
        for word in &words {
            let candidate = if current_line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current_line, word)
            };
            let w = fonts.measure_text_width(&candidate, font_size, bold, italic, family);
            if w > max_width && !current_line.is_empty() {
                lines.push(current_line);
                current_line = word.to_string();
            } else {
                current_line = candidate;
            }
        }
        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_text_width() {
        let mgr = FontManager::default();
        let w = mgr.measure_text_width("Hello", 16.0, false, false, "Helvetica");
        // 5 chars × 16 × 0.5 = 40
        assert!((w - 40.0).abs() < 0.1);
        let mono = mgr.measure_text_width("Hello", 10.0, true, false, "Courier");
        assert!((mono - 30.0).abs() < 0.1);
    }

    #[test]
    fn unknown_families_measure_as_helvetica() {
        let mgr = FontManager::default();
        assert_eq!(
            mgr.measure_text_width("abc", 12.0, false, false, "Comic Sans"),
            mgr.measure_text_width("abc", 12.0, false, false, "Helvetica"),
        );
    }

    #[test]
    fn word_wrap_basic() {
        let mgr = FontManager::default();
        let lines = wrap_text("Hello world foo bar", 16.0, false, false, "Helvetica", 60.0, &mgr);
        assert!(lines.len() >= 2, "Expected wrapping, got {:?}", lines);
    }

    #[test]
    fn line_breaks_are_kept() {
        let mgr = FontManager::default();
        let lines = wrap_text("one\ntwo  words", 12.0, false, false, "Times", 500.0, &mgr);
        assert_eq!(lines, vec!["one", "two words"]);
    }
}
