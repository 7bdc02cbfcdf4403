//! HTML to PDF conversion – ties together cleaning, stylesheet inlining,
//! styling, layout, pagination and rendering.
//!
//! The stages are:
//!
//! 1. **Clean** – tag soup → well-formed markup ([`crate::clean`])
//! 2. **Inline** – stylesheet links → `<style>` blocks ([`crate::inline_css`])
//! 3. **Parse** – markup → layout DOM ([`crate::dom`])
//! 4. **Style** – `<style>` rules and inline styles ([`crate::style`])
//! 5. **Layout** – flexbox layout with Taffy ([`crate::layout`])
//! 6. **Paginate** – split into pages ([`crate::pagination`])
//! 7. **Render** – emit PDF bytes via printpdf ([`crate::render`])

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clean::HtmlCleaner;
use crate::dom::{document_title, parse_html, style_blocks};
use crate::error::RenderError;
use crate::fonts::FontManager;
use crate::inline_css::inject_css;
use crate::layout::compute_layout;
use crate::layout_config::LayoutConfig;
use crate::logging::Logger;
use crate::pagination::{paginate, PageGeometry};
use crate::render::render_pdf;
use crate::style::build_styled_tree;
use crate::stylesheet::Stylesheet;

/// Default page margin in points.
pub const PAGE_MARGIN_PT: f32 = 40.0;

/// Page orientation for the generated PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrientation {
    /// Portrait mode: height > width (default).
    #[default]
    Portrait,
    /// Landscape mode: width and height swapped.
    Landscape,
}

/// Page setup used when the document carries no `@page` rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    /// Title embedded in the PDF metadata when the document has no `<title>`.
    pub title: String,
    /// Page width in points (default: A4 = 595.28).
    pub page_width: f32,
    /// Page height in points (default: A4 = 841.89).
    pub page_height: f32,
    /// Page margin in points (default: 40).
    pub page_margin: f32,
    /// Swaps effective width/height when `Landscape`.
    pub orientation: PageOrientation,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: LayoutConfig::default_title(),
            page_width: 595.28,
            page_height: 841.89,
            page_margin: PAGE_MARGIN_PT,
            orientation: PageOrientation::Portrait,
        }
    }
}

impl RenderConfig {
    /// Effective page width after applying orientation.
    pub fn effective_width(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_width,
            PageOrientation::Landscape => self.page_height,
        }
    }

    /// Effective page height after applying orientation.
    pub fn effective_height(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_height,
            PageOrientation::Landscape => self.page_width,
        }
    }

    pub fn a4_landscape() -> Self {
        Self {
            orientation: PageOrientation::Landscape,
            ..Self::default()
        }
    }

    /// Page geometry for a document, letting its `@page` rule win.
    fn geometry(&self, sheet: &Stylesheet) -> PageGeometry {
        let page = sheet.page();
        let (width, height) = page
            .size
            .unwrap_or((self.effective_width(), self.effective_height()));
        PageGeometry {
            width,
            height,
            margin: page.margin.unwrap_or(self.page_margin),
        }
    }
}

/// Renders HTML with a stylesheet to PDF files.
#[derive(Debug, Clone)]
pub struct HtmlToPdf {
    cleaner: HtmlCleaner,
    config: RenderConfig,
    fonts: FontManager,
    logger: Logger,
}

impl HtmlToPdf {
    pub fn new(config: RenderConfig) -> Self {
        Self::with_logger(config, Logger::global("pdf_mediator::html_to_pdf"))
    }

    /// A renderer whose records, and those of its cleaner, go to `logger`'s sink.
    pub fn with_logger(config: RenderConfig, logger: Logger) -> Self {
        Self {
            cleaner: HtmlCleaner::new(logger.with_target("pdf_mediator::clean")),
            config,
            fonts: FontManager::default(),
            logger,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Clean `html`, inline `css`, render and write the PDF to
    /// `output_path`, replacing any existing file. Parent directories must
    /// exist.
    pub fn create(&self, html: &str, css: &str, output_path: &Path) -> Result<(), RenderError> {
        let (bytes, layout) = self.render(html, css)?;
        fs::write(output_path, &bytes)?;
        self.logger.info(format_args!(
            "Wrote {} ({} bytes, {} page{})",
            output_path.display(),
            bytes.len(),
            layout.pages.len(),
            if layout.pages.len() == 1 { "" } else { "s" }
        ));
        Ok(())
    }

    /// Produce the PDF bytes together with the layout they were drawn from.
    pub fn render(&self, html: &str, css: &str) -> Result<(Vec<u8>, LayoutConfig), RenderError> {
        let layout = self.layout(html, css)?;
        let bytes = render_pdf(&layout, &self.logger)?;
        Ok((bytes, layout))
    }

    /// Clean and inline, then lay out without rendering.
    pub fn layout(&self, html: &str, css: &str) -> Result<LayoutConfig, RenderError> {
        let cleaned = self.cleaner.clean(html)?;
        let markup = inject_css(css, &cleaned);
        let layout = layout_markup(&markup, &self.config, &self.fonts)?;
        self.logger.debug(format_args!(
            "Laid out {} page(s) of {} x {} pt",
            layout.pages.len(),
            layout.page_width_pt,
            layout.page_height_pt
        ));
        Ok(layout)
    }
}

impl Default for HtmlToPdf {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

/// The paginated layout of `html` styled with `css`, without writing a PDF.
pub fn compute_layout_config(
    html: &str,
    css: &str,
    config: &RenderConfig,
) -> Result<LayoutConfig, RenderError> {
    HtmlToPdf::new(config.clone()).layout(html, css)
}

/// Lay out markup whose stylesheets are already inline.
fn layout_markup(
    markup: &str,
    config: &RenderConfig,
    fonts: &FontManager,
) -> Result<LayoutConfig, RenderError> {
    let dom = parse_html(markup);
    let sheet = Stylesheet::from_blocks(&style_blocks(&dom));
    let geometry = config.geometry(&sheet);
    if geometry.width <= 2.0 * geometry.margin || geometry.height <= 2.0 * geometry.margin {
        return Err(RenderError::Layout(format!(
            "margin of {} pt leaves no room on a {} x {} pt page",
            geometry.margin, geometry.width, geometry.height
        )));
    }

    let styled = build_styled_tree(&dom, None, &sheet);
    let boxes = compute_layout(&styled, geometry.width, geometry.margin, fonts)?;
    let title = document_title(&dom).unwrap_or_else(|| config.title.clone());
    Ok(paginate(&boxes, &title, geometry, fonts))
}
