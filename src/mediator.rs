//! The PDF mediator: resolve the three configured paths, load the
//! stylesheets, transform the payload and render the result.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::context::EvaluationContext;
use crate::error::{MediatorError, RenderError};
use crate::field::{ConfigField, CSS_FILE_PATH, PDF_FILE_PATH, XSL_FILE_PATH};
use crate::html_to_pdf::HtmlToPdf;
use crate::logging::Logger;
use crate::resources::ResourceLoader;
use crate::xslt::XslTransformer;

/// Turns an XML payload into HTML with an XSLT stylesheet.
pub trait XmlTransform: Send + Sync {
    /// The transformed document, or `""` when the transform failed.
    fn transform(&self, xml: &str, xsl: &str) -> String;
}

impl XmlTransform for XslTransformer {
    fn transform(&self, xml: &str, xsl: &str) -> String {
        XslTransformer::transform(self, xml, xsl)
    }
}

/// Writes HTML styled with CSS to a PDF file.
pub trait PdfRender: Send + Sync {
    fn create(&self, html: &str, css: &str, output_path: &Path) -> Result<(), RenderError>;
}

impl PdfRender for HtmlToPdf {
    fn create(&self, html: &str, css: &str, output_path: &Path) -> Result<(), RenderError> {
        HtmlToPdf::create(self, html, css, output_path)
    }
}

/// The host's channel for fatal per-message failures.
pub trait FailureReporter {
    fn report_failure(&self, message: &str, cause: &MediatorError);
}

/// Reports failures as error records.
#[derive(Debug, Clone, Copy)]
pub struct LogReporter {
    logger: Logger,
}

impl LogReporter {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl Default for LogReporter {
    fn default() -> Self {
        Self::new(Logger::global("pdf_mediator::mediator"))
    }
}

impl FailureReporter for LogReporter {
    fn report_failure(&self, message: &str, cause: &MediatorError) {
        self.logger.error(format_args!("{message} {cause}"));
    }
}

/// Keeps `(message, cause)` pairs in memory.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    failures: Mutex<Vec<(String, String)>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> Vec<(String, String)> {
        match self.failures.lock() {
            Ok(failures) => failures.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl FailureReporter for CollectingReporter {
    fn report_failure(&self, message: &str, cause: &MediatorError) {
        let entry = (message.to_string(), cause.to_string());
        match self.failures.lock() {
            Ok(mut failures) => failures.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}

/// Renders XML messages to PDF files.
///
/// The mediator holds no per-message state, so one instance can serve
/// messages from several threads.
pub struct PdfMediator {
    pdf_file_path: ConfigField,
    css_file_path: ConfigField,
    xsl_file_path: ConfigField,
    transformer: Box<dyn XmlTransform>,
    renderer: Box<dyn PdfRender>,
    loader: ResourceLoader,
    logger: Logger,
}

impl PdfMediator {
    /// A mediator using the bundled XSLT transformer and A4 renderer.
    pub fn new(
        pdf_file_path: ConfigField,
        css_file_path: ConfigField,
        xsl_file_path: ConfigField,
    ) -> Self {
        Self {
            pdf_file_path,
            css_file_path,
            xsl_file_path,
            transformer: Box::new(XslTransformer::default()),
            renderer: Box::new(HtmlToPdf::default()),
            loader: ResourceLoader::default(),
            logger: Logger::global("pdf_mediator::mediator"),
        }
    }

    pub fn with_transformer<T: XmlTransform + 'static>(mut self, transformer: T) -> Self {
        self.transformer = Box::new(transformer);
        self
    }

    pub fn with_renderer<R: PdfRender + 'static>(mut self, renderer: R) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Send the mediator's own records, and the loader's, to `logger`'s sink.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.loader = ResourceLoader::new(logger.with_target("pdf_mediator::resources"));
        self.logger = logger;
        self
    }

    pub fn pdf_file_path(&self) -> &ConfigField {
        &self.pdf_file_path
    }

    pub fn css_file_path(&self) -> &ConfigField {
        &self.css_file_path
    }

    pub fn xsl_file_path(&self) -> &ConfigField {
        &self.xsl_file_path
    }

    /// Process one message. Failures go to `reporter`; the message always
    /// continues down the host's pipeline, so this returns `true`.
    pub fn mediate(&self, ctx: &dyn EvaluationContext, reporter: &dyn FailureReporter) -> bool {
        self.logger.info(format_args!("called PDF mediate."));
        if let Err(e) = self.run(ctx) {
            reporter.report_failure(&e.message(), &e);
        }
        true
    }

    /// Process one message and return the path of the written PDF.
    ///
    /// The output path is resolved only after the transform, and the
    /// renderer runs even when the transform produced nothing.
    pub fn run(&self, ctx: &dyn EvaluationContext) -> Result<PathBuf, MediatorError> {
        let xsl_path = self.resolve(&self.xsl_file_path, XSL_FILE_PATH, ctx)?;
        let xsl = self.load(&xsl_path, ctx)?;

        let css_path = self.resolve(&self.css_file_path, CSS_FILE_PATH, ctx)?;
        let css = self.load(&css_path, ctx)?;

        let payload = ctx.payload_text();
        let html = self.transformer.transform(&payload, &xsl);

        let pdf_path = PathBuf::from(self.resolve(&self.pdf_file_path, PDF_FILE_PATH, ctx)?);
        self.renderer.create(&html, &css, &pdf_path)?;
        Ok(pdf_path)
    }

    fn resolve(
        &self,
        field: &ConfigField,
        name: &'static str,
        ctx: &dyn EvaluationContext,
    ) -> Result<String, MediatorError> {
        let value = field
            .resolve(ctx, name, &self.logger)
            .map_err(|source| MediatorError::Resolution { field: name, source })?;
        self.logger.debug(format_args!("Resolved {name} to {value}"));
        Ok(value)
    }

    fn load(&self, path: &str, ctx: &dyn EvaluationContext) -> Result<String, MediatorError> {
        self.loader
            .load(path, ctx)
            .map_err(|source| MediatorError::Resource {
                path: path.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::XmlMessage;
    use crate::logging::CapturingLog;
    use crate::resources::MemoryRegistry;
    use log::Level;

    struct Echo;

    impl XmlTransform for Echo {
        fn transform(&self, xml: &str, _xsl: &str) -> String {
            xml.to_string()
        }
    }

    struct Failing;

    impl PdfRender for Failing {
        fn create(&self, _html: &str, _css: &str, _output_path: &Path) -> Result<(), RenderError> {
            Err(RenderError::Pdf("boom".to_string()))
        }
    }

    struct Discard;

    impl PdfRender for Discard {
        fn create(&self, _html: &str, _css: &str, _output_path: &Path) -> Result<(), RenderError> {
            Ok(())
        }
    }

    fn registry() -> MemoryRegistry {
        MemoryRegistry::new()
            .with_text("report.xsl", "<xsl/>")
            .with_text("report.css", "p{}")
    }

    fn mediator(pdf: ConfigField) -> PdfMediator {
        PdfMediator::new(
            pdf,
            ConfigField::literal("report.css"),
            ConfigField::literal("report.xsl"),
        )
        .with_transformer(Echo)
        .with_renderer(Discard)
    }

    #[test]
    fn run_returns_the_resolved_output_path() {
        let registry = registry();
        let msg = XmlMessage::new("<doc><out>out/a.pdf</out></doc>", &registry).unwrap();
        let m = mediator(ConfigField::expression("//out").unwrap());
        assert_eq!(m.run(&msg).unwrap(), PathBuf::from("out/a.pdf"));
    }

    #[test]
    fn resolution_failures_are_reported_with_the_field_name() {
        let registry = registry();
        let msg = XmlMessage::new("<doc/>", &registry).unwrap();
        let reporter = CollectingReporter::new();
        let m = mediator(ConfigField::expression("//missing").unwrap());

        assert!(m.mediate(&msg, &reporter));
        assert_eq!(
            reporter.failures(),
            vec![(
                "Invalid pdfFilePath expression".to_string(),
                "No value found with pdfFilePath's expression".to_string()
            )]
        );
    }

    #[test]
    fn missing_resources_are_reported_with_their_path() {
        let registry = MemoryRegistry::new().with_text("report.xsl", "<xsl/>");
        let msg = XmlMessage::new("<doc/>", &registry).unwrap();
        let reporter = CollectingReporter::new();
        assert!(mediator(ConfigField::literal("a.pdf")).mediate(&msg, &reporter));
        let failures = reporter.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "Failed to load resource report.css");
    }

    #[test]
    fn render_failures_are_reported_and_logged() {
        let registry = registry();
        let msg = XmlMessage::new("<doc/>", &registry).unwrap();
        let sink = CapturingLog::leaked();
        let logger = Logger::new(sink, "pdf_mediator::mediator");
        let m = mediator(ConfigField::literal("a.pdf"))
            .with_renderer(Failing)
            .with_logger(logger);

        assert!(m.mediate(&msg, &LogReporter::new(logger)));
        assert!(sink.contains(Level::Info, "called PDF mediate."));
        assert!(sink.contains(Level::Error, "Failed to create PDF."));
    }

    #[test]
    fn literal_fields_are_kept() {
        let m = mediator(ConfigField::literal("a.pdf"));
        assert_eq!(m.pdf_file_path().as_literal(), Some("a.pdf"));
        assert_eq!(m.xsl_file_path().as_literal(), Some("report.xsl"));
        assert_eq!(m.css_file_path().as_literal(), Some("report.css"));
    }

    #[test]
    fn mediator_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PdfMediator>();
    }
}
