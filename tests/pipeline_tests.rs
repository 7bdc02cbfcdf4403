//! Integration tests for the mediator pipeline.
//!
//! These tests validate:
//! - Stage order: resolve/load the stylesheets, transform, then resolve the output path
//! - Every supported way of addressing the output path
//! - Failure wording handed to the host
//! - A full run from sample payload to a PDF file on disk

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use pdf_mediator::context::{EvalResult, EvaluationContext, Expression};
use pdf_mediator::samples::{
    sample_registry, SAMPLE_CSS, SAMPLE_CSS_KEY, SAMPLE_PAYLOAD, SAMPLE_XSL, SAMPLE_XSL_KEY,
};
use pdf_mediator::{
    CollectingReporter, ConfigField, HtmlToPdf, MediatorConfig, MediatorError, MemoryRegistry,
    PdfMediator, PdfRender, RenderError, Resource, ResourceError, XmlMessage, XmlTransform,
    XslTransformer,
};

// =====================================================================
// Recording doubles
// =====================================================================

type Calls = Arc<Mutex<Vec<String>>>;

fn record(calls: &Calls, entry: String) {
    calls.lock().unwrap().push(entry);
}

fn recorded(calls: &Calls) -> Vec<String> {
    calls.lock().unwrap().clone()
}

/// Wraps a message and records what the mediator asks of it.
struct RecordingContext<'a> {
    inner: XmlMessage<'a>,
    calls: Calls,
}

impl EvaluationContext for RecordingContext<'_> {
    fn evaluate(&self, expression: &Expression) -> Result<EvalResult, String> {
        record(&self.calls, format!("evaluate {expression}"));
        self.inner.evaluate(expression)
    }

    fn property(&self, name: &str) -> Option<String> {
        self.inner.property(name)
    }

    fn payload_text(&self) -> String {
        record(&self.calls, "payload".to_string());
        self.inner.payload_text()
    }

    fn resource(&self, key: &str) -> Result<Resource, ResourceError> {
        record(&self.calls, format!("resource {key}"));
        self.inner.resource(key)
    }
}

struct RecordingTransform {
    calls: Calls,
    output: String,
}

impl XmlTransform for RecordingTransform {
    fn transform(&self, _xml: &str, xsl: &str) -> String {
        record(&self.calls, format!("transform with {} bytes of xsl", xsl.len()));
        self.output.clone()
    }
}

struct RecordingRender {
    calls: Calls,
}

impl PdfRender for RecordingRender {
    fn create(&self, html: &str, css: &str, output_path: &Path) -> Result<(), RenderError> {
        record(
            &self.calls,
            format!("create {} html={html:?} css={css:?}", output_path.display()),
        );
        Ok(())
    }
}

fn registry() -> MemoryRegistry {
    MemoryRegistry::new()
        .with_text("conf:/xslt/report.xsl", "<xsl/>")
        .with_text("conf:/styles/report.css", "h1{}")
}

fn recording_mediator(pdf: ConfigField, calls: &Calls, html: &str) -> PdfMediator {
    PdfMediator::new(
        pdf,
        ConfigField::literal("conf:/styles/report.css"),
        ConfigField::expression("$ctx:xslPath").unwrap(),
    )
    .with_transformer(RecordingTransform {
        calls: calls.clone(),
        output: html.to_string(),
    })
    .with_renderer(RecordingRender {
        calls: calls.clone(),
    })
}

fn sample_message(registry: &MemoryRegistry) -> XmlMessage<'_> {
    XmlMessage::new(SAMPLE_PAYLOAD, registry)
        .unwrap()
        .with_property("xslPath", "conf:/xslt/report.xsl")
        .with_property("pdfFileProperty", "pdfPath/file.pdf")
}

// =====================================================================
// Orchestration
// =====================================================================

#[test]
fn stages_run_in_order() {
    let calls: Calls = Arc::default();
    let registry = registry();
    let ctx = RecordingContext {
        inner: sample_message(&registry),
        calls: calls.clone(),
    };
    let mediator = recording_mediator(
        ConfigField::expression("//pdfFilePath/@pathToFile").unwrap(),
        &calls,
        "<h1>x</h1>",
    );

    assert_eq!(mediator.run(&ctx).unwrap(), PathBuf::from("pdfPath/file.pdf"));
    assert_eq!(
        recorded(&calls),
        vec![
            "evaluate $ctx:xslPath".to_string(),
            "resource conf:/xslt/report.xsl".to_string(),
            "resource conf:/styles/report.css".to_string(),
            "payload".to_string(),
            "transform with 6 bytes of xsl".to_string(),
            "evaluate //pdfFilePath/@pathToFile".to_string(),
            r#"create pdfPath/file.pdf html="<h1>x</h1>" css="h1{}""#.to_string(),
        ]
    );
}

#[test]
fn renderer_runs_even_when_the_transform_fails() {
    let calls: Calls = Arc::default();
    let registry = registry();
    let msg = sample_message(&registry);
    let mediator = PdfMediator::new(
        ConfigField::literal("out.pdf"),
        ConfigField::literal("conf:/styles/report.css"),
        ConfigField::literal("conf:/xslt/report.xsl"),
    )
    .with_transformer(XslTransformer::default())
    .with_renderer(RecordingRender {
        calls: calls.clone(),
    });

    // "<xsl/>" is not a stylesheet, so the transform soft-fails to "".
    assert!(mediator.run(&msg).is_ok());
    assert_eq!(
        recorded(&calls),
        vec![r#"create out.pdf html="" css="h1{}""#.to_string()]
    );
}

#[test]
fn output_path_is_resolved_every_supported_way() {
    let registry = registry();
    for expression in [
        "//pdfFilePath",
        "//pdfFilePath/text()",
        "//pdfFilePath/@pathToFile",
        "$ctx:pdfFileProperty",
        "get-property('pdfFileProperty')",
    ] {
        let calls: Calls = Arc::default();
        let mediator =
            recording_mediator(ConfigField::expression(expression).unwrap(), &calls, "");
        let path = mediator.run(&sample_message(&registry)).unwrap();
        assert_eq!(path, PathBuf::from("pdfPath/file.pdf"), "expression {expression}");
    }
}

#[test]
fn literal_output_path_skips_evaluation() {
    let calls: Calls = Arc::default();
    let registry = registry();
    let ctx = RecordingContext {
        inner: sample_message(&registry),
        calls: calls.clone(),
    };
    let mediator = recording_mediator(ConfigField::literal("fixed.pdf"), &calls, "");
    mediator.run(&ctx).unwrap();
    let evaluations = recorded(&calls)
        .into_iter()
        .filter(|c| c.starts_with("evaluate"))
        .count();
    assert_eq!(evaluations, 1, "only the xsl expression is evaluated");
}

// =====================================================================
// Failures
// =====================================================================

#[test]
fn ambiguous_output_path_is_refused() {
    let calls: Calls = Arc::default();
    let registry = registry();
    let msg = sample_message(&registry);
    let mediator = recording_mediator(ConfigField::expression("//row").unwrap(), &calls, "");

    let err = mediator.run(&msg).unwrap_err();
    assert!(matches!(err, MediatorError::Resolution { field: "pdfFilePath", .. }));
    assert_eq!(
        err.to_string(),
        "More than one result found with xpath //row, refusing to proceed."
    );
    assert!(recorded(&calls).iter().all(|c| !c.starts_with("create")));
}

#[test]
fn failures_reach_the_reporter_and_mediate_still_continues() {
    let calls: Calls = Arc::default();
    let registry = registry();
    let msg = XmlMessage::new(SAMPLE_PAYLOAD, &registry).unwrap();
    let reporter = CollectingReporter::new();
    let mediator = recording_mediator(ConfigField::literal("out.pdf"), &calls, "");

    assert!(mediator.mediate(&msg, &reporter));
    assert_eq!(
        reporter.failures(),
        vec![(
            "Invalid xslFilePath expression".to_string(),
            "No value found with xslFilePath's expression".to_string()
        )]
    );
    assert!(recorded(&calls).is_empty());
}

#[test]
fn missing_stylesheet_names_the_resource() {
    let calls: Calls = Arc::default();
    let registry = MemoryRegistry::new().with_text("conf:/xslt/report.xsl", "<xsl/>");
    let msg = sample_message(&registry);
    let err = recording_mediator(ConfigField::literal("out.pdf"), &calls, "")
        .run(&msg)
        .unwrap_err();
    assert_eq!(err.message(), "Failed to load resource conf:/styles/report.css");
}

#[test]
fn render_failures_use_the_generic_message() {
    let dir = tempfile::tempdir().unwrap();
    let missing_dir = dir.path().join("nope").join("out.pdf");
    let registry = sample_registry();
    let msg = XmlMessage::new(SAMPLE_PAYLOAD, &registry).unwrap();
    let mediator = PdfMediator::new(
        ConfigField::literal(&missing_dir.to_string_lossy()),
        ConfigField::literal(SAMPLE_CSS_KEY),
        ConfigField::literal(SAMPLE_XSL_KEY),
    );
    let err = mediator.run(&msg).unwrap_err();
    assert_eq!(err.message(), "Failed to create PDF.");
    assert!(matches!(err, MediatorError::Render(RenderError::Io(_))));
}

// =====================================================================
// End to end
// =====================================================================

#[test]
fn sample_message_becomes_a_pdf_file() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("pdfPath").join("file.pdf");
    std::fs::create_dir_all(target.parent().unwrap()).unwrap();

    let payload = SAMPLE_PAYLOAD.replace("pdfPath/file.pdf", &target.to_string_lossy());
    let registry = sample_registry();
    let msg = XmlMessage::new(&payload, &registry).unwrap();
    let mediator = MediatorConfig::from_json(&format!(
        r#"{{
            "pdfFilePath": {{ "expression": "//pdfFilePath/@pathToFile" }},
            "cssFilePath": {{ "value": "{SAMPLE_CSS_KEY}" }},
            "xslFilePath": {{ "value": "{SAMPLE_XSL_KEY}" }}
        }}"#
    ))
    .unwrap()
    .into_mediator()
    .unwrap();

    let reporter = CollectingReporter::new();
    assert!(mediator.mediate(&msg, &reporter));
    assert!(reporter.failures().is_empty(), "{:?}", reporter.failures());

    let bytes = std::fs::read(&target).unwrap();
    assert_eq!(&bytes[0..5], b"%PDF-");
    let doc = lopdf::Document::load_mem(&bytes).unwrap();
    assert!(!doc.get_pages().is_empty());
}

#[test]
fn sample_stylesheet_produces_the_expected_text() {
    let html = XslTransformer::default()
        .try_transform(SAMPLE_PAYLOAD, SAMPLE_XSL)
        .unwrap();
    let layout = HtmlToPdf::default().layout(&html, SAMPLE_CSS).unwrap();
    let text = layout.text_lines().join("\n");
    let needles = [
        "Example page",
        "Header 1",
        "Header 2",
        "Header 3",
        "Row 1",
        "Row 4",
        "Column 3",
    ];
    for needle in needles {
        assert!(text.contains(needle), "missing {needle} in {text}");
    }
    assert_eq!(layout.title, "Example page");
}
