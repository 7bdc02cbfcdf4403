//! pdf-mediator – run XML messages through the XSLT → HTML → PDF mediator.
//!
//! Usage:
//!   pdf-mediator --config mediator.json --payload message.xml --registry conf/ \
//!                [--property key=value]...
//!   pdf-mediator --demo out.pdf
//!
//! Registry keys such as `conf:/xslt/report.xsl` are looked up under the
//! `--registry` directory. `RUST_LOG` controls log verbosity.

use std::{fs, path::PathBuf, process};

use clap::Parser;

use pdf_mediator::field::ConfigField;
use pdf_mediator::samples::{sample_registry, SAMPLE_CSS_KEY, SAMPLE_PAYLOAD, SAMPLE_XSL_KEY};
use pdf_mediator::{FileRegistry, MediatorConfig, PdfMediator, XmlMessage};

#[derive(Parser, Debug)]
#[command(name = "pdf-mediator")]
#[command(version)]
#[command(about = "Render XML messages to PDF through XSLT and CSS", long_about = None)]
struct Cli {
    /// Mediator configuration (JSON)
    #[arg(long, value_name = "FILE", required_unless_present = "demo")]
    config: Option<PathBuf>,

    /// XML message payload
    #[arg(long, value_name = "FILE", required_unless_present = "demo")]
    payload: Option<PathBuf>,

    /// Directory backing the resource registry
    #[arg(long, value_name = "DIR", default_value = ".")]
    registry: PathBuf,

    /// Message property, repeatable
    #[arg(long = "property", value_name = "KEY=VALUE", value_parser = parse_property)]
    properties: Vec<(String, String)>,

    /// Render the bundled sample report to this file and exit
    #[arg(long, value_name = "OUTPUT", conflicts_with_all = ["config", "payload"])]
    demo: Option<PathBuf>,
}

fn parse_property(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match &cli.demo {
        Some(output) => run_demo(output),
        None => run_message(&cli),
    };

    match result {
        Ok(path) => eprintln!("Wrote '{}'", path.display()),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run_message(cli: &Cli) -> Result<PathBuf, String> {
    let (Some(config_path), Some(payload_path)) = (&cli.config, &cli.payload) else {
        return Err("--config and --payload are required".to_string());
    };

    let config_json = fs::read_to_string(config_path)
        .map_err(|e| format!("reading '{}': {e}", config_path.display()))?;
    let mediator = MediatorConfig::from_json(&config_json)
        .and_then(MediatorConfig::into_mediator)
        .map_err(|e| format!("invalid configuration '{}': {e}", config_path.display()))?;

    let payload = fs::read_to_string(payload_path)
        .map_err(|e| format!("reading '{}': {e}", payload_path.display()))?;
    let registry = FileRegistry::new(&cli.registry);
    let mut message = XmlMessage::new(&payload, &registry)
        .map_err(|e| format!("invalid payload '{}': {e}", payload_path.display()))?;
    for (key, value) in &cli.properties {
        message.set_property(key, value);
    }

    mediator
        .run(&message)
        .map_err(|e| format!("{} {e}", e.message()))
}

fn run_demo(output: &std::path::Path) -> Result<PathBuf, String> {
    let mediator = PdfMediator::new(
        ConfigField::literal(&output.to_string_lossy()),
        ConfigField::literal(SAMPLE_CSS_KEY),
        ConfigField::literal(SAMPLE_XSL_KEY),
    );
    let registry = sample_registry();
    let message = XmlMessage::new(SAMPLE_PAYLOAD, &registry).map_err(|e| e.to_string())?;
    mediator
        .run(&message)
        .map_err(|e| format!("{} {e}", e.message()))
}
