//! ocrmate-verify - Command-line entry point
//!
//! Runs one verification over file-backed OCR and LLM extractions and prints
//! the `DocumentVerification` as JSON on stdout. Logs go to stderr.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use ocrmate_common::config::ConfigResolver;
use ocrmate_verify::logging;
use ocrmate_verify::ocr::JsonOcrEngine;
use ocrmate_verify::{
    DocumentRef, ExtractionSchema, Extractor, JsonFileExtractor, OcrKeywordExtractor, Source,
    VerificationOrchestrator, VerifierSettings,
};

/// Command-line arguments for ocrmate-verify
#[derive(Parser, Debug)]
#[command(name = "ocrmate-verify")]
#[command(about = "Cross-check OCR and LLM extractions of a document")]
#[command(version)]
struct Args {
    /// Extraction schema (JSON, or TOML with a .toml extension)
    #[arg(long)]
    schema: PathBuf,

    /// OCR extraction JSON
    #[arg(long)]
    ocr: PathBuf,

    /// LLM extraction JSON
    #[arg(long)]
    llm: PathBuf,

    /// Treat --ocr as an OCR layout result and locate fields by label
    #[arg(long)]
    ocr_layout: bool,

    /// Document reference reported in the output (defaults to the OCR path)
    #[arg(long)]
    document: Option<String>,

    /// Conflict policy (higher_confidence, prefer_ocr, prefer_llm, weighted_average, human_review)
    #[arg(long)]
    policy: Option<String>,

    /// Overall confidence below which a document needs human review
    #[arg(long)]
    human_review_threshold: Option<f64>,

    /// Overall confidence at or above which a document is auto-approved
    #[arg(long)]
    auto_approve_threshold: Option<f64>,

    /// Per-extractor timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Config file (overrides OCRMATE_CONFIG and the default location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing before config resolution logs anything
    let (subscriber, log_level) = logging::build_subscriber(std::io::stderr);
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    let args = Args::parse();

    info!("Starting ocrmate-verify {}", env!("CARGO_PKG_VERSION"));

    let mut config = ConfigResolver::new(args.config.clone())
        .load()
        .context("Failed to load configuration")?;
    log_level.apply_configured_level(&config.logging.level)?;

    let verification = &mut config.verification;
    if args.policy.is_some() {
        verification.conflict_policy = args.policy.clone();
    }
    if args.human_review_threshold.is_some() {
        verification.human_review_threshold = args.human_review_threshold;
    }
    if args.auto_approve_threshold.is_some() {
        verification.auto_approve_threshold = args.auto_approve_threshold;
    }
    if args.timeout_ms.is_some() {
        verification.extractor_timeout_ms = args.timeout_ms;
    }
    let settings = VerifierSettings::from_config(verification)
        .context("Invalid verification settings")?;

    let schema = load_schema(&args.schema)?;

    let ocr: Arc<dyn Extractor> = if args.ocr_layout {
        Arc::new(OcrKeywordExtractor::new(Arc::new(JsonOcrEngine::new(&args.ocr))))
    } else {
        Arc::new(JsonFileExtractor::new(Source::Ocr, &args.ocr))
    };
    let llm: Arc<dyn Extractor> = Arc::new(JsonFileExtractor::new(Source::Llm, &args.llm));

    let document = DocumentRef::new(
        args.document
            .clone()
            .unwrap_or_else(|| args.ocr.display().to_string()),
    );

    let orchestrator = VerificationOrchestrator::new(ocr, llm, settings);
    let result = orchestrator
        .verify(&document, &schema)
        .await
        .with_context(|| format!("Verification of {} failed", document))?;

    info!(
        "{}: disposition={}, confidence={:.3}, match_rate={:.1}%",
        document,
        result.disposition,
        result.overall_confidence,
        result.match_rate * 100.0
    );

    let json = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{}", json);

    Ok(())
}

fn load_schema(path: &Path) -> Result<ExtractionSchema> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema {}", path.display()))?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let schema: ExtractionSchema = if is_toml {
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML schema {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON schema {}", path.display()))?
    };

    schema
        .validate()
        .with_context(|| format!("Invalid schema {}", path.display()))?;
    Ok(schema)
}
