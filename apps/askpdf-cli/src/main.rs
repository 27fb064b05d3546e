//! Host binary over the answer pipeline: ingest extracted page text,
//! ask questions, reset the collection. PDF text extraction happens
//! upstream; each ingested file holds the extracted text of one page.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use askpdf_core::config::RagConfig;
use askpdf_core::error::AppError;
use askpdf_rag::embed::ollama_embed::OllamaEmbedder;
use askpdf_rag::llm::ollama_llm::OllamaLlm;
use askpdf_rag::ollama::OllamaClient;
use askpdf_rag::pipeline::RagPipeline;

#[derive(Parser, Debug)]
#[command(name = "askpdf", version, about = "Question answering over ingested PDF text")]
struct Cli {
    /// Configuration file (TOML); ASKPDF_* env vars override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest extracted page text files into the collection
    Ingest {
        /// One file per page, in page order
        pages: Vec<PathBuf>,
    },
    /// Answer a question against the ingested collection
    Ask { question: String },
    /// Delete and recreate the collection
    Reset,
    /// Probe the model server
    Health,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            if let Some(details) = &e.details {
                tracing::debug!(%details, "request failed");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = RagConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Health => {
            let client = OllamaClient::new(&config.base_url)?;
            client.health_check()?;
            print_json(&serde_json::json!({
                "ok": true,
                "message": format!("Model server reachable at {}", config.base_url),
            }))
        }
        Command::Ingest { pages } => {
            let texts = read_pages(&pages)?;
            let pipeline = build_pipeline(config)?;
            let summary = pipeline.ingest(&texts)?;
            print_json(&summary)
        }
        Command::Ask { question } => {
            let pipeline = build_pipeline(config)?;
            let answer = pipeline.answer(&question)?;
            print_json(&answer)
        }
        Command::Reset => {
            let pipeline = build_pipeline(config)?;
            let summary = pipeline.reset()?;
            print_json(&summary)
        }
    }
}

fn build_pipeline(config: RagConfig) -> Result<RagPipeline, AppError> {
    let client = OllamaClient::new(&config.base_url)?;
    let embedder = OllamaEmbedder::new(client.clone(), config.embed_model.clone());
    let llm = OllamaLlm::new(client, config.llm_model.clone(), config.llm_retries);
    RagPipeline::new(config, Box::new(embedder), Box::new(llm))
}

fn read_pages(paths: &[PathBuf]) -> Result<Vec<String>, AppError> {
    if paths.is_empty() {
        return Err(AppError::new(
            "INGEST_INPUT_EMPTY",
            "No page files were provided",
        ));
    }
    let mut pages = Vec::with_capacity(paths.len());
    for path in paths {
        let text = fs::read_to_string(path).map_err(|e| {
            AppError::new("INGEST_INPUT_INVALID", "Failed to read page file")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        pages.push(text);
    }
    Ok(pages)
}

fn print_json(value: &impl serde::Serialize) -> Result<(), AppError> {
    let json = serde_json::to_string(value).map_err(|e| {
        AppError::new("OUTPUT_ENCODE_FAILED", "Failed to encode response").with_details(e.to_string())
    })?;
    println!("{json}");
    Ok(())
}
