//! LegalEase: summarize and question legal documents.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use legalease_analyze::{Analyzer, HistoryStore};
use legalease_core::LegalEaseConfig;
use legalease_export::{render_summary_pdf, HIGHLIGHTED_FILE_NAME};
use legalease_infer::ModelBackends;
use legalease_server::actions::{ask_all, highlight_history, open_document, HighlightOutcome};
use legalease_server::{build_router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "legalease", version, about = "Summarize and question legal documents")]
struct Cli {
    /// Data directory (default: LEGALEASE_DATA_DIR, ../data next to the binary, or ./data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server (default)
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    #[command(flatten)]
    Run(Action),
}

/// One-shot commands that run a single action and exit.
#[derive(Subcommand, Debug)]
enum Action {
    /// Summarize a PDF or text file
    Summarize {
        file: PathBuf,
        /// Also write the summary as a PDF
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
    /// Answer questions about a PDF or text file
    Ask {
        file: PathBuf,
        #[arg(required = true)]
        questions: Vec<String>,
    },
    /// Answer questions about a PDF and highlight the answers in a copy of it
    Highlight {
        pdf: PathBuf,
        #[arg(long = "question", short = 'q', required = true)]
        questions: Vec<String>,
        /// Output path (default: <data-dir>/exports/highlighted_QA.pdf)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn resolve_data_dir() -> PathBuf {
    std::env::var("LEGALEASE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(resolve_data_dir);
    info!("Data directory: {}", data_dir.display());

    let mut config = LegalEaseConfig::from_env(&data_dir)?;

    // Blocking HTTP clients must be built off the async runtime.
    let model_config = config.models.clone();
    let backends =
        tokio::task::spawn_blocking(move || ModelBackends::from_config(&model_config)).await?;

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            serve(config, backends).await
        }
        Command::Run(action) => {
            tokio::task::spawn_blocking(move || run_action(&config, backends, action)).await?
        }
    }
}

async fn serve(config: LegalEaseConfig, backends: ModelBackends) -> anyhow::Result<()> {
    let port = config.port;
    let state = Arc::new(AppState::new(config, backends)?);
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("LegalEase server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_action(config: &LegalEaseConfig, backends: ModelBackends, action: Action) -> anyhow::Result<()> {
    let analyzer = Analyzer::new(config.chunking, config.summary_length, backends)?;

    match action {
        Action::Summarize { file, pdf } => {
            let document = open_document(&file)?;
            let summary = analyzer.summarize(&document, |p| {
                eprint!("\rSummarizing: {}/{} chunks", p.processed, p.total);
            })?;
            eprintln!();
            println!("{}", summary.text.trim_end());
            if let Some(out) = pdf {
                let bytes = render_summary_pdf(&summary.text)?;
                write_output(&out, &bytes)?;
            }
        }
        Action::Ask { file, questions } => {
            let document = open_document(&file)?;
            let history = ask_all(&analyzer, &document, &questions)?;
            print_history(&history);
        }
        Action::Highlight { pdf, questions, out } => {
            let document = open_document(&pdf)?;
            let history = ask_all(&analyzer, &document, &questions)?;
            print_history(&history);
            match highlight_history(&document, &history)? {
                HighlightOutcome::Pdf { bytes, report } => {
                    let out =
                        out.unwrap_or_else(|| config.data_paths.exports.join(HIGHLIGHTED_FILE_NAME));
                    write_output(&out, &bytes)?;
                    println!("{} highlights on {} pages", report.annotations, report.pages_touched);
                }
                HighlightOutcome::Info(message) => println!("{}", message),
            }
        }
    }
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn print_history(history: &HistoryStore) {
    for entry in history.list() {
        println!("Q: {}", entry.question);
        println!("A: {} (score {:.4})", entry.answer, entry.score);
        println!();
    }
}
