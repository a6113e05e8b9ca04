mod bullets;
mod cli;
mod config;
mod errors;
mod llm_client;
mod render;
mod routes;
mod scoring;
mod signals;
mod state;
mod tailoring;

use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{BudgetArgs, Cli, Commands};
use crate::config::Config;
use crate::render::compile_to_dir;
use crate::routes::build_router;
use crate::scoring::{run_score_request, ScoreRequest};
use crate::signals::CategoryWeights;
use crate::state::AppState;
use crate::tailoring::{TailorReport, TailorRequest, TailoringPipeline};

/// Keywords echoed in the signal summary.
const SUMMARY_KEYWORDS: usize = 6;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let weights = Arc::new(config.load_weights(cli.weights.as_deref())?);

    match cli.command {
        Commands::Tailor {
            company,
            jd,
            clipboard,
            resume,
            out_dir,
            report,
            yes,
            budget,
        } => {
            let options = TailorOptions {
                company,
                jd,
                clipboard,
                resume,
                out_dir,
                report,
                yes,
                budget,
            };
            run_tailor(&config, weights, options).await
        }
        Commands::Score { input, budget } => run_score(&weights, &input, &budget).await,
        Commands::Serve => run_serve(config, weights).await,
    }
}

struct TailorOptions {
    company: Option<String>,
    jd: Option<PathBuf>,
    clipboard: bool,
    resume: PathBuf,
    out_dir: PathBuf,
    report: Option<PathBuf>,
    yes: bool,
    budget: BudgetArgs,
}

async fn run_tailor(config: &Config, weights: Arc<CategoryWeights>, options: TailorOptions) -> Result<()> {
    let llm = Arc::new(config.llm_client()?);
    info!("LLM client initialized (model: {})", llm.model());
    let pipeline = TailoringPipeline::new(llm, weights);

    println!("Welcome to the Dynamic Signal Resume Optimization Engine");
    println!("{}", "-".repeat(55));

    let company = match options.company {
        Some(company) => company,
        None => tokio::task::spawn_blocking(|| {
            cli::prompt_line(&mut io::stdin().lock(), &mut io::stdout(), "Enter company name (eg: Google): ")
        })
        .await??
        .unwrap_or_default(),
    };

    let jd_text = match &options.jd {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Could not read job description from {}", path.display()))?,
        None if options.clipboard => {
            println!("Copy the Job Description to your Clipboard.");
            tokio::task::spawn_blocking(|| {
                cli::prompt_line(&mut io::stdin().lock(), &mut io::stdout(), "Press Enter here once copied...\n")?;
                cli::read_clipboard()
            })
            .await??
        }
        None => {
            println!("Paste the job description, then press Ctrl-D:");
            tokio::task::spawn_blocking(|| cli::read_pasted_text(&mut io::stdin().lock())).await??
        }
    };
    if jd_text.trim().is_empty() {
        bail!("Job description is empty");
    }
    println!("Captured {} words.\n", jd_text.split_whitespace().count());

    let resume_latex = read_resume(&options.resume).await?;

    let report = pipeline
        .run(TailorRequest {
            jd_text,
            resume_latex,
            budget: options.budget.budget().unwrap_or_default(),
        })
        .await?;

    print_summary(&report);

    if let Some(path) = &options.report {
        let json = serde_json::to_string_pretty(&report)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Could not write report to {}", path.display()))?;
        info!("Run report written to {}", path.display());
    }

    println!("\n{} PROPOSED CHANGES {}", "=".repeat(20), "=".repeat(20));
    println!("{}", report.tailored_latex);
    println!("{}\n", "=".repeat(58));

    let proceed = options.yes
        || tokio::task::spawn_blocking(|| {
            cli::confirm(&mut io::stdin().lock(), &mut io::stdout(), "Compile PDF?")
        })
        .await??;
    if !proceed {
        println!("Exiting without compilation.");
        return Ok(());
    }

    let output = compile_to_dir(
        &report.tailored_latex,
        &company,
        &options.out_dir,
        &config.pdflatex_bin,
    )
    .await?;
    println!("LaTeX source saved to {}", output.tex_path.display());
    if output.clean {
        println!("Success! Your optimized resume is ready: {}", output.pdf_path.display());
    } else {
        println!(
            "Warning: pdflatex finished with potential formatting issues. Check {}",
            output.pdf_path.display()
        );
    }
    Ok(())
}

async fn read_resume(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Could not find {}", path.display()))
}

fn print_summary(report: &TailorReport) {
    let signals = &report.signals;
    println!("\nJD Signals Extracted:");
    println!(" Top 5 Clusters: {}", signals.top_signals(5).join(", "));
    let keywords: Vec<&str> = signals
        .top_keywords
        .iter()
        .take(SUMMARY_KEYWORDS)
        .map(String::as_str)
        .collect();
    println!(" Target Keywords: {}", keywords.join(", "));
    if !signals.domain_phrases.is_empty() {
        println!(" Domain Phrases: {}", signals.domain_phrases.join(", "));
    }

    if report.untagged_fallback {
        warn!("Bullets were scored without tags");
    }
    println!("\nBullet ranking:");
    for scored in &report.ranked {
        let marker = if report.selection.contains_position(scored.position) {
            '+'
        } else {
            '-'
        };
        println!(" {marker} {:>6.1}  {}", scored.score, scored.bullet.text);
    }
}

async fn run_score(weights: &CategoryWeights, input: &Path, budget: &BudgetArgs) -> Result<()> {
    let raw = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Could not read {}", input.display()))?;
    let request: ScoreRequest = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid scoring request in {}", input.display()))?;

    let response = run_score_request(&request, weights, budget.budget())?;

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &response)?;
    writeln!(stdout)?;
    Ok(())
}

async fn run_serve(config: Config, weights: Arc<CategoryWeights>) -> Result<()> {
    info!("Starting autoresume API v{}", env!("CARGO_PKG_VERSION"));

    let llm = Arc::new(config.llm_client()?);
    info!("LLM client initialized (model: {})", llm.model());

    let state = AppState {
        pipeline: TailoringPipeline::new(llm, weights.clone()),
        weights,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once a frontend is deployed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
