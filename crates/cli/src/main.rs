//! Scribe CLI
//!
//! Runs a generation against a backend, replays captured response bodies
//! offline, and normalizes raw `done` payloads.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use futures::stream;
use scribe_core::content::normalize_value;
use scribe_core::models::{PromotionIntensity, Reference};
use scribe_core::session::SessionView;
use scribe_core::{
    consume_stream, ClientConfig, EventRouter, GenerationClient, GenerationRequest,
    StreamSession, UiLanguage,
};
use std::convert::Infallible;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Clone)]
#[command(author, version, about = "Scribe - streamed article generation client")]
struct Args {
    /// UI language for narrated hand-offs (en, zh)
    #[arg(long, global = true, value_parser = parse_language)]
    ui_language: Option<UiLanguage>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Clone)]
enum CliCommand {
    /// Generate an article and stream the agents' progress
    Generate {
        /// Topic keyword
        #[arg(short, long)]
        keyword: String,
        #[arg(long)]
        tone: Option<String>,
        #[arg(long)]
        audience: Option<String>,
        #[arg(long)]
        style: Option<String>,
        #[arg(long)]
        market: Option<String>,
        /// Output language of the article
        #[arg(short, long)]
        language: Option<String>,
        /// Reference URL for the researcher
        #[arg(long)]
        reference_url: Option<String>,
        /// Website to promote (repeatable)
        #[arg(long = "promote")]
        promoted_websites: Vec<String>,
        /// low, medium or high
        #[arg(long, value_parser = parse_intensity)]
        intensity: Option<PromotionIntensity>,
        /// Backend base URL (overrides SCRIBE_API_URL)
        #[arg(long)]
        api_url: Option<String>,
        /// Print the final session snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replay a captured response body through the pipeline
    Replay {
        file: PathBuf,
        /// Bytes per simulated network chunk
        #[arg(long, default_value = "64")]
        chunk_size: usize,
        #[arg(long)]
        json: bool,
    },
    /// Normalize a raw `done` payload and print the result
    Normalize { file: PathBuf },
}

fn parse_language(tag: &str) -> Result<UiLanguage, String> {
    UiLanguage::from_tag(tag).ok_or_else(|| format!("unsupported language: {}", tag))
}

fn parse_intensity(value: &str) -> Result<PromotionIntensity, String> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
        .map_err(|_| format!("expected low, medium or high, got {}", value))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("scribe_core=info,scribe_cli=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_logging();

    let args = Args::parse();
    let mut config = ClientConfig::from_env().context("Failed to load client configuration")?;
    if let Some(language) = args.ui_language {
        config = config.with_ui_language(language);
    }

    match args.command {
        CliCommand::Generate {
            keyword,
            tone,
            audience,
            style,
            market,
            language,
            reference_url,
            promoted_websites,
            intensity,
            api_url,
            json,
        } => {
            if let Some(url) = api_url {
                config = config.with_base_url(url);
            }

            let mut request = GenerationRequest::new(keyword).with_ui_language(config.ui_language);
            if let Some(tone) = tone {
                request.tone = tone;
            }
            if let Some(audience) = audience {
                request.target_audience = audience;
            }
            if let Some(style) = style {
                request.visual_style = style;
            }
            if let Some(market) = market {
                request.target_market = market;
            }
            if let Some(language) = language {
                request = request.with_target_language(language);
            }
            if let Some(url) = reference_url {
                request = request.with_reference(Reference::url(url));
            }
            request.promoted_websites = promoted_websites;
            if let Some(intensity) = intensity {
                request.promotion_intensity = intensity;
            }

            let session = generate(config, request).await?;
            print_result(&session, json)
        }
        CliCommand::Replay {
            file,
            chunk_size,
            json,
        } => {
            let body = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let chunks: Vec<Result<Vec<u8>, Infallible>> = body
                .chunks(chunk_size.max(1))
                .map(|chunk| Ok(chunk.to_vec()))
                .collect();
            tracing::info!(bytes = body.len(), chunks = chunks.len(), "Replaying captured stream");

            let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
            let printer = tokio::spawn(print_updates(rx));
            let session = consume_stream(
                stream::iter(chunks),
                EventRouter::new(config.ui_language),
                &tx,
                &CancellationToken::new(),
            )
            .await;
            drop(tx);
            printer.await.context("Progress printer crashed")?;

            print_result(&session, json)
        }
        CliCommand::Normalize { file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let payload = serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw));
            let normalized = normalize_value(payload);

            let article = normalized.clone().into_article();
            if !article.is_presentable() {
                tracing::warn!("Payload holds no presentable article");
            }
            println!("{}", serde_json::to_string_pretty(&normalized)?);
            Ok(())
        }
    }
}

async fn generate(config: ClientConfig, request: GenerationRequest) -> Result<StreamSession> {
    let client = GenerationClient::new(config).context("Failed to build HTTP client")?;
    let mut handle = client.start_generation(request)?;

    let mut printed = 0;
    loop {
        tokio::select! {
            update = handle.updates.recv() => match update {
                Some(session) => print_new_events(&session, &mut printed),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Cancelling generation (Ctrl+C received)");
                handle.cancel();
            }
        }
    }

    handle.finish().await.context("Generation task crashed")
}

/// Print new log lines as snapshots arrive
async fn print_updates(mut updates: mpsc::Receiver<StreamSession>) {
    let mut printed = 0;
    while let Some(session) = updates.recv().await {
        print_new_events(&session, &mut printed);
    }
}

fn print_new_events(session: &StreamSession, printed: &mut usize) {
    let events = session.events();
    // A restart clears the log
    if events.len() < *printed {
        *printed = 0;
    }
    for event in &events[*printed..] {
        println!(
            "[{:>3}%] {:<10} {}",
            session.progress(),
            event.agent_id,
            event.message.as_deref().unwrap_or_default()
        );
    }
    *printed = events.len();
}

fn print_result(session: &StreamSession, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
        return Ok(());
    }

    match session.view() {
        SessionView::Preview => {
            if let Some(article) = session.presentable_article() {
                println!();
                if !article.title.is_empty() {
                    println!("# {}\n", article.title);
                }
                println!("{}", article.content);
                for image in &article.images {
                    println!("\n![{}]({})", image.alt.as_deref().unwrap_or_default(), image.url);
                }
                if let Some(seo) = &article.seo_meta {
                    if !seo.keywords.is_empty() {
                        eprintln!("\nKeywords: {}", seo.keywords.join(", "));
                    }
                }
                if let Some(score) = article
                    .quality_review
                    .as_ref()
                    .and_then(|review| review.geo_score)
                {
                    eprintln!("GEO score: {}", score);
                }
            }
            Ok(())
        }
        SessionView::NoArticle => bail!("Generation finished without a presentable article"),
        SessionView::Failed => bail!(
            "Generation failed: {}",
            session.last_error().unwrap_or("unknown error")
        ),
        SessionView::Cancelled => {
            eprintln!("Generation cancelled");
            Ok(())
        }
        SessionView::Idle | SessionView::Generating => {
            bail!("Generation stopped before it finished")
        }
    }
}
