//! Command-line client for the rectifier service.
//!
//! Uploads a text file for rectification or a PDF for conversion, renders the
//! streamed progress, and writes the resulting markdown.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{json, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use rectifier::events::{FrameDecoder, ProgressEvent};
use rectifier::progress::ProgressState;
use rectifier::types::DocumentResponse;

/// Rectify documents and convert PDFs to Markdown through a rectifier service.
#[derive(Parser, Debug)]
#[command(name = "rectify", version, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Base URL of the rectifier service.
    #[arg(long, env = "RECTIFY_SERVER", default_value = "http://localhost:3017", global = true)]
    server: String,

    /// Write Markdown to this file instead of stdout.
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Wait for a single response instead of streaming progress.
    #[arg(long, global = true)]
    no_stream: bool,

    /// Debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Correct a text or markdown document chunk by chunk.
    Rectify {
        /// Text file to rectify.
        input: PathBuf,

        /// Correction model; the service default when omitted.
        #[arg(short, long)]
        model: Option<String>,

        /// Chunk size in characters; the service default when omitted.
        #[arg(short, long)]
        chunk_size: Option<i64>,
    },
    /// Convert a PDF to markdown.
    Convert {
        /// PDF file to convert.
        input: PathBuf,
    },
}

/// Terminal rendering of a [`ProgressState`].
struct Renderer {
    bar: ProgressBar,
}

impl Renderer {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    fn render(&self, state: &ProgressState, event: &ProgressEvent) {
        match state {
            ProgressState::Determinate {
                percentage,
                message,
                ..
            } => {
                self.bar.set_style(
                    ProgressStyle::with_template(
                        "{spinner:.cyan} [{bar:40.green/238}] {pos:>3}%  {msg}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
                );
                self.bar.set_position(u64::from(*percentage));
                self.bar.set_message(message.clone());
            }
            ProgressState::Indeterminate { message, .. } => {
                self.bar.set_style(
                    ProgressStyle::with_template("{spinner:.cyan} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                if let ProgressEvent::Activity { message } = event {
                    self.bar.println(format!("  - {message}"));
                }
                self.bar.set_message(message.clone());
            }
            ProgressState::Idle => {}
        }
    }

    fn finish(&self, succeeded: bool) {
        if succeeded {
            self.bar.finish_with_message("Done");
        } else {
            self.bar.abandon();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let stream = !cli.no_stream;
    let (endpoint, body) = match &cli.command {
        Command::Rectify {
            input,
            model,
            chunk_size,
        } => {
            let content = std::fs::read_to_string(input)
                .with_context(|| format!("reading {}", input.display()))?;
            let body = json!({
                "content": content,
                "filename": file_name(input),
                "model": model,
                "chunkSize": chunk_size,
                "stream": stream,
            });
            ("api/rectify", body)
        }
        Command::Convert { input } => {
            let bytes =
                std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
            let body = json!({
                "content": STANDARD.encode(bytes),
                "filename": file_name(input),
                "stream": stream,
            });
            ("api/convert", body)
        }
    };

    let url = format!("{}/{}", cli.server.trim_end_matches('/'), endpoint);
    debug!(url = %url, stream, "Sending request");

    let response = reqwest::Client::new()
        .post(&url)
        .json(&body)
        .send()
        .await
        .with_context(|| format!("connecting to {url}"))?;

    if !response.status().is_success() {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = body["error"].as_str().unwrap_or("no error message");
        bail!("service returned {status}: {message}");
    }

    let markdown = if stream {
        read_stream(response).await?
    } else {
        response
            .json::<DocumentResponse>()
            .await
            .context("decoding response")?
            .markdown
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &markdown)
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!("Wrote {} ({} chars)", path.display(), markdown.len());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(markdown.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}

/// Follow the event stream until its terminal frame.
async fn read_stream(response: reqwest::Response) -> Result<String> {
    let renderer = Renderer::new();
    let mut state = ProgressState::Idle;
    let mut decoder = FrameDecoder::new();
    let mut body = response.bytes_stream();

    let mut outcome: Option<Result<String>> = None;
    while let Some(bytes) = body.next().await {
        let bytes = bytes.context("reading event stream")?;
        for event in decoder.push(&bytes) {
            if let Some(result) = handle_event(&renderer, &mut state, event) {
                outcome = Some(result);
            }
        }
        if outcome.is_some() {
            break;
        }
    }

    if let Some(err) = decoder.last_error() {
        debug!(dropped = decoder.dropped(), last = %err, "Ignored malformed frames");
    }

    if outcome.is_none() {
        if let Some(event) = decoder.finish() {
            outcome = handle_event(&renderer, &mut state, event);
        }
    }

    let outcome = outcome.unwrap_or_else(|| Err(anyhow!("stream ended without a result")));
    renderer.finish(outcome.is_ok());
    outcome
}

fn handle_event(
    renderer: &Renderer,
    state: &mut ProgressState,
    event: ProgressEvent,
) -> Option<Result<String>> {
    state.apply(&event);
    renderer.render(state, &event);
    match event {
        ProgressEvent::Complete { markdown } => Some(Ok(markdown)),
        ProgressEvent::Error { error } => Some(Err(anyhow!(error))),
        _ => None,
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
