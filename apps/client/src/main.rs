mod api_client;
mod cli;
mod config;
mod errors;
mod jobs;
mod models;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api_client::{AnalysisApi, HttpAnalysisApi};
use crate::cli::{render_history_row, render_report, Cli, Command};
use crate::config::Config;
use crate::errors::AnalyzerError;
use crate::jobs::{
    DeletionCoordinator, HistoryPaginator, JobStore, JobSubmitter, PollConfig, ResultPoller,
    TokioClock,
};
use crate::models::document::ResumeDocument;
use crate::models::job::JobId;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing SKILLMATCH_API_URL)
    let config = Config::from_env()?;

    // Structured logging on stderr; stdout carries command output
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting skillmatch v{}", env!("CARGO_PKG_VERSION"));

    let api: Arc<dyn AnalysisApi> = Arc::new(HttpAnalysisApi::new(
        &config.api_url,
        config.api_token.clone(),
        config.http_timeout,
    )?);
    info!("Analysis API client initialized ({})", config.api_url);

    let store = JobStore::new();
    let poller = ResultPoller::new(
        Arc::clone(&api),
        Arc::new(TokioClock),
        store.clone(),
        PollConfig {
            interval: config.poll_interval,
            max_attempts: config.max_poll_attempts,
        },
    );

    // Ctrl-C stops an in-progress watch; the backend job keeps running
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, no longer waiting for the analysis");
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Command::Analyze {
            resume,
            job_description,
            job_description_file,
        } => {
            let document = ResumeDocument::from_path(&resume).await?;
            let job_description =
                read_job_description(job_description, job_description_file).await?;

            let job_id = JobSubmitter::new(Arc::clone(&api))
                .submit(&document, &job_description)
                .await
                .map_err(user_error)?;
            eprintln!("Submitted analysis {job_id}");

            watch(&poller, job_id, cancel).await
        }
        Command::Watch { id } => watch(&poller, JobId::from(id), cancel).await,
        Command::History { offset, limit, all } => {
            let history = HistoryPaginator::new(Arc::clone(&api), store.clone(), config.page_size);
            if all {
                while history.fetch_next_page().await.map_err(user_error)?.is_some() {}
            } else if offset == 0 && limit.is_none() {
                history.refresh().await.map_err(user_error)?;
            } else {
                history
                    .fetch_page(offset, limit.unwrap_or(config.page_size))
                    .await
                    .map_err(user_error)?;
            }

            let view = store.history();
            for row in &view.items {
                println!("{}", render_history_row(row));
            }
            println!(
                "{} of {} {}{}",
                view.items.len(),
                view.total,
                if view.total == 1 { "analysis" } else { "analyses" },
                if history.has_more() { " (more available)" } else { "" }
            );
            Ok(())
        }
        Command::Delete { id, yes } => {
            if !yes {
                anyhow::bail!("Refusing to delete analysis {id} without --yes");
            }
            let job_id = JobId::from(id);
            DeletionCoordinator::new(Arc::clone(&api), store.clone())
                .delete(&job_id)
                .await
                .map_err(user_error)?;
            println!("Deleted analysis {job_id}");
            Ok(())
        }
    }
}

/// Polls until the job settles, echoing each status change.
async fn watch(poller: &ResultPoller, job_id: JobId, cancel: CancellationToken) -> Result<()> {
    let session = poller.start(job_id, cancel);
    info!(job_id = %session.job_id(), "Waiting for analysis");

    let mut last_label = "";
    let outcome = session
        .run(|snapshot| {
            if snapshot.status_label != last_label {
                eprintln!("[{}] {}", snapshot.job_id, snapshot.status_label);
                last_label = snapshot.status_label;
            }
        })
        .await;

    let job = outcome.into_result().map_err(user_error)?;
    print!("{}", render_report(&job));
    Ok(())
}

async fn read_job_description(text: Option<String>, file: Option<PathBuf>) -> Result<String> {
    match (text, file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read job description '{}'", path.display())),
        (None, None) => anyhow::bail!("A job description is required"),
    }
}

fn user_error(err: AnalyzerError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}
