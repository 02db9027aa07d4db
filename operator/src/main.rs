use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use log::info;
use config::OperatorConfig;
use mstrcore::analysis::{DashboardStats, JobReport};
use mstrcore::ingest::UploadCoordinator;
use mstrcore::model::{AnalysisType, Job, LocalFile};
use mstrcore::remote::HttpAnalysisService;
use mstrcore::tracking::PollingEngine;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

mod config;
mod render;

#[derive(Parser)]
#[command(author, version, about = "Operator client for the multispectral target recognition service")]
struct Args {
    /// Load service settings from YAML
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Base URL of the analysis service
    #[arg(long, env = "MSTR_BASE_URL", global = true)]
    base_url: Option<String>,
    /// Polling interval in milliseconds
    #[arg(long, global = true)]
    interval_ms: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload sensor files one after another
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Start an analysis job over uploaded files
    Analyze {
        #[arg(required = true)]
        file_ids: Vec<String>,
        /// single, batch or tracking
        #[arg(long = "type")]
        analysis_type: Option<AnalysisType>,
        /// Poll until the job completes and print its detections
        #[arg(long, default_value_t = false)]
        wait: bool,
    },
    /// Delete an uploaded file
    Delete { file_id: String },
    /// Poll the service and print every committed snapshot
    Watch {
        /// Exit after this many snapshots
        #[arg(long)]
        cycles: Option<usize>,
    },
    /// Print the detections of a completed job
    Report { job_id: String },
    /// Print headline statistics once
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => OperatorConfig::load(path)?,
        None => OperatorConfig::default(),
    }
    .with_overrides(args.base_url.clone(), args.interval_ms);
    let client_config = config.to_client_config();
    info!(
        "analysis service {} (poll every {} ms)",
        client_config.base_url, client_config.poll_interval_ms
    );
    let service = HttpAnalysisService::new(&client_config)
        .context("building HTTP client for the analysis service")?;
    let engine = PollingEngine::new(Arc::new(service));
    let period = client_config.poll_interval();

    match args.command {
        Command::Upload { paths } => {
            let mut files = Vec::with_capacity(paths.len());
            for path in &paths {
                let file = LocalFile::read(path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?;
                files.push(file);
            }
            let results = UploadCoordinator::new(engine.clone()).upload(&files).await;
            println!("{}", render::uploads(&results));
        }
        Command::Analyze {
            file_ids,
            analysis_type,
            wait,
        } => {
            let analysis_type = analysis_type.unwrap_or(config.analysis_type);
            let job = engine
                .request_analysis(&file_ids, analysis_type)
                .await
                .context("starting analysis")?;
            println!("{}", render::job_line(&job));
            if wait {
                let job = wait_for_job(&engine, &job.id, period).await?;
                print_job(&job);
            }
        }
        Command::Delete { file_id } => {
            engine
                .delete_file(&file_id)
                .await
                .with_context(|| format!("deleting file {file_id}"))?;
            println!("deleted {file_id}");
        }
        Command::Watch { cycles } => watch(&engine, period, cycles).await?,
        Command::Report { job_id } => {
            let job = engine
                .service()
                .get_job(&job_id)
                .await
                .with_context(|| format!("fetching job {job_id}"))?;
            print_job(&job.normalized());
        }
        Command::Stats => {
            let snapshot = engine.refresh().await.context("loading service data")?;
            println!("{}", render::dashboard(&DashboardStats::from_snapshot(&snapshot)));
        }
    }

    Ok(())
}

fn print_job(job: &Job) {
    match JobReport::for_job(job) {
        Some(report) => println!("{}", render::report(&report)),
        None => println!("{}", render::job_line(job)),
    }
}

async fn watch(engine: &PollingEngine, period: Duration, cycles: Option<usize>) -> anyhow::Result<()> {
    let mut receiver = engine.registry().subscribe();
    let handle = engine.start(period);
    let mut seen = 0usize;
    loop {
        tokio::select! {
            changed = receiver.changed() => {
                changed.context("registry closed")?;
                let snapshot = receiver.borrow_and_update().clone();
                println!("{}", render::dashboard(&DashboardStats::from_snapshot(&snapshot)));
                println!("{}", render::jobs(&snapshot));
                seen += 1;
                if cycles.is_some_and(|limit| seen >= limit) {
                    break;
                }
            }
            _ = signal::ctrl_c() => break,
        }
    }
    handle.cancel();
    Ok(())
}

async fn wait_for_job(engine: &PollingEngine, job_id: &str, period: Duration) -> anyhow::Result<Job> {
    let mut receiver = engine.registry().subscribe();
    let handle = engine.start(period);
    let outcome = loop {
        let terminal = receiver
            .borrow_and_update()
            .job(job_id)
            .filter(|job| job.status.is_terminal())
            .cloned();
        if let Some(job) = terminal {
            break Ok(job);
        }
        tokio::select! {
            changed = receiver.changed() => {
                if changed.is_err() {
                    break Err(anyhow!("registry closed while waiting for job {job_id}"));
                }
            }
            _ = signal::ctrl_c() => break Err(anyhow!("interrupted while waiting for job {job_id}")),
        }
    };
    handle.cancel();
    outcome
}
