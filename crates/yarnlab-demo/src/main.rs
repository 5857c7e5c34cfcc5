//! Render one yarn color from a job file and save it as a PNG.

mod config;
mod job;

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use yarnlab_core::RenderResult;
use yarnlab_runtime::{ControllerState, FileLoader, RenderController};

use crate::config::AppConfig;
use crate::job::RenderJob;

#[derive(Parser, Debug)]
#[command(name = "yarnlab-demo", about = "Recolor a yarn reference photo to a catalog color")]
struct Cli {
    /// Job file: `{ "color": ..., "config": ... }`
    job: PathBuf,
    /// Output directory (overrides `YARNLAB_OUT_DIR`)
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Asset root for relative bitmap references (overrides `YARNLAB_ASSET_ROOT`)
    #[arg(long)]
    assets: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut app = AppConfig::default();
    if let Some(dir) = cli.out_dir {
        app.out_dir = dir;
    }
    if let Some(root) = cli.assets {
        app.asset_root = root;
    }

    let job = RenderJob::load(&cli.job)?;
    tracing::info!(color_id = job.color.id, asset_root = %app.asset_root.display(), "loaded job");

    let (tx, mut rx) = mpsc::unbounded_channel::<RenderResult>();
    let controller = RenderController::new(FileLoader::new(&app.asset_root), move |result: &RenderResult| {
        let _ = tx.send(result.clone());
    })?;
    let mut state = controller.subscribe();

    controller.request(job.color, job.config);

    let settled = state
        .wait_for(ControllerState::is_settled)
        .await
        .context("render controller went away")?
        .clone();
    if let ControllerState::Failed(failure) = settled {
        bail!("render failed: {failure:?}");
    }

    let result = rx.recv().await.context("render finished without a result")?;
    tracing::info!(color_id = result.color_id, bytes = result.data_uri.len(), "render delivered");

    tokio::fs::create_dir_all(&app.out_dir)
        .await
        .with_context(|| format!("creating {}", app.out_dir.display()))?;
    let path = controller.export(&app.out_dir).await?;
    println!("{}", path.display());
    Ok(())
}
