//! Pre-flight check for a reelcast deployment.
//!
//! Verifies the staging directory, the ffmpeg tools, configuration and
//! ledger reachability. `--list-ledger` prints every recorded content id.

use std::path::Path;

use anyhow::Context;

use reel_ledger::connect;
use reel_media::{check_ffmpeg, check_ffprobe};
use reel_worker::PipelineConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;
    dotenvy::dotenv().ok();

    let list_ledger = std::env::args().any(|a| a == "--list-ledger");

    let config = PipelineConfig::from_env().context("configuration")?;
    println!(
        "reelcast-selfcheck: starting with staging_dir={}",
        config.staging_dir.display()
    );

    ensure_staging_dir(&config.staging_dir).await?;
    ensure_tools()?;

    let ledger = connect(&config.ledger).context("ledger configuration")?;
    let members = ledger
        .members()
        .await
        .with_context(|| format!("ledger {} unreachable", ledger.backend()))?;
    println!(
        "reelcast-selfcheck: ledger {} reachable, {} recorded ids",
        ledger.backend(),
        members.len()
    );

    if list_ledger {
        for id in &members {
            println!("{}", id);
        }
    }

    println!("reelcast-selfcheck: ok");
    Ok(())
}

async fn ensure_staging_dir(path: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("cannot create staging dir {}", path.display()))?;

    let probe = path.join(".selfcheck");
    tokio::fs::write(&probe, b"ok")
        .await
        .with_context(|| format!("staging dir {} is not writable", path.display()))?;
    tokio::fs::remove_file(&probe).await.ok();
    Ok(())
}

fn ensure_tools() -> anyhow::Result<()> {
    let ffmpeg = check_ffmpeg()?;
    let ffprobe = check_ffprobe()?;
    println!(
        "reelcast-selfcheck: ffmpeg={} ffprobe={}",
        ffmpeg.display(),
        ffprobe.display()
    );
    Ok(())
}
