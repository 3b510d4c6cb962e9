//! Media download into the staging directory.

use std::path::{Path, PathBuf};

use chrono::Local;
use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{SourceError, SourceResult};

/// File name for a downloaded video, stamped with local time.
pub fn media_file_name() -> String {
    format!("reel_{}.mp4", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Stream a media URL to `dir`, returning the final file path.
///
/// Data is written to a `.part` file and renamed once complete, so a
/// failed download never leaves a file under the final name.
pub async fn download_media(http: &Client, url: &str, dir: &Path) -> SourceResult<PathBuf> {
    fs::create_dir_all(dir).await?;

    let target = dir.join(media_file_name());
    let partial = target.with_extension("mp4.part");

    info!(url, path = %target.display(), "Downloading candidate media");

    let mut response = http
        .get(url)
        .send()
        .await
        .map_err(|e| SourceError::download_failed(format!("request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(SourceError::download_failed(format!(
            "media URL returned {}",
            response.status()
        )));
    }

    let mut file = fs::File::create(&partial).await?;
    let mut written: u64 = 0;

    loop {
        let chunk = match response.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                drop(file);
                let _ = fs::remove_file(&partial).await;
                return Err(SourceError::download_failed(format!(
                    "transfer interrupted: {}",
                    e
                )));
            }
        };
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    drop(file);

    if written == 0 {
        let _ = fs::remove_file(&partial).await;
        return Err(SourceError::download_failed("media response was empty"));
    }

    fs::rename(&partial, &target).await?;
    debug!(bytes = written, path = %target.display(), "Media download complete");
    Ok(target)
}
