use async_trait::async_trait;
use futures::{FutureExt, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};

use crate::dispatch::BulkDownloader;
use crate::error::{Error, Result};
use crate::locator::SubtitleAsset;

pub const DEFAULT_CONCURRENCY: usize = 8;

/// Fetches subtitle files over plain HTTP with a progress bar.
pub struct HttpDownloader {
    client: reqwest::Client,
    concurrency: usize,
}

impl HttpDownloader {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    async fn fetch(&self, asset: &SubtitleAsset) -> Result<()> {
        let transport_error = |status: Option<u16>, body: String| Error::Transport {
            url: asset.url.clone(),
            status,
            body,
        };

        let response = self
            .client
            .get(&asset.url)
            .send()
            .await
            .map_err(|e| transport_error(None, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(transport_error(Some(status.as_u16()), body));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(Some(status.as_u16()), e.to_string()))?;

        tokio::fs::create_dir_all(&asset.folder)
            .await
            .map_err(|e| Error::io("Failed to create folder", &asset.folder, e))?;
        let destination = asset.destination();
        tokio::fs::write(&destination, &bytes)
            .await
            .map_err(|e| Error::io("Failed to write subtitle", &destination, e))
    }
}

#[async_trait]
impl BulkDownloader for HttpDownloader {
    /// Individual failures are logged; the batch only fails when nothing could
    /// be fetched.
    async fn download_files(&self, assets: &[SubtitleAsset]) -> Result<()> {
        if assets.is_empty() {
            return Ok(());
        }

        let pb = ProgressBar::new(assets.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} subtitles ({eta})")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        let fetches: Vec<futures::future::BoxFuture<'_, Result<()>>> = assets.iter().map(|asset| {
            let pb = pb.clone();
            async move {
                let result = self.fetch(asset).await.inspect_err(|e| {
                    pb.suspend(|| log::warn!("Failed to download {}: {e}", asset.name));
                });
                pb.inc(1);
                result
            }
            .boxed()
        }).collect();
        let results = futures::stream::iter(fetches)
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        pb.finish_and_clear();

        let failed = results.iter().filter(|result| result.is_err()).count();
        if failed == assets.len() {
            return Err(results
                .into_iter()
                .find_map(|result| result.err())
                .unwrap_or_else(|| Error::Internal("No subtitle could be downloaded".to_string())));
        }
        if failed > 0 {
            log::warn!("{failed} of {} subtitles failed to download", assets.len());
        }
        log::info!("Downloaded {} subtitles", assets.len() - failed);
        Ok(())
    }
}
