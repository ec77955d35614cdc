//! Hands resolved subtitles to the downloader and converter, then moves the
//! finished folder to its final location.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::locator::SubtitleAsset;
use crate::messages::{Locale, Message};

#[async_trait]
pub trait BulkDownloader: Send + Sync {
    /// Fetches every asset into `asset.folder/asset.name`.
    async fn download_files(&self, assets: &[SubtitleAsset]) -> Result<()>;
}

pub trait SubtitleConverter: Send + Sync {
    /// Normalizes the subtitle files in `folder`. `platform` is set for the
    /// platform-wide pass over a title's base folder.
    fn convert(&self, folder: &Path, platform: Option<&str>, locale: Locale) -> Result<()>;
}

pub struct Dispatcher<D, C> {
    downloader: D,
    converter: C,
    platform: String,
    locale: Locale,
    output: Option<PathBuf>,
}

impl<D: BulkDownloader, C: SubtitleConverter> Dispatcher<D, C> {
    pub fn new(
        downloader: D,
        converter: C,
        platform: impl Into<String>,
        locale: Locale,
        output: Option<PathBuf>,
    ) -> Self {
        Self {
            downloader,
            converter,
            platform: platform.into(),
            locale,
            output,
        }
    }

    pub fn downloader(&self) -> &D {
        &self.downloader
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// Downloads `assets`, converts each language folder (sorted) and then
    /// `base_folder` with the platform tag, and finally relocates `base_folder`
    /// if an output directory is configured. Does nothing for an empty batch.
    ///
    /// Returns the number of dispatched assets.
    pub async fn dispatch(
        &self,
        assets: &[SubtitleAsset],
        base_folder: &Path,
        language_folders: &BTreeSet<PathBuf>,
    ) -> Result<usize> {
        if assets.is_empty() {
            return Ok(0);
        }

        self.downloader.download_files(assets).await?;

        for folder in language_folders {
            self.converter.convert(folder, None, self.locale)?;
        }
        self.converter
            .convert(base_folder, Some(self.platform.as_str()), self.locale)?;

        if let Some(output) = &self.output {
            let destination = relocate(base_folder, output)?;
            log::info!(
                "{}",
                Message::Relocated {
                    destination: &destination.display().to_string()
                }
                .translate(self.locale)
            );
        }

        Ok(assets.len())
    }
}

/// Moves `folder` into `output`, replacing a previous folder of the same name.
/// The previous folder is kept aside until the move has succeeded and is put
/// back if it fails.
pub fn relocate(folder: &Path, output: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output)
        .map_err(|e| Error::io("Failed to create output folder", output, e))?;
    let name = folder
        .file_name()
        .ok_or_else(|| Error::Internal(format!("{} has no folder name", folder.display())))?;
    let target = output.join(name);

    let mut backup_name = name.to_os_string();
    backup_name.push(".previous");
    let backup = output.join(backup_name);
    if backup.exists() {
        std::fs::remove_dir_all(&backup)
            .map_err(|e| Error::io("Failed to remove folder", &backup, e))?;
    }
    let replacing = target.exists();
    if replacing {
        std::fs::rename(&target, &backup)
            .map_err(|e| Error::io("Failed to set aside folder", &target, e))?;
    }

    if let Err(e) = move_dir(folder, &target) {
        if replacing {
            if target.exists() {
                let _ = std::fs::remove_dir_all(&target);
            }
            if let Err(restore) = std::fs::rename(&backup, &target) {
                log::error!("Failed to restore {}: {restore}", target.display());
            }
        }
        return Err(e);
    }

    if replacing {
        std::fs::remove_dir_all(&backup)
            .map_err(|e| Error::io("Failed to remove folder", &backup, e))?;
    }
    Ok(target)
}

fn move_dir(from: &Path, to: &Path) -> Result<()> {
    if let Err(e) = std::fs::rename(from, to) {
        // Renames fail across file systems.
        log::debug!("rename failed ({e}), copying instead");
        copy_dir(from, to)?;
        std::fs::remove_dir_all(from).map_err(|e| Error::io("Failed to remove folder", from, e))?;
    }
    Ok(())
}

fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    std::fs::create_dir_all(to).map_err(|e| Error::io("Failed to create folder", to, e))?;
    let entries =
        std::fs::read_dir(from).map_err(|e| Error::io("Failed to read folder", from, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io("Failed to read folder", from, e))?;
        let source = entry.path();
        let destination = to.join(entry.file_name());
        if source.is_dir() {
            copy_dir(&source, &destination)?;
        } else {
            std::fs::copy(&source, &destination)
                .map_err(|e| Error::io("Failed to copy file", &source, e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingDownloader {
        batches: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl BulkDownloader for RecordingDownloader {
        async fn download_files(&self, assets: &[SubtitleAsset]) -> Result<()> {
            self.batches.lock().unwrap().push(assets.len());
            for asset in assets {
                std::fs::create_dir_all(&asset.folder).unwrap();
                std::fs::write(asset.destination(), "WEBVTT\n").unwrap();
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingConverter {
        calls: Mutex<Vec<(PathBuf, Option<String>)>>,
    }

    impl SubtitleConverter for RecordingConverter {
        fn convert(&self, folder: &Path, platform: Option<&str>, _locale: Locale) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((folder.to_path_buf(), platform.map(str::to_string)));
            Ok(())
        }
    }

    fn asset(folder: &Path, name: &str) -> SubtitleAsset {
        SubtitleAsset {
            name: name.to_string(),
            folder: folder.to_path_buf(),
            url: format!("https://cdn.example.com/{name}"),
        }
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_no_op() {
        let dispatcher = Dispatcher::new(
            RecordingDownloader::default(),
            RecordingConverter::default(),
            "HBOGO",
            Locale::English,
            None,
        );
        let dispatched = dispatcher
            .dispatch(&[], Path::new("nowhere"), &BTreeSet::new())
            .await
            .unwrap();

        assert_eq!(dispatched, 0);
        assert!(dispatcher.downloader().batches.lock().unwrap().is_empty());
        assert!(dispatcher.converter().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_converts_language_folders_then_base() {
        let temp = tempfile::tempdir().unwrap();
        let base = temp.path().join("Show.S01");
        let zh = base.join("zh-Hant");
        let en = base.join("en");
        let dispatcher = Dispatcher::new(
            RecordingDownloader::default(),
            RecordingConverter::default(),
            "HBOGO",
            Locale::English,
            None,
        );

        let assets = vec![asset(&zh, "a.zh-Hant.vtt"), asset(&en, "a.en.vtt")];
        let folders = BTreeSet::from([zh.clone(), en.clone()]);
        let dispatched = dispatcher.dispatch(&assets, &base, &folders).await.unwrap();

        assert_eq!(dispatched, 2);
        assert_eq!(*dispatcher.downloader().batches.lock().unwrap(), vec![2]);
        assert_eq!(
            *dispatcher.converter().calls.lock().unwrap(),
            vec![
                (en, None),
                (zh, None),
                (base, Some("HBOGO".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn test_relocates_after_conversion() {
        let temp = tempfile::tempdir().unwrap();
        let base = temp.path().join("downloads").join("Movie.2020");
        let output = temp.path().join("library");
        let dispatcher = Dispatcher::new(
            RecordingDownloader::default(),
            RecordingConverter::default(),
            "HBOGO",
            Locale::English,
            Some(output.clone()),
        );

        let assets = vec![asset(&base, "Movie.2020.WEB-DL.HBOGO.en.vtt")];
        dispatcher
            .dispatch(&assets, &base, &BTreeSet::new())
            .await
            .unwrap();

        assert!(!base.exists());
        assert!(
            output
                .join("Movie.2020")
                .join("Movie.2020.WEB-DL.HBOGO.en.vtt")
                .exists()
        );
    }

    #[test]
    fn test_relocate_replaces_existing_folder() {
        let temp = tempfile::tempdir().unwrap();
        let folder = temp.path().join("work").join("Title");
        let output = temp.path().join("out");
        std::fs::create_dir_all(folder.join("en")).unwrap();
        std::fs::write(folder.join("en").join("new.srt"), "new").unwrap();
        std::fs::create_dir_all(output.join("Title")).unwrap();
        std::fs::write(output.join("Title").join("stale.srt"), "old").unwrap();

        let target = relocate(&folder, &output).unwrap();

        assert_eq!(target, output.join("Title"));
        assert!(target.join("en").join("new.srt").exists());
        assert!(!target.join("stale.srt").exists());
        assert!(!folder.exists());
    }

    #[test]
    fn test_failed_relocation_keeps_previous_output() {
        let temp = tempfile::tempdir().unwrap();
        let output = temp.path().join("out");
        std::fs::create_dir_all(output.join("Title")).unwrap();
        std::fs::write(output.join("Title").join("kept.srt"), "old").unwrap();

        // The source folder does not exist, so both rename and copy fail.
        let missing = temp.path().join("work").join("Title");
        assert!(relocate(&missing, &output).is_err());

        assert_eq!(
            std::fs::read_to_string(output.join("Title").join("kept.srt")).unwrap(),
            "old"
        );
        assert!(!output.join("Title.previous").exists());
    }

    #[test]
    fn test_copy_dir_is_recursive() {
        let temp = tempfile::tempdir().unwrap();
        let from = temp.path().join("from");
        std::fs::create_dir_all(from.join("nested")).unwrap();
        std::fs::write(from.join("nested").join("a.srt"), "a").unwrap();

        let to = temp.path().join("to");
        copy_dir(&from, &to).unwrap();
        assert_eq!(
            std::fs::read_to_string(to.join("nested").join("a.srt")).unwrap(),
            "a"
        );
    }
}
