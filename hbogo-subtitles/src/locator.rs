//! Resolves the downloadable subtitle files of one playable item.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use language_utils::{Language, LanguageSelection, available_languages};

use crate::api::{ApiClient, Category, Content, Material};
use crate::error::{Error, Result, Unavailability};
use crate::messages::{Locale, Message};
use crate::naming::insert_language_tag;
use crate::session::Session;
use crate::transport::HttpTransport;

/// One subtitle file to fetch: `url` is saved as `folder/name`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubtitleAsset {
    pub name: String,
    pub folder: PathBuf,
    pub url: String,
}

impl SubtitleAsset {
    pub fn destination(&self) -> PathBuf {
        self.folder.join(&self.name)
    }
}

/// Assets of one or more items together with every folder they land in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocatedSubtitles {
    pub assets: Vec<SubtitleAsset>,
    pub language_folders: BTreeSet<PathBuf>,
}

impl LocatedSubtitles {
    pub fn merge(mut self, other: LocatedSubtitles) -> LocatedSubtitles {
        self.assets.extend(other.assets);
        self.language_folders.extend(other.language_folders);
        self
    }
}

/// Series with more than one language get a sub-folder per language; everything
/// else shares `base`.
pub fn language_folder(
    base: &Path,
    category: Category,
    effective: &IndexSet<Language>,
    language: Language,
) -> PathBuf {
    if category == Category::Series && effective.len() > 1 {
        base.join(language.iso_tag())
    } else {
        base.to_path_buf()
    }
}

/// Derives a track's URL from the playback manifest URL: the manifest file name
/// is replaced by `subtitles/{code}/{href}`, where `code` is the track file stem
/// without the content id.
pub fn subtitle_url(manifest_url: &str, content_id: &str, href: &str) -> String {
    let without_query = manifest_url
        .split(['?', '#'])
        .next()
        .unwrap_or(manifest_url);
    let base = match without_query.rfind('/') {
        Some(index) => &without_query[..=index],
        None => "",
    };
    let stem = Path::new(href)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let code = stem.replace(content_id, "");
    format!("{base}subtitles/{code}/{href}")
}

/// The languages one item offers for subtitles, in track order.
pub fn subtitle_languages(materials: &[Material]) -> IndexSet<Language> {
    available_languages(
        materials
            .iter()
            .filter(|material| material.is_subtitle())
            .map(|material| material.lang.as_str()),
    )
}

/// Builds the asset list for an item whose effective languages are known.
pub fn plan_assets(
    manifest_url: &str,
    content_id: &str,
    materials: &[Material],
    category: Category,
    effective: &IndexSet<Language>,
    folder: &Path,
    file_name_template: &str,
) -> LocatedSubtitles {
    let mut located = LocatedSubtitles::default();
    let mut claimed = BTreeSet::new();

    for material in materials.iter().filter(|material| material.is_subtitle()) {
        let Some(language) = Language::from_platform_tag(&material.lang) else {
            continue;
        };
        if !effective.contains(&language) {
            continue;
        }

        let language_folder = language_folder(folder, category, effective, language);
        let asset = SubtitleAsset {
            name: insert_language_tag(file_name_template, language.iso_tag()),
            folder: language_folder.clone(),
            url: subtitle_url(manifest_url, content_id, &material.href),
        };
        if !claimed.insert(asset.destination()) {
            log::debug!("Skipping duplicate {} track {}", language, material.href);
            continue;
        }
        log::debug!("{}", asset.url);

        located.language_folders.insert(language_folder);
        located.assets.push(asset);
    }

    located
}

/// Resolves the subtitle assets of `content` and creates their folders.
///
/// A failing playback request is returned as an error: without the manifest
/// no track URL can be derived. An empty language match is
/// [`Unavailability::Languages`].
#[allow(clippy::too_many_arguments)]
pub async fn locate<T: HttpTransport, C: Content>(
    api: &ApiClient<T>,
    session: &Session,
    requested: &LanguageSelection,
    content_id: &str,
    content: &C,
    folder: &Path,
    file_name_template: &str,
    locale: Locale,
) -> Result<LocatedSubtitles> {
    let playback = api.playback(content_id, session).await?;

    let available = subtitle_languages(content.materials());
    let effective = requested.effective(&available);
    if effective.is_empty() {
        let available = available
            .iter()
            .map(|language| language.iso_tag().to_string())
            .collect::<Vec<_>>();
        log::error!(
            "{}",
            Message::AvailableLanguages {
                languages: &available
            }
            .translate(locale)
        );
        return Err(Error::Unavailable(Unavailability::Languages { available }));
    }

    let located = plan_assets(
        &playback.playback_url,
        content_id,
        content.materials(),
        content.metadata().category(),
        &effective,
        folder,
        file_name_template,
    );

    for language_folder in &located.language_folders {
        std::fs::create_dir_all(language_folder)
            .map_err(|e| Error::io("Failed to create folder", language_folder, e))?;
    }

    Ok(located)
}
