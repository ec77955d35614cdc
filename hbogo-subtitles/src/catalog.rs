//! Walks a title's catalogue entry (a movie, or a series' seasons and
//! episodes) and dispatches one subtitle batch per movie or season.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::api::{ApiClient, Season};
use crate::config::{Config, PLATFORM};
use crate::dispatch::{BulkDownloader, Dispatcher, SubtitleConverter};
use crate::error::{Error, Result, Unavailability};
use crate::locator::{self, LocatedSubtitles};
use crate::messages::{Locale, Message};
use crate::naming;
use crate::session::Session;
use crate::transport::HttpTransport;

static SERIES_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/sr(\d+)").unwrap());

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentUrl {
    Series { series_id: String },
    Movie { content_id: String },
}

/// `.../sr<digits>` is a series; anything else is a movie whose id is the last
/// path segment. A `/sr` path without digits is a series link that lost its id.
pub fn classify(url: &str, locale: Locale) -> Result<ContentUrl> {
    let path = match reqwest::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
    };

    if let Some(captures) = SERIES_ID.captures(&path) {
        return Ok(ContentUrl::Series {
            series_id: captures[1].to_string(),
        });
    }
    if path.contains("/sr") {
        log::error!("{}", Message::SeriesNotFound.translate(locale));
        return Err(Error::Internal(format!("No series id in {url}")));
    }

    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .map(|content_id| ContentUrl::Movie {
            content_id: content_id.to_string(),
        })
        .ok_or_else(|| Error::Internal(format!("No content id in {url}")))
}

/// Deletes `folder` if present and creates it empty.
pub fn reset_folder(folder: &Path) -> Result<()> {
    if folder.exists() {
        std::fs::remove_dir_all(folder)
            .map_err(|e| Error::io("Failed to clear folder", folder, e))?;
    }
    std::fs::create_dir_all(folder).map_err(|e| Error::io("Failed to create folder", folder, e))
}

/// Listing failures were already logged by the client; they end the branch
/// without assets instead of failing the run.
fn listing<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Error::Transport { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

pub struct Navigator<'a, T, D, C> {
    pub api: &'a ApiClient<T>,
    pub dispatcher: &'a Dispatcher<D, C>,
    pub config: &'a Config,
    pub session: &'a Session,
}

impl<T, D, C> Navigator<'_, T, D, C>
where
    T: HttpTransport,
    D: BulkDownloader,
    C: SubtitleConverter,
{
    /// Returns the number of assets dispatched.
    pub async fn run(&self, content: &ContentUrl) -> Result<usize> {
        match content {
            ContentUrl::Series { series_id } => self.series(series_id).await,
            ContentUrl::Movie { content_id } => self.movie(content_id).await,
        }
    }

    pub async fn series(&self, series_id: &str) -> Result<usize> {
        let locale = self.config.locale;
        let Some(seasons) = listing(self.api.seasons(series_id, &self.session.territory).await)?
        else {
            return Ok(0);
        };
        let seasons = seasons.results;

        let Some(first) = seasons.first() else {
            log::info!("{}", Message::SeriesUnavailable.translate(locale));
            return Err(Error::Unavailable(Unavailability::Region {
                series_id: series_id.to_string(),
            }));
        };
        let title = naming::series_title(&first.metadata).unwrap_or_else(|| series_id.to_string());
        log::info!(
            "{}",
            Message::SeriesTotal {
                title: &title,
                seasons: seasons.len()
            }
            .translate(locale)
        );

        let mut dispatched = 0;
        for season in &seasons {
            if self.config.wants_season(season.season_number) {
                dispatched += self.season(&title, season).await?;
            }
        }
        Ok(dispatched)
    }

    async fn season(&self, title: &str, season: &Season) -> Result<usize> {
        let locale = self.config.locale;
        let folder_name = naming::season_folder_name(title, season.season_number);
        let folder = self.config.download_dir.join(&folder_name);
        reset_folder(&folder)?;

        let Some(episodes) = listing(
            self.api
                .episodes(&season.content_id, &self.session.territory)
                .await,
        )?
        else {
            return Ok(0);
        };
        let total = episodes.total.max(episodes.results.len() as u32);
        log::info!(
            "{}",
            Message::SeasonTotal {
                season: season.season_number,
                episodes: total
            }
            .translate(locale)
        );

        let mut located = LocatedSubtitles::default();
        for episode in &episodes.results {
            if !self.config.wants_episode(episode.episode_number) {
                continue;
            }
            let file_name =
                naming::episode_file_name(&folder_name, episode.episode_number, PLATFORM);
            log::info!(
                "{}",
                Message::Finding {
                    file_name: &file_name
                }
                .translate(locale)
            );

            let episode_subtitles = locator::locate(
                self.api,
                self.session,
                &self.config.languages,
                &episode.content_id,
                episode,
                &folder,
                &file_name,
                locale,
            )
            .await?;
            located = located.merge(episode_subtitles);
        }

        self.dispatcher
            .dispatch(&located.assets, &folder, &located.language_folders)
            .await
    }

    pub async fn movie(&self, content_id: &str) -> Result<usize> {
        let locale = self.config.locale;
        let Some(movie) = listing(self.api.movie(content_id, &self.session.territory).await)?
        else {
            return Ok(0);
        };

        let (title, year) = naming::movie_title(&movie.metadata)
            .ok_or_else(|| Error::Internal(format!("Movie {content_id} has no title")))?;
        log::info!("{title} ({})", year.as_deref().unwrap_or("?"));

        let folder_name = naming::movie_folder_name(&title, year.as_deref(), content_id)?;
        let folder = self.config.download_dir.join(&folder_name);
        reset_folder(&folder)?;

        let file_name = naming::movie_file_name(&folder_name, PLATFORM);
        log::info!(
            "{}",
            Message::MovieDownload {
                file_name: &file_name
            }
            .translate(locale)
        );

        let located = locator::locate(
            self.api,
            self.session,
            &self.config.languages,
            content_id,
            &movie,
            &folder,
            &file_name,
            locale,
        )
        .await?;

        self.dispatcher
            .dispatch(&located.assets, &folder, &BTreeSet::new())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_series() {
        assert_eq!(
            classify("https://www.hbogoasia.hk/sr123456", Locale::English).unwrap(),
            ContentUrl::Series {
                series_id: "123456".to_string()
            }
        );
        assert_eq!(
            classify("https://www.hbogoasia.sg/series/sr98765?lang=en", Locale::English).unwrap(),
            ContentUrl::Series {
                series_id: "98765".to_string()
            }
        );
    }

    #[test]
    fn test_classify_movie() {
        assert_eq!(
            classify("https://www.hbogoasia.hk/movies/HBO0012345/", Locale::English).unwrap(),
            ContentUrl::Movie {
                content_id: "HBO0012345".to_string()
            }
        );
        assert!(classify("https://www.hbogoasia.hk/", Locale::English).is_err());
    }

    #[test]
    fn test_series_link_without_id_is_not_a_movie() {
        let error = classify("https://www.hbogoasia.hk/sr", Locale::English).unwrap_err();
        assert!(matches!(error, Error::Internal(_)));
        assert_eq!(error.exit_code(), 1);
        assert!(classify("https://www.hbogoasia.hk/series/sr?lang=en", Locale::English).is_err());
    }

    #[test]
    fn test_reset_folder_removes_stale_files() {
        let temp = tempfile::tempdir().unwrap();
        let folder = temp.path().join("Title.2020");
        std::fs::create_dir_all(folder.join("en")).unwrap();
        std::fs::write(folder.join("en").join("old.srt"), "old").unwrap();

        reset_folder(&folder).unwrap();

        assert!(folder.is_dir());
        assert_eq!(std::fs::read_dir(&folder).unwrap().count(), 0);
    }
}
