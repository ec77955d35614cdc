//! Titles, folder names and subtitle file names.

use std::sync::LazyLock;

use regex::Regex;

use crate::api::Metadata;
use crate::error::{Error, Result};

static SEASON_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(第\d+季\)").unwrap());
static SEASON_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"S\d+").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static DOTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{2,}").unwrap());

const ILLEGAL_CHARACTERS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Removes `(第N季)` and `S<N>` season markers from a series title.
pub fn strip_season_markers(title: &str) -> String {
    let title = SEASON_MARKER.replace_all(title, "");
    let title = SEASON_TOKEN.replace_all(title.trim(), "");
    title.trim().to_string()
}

/// The localized series title: the last title entry unless it is English, in
/// which case the first entry. Titles that sanitize to nothing count as missing.
pub fn series_title(metadata: &Metadata) -> Option<String> {
    let titles = &metadata.title_informations;
    let title = match titles.last() {
        Some(last) if last.lang != "ENG" => last,
        _ => titles.first()?,
    };
    Some(strip_season_markers(&title.name)).filter(|title| !sanitize(title).is_empty())
}

/// Chinese title (falling back to the first listed title) and release year.
pub fn movie_title(metadata: &Metadata) -> Option<(String, Option<String>)> {
    let title = metadata
        .title_in("CHN")
        .or_else(|| metadata.title_informations.first().map(|t| t.name.as_str()))?
        .trim()
        .to_string();
    let year = metadata
        .release_date
        .as_deref()
        .and_then(|date| date.get(..4))
        .filter(|year| year.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string);
    Some((title, year))
}

/// Makes a title safe to use as a file or folder name.
pub fn sanitize(name: &str) -> String {
    let cleaned = name.replace(ILLEGAL_CHARACTERS, "");
    let dotted = WHITESPACE.replace_all(cleaned.trim(), ".");
    let collapsed = DOTS.replace_all(&dotted, ".");
    collapsed.trim_matches('.').to_string()
}

pub fn season_folder_name(title: &str, season: u32) -> String {
    sanitize(&format!("{title}.S{season:02}"))
}

pub fn episode_file_name(season_folder_name: &str, episode: u32, platform: &str) -> String {
    format!("{season_folder_name}E{episode:02}.WEB-DL.{platform}.vtt")
}

/// `{title}.{year}`, or the content id when the title leaves nothing usable.
/// Never empty, so the folder is always a child of the download directory.
pub fn movie_folder_name(title: &str, year: Option<&str>, content_id: &str) -> Result<String> {
    let title = match sanitize(title) {
        title if title.is_empty() => sanitize(content_id),
        title => title,
    };
    if title.is_empty() {
        return Err(Error::Internal(format!(
            "Movie {content_id:?} has no usable folder name"
        )));
    }
    Ok(match year {
        Some(year) => format!("{title}.{year}"),
        None => title,
    })
}

pub fn movie_file_name(movie_folder_name: &str, platform: &str) -> String {
    format!("{movie_folder_name}.WEB-DL.{platform}.vtt")
}

/// Inserts `.{tag}` right before the final extension of `file_name`.
pub fn insert_language_tag(file_name: &str, tag: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => format!("{stem}.{tag}.{extension}"),
        _ => format!("{file_name}.{tag}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TitleInformation;

    fn metadata(titles: &[(&str, &str)], release_date: Option<&str>) -> Metadata {
        Metadata {
            title_informations: titles
                .iter()
                .map(|(lang, name)| TitleInformation {
                    lang: lang.to_string(),
                    name: name.to_string(),
                })
                .collect(),
            release_date: release_date.map(str::to_string),
            categories: Vec::new(),
        }
    }

    #[test]
    fn test_insert_language_tag() {
        assert_eq!(
            insert_language_tag("Title.S01E01.WEB-DL.HBOGO.vtt", "en"),
            "Title.S01E01.WEB-DL.HBOGO.en.vtt"
        );
        assert_eq!(insert_language_tag("noext", "th"), "noext.th");
    }

    #[test]
    fn test_strip_season_markers() {
        assert_eq!(strip_season_markers("Show(第2季)"), "Show");
        assert_eq!(strip_season_markers("Show S2"), "Show");
        assert_eq!(strip_season_markers("Plain"), "Plain");
    }

    #[test]
    fn test_series_title_prefers_localized_entry() {
        let localized = metadata(&[("ENG", "Euphoria"), ("CHN", "高校十八禁(第2季)")], None);
        assert_eq!(series_title(&localized).as_deref(), Some("高校十八禁"));

        let english_last = metadata(&[("CHN", "高校十八禁"), ("ENG", "Euphoria")], None);
        assert_eq!(series_title(&english_last).as_deref(), Some("高校十八禁"));

        assert_eq!(series_title(&metadata(&[], None)), None);
    }

    #[test]
    fn test_movie_title_and_year() {
        let movie = metadata(
            &[("ENG", "Dune"), ("CHN", " 沙丘 ")],
            Some("2021-10-21T00:00:00Z"),
        );
        assert_eq!(
            movie_title(&movie),
            Some(("沙丘".to_string(), Some("2021".to_string())))
        );

        let no_chinese = metadata(&[("ENG", "Dune")], None);
        assert_eq!(movie_title(&no_chinese), Some(("Dune".to_string(), None)));
    }

    #[test]
    fn test_movie_folder_without_usable_title_uses_content_id() {
        assert_eq!(movie_folder_name("???", None, "HBO123").unwrap(), "HBO123");
        assert_eq!(movie_folder_name("", Some("2021"), "HBO123").unwrap(), "HBO123.2021");
        assert!(movie_folder_name(" * ", None, "..").is_err());
    }

    #[test]
    fn test_series_title_that_sanitizes_to_nothing_is_missing() {
        assert_eq!(series_title(&metadata(&[("CHN", "???")], None)), None);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Game of Thrones"), "Game.of.Thrones");
        assert_eq!(sanitize("Who: Are *You?"), "Who.Are.You");
        assert_eq!(sanitize(" a ..b. "), "a.b");
    }

    #[test]
    fn test_folder_and_file_names() {
        let season = season_folder_name("Game of Thrones", 1);
        assert_eq!(season, "Game.of.Thrones.S01");
        assert_eq!(
            episode_file_name(&season, 3, "HBOGO"),
            "Game.of.Thrones.S01E03.WEB-DL.HBOGO.vtt"
        );

        let movie = movie_folder_name("沙丘", Some("2021"), "HBO123").unwrap();
        assert_eq!(movie, "沙丘.2021");
        assert_eq!(movie_file_name(&movie, "HBOGO"), "沙丘.2021.WEB-DL.HBOGO.vtt");
    }
}
