use std::collections::BTreeSet;
use std::path::PathBuf;

use language_utils::LanguageSelection;

use crate::messages::Locale;

/// Platform identifier used in file names and for the platform-wide conversion pass.
pub const PLATFORM: &str = "HBOGO";

pub const DEFAULT_API_BASE: &str = "https://api2.hbogoasia.com/v1";

/// Largest span a single `a-b` selection range may cover.
pub const MAX_RANGE_SPAN: u32 = u16::MAX as u32;

pub const USERNAME_ENV: &str = "HBOGO_USERNAME";
pub const PASSWORD_ENV: &str = "HBOGO_PASSWORD";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    /// Command line values win, then the environment (including `.env`).
    pub fn resolve(username: Option<String>, password: Option<String>) -> Self {
        Self {
            username: username.or_else(|| std::env::var(USERNAME_ENV).ok()),
            password: password.or_else(|| std::env::var(PASSWORD_ENV).ok()),
        }
    }

    pub fn complete(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some((username, password))
            }
            _ => None,
        }
    }
}

/// Everything one run needs, passed by reference through the pipeline.
#[derive(Clone, Debug)]
pub struct Config {
    pub url: String,
    pub credentials: Credentials,
    pub languages: LanguageSelection,
    /// Empty means every season.
    pub seasons: BTreeSet<u32>,
    /// Empty means every episode.
    pub episodes: BTreeSet<u32>,
    pub download_dir: PathBuf,
    pub output: Option<PathBuf>,
    pub locale: Locale,
    pub api_base: String,
}

impl Config {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            credentials: Credentials::default(),
            languages: LanguageSelection::parse(None),
            seasons: BTreeSet::new(),
            episodes: BTreeSet::new(),
            download_dir: PathBuf::from("downloads"),
            output: None,
            locale: Locale::default(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn wants_season(&self, season: u32) -> bool {
        self.seasons.is_empty() || self.seasons.contains(&season)
    }

    pub fn wants_episode(&self, episode: u32) -> bool {
        self.episodes.is_empty() || self.episodes.contains(&episode)
    }
}

/// Parses `1,3,5-7` into `{1, 3, 5, 6, 7}`.
pub fn parse_number_set(raw: &str) -> Result<BTreeSet<u32>, String> {
    let mut numbers = BTreeSet::new();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token.split_once('-') {
            Some((start, end)) => {
                let start = parse_number(start)?;
                let end = parse_number(end)?;
                if start > end {
                    return Err(format!("range {token} is reversed"));
                }
                if end - start >= MAX_RANGE_SPAN {
                    return Err(format!("range {token} spans more than {MAX_RANGE_SPAN} numbers"));
                }
                numbers.extend(start..=end);
            }
            None => {
                numbers.insert(parse_number(token)?);
            }
        }
    }
    Ok(numbers)
}

fn parse_number(raw: &str) -> Result<u32, String> {
    raw.trim()
        .parse::<u32>()
        .map_err(|e| format!("'{raw}' is not a number: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_set() {
        assert_eq!(
            parse_number_set("1, 3,5-7").unwrap(),
            BTreeSet::from([1, 3, 5, 6, 7])
        );
        assert_eq!(parse_number_set("2").unwrap(), BTreeSet::from([2]));
        assert!(parse_number_set("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_number_set_rejects_garbage() {
        assert!(parse_number_set("one").is_err());
        assert!(parse_number_set("5-3").is_err());
        assert!(parse_number_set("1-").is_err());
    }

    #[test]
    fn test_parse_number_set_rejects_huge_ranges() {
        assert!(parse_number_set("1-4000000000").is_err());
        assert_eq!(parse_number_set("3-12").unwrap().len(), 10);
        assert_eq!(
            parse_number_set(&format!("1-{MAX_RANGE_SPAN}")).unwrap().len(),
            MAX_RANGE_SPAN as usize
        );
    }

    #[test]
    fn test_empty_filters_select_everything() {
        let mut config = Config::new("https://www.hbogoasia.com/sr1");
        assert!(config.wants_season(4));
        assert!(config.wants_episode(12));

        config.seasons = BTreeSet::from([1]);
        assert!(config.wants_season(1));
        assert!(!config.wants_season(2));
    }

    #[test]
    fn test_incomplete_credentials() {
        let credentials = Credentials {
            username: Some("user".to_string()),
            password: None,
        };
        assert_eq!(credentials.complete(), None);

        let credentials = Credentials {
            username: Some("user".to_string()),
            password: Some("secret".to_string()),
        };
        assert_eq!(credentials.complete(), Some(("user", "secret")));
    }
}
