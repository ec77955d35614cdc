//! Subtitle language tags as reported by the HBO GO Asia catalogue, and the
//! selection logic that matches them against what the user asked for.

use indexmap::IndexSet;

/// Sentinel accepted in the requested-language list meaning "every available track".
pub const ALL_LANGUAGES: &str = "all";

/// Language requested when the user does not pass one.
pub const DEFAULT_LANGUAGE: Language = Language::TraditionalChinese;

#[derive(
    Copy, Clone, Debug, serde::Serialize, serde::Deserialize, Hash, Eq, PartialEq, Ord, PartialOrd,
)]
pub enum Language {
    English,
    TraditionalChinese,
    SimplifiedChinese,
    Malay,
    Thai,
    Indonesian,
}

impl Language {
    /// Maps a platform tag (`ENG`, `CHN`, ...) to a language. Unknown tags map to `None`.
    pub fn from_platform_tag(tag: &str) -> Option<Language> {
        match tag {
            "ENG" => Some(Language::English),
            "CHN" | "CHC" => Some(Language::TraditionalChinese),
            "CHZ" => Some(Language::SimplifiedChinese),
            "MAL" => Some(Language::Malay),
            "THA" => Some(Language::Thai),
            "IND" => Some(Language::Indonesian),
            _ => None,
        }
    }

    /// The ISO-like tag used in file names and on the command line.
    pub fn iso_tag(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::TraditionalChinese => "zh-Hant",
            Language::SimplifiedChinese => "zh-Hans",
            Language::Malay => "ms",
            Language::Thai => "th",
            Language::Indonesian => "id",
        }
    }

    pub fn from_iso_tag(tag: &str) -> Option<Language> {
        LANGUAGES
            .iter()
            .copied()
            .find(|language| language.iso_tag().eq_ignore_ascii_case(tag))
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.iso_tag())
    }
}

pub const LANGUAGES: &[Language] = &[
    Language::English,
    Language::TraditionalChinese,
    Language::SimplifiedChinese,
    Language::Malay,
    Language::Thai,
    Language::Indonesian,
];

/// Maps a platform tag straight to its ISO-like tag.
pub fn language_code(platform_tag: &str) -> Option<&'static str> {
    Language::from_platform_tag(platform_tag).map(|language| language.iso_tag())
}

/// The languages a user asked for, in the order they asked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LanguageSelection {
    All,
    Only(IndexSet<String>),
}

impl LanguageSelection {
    /// Parses a comma separated argument such as `en,zh-Hant` or `all`.
    ///
    /// A missing or blank argument selects [`DEFAULT_LANGUAGE`].
    pub fn parse(raw: Option<&str>) -> Self {
        let requested = raw
            .into_iter()
            .flat_map(|raw| raw.split(','))
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect::<IndexSet<_>>();

        if requested
            .iter()
            .any(|tag| tag.eq_ignore_ascii_case(ALL_LANGUAGES))
        {
            LanguageSelection::All
        } else if requested.is_empty() {
            LanguageSelection::Only(IndexSet::from([DEFAULT_LANGUAGE.iso_tag().to_string()]))
        } else {
            LanguageSelection::Only(requested)
        }
    }

    /// Resolves the selection against the languages one content item offers.
    ///
    /// `All` keeps the availability order; otherwise the requested order is kept.
    /// An empty result means none of the requested languages exist for the item.
    pub fn effective(&self, available: &IndexSet<Language>) -> IndexSet<Language> {
        match self {
            LanguageSelection::All => available.clone(),
            LanguageSelection::Only(requested) => requested
                .iter()
                .filter_map(|tag| Language::from_iso_tag(tag))
                .filter(|language| available.contains(language))
                .collect(),
        }
    }
}

impl std::fmt::Display for LanguageSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LanguageSelection::All => write!(f, "{ALL_LANGUAGES}"),
            LanguageSelection::Only(requested) => {
                let tags = requested.iter().map(String::as_str).collect::<Vec<_>>();
                write!(f, "{}", tags.join(","))
            }
        }
    }
}

/// Collects the languages of the given platform tags, dropping unknown ones.
pub fn available_languages<'a>(platform_tags: impl IntoIterator<Item = &'a str>) -> IndexSet<Language> {
    platform_tags
        .into_iter()
        .filter_map(Language::from_platform_tag)
        .collect()
}
