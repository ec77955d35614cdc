//! User-facing strings in the run's display locale.

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    English,
    TraditionalChinese,
}

impl Locale {
    /// Unknown locales fall back to English.
    pub fn parse(raw: &str) -> Locale {
        match raw.trim().to_ascii_lowercase().as_str() {
            "zh-hant" | "zh-tw" | "zh-hk" | "zh" => Locale::TraditionalChinese,
            _ => Locale::English,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Locale::English => "en",
            Locale::TraditionalChinese => "zh-Hant",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message<'a> {
    UsernamePrompt,
    PasswordPrompt,
    OutOfService,
    Welcome { name: &'a str },
    AvailableLanguages { languages: &'a [String] },
    SeriesUnavailable,
    SeriesNotFound,
    SeriesTotal { title: &'a str, seasons: usize },
    SeasonTotal { season: u32, episodes: u32 },
    Finding { file_name: &'a str },
    MovieDownload { file_name: &'a str },
    Converting { folder: &'a str },
    Relocated { destination: &'a str },
}

impl Message<'_> {
    pub fn translate(&self, locale: Locale) -> String {
        match (self, locale) {
            (Message::UsernamePrompt, Locale::English) => "HBO GO Asia username: ".to_string(),
            (Message::UsernamePrompt, Locale::TraditionalChinese) => {
                "HBO GO Asia 帳號：".to_string()
            }
            (Message::PasswordPrompt, Locale::English) => "HBO GO Asia password: ".to_string(),
            (Message::PasswordPrompt, Locale::TraditionalChinese) => {
                "HBO GO Asia 密碼：".to_string()
            }
            (Message::OutOfService, Locale::English) => "Out of service!".to_string(),
            (Message::OutOfService, Locale::TraditionalChinese) => "不在服務範圍內！".to_string(),
            (Message::Welcome { name }, Locale::English) => {
                format!("Successfully logged in. Welcome {name}!")
            }
            (Message::Welcome { name }, Locale::TraditionalChinese) => {
                format!("登入成功，歡迎 {name}！")
            }
            (Message::AvailableLanguages { languages }, Locale::English) => {
                format!("Subtitle available languages: {}", languages.join(", "))
            }
            (Message::AvailableLanguages { languages }, Locale::TraditionalChinese) => {
                format!("提供的字幕語言：{}", languages.join("、"))
            }
            (Message::SeriesUnavailable, Locale::English) => {
                "The series isn't available in this region.".to_string()
            }
            (Message::SeriesUnavailable, Locale::TraditionalChinese) => {
                "此劇集在您所在的地區無法觀看。".to_string()
            }
            (Message::SeriesNotFound, Locale::English) => "Series not found!".to_string(),
            (Message::SeriesNotFound, Locale::TraditionalChinese) => "找不到劇集！".to_string(),
            (Message::SeriesTotal { title, seasons }, Locale::English) => {
                format!("{title} total: {seasons} season(s)")
            }
            (Message::SeriesTotal { title, seasons }, Locale::TraditionalChinese) => {
                format!("{title} 共有：{seasons} 季")
            }
            (Message::SeasonTotal { season, episodes }, Locale::English) => {
                format!("Season {season} total: {episodes} episode(s)")
            }
            (Message::SeasonTotal { season, episodes }, Locale::TraditionalChinese) => {
                format!("第 {season} 季 共有：{episodes} 集")
            }
            (Message::Finding { file_name }, Locale::English) => format!("Finding {file_name} ..."),
            (Message::Finding { file_name }, Locale::TraditionalChinese) => {
                format!("尋找 {file_name} ...")
            }
            (Message::MovieDownload { file_name }, Locale::English) => {
                format!("Download: {file_name}")
            }
            (Message::MovieDownload { file_name }, Locale::TraditionalChinese) => {
                format!("下載：{file_name}")
            }
            (Message::Converting { folder }, Locale::English) => {
                format!("Converting subtitles in {folder}")
            }
            (Message::Converting { folder }, Locale::TraditionalChinese) => {
                format!("轉換字幕：{folder}")
            }
            (Message::Relocated { destination }, Locale::English) => {
                format!("Moved to {destination}")
            }
            (Message::Relocated { destination }, Locale::TraditionalChinese) => {
                format!("已移動至 {destination}")
            }
        }
    }
}
