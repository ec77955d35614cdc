//! WebVTT to SubRip conversion for downloaded subtitle folders.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use subparse::timetypes::{TimePoint, TimeSpan};
use subparse::{SrtFile, SubtitleFileInterface};

use crate::dispatch::SubtitleConverter;
use crate::error::{Error, Result};
use crate::messages::{Locale, Message};

static TIMING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*((?:\d+:)?\d{1,2}:\d{2}[.,]\d{3})\s+-->\s+((?:\d+:)?\d{1,2}:\d{2}[.,]\d{3})")
        .unwrap()
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<(/?)([^>\s.]*)[^>]*>").unwrap());
static BLANK_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

/// Cues that repeat the same text within this gap are one cue split across
/// segments.
const STITCH_GAP_MS: i64 = 40;

const KEPT_TAGS: &[&str] = &["i", "b", "u"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cue {
    pub start_ms: i64,
    pub end_ms: i64,
    pub text: String,
}

fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.replace(',', ".");
    let (clock, millis) = raw.rsplit_once('.')?;
    let millis = millis.parse::<i64>().ok()?;

    let mut seconds = 0i64;
    for part in clock.split(':') {
        seconds = seconds * 60 + part.parse::<i64>().ok()?;
    }
    Some(seconds * 1000 + millis)
}

fn clean_text(raw: &str) -> String {
    let tagged = TAG.replace_all(raw, |captures: &regex::Captures| {
        let name = captures[2].to_ascii_lowercase();
        if KEPT_TAGS.contains(&name.as_str()) {
            format!("<{}{name}>", &captures[1])
        } else {
            String::new()
        }
    });
    let decoded = html_escape::decode_html_entities(&tagged);
    decoded
        .replace('\u{a0}', " ")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses the cues of a WebVTT document. Header, `NOTE`, `STYLE` and `REGION`
/// blocks are skipped, cue identifiers and settings are dropped.
pub fn parse_webvtt(content: &str) -> Vec<Cue> {
    let content = content.trim_start_matches('\u{feff}').replace("\r\n", "\n");

    let mut cues = Vec::new();
    for block in BLANK_LINE.split(&content) {
        let block = block.trim_matches('\n');
        if block.is_empty()
            || block.starts_with("WEBVTT")
            || block.starts_with("NOTE")
            || block.starts_with("STYLE")
            || block.starts_with("REGION")
        {
            continue;
        }

        let mut lines = block.lines();
        let timing = lines
            .by_ref()
            .find_map(|line| TIMING.captures(line).map(|c| (c[1].to_string(), c[2].to_string())));
        let Some((start, end)) = timing else {
            log::debug!("Skipping block without timing: {block:?}");
            continue;
        };
        let (Some(start_ms), Some(end_ms)) = (parse_timestamp(&start), parse_timestamp(&end))
        else {
            continue;
        };

        let text = clean_text(&lines.collect::<Vec<_>>().join("\n"));
        if text.is_empty() {
            continue;
        }
        cues.push(Cue {
            start_ms,
            end_ms,
            text,
        });
    }
    cues
}

/// Orders cues by start time and joins consecutive cues that repeat the same
/// text across a segment boundary.
pub fn stitch(mut cues: Vec<Cue>) -> Vec<Cue> {
    cues.sort_by_key(|cue| (cue.start_ms, cue.end_ms));

    let mut stitched: Vec<Cue> = Vec::with_capacity(cues.len());
    for cue in cues {
        match stitched.last_mut() {
            Some(previous)
                if previous.text == cue.text && cue.start_ms <= previous.end_ms + STITCH_GAP_MS =>
            {
                previous.end_ms = previous.end_ms.max(cue.end_ms);
            }
            _ => stitched.push(cue),
        }
    }
    stitched
}

pub fn to_srt(cues: &[Cue]) -> Result<String> {
    let entries = cues
        .iter()
        .map(|cue| {
            (
                TimeSpan::new(
                    TimePoint::from_msecs(cue.start_ms),
                    TimePoint::from_msecs(cue.end_ms),
                ),
                cue.text.clone(),
            )
        })
        .collect::<Vec<_>>();

    let file = SrtFile::create(entries)
        .map_err(|e| Error::Internal(format!("Failed to build SRT: {e:?}")))?;
    let data = file
        .to_data()
        .map_err(|e| Error::Internal(format!("Failed to serialize SRT: {e:?}")))?;
    String::from_utf8(data).map_err(|e| Error::Internal(format!("SRT is not UTF-8: {e}")))
}

/// Converts one `.vtt` file into a `.srt` next to it and removes the `.vtt`.
pub fn convert_file(path: &Path) -> Result<PathBuf> {
    let content =
        std::fs::read_to_string(path).map_err(|e| Error::io("Failed to read subtitle", path, e))?;
    let cues = stitch(parse_webvtt(&content));
    let srt = to_srt(&cues)?;

    let target = path.with_extension("srt");
    std::fs::write(&target, srt).map_err(|e| Error::io("Failed to write subtitle", &target, e))?;
    std::fs::remove_file(path).map_err(|e| Error::io("Failed to remove subtitle", path, e))?;
    log::debug!("{} -> {} ({} cues)", path.display(), target.display(), cues.len());
    Ok(target)
}

/// Turns every `.vtt` in a folder into `.srt`. The platform-wide pass also
/// descends into sub-folders.
pub struct VttConverter;

impl SubtitleConverter for VttConverter {
    fn convert(&self, folder: &Path, platform: Option<&str>, locale: Locale) -> Result<()> {
        if !folder.is_dir() {
            return Ok(());
        }
        log::info!(
            "{}",
            Message::Converting {
                folder: &folder.display().to_string()
            }
            .translate(locale)
        );

        let mut paths = std::fs::read_dir(folder)
            .map_err(|e| Error::io("Failed to read folder", folder, e))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .collect::<Vec<_>>();
        paths.sort();

        for path in paths {
            if path.is_dir() {
                if platform.is_some() {
                    self.convert(&path, platform, locale)?;
                }
            } else if path.extension().is_some_and(|ext| ext == "vtt") {
                convert_file(&path)?;
            }
        }
        Ok(())
    }
}
