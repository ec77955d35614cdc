use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use hbogo_subtitles::api::ApiClient;
use hbogo_subtitles::config::{self, Config, Credentials};
use hbogo_subtitles::convert::VttConverter;
use hbogo_subtitles::dispatch::Dispatcher;
use hbogo_subtitles::download::{DEFAULT_CONCURRENCY, HttpDownloader};
use hbogo_subtitles::messages::Locale;
use hbogo_subtitles::pipeline::Pipeline;
use hbogo_subtitles::session::TerminalPrompt;
use hbogo_subtitles::transport::ReqwestTransport;
use hbogo_subtitles::{Outcome, Unavailability};
use language_utils::LanguageSelection;

/// Download subtitles of HBO GO Asia series and movies
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Series (`.../sr<id>`) or movie page URL
    url: String,

    /// Account email, otherwise $HBOGO_USERNAME or a prompt
    #[arg(short, long)]
    email: Option<String>,

    /// Account password, otherwise $HBOGO_PASSWORD or a prompt
    #[arg(short, long)]
    password: Option<String>,

    /// Comma separated subtitle languages (en, zh-Hant, zh-Hans, ms, th, id) or `all`
    #[arg(short = 'l', long)]
    subtitle_language: Option<String>,

    /// Seasons to download, e.g. `1,3-4`
    #[arg(short, long, value_parser = config::parse_number_set)]
    season: Option<std::collections::BTreeSet<u32>>,

    /// Episodes to download within each selected season
    #[arg(long, value_parser = config::parse_number_set)]
    episode: Option<std::collections::BTreeSet<u32>>,

    /// Move finished folders here
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Working folder for downloads
    #[arg(long, default_value = "downloads")]
    download_dir: PathBuf,

    /// Display locale for messages (en, zh-Hant)
    #[arg(long, default_value = "en")]
    locale: String,

    #[arg(long, default_value = config::DEFAULT_API_BASE)]
    api_base: String,

    /// Parallel subtitle downloads
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    #[arg(long)]
    debug: bool,
}

impl Args {
    fn into_config(self) -> Config {
        let mut config = Config::new(self.url);
        config.credentials = Credentials::resolve(self.email, self.password);
        config.languages = LanguageSelection::parse(self.subtitle_language.as_deref());
        config.seasons = self.season.unwrap_or_default();
        config.episodes = self.episode.unwrap_or_default();
        config.download_dir = self.download_dir;
        config.output = self.output;
        config.locale = Locale::parse(&self.locale);
        config.api_base = self.api_base;
        config
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let concurrency = args.concurrency;
    let config = args.into_config();
    log::debug!("languages: {}, locale: {}", config.languages, config.locale);

    let transport = ReqwestTransport::new().context("Failed to set up HTTP")?;
    let downloader = HttpDownloader::new(transport.client().clone()).with_concurrency(concurrency);
    let api = ApiClient::new(transport, &config.api_base);
    let dispatcher = Dispatcher::new(
        downloader,
        VttConverter,
        config::PLATFORM,
        config.locale,
        config.output.clone(),
    );

    let pipeline = Pipeline::new(api, dispatcher, config, Box::new(TerminalPrompt));
    match pipeline.run().await {
        Ok(Outcome::Dispatched { assets }) => {
            log::info!("Done, {assets} subtitles");
            Ok(ExitCode::SUCCESS)
        }
        Ok(Outcome::Empty) => {
            log::warn!("Nothing matched the selection");
            Ok(ExitCode::SUCCESS)
        }
        Ok(Outcome::Unavailable(reason)) => {
            if let Unavailability::Languages { available } = &reason {
                log::debug!("available: {available:?}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            log::error!("{e}");
            Ok(ExitCode::from(e.exit_code() as u8))
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let args = Args::parse();
    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
