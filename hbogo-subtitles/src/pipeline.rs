//! One end-to-end run: territory, login, catalogue walk, device cleanup.

use crate::api::ApiClient;
use crate::catalog::{self, Navigator};
use crate::config::Config;
use crate::dispatch::{BulkDownloader, Dispatcher, SubtitleConverter};
use crate::error::{Error, Outcome, Result};
use crate::session::{self, CredentialPrompt};
use crate::transport::HttpTransport;

pub struct Pipeline<T, D, C> {
    api: ApiClient<T>,
    dispatcher: Dispatcher<D, C>,
    config: Config,
    prompt: Box<dyn CredentialPrompt>,
    device_id: String,
}

impl<T, D, C> Pipeline<T, D, C>
where
    T: HttpTransport,
    D: BulkDownloader,
    C: SubtitleConverter,
{
    /// Each pipeline registers a fresh random device.
    pub fn new(
        api: ApiClient<T>,
        dispatcher: Dispatcher<D, C>,
        config: Config,
        prompt: Box<dyn CredentialPrompt>,
    ) -> Self {
        Self {
            api,
            dispatcher,
            config,
            prompt,
            device_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self
    }

    pub fn api(&self) -> &ApiClient<T> {
        &self.api
    }

    pub fn dispatcher(&self) -> &Dispatcher<D, C> {
        &self.dispatcher
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Unavailable content is a regular [`Outcome`]; every other failure is
    /// an [`Error`].
    pub async fn run(&self) -> Result<Outcome> {
        match self.execute().await {
            Ok(assets) => Ok(Outcome::from_asset_count(assets)),
            Err(Error::Unavailable(reason)) => Ok(Outcome::Unavailable(reason)),
            Err(e) => Err(e),
        }
    }

    async fn execute(&self) -> Result<usize> {
        let locale = self.config.locale;
        let content = catalog::classify(&self.config.url, locale)?;
        log::debug!("{content:?}");

        let territory = session::resolve_territory(&self.api, &self.config.url, locale).await?;
        let session = session::login(
            &self.api,
            &self.config.credentials,
            self.prompt.as_ref(),
            &self.config.url,
            &territory,
            &self.device_id,
            locale,
        )
        .await?;

        let navigator = Navigator {
            api: &self.api,
            dispatcher: &self.dispatcher,
            config: &self.config,
            session: &session,
        };
        let result = navigator.run(&content).await;

        // The account has a device limit, so the device goes even when the walk failed.
        session::remove_device(&self.api, &session).await;
        result
    }
}
