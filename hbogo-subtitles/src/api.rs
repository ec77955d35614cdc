//! HBO GO Asia REST endpoints and the shapes of their responses.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;
use crate::session::Session;
use crate::transport::{HttpRequest, HttpTransport, Method};

#[derive(Clone, Debug)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn geo(&self, bundle_id: &str) -> String {
        format!(
            "{}/geog?lang=zh-Hant&version=0&bundleId={bundle_id}",
            self.base
        )
    }

    pub fn login(&self) -> String {
        format!("{}/hbouser/login?lang=zh-Hant", self.base)
    }

    pub fn device(&self) -> String {
        format!("{}/hbouser/device?lang=zh-Hant", self.base)
    }

    pub fn seasons(&self, series_id: &str, territory: &str) -> String {
        format!(
            "{}/tvseason/list?parentId={series_id}&territory={territory}",
            self.base
        )
    }

    pub fn episodes(&self, season_id: &str, territory: &str) -> String {
        format!(
            "{}/tvepisode/list?parentId={season_id}&territory={territory}",
            self.base
        )
    }

    pub fn movie(&self, content_id: &str, territory: &str) -> String {
        format!(
            "{}/movie?contentId={content_id}&territory={territory}",
            self.base
        )
    }

    pub fn playback(&self, content_id: &str, session: &Session) -> String {
        format!(
            "{}/asset/playbackurl?territory={}&contentId={content_id}&sessionToken={}&channelPartnerID={}&operatorId=SIN&lang=zh-Hant",
            self.base, session.territory, session.session_token, session.channel_partner_id
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct GeoResponse {
    pub territory: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub contact_password: String,
    pub contact_user_name: String,
    pub device_details: DeviceDetails,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDetails {
    pub device_name: String,
    pub device_type: String,
    pub model_no: String,
    pub serial_no: String,
    pub app_type: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(rename = "channelPartnerID", deserialize_with = "flexible_string")]
    pub channel_partner_id: String,
    pub session_token: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub multi_profile_id: Option<serde_json::Value>,
}

impl LoginResponse {
    pub fn multi_profile_id(&self) -> Option<String> {
        match self.multi_profile_id.as_ref()? {
            serde_json::Value::String(id) => Some(id.clone()),
            serde_json::Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRemoval {
    pub session_token: String,
    pub multi_profile_id: String,
    pub serial_no: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TitleInformation {
    pub lang: String,
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Series,
    Movie,
    Other,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub title_informations: Vec<TitleInformation>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Metadata {
    /// Category of the content, taken from the first listed category.
    pub fn category(&self) -> Category {
        match self.categories.first().map(String::as_str) {
            Some("SERIES") => Category::Series,
            Some("MOVIE") => Category::Movie,
            _ => Category::Other,
        }
    }

    pub fn title_in(&self, lang: &str) -> Option<&str> {
        self.title_informations
            .iter()
            .find(|title| title.lang == lang)
            .map(|title| title.name.as_str())
    }
}

/// A media track attached to a playable item.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Material {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub href: String,
}

impl Material {
    pub fn is_subtitle(&self) -> bool {
        self.kind == "subtitle"
    }
}

/// A playable item: its metadata and its tracks.
pub trait Content {
    fn metadata(&self) -> &Metadata;
    fn materials(&self) -> &[Material];
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub content_id: String,
    #[serde(deserialize_with = "flexible_u32")]
    pub season_number: u32,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SeasonList {
    #[serde(default)]
    pub results: Vec<Season>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub content_id: String,
    #[serde(deserialize_with = "flexible_u32")]
    pub episode_number: u32,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub materials: Vec<Material>,
}

impl Content for Episode {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn materials(&self) -> &[Material] {
        &self.materials
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct EpisodeList {
    #[serde(default, deserialize_with = "flexible_u32")]
    pub total: u32,
    #[serde(default)]
    pub results: Vec<Episode>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Movie {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub materials: Vec<Material>,
}

impl Content for Movie {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn materials(&self) -> &[Material] {
        &self.materials
    }
}

#[derive(Debug, Deserialize)]
pub struct Playback {
    #[serde(rename = "playbackURL")]
    pub playback_url: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    Text(String),
}

fn flexible_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => u32::try_from(n).map_err(serde::de::Error::custom),
        NumberOrString::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn flexible_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n.to_string()),
        NumberOrString::Text(s) => Ok(s),
    }
}

/// Typed access to the endpoints over any [`HttpTransport`].
pub struct ApiClient<T> {
    transport: T,
    endpoints: Endpoints,
}

impl<T: HttpTransport> ApiClient<T> {
    pub fn new(transport: T, api_base: &str) -> Self {
        Self {
            transport,
            endpoints: Endpoints::new(api_base),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends the request and decodes a 2xx body. Failing responses are logged
    /// with their body before being returned as [`crate::Error::Transport`].
    async fn fetch<R: DeserializeOwned>(&self, request: HttpRequest) -> Result<R> {
        let url = request.url.clone();
        log::debug!("{:?} {url}", request.method);

        let response = self
            .transport
            .send(request)
            .await
            .inspect_err(|e| log::error!("{e}"))?;
        if !response.is_success() {
            log::error!("{}", response.body);
            return Err(response.into_error(&url));
        }
        response.json(&url)
    }

    pub async fn geo(&self, bundle_id: &str) -> Result<GeoResponse> {
        self.fetch(HttpRequest::get(self.endpoints.geo(bundle_id)))
            .await
    }

    pub async fn login(&self, origin: &str, request: &LoginRequest) -> Result<LoginResponse> {
        let body = serde_json::to_value(request)
            .map_err(|e| crate::Error::Internal(format!("Failed to encode login: {e}")))?;
        self.fetch(
            HttpRequest::post(self.endpoints.login(), body)
                .header("origin", origin)
                .header("referer", origin),
        )
        .await
    }

    pub async fn remove_device(&self, removal: &DeviceRemoval) -> Result<()> {
        let body = serde_json::to_value(removal)
            .map_err(|e| crate::Error::Internal(format!("Failed to encode device removal: {e}")))?;
        let url = self.endpoints.device();
        log::debug!("{:?} {url}", Method::Delete);

        let response = self
            .transport
            .send(HttpRequest::delete(url.clone(), body))
            .await?;
        if response.is_success() {
            log::debug!("{}", response.body);
            Ok(())
        } else {
            Err(response.into_error(&url))
        }
    }

    pub async fn seasons(&self, series_id: &str, territory: &str) -> Result<SeasonList> {
        self.fetch(HttpRequest::get(self.endpoints.seasons(series_id, territory)))
            .await
    }

    pub async fn episodes(&self, season_id: &str, territory: &str) -> Result<EpisodeList> {
        self.fetch(HttpRequest::get(self.endpoints.episodes(season_id, territory)))
            .await
    }

    pub async fn movie(&self, content_id: &str, territory: &str) -> Result<Movie> {
        self.fetch(HttpRequest::get(self.endpoints.movie(content_id, territory)))
            .await
    }

    pub async fn playback(&self, content_id: &str, session: &Session) -> Result<Playback> {
        self.fetch(HttpRequest::get(self.endpoints.playback(content_id, session)))
            .await
    }
}
