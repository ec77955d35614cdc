//! Territory lookup, login with a synthetic device, and device cleanup.

use std::io::{BufRead, Write};

use crate::api::{ApiClient, DeviceDetails, DeviceRemoval, LoginRequest};
use crate::config::Credentials;
use crate::error::{Error, Result, Unavailability};
use crate::messages::{Locale, Message};
use crate::transport::HttpTransport;

/// Profile id sent on device removal when login did not report one.
const DEFAULT_MULTI_PROFILE_ID: &str = "0";

/// An authenticated session. Owned by a single pipeline run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub territory: String,
    pub session_token: String,
    pub channel_partner_id: String,
    pub device_id: String,
    pub multi_profile_id: String,
    pub display_name: String,
}

/// Host part of the site URL, e.g. `www.hbogoasia.hk`.
pub fn site_host(site_url: &str) -> Result<String> {
    let url = reqwest::Url::parse(site_url)
        .map_err(|e| Error::Internal(format!("Invalid URL {site_url}: {e}")))?;
    url.host_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Internal(format!("URL {site_url} has no host")))
}

pub fn site_origin(site_url: &str) -> Result<String> {
    Ok(format!("https://{}", site_host(site_url)?))
}

/// Asks the user for whatever credentials are missing.
pub trait CredentialPrompt: Send + Sync {
    fn username(&self, prompt: &str) -> Result<String>;
    fn password(&self, prompt: &str) -> Result<String>;
}

/// Reads the username from stdin and the password without echo.
pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn username(&self, prompt: &str) -> Result<String> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{prompt}")
            .and_then(|_| stdout.flush())
            .map_err(|e| Error::io("Failed to write prompt", "<stdout>", e))?;

        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| Error::io("Failed to read username", "<stdin>", e))?;
        Ok(line)
    }

    fn password(&self, prompt: &str) -> Result<String> {
        rpassword::prompt_password(prompt)
            .map_err(|e| Error::io("Failed to read password", "<tty>", e))
    }
}

/// Resolves the viewer's territory from the geo service, keyed by the site's host.
pub async fn resolve_territory<T: HttpTransport>(
    api: &ApiClient<T>,
    site_url: &str,
    locale: Locale,
) -> Result<String> {
    let bundle_id = site_host(site_url)?;
    let geo = api.geo(&bundle_id).await?;

    match geo.territory {
        Some(territory) if !territory.is_empty() => {
            log::debug!("territory: {territory}");
            Ok(territory)
        }
        _ => {
            log::error!("{}", Message::OutOfService.translate(locale));
            Err(Error::Unavailable(Unavailability::OutOfService))
        }
    }
}

fn os_name() -> String {
    match std::env::consts::OS {
        "linux" => "Linux".to_string(),
        "macos" => "Darwin".to_string(),
        "windows" => "Windows".to_string(),
        other => other.to_string(),
    }
}

/// Logs in, registering a synthetic device identified by `device_id`.
///
/// Any rejection by the server is an [`Error::Auth`]; it is never retried.
pub async fn login<T: HttpTransport>(
    api: &ApiClient<T>,
    credentials: &Credentials,
    prompt: &dyn CredentialPrompt,
    site_url: &str,
    territory: &str,
    device_id: &str,
    locale: Locale,
) -> Result<Session> {
    let (username, password) = match credentials.complete() {
        Some((username, password)) => (username.to_string(), password.to_string()),
        None => (
            prompt.username(&Message::UsernamePrompt.translate(locale))?,
            prompt.password(&Message::PasswordPrompt.translate(locale))?,
        ),
    };

    let request = LoginRequest {
        contact_password: password.trim().to_string(),
        contact_user_name: username.trim().to_string(),
        device_details: DeviceDetails {
            device_name: os_name(),
            device_type: "COMP".to_string(),
            model_no: device_id.to_string(),
            serial_no: device_id.to_string(),
            app_type: "Web".to_string(),
            status: "Active".to_string(),
        },
    };

    let origin = site_origin(site_url)?;
    let response = match api.login(&origin, &request).await {
        Ok(response) => response,
        Err(Error::Transport {
            status: Some(_),
            body,
            ..
        }) => return Err(Error::Auth(body)),
        Err(e) => return Err(e),
    };

    let display_name = response.name.trim().to_string();
    log::info!(
        "{}",
        Message::Welcome {
            name: &display_name
        }
        .translate(locale)
    );

    Ok(Session {
        territory: territory.to_string(),
        multi_profile_id: response
            .multi_profile_id()
            .unwrap_or_else(|| DEFAULT_MULTI_PROFILE_ID.to_string()),
        session_token: response.session_token,
        channel_partner_id: response.channel_partner_id,
        device_id: device_id.to_string(),
        display_name,
    })
}

/// Deregisters the session's device. Failures are logged and swallowed.
pub async fn remove_device<T: HttpTransport>(api: &ApiClient<T>, session: &Session) {
    let removal = DeviceRemoval {
        session_token: session.session_token.clone(),
        multi_profile_id: session.multi_profile_id.clone(),
        serial_no: session.device_id.clone(),
    };
    if let Err(e) = api.remove_device(&removal).await {
        log::error!("Failed to remove device {}: {e}", session.device_id);
    }
}
