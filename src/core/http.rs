use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

use crate::core::config::InstallerSettings;

const APP_USER_AGENT: &str = concat!("forge-installer/", env!("CARGO_PKG_VERSION"));

/// Shared client; every request made by the installer goes through it so the
/// configured timeouts apply everywhere.
pub fn build_http_client(settings: &InstallerSettings) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(settings.connect_timeout())
        .timeout(settings.http_timeout())
        .build()
}
