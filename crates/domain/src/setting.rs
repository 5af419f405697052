// crates/domain/src/setting.rs

use serde::Deserialize;
use std::{
    net::{IpAddr, Ipv4Addr},
    path::PathBuf,
};
use url::{Host, Url};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// IP address the admin API binds to
    #[serde(default = "default_ip")]
    pub ip: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            ip: default_ip(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Directory holding `<key>.json` cache files; relative to the site dir
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSettings {
    /// PostgREST base URL, e.g. `https://db.example.com/rest/v1`
    pub url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub cache: Option<CacheSettings>,
    pub remote: Option<RemoteSettings>,
}

fn default_ip() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Require http/https scheme and a host.
#[tracing::instrument(skip_all)]
pub fn validate_remote_url(s: &str) -> Result<Url, String> {
    let url = Url::parse(s).map_err(|e| e.to_string())?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme: {other}")),
    }

    // Host must be localhost, an IP, or a domain with a dot.
    let ok_host = match url.host() {
        Some(Host::Domain(d)) => d == "localhost" || d.contains('.'),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => true,
        None => false,
    };
    if !ok_host {
        return Err("host must be localhost, an IP, or a domain with a suffix".into());
    }

    if url.query().is_some() {
        return Err("query string not allowed in remote URL".into());
    }

    Ok(url)
}
