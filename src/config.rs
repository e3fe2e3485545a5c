//! Function and server configuration
//!
//! Configuration is read once into explicit structs and passed to every
//! collaborator. Required values are checked together so a misconfigured
//! deployment reports everything it lacks in a single error.

use crate::error::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default Microsoft identity platform authority
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Default scope requested for client-credentials tokens
pub const DEFAULT_GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Default maximum size of a downloaded source document (100MB)
pub const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Default timeout applied to every outbound HTTP request
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Default port when the Functions host does not provide one
pub const DEFAULT_PORT: u16 = 3000;

const TENANT_ID: &str = "TenantId";
const CLIENT_ID: &str = "ClientId";
const CLIENT_SECRET: &str = "ClientSecret";
const DRIVE_ID: &str = "DriveId";
const AUTHORITY_HOST: &str = "AuthorityHost";
const GRAPH_SCOPE: &str = "GraphScope";
const MAX_DOWNLOAD_BYTES: &str = "MaxDownloadBytes";
const HTTP_TIMEOUT_SECS: &str = "HttpTimeoutSecs";
const TEMP_DIR: &str = "TempDir";
const CUSTOM_HANDLER_PORT: &str = "FUNCTIONS_CUSTOMHANDLER_PORT";

/// Per-invocation configuration for the split-and-upload flow
#[derive(Clone)]
pub struct FunctionConfig {
    /// Azure AD tenant of the app registration
    pub tenant_id: String,
    /// App registration client id
    pub client_id: String,
    /// App registration client secret
    pub client_secret: String,
    /// Target drive for page uploads
    pub drive_id: String,
    /// Identity platform base URL (default: login.microsoftonline.com)
    pub authority_host: String,
    /// Scope requested in the client-credentials grant
    pub scope: String,
    /// Maximum download size in bytes for the source document (default: 100MB)
    pub max_download_bytes: u64,
    /// Timeout for each outbound request (default: 60s)
    pub http_timeout: Duration,
    /// Directory for the source and page temporary files (default: system temp dir)
    pub temp_dir: PathBuf,
}

impl fmt::Debug for FunctionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("drive_id", &self.drive_id)
            .field("authority_host", &self.authority_host)
            .field("scope", &self.scope)
            .field("max_download_bytes", &self.max_download_bytes)
            .field("http_timeout", &self.http_timeout)
            .field("temp_dir", &self.temp_dir)
            .finish()
    }
}

impl FunctionConfig {
    /// Build the configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary name lookup.
    ///
    /// Empty values count as missing. Every absent required value is
    /// reported in one [`Error::MissingConfiguration`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut missing = Vec::new();
        let mut require = |name: &str| {
            get(name).unwrap_or_else(|| {
                missing.push(name.to_string());
                String::new()
            })
        };

        let tenant_id = require(TENANT_ID);
        let client_id = require(CLIENT_ID);
        let client_secret = require(CLIENT_SECRET);
        let drive_id = require(DRIVE_ID);

        if !missing.is_empty() {
            return Err(Error::MissingConfiguration { names: missing });
        }

        let authority_host = get(AUTHORITY_HOST)
            .map(|host| host.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string());
        let scope = get(GRAPH_SCOPE).unwrap_or_else(|| DEFAULT_GRAPH_SCOPE.to_string());
        let max_download_bytes =
            parse_number(MAX_DOWNLOAD_BYTES, get(MAX_DOWNLOAD_BYTES))?
                .unwrap_or(DEFAULT_MAX_DOWNLOAD_BYTES);
        let timeout_secs = parse_number(HTTP_TIMEOUT_SECS, get(HTTP_TIMEOUT_SECS))?
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        let temp_dir = get(TEMP_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        Ok(Self {
            tenant_id,
            client_id,
            client_secret,
            drive_id,
            authority_host,
            scope,
            max_download_bytes,
            http_timeout: Duration::from_secs(timeout_secs),
            temp_dir,
        })
    }
}

fn parse_number(name: &str, value: Option<String>) -> Result<Option<u64>> {
    value
        .map(|v| {
            v.trim().parse::<u64>().map_err(|_| Error::InvalidConfiguration {
                name: name.to_string(),
                value: v.clone(),
            })
        })
        .transpose()
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Process-level configuration for the custom handler
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port assigned by the Functions host
    pub port: u16,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            log_format: LogFormat::Text,
        }
    }
}

impl ServerConfig {
    /// Read `FUNCTIONS_CUSTOMHANDLER_PORT` and `LOG_FORMAT`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// An unparseable port is an error rather than a fallback to the default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup(CUSTOM_HANDLER_PORT) {
            Some(p) => p.trim().parse().map_err(|_| Error::InvalidConfiguration {
                name: CUSTOM_HANDLER_PORT.to_string(),
                value: p.clone(),
            })?,
            None => DEFAULT_PORT,
        };
        let log_format = match lookup("LOG_FORMAT") {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };
        Ok(Self { port, log_format })
    }
}
