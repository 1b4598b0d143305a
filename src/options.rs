use percent_encoding::percent_decode_str;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::errors::{PagerDutyError, Result};

/// Default Events API v2 endpoint
pub const DEFAULT_EVENTS_URL: &str = "https://events.pagerduty.com/v2/enqueue";

/// Default time allowed to establish a connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time allowed for the whole request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default `User-Agent` header
pub const DEFAULT_USER_AGENT: &str = concat!("pagerduty-events-rust/", env!("CARGO_PKG_VERSION"));

/// Network settings applied to the HTTP client of a [`Connection`](crate::Connection)
///
/// Every connection starts from its own copy of [`TransportOptions::default`].
/// A restricted TLS cipher list is not offered: neither reqwest TLS backend
/// allows configuring one.
#[derive(Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Verify the server certificate chain and hostname
    pub verify_tls: bool,

    /// Time allowed to establish a connection
    pub connect_timeout: Duration,

    /// Overall request timeout, including reading the response
    pub request_timeout: Duration,

    /// `User-Agent` header sent with every request
    pub user_agent: String,

    /// Proxy as `host[:port]`
    pub proxy: Option<String>,

    /// Decoded proxy credentials as `user:pass`, split on the first `:`
    pub proxy_credentials: Option<String>,

    /// Absolute path of the client certificate
    pub client_cert: Option<PathBuf>,

    /// Passphrase protecting the client certificate
    pub client_cert_passphrase: Option<String>,
}

impl fmt::Debug for TransportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportOptions")
            .field("verify_tls", &self.verify_tls)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .field("proxy", &self.proxy)
            .field("proxy_credentials", &self.proxy_credentials.as_ref().map(|_| "[REDACTED]"))
            .field("client_cert", &self.client_cert)
            .field(
                "client_cert_passphrase",
                &self.client_cert_passphrase.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

fn decode_userinfo(part: &str, proxy_url: &str) -> Result<String> {
    percent_decode_str(part)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| {
            PagerDutyError::Configuration(format!(
                "proxy URL '{proxy_url}' has invalid credentials: {e}"
            ))
        })
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            verify_tls: true,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            proxy_credentials: None,
            client_cert: None,
            client_cert_passphrase: None,
        }
    }
}

impl TransportOptions {
    /// Set whether server certificates are verified
    #[must_use]
    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Set the connect timeout
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the overall request timeout
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the `User-Agent` header
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Route requests through a proxy
    ///
    /// # Errors
    ///
    /// Returns [`PagerDutyError::Configuration`] if the URL cannot be parsed
    /// or has no host.
    pub fn with_proxy(mut self, proxy_url: &str) -> Result<Self> {
        self.apply_proxy(proxy_url)?;
        Ok(self)
    }

    /// Authenticate with a client certificate
    ///
    /// # Errors
    ///
    /// Returns [`PagerDutyError::Configuration`] if the path cannot be made
    /// absolute.
    pub fn with_client_cert(
        mut self,
        path: impl AsRef<Path>,
        passphrase: Option<&str>,
    ) -> Result<Self> {
        self.apply_client_cert(path.as_ref(), passphrase)?;
        Ok(self)
    }

    pub(crate) fn apply_proxy(&mut self, proxy_url: &str) -> Result<()> {
        let parsed = Url::parse(proxy_url).map_err(|e| {
            PagerDutyError::Configuration(format!("invalid proxy URL '{proxy_url}': {e}"))
        })?;

        let host = parsed
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| {
                PagerDutyError::Configuration(format!("proxy URL '{proxy_url}' has no host"))
            })?;

        self.proxy = Some(match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        });

        self.proxy_credentials = if parsed.username().is_empty() {
            None
        } else {
            let user = decode_userinfo(parsed.username(), proxy_url)?;
            let pass = decode_userinfo(parsed.password().unwrap_or_default(), proxy_url)?;
            Some(format!("{user}:{pass}"))
        };

        Ok(())
    }

    pub(crate) fn apply_client_cert(&mut self, path: &Path, passphrase: Option<&str>) -> Result<()> {
        let absolute = std::path::absolute(path).map_err(|e| {
            PagerDutyError::Configuration(format!(
                "cannot resolve client certificate path {}: {e}",
                path.display()
            ))
        })?;

        self.client_cert = Some(absolute);
        self.client_cert_passphrase = passphrase.map(str::to_string);
        Ok(())
    }
}
