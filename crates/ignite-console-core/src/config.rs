// ── Runtime connection configuration ──
//
// These types describe *how* to reach a Web Console backend. They carry
// credential data and connection tuning, but never touch disk. The CLI
// constructs a `ConsoleConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Sign-in credentials for the backend's session auth.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for connecting to a single backend.
///
/// Built by the CLI, passed to `Console::connect` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Backend URL (e.g., `https://console.example.com`).
    pub url: Url,
    /// Credentials. `None` reuses an existing session (cookie) or skips sign-in.
    pub credentials: Option<Credentials>,
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl ConsoleConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            credentials: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }
}
