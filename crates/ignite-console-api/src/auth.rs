// Session authentication
//
// Cookie-based sign-in/logout. The sign-in endpoint sets a session cookie
// in the client's jar; subsequent requests use that cookie automatically.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::client::ConsoleClient;
use crate::error::Error;

impl ConsoleClient {
    /// Authenticate with the backend using email/password.
    ///
    /// On success the session cookie is stored in the client's cookie jar
    /// and used for all subsequent requests.
    pub async fn signin(&self, email: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.api_url("signin")?;

        debug!("signing in at {}", url);

        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });

        let resp = self.http().post(url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("sign-in failed (HTTP {status}): {body}"),
            });
        }

        debug!("sign-in successful");
        Ok(())
    }

    /// End the current session.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.api_url("logout")?;

        debug!("logging out at {}", url);

        let _resp = self.http().post(url).send().await?;

        debug!("logout complete");
        Ok(())
    }
}
