// # Firebase Auth session
//
// Email/password sign-in against the Identity Toolkit REST API, with the
// ID token refreshed through the Secure Token API shortly before it
// expires. Tokens are only obtained when a request needs one; nothing runs
// in the background.
//
// ## Security Requirements
//
// - API key, password, and tokens NEVER appear in logs or Debug output
//
// ## API Reference
//
// - Sign in: POST `https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword?key=...`
// - Refresh: POST `https://securetoken.googleapis.com/v1/token?key=...`

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use huckleberry_core::{Error, Result};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use crate::status_error;

const SIGN_IN_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword";
const REFRESH_URL: &str = "https://securetoken.googleapis.com/v1/token";

/// Tokens are refreshed this long before they expire
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
    refresh_token: String,
    local_id: String,
    expires_in: String,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    user_id: String,
    expires_in: String,
}

struct Session {
    id_token: String,
    refresh_token: String,
    user_id: String,
    expires_at: DateTime<Utc>,
}

impl Session {
    fn new(id_token: String, refresh_token: String, user_id: String, expires_in: &str) -> Self {
        let lifetime = expires_in.parse::<i64>().unwrap_or(3600);
        Self {
            id_token,
            refresh_token,
            user_id,
            expires_at: Utc::now() + ChronoDuration::seconds(lifetime),
        }
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + ChronoDuration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Firebase email/password session
pub struct FirebaseAuth {
    /// ⚠️ NEVER log this value
    api_key: String,
    email: String,
    /// ⚠️ NEVER log this value
    password: String,
    client: reqwest::Client,
    session: Mutex<Option<Session>>,
}

impl std::fmt::Debug for FirebaseAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseAuth")
            .field("api_key", &"<REDACTED>")
            .field("email", &self.email)
            .field("password", &"<REDACTED>")
            .finish_non_exhaustive()
    }
}

impl FirebaseAuth {
    /// Create a session; no request is made until a token is needed
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            email: email.into(),
            password: password.into(),
            client,
            session: Mutex::new(None),
        }
    }

    /// Current ID token, signing in or refreshing as needed
    pub async fn id_token(&self) -> Result<String> {
        let mut session = self.session.lock().await;
        self.ensure_session(&mut session).await?;
        session
            .as_ref()
            .map(|s| s.id_token.clone())
            .ok_or_else(|| Error::auth("no Firebase session"))
    }

    /// Firebase user id of the signed-in account
    pub async fn user_id(&self) -> Result<String> {
        let mut session = self.session.lock().await;
        self.ensure_session(&mut session).await?;
        session
            .as_ref()
            .map(|s| s.user_id.clone())
            .ok_or_else(|| Error::auth("no Firebase session"))
    }

    /// Drop the cached tokens so the next request signs in again
    pub async fn invalidate(&self) {
        *self.session.lock().await = None;
    }

    /// Install a fresh session without signing in
    #[cfg(test)]
    pub(crate) async fn seed_session(&self, user_id: &str) {
        *self.session.lock().await = Some(Session::new(
            "id".into(),
            "refresh".into(),
            user_id.into(),
            "3600",
        ));
    }

    async fn ensure_session(&self, session: &mut Option<Session>) -> Result<()> {
        let now = Utc::now();
        match session.as_ref() {
            Some(current) if current.is_fresh(now) => return Ok(()),
            Some(current) => {
                let refresh_token = current.refresh_token.clone();
                match self.refresh(&refresh_token).await {
                    Ok(refreshed) => {
                        *session = Some(refreshed);
                        return Ok(());
                    }
                    Err(Error::Authentication(msg)) => {
                        tracing::warn!(reason = %msg, "token refresh rejected, signing in again");
                    }
                    Err(e) => return Err(e),
                }
            }
            None => {}
        }

        *session = Some(self.sign_in().await?);
        Ok(())
    }

    async fn sign_in(&self) -> Result<Session> {
        tracing::debug!(email = %self.email, "signing in to Firebase");

        let response = self
            .client
            .post(SIGN_IN_URL)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "email": self.email,
                "password": self.password,
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(|e| Error::http(format!("Firebase sign-in request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(auth_error(response, "sign-in").await);
        }

        let body: SignInResponse = response
            .json()
            .await
            .map_err(|e| Error::provider("firebase", format!("Failed to parse sign-in response: {}", e)))?;

        tracing::info!(user_id = %body.local_id, "signed in to Firebase");
        Ok(Session::new(
            body.id_token,
            body.refresh_token,
            body.local_id,
            &body.expires_in,
        ))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        tracing::debug!("refreshing Firebase ID token");

        let response = self
            .client
            .post(REFRESH_URL)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "grant_type": "refresh_token",
                "refresh_token": refresh_token,
            }))
            .send()
            .await
            .map_err(|e| Error::http(format!("Firebase token refresh failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(auth_error(response, "token refresh").await);
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| Error::provider("firebase", format!("Failed to parse refresh response: {}", e)))?;

        Ok(Session::new(
            body.id_token,
            body.refresh_token,
            body.user_id,
            &body.expires_in,
        ))
    }
}

/// Firebase Auth reports bad credentials as 400 with an error code
async fn auth_error(response: reqwest::Response, action: &str) -> Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());

    if status.as_u16() == 400 {
        let code = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
            .unwrap_or(body);
        return Error::auth(format!("Firebase {} rejected: {}", action, code));
    }
    status_error("firebase", status, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_freshness_margin() {
        let session = Session::new("id".into(), "refresh".into(), "uid".into(), "3600");
        let now = Utc::now();
        assert!(session.is_fresh(now));
        assert!(!session.is_fresh(now + ChronoDuration::seconds(3600 - 30)));
    }

    #[test]
    fn test_unparseable_lifetime_defaults_to_an_hour() {
        let session = Session::new("id".into(), "refresh".into(), "uid".into(), "soon");
        let remaining = session.expires_at - Utc::now();
        assert!(remaining > ChronoDuration::seconds(3500));
    }

    #[test]
    fn test_sign_in_response_shape() {
        let body: SignInResponse = serde_json::from_value(json!({
            "idToken": "id",
            "refreshToken": "refresh",
            "localId": "uid-1",
            "expiresIn": "3600",
            "email": "parent@example.com",
            "registered": true
        }))
        .unwrap();
        assert_eq!(body.local_id, "uid-1");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let auth = FirebaseAuth::new(
            reqwest::Client::new(),
            "AIza-secret",
            "parent@example.com",
            "hunter2",
        );
        let debug_str = format!("{:?}", auth);
        assert!(!debug_str.contains("AIza-secret"));
        assert!(!debug_str.contains("hunter2"));
        assert!(debug_str.contains("parent@example.com"));
    }
}
