//! Remote gateway - typed wrappers over the formatting service HTTP API

use std::path::PathBuf;
use std::time::Duration;

use reqwest::multipart;
use serde::Deserialize;

use crate::error::ApiError;
use crate::models::{GenreOption, HistoryEntry, SubscriptionTier, Tier, UploadRequest, UsageSnapshot};

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user_tier: Tier,
}

#[derive(Deserialize)]
struct StandardsResponse {
    standards: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    file_id: String,
}

#[derive(Deserialize)]
struct UpgradeResponse {
    tier: Tier,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Typed client for the backend API. One method per operation; no automatic
/// retries - every failure is surfaced to the caller as an [`ApiError`].
#[derive(Clone)]
pub struct Gateway {
    client: reqwest::Client,
    base_url: String,
}

impl Gateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Gateway {
            client: create_client(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url.trim_end_matches('/'), path)
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let resp = self
            .client
            .post(self.url("register"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    /// Password login; the token endpoint expects form-encoded credentials
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<(String, Tier), ApiError> {
        let resp = self
            .client
            .post(self.url("token"))
            .form(&[("username", email), ("password", password)])
            .send()
            .await?;
        let token: TokenResponse = check(resp).await?.json().await?;
        Ok((token.access_token, token.user_tier))
    }

    /// Exchange a provider-issued ID token for a session
    pub async fn authenticate_google(&self, id_token: &str) -> Result<(String, Tier), ApiError> {
        let resp = self
            .client
            .post(self.url("google-auth"))
            .json(&serde_json::json!({ "id_token": id_token }))
            .send()
            .await?;
        let token: TokenResponse = check(resp).await?.json().await?;
        Ok((token.access_token, token.user_tier))
    }

    /// Always accepted by the server, so account existence never leaks
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ApiError> {
        let resp = self
            .client
            .post(self.url("forgot-password"))
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ApiError> {
        let resp = self
            .client
            .post(self.url("reset-password"))
            .json(&serde_json::json!({ "token": token, "new_password": new_password }))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    pub async fn list_tiers(&self) -> Result<Vec<SubscriptionTier>, ApiError> {
        let resp = self.client.get(self.url("subscription/tiers")).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn list_genres(&self, credential: &str) -> Result<Vec<GenreOption>, ApiError> {
        let resp = self
            .client
            .get(self.url("genres"))
            .bearer_auth(credential)
            .send()
            .await?;
        Ok(check_authed(resp).await?.json().await?)
    }

    pub async fn get_usage(&self, credential: &str) -> Result<UsageSnapshot, ApiError> {
        let resp = self
            .client
            .get(self.url("usage/current"))
            .bearer_auth(credential)
            .send()
            .await?;
        Ok(check_authed(resp).await?.json().await?)
    }

    pub async fn get_history(&self, credential: &str) -> Result<Vec<HistoryEntry>, ApiError> {
        let resp = self
            .client
            .get(self.url("history"))
            .bearer_auth(credential)
            .send()
            .await?;
        Ok(check_authed(resp).await?.json().await?)
    }

    pub async fn get_standards(&self) -> Result<String, ApiError> {
        let resp = self.client.get(self.url("formatting/standards")).send().await?;
        let body: StandardsResponse = check(resp).await?.json().await?;
        Ok(body.standards)
    }

    /// Multipart upload of the manuscript with its formatting parameters
    pub async fn upload(&self, credential: &str, request: &UploadRequest) -> Result<String, ApiError> {
        let bytes = tokio::fs::read(&request.file_path)
            .await
            .map_err(|e| ApiError::Request(format!("could not read '{}': {e}", request.file_path.display())))?;

        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name(request.file_name()))
            .text("book_size", request.book_size.as_str().to_string())
            .text("font", request.font.as_str().to_string())
            .text("genre", request.genre.clone());

        let resp = self
            .client
            .post(self.url("upload"))
            .bearer_auth(credential)
            .multipart(form)
            .send()
            .await?;
        let body: UploadResponse = check_authed(resp).await?.json().await?;
        Ok(body.file_id)
    }

    /// Upgrade or downgrade the subscription. Some deployments answer with
    /// the new tier in the body, others with a bare 2xx; fall back to the
    /// requested tier id.
    pub async fn upgrade(&self, credential: &str, tier_id: &str) -> Result<Tier, ApiError> {
        let resp = self
            .client
            .put(self.url("subscription/upgrade"))
            .query(&[("tier", tier_id)])
            .bearer_auth(credential)
            .send()
            .await?;
        let text = check_authed(resp).await?.text().await?;

        if let Ok(body) = serde_json::from_str::<UpgradeResponse>(&text) {
            return Ok(body.tier);
        }
        Tier::parse(tier_id)
            .ok_or_else(|| ApiError::Request(format!("unknown tier '{tier_id}'")))
    }

    /// Fetch the formatted artifact and write it next to the working
    /// directory, named the way the server names its download
    pub async fn download(
        &self,
        credential: &str,
        file_id: &str,
        original_filename: &str,
    ) -> Result<PathBuf, ApiError> {
        let resp = self
            .client
            .get(self.url(&format!("download/{file_id}")))
            .bearer_auth(credential)
            .send()
            .await?;
        let bytes = check_authed(resp).await?.bytes().await?;

        let dest = PathBuf::from(format!("formatted_{original_filename}"));
        tokio::fs::write(&dest, &bytes)
            .await
            .map_err(|e| ApiError::Request(format!("could not write '{}': {e}", dest.display())))?;
        Ok(dest)
    }
}

/// Surface a non-2xx as the server's `detail` message verbatim, with the
/// status text as fallback. A 401 here is an ordinary rejection (e.g. wrong
/// password on the token endpoint), not a session invalidation.
async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let fallback = status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string();
    let detail = match resp.json::<ErrorBody>().await {
        Ok(body) => body.detail,
        Err(_) => fallback,
    };
    Err(ApiError::Request(detail))
}

/// Credentialed requests additionally map a 401 to a session invalidation.
/// A 403 entitlement rejection keeps its detail; the session stays valid.
async fn check_authed(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    check(resp).await
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Network("request timed out (30s)".to_string())
        } else if e.is_connect() {
            ApiError::Network(format!("connection failed: {e}"))
        } else if e.is_decode() {
            ApiError::Network(format!("unexpected response body: {e}"))
        } else {
            ApiError::Network(format!("request failed: {e}"))
        }
    }
}

/// Create an HTTP client with default configuration
pub fn create_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with(status: u16, body: &'static str) -> reqwest::Response {
        http::Response::builder()
            .status(status)
            .body(body)
            .unwrap()
            .into()
    }

    #[test]
    fn test_url_joining_strips_trailing_slash() {
        let gw = Gateway::new("http://localhost:8000/");
        assert_eq!(gw.url("usage/current"), "http://localhost:8000/api/usage/current");

        let gw = Gateway::new("https://bindery.example.com");
        assert_eq!(gw.url("token"), "https://bindery.example.com/api/token");
    }

    #[tokio::test]
    async fn test_login_rejection_keeps_server_detail() {
        // 401 from the token endpoint is a wrong-password rejection, not an
        // expired session
        let resp = response_with(401, r#"{"detail":"Incorrect email or password"}"#);
        let err = check(resp).await.unwrap_err();
        assert_eq!(err, ApiError::Request("Incorrect email or password".into()));
    }

    #[tokio::test]
    async fn test_credentialed_401_invalidates_session() {
        let resp = response_with(401, "");
        assert_eq!(check_authed(resp).await.unwrap_err(), ApiError::Unauthorized);
    }

    #[tokio::test]
    async fn test_credentialed_403_keeps_detail() {
        let resp = response_with(403, r#"{"detail":"Your tier does not include this genre"}"#);
        assert_eq!(
            check_authed(resp).await.unwrap_err(),
            ApiError::Request("Your tier does not include this genre".into())
        );
    }
}
