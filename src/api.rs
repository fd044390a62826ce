// API client module: a small blocking HTTP client for the image-hosting
// service. There is one method per remote endpoint and every method hands
// back the raw status and body; deciding what a status *means* is left to
// the `sync` module.

use crate::config::{Config, Credentials};
use crate::error::{Endpoint, Result, SyncError};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::time::Duration;

/// Content type sent with every upload, whatever the file is.
pub const UPLOAD_CONTENT_TYPE: &str = "application/octet-stream";

/// Short-lived bearer credential issued by the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        SessionToken(token.into())
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

/// Status and body of a response, kept as the server sent them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl fmt::Display for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self.body.trim();
        if body.is_empty() {
            write!(f, "<Response [{}]>", self.status.as_u16())
        } else {
            write!(f, "<Response [{}]> {}", self.status.as_u16(), body)
        }
    }
}

/// Token request payload. Field names follow the service's camelCase JSON.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

/// Expected body of a successful token response.
#[derive(Deserialize, Debug)]
struct TokenResponse {
    token: String,
}

/// Pull the session token out of a token response body.
pub fn parse_token(body: &str) -> std::result::Result<SessionToken, String> {
    let resp: TokenResponse =
        serde_json::from_str(body).map_err(|e| format!("unparseable token response: {}", e))?;
    if resp.token.is_empty() {
        return Err("token response carried an empty token".into());
    }
    Ok(SessionToken(resp.token))
}

/// The remote operations a sync run needs. `ApiClient` is the real
/// implementation; tests substitute an in-memory host.
pub trait ImageHost {
    /// POST the credentials to the token endpoint.
    fn request_token(&self, credentials: &Credentials) -> Result<RawResponse>;

    /// List a remote directory. Only the status is interesting.
    fn read_dir(&self, token: &SessionToken, dirname: &str) -> Result<StatusCode>;

    /// Create a remote directory.
    fn make_dir(&self, token: &SessionToken, dirname: &str) -> Result<StatusCode>;

    /// Upload `file` to the remote path `filename`, overwriting what is there.
    fn upload(&self, token: &SessionToken, filename: &str, file: File) -> Result<RawResponse>;
}

/// Blocking client bound to one service base URL.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url` (no trailing slash). Requests never
    /// time out on their own; a slow upload blocks until the server answers.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(SyncError::HttpClient)?;
        Ok(ApiClient {
            client,
            base_url: base_url.into(),
        })
    }

    /// Wrap an already configured `reqwest` client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        ApiClient {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.base_url.clone())
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    fn authorized(&self, req: RequestBuilder, token: &SessionToken) -> RequestBuilder {
        req.header(AUTHORIZATION, token.bearer())
    }

    /// Send a request and read the whole response. Only failures to get a
    /// response at all are errors here.
    fn send(&self, endpoint: Endpoint, req: RequestBuilder) -> Result<RawResponse> {
        let res = req
            .send()
            .map_err(|e| SyncError::transport(endpoint, e))?;
        let status = res.status();
        let body = res.text().map_err(|e| SyncError::transport(endpoint, e))?;
        tracing::debug!(%endpoint, status = status.as_u16(), "response received");
        Ok(RawResponse { status, body })
    }
}

impl ImageHost for ApiClient {
    fn request_token(&self, credentials: &Credentials) -> Result<RawResponse> {
        let payload = TokenRequest {
            client_id: &credentials.client_id,
            client_secret: credentials.client_secret.expose_secret(),
        };
        let req = self.client.post(self.url(Endpoint::Token)).json(&payload);
        self.send(Endpoint::Token, req)
    }

    fn read_dir(&self, token: &SessionToken, dirname: &str) -> Result<StatusCode> {
        let req = self
            .client
            .get(self.url(Endpoint::ReadDir))
            .query(&[("dirname", dirname)]);
        let res = self.send(Endpoint::ReadDir, self.authorized(req, token))?;
        Ok(res.status)
    }

    fn make_dir(&self, token: &SessionToken, dirname: &str) -> Result<StatusCode> {
        let req = self
            .client
            .post(self.url(Endpoint::MakeDir))
            .query(&[("dirname", dirname)]);
        let res = self.send(Endpoint::MakeDir, self.authorized(req, token))?;
        Ok(res.status)
    }

    fn upload(&self, token: &SessionToken, filename: &str, file: File) -> Result<RawResponse> {
        let req = self
            .client
            .post(self.url(Endpoint::Upload))
            .query(&[("filename", filename)])
            .header(CONTENT_TYPE, UPLOAD_CONTENT_TYPE)
            .body(file);
        self.send(Endpoint::Upload, self.authorized(req, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token() {
        let token = parse_token(r#"{"token":"abc123","expiresIn":3600}"#).unwrap();
        assert_eq!(token, SessionToken::new("abc123"));
        assert_eq!(token.bearer(), "Bearer abc123");
    }

    #[test]
    fn test_parse_token_rejects_garbage() {
        assert!(parse_token("<html>oops</html>").is_err());
        assert!(parse_token(r#"{"access_token":"abc"}"#).is_err());
        assert!(parse_token(r#"{"token":""}"#).is_err());
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = SessionToken::new("abc123");
        assert!(!format!("{:?}", token).contains("abc123"));
    }

    #[test]
    fn test_token_request_shape() {
        let payload = TokenRequest {
            client_id: "svc",
            client_secret: "shh",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({"clientId": "svc", "clientSecret": "shh"}));
    }

    #[test]
    fn test_raw_response_display() {
        let res = RawResponse {
            status: StatusCode::OK,
            body: "{\"ok\":true}\n".into(),
        };
        assert_eq!(res.to_string(), "<Response [200]> {\"ok\":true}");

        let res = RawResponse {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        };
        assert_eq!(res.to_string(), "<Response [500]>");
    }

    #[test]
    fn test_client_creation() {
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9");
        assert_eq!(client.url(Endpoint::Token), "http://127.0.0.1:9/v2/token");
    }
}
