//! HTTP client for a media network bridge.
//!
//! The bridge is a small REST service that holds the network session and
//! exposes the handful of calls Suffcal needs. All calls are form-encoded
//! `POST`s relative to the bridge base URL:
//!
//! | Path | Form fields | Answer |
//! |---|---|---|
//! | `auth/login` | `username`, `password` | session id (JSON string) |
//! | `auth/logout` | `sessionid` | ignored |
//! | `user/id_from_username` | `sessionid`, `username` | user id (JSON string or number) |
//! | `media/user_medias` | `sessionid`, `user_id`, `amount` | JSON list of posts, newest first |
//! | `photo/download` | `sessionid`, `media_pk`, `returnFile` | image bytes |
//!
//! Posts carry a `pk` (string or number) and a numeric `media_type`
//! (`1` photo, `2` video, `8` album).

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, trace};
use url::Url;

use suffcal_models::{MediaType, PhotoId, Post};

use crate::error::{AdapterError, Result};
use crate::traits::MediaSource;

/// Default bridge address.
pub const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:8000/";

#[derive(Debug, Default)]
struct Session {
    token: Option<String>,
    handle: Option<String>,
}

/// Media network client talking to a bridge service.
pub struct MediaBridgeClient {
    client: reqwest::Client,
    base: Url,
    session: RwLock<Session>,
}

impl MediaBridgeClient {
    /// Create a client for the bridge at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        // Url::join drops the last segment unless the base ends with a slash
        let base = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{}/", base_url))?
        };

        Ok(Self {
            client: reqwest::Client::new(),
            base,
            session: RwLock::new(Session::default()),
        })
    }

    /// Returns true if a session is open.
    pub fn is_logged_in(&self) -> bool {
        self.session
            .read()
            .map(|s| s.token.is_some())
            .unwrap_or(false)
    }

    fn token(&self) -> Result<String> {
        self.session
            .read()
            .ok()
            .and_then(|s| s.token.clone())
            .ok_or(AdapterError::NotLoggedIn)
    }

    fn file_prefix(&self) -> String {
        self.session
            .read()
            .ok()
            .and_then(|s| s.handle.clone())
            .unwrap_or_else(|| "photo".to_string())
    }

    async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<reqwest::Response> {
        let url = self.base.join(path)?;
        trace!(url = %url, "bridge request");

        let response = self.client.post(url).form(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Status {
                service: "media bridge",
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl MediaSource for MediaBridgeClient {
    async fn login(&self, user: &str, password: &str) -> Result<()> {
        let response = self
            .post_form("auth/login", &[("username", user), ("password", password)])
            .await?;
        let value: Value = response.json().await?;
        let token = scalar_to_string(&value)
            .ok_or_else(|| AdapterError::InvalidResponse("login returned no session id".into()))?;

        if let Ok(mut session) = self.session.write() {
            session.token = Some(token);
        }
        info!(user = %user, "logged in to media bridge");
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        let token = match self.token() {
            Ok(token) => token,
            Err(_) => return Ok(()),
        };

        let result = self.post_form("auth/logout", &[("sessionid", token.as_str())]).await;
        if let Ok(mut session) = self.session.write() {
            session.token = None;
        }
        result.map(|_| ())
    }

    async fn resolve_user_id(&self, handle: &str) -> Result<String> {
        let token = self.token()?;
        let response = self
            .post_form(
                "user/id_from_username",
                &[("sessionid", token.as_str()), ("username", handle)],
            )
            .await?;
        let value: Value = response.json().await?;
        let user_id = scalar_to_string(&value)
            .ok_or_else(|| AdapterError::InvalidResponse(format!("no user id for {}", handle)))?;

        if let Ok(mut session) = self.session.write() {
            session.handle = Some(handle.to_string());
        }
        debug!(handle = %handle, user_id = %user_id, "resolved user id");
        Ok(user_id)
    }

    async fn list_recent_media(&self, user_id: &str, limit: usize) -> Result<Vec<Post>> {
        let token = self.token()?;
        let amount = limit.to_string();
        let response = self
            .post_form(
                "media/user_medias",
                &[
                    ("sessionid", token.as_str()),
                    ("user_id", user_id),
                    ("amount", amount.as_str()),
                ],
            )
            .await?;
        let value: Value = response.json().await?;
        parse_posts(&value)
    }

    async fn download_photo(&self, post: &PhotoId, destination: &Path) -> Result<PathBuf> {
        let token = self.token()?;
        let response = self
            .post_form(
                "photo/download",
                &[
                    ("sessionid", token.as_str()),
                    ("media_pk", post.as_str()),
                    ("returnFile", "true"),
                ],
            )
            .await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        let path = destination.join(file_name_for(
            &self.file_prefix(),
            post,
            content_type.as_deref(),
        ));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| AdapterError::Io {
                path: path.clone(),
                source,
            })?;

        debug!(post = %post, path = %path.display(), bytes = bytes.len(), "downloaded photo");
        Ok(path)
    }
}

/// Reads a JSON string or number as a string.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parses the bridge's post list.
///
/// Entries without an id are rejected; entries with an unknown media type
/// are dropped since they can never match the media filter.
fn parse_posts(value: &Value) -> Result<Vec<Post>> {
    let items = value
        .as_array()
        .ok_or_else(|| AdapterError::InvalidResponse("expected a list of posts".into()))?;

    let mut posts = Vec::with_capacity(items.len());
    for item in items {
        let id = item
            .get("pk")
            .or_else(|| item.get("id"))
            .and_then(scalar_to_string)
            .ok_or_else(|| AdapterError::InvalidResponse(format!("post without id: {}", item)))?;

        let media_type = match item.get("media_type") {
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|code| u8::try_from(code).ok())
                .and_then(MediaType::from_code),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        };

        match media_type {
            Some(media_type) => posts.push(Post::new(id, media_type)),
            None => trace!(post = %id, "skipping post with unknown media type"),
        }
    }
    Ok(posts)
}

/// Builds `<prefix>_<id>.<ext>` from the response content type.
fn file_name_for(prefix: &str, id: &PhotoId, content_type: Option<&str>) -> String {
    let ext = match content_type.map(|ct| ct.split(';').next().unwrap_or(ct).trim()) {
        Some("image/png") => "png",
        Some("image/webp") => "webp",
        Some("image/heic") => "heic",
        _ => "jpg",
    };
    format!("{}_{}.{}", prefix, id, ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_posts() {
        let value = json!([
            {"pk": "3300", "media_type": 1, "code": "abc"},
            {"pk": 3299, "media_type": 2},
            {"id": "3298", "media_type": "album"},
            {"pk": "3297", "media_type": 99}
        ]);
        let posts = parse_posts(&value).unwrap();

        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0], Post::new("3300", MediaType::Photo));
        assert_eq!(posts[1], Post::new("3299", MediaType::Video));
        assert_eq!(posts[2], Post::new("3298", MediaType::Album));
    }

    #[test]
    fn test_parse_posts_requires_list() {
        assert!(parse_posts(&json!({"pk": 1})).is_err());
        assert!(parse_posts(&json!([{"media_type": 1}])).is_err());
    }

    #[test]
    fn test_file_name_for() {
        let id = PhotoId::from("42");
        assert_eq!(file_name_for("venue", &id, Some("image/png")), "venue_42.png");
        assert_eq!(
            file_name_for("venue", &id, Some("image/webp; charset=binary")),
            "venue_42.webp"
        );
        assert_eq!(file_name_for("photo", &id, None), "photo_42.jpg");
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = MediaBridgeClient::new("http://bridge:8000/api").unwrap();
        assert_eq!(
            client.base.join("auth/login").unwrap().as_str(),
            "http://bridge:8000/api/auth/login"
        );
    }

    #[tokio::test]
    async fn test_calls_require_login() {
        let client = MediaBridgeClient::new(DEFAULT_BRIDGE_URL).unwrap();
        assert!(!client.is_logged_in());

        let result = client.list_recent_media("1", 5).await;
        assert!(matches!(result, Err(AdapterError::NotLoggedIn)));

        // Logging out without a session is a no-op
        assert!(client.logout().await.is_ok());
    }
}
