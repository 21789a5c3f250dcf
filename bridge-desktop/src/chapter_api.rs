//! Chapter API over HTTP
//!
//! Talks to the application backend:
//! - `GET {base}/get_chapter?bookId=&chapterId=&interface=` answers
//!   `{"url": "..."}` or `{"error": "..."}`.
//! - `GET {base}/api/chapter_context?bookId=&chapterId=&interface=` answers
//!   `{"previousChapter": {...} | null, "nextChapter": {...} | null}`.
//!
//! The stock backend only serves `get_chapter`; the context route has to be
//! added server-side. Backends that expose it elsewhere can point
//! [`HttpChapterApi::with_context_path`] at their route. Hosts whose pages
//! already know the neighbours can prime the core's context cache instead
//! and never hit this endpoint.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy},
    ChapterApi, ChapterContext,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const URL_PATH: &str = "/get_chapter";
const CONTEXT_PATH: &str = "/api/chapter_context";

#[derive(Debug, Deserialize)]
struct ChapterUrlBody {
    url: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

pub struct HttpChapterApi {
    client: Arc<dyn HttpClient>,
    base_url: String,
    url_path: String,
    context_path: String,
    retry: RetryPolicy,
}

fn normalize_path(path: impl Into<String>) -> String {
    let path = path.into();
    if path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    }
}

impl HttpChapterApi {
    pub fn new(client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            url_path: URL_PATH.to_string(),
            context_path: CONTEXT_PATH.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Route answering `{"url"}` / `{"error"}`; defaults to `/get_chapter`.
    pub fn with_url_path(mut self, path: impl Into<String>) -> Self {
        self.url_path = normalize_path(path);
        self
    }

    /// Route answering the chapter's neighbours; defaults to `/api/chapter_context`.
    pub fn with_context_path(mut self, path: impl Into<String>) -> Self {
        self.context_path = normalize_path(path);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn request(&self, path: &str, book_id: &str, chapter_id: &str, interface_id: &str) -> HttpRequest {
        HttpRequest::get(format!("{}{}", self.base_url, path))
            .query("bookId", book_id)
            .query("chapterId", chapter_id)
            .query("interface", interface_id)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT)
    }

    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.client.execute_with_retry(request, self.retry.clone()).await?;
        if response.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| "request failed".to_string());
        Err(BridgeError::Http {
            status: response.status,
            message,
        })
    }
}

/// Upgrade `http://` to `https://` so the page never loads mixed content.
pub fn ensure_https(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

#[async_trait]
impl ChapterApi for HttpChapterApi {
    #[instrument(skip(self, interface_id))]
    async fn resolve_chapter_context(
        &self,
        book_id: &str,
        chapter_id: &str,
        interface_id: &str,
    ) -> Result<ChapterContext> {
        let request = self.request(&self.context_path, book_id, chapter_id, interface_id);
        let context: ChapterContext = self.fetch(request).await?.json()?;
        debug!(
            has_previous = context.previous_chapter.is_some(),
            has_next = context.next_chapter.is_some(),
            "Resolved chapter context"
        );
        Ok(context)
    }

    #[instrument(skip(self, interface_id))]
    async fn resolve_playable_url(
        &self,
        book_id: &str,
        chapter_id: &str,
        interface_id: &str,
    ) -> Result<String> {
        let request = self.request(&self.url_path, book_id, chapter_id, interface_id);
        let body: ChapterUrlBody = self.fetch(request).await?.json()?;

        match (body.url, body.error) {
            (Some(url), _) if !url.is_empty() => Ok(ensure_https(&url)),
            (_, Some(error)) => {
                warn!(error = %error, "Backend refused to resolve audio URL");
                Err(BridgeError::OperationFailed(error))
            }
            _ => Err(BridgeError::Malformed("response has neither url nor error".to_string())),
        }
    }
}
