//! Cursor pagination over Slack list methods.
//!
//! Pages are fetched strictly one after another, each request carrying
//! the `next_cursor` of the page just received, and folded into a single
//! [`MergedResponse`].

use crate::client::{ApiClient, ApiRequest, LIMIT_PARAM};
use crate::errors::SlackResult;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Several pages folded into one response
#[derive(Debug, Clone, PartialEq)]
pub struct MergedResponse {
    body: Value,
    pages: usize,
}

impl MergedResponse {
    /// Start from the first page
    pub fn new(first_page: Value) -> Self {
        Self {
            body: first_page,
            pages: 1,
        }
    }

    /// Fold the next page in
    pub fn absorb(&mut self, page: Value) {
        merge_page(&mut self.body, page);
        self.pages += 1;
    }

    /// The merged body
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Consume into the merged body
    pub fn into_body(self) -> Value {
        self.body
    }

    /// How many pages went into this response
    pub fn pages(&self) -> usize {
        self.pages
    }
}

/// Merge `page` into `acc`.
///
/// Arrays concatenate in page order, objects merge key by key, scalars
/// keep the value already in `acc`. Keys first seen in `page` are
/// appended.
pub fn merge_page(acc: &mut Value, page: Value) {
    match (acc, page) {
        (Value::Array(existing), Value::Array(items)) => existing.extend(items),
        (Value::Object(existing), Value::Object(fields)) => {
            for (key, value) in fields {
                match existing.get_mut(&key) {
                    Some(slot) => merge_page(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        _ => {}
    }
}

/// Drives an [`ApiClient`] across all pages of a list call
#[derive(Debug, Clone)]
pub struct Paginator {
    client: Arc<ApiClient>,
}

impl Paginator {
    /// Create a paginator over `client`
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// The underlying client
    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// Fetch every page of `request` and merge them
    pub async fn fetch_all(&self, request: &ApiRequest) -> SlackResult<MergedResponse> {
        self.fetch_all_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// [`fetch_all`](Self::fetch_all) that stops between or during pages
    /// once `cancel` fires
    #[instrument(skip(self, request, cancel), fields(endpoint = %request.endpoint()))]
    pub async fn fetch_all_with_cancellation(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> SlackResult<MergedResponse> {
        let first = self.client.call_with_cancellation(request, cancel).await?;

        if request.has_param(LIMIT_PARAM) {
            debug!("Explicit limit, single page");
            return Ok(MergedResponse::new(first.into_body()));
        }

        let mut cursor = first.cursor.clone();
        let mut merged = MergedResponse::new(first.into_body());

        while let Some(next) = cursor.take() {
            debug!(page = merged.pages() + 1, "Fetching next page");
            let page = self
                .client
                .call_with_cancellation(&request.with_cursor(&next), cancel)
                .await?;
            cursor = page.cursor.clone();
            merged.absorb(page.into_body());
        }

        Ok(merged)
    }
}
