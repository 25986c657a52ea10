//! Incremental "load more" pagination over post previews

use serde::Serialize;

use super::PostPreview;
use crate::prismic::SearchResponse;

/// One fetched page of previews plus the cursor that follows it
#[derive(Debug, Clone, PartialEq)]
pub struct PostsPage {
    pub results: Vec<PostPreview>,
    pub next_page: Option<String>,
}

impl PostsPage {
    /// Map the documents of a search response through the preview mapper
    ///
    /// Documents that cannot be mapped (no uid, invalid uid, unexpected
    /// fields) are skipped with a warning.
    pub fn from_response(response: SearchResponse) -> Self {
        let results = response
            .results
            .iter()
            .filter_map(|doc| match PostPreview::from_document(doc) {
                Ok(preview) => Some(preview),
                Err(e) => {
                    tracing::warn!("Skipping document {}: {}", doc.id, e);
                    None
                }
            })
            .collect();

        Self {
            results,
            next_page: response.next_page,
        }
    }
}

/// Previews loaded so far and the cursor for the next page
///
/// `next_page` is `None` exactly when no further pages exist. `results`
/// keeps fetch order, which is the content API's order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PaginationState {
    pub results: Vec<PostPreview>,
    pub next_page: Option<String>,
}

impl From<PostsPage> for PaginationState {
    fn from(page: PostsPage) -> Self {
        Self {
            results: page.results,
            next_page: page.next_page,
        }
    }
}

impl PaginationState {
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// Append a newly fetched page and take over its cursor
    ///
    /// Results are concatenated as-is: no de-duplication, no re-sorting.
    ///
    /// # Precondition
    ///
    /// `self.next_page` must be set; merging into an exhausted state means
    /// the caller fetched a page that was never advertised.
    pub fn merge(mut self, page: PostsPage) -> Self {
        debug_assert!(
            self.next_page.is_some(),
            "merge called on an exhausted pagination state"
        );
        self.results.extend(page.results);
        self.next_page = page.next_page;
        self
    }
}
