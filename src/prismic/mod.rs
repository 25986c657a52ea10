//! Content API access
//!
//! Everything that reads blog content goes through [`ContentRepository`],
//! so generation never depends on HTTP details. [`PrismicClient`] talks to
//! the hosted API; [`MemoryRepository`] serves documents from a fixture file.

mod client;
mod document;
mod memory;
mod query;
pub mod rich_text;

pub use client::PrismicClient;
pub use document::{Document, SearchResponse};
pub use memory::MemoryRepository;
pub use query::{Ordering, Predicate, Query, DEFAULT_PAGE_SIZE};
pub use rich_text::{RichText, RichTextBlock, TextField};

use crate::error::{ContentError, ContentResult};

/// The ability to search a content repository
#[async_trait::async_trait]
pub trait ContentRepository: Send + Sync {
    /// Run a search and return the first requested page
    async fn query(&self, query: &Query) -> ContentResult<SearchResponse>;

    /// Follow a `next_page` cursor from an earlier response
    async fn fetch_page(&self, next_page: &str) -> ContentResult<SearchResponse>;

    /// Fetch the single document of `doc_type` whose uid is `uid`
    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        fetch: &[String],
    ) -> ContentResult<Document> {
        let query = Query::new(Predicate::at(format!("my.{}.uid", doc_type), uid))
            .fetch(fetch.iter().cloned())
            .page_size(1);

        let response = self.query(&query).await?;
        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ContentError::NotFound {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            })
    }
}
