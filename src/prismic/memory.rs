//! In-process content repository backed by a list of documents
//!
//! Applies predicates, orderings, `after` and paging the way the hosted
//! API does, so a fixture file can stand in for a live repository.

use serde::Deserialize;
use std::cmp::Ordering as CmpOrdering;
use std::path::Path;
use std::sync::Mutex;

use super::{
    ContentRepository, Document, Ordering, Predicate, Query, SearchResponse, DEFAULT_PAGE_SIZE,
};
use crate::error::{ContentError, ContentResult};

const CURSOR_PREFIX: &str = "memory://search/";

#[derive(Deserialize)]
#[serde(untagged)]
enum Fixture {
    Documents(Vec<Document>),
    Search { results: Vec<Document> },
}

pub struct MemoryRepository {
    documents: Vec<Document>,
    /// Queries handed out as cursors; the index is the cursor's query id
    cursors: Mutex<Vec<Query>>,
}

impl MemoryRepository {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            cursors: Mutex::new(Vec::new()),
        }
    }

    /// Parse a fixture: a bare document array or a `{"results": [...]}` object
    pub fn from_json(json: &str) -> ContentResult<Self> {
        let documents = match serde_json::from_str(json)? {
            Fixture::Search { results } => results,
            Fixture::Documents(documents) => documents,
        };
        Ok(Self::new(documents))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> ContentResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let repo = Self::from_json(&content)?;
        tracing::info!(
            "Loaded {} fixture documents from {:?}",
            repo.documents.len(),
            path.as_ref()
        );
        Ok(repo)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn run(&self, query: &Query, page: u32) -> ContentResult<SearchResponse> {
        let mut matching: Vec<&Document> = self
            .documents
            .iter()
            .filter(|doc| query.predicates.iter().all(|p| matches(doc, p)))
            .collect();

        matching.sort_by(|a, b| compare(a, b, &query.orderings));

        if let Some(after) = &query.after {
            if let Some(pos) = matching.iter().position(|doc| &doc.id == after) {
                matching.drain(..=pos);
            }
        }

        let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let total = matching.len() as u32;
        let total_pages = total.div_ceil(page_size);
        let page = page.max(1);

        let offset = (page as usize - 1).saturating_mul(page_size as usize);

        let results: Vec<Document> = matching
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .map(|doc| select_fields(doc, &query.fetch))
            .collect();

        let next_page = if page < total_pages {
            Some(self.cursor(query, page + 1)?)
        } else {
            None
        };
        let prev_page = if page > 1 {
            Some(self.cursor(query, page - 1)?)
        } else {
            None
        };

        Ok(SearchResponse {
            page,
            results_per_page: page_size,
            total_results_size: total,
            total_pages,
            next_page,
            prev_page,
            results,
        })
    }

    fn cursor(&self, query: &Query, page: u32) -> ContentResult<String> {
        let mut cursors = self
            .cursors
            .lock()
            .map_err(|_| ContentError::Malformed("cursor registry poisoned".to_string()))?;
        let id = match cursors.iter().position(|q| q == query) {
            Some(id) => id,
            None => {
                cursors.push(query.clone());
                cursors.len() - 1
            }
        };
        Ok(format!("{}{}/{}", CURSOR_PREFIX, id, page))
    }

    fn resolve_cursor(&self, next_page: &str) -> ContentResult<(Query, u32)> {
        let unknown = || ContentError::UnknownCursor(next_page.to_string());

        let (id, page) = next_page
            .strip_prefix(CURSOR_PREFIX)
            .and_then(|rest| rest.split_once('/'))
            .ok_or_else(unknown)?;
        let id: usize = id.parse().map_err(|_| unknown())?;
        let page: u32 = page.parse().map_err(|_| unknown())?;

        let cursors = self
            .cursors
            .lock()
            .map_err(|_| ContentError::Malformed("cursor registry poisoned".to_string()))?;
        let query = cursors.get(id).cloned().ok_or_else(unknown)?;
        Ok((query, page))
    }
}

#[async_trait::async_trait]
impl ContentRepository for MemoryRepository {
    async fn query(&self, query: &Query) -> ContentResult<SearchResponse> {
        self.run(query, query.page.unwrap_or(1))
    }

    async fn fetch_page(&self, next_page: &str) -> ContentResult<SearchResponse> {
        let (query, page) = self.resolve_cursor(next_page)?;
        self.run(&query, page)
    }
}

fn matches(doc: &Document, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::At { path, value } => doc.text_at(path).as_deref() == Some(value.as_str()),
        Predicate::DateBefore { path, at } => doc.date_at(path).is_some_and(|d| d < *at),
        Predicate::DateAfter { path, at } => doc.date_at(path).is_some_and(|d| d > *at),
    }
}

fn compare(a: &Document, b: &Document, orderings: &[Ordering]) -> CmpOrdering {
    for ordering in orderings {
        let ord = if ordering.field.ends_with("_publication_date") {
            a.date_at(&ordering.field).cmp(&b.date_at(&ordering.field))
        } else {
            a.text_at(&ordering.field).cmp(&b.text_at(&ordering.field))
        };
        let ord = if ordering.descending { ord.reverse() } else { ord };
        if ord != CmpOrdering::Equal {
            return ord;
        }
    }
    CmpOrdering::Equal
}

/// Keep only the `data` fields named by `fetch` (`<type>.<field>`)
fn select_fields(doc: &Document, fetch: &[String]) -> Document {
    let mut doc = doc.clone();
    if fetch.is_empty() {
        return doc;
    }
    if let serde_json::Value::Object(data) = &mut doc.data {
        let prefix = format!("{}.", doc.doc_type);
        data.retain(|field, _| {
            fetch
                .iter()
                .any(|f| f.strip_prefix(&prefix) == Some(field.as_str()))
        });
    }
    doc
}
