//! Previous/next post resolution
//!
//! Two single-result queries per post. In [`NavigationMode::Cursor`] they
//! use the content API's `after` cursor with publication-date orderings:
//! this approximates adjacency but does not guarantee the nearest
//! neighbour, since `after` positions the current post inside an ordering
//! that may not match the listing's. [`NavigationMode::Chronological`]
//! instead asks for the nearest post published before/after this one.

use serde::Serialize;

use super::{NavPost, PostDetail};
use crate::config::NavigationMode;
use crate::error::ContentResult;
use crate::prismic::{ContentRepository, Ordering, Predicate, Query};

const FIRST_PUBLISHED: &str = "document.first_publication_date";
const LAST_PUBLISHED: &str = "document.last_publication_date";

/// Links under a post; each list holds zero or one entry
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Navigation {
    pub prev_post: Vec<NavPost>,
    pub next_post: Vec<NavPost>,
}

pub struct NavigationResolver<'a> {
    repo: &'a dyn ContentRepository,
    doc_type: &'a str,
    mode: NavigationMode,
}

impl<'a> NavigationResolver<'a> {
    pub fn new(repo: &'a dyn ContentRepository, doc_type: &'a str, mode: NavigationMode) -> Self {
        Self {
            repo,
            doc_type,
            mode,
        }
    }

    pub async fn resolve(&self, post: &PostDetail) -> ContentResult<Navigation> {
        let Some((prev_query, next_query)) = self.queries(post) else {
            tracing::debug!("{} has no publication date, skipping navigation", post.uid);
            return Ok(Navigation::default());
        };

        let prev_post = self.first(&prev_query).await?;
        let next_post = self.first(&next_query).await?;

        Ok(Navigation {
            prev_post,
            next_post,
        })
    }

    /// Previous and next queries, `None` when the post cannot be placed
    pub fn queries(&self, post: &PostDetail) -> Option<(Query, Query)> {
        let base = Query::new(Predicate::document_type(self.doc_type))
            .fetch([format!("{}.title", self.doc_type)])
            .page_size(1);

        match self.mode {
            NavigationMode::Cursor => Some((
                base.clone()
                    .after(post.id.as_str())
                    .order_by(Ordering::asc(FIRST_PUBLISHED)),
                base.after(post.id.as_str())
                    .order_by(Ordering::desc(LAST_PUBLISHED)),
            )),
            NavigationMode::Chronological => {
                let published = post.first_publication_date?;
                Some((
                    base.clone()
                        .predicate(Predicate::date_before(FIRST_PUBLISHED, published))
                        .order_by(Ordering::desc(FIRST_PUBLISHED)),
                    base.predicate(Predicate::date_after(FIRST_PUBLISHED, published))
                        .order_by(Ordering::asc(FIRST_PUBLISHED)),
                ))
            }
        }
    }

    /// The single neighbour, dropped with a warning when it cannot be mapped
    async fn first(&self, query: &Query) -> ContentResult<Vec<NavPost>> {
        let response = self.repo.query(query).await?;
        Ok(response
            .results
            .iter()
            .take(1)
            .filter_map(|doc| match NavPost::from_document(doc) {
                Ok(nav) => Some(nav),
                Err(e) => {
                    tracing::warn!("Skipping neighbour {}: {}", doc.id, e);
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::PostData;
    use crate::prismic::{Document, MemoryRepository};
    use chrono::{TimeZone, Utc};

    fn doc(id: &str, uid: &str, day: u32) -> Document {
        Document {
            id: id.to_string(),
            uid: Some(uid.to_string()),
            doc_type: "posts".to_string(),
            first_publication_date: Some(Utc.with_ymd_and_hms(2021, 3, day, 12, 0, 0).unwrap()),
            last_publication_date: Some(Utc.with_ymd_and_hms(2021, 3, day, 13, 0, 0).unwrap()),
            data: serde_json::json!({ "title": format!("Post {}", uid) }),
        }
    }

    fn repo() -> MemoryRepository {
        // Stored out of date order on purpose.
        MemoryRepository::new(vec![
            doc("c", "third", 3),
            doc("a", "first", 1),
            doc("b", "second", 2),
        ])
    }

    fn post(id: &str, uid: &str, day: u32) -> PostDetail {
        let d = doc(id, uid, day);
        PostDetail {
            id: d.id,
            uid: uid.to_string(),
            first_publication_date: d.first_publication_date,
            last_publication_date: d.last_publication_date,
            data: PostData::default(),
        }
    }

    fn uids(list: &[NavPost]) -> Vec<&str> {
        list.iter().map(|p| p.uid.as_str()).collect()
    }

    #[tokio::test]
    async fn test_chronological_middle_post() {
        let repo = repo();
        let resolver = NavigationResolver::new(&repo, "posts", NavigationMode::Chronological);

        let nav = resolver.resolve(&post("b", "second", 2)).await.unwrap();
        assert_eq!(uids(&nav.prev_post), vec!["first"]);
        assert_eq!(uids(&nav.next_post), vec!["third"]);
        assert_eq!(nav.prev_post[0].data.title, "Post first");
    }

    #[tokio::test]
    async fn test_chronological_first_and_last() {
        let repo = repo();
        let resolver = NavigationResolver::new(&repo, "posts", NavigationMode::Chronological);

        let first = resolver.resolve(&post("a", "first", 1)).await.unwrap();
        assert!(first.prev_post.is_empty());
        assert_eq!(uids(&first.next_post), vec!["second"]);

        let last = resolver.resolve(&post("c", "third", 3)).await.unwrap();
        assert_eq!(uids(&last.prev_post), vec!["second"]);
        assert!(last.next_post.is_empty());
    }

    #[tokio::test]
    async fn test_chronological_without_date() {
        let repo = repo();
        let resolver = NavigationResolver::new(&repo, "posts", NavigationMode::Chronological);
        let mut undated = post("x", "undated", 2);
        undated.first_publication_date = None;

        assert_eq!(
            resolver.resolve(&undated).await.unwrap(),
            Navigation::default()
        );
    }

    #[test]
    fn test_cursor_query_shape() {
        let repo = repo();
        let resolver = NavigationResolver::new(&repo, "posts", NavigationMode::Cursor);
        let (prev, next) = resolver.queries(&post("b", "second", 2)).unwrap();

        assert_eq!(prev.page_size, Some(1));
        assert_eq!(prev.after.as_deref(), Some("b"));
        assert_eq!(
            prev.orderings_param().as_deref(),
            Some("[document.first_publication_date]")
        );

        assert_eq!(next.page_size, Some(1));
        assert_eq!(next.after.as_deref(), Some("b"));
        assert_eq!(
            next.orderings_param().as_deref(),
            Some("[document.last_publication_date desc]")
        );
    }

    #[tokio::test]
    async fn test_cursor_mode_is_an_approximation() {
        let repo = repo();
        let resolver = NavigationResolver::new(&repo, "posts", NavigationMode::Cursor);

        // "Previous" of the middle post is the post after it in ascending order.
        let nav = resolver.resolve(&post("b", "second", 2)).await.unwrap();
        assert_eq!(uids(&nav.prev_post), vec!["third"]);
        assert_eq!(uids(&nav.next_post), vec!["first"]);
    }

    #[tokio::test]
    async fn test_unmappable_neighbour_is_dropped() {
        let mut orphan = doc("d", "orphan", 4);
        orphan.uid = None;
        let repo = MemoryRepository::new(vec![doc("c", "third", 3), orphan]);
        let resolver = NavigationResolver::new(&repo, "posts", NavigationMode::Chronological);

        let nav = resolver.resolve(&post("c", "third", 3)).await.unwrap();
        assert!(nav.prev_post.is_empty());
        assert!(nav.next_post.is_empty());
    }
}
