//! List posts from the content repository

use anyhow::Result;
use std::path::Path;

use crate::commands::generate::repository;
use crate::content::{PaginationState, PostsPage};
use crate::generator::Generator;
use crate::helpers::Helpers;
use crate::Blog;

/// Load the first listing page, or every page when `all` is set
pub async fn load(blog: &Blog, fixtures: Option<&Path>, all: bool) -> Result<PaginationState> {
    let repo = repository(blog, fixtures)?;
    let query = Generator::new(blog, repo.clone())?.listing_query();

    let mut state = PaginationState::from(PostsPage::from_response(repo.query(&query).await?));
    while all {
        let Some(cursor) = state.next_page.clone() else {
            break;
        };
        let page = PostsPage::from_response(repo.fetch_page(&cursor).await?);
        state = state.merge(page);
    }

    Ok(state)
}

/// Print post previews
pub async fn run(blog: &Blog, fixtures: Option<&Path>, all: bool) -> Result<()> {
    let state = load(blog, fixtures, all).await?;
    let helpers = Helpers::new(blog.config.clone());

    println!("Posts ({}):", state.results.len());
    for post in &state.results {
        let date = post
            .first_publication_date
            .map(|d| helpers.date(&d))
            .unwrap_or_else(|| "-".to_string());
        println!("  {} - {} [{}]", date, post.data.title, post.uid);
    }
    if state.has_more() {
        println!("More posts available, use --all to list them");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::fs;

    fn fixtures(dir: &Path) -> std::path::PathBuf {
        let docs: Vec<serde_json::Value> = (1..=5)
            .map(|i| {
                serde_json::json!({
                    "id": format!("id{}", i),
                    "uid": format!("post-{}", i),
                    "type": "posts",
                    "data": { "title": format!("Post {}", i) }
                })
            })
            .collect();
        let path = dir.join("posts.json");
        fs::write(&path, serde_json::to_string(&docs).unwrap()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_first_page_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures(dir.path());
        let blog = Blog::with_config(dir.path().to_path_buf(), SiteConfig::default());

        let state = load(&blog, Some(&path), false).await.unwrap();
        assert_eq!(state.results.len(), 2);
        assert!(state.has_more());
    }

    #[tokio::test]
    async fn test_all_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures(dir.path());
        let blog = Blog::with_config(dir.path().to_path_buf(), SiteConfig::default());

        let state = load(&blog, Some(&path), true).await.unwrap();
        let uids: Vec<_> = state.results.iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(uids, vec!["post-1", "post-2", "post-3", "post-4", "post-5"]);
        assert!(!state.has_more());
    }
}
