//! Generate static files

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::generator::{GenerateReport, Generator};
use crate::prismic::{ContentRepository, MemoryRepository, PrismicClient};
use crate::Blog;

/// Build the content repository: a fixture file when given, else the API
pub fn repository(blog: &Blog, fixtures: Option<&Path>) -> Result<Arc<dyn ContentRepository>> {
    match fixtures {
        Some(path) => {
            let repo = MemoryRepository::load(path)
                .with_context(|| format!("Failed to load fixtures from {:?}", path))?;
            Ok(Arc::new(repo))
        }
        None => {
            blog.config.validate()?;
            let client = PrismicClient::new(&blog.config.prismic)?;
            tracing::debug!("Using content API at {}", client.endpoint());
            Ok(Arc::new(client))
        }
    }
}

/// Generate the whole site and return what was written
pub async fn generate(blog: &Blog, fixtures: Option<&Path>) -> Result<GenerateReport> {
    let repo = repository(blog, fixtures)?;
    let generator = Generator::new(blog, repo)?;
    generator.generate().await
}

/// Generate the static site
pub async fn run(blog: &Blog, fixtures: Option<&Path>) -> Result<()> {
    let report = generate(blog, fixtures).await?;
    tracing::info!(
        "Generated in {:.2}s ({} posts)",
        report.elapsed.as_secs_f64(),
        report.posts
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::fs;

    #[tokio::test]
    async fn test_generate_from_fixtures() {
        let dir = tempfile::tempdir().unwrap();
        let fixtures = dir.path().join("posts.json");
        fs::write(
            &fixtures,
            r#"{ "results": [
                { "id": "1", "uid": "um", "type": "posts",
                  "first_publication_date": "2021-03-15T19:25:28+0000",
                  "data": { "title": "Um", "subtitle": "", "author": "Ana", "content": [] } }
            ] }"#,
        )
        .unwrap();

        let blog = Blog::with_config(dir.path().to_path_buf(), SiteConfig::default());
        let report = generate(&blog, Some(&fixtures)).await.unwrap();
        assert_eq!(report.listing_pages, 1);
        assert_eq!(report.posts, 1);
        assert!(blog.public_dir.join("index.html").exists());
        assert!(blog.public_dir.join("post/um/index.html").exists());
    }

    #[test]
    fn test_api_requires_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::with_config(dir.path().to_path_buf(), SiteConfig::default());
        assert!(repository(&blog, None).is_err());
    }

    #[test]
    fn test_missing_fixture_file() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::with_config(dir.path().to_path_buf(), SiteConfig::default());
        assert!(repository(&blog, Some(&dir.path().join("missing.json"))).is_err());
    }
}
