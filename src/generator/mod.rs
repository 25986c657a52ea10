//! Generator module - generates static HTML files using built-in Tera templates
//!
//! The listing is written as `index.html` plus one `page/<n>/index.html` per
//! "load more" step, each holding every preview loaded so far. Every post
//! gets `post/<uid>/index.html`.

use anyhow::Result;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tera::Context;
use walkdir::WalkDir;

use crate::content::{
    validate_uid, NavPost, Navigation, NavigationResolver, PaginationState, PostDetail,
    PostPreview, PostsPage, ReadingTime,
};
use crate::helpers::{date_iso, escape_html, listing_path, post_path, truncate_chars, Helpers};
use crate::i18n::I18n;
use crate::prismic::{rich_text, ContentRepository, Predicate, Query};
use crate::templates::{NavView, PostView, PreviewView, SectionView, SiteView, TemplateRenderer};
use crate::Blog;

/// Seconds between reloads of the loading placeholder
pub const LOADING_REFRESH_SECONDS: u64 = 2;

/// Characters kept in `<meta name="description">`
const DESCRIPTION_LENGTH: usize = 160;

/// Summary of one generation run
#[derive(Debug, Clone, Default)]
pub struct GenerateReport {
    /// Listing pages written (home page included)
    pub listing_pages: usize,
    /// Post pages written
    pub posts: usize,
    pub elapsed: Duration,
}

/// Static site generator using Tera templates
pub struct Generator {
    blog: Blog,
    repo: Arc<dyn ContentRepository>,
    renderer: TemplateRenderer,
    i18n: I18n,
    helpers: Helpers,
    reading: ReadingTime,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog, repo: Arc<dyn ContentRepository>) -> Result<Self> {
        let renderer = TemplateRenderer::new()?;

        let mut i18n = I18n::new(&blog.config.language);
        i18n.load_languages(blog.languages_dir())?;

        let reading = ReadingTime::new(blog.config.reading.words_per_minute)
            .ok_or_else(|| anyhow::anyhow!("reading.words_per_minute must be positive"))?;

        Ok(Self {
            blog: blog.clone(),
            repo,
            renderer,
            i18n,
            helpers: Helpers::new(blog.config.clone()),
            reading,
        })
    }

    pub fn blog(&self) -> &Blog {
        &self.blog
    }

    /// Generate the entire site
    pub async fn generate(&self) -> Result<GenerateReport> {
        let start = Instant::now();

        // Ensure public directory exists
        fs::create_dir_all(&self.blog.public_dir)?;

        // Copy static assets (logo, images, etc.)
        self.copy_static_assets()?;

        let listing_pages = self.generate_listing_pages().await?;

        let uids = self.post_uids().await?;
        for uid in &uids {
            self.generate_post(uid).await?;
        }

        let report = GenerateReport {
            listing_pages,
            posts: uids.len(),
            elapsed: start.elapsed(),
        };
        tracing::info!(
            "Generated {} listing pages and {} posts in {:.2?}",
            report.listing_pages,
            report.posts,
            report.elapsed
        );
        Ok(report)
    }

    /// Query for the first listing page
    pub fn listing_query(&self) -> Query {
        let doc_type = &self.blog.config.prismic.document_type;
        Query::new(Predicate::document_type(doc_type))
            .fetch(["title", "subtitle", "author"].map(|f| format!("{}.{}", doc_type, f)))
            .page_size(self.blog.config.prismic.page_size)
    }

    /// Generate the home page and one page per "load more" step
    ///
    /// Returns the number of listing pages written.
    pub async fn generate_listing_pages(&self) -> Result<usize> {
        let response = self.repo.query(&self.listing_query()).await?;
        let mut state = PaginationState::from(PostsPage::from_response(response));
        let mut seen = HashSet::new();
        let mut page = 1;

        self.write_listing(page, &state)?;

        while let Some(cursor) = state.next_page.clone() {
            if !seen.insert(cursor.clone()) {
                tracing::warn!("Pagination cursor repeated, stopping: {}", cursor);
                break;
            }

            let next = PostsPage::from_response(self.repo.fetch_page(&cursor).await?);
            state = state.merge(next);
            page += 1;
            self.write_listing(page, &state)?;
        }

        Ok(page)
    }

    fn write_listing(&self, page: usize, state: &PaginationState) -> Result<()> {
        let posts: Vec<PreviewView> = state
            .results
            .iter()
            .map(|p| self.preview_view(p))
            .collect();
        let load_more_url = state
            .has_more()
            .then(|| self.helpers.url_for(&listing_path(page + 1)));

        let mut context = self.create_base_context(&self.i18n.get("home"));
        context.insert("posts", &posts);
        context.insert("load_more_url", &load_more_url);

        let html = self.renderer.render("index.html", &context)?;
        let output_path = self.write_page(&listing_path(page), &html)?;
        tracing::debug!("Generated listing: {:?}", output_path);
        Ok(())
    }

    /// Every post uid, following cursors until the last page
    pub async fn post_uids(&self) -> Result<Vec<String>> {
        let prismic = &self.blog.config.prismic;
        let query = Query::new(Predicate::document_type(&prismic.document_type))
            .fetch([format!("{}.title", prismic.document_type)])
            .page_size(prismic.paths_page_size);

        let mut response = self.repo.query(&query).await?;
        let mut seen = HashSet::new();
        let mut uids = Vec::new();

        loop {
            for doc in &response.results {
                match doc.uid.as_deref().map(|uid| (uid, validate_uid(uid))) {
                    Some((uid, Ok(()))) => uids.push(uid.to_string()),
                    Some((_, Err(e))) => tracing::warn!("Skipping document {}: {}", doc.id, e),
                    None => tracing::warn!("Skipping document {} without uid", doc.id),
                }
            }

            let Some(cursor) = response.next_page.take() else {
                break;
            };
            if !seen.insert(cursor.clone()) {
                tracing::warn!("Pagination cursor repeated, stopping: {}", cursor);
                break;
            }
            response = self.repo.fetch_page(&cursor).await?;
        }

        Ok(uids)
    }

    /// Fetch one post, resolve its neighbours and write its page
    pub async fn generate_post(&self, uid: &str) -> Result<PathBuf> {
        validate_uid(uid)?;

        let prismic = &self.blog.config.prismic;
        let fetch = ["title", "banner", "author", "content"]
            .map(|f| format!("{}.{}", prismic.document_type, f));
        let doc = self
            .repo
            .get_by_uid(&prismic.document_type, uid, &fetch)
            .await?;
        let post = PostDetail::from_document(&doc)?;

        let navigation = NavigationResolver::new(
            self.repo.as_ref(),
            &prismic.document_type,
            self.blog.config.navigation,
        )
        .resolve(&post)
        .await?;

        let view = self.post_view(&post, &navigation);

        let mut context = self.create_base_context(&view.title);
        context.insert("page_description", &view.description);
        context.insert("post", &view);

        let html = self.renderer.render("post.html", &context)?;
        let output_path = self.write_page(&post_path(uid), &html)?;
        tracing::debug!("Generated post: {:?}", output_path);
        Ok(output_path)
    }

    /// Placeholder page shown while a post is generated on demand
    pub fn render_loading(&self) -> Result<String> {
        let mut context = self.create_base_context(&self.i18n.get("loading"));
        context.insert("refresh_seconds", &LOADING_REFRESH_SECONDS);
        self.renderer.render("loading.html", &context)
    }

    /// Output file for a post page
    pub fn post_output_path(&self, uid: &str) -> PathBuf {
        self.blog.public_dir.join(post_path(uid)).join("index.html")
    }

    /// Create a base context with common variables
    fn create_base_context(&self, page_title: &str) -> Context {
        let config = &self.blog.config;
        let site = SiteView {
            title: escape_html(&config.title),
            description: escape_html(&config.description),
            language: config.language.clone(),
            url: config.url.trim_end_matches('/').to_string(),
            home_url: self.helpers.url_for("/"),
            logo_url: self.helpers.url_for("/spacetraveling.svg"),
        };

        let mut context = Context::new();
        context.insert("site", &site);
        context.insert("__", &self.i18n.get_all_translations());
        context.insert("page_title", &escape_html(page_title));
        context.insert(
            "page_description",
            &escape_html(&truncate_chars(&config.description, DESCRIPTION_LENGTH, "...")),
        );
        context
    }

    fn preview_view(&self, post: &PostPreview) -> PreviewView {
        PreviewView {
            uid: post.uid.clone(),
            url: self.helpers.url_for(&post_path(&post.uid)),
            title: escape_html(&post.data.title),
            subtitle: escape_html(&post.data.subtitle),
            author: escape_html(&post.data.author),
            date: post
                .first_publication_date
                .map(|d| self.helpers.date(&d))
                .unwrap_or_default(),
        }
    }

    fn post_view(&self, post: &PostDetail, navigation: &Navigation) -> PostView {
        let nav_view = |list: &[NavPost]| {
            list.first().map(|p| NavView {
                title: escape_html(&p.data.title),
                url: self.helpers.url_for(&post_path(&p.uid)),
            })
        };

        let description = post
            .data
            .content
            .first()
            .map(|section| rich_text::as_text(&section.body))
            .unwrap_or_default();

        PostView {
            uid: post.uid.clone(),
            url: self.helpers.url_for(&post_path(&post.uid)),
            canonical_url: self.helpers.full_url_for(&post_path(&post.uid)),
            title: escape_html(&post.data.title),
            banner_url: post.data.banner.url.as_deref().map(escape_html),
            author: escape_html(&post.data.author),
            date: post
                .first_publication_date
                .map(|d| self.helpers.date(&d))
                .unwrap_or_default(),
            date_iso: post
                .first_publication_date
                .as_ref()
                .map(date_iso)
                .unwrap_or_default(),
            edited: post
                .last_publication_date
                .map(|d| self.helpers.edited(&d)),
            reading_time: self
                .i18n
                .get_count("reading_time", self.reading.estimate(&post.data.content)),
            description: escape_html(&truncate_chars(&description, DESCRIPTION_LENGTH, "...")),
            sections: post
                .data
                .content
                .iter()
                .map(|section| SectionView {
                    heading: escape_html(&section.heading),
                    body_html: rich_text::as_html(&section.body),
                })
                .collect(),
            prev: nav_view(&navigation.prev_post),
            next: nav_view(&navigation.next_post),
            comments: self.helpers.comments(),
        }
    }

    /// Write `index.html` under a site-relative directory
    fn write_page(&self, relative_dir: &str, html: &str) -> Result<PathBuf> {
        let output_path = self
            .blog
            .public_dir
            .join(relative_dir.trim_start_matches('/'))
            .join("index.html");
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
        }
        fs::write(&output_path, html)
            .map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", output_path, e))?;
        Ok(output_path)
    }

    /// Copy static assets (images, logo, etc.)
    pub fn copy_static_assets(&self) -> Result<usize> {
        let static_dir = &self.blog.static_dir;
        if !static_dir.exists() {
            return Ok(0);
        }

        let mut copied = 0;
        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(static_dir)?;
            let dest = self.blog.public_dir.join(relative);

            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::copy(path, &dest)?;
            copied += 1;
        }

        tracing::debug!("Copied {} static files", copied);
        Ok(copied)
    }
}

/// Whether an error chain means the requested post does not exist
pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<crate::error::ContentError>()
        .map(|e| e.is_not_found() || matches!(e, crate::error::ContentError::InvalidUid(_)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CommentsConfig, NavigationMode, SiteConfig};
    use crate::prismic::MemoryRepository;

    const FIXTURE: &str = r#"[
        {
            "id": "A1", "uid": "primeiro-post", "type": "posts",
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "last_publication_date": "2021-03-15T19:25:28+0000",
            "data": {
                "title": "Primeiro <post>",
                "subtitle": "Sobre o começo",
                "author": "Joseph Oliveira",
                "banner": { "url": "https://images.prismic.io/one.png" },
                "content": [
                    { "heading": "Introdução", "body": [
                        { "type": "paragraph", "text": "um dois três", "spans": [] }
                    ] }
                ]
            }
        },
        {
            "id": "B2", "uid": "segundo-post", "type": "posts",
            "first_publication_date": "2021-03-20T10:00:00+0000",
            "last_publication_date": null,
            "data": { "title": "Segundo post", "subtitle": "Meio", "author": "Danilo", "content": [] }
        },
        {
            "id": "C3", "uid": "terceiro-post", "type": "posts",
            "first_publication_date": "2021-03-25T10:00:00+0000",
            "data": { "title": "Terceiro post", "subtitle": "Fim", "author": "Danilo", "content": [] }
        }
    ]"#;

    fn blog(dir: &std::path::Path) -> Blog {
        let config = SiteConfig {
            navigation: NavigationMode::Chronological,
            comments: Some(CommentsConfig {
                repo: "owner/comments".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        Blog::with_config(dir.to_path_buf(), config)
    }

    fn generator(dir: &std::path::Path) -> Generator {
        let repo = Arc::new(MemoryRepository::from_json(FIXTURE).unwrap());
        Generator::new(&blog(dir), repo).unwrap()
    }

    fn read(path: PathBuf) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[tokio::test]
    async fn test_generate_site() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("static")).unwrap();
        fs::write(dir.path().join("static/spacetraveling.svg"), "<svg/>").unwrap();

        let report = generator(dir.path()).generate().await.unwrap();
        assert_eq!(report.listing_pages, 2);
        assert_eq!(report.posts, 3);

        let public = dir.path().join("public");
        assert!(public.join("spacetraveling.svg").exists());
        assert!(public.join("post/primeiro-post/index.html").exists());
        assert!(public.join("post/segundo-post/index.html").exists());
        assert!(public.join("post/terceiro-post/index.html").exists());

        let home = read(public.join("index.html"));
        assert_eq!(home.matches("<article>").count(), 2);
        assert!(home.contains("href=\"/page/2/\""));
        assert!(home.contains("Carregar mais posts"));

        let page2 = read(public.join("page/2/index.html"));
        assert_eq!(page2.matches("<article>").count(), 3);
        assert!(!page2.contains("Carregar mais posts"));
    }

    #[tokio::test]
    async fn test_listing_escapes_text() {
        let dir = tempfile::tempdir().unwrap();
        generator(dir.path()).generate_listing_pages().await.unwrap();

        let home = read(dir.path().join("public/index.html"));
        assert!(home.contains("Primeiro &lt;post&gt;"));
        assert!(home.contains("15 mar 2021"));
    }

    #[tokio::test]
    async fn test_post_page() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator(dir.path());

        let html = read(generator.generate_post("primeiro-post").await.unwrap());
        assert!(html.contains("<p>um dois três</p>"));
        assert!(html.contains("1 min"));
        assert!(html.contains("* editado em 15 mar 2021, às 19:25"));
        assert!(html.contains("url(https://images.prismic.io/one.png)"));
        assert!(html.contains("utteranc.es"));
        assert!(html.contains(
            r#"<link rel="canonical" href="http://localhost:4000/post/primeiro-post/">"#
        ));
        // First post: only a next link
        assert!(html.contains("href=\"/post/segundo-post/\""));
        assert!(html.contains("Próximo post"));
        assert!(!html.contains("Post anterior"));
    }

    #[tokio::test]
    async fn test_post_without_edit_date() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator(dir.path());

        let html = read(generator.generate_post("segundo-post").await.unwrap());
        assert!(!html.contains("editado em"));
        assert!(html.contains("0 min"));
        assert!(html.contains("Post anterior"));
        assert!(html.contains("Próximo post"));
    }

    #[tokio::test]
    async fn test_missing_post() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator(dir.path());

        let err = generator.generate_post("nao-existe").await.unwrap_err();
        assert!(is_not_found(&err));

        let err = generator.generate_post("../escape").await.unwrap_err();
        assert!(is_not_found(&err));
    }

    #[tokio::test]
    async fn test_post_uids_follow_cursors() {
        let dir = tempfile::tempdir().unwrap();
        let mut blog = blog(dir.path());
        blog.config.prismic.paths_page_size = 1;
        let repo = Arc::new(MemoryRepository::from_json(FIXTURE).unwrap());
        let generator = Generator::new(&blog, repo).unwrap();

        let mut uids = generator.post_uids().await.unwrap();
        uids.sort();
        assert_eq!(uids, vec!["primeiro-post", "segundo-post", "terceiro-post"]);
    }

    #[tokio::test]
    async fn test_description_is_truncated_before_escaping() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!("{}& depois", "a".repeat(158));
        let fixture = serde_json::json!([{
            "id": "A", "uid": "longo", "type": "posts",
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "data": { "title": "Longo", "content": [
                { "heading": "Início", "body": [
                    { "type": "paragraph", "text": body, "spans": [] }
                ] }
            ] }
        }]);
        let repo = Arc::new(MemoryRepository::from_json(&fixture.to_string()).unwrap());
        let generator = Generator::new(&blog(dir.path()), repo).unwrap();

        let html = read(generator.generate_post("longo").await.unwrap());
        let expected = format!(r#"<meta name="description" content="{}&amp;...">"#, "a".repeat(158));
        assert!(html.contains(&expected));
    }

    #[tokio::test]
    async fn test_generate_skips_document_without_uid() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Arc::new(
            MemoryRepository::from_json(
                r#"[
                    { "id": "A", "uid": "bom-post", "type": "posts",
                      "first_publication_date": "2021-03-15T19:25:28+0000",
                      "data": { "title": "Bom post", "content": [] } },
                    { "id": "B", "uid": null, "type": "posts",
                      "first_publication_date": "2021-03-16T19:25:28+0000",
                      "data": { "title": "Sem uid", "content": [] } }
                ]"#,
            )
            .unwrap(),
        );
        let generator = Generator::new(&blog(dir.path()), repo).unwrap();

        let report = generator.generate().await.unwrap();
        assert_eq!(report.listing_pages, 1);
        assert_eq!(report.posts, 1);

        let home = read(dir.path().join("public/index.html"));
        assert_eq!(home.matches("<article>").count(), 1);
        assert!(home.contains("Bom post"));
        assert!(!home.contains("Sem uid"));
        assert!(dir.path().join("public/post/bom-post/index.html").exists());
    }

    #[test]
    fn test_loading_page() {
        let dir = tempfile::tempdir().unwrap();
        let html = generator(dir.path()).render_loading().unwrap();
        assert!(html.contains("Carregando..."));
        assert!(html.contains("http-equiv=\"refresh\""));
    }
}
