//! Site configuration (_config.yml)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::content::DEFAULT_WORDS_PER_MINUTE;

/// Environment variable overriding `prismic.endpoint`
pub const ENDPOINT_ENV: &str = "PRISMIC_API_ENDPOINT";
/// Environment variable overriding `prismic.access_token`
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub language: String,
    pub timezone: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub public_dir: String,
    pub static_dir: String,

    // Date / Time format (date-fns tokens)
    pub date_format: String,
    pub edited_format: String,

    /// Seconds between regenerations while serving
    pub revalidate: u64,

    /// How previous/next post links are resolved
    pub navigation: NavigationMode,

    #[serde(default)]
    pub prismic: PrismicConfig,
    #[serde(default)]
    pub reading: ReadingConfig,
    pub comments: Option<CommentsConfig>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            description: String::new(),
            language: "pt-BR".to_string(),
            timezone: "UTC".to_string(),

            url: "http://localhost:4000".to_string(),
            root: "/".to_string(),

            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            date_format: "d MMM y".to_string(),
            edited_format: "d MMM y', às' HH:mm".to_string(),

            revalidate: 60 * 60 * 24,
            navigation: NavigationMode::default(),

            prismic: PrismicConfig::default(),
            reading: ReadingConfig::default(),
            comments: None,
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `PRISMIC_API_ENDPOINT` / `PRISMIC_ACCESS_TOKEN` when set
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENDPOINT_ENV).ok(),
            std::env::var(ACCESS_TOKEN_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, access_token: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            tracing::debug!("Using content endpoint from {}", ENDPOINT_ENV);
            self.prismic.endpoint = endpoint;
        }
        if let Some(token) = access_token.filter(|t| !t.trim().is_empty()) {
            self.prismic.access_token = Some(token);
        }
    }

    /// Check values that would only fail later, mid-generation
    pub fn validate(&self) -> Result<()> {
        if self.prismic.endpoint.trim().is_empty() {
            bail!(
                "prismic.endpoint is not set (configure it in _config.yml or {})",
                ENDPOINT_ENV
            );
        }
        if self.prismic.document_type.trim().is_empty() {
            bail!("prismic.document_type must not be empty");
        }
        if self.prismic.page_size == 0 || self.prismic.paths_page_size == 0 {
            bail!("prismic.page_size and prismic.paths_page_size must be at least 1");
        }
        if self.reading.words_per_minute == 0 {
            bail!("reading.words_per_minute must be at least 1");
        }
        if self.timezone.parse::<chrono_tz::Tz>().is_err() {
            bail!("Unknown timezone: {}", self.timezone);
        }
        Ok(())
    }

    /// Parsed site timezone, UTC when the name is unknown
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or(chrono_tz::UTC)
    }
}

/// Strategy for the previous/next links under a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationMode {
    /// Nearest post published before/after the current one
    #[default]
    Chronological,
    /// `after`-cursor queries ordered by publication dates
    Cursor,
}

/// Content API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrismicConfig {
    /// API entry point, e.g. `https://<repo>.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Custom type holding blog posts
    pub document_type: String,
    /// Posts per listing page / per "load more"
    pub page_size: u32,
    /// Page size used when enumerating every post to generate
    pub paths_page_size: u32,
}

impl Default for PrismicConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            document_type: "posts".to_string(),
            page_size: 2,
            paths_page_size: 100,
        }
    }
}

/// Reading time configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingConfig {
    pub words_per_minute: usize,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
        }
    }
}

/// utterances comment widget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    /// GitHub repository holding the comment issues (`owner/name`)
    pub repo: String,
    pub issue_term: String,
    pub theme: String,
    pub label: Option<String>,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            repo: String::new(),
            issue_term: "pathname".to_string(),
            theme: "github-dark".to_string(),
            label: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "spacetraveling");
        assert_eq!(config.prismic.document_type, "posts");
        assert_eq!(config.prismic.page_size, 2);
        assert_eq!(config.reading.words_per_minute, 200);
        assert_eq!(config.revalidate, 86400);
        assert_eq!(config.navigation, NavigationMode::Chronological);
        assert!(config.comments.is_none());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
timezone: America/Sao_Paulo
navigation: cursor
prismic:
  endpoint: https://blog.cdn.prismic.io/api/v2
  page_size: 5
reading:
  words_per_minute: 250
comments:
  repo: someone/blog-comments
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.navigation, NavigationMode::Cursor);
        assert_eq!(config.prismic.page_size, 5);
        assert_eq!(config.prismic.document_type, "posts");
        assert_eq!(config.reading.words_per_minute, 250);
        assert_eq!(config.tz(), chrono_tz::America::Sao_Paulo);
        let comments = config.comments.as_ref().unwrap();
        assert_eq!(comments.repo, "someone/blog-comments");
        assert_eq!(comments.issue_term, "pathname");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = SiteConfig::default();
        config.apply_overrides(
            Some("https://other.cdn.prismic.io/api/v2".to_string()),
            Some("secret".to_string()),
        );
        assert_eq!(config.prismic.endpoint, "https://other.cdn.prismic.io/api/v2");
        assert_eq!(config.prismic.access_token.as_deref(), Some("secret"));

        config.apply_overrides(Some("  ".to_string()), None);
        assert_eq!(config.prismic.endpoint, "https://other.cdn.prismic.io/api/v2");
    }

    #[test]
    fn test_validate() {
        let mut config = SiteConfig::default();
        assert!(config.validate().is_err());

        config.prismic.endpoint = "https://blog.cdn.prismic.io/api/v2".to_string();
        assert!(config.validate().is_ok());

        config.reading.words_per_minute = 0;
        assert!(config.validate().is_err());
        config.reading.words_per_minute = 200;

        config.timezone = "Mars/Olympus_Mons".to_string();
        assert!(config.validate().is_err());
    }
}
