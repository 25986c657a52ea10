//! Helper functions for templates
//!
//! URL, date and HTML helpers, plus [`Helpers`] which binds them to the
//! site configuration.

mod date;
mod html;
mod url;

use chrono::{DateTime, Utc};

pub use date::*;
pub use html::*;
pub use url::*;

use crate::config::SiteConfig;

/// Collection of helpers bound to one site configuration
#[derive(Clone)]
pub struct Helpers {
    config: SiteConfig,
    tz: chrono_tz::Tz,
}

impl Helpers {
    /// Create a new helpers instance
    pub fn new(config: SiteConfig) -> Self {
        let tz = config.tz();
        Self { config, tz }
    }

    /// Get url_for helper
    pub fn url_for(&self, path: &str) -> String {
        url_for(&self.config, path)
    }

    /// Get full_url_for helper
    pub fn full_url_for(&self, path: &str) -> String {
        full_url_for(&self.config, path)
    }

    /// Publication date in the configured `date_format`
    pub fn date(&self, date: &DateTime<Utc>) -> String {
        format_date(date, &self.config.date_format, &self.config.language, self.tz)
    }

    /// Edit timestamp in the configured `edited_format`
    pub fn edited(&self, date: &DateTime<Utc>) -> String {
        format_date(date, &self.config.edited_format, &self.config.language, self.tz)
    }

    /// Comments widget markup, when comments are configured
    pub fn comments(&self) -> Option<String> {
        self.config.comments.as_ref().and_then(comments_widget)
    }
}
