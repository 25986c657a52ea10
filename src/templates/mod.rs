//! Built-in spacetraveling templates using Tera template engine
//!
//! Templates are embedded directly in the binary. View structs carry text
//! that is already HTML-escaped, see [`crate::helpers::escape_html`].

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

/// Template renderer with the embedded spacetraveling theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Views are escaped when they are built; URLs must stay untouched
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("spacetraveling/layout.html")),
            ("index.html", include_str!("spacetraveling/index.html")),
            ("post.html", include_str!("spacetraveling/post.html")),
            ("loading.html", include_str!("spacetraveling/loading.html")),
            (
                "partials/header.html",
                include_str!("spacetraveling/partials/header.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteView {
    pub title: String,
    pub description: String,
    pub language: String,
    pub url: String,
    pub home_url: String,
    pub logo_url: String,
}

/// One entry of the post listing
#[derive(Debug, Clone, Serialize)]
pub struct PreviewView {
    pub uid: String,
    pub url: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub uid: String,
    pub url: String,
    /// Absolute URL for `<link rel="canonical">`
    pub canonical_url: String,
    pub title: String,
    pub banner_url: Option<String>,
    pub author: String,
    pub date: String,
    pub date_iso: String,
    /// Present only when the post has a last publication date
    pub edited: Option<String>,
    pub reading_time: String,
    pub description: String,
    pub sections: Vec<SectionView>,
    pub prev: Option<NavView>,
    pub next: Option<NavView>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub heading: String,
    /// Rendered rich text
    pub body_html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavView {
    pub title: String,
    pub url: String,
}
