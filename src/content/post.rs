//! Post view models mapped from content documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ContentError, ContentResult};
use crate::prismic::{Document, RichText, TextField};

/// Listing entry for one post
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostPreview {
    pub uid: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub data: PreviewData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreviewData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// Raw shape of the preview fields inside `data`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PreviewFields {
    title: Option<TextField>,
    subtitle: Option<TextField>,
    author: Option<TextField>,
}

impl PostPreview {
    /// Normalize a listing document; missing text fields become empty
    pub fn from_document(doc: &Document) -> ContentResult<Self> {
        let uid = require_uid(doc)?;
        let fields: PreviewFields = parse_data(doc)?;

        Ok(Self {
            uid,
            first_publication_date: doc.first_publication_date,
            data: PreviewData {
                title: text(&fields.title),
                subtitle: text(&fields.subtitle),
                author: text(&fields.author),
            },
        })
    }
}

/// Everything a post page shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    pub id: String,
    pub uid: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub last_publication_date: Option<DateTime<Utc>>,
    pub data: PostData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostData {
    pub title: String,
    pub banner: Banner,
    pub author: String,
    pub content: Vec<ContentSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    #[serde(default)]
    pub url: Option<String>,
}

/// One heading plus its rich text body
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContentSection {
    pub heading: String,
    pub body: RichText,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DetailFields {
    title: Option<TextField>,
    banner: Option<Banner>,
    author: Option<TextField>,
    content: Option<Vec<SectionFields>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SectionFields {
    heading: Option<TextField>,
    body: Option<RichText>,
}

impl PostDetail {
    pub fn from_document(doc: &Document) -> ContentResult<Self> {
        let uid = require_uid(doc)?;
        let fields: DetailFields = parse_data(doc)?;

        Ok(Self {
            id: doc.id.clone(),
            uid,
            first_publication_date: doc.first_publication_date,
            last_publication_date: doc.last_publication_date,
            data: PostData {
                title: text(&fields.title),
                banner: fields.banner.unwrap_or_default(),
                author: text(&fields.author),
                content: fields
                    .content
                    .unwrap_or_default()
                    .into_iter()
                    .map(|section| ContentSection {
                        heading: text(&section.heading),
                        body: section.body.unwrap_or_default(),
                    })
                    .collect(),
            },
        })
    }
}

/// Minimal projection used for previous/next links
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavPost {
    pub uid: String,
    pub data: NavData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavData {
    pub title: String,
}

impl NavPost {
    pub fn from_document(doc: &Document) -> ContentResult<Self> {
        let uid = require_uid(doc)?;
        let fields: PreviewFields = parse_data(doc)?;
        Ok(Self {
            uid,
            data: NavData {
                title: text(&fields.title),
            },
        })
    }
}

/// Uids become path segments, so only slug characters are accepted
pub fn validate_uid(uid: &str) -> ContentResult<()> {
    let valid = !uid.is_empty()
        && uid
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ContentError::InvalidUid(uid.to_string()))
    }
}

/// Empty key-text fields come back as `null`
fn text(field: &Option<TextField>) -> String {
    field.as_ref().map(TextField::as_text).unwrap_or_default()
}

fn require_uid(doc: &Document) -> ContentResult<String> {
    let uid = doc
        .uid
        .clone()
        .ok_or_else(|| ContentError::Malformed(format!("document {} has no uid", doc.id)))?;
    validate_uid(&uid)?;
    Ok(uid)
}

fn parse_data<T: for<'de> Deserialize<'de> + Default>(doc: &Document) -> ContentResult<T> {
    if doc.data.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(doc.data.clone()).map_err(|e| {
        ContentError::Malformed(format!("document {} has unexpected fields: {}", doc.id, e))
    })
}
