//! Documents and search responses as returned by the content API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One document of the content repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,

    #[serde(default)]
    pub uid: Option<String>,

    #[serde(rename = "type", default)]
    pub doc_type: String,

    #[serde(default, with = "timestamp")]
    pub first_publication_date: Option<DateTime<Utc>>,

    #[serde(default, with = "timestamp")]
    pub last_publication_date: Option<DateTime<Utc>>,

    /// Custom-type fields, left untyped until mapped into a view model
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Document {
    /// Resolve a text-valued path (`document.id`, `document.type`,
    /// `my.<type>.uid`, `my.<type>.<field>`)
    pub fn text_at(&self, path: &str) -> Option<String> {
        match path {
            "document.id" => return Some(self.id.clone()),
            "document.type" => return Some(self.doc_type.clone()),
            "document.uid" => return self.uid.clone(),
            _ => {}
        }

        let rest = path.strip_prefix("my.")?;
        let (doc_type, field) = rest.split_once('.')?;
        if doc_type != self.doc_type {
            return None;
        }
        if field == "uid" {
            return self.uid.clone();
        }
        self.data.get(field)?.as_str().map(str::to_string)
    }

    /// Resolve a date-valued path
    pub fn date_at(&self, path: &str) -> Option<DateTime<Utc>> {
        match path {
            "document.first_publication_date" => self.first_publication_date,
            "document.last_publication_date" => self.last_publication_date,
            _ => None,
        }
    }
}

/// A page of search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub page: u32,

    #[serde(default)]
    pub results_per_page: u32,

    #[serde(default)]
    pub total_results_size: u32,

    #[serde(default)]
    pub total_pages: u32,

    /// Opaque cursor for the following page, `None` on the last page
    #[serde(default)]
    pub next_page: Option<String>,

    #[serde(default)]
    pub prev_page: Option<String>,

    pub results: Vec<Document>,
}

/// The API's `2021-03-25T19:25:28+0000` timestamps, RFC 3339 also accepted
pub(crate) mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_str(s, FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(s))
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.is_empty() => Ok(None),
            Some(s) => parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s))),
        }
    }
}
