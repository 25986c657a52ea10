//! Query surface of the content API: predicates, orderings and options

use chrono::{DateTime, Utc};
use std::fmt;

/// Default page size the content API applies when none is requested
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// A filter on documents, rendered in the API's predicate syntax
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `[at(path, "value")]`
    At { path: String, value: String },
    /// `[date.before(path, millis)]`, strictly before
    DateBefore { path: String, at: DateTime<Utc> },
    /// `[date.after(path, millis)]`, strictly after
    DateAfter { path: String, at: DateTime<Utc> },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::At {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn date_before(path: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::DateBefore {
            path: path.into(),
            at,
        }
    }

    pub fn date_after(path: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::DateAfter {
            path: path.into(),
            at,
        }
    }

    /// `at(document.type, "<doc_type>")`
    pub fn document_type(doc_type: &str) -> Self {
        Self::at("document.type", doc_type)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At { path, value } => {
                let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "[at({}, \"{}\")]", path, escaped)
            }
            Self::DateBefore { path, at } => {
                write!(f, "[date.before({}, {})]", path, at.timestamp_millis())
            }
            Self::DateAfter { path, at } => {
                write!(f, "[date.after({}, {})]", path, at.timestamp_millis())
            }
        }
    }
}

/// Sort key for search results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub field: String,
    pub descending: bool,
}

impl Ordering {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "{} desc", self.field)
        } else {
            write!(f, "{}", self.field)
        }
    }
}

/// A search request against the documents endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub predicates: Vec<Predicate>,
    /// Field selection as `<type>.<field>`; empty means every field
    pub fetch: Vec<String>,
    pub page_size: Option<u32>,
    pub page: Option<u32>,
    pub orderings: Vec<Ordering>,
    /// Only return documents after this document id in the result order
    pub after: Option<String>,
}

impl Query {
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicates: vec![predicate],
            ..Default::default()
        }
    }

    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn order_by(mut self, ordering: Ordering) -> Self {
        self.orderings.push(ordering);
        self
    }

    pub fn after(mut self, document_id: impl Into<String>) -> Self {
        self.after = Some(document_id.into());
        self
    }

    /// The `q` parameter: every predicate inside one outer bracket pair
    pub fn q(&self) -> String {
        let inner: String = self.predicates.iter().map(|p| p.to_string()).collect();
        format!("[{}]", inner)
    }

    /// The `orderings` parameter, if any ordering is set
    pub fn orderings_param(&self) -> Option<String> {
        if self.orderings.is_empty() {
            return None;
        }
        let keys: Vec<String> = self.orderings.iter().map(|o| o.to_string()).collect();
        Some(format!("[{}]", keys.join(",")))
    }

    /// Query-string parameters, without `ref` and `access_token`
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("q", self.q())];
        if let Some(page_size) = self.page_size {
            params.push(("pageSize", page_size.to_string()));
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(orderings) = self.orderings_param() {
            params.push(("orderings", orderings));
        }
        if let Some(after) = &self.after {
            params.push(("after", after.clone()));
        }
        if !self.fetch.is_empty() {
            params.push(("fetch", self.fetch.join(",")));
        }
        params
    }
}
