//! Data models for collection records and their typed representations.
//!
//! This module defines the core data structures used throughout the crate:
//! - [`Record`]: An opaque record as returned by the collection backend
//! - [`Collection`]: The four named collections the newspaper site reads
//! - [`PageRequest`] / [`PageResult`]: One offset-paginated listing round trip
//! - Typed views: [`Article`], [`Newsletter`], [`PrintIssue`], [`TeamMember`]
//!
//! Records keep the backend's camelCase field names verbatim. The typed views
//! read those fields leniently: a missing or wrongly-typed field becomes
//! `None` and never fails the whole record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// Page size used by the article, newsletter and print issue listings.
pub const LISTING_PAGE_SIZE: usize = 12;

/// Page size used by the home page's featured article list.
pub const FEATURED_PAGE_SIZE: usize = 6;

/// Page size used for small reference collections such as team members.
pub const REFERENCE_PAGE_SIZE: usize = 50;

/// A named collection in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Articles,
    Newsletters,
    #[serde(rename = "printissues")]
    PrintIssues,
    #[serde(rename = "teammembers")]
    TeamMembers,
}

impl Collection {
    /// All collections, in the order the site navigation lists them.
    pub const ALL: [Collection; 4] = [
        Collection::Articles,
        Collection::Newsletters,
        Collection::PrintIssues,
        Collection::TeamMembers,
    ];

    /// The collection's wire name, as used in backend URLs and fixture files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Articles => "articles",
            Collection::Newsletters => "newsletters",
            Collection::PrintIssues => "printissues",
            Collection::TeamMembers => "teammembers",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| StoreError::UnknownCollection {
                name: s.to_string(),
            })
    }
}

/// A single record within a collection.
///
/// The backend assigns `_id`; every other key is kept as-is in `fields`,
/// in the order the backend sent them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable, opaque identifier assigned by the backend.
    #[serde(rename = "_id")]
    pub id: String,
    /// All remaining domain fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Create an empty record with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style setter, mostly useful for fixtures and tests.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    /// Raw access to a field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// A field's value if it is a non-null string.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    /// A field's value if it is an integer (numbers with a zero fraction count).
    pub fn integer(&self, name: &str) -> Option<i64> {
        let value = self.field(name)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
    }
}

/// A request for one page of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub collection: Collection,
    /// Number of records to skip.
    pub offset: usize,
    /// Maximum number of records to return; always positive.
    pub limit: usize,
}

/// One page of records as returned by the backend.
///
/// `has_more` says whether a request at `offset + limit` would return at
/// least one record. It is not a total count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    pub items: Vec<Record>,
    #[serde(rename = "hasNext", alias = "hasMore", default)]
    pub has_more: bool,
}

/// A newspaper article (`articles` collection).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Article {
    pub id: String,
    pub title: Option<String>,
    pub full_content: Option<String>,
    pub author_name: Option<String>,
    /// Either an RFC 3339 timestamp or a `YYYY-MM-DD` date.
    pub publication_date: Option<String>,
    /// Section name such as "News" or "Arts & Leisure".
    pub section_category: Option<String>,
    pub featured_image: Option<String>,
}

impl From<&Record> for Article {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            title: owned(record, "articleTitle"),
            full_content: owned(record, "fullContent"),
            author_name: owned(record, "authorName"),
            publication_date: owned(record, "publicationDate"),
            section_category: owned(record, "sectionCategory"),
            featured_image: owned(record, "featuredImage"),
        }
    }
}

/// An emailed newsletter (`newsletters` collection).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Newsletter {
    pub id: String,
    pub title: Option<String>,
    pub date_sent: Option<String>,
    pub summary: Option<String>,
    pub link: Option<String>,
    pub thumbnail: Option<String>,
}

impl From<&Record> for Newsletter {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            title: owned(record, "newsletterTitle"),
            date_sent: owned(record, "dateSent"),
            summary: owned(record, "summary"),
            link: owned(record, "newsletterLink"),
            thumbnail: owned(record, "thumbnailImage"),
        }
    }
}

/// A scanned print edition (`printissues` collection).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrintIssue {
    pub id: String,
    pub title: Option<String>,
    pub issue_number: Option<i64>,
    pub publication_date: Option<String>,
    pub cover_image: Option<String>,
    pub pdf_link: Option<String>,
}

impl From<&Record> for PrintIssue {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            title: owned(record, "issueTitle"),
            issue_number: record.integer("issueNumber"),
            publication_date: owned(record, "publicationDate"),
            cover_image: owned(record, "coverImage"),
            pdf_link: owned(record, "pdfLink"),
        }
    }
}

/// A masthead member (`teammembers` collection).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamMember {
    pub id: String,
    pub name: Option<String>,
    pub role: Option<String>,
    pub bio: Option<String>,
    pub headshot: Option<String>,
    pub social_link: Option<String>,
}

impl From<&Record> for TeamMember {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            name: owned(record, "name"),
            role: owned(record, "role"),
            bio: owned(record, "bio"),
            headshot: owned(record, "headshot"),
            social_link: owned(record, "socialMediaLink"),
        }
    }
}

// Empty strings are treated the same as absent fields.
fn owned(record: &Record, name: &str) -> Option<String> {
    record
        .text(name)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}
