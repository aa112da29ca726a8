use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::front_matter::FrontMatter;
use super::headings::Heading;
use super::toc::{self, TocNode};

/// The families of content a site serves, each from its own root directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Blog,
    Docs,
    Links,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [ContentKind::Blog, ContentKind::Docs, ContentKind::Links];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Blog => "blog",
            ContentKind::Docs => "docs",
            ContentKind::Links => "links",
        }
    }

    /// Docs are read as a manual and ordered by weight; everything else is a
    /// feed, newest first.
    pub fn order(self) -> RecordOrder {
        match self {
            ContentKind::Docs => RecordOrder::Weighted,
            ContentKind::Blog | ContentKind::Links => RecordOrder::Chronological,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "blog" | "posts" => Ok(ContentKind::Blog),
            "docs" => Ok(ContentKind::Docs),
            "links" => Ok(ContentKind::Links),
            _ => Err(DomainError::unknown_kind(value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOrder {
    /// Date descending, undated last, then slug.
    Chronological,
    /// Weight ascending, unweighted last, then slug.
    Weighted,
}

/// A parsed content file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentRecord {
    pub kind: ContentKind,
    pub slug: String,
    /// Source path relative to the content root, `/`-separated.
    pub path: String,
    pub front_matter: FrontMatter,
    pub body: String,
    pub headings: Vec<Heading>,
}

impl ContentRecord {
    /// Declared title, else the first top-level heading, else the slug.
    pub fn title(&self) -> &str {
        if let Some(title) = self.front_matter.title.as_deref() {
            return title;
        }
        self.headings
            .iter()
            .find(|heading| heading.level == 1)
            .map(|heading| heading.text.as_str())
            .unwrap_or(self.slug.as_str())
    }

    pub fn is_draft(&self) -> bool {
        self.front_matter.draft
    }

    pub fn tags(&self) -> &[String] {
        &self.front_matter.tags
    }

    pub fn category(&self) -> Option<&str> {
        self.front_matter.category.as_deref()
    }

    pub fn toc(&self) -> Vec<TocNode> {
        toc::nest(&self.headings)
    }
}

pub fn sort_records(order: RecordOrder, records: &mut [ContentRecord]) {
    match order {
        RecordOrder::Chronological => records.sort_by(|a, b| {
            descending_some_first(a.front_matter.date, b.front_matter.date)
                .then_with(|| a.slug.cmp(&b.slug))
        }),
        RecordOrder::Weighted => records.sort_by(|a, b| {
            ascending_some_first(a.front_matter.weight, b.front_matter.weight)
                .then_with(|| a.slug.cmp(&b.slug))
        }),
    }
}

fn descending_some_first<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn ascending_some_first<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
