//! Tag, category and month aggregation over a loaded record set.
//!
//! Indexes are rebuilt from scratch whenever the record set changes.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::content::ContentRecord;
use super::slug::derive_slug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    pub name: String,
    pub slug: String,
    pub count: usize,
    pub slugs: BTreeSet<String>,
}

/// Terms ordered by descending count, ties by ascending name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TaxonomyIndex {
    terms: Vec<TermCount>,
}

impl TaxonomyIndex {
    /// Build an index from `(record slug, terms)` pairs.
    pub fn from_terms<'a, I, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, T)>,
        T: IntoIterator<Item = &'a str>,
    {
        let mut counts: BTreeMap<&'a str, (usize, BTreeSet<String>)> = BTreeMap::new();

        for (record_slug, terms) in entries {
            for term in terms {
                let entry = counts.entry(term).or_default();
                entry.0 += 1;
                entry.1.insert(record_slug.to_string());
            }
        }

        let mut terms: Vec<TermCount> = counts
            .into_iter()
            .map(|(name, (count, slugs))| TermCount {
                name: name.to_string(),
                slug: derive_slug(name).unwrap_or_else(|_| name.to_lowercase()),
                count,
                slugs,
            })
            .collect();
        terms.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

        Self { terms }
    }

    pub fn tags(records: &[ContentRecord]) -> Self {
        Self::from_terms(records.iter().map(|record| {
            (
                record.slug.as_str(),
                record.tags().iter().map(String::as_str),
            )
        }))
    }

    pub fn categories(records: &[ContentRecord]) -> Self {
        Self::from_terms(
            records
                .iter()
                .map(|record| (record.slug.as_str(), record.category().into_iter())),
        )
    }

    pub fn terms(&self) -> &[TermCount] {
        &self.terms
    }

    pub fn get(&self, name: &str) -> Option<&TermCount> {
        self.terms.iter().find(|term| term.name == name)
    }

    pub fn find_by_slug(&self, slug: &str) -> Option<&TermCount> {
        self.terms.iter().find(|term| term.slug == slug)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|term| term.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub key: String,
    pub label: String,
    pub count: usize,
}

/// Count dated records per calendar month, newest month first.
pub fn compute_month_counts(records: &[ContentRecord]) -> Vec<MonthCount> {
    let mut map: BTreeMap<String, (String, usize)> = BTreeMap::new();

    for date in records.iter().filter_map(|record| record.front_matter.date) {
        let key = format!("{:04}-{:02}", date.year(), u8::from(date.month()));
        let label = format!("{} {}", date.month(), date.year());
        map.entry(key)
            .and_modify(|entry| entry.1 += 1)
            .or_insert((label, 1));
    }

    map.into_iter()
        .rev()
        .map(|(key, (label, count))| MonthCount { key, label, count })
        .collect()
}
