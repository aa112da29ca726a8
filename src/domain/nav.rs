//! Sidebar tree for documentation, derived from slug hierarchy.

use std::collections::BTreeMap;

use serde::Serialize;

use super::content::ContentRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavNode {
    pub segment: String,
    /// Set when a record lives at this exact path.
    pub slug: Option<String>,
    pub title: String,
    pub weight: Option<i64>,
    pub children: Vec<NavNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NavTree {
    pub roots: Vec<NavNode>,
}

#[derive(Default)]
struct Branch {
    slug: Option<String>,
    title: Option<String>,
    weight: Option<i64>,
    children: BTreeMap<String, Branch>,
}

impl NavTree {
    pub fn build(records: &[ContentRecord]) -> Self {
        let mut root = Branch::default();

        for record in records {
            let mut branch = &mut root;
            for segment in record.slug.split('/').filter(|s| !s.is_empty()) {
                branch = branch.children.entry(segment.to_string()).or_default();
            }
            branch.slug = Some(record.slug.clone());
            branch.title = Some(record.title().to_string());
            branch.weight = record.front_matter.weight;
        }

        Self {
            roots: into_nodes(root.children),
        }
    }

    pub fn find(&self, slug: &str) -> Option<&NavNode> {
        fn walk<'a>(nodes: &'a [NavNode], slug: &str) -> Option<&'a NavNode> {
            nodes.iter().find_map(|node| {
                if node.slug.as_deref() == Some(slug) {
                    Some(node)
                } else {
                    walk(&node.children, slug)
                }
            })
        }
        walk(&self.roots, slug)
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

fn into_nodes(children: BTreeMap<String, Branch>) -> Vec<NavNode> {
    let mut nodes: Vec<NavNode> = children
        .into_iter()
        .map(|(segment, branch)| NavNode {
            title: branch.title.unwrap_or_else(|| humanize(&segment)),
            slug: branch.slug,
            weight: branch.weight,
            children: into_nodes(branch.children),
            segment,
        })
        .collect();

    nodes.sort_by(|a, b| match (a.weight, b.weight) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.segment.cmp(&b.segment)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.segment.cmp(&b.segment),
    });
    nodes
}

/// `getting-started` becomes `Getting started`.
fn humanize(segment: &str) -> String {
    let spaced = segment.replace(['-', '_'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::{ContentKind, test_support::record};

    fn doc(slug: &str, title: Option<&str>, weight: Option<i64>) -> ContentRecord {
        let mut record = record(ContentKind::Docs, slug);
        record.front_matter.title = title.map(str::to_string);
        record.front_matter.weight = weight;
        record
    }

    #[test]
    fn groups_by_directory_and_orders_by_weight() {
        let records = vec![
            doc("reference/cli", Some("CLI"), None),
            doc("getting-started/install", Some("Install"), Some(1)),
            doc("getting-started", Some("Start here"), Some(1)),
            doc("reference", None, Some(5)),
            doc("getting-started/usage", Some("Usage"), Some(2)),
        ];

        let tree = NavTree::build(&records);

        let top: Vec<&str> = tree.roots.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(top, vec!["Start here", "reference"]);

        let start = &tree.roots[0];
        assert_eq!(start.slug.as_deref(), Some("getting-started"));
        let children: Vec<&str> = start.children.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(children, vec!["Install", "Usage"]);
    }

    #[test]
    fn directories_without_index_get_humanized_titles() {
        let tree = NavTree::build(&[doc("getting-started/install", None, None)]);

        let branch = &tree.roots[0];
        assert_eq!(branch.title, "Getting started");
        assert_eq!(branch.slug, None);
        assert_eq!(
            tree.find("getting-started/install")
                .map(|node| node.title.as_str()),
            Some("getting-started/install")
        );
    }

    #[test]
    fn unweighted_entries_sort_after_weighted() {
        let tree = NavTree::build(&[doc("alpha", None, None), doc("zulu", None, Some(10))]);

        let order: Vec<&str> = tree.roots.iter().map(|n| n.segment.as_str()).collect();
        assert_eq!(order, vec!["zulu", "alpha"]);
    }
}
