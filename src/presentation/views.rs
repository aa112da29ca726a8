//! Console rendering of service results as plain text or JSON.

use std::fmt::{self, Write as _};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use time::Date;

use crate::application::loader::{LoadReport, ParseWarning};
use crate::config::OutputFormat;
use crate::domain::content::{ContentKind, ContentRecord};
use crate::domain::nav::{NavNode, NavTree};
use crate::domain::taxonomy::{MonthCount, TaxonomyIndex};
use crate::domain::toc::TocNode;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("failed to encode JSON output")]
    Json(#[from] serde_json::Error),
    #[error("failed to format text output")]
    Format(#[from] fmt::Error),
}

/// Something a command produced, ready to print.
#[derive(Debug, Clone)]
pub enum View {
    Listing(Arc<LoadReport>),
    Record(Arc<ContentRecord>),
    Terms {
        label: &'static str,
        kind: ContentKind,
        index: TaxonomyIndex,
    },
    Archive {
        kind: ContentKind,
        months: Vec<MonthCount>,
    },
    Sidebar {
        kind: ContentKind,
        tree: Arc<NavTree>,
    },
}

#[derive(Serialize)]
struct RecordSummary<'a> {
    slug: &'a str,
    title: &'a str,
    path: &'a str,
    date: Option<String>,
    tags: &'a [String],
    draft: bool,
}

impl<'a> From<&'a ContentRecord> for RecordSummary<'a> {
    fn from(record: &'a ContentRecord) -> Self {
        Self {
            slug: &record.slug,
            title: record.title(),
            path: &record.path,
            date: record.front_matter.date.map(format_date),
            tags: record.tags(),
            draft: record.is_draft(),
        }
    }
}

#[derive(Serialize)]
struct ListingJson<'a> {
    kind: ContentKind,
    records: Vec<RecordSummary<'a>>,
    warnings: &'a [ParseWarning],
}

#[derive(Serialize)]
struct RecordJson<'a> {
    #[serde(flatten)]
    record: &'a ContentRecord,
    title: &'a str,
    toc: Vec<TocNode>,
}

pub fn render(view: &View, format: OutputFormat) -> Result<String, ViewError> {
    match format {
        OutputFormat::Json => render_json(view),
        OutputFormat::Text => render_text(view),
    }
}

fn render_json(view: &View) -> Result<String, ViewError> {
    let encoded = match view {
        View::Listing(report) => serde_json::to_string_pretty(&ListingJson {
            kind: report.kind,
            records: report.records.iter().map(RecordSummary::from).collect(),
            warnings: &report.warnings,
        })?,
        View::Record(record) => serde_json::to_string_pretty(&RecordJson {
            record,
            title: record.title(),
            toc: record.toc(),
        })?,
        View::Terms { index, .. } => serde_json::to_string_pretty(index)?,
        View::Archive { months, .. } => serde_json::to_string_pretty(months)?,
        View::Sidebar { tree, .. } => serde_json::to_string_pretty(tree.as_ref())?,
    };
    Ok(encoded)
}

fn render_text(view: &View) -> Result<String, ViewError> {
    let mut out = String::new();
    match view {
        View::Listing(report) => {
            if report.records.is_empty() {
                writeln!(out, "no {} records", report.kind)?;
            }
            for record in &report.records {
                let date = record
                    .front_matter
                    .date
                    .map(format_date)
                    .unwrap_or_else(|| "----------".to_string());
                let marker = if record.is_draft() { " (draft)" } else { "" };
                writeln!(out, "{date}  {:<32}  {}{marker}", record.slug, record.title())?;
            }
            for warning in &report.warnings {
                writeln!(out, "warning: {warning}")?;
            }
        }
        View::Record(record) => {
            writeln!(out, "{}", record.title())?;
            writeln!(out, "slug: {}", record.slug)?;
            writeln!(out, "path: {}", record.path)?;
            if let Some(date) = record.front_matter.date {
                writeln!(out, "date: {}", format_date(date))?;
            }
            if !record.tags().is_empty() {
                writeln!(out, "tags: {}", record.tags().join(", "))?;
            }
            if let Some(category) = record.category() {
                writeln!(out, "category: {category}")?;
            }
            let toc = record.toc();
            if !toc.is_empty() {
                writeln!(out, "contents:")?;
                write_toc(&mut out, &toc, 1)?;
            }
        }
        View::Terms { label, kind, index } => {
            if index.is_empty() {
                writeln!(out, "no {label} in {kind}")?;
            }
            for term in index.terms() {
                writeln!(out, "{:>5}  {}", term.count, term.name)?;
            }
        }
        View::Archive { kind, months } => {
            if months.is_empty() {
                writeln!(out, "no dated {kind} records")?;
            }
            for month in months {
                writeln!(out, "{}  {:>5}  {}", month.key, month.count, month.label)?;
            }
        }
        View::Sidebar { kind, tree } => {
            if tree.is_empty() {
                writeln!(out, "no {kind} records")?;
            }
            write_nav(&mut out, &tree.roots, 0)?;
        }
    }
    Ok(out)
}

fn write_toc(out: &mut String, nodes: &[TocNode], depth: usize) -> fmt::Result {
    for node in nodes {
        writeln!(out, "{:indent$}- {} (#{})", "", node.text, node.id, indent = depth * 2)?;
        write_toc(out, &node.children, depth + 1)?;
    }
    Ok(())
}

fn write_nav(out: &mut String, nodes: &[NavNode], depth: usize) -> fmt::Result {
    for node in nodes {
        match node.slug.as_deref() {
            Some(slug) => writeln!(
                out,
                "{:indent$}{} [{slug}]",
                "",
                node.title,
                indent = depth * 2
            )?,
            None => writeln!(out, "{:indent$}{}/", "", node.title, indent = depth * 2)?,
        }
        write_nav(out, &node.children, depth + 1)?;
    }
    Ok(())
}

fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
