//! File-system content loader.
//!
//! A load walks one content root, assigns every eligible file a unique slug,
//! parses front-matter and headings, and aggregates the taxonomy indexes.
//! Files that fail to parse are skipped with a [`ParseWarning`]; only a root
//! that cannot be walked fails the load.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use serde::Serialize;
use thiserror::Error;
use tokio::task;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::ContentSettings;
use crate::domain::content::{ContentKind, ContentRecord, sort_records};
use crate::domain::front_matter::split_front_matter;
use crate::domain::headings::extract_headings;
use crate::domain::slug::{generate_unique_slug, slug_from_relative_path};
use crate::domain::taxonomy::{MonthCount, TaxonomyIndex, compute_month_counts};

const METRIC_LOADER_SKIPPED: &str = "quire_loader_skipped_total";
const METRIC_LOADER_RECORDS: &str = "quire_loader_records";
const METRIC_LOADER_LOAD_MS: &str = "quire_loader_load_ms";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to discover {kind} content under `{}`", root.display())]
    DiscoveryFailure {
        kind: ContentKind,
        root: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no content root configured for `{0}`")]
    UnknownKind(ContentKind),
    #[error("discovery task failed: {0}")]
    Join(#[from] task::JoinError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LoadOptions {
    /// Skip any cache in front of the loader and replace what it holds.
    pub force_refresh: bool,
    /// Keep records whose front-matter sets `draft: true`.
    pub include_drafts: bool,
}

/// Stages a single load moves through.
///
/// `SkippedFile` is entered once per rejected file and returns to `Parsing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Scanning,
    Parsing,
    SkippedFile,
    Aggregating,
    Done,
    Failed,
}

impl fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LoadPhase::Idle => "idle",
            LoadPhase::Scanning => "scanning",
            LoadPhase::Parsing => "parsing",
            LoadPhase::SkippedFile => "skipped_file",
            LoadPhase::Aggregating => "aggregating",
            LoadPhase::Done => "done",
            LoadPhase::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    Read,
    FrontMatter,
    Slug,
}

/// A file that was excluded from a load.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{path}: {message}")]
pub struct ParseWarning {
    pub path: String,
    pub kind: WarningKind,
    pub message: String,
}

impl ParseWarning {
    fn new(path: &str, kind: WarningKind, message: impl fmt::Display) -> Self {
        Self {
            path: path.to_string(),
            kind,
            message: message.to_string(),
        }
    }
}

/// Everything one `load_all` produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub kind: ContentKind,
    pub records: Vec<ContentRecord>,
    pub warnings: Vec<ParseWarning>,
    pub tags: TaxonomyIndex,
    pub categories: TaxonomyIndex,
    pub archive: Vec<MonthCount>,
}

impl LoadReport {
    pub fn find(&self, slug: &str) -> Option<&ContentRecord> {
        self.records.iter().find(|record| record.slug == slug)
    }
}

/// An eligible file with the slug it was assigned.
#[derive(Debug, Clone)]
struct SourceFile {
    absolute: PathBuf,
    relative: String,
    slug: String,
}

struct Progress {
    kind: ContentKind,
    phase: LoadPhase,
}

impl Progress {
    fn new(kind: ContentKind) -> Self {
        Self {
            kind,
            phase: LoadPhase::Idle,
        }
    }

    fn advance(&mut self, next: LoadPhase) {
        debug!(kind = %self.kind, from = %self.phase, to = %next, "content load phase");
        self.phase = next;
    }
}

#[derive(Debug, Clone)]
pub struct ContentLoader {
    roots: BTreeMap<ContentKind, PathBuf>,
    extensions: Vec<String>,
}

impl ContentLoader {
    pub fn new(settings: &ContentSettings) -> Self {
        Self {
            roots: settings.roots.clone(),
            extensions: settings.extensions.clone(),
        }
    }

    /// Point one content kind at a different directory.
    pub fn with_root(mut self, kind: ContentKind, root: impl Into<PathBuf>) -> Self {
        self.roots.insert(kind, root.into());
        self
    }

    pub fn root(&self, kind: ContentKind) -> Result<&Path, LoadError> {
        self.roots
            .get(&kind)
            .map(PathBuf::as_path)
            .ok_or(LoadError::UnknownKind(kind))
    }

    /// Load, parse and aggregate every record of `kind`.
    ///
    /// Always reads from disk; `options.force_refresh` is for callers that
    /// cache the result.
    pub async fn load_all(
        &self,
        kind: ContentKind,
        options: &LoadOptions,
    ) -> Result<LoadReport, LoadError> {
        let started = Instant::now();
        let mut progress = Progress::new(kind);
        let root = self.root(kind)?.to_path_buf();

        progress.advance(LoadPhase::Scanning);
        let (files, mut warnings) = match self.discover(kind, &root).await {
            Ok(found) => found,
            Err(err) => {
                progress.advance(LoadPhase::Failed);
                return Err(err);
            }
        };

        progress.advance(LoadPhase::Parsing);
        let mut records = Vec::with_capacity(files.len());
        for file in &files {
            match read_record(kind, file).await {
                Ok(record) => {
                    if record.is_draft() && !options.include_drafts {
                        debug!(kind = %kind, slug = %record.slug, "draft excluded");
                        continue;
                    }
                    records.push(record);
                }
                Err(warning) => {
                    progress.advance(LoadPhase::SkippedFile);
                    warn!(
                        kind = %kind,
                        path = %warning.path,
                        reason = %warning.message,
                        "skipping content file"
                    );
                    warnings.push(warning);
                    progress.advance(LoadPhase::Parsing);
                }
            }
        }

        progress.advance(LoadPhase::Aggregating);
        sort_records(kind.order(), &mut records);
        let tags = TaxonomyIndex::tags(&records);
        let categories = TaxonomyIndex::categories(&records);
        let archive = compute_month_counts(&records);

        progress.advance(LoadPhase::Done);

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        counter!(METRIC_LOADER_SKIPPED, "kind" => kind.as_str()).increment(warnings.len() as u64);
        gauge!(METRIC_LOADER_RECORDS, "kind" => kind.as_str()).set(records.len() as f64);
        histogram!(METRIC_LOADER_LOAD_MS, "kind" => kind.as_str()).record(elapsed_ms);
        info!(
            kind = %kind,
            records = records.len(),
            warnings = warnings.len(),
            elapsed_ms,
            "content loaded"
        );

        Ok(LoadReport {
            kind,
            records,
            warnings,
            tags,
            categories,
            archive,
        })
    }

    /// Load the single record whose slug is `slug`.
    ///
    /// `Ok(None)` when no file maps to the slug or when that file cannot be
    /// parsed; the latter is logged.
    pub async fn load_one(
        &self,
        kind: ContentKind,
        slug: &str,
    ) -> Result<Option<ContentRecord>, LoadError> {
        let root = self.root(kind)?.to_path_buf();
        let (files, _) = self.discover(kind, &root).await?;

        let Some(file) = files.iter().find(|file| file.slug == slug) else {
            debug!(kind = %kind, slug, "no content file for slug");
            return Ok(None);
        };

        match read_record(kind, file).await {
            Ok(record) => Ok(Some(record)),
            Err(warning) => {
                counter!(METRIC_LOADER_SKIPPED, "kind" => kind.as_str()).increment(1);
                warn!(
                    kind = %kind,
                    path = %warning.path,
                    reason = %warning.message,
                    "skipping content file"
                );
                Ok(None)
            }
        }
    }

    async fn discover(
        &self,
        kind: ContentKind,
        root: &Path,
    ) -> Result<(Vec<SourceFile>, Vec<ParseWarning>), LoadError> {
        let walk_root = root.to_path_buf();
        let extensions = self.extensions.clone();

        let found = task::spawn_blocking(move || walk(&walk_root, &extensions)).await?;
        let relative = found.map_err(|source| LoadError::DiscoveryFailure {
            kind,
            root: root.to_path_buf(),
            source,
        })?;

        debug!(kind = %kind, files = relative.len(), "content files discovered");
        Ok(assign_slugs(root, relative))
    }
}

/// Relative paths of every eligible file under `root`, sorted.
fn walk(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, io::Error> {
    let metadata = std::fs::metadata(root)?;
    if !metadata.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotADirectory,
            format!("`{}` is not a directory", root.display()),
        ));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !has_extension(entry.path(), extensions) {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
}

/// Give every file a distinct slug.
///
/// Files claim their natural slug in path order. A later file whose natural
/// slug is taken gets the first `-N` suffix that is neither taken nor the
/// natural slug of another file.
fn assign_slugs(root: &Path, relative: Vec<PathBuf>) -> (Vec<SourceFile>, Vec<ParseWarning>) {
    let mut warnings = Vec::new();
    let mut based = Vec::with_capacity(relative.len());

    for path in relative {
        let shown = display_path(&path);
        match slug_from_relative_path(&path) {
            Ok(base) => based.push((path, shown, base)),
            Err(err) => warnings.push(ParseWarning::new(&shown, WarningKind::Slug, err)),
        }
    }

    let natural: HashSet<String> = based.iter().map(|(_, _, base)| base.clone()).collect();
    let mut taken: HashSet<String> = HashSet::with_capacity(based.len());
    let mut files = Vec::with_capacity(based.len());

    for (path, shown, base) in based {
        let slug = if taken.contains(&base) {
            match generate_unique_slug(&base, |candidate| {
                !natural.contains(candidate) && !taken.contains(candidate)
            }) {
                Ok(slug) => {
                    warn!(path = %shown, base = %base, slug = %slug, "slug collision resolved");
                    slug
                }
                Err(err) => {
                    warnings.push(ParseWarning::new(&shown, WarningKind::Slug, err));
                    continue;
                }
            }
        } else {
            base
        };

        taken.insert(slug.clone());
        files.push(SourceFile {
            absolute: root.join(&path),
            relative: shown,
            slug,
        });
    }

    (files, warnings)
}

fn display_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

async fn read_record(kind: ContentKind, file: &SourceFile) -> Result<ContentRecord, ParseWarning> {
    let source = tokio::fs::read_to_string(&file.absolute)
        .await
        .map_err(|err| ParseWarning::new(&file.relative, WarningKind::Read, err))?;

    let document = split_front_matter(&source)
        .map_err(|err| ParseWarning::new(&file.relative, WarningKind::FrontMatter, err))?;

    let headings = extract_headings(document.body);

    Ok(ContentRecord {
        kind,
        slug: file.slug.clone(),
        path: file.relative.clone(),
        front_matter: document.front_matter,
        body: document.body.to_string(),
        headings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    fn slugs(files: &[SourceFile]) -> Vec<&str> {
        files.iter().map(|file| file.slug.as_str()).collect()
    }

    #[test]
    fn nested_duplicates_keep_their_directories() {
        let (files, warnings) = assign_slugs(
            Path::new("/content"),
            paths(&["a/intro.md", "b/intro.md", "intro.md"]),
        );

        assert!(warnings.is_empty());
        assert_eq!(slugs(&files), vec!["a/intro", "b/intro", "intro"]);
    }

    #[test]
    fn colliding_slugs_get_suffixes_that_skip_natural_slugs() {
        let (files, _) = assign_slugs(
            Path::new("/content"),
            paths(&["guides.md", "guides/index.md", "guides-1.md"]),
        );

        let mut assigned = slugs(&files);
        assigned.sort_unstable();
        assert_eq!(assigned, vec!["guides", "guides-1", "guides-2"]);
    }

    #[test]
    fn unsluggable_files_become_warnings() {
        let (files, warnings) =
            assign_slugs(Path::new("/content"), paths(&["!!!.md", "ok.md"]));

        assert_eq!(slugs(&files), vec!["ok"]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::Slug);
        assert_eq!(warnings[0].path, "!!!.md");
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let extensions = vec!["md".to_string(), "mdx".to_string()];
        assert!(has_extension(Path::new("post.MD"), &extensions));
        assert!(has_extension(Path::new("post.mdx"), &extensions));
        assert!(!has_extension(Path::new("post.txt"), &extensions));
        assert!(!has_extension(Path::new("README"), &extensions));
    }

    #[test]
    fn phases_display_in_snake_case() {
        assert_eq!(LoadPhase::SkippedFile.to_string(), "skipped_file");
        assert_eq!(LoadPhase::Done.to_string(), "done");
    }
}
