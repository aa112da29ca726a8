//! Utilities for generating deterministic, human-friendly slugs.
//!
//! The helpers here bridge ASCII slugification (`slug` crate) with Chinese
//! transliteration (`pinyin` crate) so inputs like “基线对齐” become
//! `ji-xian-dui-qi`. Content slugs come from file paths; anchor slugs come from
//! heading text and are unique within one document.

use std::collections::HashMap;
use std::path::{Component, Path};

use pinyin::{Pinyin, ToPinyin};
use slug::slugify;
use thiserror::Error;

const MAX_SUFFIX_ATTEMPTS: usize = 64;
const FALLBACK_ANCHOR: &str = "section";
const INDEX_STEM: &str = "index";

/// Errors that can occur while generating a slug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    Exhausted { base: String },
}

/// Derive a base slug from the provided human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let transliterated = transliterate_to_ascii(input);
    let candidate = slugify(&transliterated);

    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Derive a content slug from a path relative to its content root.
///
/// The extension is dropped, every segment is slugified and segments are
/// joined with `/`. A trailing `index` segment stands for its directory, so
/// `guides/index.md` and `guides.md` both map to `guides`; callers resolve
/// such collisions with [`generate_unique_slug`].
pub fn slug_from_relative_path(relative: &Path) -> Result<String, SlugError> {
    let mut segments: Vec<String> = Vec::new();
    let components: Vec<_> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();

    let last = components.len().saturating_sub(1);
    for (position, part) in components.iter().enumerate() {
        let name = part.to_string_lossy();
        let name = if position == last {
            file_stem(&name)
        } else {
            name.into_owned()
        };
        segments.push(derive_slug(&name)?);
    }

    if segments.len() > 1 && segments.last().is_some_and(|last| last == INDEX_STEM) {
        segments.pop();
    }

    if segments.is_empty() {
        return Err(SlugError::EmptyInput);
    }

    Ok(segments.join("/"))
}

/// Produce a slug that does not collide according to the supplied predicate.
///
/// The `is_unique` closure must return `true` when the provided slug is still
/// free. The helper will retry by suffixing a monotonic counter (`-1`, `-2`, …).
pub fn generate_unique_slug<F>(base: &str, mut is_unique: F) -> Result<String, SlugError>
where
    F: FnMut(&str) -> bool,
{
    if is_unique(base) {
        return Ok(base.to_string());
    }

    for attempt in 1..=MAX_SUFFIX_ATTEMPTS {
        let candidate = format!("{base}-{attempt}");
        if is_unique(&candidate) {
            return Ok(candidate);
        }
    }

    Err(SlugError::Exhausted {
        base: base.to_string(),
    })
}

/// Deterministically generate unique anchor slugs within a single document.
///
/// Headings processed in order receive monotonic suffixes when duplicates
/// occur (e.g. `section`, `section-1`, `section-2`). A heading whose text has
/// no sluggable characters falls back to `section`.
#[derive(Default, Debug)]
pub struct AnchorSlugger {
    occurrences: HashMap<String, usize>,
}

impl AnchorSlugger {
    /// Create a new slugger instance.
    pub fn new() -> Self {
        Self {
            occurrences: HashMap::new(),
        }
    }

    /// Generate a slug for the provided heading text, unique within this
    /// slugger.
    pub fn anchor_for(&mut self, heading: &str) -> String {
        let base = derive_slug(heading).unwrap_or_else(|_| FALLBACK_ANCHOR.to_string());

        let mut anchor = base.clone();
        if let Some(&seen) = self.occurrences.get(&base) {
            let mut count = seen;
            loop {
                count += 1;
                anchor = format!("{base}-{count}");
                if !self.occurrences.contains_key(&anchor) {
                    break;
                }
            }
            self.occurrences.insert(base, count);
        }

        self.occurrences.insert(anchor.clone(), 0);
        anchor
    }
}

fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}

fn transliterate_to_ascii(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for ch in input.chars() {
        if ch.is_ascii() {
            output.push(ch);
            continue;
        }

        match ch.to_pinyin() {
            Some(py) => append_pinyin(&mut output, py),
            None if ch.is_whitespace() => output.push(' '),
            None => {
                // Preserve unhandled characters so slugify can decide how to filter them.
                output.push(ch);
            }
        }
    }

    output
}

fn append_pinyin(buffer: &mut String, pinyin: Pinyin) {
    if !buffer.is_empty() && !buffer.ends_with(' ') {
        buffer.push(' ');
    }
    buffer.push_str(pinyin.plain());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_slug_transliterates_chinese() {
        let slug = derive_slug("Rust 基础教程").expect("slug");
        assert_eq!(slug, "rust-ji-chu-jiao-cheng");
    }

    #[test]
    fn derive_slug_rejects_blank_input() {
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
    }

    #[test]
    fn relative_path_strips_extension_and_joins_segments() {
        let slug = slug_from_relative_path(Path::new("guides/Getting Started.mdx")).expect("slug");
        assert_eq!(slug, "guides/getting-started");
    }

    #[test]
    fn nested_index_collapses_to_directory() {
        let slug = slug_from_relative_path(Path::new("guides/setup/index.md")).expect("slug");
        assert_eq!(slug, "guides/setup");

        let root_index = slug_from_relative_path(Path::new("index.md")).expect("slug");
        assert_eq!(root_index, "index");
    }

    #[test]
    fn same_file_name_in_different_directories_stays_distinct() {
        let first = slug_from_relative_path(Path::new("2023/intro.md")).expect("slug");
        let second = slug_from_relative_path(Path::new("2024/intro.md")).expect("slug");
        assert_ne!(first, second);
    }

    #[test]
    fn generate_unique_slug_appends_counter() {
        let mut existing = vec!["pattern-library".to_string()];
        let slug = generate_unique_slug("pattern-library", |candidate| {
            if existing.contains(&candidate.to_string()) {
                false
            } else {
                existing.push(candidate.to_string());
                true
            }
        })
        .expect("unique slug");

        assert_eq!(slug, "pattern-library-1");
        assert!(existing.contains(&slug));
    }

    #[test]
    fn generate_unique_slug_exhausted() {
        let result =
            generate_unique_slug("example", |_| false).expect_err("should exhaust attempts");
        assert_eq!(
            result,
            SlugError::Exhausted {
                base: "example".to_string()
            }
        );
    }

    #[test]
    fn anchor_slugger_produces_unique_slugs() {
        let mut slugger = AnchorSlugger::new();

        let first = slugger.anchor_for("Intro");
        let second = slugger.anchor_for("Intro");
        let third = slugger.anchor_for("深入理解");

        assert_eq!(first, "intro");
        assert_eq!(second, "intro-1");
        assert_eq!(third, "shen-ru-li-jie");
    }

    #[test]
    fn anchor_slugger_skips_suffixes_taken_by_literal_headings() {
        let mut slugger = AnchorSlugger::new();

        assert_eq!(slugger.anchor_for("Intro"), "intro");
        assert_eq!(slugger.anchor_for("Intro 1"), "intro-1");
        assert_eq!(slugger.anchor_for("Intro"), "intro-2");
    }

    #[test]
    fn anchor_slugger_falls_back_for_symbol_only_headings() {
        let mut slugger = AnchorSlugger::new();
        assert_eq!(slugger.anchor_for("!!!"), "section");
        assert_eq!(slugger.anchor_for("???"), "section-1");
    }
}
