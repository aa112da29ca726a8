//! Front-matter extraction.
//!
//! A content file may open with a YAML block fenced by `---` or a TOML block
//! fenced by `+++`. The block is parsed into a generic mapping and then read
//! field by field into [`FrontMatter`]; keys without a dedicated field land in
//! [`FrontMatter::extra`] untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use time::{
    Date, OffsetDateTime,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const YAML_FENCE: &str = "---";
const YAML_END: &str = "...";
const TOML_FENCE: &str = "+++";

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontMatterFormat {
    Yaml,
    Toml,
}

impl fmt::Display for FrontMatterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yaml => f.write_str("YAML"),
            Self::Toml => f.write_str("TOML"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrontMatterError {
    #[error("front-matter opened with `{fence}` is never closed")]
    Unterminated { fence: &'static str },
    #[error("{format} front-matter is not valid: {message}")]
    Syntax {
        format: FrontMatterFormat,
        message: String,
    },
    #[error("front-matter must be a mapping of keys to values")]
    NotAMapping,
    #[error("front-matter field `{field}` must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
    #[error("front-matter field `{field}` has unparseable date `{value}`")]
    InvalidDate { field: &'static str, value: String },
}

/// Typed metadata declared at the top of a content file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(with = "iso_date::option")]
    pub date: Option<Date>,
    #[serde(with = "iso_date::option")]
    pub updated: Option<Date>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub draft: bool,
    pub weight: Option<i64>,
    pub extra: BTreeMap<String, Value>,
}

/// A content file split into its metadata and the remaining source.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<'a> {
    pub front_matter: FrontMatter,
    pub format: Option<FrontMatterFormat>,
    pub body: &'a str,
}

/// Split `source` into front-matter and body.
///
/// Files without an opening fence have empty front-matter and the whole
/// source as body.
pub fn split_front_matter(source: &str) -> Result<Document<'_>, FrontMatterError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let (first_line, rest) = match source.split_once('\n') {
        Some((line, rest)) => (line, rest),
        None => (source, ""),
    };

    let (format, fence) = match first_line.trim_end() {
        YAML_FENCE => (FrontMatterFormat::Yaml, YAML_FENCE),
        TOML_FENCE => (FrontMatterFormat::Toml, TOML_FENCE),
        _ => {
            return Ok(Document {
                front_matter: FrontMatter::default(),
                format: None,
                body: source,
            });
        }
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end();
        let closes = trimmed == fence || (format == FrontMatterFormat::Yaml && trimmed == YAML_END);
        if closes {
            let block = &rest[..offset];
            let body = &rest[offset + line.len()..];
            let front_matter = parse_block(format, block)?;
            return Ok(Document {
                front_matter,
                format: Some(format),
                body,
            });
        }
        offset += line.len();
    }

    Err(FrontMatterError::Unterminated { fence })
}

fn parse_block(format: FrontMatterFormat, block: &str) -> Result<FrontMatter, FrontMatterError> {
    if block.trim().is_empty() {
        return Ok(FrontMatter::default());
    }

    let value = match format {
        FrontMatterFormat::Yaml => {
            serde_yaml::from_str::<Value>(block).map_err(|err| FrontMatterError::Syntax {
                format,
                message: err.to_string(),
            })?
        }
        FrontMatterFormat::Toml => {
            let table =
                toml::from_str::<toml::Table>(block).map_err(|err| FrontMatterError::Syntax {
                    format,
                    message: err.to_string(),
                })?;
            toml_to_json(toml::Value::Table(table))
        }
    };

    match value {
        Value::Object(map) => FrontMatter::from_map(map),
        Value::Null => Ok(FrontMatter::default()),
        _ => Err(FrontMatterError::NotAMapping),
    }
}

impl FrontMatter {
    /// Read the known fields out of `map`, validating each one.
    pub fn from_map(mut map: Map<String, Value>) -> Result<Self, FrontMatterError> {
        let title = take_string(&mut map, "title")?;
        let description = take_string(&mut map, "description")?;
        let date = take_date(&mut map, "date")?;
        let updated = take_date(&mut map, "updated")?;
        let tags = take_terms(&mut map, "tags")?;
        let category = take_string(&mut map, "category")?;
        let draft = take_bool(&mut map, "draft")?.unwrap_or(false);
        let weight = take_integer(&mut map, "weight")?;

        Ok(Self {
            title,
            description,
            date,
            updated,
            tags,
            category,
            draft,
            weight,
            extra: map.into_iter().collect(),
        })
    }
}

fn take_string(
    map: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, FrontMatterError> {
    match map.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => {
            let trimmed = value.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Some(_) => Err(FrontMatterError::InvalidField {
            field,
            expected: "a string",
        }),
    }
}

fn take_bool(
    map: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Option<bool>, FrontMatterError> {
    match map.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(value)) => Ok(Some(value)),
        Some(_) => Err(FrontMatterError::InvalidField {
            field,
            expected: "a boolean",
        }),
    }
}

fn take_integer(
    map: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Option<i64>, FrontMatterError> {
    match map.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number.as_i64().map(Some).ok_or(
            FrontMatterError::InvalidField {
                field,
                expected: "an integer",
            },
        ),
        Some(_) => Err(FrontMatterError::InvalidField {
            field,
            expected: "an integer",
        }),
    }
}

fn take_date(
    map: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Option<Date>, FrontMatterError> {
    match map.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => parse_date(field, &value).map(Some),
        Some(_) => Err(FrontMatterError::InvalidField {
            field,
            expected: "a date (YYYY-MM-DD)",
        }),
    }
}

/// Tags accept either a list or a comma-separated string. Terms are trimmed,
/// blanks dropped and repeats collapsed, keeping first-seen order.
fn take_terms(
    map: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Vec<String>, FrontMatterError> {
    let invalid = FrontMatterError::InvalidField {
        field,
        expected: "a list of strings",
    };

    let raw: Vec<String> = match map.remove(field) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::String(value)) => value.split(',').map(str::to_string).collect(),
        Some(Value::Array(items)) => {
            let mut terms = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(term) => terms.push(term),
                    Value::Number(number) => terms.push(number.to_string()),
                    _ => return Err(invalid),
                }
            }
            terms
        }
        Some(_) => return Err(invalid),
    };

    let mut terms: Vec<String> = Vec::with_capacity(raw.len());
    for term in raw {
        let term = term.trim();
        if !term.is_empty() && !terms.iter().any(|seen| seen == term) {
            terms.push(term.to_string());
        }
    }
    Ok(terms)
}

fn parse_date(field: &'static str, raw: &str) -> Result<Date, FrontMatterError> {
    let trimmed = raw.trim();

    if let Ok(date) = Date::parse(trimmed, ISO_DATE) {
        return Ok(date);
    }
    if let Ok(datetime) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(datetime.date());
    }
    // `2024-03-01 10:00:00` and other local date-times: keep the date part.
    if let Some(prefix) = trimmed.get(..10)
        && trimmed[10..].starts_with([' ', 'T'])
        && let Ok(date) = Date::parse(prefix, ISO_DATE)
    {
        return Ok(date);
    }

    Err(FrontMatterError::InvalidDate {
        field,
        value: raw.to_string(),
    })
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(text) => Value::String(text),
        toml::Value::Integer(number) => Value::from(number),
        toml::Value::Float(number) => serde_json::Number::from_f64(number)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(flag) => Value::Bool(flag),
        toml::Value::Datetime(datetime) => Value::String(datetime.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn yaml_front_matter_is_typed() {
        let source = concat!(
            "---\ntitle: Hello\ndate: 2024-03-01\ntags: [rust, web]\n",
            "category: notes\nlocale: en\n---\n# Body\n",
        );
        let document = split_front_matter(source).expect("valid document");

        let fm = &document.front_matter;
        assert_eq!(document.format, Some(FrontMatterFormat::Yaml));
        assert_eq!(fm.title.as_deref(), Some("Hello"));
        assert_eq!(fm.date, Some(date!(2024 - 03 - 01)));
        assert_eq!(fm.tags, vec!["rust", "web"]);
        assert_eq!(fm.category.as_deref(), Some("notes"));
        assert_eq!(fm.extra.get("locale"), Some(&Value::String("en".into())));
        assert_eq!(document.body, "# Body\n");
    }

    #[test]
    fn toml_front_matter_is_typed() {
        let source =
            "+++\ntitle = \"Install\"\ndate = 2023-12-24\nweight = 2\ndraft = true\n+++\nBody";
        let document = split_front_matter(source).expect("valid document");

        let fm = &document.front_matter;
        assert_eq!(document.format, Some(FrontMatterFormat::Toml));
        assert_eq!(fm.title.as_deref(), Some("Install"));
        assert_eq!(fm.date, Some(date!(2023 - 12 - 24)));
        assert_eq!(fm.weight, Some(2));
        assert!(fm.draft);
        assert_eq!(document.body, "Body");
    }

    #[test]
    fn missing_front_matter_keeps_whole_body() {
        let source = "# Only a heading\n";
        let document = split_front_matter(source).expect("valid document");
        assert_eq!(document.front_matter, FrontMatter::default());
        assert_eq!(document.format, None);
        assert_eq!(document.body, source);
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let err = split_front_matter("---\ntitle: Oops\n# never closed\n").expect_err("malformed");
        assert_eq!(err, FrontMatterError::Unterminated { fence: "---" });
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let err = split_front_matter("---\ntitle: [unclosed\n---\n").expect_err("malformed");
        assert!(matches!(
            err,
            FrontMatterError::Syntax {
                format: FrontMatterFormat::Yaml,
                ..
            }
        ));
    }

    #[test]
    fn scalar_block_is_not_a_mapping() {
        let err = split_front_matter("---\njust text\n---\n").expect_err("malformed");
        assert_eq!(err, FrontMatterError::NotAMapping);
    }

    #[test]
    fn wrong_field_type_is_an_error() {
        let err = split_front_matter("---\ndraft: maybe\n---\n").expect_err("malformed");
        assert_eq!(
            err,
            FrontMatterError::InvalidField {
                field: "draft",
                expected: "a boolean"
            }
        );
    }

    #[test]
    fn comma_separated_tags_are_split_and_deduplicated() {
        let document =
            split_front_matter("---\ntags: \"x, y , x,,\"\n---\n").expect("valid document");
        assert_eq!(document.front_matter.tags, vec!["x", "y"]);
    }

    #[test]
    fn datetime_values_keep_their_date() {
        let source = "---\ndate: 2024-05-06T08:30:00Z\nupdated: 2024-05-07 09:00:00\n---\n";
        let document = split_front_matter(source).expect("valid document");
        assert_eq!(document.front_matter.date, Some(date!(2024 - 05 - 06)));
        assert_eq!(document.front_matter.updated, Some(date!(2024 - 05 - 07)));
    }

    #[test]
    fn bad_date_is_reported() {
        let err = split_front_matter("---\ndate: last tuesday\n---\n").expect_err("malformed");
        assert!(matches!(
            err,
            FrontMatterError::InvalidDate { field: "date", .. }
        ));
    }

    #[test]
    fn empty_block_yields_defaults() {
        let document = split_front_matter("---\n---\nbody").expect("valid document");
        assert_eq!(document.front_matter, FrontMatter::default());
        assert_eq!(document.body, "body");
    }
}
