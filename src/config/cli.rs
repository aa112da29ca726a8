use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};

use crate::domain::content::ContentKind;

/// Command-line arguments for the quire binary.
#[derive(Debug, Parser)]
#[command(
    name = "quire",
    version,
    about = "Inspect markdown content the way a site would load it"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "QUIRE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: SharedOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// List every record of a content kind.
    List(ListArgs),
    /// Print one record with its table of contents.
    Show(ShowArgs),
    /// Tag counts for a content kind.
    Tags(KindArgs),
    /// Category counts for a content kind.
    Categories(KindArgs),
    /// Posts per month, newest first.
    Archive(KindArgs),
    /// Sidebar tree derived from the slug hierarchy.
    Sidebar(KindArgs),
}

impl Command {
    pub fn kind(&self) -> ContentKind {
        match self {
            Command::List(args) => args.kind.kind,
            Command::Show(args) => args.kind,
            Command::Tags(args)
            | Command::Categories(args)
            | Command::Archive(args)
            | Command::Sidebar(args) => args.kind,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct KindArgs {
    /// Content kind (blog|docs|links).
    #[arg(value_name = "KIND", value_parser = parse_kind)]
    pub kind: ContentKind,
}

#[derive(Debug, Args, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub kind: KindArgs,

    /// Include records marked `draft: true`.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub drafts: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Content kind (blog|docs|links).
    #[arg(value_name = "KIND", value_parser = parse_kind)]
    pub kind: ContentKind,

    /// Record slug, e.g. `guides/setup`.
    #[arg(value_name = "SLUG")]
    pub slug: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Args, Default, Clone)]
pub struct SharedOverrides {
    /// Override the directory holding one sub-directory per content kind.
    #[arg(
        long = "content-root",
        value_name = "PATH",
        value_hint = ValueHint::DirPath,
        global = true
    )]
    pub content_root: Option<PathBuf>,

    /// Override the per-cache entry limit.
    #[arg(long = "cache-capacity", value_name = "COUNT", global = true)]
    pub cache_capacity: Option<usize>,

    /// Override the cache expiry in milliseconds.
    #[arg(long = "cache-ttl-ms", value_name = "MILLIS", global = true)]
    pub cache_ttl_ms: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Re-read content from disk even when a cached copy exists.
    #[arg(long = "force-refresh", action = clap::ArgAction::SetTrue, global = true)]
    pub force_refresh: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
}

fn parse_kind(value: &str) -> Result<ContentKind, String> {
    value.parse().map_err(|err| format!("{err}"))
}
