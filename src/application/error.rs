use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::loader::LoadError, cache::CacheError, domain::content::ContentKind,
    domain::error::DomainError, infra::error::InfraError,
};

/// An error flattened into its source chain for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("no {kind} record with slug `{slug}`")]
    NotFound { kind: ContentKind, slug: String },
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn not_found(kind: ContentKind, slug: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            slug: slug.into(),
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Process exit code for the command-line front end.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::NotFound { .. } => 2,
            AppError::Domain(_) | AppError::Cache(_) => 64,
            AppError::Load(LoadError::DiscoveryFailure { .. }) => 66,
            AppError::Infra(InfraError::Configuration { .. }) => 78,
            AppError::Load(_) | AppError::Infra(_) | AppError::Unexpected(_) => 1,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self)
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn report_walks_the_source_chain() {
        let error = AppError::from(LoadError::DiscoveryFailure {
            kind: ContentKind::Docs,
            root: PathBuf::from("content/docs"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such directory"),
        });

        let report = error.report();

        assert_eq!(
            report.messages,
            vec![
                "failed to discover docs content under `content/docs`".to_string(),
                "no such directory".to_string(),
            ]
        );
        assert_eq!(error.exit_code(), 66);
    }

    #[test]
    fn not_found_names_kind_and_slug() {
        let error = AppError::not_found(ContentKind::Blog, "hello");
        assert_eq!(error.to_string(), "no blog record with slug `hello`");
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn infra_failures_map_to_their_exit_codes() {
        let config = AppError::from(InfraError::configuration("bad layer"));
        assert_eq!(config.exit_code(), 78);

        let telemetry = AppError::from(InfraError::telemetry("subscriber already set"));
        assert_eq!(telemetry.exit_code(), 1);
        assert_eq!(
            telemetry.to_string(),
            "telemetry initialization failed: subscriber already set"
        );
    }
}
