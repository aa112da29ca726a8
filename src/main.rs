use std::process;

use quire::{
    application::{
        error::AppError,
        loader::{ContentLoader, LoadOptions},
        service::ContentService,
    },
    cache::CacheConfig,
    config::{self, Command},
    infra::{error::InfraError, telemetry},
    presentation::views::{self, View},
};
use tracing::{Dispatch, Level, dispatcher, error};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    let report = error.report();
    let chain = report.messages.join(": ");

    if dispatcher::has_been_set() {
        error!(error = %chain, source = report.source, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %chain, source = report.source, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli().map_err(|err| {
        InfraError::configuration(format!("failed to load configuration: {err}"))
    })?;

    telemetry::init(&settings.logging)?;

    let loader = ContentLoader::new(&settings.content);
    let mut service = ContentService::new(loader, &CacheConfig::from(&settings.cache))?;

    let kind = cli_args.command.kind();
    let mut options = LoadOptions {
        force_refresh: cli_args.overrides.force_refresh,
        include_drafts: false,
    };

    let view = match cli_args.command {
        Command::List(args) => {
            options.include_drafts = args.drafts;
            View::Listing(service.list(kind, &options).await?)
        }
        Command::Show(args) => {
            View::Record(service.get(kind, &args.slug, options.force_refresh).await?)
        }
        Command::Tags(_) => View::Terms {
            label: "tags",
            kind,
            index: service.tags(kind, &options).await?,
        },
        Command::Categories(_) => View::Terms {
            label: "categories",
            kind,
            index: service.categories(kind, &options).await?,
        },
        Command::Archive(_) => View::Archive {
            kind,
            months: service.archive(kind, &options).await?,
        },
        Command::Sidebar(_) => View::Sidebar {
            kind,
            tree: service.sidebar(kind, &options).await?,
        },
    };

    let output = views::render(&view, cli_args.overrides.format)
        .map_err(|err| AppError::unexpected(err.to_string()))?;
    print!("{output}");
    Ok(())
}
