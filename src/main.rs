use std::{path::Path, process::ExitCode};

use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

mod config;
mod fetch;
mod model;
mod page;
mod pipeline;
mod sitemap;

#[cfg(test)]
mod testing;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // the local offset can only be read while the process is single threaded
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args_os().nth(1) {
        Some(path) => match config::Config::load(Path::new(&path)) {
            Ok(config) => config,
            Err(err) => {
                tracing::error!("couldn't load {}: {}", Path::new(&path).display(), err);
                return ExitCode::FAILURE;
            }
        },
        None => config::Config::default(),
    };

    tracing::debug!("{:#?}", config);

    match pipeline::run(&config, now).await {
        Ok(report) => {
            tracing::info!("done, {} new pages", report.pages.len());
            if let Some(sitemap) = report.sitemap {
                tracing::info!("sitemap refreshed at {}", sitemap.display());
            }
            ExitCode::SUCCESS
        }

        Err(err) => {
            tracing::error!("run failed: {}", err);
            ExitCode::FAILURE
        }
    }
}
