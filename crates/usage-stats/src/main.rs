mod bootstrap;
mod report;

use std::time::Duration;

use anyhow::{Context, Result};
use stats_core::settings::Settings;
use stats_core::time_utils::TimezoneHandler;
use stats_data::store::{JsonFileStore, SeriesStore};
use stats_runtime::data_manager::FetchManager;
use stats_runtime::orchestrator::UploadOrchestrator;
use stats_runtime::source::CommandSource;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("usage-stats v{} starting", env!("CARGO_PKG_VERSION"));

    let timezone = TimezoneHandler::new(&settings.timezone);
    let now = timezone.now();
    let store = JsonFileStore::new(settings.resolved_data_dir());
    tracing::info!(
        view = %settings.view,
        timezone = %timezone.default_tz(),
        data_dir = %store.data_dir().display(),
        "configuration resolved"
    );

    match settings.view.as_str() {
        "upload" => {
            let source = CommandSource::new(
                settings.source_command.clone(),
                Duration::from_secs(settings.fetch_timeout),
            );
            let fetcher = FetchManager::new(source, settings.fetch_attempts);
            let mut orchestrator = UploadOrchestrator::new(fetcher, store);

            let summary = orchestrator
                .run(&now)
                .await
                .with_context(|| format!("usage upload via `{}` failed", settings.source_command))?;

            println!("{}", report::render_run(&summary));
            println!();
            print!("{}", report::render_summary(&summary.stats, &now));
        }

        "summary" => {
            let stats = store
                .load_stats()
                .with_context(|| format!("reading {}", store.stats_path().display()))?;
            match stats {
                Some(stats) => print!("{}", report::render_summary(&stats, &now)),
                None => println!("No statistics yet. Run with --view upload first."),
            }
        }

        "history" => {
            let days = store.load_series();
            let page = report::ActivityPage::new(
                &days,
                settings.page as usize,
                settings.page_size as usize,
            );
            print!("{}", report::render_activity(&page));
        }

        unknown => anyhow::bail!("Unknown view: {unknown}"),
    }

    Ok(())
}
