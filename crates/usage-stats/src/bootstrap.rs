use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use stats_core::settings::app_dir;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure the standard `~/.usage-stats/` directory hierarchy exists.
pub fn ensure_directories() -> anyhow::Result<()> {
    ensure_directories_in(&app_dir())
}

/// Create `app_dir`, `app_dir/data` and `app_dir/logs` if absent (including
/// any missing parents).
pub fn ensure_directories_in(app_dir: &Path) -> anyhow::Result<()> {
    for dir in [app_dir.to_path_buf(), app_dir.join("data"), app_dir.join("logs")] {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating directory {}", dir.display()))?;
    }
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a CLI log-level name to an [`EnvFilter`] directive.
///
/// Unknown names pass through unchanged so that full directives such as
/// `"stats_data=debug"` keep working.
pub fn level_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Output goes to stderr, or is appended to `log_file` when given. Falls back
/// to `"info"` if the level string is not a valid filter.
pub fn setup_logging(log_level: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(level_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;

            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()?;
        }
        None => {
            let layer = fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()?;
        }
    }

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ── test_ensure_directories ───────────────────────────────────────────────

    #[test]
    fn test_ensure_directories_in() {
        let tmp = TempDir::new().expect("tempdir");
        let app = tmp.path().join(".usage-stats");

        ensure_directories_in(&app).expect("ensure_directories_in should succeed");

        assert!(app.is_dir(), ".usage-stats dir must exist");
        assert!(app.join("data").is_dir(), "data subdir must exist");
        assert!(app.join("logs").is_dir(), "logs subdir must exist");
    }

    #[test]
    fn test_ensure_directories_is_repeatable() {
        let tmp = TempDir::new().expect("tempdir");
        let app = tmp.path().join("nested").join(".usage-stats");
        ensure_directories_in(&app).expect("first");
        ensure_directories_in(&app).expect("second");
        assert!(app.join("logs").is_dir());
    }

    #[test]
    fn test_ensure_directories_blocked_by_file() {
        let tmp = TempDir::new().expect("tempdir");
        let app = tmp.path().join(".usage-stats");
        std::fs::write(&app, "").unwrap();
        assert!(ensure_directories_in(&app).is_err());
    }

    // ── test_level_directive ──────────────────────────────────────────────────

    #[test]
    fn test_level_directive_maps_cli_names() {
        assert_eq!(level_directive("DEBUG"), "debug");
        assert_eq!(level_directive("INFO"), "info");
        assert_eq!(level_directive("WARNING"), "warn");
        assert_eq!(level_directive("ERROR"), "error");
        assert_eq!(level_directive("CRITICAL"), "error");
        assert_eq!(level_directive("info"), "info");
    }

    #[test]
    fn test_level_directive_passes_through_directives() {
        assert_eq!(level_directive("stats_data=trace"), "stats_data=trace");
    }
}
