//! Global `tracing` subscriber: readable events on stderr filtered by `RUST_LOG`, plus every
//! event and its span list as one JSON object per line in an optional log file.
use std::fs::File;
use std::path::Path;
use anyhow::{Context, Result};
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::{fmt, registry, EnvFilter, prelude::*};

fn json_log_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let file = File::create(path).with_context(|| format!("failed to open log file {:?}", path))?;
    Ok(NonBlockingBuilder::default().lossy(false).finish(file))
}

/// A second installation fails unless `lenient` is set, in which case the first one stays.
fn install(logfile: Option<&Path>, lenient: bool) -> Result<Option<WorkerGuard>> {
    let base = registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr));

    let (installed, guard): (Result<()>, _) = match logfile {
        None => (base.try_init().map_err(Into::into), None),
        Some(path) => {
            let (writer, guard) = json_log_writer(path)?;
            let json = fmt::layer()
                .json()
                .with_span_list(true)
                .with_current_span(false)
                .with_writer(writer);
            (base.with(json).try_init().map_err(Into::into), Some(guard))
        },
    };

    match installed {
        Err(e) if !lenient => Err(e.context("a global tracing subscriber is already installed")),
        _ => Ok(guard),
    }
}

/// Keep the returned guard alive until exit, otherwise buffered file output is lost.
pub fn init_logging(logfile: Option<impl AsRef<Path>>) -> Result<Option<WorkerGuard>> {
    install(logfile.as_ref().map(|p| p.as_ref()), false)
}

/// Safe to call from every test.
#[allow(dead_code)]
pub(crate) fn init_test_logging(logfile: Option<impl AsRef<Path>>) -> Option<WorkerGuard> {
    install(logfile.as_ref().map(|p| p.as_ref()), true).ok().flatten()
}
