// Entrypoint for the uploader.
// - Keeps `main` small: read the environment, build the client, run the sync.
// - Typed errors from the library pick the exit code; `anyhow` adds context.

use anyhow::Context;
use docs_sync::{api::ApiClient, config::Config, error::SyncError, logging, sync};
use std::process;

fn run() -> anyhow::Result<()> {
    let config = Config::from_env().context("reading configuration")?;
    let api = ApiClient::from_config(&config)?;
    tracing::info!(
        source = %config.source_dir.display(),
        base_url = %api.base_url(),
        remote = %config.remote_dir,
        "starting sync"
    );

    let stdout = std::io::stdout();
    let report = sync::run(&api, &config, &mut stdout.lock()).context("sync aborted")?;

    tracing::info!(
        attempted = report.uploads.len(),
        accepted = report.accepted(),
        rejected = report.rejected(),
        "sync finished"
    );
    Ok(())
}

fn main() {
    logging::init_logging();

    if let Err(err) = run() {
        let code = err
            .downcast_ref::<SyncError>()
            .map(SyncError::exit_code)
            .unwrap_or(1);
        eprintln!("docs-sync failed: {err:#}");
        process::exit(code);
    }
}
