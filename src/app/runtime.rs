use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use planetary_fetch::catalog::{DEFAULT_ODE_ENDPOINT, OdeCatalog};
use planetary_fetch::{HttpClient, orchestrator};
use tracing::{debug, info, warn};

use crate::app::{config_runtime, exit_handler, terminal};
use crate::{ProcessExit, output};

pub(crate) async fn run_fetch() -> Result<ProcessExit> {
    let (args, cli_sources) = config_runtime::parse_cli_with_sources();

    let config = config_runtime::build_run_config(&args);
    terminal::init_tracing(
        config.log_level.filter_directive(),
        config_runtime::should_force_cli_log_level(&cli_sources),
        terminal::is_no_color_requested(),
    );

    debug!(?args, "CLI arguments parsed");
    info!("planetary-fetch starting");

    let timeouts = config_runtime::http_timeouts(&args);
    let endpoint = args.catalog_url.as_deref().unwrap_or(DEFAULT_ODE_ENDPOINT);
    let catalog = OdeCatalog::with_endpoint(endpoint, timeouts)
        .with_context(|| format!("invalid catalog endpoint {endpoint}"))?;
    let client = HttpClient::new(timeouts).context("cannot create download client")?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_signal = Arc::clone(&interrupted);
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if interrupted_signal.swap(true, Ordering::SeqCst) {
                warn!("second interrupt received, exiting immediately");
                std::process::exit(i32::from(ProcessExit::Interrupted.code()));
            }
            warn!("interrupt received, finishing in-flight downloads (press Ctrl-C again to exit now)");
        }
    });

    let report = orchestrator::run(&config, &catalog, &client, interrupted).await?;

    output::print_summary(&config.pattern, &report);
    Ok(exit_handler::determine_exit_outcome(&report))
}
