//! Runs one dispatcher pass and exits.
//!
//! Exit code 0 when the pass ran, whatever happened to individual messages.
//! Exit code 1 when configuration, service setup or the queue itself failed.
use std::process::ExitCode;

use dotenvy::dotenv;
use tracing::{error, info};

use service_callback_dispatcher::{
    config::DispatcherConfig,
    jobs::BatchOrchestrator,
    logging::setup_logging,
    models::DispatcherError,
    queues::SqsBackend,
    services::{CallbackService, S2sService, SmtpMailer},
    utils::{build_http_client, log_service_info},
};

async fn run() -> Result<(), DispatcherError> {
    let config = DispatcherConfig::from_env()?;

    let queue = SqsBackend::new(&config.bus).await?;
    let http_client =
        build_http_client().map_err(|e| DispatcherError::ServiceInit(e.to_string()))?;
    let token_provider = S2sService::new(config.s2s.clone(), http_client.clone());
    let callback_service = CallbackService::new(http_client, config.extra_service_logging);

    let orchestrator = BatchOrchestrator::from_config(
        &config,
        queue,
        token_provider,
        callback_service,
        SmtpMailer::new(),
    );
    let report = orchestrator.run_once().await?;
    info!(
        received = report.received,
        settled = report.settled(),
        "Dispatcher pass complete"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    setup_logging();
    log_service_info();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Dispatcher pass failed");
            ExitCode::FAILURE
        }
    }
}
