use std::fmt::{Debug, Display};

use student_registry::core::{get_subscriber, init_subscriber, AppConfig};
use student_registry::registry_web_server::RegistryWebServer;
use tokio::task::JoinError;

use colored::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_dir = std::env::var("STUDENT_REGISTRY_LOG_DIR")
        .unwrap_or_else(|_| "/var/tmp/log/student_registry".into());
    let file_appender = tracing_appender::rolling::daily(log_dir, "app");

    let subscriber = get_subscriber("student_registry".into(), "info".into(), file_appender);
    init_subscriber(subscriber);

    let config = AppConfig::new()?;

    let registry_web_server = RegistryWebServer::build(config.clone()).await?;
    let port = registry_web_server.port();

    let server_task = tokio::spawn(registry_web_server.run_until_stopped());

    println!("{}", "-----------------------------------------".green());
    println!(
        "🚀 Bootstrap server started on Addr: {}:{}",
        config.registry_server_config.host, port
    );
    println!("{}", "-----------------------------------------".green());

    tokio::select! {
        outcome = server_task => {report_exit("bootstrap server", outcome);}
    }
    Ok(())
}

fn report_exit(task_name: &str, outcome: Result<Result<(), impl Debug + Display>, JoinError>) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{} has exited", task_name)
        }
        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{} failed",
                task_name
            )
        }
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{}' task failed to complete",
                task_name
            )
        }
    }
}
