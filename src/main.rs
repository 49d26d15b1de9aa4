//! MySQL operator binary.

use anyhow::{Context, Result};
use clap::Parser;
use kube::Client;
use mysql_operator::config::{self, OperatorConfig, DEFAULT_FIELD_MANAGER, DEFAULT_FINALIZER};
use mysql_operator::{MySQL, Operator};
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mysql-operator")]
#[command(about = "Kubernetes operator for MySQL custom resources")]
#[command(version)]
struct Args {
    /// Namespace to watch (empty for cluster-wide)
    #[arg(long, env = "WATCH_NAMESPACE", default_value = "")]
    namespace: String,

    /// Finalizer used to intercept deletion of MySQL objects
    #[arg(long, env = "FINALIZER", default_value = DEFAULT_FINALIZER)]
    finalizer: String,

    /// Field manager recorded on created and replaced objects
    #[arg(long, env = "FIELD_MANAGER", default_value = DEFAULT_FIELD_MANAGER)]
    field_manager: String,

    /// Seconds to wait between failed attempts, comma-separated
    #[arg(long, env = "ERROR_BACKOFFS", default_value = "10,20,30")]
    error_backoffs: String,

    /// Seconds between periodic re-reconciliations (0 disables)
    #[arg(long, env = "REQUEUE_AFTER", default_value_t = 0)]
    requeue_after: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: Level,

    /// Enable JSON log format
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    log_json: bool,

    /// Print CRD YAML and exit
    #[arg(long)]
    print_crd: bool,
}

impl Args {
    fn operator_config(&self) -> Result<OperatorConfig> {
        let backoffs = config::parse_backoffs(&self.error_backoffs)
            .context("Invalid --error-backoffs")?;
        let config = OperatorConfig::new()
            .namespace(self.namespace.clone())
            .finalizer(self.finalizer.clone())
            .field_manager(self.field_manager.clone())
            .error_backoffs(backoffs)
            .requeue_after(Duration::from_secs(self.requeue_after));
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_crd {
        print_crd()?;
        return Ok(());
    }

    init_logging(&args);

    let config = args.operator_config()?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        backoffs = ?config.error_backoffs,
        "Starting MySQL operator"
    );

    // In-cluster service account first, then the local kubeconfig.
    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    Operator::new(client, config)
        .run()
        .await
        .context("Operator failed")?;

    Ok(())
}

fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.as_str().to_lowercase()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if args.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn print_crd() -> Result<()> {
    use kube::CustomResourceExt;

    let crd = MySQL::crd();
    let yaml = serde_yaml::to_string(&crd)?;
    println!("{}", yaml);

    Ok(())
}
