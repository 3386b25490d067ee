//! Federated Unlearning Dashboard - CLI Entry Point

mod api;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use api::commands::{self, Output};
use unlearning_dashboard::constants;
use unlearning_dashboard::logic::auth::{Authenticator, StaticCredentials};
use unlearning_dashboard::logic::form::{
    AttackType, DuplicationStrategy, RunConfig, UnlearningMode, DEFAULT_DATASET,
};
use unlearning_dashboard::logic::history::HistoryStore;
use unlearning_dashboard::logic::progress::ObserverConfig;
use unlearning_dashboard::{ApiConfig, Dashboard, DashboardClient};

#[derive(Parser)]
#[command(name = "unlearning-dashboard")]
#[command(about = "Federated Unlearning Dashboard - configure, run and inspect unlearning jobs", long_about = None)]
#[command(version = constants::APP_VERSION)]
struct Cli {
    /// Backend base URL
    #[arg(long, global = true, env = "DASHBOARD_API_URL")]
    api_url: Option<String>,

    /// Run history file
    #[arg(long, global = true, env = "DASHBOARD_HISTORY_FILE")]
    history_file: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Login user
    #[arg(long, global = true, env = "DASHBOARD_LOGIN_USER")]
    username: Option<String>,

    /// Login password
    #[arg(long, global = true, env = "DASHBOARD_LOGIN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show aggregate metrics
    Kpis,

    /// List federated client nodes
    Nodes,

    /// Show system health gauges
    Health,

    /// KPIs, nodes and health in one view
    Overview,

    /// List datasets known to the backend
    Datasets,

    /// Select the active dataset
    Select {
        name: String,
    },

    /// Upload a CSV dataset (must contain a data_subject_id column)
    Upload {
        file: PathBuf,
    },

    /// Apply the configuration and start a run, then follow it to the end
    Run(RunArgs),

    /// Show recent completed runs
    History {
        /// Delete the stored history
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    #[arg(long, default_value = DEFAULT_DATASET)]
    dataset: String,

    /// duplication | label_poison | backdoor
    #[arg(long, default_value = "duplication")]
    attack_type: AttackType,

    /// Percentage of injected duplicates (0-90)
    #[arg(long, default_value_t = 10)]
    duplicate_ratio: u32,

    /// random | class_skewed | by_client | by_class | client_skewed | burst
    #[arg(long, default_value = "random")]
    strategy: DuplicationStrategy,

    #[arg(long, default_value = "auto")]
    target_class: String,

    /// Percentage of clients affected (1-100)
    #[arg(long, default_value_t = 50)]
    clients_affected: u32,

    /// Data subject id (required with hard_delete)
    #[arg(long, default_value = "")]
    subject_id: String,

    /// certified | hard_delete
    #[arg(long, default_value = "certified")]
    unlearning_mode: UnlearningMode,

    /// Enable differential privacy
    #[arg(long)]
    dp: bool,

    #[arg(long, default_value_t = 8.0)]
    epsilon: f64,

    #[arg(long, default_value_t = 30)]
    retention_days: u32,

    /// Disable the audit log
    #[arg(long)]
    no_audit_log: bool,
}

impl RunArgs {
    fn into_config(self) -> RunConfig {
        let mut config = RunConfig::default().with_dataset(self.dataset);

        config.attack.attack_type = self.attack_type;
        config.attack.duplicate_ratio = self.duplicate_ratio;
        config.attack.strategy = self.strategy;
        config.attack.target_class = self.target_class;
        config.attack.clients_affected = self.clients_affected;

        config.gdpr.subject_id = self.subject_id;
        config.gdpr.unlearning_mode = self.unlearning_mode;
        config.gdpr.dp_enabled = self.dp;
        config.gdpr.epsilon = self.epsilon;
        config.gdpr.retention_days = self.retention_days;
        config.gdpr.audit_log = !self.no_audit_log;

        config
    }
}

/// Every command requires explicit credentials
fn login(cli: &Cli, authenticator: &dyn Authenticator) -> anyhow::Result<()> {
    let (Some(username), Some(password)) = (cli.username.as_deref(), cli.password.as_deref()) else {
        anyhow::bail!(
            "login required: pass --username and --password (or set DASHBOARD_LOGIN_USER / DASHBOARD_LOGIN_PASSWORD)"
        );
    };

    if !authenticator.authenticate(username, password) {
        anyhow::bail!("invalid username or password");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    login(&cli, &StaticCredentials::from_env())?;

    let api_config = ApiConfig {
        base_url: cli.api_url.clone().unwrap_or_else(constants::get_api_url),
        ..ApiConfig::default()
    };
    log::debug!("{} v{} -> {}", constants::APP_NAME, constants::APP_VERSION, api_config.base_url);

    let client = DashboardClient::new(api_config).context("failed to build HTTP client")?;
    let history = HistoryStore::new(cli.history_file.clone().unwrap_or_else(constants::get_history_path));
    let mut dashboard = Dashboard::new(Arc::new(client), history, ObserverConfig::default());
    let out = Output::new(cli.json);

    match cli.command {
        Commands::Kpis => commands::show_kpis(&mut dashboard, &out).await,
        Commands::Nodes => commands::show_nodes(&mut dashboard, &out).await,
        Commands::Health => commands::show_health(&mut dashboard, &out).await,
        Commands::Overview => commands::show_overview(&mut dashboard, &out).await,
        Commands::Datasets => commands::list_datasets(&dashboard, &out).await,
        Commands::Select { name } => commands::select_dataset(&mut dashboard, &name, &out).await,
        Commands::Upload { file } => commands::upload_dataset(&mut dashboard, &file, &out).await,
        Commands::Run(args) => commands::run(&mut dashboard, args.into_config(), &out).await,
        Commands::History { clear } => commands::show_history(&dashboard, clear, &out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> StaticCredentials {
        StaticCredentials::new(constants::DEFAULT_USERNAME, constants::DEFAULT_PASSWORD)
    }

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["unlearning-dashboard"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_login_without_credentials_is_rejected() {
        std::env::remove_var("DASHBOARD_LOGIN_USER");
        std::env::remove_var("DASHBOARD_LOGIN_PASSWORD");

        let cli = parse(&["kpis"]);
        let err = login(&cli, &account()).unwrap_err();
        assert!(err.to_string().contains("login required"));

        let cli = parse(&["--username", "admin", "kpis"]);
        assert!(login(&cli, &account()).is_err());
    }

    #[test]
    fn test_login_checks_password() {
        let cli = parse(&["kpis", "--username", "admin", "--password", "wrong"]);
        assert!(login(&cli, &account()).is_err());

        let cli = parse(&["kpis", "--username", "admin", "--password", constants::DEFAULT_PASSWORD]);
        assert!(login(&cli, &account()).is_ok());
    }
}
