use clap::Parser;
use flexman::application::handlers::AppContext;
use flexman::application::interrupt::spawn_ctrl_c_listener;
use flexman::application::prompt::StdinPrompter;
use flexman::application::shell::App;
use flexman::config::AppConfig;
use flexman::domain::repositories::config_repository::ConfigRepository;
use flexman::domain::services::operation_executor::InterruptSignal;
use flexman::infrastructure::bitget_client::{BitgetClient, BitgetConfig};
use flexman::infrastructure::public_ip::{FixedIpResolver, IpifyResolver, PublicIpResolver, IPIFY_URL};
use flexman::infrastructure::version_checker::{
    InstallIdStore, UpdateNotice, VersionChecker, CURRENT_VERSION,
};
use flexman::persistence::json_store::JsonConfigRepository;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Manage exchange sub-accounts, savings tiers and transfers
#[derive(Debug, Parser)]
#[command(name = "flexman", version)]
struct Args {
    /// Accounts file (JSON); asked for on first use when omitted
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `flexman=trace`; RUST_LOG wins when set
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,

    /// Skip the update check
    #[arg(long)]
    no_update_check: bool,
}

fn init_logging(level: Option<&str>) {
    let default_filter = match level {
        Some(level) if !level.contains('=') => format!("flexman={}", level),
        Some(level) => level.to_string(),
        None => "flexman=info".to_string(),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn update_notice(config: &AppConfig) -> UpdateNotice {
    let Some(stats_url) = config.update_check_url() else {
        return UpdateNotice::disabled();
    };
    let Some(store) = InstallIdStore::default_location() else {
        return UpdateNotice::disabled();
    };
    match VersionChecker::new(stats_url, store.load_or_create()) {
        Some(checker) => checker.spawn(),
        None => UpdateNotice::disabled(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Ignoring unreadable .env file: {}", e);
        }
    }

    let args = Args::parse();
    init_logging(args.log_level.as_deref());

    let mut config = AppConfig::from_env();
    if args.no_update_check {
        config.update_check = false;
    }
    if let Some(path) = args.config {
        config.accounts_path = Some(path);
    }
    info!(version = CURRENT_VERSION, api_base = %config.api_base, "flexman starting");

    let gateway = Arc::new(BitgetClient::new(BitgetConfig::new(
        &config.api_base,
        config.http_timeout,
    ))?);

    let ip_resolver: Arc<dyn PublicIpResolver> =
        match IpifyResolver::new(IPIFY_URL, config.http_timeout) {
            Some(resolver) => Arc::new(resolver),
            None => {
                warn!("Public IP lookup unavailable; new API keys will not be IP-bound");
                Arc::new(FixedIpResolver(None))
            }
        };

    let repository = config.accounts_path.as_ref().map(|path| {
        Arc::new(JsonConfigRepository::new(path.clone())) as Arc<dyn ConfigRepository>
    });

    let (mut prompter, canceller) = StdinPrompter::spawn();
    let interrupt = Arc::new(InterruptSignal::new());
    spawn_ctrl_c_listener(interrupt.clone(), canceller);

    let notice = update_notice(&config);
    let context = AppContext::new(gateway, config, ip_resolver).with_interrupt(interrupt);

    let mut app = App::new(context, repository, notice);
    app.run(&mut prompter).await;

    Ok(())
}
