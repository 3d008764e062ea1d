use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, warn};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use unifi_dns::error::{Error, Result};
use unifi_dns::provider::{Unifi, UnifiCfg};
use unifi_dns::reconciler::{Batch, Reconciler};
use unifi_dns::record::{Record, RecordList};

mod config;

#[derive(Parser)]
#[command(version, about = "Manage the DNS records of a UniFi Network site")]
struct Args {
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, env = "UNIFI_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "UNIFI_SITE_ID")]
    site_id: Option<String>,

    #[arg(long, env = "UNIFI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Accept self-signed controller certificates
    #[arg(long)]
    insecure: bool,

    #[arg(short, long, env = "UNIFI_ZONE")]
    zone: Option<String>,

    #[command(subcommand)]
    verb: Verb,
}

#[derive(Subcommand)]
enum Verb {
    /// Print every record of the zone
    Get,
    /// Create the records of FILE
    Append { file: PathBuf },
    /// Create or overwrite the records of FILE by name and type
    Set { file: PathBuf },
    /// Delete the records of FILE
    Delete { file: PathBuf },
    /// Delete every record of the zone
    Purge,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns whether the verb completed without error.
async fn run(args: Args) -> Result<bool> {
    let cfg = match &args.config {
        Some(path) => config::Parser::parse_yaml(path)?,
        None => config::Cfg::default(),
    };

    let zone = args.zone.or(cfg.zone).ok_or(Error::ConfigError(
        "zone is not set (--zone, UNIFI_ZONE or zone)".to_string(),
    ))?;

    let mut provider = cfg.provider.unwrap_or_default();
    if args.base_url.is_some() {
        provider.base_url = args.base_url;
    }
    if args.site_id.is_some() {
        provider.site_id = args.site_id;
    }
    if let Some(key) = args.api_key {
        provider.authentication = Some(config::CfgProviderAuthentication::api_key(key));
    }
    provider.insecure_tls |= args.insecure;

    let backend = Unifi::new(UnifiCfg::try_from(provider)?)?;
    let reconciler = Reconciler::from_cfg(backend, &cfg.reconciler);

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    match args.verb {
        Verb::Get => report(reconciler.get(&zone, &cancel).await),
        Verb::Append { file } => {
            let records = read_records(&file)?;
            report(reconciler.append(&zone, &records, &cancel).await)
        }
        Verb::Set { file } => {
            let records = read_records(&file)?;
            report(reconciler.set(&zone, &records, &cancel).await)
        }
        Verb::Delete { file } => {
            let records = read_records(&file)?;
            report(reconciler.delete(&zone, &records, &cancel).await)
        }
        Verb::Purge => {
            let (records, err) = reconciler.get(&zone, &cancel).await.into_parts();
            if let Some(e) = err {
                return Err(e);
            }
            report(reconciler.delete(&zone, &records, &cancel).await)
        }
    }
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("interrupted, stopping before the next record");
        cancel.cancel();
    }
}

fn read_records(path: &Path) -> Result<Vec<Record>> {
    let yaml = std::fs::read_to_string(path)?;
    Ok(RecordList::from_yaml(&yaml)?.records)
}

fn report<T: Serialize>(batch: Batch<T>) -> Result<bool> {
    let (records, err) = batch.into_parts();
    print!("{}", serde_yaml::to_string(&records)?);

    match err {
        Some(e) => {
            error!("{}", e);
            Ok(false)
        }
        None => Ok(true),
    }
}
