// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! safestat-submit: submit health data through a wallet and follow it to a
//! confirmed or failed transaction.

use std::{error::Error, process::ExitCode};

use clap::{Parser, Subcommand};
use safestat_server::{
    blockchain::{
        session::short_address, watcher::DEFAULT_WATCH_INTERVAL, RpcWalletProvider,
        SessionChange, WalletGateway, WalletSession,
    },
    config::{API_URL_ENV, DEFAULT_API_URL, LOG_FORMAT_ENV, WALLET_RPC_URL_ENV},
    logging::{init_tracing, LogFormat},
    models::{HealthPayload, HealthProfile, MetricKind, MetricReading},
    workflow::{HealthDataClient, RecordService, SubmissionWorkflow},
};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "safestat-submit")]
#[command(about = "Submit health data anchored by a Sepolia transaction")]
struct Cli {
    /// Wallet JSON-RPC endpoint
    #[arg(long, env = WALLET_RPC_URL_ENV)]
    rpc_url: Option<String>,

    /// SafeStat API base URL
    #[arg(long, env = API_URL_ENV, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Log output format (json or pretty)
    #[arg(long, env = LOG_FORMAT_ENV, default_value = "pretty")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Connect the wallet and switch it to Sepolia
    Connect,

    /// Submit a single metric reading
    Submit {
        /// Metric kind (heartRate, bloodPressure, glucose, steps, weight, sleep)
        #[arg(long)]
        kind: MetricKind,

        #[arg(long)]
        value: i64,

        /// Unit; defaults to the kind's usual unit
        #[arg(long)]
        unit: Option<String>,
    },

    /// Submit a personal health profile
    SubmitProfile {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: i64,
        /// e.g. 120/80
        #[arg(long)]
        blood_pressure: String,
        #[arg(long)]
        heart_rate: i64,
        #[arg(long)]
        sugar: i64,
        #[arg(long)]
        blood_group: String,
    },

    /// List the connected account's records
    List,

    /// List every record on the server
    ListAll,

    /// Follow account and chain changes until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let provider = match cli.rpc_url.as_deref() {
        Some(url) => Some(RpcWalletProvider::new(url)?),
        None => None,
    };
    let gateway = WalletGateway::from_option(provider.clone());
    let client = HealthDataClient::new(&cli.api_url)?;

    let payload = match cli.command {
        Command::Connect => {
            let account = gateway.connect().await?;
            println!("Connected {} on {}", short_address(&account), gateway.network().name);
            return Ok(());
        }
        Command::List => {
            let account = gateway
                .connected_account()
                .await
                .ok_or("No wallet account connected; run `safestat-submit connect` first")?;
            let records = client.list_by_owner(&account).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
            return Ok(());
        }
        Command::ListAll => {
            let records = client.list_all().await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
            return Ok(());
        }
        Command::Watch => {
            let Some(provider) = provider else {
                return Err(safestat_server::blockchain::WalletError::NoProvider.into());
            };
            return watch(&gateway, &provider).await;
        }
        Command::Submit { kind, value, unit } => HealthPayload::Metric(MetricReading {
            data_type: kind,
            value,
            unit: unit.unwrap_or_else(|| kind.default_unit().to_string()),
        }),
        Command::SubmitProfile {
            name,
            age,
            blood_pressure,
            heart_rate,
            sugar,
            blood_group,
        } => HealthPayload::Profile(HealthProfile {
            name,
            age,
            blood_pressure,
            heart_rate,
            sugar,
            blood_group,
        }),
    };

    payload.validate()?;
    let owner = gateway.connect().await?;
    let report = SubmissionWorkflow::new(&gateway, &client)
        .submit(&owner, payload)
        .await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.is_confirmed() {
        Ok(())
    } else {
        Err(report
            .error
            .unwrap_or_else(|| "Submission failed".to_string())
            .into())
    }
}

async fn watch(
    gateway: &WalletGateway<RpcWalletProvider>,
    provider: &RpcWalletProvider,
) -> Result<(), Box<dyn Error>> {
    let mut events = gateway
        .subscribe()
        .ok_or(safestat_server::blockchain::WalletError::NoProvider)?;
    let shutdown = CancellationToken::new();
    let watcher = provider.spawn_watcher(DEFAULT_WATCH_INTERVAL, shutdown.clone());

    let mut session = WalletSession::restore(gateway).await;
    match session.account() {
        Some(account) => println!("Watching {}", short_address(account)),
        None => println!("Watching (no account connected)"),
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(event) => match session.apply(&event) {
                    SessionChange::AccountChanged(account) => {
                        println!("Account changed: {}", short_address(&account))
                    }
                    SessionChange::Disconnected => println!("Wallet disconnected"),
                    SessionChange::ReloadRequired => {
                        println!("Network changed, reloading session");
                        session = WalletSession::restore(gateway).await;
                        if let Err(e) = gateway.ensure_network().await {
                            eprintln!("Network check failed: {e}");
                        }
                    }
                    SessionChange::Unchanged => {}
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Dropped wallet events");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    shutdown.cancel();
    watcher.await?;
    Ok(())
}
