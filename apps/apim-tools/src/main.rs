use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use apim_gateway::{
    ApimConfig, DEFAULT_API_PATH_FILTER, DEFAULT_POLICY_FRAGMENT, GatewaySession,
    credential_from_config,
};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// APIM Tools - inspect an Azure API Management gateway
#[derive(Parser)]
#[command(name = "apim-tools")]
#[command(about = "APIM Tools - inspect an Azure API Management gateway")]
#[command(version)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Resource group holding the APIM service (overrides config)
    #[arg(short = 'g', long)]
    resource_group: Option<String>,

    /// APIM service name; the first service in the group is used when omitted
    #[arg(short = 'n', long)]
    service_name: Option<String>,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize and print the account, service and subscription names
    Show,
    /// Find the first API whose path contains the filter
    Discover {
        #[arg(long, default_value = DEFAULT_API_PATH_FILTER)]
        filter: String,
    },
    /// Issue a debug-tracing token for the discovered API
    DebugToken {
        #[arg(long, default_value = DEFAULT_API_PATH_FILTER)]
        filter: String,
        /// ISO-8601 duration, e.g. PT1H
        #[arg(long, default_value = "PT1H")]
        expire_after: String,
    },
    /// Fetch a recorded gateway trace
    Trace { trace_id: String },
    /// List models declared in a policy fragment
    Models {
        #[arg(long, default_value = DEFAULT_POLICY_FRAGMENT)]
        fragment: String,
        /// Log the raw fragment body
        #[arg(long)]
        debug: bool,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn,apim_gateway=info,apim_tools=info",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<ApimConfig> {
    let mut figment = ApimConfig::figment(cli.config.as_deref());
    if let Some(rg) = &cli.resource_group {
        figment = figment.merge(("resource_group", rg));
    }
    if let Some(name) = &cli.service_name {
        figment = figment.merge(("service_name", name));
    }
    ApimConfig::from_figment(&figment).context("invalid configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config
        && !Path::new(path).is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }

    init_logging(cli.verbose);
    let config = load_config(&cli)?;

    let mut session = GatewaySession::from_config(&config, credential_from_config(&config))
        .context("failed to build gateway session")?;
    session
        .initialize()
        .await
        .context("failed to initialize gateway session")?;

    let output = match cli.command {
        Commands::Show => show(&session),
        Commands::Discover { filter } => {
            let api = session
                .discover_api(&filter)
                .await
                .into_result()
                .context("API discovery failed")?;
            json!({ "id": api.id, "name": api.name, "path": api.path, "endpoint": api.endpoint })
        }
        Commands::DebugToken {
            filter,
            expire_after,
        } => {
            session
                .discover_api(&filter)
                .await
                .into_result()
                .context("API discovery failed")?;
            let credential = session
                .get_debug_credentials(&expire_after)
                .await
                .into_result()
                .context("failed to get debug credentials")?;
            json!({
                "endpoint": session.endpoint(),
                "token": credential.token.expose(),
                "expireAfter": credential.expire_after,
            })
        }
        Commands::Trace { trace_id } => {
            let trace = session
                .get_trace(&trace_id)
                .await
                .into_result()
                .context("failed to get trace")?;
            trace.payload
        }
        Commands::Models { fragment, debug } => {
            let models = session
                .get_policy_fragment_supported_models(&fragment, debug)
                .await
                .into_result()
                .with_context(|| format!("failed to read models from `{fragment}`"))?;
            json!(models)
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn show(session: &GatewaySession) -> serde_json::Value {
    let identity = session.identity();
    let service = session.service();
    let subscriptions: Vec<&str> = session
        .subscription_keys()
        .iter()
        .map(|key| key.name.as_str())
        .collect();
    json!({
        "user": identity.map(|i| &i.account.user_name),
        "tenantId": identity.map(|i| &i.account.tenant_id),
        "subscriptionId": identity.map(|i| &i.account.subscription_id),
        "resourceGroup": identity.map(|i| &i.resource_group),
        "serviceName": identity.map(|i| &i.service_name),
        "serviceId": service.map(|s| &s.id),
        "gatewayUrl": service.map(|s| &s.gateway_url),
        "subscriptions": subscriptions,
    })
}
