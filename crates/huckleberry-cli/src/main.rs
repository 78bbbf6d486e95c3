// # huckleberry - command-line tracker client
//
// This binary is a THIN integration layer over `huckleberry-core`:
// 1. Reading store credentials from environment variables
// 2. Initializing logging and the runtime
// 3. Registering document stores
// 4. Running one tracker command and printing the result as JSON
//
// All tracking logic lives in `HuckleberryClient`.
//
// ## Configuration
//
// ### Store
// - `HUCKLEBERRY_STORE_TYPE`: Store type (firestore, memory)
// - `HUCKLEBERRY_PROJECT_ID`: Firebase project id
// - `HUCKLEBERRY_API_KEY`: Firebase web API key
// - `HUCKLEBERRY_EMAIL`: Account email
// - `HUCKLEBERRY_PASSWORD`: Account password
//
// ### Client
// - `HUCKLEBERRY_OFFSET_MIN`: Timezone offset written on entries (default: host offset)
// - `HUCKLEBERRY_LOG_LEVEL`: trace, debug, info, warn, error (default: warn)
//
// ## Example
//
// ```bash
// export HUCKLEBERRY_PROJECT_ID=simpleintervals
// export HUCKLEBERRY_API_KEY=your_key
// export HUCKLEBERRY_EMAIL=parent@example.com
// export HUCKLEBERRY_PASSWORD=your_password
//
// huckleberry children
// huckleberry bottle <CHILD_ID> 120 --bottle-type Formula --units ml
// huckleberry history feed <CHILD_ID> --limit 5
// ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use huckleberry_core::paths::Tracker;
use huckleberry_core::records::{
    BottleType, DiaperMode, FeedSide, PooColor, PooConsistency, UnitsSystem, VolumeUnits,
};
use huckleberry_core::{
    BottleEntry, ClientConfig, DiaperEntry, DocumentStore, EntryQuery, GrowthEntry,
    HuckleberryClient, HuckleberryConfig, StoreConfig, StoreRegistry,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, debug, error};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Command succeeded
/// - 1: Configuration or usage error
/// - 2: Runtime error (store, network, rejected operation)
#[derive(Debug, Clone, Copy)]
enum CliExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<CliExitCode> for ExitCode {
    fn from(code: CliExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    store_type: String,
    project_id: Option<String>,
    api_key: Option<String>,
    email: Option<String>,
    password: Option<String>,
    offset_min: Option<i32>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let offset_min = match env::var("HUCKLEBERRY_OFFSET_MIN") {
            Ok(raw) => Some(
                raw.trim()
                    .parse::<i32>()
                    .with_context(|| format!("HUCKLEBERRY_OFFSET_MIN is not an integer: {}", raw))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            store_type: env::var("HUCKLEBERRY_STORE_TYPE")
                .unwrap_or_else(|_| "firestore".to_string()),
            project_id: env::var("HUCKLEBERRY_PROJECT_ID").ok(),
            api_key: env::var("HUCKLEBERRY_API_KEY").ok(),
            email: env::var("HUCKLEBERRY_EMAIL").ok(),
            password: env::var("HUCKLEBERRY_PASSWORD").ok(),
            offset_min,
            log_level: env::var("HUCKLEBERRY_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.store_type.as_str() {
            "firestore" => {
                for (name, value) in [
                    ("HUCKLEBERRY_PROJECT_ID", &self.project_id),
                    ("HUCKLEBERRY_API_KEY", &self.api_key),
                    ("HUCKLEBERRY_EMAIL", &self.email),
                    ("HUCKLEBERRY_PASSWORD", &self.password),
                ] {
                    if value.as_ref().is_none_or(|v| v.is_empty()) {
                        anyhow::bail!(
                            "{} is required when HUCKLEBERRY_STORE_TYPE=firestore. \
                            Set it via: export {}=...",
                            name,
                            name
                        );
                    }
                }

                // Check for obvious placeholder keys (common mistake)
                let key_lower = self.api_key.as_deref().unwrap_or_default().to_lowercase();
                if key_lower.contains("your_key") || key_lower.contains("replace_me") {
                    anyhow::bail!(
                        "HUCKLEBERRY_API_KEY appears to be a placeholder. \
                        Use the web API key of the Firebase project."
                    );
                }
            }
            "memory" => {}
            other => anyhow::bail!(
                "HUCKLEBERRY_STORE_TYPE '{}' is not supported. \
                Supported types: firestore, memory",
                other
            ),
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "HUCKLEBERRY_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.to_client_config().validate()?;
        Ok(())
    }

    fn log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "error" => Level::ERROR,
            _ => Level::WARN,
        }
    }

    fn to_client_config(&self) -> HuckleberryConfig {
        let store = match self.store_type.as_str() {
            "firestore" => StoreConfig::Firestore {
                project_id: self.project_id.clone().unwrap_or_default(),
                api_key: self.api_key.clone().unwrap_or_default(),
                email: self.email.clone().unwrap_or_default(),
                password: self.password.clone().unwrap_or_default(),
            },
            _ => StoreConfig::Memory,
        };

        HuckleberryConfig {
            store,
            client: ClientConfig {
                offset_min: self.offset_min,
                ..ClientConfig::default()
            },
        }
    }
}

/// Parse a value by its database spelling (`left`, `Breast Milk`, `ml`, ...)
fn parse_record_value<T: DeserializeOwned>(raw: &str) -> std::result::Result<T, String> {
    serde_json::from_value(Value::String(raw.to_string()))
        .map_err(|_| format!("unrecognized value: {}", raw))
}

#[derive(Parser)]
#[command(name = "huckleberry", version, about = "Read and write Huckleberry tracking records")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the children of the signed-in user
    Children {
        /// User id (defaults to the signed-in Firebase account)
        #[arg(long)]
        user: Option<String>,
    },
    /// Control the sleep timer
    Sleep {
        #[arg(value_enum)]
        action: SleepAction,
        child: String,
    },
    /// Control the nursing timer
    Feed {
        #[arg(value_enum)]
        action: FeedAction,
        child: String,
        /// left or right (start, resume)
        #[arg(long, value_parser = parse_record_value::<FeedSide>)]
        side: Option<FeedSide>,
    },
    /// Log a bottle feeding
    Bottle {
        child: String,
        amount: f64,
        /// Formula, "Breast Milk" or Mixed
        #[arg(long, value_parser = parse_record_value::<BottleType>)]
        bottle_type: Option<BottleType>,
        /// ml or oz
        #[arg(long, value_parser = parse_record_value::<VolumeUnits>)]
        units: Option<VolumeUnits>,
    },
    /// Log a diaper change
    Diaper {
        child: String,
        /// pee, poo, both or dry
        #[arg(value_parser = parse_record_value::<DiaperMode>)]
        mode: DiaperMode,
        #[arg(long)]
        pee: Option<f64>,
        #[arg(long)]
        poo: Option<f64>,
        #[arg(long, value_parser = parse_record_value::<PooColor>)]
        color: Option<PooColor>,
        #[arg(long, value_parser = parse_record_value::<PooConsistency>)]
        consistency: Option<PooConsistency>,
    },
    /// Log a growth measurement
    Growth {
        child: String,
        #[arg(long)]
        weight: Option<f64>,
        #[arg(long)]
        height: Option<f64>,
        #[arg(long)]
        head: Option<f64>,
        /// Measurements are in lbs / inches
        #[arg(long)]
        imperial: bool,
    },
    /// Show recent entries of a tracker
    History {
        /// sleep, feed, diaper or health
        tracker: Tracker,
        child: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Only entries starting at or after this Unix time
        #[arg(long)]
        since: Option<f64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SleepAction {
    Start,
    Pause,
    Resume,
    Cancel,
    Complete,
    Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum FeedAction {
    Start,
    Pause,
    Resume,
    Switch,
    Cancel,
    Complete,
    Status,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                CliExitCode::ConfigError
            } else {
                CliExitCode::Success
            }
            .into();
        }
    };

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return CliExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return CliExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CliExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CliExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(cli.command, config.to_client_config()).await {
            Ok(output) => {
                println!("{}", output);
                CliExitCode::Success
            }
            Err(e) => {
                error!("Command failed: {:#}", e);
                eprintln!("Error: {:#}", e);
                CliExitCode::RuntimeError
            }
        }
    })
    .into()
}

fn open_store(config: &HuckleberryConfig) -> Result<Arc<dyn DocumentStore>> {
    let registry = StoreRegistry::with_builtin();

    #[cfg(feature = "firestore")]
    huckleberry_firestore::register(&registry);

    debug!(stores = ?registry.list_stores(), "registered document stores");
    let store = registry
        .create_store(&config.store)
        .context("Failed to create document store")?;
    Ok(Arc::from(store))
}

/// User id for `children` when none is given, from the store's own session
async fn signed_in_user(store: &dyn DocumentStore) -> Result<String> {
    match store.signed_in_user().await? {
        Some(user) => Ok(user),
        None => anyhow::bail!("--user is required for the {} store", store.store_name()),
    }
}

fn pretty<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Run one command and render its result
async fn run(command: Command, config: HuckleberryConfig) -> Result<String> {
    let store = open_store(&config)?;
    let client = HuckleberryClient::with_config(store, config.client.clone());

    match command {
        Command::Children { user } => {
            let user = match user {
                Some(user) => user,
                None => signed_in_user(client.store().as_ref()).await?,
            };
            pretty(&client.get_children(&user).await?)
        }
        Command::Sleep { action, child } => match action {
            SleepAction::Start => pretty(&client.start_sleep(&child).await?),
            SleepAction::Pause => {
                client.pause_sleep(&child).await?;
                pretty(&client.sleep_document(&child).await?)
            }
            SleepAction::Resume => {
                client.resume_sleep(&child).await?;
                pretty(&client.sleep_document(&child).await?)
            }
            SleepAction::Cancel => {
                client.cancel_sleep(&child).await?;
                pretty(&json!({ "cancelled": true }))
            }
            SleepAction::Complete => pretty(&client.complete_sleep(&child).await?),
            SleepAction::Status => pretty(&client.sleep_document(&child).await?),
        },
        Command::Feed {
            action,
            child,
            side,
        } => match action {
            FeedAction::Start => {
                let side = side.context("--side is required to start a feeding")?;
                pretty(&client.start_feeding(&child, side).await?)
            }
            FeedAction::Pause => pretty(&client.pause_feeding(&child).await?),
            FeedAction::Resume => pretty(&client.resume_feeding(&child, side).await?),
            FeedAction::Switch => pretty(&client.switch_feeding_side(&child).await?),
            FeedAction::Cancel => {
                client.cancel_feeding(&child).await?;
                pretty(&json!({ "cancelled": true }))
            }
            FeedAction::Complete => pretty(&client.complete_feeding(&child).await?),
            FeedAction::Status => pretty(&client.feed_document(&child).await?),
        },
        Command::Bottle {
            child,
            amount,
            bottle_type,
            units,
        } => {
            let entry = BottleEntry {
                amount,
                bottle_type,
                units,
            };
            pretty(&client.log_bottle_feeding(&child, entry).await?)
        }
        Command::Diaper {
            child,
            mode,
            pee,
            poo,
            color,
            consistency,
        } => {
            let entry = DiaperEntry {
                mode,
                pee_amount: pee,
                poo_amount: poo,
                color,
                consistency,
            };
            pretty(&client.log_diaper(&child, entry).await?)
        }
        Command::Growth {
            child,
            weight,
            height,
            head,
            imperial,
        } => {
            let entry = GrowthEntry {
                weight,
                height,
                head,
                units: if imperial {
                    UnitsSystem::Imperial
                } else {
                    UnitsSystem::Metric
                },
            };
            pretty(&client.log_growth(&child, entry).await?)
        }
        Command::History {
            tracker,
            child,
            limit,
            since,
        } => {
            let query = EntryQuery {
                since_sec: since,
                until_sec: None,
                limit: Some(limit),
            };
            let entries: Vec<Value> = client
                .list_entries(tracker, &child, query)
                .await?
                .into_iter()
                .map(|entry| json!({ "id": entry.id, "data": entry.data }))
                .collect();
            pretty(&entries)
        }
    }
}
