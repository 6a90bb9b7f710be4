use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use namecast_core::config::Config;
use namecast_core::core_datastore::{self, Datastore};
use namecast_core::core_namesys::{ResolverOptions, StoreOptions};
use namecast_core::core_record::IPNS_PREFIX;
use namecast_core::logging::{init_logging_with_config, LogLevel};
use namecast_core::{
    Keypair, MemoryNetwork, MemoryPubsub, NameEntryValidator, NamePubsub, NameResolver, PeerId,
    PubsubRecordStore, Record, RecordKey, ResolveOptions,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_CONFIG_PATH: &str = "~/.namecast/config.toml";

#[derive(Parser, Debug)]
#[command(name = "namecast")]
#[command(author, version, about = "Mutable names relayed over pubsub", long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Override the log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default configuration and a new node identity
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Print this node's peer id
    Id,

    /// Validate a record envelope and seed the local cache with it
    Import {
        /// `/ipns/<peer-id>` or a bare peer id
        name: String,
        /// File holding the serialized record
        file: PathBuf,
    },

    /// Resolve an IPNS name
    Resolve {
        name: String,
        /// Resolve until the result is not an IPNS name
        #[arg(short, long)]
        recursive: bool,
        /// Do not use cached entries
        #[arg(short, long)]
        nocache: bool,
    },

    /// IPNS pubsub management (experimental)
    Pubsub {
        #[command(subcommand)]
        command: PubsubCommand,
    },
}

#[derive(Subcommand, Debug)]
enum PubsubCommand {
    /// Query the state of IPNS pubsub
    State,
    /// Show current name subscriptions
    Subs,
}

fn expand(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path).with_context(|| format!("cannot expand {}", path))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    expand(&path.to_string_lossy())
}

/// File configuration (or defaults) with environment overrides and
/// expanded paths
fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        Config::from_file(path).with_context(|| format!("loading {}", path.display()))?
    } else {
        Config::default()
    };

    let mut config = config.apply_env()?;
    config.node.identity_path = expand_path(&config.node.identity_path)?;
    config.store.data_dir = expand_path(&config.store.data_dir)?;
    Ok(config)
}

/// `/ipns/<peer-id>` or `<peer-id>` to the record key of that peer
fn name_to_key(name: &str) -> Result<RecordKey> {
    let id = name.strip_prefix(IPNS_PREFIX).unwrap_or(name);
    let peer = PeerId::parse(id).with_context(|| format!("invalid name {}", name))?;
    Ok(RecordKey::for_peer(&peer))
}

/// Everything a command needs to talk to the record store
struct Node {
    datastore: Arc<dyn Datastore>,
    store: Arc<PubsubRecordStore>,
}

impl Node {
    async fn start(config: &Config) -> Result<Self> {
        let keypair = Keypair::load_from_file(&config.node.identity_path).with_context(|| {
            format!(
                "no identity at {}, run `namecast init` first",
                config.node.identity_path.display()
            )
        })?;

        let datastore = core_datastore::open(&config.store)?;

        // No network transport is wired into the binary; the broker only
        // connects this process's own subscriptions.
        let network = MemoryNetwork::new();
        let pubsub = MemoryPubsub::new(keypair.peer_id(), &network)
            .with_delivery_capacity(config.pubsub.channel_capacity);

        let store = Arc::new(PubsubRecordStore::with_options(
            Arc::new(pubsub),
            datastore.clone(),
            keypair.peer_id(),
            Arc::new(NameEntryValidator::new()),
            StoreOptions::from(&config.pubsub),
        ));

        let node = Node { datastore, store };
        if config.pubsub.enabled {
            node.follow_cached_names().await?;
        }
        Ok(node)
    }

    /// Subscribe to every `/ipns/` name already in the local cache
    async fn follow_cached_names(&self) -> Result<()> {
        for key in self.datastore.keys().await? {
            if !key.as_str().starts_with(IPNS_PREFIX) {
                continue;
            }
            if let Err(e) = self.store.get(&key).await {
                warn!(key = %key, error = %e, "Cannot follow cached name");
            }
        }
        Ok(())
    }
}

fn init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "configuration already exists at {} (use --force to overwrite)",
            config_path.display()
        );
    }

    let root = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&root)
        .with_context(|| format!("creating {}", root.display()))?;

    let mut config = Config::default();
    config.node.identity_path = root.join("identity.json");
    config.store.data_dir = root.join("data");
    config.save_to_file(config_path)?;

    let keypair = Keypair::load_or_generate(&config.node.identity_path)?;
    info!(config = %config_path.display(), "Initialized namecast");
    println!("{}", keypair.peer_id());
    Ok(())
}

async fn import(config: &Config, name: &str, file: &Path) -> Result<()> {
    let key = name_to_key(name)?;
    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let record = Record::from_bytes(&bytes)?;

    if record.key != key {
        bail!("record is for {}, not {}", record.key, key);
    }

    let node = Node::start(config).await?;
    if !node.store.validate_record(&record.value, &record.author)? {
        bail!("record for {} failed validation", key);
    }

    // An unreadable cached record is simply replaced
    let cached = node.datastore.get(&key).await.ok();
    if let Some(current) = cached.and_then(|bytes| Record::from_bytes(&bytes).ok()) {
        if !node.store.select_record(&record.value, &current.value)? {
            bail!("local cache already holds a record for {} at least as new", key);
        }
    }

    node.datastore.put(&key, bytes).await?;
    info!(key = %key, "Imported record");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = expand(&args.config)?;
    let mut config = load_config(&config_path)?;

    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.json_format = true;
    }

    let log_config = config.logging.to_log_config().unwrap_or_else(|e| {
        eprintln!("{}, using 'info'", e);
        namecast_core::logging::LogConfig::new(LogLevel::Info)
    });
    init_logging_with_config(log_config)?;

    if config.metrics.enabled {
        namecast_core::metrics::init_metrics();
    }

    debug!(config = %config_path.display(), "namecast started");

    match args.command {
        Command::Init { force } => init(&config_path, force)?,
        Command::Id => {
            let keypair = Keypair::load_from_file(&config.node.identity_path).with_context(|| {
                format!(
                    "no identity at {}, run `namecast init` first",
                    config.node.identity_path.display()
                )
            })?;
            println!("{}", keypair.peer_id());
        }
        Command::Import { name, file } => import(&config, &name, &file).await?,
        Command::Resolve {
            name,
            recursive,
            nocache,
        } => {
            let node = Node::start(&config).await?;
            let resolver = NameResolver::new(
                node.store.clone(),
                ResolverOptions::from(config.resolver.clone()),
            );
            let path = resolver
                .resolve(&name, ResolveOptions { recursive, nocache })
                .await?;
            println!("{}", path);
        }
        Command::Pubsub { command } => {
            let names = if config.pubsub.enabled {
                NamePubsub::enabled(Node::start(&config).await?.store)
            } else {
                NamePubsub::disabled()
            };

            match command {
                PubsubCommand::State => {
                    println!("{}", serde_json::to_string(&names.state())?);
                }
                PubsubCommand::Subs => {
                    for peer in names.subs().await? {
                        println!("{}{}", IPNS_PREFIX, peer);
                    }
                }
            }
        }
    }

    Ok(())
}
