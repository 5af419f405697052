// crates/edge/src/cli.rs

use adapt::{ConfigStore, FileCache, LoadSource, PostgrestStore, RemoteStore};
use chrono::Utc;
use clap::{builder::ValueHint, Parser, Subcommand};
use domain::setting::{validate_remote_url, Settings, DEFAULT_TIMEOUT_SECS};
use serve::AppState;
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
    time::Duration,
};
use tracing::{error, info};
use url::Url;

use crate::Error;

pub type Result<T> = std::result::Result<T, Error>;

const SETTINGS_FILE: &str = "settings.toml";
const DEFAULT_CACHE_DIR: &str = ".cache";

/// The Archive CLI
#[tokio::main(flavor = "multi_thread")]
#[tracing::instrument(skip_all)]
pub async fn start() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Start(start) => do_start(start).await,
    };

    result.map_or_else(
        |e| {
            error!("The Archive failed: {}", e);
            ExitCode::FAILURE
        },
        |_| {
            info!("The Archive shut down cleanly");
            ExitCode::SUCCESS
        },
    )
}

#[tracing::instrument(skip_all)]
async fn do_start(start: StartCmd) -> Result<()> {
    let then = Utc::now();
    let process = StartProcess::<CommandIssued>::parse_settings_file(start)?;
    info!(
        "Settings parsed in {} milliseconds",
        Utc::now().timestamp_millis() - then.timestamp_millis()
    );

    let then = Utc::now();
    let process = process.build_store()?;
    info!(
        "Stores wired in {} milliseconds",
        Utc::now().timestamp_millis() - then.timestamp_millis()
    );

    // The document must be resolved before the API can touch it.
    let then = Utc::now();
    let process = process.load_document().await;
    info!(
        "Config loaded from {:?} in {} milliseconds",
        process.state.source,
        Utc::now().timestamp_millis() - then.timestamp_millis()
    );

    process.serve().await
}

#[derive(Parser, Debug)]
#[command(name = "archive", version, about = "The Archive site configuration service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the admin API for the site in the specified directory
    Start(StartCmd),
}

#[derive(Parser, Debug)]
pub struct StartCmd {
    /// Site directory (or set ARCHIVE_DIR)
    ///
    /// Holds the optional `settings.toml` and the local cache.
    #[arg(
        value_name = "DIR",
        env = "ARCHIVE_DIR",
        required = true,
        value_hint = ValueHint::DirPath,
        value_parser = dir_must_exist
    )]
    pub dir: PathBuf,

    /// PostgREST base URL; overrides `[remote].url`
    #[arg(long, value_name = "URL", env = "ARCHIVE_POSTGREST_URL", value_parser = remote_url)]
    pub remote: Option<Url>,

    /// Listen address; overrides `[server]`
    #[arg(long, value_name = "ADDR", env = "ARCHIVE_BIND")]
    pub bind: Option<SocketAddr>,
}

fn dir_must_exist(s: &str) -> std::result::Result<PathBuf, String> {
    let p = PathBuf::from(s);
    if !p.exists() {
        return Err(format!("Not found: {}", p.display()));
    }
    if !p.is_dir() {
        return Err(format!("Not a directory: {}", p.display()));
    }
    Ok(p)
}

fn remote_url(s: &str) -> std::result::Result<Url, String> {
    validate_remote_url(s)
}

// ─────────────────────────────────────────────────────────────────────────────
// Start process state machine
// ─────────────────────────────────────────────────────────────────────────────

trait ProcessState {}

struct CommandIssued;

/// Settings file merged with CLI/env overrides.
#[derive(Debug)]
struct SettingsLoaded {
    bind: SocketAddr,
    cache_dir: PathBuf,
    remote: Option<Url>,
    timeout: Duration,
}

struct StoreBuilt {
    bind: SocketAddr,
    store: Arc<ConfigStore>,
}

struct DocumentLoaded {
    bind: SocketAddr,
    store: Arc<ConfigStore>,
    source: LoadSource,
}

impl ProcessState for CommandIssued {}
impl ProcessState for SettingsLoaded {}
impl ProcessState for StoreBuilt {}
impl ProcessState for DocumentLoaded {}

struct StartProcess<S: ProcessState> {
    state: S,
}

/// Read `<dir>/settings.toml`; a missing file means all defaults.
fn read_settings(dir: &Path) -> Result<Settings> {
    let path = dir.join(SETTINGS_FILE);
    if !path.exists() {
        info!("{} not found; using defaults", path.display());
        return Ok(Settings::default());
    }

    let text = std::fs::read_to_string(&path)
        .map_err(|err| Error::Config(format!("Failed reading {}: {}", path.display(), err)))?;

    toml::from_str(&text).map_err(|err| {
        Error::Config(format!(
            "Invalid settings.toml at {}: {}",
            path.display(),
            err
        ))
    })
}

impl StartProcess<CommandIssued> {
    #[tracing::instrument(skip_all)]
    fn parse_settings_file(command: StartCmd) -> Result<StartProcess<SettingsLoaded>> {
        let settings = read_settings(&command.dir)?;

        let bind = command
            .bind
            .unwrap_or_else(|| SocketAddr::new(settings.server.ip, settings.server.port));

        let cache_dir = match &settings.cache {
            Some(cache) => command.dir.join(&cache.dir),
            None => command.dir.join(DEFAULT_CACHE_DIR),
        };

        let remote = match (command.remote, &settings.remote) {
            (Some(url), _) => Some(url),
            (None, Some(r)) => Some(
                validate_remote_url(&r.url)
                    .map_err(|e| Error::Config(format!("[remote].url `{}`: {e}", r.url)))?,
            ),
            (None, None) => None,
        };

        let timeout = Duration::from_secs(
            settings
                .remote
                .as_ref()
                .map_or(DEFAULT_TIMEOUT_SECS, |r| r.timeout_secs),
        );

        Ok(StartProcess {
            state: SettingsLoaded {
                bind,
                cache_dir,
                remote,
                timeout,
            },
        })
    }
}

impl StartProcess<SettingsLoaded> {
    #[tracing::instrument(skip_all)]
    fn build_store(self) -> Result<StartProcess<StoreBuilt>> {
        let cache = Arc::new(FileCache::open(&self.state.cache_dir)?);

        let remote = match &self.state.remote {
            Some(url) => {
                info!(%url, "using PostgREST store");
                let store: Arc<dyn RemoteStore> =
                    Arc::new(PostgrestStore::new(url, self.state.timeout)?);
                Some(store)
            }
            None => None,
        };

        Ok(StartProcess {
            state: StoreBuilt {
                bind: self.state.bind,
                store: Arc::new(ConfigStore::new(remote, cache)),
            },
        })
    }
}

impl StartProcess<StoreBuilt> {
    #[tracing::instrument(skip_all)]
    async fn load_document(self) -> StartProcess<DocumentLoaded> {
        let source = self.state.store.load().await;
        StartProcess {
            state: DocumentLoaded {
                bind: self.state.bind,
                store: self.state.store,
                source,
            },
        }
    }
}

impl StartProcess<DocumentLoaded> {
    #[tracing::instrument(skip_all)]
    async fn serve(self) -> Result<()> {
        let state = AppState::new(self.state.store);
        serve::serve(self.state.bind, state).await?;
        Ok(())
    }
}
