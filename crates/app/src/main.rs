//! Relay API workbench - Main Entry Point
//!
//! Loads configuration, builds the configured storage backend, hydrates
//! the collection store and runs one command:
//!
//! ```text
//! relay [--config <file>] workspaces
//! relay [--config <file>] tree
//! relay [--config <file>] send <request-id>
//! ```

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use relay_application::{
    CancellationToken, CollectionStore, ExecuteRequest, PersistenceAdapter, WorkspaceSwitch,
};
use relay_domain::{Item, SendState, TreeNode};
use relay_infrastructure::{
    DiskAdapter, KvAdapter, RemoteAdapter, ReqwestHttpClient, SystemClock, TokioFileSystem,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{AppConfig, BackendKind};

type BoxError = Box<dyn std::error::Error>;

const USAGE: &str = "usage: relay [--config <file>] <workspaces | tree | send <request-id>>";

/// What to do after hydration.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Workspaces,
    Tree,
    Send(String),
}

/// Parsed command line.
#[derive(Debug, PartialEq, Eq)]
struct Cli {
    config: Option<PathBuf>,
    command: Command,
}

impl Cli {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, String> {
        let mut args = args.into_iter();
        let mut config = None;
        let mut command = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let path = args.next().ok_or("--config needs a file")?;
                    config = Some(PathBuf::from(path));
                }
                "workspaces" => command = Some(Command::Workspaces),
                "tree" => command = Some(Command::Tree),
                "send" => {
                    let id = args.next().ok_or("send needs a request id")?;
                    command = Some(Command::Send(id));
                }
                other => return Err(format!("unknown argument `{other}`\n{USAGE}")),
            }
        }

        let command = command.ok_or_else(|| USAGE.to_string())?;
        Ok(Self { config, command })
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse(std::env::args().skip(1))?;
    let config = match &cli.config {
        Some(path) => AppConfig::load_file(path)?,
        None => AppConfig::load()?,
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = ?config.backend,
        "starting relay"
    );

    let adapter = build_adapter(&config)?;
    let mut store = CollectionStore::new(adapter, Arc::new(SystemClock::new()));
    store.subscribe(|event| debug!(?event, "store event"));

    if let Err(error) = store.hydrate().await {
        warn!(%error, "storage unavailable, continuing in memory");
    }

    if let Some(workspace) = config.workspace.as_deref() {
        match store.set_active_workspace(workspace).await {
            WorkspaceSwitch::Unchanged => warn!(workspace, "unknown workspace, staying on default"),
            WorkspaceSwitch::Loaded { items } => info!(workspace, items, "workspace activated"),
            WorkspaceSwitch::MemoryOnly { error } => {
                warn!(workspace, %error, "workspace activated without its items");
            }
        }
    }

    match cli.command {
        Command::Workspaces => print_workspaces(&store),
        Command::Tree => print_tree(&store.collection_tree(), 0),
        Command::Send(id) => send(&store, &config, &id).await?,
    }

    Ok(())
}

fn build_adapter(config: &AppConfig) -> Result<Arc<dyn PersistenceAdapter>, BoxError> {
    let adapter: Arc<dyn PersistenceAdapter> = match config.backend {
        BackendKind::Disk => Arc::new(DiskAdapter::new(
            TokioFileSystem::new(),
            config.data_dir.join("workspaces"),
        )),
        BackendKind::Kv => Arc::new(KvAdapter::open(config.data_dir.join("relay.db"))?),
        BackendKind::Remote => Arc::new(RemoteAdapter::new(
            config.remote_url()?,
            config.timeout(),
        )?),
    };
    Ok(adapter)
}

fn print_workspaces(store: &CollectionStore) {
    let active = store.active_workspace_id();
    for workspace in store.workspaces() {
        let marker = if workspace.id == active { "*" } else { " " };
        println!(
            "{marker} {:<24} {} ({} variables)",
            workspace.id,
            workspace.name,
            workspace.variables.len()
        );
    }
}

fn print_tree(nodes: &[TreeNode], depth: usize) {
    for node in nodes {
        let indent = "  ".repeat(depth);
        match &node.item {
            Item::Folder(folder) => println!("{indent}{}/", folder.name),
            Item::Request(request) => println!(
                "{indent}{:<7} {}  [{}]",
                request.method.as_str(),
                request.name,
                request.id
            ),
        }
        print_tree(&node.children, depth + 1);
    }
}

async fn send(store: &CollectionStore, config: &AppConfig, id: &str) -> Result<(), BoxError> {
    let request = store
        .item(id)
        .and_then(Item::as_request)
        .ok_or_else(|| format!("no request with id `{id}` in the active workspace"))?
        .clone();
    let variables = store
        .current_workspace()
        .map(|workspace| workspace.variables.clone())
        .unwrap_or_default();

    let client = ReqwestHttpClient::with_timeout(config.timeout())?;
    let executor = ExecuteRequest::new(Arc::new(client));

    let (token, receiver) = CancellationToken::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let mut state = SendState::default();
    state.begin();
    info!(request_id = %request.id, method = %request.method, "sending request");

    let Some(response) = executor
        .execute_with_cancellation(&request, &variables, receiver)
        .await
    else {
        state.cancel();
        warn!(request_id = %request.id, "send cancelled");
        return Ok(());
    };
    state.complete(response);

    match &state {
        SendState::Success { response } => {
            println!(
                "{} {}  {}  {}",
                response.status,
                response.status_text,
                response.time_display(),
                response.size_display()
            );
            for (name, value) in &response.headers {
                println!("{name}: {value}");
            }
            println!();
            println!("{}", response.body.to_display_string());
        }
        SendState::Failure { response } => {
            let message = response.error.as_deref().unwrap_or("unknown error");
            println!("Network Error: {message}");
        }
        SendState::Idle | SendState::Sending { .. } => {}
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Cli::parse(args(&["tree"])).unwrap(),
            Cli {
                config: None,
                command: Command::Tree
            }
        );
        assert_eq!(
            Cli::parse(args(&["--config", "dev.toml", "send", "abc"])).unwrap(),
            Cli {
                config: Some(PathBuf::from("dev.toml")),
                command: Command::Send("abc".to_string())
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Cli::parse(args(&[])).is_err());
        assert!(Cli::parse(args(&["send"])).is_err());
        assert!(Cli::parse(args(&["--config"])).is_err());
        assert!(Cli::parse(args(&["bogus"])).is_err());
    }

    #[test]
    fn test_build_disk_adapter() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            data_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        assert!(build_adapter(&config).is_ok());
    }

    #[test]
    fn test_remote_backend_needs_url() {
        let config = AppConfig {
            backend: BackendKind::Remote,
            ..AppConfig::default()
        };
        assert!(build_adapter(&config).is_err());
    }
}
