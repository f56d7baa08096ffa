// # nodednsd - nodedns Daemon
//
// Thin integration layer. All record and store logic lives in nodedns-core
// and the provider crates; the daemon only wires them together:
//
// 1. Parse command line flags
// 2. Initialize logging
// 3. Register providers
// 4. Load the store and start watching its file
// 5. Serve the HTTP control surface until SIGINT/SIGTERM
//
// ## Flags
//
// - `--config <path>`: store file (default `data.json`, `-config` also accepted)
// - `--log-level <level>`: trace, debug, info, warn, error (env `NODEDNS_LOG_LEVEL`)
// - `--listen <ip>`: address to bind (default `0.0.0.0`)
//
// The port comes from the store's `port` field, 8082 when unset.
//
// ## Example
//
// ```bash
// nodednsd --config /var/lib/nodedns/data.json --log-level debug
// ```

mod assets;
mod server;

use anyhow::{Context, Result};
use clap::Parser;
use nodedns_core::{FileBackend, ProviderRegistry, Reconciler, SharedStore, StoreWatcher, WatchHandle};
use std::ffi::OsString;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum NodednsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<NodednsExitCode> for ExitCode {
    fn from(code: NodednsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Command line flags
#[derive(Debug, Parser)]
#[command(name = "nodednsd", version, about = "Point DNS records at configured targets over HTTP")]
struct Cli {
    /// Store file path
    #[arg(long, default_value = "data.json")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "NODEDNS_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Address to bind the HTTP server to
    #[arg(long, default_value = "0.0.0.0")]
    listen: IpAddr,
}

/// Accept the single-dash `-config` spelling
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-config") => OsString::from("--config"),
            Some(s) if s.starts_with("-config=") => OsString::from(format!("-{}", s)),
            _ => arg,
        })
        .collect()
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => {
            // --help / --version
            let _ = e.print();
            return NodednsExitCode::CleanShutdown.into();
        }
        Err(e) => {
            let _ = e.print();
            return NodednsExitCode::ConfigError.into();
        }
    };

    // Initialize tracing
    let log_level: Level = match cli.log_level.parse() {
        Ok(level) => level,
        Err(_) => {
            eprintln!(
                "Log level '{}' is not valid. Valid levels: trace, debug, info, warn, error",
                cli.log_level
            );
            return NodednsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return NodednsExitCode::ConfigError.into();
    }

    info!("Starting nodednsd daemon");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return NodednsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let daemon = match Daemon::start(&cli).await {
            Ok(daemon) => daemon,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return NodednsExitCode::ConfigError;
            }
        };

        if let Err(e) = daemon.serve().await {
            error!("Daemon error: {:#}", e);
            NodednsExitCode::RuntimeError
        } else {
            NodednsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Everything set up before the server accepts connections
struct Daemon {
    listener: tokio::net::TcpListener,
    reconciler: Reconciler,
    _watch: WatchHandle,
}

impl Daemon {
    async fn start(cli: &Cli) -> Result<Self> {
        let registry = ProviderRegistry::new();

        #[cfg(feature = "cloudflare")]
        {
            info!("Registering Cloudflare provider");
            nodedns_provider_cloudflare::register(&registry);
        }

        #[cfg(feature = "aliyun")]
        {
            info!("Registering Aliyun provider");
            nodedns_provider_aliyun::register(&registry);
        }

        let store = SharedStore::open(Arc::new(FileBackend::new(&cli.config)))
            .await
            .with_context(|| format!("Failed to load store {}", cli.config.display()))?;

        let (nodes, forwards, port) = store
            .read(|s| (s.nodes.len(), s.forwards.len(), s.listen_port()))
            .await;
        info!(
            "Store loaded from {}: {} node(s), {} forward(s)",
            store.describe(),
            nodes,
            forwards
        );

        let watch = StoreWatcher::new(&cli.config, store.clone())
            .run()
            .context("Failed to watch store file")?;

        let addr = SocketAddr::new(cli.listen, port);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        Ok(Self {
            listener,
            reconciler: Reconciler::new(Arc::new(registry), store),
            _watch: watch,
        })
    }

    async fn serve(self) -> Result<()> {
        let addr = self.listener.local_addr()?;
        info!("Listening on http://{}", addr);

        axum::serve(self.listener, server::router(self.reconciler))
            .with_graceful_shutdown(wait_for_shutdown())
            .await?;

        info!("Shutting down daemon");
        Ok(())
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() {
    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to setup signal handlers: {}", e);
            std::future::pending::<()>().await;
            return;
        }
    };

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    info!("Received shutdown signal: {}", name);
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal: SIGINT"),
        Err(e) => {
            error!("Failed to wait for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(normalize_args(args.iter().map(OsString::from))).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["nodednsd"]);
        assert_eq!(cli.config, PathBuf::from("data.json"));
        assert_eq!(cli.listen, IpAddr::from([0, 0, 0, 0]));
    }

    #[test]
    fn test_single_dash_config() {
        assert_eq!(
            parse(&["nodednsd", "-config", "/etc/nodedns.json"]).config,
            PathBuf::from("/etc/nodedns.json")
        );
        assert_eq!(
            parse(&["nodednsd", "-config=/tmp/x.json"]).config,
            PathBuf::from("/tmp/x.json")
        );
        assert_eq!(
            parse(&["nodednsd", "--config", "a.json"]).config,
            PathBuf::from("a.json")
        );
    }

    #[test]
    fn test_listen_must_be_ip() {
        let result = Cli::try_parse_from(["nodednsd", "--listen", "not-an-ip"]);
        assert!(result.is_err());
    }
}
