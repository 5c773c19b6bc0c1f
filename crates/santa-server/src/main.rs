//! santa-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `SANTA_*` environment variables, opens the SQLite store and serves the
//! JSON API over HTTP.
//!
//! # Admin code hash generation
//!
//! To generate the argon2 PHC string for `admin_code_hash`:
//!
//! ```text
//! cargo run -p santa-server -- --hash-admin-code
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use chrono::Duration;
use clap::Parser;
use santa_core::{
  draw::{AssignmentEngine, DrawPolicy, RngSource},
  exchange::Exchange,
};
use santa_server::{
  AppState, ServerConfig,
  auth::{AdminAuth, SessionRegistry, hash_admin_code},
  settings::expand_tilde,
};
use santa_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Secret Santa exchange server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for an admin code entered on stdin and exit.
  #[arg(long)]
  hash_admin_code: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_admin_code {
    let code = read_code()?;
    let hash = hash_admin_code(&code).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let policy = DrawPolicy { max_reshuffles: server_cfg.draw_max_reshuffles };
  let source = match server_cfg.draw_seed {
    Some(seed) => {
      tracing::warn!(seed, "draws use a fixed seed");
      RngSource::from_seed(seed)
    }
    None => RngSource::from_entropy(),
  };

  let state = AppState {
    exchange: Arc::new(Exchange::new(
      Arc::new(store),
      AssignmentEngine::new(policy, source),
    )),
    auth:     Arc::new(AdminAuth::new(server_cfg.admin_code_hash.clone())),
    sessions: Arc::new(SessionRegistry::new(Duration::minutes(
      server_cfg.session_ttl_minutes,
    ))),
  };

  let app = santa_server::router(state);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read the admin code from stdin.
fn read_code() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Admin code: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  let code = line.trim_end_matches(['\n', '\r']).to_string();
  anyhow::ensure!(!code.is_empty(), "admin code must not be empty");
  Ok(code)
}
