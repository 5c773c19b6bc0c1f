//! `santa`: command-line client for the Secret Santa server.
//!
//! # Usage
//!
//! ```text
//! santa register "Alice" alice@example.com --wishlist "books"
//! santa lookup alice@example.com
//! santa --admin-code hunter2 draw
//! santa --config ~/.config/santa/config.toml pairs
//! ```

mod client;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use santa_core::{
  game::GameState,
  participant::{NewParticipant, Participant, ParticipantId, ParticipantUpdate},
};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:5000";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "santa", about = "Client for the Secret Santa exchange")]
struct Args {
  /// Path to a TOML config file (url, admin_code).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the santa server (default: http://localhost:5000).
  #[arg(long, env = "SANTA_URL")]
  url: Option<String>,

  /// Admin code, needed for admin commands.
  #[arg(long, env = "SANTA_ADMIN_CODE", hide_env_values = true)]
  admin_code: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show the current game state.
  Status,
  /// Register a participant.
  Register {
    name:     String,
    email:    String,
    #[arg(long)]
    wishlist: Option<String>,
  },
  /// Show a participant and, once drawn, who they give to.
  Lookup { email: String },
  /// Check whether an email is registered.
  Check { email: String },
  /// [admin] List participants.
  Participants,
  /// [admin] Edit a participant; omitted fields are kept.
  Edit {
    id:       i64,
    #[arg(long)]
    name:     Option<String>,
    #[arg(long)]
    email:    Option<String>,
    /// Pass an empty string to clear.
    #[arg(long)]
    wishlist: Option<String>,
  },
  /// [admin] Show every giver and recipient.
  Pairs,
  /// [admin] Run the draw.
  Draw,
  /// [admin] Delete all participants and reopen registration.
  Reset {
    /// Confirm the reset.
    #[arg(long)]
    yes: bool,
  },
  /// [admin] Set the gift price limit.
  PriceLimit { amount: f64 },
  /// [admin] Show the game state history.
  History,
}

impl Command {
  fn needs_admin(&self) -> bool {
    !matches!(
      self,
      Command::Status
        | Command::Register { .. }
        | Command::Lookup { .. }
        | Command::Check { .. }
    )
  }
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug)]
struct ConfigFile {
  #[serde(default)]
  url:        String,
  #[serde(default)]
  admin_code: String,
}

/// CLI flags (and their env fallbacks) override the config file, which
/// overrides defaults.
fn resolve_config(url: Option<String>, admin_code: Option<String>, file: &ConfigFile) -> ApiConfig {
  let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
  ApiConfig {
    base_url:   url
      .or_else(|| non_empty(&file.url))
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
    admin_code: admin_code.or_else(|| non_empty(&file.admin_code)),
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let mut client = ApiClient::new(resolve_config(args.url, args.admin_code, &file_cfg))?;

  if !args.command.needs_admin() {
    return run_public(&client, args.command).await;
  }

  client.login().await?;
  let result = run_admin(&client, args.command).await;
  if let Err(e) = client.logout().await {
    tracing::warn!(error = %e, "logout failed");
  }
  result
}

async fn run_public(client: &ApiClient, command: Command) -> Result<()> {
  match command {
    Command::Status => print_state(&client.game().await?),
    Command::Register { name, email, wishlist } => {
      let input = NewParticipant::new(&name, &email, wishlist.as_deref())?;
      let p = client.register(&input).await?;
      println!("Registered {} <{}> as #{}", p.name, p.email, p.participant_id);
    }
    Command::Lookup { email } => {
      let view = client.lookup(&email).await?;
      print_participant(&view.participant);
      match view.recipient {
        Some(r) => {
          println!("You give to: {} <{}>", r.name, r.email);
          println!("  wishlist: {}", r.wishlist.as_deref().unwrap_or("-"));
        }
        None => println!("The draw has not happened yet."),
      }
      if let Some(limit) = view.game.price_limit {
        println!("Price limit: {limit:.2}");
      }
    }
    Command::Check { email } => {
      if client.check(&email).await? {
        println!("{email} is registered");
      } else {
        println!("{email} is not registered");
      }
    }
    other => bail!("{other:?} requires admin access"),
  }
  Ok(())
}

async fn run_admin(client: &ApiClient, command: Command) -> Result<()> {
  match command {
    Command::Participants => {
      let participants = client.participants().await?;
      if participants.is_empty() {
        println!("No participants.");
      }
      for p in &participants {
        print_participant(p);
      }
    }
    Command::Edit { id, name, email, wishlist } => {
      let id = ParticipantId(id);
      let current = client.participant(id).await?;
      let update = merge_update(&current, name, email, wishlist)?;
      let p = client.update_participant(id, &update).await?;
      print_participant(&p);
    }
    Command::Pairs => {
      let pairs = client.pairs().await?;
      if pairs.is_empty() {
        println!("No pairs yet.");
      }
      for pair in pairs {
        println!(
          "{} <{}> → {} <{}>",
          pair.giver.name, pair.giver.email, pair.recipient.name, pair.recipient.email
        );
      }
    }
    Command::Draw => {
      let outcome = client.draw().await?;
      println!(
        "Drew {} pairs ({:?} after {} shuffles).",
        outcome.pairings.len(),
        outcome.method,
        outcome.shuffles
      );
    }
    Command::Reset { yes } => {
      if !yes {
        bail!("reset deletes every participant; pass --yes to confirm");
      }
      print_state(&client.reset().await?);
    }
    Command::PriceLimit { amount } => print_state(&client.set_price_limit(amount).await?),
    Command::History => {
      for t in client.history().await? {
        println!("v{:<4} {:<13} {}", t.version, t.status, local(t.recorded_at));
      }
    }
    other => bail!("{other:?} is not an admin command"),
  }
  Ok(())
}

/// Apply the given overrides to `current`.
fn merge_update(
  current: &Participant,
  name: Option<String>,
  email: Option<String>,
  wishlist: Option<String>,
) -> Result<ParticipantUpdate> {
  let wishlist = match wishlist {
    Some(w) => Some(w),
    None => current.wishlist.clone(),
  };
  Ok(ParticipantUpdate::new(
    name.as_deref().unwrap_or(&current.name),
    email.as_deref().unwrap_or(&current.email),
    wishlist.as_deref(),
  )?)
}

// ─── Output ───────────────────────────────────────────────────────────────────

fn local(dt: DateTime<Utc>) -> String {
  dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn print_state(state: &GameState) {
  println!("Status:      {}", state.status);
  match state.price_limit {
    Some(limit) => println!("Price limit: {limit:.2}"),
    None => println!("Price limit: -"),
  }
  if let Some(drawn_at) = state.drawn_at {
    println!("Drawn at:    {}", local(drawn_at));
  }
}

fn print_participant(p: &Participant) {
  println!("#{} {} <{}>", p.participant_id, p.name, p.email);
  if let Some(w) = &p.wishlist {
    println!("  wishlist: {w}");
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn file(url: &str, code: &str) -> ConfigFile {
    ConfigFile { url: url.into(), admin_code: code.into() }
  }

  #[test]
  fn flags_override_file_which_overrides_defaults() {
    let cfg = resolve_config(None, None, &ConfigFile::default());
    assert_eq!(cfg, ApiConfig { base_url: DEFAULT_URL.into(), admin_code: None });

    let cfg = resolve_config(None, None, &file("http://santa.lan", "from-file"));
    assert_eq!(cfg.base_url, "http://santa.lan");
    assert_eq!(cfg.admin_code.as_deref(), Some("from-file"));

    let cfg = resolve_config(
      Some("http://flag".into()),
      Some("from-flag".into()),
      &file("http://santa.lan", "from-file"),
    );
    assert_eq!(cfg.base_url, "http://flag");
    assert_eq!(cfg.admin_code.as_deref(), Some("from-flag"));
  }

  #[test]
  fn config_file_parses_from_toml() {
    let cfg: ConfigFile = toml::from_str("url = \"http://santa.lan\"\n").unwrap();
    assert_eq!(cfg.url, "http://santa.lan");
    assert!(cfg.admin_code.is_empty());
  }

  #[test]
  fn only_admin_commands_need_a_session() {
    assert!(!Command::Status.needs_admin());
    assert!(!Command::Lookup { email: "a@b".into() }.needs_admin());
    assert!(Command::Draw.needs_admin());
    assert!(Command::Reset { yes: true }.needs_admin());
  }

  #[test]
  fn edit_keeps_unspecified_fields() {
    let current = Participant {
      participant_id: ParticipantId(1),
      name:           "Alice".into(),
      email:          "alice@example.com".into(),
      wishlist:       Some("books".into()),
      recipient_id:   None,
      registered_at:  Utc::now(),
    };

    let update = merge_update(&current, Some("Alice Smith".into()), None, None).unwrap();
    assert_eq!(update.name, "Alice Smith");
    assert_eq!(update.email, "alice@example.com");
    assert_eq!(update.wishlist.as_deref(), Some("books"));

    let update = merge_update(&current, None, None, Some(String::new())).unwrap();
    assert_eq!(update.wishlist, None);
  }

  #[test]
  fn args_parse() {
    let args = Args::try_parse_from(["santa", "--url", "http://x", "price-limit", "25"]).unwrap();
    assert_eq!(args.url.as_deref(), Some("http://x"));
    assert!(matches!(args.command, Command::PriceLimit { amount } if amount == 25.0));
  }
}
