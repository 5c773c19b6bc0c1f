//! Runtime server configuration.
//!
//! Read from an optional TOML file, then overridden by `SANTA_*` environment
//! variables (e.g. `SANTA_PORT=8080`, `SANTA_ADMIN_CODE_HASH=...`).

use std::path::{Path, PathBuf};

use santa_core::draw::DEFAULT_MAX_RESHUFFLES;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  /// argon2 PHC string of the admin code.
  pub admin_code_hash:     String,
  #[serde(default = "default_session_ttl_minutes")]
  pub session_ttl_minutes: i64,
  #[serde(default = "default_max_reshuffles")]
  pub draw_max_reshuffles: usize,
  /// Fixed seed for reproducible draws; random when unset.
  #[serde(default)]
  pub draw_seed:           Option<u64>,
}

fn default_host() -> String { "0.0.0.0".to_string() }

fn default_port() -> u16 { 5000 }

fn default_store_path() -> PathBuf { PathBuf::from("secret_santa.db") }

fn default_session_ttl_minutes() -> i64 { 12 * 60 }

fn default_max_reshuffles() -> usize { DEFAULT_MAX_RESHUFFLES }

impl ServerConfig {
  /// Layer `path` (if it exists) under the `SANTA_` environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("SANTA").try_parsing(true))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn write_config(name: &str, body: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("santa-{}-{name}.toml", std::process::id()));
    std::fs::write(&path, body).unwrap();
    path
  }

  #[test]
  fn defaults_fill_missing_keys() {
    let path = write_config("defaults", "admin_code_hash = \"$argon2id$stub\"\n");
    let cfg = ServerConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(cfg.admin_code_hash, "$argon2id$stub");
    assert_eq!(cfg.port, 5000);
    assert_eq!(cfg.store_path, PathBuf::from("secret_santa.db"));
    assert_eq!(cfg.session_ttl_minutes, 720);
    assert_eq!(cfg.draw_max_reshuffles, 100);
    assert_eq!(cfg.draw_seed, None);
    assert_eq!(cfg.address(), "0.0.0.0:5000");
  }

  #[test]
  fn file_values_are_used() {
    let path = write_config(
      "values",
      r#"
host = "127.0.0.1"
port = 8080
store_path = "/tmp/santa.db"
admin_code_hash = "$argon2id$stub"
draw_max_reshuffles = 3
draw_seed = 7
"#,
    );
    let cfg = ServerConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.draw_max_reshuffles, 3);
    assert_eq!(cfg.draw_seed, Some(7));
  }

  #[test]
  fn admin_code_hash_is_required() {
    let path = write_config("missing", "port = 1234\n");
    let result = ServerConfig::load(&path);
    std::fs::remove_file(&path).ok();
    assert!(result.is_err());
  }

  #[test]
  fn tilde_is_expanded_against_home() {
    let plain = Path::new("/var/lib/santa.db");
    assert_eq!(expand_tilde(plain), plain);
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(
        expand_tilde(Path::new("~/santa.db")),
        PathBuf::from(home).join("santa.db")
      );
    }
  }
}
