use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Settings for spawning the interpreter, normally loaded from
/// `config/frotz.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct FrotzConfig {
    /// Interpreter binary; must support dumb/plain output via `-p`.
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Story file, e.g. `games/LostPig.z8`.
    pub game_file: PathBuf,
    /// Silence on stdout for this long after any output means the game is
    /// waiting at its prompt.
    #[serde(default = "default_prompt_quiet_ms")]
    pub prompt_quiet_ms: u64,
    /// Hard cap on waiting for one reply.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

fn default_binary() -> String {
    "frotz".to_string()
}

fn default_prompt_quiet_ms() -> u64 {
    300
}

fn default_read_timeout_ms() -> u64 {
    5000
}

/// Minimal config loader.
///
/// Search order:
/// 1) `GRUNK_CONFIG_DIR/<relative_path>`
/// 2) `./<relative_path>`
/// 3) `<repo_root>/config/<relative_path>` (repo-local convenience)
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn parse_from_file<T: DeserializeOwned>(relative_path: &str) -> anyhow::Result<T> {
        let path = Self::resolve_path(relative_path)?;
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        Self::parse_from_string(text)
    }

    pub fn parse_from_string<T: DeserializeOwned>(text: String) -> anyhow::Result<T> {
        toml::from_str(&text).with_context(|| "Failed to parse TOML")
    }

    fn resolve_path(relative_path: &str) -> anyhow::Result<PathBuf> {
        let rel = Path::new(relative_path);

        if let Some(root) = env::var_os("GRUNK_CONFIG_DIR") {
            let candidate = PathBuf::from(root).join(rel);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        if let Ok(cwd) = env::current_dir() {
            let candidate = cwd.join(rel);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        // Repo convenience: this crate lives at <repo_root>/crates/frotz-env.
        let candidate = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .ancestors()
            .nth(2)
            .ok_or_else(|| anyhow::anyhow!("CARGO_MANIFEST_DIR has insufficient ancestors"))?
            .join("config")
            .join(rel);
        if candidate.is_file() {
            return Ok(candidate);
        }

        anyhow::bail!("Config file not found for {:?}", rel);
    }
}
