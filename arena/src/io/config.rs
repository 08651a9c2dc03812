//! Match configuration stored as `arena.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::roles::MIN_PLAYERS;

/// Match configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to sensible values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchConfig {
    /// Number of agent seats per match.
    pub players: usize,

    /// How many matches `arena run` plays back to back.
    pub matches: u32,

    /// Hard cap on day-phase discussion rounds, enforced locally regardless
    /// of the narrator's answer.
    pub max_discussion_rounds: u32,

    /// Wall-clock budget for one agent solicitation, in seconds.
    pub agent_timeout_secs: u64,

    /// Truncate agent stdout/stderr capture beyond this many bytes.
    pub agent_output_limit_bytes: usize,

    /// Directory for per-match JSONL event logs.
    pub log_dir: PathBuf,

    /// Seed for the match RNG (role shuffle, tie breaks, fallback picks).
    /// Unset means entropy-seeded, non-reproducible matches.
    pub seed: Option<u64>,

    pub agent: AgentConfig,
    pub narration: NarrationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentConfig {
    /// Command to execute per solicitation (e.g. `["ollama","run","llama3.2"]`).
    /// The prompt arrives on stdin; the response is read from stdout.
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NarrationConfig {
    /// Discussion rounds the stock narrator allows before calling the vote.
    pub rounds_before_vote: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "ollama".to_string(),
                "run".to_string(),
                "llama3.2".to_string(),
            ],
        }
    }
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            rounds_before_vote: 2,
        }
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            players: 7,
            matches: 1,
            max_discussion_rounds: 5,
            agent_timeout_secs: 120,
            agent_output_limit_bytes: 100_000,
            log_dir: PathBuf::from("match_logs"),
            seed: None,
            agent: AgentConfig::default(),
            narration: NarrationConfig::default(),
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.players < MIN_PLAYERS {
            return Err(anyhow!("players must be at least {MIN_PLAYERS}"));
        }
        if self.matches == 0 {
            return Err(anyhow!("matches must be > 0"));
        }
        if self.max_discussion_rounds == 0 {
            return Err(anyhow!("max_discussion_rounds must be > 0"));
        }
        if self.agent_timeout_secs == 0 {
            return Err(anyhow!("agent_timeout_secs must be > 0"));
        }
        if self.agent_output_limit_bytes == 0 {
            return Err(anyhow!("agent_output_limit_bytes must be > 0"));
        }
        if self.agent.command.is_empty() || self.agent.command[0].trim().is_empty() {
            return Err(anyhow!("agent.command must be a non-empty array"));
        }
        if self.narration.rounds_before_vote == 0 {
            return Err(anyhow!("narration.rounds_before_vote must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `MatchConfig::default()`.
pub fn load_config(path: &Path) -> Result<MatchConfig> {
    if !path.exists() {
        let cfg = MatchConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: MatchConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &MatchConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
