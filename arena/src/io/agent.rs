//! Collaborator boundaries for player agents and narration.
//!
//! The [`PlayerAgent`] and [`NarrationAgent`] traits decouple phase
//! orchestration from the backing model. The shipped implementations are
//! [`CommandAgent`], which pipes the prompt (plus the visibility-filtered
//! transcript) to a configured command and reads the response from stdout,
//! and [`StockNarrator`], canned narration so a match can run without any
//! model behind the narrator seat. Tests use scripted implementations that
//! return predetermined text without spawning processes.

use std::collections::BTreeSet;
use std::process::Command;
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use tracing::{debug, instrument};

use crate::core::types::GameMessage;
use crate::io::config::MatchConfig;
use crate::io::process::run_command_with_timeout;

/// One agent-controlled seat in a match.
///
/// `history` is already visibility-filtered by the controller: it never
/// contains another participant's private messages or narrator-only
/// messages.
pub trait PlayerAgent {
    /// Solicit the introduction. The prompt carries the avoid-these-names
    /// hint; there is no history yet.
    fn introduce(&mut self, prompt: &str) -> Result<String>;

    /// Solicit free-text content (discussion, deliberation, a ballot) given
    /// the participant's view of the transcript.
    fn respond(&mut self, history: &[GameMessage], prompt: &str) -> Result<String>;
}

/// The non-player announcer.
pub trait NarrationAgent {
    fn announce_night(&mut self) -> Result<String>;
    fn announce_dawn(&mut self) -> Result<String>;
    fn announce_deaths(&mut self, deaths: &BTreeSet<String>) -> Result<String>;
    fn announce_vote(&mut self) -> Result<String>;
    /// Asked after each full discussion round. The controller additionally
    /// enforces a hard round cap, so a misbehaving answer cannot loop the
    /// day phase forever.
    fn should_end_discussion(&mut self, recent_round: &[GameMessage]) -> Result<bool>;
}

/// Agent backed by a child process: transcript and prompt on stdin, response
/// on stdout.
#[derive(Debug, Clone)]
pub struct CommandAgent {
    command: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl CommandAgent {
    pub fn new(command: Vec<String>, timeout: Duration, output_limit_bytes: usize) -> Result<Self> {
        if command.is_empty() || command[0].trim().is_empty() {
            return Err(anyhow!("agent command must be a non-empty array"));
        }
        Ok(Self {
            command,
            timeout,
            output_limit_bytes,
        })
    }

    pub fn from_config(config: &MatchConfig) -> Result<Self> {
        Self::new(
            config.agent.command.clone(),
            Duration::from_secs(config.agent_timeout_secs),
            config.agent_output_limit_bytes,
        )
    }

    #[instrument(skip_all, fields(command = %self.command[0], input_bytes = input.len()))]
    fn solicit(&self, input: &str) -> Result<String> {
        let mut cmd = Command::new(&self.command[0]);
        cmd.args(&self.command[1..]);
        let output = run_command_with_timeout(
            cmd,
            Some(input.as_bytes()),
            self.timeout,
            self.output_limit_bytes,
        )?;
        if output.timed_out {
            bail!("agent command timed out after {:?}", self.timeout);
        }
        if !output.status.success() {
            bail!(
                "agent command failed with status {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        let response = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(response_bytes = response.len(), "agent responded");
        Ok(response)
    }
}

impl PlayerAgent for CommandAgent {
    fn introduce(&mut self, prompt: &str) -> Result<String> {
        self.solicit(prompt)
    }

    fn respond(&mut self, history: &[GameMessage], prompt: &str) -> Result<String> {
        self.solicit(&render_transcript(history, prompt))
    }
}

/// Flatten a visibility-filtered history and the prompt into one stdin
/// payload.
fn render_transcript(history: &[GameMessage], prompt: &str) -> String {
    let mut buf = String::new();
    for msg in history {
        buf.push_str(&format!(
            "[{}] {}: {}\n",
            msg.phase.as_str(),
            msg.author,
            msg.content
        ));
    }
    if !buf.is_empty() {
        buf.push('\n');
    }
    buf.push_str(prompt);
    buf
}

/// Canned narration with a fixed discussion budget.
///
/// `should_end_discussion` answers true once `rounds_before_vote` rounds
/// have been observed; the counter resets when the vote is announced so the
/// next day starts fresh.
#[derive(Debug, Clone)]
pub struct StockNarrator {
    rounds_before_vote: u32,
    rounds_seen: u32,
}

impl StockNarrator {
    pub fn new(rounds_before_vote: u32) -> Self {
        Self {
            rounds_before_vote,
            rounds_seen: 0,
        }
    }
}

impl Default for StockNarrator {
    fn default() -> Self {
        Self::new(2)
    }
}

impl NarrationAgent for StockNarrator {
    fn announce_night(&mut self) -> Result<String> {
        Ok("Night falls over the village. Everyone, close your eyes.".to_string())
    }

    fn announce_dawn(&mut self) -> Result<String> {
        Ok("The sun rises. The village slowly wakes.".to_string())
    }

    fn announce_deaths(&mut self, deaths: &BTreeSet<String>) -> Result<String> {
        if deaths.is_empty() {
            return Ok("The night passed quietly. Everyone is still here.".to_string());
        }
        let names: Vec<&str> = deaths.iter().map(String::as_str).collect();
        Ok(format!(
            "Dawn breaks with terrible news: we lost {} during the night.",
            names.join(", ")
        ))
    }

    fn announce_vote(&mut self) -> Result<String> {
        self.rounds_seen = 0;
        Ok("It is time to vote. Name the player you want to exile.".to_string())
    }

    fn should_end_discussion(&mut self, _recent_round: &[GameMessage]) -> Result<bool> {
        self.rounds_seen += 1;
        Ok(self.rounds_seen >= self.rounds_before_vote)
    }
}
