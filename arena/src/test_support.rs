//! Test-only agent, narrator, and event-sink doubles.
//!
//! These implement the collaborator traits with predetermined responses so
//! phase orchestration can be exercised deterministically, without spawning
//! processes.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;

use anyhow::{Result, anyhow, bail};
use serde_json::Value;

use crate::core::types::GameMessage;
use crate::io::agent::{NarrationAgent, PlayerAgent};
use crate::io::event_log::EventSink;

/// Agent that replays scripted responses in order.
#[derive(Debug, Clone)]
pub struct ScriptedAgent {
    introduction: String,
    responses: VecDeque<String>,
    /// When set, `respond` returns this forever once the queue is drained
    /// instead of erroring.
    repeat: Option<String>,
}

impl ScriptedAgent {
    /// Agent with a fixed introduction and a finite response script.
    /// `respond` errors once the script is exhausted.
    pub fn new(introduction: impl Into<String>, responses: &[&str]) -> Self {
        Self {
            introduction: introduction.into(),
            responses: responses.iter().map(|r| r.to_string()).collect(),
            repeat: None,
        }
    }

    /// Agent that answers every solicitation with the same text.
    pub fn repeating(introduction: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            introduction: introduction.into(),
            responses: VecDeque::new(),
            repeat: Some(response.into()),
        }
    }
}

impl PlayerAgent for ScriptedAgent {
    fn introduce(&mut self, _prompt: &str) -> Result<String> {
        Ok(self.introduction.clone())
    }

    fn respond(&mut self, _history: &[GameMessage], _prompt: &str) -> Result<String> {
        if let Some(response) = self.responses.pop_front() {
            return Ok(response);
        }
        match &self.repeat {
            Some(response) => Ok(response.clone()),
            None => Err(anyhow!("scripted agent ran out of responses")),
        }
    }
}

/// Agent whose every solicitation fails, for error-path tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingAgent;

impl PlayerAgent for FailingAgent {
    fn introduce(&mut self, _prompt: &str) -> Result<String> {
        bail!("agent backend unavailable")
    }

    fn respond(&mut self, _history: &[GameMessage], _prompt: &str) -> Result<String> {
        bail!("agent backend unavailable")
    }
}

/// Narrator with canned announcements and a scripted answer sheet for
/// `should_end_discussion`. Once the sheet is drained the default answer
/// applies.
#[derive(Debug, Clone)]
pub struct ScriptedNarrator {
    end_answers: VecDeque<bool>,
    default_answer: bool,
}

impl ScriptedNarrator {
    pub fn new(end_answers: &[bool], default_answer: bool) -> Self {
        Self {
            end_answers: end_answers.iter().copied().collect(),
            default_answer,
        }
    }

    /// Narrator that never agrees to end discussion, so the controller's
    /// round cap decides.
    pub fn never_ending() -> Self {
        Self::new(&[], false)
    }

    /// Narrator that calls the vote after the first discussion round.
    pub fn immediate() -> Self {
        Self::new(&[], true)
    }
}

impl NarrationAgent for ScriptedNarrator {
    fn announce_night(&mut self) -> Result<String> {
        Ok("Night falls.".to_string())
    }

    fn announce_dawn(&mut self) -> Result<String> {
        Ok("The sun rises.".to_string())
    }

    fn announce_deaths(&mut self, deaths: &BTreeSet<String>) -> Result<String> {
        if deaths.is_empty() {
            return Ok("Nobody died.".to_string());
        }
        let names: Vec<&str> = deaths.iter().map(String::as_str).collect();
        Ok(format!("We lost {}.", names.join(", ")))
    }

    fn announce_vote(&mut self) -> Result<String> {
        Ok("Time to vote.".to_string())
    }

    fn should_end_discussion(&mut self, _recent_round: &[GameMessage]) -> Result<bool> {
        Ok(self.end_answers.pop_front().unwrap_or(self.default_answer))
    }
}

/// Event sink that keeps every record in memory, shared across clones so a
/// test can hand one half to the runner and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingEvents {
    records: Rc<RefCell<Vec<(String, Value)>>>,
}

impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Event tags in recording order.
    pub fn tags(&self) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .map(|(tag, _)| tag.clone())
            .collect()
    }

    /// Full records in recording order.
    pub fn events(&self) -> Vec<(String, Value)> {
        self.records.borrow().clone()
    }
}

impl EventSink for RecordingEvents {
    fn record(&mut self, tag: &str, data: Value) {
        self.records.borrow_mut().push((tag.to_string(), data));
    }
}
