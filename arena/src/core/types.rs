//! Shared types for the match core.
//!
//! These types define stable contracts between core components and appear in
//! serialized event payloads, so their wire names must remain stable.

use serde::{Deserialize, Serialize};

/// Reserved pseudo-participant identifier for narration text.
///
/// The narrator is not a seat in the match: it never votes, never holds a
/// role, and its private view (`narrator_view`) spans the whole transcript.
pub const NARRATOR: &str = "narrator";

/// A participant's role, fixed once by role assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Villager,
    Werewolf,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Villager => "villager",
            Role::Werewolf => "werewolf",
        }
    }
}

/// Named stage of the match state machine, also used as a message tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Intro,
    RoleAssignment,
    Night,
    Day,
    Discussion,
    Voting,
    End,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Intro => "intro",
            Phase::RoleAssignment => "role_assignment",
            Phase::Night => "night",
            Phase::Day => "day",
            Phase::Discussion => "discussion",
            Phase::Voting => "voting",
            Phase::End => "end",
        }
    }
}

/// Who may read a given message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Visible to all participants and the narrator.
    Public,
    /// Visible only to the author and the narrator.
    Private,
    /// Visible only through the narrator view (e.g. exile ballots kept for
    /// postmortem).
    NarratorOnly,
}

/// One entry in the append-only match transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMessage {
    pub phase: Phase,
    /// Participant identifier, or [`NARRATOR`].
    pub author: String,
    pub content: String,
    pub visibility: Visibility,
}

impl GameMessage {
    pub fn public(phase: Phase, author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            phase,
            author: author.into(),
            content: content.into(),
            visibility: Visibility::Public,
        }
    }

    pub fn private(phase: Phase, author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            phase,
            author: author.into(),
            content: content.into(),
            visibility: Visibility::Private,
        }
    }

    /// Public narration authored by the reserved narrator identifier.
    pub fn narration(phase: Phase, content: impl Into<String>) -> Self {
        Self::public(phase, NARRATOR, content)
    }

    pub fn narrator_only(
        phase: Phase,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            phase,
            author: author.into(),
            content: content.into(),
            visibility: Visibility::NarratorOnly,
        }
    }
}
