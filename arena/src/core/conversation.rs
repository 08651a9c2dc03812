//! Append-only conversation log with per-message visibility.
//!
//! Insertion order defines the canonical transcript. The log never validates
//! phase or visibility values; recording a nonsensical combination is a
//! caller programming error, not a runtime-recoverable condition.

use std::collections::BTreeMap;

use crate::core::error::GameError;
use crate::core::types::{GameMessage, Phase, Role, Visibility};

#[derive(Debug, Default)]
pub struct ConversationLog {
    messages: Vec<GameMessage>,
    roles: BTreeMap<String, Role>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message unconditionally.
    pub fn record(&mut self, message: GameMessage) {
        self.messages.push(message);
    }

    /// Lazy, restartable view of what `identifier` is allowed to see:
    /// every public message plus the private messages it authored.
    /// Narrator-only messages are excluded from every participant view.
    pub fn history_for<'a>(
        &'a self,
        identifier: &'a str,
    ) -> impl Iterator<Item = &'a GameMessage> + 'a {
        self.messages.iter().filter(move |msg| match msg.visibility {
            Visibility::Public => true,
            Visibility::Private => msg.author == identifier,
            Visibility::NarratorOnly => false,
        })
    }

    /// The narrator sees the whole transcript regardless of visibility.
    pub fn narrator_view(&self) -> impl Iterator<Item = &GameMessage> {
        self.messages.iter()
    }

    /// Full transcript as a slice, in insertion order. Narrator-side only;
    /// participant views must go through [`Self::history_for`].
    pub fn messages(&self) -> &[GameMessage] {
        &self.messages
    }

    /// Record the role side table entry and the private role-reveal message
    /// for `identifier`. Must happen exactly once per identifier, before any
    /// night phase; a second call is a fatal invariant violation.
    pub fn assign_role(&mut self, identifier: &str, role: Role) -> Result<(), GameError> {
        if self.roles.contains_key(identifier) {
            return Err(GameError::RoleAlreadyAssigned(identifier.to_string()));
        }
        self.roles.insert(identifier.to_string(), role);
        self.record(GameMessage::private(
            Phase::RoleAssignment,
            identifier,
            format!("You are a {}.", role.as_str()),
        ));
        Ok(())
    }

    pub fn role_of(&self, identifier: &str) -> Option<Role> {
        self.roles.get(identifier).copied()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
