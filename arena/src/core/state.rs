//! Living/dead tracking and the termination condition.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::core::error::GameError;
use crate::core::types::Role;

/// Which side won a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Villagers,
    Werewolves,
}

/// Per-match participant state: the role map (set once), the living/dead
/// partition, and the deaths accumulated since the last nightfall.
///
/// Invariants: `living` and `dead` are disjoint and together cover exactly
/// the key set of `roles`; a participant dies at most once.
#[derive(Debug, Clone)]
pub struct MatchState {
    roles: BTreeMap<String, Role>,
    living: BTreeSet<String>,
    dead: BTreeSet<String>,
    last_deaths: BTreeSet<String>,
}

impl MatchState {
    /// All participants start alive.
    pub fn new(roles: BTreeMap<String, Role>) -> Self {
        let living = roles.keys().cloned().collect();
        Self {
            roles,
            living,
            dead: BTreeSet::new(),
            last_deaths: BTreeSet::new(),
        }
    }

    /// Move a participant from living to dead and record it in the
    /// last-deaths set.
    ///
    /// Killing an unknown participant or an already-dead one is a hard
    /// error; the call is rejected and state is left untouched.
    pub fn kill(&mut self, identifier: &str) -> Result<(), GameError> {
        if !self.roles.contains_key(identifier) {
            return Err(GameError::UnknownParticipant(identifier.to_string()));
        }
        if self.dead.contains(identifier) {
            return Err(GameError::AlreadyDead(identifier.to_string()));
        }
        self.living.remove(identifier);
        self.dead.insert(identifier.to_string());
        self.last_deaths.insert(identifier.to_string());
        Ok(())
    }

    /// Clear the last-deaths set. Called exactly once per night phase,
    /// before the night kill; the day phase consumes the set when it
    /// announces deaths.
    pub fn begin_night(&mut self) {
        self.last_deaths.clear();
    }

    pub fn last_deaths(&self) -> &BTreeSet<String> {
        &self.last_deaths
    }

    pub fn living(&self) -> &BTreeSet<String> {
        &self.living
    }

    pub fn dead(&self) -> &BTreeSet<String> {
        &self.dead
    }

    pub fn is_alive(&self, identifier: &str) -> bool {
        self.living.contains(identifier)
    }

    pub fn role_of(&self, identifier: &str) -> Option<Role> {
        self.roles.get(identifier).copied()
    }

    pub fn living_with_role(&self, role: Role) -> impl Iterator<Item = &String> {
        self.living
            .iter()
            .filter(move |id| self.roles.get(*id) == Some(&role))
    }

    fn living_werewolves(&self) -> usize {
        self.living_with_role(Role::Werewolf).count()
    }

    /// Terminal when no werewolf survives (villager victory) or the
    /// surviving werewolves reach parity with everyone else (werewolf
    /// victory). Re-check after every kill: a night kill can end the match
    /// before the day phase runs.
    pub fn is_over(&self) -> bool {
        let werewolves = self.living_werewolves();
        let others = self.living.len() - werewolves;
        werewolves == 0 || werewolves >= others
    }

    /// The winning side, or `None` while the match is still running.
    pub fn winner(&self) -> Option<Winner> {
        let werewolves = self.living_werewolves();
        let others = self.living.len() - werewolves;
        if werewolves == 0 {
            Some(Winner::Villagers)
        } else if werewolves >= others {
            Some(Winner::Werewolves)
        } else {
            None
        }
    }
}
