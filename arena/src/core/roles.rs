//! Role distribution and assignment.
//!
//! The distribution is a fixed ratio of the participant count:
//! `werewolf_count = max(1, n / 4)`, remainder villagers. Assignment is a
//! uniform random permutation of that distribution zipped positionally with
//! the participant identifiers.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::core::error::GameError;
use crate::core::types::Role;

/// A match cannot start with fewer seats than this.
pub const MIN_PLAYERS: usize = 4;

/// Build the unshuffled role sequence for `count` participants.
///
/// Guarantees at least one werewolf and, for any valid count, strictly fewer
/// werewolves than participants.
pub fn role_distribution(count: usize) -> Result<Vec<Role>, GameError> {
    if count < MIN_PLAYERS {
        return Err(GameError::InsufficientPlayers {
            required: MIN_PLAYERS,
            got: count,
        });
    }
    let werewolves = (count / 4).max(1);
    let mut roles = vec![Role::Werewolf; werewolves];
    roles.resize(count, Role::Villager);
    Ok(roles)
}

/// Map each identifier to a role via a uniformly shuffled distribution.
///
/// No side effects beyond the returned mapping; the caller persists it into
/// match state. The length check is unreachable given a correct
/// [`role_distribution`]; it surfaces a generator bug as
/// [`GameError::RoleCountMismatch`] instead of a silently truncated zip.
pub fn assign_roles<R: Rng>(
    identifiers: &[String],
    rng: &mut R,
) -> Result<BTreeMap<String, Role>, GameError> {
    let mut roles = role_distribution(identifiers.len())?;
    roles.shuffle(rng);
    if roles.len() != identifiers.len() {
        return Err(GameError::RoleCountMismatch {
            roles: roles.len(),
            participants: identifiers.len(),
        });
    }
    Ok(identifiers.iter().cloned().zip(roles).collect())
}
