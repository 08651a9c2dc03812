//! Werewolf match runner for language-model agents.
//!
//! One match walks a fixed phase sequence: Introduction → RoleAssignment →
//! repeating (Night → Day) → End. Agents only ever see the slice of the
//! transcript their visibility allows, and group decisions (the werewolf
//! kill, the village exile) are resolved from free-text ballots by a single
//! shared resolver. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic game logic (roles, state, vote
//!   resolution, the visibility-scoped conversation log). No I/O; all
//!   randomness is injected.
//! - **[`io`]**: Side-effecting collaborators (agent subprocesses, prompt
//!   rendering, the JSONL event log, configuration files). Isolated behind
//!   traits to enable scripted doubles in tests.
//!
//! [`match_runner`] coordinates core logic with the collaborators to play a
//! complete match.

pub mod core;
pub mod io;
pub mod logging;
pub mod match_runner;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
