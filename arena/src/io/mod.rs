//! Side-effecting collaborators at the match boundary.
//!
//! Everything here sits behind a trait or a config value so matches can run
//! against scripted doubles in tests: agent backends ([`agent`]), child
//! process plumbing ([`process`]), prompt rendering ([`prompt`]), the JSONL
//! event log ([`event_log`]) and the TOML configuration ([`config`]).

pub mod agent;
pub mod config;
pub mod event_log;
pub mod process;
pub mod prompt;
