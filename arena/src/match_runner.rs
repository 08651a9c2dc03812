//! Phase controller: drives one match from introduction to the end summary.
//!
//! Phases execute strictly sequentially, and within a phase every
//! solicitation happens in fixed seat order, so the transcript is
//! reproducible for a given seed and set of agent responses. Each
//! solicitation is a suspension point: the controller blocks on the
//! collaborator and nothing else mutates match state in the meantime.
//! Independent matches share no mutable state and may run concurrently as
//! unrelated instances.

use std::collections::BTreeSet;

use anyhow::{Result, anyhow};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::core::conversation::ConversationLog;
use crate::core::error::GameError;
use crate::core::resolver::resolve_votes;
use crate::core::roles::{MIN_PLAYERS, assign_roles};
use crate::core::state::{MatchState, Winner};
use crate::core::types::{GameMessage, Phase, Role};
use crate::io::agent::{NarrationAgent, PlayerAgent};
use crate::io::event_log::EventSink;
use crate::io::prompt::PromptEngine;

const ROLES_NOT_ASSIGNED: &str = "role assignment must complete before night and day phases";

/// Knobs the controller honors while playing.
#[derive(Debug, Clone)]
pub struct MatchSettings {
    /// Hard cap on discussion rounds per day, enforced locally regardless of
    /// the narrator's `should_end_discussion` answer.
    pub max_discussion_rounds: u32,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            max_discussion_rounds: 5,
        }
    }
}

/// Final standing of one participant, for the end-of-match summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantSummary {
    pub identifier: String,
    pub role: Role,
    pub alive: bool,
}

/// Outcome of a completed match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchReport {
    pub winner: Winner,
    /// Night phases played before the match terminated.
    pub nights: u32,
    pub participants: Vec<ParticipantSummary>,
}

/// Drives one match: owns the seats, the narrator, the event sink, the
/// conversation log, match state and the match RNG.
pub struct MatchRunner<A, N, E> {
    agents: Vec<A>,
    /// Fixed displayed identifiers, parallel to `agents`; filled during the
    /// introduction phase and immutable afterwards.
    names: Vec<String>,
    narrator: N,
    events: E,
    conversation: ConversationLog,
    state: Option<MatchState>,
    settings: MatchSettings,
    prompts: PromptEngine,
    rng: StdRng,
}

impl<A, N, E> MatchRunner<A, N, E>
where
    A: PlayerAgent,
    N: NarrationAgent,
    E: EventSink,
{
    /// Fails with [`GameError::InsufficientPlayers`] before anything is
    /// solicited; no partial state is created.
    pub fn new(
        agents: Vec<A>,
        narrator: N,
        events: E,
        settings: MatchSettings,
        rng: StdRng,
    ) -> Result<Self, GameError> {
        if agents.len() < MIN_PLAYERS {
            return Err(GameError::InsufficientPlayers {
                required: MIN_PLAYERS,
                got: agents.len(),
            });
        }
        Ok(Self {
            names: Vec::with_capacity(agents.len()),
            agents,
            narrator,
            events,
            conversation: ConversationLog::new(),
            state: None,
            settings,
            prompts: PromptEngine::new(),
            rng,
        })
    }

    /// The transcript so far. On error the partial transcript remains
    /// available here for postmortem.
    pub fn conversation(&self) -> &ConversationLog {
        &self.conversation
    }

    /// Play the match to completion.
    #[instrument(skip_all, fields(seats = self.agents.len()))]
    pub fn run(&mut self) -> Result<MatchReport> {
        self.events
            .record("game_start", json!({ "participants": self.agents.len() }));
        self.introduction_phase()?;
        self.role_assignment_phase()?;

        let mut nights = 0u32;
        loop {
            self.night_phase()?;
            nights += 1;
            // A night kill can end the match before any day phase runs.
            if self.is_over()? {
                break;
            }
            self.day_phase()?;
            if self.is_over()? {
                break;
            }
        }
        self.end_game(nights)
    }

    fn is_over(&self) -> Result<bool, GameError> {
        Ok(self
            .state
            .as_ref()
            .ok_or(GameError::PhaseOrder(ROLES_NOT_ASSIGNED))?
            .is_over())
    }

    fn history_of(&self, name: &str) -> Vec<GameMessage> {
        self.conversation.history_for(name).cloned().collect()
    }

    /// Solicit an introduction from every seat in order and fix displayed
    /// identifiers. Malformed or failing introductions are recovered with a
    /// deterministic fallback identifier; clashes with already-fixed names
    /// are de-duplicated by numeric suffix (the avoid-these-names hint in
    /// the prompt is advisory only).
    fn introduction_phase(&mut self) -> Result<()> {
        info!("introduction phase");
        self.events.record("introduction_phase_start", json!({}));
        for seat in 0..self.agents.len() {
            let prompt = self.prompts.render_introduction(&self.names)?;
            let (name, message) = match self.agents[seat].introduce(&prompt) {
                Ok(raw) => match parse_introduction(&raw) {
                    Some(intro) => (intro.name, intro.message),
                    None => {
                        warn!(seat, "unparseable introduction, using fallback identifier");
                        fallback_introduction(seat)
                    }
                },
                Err(err) => {
                    warn!(seat, err = %err, "introduction failed, using fallback identifier");
                    fallback_introduction(seat)
                }
            };
            let name = dedupe_name(name, &self.names);
            self.conversation
                .record(GameMessage::public(Phase::Intro, name.as_str(), message.clone()));
            self.events.record(
                "player_introduction",
                json!({ "player": name, "message": message }),
            );
            self.names.push(name);
        }
        self.events.record("introduction_phase_end", json!({}));
        Ok(())
    }

    /// Assign roles, seed match state, and reveal each role privately.
    fn role_assignment_phase(&mut self) -> Result<()> {
        if self.names.len() != self.agents.len() {
            return Err(GameError::PhaseOrder(
                "introduction phase must complete before role assignment",
            )
            .into());
        }
        info!("role assignment phase");
        let assignments = assign_roles(&self.names, &mut self.rng)?;
        for name in &self.names {
            let role = assignments[name.as_str()];
            self.conversation.assign_role(name, role)?;
            self.events
                .record("role_assigned", json!({ "player": name, "role": role }));
        }
        self.state = Some(MatchState::new(assignments));
        Ok(())
    }

    fn night_phase(&mut self) -> Result<()> {
        info!("night phase");
        self.events.record("night_phase_start", json!({}));
        self.state
            .as_mut()
            .ok_or(GameError::PhaseOrder(ROLES_NOT_ASSIGNED))?
            .begin_night();

        let nightfall = self.narrator.announce_night()?;
        self.conversation
            .record(GameMessage::narration(Phase::Night, nightfall.clone()));
        self.events
            .record("night_start", json!({ "message": nightfall }));

        let (wolves, targets) = {
            let state = self
                .state
                .as_ref()
                .ok_or(GameError::PhaseOrder(ROLES_NOT_ASSIGNED))?;
            let wolves: Vec<usize> = (0..self.names.len())
                .filter(|&seat| {
                    let name = &self.names[seat];
                    state.is_alive(name) && state.role_of(name) == Some(Role::Werewolf)
                })
                .collect();
            let targets: BTreeSet<String> =
                state.living_with_role(Role::Villager).cloned().collect();
            (wolves, targets)
        };

        if !wolves.is_empty() {
            // Deliberations are private: only the author and the narrator see
            // them, so werewolves do not observe each other's reasoning.
            for &seat in &wolves {
                let name = self.names[seat].clone();
                let prompt = self.prompts.render_deliberation(&name, &targets)?;
                let history = self.history_of(&name);
                let thought = self.agents[seat].respond(&history, &prompt)?;
                self.conversation
                    .record(GameMessage::private(Phase::Night, name.as_str(), thought.clone()));
                self.events.record(
                    "werewolf_deliberation",
                    json!({ "player": name, "message": thought }),
                );
            }

            let mut ballots = Vec::with_capacity(wolves.len());
            for &seat in &wolves {
                let name = self.names[seat].clone();
                let prompt = self.prompts.render_night_vote(&name, &targets)?;
                let history = self.history_of(&name);
                let ballot = self.agents[seat].respond(&history, &prompt)?;
                self.conversation
                    .record(GameMessage::private(Phase::Night, name.as_str(), ballot.clone()));
                ballots.push(ballot);
            }

            let victim = resolve_votes(&ballots, &targets, |_| false, &mut self.rng)?;
            self.state
                .as_mut()
                .ok_or(GameError::PhaseOrder(ROLES_NOT_ASSIGNED))?
                .kill(&victim)?;
            self.events
                .record("werewolf_kill", json!({ "victim": victim }));
        }

        let dawn = self.narrator.announce_dawn()?;
        self.conversation
            .record(GameMessage::narration(Phase::Night, dawn.clone()));
        self.events.record("night_end", json!({ "message": dawn }));
        Ok(())
    }

    fn day_phase(&mut self) -> Result<()> {
        info!("day phase");
        self.events.record("day_phase_start", json!({}));

        let deaths = self
            .state
            .as_ref()
            .ok_or(GameError::PhaseOrder(ROLES_NOT_ASSIGNED))?
            .last_deaths()
            .clone();
        let announcement = self.narrator.announce_deaths(&deaths)?;
        self.conversation
            .record(GameMessage::narration(Phase::Day, announcement.clone()));
        self.events.record(
            "day_start",
            json!({ "deaths": deaths, "message": announcement }),
        );

        self.discussion_rounds()?;

        let call = self.narrator.announce_vote()?;
        self.conversation
            .record(GameMessage::narration(Phase::Voting, call.clone()));
        self.events
            .record("voting_start", json!({ "message": call }));

        let (voters, living, wolf_set) = {
            let state = self
                .state
                .as_ref()
                .ok_or(GameError::PhaseOrder(ROLES_NOT_ASSIGNED))?;
            let voters: Vec<usize> = (0..self.names.len())
                .filter(|&seat| state.is_alive(&self.names[seat]))
                .collect();
            let wolf_set: BTreeSet<String> =
                state.living_with_role(Role::Werewolf).cloned().collect();
            (voters, state.living().clone(), wolf_set)
        };

        let mut ballots = Vec::with_capacity(voters.len());
        for seat in voters {
            let name = self.names[seat].clone();
            let prompt = self.prompts.render_exile_vote(&name, &living)?;
            let history = self.history_of(&name);
            let ballot = self.agents[seat].respond(&history, &prompt)?;
            // Ballots are kept narrator-only: invisible to every participant,
            // available in the transcript for postmortem.
            self.conversation
                .record(GameMessage::narrator_only(Phase::Voting, name.as_str(), ballot.clone()));
            ballots.push(ballot);
        }

        let exile = resolve_votes(&ballots, &living, |id| wolf_set.contains(id), &mut self.rng)?;
        self.state
            .as_mut()
            .ok_or(GameError::PhaseOrder(ROLES_NOT_ASSIGNED))?
            .kill(&exile)?;
        self.conversation.record(GameMessage::narration(
            Phase::Voting,
            format!("The village has spoken. {exile} is exiled."),
        ));
        self.events
            .record("player_exiled", json!({ "player": exile }));
        Ok(())
    }

    /// Run discussion rounds until the narrator calls the vote or the hard
    /// round cap is reached, whichever comes first.
    fn discussion_rounds(&mut self) -> Result<()> {
        for round in 1..=self.settings.max_discussion_rounds {
            let speakers: Vec<usize> = {
                let state = self
                    .state
                    .as_ref()
                    .ok_or(GameError::PhaseOrder(ROLES_NOT_ASSIGNED))?;
                (0..self.names.len())
                    .filter(|&seat| state.is_alive(&self.names[seat]))
                    .collect()
            };

            let round_start = self.conversation.len();
            for seat in speakers {
                let name = self.names[seat].clone();
                let role = self
                    .state
                    .as_ref()
                    .ok_or(GameError::PhaseOrder(ROLES_NOT_ASSIGNED))?
                    .role_of(&name)
                    .ok_or_else(|| GameError::UnknownParticipant(name.clone()))?;
                let prompt = self.prompts.render_discussion(&name, role)?;
                let history = self.history_of(&name);
                let message = self.agents[seat].respond(&history, &prompt)?;
                self.conversation.record(GameMessage::public(
                    Phase::Discussion,
                    name.as_str(),
                    message.clone(),
                ));
                self.events.record(
                    "player_discussion",
                    json!({ "player": name, "round": round, "message": message }),
                );
            }

            // The loop bound is the hard cap; a narrator that never agrees
            // to stop cannot keep the day phase alive past it.
            let recent = self.conversation.messages()[round_start..].to_vec();
            if self.narrator.should_end_discussion(&recent)? {
                break;
            }
        }
        Ok(())
    }

    fn end_game(&mut self, nights: u32) -> Result<MatchReport> {
        let (winner, participants) = {
            let state = self
                .state
                .as_ref()
                .ok_or(GameError::PhaseOrder(ROLES_NOT_ASSIGNED))?;
            let winner = state
                .winner()
                .ok_or_else(|| anyhow!("match ended without a terminal state"))?;
            let mut participants = Vec::with_capacity(self.names.len());
            for name in &self.names {
                let role = state
                    .role_of(name)
                    .ok_or_else(|| GameError::UnknownParticipant(name.clone()))?;
                participants.push(ParticipantSummary {
                    identifier: name.clone(),
                    role,
                    alive: state.is_alive(name),
                });
            }
            (winner, participants)
        };

        let summary = render_summary(winner, &participants);
        self.conversation
            .record(GameMessage::narration(Phase::End, summary.clone()));
        self.events.record(
            "game_end",
            json!({ "winner": winner, "participants": &participants, "message": summary }),
        );
        info!(?winner, nights, "match finished");
        Ok(MatchReport {
            winner,
            nights,
            participants,
        })
    }
}

/// Agent-declared introduction payload.
#[derive(Debug, Deserialize)]
struct Introduction {
    name: String,
    message: String,
}

/// Lenient parse of the introduction JSON: tolerates surrounding whitespace
/// and a markdown code fence, rejects blank names.
fn parse_introduction(raw: &str) -> Option<Introduction> {
    let body = strip_code_fence(raw.trim());
    let intro: Introduction = serde_json::from_str(body).ok()?;
    let name = intro.name.trim();
    if name.is_empty() {
        return None;
    }
    Some(Introduction {
        name: name.to_string(),
        message: intro.message,
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Deterministic stand-in for a seat whose introduction was unusable.
fn fallback_introduction(seat: usize) -> (String, String) {
    let name = format!("player-{}", seat + 1);
    let message = format!("Hello, I am {name}.");
    (name, message)
}

/// Make `candidate` unique among `taken` by appending a numeric suffix.
fn dedupe_name(candidate: String, taken: &[String]) -> String {
    let clashes = |name: &str| taken.iter().any(|t| t.eq_ignore_ascii_case(name));
    if !clashes(&candidate) {
        return candidate;
    }
    let mut n = 2;
    loop {
        let alt = format!("{candidate}-{n}");
        if !clashes(&alt) {
            return alt;
        }
        n += 1;
    }
}

fn render_summary(winner: Winner, participants: &[ParticipantSummary]) -> String {
    let headline = match winner {
        Winner::Villagers => "The villagers win!",
        Winner::Werewolves => "The werewolves win!",
    };
    let mut buf = format!("Game over! {headline}\n");
    for (role, label) in [(Role::Werewolf, "werewolves"), (Role::Villager, "villagers")] {
        let members: Vec<String> = participants
            .iter()
            .filter(|p| p.role == role)
            .map(|p| {
                format!(
                    "{} ({})",
                    p.identifier,
                    if p.alive { "living" } else { "dead" }
                )
            })
            .collect();
        buf.push_str(&format!("{label}: {}\n", members.join(", ")));
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    use crate::io::event_log::NullEventSink;
    use crate::test_support::{FailingAgent, ScriptedAgent, ScriptedNarrator};

    fn runner(
        agents: Vec<ScriptedAgent>,
    ) -> MatchRunner<ScriptedAgent, ScriptedNarrator, NullEventSink> {
        MatchRunner::new(
            agents,
            ScriptedNarrator::never_ending(),
            NullEventSink,
            MatchSettings::default(),
            StdRng::seed_from_u64(1),
        )
        .expect("runner")
    }

    fn intro_json(name: &str) -> String {
        format!("{{\"name\": \"{name}\", \"message\": \"hi, I'm {name}\"}}")
    }

    #[test]
    fn new_rejects_undersized_matches() {
        let agents = vec![ScriptedAgent::repeating(intro_json("Ava"), "pass")];
        let err = MatchRunner::new(
            agents,
            ScriptedNarrator::never_ending(),
            NullEventSink,
            MatchSettings::default(),
            StdRng::seed_from_u64(0),
        )
        .err()
        .expect("undersized match should be rejected");
        assert_eq!(
            err,
            GameError::InsufficientPlayers {
                required: MIN_PLAYERS,
                got: 1
            }
        );
    }

    #[test]
    fn role_assignment_requires_completed_introduction() {
        let agents = (0..4)
            .map(|i| ScriptedAgent::repeating(intro_json(&format!("p{i}")), "pass"))
            .collect();
        let mut runner = runner(agents);
        let err = runner.role_assignment_phase().unwrap_err();
        let game_err = err.downcast_ref::<GameError>().expect("game error");
        assert!(matches!(game_err, GameError::PhaseOrder(_)));
    }

    #[test]
    fn introduction_fixes_names_in_seat_order() {
        let agents = ["Ava", "Bram", "Cleo", "Dara"]
            .iter()
            .map(|n| ScriptedAgent::repeating(intro_json(n), "pass"))
            .collect();
        let mut runner = runner(agents);
        runner.introduction_phase().expect("intro");
        assert_eq!(runner.names, vec!["Ava", "Bram", "Cleo", "Dara"]);
        assert_eq!(
            runner
                .conversation
                .narrator_view()
                .filter(|m| m.phase == Phase::Intro)
                .count(),
            4
        );
    }

    #[test]
    fn malformed_introductions_fall_back_to_generated_identifiers() {
        let agents = (0..4)
            .map(|_| ScriptedAgent::repeating("this is not json", "pass"))
            .collect();
        let mut runner = runner(agents);
        runner.introduction_phase().expect("intro");
        assert_eq!(
            runner.names,
            vec!["player-1", "player-2", "player-3", "player-4"]
        );
    }

    #[test]
    fn duplicate_names_are_deduplicated_with_suffixes() {
        let agents = ["Ava", "ava", "Ava", "Bram"]
            .iter()
            .map(|n| ScriptedAgent::repeating(intro_json(n), "pass"))
            .collect();
        let mut runner = runner(agents);
        runner.introduction_phase().expect("intro");
        assert_eq!(runner.names, vec!["Ava", "ava-2", "Ava-3", "Bram"]);
    }

    #[test]
    fn failed_introductions_are_recovered_with_generated_identifiers() {
        let agents = vec![FailingAgent; 4];
        let mut runner = MatchRunner::new(
            agents,
            ScriptedNarrator::never_ending(),
            NullEventSink,
            MatchSettings::default(),
            StdRng::seed_from_u64(3),
        )
        .expect("runner");
        runner.introduction_phase().expect("intro");
        assert_eq!(
            runner.names,
            vec!["player-1", "player-2", "player-3", "player-4"]
        );
    }

    #[test]
    fn exhausted_scripts_abort_the_match_but_keep_the_transcript() {
        // One scripted response each: the werewolf spends it on the night
        // deliberation and fails on the ballot.
        let agents = (0..4)
            .map(|i| ScriptedAgent::new(intro_json(&format!("p{i}")), &["one thought"]))
            .collect();
        let mut runner = runner(agents);
        let err = runner.run().unwrap_err();
        assert!(err.to_string().contains("ran out of responses"));
        assert!(!runner.conversation().is_empty());
    }

    #[test]
    fn role_assignment_reveals_each_role_privately_once() {
        let agents = ["Ava", "Bram", "Cleo", "Dara"]
            .iter()
            .map(|n| ScriptedAgent::repeating(intro_json(n), "pass"))
            .collect();
        let mut runner = runner(agents);
        runner.introduction_phase().expect("intro");
        runner.role_assignment_phase().expect("roles");

        for name in &runner.names {
            let reveals = runner
                .conversation
                .history_for(name)
                .filter(|m| m.phase == Phase::RoleAssignment)
                .count();
            assert_eq!(reveals, 1, "{name} should see exactly one reveal");
        }
        assert!(runner.state.is_some());
    }

    #[test]
    fn parse_introduction_tolerates_code_fences() {
        let fenced = "```json\n{\"name\": \"Ava\", \"message\": \"hi\"}\n```";
        let intro = parse_introduction(fenced).expect("parse");
        assert_eq!(intro.name, "Ava");
    }

    #[test]
    fn parse_introduction_rejects_blank_names() {
        assert!(parse_introduction("{\"name\": \"  \", \"message\": \"hi\"}").is_none());
        assert!(parse_introduction("[1, 2]").is_none());
        assert!(parse_introduction("").is_none());
    }

    #[test]
    fn dedupe_appends_increasing_suffixes() {
        let taken = vec!["Ava".to_string(), "Ava-2".to_string()];
        assert_eq!(dedupe_name("Ava".to_string(), &taken), "Ava-3");
        assert_eq!(dedupe_name("Bram".to_string(), &taken), "Bram");
    }
}
