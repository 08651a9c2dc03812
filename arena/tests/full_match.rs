//! End-to-end matches driven by scripted agents.
//!
//! Every scripted seat votes unmatchable garbage, so vote resolution always
//! takes the fallback path and targets villagers regardless of which seat
//! drew the werewolf role. That makes the outcome independent of the role
//! shuffle: the lone werewolf survives and wins on parity.

use rand::SeedableRng;
use rand::rngs::StdRng;

use arena::core::state::Winner;
use arena::core::types::{Phase, Role, Visibility};
use arena::io::event_log::NullEventSink;
use arena::match_runner::{MatchRunner, MatchSettings};
use arena::test_support::{RecordingEvents, ScriptedAgent, ScriptedNarrator};

fn intro_json(name: &str) -> String {
    format!("{{\"name\": \"{name}\", \"message\": \"hi, I'm {name}\"}}")
}

fn scripted_seats(names: &[&str]) -> Vec<ScriptedAgent> {
    names
        .iter()
        .map(|n| ScriptedAgent::repeating(intro_json(n), "zzz-unmatchable"))
        .collect()
}

#[test]
fn lone_werewolf_wins_a_four_seat_match_on_parity() {
    let agents = scripted_seats(&["Ava", "Bram", "Cleo", "Dara"]);
    let events = RecordingEvents::new();
    let mut runner = MatchRunner::new(
        agents,
        ScriptedNarrator::never_ending(),
        events.clone(),
        MatchSettings::default(),
        StdRng::seed_from_u64(7),
    )
    .expect("runner");

    let report = runner.run().expect("match should complete");

    // One night kill plus one exile leaves the wolf and one villager: parity.
    assert_eq!(report.winner, Winner::Werewolves);
    assert_eq!(report.nights, 1);
    assert_eq!(report.participants.len(), 4);

    let wolves: Vec<_> = report
        .participants
        .iter()
        .filter(|p| p.role == Role::Werewolf)
        .collect();
    assert_eq!(wolves.len(), 1);
    assert!(wolves[0].alive, "the werewolf is never a fallback target");

    let dead = report.participants.iter().filter(|p| !p.alive).count();
    assert_eq!(dead, 2);
    assert!(
        report
            .participants
            .iter()
            .filter(|p| !p.alive)
            .all(|p| p.role == Role::Villager)
    );
}

#[test]
fn discussion_runs_to_the_round_cap_when_the_narrator_never_stops() {
    let agents = scripted_seats(&["Ava", "Bram", "Cleo", "Dara"]);
    let events = RecordingEvents::new();
    let mut runner = MatchRunner::new(
        agents,
        ScriptedNarrator::never_ending(),
        events.clone(),
        MatchSettings {
            max_discussion_rounds: 5,
        },
        StdRng::seed_from_u64(7),
    )
    .expect("runner");
    runner.run().expect("match should complete");

    // One day phase, three living speakers, five capped rounds.
    let discussions = events
        .tags()
        .iter()
        .filter(|t| *t == "player_discussion")
        .count();
    assert_eq!(discussions, 15);
}

#[test]
fn narrator_can_call_the_vote_after_one_round() {
    let agents = scripted_seats(&["Ava", "Bram", "Cleo", "Dara"]);
    let events = RecordingEvents::new();
    let mut runner = MatchRunner::new(
        agents,
        ScriptedNarrator::immediate(),
        events.clone(),
        MatchSettings::default(),
        StdRng::seed_from_u64(7),
    )
    .expect("runner");
    runner.run().expect("match should complete");

    let discussions = events
        .tags()
        .iter()
        .filter(|t| *t == "player_discussion")
        .count();
    assert_eq!(discussions, 3, "one round of three living speakers");
}

#[test]
fn event_stream_brackets_the_match() {
    let agents = scripted_seats(&["Ava", "Bram", "Cleo", "Dara"]);
    let events = RecordingEvents::new();
    let mut runner = MatchRunner::new(
        agents,
        ScriptedNarrator::never_ending(),
        events.clone(),
        MatchSettings::default(),
        StdRng::seed_from_u64(7),
    )
    .expect("runner");
    runner.run().expect("match should complete");

    let tags = events.tags();
    assert_eq!(tags.first().map(String::as_str), Some("game_start"));
    assert_eq!(tags.last().map(String::as_str), Some("game_end"));
    for expected in [
        "introduction_phase_start",
        "player_introduction",
        "role_assigned",
        "night_phase_start",
        "werewolf_deliberation",
        "werewolf_kill",
        "day_phase_start",
        "voting_start",
        "player_exiled",
    ] {
        assert!(tags.iter().any(|t| t == expected), "missing {expected}");
    }
    assert_eq!(tags.iter().filter(|t| *t == "role_assigned").count(), 4);
}

#[test]
fn transcript_never_leaks_private_or_narrator_only_messages() {
    let names = ["Ava", "Bram", "Cleo", "Dara"];
    let agents = scripted_seats(&names);
    let mut runner = MatchRunner::new(
        agents,
        ScriptedNarrator::never_ending(),
        NullEventSink,
        MatchSettings::default(),
        StdRng::seed_from_u64(7),
    )
    .expect("runner");
    runner.run().expect("match should complete");

    let log = runner.conversation();
    for name in names {
        // Exactly one private role reveal, addressed to this participant.
        let reveals: Vec<_> = log
            .history_for(name)
            .filter(|m| m.phase == Phase::RoleAssignment)
            .collect();
        assert_eq!(reveals.len(), 1, "{name} reveal count");
        assert_eq!(reveals[0].author, name);

        for msg in log.history_for(name) {
            assert_ne!(msg.visibility, Visibility::NarratorOnly);
            if msg.visibility == Visibility::Private {
                assert_eq!(msg.author, name, "foreign private message leaked");
            }
        }
    }

    // Ballots and reveals do exist in the full transcript.
    assert!(
        log.narrator_view()
            .any(|m| m.visibility == Visibility::NarratorOnly)
    );
}

#[test]
fn seven_seat_match_plays_multiple_nights_to_parity() {
    let names = ["Ava", "Bram", "Cleo", "Dara", "Enid", "Fynn", "Goro"];
    let agents = scripted_seats(&names);
    let mut runner = MatchRunner::new(
        agents,
        ScriptedNarrator::immediate(),
        NullEventSink,
        MatchSettings::default(),
        StdRng::seed_from_u64(11),
    )
    .expect("runner");
    let report = runner.run().expect("match should complete");

    // Seven seats draw one werewolf; garbage ballots mean villagers die one
    // per night and one per day until parity at two living.
    assert_eq!(report.winner, Winner::Werewolves);
    assert_eq!(report.nights, 3);
    assert_eq!(report.participants.len(), 7);
    assert_eq!(
        report
            .participants
            .iter()
            .filter(|p| p.role == Role::Werewolf)
            .count(),
        1
    );
    assert_eq!(report.participants.iter().filter(|p| p.alive).count(), 2);
}
