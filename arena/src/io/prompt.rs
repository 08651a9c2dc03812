//! Prompt rendering for agent solicitations.
//!
//! One template per solicitation kind, compiled once at engine construction.
//! Templates live under `src/io/prompts/` and are embedded in the binary so
//! a match needs no files on disk.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use crate::core::types::Role;

const INTRODUCTION_TEMPLATE: &str = include_str!("prompts/introduction.md");
const DELIBERATION_TEMPLATE: &str = include_str!("prompts/deliberation.md");
const NIGHT_VOTE_TEMPLATE: &str = include_str!("prompts/night_vote.md");
const DISCUSSION_TEMPLATE: &str = include_str!("prompts/discussion.md");
const EXILE_VOTE_TEMPLATE: &str = include_str!("prompts/exile_vote.md");

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("introduction", INTRODUCTION_TEMPLATE)
            .expect("introduction template should be valid");
        env.add_template("deliberation", DELIBERATION_TEMPLATE)
            .expect("deliberation template should be valid");
        env.add_template("night_vote", NIGHT_VOTE_TEMPLATE)
            .expect("night_vote template should be valid");
        env.add_template("discussion", DISCUSSION_TEMPLATE)
            .expect("discussion template should be valid");
        env.add_template("exile_vote", EXILE_VOTE_TEMPLATE)
            .expect("exile_vote template should be valid");
        Self { env }
    }

    /// Introduction prompt. `existing_names` is the advisory avoid-these-
    /// names hint; uniqueness is enforced by the controller, not the agent.
    pub fn render_introduction(&self, existing_names: &[String]) -> Result<String> {
        let template = self.env.get_template("introduction")?;
        template
            .render(context! { existing_names => existing_names })
            .context("render introduction prompt")
    }

    pub fn render_deliberation(&self, name: &str, targets: &BTreeSet<String>) -> Result<String> {
        let template = self.env.get_template("deliberation")?;
        template
            .render(context! { name => name, targets => targets })
            .context("render deliberation prompt")
    }

    pub fn render_night_vote(&self, name: &str, targets: &BTreeSet<String>) -> Result<String> {
        let template = self.env.get_template("night_vote")?;
        template
            .render(context! { name => name, targets => targets })
            .context("render night vote prompt")
    }

    pub fn render_discussion(&self, name: &str, role: Role) -> Result<String> {
        let template = self.env.get_template("discussion")?;
        template
            .render(context! { name => name, role => role.as_str() })
            .context("render discussion prompt")
    }

    pub fn render_exile_vote(&self, name: &str, candidates: &BTreeSet<String>) -> Result<String> {
        let template = self.env.get_template("exile_vote")?;
        template
            .render(context! { name => name, candidates => candidates })
            .context("render exile vote prompt")
    }
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new()
    }
}
