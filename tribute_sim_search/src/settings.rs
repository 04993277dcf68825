//! Search hyperparameters, immutable during a move computation.
//!
//! Settings load from a flat `KEY=VALUE` file through an explicit per-key
//! match table: unknown keys are ignored, missing keys keep their defaults,
//! malformed values are reported with the offending key.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringMethod {
    /// Uniform random playout to game end, scored +1/-1/0.
    Rollout,
    /// Feature-based evaluation of the position in place.
    Heuristic,
    /// Rollout a fixed number of turns, then evaluate heuristically.
    RolloutTurnsThenHeuristic,
    /// Feature vector fed to an external regression predictor.
    ModelScoring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMethod {
    Uct,
    Custom,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line} is not a KEY=VALUE pair: {text:?}")]
    MalformedLine { line: usize, text: String },
    #[error("invalid value {value:?} for key {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Reserve per decision so a running iteration can finish inside the
    /// allotted slice.
    pub iteration_completion_ms_buffer: f64,
    pub uct_exploration_constant: f64,
    pub selection_method: SelectionMethod,
    pub scoring_method: ScoringMethod,
    pub rollout_turns_before_heuristic: u32,
    /// Suppress END_TURN in rollouts while alternatives exist.
    pub force_delay_turn_end_in_rollout: bool,
    pub include_play_move_chance_nodes: bool,
    pub include_end_turn_chance_nodes: bool,
    /// Cap on simultaneously considered moves at wide choice points.
    pub choice_branch_limit: Option<usize>,
    pub reuse_tree: bool,
    pub simulate_multiple_turns: bool,
    pub apply_instant_moves: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            iteration_completion_ms_buffer: 100.0,
            uct_exploration_constant: std::f64::consts::SQRT_2,
            selection_method: SelectionMethod::Uct,
            scoring_method: ScoringMethod::Rollout,
            rollout_turns_before_heuristic: 3,
            force_delay_turn_end_in_rollout: true,
            include_play_move_chance_nodes: false,
            include_end_turn_chance_nodes: false,
            choice_branch_limit: Some(10),
            reuse_tree: true,
            simulate_multiple_turns: true,
            apply_instant_moves: true,
        }
    }
}

impl fmt::Display for ScoringMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Self::Rollout => "rollout",
            Self::Heuristic => "heuristic",
            Self::RolloutTurnsThenHeuristic => "rollout_turns_then_heuristic",
            Self::ModelScoring => "model_scoring",
        };
        f.write_str(token)
    }
}

impl fmt::Display for SelectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uct => f.write_str("uct"),
            Self::Custom => f.write_str("custom"),
        }
    }
}

impl FromStr for ScoringMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rollout" => Ok(Self::Rollout),
            "heuristic" => Ok(Self::Heuristic),
            "rollout_turns_then_heuristic" => Ok(Self::RolloutTurnsThenHeuristic),
            "model_scoring" => Ok(Self::ModelScoring),
            _ => Err(()),
        }
    }
}

impl FromStr for SelectionMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uct" => Ok(Self::Uct),
            "custom" => Ok(Self::Custom),
            _ => Err(()),
        }
    }
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T, SettingsError> {
    value.trim().parse().map_err(|_| SettingsError::InvalidValue {
        key,
        value: value.trim().to_owned(),
    })
}

fn parse_branch_limit(value: &str) -> Result<Option<usize>, SettingsError> {
    if value.trim().eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    parse::<usize>("CHOICE_BRANCH_LIMIT", value).map(Some)
}

impl Settings {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse_str(&text)
    }

    pub fn parse_str(text: &str) -> Result<Self, SettingsError> {
        let mut settings = Settings::default();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(SettingsError::MalformedLine {
                    line: index + 1,
                    text: raw.to_owned(),
                });
            };
            settings.assign(key.trim(), value)?;
        }
        Ok(settings)
    }

    fn assign(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        match key {
            "ITERATION_COMPLETION_MILLISECONDS_BUFFER" => {
                self.iteration_completion_ms_buffer =
                    parse("ITERATION_COMPLETION_MILLISECONDS_BUFFER", value)?;
            }
            "UCT_EXPLORATION_CONSTANT" => {
                self.uct_exploration_constant = parse("UCT_EXPLORATION_CONSTANT", value)?;
            }
            "CHOSEN_SELECTION_METHOD" => {
                self.selection_method = parse("CHOSEN_SELECTION_METHOD", value)?;
            }
            "CHOSEN_SCORING_METHOD" => {
                self.scoring_method = parse("CHOSEN_SCORING_METHOD", value)?;
            }
            "ROLLOUT_TURNS_BEFORE_HEURISTIC" => {
                self.rollout_turns_before_heuristic =
                    parse("ROLLOUT_TURNS_BEFORE_HEURISTIC", value)?;
            }
            "FORCE_DELAY_TURN_END_IN_ROLLOUT" => {
                self.force_delay_turn_end_in_rollout =
                    parse("FORCE_DELAY_TURN_END_IN_ROLLOUT", value)?;
            }
            "INCLUDE_PLAY_MOVE_CHANCE_NODES" => {
                self.include_play_move_chance_nodes =
                    parse("INCLUDE_PLAY_MOVE_CHANCE_NODES", value)?;
            }
            "INCLUDE_END_TURN_CHANCE_NODES" => {
                self.include_end_turn_chance_nodes =
                    parse("INCLUDE_END_TURN_CHANCE_NODES", value)?;
            }
            "CHOICE_BRANCH_LIMIT" => {
                self.choice_branch_limit = parse_branch_limit(value)?;
            }
            "REUSE_TREE" => {
                self.reuse_tree = parse("REUSE_TREE", value)?;
            }
            "SIMULATE_MULTIPLE_TURNS" => {
                self.simulate_multiple_turns = parse("SIMULATE_MULTIPLE_TURNS", value)?;
            }
            "APPLY_INSTANT_MOVES" => {
                self.apply_instant_moves = parse("APPLY_INSTANT_MOVES", value)?;
            }
            // Unknown keys are ignored so settings files can be shared with
            // other agents or newer revisions.
            _ => {}
        }
        Ok(())
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ITERATION_COMPLETION_MILLISECONDS_BUFFER={}",
            self.iteration_completion_ms_buffer
        )?;
        writeln!(f, "UCT_EXPLORATION_CONSTANT={}", self.uct_exploration_constant)?;
        writeln!(f, "CHOSEN_SELECTION_METHOD={}", self.selection_method)?;
        writeln!(f, "CHOSEN_SCORING_METHOD={}", self.scoring_method)?;
        writeln!(
            f,
            "ROLLOUT_TURNS_BEFORE_HEURISTIC={}",
            self.rollout_turns_before_heuristic
        )?;
        writeln!(
            f,
            "FORCE_DELAY_TURN_END_IN_ROLLOUT={}",
            self.force_delay_turn_end_in_rollout
        )?;
        writeln!(
            f,
            "INCLUDE_PLAY_MOVE_CHANCE_NODES={}",
            self.include_play_move_chance_nodes
        )?;
        writeln!(
            f,
            "INCLUDE_END_TURN_CHANCE_NODES={}",
            self.include_end_turn_chance_nodes
        )?;
        match self.choice_branch_limit {
            Some(limit) => writeln!(f, "CHOICE_BRANCH_LIMIT={limit}")?,
            None => writeln!(f, "CHOICE_BRANCH_LIMIT=none")?,
        }
        writeln!(f, "REUSE_TREE={}", self.reuse_tree)?;
        writeln!(f, "SIMULATE_MULTIPLE_TURNS={}", self.simulate_multiple_turns)?;
        writeln!(f, "APPLY_INSTANT_MOVES={}", self.apply_instant_moves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        let settings = Settings::parse_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn parses_known_keys_and_ignores_unknown() {
        let text = "\
# tuned for benchmarking
UCT_EXPLORATION_CONSTANT=2.0
CHOSEN_SCORING_METHOD=heuristic
CHOICE_BRANCH_LIMIT=4
REUSE_TREE=false
SOME_FUTURE_KEY=whatever
";
        let settings = Settings::parse_str(text).unwrap();
        assert_eq!(settings.uct_exploration_constant, 2.0);
        assert_eq!(settings.scoring_method, ScoringMethod::Heuristic);
        assert_eq!(settings.choice_branch_limit, Some(4));
        assert!(!settings.reuse_tree);
        // untouched keys keep defaults
        assert!(settings.force_delay_turn_end_in_rollout);
    }

    #[test]
    fn branch_limit_none_disables_capping() {
        let settings = Settings::parse_str("CHOICE_BRANCH_LIMIT=none").unwrap();
        assert_eq!(settings.choice_branch_limit, None);
    }

    #[test]
    fn reports_bad_values_with_key() {
        let err = Settings::parse_str("REUSE_TREE=maybe").unwrap_err();
        match err {
            SettingsError::InvalidValue { key, value } => {
                assert_eq!(key, "REUSE_TREE");
                assert_eq!(value, "maybe");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reports_malformed_lines() {
        let err = Settings::parse_str("REUSE_TREE").unwrap_err();
        assert!(matches!(err, SettingsError::MalformedLine { line: 1, .. }));
    }

    #[test]
    fn display_round_trips_through_parse() {
        let mut settings = Settings::default();
        settings.uct_exploration_constant = 0.7;
        settings.scoring_method = ScoringMethod::ModelScoring;
        settings.choice_branch_limit = None;
        let reparsed = Settings::parse_str(&settings.to_string()).unwrap();
        assert_eq!(settings, reparsed);
    }
}
