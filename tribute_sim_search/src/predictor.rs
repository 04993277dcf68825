//! Learned-model scoring port. The search core only needs a win probability
//! for an end-of-turn feature vector; how the model was trained or stored is
//! the embedder's business.

use serde::{Deserialize, Serialize};

use crate::heuristics::{GameFeatures, FEATURE_COUNT};

/// Estimates the probability that the feature set's current player wins.
/// Implementations must return values in [0, 1].
pub trait ValuePredictor {
    fn win_probability(&self, features: &GameFeatures) -> f64;
}

/// Logistic regression over the flattened feature vector. The simplest model
/// shape that slots into the port; weights come from offline training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearValueModel {
    pub weights: [f64; FEATURE_COUNT],
    pub bias: f64,
}

impl ValuePredictor for LinearValueModel {
    fn win_probability(&self, features: &GameFeatures) -> f64 {
        let vector = features.to_vector();
        let logit: f64 = self
            .weights
            .iter()
            .zip(vector.iter())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;
        1.0 / (1.0 + (-logit).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn zero_model_is_indifferent() {
        let model = LinearValueModel {
            weights: [0.0; FEATURE_COUNT],
            bias: 0.0,
        };
        let features = GameFeatures::extract(&testing::two_player_state());
        assert_eq!(model.win_probability(&features), 0.5);
    }

    #[test]
    fn prestige_weight_moves_the_probability() {
        let mut weights = [0.0; FEATURE_COUNT];
        weights[4] = 0.5; // current player prestige column
        let model = LinearValueModel { weights, bias: 0.0 };

        let mut state = testing::two_player_state();
        state.current.prestige = 20;
        let ahead = model.win_probability(&GameFeatures::extract(&state));
        assert!(ahead > 0.5);
        assert!(ahead <= 1.0);
    }
}
