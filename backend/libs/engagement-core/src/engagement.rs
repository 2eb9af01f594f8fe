//! Engagement Score Calculator
//!
//! Normalizes heterogeneous reader signals (seconds, percentages, rates) onto
//! a common 0-100 scale and combines them with fixed weights:
//!
//! ```text
//! time        = min(100, avg_time_on_page / time_cap * 100)      * w_time
//! scroll      = avg_scroll_depth                                  * w_scroll
//! completion  = completion_rate                                   * w_completion
//! interaction = min(100, interaction_rate * saturation)          * w_interaction
//! session     = engagement_rate                                   * w_session
//! score       = round(time + scroll + completion + interaction + session)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoringError};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Aggregated signals for one content item.
///
/// Percentages are on a 0-100 scale. `avg_time_on_page` is in seconds.
/// `interaction_rate` and `engagement_rate` may exceed 100 when interactions
/// outnumber views; callers clamp scroll, completion and engagement rate
/// before scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementInput {
    pub avg_time_on_page: f64,
    pub avg_scroll_depth: f64,
    pub completion_rate: f64,
    pub interaction_rate: f64,
    pub engagement_rate: f64,
}

/// Tunable calculator parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementWeights {
    pub time: f64,
    pub scroll: f64,
    pub completion: f64,
    pub interaction: f64,
    pub session: f64,
    /// Reading time that earns the full time component
    pub time_cap_secs: f64,
    /// Multiplier applied to the interaction rate before capping at 100
    pub interaction_saturation: f64,
}

impl Default for EngagementWeights {
    fn default() -> Self {
        Self {
            time: 0.30,
            scroll: 0.25,
            completion: 0.25,
            interaction: 0.10,
            session: 0.10,
            time_cap_secs: 180.0,
            interaction_saturation: 10.0,
        }
    }
}

impl EngagementWeights {
    /// Check that the weights keep the score on a 0-100 scale.
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("time", self.time),
            ("scroll", self.scroll),
            ("completion", self.completion),
            ("interaction", self.interaction),
            ("session", self.session),
        ];

        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ScoringError::InvalidWeights(format!(
                    "engagement weight '{}' must be a finite non-negative number, got {}",
                    name, weight
                )));
            }
        }

        let sum: f64 = weights.iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ScoringError::InvalidWeights(format!(
                "engagement weights must sum to 1.0, got {:.6}",
                sum
            )));
        }

        if !self.time_cap_secs.is_finite() || self.time_cap_secs <= 0.0 {
            return Err(ScoringError::InvalidWeights(format!(
                "time_cap_secs must be positive, got {}",
                self.time_cap_secs
            )));
        }

        if !self.interaction_saturation.is_finite() || self.interaction_saturation <= 0.0 {
            return Err(ScoringError::InvalidWeights(format!(
                "interaction_saturation must be positive, got {}",
                self.interaction_saturation
            )));
        }

        Ok(())
    }
}

/// Compute the 0-100 engagement score.
///
/// Total for any `f64` input: negative, NaN and infinite components count as 0.
pub fn engagement_score(input: &EngagementInput, weights: &EngagementWeights) -> u32 {
    let avg_time = non_negative(input.avg_time_on_page);
    let scroll = non_negative(input.avg_scroll_depth);
    let completion = non_negative(input.completion_rate);
    let interaction_rate = non_negative(input.interaction_rate);
    let engagement_rate = non_negative(input.engagement_rate);

    // A non-positive cap cannot earn any time credit
    let time_ratio = if weights.time_cap_secs.is_finite() && weights.time_cap_secs > 0.0 {
        non_negative(avg_time / weights.time_cap_secs * 100.0).min(100.0)
    } else {
        0.0
    };

    let time_score = time_ratio * weights.time;
    let scroll_score = scroll * weights.scroll;
    let completion_score = completion * weights.completion;
    let interaction_score = non_negative(interaction_rate * weights.interaction_saturation)
        .min(100.0)
        * weights.interaction;
    let session_score = engagement_rate * weights.session;

    let total =
        time_score + scroll_score + completion_score + interaction_score + session_score;

    non_negative(total).round() as u32
}

/// Maps negative and non-finite values to 0.
pub(crate) fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_scenario_scores_70() {
        let input = EngagementInput {
            avg_time_on_page: 120.0,
            avg_scroll_depth: 100.0,
            completion_rate: 100.0,
            interaction_rate: 0.0,
            engagement_rate: 0.0,
        };
        assert_eq!(engagement_score(&input, &EngagementWeights::default()), 70);
    }

    #[test]
    fn test_time_component_caps_at_three_minutes() {
        let weights = EngagementWeights::default();
        let three_minutes = EngagementInput {
            avg_time_on_page: 180.0,
            ..Default::default()
        };
        let one_hour = EngagementInput {
            avg_time_on_page: 3600.0,
            ..Default::default()
        };

        assert_eq!(engagement_score(&three_minutes, &weights), 30);
        assert_eq!(engagement_score(&one_hour, &weights), 30);
    }

    #[test]
    fn test_interaction_rate_saturates_at_ten_percent() {
        let weights = EngagementWeights::default();
        let ten = EngagementInput {
            interaction_rate: 10.0,
            ..Default::default()
        };
        let fifty = EngagementInput {
            interaction_rate: 50.0,
            ..Default::default()
        };

        assert_eq!(engagement_score(&ten, &weights), 10);
        assert_eq!(engagement_score(&fifty, &weights), 10);
    }

    #[test]
    fn test_all_maxed_inputs_score_100() {
        let input = EngagementInput {
            avg_time_on_page: 600.0,
            avg_scroll_depth: 100.0,
            completion_rate: 100.0,
            interaction_rate: 25.0,
            engagement_rate: 100.0,
        };
        assert_eq!(engagement_score(&input, &EngagementWeights::default()), 100);
    }

    #[test]
    fn test_malformed_inputs_count_as_zero() {
        let input = EngagementInput {
            avg_time_on_page: f64::NAN,
            avg_scroll_depth: -50.0,
            completion_rate: f64::INFINITY,
            interaction_rate: f64::NEG_INFINITY,
            engagement_rate: 0.0,
        };
        assert_eq!(engagement_score(&input, &EngagementWeights::default()), 0);
    }

    #[test]
    fn test_degenerate_caps_earn_nothing() {
        let weights = EngagementWeights {
            time_cap_secs: 0.0,
            interaction_saturation: f64::NAN,
            ..Default::default()
        };
        let idle = EngagementInput::default();
        assert_eq!(engagement_score(&idle, &weights), 0);

        let busy = EngagementInput {
            avg_time_on_page: 90.0,
            interaction_rate: 20.0,
            ..Default::default()
        };
        assert_eq!(engagement_score(&busy, &weights), 0);
    }

    #[test]
    fn test_default_weights_are_valid() {
        assert!(EngagementWeights::default().validate().is_ok());
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let weights = EngagementWeights {
            time: 0.5,
            ..Default::default()
        };
        assert!(matches!(
            weights.validate(),
            Err(ScoringError::InvalidWeights(_))
        ));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let weights = EngagementWeights {
            time: 0.45,
            session: -0.05,
            ..Default::default()
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_zero_time_cap_rejected() {
        let weights = EngagementWeights {
            time_cap_secs: 0.0,
            ..Default::default()
        };
        assert!(weights.validate().is_err());
    }
}
