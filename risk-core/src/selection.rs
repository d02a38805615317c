//! Model comparison on the held-out test partition

use serde::{Deserialize, Serialize};

use crate::metrics::ClassificationReport;
use crate::model::ModelFamily;
use crate::threshold::{DecisionThreshold, ThresholdSource};

/// One tuned family scored on the test partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyEvaluation {
    pub family: ModelFamily,
    pub test_auc: f64,
    pub threshold: DecisionThreshold,
    pub threshold_source: ThresholdSource,
    pub report: ClassificationReport,
}

/// Strictly higher test AUC wins; a tie keeps the linear family
pub fn select_family(linear_auc: f64, tree_auc: f64) -> ModelFamily {
    if tree_auc > linear_auc {
        ModelFamily::TreeEnsemble
    } else {
        ModelFamily::Linear
    }
}

/// Threshold persisted with a family: the tuned cutoff for linear models,
/// the fixed default for tree ensembles
pub fn operating_threshold(family: ModelFamily, tuned_linear: DecisionThreshold) -> (DecisionThreshold, ThresholdSource) {
    match family {
        ModelFamily::Linear => (tuned_linear, ThresholdSource::Youden),
        ModelFamily::TreeEnsemble => (DecisionThreshold::default(), ThresholdSource::Default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threshold::DEFAULT_THRESHOLD;

    #[test]
    fn test_strictly_higher_auc_wins() {
        assert_eq!(select_family(0.81, 0.84), ModelFamily::TreeEnsemble);
        assert_eq!(select_family(0.84, 0.81), ModelFamily::Linear);
    }

    #[test]
    fn test_tie_goes_to_linear() {
        assert_eq!(select_family(0.83, 0.83), ModelFamily::Linear);
    }

    #[test]
    fn test_tree_winner_uses_default_threshold() {
        let tuned = DecisionThreshold::new(0.31).unwrap();
        let (t, source) = operating_threshold(ModelFamily::TreeEnsemble, tuned);
        assert_eq!(t.value(), DEFAULT_THRESHOLD);
        assert_eq!(source, ThresholdSource::Default);

        let (t, source) = operating_threshold(ModelFamily::Linear, tuned);
        assert_eq!(t, tuned);
        assert_eq!(source, ThresholdSource::Youden);
    }
}
