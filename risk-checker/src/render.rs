//! Result rendering

use risk_core::explain::{explain, RiskLevel, EXPLANATION_CAPTION};
use risk_core::{PatientRecord, PredictionResult};

pub fn label(prediction: u8) -> &'static str {
    if prediction == 1 {
        "At risk (at or above the model's decision threshold)"
    } else {
        "Not at risk (below the model's decision threshold)"
    }
}

/// Probability, band, label and cut-off explanation as terminal text
pub fn render(record: &PatientRecord, result: &PredictionResult) -> String {
    let level = RiskLevel::from_probability(result.probability);
    let mut out = format!(
        "Result\n  Predicted probability: {:.1}%\n  Risk level: {}\n  Prediction: {}\n\nWhy this result?\n",
        result.probability * 100.0,
        level,
        label(result.prediction),
    );
    for reason in explain(record) {
        out.push_str(&format!("  * {}\n", reason.message));
    }
    out.push_str(&format!("  {}\n", EXPLANATION_CAPTION));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::default_record;

    #[test]
    fn test_render_default_record() {
        let result = PredictionResult { probability: 0.2345, prediction: 0 };
        let text = render(&default_record(), &result);

        assert!(text.contains("Predicted probability: 23.4%") || text.contains("Predicted probability: 23.5%"));
        assert!(text.contains("Risk level: Low-moderate"));
        assert!(text.contains("Not at risk"));
        assert!(text.contains("Glucose is elevated"));
        assert!(text.contains("Age is 35+"));
        assert!(text.ends_with(&format!("{}\n", EXPLANATION_CAPTION)));
    }

    #[test]
    fn test_render_high_risk() {
        let result = PredictionResult { probability: 0.81, prediction: 1 };
        let text = render(&default_record(), &result);
        assert!(text.contains("81.0%"));
        assert!(text.contains("Risk level: High"));
        assert!(text.contains("At risk"));
    }
}
