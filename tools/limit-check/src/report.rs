//! Printable check results

use serde::Serialize;
use servegate_core::{CheckOutcome, Modality};

/// One line of CLI output
#[derive(Debug, Serialize)]
pub struct Report {
    pub modality: Modality,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub limit: f64,
    pub unit: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Report {
    pub fn new(modality: Modality, limit: f64, outcome: &CheckOutcome) -> Self {
        let message = match outcome {
            CheckOutcome::Indeterminate { reason, .. } => Some(reason.clone()),
            CheckOutcome::Error(e) => Some(e.to_string()),
            _ => None,
        };

        Self {
            modality,
            status: outcome.status(),
            value: outcome.measurement().map(|m| m.value),
            limit,
            unit: modality.unit(),
            message,
        }
    }

    pub fn print(&self, json: bool) -> anyhow::Result<()> {
        if json {
            println!("{}", serde_json::to_string(self)?);
            return Ok(());
        }

        match (self.value, &self.message) {
            (Some(value), _) => println!(
                "{}: {} ({} {}, limit {})",
                self.modality, self.status, value, self.unit, self.limit
            ),
            (None, Some(message)) => println!("{}: {} ({})", self.modality, self.status, message),
            (None, None) => println!("{}: {}", self.modality, self.status),
        }
        Ok(())
    }
}

/// Process exit status used when a command cannot run at all
pub const EXIT_ERROR: u8 = 3;

/// 0 pass, 1 fail, 2 indeterminate, 3 error
pub fn exit_status(outcome: &CheckOutcome) -> u8 {
    match outcome {
        CheckOutcome::Pass(_) => 0,
        CheckOutcome::Fail(_) => 1,
        CheckOutcome::Indeterminate { .. } => 2,
        CheckOutcome::Error(_) => EXIT_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use servegate_core::{Error, Measurement};

    #[test]
    fn test_report_from_pass() {
        let outcome = Measurement::new(Modality::Pdf, 3.0, 10.0).into_outcome();
        let report = Report::new(Modality::Pdf, 10.0, &outcome);

        assert_eq!(report.status, "pass");
        assert_eq!(report.value, Some(3.0));
        assert_eq!(report.unit, "pages");
        assert!(report.message.is_none());
        assert_eq!(exit_status(&outcome), 0);
    }

    #[test]
    fn test_report_json_skips_empty_fields() {
        let outcome = CheckOutcome::Error(Error::FeatureUnavailable(Modality::Video));
        let report = Report::new(Modality::Video, 600.0, &outcome);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["modality"], "video");
        assert_eq!(json["status"], "error");
        assert!(json.get("value").is_none());
        assert!(json["message"].as_str().unwrap().contains("video"));
        assert_eq!(exit_status(&outcome), EXIT_ERROR);
    }
}
