//! Output formatting for CLI display.

use crate::model::RunResult;

/// End-of-run summary: successes with their ids, then failures with errors.
pub(super) fn format_summary(run: &RunResult) -> String {
    let attempted = run.outcomes.len();
    let succeeded = run.outcomes.iter().filter(|o| o.is_success()).count();

    let mut lines = vec![format!(
        "Submitted {succeeded} of {attempted} band(s) for {}",
        run.event_id
    )];

    for outcome in &run.outcomes {
        match &outcome.result {
            Ok(success) => {
                let ids = format_ids(&success.pointing_ids);
                let mut line = format!("  {}: ok [{ids}]", outcome.band);
                if !success.warnings.is_empty() {
                    line.push_str(&format!(" ({} warning(s))", success.warnings.len()));
                }
                lines.push(line);
            }
            Err(failure) => lines.push(format!("  {}: FAILED {}", outcome.band, failure.error)),
        }
    }

    lines.join("\n")
}

fn format_ids(ids: &[u64]) -> String {
    if ids.is_empty() {
        return "no ids".to_string();
    }
    ids.iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::Value;
    use uuid::Uuid;

    use crate::model::{BandOutcome, SubmissionFailure, SubmissionSuccess};

    #[test]
    fn summary_lists_successes_and_failures() {
        let run = RunResult {
            run_id: Uuid::new_v4(),
            event_id: "TEST_EVENT".into(),
            batches: Vec::new(),
            outcomes: vec![
                BandOutcome {
                    band: "g".into(),
                    result: Ok(SubmissionSuccess {
                        pointing_ids: vec![11, 12],
                        errors: Vec::new(),
                        warnings: vec![Value::from("late")],
                        response: Value::Null,
                    }),
                },
                BandOutcome {
                    band: "r".into(),
                    result: Err(SubmissionFailure {
                        band: "r".into(),
                        error: "service returned 500: oops".into(),
                    }),
                },
            ],
        };

        let summary = format_summary(&run);
        assert_eq!(
            summary,
            "Submitted 1 of 2 band(s) for TEST_EVENT\n\
             \x20 g: ok [11, 12] (1 warning(s))\n\
             \x20 r: FAILED service returned 500: oops"
        );
    }
}
