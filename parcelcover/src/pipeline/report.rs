//! Per-layer outcomes and the end-of-run report.

use std::fmt;
use std::time::Duration;

/// The stages a layer moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Select,
    Measure,
    Intersect,
    Summarize,
    Join,
    Export,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Stage; 6] = [
        Stage::Select,
        Stage::Measure,
        Stage::Intersect,
        Stage::Summarize,
        Stage::Join,
        Stage::Export,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Select => "select",
            Stage::Measure => "measure",
            Stage::Intersect => "intersect",
            Stage::Summarize => "summarize",
            Stage::Join => "join",
            Stage::Export => "export",
        };
        f.write_str(name)
    }
}

/// How long one stage of one layer took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed: Duration,
}

/// Terminal state of one layer's run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerStatus {
    Finalized,
    Failed {
        stage: Stage,
        kind: &'static str,
        message: String,
    },
}

/// Everything the run recorded about one layer.
///
/// A failure in one layer never aborts the others; each outcome stands on
/// its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerOutcome {
    pub layer: String,
    pub status: LayerStatus,
    /// True when the overlay produced zero features (informational).
    pub empty_intersection: bool,
    pub timings: Vec<StageTiming>,
    pub elapsed: Duration,
}

impl LayerOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, LayerStatus::Failed { .. })
    }
}

/// Aggregate report for a whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcomes: Vec<LayerOutcome>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.len() - self.failed()
    }

    /// Process exit code: non-zero iff any layer failed.
    pub fn exit_code(&self) -> i32 {
        if self.failed() > 0 {
            1
        } else {
            0
        }
    }

    /// Human-readable summary, one line per layer.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for outcome in &self.outcomes {
            match &outcome.status {
                LayerStatus::Finalized => {
                    out.push_str(&format!(
                        "{:<32} finalized in {:.2}s{}\n",
                        outcome.layer,
                        outcome.elapsed.as_secs_f64(),
                        if outcome.empty_intersection {
                            " (no overlap)"
                        } else {
                            ""
                        },
                    ));
                }
                LayerStatus::Failed {
                    stage,
                    kind,
                    message,
                } => {
                    out.push_str(&format!(
                        "{:<32} failed at {stage}: {kind}: {message}\n",
                        outcome.layer,
                    ));
                }
            }
        }
        out.push_str(&format!(
            "{} finalized, {} failed in {:.2}s\n",
            self.succeeded(),
            self.failed(),
            self.elapsed.as_secs_f64(),
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finalized(layer: &str) -> LayerOutcome {
        LayerOutcome {
            layer: layer.to_string(),
            status: LayerStatus::Finalized,
            empty_intersection: false,
            timings: vec![],
            elapsed: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_exit_code_zero_when_all_finalized() {
        let report = RunReport {
            outcomes: vec![finalized("a"), finalized("b")],
            elapsed: Duration::from_millis(20),
        };
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.succeeded(), 2);
    }

    #[test]
    fn test_exit_code_nonzero_on_any_failure() {
        let mut failed = finalized("b");
        failed.status = LayerStatus::Failed {
            stage: Stage::Join,
            kind: "DivisionByZero",
            message: "zero denominator".to_string(),
        };
        let report = RunReport {
            outcomes: vec![finalized("a"), failed],
            elapsed: Duration::from_millis(20),
        };
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.failed(), 1);

        let rendered = report.render();
        assert!(rendered.contains("failed at join: DivisionByZero"));
        assert!(rendered.contains("1 finalized, 1 failed"));
    }

    #[test]
    fn test_render_marks_empty_intersection() {
        let mut outcome = finalized("a");
        outcome.empty_intersection = true;
        let report = RunReport {
            outcomes: vec![outcome],
            elapsed: Duration::from_millis(5),
        };
        assert!(report.render().contains("(no overlap)"));
    }

    #[test]
    fn test_stage_order_and_names() {
        let names: Vec<String> = Stage::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            vec!["select", "measure", "intersect", "summarize", "join", "export"]
        );
    }
}
