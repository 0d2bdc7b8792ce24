//! Verdicts, vote histograms and debounced decisions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Label emitted when no category has a consensus.
pub const UNCERTAIN_LABEL: &str = "uncertain";

/// Label emitted when the anomaly category has a consensus.
pub const ANOMALY_LABEL: &str = "anomaly";

/// One cycle's raw outcome, before smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Index into the model's label list
    Class(usize),
    Uncertain,
    Anomaly,
}

/// Where the history window is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePhase {
    /// Fewer than N verdicts recorded; unfilled slots vote `Uncertain`
    Filling,
    /// Window holds N real verdicts and keeps rotating
    Steady,
}

impl fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnginePhase::Filling => write!(f, "Filling"),
            EnginePhase::Steady => write!(f, "Steady"),
        }
    }
}

/// Smoothed output category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionCategory {
    Class { index: usize, label: String },
    Uncertain,
    Anomaly,
}

impl DecisionCategory {
    /// Printed label: the class label, `uncertain` or `anomaly`.
    pub fn label(&self) -> &str {
        match self {
            DecisionCategory::Class { label, .. } => label,
            DecisionCategory::Uncertain => UNCERTAIN_LABEL,
            DecisionCategory::Anomaly => ANOMALY_LABEL,
        }
    }

    pub const fn is_class(&self) -> bool {
        matches!(self, DecisionCategory::Class { .. })
    }
}

impl fmt::Display for DecisionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Vote counts over the decision history.
///
/// Categories are ordered classes first (by index), then `Uncertain`, then
/// `Anomaly`. That order is also the tie-break order of the voting policy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoteHistogram {
    pub class_counts: Vec<usize>,
    pub uncertain: usize,
    pub anomaly: usize,
}

impl VoteHistogram {
    /// Empty histogram for `label_count` classes.
    pub fn new(label_count: usize) -> Self {
        Self {
            class_counts: vec![0; label_count],
            uncertain: 0,
            anomaly: 0,
        }
    }

    /// Count one verdict. Class indices outside the label range are ignored.
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Class(ix) => {
                if let Some(slot) = self.class_counts.get_mut(ix) {
                    *slot += 1;
                }
            }
            Verdict::Uncertain => self.uncertain += 1,
            Verdict::Anomaly => self.anomaly += 1,
        }
    }

    /// Votes recorded for `verdict`'s category.
    pub fn count(&self, verdict: Verdict) -> usize {
        match verdict {
            Verdict::Class(ix) => self.class_counts.get(ix).copied().unwrap_or(0),
            Verdict::Uncertain => self.uncertain,
            Verdict::Anomaly => self.anomaly,
        }
    }

    /// Every category with its count, in tie-break order.
    pub fn categories(&self) -> impl Iterator<Item = (Verdict, usize)> + '_ {
        self.class_counts
            .iter()
            .enumerate()
            .map(|(ix, &count)| (Verdict::Class(ix), count))
            .chain([
                (Verdict::Uncertain, self.uncertain),
                (Verdict::Anomaly, self.anomaly),
            ])
    }

    /// Sum of all counts; equals the window size once populated.
    pub fn total(&self) -> usize {
        self.class_counts.iter().sum::<usize>() + self.uncertain + self.anomaly
    }

    /// Flat count array `[c0, c1, .., uncertain, anomaly]`.
    pub fn as_counts(&self) -> Vec<usize> {
        self.categories().map(|(_, count)| count).collect()
    }
}

impl fmt::Display for VoteHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ ")?;
        let counts = self.as_counts();
        for (i, count) in counts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{count}")?;
        }
        write!(f, " ]")
    }
}

/// Debounced output of one engine cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub category: DecisionCategory,
    pub histogram: VoteHistogram,
}

impl Decision {
    pub fn label(&self) -> &str {
        self.category.label()
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.category, self.histogram)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_category_order() {
        let mut h = VoteHistogram::new(2);
        h.record(Verdict::Class(1));
        h.record(Verdict::Anomaly);
        h.record(Verdict::Uncertain);
        h.record(Verdict::Uncertain);
        assert_eq!(h.as_counts(), vec![0, 1, 2, 1]);
        assert_eq!(h.total(), 4);
    }

    #[test]
    fn test_histogram_ignores_unknown_class() {
        let mut h = VoteHistogram::new(2);
        h.record(Verdict::Class(7));
        assert_eq!(h.total(), 0);
        assert_eq!(h.count(Verdict::Class(7)), 0);
    }

    #[test]
    fn test_display_label_then_counts() {
        let mut h = VoteHistogram::new(2);
        for _ in 0..5 {
            h.record(Verdict::Class(0));
        }
        h.record(Verdict::Class(1));
        let d = Decision {
            category: DecisionCategory::Class {
                index: 0,
                label: "idle".to_string(),
            },
            histogram: h,
        };
        assert_eq!(d.to_string(), "idle [ 5, 1, 0, 0 ]");
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(DecisionCategory::Uncertain.label(), "uncertain");
        assert_eq!(DecisionCategory::Anomaly.label(), "anomaly");
        assert!(!DecisionCategory::Anomaly.is_class());
    }

    #[test]
    fn test_decision_serializes_tagged() {
        let d = Decision {
            category: DecisionCategory::Anomaly,
            histogram: VoteHistogram::new(1),
        };
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains(r#""kind":"anomaly""#), "{json}");
    }
}
