//! Behavioural properties of the window and the consensus vote, exercised
//! through the public library API.

use motion_consensus::classifier::{Classifier, ClassifierError};
use motion_consensus::pipeline::{shared_window, InferenceEngine, SampleWindow};
use motion_consensus::{
    ClassificationResult, CycleError, DecisionCategory, EnginePhase, SmoothingConfig,
    SmoothingEngine, Verdict,
};

// ============================================================================
// Helpers
// ============================================================================

fn labels() -> Vec<String> {
    vec!["idle".to_string(), "walk".to_string()]
}

fn config(readings: usize, min_readings_same: usize) -> SmoothingConfig {
    SmoothingConfig {
        readings,
        min_readings_same,
        classifier_confidence: 0.8,
        anomaly_confidence: 0.3,
        ..SmoothingConfig::default()
    }
}

fn result(idle: f32, walk: f32) -> ClassificationResult {
    ClassificationResult::from_pairs([("idle", idle), ("walk", walk)])
}

/// Returns queued results in order; `None` entries fail with code -3.
struct Scripted {
    labels: Vec<String>,
    queue: std::collections::VecDeque<Option<ClassificationResult>>,
}

impl Classifier for Scripted {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn has_anomaly(&self) -> bool {
        true
    }

    fn classify(&mut self, _samples: &[f32]) -> Result<ClassificationResult, ClassifierError> {
        match self.queue.pop_front().flatten() {
            Some(r) => Ok(r),
            None => Err(ClassifierError::new(-3, "scripted failure")),
        }
    }
}

// ============================================================================
// Sample Window
// ============================================================================

#[test]
fn window_holds_most_recent_readings_in_arrival_order() {
    let mut window = SampleWindow::new(12).unwrap();
    for i in 0..10 {
        let v = (i * 10) as f32;
        window.push_sample(v, v + 1.0, v + 2.0);
    }
    assert_eq!(window.as_slice().len(), 12);
    assert_eq!(
        window.as_slice(),
        &[60.0, 61.0, 62.0, 70.0, 71.0, 72.0, 80.0, 81.0, 82.0, 90.0, 91.0, 92.0]
    );
}

#[test]
fn window_rejects_unusable_frame_sizes() {
    assert!(SampleWindow::new(0).is_err());
    assert!(SampleWindow::new(374).is_err());
    assert!(SampleWindow::new(375).is_ok());
}

// ============================================================================
// Consensus Vote
// ============================================================================

#[test]
fn steady_class_is_emitted_from_the_nth_cycle() {
    let mut engine = SmoothingEngine::new(labels(), &config(10, 7)).unwrap();

    for cycle in 1..=15 {
        let decision = engine.update(&result(0.0, 1.0));
        if cycle >= 10 {
            assert_eq!(decision.label(), "walk", "cycle {cycle}");
            assert_eq!(decision.histogram.class_counts[1], 10);
        }
    }
    assert_eq!(engine.phase(), EnginePhase::Steady);
}

#[test]
fn consensus_needs_strictly_more_than_threshold() {
    let mut engine = SmoothingEngine::new(labels(), &config(10, 7)).unwrap();

    // 7 votes for walk: count == T
    let mut decision = None;
    for _ in 0..7 {
        decision = Some(engine.update(&result(0.0, 0.9)));
    }
    assert_eq!(decision.unwrap().category, DecisionCategory::Uncertain);

    // 8th vote crosses the threshold
    let decision = engine.update(&result(0.0, 0.9));
    assert_eq!(decision.label(), "walk");
}

#[test]
fn zero_confidence_is_always_uncertain() {
    let mut engine = SmoothingEngine::new(labels(), &config(5, 2)).unwrap();
    for _ in 0..12 {
        let decision = engine.update(&result(0.0, 0.0));
        assert_eq!(decision.category, DecisionCategory::Uncertain);
    }
}

#[test]
fn anomaly_takes_precedence_over_confident_class() {
    let engine = SmoothingEngine::new(labels(), &config(5, 2)).unwrap();
    let verdict = engine.verdict_for(&result(0.95, 0.0).with_anomaly(0.3));
    assert_eq!(verdict, Verdict::Anomaly);
}

#[test]
fn mixed_stream_settles_on_majority() {
    let mut engine = SmoothingEngine::new(labels(), &config(6, 4)).unwrap();
    let stream = [
        result(0.9, 0.1),
        result(0.9, 0.1),
        result(0.1, 0.9),
        result(0.9, 0.1),
        result(0.9, 0.1),
        result(0.9, 0.1),
    ];

    let mut last = None;
    for r in &stream {
        last = Some(engine.update(r));
    }
    let decision = last.unwrap();
    assert_eq!(decision.histogram.class_counts, vec![5, 1]);
    assert_eq!(decision.histogram.uncertain, 0);
    assert_eq!(decision.label(), "idle");
    assert_eq!(decision.to_string(), "idle [ 5, 1, 0, 0 ]");
}

#[test]
fn unfilled_slots_never_vote_for_a_class() {
    let mut engine = SmoothingEngine::new(labels(), &config(10, 7)).unwrap();
    let decision = engine.update(&result(1.0, 0.0));
    assert_eq!(decision.histogram.uncertain, 9);
    assert_eq!(decision.category, DecisionCategory::Uncertain);
    assert_eq!(engine.phase(), EnginePhase::Filling);
}

// ============================================================================
// Cycle Failures
// ============================================================================

#[test]
fn failed_cycle_is_skipped_without_touching_history() {
    let (writer, reader) = shared_window(3).unwrap();
    writer.push_sample(0.0, 0.0, 9.81);

    let classifier = Scripted {
        labels: labels(),
        queue: vec![Some(result(0.0, 1.0)), None, Some(result(0.0, 1.0))].into(),
    };
    let mut engine = InferenceEngine::new(classifier, reader, &config(4, 1)).unwrap();

    engine.on_cycle().unwrap();
    let before: Vec<Verdict> = engine.smoothing().history().collect();

    let err = engine.on_cycle().unwrap_err();
    assert_eq!(
        err,
        CycleError::ClassifierFailure(ClassifierError::new(-3, "scripted failure"))
    );
    let after: Vec<Verdict> = engine.smoothing().history().collect();
    assert_eq!(before, after);

    let decision = engine.on_cycle().unwrap();
    assert_eq!(decision.label(), "walk");
    assert_eq!(engine.smoothing().recorded_cycles(), 2);
}
