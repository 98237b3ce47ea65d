//! The decision engine: one pure function from a [`DecisionContext`] to a
//! [`DecisionResult`].
//!
//! Order of evaluation:
//! 1. health gate on the critical analyzer
//! 2. directional gate (critical analyzer must read LONG)
//! 3. sum of healthy contributions, clamped to [0, 1]
//! 4. LONG when the sum reaches `confidence_threshold`
//!
//! No I/O, no clock, no logging, no mutation of the context.

use std::collections::BTreeMap;

use common::{AnalyzerResult, AnalyzerState, DecisionResult, Signal};

use crate::DecisionContext;

pub fn decide(context: &DecisionContext<'_>) -> DecisionResult {
    let config = context.config();
    let results: Vec<AnalyzerResult> = context
        .results()
        .iter()
        .cloned()
        .map(AnalyzerResult::normalized)
        .collect();
    let threshold = config.confidence_threshold;
    let critical_name = config.critical_analyzer.as_str();

    let Some(critical) = results.iter().find(|r| r.analyzer == critical_name) else {
        return gated(
            format!("{critical_name} result missing, treated as ERROR"),
            threshold,
        );
    };

    if !critical.is_healthy() {
        return gated(
            format!(
                "{critical_name} unhealthy ({}): {}",
                critical.status, critical.reason
            ),
            threshold,
        );
    }

    if critical.state != AnalyzerState::Long {
        return gated(
            format!(
                "{critical_name} reads {}: {}",
                critical.state, critical.reason
            ),
            threshold,
        );
    }

    let raw: f64 = results
        .iter()
        .filter(|r| r.is_healthy())
        .map(|r| r.contribution)
        .sum();
    let confidence = raw.clamp(0.0, 1.0);
    let signal = if confidence >= threshold {
        Signal::Long
    } else {
        Signal::Hold
    };

    let mut contributors: Vec<&AnalyzerResult> = results
        .iter()
        .filter(|r| r.is_healthy() && r.contribution > 0.0)
        .collect();
    contributors.sort_by(|a, b| {
        b.contribution
            .total_cmp(&a.contribution)
            .then_with(|| a.analyzer.cmp(&b.analyzer))
    });

    let mut reasons: Vec<String> = contributors.iter().map(|r| r.reason.clone()).collect();
    if signal == Signal::Hold {
        reasons.push(format!(
            "confidence {confidence:.3} below threshold {threshold:.3}"
        ));
    }

    let mut metadata = BTreeMap::new();
    metadata.insert("threshold".to_string(), threshold);
    metadata.insert("raw_confidence".to_string(), raw);
    metadata.insert("contributors".to_string(), contributors.len() as f64);
    metadata.insert("critical_score".to_string(), critical.score);

    DecisionResult {
        signal,
        confidence,
        reasons,
        metadata,
    }
}

/// HOLD produced by a gate, before any aggregation.
fn gated(reason: String, threshold: f64) -> DecisionResult {
    let mut result = DecisionResult::hold(reason);
    result.metadata.insert("threshold".to_string(), threshold);
    result
}
