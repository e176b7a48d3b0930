// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Anomaly detectors.
//!
//! Five independent, pure functions, each scanning the same window of
//! [`ObserverEvent`]s for a different pattern, with the exact windows and
//! thresholds from spec.md §4.4b. None of them mutate state or know about
//! each other — the caller (typically a periodic sweep task in
//! `governor-std`) runs all five and persists whatever they find via
//! [`crate::storage::Storage::put_anomaly`].

use alloc::vec::Vec;

use crate::ids::AgentId;
use crate::types::{Anomaly, AnomalyLifecycle, AnomalyType, ObserverEvent, RiskLevel};

const FIVE_MIN_MS: u64 = 5 * 60 * 1_000;
const TEN_MIN_MS: u64 = 10 * 60 * 1_000;
const ONE_MIN_MS: u64 = 60 * 1_000;
const HOUR_MS: u64 = 60 * 60 * 1_000;

const ERROR_CLUSTER_THRESHOLD: usize = 5;
const ERROR_CLUSTER_CRITICAL: usize = 10;
const RISK_ESCALATION_THRESHOLD: usize = 3;
const RAPID_ACTIONS_THRESHOLD: usize = 10;
const RAPID_ACTIONS_HIGH: usize = 20;
const ACTIVITY_SPIKE_BASELINE_MIN: usize = 10;
const ACTIVITY_SPIKE_RATIO: f64 = 3.0;
const ACTIVITY_SPIKE_HIGH_RATIO: f64 = 5.0;
const TRUST_DROP_MEDIUM: i32 = 50;
const TRUST_DROP_HIGH: i32 = 75;
const TRUST_DROP_CRITICAL: i32 = 100;

fn events_for_agent<'a>(events: &'a [ObserverEvent], agent_id: &AgentId) -> Vec<&'a ObserverEvent> {
    events.iter().filter(|e| e.agent_id.as_ref() == Some(agent_id)).collect()
}

fn in_window<'a>(events: &[&'a ObserverEvent], since_ms: u64, until_ms: u64) -> Vec<&'a ObserverEvent> {
    events
        .iter()
        .copied()
        .filter(|e| e.timestamp_ms >= since_ms && e.timestamp_ms < until_ms)
        .collect()
}

fn span(events: &[&ObserverEvent]) -> (u64, u64) {
    let seqs = events.iter().map(|e| e.sequence);
    let from = seqs.clone().min().unwrap_or(0);
    let to = seqs.max().unwrap_or(0);
    (from, to)
}

/// *Activity spike* — last 5-min count >= 3x the hourly rate scaled down to
/// a 5-min equivalent, provided the baseline itself is at least 10 events
/// (so a jump from 1 to 3 events never counts as a "3x spike").
pub fn detect_activity_spike(agent_id: &AgentId, events: &[ObserverEvent], now_ms: u64) -> Option<Anomaly> {
    let agent_events = events_for_agent(events, agent_id);
    let recent_start = now_ms.saturating_sub(FIVE_MIN_MS);
    let baseline_start = recent_start.saturating_sub(HOUR_MS);

    let recent = in_window(&agent_events, recent_start, now_ms + 1);
    let baseline = in_window(&agent_events, baseline_start, recent_start);

    if baseline.len() < ACTIVITY_SPIKE_BASELINE_MIN {
        return None;
    }
    let baseline_scaled_to_5min = baseline.len() as f64 / 12.0;
    if baseline_scaled_to_5min <= 0.0 {
        return None;
    }
    let ratio = recent.len() as f64 / baseline_scaled_to_5min;
    if ratio < ACTIVITY_SPIKE_RATIO {
        return None;
    }

    let (from, to) = span(&recent);
    Some(Anomaly {
        anomaly_id: crate::ids::AnomalyId::generate(),
        agent_id: agent_id.clone(),
        anomaly_type: AnomalyType::ActivitySpike,
        severity: if ratio > ACTIVITY_SPIKE_HIGH_RATIO { RiskLevel::High } else { RiskLevel::Medium },
        description: alloc::format!(
            "{} events in the last 5 minutes vs a baseline of {:.1} ({ratio:.1}x)",
            recent.len(),
            baseline_scaled_to_5min
        ),
        evidence_from_sequence: from,
        evidence_to_sequence: to,
        detected_at_ms: now_ms,
        lifecycle: AnomalyLifecycle::Open,
        acknowledged_at_ms: None,
        resolved_at_ms: None,
    })
}

/// *Error cluster* — >=5 error/high/critical events in 5 min => high
/// (>10 => critical).
pub fn detect_error_cluster(agent_id: &AgentId, events: &[ObserverEvent], now_ms: u64) -> Option<Anomaly> {
    let agent_events = events_for_agent(events, agent_id);
    let window_start = now_ms.saturating_sub(FIVE_MIN_MS);
    let windowed = in_window(&agent_events, window_start, now_ms + 1);
    let errors: Vec<&&ObserverEvent> = windowed
        .iter()
        .filter(|e| e.event_type.contains("error") || e.event_type.contains("denied") || e.risk_level >= RiskLevel::High)
        .collect();
    if errors.len() < ERROR_CLUSTER_THRESHOLD {
        return None;
    }
    let (from, to) = span(&windowed);
    Some(Anomaly {
        anomaly_id: crate::ids::AnomalyId::generate(),
        agent_id: agent_id.clone(),
        anomaly_type: AnomalyType::ErrorCluster,
        severity: if errors.len() > ERROR_CLUSTER_CRITICAL { RiskLevel::Critical } else { RiskLevel::High },
        description: alloc::format!("{} error/high/critical events clustered in 5 minutes", errors.len()),
        evidence_from_sequence: from,
        evidence_to_sequence: to,
        detected_at_ms: now_ms,
        lifecycle: AnomalyLifecycle::Open,
        acknowledged_at_ms: None,
        resolved_at_ms: None,
    })
}

/// *Risk escalation* — >=3 high/critical risk events in 10 min => high
/// (any critical => critical).
pub fn detect_risk_escalation(agent_id: &AgentId, events: &[ObserverEvent], now_ms: u64) -> Option<Anomaly> {
    let agent_events = events_for_agent(events, agent_id);
    let window_start = now_ms.saturating_sub(TEN_MIN_MS);
    let windowed = in_window(&agent_events, window_start, now_ms + 1);
    let escalated: Vec<&&ObserverEvent> = windowed.iter().filter(|e| e.risk_level >= RiskLevel::High).collect();
    if escalated.len() < RISK_ESCALATION_THRESHOLD {
        return None;
    }
    let any_critical = escalated.iter().any(|e| e.risk_level == RiskLevel::Critical);
    let (from, to) = span(&windowed);
    Some(Anomaly {
        anomaly_id: crate::ids::AnomalyId::generate(),
        agent_id: agent_id.clone(),
        anomaly_type: AnomalyType::RiskEscalation,
        severity: if any_critical { RiskLevel::Critical } else { RiskLevel::High },
        description: alloc::format!("{} high/critical risk events within 10 minutes", escalated.len()),
        evidence_from_sequence: from,
        evidence_to_sequence: to,
        detected_at_ms: now_ms,
        lifecycle: AnomalyLifecycle::Open,
        acknowledged_at_ms: None,
        resolved_at_ms: None,
    })
}

/// *Rapid actions* — >=10 actions in 1 min => medium (>20 => high). Finds
/// the densest 1-minute sliding window over the agent's events via a
/// two-pointer scan (events are assumed delivered in non-decreasing
/// timestamp order, as Observer sequence order guarantees).
pub fn detect_rapid_actions(agent_id: &AgentId, events: &[ObserverEvent], now_ms: u64) -> Option<Anomaly> {
    let agent_events = events_for_agent(events, agent_id);
    let mut window_start = 0usize;
    let mut best = 0usize;
    let mut best_range = (0usize, 0usize);

    for (i, event) in agent_events.iter().enumerate() {
        while event.timestamp_ms.saturating_sub(agent_events[window_start].timestamp_ms) > ONE_MIN_MS {
            window_start += 1;
        }
        let count = i - window_start + 1;
        if count > best {
            best = count;
            best_range = (window_start, i);
        }
    }

    if best < RAPID_ACTIONS_THRESHOLD {
        return None;
    }

    let windowed: Vec<&ObserverEvent> = agent_events[best_range.0..=best_range.1].to_vec();
    let (from, to) = span(&windowed);
    Some(Anomaly {
        anomaly_id: crate::ids::AnomalyId::generate(),
        agent_id: agent_id.clone(),
        anomaly_type: AnomalyType::RapidActions,
        severity: if best > RAPID_ACTIONS_HIGH { RiskLevel::High } else { RiskLevel::Medium },
        description: alloc::format!("{best} actions within a single 1-minute window"),
        evidence_from_sequence: from,
        evidence_to_sequence: to,
        detected_at_ms: now_ms,
        lifecycle: AnomalyLifecycle::Open,
        acknowledged_at_ms: None,
        resolved_at_ms: None,
    })
}

/// *Trust drop* — cumulative negative score delta over 24h: >=50 => medium,
/// >75 => high, >100 => critical.
pub fn detect_trust_drop(agent_id: &AgentId, score_before: u16, score_after: u16, now_ms: u64) -> Option<Anomaly> {
    let drop = score_before as i32 - score_after as i32;
    if drop < TRUST_DROP_MEDIUM {
        return None;
    }
    let severity = if drop > TRUST_DROP_CRITICAL {
        RiskLevel::Critical
    } else if drop > TRUST_DROP_HIGH {
        RiskLevel::High
    } else {
        RiskLevel::Medium
    };
    Some(Anomaly {
        anomaly_id: crate::ids::AnomalyId::generate(),
        agent_id: agent_id.clone(),
        anomaly_type: AnomalyType::TrustDrop,
        severity,
        description: alloc::format!("trust score dropped {drop} points over the last 24h"),
        evidence_from_sequence: 0,
        evidence_to_sequence: 0,
        detected_at_ms: now_ms,
        lifecycle: AnomalyLifecycle::Open,
        acknowledged_at_ms: None,
        resolved_at_ms: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(agent: &AgentId, sequence: u64, timestamp_ms: u64, event_type: &str, risk: RiskLevel) -> ObserverEvent {
        ObserverEvent {
            sequence,
            timestamp_ms,
            source: "test".into(),
            event_type: event_type.into(),
            risk_level: risk,
            agent_id: Some(agent.clone()),
            user_id: None,
            data: serde_json::json!({}),
            previous_hash: "x".into(),
            hash: alloc::format!("h{sequence}"),
            signature: "sig".into(),
        }
    }

    #[test]
    fn activity_spike_requires_a_baseline_and_a_ratio() {
        let agent = AgentId::from("a1");
        let now = 70 * 60_000u64; // 70 minutes in.
        let recent_start = now - FIVE_MIN_MS; // 65 min
        let baseline_start = recent_start - HOUR_MS; // 5 min

        let mut events = Vec::new();
        let mut seq = 0u64;
        // Baseline: 24 events spread over [5min, 65min) -> scaled baseline of 2/5min.
        for i in 0..24u64 {
            let ts = baseline_start + i * ((recent_start - baseline_start) / 24);
            events.push(event(&agent, seq, ts, "action", RiskLevel::Low));
            seq += 1;
        }
        // Spike: 10 events in the last 5 minutes (>> 3x the ~2-event baseline).
        for i in 0..10u64 {
            events.push(event(&agent, seq, recent_start + i * 10_000, "action", RiskLevel::Low));
            seq += 1;
        }
        assert!(detect_activity_spike(&agent, &events, now).is_some());
    }

    #[test]
    fn no_spike_without_sufficient_baseline() {
        let agent = AgentId::from("a1");
        let now = 70 * 60_000u64;
        let recent_start = now - FIVE_MIN_MS;
        // Only 3 baseline events and a handful recent ones -> baseline too thin to judge.
        let events: Vec<ObserverEvent> = (0..3)
            .map(|i| event(&agent, i, i * 600_000, "action", RiskLevel::Low))
            .chain((3..8).map(|i| event(&agent, i, recent_start + i * 1_000, "action", RiskLevel::Low)))
            .collect();
        assert!(detect_activity_spike(&agent, &events, now).is_none());
    }

    #[test]
    fn error_cluster_escalates_to_critical_past_ten() {
        let agent = AgentId::from("a1");
        let events: Vec<ObserverEvent> =
            (0..11).map(|i| event(&agent, i, i * 10_000, "decision.error", RiskLevel::Low)).collect();
        let anomaly = detect_error_cluster(&agent, &events, 2 * 60_000).unwrap();
        assert_eq!(anomaly.severity, RiskLevel::Critical);
    }

    #[test]
    fn error_cluster_below_threshold_is_none() {
        let agent = AgentId::from("a1");
        let events: Vec<ObserverEvent> =
            (0..3).map(|i| event(&agent, i, i * 10_000, "decision.error", RiskLevel::Low)).collect();
        assert!(detect_error_cluster(&agent, &events, 1_000).is_none());
    }

    #[test]
    fn risk_escalation_any_critical_event_makes_it_critical() {
        let agent = AgentId::from("a1");
        let events = alloc::vec![
            event(&agent, 0, 0, "action", RiskLevel::High),
            event(&agent, 1, 1_000, "action", RiskLevel::High),
            event(&agent, 2, 2_000, "action", RiskLevel::Critical),
        ];
        let anomaly = detect_risk_escalation(&agent, &events, 5_000).unwrap();
        assert_eq!(anomaly.severity, RiskLevel::Critical);
    }

    #[test]
    fn rapid_actions_within_one_minute_detected() {
        let agent = AgentId::from("a1");
        let events: Vec<ObserverEvent> =
            (0..12).map(|i| event(&agent, i, i * 5_000, "action", RiskLevel::Low)).collect();
        let anomaly = detect_rapid_actions(&agent, &events, 60_000).unwrap();
        assert_eq!(anomaly.severity, RiskLevel::Medium);
    }

    #[test]
    fn rapid_actions_past_twenty_is_high() {
        let agent = AgentId::from("a1");
        let events: Vec<ObserverEvent> =
            (0..25).map(|i| event(&agent, i, i * 2_000, "action", RiskLevel::Low)).collect();
        let anomaly = detect_rapid_actions(&agent, &events, 60_000).unwrap();
        assert_eq!(anomaly.severity, RiskLevel::High);
    }

    #[test]
    fn no_rapid_actions_when_spread_out() {
        let agent = AgentId::from("a1");
        let events: Vec<ObserverEvent> =
            (0..12).map(|i| event(&agent, i, i * 30_000, "action", RiskLevel::Low)).collect();
        assert!(detect_rapid_actions(&agent, &events, 600_000).is_none());
    }

    #[test]
    fn trust_drop_below_threshold_is_ignored() {
        let agent = AgentId::from("a1");
        assert!(detect_trust_drop(&agent, 500, 460, 0).is_none());
    }

    #[test]
    fn trust_drop_fifty_to_seventyfive_is_medium() {
        let agent = AgentId::from("a1");
        let anomaly = detect_trust_drop(&agent, 500, 440, 0).unwrap();
        assert_eq!(anomaly.severity, RiskLevel::Medium);
    }

    #[test]
    fn trust_drop_past_one_hundred_is_critical() {
        let agent = AgentId::from("a1");
        let anomaly = detect_trust_drop(&agent, 900, 750, 0).unwrap();
        assert_eq!(anomaly.severity, RiskLevel::Critical);
    }
}
