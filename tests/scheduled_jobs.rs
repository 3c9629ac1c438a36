//! Job-level flows: calendar alerts, goal progress, strategist decisions,
//! and memory consolidation, each driven against the runtime with fakes.

mod common;

use std::time::Duration;

use std::collections::BTreeMap;

use aegis::goals::{Goal, GoalDashboard, GoalStatus};
use aegis::jobs;
use aegis::memory::MemoryCategory;
use common::{harness, harness_with, FixedGoals};

fn dashboard(active: usize, completed: usize, total: usize) -> GoalDashboard {
    GoalDashboard {
        domains: BTreeMap::new(),
        active_count: active,
        completed_count: completed,
        total_count: total,
    }
}

async fn recv_json(
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<String>,
) -> serde_json::Value {
    let payload = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("broadcast arrives")
        .expect("channel open");
    serde_json::from_str(&payload).expect("valid JSON")
}

#[tokio::test]
async fn calendar_scan_alerts_for_imminent_event() {
    let h = harness().await;
    let (_id, mut rx) = h.runtime.broadcaster.subscribe();

    h.calendar.set_upcoming_event("Design review", 10);

    jobs::calendar_scan::run(&h.runtime.job_context())
        .await
        .unwrap();

    let message = recv_json(&mut rx).await;
    assert_eq!(message["intervention_type"], "alert");
    assert_eq!(message["urgency"], 4);
    assert!(message["content"]
        .as_str()
        .unwrap()
        .contains("Design review"));
}

#[tokio::test]
async fn calendar_scan_ignores_distant_events() {
    let h = harness().await;
    let (_id, mut rx) = h.runtime.broadcaster.subscribe();

    // 16 minutes out: outside the (0, 15m] window.
    h.calendar.set_upcoming_event("Later meeting", 16);

    jobs::calendar_scan::run(&h.runtime.job_context())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn goal_check_reports_behind_when_ratio_low() {
    let goals = FixedGoals {
        goals: vec![Goal {
            id: "g1".to_string(),
            title: "Ship the parser".to_string(),
            domain: "productivity".to_string(),
            status: GoalStatus::Active,
            due_date: None,
        }],
        dashboard: dashboard(4, 1, 5),
    };
    let h = harness_with("ok", Some(goals)).await;
    let (_id, mut rx) = h.runtime.broadcaster.subscribe();

    jobs::goal_check::run(&h.runtime.job_context())
        .await
        .unwrap();

    let message = recv_json(&mut rx).await;
    assert_eq!(message["type"], "ambient");
    assert_eq!(message["state"], "goal_behind");
    assert!(message["tooltip"].as_str().unwrap().contains("20%"));
}

#[tokio::test]
async fn goal_check_reports_on_track() {
    let goals = FixedGoals {
        goals: Vec::new(),
        dashboard: dashboard(1, 4, 5),
    };
    let h = harness_with("ok", Some(goals)).await;
    let (_id, mut rx) = h.runtime.broadcaster.subscribe();

    jobs::goal_check::run(&h.runtime.job_context())
        .await
        .unwrap();

    let message = recv_json(&mut rx).await;
    assert_eq!(message["state"], "on_track");
}

#[tokio::test]
async fn strategist_decision_is_dispatched() {
    let decision = r#"{"should_intervene": true, "content": "Stretch break?", "intervention_type": "nudge", "urgency": 2, "reasoning": "Two hours of coding"}"#;
    let h = harness_with(decision, None).await;
    let (_id, mut rx) = h.runtime.broadcaster.subscribe();

    jobs::strategist::run(&h.runtime.job_context())
        .await
        .unwrap();

    let message = recv_json(&mut rx).await;
    assert_eq!(message["content"], "Stretch break?");
    assert_eq!(message["intervention_type"], "nudge");

    // The prompt carried the proactivity level and context block.
    let prompts = h.llm.prompts.lock().unwrap();
    assert!(prompts[0].contains("Proactivity level: 3/5"));
    assert!(prompts[0].contains("User state:"));
}

#[tokio::test]
async fn strategist_garbage_response_stays_silent() {
    let h = harness_with("I don't feel like JSON today.", None).await;
    let (_id, mut rx) = h.runtime.broadcaster.subscribe();

    jobs::strategist::run(&h.runtime.job_context())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn daily_briefing_is_scheduled_delivery() {
    let h = harness_with("Good morning! Calm day ahead.", None).await;
    let (_id, mut rx) = h.runtime.broadcaster.subscribe();

    jobs::daily_briefing::run(&h.runtime.job_context())
        .await
        .unwrap();

    let message = recv_json(&mut rx).await;
    assert_eq!(message["intervention_type"], "advisory");
    assert_eq!(message["urgency"], 3);
    assert_eq!(message["content"], "Good morning! Calm day ahead.");

    // Briefing prompt included soul and memories.
    let prompts = h.llm.prompts.lock().unwrap();
    assert!(prompts[0].contains("## User Identity"));
    assert!(prompts[0].contains("quiet mornings"));
}

#[tokio::test]
async fn activity_digest_skips_when_no_observations() {
    let h = harness().await;
    let (_id, mut rx) = h.runtime.broadcaster.subscribe();

    jobs::activity_digest::run(&h.runtime.job_context())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(rx.try_recv().is_err());
    // The LLM was never consulted.
    assert!(h.llm.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn consolidation_stores_extracted_memories() {
    let extraction = r#"{
        "facts": ["Ada is a compiler engineer"],
        "patterns": [],
        "goals": ["Plan the week every Monday"],
        "reflections": [],
        "soul_updates": {"Identity": "- Name: Ada\n- Role: Compiler engineer"}
    }"#;
    let h = harness_with(extraction, None).await;

    jobs::consolidation::run(&h.runtime.job_context())
        .await
        .unwrap();

    let stored = h.memory.stored.lock().unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored
        .iter()
        .any(|(content, category)| content.contains("Ada") && *category == MemoryCategory::Fact));
    assert!(stored
        .iter()
        .any(|(_, category)| *category == MemoryCategory::Goal));

    // Soul got the identity update.
    let soul = h.runtime.job_context().soul.read();
    assert!(soul.contains("Role: Compiler engineer"));
}
