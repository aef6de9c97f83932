//! End-to-end workflow scenarios against scripted collaborators.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use vetted_core::{AppError, AppResult};

use super::mocks::{MockGenerator, ScriptedJudge, StaticRetriever, StaticSearch, Verdict};
use crate::collaborators::{Generator, Judge, JudgeKind, JudgeRequest, Retriever, WebSearch};
use crate::flow::{FlowConfig, Workflow};
use crate::state::{Degradation, JudgmentSubject, PassageOrigin, RunReport};

fn workflow(
    retriever: Arc<dyn Retriever>,
    judge: Arc<dyn Judge>,
    generator: Arc<dyn Generator>,
    search: Arc<dyn WebSearch>,
    max_attempts: u32,
) -> Workflow {
    Workflow::new(
        retriever,
        judge,
        generator,
        search,
        FlowConfig {
            top_k: 4,
            max_generation_attempts: max_attempts,
            collaborator_timeout: Duration::from_secs(30),
        },
    )
}

fn count_judgments(report: &RunReport, subject: JudgmentSubject, verdict: bool) -> usize {
    report
        .evaluation_trail
        .iter()
        .filter(|j| j.subject == subject && j.verdict == verdict)
        .count()
}

#[tokio::test]
async fn scenario_a_documents_sufficient() {
    let retriever = Arc::new(StaticRetriever::with_passages(&["p1", "p2", "p3"]));
    let judge = Arc::new(
        ScriptedJudge::new()
            .doc("p1", Verdict::Yes)
            .doc("p2", Verdict::Yes)
            .doc("p3", Verdict::No)
            .groundedness_seq(&[Verdict::Yes])
            .relevance_seq(&[Verdict::Yes]),
    );
    let generator = Arc::new(MockGenerator::new());
    let search = Arc::new(StaticSearch::with_results(&[]));

    let flow = workflow(
        retriever,
        judge.clone(),
        generator.clone(),
        search.clone(),
        3,
    );
    let report = flow.answer("what is p?").await.unwrap();

    assert!(!report.used_web_search);
    assert!(!report.is_degraded());
    assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

    // The answer is traceable to exactly the relevant subset, in order
    let texts: Vec<&str> = report
        .answer
        .supporting
        .iter()
        .map(|p| p.text.as_str())
        .collect();
    assert_eq!(texts, vec!["p1", "p2"]);
    assert!(report
        .answer
        .supporting
        .iter()
        .all(|p| p.origin == PassageOrigin::Document));

    assert_eq!(
        count_judgments(&report, JudgmentSubject::DocumentRelevance, true),
        2
    );
    assert_eq!(
        count_judgments(&report, JudgmentSubject::DocumentRelevance, false),
        1
    );
    assert_eq!(count_judgments(&report, JudgmentSubject::Groundedness, true), 1);
    assert_eq!(
        count_judgments(&report, JudgmentSubject::AnswerRelevance, true),
        1
    );
}

#[tokio::test]
async fn scenario_b_empty_index_falls_back_to_web() {
    let retriever = Arc::new(StaticRetriever::empty());
    let judge = Arc::new(
        ScriptedJudge::new()
            .groundedness_seq(&[Verdict::Yes])
            .relevance_seq(&[Verdict::Yes]),
    );
    let generator = Arc::new(MockGenerator::new());
    let search = Arc::new(StaticSearch::with_results(&[
        ("web one", "https://a.example"),
        ("web two", "https://b.example"),
    ]));

    let flow = workflow(
        retriever,
        judge.clone(),
        generator.clone(),
        search.clone(),
        3,
    );
    let report = flow.answer("anything online?").await.unwrap();

    assert!(report.used_web_search);
    assert!(!report.is_degraded());
    assert_eq!(search.calls.load(Ordering::SeqCst), 1);

    // Zero retrieved passages: grading is skipped entirely
    assert_eq!(judge.doc_calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        count_judgments(&report, JudgmentSubject::DocumentRelevance, true)
            + count_judgments(&report, JudgmentSubject::DocumentRelevance, false),
        0
    );

    assert_eq!(report.answer.supporting.len(), 2);
    assert!(report
        .answer
        .supporting
        .iter()
        .all(|p| p.origin == PassageOrigin::Web));
}

#[tokio::test]
async fn scenario_c_never_grounded_exhausts_budget() {
    let retriever = Arc::new(StaticRetriever::with_passages(&["p1", "p2"]));
    let judge = Arc::new(
        ScriptedJudge::new()
            .doc("p1", Verdict::Yes)
            .doc("p2", Verdict::Yes)
            .groundedness_default(Verdict::No),
    );
    let generator = Arc::new(MockGenerator::new());
    let search = Arc::new(StaticSearch::with_results(&[("web", "https://w.example")]));

    let flow = workflow(
        retriever,
        judge.clone(),
        generator.clone(),
        search.clone(),
        2,
    );
    let report = flow.answer("ungroundable").await.unwrap();

    // Exactly two generations, one web escalation, then delivery
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    assert_eq!(search.calls.load(Ordering::SeqCst), 1);

    assert!(report.used_web_search);
    assert_eq!(report.degradation, Some(Degradation::Unsupported));
    assert_eq!(
        count_judgments(&report, JudgmentSubject::Groundedness, false),
        2
    );
    assert_eq!(count_judgments(&report, JudgmentSubject::Groundedness, true), 0);
}

#[tokio::test]
async fn termination_bound_with_always_false_judge() {
    let retriever = Arc::new(StaticRetriever::with_passages(&["p1", "p2"]));
    let judge = Arc::new(
        ScriptedJudge::new()
            .doc("p1", Verdict::No)
            .doc("p2", Verdict::No)
            .groundedness_default(Verdict::No)
            .relevance_default(Verdict::No),
    );
    let generator = Arc::new(MockGenerator::new());
    let search = Arc::new(StaticSearch::with_results(&[("web", "https://w.example")]));

    let max_attempts = 3;
    let flow = workflow(
        retriever,
        judge.clone(),
        generator.clone(),
        search.clone(),
        max_attempts,
    );
    let report = flow.answer("hopeless question").await.unwrap();

    // The run terminates within the generation budget plus one search round
    assert_eq!(generator.calls.load(Ordering::SeqCst), max_attempts);
    assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    assert!(report.used_web_search);
    assert!(report.is_degraded());
}

#[tokio::test]
async fn web_fallback_runs_at_most_once_across_escalations() {
    // Relevance escalates first, then groundedness would escalate again;
    // the second request must route to Done instead of searching again.
    let retriever = Arc::new(StaticRetriever::with_passages(&["p1"]));
    let judge = Arc::new(
        ScriptedJudge::new()
            .doc("p1", Verdict::Yes)
            .groundedness_seq(&[Verdict::Yes])
            .groundedness_default(Verdict::No)
            .relevance_seq(&[Verdict::No]),
    );
    let generator = Arc::new(MockGenerator::new());
    let search = Arc::new(StaticSearch::with_results(&[("web", "https://w.example")]));

    let flow = workflow(
        retriever,
        judge.clone(),
        generator.clone(),
        search.clone(),
        3,
    );
    let report = flow.answer("escalate twice").await.unwrap();

    assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
    assert!(report.used_web_search);
    assert_eq!(report.degradation, Some(Degradation::Unsupported));
}

#[tokio::test]
async fn generation_failure_is_retried_once_transparently() {
    let retriever = Arc::new(StaticRetriever::with_passages(&["p1"]));
    let judge = Arc::new(
        ScriptedJudge::new()
            .doc("p1", Verdict::Yes)
            .groundedness_seq(&[Verdict::Yes])
            .relevance_seq(&[Verdict::Yes]),
    );
    let generator = Arc::new(MockGenerator::failing_first(1));
    let search = Arc::new(StaticSearch::with_results(&[]));

    let flow = workflow(retriever, judge, generator.clone(), search, 3);
    let report = flow.answer("flaky generator").await.unwrap();

    // One failed call plus the transparent retry
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    assert!(!report.is_degraded());
    assert_eq!(count_judgments(&report, JudgmentSubject::Groundedness, true), 1);
}

#[tokio::test]
async fn generation_failing_twice_is_fatal() {
    let retriever = Arc::new(StaticRetriever::with_passages(&["p1"]));
    let judge = Arc::new(ScriptedJudge::new().doc("p1", Verdict::Yes));
    let generator = Arc::new(MockGenerator::failing_first(2));
    let search = Arc::new(StaticSearch::with_results(&[]));

    let flow = workflow(retriever, judge, generator.clone(), search, 3);
    let result = flow.answer("dead generator").await;

    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    match result {
        Err(AppError::CollaboratorError(message)) => {
            assert!(message.contains("twice"));
        }
        other => panic!("expected fatal collaborator error, got {:?}", other.map(|r| r.answer.text)),
    }
}

#[tokio::test]
async fn judge_failure_fails_closed_on_documents() {
    let retriever = Arc::new(StaticRetriever::with_passages(&["p1"]));
    let judge = Arc::new(
        ScriptedJudge::new()
            .doc("p1", Verdict::Fail)
            .groundedness_seq(&[Verdict::Yes])
            .relevance_seq(&[Verdict::Yes]),
    );
    let generator = Arc::new(MockGenerator::new());
    let search = Arc::new(StaticSearch::with_results(&[("web", "https://w.example")]));

    let flow = workflow(retriever, judge, generator, search.clone(), 3);
    let report = flow.answer("judge is down").await.unwrap();

    // The ungradable passage was treated as not relevant
    assert_eq!(
        count_judgments(&report, JudgmentSubject::DocumentRelevance, false),
        1
    );
    assert!(report.used_web_search);
    assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    assert!(!report.is_degraded());
}

#[tokio::test]
async fn web_search_failure_is_absorbed_into_empty_passages() {
    let retriever = Arc::new(StaticRetriever::empty());
    let judge = Arc::new(ScriptedJudge::new().relevance_seq(&[Verdict::Yes]));
    let generator = Arc::new(MockGenerator::new());
    let search = Arc::new(StaticSearch::failing());

    let flow = workflow(retriever, judge.clone(), generator.clone(), search, 3);
    let report = flow.answer("everything is down").await.unwrap();

    assert!(report.used_web_search);
    assert!(report.answer.supporting.is_empty());
    assert_eq!(report.degradation, Some(Degradation::Unsupported));

    // Zero evidence is auto-graded unsupported without consulting the judge
    assert_eq!(judge.groundedness_calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        count_judgments(&report, JudgmentSubject::Groundedness, false),
        1
    );
    assert_eq!(
        count_judgments(&report, JudgmentSubject::AnswerRelevance, true),
        1
    );
    // No retries happen on the no-evidence path
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn all_irrelevant_documents_route_to_web_not_generation() {
    let retriever = Arc::new(StaticRetriever::with_passages(&["p1", "p2", "p3"]));
    let judge = Arc::new(
        ScriptedJudge::new()
            .doc("p1", Verdict::No)
            .doc("p2", Verdict::No)
            .doc("p3", Verdict::No)
            .groundedness_seq(&[Verdict::Yes])
            .relevance_seq(&[Verdict::Yes]),
    );
    let generator = Arc::new(MockGenerator::new());
    let search = Arc::new(StaticSearch::with_results(&[("web", "https://w.example")]));

    let flow = workflow(retriever, judge, generator.clone(), search.clone(), 3);
    let report = flow.answer("off-topic index").await.unwrap();

    // Generation never sees the rejected document set
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    assert!(report
        .answer
        .supporting
        .iter()
        .all(|p| p.origin == PassageOrigin::Web));
}

#[tokio::test]
async fn index_failure_degrades_to_web_search() {
    let retriever = Arc::new(StaticRetriever::failing());
    let judge = Arc::new(
        ScriptedJudge::new()
            .groundedness_seq(&[Verdict::Yes])
            .relevance_seq(&[Verdict::Yes]),
    );
    let generator = Arc::new(MockGenerator::new());
    let search = Arc::new(StaticSearch::with_results(&[("web", "https://w.example")]));

    let flow = workflow(retriever, judge.clone(), generator, search, 3);
    let report = flow.answer("index is down").await.unwrap();

    assert!(report.used_web_search);
    assert!(!report.is_degraded());
    assert_eq!(judge.doc_calls.load(Ordering::SeqCst), 0);
}

/// Judge whose document grading never answers in time.
struct SlowDocJudge;

#[async_trait::async_trait]
impl Judge for SlowDocJudge {
    async fn judge(&self, kind: JudgeKind, _request: JudgeRequest<'_>) -> AppResult<bool> {
        match kind {
            JudgeKind::DocumentRelevance => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(true)
            }
            _ => Ok(true),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn grading_timeout_fails_closed() {
    let retriever = Arc::new(StaticRetriever::with_passages(&["p1"]));
    let judge = Arc::new(SlowDocJudge);
    let generator = Arc::new(MockGenerator::new());
    let search = Arc::new(StaticSearch::with_results(&[("web", "https://w.example")]));

    let flow = workflow(retriever, judge, generator, search.clone(), 3);
    let report = flow.answer("slow judge").await.unwrap();

    // The timed-out grading call counted as not relevant
    assert_eq!(
        count_judgments(&report, JudgmentSubject::DocumentRelevance, false),
        1
    );
    assert!(report.used_web_search);
    assert_eq!(search.calls.load(Ordering::SeqCst), 1);
}
