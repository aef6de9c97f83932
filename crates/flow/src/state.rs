//! Run state and the report delivered to the caller.
//!
//! One [`RunState`] exists per question execution and is owned exclusively
//! by the workflow driving that run; nothing here is shared across runs.
//! Passages, judgments and answers are immutable once created: retries
//! append new values, they never mutate old ones, so the trail stays a
//! faithful record of every decision the run made.

use serde::{Deserialize, Serialize};

use crate::collaborators::RetrievedText;

/// Where a passage came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassageOrigin {
    /// Retrieved from the local document index
    Document,
    /// Produced by the web search fallback
    Web,
}

/// Identifier of a passage within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PassageId(pub u32);

/// Identifier of an answer within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnswerId(pub u32);

/// A unit of retrieved text with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub id: PassageId,
    pub text: String,
    pub source: String,
    pub origin: PassageOrigin,
}

/// What a judgment is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JudgmentSubject {
    DocumentRelevance,
    Groundedness,
    AnswerRelevance,
}

/// What a judgment was passed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JudgmentTarget {
    Passage(PassageId),
    Answer(AnswerId),
}

/// A binary quality verdict produced by an automated grading step.
///
/// Judgments are append-only: a verdict is never retracted, only
/// superseded by a newer judgment on a newer answer or passage set. A
/// grading step that failed and was absorbed fail-closed records the
/// verdict that was actually applied to routing (false).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Judgment {
    pub subject: JudgmentSubject,
    pub target: JudgmentTarget,
    pub verdict: bool,
}

/// A candidate answer with the passages it was generated from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    pub text: String,
    /// Exactly the passage set the generator was given, in order. Empty
    /// only on the no-passages path (web fallback exhausted and empty).
    pub supporting: Vec<Passage>,
}

/// Why a delivered answer is flagged as degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Degradation {
    /// The answer never passed the groundedness gate
    Unsupported,
    /// The answer is grounded but never passed the question-relevance gate
    OffTarget,
}

/// The final result of one run, immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// The delivered answer
    pub answer: Answer,
    /// Every judgment the run produced, in order
    pub evaluation_trail: Vec<Judgment>,
    /// Whether the web search fallback ran
    pub used_web_search: bool,
    /// Set when the answer failed a quality gate and was delivered anyway
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degradation: Option<Degradation>,
}

impl RunReport {
    /// Whether the answer was delivered despite failing a quality gate.
    pub fn is_degraded(&self) -> bool {
        self.degradation.is_some()
    }
}

/// The single mutable aggregate for one question execution.
pub struct RunState {
    question: String,
    passages: Vec<Passage>,
    answers: Vec<Answer>,
    judgments: Vec<Judgment>,
    generation_attempts: u32,
    web_fallback_used: bool,
    next_passage_id: u32,
    next_answer_id: u32,
}

impl RunState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            passages: Vec::new(),
            answers: Vec::new(),
            judgments: Vec::new(),
            generation_attempts: 0,
            web_fallback_used: false,
            next_passage_id: 0,
            next_answer_id: 0,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub fn generation_attempts(&self) -> u32 {
        self.generation_attempts
    }

    pub fn web_fallback_used(&self) -> bool {
        self.web_fallback_used
    }

    /// Replace the current passage set with freshly retrieved text.
    ///
    /// Each item gets a run-unique id; ids are never reused, so judgments
    /// on a superseded set stay unambiguous in the trail.
    pub fn set_passages(&mut self, items: Vec<RetrievedText>, origin: PassageOrigin) {
        self.passages = items
            .into_iter()
            .map(|item| {
                let id = PassageId(self.next_passage_id);
                self.next_passage_id += 1;
                Passage {
                    id,
                    text: item.text,
                    source: item.source,
                    origin,
                }
            })
            .collect();
    }

    /// Keep only the passages whose ids appear in `keep`, preserving order.
    pub fn retain_passages(&mut self, keep: &[PassageId]) {
        self.passages.retain(|p| keep.contains(&p.id));
    }

    /// Append a judgment to the trail.
    pub fn record_judgment(
        &mut self,
        subject: JudgmentSubject,
        target: JudgmentTarget,
        verdict: bool,
    ) {
        self.judgments.push(Judgment {
            subject,
            target,
            verdict,
        });
    }

    /// Record a new answer generated from the current passage set.
    pub fn push_answer(&mut self, text: String) -> AnswerId {
        let id = AnswerId(self.next_answer_id);
        self.next_answer_id += 1;
        self.answers.push(Answer {
            id,
            text,
            supporting: self.passages.clone(),
        });
        id
    }

    pub fn latest_answer(&self) -> Option<&Answer> {
        self.answers.last()
    }

    pub fn count_generation_attempt(&mut self) {
        self.generation_attempts += 1;
    }

    pub fn mark_web_fallback_used(&mut self) {
        self.web_fallback_used = true;
    }

    /// Whether a given answer passed a gate according to the trail.
    fn gate_passed(&self, subject: JudgmentSubject, answer: AnswerId) -> bool {
        self.judgments.iter().any(|j| {
            j.subject == subject && j.target == JudgmentTarget::Answer(answer) && j.verdict
        })
    }

    /// Assemble the final report from the latest answer and the full trail.
    ///
    /// The degradation flag is derived from the trail rather than tracked
    /// separately: an answer without a passing groundedness judgment is
    /// unsupported; a grounded answer without a passing relevance judgment
    /// is possibly off-target.
    ///
    /// Returns `None` when no answer was ever generated; the workflow
    /// never reaches its terminal state in that situation.
    pub fn finish(self) -> Option<RunReport> {
        let answer = self.answers.last()?.clone();

        let degradation = if !self.gate_passed(JudgmentSubject::Groundedness, answer.id) {
            Some(Degradation::Unsupported)
        } else if !self.gate_passed(JudgmentSubject::AnswerRelevance, answer.id) {
            Some(Degradation::OffTarget)
        } else {
            None
        };

        Some(RunReport {
            answer,
            evaluation_trail: self.judgments,
            used_web_search: self.web_fallback_used,
            degradation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retrieved(text: &str) -> RetrievedText {
        RetrievedText {
            text: text.to_string(),
            source: "test.md".to_string(),
        }
    }

    #[test]
    fn test_passage_ids_are_never_reused() {
        let mut run = RunState::new("q");
        run.set_passages(vec![retrieved("a"), retrieved("b")], PassageOrigin::Document);
        let first_ids: Vec<PassageId> = run.passages().iter().map(|p| p.id).collect();

        run.set_passages(vec![retrieved("c")], PassageOrigin::Web);
        let second_ids: Vec<PassageId> = run.passages().iter().map(|p| p.id).collect();

        assert_eq!(first_ids, vec![PassageId(0), PassageId(1)]);
        assert_eq!(second_ids, vec![PassageId(2)]);
    }

    #[test]
    fn test_retain_preserves_order() {
        let mut run = RunState::new("q");
        run.set_passages(
            vec![retrieved("a"), retrieved("b"), retrieved("c")],
            PassageOrigin::Document,
        );
        run.retain_passages(&[PassageId(2), PassageId(0)]);

        let texts: Vec<&str> = run.passages().iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "c"]);
    }

    #[test]
    fn test_answer_snapshots_current_passages() {
        let mut run = RunState::new("q");
        run.set_passages(vec![retrieved("a")], PassageOrigin::Document);
        let id = run.push_answer("first".to_string());

        run.set_passages(vec![retrieved("b")], PassageOrigin::Web);
        run.push_answer("second".to_string());

        let first = &run.answers[0];
        assert_eq!(first.id, id);
        assert_eq!(first.supporting[0].text, "a");
        assert_eq!(run.latest_answer().unwrap().supporting[0].text, "b");
    }

    #[test]
    fn test_finish_without_answer_is_none() {
        let run = RunState::new("q");
        assert!(run.finish().is_none());
    }

    #[test]
    fn test_finish_degradation_from_trail() {
        // Grounded but never judged relevant: off-target
        let mut run = RunState::new("q");
        run.set_passages(vec![retrieved("a")], PassageOrigin::Document);
        let id = run.push_answer("answer".to_string());
        run.record_judgment(
            JudgmentSubject::Groundedness,
            JudgmentTarget::Answer(id),
            true,
        );
        run.record_judgment(
            JudgmentSubject::AnswerRelevance,
            JudgmentTarget::Answer(id),
            false,
        );

        let report = run.finish().unwrap();
        assert_eq!(report.degradation, Some(Degradation::OffTarget));
        assert!(report.is_degraded());
    }

    #[test]
    fn test_finish_clean_pass_is_not_degraded() {
        let mut run = RunState::new("q");
        run.set_passages(vec![retrieved("a")], PassageOrigin::Document);
        let id = run.push_answer("answer".to_string());
        run.record_judgment(
            JudgmentSubject::Groundedness,
            JudgmentTarget::Answer(id),
            true,
        );
        run.record_judgment(
            JudgmentSubject::AnswerRelevance,
            JudgmentTarget::Answer(id),
            true,
        );

        let report = run.finish().unwrap();
        assert!(report.degradation.is_none());
        assert!(!report.is_degraded());
    }

    #[test]
    fn test_degradation_follows_latest_answer_only() {
        // A failed first answer does not degrade a clean second one
        let mut run = RunState::new("q");
        run.set_passages(vec![retrieved("a")], PassageOrigin::Document);
        let first = run.push_answer("first".to_string());
        run.record_judgment(
            JudgmentSubject::Groundedness,
            JudgmentTarget::Answer(first),
            false,
        );

        let second = run.push_answer("second".to_string());
        run.record_judgment(
            JudgmentSubject::Groundedness,
            JudgmentTarget::Answer(second),
            true,
        );
        run.record_judgment(
            JudgmentSubject::AnswerRelevance,
            JudgmentTarget::Answer(second),
            true,
        );

        let report = run.finish().unwrap();
        assert!(report.degradation.is_none());
        assert_eq!(report.evaluation_trail.len(), 3);
    }
}
