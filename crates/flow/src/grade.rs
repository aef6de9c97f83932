//! Grading steps over the shared judgment seam.
//!
//! All three graders are pure with respect to run state: they read their
//! inputs, call the judge, and return a verdict. The judge itself is
//! probabilistic, so repeated calls with the same inputs may disagree; the
//! workflow never assumes determinism here.

use vetted_core::AppResult;

use crate::collaborators::{Judge, JudgeKind, JudgeRequest};
use crate::state::{Answer, Passage};

/// Judge whether one retrieved passage is relevant to the question.
pub async fn grade_document_relevance(
    judge: &dyn Judge,
    question: &str,
    passage: &Passage,
) -> AppResult<bool> {
    judge
        .judge(
            JudgeKind::DocumentRelevance,
            JudgeRequest {
                question,
                passage: Some(&passage.text),
                answer: None,
            },
        )
        .await
}

/// Judge whether an answer is fully supported by its passages.
///
/// An answer with zero supporting passages cannot be grounded with zero
/// evidence and is graded false without consulting the judge.
pub async fn grade_groundedness(
    judge: &dyn Judge,
    question: &str,
    answer: &Answer,
) -> AppResult<bool> {
    if answer.supporting.is_empty() {
        return Ok(false);
    }

    let context = join_passages(&answer.supporting);
    judge
        .judge(
            JudgeKind::Groundedness,
            JudgeRequest {
                question,
                passage: Some(&context),
                answer: Some(&answer.text),
            },
        )
        .await
}

/// Judge whether an answer addresses the specific question asked.
pub async fn grade_answer_relevance(
    judge: &dyn Judge,
    question: &str,
    answer: &Answer,
) -> AppResult<bool> {
    judge
        .judge(
            JudgeKind::AnswerRelevance,
            JudgeRequest {
                question,
                passage: None,
                answer: Some(&answer.text),
            },
        )
        .await
}

/// Join passages into numbered blocks for a judge or generator prompt.
pub fn join_passages(passages: &[Passage]) -> String {
    let parts: Vec<String> = passages
        .iter()
        .enumerate()
        .map(|(i, p)| format!("[Passage {}]\n{}", i + 1, p.text))
        .collect();

    parts.join("\n\n---\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AnswerId, PassageId, PassageOrigin};

    /// A judge that must not be consulted.
    struct UnreachableJudge;

    #[async_trait::async_trait]
    impl Judge for UnreachableJudge {
        async fn judge(&self, _kind: JudgeKind, _request: JudgeRequest<'_>) -> AppResult<bool> {
            panic!("judge must not be called");
        }
    }

    fn passage(id: u32, text: &str) -> Passage {
        Passage {
            id: PassageId(id),
            text: text.to_string(),
            source: "test.md".to_string(),
            origin: PassageOrigin::Document,
        }
    }

    #[tokio::test]
    async fn test_groundedness_auto_false_without_evidence() {
        let answer = Answer {
            id: AnswerId(0),
            text: "unsupported claim".to_string(),
            supporting: Vec::new(),
        };

        let verdict = grade_groundedness(&UnreachableJudge, "q", &answer)
            .await
            .unwrap();
        assert!(!verdict);
    }

    #[test]
    fn test_join_passages_numbers_blocks() {
        let joined = join_passages(&[passage(0, "first"), passage(1, "second")]);
        assert!(joined.contains("[Passage 1]\nfirst"));
        assert!(joined.contains("[Passage 2]\nsecond"));
        assert!(joined.contains("---"));
    }

    #[test]
    fn test_join_passages_empty() {
        assert_eq!(join_passages(&[]), "");
    }
}
