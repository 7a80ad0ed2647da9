//! Checkpoint scoring.
//!
//! Each difficulty maps onto a bucket (easy -> foundation, medium ->
//! application, hard -> synthesis). Buckets are scored as a percentage and
//! combined with fixed weights into the final 0..=100 score.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::question_gen::{Difficulty, Question, QuestionKind, QuestionSet};
use super::similarity::{KEYWORD_RATIO_THRESHOLD, SIMILARITY_THRESHOLD, keyword_overlap, normalize};

pub const PASS_THRESHOLD: u32 = 70;

const FOUNDATION_WEIGHT: f64 = 0.40;
const APPLICATION_WEIGHT: f64 = 0.35;
const SYNTHESIS_WEIGHT: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidatedBy {
    Exact,
    Heuristic,
    Semantic,
    Unanswered,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuestionResult {
    pub question_id: Uuid,
    pub kind: QuestionKind,
    pub difficulty: Difficulty,
    pub prompt: String,
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    pub validated_by: ValidatedBy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BucketScore {
    pub correct: u32,
    pub total: u32,
    pub percent: f64,
}

impl BucketScore {
    fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }

    fn finish(&mut self) {
        self.percent = if self.total == 0 {
            0.0
        } else {
            (100.0 * self.correct as f64 / self.total as f64 * 100.0).round() / 100.0
        };
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BucketScores {
    pub foundation: BucketScore,
    pub application: BucketScore,
    pub synthesis: BucketScore,
}

impl BucketScores {
    fn bucket_mut(&mut self, difficulty: Difficulty) -> &mut BucketScore {
        match difficulty {
            Difficulty::Easy => &mut self.foundation,
            Difficulty::Medium => &mut self.application,
            Difficulty::Hard => &mut self.synthesis,
        }
    }

    /// Weighted total. Empty buckets drop out and the rest are renormalized.
    pub fn weighted_total(&self) -> u32 {
        let weighted = [
            (self.foundation, FOUNDATION_WEIGHT),
            (self.application, APPLICATION_WEIGHT),
            (self.synthesis, SYNTHESIS_WEIGHT),
        ];

        let (sum, weights) = weighted
            .iter()
            .filter(|(bucket, _)| bucket.total > 0)
            .fold((0.0, 0.0), |(sum, weights), (bucket, weight)| {
                let percent = 100.0 * bucket.correct as f64 / bucket.total as f64;
                (sum + percent * weight, weights + weight)
            });

        if weights == 0.0 {
            return 0;
        }
        (sum / weights).round().clamp(0.0, 100.0) as u32
    }

    /// Lowest-scoring non-empty bucket name, used by feedback.
    pub fn weakest(&self) -> Option<&'static str> {
        [
            ("foundation", self.foundation),
            ("application", self.application),
            ("synthesis", self.synthesis),
        ]
        .into_iter()
        .filter(|(_, b)| b.total > 0)
        .min_by(|(_, a), (_, b)| a.percent.total_cmp(&b.percent))
        .map(|(name, _)| name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ScoreReport {
    pub results: Vec<QuestionResult>,
    pub buckets: BucketScores,
    pub score: u32,
    pub passed: bool,
    pub correct: u32,
    pub total: u32,
}

/// Local short-answer check: keyword overlap or edit-distance similarity
/// against any acceptable answer.
pub fn grade_short_answer(answer: &str, acceptable: &[String]) -> bool {
    let answer = normalize(answer);
    if answer.is_empty() {
        return false;
    }

    acceptable.iter().map(|a| normalize(a)).any(|expected| {
        keyword_overlap(&answer, &expected) >= KEYWORD_RATIO_THRESHOLD
            || strsim::normalized_levenshtein(&answer, &expected) > SIMILARITY_THRESHOLD
    })
}

fn grade(question: &Question, answer: Option<&str>, semantic: Option<bool>) -> (bool, ValidatedBy) {
    let Some(answer) = answer.filter(|a| !a.trim().is_empty()) else {
        return (false, ValidatedBy::Unanswered);
    };

    match question.kind {
        QuestionKind::Mcq => (answer.trim() == question.correct_answer.trim(), ValidatedBy::Exact),
        QuestionKind::ShortAnswer => match semantic {
            Some(verdict) => (verdict, ValidatedBy::Semantic),
            None => (
                grade_short_answer(answer, &question.acceptable_answers),
                ValidatedBy::Heuristic,
            ),
        },
    }
}

/// Scores `answers` against `set`. `semantic` carries external verdicts for
/// short answers; questions without one fall back to the local heuristic.
pub fn score_checkpoint(
    set: &QuestionSet,
    answers: &HashMap<Uuid, String>,
    semantic: &HashMap<Uuid, bool>,
) -> ScoreReport {
    let mut buckets = BucketScores::default();
    let mut results = Vec::with_capacity(set.questions.len());

    for question in &set.questions {
        let answer = answers.get(&question.id).map(String::as_str);
        let (is_correct, validated_by) = grade(question, answer, semantic.get(&question.id).copied());
        buckets.bucket_mut(question.difficulty).record(is_correct);

        results.push(QuestionResult {
            question_id: question.id,
            kind: question.kind,
            difficulty: question.difficulty,
            prompt: question.prompt.clone(),
            user_answer: answer.map(str::to_string),
            correct_answer: question.correct_answer.clone(),
            is_correct,
            validated_by,
        });
    }

    buckets.foundation.finish();
    buckets.application.finish();
    buckets.synthesis.finish();

    let score = buckets.weighted_total();
    let correct = results.iter().filter(|r| r.is_correct).count() as u32;

    ScoreReport {
        total: results.len() as u32,
        correct,
        results,
        buckets,
        score,
        passed: score >= PASS_THRESHOLD,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::question_gen::{Distribution, generate_question_set};

    fn mcq(difficulty: Difficulty) -> Question {
        Question {
            id: Uuid::new_v4(),
            kind: QuestionKind::Mcq,
            difficulty,
            prompt: "pick".into(),
            options: vec!["right".into(), "wrong".into()],
            correct_answer: "right".into(),
            acceptable_answers: vec![],
        }
    }

    fn set_of(layout: &[(Difficulty, usize)]) -> QuestionSet {
        let questions: Vec<Question> = layout
            .iter()
            .flat_map(|&(d, n)| (0..n).map(move |_| mcq(d)))
            .collect();
        QuestionSet {
            count: questions.len() as u32,
            distribution: Distribution {
                mcq: questions.len() as u32,
                short_answer: 0,
            },
            difficulty_curve: questions.iter().map(|q| q.difficulty).collect(),
            questions,
        }
    }

    /// Answers the first `n` questions of each difficulty correctly.
    fn answer_correct(set: &QuestionSet, per_bucket: &[(Difficulty, usize)]) -> HashMap<Uuid, String> {
        let mut answers = HashMap::new();
        for &(difficulty, n) in per_bucket {
            for (i, q) in set.questions.iter().filter(|q| q.difficulty == difficulty).enumerate() {
                let answer = if i < n { "right" } else { "wrong" };
                answers.insert(q.id, answer.to_string());
            }
        }
        answers
    }

    #[test]
    fn seven_of_ten_passes() {
        let layout = [(Difficulty::Easy, 4), (Difficulty::Medium, 3), (Difficulty::Hard, 3)];
        let set = set_of(&layout);
        let answers = answer_correct(
            &set,
            &[(Difficulty::Easy, 3), (Difficulty::Medium, 2), (Difficulty::Hard, 2)],
        );

        let report = score_checkpoint(&set, &answers, &HashMap::new());
        // 75 * 0.40 + 66.67 * 0.35 + 66.67 * 0.25 = 70
        assert_eq!(report.score, 70);
        assert!(report.passed);
        assert_eq!(report.correct, 7);
        assert_eq!(report.total, 10);
        assert_eq!(report.buckets.foundation.percent, 75.0);
        assert_eq!(report.buckets.application.percent, 66.67);
        assert_eq!(report.buckets.synthesis.correct, 2);
    }

    #[test]
    fn weak_foundation_fails() {
        let layout = [(Difficulty::Easy, 4), (Difficulty::Medium, 3), (Difficulty::Hard, 3)];
        let set = set_of(&layout);
        let answers = answer_correct(
            &set,
            &[(Difficulty::Easy, 1), (Difficulty::Medium, 3), (Difficulty::Hard, 3)],
        );

        let report = score_checkpoint(&set, &answers, &HashMap::new());
        // 25 * 0.40 + 100 * 0.35 + 100 * 0.25 = 70
        assert_eq!(report.score, 70);

        let answers = answer_correct(
            &set,
            &[(Difficulty::Easy, 0), (Difficulty::Medium, 3), (Difficulty::Hard, 3)],
        );
        let report = score_checkpoint(&set, &answers, &HashMap::new());
        assert_eq!(report.score, 60);
        assert!(!report.passed);
        assert_eq!(report.buckets.weakest(), Some("foundation"));
    }

    #[test]
    fn unanswered_questions_are_wrong() {
        let set = set_of(&[(Difficulty::Easy, 2), (Difficulty::Medium, 2), (Difficulty::Hard, 1)]);
        let report = score_checkpoint(&set, &HashMap::new(), &HashMap::new());
        assert_eq!(report.score, 0);
        assert!(!report.passed);
        assert!(report.results.iter().all(|r| r.validated_by == ValidatedBy::Unanswered));
    }

    #[test]
    fn empty_buckets_are_renormalized() {
        let set = set_of(&[(Difficulty::Easy, 2)]);
        let answers = answer_correct(&set, &[(Difficulty::Easy, 2)]);
        let report = score_checkpoint(&set, &answers, &HashMap::new());
        assert_eq!(report.score, 100);
        assert!(report.passed);
    }

    #[test]
    fn score_is_bounded_and_pass_matches_threshold() {
        let set = generate_question_set(4, 2, "Graphs").unwrap();
        for n in 0..=set.questions.len() {
            let answers = set
                .questions
                .iter()
                .take(n)
                .map(|q| (q.id, q.correct_answer.clone()))
                .collect();
            let report = score_checkpoint(&set, &answers, &HashMap::new());
            assert!(report.score <= 100);
            assert_eq!(report.passed, report.score >= PASS_THRESHOLD);
            assert_eq!(report.correct as usize, n);
        }
    }

    #[test]
    fn short_answer_heuristic() {
        let acceptable = vec!["the mitochondria produce energy for the cell".to_string()];
        // keywords: mitochondria, produce, energy, cell -> 3 of 4
        assert!(grade_short_answer("Mitochondria make ENERGY in a cell", &acceptable));
        // close spelling of the whole answer
        assert!(grade_short_answer("the mitocondria produces energy for the cel", &acceptable));
        assert!(!grade_short_answer("no idea", &acceptable));
        assert!(!grade_short_answer("   ", &acceptable));
    }

    #[test]
    fn misspelled_answer_passes_on_edit_distance() {
        let acceptable = vec!["Mitochondria".to_string()];
        // no keyword hit, 1 edit in 12 chars
        assert!(grade_short_answer("mitocondria", &acceptable));
        assert!(grade_short_answer("MITOCHONDRIA!", &acceptable));
        assert!(!grade_short_answer("ribosome", &acceptable));
    }

    #[test]
    fn semantic_verdict_overrides_heuristic() {
        let set = generate_question_set(3, 0, "Recursion").unwrap();
        let short = set
            .questions
            .iter()
            .find(|q| q.kind == QuestionKind::ShortAnswer)
            .unwrap();

        let answers = HashMap::from([(short.id, "completely unrelated".to_string())]);
        let semantic = HashMap::from([(short.id, true)]);
        let report = score_checkpoint(&set, &answers, &semantic);

        let result = report.results.iter().find(|r| r.question_id == short.id).unwrap();
        assert!(result.is_correct);
        assert_eq!(result.validated_by, ValidatedBy::Semantic);

        let report = score_checkpoint(&set, &answers, &HashMap::new());
        let result = report.results.iter().find(|r| r.question_id == short.id).unwrap();
        assert!(!result.is_correct);
        assert_eq!(result.validated_by, ValidatedBy::Heuristic);
    }
}
