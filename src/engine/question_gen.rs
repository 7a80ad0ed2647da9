//! Checkpoint question set generation.
//!
//! The size of a checkpoint grows with the authored complexity of the
//! subtopic and with the adaptation modifier derived from reading behaviour.
//! Questions are laid out from easy to hard and filled from the fixed
//! template table in [`super::templates`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::templates::{fill, mcq_templates, short_answer_templates};
use super::{EngineError, EngineResult};

pub const MIN_COMPLEXITY: i32 = 1;
pub const MAX_COMPLEXITY: i32 = 4;
pub const MAX_MODIFIER: i32 = 2;
pub const BASE_QUESTIONS: u32 = 5;
pub const MAX_QUESTIONS: u32 = 10;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Mcq,
    ShortAnswer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub kind: QuestionKind,
    pub difficulty: Difficulty,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acceptable_answers: Vec<String>,
}

/// What a client gets to see of a [`Question`]: no answers.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PublicQuestion {
    pub id: Uuid,
    pub kind: QuestionKind,
    pub difficulty: Difficulty,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            kind: q.kind,
            difficulty: q.difficulty,
            prompt: q.prompt.clone(),
            options: q.options.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Distribution {
    pub mcq: u32,
    pub short_answer: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSet {
    pub count: u32,
    pub distribution: Distribution,
    pub difficulty_curve: Vec<Difficulty>,
    pub questions: Vec<Question>,
}

impl QuestionSet {
    /// Whether both sets hold the same questions in the same order.
    pub fn same_questions(&self, other: &QuestionSet) -> bool {
        self.questions.iter().map(|q| q.id).eq(other.questions.iter().map(|q| q.id))
    }

    pub fn public_questions(&self) -> Vec<PublicQuestion> {
        self.questions.iter().map(PublicQuestion::from).collect()
    }

    pub fn find(&self, id: Uuid) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}

fn validate(complexity: i32, modifier: i32) -> EngineResult<()> {
    if !(MIN_COMPLEXITY..=MAX_COMPLEXITY).contains(&complexity) {
        return Err(EngineError::ComplexityOutOfRange(complexity));
    }
    if !(0..=MAX_MODIFIER).contains(&modifier) {
        return Err(EngineError::ModifierOutOfRange(modifier));
    }
    Ok(())
}

/// `round(count * percent / 100)` with halves rounded up.
fn round_percent(count: u32, percent: u32) -> u32 {
    (count * percent + 50) / 100
}

pub fn question_count(complexity: i32, modifier: i32) -> EngineResult<u32> {
    validate(complexity, modifier)?;
    let count = BASE_QUESTIONS + (complexity - MIN_COMPLEXITY) as u32 + modifier as u32;
    Ok(count.min(MAX_QUESTIONS))
}

pub fn distribution(complexity: i32, count: u32) -> Distribution {
    let mcq_percent = if complexity <= 2 { 70 } else { 50 };
    let mcq = round_percent(count, mcq_percent);
    Distribution {
        mcq,
        short_answer: count - mcq,
    }
}

pub fn difficulty_curve(complexity: i32, count: u32) -> Vec<Difficulty> {
    let easy_percent = (40 - 5 * complexity) as u32;
    let medium_percent = 40;

    let easy = round_percent(count, easy_percent).max(1);
    let medium = round_percent(count, medium_percent).max(1);
    let hard = count.saturating_sub(easy + medium).max(1);
    debug_assert_eq!(easy + medium + hard, count);

    let mut curve = Vec::with_capacity(count as usize);
    curve.extend(std::iter::repeat_n(Difficulty::Easy, easy as usize));
    curve.extend(std::iter::repeat_n(Difficulty::Medium, medium as usize));
    curve.extend(std::iter::repeat_n(Difficulty::Hard, hard as usize));
    curve
}

fn build_question(position: usize, kind: QuestionKind, difficulty: Difficulty, topic: &str) -> Question {
    match kind {
        QuestionKind::Mcq => {
            let table = mcq_templates(difficulty);
            let template = &table[position % table.len()];
            let options: Vec<String> = template.options.iter().map(|o| fill(o, topic)).collect();
            Question {
                id: Uuid::new_v4(),
                kind,
                difficulty,
                prompt: fill(template.prompt, topic),
                correct_answer: options[template.correct].clone(),
                options,
                acceptable_answers: Vec::new(),
            }
        }
        QuestionKind::ShortAnswer => {
            let table = short_answer_templates(difficulty);
            let template = &table[position % table.len()];
            let acceptable: Vec<String> = template.acceptable.iter().map(|a| fill(a, topic)).collect();
            Question {
                id: Uuid::new_v4(),
                kind,
                difficulty,
                prompt: fill(template.prompt, topic),
                options: Vec::new(),
                correct_answer: acceptable[0].clone(),
                acceptable_answers: acceptable,
            }
        }
    }
}

#[tracing::instrument(level = "debug")]
pub fn generate_question_set(complexity: i32, modifier: i32, topic: &str) -> EngineResult<QuestionSet> {
    let count = question_count(complexity, modifier)?;
    let distribution = distribution(complexity, count);
    let difficulty_curve = difficulty_curve(complexity, count);

    // multiple choice first, short answers take the tail (hardest) positions
    let questions = difficulty_curve
        .iter()
        .enumerate()
        .map(|(position, &difficulty)| {
            let kind = if (position as u32) < distribution.mcq {
                QuestionKind::Mcq
            } else {
                QuestionKind::ShortAnswer
            };
            build_question(position, kind, difficulty, topic)
        })
        .collect();

    tracing::debug!(count, mcq = distribution.mcq, "generated question set");

    Ok(QuestionSet {
        count,
        distribution,
        difficulty_curve,
        questions,
    })
}
