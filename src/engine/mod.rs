//! Pure learning logic: checkpoint generation, reading-signal adaptation and
//! scoring. Nothing in here touches the database or the network.

mod error;
pub use error::{EngineError, EngineResult};

pub mod adaptive;
pub mod question_gen;
pub mod scoring;
mod similarity;
mod templates;

pub use adaptive::{Adaptation, PerceivedDifficulty, ReadingSignals, calculate_adaptation};
pub use question_gen::{
    Difficulty, Distribution, PublicQuestion, Question, QuestionKind, QuestionSet,
    generate_question_set,
};
pub use scoring::{
    BucketScores, PASS_THRESHOLD, QuestionResult, ScoreReport, ValidatedBy, grade_short_answer,
    score_checkpoint,
};
