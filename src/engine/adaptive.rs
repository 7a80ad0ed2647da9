//! Reading-behaviour adaptation.
//!
//! Four signals collected on the content screen are bucketed into a 0..=2
//! comfort score each and combined into the adaptation modifier. A high
//! modifier means the reader went through the material comfortably, so the
//! checkpoint grows.

use serde::{Deserialize, Serialize};

use super::question_gen::{BASE_QUESTIONS, MAX_COMPLEXITY, MIN_COMPLEXITY};
use super::{EngineError, EngineResult};

pub const MAX_MODIFIER: f64 = 2.0;
/// Expected reading time per complexity point, in seconds.
pub const EXPECTED_SECONDS_PER_COMPLEXITY: f64 = 120.0;

const SPEED_WEIGHT: f64 = 0.30;
const PAUSE_WEIGHT: f64 = 0.25;
const REVISIT_WEIGHT: f64 = 0.25;
const TIME_WEIGHT: f64 = 0.20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadingSignals {
    /// Average scroll speed in pixels per second.
    pub scroll_speed: f64,
    pub pause_points: u32,
    pub revisit_count: u32,
    /// Seconds spent on the page.
    pub time_on_page: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PerceivedDifficulty {
    Easy,
    Normal,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Adaptation {
    pub modifier: f64,
    pub difficulty: PerceivedDifficulty,
    pub estimated_questions: u32,
}

impl Adaptation {
    /// Whole-question modifier fed to the generator.
    pub fn question_modifier(&self) -> i32 {
        self.modifier.round() as i32
    }
}

fn scroll_speed_score(speed: f64) -> f64 {
    match speed {
        s if s >= 200.0 => 2.0,
        s if s >= 150.0 => 1.5,
        s if s >= 100.0 => 1.0,
        s if s >= 50.0 => 0.5,
        _ => 0.0,
    }
}

fn pause_score(pauses: u32) -> f64 {
    match pauses {
        0 => 2.0,
        1..=2 => 1.5,
        3..=4 => 1.0,
        5..=6 => 0.5,
        _ => 0.0,
    }
}

fn revisit_score(revisits: u32) -> f64 {
    match revisits {
        0 => 2.0,
        1 => 1.5,
        2 => 1.0,
        3 => 0.5,
        _ => 0.0,
    }
}

fn time_ratio_score(ratio: f64) -> f64 {
    match ratio {
        r if r <= 0.5 => 2.0,
        r if r <= 0.8 => 1.5,
        r if r <= 1.2 => 1.0,
        r if r <= 1.6 => 0.5,
        _ => 0.0,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn check_signal(name: &'static str, value: f64) -> EngineResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::InvalidSignal { name, value });
    }
    Ok(())
}

pub fn calculate_adaptation(signals: &ReadingSignals, base_complexity: i32) -> EngineResult<Adaptation> {
    if !(MIN_COMPLEXITY..=MAX_COMPLEXITY).contains(&base_complexity) {
        return Err(EngineError::ComplexityOutOfRange(base_complexity));
    }
    check_signal("scrollSpeed", signals.scroll_speed)?;
    check_signal("timeOnPage", signals.time_on_page)?;

    let expected = EXPECTED_SECONDS_PER_COMPLEXITY * base_complexity as f64;
    let time_ratio = signals.time_on_page / expected;

    let weighted = SPEED_WEIGHT * scroll_speed_score(signals.scroll_speed)
        + PAUSE_WEIGHT * pause_score(signals.pause_points)
        + REVISIT_WEIGHT * revisit_score(signals.revisit_count)
        + TIME_WEIGHT * time_ratio_score(time_ratio);
    let modifier = round2(weighted.clamp(0.0, MAX_MODIFIER));

    let difficulty = if modifier >= 1.5 {
        PerceivedDifficulty::Easy
    } else if modifier < 0.5 {
        PerceivedDifficulty::Hard
    } else {
        PerceivedDifficulty::Normal
    };

    let base = (BASE_QUESTIONS as i32 + base_complexity - MIN_COMPLEXITY) as f64;
    let estimated_questions = (base + modifier).round().clamp(3.0, 10.0) as u32;

    Ok(Adaptation {
        modifier,
        difficulty,
        estimated_questions,
    })
}
