use thiserror::Error;

pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("complexity score {0} is out of range 1..=4")]
    ComplexityOutOfRange(i32),
    #[error("adaptation modifier {0} is out of range 0..=2")]
    ModifierOutOfRange(i32),
    #[error("reading signal `{name}` is invalid: {value}")]
    InvalidSignal { name: &'static str, value: f64 },
}
