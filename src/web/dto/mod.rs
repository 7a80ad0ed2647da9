pub mod checkpoint;
pub mod content;
pub mod dashboard;
pub mod health;
pub mod progress;
pub mod results;
