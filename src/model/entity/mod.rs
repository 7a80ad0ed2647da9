mod user;
pub use user::{DEMO_USERNAME, UserEntity, UserEntityCreateUpdate};

mod topic;
pub use topic::{SubtopicProgressRow, Topic, TopicCreate, first_unfinished, is_unlocked};

mod subtopic;
pub use subtopic::{Subtopic, SubtopicCreate};

mod user_progress;
pub use user_progress::{ExitKind, ExitPoint, ResumeRow, UserProgress};

mod attempt;
pub use attempt::{Attempt, AttemptCreate};
