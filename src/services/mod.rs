pub mod profile_service;
pub mod question_service;

pub use profile_service::{PgProfileStore, ProfileError, ProfileStore};
pub use question_service::{PgQuestionStore, QuestionStore};
