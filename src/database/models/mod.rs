pub mod question;

pub use question::{Question, QuestionDraft, QuestionError, ValueType};
