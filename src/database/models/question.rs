use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Placeholder token the UI substitutes with a college name at render time.
pub const COLLEGE_NAME_PLACEHOLDER: &str = "[college_name]";

/// Kind of answer a question collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValueType {
    String,
    Integer,
    Boolean,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "STRING",
            ValueType::Integer => "INTEGER",
            ValueType::Boolean => "BOOLEAN",
        }
    }
}

impl std::str::FromStr for ValueType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STRING" => Ok(ValueType::String),
            "INTEGER" => Ok(ValueType::Integer),
            "BOOLEAN" => Ok(ValueType::Boolean),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tenant-owned question record. `owner` is always the resolved
/// principal's uid, never caller-supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub owner: String,
    pub short_name: String,
    pub class: String,
    pub prompt: String,
    pub value_type: ValueType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Question {
    /// Substitute the college-name placeholder in the prompt.
    pub fn render_prompt(&self, college_name: &str) -> String {
        self.prompt.replace(COLLEGE_NAME_PLACEHOLDER, college_name)
    }
}

/// Caller-supplied question fields, before validation. All fields are
/// optional so a single pass can report everything that is missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub short_name: Option<String>,
    pub class: Option<String>,
    pub prompt: Option<String>,
    pub value_type: Option<String>,
}

/// A draft that passed validation.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub short_name: String,
    pub class: String,
    pub prompt: String,
    pub value_type: ValueType,
}

#[derive(Debug, Error)]
pub enum QuestionError {
    #[error("Missing required fields: {0:?}")]
    MissingFields(Vec<&'static str>),

    #[error("{reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    #[error("Question with this short name already exists")]
    DuplicateShortName,

    #[error("Question not found")]
    NotFound,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Short names follow an identifier pattern: a letter or underscore,
/// then letters, digits, or underscores.
pub fn is_valid_short_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl QuestionDraft {
    /// Validate presence and form of every field. Presence problems are
    /// collected into a single MissingFields error; form problems are
    /// reported per field.
    pub fn validate(&self) -> Result<NewQuestion, QuestionError> {
        let mut missing = Vec::new();

        let class = non_empty(&self.class);
        if class.is_none() {
            missing.push("class");
        }
        let short_name = non_empty(&self.short_name);
        if short_name.is_none() {
            missing.push("shortName");
        }
        let prompt = non_empty(&self.prompt);
        if prompt.is_none() {
            missing.push("prompt");
        }
        let value_type = non_empty(&self.value_type);
        if value_type.is_none() {
            missing.push("valueType");
        }

        if !missing.is_empty() {
            return Err(QuestionError::MissingFields(missing));
        }

        let short_name = short_name.unwrap();
        if !is_valid_short_name(&short_name) {
            return Err(QuestionError::InvalidField {
                field: "shortName",
                reason: "Short name must be a valid identifier (letters, numbers, underscores only)"
                    .to_string(),
            });
        }

        let raw_value_type = value_type.unwrap();
        let value_type = raw_value_type.parse::<ValueType>().map_err(|_| {
            QuestionError::InvalidField {
                field: "valueType",
                reason: format!("Unknown value type: {raw_value_type}"),
            }
        })?;

        Ok(NewQuestion {
            short_name,
            class: class.unwrap(),
            prompt: prompt.unwrap(),
            value_type,
        })
    }
}

fn non_empty(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
