use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use thiserror::Error as ThisError;

use crate::error::Error;

#[derive(sqlx::Type)]
#[sqlx(type_name = "question_type")]
#[sqlx(rename_all = "lowercase")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Text,
    Textarea,
    Select,
    Radio,
    Checkbox,
}

impl QuestionType {
    pub const ALL: [QuestionType; 5] = [Self::Text, Self::Textarea, Self::Select, Self::Radio, Self::Checkbox];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("invalid question type({0})")]
pub struct ParseQuestionTypeError(pub String);

impl FromStr for QuestionType {
    type Err = ParseQuestionTypeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|t| t.as_str() == s).ok_or_else(|| ParseQuestionTypeError(s.to_owned()))
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Question {
    pub id: i32,
    pub survey_id: i32,
    pub type_: QuestionType,
    pub question: String,
    pub description: Option<String>,
    pub data: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Question {
    /// The stored options payload parsed back into structured form.
    pub fn options(&self) -> Value {
        parse_data(&self.data)
    }
}

/// A question as it arrives in a survey payload. Fields are kept loose so
/// that validation can report the offending position instead of failing the
/// whole request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionInput {
    #[serde(default, deserialize_with = "client_id")]
    pub id: Option<i32>,
    #[serde(default)]
    pub question: Option<Value>,
    #[serde(default, rename = "type")]
    pub type_: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub data: Option<Value>,
}

impl QuestionInput {
    /// Normalizes the options payload and checks the shared question schema.
    pub fn validate(&self, position: usize) -> Result<Update, Error> {
        let question = match &self.question {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(Value::String(_)) | None | Some(Value::Null) => return Err(Error::invalid_question(position, "question is required")),
            Some(_) => return Err(Error::invalid_question(position, "question must be a string")),
        };
        let type_ = match &self.type_ {
            Some(Value::String(s)) => s.parse::<QuestionType>().map_err(|e| Error::invalid_question(position, e.to_string()))?,
            None | Some(Value::Null) => return Err(Error::invalid_question(position, "type is required")),
            Some(other) => return Err(Error::invalid_question(position, format!("invalid question type({})", other))),
        };
        let description = match &self.description {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(Error::invalid_question(position, "description must be a string")),
        };
        let data = match &self.data {
            Some(v) => normalize_data(v),
            None => return Err(Error::invalid_question(position, "data must be present")),
        };
        Ok(Update {
            type_,
            question,
            description,
            data,
        })
    }
}

/// Validated question fields, written over an existing question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub type_: QuestionType,
    pub question: String,
    pub description: Option<String>,
    pub data: String,
}

impl Update {
    pub fn insert_into(self, survey_id: i32) -> Insert {
        Insert {
            survey_id,
            type_: self.type_,
            question: self.question,
            description: self.description,
            data: self.data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insert {
    pub survey_id: i32,
    pub type_: QuestionType,
    pub question: String,
    pub description: Option<String>,
    pub data: String,
}

/// A string is taken as already serialized; anything else becomes its JSON text.
pub fn normalize_data(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn parse_data(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

// Distinguishes a field sent as `null` from one that was left out.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Str(String),
}

// New questions come from the client with temporary string ids; only ids
// that could name a stored row survive.
fn client_id<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawId> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawId::Int(n)) => i32::try_from(n).ok(),
        Some(RawId::Str(s)) => s.parse::<i32>().ok(),
        None => None,
    })
}
