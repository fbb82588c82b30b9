use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::models::question::{Question, QuestionInput};
use crate::error::Error;

pub const TITLE_MAX_CHARS: usize = 1000;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Survey {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub slug: String,
    pub status: bool,
    pub description: Option<String>,
    pub image: Option<String>,
    pub expire_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The editable, non-aggregate fields of a survey.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SurveyFields {
    pub title: String,
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub expire_date: Option<NaiveDate>,
}

impl SurveyFields {
    pub fn validate(&self) -> Result<(), Error> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidSurveyData("title is required".into()));
        }
        if self.title.chars().count() > TITLE_MAX_CHARS {
            return Err(Error::InvalidSurveyData(format!("title may not be greater than {} characters", TITLE_MAX_CHARS)));
        }
        Ok(())
    }
}

/// Body of both create and update requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SurveySubmit {
    #[serde(flatten)]
    pub fields: SurveyFields,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionInput>,
}

impl SurveySubmit {
    /// The inline image payload, if one was actually sent.
    pub fn image_payload(&self) -> Option<&str> {
        self.image.as_deref().filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub user_id: i32,
    pub title: String,
    pub slug: String,
    pub status: bool,
    pub description: Option<String>,
    pub image: Option<String>,
    pub expire_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct Update {
    pub title: String,
    pub status: bool,
    pub description: Option<String>,
    pub image: Option<String>,
    pub expire_date: Option<NaiveDate>,
}

#[derive(Debug, Default)]
pub struct Query {
    pub user_id_eq: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SurveyDetail {
    pub survey: Survey,
    pub questions: Vec<Question>,
}

pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "survey".to_owned()
    } else {
        slug.to_owned()
    }
}

/// The first of `base`, `base-1`, `base-2`, ... that is not in `taken`.
pub fn next_free_slug(base: &str, taken: &[String]) -> String {
    if !taken.iter().any(|s| s == base) {
        return base.to_owned();
    }
    (1..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_owned())
}
