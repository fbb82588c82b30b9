use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::core::models::question::{Question, QuestionType};
use crate::core::models::survey::{Survey, SurveyDetail};
use crate::serde::Serialize;

#[derive(Debug, Serialize)]
pub struct List<T> {
    list: Vec<T>,
    total: i64,
}

impl<T> List<T> {
    pub fn new(list: Vec<T>, total: i64) -> Self {
        List { list, total }
    }
}

#[derive(Debug, Serialize)]
pub struct QuestionResource {
    pub id: i32,
    #[serde(rename = "type")]
    pub type_: QuestionType,
    pub question: String,
    pub description: Option<String>,
    pub data: Value,
}

impl From<Question> for QuestionResource {
    fn from(q: Question) -> Self {
        let data = q.options();
        Self {
            id: q.id,
            type_: q.type_,
            question: q.question,
            description: q.description,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SurveyResource {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub status: bool,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub expire_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<QuestionResource>>,
}

impl SurveyResource {
    /// `public_url` is prefixed to the stored image path.
    pub fn new(survey: Survey, public_url: &str) -> Self {
        let image_url = survey.image.map(|path| format!("{}/{}", public_url.trim_end_matches('/'), path));
        Self {
            id: survey.id,
            title: survey.title,
            slug: survey.slug,
            status: survey.status,
            description: survey.description,
            image_url,
            expire_date: survey.expire_date,
            created_at: survey.created_at,
            updated_at: survey.updated_at,
            questions: None,
        }
    }

    pub fn detail(detail: SurveyDetail, public_url: &str) -> Self {
        let mut resource = Self::new(detail.survey, public_url);
        resource.questions = Some(detail.questions.into_iter().map(QuestionResource::from).collect());
        resource
    }
}
