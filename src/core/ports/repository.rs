use crate::core::models::{
    common::Pagination,
    question::{Insert as QuestionInsert, Question, Update as QuestionUpdate},
    survey::{Insert as SurveyInsert, Query as SurveyQuery, Survey, Update as SurveyUpdate},
};
use crate::error::Error;

pub trait SurveyCommon {
    /// Fails with `Error::SlugConflict` when the slug is already taken.
    async fn insert(&mut self, survey: SurveyInsert) -> Result<i32, Error>;
    async fn update(&mut self, id: i32, survey: SurveyUpdate) -> Result<(), Error>;
    async fn get(&mut self, id: i32) -> Result<Option<Survey>, Error>;
    async fn delete(&mut self, id: i32) -> Result<(), Error>;
    async fn query(&mut self, query: &SurveyQuery, pagination: Option<Pagination>) -> Result<Vec<Survey>, Error>;
    async fn count(&mut self, query: &SurveyQuery) -> Result<i64, Error>;
    /// `base` itself and every `base-<suffix>` slug in use.
    async fn slugs_like(&mut self, base: &str) -> Result<Vec<String>, Error>;
}

pub trait QuestionCommon {
    async fn insert(&mut self, question: QuestionInsert) -> Result<i32, Error>;
    async fn update(&mut self, id: i32, question: QuestionUpdate) -> Result<(), Error>;
    async fn get(&mut self, id: i32) -> Result<Option<Question>, Error>;
    async fn bulk_delete(&mut self, ids: Vec<i32>) -> Result<(), Error>;
    async fn query_by_survey(&mut self, survey_id: i32) -> Result<Vec<Question>, Error>;
}

pub trait Common: SurveyCommon + QuestionCommon {}

pub trait Store: Common {}

/// A store bound to one transaction. Dropping it without `commit` discards
/// every write made through it.
pub trait TxStore: Store {
    async fn commit(self) -> Result<(), Error>;
    async fn rollback(self) -> Result<(), Error>;
}

pub trait Manager<'m, S, T>
where
    S: Store,
    T: TxStore,
{
    async fn db(&'m self) -> Result<S, Error>;
    async fn tx(&'m self) -> Result<T, Error>;
}
