use sqlx::pool::PoolConnection;
use sqlx::{query, query_as, query_scalar, Executor, PgPool, Postgres, QueryBuilder, Transaction};

use crate::core::models::{
    common::Pagination,
    question::{Insert as QuestionInsert, Question, Update as QuestionUpdate},
    survey::{Insert as SurveyInsert, Query as SurveyQuery, Survey, Update as SurveyUpdate},
};
use crate::core::ports::repository::{Common, Manager, QuestionCommon, Store, SurveyCommon, TxStore};
use crate::error::Error;

pub struct PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e>,
{
    executor: E,
}

impl<E> PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }
}

fn push_survey_filter(stmt: &mut QueryBuilder<'_, Postgres>, query: &SurveyQuery) {
    if let Some(uid) = query.user_id_eq {
        stmt.push(" AND user_id = ").push_bind(uid);
    }
}

impl<E> SurveyCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, survey: SurveyInsert) -> Result<i32, Error> {
        // ON CONFLICT keeps the transaction usable so the caller can retry with another slug.
        let id = query_scalar(
            "INSERT INTO surveys (user_id, title, slug, status, description, image, expire_date) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (slug) DO NOTHING RETURNING id",
        )
        .bind(survey.user_id)
        .bind(survey.title)
        .bind(&survey.slug)
        .bind(survey.status)
        .bind(survey.description)
        .bind(survey.image)
        .bind(survey.expire_date)
        .fetch_optional(&mut self.executor)
        .await?;
        id.ok_or(Error::SlugConflict(survey.slug))
    }

    async fn update(&mut self, id: i32, survey: SurveyUpdate) -> Result<(), Error> {
        let res = query("UPDATE surveys SET title = $1, status = $2, description = $3, image = $4, expire_date = $5, updated_at = NOW() WHERE id = $6")
            .bind(survey.title)
            .bind(survey.status)
            .bind(survey.description)
            .bind(survey.image)
            .bind(survey.expire_date)
            .bind(id)
            .execute(&mut self.executor)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    async fn get(&mut self, id: i32) -> Result<Option<Survey>, Error> {
        let survey = query_as("SELECT * FROM surveys WHERE id = $1").bind(id).fetch_optional(&mut self.executor).await?;
        Ok(survey)
    }

    async fn delete(&mut self, id: i32) -> Result<(), Error> {
        query("DELETE FROM surveys WHERE id = $1").bind(id).execute(&mut self.executor).await?;
        Ok(())
    }

    async fn query(&mut self, query: &SurveyQuery, pagination: Option<Pagination>) -> Result<Vec<Survey>, Error> {
        let mut stmt = QueryBuilder::new("SELECT * FROM surveys WHERE 1 = 1");
        push_survey_filter(&mut stmt, query);
        stmt.push(" ORDER BY created_at DESC, id DESC");
        if let Some(p) = pagination {
            stmt.push(" LIMIT ").push_bind(p.limit);
            stmt.push(" OFFSET ").push_bind(p.offset);
        }
        let surveys = stmt.build_query_as().fetch_all(&mut self.executor).await?;
        Ok(surveys)
    }

    async fn count(&mut self, query: &SurveyQuery) -> Result<i64, Error> {
        let mut stmt = QueryBuilder::new("SELECT COUNT(*) FROM surveys WHERE 1 = 1");
        push_survey_filter(&mut stmt, query);
        let (n,) = stmt.build_query_as().fetch_one(&mut self.executor).await?;
        Ok(n)
    }

    async fn slugs_like(&mut self, base: &str) -> Result<Vec<String>, Error> {
        // Slugs only hold [a-z0-9-], so `base` carries no LIKE wildcards.
        let slugs = query_scalar("SELECT slug FROM surveys WHERE slug = $1 OR slug LIKE $1 || '-%'")
            .bind(base)
            .fetch_all(&mut self.executor)
            .await?;
        Ok(slugs)
    }
}

impl<E> QuestionCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, question: QuestionInsert) -> Result<i32, Error> {
        let id = query_scalar("INSERT INTO questions (survey_id, type_, question, description, data) VALUES ($1, $2, $3, $4, $5) RETURNING id")
            .bind(question.survey_id)
            .bind(question.type_)
            .bind(question.question)
            .bind(question.description)
            .bind(question.data)
            .fetch_one(&mut self.executor)
            .await?;
        Ok(id)
    }

    async fn update(&mut self, id: i32, question: QuestionUpdate) -> Result<(), Error> {
        let res = query("UPDATE questions SET type_ = $1, question = $2, description = $3, data = $4, updated_at = NOW() WHERE id = $5")
            .bind(question.type_)
            .bind(question.question)
            .bind(question.description)
            .bind(question.data)
            .bind(id)
            .execute(&mut self.executor)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    async fn get(&mut self, id: i32) -> Result<Option<Question>, Error> {
        let question = query_as("SELECT * FROM questions WHERE id = $1").bind(id).fetch_optional(&mut self.executor).await?;
        Ok(question)
    }

    async fn bulk_delete(&mut self, ids: Vec<i32>) -> Result<(), Error> {
        query("DELETE FROM questions WHERE id = ANY($1)").bind(ids).execute(&mut self.executor).await?;
        Ok(())
    }

    async fn query_by_survey(&mut self, survey_id: i32) -> Result<Vec<Question>, Error> {
        let questions = query_as("SELECT * FROM questions WHERE survey_id = $1 ORDER BY id")
            .bind(survey_id)
            .fetch_all(&mut self.executor)
            .await?;
        Ok(questions)
    }
}

pub struct PgSqlxManager {
    pool: PgPool,
}

impl PgSqlxManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn begin(&self) -> Result<PgSqlx<Transaction<'static, Postgres>>, Error> {
        let tx = self.pool.begin().await?;
        Ok(PgSqlx { executor: tx })
    }

    pub async fn acquire(&self) -> Result<PgSqlx<PoolConnection<Postgres>>, Error> {
        let conn = self.pool.acquire().await?;
        Ok(PgSqlx { executor: conn })
    }
}

impl Common for PgSqlx<PoolConnection<Postgres>> {}
impl<'a> Common for PgSqlx<Transaction<'a, Postgres>> {}
impl Store for PgSqlx<PoolConnection<Postgres>> {}
impl<'a> Store for PgSqlx<Transaction<'a, Postgres>> {}

impl<'a> TxStore for PgSqlx<Transaction<'a, Postgres>> {
    async fn commit(self) -> Result<(), Error> {
        self.executor.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), Error> {
        self.executor.rollback().await?;
        Ok(())
    }
}

impl<'a> Manager<'a, PgSqlx<PoolConnection<Postgres>>, PgSqlx<Transaction<'static, Postgres>>> for PgSqlxManager {
    async fn db(&'a self) -> Result<PgSqlx<PoolConnection<Postgres>>, Error> {
        let d = self.acquire().await?;
        Ok(d)
    }

    async fn tx(&'a self) -> Result<PgSqlx<Transaction<'static, Postgres>>, Error> {
        let t = self.begin().await?;
        Ok(t)
    }
}
