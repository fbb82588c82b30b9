//! In-process store used by the service tests. Transactions work on a copy
//! of the state that only replaces the shared state on commit.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::Utc;

use crate::core::models::{
    common::Pagination,
    question::{Insert as QuestionInsert, Question, Update as QuestionUpdate},
    survey::{Insert as SurveyInsert, Query as SurveyQuery, Survey, Update as SurveyUpdate},
};
use crate::core::ports::repository::{Common, Manager, QuestionCommon, Store, SurveyCommon, TxStore};
use crate::error::Error;

#[derive(Debug, Clone, Default)]
pub struct State {
    pub surveys: BTreeMap<i32, Survey>,
    pub questions: BTreeMap<i32, Question>,
    last_id: i32,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDB {
    state: Rc<RefCell<State>>,
}

impl MemoryDB {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> MemoryStore {
        MemoryStore {
            shared: self.state.clone(),
            pending: None,
        }
    }

    pub fn begin(&self) -> MemoryStore {
        MemoryStore {
            shared: self.state.clone(),
            pending: Some(self.state.borrow().clone()),
        }
    }

    pub fn snapshot(&self) -> State {
        self.state.borrow().clone()
    }

    pub fn questions_of(&self, survey_id: i32) -> Vec<Question> {
        self.state.borrow().questions.values().filter(|q| q.survey_id == survey_id).cloned().collect()
    }
}

impl<'m> Manager<'m, MemoryStore, MemoryStore> for MemoryDB {
    async fn db(&'m self) -> Result<MemoryStore, Error> {
        Ok(self.store())
    }

    async fn tx(&'m self) -> Result<MemoryStore, Error> {
        Ok(self.begin())
    }
}

pub struct MemoryStore {
    shared: Rc<RefCell<State>>,
    pending: Option<State>,
}

impl MemoryStore {
    fn with<R>(&mut self, f: impl FnOnce(&mut State) -> R) -> R {
        match &mut self.pending {
            Some(state) => f(state),
            None => f(&mut self.shared.borrow_mut()),
        }
    }
}

impl SurveyCommon for MemoryStore {
    async fn insert(&mut self, survey: SurveyInsert) -> Result<i32, Error> {
        self.with(|s| {
            if s.surveys.values().any(|v| v.slug == survey.slug) {
                return Err(Error::SlugConflict(survey.slug));
            }
            let id = s.next_id();
            let now = Utc::now();
            s.surveys.insert(
                id,
                Survey {
                    id,
                    user_id: survey.user_id,
                    title: survey.title,
                    slug: survey.slug,
                    status: survey.status,
                    description: survey.description,
                    image: survey.image,
                    expire_date: survey.expire_date,
                    created_at: now,
                    updated_at: now,
                },
            );
            Ok(id)
        })
    }

    async fn update(&mut self, id: i32, survey: SurveyUpdate) -> Result<(), Error> {
        self.with(|s| {
            let row = s.surveys.get_mut(&id).ok_or(Error::NotFound)?;
            row.title = survey.title;
            row.status = survey.status;
            row.description = survey.description;
            row.image = survey.image;
            row.expire_date = survey.expire_date;
            row.updated_at = Utc::now();
            Ok(())
        })
    }

    async fn get(&mut self, id: i32) -> Result<Option<Survey>, Error> {
        Ok(self.with(|s| s.surveys.get(&id).cloned()))
    }

    async fn delete(&mut self, id: i32) -> Result<(), Error> {
        self.with(|s| {
            s.surveys.remove(&id);
            s.questions.retain(|_, q| q.survey_id != id);
        });
        Ok(())
    }

    async fn query(&mut self, query: &SurveyQuery, pagination: Option<Pagination>) -> Result<Vec<Survey>, Error> {
        Ok(self.with(|s| {
            let matched = s.surveys.values().rev().filter(|v| query.user_id_eq.map_or(true, |uid| v.user_id == uid)).cloned();
            match pagination {
                Some(p) => matched.skip(p.offset as usize).take(p.limit as usize).collect(),
                None => matched.collect(),
            }
        }))
    }

    async fn count(&mut self, query: &SurveyQuery) -> Result<i64, Error> {
        Ok(self.with(|s| s.surveys.values().filter(|v| query.user_id_eq.map_or(true, |uid| v.user_id == uid)).count() as i64))
    }

    async fn slugs_like(&mut self, base: &str) -> Result<Vec<String>, Error> {
        let prefix = format!("{}-", base);
        Ok(self.with(|s| s.surveys.values().filter(|v| v.slug == base || v.slug.starts_with(&prefix)).map(|v| v.slug.clone()).collect()))
    }
}

impl QuestionCommon for MemoryStore {
    async fn insert(&mut self, question: QuestionInsert) -> Result<i32, Error> {
        self.with(|s| {
            if !s.surveys.contains_key(&question.survey_id) {
                return Err(Error::ServerError(format!("survey {} does not exist", question.survey_id)));
            }
            let id = s.next_id();
            let now = Utc::now();
            s.questions.insert(
                id,
                Question {
                    id,
                    survey_id: question.survey_id,
                    type_: question.type_,
                    question: question.question,
                    description: question.description,
                    data: question.data,
                    created_at: now,
                    updated_at: now,
                },
            );
            Ok(id)
        })
    }

    async fn update(&mut self, id: i32, question: QuestionUpdate) -> Result<(), Error> {
        self.with(|s| {
            let row = s.questions.get_mut(&id).ok_or(Error::NotFound)?;
            row.type_ = question.type_;
            row.question = question.question;
            row.description = question.description;
            row.data = question.data;
            row.updated_at = Utc::now();
            Ok(())
        })
    }

    async fn get(&mut self, id: i32) -> Result<Option<Question>, Error> {
        Ok(self.with(|s| s.questions.get(&id).cloned()))
    }

    async fn bulk_delete(&mut self, ids: Vec<i32>) -> Result<(), Error> {
        self.with(|s| {
            for id in ids {
                s.questions.remove(&id);
            }
        });
        Ok(())
    }

    async fn query_by_survey(&mut self, survey_id: i32) -> Result<Vec<Question>, Error> {
        Ok(self.with(|s| s.questions.values().filter(|q| q.survey_id == survey_id).cloned().collect()))
    }
}

impl Common for MemoryStore {}
impl Store for MemoryStore {}

impl TxStore for MemoryStore {
    async fn commit(mut self) -> Result<(), Error> {
        if let Some(state) = self.pending.take() {
            *self.shared.borrow_mut() = state;
        }
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), Error> {
        self.pending = None;
        Ok(())
    }
}
