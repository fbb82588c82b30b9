use std::collections::BTreeSet;

use crate::core::models::question::{Question, QuestionInput, Update as QuestionUpdate};
use crate::core::ports::repository::{QuestionCommon, Store};
use crate::error::Error;

/// Which submitted positions and stored ids each step of a reconciliation touches.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Plan {
    pub to_delete: Vec<i32>,
    pub to_create: Vec<usize>,
    pub to_update: Vec<(usize, i32)>,
    /// Positions carrying an id the survey does not own. Each is either a
    /// stale client id or a question of another survey.
    pub unknown: Vec<(usize, i32)>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub created: Vec<i32>,
    pub updated: Vec<i32>,
    pub deleted: Vec<i32>,
}

pub fn plan(existing_ids: &BTreeSet<i32>, submitted: &[QuestionInput]) -> Result<Plan, Error> {
    let mut plan = Plan::default();
    let mut submitted_ids = BTreeSet::new();
    for (pos, input) in submitted.iter().enumerate() {
        match input.id {
            None => plan.to_create.push(pos),
            Some(id) => {
                if !submitted_ids.insert(id) {
                    return Err(Error::invalid_question(pos, format!("question {} submitted more than once", id)));
                }
                if existing_ids.contains(&id) {
                    plan.to_update.push((pos, id));
                } else {
                    plan.unknown.push((pos, id));
                }
            }
        }
    }
    plan.to_delete = existing_ids.difference(&submitted_ids).copied().collect();
    Ok(plan)
}

/// Brings the stored questions of a survey in line with the submitted list.
///
/// Every input is validated before the first write, so a bad question never
/// leaves earlier steps applied. The writes themselves are not committed
/// here; callers run this on a transactional store.
pub async fn reconcile<S>(store: &mut S, survey_id: i32, existing: Vec<Question>, submitted: Vec<QuestionInput>) -> Result<Reconciliation, Error>
where
    S: Store,
{
    let mut fields: Vec<Option<QuestionUpdate>> = submitted
        .iter()
        .enumerate()
        .map(|(pos, input)| input.validate(pos).map(Some))
        .collect::<Result<_, _>>()?;
    let existing_ids: BTreeSet<i32> = existing.iter().map(|q| q.id).collect();
    let mut plan = plan(&existing_ids, &submitted)?;
    for (pos, id) in plan.unknown.drain(..) {
        if let Some(other) = QuestionCommon::get(store, id).await? {
            log::warn!("rejecting question {} of survey {} submitted for survey {}", id, other.survey_id, survey_id);
            return Err(Error::invalid_question(pos, format!("question {} does not belong to survey {}", id, survey_id)));
        }
        log::debug!("question id {} at position {} is unknown, creating a new question", id, pos);
        plan.to_create.push(pos);
    }
    plan.to_create.sort_unstable();
    log::debug!(
        "reconciling survey {}: {} to delete, {} to create, {} to update",
        survey_id,
        plan.to_delete.len(),
        plan.to_create.len(),
        plan.to_update.len()
    );

    let mut result = Reconciliation::default();
    if !plan.to_delete.is_empty() {
        QuestionCommon::bulk_delete(store, plan.to_delete.clone()).await?;
        result.deleted = plan.to_delete;
    }
    for pos in plan.to_create {
        if let Some(update) = fields[pos].take() {
            let id = QuestionCommon::insert(store, update.insert_into(survey_id)).await?;
            result.created.push(id);
        }
    }
    for (pos, id) in plan.to_update {
        if let Some(update) = fields[pos].take() {
            QuestionCommon::update(store, id, update).await?;
            result.updated.push(id);
        }
    }
    Ok(result)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::models::question::{parse_data, Insert as QuestionInsert, QuestionType};
    use crate::core::models::survey::Insert as SurveyInsert;
    use crate::core::ports::memory::{MemoryDB, MemoryStore};
    use crate::core::ports::repository::{SurveyCommon, TxStore};
    use serde_json::{json, Value};

    fn inputs(v: Value) -> Vec<QuestionInput> {
        serde_json::from_value(v).unwrap()
    }

    async fn seed_survey(store: &mut MemoryStore, user_id: i32) -> i32 {
        SurveyCommon::insert(
            store,
            SurveyInsert {
                user_id,
                title: "seed".into(),
                slug: format!("seed-{}", user_id),
                status: true,
                description: None,
                image: None,
                expire_date: None,
            },
        )
        .await
        .unwrap()
    }

    async fn seed_question(store: &mut MemoryStore, survey_id: i32, type_: QuestionType, question: &str) -> i32 {
        QuestionCommon::insert(
            store,
            QuestionInsert {
                survey_id,
                type_,
                question: question.into(),
                description: None,
                data: "{}".into(),
            },
        )
        .await
        .unwrap()
    }

    fn ids(questions: &[Question]) -> BTreeSet<i32> {
        questions.iter().map(|q| q.id).collect()
    }

    #[test]
    fn test_plan() {
        let existing = BTreeSet::from([1, 2, 3]);
        let submitted = inputs(json!([{"id": 2}, {}, {"id": 9}, {"id": "tmp-uuid"}, {"id": 3}]));
        let plan = plan(&existing, &submitted).unwrap();
        assert_eq!(plan.to_delete, vec![1]);
        assert_eq!(plan.to_create, vec![1, 3]);
        assert_eq!(plan.to_update, vec![(0, 2), (4, 3)]);
        assert_eq!(plan.unknown, vec![(2, 9)]);
    }

    #[test]
    fn test_plan_rejects_duplicate_ids() {
        let err = plan(&BTreeSet::from([1]), &inputs(json!([{"id": 1}, {"id": 1}]))).unwrap_err();
        assert!(matches!(err, Error::InvalidQuestionData { position: 1, .. }));
    }

    #[tokio::test]
    async fn test_delete_update_create() {
        let db = MemoryDB::new();
        let mut store = db.store();
        let sid = seed_survey(&mut store, 1).await;
        let q1 = seed_question(&mut store, sid, QuestionType::Text, "first").await;
        let q2 = seed_question(&mut store, sid, QuestionType::Radio, "second").await;
        let existing = QuestionCommon::query_by_survey(&mut store, sid).await.unwrap();

        let submitted = inputs(json!([
            {"id": q2, "type": "radio", "question": "x", "data": {"options": ["a", "b"]}},
            {"type": "text", "question": "y", "data": {}}
        ]));
        let result = reconcile(&mut store, sid, existing, submitted).await.unwrap();
        assert_eq!(result.deleted, vec![q1]);
        assert_eq!(result.updated, vec![q2]);
        assert_eq!(result.created.len(), 1);

        let stored = db.questions_of(sid);
        assert_eq!(stored.len(), 2);
        let updated = stored.iter().find(|q| q.id == q2).unwrap();
        assert_eq!(updated.question, "x");
        assert_eq!(updated.options(), json!({"options": ["a", "b"]}));
        let created = stored.iter().find(|q| q.id == result.created[0]).unwrap();
        assert_eq!(created.question, "y");
        assert_eq!(created.type_, QuestionType::Text);
    }

    #[tokio::test]
    async fn test_result_set_equation() {
        let db = MemoryDB::new();
        let mut store = db.store();
        let sid = seed_survey(&mut store, 1).await;
        let mut seeded = Vec::new();
        for i in 0..4 {
            seeded.push(seed_question(&mut store, sid, QuestionType::Text, &format!("q{}", i)).await);
        }
        let existing = QuestionCommon::query_by_survey(&mut store, sid).await.unwrap();
        let kept = BTreeSet::from([seeded[1], seeded[3]]);
        let submitted = inputs(json!([
            {"id": seeded[3], "type": "text", "question": "keep 3", "data": ""},
            {"id": "new-1", "type": "checkbox", "question": "new", "data": {"options": []}},
            {"id": seeded[1], "type": "textarea", "question": "keep 1", "data": ""},
            {"id": 10_000, "type": "select", "question": "stale id", "data": []},
            {"type": "text", "question": "plain", "data": null}
        ]));
        let result = reconcile(&mut store, sid, existing, submitted).await.unwrap();

        let after = ids(&db.questions_of(sid));
        let expected: BTreeSet<i32> = kept.iter().copied().chain(result.created.iter().copied()).collect();
        assert_eq!(after, expected);
        assert_eq!(after.len(), kept.len() + 3);
        assert!(!after.contains(&10_000));
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let db = MemoryDB::new();
        let mut store = db.store();
        let sid = seed_survey(&mut store, 1).await;
        let submitted = json!([
            {"type": "select", "question": "pick", "data": {"options": ["a"]}},
            {"type": "text", "question": "why", "description": "free text", "data": {}}
        ]);
        let first = reconcile(&mut store, sid, vec![], inputs(submitted.clone())).await.unwrap();
        assert_eq!(first.created.len(), 2);

        let stored = db.questions_of(sid);
        let mut resubmitted = submitted.as_array().unwrap().clone();
        for (value, id) in resubmitted.iter_mut().zip(first.created.iter()) {
            value["id"] = json!(id);
        }
        let second = reconcile(&mut store, sid, stored.clone(), inputs(Value::Array(resubmitted))).await.unwrap();
        assert!(second.created.is_empty());
        assert!(second.deleted.is_empty());
        assert_eq!(ids(&db.questions_of(sid)), ids(&stored));
        for q in db.questions_of(sid) {
            let before = stored.iter().find(|s| s.id == q.id).unwrap();
            assert_eq!((q.type_, &q.question, &q.description, &q.data), (before.type_, &before.question, &before.description, &before.data));
        }
    }

    #[tokio::test]
    async fn test_empty_submission_deletes_all() {
        let db = MemoryDB::new();
        let mut store = db.store();
        let sid = seed_survey(&mut store, 1).await;
        seed_question(&mut store, sid, QuestionType::Text, "a").await;
        seed_question(&mut store, sid, QuestionType::Checkbox, "b").await;
        let existing = QuestionCommon::query_by_survey(&mut store, sid).await.unwrap();
        let result = reconcile(&mut store, sid, existing, vec![]).await.unwrap();
        assert_eq!(result.deleted.len(), 2);
        assert!(result.created.is_empty());
        assert!(db.questions_of(sid).is_empty());
    }

    #[tokio::test]
    async fn test_foreign_question_is_rejected() {
        let db = MemoryDB::new();
        let mut store = db.store();
        let mine = seed_survey(&mut store, 1).await;
        let theirs = seed_survey(&mut store, 2).await;
        let own = seed_question(&mut store, mine, QuestionType::Text, "mine").await;
        let foreign = seed_question(&mut store, theirs, QuestionType::Text, "theirs").await;

        let mut tx = db.begin();
        let existing = QuestionCommon::query_by_survey(&mut tx, mine).await.unwrap();
        let submitted = inputs(json!([{"id": foreign, "type": "text", "question": "hijack", "data": {}}]));
        let err = reconcile(&mut tx, mine, existing, submitted).await.unwrap_err();
        assert!(matches!(err, Error::InvalidQuestionData { position: 0, .. }));
        drop(tx);

        assert_eq!(ids(&db.questions_of(mine)), BTreeSet::from([own]));
        assert_eq!(db.questions_of(theirs)[0].question, "theirs");
    }

    #[tokio::test]
    async fn test_invalid_question_leaves_nothing_after_rollback() {
        let db = MemoryDB::new();
        let mut store = db.store();
        let sid = seed_survey(&mut store, 1).await;
        let q1 = seed_question(&mut store, sid, QuestionType::Text, "a").await;
        let before = db.snapshot();

        let mut tx = db.begin();
        let existing = QuestionCommon::query_by_survey(&mut tx, sid).await.unwrap();
        let submitted = inputs(json!([
            {"type": "text", "question": "ok", "data": {}},
            {"type": "text", "question": "fine", "data": {}},
            {"type": "matrix", "question": "bad", "data": {}}
        ]));
        let err = reconcile(&mut tx, sid, existing, submitted).await.unwrap_err();
        assert!(matches!(err, Error::InvalidQuestionData { position: 2, .. }));
        tx.rollback().await.unwrap();

        let after = db.snapshot();
        assert_eq!(after.questions.keys().collect::<Vec<_>>(), before.questions.keys().collect::<Vec<_>>());
        assert_eq!(after.questions[&q1].question, "a");
    }

    #[tokio::test]
    async fn test_structured_options_round_trip_through_store() {
        let db = MemoryDB::new();
        let mut store = db.store();
        let sid = seed_survey(&mut store, 1).await;
        let options = json!({"options": [{"uuid": "1", "text": "yes"}, {"uuid": "2", "text": "no"}]});
        let submitted = inputs(json!([{"type": "checkbox", "question": "agree?", "data": options.clone()}]));
        reconcile(&mut store, sid, vec![], submitted).await.unwrap();
        let stored = db.questions_of(sid);
        assert_eq!(parse_data(&stored[0].data), options);
    }
}
