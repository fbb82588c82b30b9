use crate::core::models::{
    common::Pagination,
    question::QuestionInput,
    survey::{next_free_slug, slugify, Insert as SurveyInsert, Query as SurveyQuery, Survey, SurveyDetail, SurveyFields, SurveySubmit, Update as SurveyUpdate},
};
use crate::core::ports::repository::{QuestionCommon, Store, SurveyCommon, TxStore};
use crate::core::ports::storer::FileStorer;
use crate::core::services::image::{ImageIngestor, StoredPath};
use crate::core::services::question::reconcile;
use crate::error::Error;

async fn owned_survey<S>(store: &mut S, owner_id: i32, survey_id: i32) -> Result<Survey, Error>
where
    S: Store,
{
    let survey = SurveyCommon::get(store, survey_id).await?.ok_or(Error::NotFound)?;
    if survey.user_id != owner_id {
        return Err(Error::Forbidden);
    }
    Ok(survey)
}

async fn load_detail<S>(store: &mut S, survey_id: i32) -> Result<SurveyDetail, Error>
where
    S: Store,
{
    let survey = SurveyCommon::get(store, survey_id).await?.ok_or(Error::NotFound)?;
    let questions = QuestionCommon::query_by_survey(store, survey_id).await?;
    Ok(SurveyDetail { survey, questions })
}

const SLUG_ATTEMPTS: usize = 5;

async fn free_slug<S>(store: &mut S, base: &str) -> Result<String, Error>
where
    S: Store,
{
    let taken = SurveyCommon::slugs_like(store, base).await?;
    Ok(next_free_slug(base, &taken))
}

// A concurrent create can take the chosen slug between the lookup and the
// insert; the insert then reports a conflict and the next free slug is tried.
async fn insert_with_unique_slug<S>(store: &mut S, mut survey: SurveyInsert) -> Result<i32, Error>
where
    S: Store,
{
    let base = slugify(&survey.title);
    let mut attempt = 1;
    loop {
        survey.slug = free_slug(store, &base).await?;
        match SurveyCommon::insert(store, survey.clone()).await {
            Err(Error::SlugConflict(slug)) if attempt < SLUG_ATTEMPTS => {
                log::debug!("slug {} was taken concurrently, retrying", slug);
                attempt += 1;
            }
            result => return result,
        }
    }
}

fn ingest_optional<F>(images: &ImageIngestor<F>, payload: Option<&str>) -> Result<Option<StoredPath>, Error>
where
    F: FileStorer,
{
    payload.map(|p| images.ingest(p)).transpose()
}

async fn insert_survey<T>(mut store: T, owner_id: i32, fields: SurveyFields, image: Option<String>, questions: Vec<QuestionInput>) -> Result<SurveyDetail, Error>
where
    T: TxStore,
{
    let survey_id = insert_with_unique_slug(
        &mut store,
        SurveyInsert {
            user_id: owner_id,
            title: fields.title,
            slug: String::new(),
            status: fields.status,
            description: fields.description,
            image,
            expire_date: fields.expire_date,
        },
    )
    .await?;
    reconcile(&mut store, survey_id, Vec::new(), questions).await?;
    let detail = load_detail(&mut store, survey_id).await?;
    store.commit().await?;
    Ok(detail)
}

pub async fn create_survey<T, F>(store: T, images: &ImageIngestor<F>, owner_id: i32, submit: SurveySubmit) -> Result<SurveyDetail, Error>
where
    T: TxStore,
    F: FileStorer,
{
    submit.fields.validate()?;
    let image = ingest_optional(images, submit.image_payload())?;
    match insert_survey(store, owner_id, submit.fields, image.clone().map(StoredPath::into_inner), submit.questions).await {
        Ok(detail) => {
            log::info!("user {} created survey {} with {} questions", owner_id, detail.survey.id, detail.questions.len());
            Ok(detail)
        }
        Err(e) => {
            if let Some(path) = &image {
                images.discard(path);
            }
            Err(e)
        }
    }
}

async fn apply_update<T>(mut store: T, survey_id: i32, fields: SurveyFields, image: Option<String>, questions: Vec<QuestionInput>) -> Result<SurveyDetail, Error>
where
    T: TxStore,
{
    SurveyCommon::update(
        &mut store,
        survey_id,
        SurveyUpdate {
            title: fields.title,
            status: fields.status,
            description: fields.description,
            image,
            expire_date: fields.expire_date,
        },
    )
    .await?;
    let existing = QuestionCommon::query_by_survey(&mut store, survey_id).await?;
    let result = reconcile(&mut store, survey_id, existing, questions).await?;
    let detail = load_detail(&mut store, survey_id).await?;
    store.commit().await?;
    log::info!(
        "survey {} updated: {} questions created, {} updated, {} deleted",
        survey_id,
        result.created.len(),
        result.updated.len(),
        result.deleted.len()
    );
    Ok(detail)
}

/// Replaces the survey's fields and reconciles its questions.
///
/// A new image is written before anything else and the one it replaces is
/// only removed once the transaction has committed, so a failed update
/// never loses the current image.
pub async fn update_survey<T, F>(mut store: T, images: &ImageIngestor<F>, owner_id: i32, survey_id: i32, submit: SurveySubmit) -> Result<SurveyDetail, Error>
where
    T: TxStore,
    F: FileStorer,
{
    let survey = owned_survey(&mut store, owner_id, survey_id).await?;
    submit.fields.validate()?;
    let new_image = ingest_optional(images, submit.image_payload())?;
    let image = new_image.clone().map(StoredPath::into_inner).or_else(|| survey.image.clone());
    match apply_update(store, survey_id, submit.fields, image, submit.questions).await {
        Ok(detail) => {
            if let (Some(_), Some(old)) = (&new_image, survey.image) {
                images.discard(&StoredPath::new(old));
            }
            Ok(detail)
        }
        Err(e) => {
            if let Some(path) = &new_image {
                images.discard(path);
            }
            Err(e)
        }
    }
}

pub async fn delete_survey<T, F>(mut store: T, images: &ImageIngestor<F>, owner_id: i32, survey_id: i32) -> Result<(), Error>
where
    T: TxStore,
    F: FileStorer,
{
    let survey = owned_survey(&mut store, owner_id, survey_id).await?;
    SurveyCommon::delete(&mut store, survey_id).await?;
    store.commit().await?;
    if let Some(path) = survey.image {
        images.discard(&StoredPath::new(path));
    }
    log::info!("user {} deleted survey {}", owner_id, survey_id);
    Ok(())
}

pub async fn survey_detail<S>(store: &mut S, owner_id: i32, survey_id: i32) -> Result<SurveyDetail, Error>
where
    S: Store,
{
    let survey = owned_survey(store, owner_id, survey_id).await?;
    let questions = QuestionCommon::query_by_survey(store, survey_id).await?;
    Ok(SurveyDetail { survey, questions })
}

pub async fn surveys_of_owner<S>(store: &mut S, owner_id: i32, page: i64, size: i64) -> Result<(Vec<Survey>, i64), Error>
where
    S: Store,
{
    let query = SurveyQuery { user_id_eq: Some(owner_id) };
    let total = SurveyCommon::count(store, &query).await?;
    let surveys = SurveyCommon::query(store, &query, Some(Pagination::page(page, size))).await?;
    Ok((surveys, total))
}
