use crate::actix_web::{
    web::{Json, Path, Query},
    HttpResponse,
};
use crate::config::Config;
use crate::context::UserInfo;
use crate::core::models::survey::SurveySubmit;
use crate::core::ports::repository::Manager;
use crate::core::services::survey::{create_survey, delete_survey, survey_detail, surveys_of_owner, update_survey};
use crate::error::Error;
use crate::handlers::{Images, DB};
use crate::request::Pagination;
use crate::response::{List, SurveyResource};
use actix_web::web::Data;

pub async fn list(user_info: UserInfo, Query(Pagination { page, size }): Query<Pagination>, db: DB, config: Data<Config>) -> Result<Json<List<SurveyResource>>, Error> {
    let mut store = db.db().await?;
    let (surveys, total) = surveys_of_owner(&mut store, user_info.id, page, size).await?;
    let list = surveys.into_iter().map(|s| SurveyResource::new(s, &config.public_url)).collect();
    Ok(Json(List::new(list, total)))
}

pub async fn create(user_info: UserInfo, Json(body): Json<SurveySubmit>, db: DB, images: Images, config: Data<Config>) -> Result<HttpResponse, Error> {
    let detail = create_survey(db.tx().await?, images.get_ref(), user_info.id, body).await?;
    Ok(HttpResponse::Created().json(SurveyResource::detail(detail, &config.public_url)))
}

pub async fn detail(user_info: UserInfo, survey_id: Path<(i32,)>, db: DB, config: Data<Config>) -> Result<Json<SurveyResource>, Error> {
    let mut store = db.db().await?;
    let detail = survey_detail(&mut store, user_info.id, survey_id.into_inner().0).await?;
    Ok(Json(SurveyResource::detail(detail, &config.public_url)))
}

pub async fn update(user_info: UserInfo, survey_id: Path<(i32,)>, Json(body): Json<SurveySubmit>, db: DB, images: Images, config: Data<Config>) -> Result<Json<SurveyResource>, Error> {
    let detail = update_survey(db.tx().await?, images.get_ref(), user_info.id, survey_id.into_inner().0, body).await?;
    Ok(Json(SurveyResource::detail(detail, &config.public_url)))
}

pub async fn delete(user_info: UserInfo, survey_id: Path<(i32,)>, db: DB, images: Images) -> Result<HttpResponse, Error> {
    delete_survey(db.tx().await?, images.get_ref(), user_info.id, survey_id.into_inner().0).await?;
    Ok(HttpResponse::NoContent().finish())
}
