pub mod survey;

use crate::actix_web::web::Data;
use crate::database::postgres::PgSqlxManager;
use crate::impls::storer::local_storage::LocalStorer;

use crate::core::services::image::ImageIngestor;

pub type DB = Data<PgSqlxManager>;
pub type Images = Data<ImageIngestor<LocalStorer>>;
