use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use georank_core::pipeline::{run_all, run_stage};
use georank_core::{Coordinate, Error, RecommendConfig, RecommendRequest, Stage, DEFAULT_MAX_DISTANCE};
use georank_storage::StorageManager;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

#[derive(Deserialize)]
struct RecommendQuery {
    max_distance: Option<f64>,
    longitude: Option<f64>,
    latitude: Option<f64>,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(storage: Arc<StorageManager>, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(storage.clone()))
                .configure(configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Register every route; expects `web::Data<Arc<StorageManager>>` in app data
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/status", web::get().to(status))
        .route("/businesses/{id}", web::get().to(get_business))
        .route("/businesses/{id}/recommendations", web::get().to(recommend))
        .route("/businesses/{id}/reviews", web::get().to(list_reviews))
        .route("/admin/preprocess", web::post().to(preprocess))
        .route("/admin/stages/{stage}", web::post().to(run_single_stage))
        .route("/admin/save", web::post().to(save));
}

fn error_response(e: &Error) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        Error::BusinessNotFound(_) => HttpResponse::NotFound().json(body),
        Error::InvalidArgument(_) | Error::InvalidCoordinate { .. } => HttpResponse::BadRequest().json(body),
        Error::Computation(_) => HttpResponse::Conflict().json(body),
        _ => {
            warn!("request failed: {}", e);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

async fn status(storage: web::Data<Arc<StorageManager>>) -> ActixResult<HttpResponse> {
    let catalog = storage.catalog();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "businesses": catalog.business_count(),
        "reviews": catalog.review_count(),
        "stages": catalog.stage_status(),
        "last_save_time": storage.last_save_time(),
    })))
}

async fn get_business(
    storage: web::Data<Arc<StorageManager>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    match storage.catalog().get_business(&id) {
        Some(business) => Ok(HttpResponse::Ok().json(serde_json::json!({ "result": business }))),
        None => Ok(error_response(&Error::BusinessNotFound(id))),
    }
}

async fn recommend(
    storage: web::Data<Arc<StorageManager>>,
    path: web::Path<String>,
    query: web::Query<RecommendQuery>,
) -> ActixResult<HttpResponse> {
    let seed_id = path.into_inner();
    let mut request = RecommendRequest::new(seed_id, query.max_distance.unwrap_or(DEFAULT_MAX_DISTANCE));

    match (query.longitude, query.latitude) {
        (Some(longitude), Some(latitude)) => {
            request = request.with_origin(Coordinate { longitude, latitude });
        }
        (None, None) => {}
        _ => {
            return Ok(error_response(&Error::InvalidArgument(
                "longitude and latitude must be given together".to_string(),
            )));
        }
    }

    match storage.catalog().recommend(&request, &RecommendConfig::default()) {
        Ok(results) => Ok(HttpResponse::Ok().json(serde_json::json!({ "result": results }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn list_reviews(
    storage: web::Data<Arc<StorageManager>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    match storage.catalog().reviews_for(&id) {
        Ok(reviews) => Ok(HttpResponse::Ok().json(serde_json::json!({ "result": reviews }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn preprocess(storage: web::Data<Arc<StorageManager>>) -> ActixResult<HttpResponse> {
    match run_all(&storage.catalog()) {
        Ok(reports) => Ok(HttpResponse::Ok().json(serde_json::json!({ "result": reports }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn run_single_stage(
    storage: web::Data<Arc<StorageManager>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let stage = match path.into_inner().parse::<Stage>() {
        Ok(stage) => stage,
        Err(e) => return Ok(error_response(&e)),
    };
    match run_stage(&storage.catalog(), stage) {
        Ok(report) => Ok(HttpResponse::Ok().json(serde_json::json!({ "result": report }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn save(storage: web::Data<Arc<StorageManager>>) -> ActixResult<HttpResponse> {
    match storage.save() {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({ "result": true }))),
        Err(e) => Ok(error_response(&e)),
    }
}
