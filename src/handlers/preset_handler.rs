use std::sync::Arc;

use actix_web::{delete, get, post, web, HttpResponse, Responder};

use crate::error::AppError;
use crate::models::preset::{ComparePresetsRequest, CreatePresetRequest};
use crate::services::backtest_parser::parse_backtest_report;
use crate::services::preset_store::PresetStore;
use crate::services::set_file::{generate_set_file, parse_set_file, sanitize_filename};

#[post("/presets")]
async fn create_preset(
    store: web::Data<Arc<PresetStore>>,
    body: web::Json<CreatePresetRequest>,
) -> impl Responder {
    let req = body.into_inner();
    let preset = store
        .add_preset(
            req.name,
            req.parameters,
            req.optimization_metrics,
            req.id,
            req.notes,
        )
        .await;
    HttpResponse::Ok().json(preset)
}

#[get("/presets")]
async fn list_presets(store: web::Data<Arc<PresetStore>>) -> impl Responder {
    HttpResponse::Ok().json(store.list_presets().await)
}

#[get("/presets/export")]
async fn export_presets(store: web::Data<Arc<PresetStore>>) -> Result<impl Responder, AppError> {
    let json = store
        .export_presets()
        .await
        .map_err(|e| AppError::Data(e.to_string()))?;
    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(json))
}

#[post("/presets/import")]
async fn import_presets(
    store: web::Data<Arc<PresetStore>>,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    let content = String::from_utf8_lossy(&body);
    let count = store
        .import_presets(&content)
        .await
        .map_err(|e| AppError::Format(e.to_string()))?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Import complete",
        "presets_imported": count
    })))
}

#[get("/presets/{id}")]
async fn get_preset(
    store: web::Data<Arc<PresetStore>>,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let id = path.into_inner();
    let preset = store
        .get_preset(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("preset {id}")))?;
    Ok(HttpResponse::Ok().json(preset))
}

#[delete("/presets/{id}")]
async fn delete_preset(
    store: web::Data<Arc<PresetStore>>,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    store.delete_preset(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Deleted" })))
}

#[post("/presets/{id}/backtest")]
async fn attach_backtest_report(
    store: web::Data<Arc<PresetStore>>,
    path: web::Path<String>,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    let content = String::from_utf8_lossy(&body);
    let report = parse_backtest_report(&content);
    let preset = store.attach_backtest(&path.into_inner(), report).await?;
    Ok(HttpResponse::Ok().json(preset))
}

#[post("/presets/compare")]
async fn compare_presets(
    store: web::Data<Arc<PresetStore>>,
    body: web::Json<ComparePresetsRequest>,
) -> Result<impl Responder, AppError> {
    let comparison = store.compare_presets(&body.preset_ids).await?;
    Ok(HttpResponse::Ok().json(comparison))
}

#[get("/presets/{id}/set-file")]
async fn download_set_file(
    store: web::Data<Arc<PresetStore>>,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let id = path.into_inner();
    let preset = store
        .get_preset(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("preset {id}")))?;

    let content = generate_set_file(&preset.parameters, &preset.name);
    let filename = sanitize_filename(&preset.name);

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(content))
}

#[post("/set-files/parse")]
async fn parse_set_file_upload(body: web::Bytes) -> impl Responder {
    let content = String::from_utf8_lossy(&body);
    let parameters = parse_set_file(&content);
    HttpResponse::Ok().json(serde_json::json!({
        "count": parameters.len(),
        "parameters": parameters
    }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    // /presets/export and /presets/compare must register ahead of the
    // /presets/{id} routes
    cfg.service(create_preset)
        .service(list_presets)
        .service(export_presets)
        .service(import_presets)
        .service(compare_presets)
        .service(get_preset)
        .service(delete_preset)
        .service(attach_backtest_report)
        .service(download_set_file)
        .service(parse_set_file_upload);
}
