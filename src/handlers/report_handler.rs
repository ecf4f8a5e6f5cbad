use actix_web::{get, post, web, HttpResponse, Responder};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::report::{OptimizationRecord, SelectionCriteria};
use crate::services::backtest_parser::parse_backtest_report;
use crate::services::optimization_parser::{parse_optimization_report, ReportFormat};
use crate::services::selection::find_best_parameters;

#[derive(Deserialize)]
struct UploadQuery {
    filename: String,
}

#[derive(Deserialize)]
struct SelectRequest {
    results: Vec<OptimizationRecord>,
    forward_results: Option<Vec<OptimizationRecord>>,
    #[serde(default)]
    criteria: SelectionCriteria,
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "MT5 Report Analyzer"
    }))
}

#[post("/reports/optimization")]
async fn upload_optimization_report(
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    // invalid UTF-8 is replaced, not rejected
    let content = String::from_utf8_lossy(&body);
    let format = ReportFormat::from_filename(&query.filename);
    let results = parse_optimization_report(&content, format)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "count": results.len(),
        "results": results
    })))
}

#[post("/reports/backtest")]
async fn upload_backtest_report(body: web::Bytes) -> impl Responder {
    let content = String::from_utf8_lossy(&body);
    let report = parse_backtest_report(&content);
    HttpResponse::Ok().json(report)
}

#[post("/reports/select")]
async fn select_best_parameters(body: web::Json<SelectRequest>) -> impl Responder {
    let req = body.into_inner();
    let best = find_best_parameters(&req.results, &req.criteria, req.forward_results.as_deref());

    HttpResponse::Ok().json(serde_json::json!({
        "count": best.len(),
        "results": best
    }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(upload_optimization_report)
        .service(upload_backtest_report)
        .service(select_best_parameters);
}
