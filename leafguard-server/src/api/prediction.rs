//! Disease prediction and catalog endpoints

use crate::api::auth::CurrentUser;
use crate::db::{prediction, settings};
use crate::error::{Error, Result};
use crate::ml::{Scored, MODEL_FILE};
use crate::server::AppContext;
use crate::storage::MediaStore;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::Engine;
use chrono::{DateTime, Utc};
use leafguard_common::db::models::PlantDisease;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

/// One ranked entry in the predict response
#[derive(Debug, Serialize)]
pub struct RankedPrediction {
    pub label: String,
    pub confidence: f64,
}

impl From<Scored> for RankedPrediction {
    fn from(scored: Scored) -> Self {
        Self {
            label: scored.label,
            confidence: scored.confidence as f64,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OfflineItem {
    pub image_data: Option<String>,
    pub disease_name: Option<String>,
    pub confidence: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ItemError {
    pub index: usize,
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateDiseaseRequest {
    pub class_name: String,
    pub scientific_name: Option<String>,
    pub description: Option<String>,
    pub symptoms: Option<String>,
    pub treatment: Option<String>,
    pub prevention: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub download: Option<bool>,
}

/// POST /prediction/predict (multipart, field `image`)
///
/// An unavailable model is a degraded state, not an error: the response
/// is 200 with an empty ranked list and nothing is persisted.
pub async fn predict(
    State(context): State<AppContext>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>> {
    let mut image: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(format!("invalid multipart payload: {}", e)))?
    {
        if field.name() == Some("image") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| Error::BadRequest(e.to_string()))?;
            image = Some(bytes.to_vec());
        }
    }

    let image = image.ok_or_else(|| Error::BadRequest("missing image field".to_string()))?;

    if !context.classifier.is_loaded() {
        warn!("Prediction requested but no model is loaded");
        return Ok(Json(json!({
            "model_status": "not_loaded",
            "predictions": [],
            "prediction": null,
        })));
    }

    let k = settings::get_i64(&context.db_pool, "prediction_top_k", 3).await? as usize;
    let ranked = context.classifier.predict_top_k(&image, k)?;
    let top = ranked
        .first()
        .cloned()
        .ok_or_else(|| Error::Inference("no predictions returned".to_string()))?;

    let disease = prediction::get_or_create_disease(&context.db_pool, &top.label).await?;
    let relative = context.media.save_prediction_image(&image, false)?;

    let record = match prediction::create_prediction(
        &context.db_pool,
        &user.guid,
        &disease.guid,
        &relative,
        top.confidence as f64,
        false,
        None,
    )
    .await
    {
        Ok(record) => record,
        Err(e) => {
            context.media.remove(&relative);
            return Err(e);
        }
    };

    info!(
        "User {} predicted {} ({:.3})",
        user.username, top.label, top.confidence
    );

    let ranked: Vec<RankedPrediction> = ranked.into_iter().map(Into::into).collect();
    Ok(Json(json!({
        "model_status": "loaded",
        "predictions": ranked,
        "prediction": record,
        "image_url": MediaStore::url_for(&relative),
    })))
}

/// POST /prediction/predictions/sync_offline
///
/// Batch upload of predictions made while disconnected. Items are
/// processed independently; one bad item never fails the batch.
pub async fn sync_offline(
    State(context): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Json(items): Json<Vec<OfflineItem>>,
) -> Result<Json<serde_json::Value>> {
    let mut synced = Vec::new();
    let mut errors = Vec::new();

    for (index, item) in items.into_iter().enumerate() {
        match sync_one(&context, &user.guid, item).await {
            Ok(record) => synced.push(record),
            Err(e) => errors.push(ItemError {
                index,
                error: e.to_string(),
            }),
        }
    }

    info!(
        "Offline sync for {}: {} synced, {} failed",
        user.username,
        synced.len(),
        errors.len()
    );

    Ok(Json(json!({
        "synced": synced.len(),
        "failed": errors.len(),
        "predictions": synced,
        "errors": errors,
    })))
}

async fn sync_one(
    context: &AppContext,
    user_guid: &str,
    item: OfflineItem,
) -> Result<prediction::PredictionRecord> {
    let image_data = item
        .image_data
        .ok_or_else(|| Error::BadRequest("missing image_data".to_string()))?;
    let disease_name = item
        .disease_name
        .ok_or_else(|| Error::BadRequest("missing disease_name".to_string()))?;
    let confidence = item
        .confidence
        .ok_or_else(|| Error::BadRequest("missing confidence".to_string()))?;

    if !(0.0..=1.0).contains(&confidence) {
        return Err(Error::BadRequest(format!(
            "confidence {} outside [0, 1]",
            confidence
        )));
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(image_data.trim())
        .map_err(|e| Error::BadRequest(format!("invalid base64 image_data: {}", e)))?;

    let disease = prediction::get_or_create_disease(&context.db_pool, &disease_name).await?;
    let relative = context.media.save_prediction_image(&bytes, true)?;

    match prediction::create_prediction(
        &context.db_pool,
        user_guid,
        &disease.guid,
        &relative,
        confidence,
        true,
        item.timestamp,
    )
    .await
    {
        Ok(record) => Ok(record),
        Err(e) => {
            context.media.remove(&relative);
            Err(e)
        }
    }
}

/// GET /prediction/predictions
pub async fn list_predictions(
    State(context): State<AppContext>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<prediction::PredictionRecord>>> {
    let records = prediction::user_predictions(&context.db_pool, &user.guid, None).await?;
    Ok(Json(records))
}

/// GET /prediction/predictions/recent
pub async fn recent_predictions(
    State(context): State<AppContext>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<prediction::PredictionRecord>>> {
    let limit = settings::get_i64(&context.db_pool, "recent_predictions_limit", 5).await?;
    let records = prediction::user_predictions(&context.db_pool, &user.guid, Some(limit)).await?;
    Ok(Json(records))
}

/// GET /prediction/diseases
pub async fn list_diseases(
    State(context): State<AppContext>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<PlantDisease>>> {
    Ok(Json(prediction::list_diseases(&context.db_pool).await?))
}

/// GET /prediction/diseases/{guid}
pub async fn get_disease(
    State(context): State<AppContext>,
    CurrentUser(_user): CurrentUser,
    Path(guid): Path<String>,
) -> Result<Json<PlantDisease>> {
    let disease = prediction::get_disease(&context.db_pool, &guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("no disease {}", guid)))?;

    Ok(Json(disease))
}

/// POST /prediction/diseases
pub async fn create_disease(
    State(context): State<AppContext>,
    CurrentUser(_user): CurrentUser,
    Json(request): Json<CreateDiseaseRequest>,
) -> Result<(StatusCode, Json<PlantDisease>)> {
    let class_name = request.class_name.trim();
    if class_name.is_empty() {
        return Err(Error::BadRequest("class_name must not be empty".to_string()));
    }

    let disease = prediction::upsert_disease(
        &context.db_pool,
        class_name,
        request.scientific_name.as_deref(),
        request.description.as_deref().unwrap_or(""),
        request.symptoms.as_deref().unwrap_or(""),
        request.treatment.as_deref().unwrap_or(""),
        request.prevention.as_deref().unwrap_or(""),
        request.image_url.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(disease)))
}

/// GET /prediction/diseases/common
pub async fn common_diseases(
    State(context): State<AppContext>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<prediction::DiseaseFrequency>>> {
    let limit = settings::get_i64(&context.db_pool, "common_diseases_limit", 10).await?;
    Ok(Json(prediction::common_diseases(&context.db_pool, limit).await?))
}

/// GET /prediction/model-info
pub async fn model_info(
    State(context): State<AppContext>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<serde_json::Value>> {
    let info = context.classifier.info();
    let file = model_file_details(&context)?;

    Ok(Json(json!({
        "status": info.status,
        "classes": info.classes,
        "image_size": info.image_size,
        "model_version": info.model_version,
        "model_file": file,
    })))
}

/// GET /prediction/export-model[?download=true]
///
/// Ships the exported model to clients that run inference on-device.
pub async fn export_model(
    State(context): State<AppContext>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<ExportQuery>,
) -> Result<Response> {
    let model_path = context.classifier.model_path();
    if !model_path.exists() {
        return Err(Error::NotFound("no exported model available".to_string()));
    }

    if query.download.unwrap_or(false) {
        let bytes = tokio::fs::read(model_path).await?;
        let headers = [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", MODEL_FILE),
            ),
        ];
        return Ok((headers, bytes).into_response());
    }

    let info = context.classifier.info();
    let file = model_file_details(&context)?;

    Ok(Json(json!({
        "file_name": MODEL_FILE,
        "model_version": info.model_version,
        "image_size": info.image_size,
        "classes": info.classes,
        "model_file": file,
        "download_url": "/prediction/export-model?download=true",
    }))
    .into_response())
}

/// Size (MB, 2 decimals) and mtime of the model file, or JSON null when
/// it is absent
fn model_file_details(context: &AppContext) -> Result<serde_json::Value> {
    let model_path = context.classifier.model_path();
    if !model_path.exists() {
        return Ok(serde_json::Value::Null);
    }

    let metadata = std::fs::metadata(model_path)?;
    let size_mb = (metadata.len() as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0;
    let modified_at = metadata
        .modified()
        .ok()
        .map(|t| DateTime::<Utc>::from(t).to_rfc3339());

    Ok(json!({
        "size_mb": size_mb,
        "modified_at": modified_at,
    }))
}
