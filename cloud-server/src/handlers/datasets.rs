//! Dataset handlers

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::{AppError, AppResult, AppState};
use crate::models::{ActiveDataset, DatasetChanged, DatasetList, SelectDataset};

pub async fn list() -> Json<DatasetList> {
    Json(DatasetList::catalogue())
}

/// Switch the active dataset
pub async fn select(
    State(state): State<AppState>,
    Json(req): Json<SelectDataset>,
) -> AppResult<Json<DatasetChanged>> {
    let dataset = ActiveDataset::from_catalogue(&req.name)
        .ok_or_else(|| AppError::NotFound(format!("Unknown dataset: {}", req.name)))?;

    state.store.set_dataset(dataset);
    Ok(Json(changed(&state)))
}

/// Replace the active dataset with an uploaded CSV (multipart field `file`)
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<DatasetChanged>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload.csv").to_string();
        let contents = field.bytes().await?;

        let dataset = ActiveDataset::from_upload(&file_name, &contents)
            .map_err(AppError::ValidationError)?;
        state.store.set_dataset(dataset);
        return Ok(Json(changed(&state)));
    }

    Err(AppError::BadRequest("Missing multipart field: file".to_string()))
}

fn changed(state: &AppState) -> DatasetChanged {
    DatasetChanged {
        ok: true,
        dataset: state.store.dataset().name,
        kpis: state.store.kpis(),
        nodes: state.store.nodes(),
    }
}
