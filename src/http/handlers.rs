//! Control surface handlers.
//!
//! Thin adapters between JSON bodies and [`ControlPlane`] / [`ProjectStore`]
//! calls. Response files are always addressed in the current project.
//!
//! [`ControlPlane`]: crate::control::ControlPlane
//! [`ProjectStore`]: crate::project::ProjectStore

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::control::{Ack, ConfigUpdate, RequestLog, StatusSnapshot};
use crate::http::error::ApiError;
use crate::http::relay::{RelayRequest, RelayResponse};
use crate::http::server::AppState;
use crate::project::ProjectInfo;
use crate::routing::MockResponse;

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub file: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveFile {
    pub filename: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct NewProject {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SwitchProject {
    pub project: String,
}

pub async fn get_status(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(state.plane.state().await)
}

pub async fn start(State(state): State<AppState>) -> Result<Json<Ack>, ApiError> {
    Ok(Json(state.plane.start().await?))
}

pub async fn stop(State(state): State<AppState>) -> Result<Json<Ack>, ApiError> {
    Ok(Json(state.plane.stop().await?))
}

pub async fn update_config(
    State(state): State<AppState>,
    body: Result<Json<ConfigUpdate>, JsonRejection>,
) -> Result<Json<Ack>, ApiError> {
    let Json(update) = body?;
    Ok(Json(state.plane.update_config(update).await))
}

pub async fn get_logs(State(state): State<AppState>) -> Json<Vec<RequestLog>> {
    Json(state.plane.recent_requests().await)
}

pub async fn send(
    State(state): State<AppState>,
    body: Result<Json<RelayRequest>, JsonRejection>,
) -> Result<Json<RelayResponse>, ApiError> {
    let Json(request) = body?;
    Ok(Json(state.relay.send(request).await?))
}

pub async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let project = state.plane.current_project().await;
    Ok(Json(state.plane.store().list_files(&project).await?))
}

/// The file's JSON as-is; text that is not JSON comes back as `text/plain`.
pub async fn read_json(
    State(state): State<AppState>,
    query: Result<Query<FileQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let project = state.plane.current_project().await;
    let text = state.plane.store().read_file(&project, &query.file).await?;

    let response = match serde_json::from_str(&text) {
        Ok(value) => MockResponse::Json(value),
        Err(_) => MockResponse::Raw(text.into_bytes()),
    };
    Ok(response.into_response())
}

pub async fn save_json(
    State(state): State<AppState>,
    body: Result<Json<SaveFile>, JsonRejection>,
) -> Result<Json<Ack>, ApiError> {
    let Json(save) = body?;
    let project = state.plane.current_project().await;
    state
        .plane
        .store()
        .save_file(&project, &save.filename, &save.content)
        .await?;
    Ok(Json(Ack::new("file saved")))
}

pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<ProjectInfo>>, ApiError> {
    Ok(Json(state.plane.store().list_projects().await?))
}

pub async fn create_project(
    State(state): State<AppState>,
    body: Result<Json<NewProject>, JsonRejection>,
) -> Result<Json<Ack>, ApiError> {
    let Json(project) = body?;
    state.plane.store().create_project(&project.name).await?;
    Ok(Json(Ack::new(format!("project {} created", project.name))))
}

pub async fn switch_project(
    State(state): State<AppState>,
    body: Result<Json<SwitchProject>, JsonRejection>,
) -> Result<Json<Ack>, ApiError> {
    let Json(switch) = body?;
    Ok(Json(state.plane.switch_project(&switch.project).await?))
}
