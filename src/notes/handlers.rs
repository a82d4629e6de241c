use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::bootstrap::AppState;
use crate::error::{AppError, AppResult};
use crate::metadata::is_valid_tx_hash;
use crate::middleware::wallet_auth::WalletAddress;
use crate::notes::models::Note;

// ========== REQUEST MODELS ==========

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    #[validate(length(min = 1, message = "noteId is required"))]
    pub note_id: String,
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub content: String,
    pub tx_hash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tx_hash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteNoteRequest {
    pub tx_hash: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct PinRequest {
    pub pinned: bool,
}

#[derive(Debug, Deserialize)]
pub struct StarRequest {
    pub starred: bool,
}

// ========== RESPONSE MODELS ==========

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub note: Note,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct NotesListResponse {
    pub notes: Vec<Note>,
    pub count: usize,
}

// ========== HANDLERS ==========

/// POST /api/notes
pub async fn create_note(
    State(state): State<AppState>,
    Extension(WalletAddress(wallet)): Extension<WalletAddress>,
    Json(request): Json<CreateNoteRequest>,
) -> AppResult<(StatusCode, Json<NoteResponse>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    validate_tx_hash(&request.tx_hash)?;

    let note = Note::new(
        request.note_id,
        request.title,
        request.content,
        wallet,
        &request.tx_hash,
    )?;
    let note = state.notes.create_note(note).await?;

    info!("Note created: {} ({})", note.note_id, request.tx_hash);

    Ok((
        StatusCode::CREATED,
        Json(NoteResponse {
            note,
            message: "Note created and recorded on blockchain".to_string(),
        }),
    ))
}

/// GET /api/notes
pub async fn get_all_notes(State(state): State<AppState>) -> Json<NotesListResponse> {
    let notes = state.notes.list_notes().await;
    let count = notes.len();
    Json(NotesListResponse { notes, count })
}

/// GET /api/notes/search?query=
pub async fn search_notes(
    State(state): State<AppState>,
    Extension(WalletAddress(wallet)): Extension<WalletAddress>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<NotesListResponse>> {
    if params.query.is_empty() {
        return Err(AppError::Validation("Search query required".to_string()));
    }
    let notes = state.notes.search_notes(&wallet, &params.query).await;
    let count = notes.len();
    Ok(Json(NotesListResponse { notes, count }))
}

/// GET /api/notes/archived
pub async fn get_archived_notes(State(state): State<AppState>) -> Json<NotesListResponse> {
    let notes = state.notes.list_archived().await;
    let count = notes.len();
    Json(NotesListResponse { notes, count })
}

/// GET /api/notes/:note_id
pub async fn get_note(
    State(state): State<AppState>,
    Extension(WalletAddress(wallet)): Extension<WalletAddress>,
    Path(note_id): Path<String>,
) -> AppResult<Json<Note>> {
    let note = state.notes.get_note(&note_id, &wallet).await?;
    Ok(Json(note))
}

/// PUT /api/notes/:note_id
pub async fn update_note(
    State(state): State<AppState>,
    Extension(WalletAddress(wallet)): Extension<WalletAddress>,
    Path(note_id): Path<String>,
    Json(request): Json<UpdateNoteRequest>,
) -> AppResult<Json<NoteResponse>> {
    validate_tx_hash(&request.tx_hash)?;

    let note = state
        .notes
        .update_note(
            &note_id,
            &wallet,
            request.title,
            request.content,
            &request.tx_hash,
        )
        .await?;

    info!("Note updated: {} ({})", note.note_id, request.tx_hash);

    Ok(Json(NoteResponse {
        note,
        message: "Note updated and recorded on blockchain".to_string(),
    }))
}

/// DELETE /api/notes/:note_id
pub async fn delete_note(
    State(state): State<AppState>,
    Extension(WalletAddress(wallet)): Extension<WalletAddress>,
    Path(note_id): Path<String>,
    Json(request): Json<DeleteNoteRequest>,
) -> AppResult<Json<NoteResponse>> {
    validate_tx_hash(&request.tx_hash)?;

    let note = state
        .notes
        .archive_note(&note_id, &wallet, &request.tx_hash)
        .await?;

    info!("Note archived: {} ({})", note.note_id, request.tx_hash);

    Ok(Json(NoteResponse {
        note,
        message: "Note deleted and recorded on blockchain".to_string(),
    }))
}

/// PATCH /api/notes/:note_id/pin — local metadata only, no mirror record
pub async fn set_pinned(
    State(state): State<AppState>,
    Extension(WalletAddress(wallet)): Extension<WalletAddress>,
    Path(note_id): Path<String>,
    Json(request): Json<PinRequest>,
) -> AppResult<Json<Note>> {
    let note = state
        .notes
        .set_pinned(&note_id, &wallet, request.pinned)
        .await?;
    Ok(Json(note))
}

/// PATCH /api/notes/:note_id/star — local metadata only, no mirror record
pub async fn set_starred(
    State(state): State<AppState>,
    Extension(WalletAddress(wallet)): Extension<WalletAddress>,
    Path(note_id): Path<String>,
    Json(request): Json<StarRequest>,
) -> AppResult<Json<Note>> {
    let note = state
        .notes
        .set_starred(&note_id, &wallet, request.starred)
        .await?;
    Ok(Json(note))
}

fn validate_tx_hash(tx_hash: &str) -> AppResult<()> {
    if !is_valid_tx_hash(tx_hash) {
        return Err(AppError::Validation(
            "Invalid transaction hash".to_string(),
        ));
    }
    Ok(())
}
