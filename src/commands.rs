//! Tauri commands - Functions callable from JavaScript

use crate::config::Config;
use crate::intake::SelectedFile;
use crate::render::GalleryView;
use crate::review::{ReviewPrompt, ReviewStep};
use crate::state::{AppState, IntakeOutcome};
use std::path::PathBuf;
use tauri::{AppHandle, State};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

// ============================================================================
// Configuration commands
// ============================================================================

#[tauri::command]
pub fn get_config(state: State<AppState>) -> Config {
    state
        .config
        .lock()
        .map(|c| c.clone())
        .unwrap_or_default()
}

#[tauri::command]
pub fn save_config(config: Config, state: State<AppState>) -> Result<(), String> {
    config.save().map_err(|e| e.to_string())?;
    state.apply_config(config);
    Ok(())
}

// ============================================================================
// Gallery commands
// ============================================================================

#[tauri::command]
pub fn get_gallery(state: State<AppState>) -> GalleryView {
    state.gallery_view()
}

/// Asks before deleting; returns whether the photo was removed
#[tauri::command]
pub async fn delete_photo(
    id: u64,
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<bool, String> {
    if !state.has_photo(id) {
        return Ok(false);
    }

    // Ask without holding the gallery lock; the dialog runs on the main thread
    let confirmed = app
        .dialog()
        .message("Are you sure you want to delete this photo?")
        .title("Delete Photo")
        .kind(MessageDialogKind::Warning)
        .buttons(MessageDialogButtons::OkCancel)
        .blocking_show();

    state
        .delete_photo(id, |_| confirmed)
        .map_err(|e| e.to_string())
}

// ============================================================================
// Intake commands
// ============================================================================

/// Open the native picker and start reviewing whatever was chosen.
/// Returns `None` when the picker was dismissed.
#[tauri::command]
pub async fn add_photos(
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<Option<IntakeOutcome>, String> {
    let Some(picked) = app
        .dialog()
        .file()
        .add_filter("Images", IMAGE_EXTENSIONS)
        .blocking_pick_files()
    else {
        return Ok(None);
    };

    let mut selection = Vec::with_capacity(picked.len());
    for file in picked {
        let path = file.into_path().map_err(|e| e.to_string())?;
        selection.push(SelectedFile::Path(path));
    }

    Ok(Some(state.begin_intake(selection).await))
}

/// Start reviewing files given by path (drag and drop)
#[tauri::command]
pub async fn begin_intake(
    paths: Vec<String>,
    state: State<'_, AppState>,
) -> Result<IntakeOutcome, String> {
    let selection = paths
        .into_iter()
        .map(|p| SelectedFile::Path(PathBuf::from(p)))
        .collect();
    Ok(state.begin_intake(selection).await)
}

// ============================================================================
// Review commands
// ============================================================================

#[tauri::command]
pub fn get_review(state: State<AppState>) -> Option<ReviewPrompt> {
    state.review_prompt()
}

#[tauri::command]
pub fn set_draft_rating(rating: i64, state: State<AppState>) -> Result<Option<ReviewPrompt>, String> {
    state.set_draft_rating(rating).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn set_draft_tags(tags: String, state: State<AppState>) -> Option<ReviewPrompt> {
    state.set_draft_tags(&tags)
}

#[tauri::command]
pub fn confirm_rating(
    rating: i64,
    tags: String,
    state: State<AppState>,
) -> Result<ReviewStep, String> {
    state.confirm_rating(rating, &tags).map_err(|e| {
        log::error!("Could not save rating: {}", e);
        e.to_string()
    })
}

#[tauri::command]
pub fn cancel_review(state: State<AppState>) {
    state.cancel_review();
}
