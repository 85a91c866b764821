//! Orion Gallery - Photo Cuteness Rating Application

pub mod compressor;
pub mod config;
pub mod error;
pub mod gallery;
pub mod intake;
pub mod logging;
pub mod render;
pub mod review;
pub mod state;

#[cfg(feature = "desktop")]
pub mod commands;

#[cfg(feature = "desktop")]
use state::AppState;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    if let Err(e) = logging::init_logging(&config::Config::log_dir(), log::LevelFilter::Info) {
        eprintln!("Warning: Could not initialize logging: {}", e);
    }

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .manage(AppState::new())
        .invoke_handler(tauri::generate_handler![
            // Config
            commands::get_config,
            commands::save_config,
            // Gallery
            commands::get_gallery,
            commands::delete_photo,
            // Intake
            commands::add_photos,
            commands::begin_intake,
            // Review
            commands::get_review,
            commands::set_draft_rating,
            commands::set_draft_tags,
            commands::confirm_rating,
            commands::cancel_review,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
