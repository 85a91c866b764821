//! Application state management

use crate::config::Config;
use crate::error::Result;
use crate::gallery::{FileStorage, GalleryStore, PhotoRecord, Rating};
use crate::intake::{run_intake, CancelFlag, IdAllocator, IntakeFailure, SelectedFile};
use crate::render::{render_gallery, GalleryView};
use crate::review::{ReviewPrompt, ReviewSession, ReviewStep};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Result of handing a new selection to the app
#[derive(Debug, Clone, Serialize)]
pub struct IntakeOutcome {
    /// First photo to rate, if anything survived compression
    pub prompt: Option<ReviewPrompt>,
    pub failures: Vec<IntakeFailure>,
    /// Superseded by a newer selection or closed before it finished
    pub cancelled: bool,
}

/// Full application state (in-memory).
/// Lock order: in_flight, then review, then gallery.
pub struct AppState {
    pub config: Mutex<Config>,
    pub gallery: Mutex<GalleryStore<FileStorage>>,
    pub review: Mutex<ReviewSession>,
    ids: IdAllocator,
    in_flight: Mutex<Option<CancelFlag>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AppState {
    pub fn new() -> Self {
        Self::with_config(Config::load())
    }

    pub fn with_config(config: Config) -> Self {
        let gallery = GalleryStore::load(FileStorage::new(config.storage_path()));
        let ids = IdAllocator::new(gallery.max_id());

        Self {
            config: Mutex::new(config),
            gallery: Mutex::new(gallery),
            review: Mutex::new(ReviewSession::new()),
            ids,
            in_flight: Mutex::new(None),
        }
    }

    /// Compress a selection and open the review on its first photo.
    /// Starting a new selection cancels the previous intake and review.
    pub async fn begin_intake(&self, selection: Vec<SelectedFile>) -> IntakeOutcome {
        let cancel = CancelFlag::new();
        {
            let mut in_flight = lock(&self.in_flight);
            if let Some(previous) = in_flight.replace(cancel.clone()) {
                previous.cancel();
            }
            lock(&self.review).cancel();
        }

        let settings = lock(&self.config).compression();
        let report = run_intake(selection, &self.ids, settings, cancel.clone()).await;

        // Still ours only if nobody cancelled or replaced us meanwhile
        let mut in_flight = lock(&self.in_flight);
        let mut review = lock(&self.review);
        let current = in_flight.as_ref().is_some_and(|c| c.same_as(&cancel));
        if report.cancelled || !current || cancel.is_cancelled() {
            return IntakeOutcome {
                prompt: None,
                failures: report.failures,
                cancelled: true,
            };
        }
        *in_flight = None;

        IntakeOutcome {
            prompt: review.start(report.queue),
            failures: report.failures,
            cancelled: false,
        }
    }

    pub fn review_prompt(&self) -> Option<ReviewPrompt> {
        lock(&self.review).current()
    }

    pub fn set_draft_rating(&self, rating: i64) -> Result<Option<ReviewPrompt>> {
        let rating = Rating::new(rating)?;
        let mut review = lock(&self.review);
        review.set_rating(rating);
        Ok(review.current())
    }

    pub fn set_draft_tags(&self, tag_input: &str) -> Option<ReviewPrompt> {
        let mut review = lock(&self.review);
        review.set_tag_input(tag_input);
        review.current()
    }

    pub fn confirm_rating(&self, rating: i64, tag_input: &str) -> Result<ReviewStep> {
        let mut review = lock(&self.review);
        let mut gallery = lock(&self.gallery);
        review.confirm(rating, tag_input, &mut *gallery)
    }

    /// Close the rating dialog; also stops an intake still compressing
    pub fn cancel_review(&self) {
        let mut in_flight = lock(&self.in_flight);
        if let Some(cancel) = in_flight.take() {
            cancel.cancel();
        }
        lock(&self.review).cancel();
    }

    pub fn gallery_view(&self) -> GalleryView {
        render_gallery(lock(&self.gallery).all())
    }

    pub fn photos(&self) -> Vec<PhotoRecord> {
        lock(&self.gallery).all().to_vec()
    }

    pub fn has_photo(&self, id: u64) -> bool {
        lock(&self.gallery).get(id).is_some()
    }

    /// Delete a photo once `confirm` agrees. Returns whether it was removed.
    pub fn delete_photo<F>(&self, id: u64, confirm: F) -> Result<bool>
    where
        F: FnOnce(&PhotoRecord) -> bool,
    {
        let removed = lock(&self.gallery).remove(id, confirm)?;
        Ok(removed.is_some())
    }

    /// Swap in a new config; a changed storage location reloads the gallery
    pub fn apply_config(&self, config: Config) {
        let mut current = lock(&self.config);
        if current.storage_path() != config.storage_path() {
            let gallery = GalleryStore::load(FileStorage::new(config.storage_path()));
            self.ids.bump_past(gallery.max_id());
            *lock(&self.gallery) = gallery;
        }
        *current = config;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
