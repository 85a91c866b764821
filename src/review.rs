//! Review session - shows queued photos one at a time and collects ratings

use crate::error::Result;
use crate::gallery::{parse_tags, GalleryStore, PhotoRecord, Rating, Storage, DEFAULT_RATING};
use crate::intake::QueuedPhoto;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReviewState {
    Idle,
    Showing { index: usize },
    Closed,
}

/// What the rating dialog displays for the current photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewPrompt {
    pub photo: QueuedPhoto,
    pub index: usize,
    pub total: usize,
    pub title: String,
    pub rating: u8,
    pub tag_input: String,
}

/// Outcome of confirming a rating
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ReviewStep {
    Next { prompt: ReviewPrompt },
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Draft {
    rating: u8,
    tag_input: String,
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            rating: DEFAULT_RATING,
            tag_input: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReviewSession {
    state: ReviewState,
    queue: Vec<QueuedPhoto>,
    draft: Draft,
}

impl Default for ReviewSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewSession {
    pub fn new() -> Self {
        Self {
            state: ReviewState::Idle,
            queue: Vec::new(),
            draft: Draft::default(),
        }
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn is_showing(&self) -> bool {
        matches!(self.state, ReviewState::Showing { .. })
    }

    /// Photos still waiting in the current session, including the shown one
    pub fn remaining(&self) -> usize {
        match self.state {
            ReviewState::Showing { index } => self.queue.len() - index,
            _ => 0,
        }
    }

    /// Begin reviewing a fresh queue. Any previous session is discarded.
    /// An empty queue leaves the session idle.
    pub fn start(&mut self, queue: Vec<QueuedPhoto>) -> Option<ReviewPrompt> {
        self.draft = Draft::default();
        if queue.is_empty() {
            self.queue.clear();
            self.state = ReviewState::Idle;
            return None;
        }

        self.queue = queue;
        self.state = ReviewState::Showing { index: 0 };
        self.current()
    }

    pub fn current(&self) -> Option<ReviewPrompt> {
        let ReviewState::Showing { index } = self.state else {
            return None;
        };
        let photo = self.queue.get(index)?.clone();
        let total = self.queue.len();

        let title = if total > 1 {
            format!("Rate This Photo ({} of {})", index + 1, total)
        } else {
            "Rate This Photo".to_string()
        };

        Some(ReviewPrompt {
            photo,
            index,
            total,
            title,
            rating: self.draft.rating,
            tag_input: self.draft.tag_input.clone(),
        })
    }

    /// Move the slider. Ignored while nothing is shown.
    pub fn set_rating(&mut self, rating: Rating) {
        if self.is_showing() {
            self.draft.rating = rating.value();
        }
    }

    pub fn set_tag_input(&mut self, input: &str) {
        if self.is_showing() {
            self.draft.tag_input = input.to_string();
        }
    }

    /// Confirm the draft currently held by the session
    pub fn confirm_draft<S: Storage>(&mut self, store: &mut GalleryStore<S>) -> Result<ReviewStep> {
        let rating = self.draft.rating as i64;
        let tag_input = self.draft.tag_input.clone();
        self.confirm(rating, &tag_input, store)
    }

    /// Rate the shown photo, store it and move on. When the store fails to
    /// persist, the session stays on the same photo.
    pub fn confirm<S: Storage>(
        &mut self,
        rating: i64,
        tag_input: &str,
        store: &mut GalleryStore<S>,
    ) -> Result<ReviewStep> {
        let ReviewState::Showing { index } = self.state else {
            self.close();
            return Ok(ReviewStep::Closed);
        };
        let rating = Rating::new(rating)?;

        let Some(photo) = self.queue.get(index) else {
            self.close();
            return Ok(ReviewStep::Closed);
        };

        store.append(PhotoRecord {
            id: photo.id,
            src: photo.src.clone(),
            rating,
            tags: parse_tags(tag_input),
        })?;

        let next = index + 1;
        if next < self.queue.len() {
            self.state = ReviewState::Showing { index: next };
            self.draft = Draft::default();
            match self.current() {
                Some(prompt) => Ok(ReviewStep::Next { prompt }),
                None => {
                    self.close();
                    Ok(ReviewStep::Closed)
                }
            }
        } else {
            self.close();
            Ok(ReviewStep::Closed)
        }
    }

    /// Close the dialog, dropping any photos not yet rated
    pub fn cancel(&mut self) {
        if self.is_showing() {
            log::info!("Review cancelled with {} photos unrated", self.remaining());
        }
        self.close();
    }

    fn close(&mut self) {
        self.state = ReviewState::Closed;
        self.queue.clear();
        self.draft = Draft::default();
    }
}
