//! Intake - compress a batch of selected files into an ordered review queue

use crate::compressor::{decode, downscale, encode_data_url, CompressedImage, CompressionSettings};
use crate::error::{GalleryError, Result};
use crate::gallery::MAX_PHOTO_ID;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinSet;

/// One file picked by the user
#[derive(Debug, Clone)]
pub enum SelectedFile {
    Path(PathBuf),
    Bytes { name: String, bytes: Vec<u8> },
}

impl SelectedFile {
    pub fn name(&self) -> String {
        match self {
            Self::Path(path) => path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| path.to_string_lossy().to_string()),
            Self::Bytes { name, .. } => name.clone(),
        }
    }

    async fn read(self) -> Result<Vec<u8>> {
        match self {
            Self::Path(path) => Ok(tokio::fs::read(&path).await?),
            Self::Bytes { bytes, .. } => Ok(bytes),
        }
    }
}

/// A compressed photo waiting to be rated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueuedPhoto {
    pub id: u64,
    pub src: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntakeFailure {
    /// Position in the original selection
    pub index: usize,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntakeReport {
    /// Successfully compressed photos, in selection order
    pub queue: Vec<QueuedPhoto>,
    pub failures: Vec<IntakeFailure>,
    pub cancelled: bool,
}

/// Shared flag that stops an in-flight intake
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn same_as(&self, other: &CancelFlag) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(GalleryError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Hands out photo ids: millisecond timestamps, bumped past anything
/// already issued so ids stay unique across batches.
#[derive(Debug, Default)]
pub struct IdAllocator {
    last_issued: Mutex<Option<u64>>,
}

impl IdAllocator {
    /// `highest_existing` is the largest id already in the gallery
    pub fn new(highest_existing: Option<u64>) -> Self {
        Self {
            last_issued: Mutex::new(highest_existing),
        }
    }

    /// Reserve `count` consecutive ids and return the first. Fails once
    /// the block would run past `MAX_PHOTO_ID`.
    pub fn reserve(&self, count: usize) -> Result<u64> {
        self.reserve_at(count, now_millis())
    }

    /// Make sure future ids land above `highest`
    pub fn bump_past(&self, highest: Option<u64>) {
        let Some(highest) = highest else {
            return;
        };
        let mut last = self
            .last_issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if last.map_or(true, |issued| issued < highest) {
            *last = Some(highest);
        }
    }

    fn reserve_at(&self, count: usize, now: u64) -> Result<u64> {
        let mut last = self
            .last_issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let base = match *last {
            Some(issued) => issued.checked_add(1).map(|next| now.max(next)),
            None => Some(now),
        };
        let end = base.and_then(|b| b.checked_add((count as u64).saturating_sub(1)));
        let (Some(base), Some(end)) = (base, end) else {
            return Err(GalleryError::IdsExhausted);
        };
        if end > MAX_PHOTO_ID {
            return Err(GalleryError::IdsExhausted);
        }

        if count > 0 {
            *last = Some(end);
        }
        Ok(base)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Compress every selected file concurrently and return the review queue
/// once all of them have finished. Files that fail are reported and left
/// out; the rest keep their selection order.
pub async fn run_intake(
    selection: Vec<SelectedFile>,
    ids: &IdAllocator,
    settings: CompressionSettings,
    cancel: CancelFlag,
) -> IntakeReport {
    if selection.is_empty() {
        return IntakeReport::default();
    }

    let names: Vec<String> = selection.iter().map(SelectedFile::name).collect();
    let base_id = match ids.reserve(selection.len()) {
        Ok(base) => base,
        Err(e) => {
            log::error!("Cannot take in {} files: {}", names.len(), e);
            return IntakeReport {
                failures: names
                    .into_iter()
                    .enumerate()
                    .map(|(index, name)| IntakeFailure {
                        index,
                        name,
                        reason: e.to_string(),
                    })
                    .collect(),
                ..IntakeReport::default()
            };
        }
    };
    log::info!("Starting intake of {} files", selection.len());

    let mut tasks = JoinSet::new();
    for (index, file) in selection.into_iter().enumerate() {
        let cancel = cancel.clone();
        tasks.spawn(async move { (index, compress_selected(file, settings, cancel).await) });
    }

    let mut completed = Vec::with_capacity(names.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => completed.push(result),
            Err(e) => log::error!("Compression task failed: {}", e),
        }
    }

    let report = assemble(base_id, &names, completed, cancel.is_cancelled());
    log::info!(
        "Intake finished: {} queued, {} failed{}",
        report.queue.len(),
        report.failures.len(),
        if report.cancelled { ", cancelled" } else { "" }
    );
    report
}

async fn compress_selected(
    file: SelectedFile,
    settings: CompressionSettings,
    cancel: CancelFlag,
) -> Result<CompressedImage> {
    cancel.check()?;
    let bytes = file.read().await?;
    cancel.check()?;

    tokio::task::spawn_blocking(move || {
        let img = decode(&bytes)?;
        cancel.check()?;
        let img = downscale(img, settings.max_dimension);
        cancel.check()?;
        encode_data_url(&img, settings.quality)
    })
    .await
    .map_err(|e| GalleryError::Encode(format!("compression worker stopped: {}", e)))?
}

/// Slot results back into selection order; `completed` is in completion order.
fn assemble(
    base_id: u64,
    names: &[String],
    completed: Vec<(usize, Result<CompressedImage>)>,
    cancelled: bool,
) -> IntakeReport {
    if cancelled {
        return IntakeReport {
            cancelled: true,
            ..IntakeReport::default()
        };
    }

    let mut slots: Vec<Option<Result<CompressedImage>>> = names.iter().map(|_| None).collect();
    for (index, outcome) in completed {
        if let Some(slot) = slots.get_mut(index) {
            *slot = Some(outcome);
        }
    }

    let mut report = IntakeReport::default();
    for (index, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(Ok(image)) => report.queue.push(QueuedPhoto {
                id: base_id + index as u64,
                src: image.data_url,
            }),
            Some(Err(e)) => {
                log::warn!("Skipping {}: {}", names[index], e);
                report.failures.push(IntakeFailure {
                    index,
                    name: names[index].clone(),
                    reason: e.to_string(),
                });
            }
            None => report.failures.push(IntakeFailure {
                index,
                name: names[index].clone(),
                reason: "compression did not finish".to_string(),
            }),
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compressor::decode_data_url;
    use crate::compressor::tests::png_bytes;
    use image::GenericImageView;

    fn bytes_file(name: &str, width: u32, height: u32) -> SelectedFile {
        SelectedFile::Bytes {
            name: name.to_string(),
            bytes: png_bytes(width, height),
        }
    }

    fn fake_image(tag: &str) -> CompressedImage {
        CompressedImage {
            data_url: format!("data:image/jpeg;base64,{}", tag),
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn test_assemble_restores_selection_order() {
        let names: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let completed = vec![
            (2, Ok(fake_image("c"))),
            (0, Ok(fake_image("a"))),
            (1, Ok(fake_image("b"))),
        ];

        let report = assemble(100, &names, completed, false);
        assert_eq!(
            report.queue,
            vec![
                QueuedPhoto { id: 100, src: "data:image/jpeg;base64,a".to_string() },
                QueuedPhoto { id: 101, src: "data:image/jpeg;base64,b".to_string() },
                QueuedPhoto { id: 102, src: "data:image/jpeg;base64,c".to_string() },
            ]
        );
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_assemble_reports_missing_results() {
        let names: Vec<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let report = assemble(1, &names, vec![(1, Ok(fake_image("b")))], false);
        assert_eq!(report.queue.len(), 1);
        assert_eq!(report.queue[0].id, 2);
        assert_eq!(report.failures[0].index, 0);
    }

    #[test]
    fn test_id_allocator_never_repeats() {
        let ids = IdAllocator::new(None);
        assert_eq!(ids.reserve_at(3, 1_000).unwrap(), 1_000);
        // Same millisecond: continue after the last issued id
        assert_eq!(ids.reserve_at(2, 1_000).unwrap(), 1_003);
        // Clock moved on
        assert_eq!(ids.reserve_at(1, 5_000).unwrap(), 5_000);
        // Clock went backwards
        assert_eq!(ids.reserve_at(1, 10).unwrap(), 5_001);
    }

    #[test]
    fn test_id_allocator_starts_past_existing_gallery() {
        let ids = IdAllocator::new(Some(9_999));
        assert_eq!(ids.reserve_at(1, 1_000).unwrap(), 10_000);

        ids.bump_past(Some(20_000));
        assert_eq!(ids.reserve_at(1, 1_000).unwrap(), 20_001);
        ids.bump_past(Some(5));
        assert_eq!(ids.reserve_at(1, 1_000).unwrap(), 20_002);
    }

    #[test]
    fn test_id_allocator_refuses_to_overflow() {
        let ids = IdAllocator::new(Some(u64::MAX));
        assert!(matches!(ids.reserve_at(1, 1_000), Err(GalleryError::IdsExhausted)));

        let ids = IdAllocator::new(Some(MAX_PHOTO_ID - 2));
        assert!(matches!(ids.reserve_at(3, 1_000), Err(GalleryError::IdsExhausted)));
        // A failed reservation leaves the allocator usable for smaller blocks
        assert_eq!(ids.reserve_at(2, 1_000).unwrap(), MAX_PHOTO_ID - 1);
        assert!(ids.reserve_at(1, 1_000).is_err());
    }

    #[tokio::test]
    async fn test_exhausted_ids_fail_every_file() {
        let ids = IdAllocator::new(Some(MAX_PHOTO_ID));
        let report = run_intake(
            vec![bytes_file("a.png", 10, 10), bytes_file("b.png", 10, 10)],
            &ids,
            CompressionSettings::default(),
            CancelFlag::new(),
        )
        .await;

        assert!(report.queue.is_empty());
        assert_eq!(
            report.failures.iter().map(|f| f.index).collect::<Vec<_>>(),
            vec![0, 1]
        );
    }

    #[tokio::test]
    async fn test_intake_keeps_selection_order() {
        let selection = vec![
            bytes_file("big.png", 1600, 1200),
            bytes_file("small.png", 40, 30),
            bytes_file("medium.png", 500, 900),
        ];

        let ids = IdAllocator::new(None);
        let report = run_intake(selection, &ids, CompressionSettings::default(), CancelFlag::new()).await;

        assert!(!report.cancelled);
        assert!(report.failures.is_empty());
        assert_eq!(report.queue.len(), 3);

        let dims: Vec<_> = report
            .queue
            .iter()
            .map(|q| decode_data_url(&q.src).unwrap().dimensions())
            .collect();
        assert_eq!(dims, vec![(800, 600), (40, 30), (444, 800)]);

        let first = report.queue[0].id;
        let queued_ids: Vec<_> = report.queue.iter().map(|q| q.id).collect();
        assert_eq!(queued_ids, vec![first, first + 1, first + 2]);
    }

    #[tokio::test]
    async fn test_intake_skips_failed_items() {
        let selection = vec![
            bytes_file("one.png", 20, 20),
            SelectedFile::Bytes {
                name: "notes.txt".to_string(),
                bytes: b"not an image".to_vec(),
            },
            SelectedFile::Path(PathBuf::from("/definitely/missing/orion.jpg")),
            bytes_file("four.png", 30, 10),
        ];

        let ids = IdAllocator::new(None);
        let report = run_intake(selection, &ids, CompressionSettings::default(), CancelFlag::new()).await;

        assert_eq!(report.queue.len(), 2);
        assert_eq!(report.queue[1].id, report.queue[0].id + 3);
        assert_eq!(
            report.failures.iter().map(|f| (f.index, f.name.as_str())).collect::<Vec<_>>(),
            vec![(1, "notes.txt"), (2, "orion.jpg")]
        );
    }

    #[tokio::test]
    async fn test_cancelled_intake_yields_nothing() {
        let cancel = CancelFlag::new();
        cancel.cancel();

        let ids = IdAllocator::new(None);
        let report = run_intake(
            vec![bytes_file("a.png", 10, 10)],
            &ids,
            CompressionSettings::default(),
            cancel,
        )
        .await;

        assert!(report.cancelled);
        assert!(report.queue.is_empty());
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn test_empty_selection() {
        let ids = IdAllocator::new(None);
        let report = run_intake(Vec::new(), &ids, CompressionSettings::default(), CancelFlag::new()).await;
        assert_eq!(report, IntakeReport::default());
    }
}
