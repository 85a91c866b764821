//! Gallery view model - what the surface draws for the current gallery

use crate::gallery::PhotoRecord;
use serde::Serialize;

pub const EMPTY_GALLERY_MESSAGE: &str = "No photos yet! Add your first photo of Orion.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CutenessLabel {
    pub label: &'static str,
    pub emoji: &'static str,
    /// CSS class of the rating badge
    pub bucket: &'static str,
}

/// Five-level label for a rating. Anything below 1 counts as lumpy and
/// anything above 10 as maximum cuteness.
pub fn cuteness_label(rating: i64) -> CutenessLabel {
    let (label, emoji, bucket) = match rating {
        i64::MIN..=3 => ("Very Lumpy", "😴", "lumpy"),
        4..=5 => ("Kinda Lumpy", "😐", "medium-lumpy"),
        6..=7 => ("Getting Cute", "😊", "medium-cute"),
        8..=9 => ("Very Cute", "😸", "cute"),
        _ => ("Maximum Cuteness", "😻", "super-cute"),
    };
    CutenessLabel { label, emoji, bucket }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoCard {
    pub id: u64,
    pub src: String,
    pub rating: u8,
    pub label: CutenessLabel,
    /// e.g. "😸 Very Cute (8/10)"
    pub badge: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GalleryView {
    Empty { message: &'static str },
    Cards { cards: Vec<PhotoCard> },
}

pub fn render_card(photo: &PhotoRecord) -> PhotoCard {
    let rating = photo.rating.value();
    let label = cuteness_label(rating as i64);
    PhotoCard {
        id: photo.id,
        src: photo.src.clone(),
        rating,
        label,
        badge: format!("{} {} ({}/10)", label.emoji, label.label, rating),
        tags: photo.tags.clone(),
    }
}

pub fn render_gallery(photos: &[PhotoRecord]) -> GalleryView {
    if photos.is_empty() {
        return GalleryView::Empty {
            message: EMPTY_GALLERY_MESSAGE,
        };
    }

    GalleryView::Cards {
        cards: photos.iter().map(render_card).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::Rating;

    #[test]
    fn test_cuteness_label_table() {
        let expected = [
            (1, "Very Lumpy", "lumpy"),
            (2, "Very Lumpy", "lumpy"),
            (3, "Very Lumpy", "lumpy"),
            (4, "Kinda Lumpy", "medium-lumpy"),
            (5, "Kinda Lumpy", "medium-lumpy"),
            (6, "Getting Cute", "medium-cute"),
            (7, "Getting Cute", "medium-cute"),
            (8, "Very Cute", "cute"),
            (9, "Very Cute", "cute"),
            (10, "Maximum Cuteness", "super-cute"),
        ];
        for (rating, label, bucket) in expected {
            let got = cuteness_label(rating);
            assert_eq!((got.label, got.bucket), (label, bucket), "rating {}", rating);
        }
    }

    #[test]
    fn test_cuteness_label_out_of_range() {
        assert_eq!(cuteness_label(0).bucket, "lumpy");
        assert_eq!(cuteness_label(11).bucket, "super-cute");
    }

    #[test]
    fn test_empty_gallery_renders_placeholder() {
        assert_eq!(
            render_gallery(&[]),
            GalleryView::Empty {
                message: EMPTY_GALLERY_MESSAGE
            }
        );
    }

    #[test]
    fn test_cards_follow_gallery_order() {
        let photos = vec![
            PhotoRecord {
                id: 2,
                src: "data:b".to_string(),
                rating: Rating::new(8).unwrap(),
                tags: vec!["zoomies".to_string()],
            },
            PhotoRecord {
                id: 1,
                src: "data:a".to_string(),
                rating: Rating::new(10).unwrap(),
                tags: vec![],
            },
        ];

        let GalleryView::Cards { cards } = render_gallery(&photos) else {
            panic!("expected cards");
        };
        assert_eq!(cards.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(cards[0].badge, "😸 Very Cute (8/10)");
        assert_eq!(cards[0].tags, vec!["zoomies"]);
        assert_eq!(cards[1].label.bucket, "super-cute");
        assert_eq!(cards[1].badge, "😻 Maximum Cuteness (10/10)");
    }
}
