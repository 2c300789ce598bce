use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::StatusCategory;

// ---------------------------------------------------------------------------
// Status colours
// ---------------------------------------------------------------------------

fn hsl(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Traffic-light colour for a status: red through green, grey when unknown.
pub fn status_color(status: StatusCategory) -> Color32 {
    match status {
        StatusCategory::Expired => hsl(0.0, 0.75, 0.55),
        StatusCategory::NearExpiry => hsl(28.0, 0.85, 0.55),
        StatusCategory::RenewSoon => hsl(48.0, 0.85, 0.50),
        StatusCategory::Normal => hsl(130.0, 0.55, 0.45),
        StatusCategory::Unspecified => hsl(0.0, 0.0, 0.60),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unspecified_is_grey() {
        let c = status_color(StatusCategory::Unspecified);
        assert_eq!(c.r(), c.g());
        assert_eq!(c.g(), c.b());
    }

    #[test]
    fn categories_are_distinct() {
        for (i, a) in StatusCategory::ALL.iter().enumerate() {
            for b in &StatusCategory::ALL[i + 1..] {
                assert_ne!(status_color(*a), status_color(*b));
            }
        }
    }

    #[test]
    fn expired_is_reddest() {
        let c = status_color(StatusCategory::Expired);
        assert!(c.r() > c.g() && c.r() > c.b());
    }
}
