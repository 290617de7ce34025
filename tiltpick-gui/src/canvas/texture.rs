//! Texture generation for slice display.

use egui::ColorImage;
use ndarray::ArrayView2;

use super::Colormap;

/// Maps `value` into [0, 1] between the contrast limits.
///
/// Values outside the limits saturate; non-finite values and a collapsed
/// range map to 0.
fn scale(value: f32, (lo, hi): (f32, f32)) -> f32 {
    let span = hi - lo;
    if !value.is_finite() || !span.is_finite() || span <= 0.0 {
        return if value.is_finite() && span == 0.0 && value > lo {
            1.0
        } else {
            0.0
        };
    }
    ((value - lo) / span).clamp(0.0, 1.0)
}

/// Render a 2-D plane (rows first) with the given contrast limits.
#[must_use]
pub fn generate_plane_image(
    plane: ArrayView2<'_, f32>,
    contrast_limits: (f32, f32),
    colormap: Colormap,
) -> ColorImage {
    let (height, width) = plane.dim();
    let mut pixels = Vec::with_capacity(width * height * 4);
    for &value in &plane {
        pixels.extend_from_slice(&colormap.apply(scale(value, contrast_limits)));
    }
    ColorImage::from_rgba_unmultiplied([width, height], &pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_scale_saturates() {
        assert_eq!(scale(-5.0, (-2.0, 2.0)), 0.0);
        assert_eq!(scale(0.0, (-2.0, 2.0)), 0.5);
        assert_eq!(scale(9.0, (-2.0, 2.0)), 1.0);
        assert_eq!(scale(f32::NAN, (-2.0, 2.0)), 0.0);
        assert_eq!(scale(3.0, (1.0, 1.0)), 1.0);
    }

    #[test]
    fn test_generate_plane_image_layout() {
        let plane = array![[-2.0f32, 2.0, 0.0], [2.0, -2.0, 0.0]];
        let image = generate_plane_image(plane.view(), (-2.0, 2.0), Colormap::Grayscale);
        assert_eq!(image.size, [3, 2]);
        assert_eq!(image.pixels[0], egui::Color32::from_rgb(0, 0, 0));
        assert_eq!(image.pixels[1], egui::Color32::from_rgb(255, 255, 255));
        assert_eq!(image.pixels[3], egui::Color32::from_rgb(255, 255, 255));
    }
}
