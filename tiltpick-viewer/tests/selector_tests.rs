#![allow(clippy::cast_precision_loss, clippy::uninlined_format_args)]
use approx::assert_abs_diff_eq;
use ndarray::Array3;
use std::fmt::Write as _;
use std::path::PathBuf;
use tempfile::TempDir;
use tiltpick_core::{LowConfidencePolicy, MatchConfig};
use tiltpick_io::write_mrc;
use tiltpick_viewer::{Error, HeadlessViewer, LayerData, Selector};

struct Fixture {
    dir: TempDir,
    mdoc: PathBuf,
    images: Vec<PathBuf>,
}

// Tilt series with acquisition order 0, +3, -3, +6, -6; image k is filled
// with ramps scaled by its angle so slices can be told apart.
fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let angles = [0.0f32, 3.0, -3.0, 6.0, -6.0];

    let mut text = String::from("PixelSpacing = 2.7\nImageFile = TS_03.mrc\n\n");
    let mut images = Vec::new();
    for (i, angle) in angles.iter().enumerate() {
        let stem = format!("TS_03_{:03}_{:.1}", i, angle);
        write!(
            text,
            "[ZValue = {i}]\nTiltAngle = {angle}\nSubFramePath = D:\\Frames\\{stem}.eer\n\n"
        )
        .unwrap();

        let path = dir.path().join(format!("{stem}.mrc"));
        let image = Array3::from_shape_fn((1, 4, 6), |(_, y, x)| {
            angle * 10.0 + (y * 6 + x) as f32
        });
        write_mrc(&path, &image).unwrap();
        images.push(path);
    }

    let mdoc = dir.path().join("TS_03.mrc.mdoc");
    std::fs::write(&mdoc, text).unwrap();
    Fixture { dir, mdoc, images }
}

#[test]
fn test_load_replaces_layer_with_ordered_series() {
    let fx = fixture();
    let mut selector = Selector::new(HeadlessViewer::new());
    selector.set_tilt_image_files(fx.images.iter().rev().cloned().collect());
    selector.load_tilt_series(&fx.mdoc).unwrap();

    let layer = selector.image_layer().unwrap();
    assert_eq!(layer.data().shape(), vec![5, 4, 6]);
    assert_eq!(selector.viewer().data_changes, 1);

    let LayerData::TiltSeries(series) = layer.data() else {
        panic!("expected a tilt series");
    };
    // -6, -3, 0, +3, +6
    let expected = [4usize, 2, 0, 1, 3];
    for (slot, &image_idx) in expected.iter().enumerate() {
        assert_eq!(series.files()[slot], fx.images[image_idx]);
    }

    let plane = layer.data().plane(0).unwrap();
    let mean = plane.iter().map(|&v| f64::from(v)).sum::<f64>() / plane.len() as f64;
    assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-5);
    drop(fx.dir);
}

#[test]
fn test_load_selected_mdoc() {
    let fx = fixture();
    let mut selector = Selector::new(HeadlessViewer::new());
    selector.set_tilt_image_files(fx.images.clone());
    selector.set_mdoc_files(vec![PathBuf::from("/elsewhere/other.mdoc"), fx.mdoc.clone()]);
    selector.mdoc_files_mut().select(1);
    selector.load_selected().unwrap();
    assert_eq!(selector.image_layer().unwrap().data().n_planes(), 5);

    // Loading does not touch the display settings until asked.
    assert_eq!(selector.viewer().view_resets, 0);
    selector.reset_display().unwrap();
    assert_eq!(selector.image_layer().unwrap().contrast_limits, (-2.0, 2.0));
}

#[test]
fn test_strict_matching_rejects_unrelated_files() {
    let fx = fixture();
    let unrelated = fx.dir.path().join("gain_reference.mrc");
    write_mrc(&unrelated, &Array3::<f32>::ones((1, 4, 6))).unwrap();

    let strict = MatchConfig::default().with_low_confidence(LowConfidencePolicy::Reject);
    let mut selector = Selector::new(HeadlessViewer::new()).with_match_config(strict);
    selector.set_tilt_image_files(vec![unrelated]);

    let err = selector.load_tilt_series(&fx.mdoc).unwrap_err();
    assert!(matches!(
        err,
        Error::Core(tiltpick_core::Error::LowConfidenceMatch { .. })
    ));
    assert_eq!(selector.image_layer().unwrap().data().shape(), vec![3, 3]);
}

#[test]
fn test_no_tilt_images_is_error() {
    let fx = fixture();
    let mut selector = Selector::new(HeadlessViewer::new());
    let err = selector.load_tilt_series(&fx.mdoc).unwrap_err();
    assert!(matches!(err, Error::Core(tiltpick_core::Error::NoCandidates)));
}
