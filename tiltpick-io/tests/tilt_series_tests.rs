#![allow(clippy::cast_precision_loss, clippy::uninlined_format_args)]
use approx::assert_abs_diff_eq;
use ndarray::{Array2, Array3, Axis};
use std::path::PathBuf;
use tempfile::TempDir;
use tiltpick_core::normalise_image;
use tiltpick_io::{
    get_image_shape, lazy_tilt_series_from_tilt_images, read_mrc, write_mrc, Error,
};

// Writes K single-image MRC files with distinct intensity ramps
fn write_images(dir: &TempDir, count: usize, height: usize, width: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|k| {
            let path = dir.path().join(format!("TS_01_{:03}.mrc", k));
            let image = Array3::from_shape_fn((1, height, width), |(_, y, x)| {
                (k as f32 + 1.0) * (y as f32) + (x as f32) * 0.25 + 100.0 * k as f32
            });
            write_mrc(&path, &image).unwrap();
            path
        })
        .collect()
}

#[test]
fn test_series_matches_normalised_reads() {
    let dir = TempDir::new().unwrap();
    let files = write_images(&dir, 4, 6, 8);

    let series = lazy_tilt_series_from_tilt_images(&files).unwrap();
    assert_eq!(series.shape(), [4, 6, 8]);
    assert_eq!(series.files(), &files[..]);

    let volume = series.compute().unwrap();
    assert_eq!(volume.dim(), (4, 6, 8));

    for (i, file) in files.iter().enumerate() {
        let raw = read_mrc(file).unwrap().index_axis_move(Axis(0), 0);
        let expected = normalise_image(&raw);
        let actual = volume.index_axis(Axis(0), i);
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*a, *e, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_slices_have_zero_mean_unit_std() {
    let dir = TempDir::new().unwrap();
    let files = write_images(&dir, 2, 5, 5);
    let series = lazy_tilt_series_from_tilt_images(&files).unwrap();

    for i in 0..series.len() {
        let slice: Array2<f32> = series.slice(i).unwrap();
        let n = slice.len() as f64;
        let mean = slice.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
        let var = slice.iter().map(|&v| (f64::from(v) - mean).powi(2)).sum::<f64>() / n;
        assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(var.sqrt(), 1.0, epsilon = 1e-5);
    }
}

#[test]
fn test_missing_later_file_fails_only_on_evaluation() {
    let dir = TempDir::new().unwrap();
    let mut files = write_images(&dir, 2, 4, 4);
    files.push(dir.path().join("not_written.mrc"));

    let series = lazy_tilt_series_from_tilt_images(&files).unwrap();
    assert_eq!(series.len(), 3);
    assert!(series.slice(0).is_ok());
    assert!(matches!(series.slice(2), Err(Error::Io(_))));
}

#[test]
fn test_differing_shape_fails_on_evaluation() {
    let dir = TempDir::new().unwrap();
    let mut files = write_images(&dir, 1, 4, 4);
    let wide = dir.path().join("TS_01_wide.mrc");
    write_mrc(&wide, &Array3::<f32>::ones((1, 4, 6))).unwrap();
    files.push(wide);

    let series = lazy_tilt_series_from_tilt_images(&files).unwrap();
    assert_eq!(series.shape(), [2, 4, 4]);
    assert!(matches!(series.slice(1), Err(Error::ShapeMismatch { .. })));
}

#[test]
fn test_image_shape_from_header() {
    let dir = TempDir::new().unwrap();
    let files = write_images(&dir, 1, 7, 3);
    assert_eq!(get_image_shape(&files[0]).unwrap(), (1, 7, 3));
}
