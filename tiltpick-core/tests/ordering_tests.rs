#![allow(clippy::uninlined_format_args, clippy::cast_precision_loss)]
use std::collections::HashSet;
use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use tiltpick_core::{get_ordered_tilt_images, get_ordered_tilt_matches, MatchConfig};

// Helper to write an mdoc with one section per (angle, sub-frame name)
fn write_mdoc(entries: &[(f64, String)]) -> NamedTempFile {
    let mut text = String::from("PixelSpacing = 1.35\nImageFile = TS_01.mrc\n\n");
    text.push_str("[T = SerialEM: Digitized on test scope]\n\n");
    for (i, (angle, name)) in entries.iter().enumerate() {
        write!(
            text,
            "[ZValue = {i}]\nTiltAngle = {angle}\nExposureDose = 3\nSubFramePath = X:\\Data\\TS_01\\{name}\n\n"
        )
        .unwrap();
    }
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_angles_are_sorted_ascending() {
    let mdoc = write_mdoc(&[
        (10.0, "TS_01_000_10.0.tif".to_string()),
        (-5.0, "TS_01_001_-5.0.tif".to_string()),
        (0.0, "TS_01_002_0.0.tif".to_string()),
    ]);
    let files = [
        "/data/TS_01_002_0.0.mrc",
        "/data/TS_01_000_10.0.mrc",
        "/data/TS_01_001_-5.0.mrc",
    ];

    let ordered = get_ordered_tilt_images(mdoc.path(), &files).unwrap();
    assert_eq!(
        ordered,
        vec![
            PathBuf::from("/data/TS_01_001_-5.0.mrc"),
            PathBuf::from("/data/TS_01_002_0.0.mrc"),
            PathBuf::from("/data/TS_01_000_10.0.mrc"),
        ]
    );
}

#[test]
fn test_one_to_one_series_is_complete() {
    // Dose-symmetric style acquisition order
    let angles = [0.0, 3.0, -3.0, -6.0, 6.0, 9.0, -9.0, -12.0, 12.0, 15.0, -15.0];
    let entries: Vec<(f64, String)> = angles
        .iter()
        .enumerate()
        .map(|(i, a)| (*a, format!("TS_07_{:03}_{:.1}.tif", i, a)))
        .collect();
    let mdoc = write_mdoc(&entries);

    let files: Vec<PathBuf> = entries
        .iter()
        .rev()
        .map(|(_, name)| PathBuf::from(format!("/scratch/{}", name.replace(".tif", ".mrc"))))
        .collect();

    let matches = get_ordered_tilt_matches(mdoc.path(), &files, &MatchConfig::default()).unwrap();
    assert_eq!(matches.len(), files.len());

    let unique: HashSet<&PathBuf> = matches.iter().map(|m| &m.path).collect();
    assert_eq!(unique.len(), files.len(), "every file should appear once");

    for pair in matches.windows(2) {
        assert!(pair[0].tilt_angle <= pair[1].tilt_angle);
    }
    for m in &matches {
        assert!((m.score - 100.0).abs() < 1e-9, "{} scored {}", m.mdoc_basename, m.score);
        assert!(m.path.to_string_lossy().contains(&m.mdoc_basename));
    }
}

#[test]
fn test_fuzzy_match_example() {
    let mdoc = write_mdoc(&[(0.0, "tilt_003.mdoc_sub".to_string())]);
    let files = ["tilt_001.mrc", "tilt_002.mrc", "tilt_003.mrc"];
    let ordered = get_ordered_tilt_images(mdoc.path(), &files).unwrap();
    assert_eq!(ordered, vec![PathBuf::from("tilt_003.mrc")]);
}

#[test]
fn test_unreadable_mdoc_is_error() {
    let result = get_ordered_tilt_images("/nonexistent/dir/missing.mdoc", &["a.mrc"]);
    assert!(matches!(result, Err(tiltpick_core::Error::Io(_))));
}
