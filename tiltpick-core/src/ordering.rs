//! Matching metadata sections to image files and ordering them by tilt.

use crate::fuzzy::extract_one;
use crate::mdoc::MdocTable;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default score below which a match is considered low confidence.
pub const DEFAULT_MIN_SCORE: f64 = 90.0;

/// What to do when the best candidate for a section scores below
/// [`MatchConfig::min_score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LowConfidencePolicy {
    /// Take the best candidate silently.
    Accept,
    /// Take the best candidate and log a warning.
    #[default]
    Warn,
    /// Fail the match with [`Error::LowConfidenceMatch`].
    Reject,
}

/// Configuration for filename matching.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchConfig {
    /// Minimum acceptable score (0-100).
    pub min_score: f64,
    /// Action taken for matches scoring below `min_score`.
    pub low_confidence: LowConfidencePolicy,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            low_confidence: LowConfidencePolicy::Warn,
        }
    }
}

impl MatchConfig {
    /// Accept every best match without reporting, whatever its score.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            min_score: 0.0,
            low_confidence: LowConfidencePolicy::Accept,
        }
    }

    /// Set the minimum acceptable score.
    #[must_use]
    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    /// Set the low-confidence policy.
    #[must_use]
    pub fn with_low_confidence(mut self, policy: LowConfidencePolicy) -> Self {
        self.low_confidence = policy;
        self
    }
}

/// A metadata section paired with the image file chosen for it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TiltMatch {
    /// `ZValue` of the section.
    pub z_value: i64,
    /// Tilt angle of the section, if recorded.
    pub tilt_angle: Option<f64>,
    /// Filename stem taken from the section's `SubFramePath`.
    pub mdoc_basename: String,
    /// Chosen image file.
    pub path: PathBuf,
    /// Similarity score of the choice (0-100).
    pub score: f64,
}

/// Stem of the last component of a path recorded on the acquisition PC.
///
/// Paths are written with Windows separators, so the final `\` component is
/// taken before stripping the extension.
#[must_use]
pub fn mdoc_basename(sub_frame_path: &str) -> String {
    let name = sub_frame_path.rsplit('\\').next().unwrap_or(sub_frame_path);
    file_stem(Path::new(name))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Pairs every section of `mdoc_table` with its best-matching image file.
///
/// Each section's basename is scored against the stem of every candidate;
/// the first highest-scoring candidate is taken. Matches are returned in
/// section order. Several sections may receive the same file.
///
/// # Errors
/// Returns [`Error::NoCandidates`] for an empty candidate list,
/// [`Error::MissingField`] for a section without `SubFramePath`, and
/// [`Error::LowConfidenceMatch`] under [`LowConfidencePolicy::Reject`].
pub fn match_tilt_image_filenames<P: AsRef<Path>>(
    tilt_image_files: &[P],
    mdoc_table: &MdocTable,
    config: &MatchConfig,
) -> Result<Vec<TiltMatch>> {
    if tilt_image_files.is_empty() {
        return Err(Error::NoCandidates);
    }

    let stems: Vec<String> = tilt_image_files
        .iter()
        .map(|f| file_stem(f.as_ref()))
        .collect();

    let mut matches = Vec::with_capacity(mdoc_table.len());
    for section in &mdoc_table.sections {
        let basename = mdoc_basename(section.require_sub_frame_path()?);
        let (idx, score) = extract_one(&basename, &stems).ok_or(Error::NoCandidates)?;
        let path = tilt_image_files[idx].as_ref().to_path_buf();

        if score < config.min_score {
            match config.low_confidence {
                LowConfidencePolicy::Accept => {}
                LowConfidencePolicy::Warn => log::warn!(
                    "low confidence match for '{}': {} (score {:.1})",
                    basename,
                    path.display(),
                    score
                ),
                LowConfidencePolicy::Reject => {
                    return Err(Error::LowConfidenceMatch {
                        query: basename,
                        candidate: path,
                        score,
                        min_score: config.min_score,
                    })
                }
            }
        }

        log::debug!("matched '{}' -> {} ({:.1})", basename, path.display(), score);
        matches.push(TiltMatch {
            z_value: section.z_value,
            tilt_angle: section.tilt_angle,
            mdoc_basename: basename,
            path,
            score,
        });
    }
    Ok(matches)
}

/// Sorts matches by ascending tilt angle. The sort is stable.
///
/// # Errors
/// Returns [`Error::MissingField`] if any match has no tilt angle.
pub fn sort_by_tilt_angle(matches: Vec<TiltMatch>) -> Result<Vec<TiltMatch>> {
    let mut keyed = matches
        .into_iter()
        .map(|m| match m.tilt_angle {
            Some(angle) => Ok((angle, m)),
            None => Err(Error::MissingField {
                z_value: m.z_value,
                field: "TiltAngle",
            }),
        })
        .collect::<Result<Vec<_>>>()?;
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(keyed.into_iter().map(|(_, m)| m).collect())
}

/// Parses `mdoc_file`, matches its sections to `tilt_image_files` and
/// returns the matches sorted by ascending tilt angle.
///
/// # Errors
/// Returns an error if the document cannot be read or parsed, or if
/// matching or sorting fails.
pub fn get_ordered_tilt_matches<M, P>(
    mdoc_file: M,
    tilt_image_files: &[P],
    config: &MatchConfig,
) -> Result<Vec<TiltMatch>>
where
    M: AsRef<Path>,
    P: AsRef<Path>,
{
    let table = MdocTable::from_path(mdoc_file)?;
    let matches = match_tilt_image_filenames(tilt_image_files, &table, config)?;
    sort_by_tilt_angle(matches)
}

/// Returns the image files of a tilt series in ascending tilt-angle order.
///
/// Uses the default [`MatchConfig`].
///
/// # Errors
/// See [`get_ordered_tilt_matches`].
pub fn get_ordered_tilt_images<M, P>(mdoc_file: M, tilt_image_files: &[P]) -> Result<Vec<PathBuf>>
where
    M: AsRef<Path>,
    P: AsRef<Path>,
{
    get_ordered_tilt_images_with_config(mdoc_file, tilt_image_files, &MatchConfig::default())
}

/// [`get_ordered_tilt_images`] with an explicit matching configuration.
///
/// # Errors
/// See [`get_ordered_tilt_matches`].
pub fn get_ordered_tilt_images_with_config<M, P>(
    mdoc_file: M,
    tilt_image_files: &[P],
    config: &MatchConfig,
) -> Result<Vec<PathBuf>>
where
    M: AsRef<Path>,
    P: AsRef<Path>,
{
    Ok(get_ordered_tilt_matches(mdoc_file, tilt_image_files, config)?
        .into_iter()
        .map(|m| m.path)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(f64, &str)]) -> MdocTable {
        let mut text = String::new();
        for (i, (angle, name)) in entries.iter().enumerate() {
            text.push_str(&format!(
                "[ZValue = {i}]\nTiltAngle = {angle}\nSubFramePath = D:\\frames\\{name}\n\n"
            ));
        }
        MdocTable::parse(&text).unwrap()
    }

    #[test]
    fn test_mdoc_basename() {
        assert_eq!(mdoc_basename("X:\\DATA\\TS_01_000_0.0.tif"), "TS_01_000_0.0");
        assert_eq!(mdoc_basename("tilt_003.mdoc_sub"), "tilt_003");
        assert_eq!(mdoc_basename("/unix/style/tilt_004.tif"), "tilt_004");
        assert_eq!(mdoc_basename(""), "");
    }

    #[test]
    fn test_match_best_candidate() {
        let t = table(&[(0.0, "tilt_003.mdoc_sub")]);
        let files = ["tilt_001.mrc", "tilt_002.mrc", "tilt_003.mrc"];
        let matches = match_tilt_image_filenames(&files, &t, &MatchConfig::default()).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].path, PathBuf::from("tilt_003.mrc"));
        assert!((matches[0].score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_match_no_candidates() {
        let t = table(&[(0.0, "a.tif")]);
        let files: [&str; 0] = [];
        assert!(matches!(
            match_tilt_image_filenames(&files, &t, &MatchConfig::default()),
            Err(Error::NoCandidates)
        ));
    }

    #[test]
    fn test_low_confidence_policies() {
        let t = table(&[(0.0, "completely_different.tif")]);
        let files = ["tilt_001.mrc"];

        let accepted =
            match_tilt_image_filenames(&files, &t, &MatchConfig::permissive()).unwrap();
        assert_eq!(accepted[0].path, PathBuf::from("tilt_001.mrc"));

        let warned = match_tilt_image_filenames(&files, &t, &MatchConfig::default()).unwrap();
        assert_eq!(warned.len(), 1);

        let strict = MatchConfig::default().with_low_confidence(LowConfidencePolicy::Reject);
        let err = match_tilt_image_filenames(&files, &t, &strict).unwrap_err();
        assert!(matches!(err, Error::LowConfidenceMatch { .. }));
    }

    #[test]
    fn test_sort_by_tilt_angle() {
        let t = table(&[(10.0, "a_10.tif"), (-5.0, "a_-5.tif"), (0.0, "a_0.tif")]);
        let files = ["a_0.mrc", "a_10.mrc", "a_-5.mrc"];
        let matches = match_tilt_image_filenames(&files, &t, &MatchConfig::permissive()).unwrap();
        let sorted = sort_by_tilt_angle(matches).unwrap();
        let angles: Vec<f64> = sorted.iter().filter_map(|m| m.tilt_angle).collect();
        assert_eq!(angles, vec![-5.0, 0.0, 10.0]);
        assert_eq!(sorted[0].path, PathBuf::from("a_-5.mrc"));
        assert_eq!(sorted[2].path, PathBuf::from("a_10.mrc"));
    }

    #[test]
    fn test_sort_is_stable() {
        let t = table(&[(1.0, "first.tif"), (1.0, "second.tif")]);
        let files = ["second.mrc", "first.mrc"];
        let matches = match_tilt_image_filenames(&files, &t, &MatchConfig::permissive()).unwrap();
        let sorted = sort_by_tilt_angle(matches).unwrap();
        assert_eq!(sorted[0].path, PathBuf::from("first.mrc"));
        assert_eq!(sorted[1].path, PathBuf::from("second.mrc"));
    }

    #[test]
    fn test_sort_missing_angle() {
        let t = MdocTable::parse("[ZValue = 7]\nSubFramePath = a.tif\n").unwrap();
        let matches = match_tilt_image_filenames(&["a.mrc"], &t, &MatchConfig::default()).unwrap();
        assert!(matches!(
            sort_by_tilt_angle(matches),
            Err(Error::MissingField { z_value: 7, .. })
        ));
    }
}
