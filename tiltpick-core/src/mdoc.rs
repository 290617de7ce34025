//! SerialEM metadata document (`.mdoc`) parsing.
//!
//! An mdoc file is a plain-text record of an acquisition. Lines of the form
//! `Key = Value` before the first section describe the whole acquisition,
//! `[T = ...]` lines are free-text titles, and every `[ZValue = N]` header
//! opens one section describing a single tilt image.
//!
//! ```text
//! PixelSpacing = 1.35
//! ImageFile = TS_01.mrc
//!
//! [T = SerialEM: Digitized on EMBL Krios]
//!
//! [ZValue = 0]
//! TiltAngle = 0.0010
//! SubFramePath = X:\DATA\TS_01\TS_01_000_0.0.tif
//! ```

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const TILT_ANGLE_KEY: &str = "TiltAngle";
const SUB_FRAME_PATH_KEY: &str = "SubFramePath";

/// One `[ZValue = N]` section: a single tilt image in acquisition order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MdocSection {
    /// Section index as written in the header.
    pub z_value: i64,
    /// Stage tilt angle in degrees.
    pub tilt_angle: Option<f64>,
    /// Path of the movie/frame file as recorded by the acquisition PC.
    pub sub_frame_path: Option<String>,
    /// Every `Key = Value` pair of the section, verbatim.
    pub fields: BTreeMap<String, String>,
}

impl MdocSection {
    fn new(z_value: i64) -> Self {
        Self {
            z_value,
            tilt_angle: None,
            sub_frame_path: None,
            fields: BTreeMap::new(),
        }
    }

    /// Raw value of a field in this section.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Tilt angle, or an error naming the section if it was not recorded.
    ///
    /// # Errors
    /// Returns [`Error::MissingField`] if the section has no `TiltAngle`.
    pub fn require_tilt_angle(&self) -> Result<f64> {
        self.tilt_angle.ok_or(Error::MissingField {
            z_value: self.z_value,
            field: TILT_ANGLE_KEY,
        })
    }

    /// Sub-frame path, or an error naming the section if it was not recorded.
    ///
    /// # Errors
    /// Returns [`Error::MissingField`] if the section has no `SubFramePath`.
    pub fn require_sub_frame_path(&self) -> Result<&str> {
        self.sub_frame_path
            .as_deref()
            .ok_or(Error::MissingField {
                z_value: self.z_value,
                field: SUB_FRAME_PATH_KEY,
            })
    }
}

/// Parsed metadata document.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MdocTable {
    /// Acquisition-wide `Key = Value` pairs.
    pub global: BTreeMap<String, String>,
    /// `[T = ...]` title lines in file order.
    pub titles: Vec<String>,
    /// Tilt sections in file order.
    pub sections: Vec<MdocSection>,
}

enum Scope {
    Global,
    Tilt,
    Other,
}

impl MdocTable {
    /// Reads and parses a metadata document from disk.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is malformed.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let table = Self::parse(&text)?;
        log::debug!(
            "parsed {} tilt sections from {}",
            table.sections.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    /// Parses metadata document text.
    ///
    /// # Errors
    /// Returns [`Error::Parse`] for lines that are neither blank, a bracketed
    /// header, nor a `Key = Value` pair, and for unparseable numeric fields.
    pub fn parse(text: &str) -> Result<Self> {
        let mut table = Self::default();
        let mut scope = Scope::Global;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(inner) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let (key, value) = split_pair(inner, line_no)?;
                match key {
                    "T" => table.titles.push(value.to_string()),
                    "ZValue" => {
                        let z_value = value.parse::<i64>().map_err(|e| Error::Parse {
                            line: line_no,
                            message: format!("invalid ZValue '{value}': {e}"),
                        })?;
                        table.sections.push(MdocSection::new(z_value));
                        scope = Scope::Tilt;
                    }
                    other => {
                        log::debug!("skipping [{other}] section at line {line_no}");
                        scope = Scope::Other;
                    }
                }
                continue;
            }

            let (key, value) = split_pair(line, line_no)?;
            match scope {
                Scope::Global => {
                    table.global.insert(key.to_string(), value.to_string());
                }
                Scope::Other => {}
                Scope::Tilt => {
                    // Scope::Tilt is only entered after a push.
                    let Some(section) = table.sections.last_mut() else {
                        continue;
                    };
                    match key {
                        TILT_ANGLE_KEY => {
                            let angle = value.parse::<f64>().map_err(|e| Error::Parse {
                                line: line_no,
                                message: format!("invalid TiltAngle '{value}': {e}"),
                            })?;
                            section.tilt_angle = Some(angle);
                        }
                        SUB_FRAME_PATH_KEY => section.sub_frame_path = Some(value.to_string()),
                        _ => {}
                    }
                    section.fields.insert(key.to_string(), value.to_string());
                }
            }
        }

        Ok(table)
    }

    /// Number of tilt sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns true if the document has no tilt sections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Raw value of an acquisition-wide field.
    #[must_use]
    pub fn global(&self, key: &str) -> Option<&str> {
        self.global.get(key).map(String::as_str)
    }
}

fn split_pair(line: &str, line_no: usize) -> Result<(&str, &str)> {
    line.split_once('=')
        .map(|(k, v)| (k.trim(), v.trim()))
        .ok_or_else(|| Error::Parse {
            line: line_no,
            message: format!("expected 'Key = Value', found '{line}'"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "PixelSpacing = 1.35
ImageFile = TS_01.mrc
ImageSize = 4096 4096

[T = SerialEM: Digitized on EMBL Krios]

[T =     TiltAxisAngle = 85.3  Binning = 1  SpotSize = 8]

[ZValue = 0]
TiltAngle = 0.0010
StagePosition = 20.7 155.9
SubFramePath = X:\\DATA\\TS_01\\TS_01_000_0.0.tif
NumSubFrames = 8

[ZValue = 1]
TiltAngle = 2.9977
SubFramePath = X:\\DATA\\TS_01\\TS_01_001_3.0.tif
";

    #[test]
    fn test_parse_sections_and_globals() {
        let table = MdocTable::parse(SAMPLE).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.global("PixelSpacing"), Some("1.35"));
        assert_eq!(table.global("ImageSize"), Some("4096 4096"));
        assert_eq!(table.titles.len(), 2);
        assert!(table.titles[1].starts_with("TiltAxisAngle = 85.3"));

        let first = &table.sections[0];
        assert_eq!(first.z_value, 0);
        assert_eq!(first.tilt_angle, Some(0.001));
        assert_eq!(
            first.sub_frame_path.as_deref(),
            Some("X:\\DATA\\TS_01\\TS_01_000_0.0.tif")
        );
        assert_eq!(first.get("NumSubFrames"), Some("8"));
        assert_eq!(table.sections[1].z_value, 1);
    }

    #[test]
    fn test_other_sections_are_skipped() {
        let text = "[ZValue = 0]\nTiltAngle = 1.0\n[MontSection = 0]\nTiltAngle = 99\n";
        let table = MdocTable::parse(text).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.sections[0].tilt_angle, Some(1.0));
    }

    #[test]
    fn test_invalid_line_is_error() {
        let err = MdocTable::parse("PixelSpacing 1.35\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn test_invalid_tilt_angle_is_error() {
        let err = MdocTable::parse("[ZValue = 0]\nTiltAngle = abc\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn test_missing_fields() {
        let table = MdocTable::parse("[ZValue = 3]\nExposureTime = 1.0\n").unwrap();
        let section = &table.sections[0];
        assert!(matches!(
            section.require_tilt_angle(),
            Err(Error::MissingField { z_value: 3, field: "TiltAngle" })
        ));
        assert!(section.require_sub_frame_path().is_err());
    }
}
