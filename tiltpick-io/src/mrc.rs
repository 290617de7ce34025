//! MRC2014 image file reading and writing.
//!
//! An MRC file is a 1024-byte header, an optional extended header of
//! `nsymbt` bytes, and the voxel data stored x-fastest as `(nz, ny, nx)`.
//! Data is memory-mapped via memmap2 and decoded to `f32`.

use crate::{Error, Result};
use half::f16;
use memmap2::Mmap;
use ndarray::{Array2, Array3, ArrayBase, Axis, Data, Ix3};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Size of the fixed MRC header in bytes.
pub const HEADER_LEN: usize = 1024;

const MAP_TAG: &[u8; 4] = b"MAP ";
const MACHINE_STAMP_LE: [u8; 4] = [0x44, 0x44, 0x00, 0x00];
const MRC2014_VERSION: i32 = 20140;
const NUM_LABELS: usize = 10;
const LABEL_LEN: usize = 80;

// Byte offsets of header fields.
const OFF_MODE: usize = 12;
const OFF_START: usize = 16;
const OFF_SAMPLING: usize = 28;
const OFF_CELL_LENGTHS: usize = 40;
const OFF_CELL_ANGLES: usize = 52;
const OFF_AXIS_MAP: usize = 64;
const OFF_DMIN: usize = 76;
const OFF_DMAX: usize = 80;
const OFF_DMEAN: usize = 84;
const OFF_ISPG: usize = 88;
const OFF_NSYMBT: usize = 92;
const OFF_EXTTYP: usize = 104;
const OFF_NVERSION: usize = 108;
const OFF_ORIGIN: usize = 196;
const OFF_MAP: usize = 208;
const OFF_MACHST: usize = 212;
const OFF_RMS: usize = 216;
const OFF_NLABL: usize = 220;
const OFF_LABELS: usize = 224;

/// Voxel data type of an MRC file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MrcMode {
    /// Mode 0: signed 8-bit integers.
    Int8,
    /// Mode 1: signed 16-bit integers.
    Int16,
    /// Mode 2: 32-bit floats.
    Float32,
    /// Mode 6: unsigned 16-bit integers.
    Uint16,
    /// Mode 12: IEEE 754 half-precision floats.
    Float16,
}

impl MrcMode {
    /// Decode a header mode number.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedMode`] for complex and packed modes, and
    /// for unknown values.
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Self::Int8),
            1 => Ok(Self::Int16),
            2 => Ok(Self::Float32),
            6 => Ok(Self::Uint16),
            12 => Ok(Self::Float16),
            other => Err(Error::UnsupportedMode(other)),
        }
    }

    /// Header mode number.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Int8 => 0,
            Self::Int16 => 1,
            Self::Float32 => 2,
            Self::Uint16 => 6,
            Self::Float16 => 12,
        }
    }

    /// Bytes per voxel.
    #[must_use]
    pub fn bytes_per_voxel(self) -> usize {
        match self {
            Self::Int8 => 1,
            Self::Int16 | Self::Uint16 | Self::Float16 => 2,
            Self::Float32 => 4,
        }
    }

    /// Short type name, as numpy would print it.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Float32 => "float32",
            Self::Uint16 => "uint16",
            Self::Float16 => "float16",
        }
    }
}

impl std::fmt::Display for MrcMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code(), self.name())
    }
}

/// Reads header fields in the byte order given by the machine stamp.
struct FieldReader<'a> {
    bytes: &'a [u8],
    big_endian: bool,
}

impl FieldReader<'_> {
    fn word(&self, offset: usize) -> [u8; 4] {
        [
            self.bytes[offset],
            self.bytes[offset + 1],
            self.bytes[offset + 2],
            self.bytes[offset + 3],
        ]
    }

    fn i32(&self, offset: usize) -> i32 {
        let w = self.word(offset);
        if self.big_endian {
            i32::from_be_bytes(w)
        } else {
            i32::from_le_bytes(w)
        }
    }

    fn f32(&self, offset: usize) -> f32 {
        let w = self.word(offset);
        if self.big_endian {
            f32::from_be_bytes(w)
        } else {
            f32::from_le_bytes(w)
        }
    }

    fn i32x3(&self, offset: usize) -> [i32; 3] {
        [self.i32(offset), self.i32(offset + 4), self.i32(offset + 8)]
    }

    fn f32x3(&self, offset: usize) -> [f32; 3] {
        [self.f32(offset), self.f32(offset + 4), self.f32(offset + 8)]
    }
}

fn dimension(value: i32, name: &str) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| Error::InvalidFormat(format!("negative {name} in header: {value}")))
}

/// Parsed MRC header.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MrcHeader {
    /// Columns (fastest axis).
    pub nx: usize,
    /// Rows.
    pub ny: usize,
    /// Sections (slowest axis).
    pub nz: usize,
    /// Voxel data type.
    pub mode: MrcMode,
    /// Location of the first column, row and section in the unit cell.
    pub start: [i32; 3],
    /// Sampling along x, y and z of the unit cell.
    pub sampling: [i32; 3],
    /// Unit cell dimensions in Angstroms.
    pub cell_lengths: [f32; 3],
    /// Unit cell angles in degrees.
    pub cell_angles: [f32; 3],
    /// Axis corresponding to columns, rows and sections (1, 2, 3 for x, y, z).
    pub axis_map: [i32; 3],
    /// Minimum density value.
    pub dmin: f32,
    /// Maximum density value.
    pub dmax: f32,
    /// Mean density value.
    pub dmean: f32,
    /// Space group number (0 for image stacks).
    pub space_group: i32,
    /// Size of the extended header in bytes.
    pub extended_header_size: usize,
    /// Extended header type tag.
    pub exttyp: [u8; 4],
    /// Format version, 20140 for MRC2014.
    pub nversion: i32,
    /// Phase origin in Angstroms.
    pub origin: [f32; 3],
    /// RMS deviation from the mean density.
    pub rms: f32,
    /// Whether the file stores data big-endian.
    pub big_endian: bool,
    /// Text labels.
    pub labels: Vec<String>,
}

impl MrcHeader {
    /// Creates a little-endian MRC2014 header for an image stack.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss
    )]
    pub fn new(nz: usize, ny: usize, nx: usize, mode: MrcMode) -> Self {
        let sampling = [nx as i32, ny as i32, nz as i32];
        Self {
            nx,
            ny,
            nz,
            mode,
            start: [0; 3],
            sampling,
            cell_lengths: [nx as f32, ny as f32, nz as f32],
            cell_angles: [90.0; 3],
            axis_map: [1, 2, 3],
            dmin: 0.0,
            dmax: -1.0,
            dmean: -2.0,
            space_group: 0,
            extended_header_size: 0,
            exttyp: [0; 4],
            nversion: MRC2014_VERSION,
            origin: [0.0; 3],
            rms: -1.0,
            big_endian: false,
            labels: Vec::new(),
        }
    }

    /// Parses the first [`HEADER_LEN`] bytes of an MRC file.
    ///
    /// # Errors
    /// Returns an error if fewer than [`HEADER_LEN`] bytes are given, a
    /// dimension is negative, or the mode is not supported.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::InvalidFormat(format!(
                "header is {} bytes, expected {HEADER_LEN}",
                bytes.len()
            )));
        }

        let big_endian = match bytes[OFF_MACHST] {
            0x11 => true,
            0x44 | 0x41 => false,
            other => {
                log::debug!("unrecognised machine stamp {other:#04x}, assuming little-endian");
                false
            }
        };
        let r = FieldReader { bytes, big_endian };

        if &bytes[OFF_MAP..OFF_MAP + 4] != MAP_TAG {
            log::warn!("MRC header has no 'MAP ' tag");
        }

        let label_count = usize::try_from(r.i32(OFF_NLABL))
            .unwrap_or(0)
            .min(NUM_LABELS);
        let labels = (0..label_count)
            .map(|i| {
                let start = OFF_LABELS + i * LABEL_LEN;
                String::from_utf8_lossy(&bytes[start..start + LABEL_LEN])
                    .trim_end_matches(['\0', ' '])
                    .to_string()
            })
            .collect();

        Ok(Self {
            nx: dimension(r.i32(0), "nx")?,
            ny: dimension(r.i32(4), "ny")?,
            nz: dimension(r.i32(8), "nz")?,
            mode: MrcMode::from_code(r.i32(OFF_MODE))?,
            start: r.i32x3(OFF_START),
            sampling: r.i32x3(OFF_SAMPLING),
            cell_lengths: r.f32x3(OFF_CELL_LENGTHS),
            cell_angles: r.f32x3(OFF_CELL_ANGLES),
            axis_map: r.i32x3(OFF_AXIS_MAP),
            dmin: r.f32(OFF_DMIN),
            dmax: r.f32(OFF_DMAX),
            dmean: r.f32(OFF_DMEAN),
            space_group: r.i32(OFF_ISPG),
            extended_header_size: dimension(r.i32(OFF_NSYMBT), "nsymbt")?,
            exttyp: r.word(OFF_EXTTYP),
            nversion: r.i32(OFF_NVERSION),
            origin: r.f32x3(OFF_ORIGIN),
            rms: r.f32(OFF_RMS),
            big_endian,
            labels,
        })
    }

    /// Reads only the header of an MRC file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the header is invalid.
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut bytes = [0u8; HEADER_LEN];
        file.read_exact(&mut bytes)?;
        Self::parse(&bytes)
    }

    /// Shape of the data as `(nz, ny, nx)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.nz, self.ny, self.nx)
    }

    /// Byte offset of the first voxel.
    #[must_use]
    pub fn data_offset(&self) -> usize {
        HEADER_LEN + self.extended_header_size
    }

    /// Size of the voxel data in bytes.
    #[must_use]
    pub fn data_len(&self) -> usize {
        self.nx
            .saturating_mul(self.ny)
            .saturating_mul(self.nz)
            .saturating_mul(self.mode.bytes_per_voxel())
    }

    /// Voxel size in Angstroms along x, y and z.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn voxel_size(&self) -> [f32; 3] {
        let mut size = [0.0; 3];
        for (i, s) in size.iter_mut().enumerate() {
            if self.sampling[i] != 0 {
                *s = self.cell_lengths[i] / self.sampling[i] as f32;
            }
        }
        size
    }

    /// Serializes the header as little-endian MRC2014.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        let mut put = |offset: usize, word: [u8; 4]| {
            out[offset..offset + 4].copy_from_slice(&word);
        };

        put(0, (self.nx as i32).to_le_bytes());
        put(4, (self.ny as i32).to_le_bytes());
        put(8, (self.nz as i32).to_le_bytes());
        put(OFF_MODE, self.mode.code().to_le_bytes());
        for i in 0..3 {
            put(OFF_START + 4 * i, self.start[i].to_le_bytes());
            put(OFF_SAMPLING + 4 * i, self.sampling[i].to_le_bytes());
            put(OFF_CELL_LENGTHS + 4 * i, self.cell_lengths[i].to_le_bytes());
            put(OFF_CELL_ANGLES + 4 * i, self.cell_angles[i].to_le_bytes());
            put(OFF_AXIS_MAP + 4 * i, self.axis_map[i].to_le_bytes());
            put(OFF_ORIGIN + 4 * i, self.origin[i].to_le_bytes());
        }
        put(OFF_DMIN, self.dmin.to_le_bytes());
        put(OFF_DMAX, self.dmax.to_le_bytes());
        put(OFF_DMEAN, self.dmean.to_le_bytes());
        put(OFF_ISPG, self.space_group.to_le_bytes());
        put(OFF_NSYMBT, (self.extended_header_size as i32).to_le_bytes());
        put(OFF_EXTTYP, self.exttyp);
        put(OFF_NVERSION, self.nversion.to_le_bytes());
        put(OFF_MAP, *MAP_TAG);
        put(OFF_MACHST, MACHINE_STAMP_LE);
        put(OFF_RMS, self.rms.to_le_bytes());

        let labels: Vec<&String> = self.labels.iter().take(NUM_LABELS).collect();
        put(OFF_NLABL, (labels.len() as i32).to_le_bytes());
        for (i, label) in labels.into_iter().enumerate() {
            let start = OFF_LABELS + i * LABEL_LEN;
            let field = &mut out[start..start + LABEL_LEN];
            field.fill(b' ');
            let bytes = label.as_bytes();
            let n = bytes.len().min(LABEL_LEN);
            field[..n].copy_from_slice(&bytes[..n]);
        }
        out
    }
}

fn decode(bytes: &[u8], mode: MrcMode, big_endian: bool) -> Vec<f32> {
    match mode {
        MrcMode::Int8 => bytes
            .iter()
            .map(|&b| f32::from(i8::from_ne_bytes([b])))
            .collect(),
        MrcMode::Int16 => bytes
            .chunks_exact(2)
            .map(|c| {
                let b = [c[0], c[1]];
                f32::from(if big_endian {
                    i16::from_be_bytes(b)
                } else {
                    i16::from_le_bytes(b)
                })
            })
            .collect(),
        MrcMode::Uint16 => bytes
            .chunks_exact(2)
            .map(|c| {
                let b = [c[0], c[1]];
                f32::from(if big_endian {
                    u16::from_be_bytes(b)
                } else {
                    u16::from_le_bytes(b)
                })
            })
            .collect(),
        MrcMode::Float16 => bytes
            .chunks_exact(2)
            .map(|c| {
                let b = [c[0], c[1]];
                if big_endian {
                    f16::from_be_bytes(b).to_f32()
                } else {
                    f16::from_le_bytes(b).to_f32()
                }
            })
            .collect(),
        MrcMode::Float32 => bytes
            .chunks_exact(4)
            .map(|c| {
                let b = [c[0], c[1], c[2], c[3]];
                if big_endian {
                    f32::from_be_bytes(b)
                } else {
                    f32::from_le_bytes(b)
                }
            })
            .collect(),
    }
}

/// A memory-mapped MRC file.
pub struct MrcFile {
    mmap: Mmap,
    header: MrcHeader,
    path: PathBuf,
}

impl MrcFile {
    /// Opens and memory-maps an MRC file, validating its size against the header.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or mapped, the header is
    /// invalid, or the file is shorter than the header says.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        if file_len < HEADER_LEN as u64 {
            return Err(Error::InvalidFormat(format!(
                "{} is {file_len} bytes, too small for an MRC header",
                path.display()
            )));
        }

        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };

        let header = MrcHeader::parse(&mmap[..HEADER_LEN])?;
        let needed = header.data_offset().saturating_add(header.data_len());
        if mmap.len() < needed {
            return Err(Error::InvalidFormat(format!(
                "{} is {} bytes, header describes {needed}",
                path.display(),
                mmap.len()
            )));
        }

        Ok(Self {
            mmap,
            header,
            path: path.to_path_buf(),
        })
    }

    /// The parsed header.
    #[must_use]
    pub fn header(&self) -> &MrcHeader {
        &self.header
    }

    /// Path the file was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn voxel_bytes(&self) -> &[u8] {
        let start = self.header.data_offset();
        &self.mmap[start..start + self.header.data_len()]
    }

    /// Decodes the whole voxel payload as `(nz, ny, nx)`.
    ///
    /// # Errors
    /// Returns an error if the decoded length does not fit the header shape.
    pub fn data(&self) -> Result<Array3<f32>> {
        let values = decode(self.voxel_bytes(), self.header.mode, self.header.big_endian);
        Ok(Array3::from_shape_vec(self.header.shape(), values)?)
    }

    /// Decodes a single section `z` as `(ny, nx)`.
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfBounds`] if `z >= nz`.
    pub fn section(&self, z: usize) -> Result<Array2<f32>> {
        let (nz, ny, nx) = self.header.shape();
        if z >= nz {
            return Err(Error::IndexOutOfBounds { index: z, len: nz });
        }
        let section_len = ny * nx * self.header.mode.bytes_per_voxel();
        let bytes = &self.voxel_bytes()[z * section_len..(z + 1) * section_len];
        let values = decode(bytes, self.header.mode, self.header.big_endian);
        Ok(Array2::from_shape_vec((ny, nx), values)?)
    }
}

/// Returns `(nz, ny, nx)` of an MRC file, reading only its header.
///
/// # Errors
/// Returns an error if the header cannot be read or is invalid.
pub fn get_image_shape<P: AsRef<Path>>(filename: P) -> Result<(usize, usize, usize)> {
    Ok(MrcHeader::read_from(filename)?.shape())
}

/// Reads the full voxel payload of an MRC file as `(nz, ny, nx)` floats.
///
/// # Errors
/// Returns an error if the file cannot be opened or decoded.
pub fn read_mrc<P: AsRef<Path>>(filename: P) -> Result<Array3<f32>> {
    let file = MrcFile::open(&filename)?;
    log::debug!(
        "reading {} ({:?}, mode {})",
        file.path().display(),
        file.header().shape(),
        file.header().mode
    );
    file.data()
}

/// Reads an MRC file holding exactly one image as `(ny, nx)` floats,
/// together with its stored mode.
///
/// # Errors
/// Returns [`Error::NotSingleImage`] if the file holds more than one section.
pub fn read_mrc_image<P: AsRef<Path>>(filename: P) -> Result<(Array2<f32>, MrcMode)> {
    let file = MrcFile::open(&filename)?;
    let nz = file.header().nz;
    if nz != 1 {
        return Err(Error::NotSingleImage {
            path: file.path().to_path_buf(),
            nz,
        });
    }
    log::debug!("reading image {}", file.path().display());
    Ok((file.section(0)?, file.header().mode))
}

/// Writes a float32 MRC2014 stack with density statistics filled in.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn write_mrc<P, S>(filename: P, data: &ArrayBase<S, Ix3>) -> Result<()>
where
    P: AsRef<Path>,
    S: Data<Elem = f32>,
{
    let (nz, ny, nx) = data.dim();
    let mut header = MrcHeader::new(nz, ny, nx, MrcMode::Float32);
    if !data.is_empty() {
        let n = data.len() as f64;
        let mean = data.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
        let var = data
            .iter()
            .map(|&v| (f64::from(v) - mean).powi(2))
            .sum::<f64>()
            / n;
        header.dmin = data.iter().copied().fold(f32::INFINITY, f32::min);
        header.dmax = data.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        header.dmean = mean as f32;
        header.rms = var.sqrt() as f32;
    }
    header.labels.push("tiltpick: normalised tilt series".to_string());

    let mut writer = BufWriter::new(File::create(filename)?);
    writer.write_all(&header.to_bytes())?;
    for section in data.axis_iter(Axis(0)) {
        for &v in &section {
            writer.write_all(&v.to_le_bytes())?;
        }
    }
    writer.flush()?;
    Ok(())
}
