//! NumPy `.npy` array support
//!
//! Point clouds, colors and boxes are exchanged as dense little-endian
//! float arrays in NumPy's `.npy` container. This module reads format
//! versions 1.0, 2.0 and 3.0 with `f4`/`f8` payloads in C order and writes
//! version 1.0 `<f4` arrays.

use crate::{PointCloudReader, PointCloudWriter};
use pcrender_core::{Error, Point3f, PointCloud, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Header blocks are padded so the payload starts on this boundary
const HEADER_ALIGNMENT: usize = 64;

/// Element types understood by the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpyDtype {
    F32,
    F64,
}

impl NpyDtype {
    /// Parse a NumPy type descriptor such as `<f4`
    pub fn from_descr(descr: &str) -> Result<Self> {
        let kind = descr.strip_prefix(['<', '=', '|']).ok_or_else(|| {
            Error::InvalidData(format!(
                "unsupported byte order in dtype '{}', only little endian is read",
                descr
            ))
        })?;
        match kind {
            "f4" => Ok(NpyDtype::F32),
            "f8" => Ok(NpyDtype::F64),
            _ => Err(Error::InvalidData(format!(
                "unsupported dtype '{}', expected f4 or f8",
                descr
            ))),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            NpyDtype::F32 => 4,
            NpyDtype::F64 => 8,
        }
    }
}

/// Parsed `.npy` header dictionary
#[derive(Debug, Clone, PartialEq)]
pub struct NpyHeader {
    pub version: (u8, u8),
    pub dtype: NpyDtype,
    pub fortran_order: bool,
    pub shape: Vec<usize>,
}

impl NpyHeader {
    /// Number of elements described by the shape
    pub fn element_count(&self) -> Result<usize> {
        self.shape
            .iter()
            .try_fold(1usize, |count, &dim| count.checked_mul(dim))
            .ok_or_else(|| Error::InvalidData(format!("shape {:?} is too large", self.shape)))
    }

    /// Payload size in bytes
    pub fn payload_len(&self) -> Result<usize> {
        self.element_count()?
            .checked_mul(self.dtype.size())
            .ok_or_else(|| Error::InvalidData(format!("shape {:?} is too large", self.shape)))
    }
}

/// A dense float array, values widened or narrowed to `f32`
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl NpyArray {
    /// Rows of a 2D array with exactly `width` columns.
    ///
    /// A 1D array of length `width` is accepted as a single row.
    pub fn rows(&self, width: usize) -> Result<std::slice::ChunksExact<'_, f32>> {
        let ok = match self.shape.as_slice() {
            [_, w] => *w == width,
            [w] => *w == width,
            _ => false,
        };
        if !ok || width == 0 {
            return Err(Error::InvalidData(format!(
                "expected an array of shape [n, {}], got {:?}",
                width, self.shape
            )));
        }
        Ok(self.data.chunks_exact(width))
    }

    /// Rows of an `[n, 3]` array as triples
    pub fn to_triples(&self) -> Result<Vec<[f32; 3]>> {
        Ok(self.rows(3)?.map(|row| [row[0], row[1], row[2]]).collect())
    }
}

/// Reader for `.npy` files
pub struct NpyReader;

impl NpyReader {
    /// Read a whole `.npy` file
    pub fn read_npy_file<P: AsRef<Path>>(path: P) -> Result<NpyArray> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_npy_data(&mut reader)
    }

    /// Read a `.npy` array from a reader
    pub fn read_npy_data<R: Read>(reader: &mut R) -> Result<NpyArray> {
        let header = Self::read_header(reader)?;
        let data = Self::read_values(reader, &header)?;
        Ok(NpyArray {
            shape: header.shape,
            data,
        })
    }

    /// Read and parse the magic string, version and header dictionary
    pub fn read_header<R: Read>(reader: &mut R) -> Result<NpyHeader> {
        let mut magic = [0u8; 6];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(Error::InvalidData("missing NUMPY magic string".to_string()));
        }

        let mut version = [0u8; 2];
        reader.read_exact(&mut version)?;

        let header_len = match version[0] {
            1 => {
                let mut buf = [0u8; 2];
                reader.read_exact(&mut buf)?;
                u16::from_le_bytes(buf) as usize
            }
            2 | 3 => {
                let mut buf = [0u8; 4];
                reader.read_exact(&mut buf)?;
                u32::from_le_bytes(buf) as usize
            }
            major => {
                return Err(Error::InvalidData(format!(
                    "unsupported .npy format version {}.{}",
                    major, version[1]
                )))
            }
        };

        let mut dict = Vec::new();
        reader.take(header_len as u64).read_to_end(&mut dict)?;
        if dict.len() != header_len {
            return Err(Error::InvalidData("truncated .npy header".to_string()));
        }
        let dict = String::from_utf8(dict)
            .map_err(|_| Error::InvalidData("header dictionary is not valid text".to_string()))?;

        let descr = Self::dict_value(&dict, "descr")?;
        let descr = descr.trim_matches(|c| c == '\'' || c == '"');
        let dtype = NpyDtype::from_descr(descr)?;

        let fortran_order = match Self::dict_value(&dict, "fortran_order")? {
            "False" => false,
            "True" => true,
            other => {
                return Err(Error::InvalidData(format!(
                    "invalid fortran_order value: {}",
                    other
                )))
            }
        };
        if fortran_order {
            return Err(Error::InvalidData(
                "Fortran-ordered arrays are not supported".to_string(),
            ));
        }

        let shape = Self::parse_shape(Self::dict_value(&dict, "shape")?)?;

        Ok(NpyHeader {
            version: (version[0], version[1]),
            dtype,
            fortran_order,
            shape,
        })
    }

    /// Value text following `'key':` in the header dictionary
    fn dict_value<'a>(dict: &'a str, key: &str) -> Result<&'a str> {
        let pattern = format!("'{}':", key);
        let start = dict
            .find(&pattern)
            .ok_or_else(|| Error::InvalidData(format!("missing '{}' in .npy header", key)))?
            + pattern.len();
        let rest = dict[start..].trim_start();

        // tuples contain commas of their own
        let end = if rest.starts_with('(') {
            rest.find(')').map(|i| i + 1)
        } else {
            rest.find([',', '}'])
        }
        .ok_or_else(|| Error::InvalidData(format!("unterminated '{}' in .npy header", key)))?;

        Ok(rest[..end].trim())
    }

    fn parse_shape(text: &str) -> Result<Vec<usize>> {
        let inner = text
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .ok_or_else(|| Error::InvalidData(format!("invalid shape: {}", text)))?;

        inner
            .split(',')
            .map(str::trim)
            .filter(|dim| !dim.is_empty())
            .map(|dim| {
                dim.trim_end_matches('L')
                    .parse::<usize>()
                    .map_err(|_| Error::InvalidData(format!("invalid shape dimension: {}", dim)))
            })
            .collect()
    }

    fn read_values<R: Read>(reader: &mut R, header: &NpyHeader) -> Result<Vec<f32>> {
        let expected = header.payload_len()?;
        // grows with the data actually present, not with the header's claim
        let mut bytes = Vec::new();
        reader.take(expected as u64).read_to_end(&mut bytes)?;
        if bytes.len() != expected {
            return Err(Error::InvalidData(format!(
                "array payload is shorter than shape {:?} requires",
                header.shape
            )));
        }

        let values = match header.dtype {
            NpyDtype::F32 => bytes
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
            NpyDtype::F64 => bytes
                .chunks_exact(8)
                .map(|b| {
                    f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32
                })
                .collect(),
        };
        Ok(values)
    }
}

/// Writer for version 1.0 `<f4` `.npy` files
pub struct NpyWriter;

impl NpyWriter {
    /// Write `data` with the given `shape` to a file
    pub fn write_npy_file<P: AsRef<Path>>(path: P, shape: &[usize], data: &[f32]) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_npy_data(&mut writer, shape, data)?;
        writer.flush()?;
        Ok(())
    }

    /// Write an array to a writer
    pub fn write_npy_data<W: Write>(writer: &mut W, shape: &[usize], data: &[f32]) -> Result<()> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::InvalidData(format!(
                "shape {:?} holds {} values but {} were given",
                shape,
                expected,
                data.len()
            )));
        }

        let shape_text = match shape {
            [single] => format!("({},)", single),
            dims => format!(
                "({})",
                dims.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ")
            ),
        };
        let mut dict = format!(
            "{{'descr': '<f4', 'fortran_order': False, 'shape': {}, }}",
            shape_text
        );

        // magic + version + length field + dict + newline
        let unpadded = MAGIC.len() + 2 + 2 + dict.len() + 1;
        let padding = (HEADER_ALIGNMENT - unpadded % HEADER_ALIGNMENT) % HEADER_ALIGNMENT;
        dict.push_str(&" ".repeat(padding));
        dict.push('\n');

        let header_len = u16::try_from(dict.len())
            .map_err(|_| Error::InvalidData("shape too large for a version 1.0 header".to_string()))?;

        writer.write_all(MAGIC)?;
        writer.write_all(&[1, 0])?;
        writer.write_all(&header_len.to_le_bytes())?;
        writer.write_all(dict.as_bytes())?;
        for value in data {
            writer.write_all(&value.to_le_bytes())?;
        }
        Ok(())
    }

    /// Write rows of triples as an `[n, 3]` array
    pub fn write_triples<P: AsRef<Path>>(path: P, rows: &[[f32; 3]]) -> Result<()> {
        let data: Vec<f32> = rows.iter().flatten().copied().collect();
        Self::write_npy_file(path, &[rows.len(), 3], &data)
    }
}

impl PointCloudReader for NpyReader {
    fn read_point_cloud<P: AsRef<Path>>(path: P) -> Result<PointCloud<Point3f>> {
        let array = Self::read_npy_file(path)?;
        Ok(array
            .to_triples()?
            .into_iter()
            .map(|[x, y, z]| Point3f::new(x, y, z))
            .collect())
    }
}

impl PointCloudWriter for NpyWriter {
    fn write_point_cloud<P: AsRef<Path>>(cloud: &PointCloud<Point3f>, path: P) -> Result<()> {
        let rows: Vec<[f32; 3]> = cloud.iter().map(|p| [p.x, p.y, p.z]).collect();
        Self::write_triples(path, &rows)
    }
}
