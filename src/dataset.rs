//! Spike dataset loading
//!
//! The dataset is a CSV file with one row per recorded spike. It is read once
//! at start-up and never modified afterwards; row order is preserved exactly
//! because chart point indices are positional offsets into it.
//!
//! # Schema
//!
//! | Column   | Type    | Meaning                                       |
//! |----------|---------|-----------------------------------------------|
//! | `sample` | integer | Unique spike id                               |
//! | `isi`    | float   | Inter-spike interval, seconds                 |
//! | `amp`    | float   | Extracellular spike amplitude, μV             |
//! | `SIZE`   | float   | Marker diameter (burst position)              |
//! | `COLOR`  | float or label | Colorscale value or color name         |
//! | `PIC`    | string  | Image reference (path or URL) for the spike   |
//!
//! Column names are matched case-insensitively. Extra columns are ignored.
//! Empty or `NaN` cells in the float columns load as missing values, which the
//! chart emits as `null` so Plotly leaves the point out.

use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

const REQUIRED_COLUMNS: [&str; 6] = ["sample", "isi", "amp", "size", "color", "pic"];

/// One recorded spike.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpikeRow {
    pub sample: i64,
    /// Seconds.
    pub isi: Option<f64>,
    pub amp: Option<f64>,
    pub size: Option<f64>,
    pub color: Option<MarkerColor>,
    /// Image reference as read from the file (not trimmed).
    pub pic: String,
}

/// A `COLOR` cell: a position on the colorscale, or a label passed through as is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MarkerColor {
    Scale(f64),
    Label(String),
}

impl MarkerColor {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_nan() => None,
            Ok(v) => Some(MarkerColor::Scale(v)),
            Err(_) => Some(MarkerColor::Label(raw.to_string())),
        }
    }
}

/// The immutable, file-ordered spike table.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    source: PathBuf,
    rows: Vec<SpikeRow>,
}

/// Column positions resolved from the header row
struct Columns {
    sample: usize,
    isi: usize,
    amp: usize,
    size: usize,
    color: usize,
    pic: usize,
}

impl Columns {
    fn locate(headers: &csv::StringRecord, source: &Path) -> Result<Self> {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| h.trim().to_ascii_lowercase())
            .collect();

        let mut idx = [0usize; REQUIRED_COLUMNS.len()];
        for (slot, name) in idx.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = normalized
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| Error::data(source, format!("missing column '{}'", name)))?;
        }

        Ok(Self {
            sample: idx[0],
            isi: idx[1],
            amp: idx[2],
            size: idx[3],
            color: idx[4],
            pic: idx[5],
        })
    }
}

impl Dataset {
    /// Load the dataset from a CSV file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::data(path, e.to_string()))?;
        Self::parse(file, path)
    }

    /// Load the dataset from any CSV source, e.g. an in-memory buffer.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::parse(reader, Path::new("<memory>"))
    }

    fn parse<R: Read>(reader: R, source: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader
            .headers()
            .map_err(|e| Error::data(source, format!("reading header: {}", e)))?
            .clone();
        let cols = Columns::locate(&headers, source)?;

        let mut rows = Vec::new();
        let mut seen = HashSet::new();

        for (row_no, record) in reader.records().enumerate() {
            let record =
                record.map_err(|e| Error::data(source, format!("row {}: {}", row_no, e)))?;
            let cell = |idx: usize| record.get(idx).unwrap_or("");

            let row = SpikeRow {
                sample: parse_cell(cell(cols.sample), row_no, "sample", source)?,
                isi: parse_float(cell(cols.isi), row_no, "isi", source)?,
                amp: parse_float(cell(cols.amp), row_no, "amp", source)?,
                size: parse_float(cell(cols.size), row_no, "SIZE", source)?,
                color: MarkerColor::parse(cell(cols.color)),
                pic: cell(cols.pic).to_string(),
            };

            if row.pic.trim().is_empty() {
                return Err(Error::data(source, format!("row {}: empty PIC", row_no)));
            }
            if !seen.insert(row.sample) {
                return Err(Error::data(
                    source,
                    format!("row {}: duplicate sample {}", row_no, row.sample),
                ));
            }

            rows.push(row);
        }

        Ok(Self {
            source: source.to_path_buf(),
            rows,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn rows(&self) -> &[SpikeRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SpikeRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Find the row carrying a given sample id.
    pub fn find_by_sample(&self, sample: i64) -> Option<&SpikeRow> {
        self.rows.iter().find(|r| r.sample == sample)
    }
}

fn parse_cell<T: std::str::FromStr>(raw: &str, row: usize, col: &str, source: &Path) -> Result<T> {
    raw.trim().parse::<T>().map_err(|_| {
        Error::data(
            source,
            format!("row {}, {}: '{}' is not a valid value", row, col, raw),
        )
    })
}

/// Empty and `NaN` cells are missing values, not errors.
fn parse_float(raw: &str, row: usize, col: &str, source: &Path) -> Result<Option<f64>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let v: f64 = parse_cell(raw, row, col, source)?;
    Ok(if v.is_nan() { None } else { Some(v) })
}
