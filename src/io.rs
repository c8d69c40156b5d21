//! Delimited-text input and output.
//!
//! Point files hold one point per line, the index and value lists quoted:
//!
//! ```text
//! 17,"3,9,12","2,1,5"
//! ```
//!
//! Label files hold `id,label` lines, and assignment files are written as
//! `id,cluster` lines sorted by id. Whitespace around ids, labels and list
//! items is ignored, as are blank lines.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

use crate::cluster::{LabelMap, PointId, PointStore};
use crate::error::{Error, Result};

/// Counts from loading a point file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Points stored.
    pub added: usize,
    /// Records skipped because they listed no attributes.
    pub empty: usize,
    /// Records skipped because index and value counts differ.
    pub mismatched: usize,
    /// Records skipped because their id was already stored.
    pub duplicate: usize,
    /// Records skipped because a field was not a number.
    pub malformed: usize,
}

impl IngestSummary {
    /// Total records skipped for any reason.
    pub fn skipped(&self) -> usize {
        self.empty + self.mismatched + self.duplicate + self.malformed
    }
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All);
    builder
}

fn parse_field<T: FromStr>(raw: &str, line: u64, what: &str) -> Result<T> {
    raw.trim().parse::<T>().map_err(|_| Error::Parse {
        line,
        message: format!("invalid {what}: {raw:?}"),
    })
}

fn parse_list<T: FromStr>(raw: &str, line: u64, what: &str) -> Result<Vec<T>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_field(s, line, what))
        .collect()
}

/// Parse one point record into `(id, indices, values)`.
fn parse_point(record: &csv::StringRecord, line: u64) -> Result<(PointId, Vec<usize>, Vec<f64>)> {
    let id = parse_field(record.get(0).unwrap_or(""), line, "point id")?;
    let indices = parse_list(record.get(1).unwrap_or(""), line, "attribute index")?;
    let values = parse_list(record.get(2).unwrap_or(""), line, "attribute value")?;
    Ok((id, indices, values))
}

/// Load points from `reader` into `store`.
///
/// Records that fail to parse or are rejected by the store are skipped with a
/// warning and counted in the summary; only I/O and CSV framing errors abort.
pub fn read_points<R: Read>(reader: R, store: &mut PointStore) -> Result<IngestSummary> {
    let mut rdr = reader_builder().from_reader(reader);
    let mut summary = IngestSummary::default();

    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());

        let (id, indices, values) = match parse_point(&record, line) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("skipping record: {e}");
                summary.malformed += 1;
                continue;
            }
        };

        match store.add_data_point(id, indices, values) {
            Ok(()) => summary.added += 1,
            Err(e) if e.is_ingest() => {
                log::warn!("line {line}: skipping point: {e}");
                match e {
                    Error::EmptyPoint { .. } => summary.empty += 1,
                    Error::MismatchedLengths { .. } => summary.mismatched += 1,
                    _ => summary.duplicate += 1,
                }
            }
            Err(e) => return Err(e),
        }
    }

    log::debug!(
        "loaded {} points, skipped {}",
        summary.added,
        summary.skipped()
    );
    Ok(summary)
}

/// Load points from a file; see [`read_points`].
pub fn read_points_path(path: impl AsRef<Path>, store: &mut PointStore) -> Result<IngestSummary> {
    let file = File::open(path)?;
    read_points(file, store)
}

/// Load ground-truth labels: `id,label` per line.
///
/// Lines without a label or with a non-numeric id are skipped with a warning.
pub fn read_labels<R: Read>(reader: R) -> Result<LabelMap> {
    let mut rdr = reader_builder().from_reader(reader);
    let mut labels = LabelMap::new();

    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());

        let label = match record.get(1) {
            Some(l) if !l.is_empty() => l,
            _ => {
                log::warn!("line {line}: skipping label record without a label");
                continue;
            }
        };
        let id: PointId = match parse_field(record.get(0).unwrap_or(""), line, "point id") {
            Ok(id) => id,
            Err(e) => {
                log::warn!("skipping label record: {e}");
                continue;
            }
        };

        labels.entry(label.to_owned()).or_default().insert(id);
    }
    Ok(labels)
}

/// Load labels from a file; see [`read_labels`].
pub fn read_labels_path(path: impl AsRef<Path>) -> Result<LabelMap> {
    let file = File::open(path)?;
    read_labels(file)
}

/// Write `id,cluster` lines, sorted by id.
pub fn write_assignments<W: Write>(writer: W, assignments: &HashMap<PointId, usize>) -> Result<()> {
    let mut rows: Vec<(PointId, usize)> = assignments.iter().map(|(&id, &c)| (id, c)).collect();
    rows.sort_unstable();

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    for (id, cluster) in rows {
        wtr.write_record([id.to_string(), cluster.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write assignments to a file, replacing it; see [`write_assignments`].
pub fn write_assignments_path(
    path: impl AsRef<Path>,
    assignments: &HashMap<PointId, usize>,
) -> Result<()> {
    let file = File::create(path)?;
    write_assignments(file, assignments)
}
