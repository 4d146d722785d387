use crate::catalogue::Catalogue;
use crate::error::LoadError;
use crate::types::{Entry, PillarRecord, Quarter, RawEntryRow};
use crate::util::{parse_flag, parse_sub_values, parse_text};
use chrono::Month;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    pub deleted_rows: usize,
    pub month_mismatches: usize,
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_entries(path: &Path) -> Result<(Vec<Entry>, LoadReport), LoadError> {
    let (entries, report) = entries_from_reader(open(path)?)?;
    tracing::info!(
        path = %path.display(),
        total = report.total_rows,
        loaded = report.loaded_rows,
        parse_errors = report.parse_errors,
        "submissions loaded"
    );
    Ok((entries, report))
}

/// Read submissions from CSV. Soft-deleted rows are kept (flagged) so the
/// caller can audit them; the engine skips them.
pub fn entries_from_reader<R: Read>(reader: R) -> Result<(Vec<Entry>, LoadReport), LoadError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    // Surface a broken header as an error rather than one parse error per row.
    rdr.headers()?;

    let mut report = LoadReport::default();
    let mut entries: Vec<Entry> = Vec::new();

    for result in rdr.deserialize::<RawEntryRow>() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("row {}: {}", report.total_rows, e);
                report.parse_errors += 1;
                continue;
            }
        };

        let indicator_id = match row.indicator_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                report.parse_errors += 1;
                continue;
            }
        };
        let Some(quarter) = row.quarter_id.as_deref().and_then(Quarter::parse) else {
            tracing::warn!(
                indicator = %indicator_id,
                "row {}: unknown quarter {:?}",
                report.total_rows,
                row.quarter_id
            );
            report.parse_errors += 1;
            continue;
        };

        let month = row.month.unwrap_or_default();
        match parse_month(&month) {
            Some(m) if quarter.contains_month(m) => {}
            _ => {
                tracing::warn!(
                    indicator = %indicator_id,
                    "row {}: month {:?} is not part of {}",
                    report.total_rows,
                    month,
                    quarter
                );
                report.month_mismatches += 1;
            }
        }

        let is_deleted = parse_flag(row.is_deleted.as_deref());
        if is_deleted {
            report.deleted_rows += 1;
        }

        entries.push(Entry {
            indicator_id,
            quarter,
            month,
            value: row.value.as_deref().map(parse_text).unwrap_or(0.0),
            sub_values: parse_sub_values(row.sub_values.as_deref()),
            is_deleted,
        });
    }

    // Stable: submissions for the same month keep their file order.
    entries.sort_by_key(|e| (e.quarter, month_position(e.quarter, &e.month)));
    report.loaded_rows = entries.len();
    Ok((entries, report))
}

fn parse_month(s: &str) -> Option<Month> {
    s.trim().parse::<Month>().ok()
}

/// Position of the month inside its quarter; unknown months sort last.
fn month_position(quarter: Quarter, month: &str) -> usize {
    parse_month(month)
        .and_then(|m| quarter.months().iter().position(|q| *q == m))
        .unwrap_or(3)
}

pub fn load_pillar_records(path: &Path) -> Result<Vec<PillarRecord>, LoadError> {
    pillar_records_from_reader(open(path)?)
}

pub fn pillar_records_from_reader<R: Read>(reader: R) -> Result<Vec<PillarRecord>, LoadError> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut records = Vec::new();
    for result in rdr.deserialize::<PillarRecord>() {
        records.push(result?);
    }
    Ok(records)
}

/// One record per catalogue pillar, for deployments without a pillar table.
pub fn records_from_catalogue(catalogue: &Catalogue) -> Vec<PillarRecord> {
    catalogue
        .pillars()
        .iter()
        .map(|p| PillarRecord {
            id: p.id.clone(),
            name: p.name.clone(),
        })
        .collect()
}
