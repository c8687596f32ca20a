//! NDJSON reader for exported message rows.

use std::io::BufRead;

use crate::error::Result;
use crate::models::RawMessageRecord;

/// Records read from an export, plus how many lines were unusable.
#[derive(Debug, Default)]
pub struct RecordSet {
    pub records: Vec<RawMessageRecord>,
    pub skipped_lines: usize,
}

/// Read one [`RawMessageRecord`] per line.
///
/// Blank lines are ignored. Malformed lines (bad JSON, invalid base64 payload)
/// are logged and skipped; only I/O failures abort the read.
pub fn read_records<R: BufRead>(reader: R) -> Result<RecordSet> {
    let mut set = RecordSet::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<RawMessageRecord>(&line) {
            Ok(record) => set.records.push(record),
            Err(e) => {
                set.skipped_lines += 1;
                log::warn!("skipping line {}: {}", index + 1, e);
            }
        }
    }

    log::info!(
        "read {} message records ({} lines skipped)",
        set.records.len(),
        set.skipped_lines
    );
    Ok(set)
}
