//! File I/O for record input and grouped-record output.

use crate::error::Result;
use crate::pipeline::GroupedRecord;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Open a newline-delimited record file for the pipeline.
pub fn open_records<P: AsRef<Path>>(path: P) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path)?))
}

/// Write grouped records as JSON Lines (`{"group": .., "text": ..}`).
pub fn write_grouped_jsonl<P: AsRef<Path>>(path: P, records: &[GroupedRecord]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read grouped records back from a JSON Lines file.
pub fn read_grouped_jsonl<P: AsRef<Path>>(path: P) -> Result<Vec<GroupedRecord>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}
