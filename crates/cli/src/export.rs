//! Tabular CSV export of extracted articles.
//!
//! Column layout: `Timestamp, URL, First Heading, Content`, then one
//! `Heading N` column per additional heading up to the widest record in the
//! batch. Records with fewer headings are padded with empty cells so every
//! row has the same width.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clippings_core::ArticleRecord;

/// Timestamped default filename inside the configured output directory.
pub fn default_export_path(output_dir: &Path) -> PathBuf {
    output_dir.join(format!("clippings_{}.csv", Local::now().format("%Y%m%d_%H%M%S")))
}

/// Write the records as CSV to `path`, creating parent directories.
pub fn export_csv(records: &[ArticleRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let file = fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_csv(records, file)
}

/// Write the records as CSV to any sink.
pub fn write_csv<W: Write>(records: &[ArticleRecord], sink: W) -> Result<()> {
    let max_headings = records.iter().map(|r| r.headings.len()).max().unwrap_or(0);
    let extra = max_headings.saturating_sub(1);

    let mut writer = csv::Writer::from_writer(sink);

    let mut header = vec![
        "Timestamp".to_string(),
        "URL".to_string(),
        "First Heading".to_string(),
        "Content".to_string(),
    ];
    for i in 0..extra {
        header.push(format!("Heading {}", i + 2));
    }
    writer.write_record(&header)?;

    for record in records {
        let mut row = vec![
            record.fetched_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.source_url.clone(),
            record.first_heading().to_string(),
            record.body.clone(),
        ];
        for i in 0..extra {
            row.push(record.headings.get(i + 1).cloned().unwrap_or_default());
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}
