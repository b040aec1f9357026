use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::models::{AnnotatedRecord, Report};

pub const DEFAULT_REPORT_NAME: &str = "annotated.json";

/// Collects one record per annotated image and writes them out once, at the end of a run
#[derive(Debug, Default)]
pub struct ReportWriter {
    records: Report,
}

impl ReportWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: AnnotatedRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[AnnotatedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write the report to `output_dir/file_name` and consume the writer.
    ///
    /// The document goes to a temporary file in the same directory first and
    /// is then renamed over the target, so readers never see a partial report.
    pub fn finish(self, output_dir: &Path, file_name: &str) -> Result<PathBuf> {
        let target = output_dir.join(file_name);

        let mut tmp = NamedTempFile::new_in(output_dir)
            .with_context(|| format!("Failed to create temporary report in {}", output_dir.display()))?;
        write_pretty(&mut tmp, &self.records)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target)
            .with_context(|| format!("Failed to write report {}", target.display()))?;

        Ok(target)
    }
}

/// Four-space indented JSON, UTF-8 written verbatim
fn write_pretty<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut *writer, formatter);
    value.serialize(&mut serializer)?;
    writer.flush()?;
    Ok(())
}
