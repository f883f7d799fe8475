use crate::sweep::SweepRow;
use anyhow::{Context, Result};
use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::path::Path;

pub struct SweepWriter {
    writer: Writer<File>,
}

impl SweepWriter {
    pub fn new(file_path: &Path) -> Result<Self> {
        let file = File::create(file_path)
            .with_context(|| format!("Could not create output file: {}", file_path.display()))?;
        let writer = WriterBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .from_writer(file);
        Ok(Self { writer })
    }

    pub fn write_row(&mut self, row: &SweepRow) -> Result<()> {
        self.writer.serialize(row)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
