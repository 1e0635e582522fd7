//! Export of aggregated flights: CSV or JSON, to the console and/or a file.

pub mod csv;
pub mod json;

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PlanemailError, Result};
use crate::model::flight::FlightEntity;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Where rendered output goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    #[default]
    Console,
    File,
    Both,
}

impl Destination {
    fn to_console(self) -> bool {
        matches!(self, Self::Console | Self::Both)
    }

    fn to_file(self) -> bool {
        matches!(self, Self::File | Self::Both)
    }
}

/// Render entities in the requested format.
pub fn render(entities: &[FlightEntity], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Csv => Ok(csv::to_csv(entities)),
        ExportFormat::Json => json::to_json(entities),
    }
}

/// `planemail_YYYY_MM_DD_HH_MM.<ext>`
pub fn output_file_name(format: ExportFormat, now: NaiveDateTime) -> String {
    format!(
        "planemail_{}.{}",
        now.format("%Y_%m_%d_%H_%M"),
        format.extension()
    )
}

/// Render and deliver entities.
///
/// Console output goes to `console`; file output is written into
/// `output_dir` under a timestamped name, whose path is returned.
pub fn export(
    entities: &[FlightEntity],
    format: ExportFormat,
    destination: Destination,
    output_dir: &Path,
    console: &mut dyn Write,
) -> Result<Option<PathBuf>> {
    let rendered = render(entities, format)?;

    if destination.to_console() {
        writeln!(console, "{rendered}")
            .map_err(|e| PlanemailError::ExportError(format!("console: {e}")))?;
    }

    if !destination.to_file() {
        return Ok(None);
    }

    std::fs::create_dir_all(output_dir).map_err(|e| PlanemailError::io(output_dir, e))?;
    let now = chrono::Local::now().naive_local();
    let path = output_dir.join(output_file_name(format, now));
    std::fs::write(&path, &rendered).map_err(|e| PlanemailError::io(&path, e))?;
    info!(path = %path.display(), flights = entities.len(), "Export written");
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_output_file_name() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 7)
            .and_then(|d| d.and_hms_opt(9, 5, 0))
            .unwrap();
        assert_eq!(output_file_name(ExportFormat::Csv, now), "planemail_2024_03_07_09_05.csv");
        assert_eq!(output_file_name(ExportFormat::Json, now), "planemail_2024_03_07_09_05.json");
    }

    #[test]
    fn test_console_only_writes_nothing_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        let written = export(&[], ExportFormat::Json, Destination::Console, dir.path(), &mut out)
            .unwrap();
        assert!(written.is_none());
        assert_eq!(String::from_utf8(out).unwrap(), "[]\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_both_destinations() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        let path = export(&[], ExportFormat::Csv, Destination::Both, dir.path(), &mut out)
            .unwrap()
            .expect("file written");
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("planemail_"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), csv::HEADER);
        assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", csv::HEADER));
    }
}
