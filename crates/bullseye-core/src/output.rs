//! Machine-readable run reports.
//!
//! `json` writes the whole [`RunReport`] as one document. `jsonl` writes one
//! [`MoveOutcome`] per line followed by a final summary line, so a consumer
//! can stream it or `tail` it.

use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::types::{MoveOutcome, RunReport};

/// Report format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single pretty-printed JSON document
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }

    /// Guess the format from a file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::parse)
            .unwrap_or(Self::Json)
    }
}

/// Trailing line of a JSONL report.
#[derive(Serialize)]
struct SummaryLine {
    summary: Summary,
}

#[derive(Serialize)]
struct Summary {
    moved: usize,
    skipped: usize,
    failed: usize,
    total_seconds: f64,
}

/// Serializes run reports to JSON or JSONL.
pub struct ReportWriter<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl ReportWriter<BufWriter<File>> {
    /// Create (or truncate) a report file.
    pub fn create(path: &Path, format: OutputFormat) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self::new(BufWriter::new(File::create(path)?), format))
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    /// Write one outcome as a JSONL line.
    ///
    /// Only meaningful for [`OutputFormat::JsonLines`]; a JSON report is
    /// written whole by [`write_report`](Self::write_report).
    pub fn write_outcome(&mut self, outcome: &MoveOutcome) -> io::Result<()> {
        self.write_line(outcome)
    }

    /// Write a finished report.
    pub fn write_report(&mut self, report: &RunReport) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut self.writer, report)
                    .map_err(io::Error::other)?;
                writeln!(self.writer)?;
            }
            OutputFormat::JsonLines => {
                for outcome in &report.outcomes {
                    self.write_outcome(outcome)?;
                }
                self.write_line(&SummaryLine {
                    summary: Summary {
                        moved: report.moved,
                        skipped: report.skipped,
                        failed: report.failed,
                        total_seconds: report.total_seconds,
                    },
                })?;
            }
        }
        self.writer.flush()
    }

    /// Consume the writer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
        writeln!(self.writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FailureKind;

    fn report() -> RunReport {
        RunReport::from_outcomes(
            vec![
                MoveOutcome::moved("/in/a.png", "/in/anime/a.png").with_label("anime"),
                MoveOutcome::failed("/in/b.png", None, FailureKind::Decode, "bad header"),
            ],
            1.5,
        )
    }

    #[test]
    fn test_json_report_is_one_document() {
        let mut writer = ReportWriter::new(Vec::new(), OutputFormat::Json);
        writer.write_report(&report()).unwrap();

        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert!(output.starts_with('{') && output.ends_with("}\n"));
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["moved"], 1);
        assert_eq!(parsed["failed"], 1);
        assert_eq!(parsed["outcomes"][1]["failure"]["kind"], "decode");
    }

    #[test]
    fn test_jsonl_report_has_outcomes_then_summary() {
        let mut writer = ReportWriter::new(Vec::new(), OutputFormat::JsonLines);
        writer.write_report(&report()).unwrap();

        let output = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = output.trim().split('\n').collect();
        assert_eq!(lines.len(), 3);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["status"], "moved");
        let last: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(last["summary"]["failed"], 1);
    }

    #[test]
    fn test_create_makes_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("run.jsonl");
        let mut writer = ReportWriter::create(&path, OutputFormat::JsonLines).unwrap();
        writer.write_report(&report()).unwrap();
        drop(writer);
        assert!(std::fs::read_to_string(&path).unwrap().contains("summary"));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("jsonl"), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::parse("JSONL"), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::parse("invalid"), None);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            OutputFormat::from_path(Path::new("out.jsonl")),
            OutputFormat::JsonLines
        );
        assert_eq!(OutputFormat::from_path(Path::new("out.json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_path(Path::new("out")), OutputFormat::Json);
    }
}
