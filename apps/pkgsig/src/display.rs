//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use pkgsig_ops::{ImportReport, KeyInfo, OperationResult};
use std::io;

/// Output renderer for CLI results
#[derive(Clone, Copy)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool) -> Self {
        Self { json_output }
    }

    pub fn is_json(self) -> bool {
        self.json_output
    }

    /// Render operation result
    pub fn render_result(self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            let json = result.to_json().map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }

        match result {
            // Package lines are written while checking
            OperationResult::CheckReport(_) => Ok(()),
            OperationResult::ImportReport(report) => {
                Self::render_import_report(report);
                Ok(())
            }
            OperationResult::KeyList(keys) => {
                Self::render_key_list(keys);
                Ok(())
            }
        }
    }

    fn render_import_report(report: &ImportReport) {
        if report.failures > 0 {
            eprintln!(
                "{} import failure(s) across {} source(s)",
                report.failures, report.sources
            );
        }
    }

    fn render_key_list(keys: &[KeyInfo]) {
        if keys.is_empty() {
            println!("No trusted keys.");
            return;
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Key ID").add_attribute(Attribute::Bold),
                Cell::new("User ID").add_attribute(Attribute::Bold),
                Cell::new("Trusted Since").add_attribute(Attribute::Bold),
            ]);

        for key in keys {
            let since = chrono::DateTime::from_timestamp(key.trusted_since, 0).map_or_else(
                || key.trusted_since.to_string(),
                |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            );
            table.add_row(vec![
                Cell::new(key.key_id.to_hex()),
                Cell::new(key.user_id.as_deref().unwrap_or("-")),
                Cell::new(since),
            ]);
        }

        println!("{table}");
    }
}
