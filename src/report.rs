use std::{
    fs::OpenOptions,
    io::{BufWriter, Write},
    path::Path,
};

use crate::checker::data::{Diagnostic, Report};

pub(crate) fn format_diagnostic(path: &Path, diagnostic: &Diagnostic) -> String {
    let location = match diagnostic.line {
        Some(line) => format!("{}:{line}", path.display()),
        None => path.display().to_string(),
    };
    format!(
        "{location}: {}[{}]: {}",
        diagnostic.severity, diagnostic.rule, diagnostic.message
    )
}

pub(crate) fn render_report(report: &Report) -> String {
    let mut lines: Vec<String> = report
        .files
        .iter()
        .flat_map(|file| {
            file.diagnostics
                .iter()
                .map(|d| format_diagnostic(&file.path, d))
        })
        .collect();
    lines.push(format!(
        "{} posts checked, {} errors, {} warnings",
        report.files.len(),
        report.errors,
        report.warnings
    ));
    lines.join("\n")
}

pub(crate) fn save_report(report_path: &Path, report: &Report) -> anyhow::Result<()> {
    let report_fd = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(report_path)?;
    let mut writer = BufWriter::new(report_fd);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;

    Ok(())
}
