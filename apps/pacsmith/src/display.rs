//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use pacsmith_checker::{PublishReport, SweepSummary};
use pacsmith_types::{Package, RepoRecord};
use serde::Serialize;
use std::io;
use std::path::Path;

/// Result of a command, rendered as a table or as JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum OperationResult {
    Success(String),
    PackageList(Vec<Package>),
    PackageInfo(Package),
    IsNew { package: String, new: bool },
    /// Package names, e.g. obsolete ones
    Names(Vec<String>),
    Removed(Vec<String>),
    Published { added: Vec<String>, rejected: Vec<String> },
    Repositories(Vec<RepoRecord>),
    Sweep { checked: usize, skipped: usize, failed: usize },
}

fn display_paths(paths: &[impl AsRef<Path>]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.as_ref().display().to_string())
        .collect()
}

impl From<PublishReport> for OperationResult {
    fn from(report: PublishReport) -> Self {
        Self::Published {
            added: display_paths(&report.added),
            rejected: display_paths(&report.rejected),
        }
    }
}

impl From<SweepSummary> for OperationResult {
    fn from(summary: SweepSummary) -> Self {
        Self::Sweep {
            checked: summary.checked,
            skipped: summary.skipped,
            failed: summary.failed,
        }
    }
}

impl OperationResult {
    pub fn removed(paths: &[impl AsRef<Path>]) -> Self {
        Self::Removed(display_paths(paths))
    }
}

/// Output renderer for CLI results
#[derive(Clone, Copy)]
pub struct OutputRenderer {
    json_output: bool,
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|name| Cell::new(name).add_attribute(Attribute::Bold))
        .collect()
}

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

impl OutputRenderer {
    pub fn new(json_output: bool) -> Self {
        Self { json_output }
    }

    /// Render operation result
    pub fn render_result(self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            let json = serde_json::to_string_pretty(result).map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }

        match result {
            OperationResult::Success(message) => println!("{message}"),
            OperationResult::PackageList(packages) => Self::render_package_list(packages),
            OperationResult::PackageInfo(package) => Self::render_package_info(package),
            OperationResult::IsNew { package, new } => {
                if *new {
                    println!("{package} is new");
                } else {
                    println!("{package} is not newer than the published version");
                }
            }
            OperationResult::Names(names) => {
                for name in names {
                    println!("{name}");
                }
            }
            OperationResult::Removed(files) => {
                println!("Removed {} file(s)", files.len());
                for file in files {
                    println!("  {file}");
                }
            }
            OperationResult::Published { added, rejected } => {
                for file in added {
                    println!("added     {file}");
                }
                for file in rejected {
                    println!("rejected  {file} (same or newer version published)");
                }
            }
            OperationResult::Repositories(records) => Self::render_repositories(records),
            OperationResult::Sweep {
                checked,
                skipped,
                failed,
            } => println!("checked {checked}, skipped {skipped}, failed {failed}"),
        }
        Ok(())
    }

    fn render_package_list(packages: &[Package]) {
        if packages.is_empty() {
            println!("No packages.");
            return;
        }

        let mut table = table();
        table.set_header(header(&["Package", "Version", "Arch", "Description"]));
        for package in packages {
            table.add_row(vec![
                Cell::new(&package.name),
                Cell::new(&package.version),
                Cell::new(&package.arch),
                Cell::new(&package.description),
            ]);
        }
        println!("{table}");
    }

    fn render_package_info(package: &Package) {
        let mut table = table();
        let rows = [
            ("Name", package.name.clone()),
            ("Version", package.version.clone()),
            ("Base", package.base.clone()),
            ("Description", package.description.clone()),
            ("Arch", package.arch.clone()),
            ("URL", package.url.clone()),
            ("License", package.license.clone()),
            ("Packager", package.packager.clone()),
            (
                "Build date",
                package
                    .build_date
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_default(),
            ),
            ("Depends", package.depends.join(" ")),
            ("Make depends", package.makedepends.join(" ")),
            ("Filename", package.filename.clone()),
        ];
        for (label, value) in rows {
            if !value.is_empty() {
                table.add_row(vec![Cell::new(label).add_attribute(Attribute::Bold), Cell::new(value)]);
            }
        }
        println!("{table}");

        if !package.files.is_empty() {
            for file in &package.files {
                println!("{file}");
            }
        }
    }

    fn render_repositories(records: &[RepoRecord]) {
        if records.is_empty() {
            println!("No repositories registered.");
            return;
        }

        let mut table = table();
        table.set_header(header(&["Repository", "Archs", "Source", "Last check"]));
        for record in records {
            let archs: Vec<&str> = record.archs.iter().map(|a| a.as_str()).collect();
            table.add_row(vec![
                Cell::new(record.key()),
                Cell::new(archs.join(" ")),
                Cell::new(format!("{}@{}", record.source_key(), record.source_branch)),
                Cell::new(
                    record
                        .last_check
                        .map_or_else(|| "never".to_string(), |d| d.to_rfc3339()),
                ),
            ]);
        }
        println!("{table}");
    }
}
