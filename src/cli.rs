use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::config::{ArtifactPaths, ConversionConfig, OutputLayout};
use crate::generator::json::{to_assignment_block, to_pretty_json};
use crate::generator::Emitter;
use crate::parser::assembler::{assemble_sheet, AssemblerOptions};
use crate::parser::workbook::{read_workbook, Sheet};
use crate::record::ResourceSet;

/// What was produced for one converted sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetReport {
    pub sheet: String,
    pub records: usize,
    pub paths: ArtifactPaths,
}

/// Converts the configured workbook, writing all artifacts.
pub fn run_conversion(config: &ConversionConfig) -> Result<Vec<SheetReport>> {
    info!("Working directory: {}", config.workdir.display());
    let layout = config.layout();
    create_dir(&layout.intermediate_dir)?;
    create_dir(&layout.output_dir)?;

    let input_path = config.input_path();
    let sheets = read_workbook(&input_path)?;
    convert_sheets(&sheets, &layout, config.emitter, config.assembler)
}

/// Converts already-read sheets, one at a time, in order.
///
/// Sheets without a registered category are skipped.
pub fn convert_sheets(
    sheets: &[Sheet],
    layout: &OutputLayout,
    emitter: Emitter,
    options: AssemblerOptions,
) -> Result<Vec<SheetReport>> {
    let mut reports = Vec::new();
    for sheet in sheets {
        let Some(set) = assemble_sheet(sheet, options)? else {
            info!("No assembler registered for sheet: {}", sheet.name);
            continue;
        };
        let paths = layout.paths_for(&sheet.name);
        write_artifacts(&set, &paths, emitter)?;
        info!(
            "=>>> Completed generating final tfvars file {}",
            paths.final_tfvars.display()
        );
        reports.push(SheetReport {
            sheet: sheet.name.clone(),
            records: set.len(),
            paths,
        });
    }
    Ok(reports)
}

fn write_artifacts(set: &ResourceSet, paths: &ArtifactPaths, emitter: Emitter) -> Result<()> {
    set.validate()?;

    write_file(&paths.json, &to_pretty_json(set)?)?;
    write_file(&paths.intermediate_tfvars, &to_assignment_block(set)?)?;

    let tfvars = emitter.generator().generate(set)?;
    write_file(&paths.final_tfvars, &tfvars)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory {}", path.display()))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}
