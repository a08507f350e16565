use crate::generator::Emitter;
use crate::parser::assembler::AssemblerOptions;
use std::path::{Path, PathBuf};

/// Everything a conversion run needs to know.
///
/// Relative paths are resolved against `workdir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionConfig {
    /// Project directory holding the workbook and the artifact directories.
    pub workdir: PathBuf,
    /// The workbook to convert.
    pub input: PathBuf,
    /// Directory for the JSON document and the pre-reformat block.
    pub intermediate_dir: PathBuf,
    /// Directory for the final tfvars files.
    pub output_dir: PathBuf,
    pub emitter: Emitter,
    pub assembler: AssemblerOptions,
}

impl Default for ConversionConfig {
    /// Returns the default configuration.
    ///
    /// Default values:
    /// - `workdir`: "."
    /// - `input`: "input.xlsx"
    /// - `intermediate_dir`: "intermediate"
    /// - `output_dir`: "output"
    /// - `emitter`: `Emitter::Legacy`
    /// - `assembler`: strict booleans, malformed cells degrade
    fn default() -> Self {
        ConversionConfig {
            workdir: PathBuf::from("."),
            input: PathBuf::from("input.xlsx"),
            intermediate_dir: PathBuf::from("intermediate"),
            output_dir: PathBuf::from("output"),
            emitter: Emitter::default(),
            assembler: AssemblerOptions::default(),
        }
    }
}

impl ConversionConfig {
    pub fn input_path(&self) -> PathBuf {
        self.workdir.join(&self.input)
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout {
            intermediate_dir: self.workdir.join(&self.intermediate_dir),
            output_dir: self.workdir.join(&self.output_dir),
        }
    }
}

/// Resolved artifact directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub intermediate_dir: PathBuf,
    pub output_dir: PathBuf,
}

/// The three files written for one sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub json: PathBuf,
    pub intermediate_tfvars: PathBuf,
    pub final_tfvars: PathBuf,
}

impl OutputLayout {
    pub fn new(intermediate_dir: &Path, output_dir: &Path) -> Self {
        OutputLayout {
            intermediate_dir: intermediate_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// `<intermediate>/<sheet>.json`, `<intermediate>/<sheet>.tfvars` and
    /// `<output>/final-<sheet>.tfvars`.
    pub fn paths_for(&self, sheet_name: &str) -> ArtifactPaths {
        ArtifactPaths {
            json: self.intermediate_dir.join(format!("{}.json", sheet_name)),
            intermediate_tfvars: self.intermediate_dir.join(format!("{}.tfvars", sheet_name)),
            final_tfvars: self.output_dir.join(format!("final-{}.tfvars", sheet_name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_config_default() {
        let config = ConversionConfig::default();
        assert_eq!(config.input_path(), PathBuf::from("./input.xlsx"));
        assert_eq!(config.emitter, Emitter::Legacy);
        assert_eq!(config.assembler, AssemblerOptions::default());

        let layout = config.layout();
        assert_eq!(layout.intermediate_dir, PathBuf::from("./intermediate"));
        assert_eq!(layout.output_dir, PathBuf::from("./output"));
    }

    #[test]
    fn test_paths_for() {
        let layout = OutputLayout::new(Path::new("/work/intermediate"), Path::new("/work/output"));
        let paths = layout.paths_for("vcns");
        assert_eq!(paths.json, PathBuf::from("/work/intermediate/vcns.json"));
        assert_eq!(
            paths.intermediate_tfvars,
            PathBuf::from("/work/intermediate/vcns.tfvars")
        );
        assert_eq!(paths.final_tfvars, PathBuf::from("/work/output/final-vcns.tfvars"));
    }

    #[test]
    fn test_absolute_input_ignores_workdir() {
        let config = ConversionConfig {
            workdir: PathBuf::from("/work"),
            input: PathBuf::from("/data/infra.xlsx"),
            ..Default::default()
        };
        assert_eq!(config.input_path(), PathBuf::from("/data/infra.xlsx"));
    }
}
