//! Persisting slice corrections back to a workspace.

use anyhow::{bail, Context};
use log::info;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::output::write_corrections_csv;

/// Saves the corrected names and slice associations of every ROI, listed
/// in workspace ROI order. Uncorrected ROIs carry `""` and an empty list.
pub trait WorkspaceWriter {
    fn update_workspace_corrected(
        &mut self,
        names: &[String],
        associations: &[Vec<u32>],
        source: &Path,
        destination: &Path,
    ) -> anyhow::Result<()>;
}

impl<W: WorkspaceWriter + ?Sized> WorkspaceWriter for Box<W> {
    fn update_workspace_corrected(
        &mut self,
        names: &[String],
        associations: &[Vec<u32>],
        source: &Path,
        destination: &Path,
    ) -> anyhow::Result<()> {
        (**self).update_workspace_corrected(names, associations, source, destination)
    }
}

/// Runs the DENSEanalysis `update_workspace_corrected` function in a batch MATLAB process.
#[derive(Debug, Clone)]
pub struct MatlabBatchWriter {
    executable: PathBuf,
    script_dir: Option<PathBuf>,
}

impl MatlabBatchWriter {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            script_dir: None,
        }
    }

    /// Folder added to the MATLAB path before the call.
    pub fn with_script_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.script_dir = Some(dir.into());
        self
    }

    /// The statement passed to `matlab -batch`.
    pub fn batch_statement(
        &self,
        names: &[String],
        associations: &[Vec<u32>],
        source: &Path,
        destination: &Path,
    ) -> String {
        let names = names
            .iter()
            .map(|n| matlab_string(n))
            .collect::<Vec<_>>()
            .join(", ");
        let assoc = associations
            .iter()
            .map(|a| {
                let idx = a.iter().map(|i| i.to_string()).collect::<Vec<_>>();
                format!("[{}]", idx.join(" "))
            })
            .collect::<Vec<_>>()
            .join(", ");
        let call = format!(
            "update_workspace_corrected({{{}}}, {{{}}}, {}, {})",
            names,
            assoc,
            matlab_string(&source.to_string_lossy()),
            matlab_string(&destination.to_string_lossy())
        );
        match &self.script_dir {
            Some(dir) => format!("addpath({}); {}", matlab_string(&dir.to_string_lossy()), call),
            None => call,
        }
    }
}

/// Single-quoted MATLAB char array.
fn matlab_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

impl WorkspaceWriter for MatlabBatchWriter {
    fn update_workspace_corrected(
        &mut self,
        names: &[String],
        associations: &[Vec<u32>],
        source: &Path,
        destination: &Path,
    ) -> anyhow::Result<()> {
        let statement = self.batch_statement(names, associations, source, destination);
        info!("Running {:?} -batch {}", self.executable, statement);
        let status = Command::new(&self.executable)
            .arg("-batch")
            .arg(&statement)
            .status()
            .with_context(|| format!("failed to start {:?}", self.executable))?;
        if !status.success() {
            bail!("MATLAB exited with {} while saving {:?}", status, destination);
        }
        Ok(())
    }
}

/// Writes corrections to a `<stem>_corrections.csv` file next to the
/// destination instead of rewriting the workspace itself.
#[derive(Debug, Clone, Default)]
pub struct CsvCorrectionsWriter;

impl CsvCorrectionsWriter {
    pub fn sidecar_path(destination: &Path) -> PathBuf {
        let stem = destination
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "workspace".to_string());
        destination.with_file_name(format!("{}_corrections.csv", stem))
    }
}

impl WorkspaceWriter for CsvCorrectionsWriter {
    fn update_workspace_corrected(
        &mut self,
        names: &[String],
        associations: &[Vec<u32>],
        source: &Path,
        destination: &Path,
    ) -> anyhow::Result<()> {
        let path = Self::sidecar_path(destination);
        write_corrections_csv(&path, names, associations)?;
        info!("Wrote corrections of {:?} to {:?}", source, path);
        Ok(())
    }
}

#[cfg(test)]
mod engine_tests {
    use super::*;

    #[test]
    fn test_batch_statement_encodes_cell_arrays() {
        let writer = MatlabBatchWriter::new("matlab");
        let statement = writer.batch_statement(
            &["mid".to_string(), String::new()],
            &[vec![1, 2, 3], vec![]],
            Path::new("/data/case.dns"),
            Path::new("/out/case.dns"),
        );
        assert_eq!(
            statement,
            "update_workspace_corrected({'mid', ''}, {[1 2 3], []}, '/data/case.dns', '/out/case.dns')"
        );
    }

    #[test]
    fn test_batch_statement_escapes_quotes_and_adds_path() {
        let writer = MatlabBatchWriter::new("matlab").with_script_dir("/opt/dense");
        let statement = writer.batch_statement(
            &["4ch".to_string()],
            &[vec![4]],
            Path::new("/data/o'brien.dns"),
            Path::new("/data/o'brien.dns"),
        );
        assert!(statement.starts_with("addpath('/opt/dense'); update_workspace_corrected("));
        assert!(statement.contains("'/data/o''brien.dns'"));
    }

    #[test]
    fn test_missing_matlab_executable_is_an_error() {
        let mut writer = MatlabBatchWriter::new("/nonexistent/densevis-matlab");
        let res = writer.update_workspace_corrected(
            &[],
            &[],
            Path::new("in.dns"),
            Path::new("out.dns"),
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_sidecar_path_uses_destination_stem() {
        assert_eq!(
            CsvCorrectionsWriter::sidecar_path(Path::new("/out/case.dns")),
            PathBuf::from("/out/case_corrections.csv")
        );
    }

    #[test]
    fn test_csv_writer_creates_sidecar() {
        let dir = std::env::temp_dir().join("densevis_engine_csv_test");
        std::fs::create_dir_all(&dir).unwrap();
        let destination = dir.join("case.dns");
        let mut writer: Box<dyn WorkspaceWriter> = Box::new(CsvCorrectionsWriter);
        writer
            .update_workspace_corrected(
                &["base".to_string(), String::new()],
                &[vec![1, 2, 3], vec![]],
                Path::new("case.dns"),
                &destination,
            )
            .unwrap();

        let text = std::fs::read_to_string(dir.join("case_corrections.csv")).unwrap();
        assert!(text.starts_with("roi_index,category,seq_indices"));
        assert!(text.contains("1,base,1 2 3"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
