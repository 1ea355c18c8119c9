use anyhow::{bail, Context};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::render::RasterCanvas;

#[derive(Debug, Serialize)]
struct CorrectionRow<'a> {
    roi_index: usize,
    category: &'a str,
    seq_indices: String,
}

/// One row per ROI, 1-based ROI position first. Uncorrected ROIs keep an empty category.
pub fn write_corrections_csv(
    path: &Path,
    names: &[String],
    associations: &[Vec<u32>],
) -> anyhow::Result<()> {
    if names.len() != associations.len() {
        bail!(
            "got {} correction names but {} associations",
            names.len(),
            associations.len()
        );
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for (i, (name, assoc)) in names.iter().zip(associations).enumerate() {
        writer.serialize(CorrectionRow {
            roi_index: i + 1,
            category: name,
            seq_indices: assoc
                .iter()
                .map(|idx| idx.to_string())
                .collect::<Vec<_>>()
                .join(" "),
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// `frame_007_panel_2.png` for the second panel of frame 7.
pub fn panel_file_name(frame: u32, panel: usize) -> String {
    format!("frame_{:03}_panel_{}.png", frame, panel)
}

/// Saves one PNG per panel (numbered from 1) and returns the written paths.
pub fn write_frame_panels(
    dir: &Path,
    frame: u32,
    panels: &[RasterCanvas],
) -> anyhow::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let mut written = Vec::with_capacity(panels.len());
    for (i, canvas) in panels.iter().enumerate() {
        let path = dir.join(panel_file_name(frame, i + 1));
        canvas.save_png(&path)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod output_tests {
    use super::*;

    #[test]
    fn test_mismatched_lists_are_rejected() {
        let path = std::env::temp_dir().join("densevis_mismatch.csv");
        let res = write_corrections_csv(&path, &["mid".to_string()], &[]);
        assert!(res.is_err());
    }

    #[test]
    fn test_corrections_csv_layout() {
        let path = std::env::temp_dir().join("densevis_output_corrections.csv");
        write_corrections_csv(
            &path,
            &[String::new(), "apex".to_string()],
            &[vec![], vec![7, 8]],
        )
        .unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec!["roi_index,category,seq_indices", "1,,", "2,apex,7 8"]
        );
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_panels_are_written_as_png() {
        let dir = std::env::temp_dir().join("densevis_output_panels");
        let panels = vec![
            RasterCanvas::blank(4, 3, 2).unwrap(),
            RasterCanvas::blank(4, 3, 2).unwrap(),
        ];
        let written = write_frame_panels(&dir, 5, &panels).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[1].ends_with("frame_005_panel_2.png"));
        let img = image::open(&written[0]).unwrap();
        assert_eq!((img.width(), img.height()), (8, 6));
        fs::remove_dir_all(&dir).ok();
    }
}
