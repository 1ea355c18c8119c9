use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Scalars and single-element structs collapse to bare values in exported
/// MATLAB data, so list fields accept either form.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(v) => vec![v],
        OneOrMany::Many(v) => v,
    })
}

/// Endocardial and epicardial anchor points of one frame, 1-based pixel coordinates.
pub type FramePosition = (Vec<[f64; 2]>, Vec<[f64; 2]>);

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SeqRecord {
    #[serde(rename = "ProtocolName")]
    pub protocol_name: String,
}

/// One DENSE slice: magnitude image plus its phase images (null when absent).
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DnsRecord {
    #[serde(rename = "MagIndex", deserialize_with = "one_or_many")]
    pub mag_index: Vec<u32>,
    #[serde(rename = "PhaIndex", default, deserialize_with = "one_or_many")]
    pub pha_index: Vec<Option<u32>>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RoiRecord {
    #[serde(rename = "UID", default)]
    pub uid: Option<String>,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "SeqIndex", deserialize_with = "one_or_many")]
    pub seq_index: Vec<u32>,
    #[serde(rename = "Type")]
    pub roi_type: String,
    #[serde(rename = "Position", default)]
    pub position: Vec<FramePosition>,
    #[serde(rename = "CorrectedNames", default)]
    pub corrected_name: Option<String>,
    #[serde(rename = "CorrectedSeqIndex", default, deserialize_with = "one_or_many")]
    pub corrected_seq_index: Vec<u32>,
}

/// Frames of one image sequence, each stored row-major.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ImageStack {
    pub rows: usize,
    pub cols: usize,
    pub frames: Vec<Vec<f32>>,
}

impl ImageStack {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Frame by 1-based index.
    pub fn frame(&self, frame: u32) -> Option<FrameImage> {
        let idx = (frame as usize).checked_sub(1)?;
        let pixels = self.frames.get(idx)?;
        FrameImage::new(self.rows, self.cols, pixels.clone()).ok()
    }
}

/// The subset of a DENSE workspace the viewer reads.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct WorkspaceRecord {
    #[serde(deserialize_with = "one_or_many")]
    pub seq: Vec<SeqRecord>,
    #[serde(deserialize_with = "one_or_many")]
    pub img: Vec<ImageStack>,
    #[serde(deserialize_with = "one_or_many")]
    pub dns: Vec<DnsRecord>,
    #[serde(deserialize_with = "one_or_many")]
    pub roi: Vec<RoiRecord>,
}

pub fn read_workspace_record<P: AsRef<Path>>(path: P) -> Result<WorkspaceRecord> {
    let file = File::open(&path)
        .with_context(|| format!("failed to open workspace {:?}", path.as_ref()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse workspace {:?}", path.as_ref()))
}

/// One greyscale frame, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameImage {
    rows: usize,
    cols: usize,
    pixels: Vec<f32>,
}

impl FrameImage {
    pub fn new(rows: usize, cols: usize, pixels: Vec<f32>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            bail!("frame must not be empty, got {}x{}", rows, cols);
        }
        if pixels.len() != rows * cols {
            bail!(
                "frame of {}x{} needs {} pixels, got {}",
                rows,
                cols,
                rows * cols,
                pixels.len()
            );
        }
        Ok(Self { rows, cols, pixels })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.pixels[row * self.cols + col])
    }

    /// 8-bit grey levels spanning the frame's own min..max range.
    /// A flat frame maps to black, non-finite samples too.
    pub fn to_grey_u8(&self) -> Vec<u8> {
        let (min, max) = self
            .pixels
            .iter()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let range = max - min;
        self.pixels
            .iter()
            .map(|&v| {
                if !v.is_finite() || !(range > 0.0) {
                    0
                } else {
                    (((v - min) / range) * 255.0).round() as u8
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod input_tests {
    use super::*;
    use crate::utils::test_utils::workspace_json;

    #[test]
    fn test_workspace_record_parses_scalar_and_list_fields() {
        let record: WorkspaceRecord = serde_json::from_str(&workspace_json()).unwrap();
        assert_eq!(record.seq.len(), 5);
        assert_eq!(record.dns[0].mag_index, vec![1]);
        assert_eq!(record.dns[0].pha_index, vec![Some(2), Some(3)]);
        assert_eq!(record.dns[1].pha_index, vec![Some(5), None]);
        assert_eq!(record.roi[0].seq_index, vec![1]);
        assert_eq!(record.roi[1].seq_index, vec![4, 5]);
        assert_eq!(record.roi[0].position.len(), 2);
        assert_eq!(record.roi[0].position[0].0.len(), 4);
        assert_eq!(record.roi[0].corrected_name, None);
    }

    #[test]
    fn test_single_roi_object_is_accepted() {
        let json = r#"{
            "seq": {"ProtocolName": "SA base"},
            "img": {"rows": 1, "cols": 1, "frames": [[0.0]]},
            "dns": {"MagIndex": 1},
            "roi": {"Name": "only", "SeqIndex": 1, "Type": "SA"}
        }"#;
        let record: WorkspaceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.roi.len(), 1);
        assert_eq!(record.dns.len(), 1);
        assert!(record.dns[0].pha_index.is_empty());
        assert!(record.roi[0].position.is_empty());
    }

    #[test]
    fn test_image_stack_frames_are_one_based() {
        let stack = ImageStack {
            rows: 1,
            cols: 2,
            frames: vec![vec![1.0, 2.0], vec![3.0, 4.0]],
        };
        assert_eq!(stack.frame(0), None);
        assert_eq!(stack.frame(2).unwrap().get(0, 1), Some(4.0));
        assert_eq!(stack.frame(3), None);
    }

    #[test]
    fn test_frame_image_checks_dimensions() {
        assert!(FrameImage::new(2, 2, vec![0.0; 3]).is_err());
        assert!(FrameImage::new(0, 2, vec![]).is_err());
    }

    #[test]
    fn test_grey_levels_ignore_non_finite_samples() {
        let frame = FrameImage::new(1, 4, vec![0.0, f32::NAN, 2.0, 1.0]).unwrap();
        assert_eq!(frame.to_grey_u8(), vec![0, 0, 255, 128]);

        let flat = FrameImage::new(1, 2, vec![3.0, 3.0]).unwrap();
        assert_eq!(flat.to_grey_u8(), vec![0, 0]);
    }
}
