pub mod engine;
pub mod input;
pub mod output;

use anyhow::{bail, Context};
use input::{read_workspace_record, FramePosition, FrameImage, ImageStack, WorkspaceRecord};
use log::info;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::contour::{AnchorSet, Orientation};
use crate::error::{ContourError, WorkspaceError};

/// Stable ROI identity: the workspace UID when present, otherwise the ROI's position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoiId(String);

impl RoiId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A DENSE slice: its protocol name and the 1-based indices of its images
/// (magnitude first, then the phase images present).
#[derive(Debug, Clone, PartialEq)]
pub struct SliceEntry {
    pub protocol: String,
    pub image_indices: Vec<usize>,
}

impl SliceEntry {
    /// Text shown in the slice chooser, e.g. `"SA base - [1] [2] [3]"`.
    pub fn label(&self) -> String {
        let mut text = format!("{} -", self.protocol);
        for idx in &self.image_indices {
            text.push_str(&format!(" [{}]", idx));
        }
        text
    }
}

/// Correction already stored in the workspace by an earlier save.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCorrection {
    pub name: String,
    pub seq_indices: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Roi {
    id: RoiId,
    name: String,
    seq_index: Vec<u32>,
    type_tag: String,
    positions: Vec<FramePosition>,
    stored: Option<StoredCorrection>,
}

impl Roi {
    pub fn id(&self) -> &RoiId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn seq_index(&self) -> &[u32] {
        &self.seq_index
    }

    /// Raw `Type` tag as stored in the workspace.
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn orientation(&self) -> Result<Orientation, ContourError> {
        self.type_tag.parse()
    }

    /// Only short-axis and long-axis ROIs can be selected for display.
    pub fn is_enabled(&self) -> bool {
        self.orientation().is_ok()
    }

    pub fn frame_count(&self) -> usize {
        self.positions.len()
    }

    /// Endocardial and epicardial anchors at a 1-based frame.
    pub fn frame_anchors(&self, frame: u32) -> Result<(AnchorSet, AnchorSet), WorkspaceError> {
        let (endo, epi) = (frame as usize)
            .checked_sub(1)
            .and_then(|i| self.positions.get(i))
            .ok_or_else(|| WorkspaceError::MissingAnchors(self.id.to_string(), frame))?;
        Ok((AnchorSet::from_pairs(endo), AnchorSet::from_pairs(epi)))
    }

    pub fn stored_correction(&self) -> Option<&StoredCorrection> {
        self.stored.as_ref()
    }

    /// `Name<TAB>SeqIndex`, the undecorated ROI list text.
    pub fn list_label(&self) -> String {
        let seq = match self.seq_index.as_slice() {
            [single] => single.to_string(),
            many => format!(
                "[{}]",
                many.iter()
                    .map(|i| i.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        };
        format!("{}\t{}", self.name, seq)
    }
}

/// A loaded DENSEanalysis workspace.
#[derive(Debug, Clone)]
pub struct Workspace {
    slices: Vec<SliceEntry>,
    rois: Vec<Roi>,
    images: Vec<ImageStack>,
    has_corrections: bool,
}

impl Workspace {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let record = read_workspace_record(&path)?;
        let workspace = Self::from_record(record)
            .with_context(|| format!("invalid workspace {:?}", path.as_ref()))?;
        info!(
            "Loaded workspace {:?}: {} slices, {} ROIs, {} image stacks",
            path.as_ref(),
            workspace.slices.len(),
            workspace.rois.len(),
            workspace.images.len()
        );
        Ok(workspace)
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let record: WorkspaceRecord =
            serde_json::from_str(json).context("failed to parse workspace JSON")?;
        Self::from_record(record)
    }

    pub fn from_record(record: WorkspaceRecord) -> anyhow::Result<Self> {
        for (i, stack) in record.img.iter().enumerate() {
            for (f, frame) in stack.frames.iter().enumerate() {
                if frame.len() != stack.rows * stack.cols {
                    bail!(
                        "image {} frame {} has {} pixels, expected {}x{}",
                        i + 1,
                        f + 1,
                        frame.len(),
                        stack.rows,
                        stack.cols
                    );
                }
            }
        }

        let mut slices = Vec::with_capacity(record.dns.len());
        for (i, dns) in record.dns.iter().enumerate() {
            let Some(&mag) = dns.mag_index.first() else {
                bail!("slice {} has no magnitude image", i + 1);
            };
            let image_indices: Vec<usize> = std::iter::once(mag)
                .chain(dns.pha_index.iter().flatten().copied())
                .map(|idx| idx as usize)
                .collect();
            let protocol = record
                .seq
                .get(image_indices[0].saturating_sub(1))
                .map(|s| s.protocol_name.clone())
                .with_context(|| {
                    format!("slice {} refers to missing sequence {}", i + 1, mag)
                })?;
            slices.push(SliceEntry {
                protocol,
                image_indices,
            });
        }

        let has_corrections = record.roi.iter().any(|r| r.corrected_name.is_some());
        let mut seen = HashSet::new();
        let mut rois = Vec::with_capacity(record.roi.len());
        for (pos, raw) in record.roi.into_iter().enumerate() {
            let id = RoiId(raw.uid.unwrap_or_else(|| format!("roi-{}", pos)));
            if !seen.insert(id.clone()) {
                bail!("duplicate ROI identifier {}", id);
            }
            let stored = raw
                .corrected_name
                .filter(|name| !name.is_empty())
                .map(|name| StoredCorrection {
                    name,
                    seq_indices: raw.corrected_seq_index,
                });
            rois.push(Roi {
                id,
                name: raw.name,
                seq_index: raw.seq_index,
                type_tag: raw.roi_type,
                positions: raw.position,
                stored,
            });
        }

        Ok(Self {
            slices,
            rois,
            images: record.img,
            has_corrections,
        })
    }

    pub fn slices(&self) -> &[SliceEntry] {
        &self.slices
    }

    pub fn slice(&self, index: usize) -> Result<&SliceEntry, WorkspaceError> {
        self.slices.get(index).ok_or(WorkspaceError::SliceOutOfRange {
            index,
            count: self.slices.len(),
        })
    }

    pub fn rois(&self) -> &[Roi] {
        &self.rois
    }

    pub fn roi(&self, id: &RoiId) -> Result<&Roi, WorkspaceError> {
        self.rois
            .iter()
            .find(|r| &r.id == id)
            .ok_or_else(|| WorkspaceError::UnknownRoi(id.to_string()))
    }

    /// Whether an earlier save left corrections in the workspace.
    pub fn has_corrections(&self) -> bool {
        self.has_corrections
    }

    /// Frame of a 1-based image index at a 1-based frame.
    pub fn frame_image(&self, image_index: usize, frame: u32) -> Result<FrameImage, WorkspaceError> {
        image_index
            .checked_sub(1)
            .and_then(|i| self.images.get(i))
            .and_then(|stack| stack.frame(frame))
            .ok_or(WorkspaceError::MissingFrameData { image_index, frame })
    }

    /// Frame count of a 1-based image index.
    pub fn frame_count(&self, image_index: usize) -> Option<usize> {
        image_index
            .checked_sub(1)
            .and_then(|i| self.images.get(i))
            .map(ImageStack::frame_count)
    }

    /// Row and column count of a 1-based image index.
    pub fn image_shape(&self, image_index: usize) -> Option<(usize, usize)> {
        image_index
            .checked_sub(1)
            .and_then(|i| self.images.get(i))
            .map(|s| (s.rows, s.cols))
    }

    /// Frames available for a slice, taken from its magnitude image.
    pub fn slice_frame_count(&self, slice: &SliceEntry) -> usize {
        slice
            .image_indices
            .first()
            .and_then(|&idx| self.frame_count(idx))
            .unwrap_or(0)
    }
}
