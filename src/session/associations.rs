use log::warn;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::io::{Roi, RoiId, Workspace};

/// Anatomical position a ROI is reassigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliceCategory {
    Base,
    Mid,
    Apex,
    TwoChamber,
    ThreeChamber,
    FourChamber,
}

impl SliceCategory {
    pub const ALL: [SliceCategory; 6] = [
        SliceCategory::Base,
        SliceCategory::Mid,
        SliceCategory::Apex,
        SliceCategory::TwoChamber,
        SliceCategory::ThreeChamber,
        SliceCategory::FourChamber,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SliceCategory::Base => "base",
            SliceCategory::Mid => "mid",
            SliceCategory::Apex => "apex",
            SliceCategory::TwoChamber => "2ch",
            SliceCategory::ThreeChamber => "3ch",
            SliceCategory::FourChamber => "4ch",
        }
    }
}

impl FromStr for SliceCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "unknown slice category {:?}, expected one of base, mid, apex, 2ch, 3ch, 4ch",
                    s
                )
            })
    }
}

impl fmt::Display for SliceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-set association between a ROI and the images of a slice.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub category: SliceCategory,
    /// 1-based image indices of the slice.
    pub seq_indices: Vec<u32>,
}

/// Corrections keyed by ROI identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssociationTable {
    entries: HashMap<RoiId, Correction>,
}

impl AssociationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table seeded with the corrections an earlier save stored in the workspace.
    pub fn from_workspace(workspace: &Workspace) -> Self {
        let mut table = Self::new();
        for roi in workspace.rois() {
            let Some(stored) = roi.stored_correction() else {
                continue;
            };
            match stored.name.parse::<SliceCategory>() {
                Ok(category) => table.set(
                    roi.id().clone(),
                    Correction {
                        category,
                        seq_indices: stored.seq_indices.clone(),
                    },
                ),
                Err(e) => warn!("Ignoring stored correction of ROI {}: {}", roi.id(), e),
            }
        }
        table
    }

    pub fn get(&self, id: &RoiId) -> Option<&Correction> {
        self.entries.get(id)
    }

    pub fn set(&mut self, id: RoiId, correction: Correction) {
        self.entries.insert(id, correction);
    }

    pub fn remove(&mut self, id: &RoiId) -> Option<Correction> {
        self.entries.remove(id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name and association lists aligned with `rois`, as a workspace writer expects.
    pub fn to_positional(&self, rois: &[Roi]) -> (Vec<String>, Vec<Vec<u32>>) {
        rois.iter()
            .map(|roi| match self.get(roi.id()) {
                Some(c) => (c.category.to_string(), c.seq_indices.clone()),
                None => (String::new(), Vec::new()),
            })
            .unzip()
    }
}

/// Text of a ROI list row: `Name\tSeq`, decorated as
/// `category - Name\tSeq\t[i, j, k]` once a correction exists.
pub fn entry_text(roi: &Roi, correction: Option<&Correction>) -> String {
    let base = roi.list_label();
    match correction {
        None => base,
        Some(c) => {
            let indices = c
                .seq_indices
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} - {}\t[{}]", c.category, base, indices)
        }
    }
}
