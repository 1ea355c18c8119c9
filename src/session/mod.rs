//! Viewer state driven by explicit commands instead of widget callbacks.

pub mod associations;
pub mod view;

pub use associations::{entry_text, AssociationTable, Correction, SliceCategory};
pub use view::{compose_frame_view, draw_frame_view, FrameView, Panel, PanelImage};

use log::info;
use std::path::{Path, PathBuf};

use crate::error::WorkspaceError;
use crate::io::engine::WorkspaceWriter;
use crate::io::{RoiId, Workspace};

pub const MISSING_CATEGORY_WARNING: &str =
    "Cannot apply corrections. Please select a slice category and retry.";

pub const OVERWRITE_CONFIRMATION: &str = "You did not specify any output folder. By default, \
the input file will be overwritten. If this is not the intended behaviour, please select the \
output folder first. Do you wish to proceed with the saving? (This message will appear only once.)";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// 0-based index into the workspace slices.
    SelectSlice(usize),
    /// 1-based frame, clamped to the current slice.
    SetFrame(u32),
    SelectRoi(RoiId),
    ClearSelection,
    ChooseCategory(SliceCategory),
    ApplyCategory,
    DeleteSelected,
    DeleteAll,
    SetOutputFolder(PathBuf),
    Save,
    ConfirmSave(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The displayed frame or ROI list changed.
    Redraw,
    Unchanged,
    Warning(String),
    /// Save is on hold until a [`Command::ConfirmSave`] answers this question.
    ConfirmationRequired(String),
    Saved(PathBuf),
}

/// One row of the ROI list.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiEntry {
    pub id: RoiId,
    pub text: String,
    pub enabled: bool,
}

pub struct ViewerSession<W: WorkspaceWriter> {
    workspace: Workspace,
    source: PathBuf,
    writer: W,
    slice: usize,
    frame: u32,
    selected: Option<RoiId>,
    category: Option<SliceCategory>,
    associations: AssociationTable,
    output_folder: PathBuf,
    user_set_output: bool,
    awaiting_confirmation: bool,
}

impl<W: WorkspaceWriter> ViewerSession<W> {
    /// Opens `workspace`, loaded from `source`, on its first slice and frame.
    pub fn new(workspace: Workspace, source: impl Into<PathBuf>, writer: W) -> Self {
        let source = source.into();
        let output_folder = source
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let associations = AssociationTable::from_workspace(&workspace);
        Self {
            workspace,
            source,
            writer,
            slice: 0,
            frame: 1,
            selected: None,
            category: None,
            associations,
            output_folder,
            user_set_output: false,
            awaiting_confirmation: false,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn slice_index(&self) -> usize {
        self.slice
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn selected_roi(&self) -> Option<&RoiId> {
        self.selected.as_ref()
    }

    pub fn category(&self) -> Option<SliceCategory> {
        self.category
    }

    pub fn associations(&self) -> &AssociationTable {
        &self.associations
    }

    /// Frames available in the current slice.
    pub fn frame_count(&self) -> usize {
        self.workspace
            .slices()
            .get(self.slice)
            .map(|s| self.workspace.slice_frame_count(s))
            .unwrap_or(0)
    }

    /// Where a save writes: the output folder joined with the workspace file name.
    pub fn output_target(&self) -> PathBuf {
        match self.source.file_name() {
            Some(name) => self.output_folder.join(name),
            None => self.output_folder.clone(),
        }
    }

    pub fn roi_entries(&self) -> Vec<RoiEntry> {
        self.workspace
            .rois()
            .iter()
            .map(|roi| RoiEntry {
                id: roi.id().clone(),
                text: entry_text(roi, self.associations.get(roi.id())),
                enabled: roi.is_enabled(),
            })
            .collect()
    }

    /// View of the current slice and frame with `panels` image slots.
    pub fn frame_view(&self, panels: usize) -> Result<FrameView, WorkspaceError> {
        compose_frame_view(
            &self.workspace,
            self.slice,
            self.frame,
            self.selected.as_ref(),
            panels,
        )
    }

    fn clamp_frame(&self, frame: u32) -> u32 {
        let max = self.frame_count().max(1) as u32;
        frame.clamp(1, max)
    }

    pub fn dispatch(&mut self, command: Command) -> anyhow::Result<Outcome> {
        match command {
            Command::SelectSlice(index) => {
                self.workspace.slice(index)?;
                self.slice = index;
                self.frame = self.clamp_frame(self.frame);
                Ok(Outcome::Redraw)
            }
            Command::SetFrame(frame) => {
                let frame = self.clamp_frame(frame);
                if frame == self.frame {
                    return Ok(Outcome::Unchanged);
                }
                self.frame = frame;
                Ok(Outcome::Redraw)
            }
            Command::SelectRoi(id) => {
                let roi = self.workspace.roi(&id)?;
                if !roi.is_enabled() {
                    return Err(WorkspaceError::DisabledRoi(id.to_string()).into());
                }
                self.selected = Some(id);
                Ok(Outcome::Redraw)
            }
            Command::ClearSelection => {
                self.selected = None;
                Ok(Outcome::Redraw)
            }
            Command::ChooseCategory(category) => {
                self.category = Some(category);
                Ok(Outcome::Unchanged)
            }
            Command::ApplyCategory => self.apply_category(),
            Command::DeleteSelected => match &self.selected {
                Some(id) => {
                    self.associations.remove(id);
                    Ok(Outcome::Redraw)
                }
                None => Ok(Outcome::Unchanged),
            },
            Command::DeleteAll => {
                self.associations.clear();
                Ok(Outcome::Redraw)
            }
            Command::SetOutputFolder(folder) => {
                self.output_folder = folder;
                self.user_set_output = true;
                Ok(Outcome::Unchanged)
            }
            Command::Save => {
                if !self.user_set_output {
                    // asked once only, whatever the answer
                    self.user_set_output = true;
                    self.awaiting_confirmation = true;
                    return Ok(Outcome::ConfirmationRequired(
                        OVERWRITE_CONFIRMATION.to_string(),
                    ));
                }
                self.save()
            }
            Command::ConfirmSave(proceed) => {
                if !std::mem::take(&mut self.awaiting_confirmation) {
                    return Ok(Outcome::Unchanged);
                }
                if proceed {
                    self.save()
                } else {
                    Ok(Outcome::Unchanged)
                }
            }
        }
    }

    fn apply_category(&mut self) -> anyhow::Result<Outcome> {
        let Some(id) = self.selected.clone() else {
            return Ok(Outcome::Unchanged);
        };
        let Some(category) = self.category else {
            return Ok(Outcome::Warning(MISSING_CATEGORY_WARNING.to_string()));
        };
        let slice = self.workspace.slice(self.slice)?;
        let seq_indices = slice.image_indices.iter().map(|&i| i as u32).collect();
        self.associations.set(
            id,
            Correction {
                category,
                seq_indices,
            },
        );
        Ok(Outcome::Redraw)
    }

    fn save(&mut self) -> anyhow::Result<Outcome> {
        let destination = self.output_target();
        let (names, associations) = self.associations.to_positional(self.workspace.rois());
        self.writer
            .update_workspace_corrected(&names, &associations, &self.source, &destination)?;
        info!(
            "Saved {} corrections of {:?} to {:?}",
            self.associations.len(),
            self.source,
            destination
        );
        Ok(Outcome::Saved(destination))
    }
}
