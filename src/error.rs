use thiserror::Error;

/// Errors raised while turning anchor points into contour curves.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContourError {
    #[error("ROI orientation axis should be either SA or LA, got {0:?}")]
    InvalidOrientation(String),

    #[error("degenerate {boundary} anchor set: {reason}")]
    DegenerateAnchorSet {
        boundary: &'static str,
        reason: String,
    },
}

impl ContourError {
    pub(crate) fn degenerate(boundary: &'static str, reason: impl Into<String>) -> Self {
        Self::DegenerateAnchorSet {
            boundary,
            reason: reason.into(),
        }
    }
}

/// Errors raised when the viewer asks the workspace for something it does not hold.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkspaceError {
    #[error("no image data for image {image_index} at frame {frame}")]
    MissingFrameData { image_index: usize, frame: u32 },

    #[error("ROI {0} has no anchor positions for frame {1}")]
    MissingAnchors(String, u32),

    #[error("unknown ROI {0}")]
    UnknownRoi(String),

    #[error("ROI {0} is neither short-axis nor long-axis and cannot be selected")]
    DisabledRoi(String),

    #[error("slice {index} out of range (workspace has {count} slices)")]
    SliceOutOfRange { index: usize, count: usize },
}
