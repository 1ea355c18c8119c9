//! Contour overlays for DENSE cardiac MRI workspaces.
//!
//! ROI anchor points are turned into smooth endocardial and epicardial curves
//! (`contour`), drawn over the slice images (`render`), and reviewed through a
//! command-driven viewer session that can reassign ROIs to slices and save the
//! corrections back (`session`, `io::engine`).

pub mod config;
pub mod contour;
pub mod error;
pub mod io;
pub mod render;
pub mod session;
mod utils;

#[cfg(feature = "python")]
mod python_bind;

pub use contour::{
    reconstruct, reconstruct_tagged, AnchorSet, ContourPair, Orientation, ReconstructedCurve,
    CURVE_SAMPLES,
};
pub use error::{ContourError, WorkspaceError};
pub use io::{RoiId, Workspace};
pub use render::{assemble_paths, render, render_pair, render_tagged, Canvas, RasterCanvas, StrokeStyle};
pub use session::{Command, Outcome, ViewerSession};
