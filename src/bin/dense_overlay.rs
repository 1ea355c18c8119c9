use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use densevis::config::ViewerConfig;
use densevis::io::output::write_frame_panels;
use densevis::io::{RoiId, Workspace};
use densevis::session::view::{compose_frame_view, draw_frame_view, render_all_frames};
use densevis::session::{
    entry_text, AssociationTable, Command, Outcome, SliceCategory, ViewerSession,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "dense-overlay",
    version,
    about = "Inspect DENSE workspaces: draw ROI contours over the slice images and reassign ROIs to slices"
)]
struct Cli {
    /// Viewer configuration (TOML); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List slices and ROIs of a workspace
    List { workspace: PathBuf },

    /// Render the panels of a slice to PNG files, with the ROI contours drawn over them
    Render {
        workspace: PathBuf,

        /// Slice number as listed by `list` (1-based)
        #[arg(long, default_value = "1")]
        slice: usize,

        /// Frame number (1-based)
        #[arg(long, default_value = "1")]
        frame: u32,

        /// ROI identifier as listed by `list`
        #[arg(long)]
        roi: Option<String>,

        /// Render every frame of the slice instead of --frame
        #[arg(long)]
        all_frames: bool,

        /// Output folder for the PNG files
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Associate a ROI with a slice and save the correction
    Correct {
        workspace: PathBuf,

        /// ROI identifier as listed by `list`
        #[arg(long)]
        roi: String,

        /// Slice number as listed by `list` (1-based)
        #[arg(long)]
        slice: usize,

        /// One of base, mid, apex, 2ch, 3ch, 4ch
        #[arg(long)]
        category: String,

        /// Folder to save into; without it the workspace file is overwritten
        #[arg(long)]
        output_folder: Option<PathBuf>,

        /// Overwrite the input workspace without asking
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };

    match cli.command {
        Commands::List { workspace } => list(&workspace),
        Commands::Render {
            workspace,
            slice,
            frame,
            roi,
            all_frames,
            out,
        } => render(&config, &workspace, slice, frame, roi, all_frames, &out),
        Commands::Correct {
            workspace,
            roi,
            slice,
            category,
            output_folder,
            yes,
        } => correct(&config, &workspace, &roi, slice, &category, output_folder, yes),
    }
}

/// 1-based slice number from the command line to a workspace slice index.
fn slice_index(slice: usize) -> anyhow::Result<usize> {
    slice
        .checked_sub(1)
        .context("slice numbers start at 1")
}

fn list(path: &Path) -> anyhow::Result<()> {
    let workspace = Workspace::load(path)?;
    println!("Slices:");
    for (i, slice) in workspace.slices().iter().enumerate() {
        println!(
            "  {:>3}  {}  ({} frames)",
            i + 1,
            slice.label(),
            workspace.slice_frame_count(slice)
        );
    }
    let associations = AssociationTable::from_workspace(&workspace);
    println!("ROIs:");
    for roi in workspace.rois() {
        let flag = if roi.is_enabled() { " " } else { "x" };
        let text = entry_text(roi, associations.get(roi.id()));
        println!("  {} {:<12} {}", flag, roi.id(), text.replace('\t', "  "));
    }
    Ok(())
}

fn render(
    config: &ViewerConfig,
    path: &Path,
    slice: usize,
    frame: u32,
    roi: Option<String>,
    all_frames: bool,
    out: &Path,
) -> anyhow::Result<()> {
    let workspace = Workspace::load(path)?;
    let slice = slice_index(slice)?;
    let roi = roi.map(RoiId::new);
    let display = &config.display;
    let style = display.stroke_style();

    if all_frames {
        let entry = workspace.slice(slice)?;
        let frames = workspace.slice_frame_count(entry) as u32;
        let rendered = render_all_frames(
            &workspace,
            slice,
            frames,
            roi.as_ref(),
            display.panels,
            display.scale,
            &style,
        )?;
        for (frame, canvases) in &rendered {
            write_frame_panels(out, *frame, canvases)?;
        }
        log::info!("Rendered {} frames to {}", rendered.len(), out.display());
        return Ok(());
    }

    let view = compose_frame_view(&workspace, slice, frame, roi.as_ref(), display.panels)?;
    if roi.is_some() && view.overlay.is_none() {
        log::warn!("No contours to draw at frame {}", frame);
    }
    let canvases = draw_frame_view(&view, display.scale, &style)?;
    let written = write_frame_panels(out, frame, &canvases)?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

fn correct(
    config: &ViewerConfig,
    path: &Path,
    roi: &str,
    slice: usize,
    category: &str,
    output_folder: Option<PathBuf>,
    yes: bool,
) -> anyhow::Result<()> {
    let category: SliceCategory = category.parse()?;
    let workspace = Workspace::load(path)?;
    let mut session = ViewerSession::new(workspace, path, config.export.writer());

    let output_folder = output_folder.or_else(|| config.export.output_folder.clone());
    let steps = [
        Command::SelectSlice(slice_index(slice)?),
        Command::SelectRoi(RoiId::new(roi)),
        Command::ChooseCategory(category),
        Command::ApplyCategory,
    ];
    for step in steps {
        if let Outcome::Warning(msg) = session.dispatch(step)? {
            bail!(msg);
        }
    }
    if let Some(folder) = output_folder {
        session.dispatch(Command::SetOutputFolder(folder))?;
    }

    let mut outcome = session.dispatch(Command::Save)?;
    if let Outcome::ConfirmationRequired(msg) = &outcome {
        if !yes {
            bail!("{}\nRerun with --yes or pass --output-folder.", msg);
        }
        outcome = session.dispatch(Command::ConfirmSave(true))?;
    }
    match outcome {
        Outcome::Saved(target) => {
            println!("Saved corrections to {}", target.display());
            Ok(())
        }
        other => bail!("save did not complete: {:?}", other),
    }
}
