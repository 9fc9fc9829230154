mod manifest;
mod progress;
mod util;

use anyhow::{bail, Context, Result};
use clap::Parser;
use manifest::{Manifest, ManifestFormat, PlaylistConfig};
use progress::{ManifestSummary, ProgressConfig, ProgressMode, ProgressReporter};
use std::path::{Path, PathBuf};

const DEFAULT_MANIFEST_NAME: &str = "files.txt";

#[derive(Parser)]
#[command(
    name = "snapreel",
    version,
    about = "Write an ffmpeg concat playlist for a folder of snapshot frames"
)]
struct Cli {
    /// Directory holding the frames (the manifest names them relative to it)
    #[arg(default_value = ".")]
    input_dir: PathBuf,

    /// Image extension to pick up, matched case-insensitively
    #[arg(long, default_value = "png")]
    ext: String,

    /// Manifest path. Default: files.txt inside the input directory
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Seconds each frame is shown
    #[arg(long, default_value_t = 0.1, conflicts_with = "fps")]
    frame_duration: f64,

    /// Frames per second; shorthand for --frame-duration 1/N
    #[arg(long)]
    fps: Option<f64>,

    /// Seconds for each extra entry of the last frame
    #[arg(long, default_value_t = 9.0)]
    hold_duration: f64,

    /// Extra timed entries of the last frame (a bare trailing entry is always added)
    #[arg(long, default_value_t = 3)]
    hold_repeats: usize,

    /// Start the manifest with an `ffconcat version 1.0` line
    #[arg(long, default_value_t = false)]
    header: bool,

    /// Manifest format: concat (default) or json
    #[arg(long, value_enum, default_value_t = ManifestFormat::Concat)]
    format: ManifestFormat,

    /// Progress display mode: auto (TTY-aware), rich, plain, quiet.
    #[arg(long, value_enum, default_value_t = ProgressMode::Auto)]
    progress: ProgressMode,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = PlaylistConfig {
        frame_duration: resolve_frame_duration(cli.frame_duration, cli.fps)?,
        hold_duration: cli.hold_duration,
        hold_repeats: cli.hold_repeats,
        header: cli.header,
    };
    config.validate()?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input_dir.join(DEFAULT_MANIFEST_NAME));

    let summary = generate(
        &cli.input_dir,
        &cli.ext,
        &output,
        &config,
        cli.format,
        ProgressConfig::new(cli.progress),
    )?;
    print_manifest_summary(&summary);
    Ok(())
}

fn resolve_frame_duration(frame_duration: f64, fps: Option<f64>) -> Result<f64> {
    match fps {
        Some(fps) if !fps.is_finite() || fps <= 0.0 => {
            bail!("fps must be a positive number (got {})", fps)
        }
        Some(fps) => Ok(1.0 / fps),
        None => Ok(frame_duration),
    }
}

fn generate(
    input_dir: &Path,
    ext: &str,
    output: &Path,
    config: &PlaylistConfig,
    format: ManifestFormat,
    progress_cfg: ProgressConfig,
) -> Result<ManifestSummary> {
    let reporter = ProgressReporter::new("manifest", 0, progress_cfg);
    let progress = reporter.handle();

    progress.set_stage("scan");
    let scan = util::list_images(input_dir, ext, Some(output))
        .with_context(|| format!("failed to scan {:?}", input_dir))?;
    for skipped in &scan.skipped {
        progress.warn(skipped.clone());
    }
    if scan.names.is_empty() {
        bail!(
            "no .{} files found in {}",
            util::normalize_extension(ext),
            util::folder_display(input_dir)
        );
    }
    progress.set_total(scan.names.len() as u64);
    if let Some(last) = scan.names.last() {
        progress.log(format!("found {} frames, last={}", scan.names.len(), last));
    }

    progress.set_stage("build");
    let manifest = Manifest::build(&scan.names, config)?;
    progress.inc(manifest.frame_count() as u64);

    progress.set_stage("write");
    manifest
        .write_to(output, format)
        .with_context(|| format!("failed to write manifest {}", output.display()))?;

    let outcome = reporter.finish(format!("wrote {}", output.display()));
    let last_frame = manifest
        .entries()
        .last()
        .map(|e| e.file.clone())
        .unwrap_or_default();

    Ok(ManifestSummary {
        input_dir: util::folder_display(input_dir),
        output: output.to_path_buf(),
        frame_count: manifest.frame_count(),
        entry_count: manifest.entries().len(),
        last_frame,
        playback_secs: manifest.total_duration(),
        elapsed: outcome.elapsed,
        warning_count: outcome.warnings.len(),
    })
}

fn print_manifest_summary(summary: &ManifestSummary) {
    println!(
        "Manifest summary: input={} output={} frames={} entries={} last={} playback={}s elapsed={} warnings={}",
        summary.input_dir,
        summary.output.display(),
        summary.frame_count,
        summary.entry_count,
        summary.last_frame,
        manifest::format_seconds((summary.playback_secs * 1000.0).round() / 1000.0),
        progress::format_duration(summary.elapsed),
        summary.warning_count,
    );
}
