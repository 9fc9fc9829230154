use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const CONCAT_HEADER: &str = "ffconcat version 1.0";

/// Upper bound on hold entries; far past any useful trailing hold.
pub const MAX_HOLD_REPEATS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lower")]
pub enum ManifestFormat {
    Concat,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaylistConfig {
    pub frame_duration: f64,
    pub hold_duration: f64,
    pub hold_repeats: usize,
    pub header: bool,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            frame_duration: 0.1,
            hold_duration: 9.0,
            hold_repeats: 3,
            header: false,
        }
    }
}

impl PlaylistConfig {
    pub fn validate(&self) -> Result<()> {
        check_duration("frame duration", self.frame_duration)?;
        check_duration("hold duration", self.hold_duration)?;
        if self.hold_repeats > MAX_HOLD_REPEATS {
            bail!(
                "hold repeats must be at most {} (got {})",
                MAX_HOLD_REPEATS,
                self.hold_repeats
            );
        }
        Ok(())
    }
}

fn check_duration(what: &str, secs: f64) -> Result<()> {
    if !secs.is_finite() || secs < 0.0 {
        bail!("{} must be a finite, non-negative number of seconds (got {})", what, secs);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file: String,
    /// `None` only for the trailing bare reference.
    pub duration: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Manifest {
    header: bool,
    frame_count: usize,
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Lays out one entry per frame, then the hold entries and the bare
    /// trailing reference for the last frame.
    pub fn build<S: AsRef<str>>(names: &[S], config: &PlaylistConfig) -> Result<Self> {
        config.validate()?;
        let Some(last) = names.last() else {
            bail!("no frames to write: the file listing is empty");
        };
        let last: &str = last.as_ref();

        let capacity = names
            .len()
            .checked_add(config.hold_repeats)
            .and_then(|n| n.checked_add(1))
            .context("manifest entry count overflows")?;
        let mut entries = Vec::with_capacity(capacity);
        for name in names {
            entries.push(ManifestEntry {
                file: name.as_ref().to_string(),
                duration: Some(config.frame_duration),
            });
        }
        for _ in 0..config.hold_repeats {
            entries.push(ManifestEntry {
                file: last.to_string(),
                duration: Some(config.hold_duration),
            });
        }
        entries.push(ManifestEntry {
            file: last.to_string(),
            duration: None,
        });

        Ok(Self {
            header: config.header,
            frame_count: names.len(),
            entries,
        })
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn total_duration(&self) -> f64 {
        self.entries.iter().filter_map(|e| e.duration).sum()
    }

    pub fn render_concat(&self) -> String {
        let mut out = String::new();
        if self.header {
            out.push_str(CONCAT_HEADER);
            out.push('\n');
        }
        for entry in &self.entries {
            out.push_str(&format!("file '{}'\n", escape_concat_path(&entry.file)));
            if let Some(secs) = entry.duration {
                out.push_str(&format!("duration {}\n", format_seconds(secs)));
            }
        }
        out
    }

    pub fn render_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(&self.entries)?;
        json.push('\n');
        Ok(json)
    }

    pub fn render(&self, format: ManifestFormat) -> Result<String> {
        match format {
            ManifestFormat::Concat => Ok(self.render_concat()),
            ManifestFormat::Json => self.render_json(),
        }
    }

    /// Truncates any existing file at `path`.
    pub fn write_to(&self, path: &Path, format: ManifestFormat) -> Result<()> {
        let body = self.render(format)?;
        let file = File::create(path)
            .with_context(|| format!("failed to create manifest {:?}", path))?;
        let mut w = BufWriter::new(file);
        w.write_all(body.as_bytes())
            .with_context(|| format!("failed to write manifest {:?}", path))?;
        w.flush()?;
        Ok(())
    }
}

/// Concat demuxer quoting: a single quote closes the string, emits an
/// escaped quote, and reopens it.
pub fn escape_concat_path(name: &str) -> String {
    name.replace('\'', r"'\''")
}

/// Always keeps a decimal point so `9` prints as `9.0`.
pub fn format_seconds(secs: f64) -> String {
    let s = secs.to_string();
    if s.contains('.') {
        s
    } else {
        format!("{}.0", s)
    }
}
