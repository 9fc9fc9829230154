use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

const MAX_STORED_WARNINGS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lower")]
pub enum ProgressMode {
    Auto,
    Rich,
    Plain,
    Quiet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedProgressMode {
    Rich,
    Plain,
    Quiet,
}

#[derive(Debug, Clone, Copy)]
pub struct ProgressConfig {
    pub mode: ProgressMode,
    tty_override: Option<bool>,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            mode: ProgressMode::Auto,
            tty_override: None,
        }
    }
}

impl ProgressConfig {
    pub fn new(mode: ProgressMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn with_tty_override(mut self, is_tty: bool) -> Self {
        self.tty_override = Some(is_tty);
        self
    }

    pub fn resolve_mode(self) -> ResolvedProgressMode {
        self.mode.resolve(
            self.tty_override
                .unwrap_or_else(|| std::io::stderr().is_terminal()),
        )
    }
}

impl ProgressMode {
    fn resolve(self, stderr_is_tty: bool) -> ResolvedProgressMode {
        match self {
            ProgressMode::Auto => {
                if stderr_is_tty {
                    ResolvedProgressMode::Rich
                } else {
                    ResolvedProgressMode::Plain
                }
            }
            ProgressMode::Rich => ResolvedProgressMode::Rich,
            ProgressMode::Plain => ResolvedProgressMode::Plain,
            ProgressMode::Quiet => ResolvedProgressMode::Quiet,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ManifestSummary {
    pub input_dir: String,
    pub output: PathBuf,
    pub frame_count: usize,
    pub entry_count: usize,
    pub last_frame: String,
    pub playback_secs: f64,
    pub elapsed: Duration,
    pub warning_count: usize,
}

#[derive(Debug, Clone)]
pub struct ProgressOutcome {
    pub elapsed: Duration,
    pub warnings: Vec<String>,
}

#[derive(Clone)]
pub struct ProgressHandle {
    inner: Rc<ProgressInner>,
}

pub struct ProgressReporter {
    handle: ProgressHandle,
    finished: bool,
}

struct ProgressInner {
    label: String,
    mode: ResolvedProgressMode,
    state: RefCell<ProgressState>,
    bar: Option<ProgressBar>,
}

#[derive(Debug)]
struct ProgressState {
    started: Instant,
    stage: String,
    total: u64,
    processed: u64,
    warnings: Vec<String>,
}

impl ProgressReporter {
    pub fn new(label: impl Into<String>, total: u64, config: ProgressConfig) -> Self {
        let label = label.into();
        let mode = config.resolve_mode();

        let bar = if mode == ResolvedProgressMode::Rich {
            Some(rich_bar(&label, total))
        } else {
            None
        };

        let inner = Rc::new(ProgressInner {
            label,
            mode,
            state: RefCell::new(ProgressState {
                started: Instant::now(),
                stage: "initializing".to_string(),
                total,
                processed: 0,
                warnings: Vec::new(),
            }),
            bar,
        });

        Self {
            handle: ProgressHandle { inner },
            finished: false,
        }
    }

    pub fn handle(&self) -> ProgressHandle {
        self.handle.clone()
    }

    pub fn finish(mut self, final_message: impl Into<String>) -> ProgressOutcome {
        self.finished = true;
        self.handle.inner.finalize(Some(final_message.into()))
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.handle.inner.finalize(None);
        }
    }
}

impl ProgressHandle {
    pub fn set_total(&self, total: u64) {
        {
            let mut state = self.inner.state.borrow_mut();
            state.total = total;
        }
        if let Some(bar) = &self.inner.bar {
            bar.set_length(total.max(1));
        }
    }

    pub fn set_stage(&self, stage: impl Into<String>) {
        let stage = stage.into();
        let line = {
            let mut state = self.inner.state.borrow_mut();
            state.stage = stage.clone();
            plain_line(&self.inner.label, &state)
        };
        match self.inner.mode {
            ResolvedProgressMode::Rich => {
                if let Some(bar) = &self.inner.bar {
                    bar.set_message(stage);
                }
            }
            ResolvedProgressMode::Plain => eprintln!("{}", line),
            ResolvedProgressMode::Quiet => {}
        }
    }

    pub fn inc(&self, delta: u64) {
        if delta == 0 {
            return;
        }
        {
            let mut state = self.inner.state.borrow_mut();
            state.processed = state.processed.saturating_add(delta);
            if state.total > 0 {
                state.processed = state.processed.min(state.total);
            }
        }
        if let Some(bar) = &self.inner.bar {
            bar.inc(delta);
        }
    }

    pub fn log(&self, message: impl Into<String>) {
        self.inner.emit_message("INFO", &message.into());
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        {
            let mut state = self.inner.state.borrow_mut();
            push_warning_locked(&mut state, &message);
        }
        self.inner.emit_message("WARN", &message);
    }
}

impl ProgressInner {
    fn emit_message(&self, level: &str, message: &str) {
        match self.mode {
            ResolvedProgressMode::Quiet => {}
            ResolvedProgressMode::Plain => {
                eprintln!("[{}] {}: {}", level, self.label, message);
            }
            ResolvedProgressMode::Rich => {
                if let Some(bar) = &self.bar {
                    bar.println(format!("[{}] {}: {}", level, self.label, message));
                } else {
                    eprintln!("[{}] {}: {}", level, self.label, message);
                }
            }
        }
    }

    fn finalize(&self, final_message: Option<String>) -> ProgressOutcome {
        let (line, outcome) = {
            let state = self.state.borrow();
            let outcome = ProgressOutcome {
                elapsed: state.started.elapsed(),
                warnings: state.warnings.clone(),
            };
            (plain_line(&self.label, &state), outcome)
        };

        match self.mode {
            ResolvedProgressMode::Quiet => {}
            ResolvedProgressMode::Plain => {
                eprintln!("{}", line);
                if let Some(msg) = final_message.as_deref() {
                    eprintln!("[DONE] {}: {}", self.label, msg);
                }
            }
            ResolvedProgressMode::Rich => {
                if let Some(bar) = &self.bar {
                    match final_message {
                        Some(msg) => bar.finish_with_message(msg),
                        None => bar.finish_and_clear(),
                    }
                }
            }
        }
        outcome
    }
}

fn rich_bar(label: &str, total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total.max(1));
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {wide_bar:.cyan/blue} {pos}/{len} frames | {msg}",
        )
        .expect("valid progress template"),
    );
    bar.set_message(format!("{} starting", label));
    bar
}

fn plain_line(label: &str, state: &ProgressState) -> String {
    let pct = if state.total == 0 {
        0.0
    } else {
        (state.processed as f64 / state.total as f64) * 100.0
    };
    format!(
        "[PROGRESS] {} elapsed={} stage={} done={} / {} ({:.1}%)",
        label,
        format_duration(state.started.elapsed()),
        state.stage,
        state.processed,
        state.total,
        pct,
    )
}

fn push_warning_locked(state: &mut ProgressState, message: &str) {
    if state.warnings.len() >= MAX_STORED_WARNINGS {
        state.warnings.remove(0);
    }
    state.warnings.push(message.to_string());
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{:02}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}
