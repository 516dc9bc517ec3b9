use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

/// Stderr progress for the command-line tools: spinners and bars on a terminal, plain lines
/// otherwise.
#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    is_tty: bool,
}

impl Ui {
    pub fn from_args(ui_flag: &str, is_tty: bool) -> Self {
        let mode = match ui_flag {
            "plain" => UiMode::Plain,
            "pretty" => UiMode::Pretty,
            _ => UiMode::Auto,
        };
        Self { mode, is_tty }
    }

    fn pretty(&self) -> bool {
        self.is_tty && self.mode != UiMode::Plain
    }

    pub fn stage(&self, name: &str) -> StageGuard {
        let spinner = if self.pretty() {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            spinner.set_style(
                ProgressStyle::with_template("{spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.set_message(format!("{name}…"));
            Some(spinner)
        } else {
            eprintln!("==> {}", name);
            None
        };
        StageGuard {
            name: name.to_string(),
            start: Instant::now(),
            spinner,
        }
    }

    /// Per-frame progress for an encode run of `total` frames.
    pub fn frames(&self, total: u64) -> FrameProgress {
        let bar = if self.pretty() {
            let bar = ProgressBar::new(total);
            bar.set_draw_target(ProgressDrawTarget::stderr());
            bar.set_style(
                ProgressStyle::with_template("{bar:32} {pos}/{len} frames {per_sec} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            Some(bar)
        } else {
            None
        };
        FrameProgress {
            bar,
            total,
            done: 0,
        }
    }
}

pub struct StageGuard {
    name: String,
    start: Instant,
    spinner: Option<ProgressBar>,
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        let message = format!("✔ {} ({})", self.name, format_duration(self.start.elapsed()));
        match &self.spinner {
            Some(spinner) => spinner.finish_with_message(message),
            None => eprintln!("{message}"),
        }
    }
}

pub struct FrameProgress {
    bar: Option<ProgressBar>,
    total: u64,
    done: u64,
}

impl FrameProgress {
    /// Advance by one frame; `bytes` is the running output size.
    pub fn tick(&mut self, bytes: u64) {
        self.done += 1;
        match &self.bar {
            Some(bar) => {
                bar.inc(1);
                bar.set_message(format_bytes(bytes));
            }
            None if self.done % 30 == 0 || self.done == self.total => {
                eprintln!("  {}/{} frames, {}", self.done, self.total, format_bytes(bytes));
            }
            None => {}
        }
    }

    pub fn finish(self) {
        if let Some(bar) = self.bar {
            bar.finish();
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= 1 << 20 {
        format!("{:.1} MiB", bytes as f64 / (1u64 << 20) as f64)
    } else if bytes >= 1 << 10 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}
