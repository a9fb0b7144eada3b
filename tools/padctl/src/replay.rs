use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, info};
use stickpad::stick::{NotifyReason, StickMoved};

use crate::layout::{Pad, PadLayout};
use crate::trace::{self, side_name, TraceInput};

pub struct ReplayOptions {
    pub trace_path: PathBuf,
    pub layout_path: Option<PathBuf>,
    pub expect_path: Option<PathBuf>,
}

pub fn run_replay(options: ReplayOptions) -> Result<()> {
    let layout = PadLayout::load(options.layout_path.as_deref())?;
    let mut pad = Pad::from_layout(&layout)?;
    let events = trace::load(&options.trace_path)?;

    let mut lines = Vec::new();
    for event in &events {
        match event.input {
            TraceInput::Touch { side, action } => {
                if let Some(moved) = pad.touch(event.ms, side, action) {
                    lines.push(format_notification(side_name(side), &moved));
                }
            }
            TraceInput::Key { key, pressed } => {
                debug!("replay: ms={} key={key:?} pressed={pressed} (not replayed)", event.ms);
            }
        }
    }

    println!("ms,stick,reason,x,y,amplitude,angle");
    for line in &lines {
        println!("{line}");
    }
    info!(
        "replay: events={} notifications={}",
        events.len(),
        lines.len()
    );

    if let Some(expect_path) = options.expect_path {
        let raw = fs::read_to_string(&expect_path)
            .with_context(|| format!("failed reading {}", expect_path.display()))?;
        compare(&lines, &raw)?;
        info!("replay: matches {}", expect_path.display());
    }
    Ok(())
}

pub fn format_notification(stick: &str, moved: &StickMoved) -> String {
    format!(
        "{},{},{},{:.4},{:.4},{:.4},{:.4}",
        moved.t_ms,
        stick,
        reason_name(moved.reason),
        moved.position.x,
        moved.position.y,
        moved.amplitude,
        moved.angle
    )
}

fn reason_name(reason: NotifyReason) -> &'static str {
    match reason {
        NotifyReason::TouchStart => "start",
        NotifyReason::Drag => "drag",
        NotifyReason::TouchEnd => "end",
        NotifyReason::Programmatic => "set",
    }
}

/// Compares notification lines with an expectation file. The CSV header and blank lines
/// in the file are ignored.
fn compare(actual: &[String], expected_raw: &str) -> Result<()> {
    let expected: Vec<&str> = expected_raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("ms,"))
        .collect();

    for (idx, (got, want)) in actual.iter().zip(&expected).enumerate() {
        if got != want {
            bail!("notification {} differs: got `{got}` want `{want}`", idx + 1);
        }
    }
    if actual.len() != expected.len() {
        bail!(
            "notification count differs: got {} want {}",
            actual.len(),
            expected.len()
        );
    }
    Ok(())
}
