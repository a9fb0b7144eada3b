use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{anyhow, bail, Context, Result};
use stickpad::session::{HardwareKey, StickSide};
use stickpad::stick::TouchAction;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TraceInput {
    Touch { side: StickSide, action: TouchAction },
    Key { key: HardwareKey, pressed: bool },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceEvent {
    pub ms: u64,
    pub input: TraceInput,
}

/// Reads a trace file. Records, one per line:
///
/// ```text
/// touch,<ms>,<left|right>,<down|move|up>,<x>,<y>
/// key,<ms>,<volume_up|volume_down>,<down|up>
/// ```
///
/// Blank lines and `#` comments are skipped. Timestamps must not go backwards.
pub fn load(path: &Path) -> Result<Vec<TraceEvent>> {
    let file =
        File::open(path).with_context(|| format!("failed opening trace {}", path.display()))?;
    let mut events = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("failed reading {}", path.display()))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event = parse_line(line).with_context(|| format!("{}:{}", path.display(), idx + 1))?;
        if let Some(last) = events.last().map(|event: &TraceEvent| event.ms) {
            if event.ms < last {
                bail!("{}:{}: timestamp {} < {last}", path.display(), idx + 1, event.ms);
            }
        }
        events.push(event);
    }
    Ok(events)
}

pub fn parse_line(line: &str) -> Result<TraceEvent> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    match fields.as_slice() {
        ["touch", ms, stick, action, x, y] => {
            let side = parse_side(stick)?;
            let x: f32 = x.parse().with_context(|| format!("invalid x `{x}`"))?;
            let y: f32 = y.parse().with_context(|| format!("invalid y `{y}`"))?;
            let action = match *action {
                "down" => TouchAction::Down { x, y },
                "move" => TouchAction::Move { x, y },
                "up" => TouchAction::Up,
                other => bail!("unknown touch action `{other}` (use down|move|up)"),
            };
            Ok(TraceEvent {
                ms: parse_ms(ms)?,
                input: TraceInput::Touch { side, action },
            })
        }
        ["key", ms, key, state] => {
            let key = match *key {
                "volume_up" => HardwareKey::VolumeUp,
                "volume_down" => HardwareKey::VolumeDown,
                other => bail!("unknown key `{other}` (use volume_up|volume_down)"),
            };
            let pressed = match *state {
                "down" => true,
                "up" => false,
                other => bail!("unknown key state `{other}` (use down|up)"),
            };
            Ok(TraceEvent {
                ms: parse_ms(ms)?,
                input: TraceInput::Key { key, pressed },
            })
        }
        _ => Err(anyhow!("unrecognized record `{line}`")),
    }
}

fn parse_ms(raw: &str) -> Result<u64> {
    raw.parse()
        .with_context(|| format!("invalid timestamp `{raw}`"))
}

pub fn parse_side(raw: &str) -> Result<StickSide> {
    match raw {
        "left" => Ok(StickSide::Left),
        "right" => Ok(StickSide::Right),
        other => bail!("unknown stick `{other}` (use left|right)"),
    }
}

pub fn side_name(side: StickSide) -> &'static str {
    match side {
        StickSide::Left => "left",
        StickSide::Right => "right",
    }
}
