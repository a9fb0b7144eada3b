//! Text command protocol spoken to the pad server: `<SYMBOL> <INTEGER>\n` lines out,
//! a bare `QUIT` line in either direction ends the session.

mod line_reader;

use core::fmt::{self, Write as _};

use crate::config::{AXIS_FULL_SCALE, COMMAND_MAX};
use crate::stick::NormalizedPosition;

pub use line_reader::{LineReadEvent, LineReader};

pub const QUIT_LINE: &[u8] = b"QUIT";
pub const QUIT_COMMAND: &[u8] = b"QUIT\n";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

impl Axis {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::LeftX => "X",
            Self::LeftY => "Y",
            Self::RightX => "RX",
            Self::RightY => "RY",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    Start,
    Select,
}

impl Button {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Start => "BSTART",
            Self::Select => "BSELECT",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Axis { axis: Axis, value: i32 },
    Button { button: Button, pressed: bool },
}

impl Command {
    /// Axis command for a normalized value in `[-1, 1]`.
    pub fn axis(axis: Axis, value: f64) -> Self {
        Self::Axis {
            axis,
            value: scale_axis(value),
        }
    }

    pub const fn button(button: Button, pressed: bool) -> Self {
        Self::Button { button, pressed }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Axis { axis, .. } => axis.symbol(),
            Self::Button { button, .. } => button.symbol(),
        }
    }

    pub fn value(&self) -> i32 {
        match *self {
            Self::Axis { value, .. } => value,
            Self::Button { pressed, .. } => i32::from(pressed),
        }
    }

    pub fn encode(&self) -> OutgoingCommand {
        let mut line = heapless::String::new();
        // Longest line is `BSELECT 1\n` or `RX -32768\n`, well within capacity.
        let _ = writeln!(line, "{} {}", self.symbol(), self.value());
        OutgoingCommand(line)
    }
}

/// Maps `[-1, 1]` onto `[-32768, 32768]`, rounding to the nearest integer. NaN reads as 0.
pub fn scale_axis(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    (value * AXIS_FULL_SCALE)
        .round()
        .clamp(-AXIS_FULL_SCALE, AXIS_FULL_SCALE) as i32
}

/// One encoded, newline-terminated command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingCommand(heapless::String<COMMAND_MAX>);

impl OutgoingCommand {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for OutgoingCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Command> for OutgoingCommand {
    fn from(command: Command) -> Self {
        command.encode()
    }
}

pub fn left_stick(position: NormalizedPosition) -> [OutgoingCommand; 2] {
    [
        Command::axis(Axis::LeftX, position.x).encode(),
        Command::axis(Axis::LeftY, position.y).encode(),
    ]
}

pub fn right_stick(position: NormalizedPosition) -> [OutgoingCommand; 2] {
    [
        Command::axis(Axis::RightX, position.x).encode(),
        Command::axis(Axis::RightY, position.y).encode(),
    ]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InboundCommand {
    Quit,
}

/// Recognizes inbound control lines. Anything but an exact `QUIT` is ignored.
pub fn parse_inbound(line: &[u8]) -> Option<InboundCommand> {
    (line == QUIT_LINE).then_some(InboundCommand::Quit)
}

/// Decodes one outbound line, without its terminator. Used by debug listeners.
pub fn parse_command(line: &str) -> Option<Command> {
    let (symbol, value) = line.trim_end_matches(['\r', '\n']).split_once(' ')?;
    let value: i32 = value.parse().ok()?;
    let axis = match symbol {
        "X" => Some(Axis::LeftX),
        "Y" => Some(Axis::LeftY),
        "RX" => Some(Axis::RightX),
        "RY" => Some(Axis::RightY),
        _ => None,
    };
    if let Some(axis) = axis {
        return (-32_768..=32_768)
            .contains(&value)
            .then_some(Command::Axis { axis, value });
    }
    let button = match symbol {
        "BSTART" => Button::Start,
        "BSELECT" => Button::Select,
        _ => return None,
    };
    match value {
        0 => Some(Command::button(button, false)),
        1 => Some(Command::button(button, true)),
        _ => None,
    }
}
