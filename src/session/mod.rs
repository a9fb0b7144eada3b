//! Controller session: settings load, connection retry routine and input forwarding.

mod engine;
mod events;
mod machine;
mod types;


pub use engine::ControllerSession;
pub use types::{
    HardwareKey, SessionNotice, SessionOptions, SessionOutput, SessionPhase, StickSide,
    SticksSnapshot,
};
