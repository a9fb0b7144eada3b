use crate::link::ConnectionTarget;
use crate::stick::NormalizedPosition;

use super::types::{HardwareKey, StickSide};

#[derive(Clone, Debug)]
pub(super) enum SessionEvent {
    Start,
    /// Settings load finished; `None` when no complete server target is stored.
    TargetLoaded(Option<ConnectionTarget>),
    SettingsFailed,
    Tick,
    StickMoved {
        side: StickSide,
        position: NormalizedPosition,
    },
    Key {
        key: HardwareKey,
        pressed: bool,
    },
    Stop,
}
