// Link timing. The read timeout doubles as the stop-signal latency of the worker thread.
pub const LINK_READ_TIMEOUT_MS: u64 = 100;
pub const LINK_CONNECT_TIMEOUT_MS: u64 = 5_000;
pub const LINK_THREAD_NAME: &str = "stickpad-link";
pub const LINK_READ_CHUNK: usize = 64;

// Session polling.
pub const SESSION_POLL_MS: u64 = 500;
pub const SESSION_MAX_CONNECTION_ATTEMPTS: u8 = 3;

// Protocol buffers. The longest outbound line is `BSELECT 1\n` / `RX -32768\n`.
pub const COMMAND_MAX: usize = 24;
pub const INBOUND_LINE_MAX: usize = 64;
pub const AXIS_FULL_SCALE: f64 = 32_768.0;

// Stick widget defaults.
pub const STICK_DEFAULT_SCALE: f32 = 0.75;
pub const STICK_DEFAULT_SIZE_RATIO: f32 = 0.33;
pub const STICK_DEFAULT_NOTIFY_MIN_INTERVAL_MS: u64 = 50;
pub const STICK_SPRITE_CACHE_MAX: usize = 4;

// Settings persistence.
pub const SETTINGS_THREAD_NAME: &str = "stickpad-settings";
pub const SETTINGS_FILE_NAME: &str = "settings.toml";
