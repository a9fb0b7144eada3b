use crate::config::INBOUND_LINE_MAX;

#[derive(Debug, PartialEq, Eq)]
pub enum LineReadEvent<'a> {
    None,
    Complete(&'a [u8]),
    Overflow,
}

/// Splits an inbound byte stream into `\n` or `\r` terminated lines.
///
/// Lines longer than [`INBOUND_LINE_MAX`] are reported once as [`LineReadEvent::Overflow`]
/// and discarded up to the next terminator.
#[derive(Debug)]
pub struct LineReader {
    buf: [u8; INBOUND_LINE_MAX],
    len: usize,
    overflowed: bool,
}

impl Default for LineReader {
    fn default() -> Self {
        Self::new()
    }
}

impl LineReader {
    pub const fn new() -> Self {
        Self {
            buf: [0; INBOUND_LINE_MAX],
            len: 0,
            overflowed: false,
        }
    }

    pub fn push_byte(&mut self, byte: u8) -> LineReadEvent<'_> {
        if byte == b'\r' || byte == b'\n' {
            if self.overflowed {
                self.overflowed = false;
                return LineReadEvent::None;
            }
            if self.len == 0 {
                return LineReadEvent::None;
            }
            let complete = self.len;
            self.len = 0;
            return LineReadEvent::Complete(&self.buf[..complete]);
        }

        if self.overflowed {
            return LineReadEvent::None;
        }

        if self.len < self.buf.len() {
            self.buf[self.len] = byte;
            self.len += 1;
            return LineReadEvent::None;
        }

        self.len = 0;
        self.overflowed = true;
        LineReadEvent::Overflow
    }

    /// Feeds a received chunk and returns the first complete line that `accept`
    /// maps to `Some`. Bytes after that line stay unread in `chunk`.
    pub fn feed<T>(
        &mut self,
        chunk: &[u8],
        mut accept: impl FnMut(LineReadEvent<'_>) -> Option<T>,
    ) -> Option<T> {
        for &byte in chunk {
            if let Some(value) = accept(self.push_byte(byte)) {
                return Some(value);
            }
        }
        None
    }
}
