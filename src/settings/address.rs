use std::sync::LazyLock;

use regex::Regex;

static IPV4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^((25[0-5]|2[0-4][0-9]|[01]?[0-9]?[0-9])\.){3}(25[0-5]|2[0-4][0-9]|[01]?[0-9]?[0-9])$",
    )
    .expect("valid pattern")
});
static IPV4_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9.]*$").expect("valid pattern"));

/// Dotted-quad IPv4 literal with octets in `0..=255`.
pub fn is_ipv4(text: &str) -> bool {
    IPV4.is_match(text)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AddressMode {
    #[default]
    Ipv4Only,
    Any,
}

/// Server address field of the settings form.
///
/// Starts in IPv4-only mode; the user can toggle free-form hostnames. Validation is
/// advisory: an invalid address is flagged but still saved as typed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressInput {
    mode: AddressMode,
    text: String,
}

impl AddressInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> AddressMode {
        self.mode
    }

    pub fn toggle_mode(&mut self) -> AddressMode {
        self.mode = match self.mode {
            AddressMode::Ipv4Only => AddressMode::Any,
            AddressMode::Any => AddressMode::Ipv4Only,
        };
        self.mode
    }

    /// Pre-fills the field. Text that is not made of digits and dots leaves IPv4-only
    /// mode for good; numeric text keeps the current mode.
    pub fn set_text(&mut self, text: &str) {
        if !IPV4_CHARSET.is_match(text) {
            self.mode = AddressMode::Any;
        }
        self.text = text.to_string();
    }

    /// Typing in IPv4-only mode only accepts digits and dots.
    pub fn accepts_char(&self, ch: char) -> bool {
        match self.mode {
            AddressMode::Ipv4Only => ch.is_ascii_digit() || ch == '.',
            AddressMode::Any => !ch.is_control(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the field should be flagged as an invalid IP address.
    pub fn is_flagged_invalid(&self) -> bool {
        self.mode == AddressMode::Ipv4Only && !self.text.is_empty() && !is_ipv4(&self.text)
    }

    /// Value to persist; an empty field means no address.
    pub fn value(&self) -> Option<String> {
        (!self.text.is_empty()).then(|| self.text.clone())
    }
}

/// Port field value to persist. Empty or unparsable text means no port.
pub fn parse_port_input(text: &str) -> Option<u16> {
    if text.is_empty() {
        return None;
    }
    match text.parse::<u16>() {
        Ok(port) => Some(port),
        Err(err) => {
            log::debug!("settings: ignoring port input {text:?}: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_quads_are_checked_per_octet() {
        assert!(is_ipv4("192.168.1.20"));
        assert!(is_ipv4("0.0.0.0"));
        assert!(!is_ipv4("256.1.1.1"));
        assert!(!is_ipv4("10.0.0"));
        assert!(!is_ipv4("10.0.0.1."));
        assert!(!is_ipv4("pad.local"));
    }

    #[test]
    fn address_patterns_compile() {
        assert!(IPV4.is_match("255.255.255.255"));
        assert!(!IPV4.is_match("1.2.3.4 "));
        assert!(IPV4_CHARSET.is_match(""));
        assert!(IPV4_CHARSET.is_match("10.0."));
        assert!(!IPV4_CHARSET.is_match("10.0.0.1:80"));
    }

    #[test]
    fn prefill_with_hostname_leaves_ipv4_mode() {
        let mut input = AddressInput::new();
        input.set_text("10.0.0.7");
        assert_eq!(input.mode(), AddressMode::Ipv4Only);
        input.set_text("pad.local");
        assert_eq!(input.mode(), AddressMode::Any);
        // Numeric text does not switch back.
        input.set_text("10.0.0.7");
        assert_eq!(input.mode(), AddressMode::Any);
    }

    #[test]
    fn invalid_ipv4_is_flagged_but_kept() {
        let mut input = AddressInput::new();
        input.set_text("999.1.1.1");
        assert!(input.is_flagged_invalid());
        assert_eq!(input.value().as_deref(), Some("999.1.1.1"));

        input.toggle_mode();
        assert!(!input.is_flagged_invalid());
        assert!(input.accepts_char('x'));
        input.toggle_mode();
        assert!(!input.accepts_char('x'));
        assert!(input.accepts_char('.'));
    }

    #[test]
    fn empty_fields_mean_absent() {
        assert_eq!(AddressInput::new().value(), None);
        assert!(!AddressInput::new().is_flagged_invalid());
        assert_eq!(parse_port_input(""), None);
        assert_eq!(parse_port_input("8080"), Some(8080));
        assert_eq!(parse_port_input("80a"), None);
        assert_eq!(parse_port_input("70000"), None);
    }
}
