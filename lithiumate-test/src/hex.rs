use std::{error::Error, fmt::Display};

#[derive(PartialEq, Clone, Debug)]
pub struct ParseHexError(String);

impl From<&str> for ParseHexError {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl Display for ParseHexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for ParseHexError {}

fn digits(value: &str) -> Result<&str, ParseHexError> {
    let value = value.trim();
    let value = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    if value.is_empty() {
        return Err("Empty value".into());
    }
    Ok(value)
}

/// A byte in hex, with or without `0x`.
pub fn parse_byte(value: &str) -> Result<u8, ParseHexError> {
    u8::from_str_radix(digits(value)?, 16).map_err(|_| "Expected a hex byte (00-FF)".into())
}

/// A standard 11-bit CAN identifier in hex, with or without `0x`.
pub fn parse_id(value: &str) -> Result<u16, ParseHexError> {
    let id = u16::from_str_radix(digits(value)?, 16).map_err(|_| "Expected a hex identifier")?;
    if id > 0x07FF {
        return Err("Identifier must be at most 7FF".into());
    }
    Ok(id)
}

/// Frame data as space separated hex bytes.
pub fn format_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect::<Vec<String>>().join(" ")
}
