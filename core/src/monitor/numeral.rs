//! Sigil-radix numerals: `$` hex, `%` binary, bare decimal.

use crate::cpu::RegisterValue;

use super::error::MonitorError;

pub fn parse_number(token: &str) -> Result<u32, MonitorError> {
    let (digits, radix) = if let Some(hex) = token.strip_prefix('$') {
        (hex, 16)
    } else if let Some(bin) = token.strip_prefix('%') {
        (bin, 2)
    } else {
        (token, 10)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(MonitorError::InvalidNumber(token.to_string()));
    }
    u32::from_str_radix(digits, radix).map_err(|_| MonitorError::InvalidNumber(token.to_string()))
}

/// Parse a numeral that must fall inside an address space of `size` bytes.
pub fn parse_address(token: &str, size: u32) -> Result<u32, MonitorError> {
    let addr = parse_number(token)?;
    if addr >= size {
        return Err(MonitorError::InvalidAddress(format_address(addr)));
    }
    Ok(addr)
}

pub fn parse_byte(token: &str) -> Result<u8, MonitorError> {
    let value = parse_number(token)?;
    u8::try_from(value).map_err(|_| MonitorError::InvalidArgument(token.to_string()))
}

pub fn parse_bool(token: &str) -> Result<bool, MonitorError> {
    match token {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => Err(MonitorError::InvalidArgument(token.to_string())),
    }
}

pub fn format_address(addr: u32) -> String {
    format!("${addr:04x}")
}

/// `$ab +171`
pub fn format_byte(value: u8) -> String {
    format!("${value:02x} +{value}")
}

/// `$56 +86 %01010110` for 8-bit registers, `$0010 +16` for wider ones.
pub fn format_register(value: RegisterValue) -> String {
    match value {
        RegisterValue::U8(v) => format!("${v:02x} +{v} %{v:08b}"),
        RegisterValue::U16(v) => format!("${v:04x} +{v}"),
    }
}

/// `42 $2a %101010`
pub fn format_conversions(value: u32) -> String {
    format!("{value} ${value:x} %{value:b}")
}
