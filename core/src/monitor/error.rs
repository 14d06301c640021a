use thiserror::Error;

use crate::core::coordinator::OutOfRange;
use crate::cpu::StateError;

/// Errors raised by a single monitor command. None of them end the
/// session: the monitor prints the message and reads the next line.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("invalid number: {0}")]
    InvalidNumber(String),
    #[error("no such command: {0}")]
    UnknownCommand(String),
    #[error("no such register: {0}")]
    UnknownRegister(String),
    #[error("no such flag: {0}")]
    UnknownFlag(String),
    #[error("no such encoding: {0}")]
    UnknownEncoding(String),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("invalid number of arguments")]
    ArgumentCount,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Failed(String),
}

impl From<StateError> for MonitorError {
    fn from(e: StateError) -> Self {
        match e {
            StateError::UnknownRegister(name) => Self::UnknownRegister(name),
            StateError::UnknownFlag(name) => Self::UnknownFlag(name),
        }
    }
}

impl From<OutOfRange> for MonitorError {
    fn from(e: OutOfRange) -> Self {
        Self::InvalidAddress(format!("${:04x}", e.0))
    }
}

/// Fail with [`MonitorError::ArgumentCount`] unless `min <= args.len() <= max`.
pub fn check_len(args: &[&str], min: usize, max: usize) -> Result<(), MonitorError> {
    if args.len() < min || args.len() > max {
        return Err(MonitorError::ArgumentCount);
    }
    Ok(())
}
