//! Error types for the MCP342x driver.

use thiserror::Error;

/// Faults detected without touching the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegisterError {
    /// A channel, gain, bitrate, mode or address outside its documented set.
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: u8 },
    /// A bit update was asked to write something other than 0 or 1, or past bit 7.
    #[error("cannot write {value} to bit {position}")]
    InvalidArgument { position: u8, value: u8 },
    /// The cached configuration disagrees with the shadow register.
    #[error("shadow register {register:#010b} is inconsistent with the driver state")]
    InvalidState { register: u8 },
}

/// Driver error type
#[derive(Debug, PartialEq, Error)]
pub enum Error<E> {
    #[error(transparent)]
    Register(#[from] RegisterError),
    /// An error with the underlying bus
    #[error("bus transaction failed: {0:?}")]
    Transport(E),
}
