//! Console error types

use crate::config::ParamSetError;
use crate::render::ParseError;
use crate::transmit::CarrierError;

/// Console error with code and message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleError {
    /// E01: Unknown command or parameter
    UnknownCommand,
    /// E02: Invalid value format
    InvalidValue,
    /// E03: Missing required argument
    MissingArg,
    /// E04: Value out of allowed range
    OutOfRange,
    /// E05: Signal bank is full
    BankFull,
    /// E06: No stored signal with that number
    NoSuchSignal,
    /// E07: Raw duration list rejected
    BadSequence,
    /// E08: Carrier frequency rejected
    InvalidCarrier,
    /// E09: Input line exceeded the line buffer
    LineTooLong,
}

impl ConsoleError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownCommand => "E01",
            Self::InvalidValue => "E02",
            Self::MissingArg => "E03",
            Self::OutOfRange => "E04",
            Self::BankFull => "E05",
            Self::NoSuchSignal => "E06",
            Self::BadSequence => "E07",
            Self::InvalidCarrier => "E08",
            Self::LineTooLong => "E09",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::UnknownCommand => "unknown command",
            Self::InvalidValue => "invalid value",
            Self::MissingArg => "missing argument",
            Self::OutOfRange => "out of range",
            Self::BankFull => "signal bank full, use 'reset'",
            Self::NoSuchSignal => "no such signal",
            Self::BadSequence => "bad sequence",
            Self::InvalidCarrier => "invalid carrier",
            Self::LineTooLong => "line too long, nothing run",
        }
    }
}

impl core::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl From<ParamSetError> for ConsoleError {
    fn from(e: ParamSetError) -> Self {
        match e {
            ParamSetError::InvalidValue => Self::InvalidValue,
            ParamSetError::OutOfRange => Self::OutOfRange,
        }
    }
}

impl From<ParseError> for ConsoleError {
    fn from(_: ParseError) -> Self {
        Self::BadSequence
    }
}

impl From<CarrierError> for ConsoleError {
    fn from(_: CarrierError) -> Self {
        Self::InvalidCarrier
    }
}
