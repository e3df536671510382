use serde::{Deserialize, Serialize};
use std::str::{self, FromStr};
use thiserror::Error;

use crate::measurement::{MeasureMode, UnitSystem};

/// Frame start marker.
const FRAME_START: u8 = b'*';

/// Reason a frame was rejected.
///
/// The decoder matches the whole frame against the wire grammar; any
/// deviation rejects the frame as a unit. There are no partial readings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("frame is not valid UTF-8")]
    NotText,
    #[error("missing '*' frame start")]
    MissingStart,
    #[error("empty or oversized value field")]
    BadValue,
    #[error("missing ';' separator")]
    MissingSeparator,
    #[error("empty internal field")]
    BadField,
    #[error("invalid mode symbol")]
    BadMode,
    #[error("invalid confirm symbol")]
    BadConfirm,
    #[error("invalid unit symbol")]
    BadUnit,
    #[error("trailing bytes after unit symbol")]
    TrailingData,
    /// Stream-level: a new frame started before this one completed.
    #[error("truncated frame")]
    Truncated,
    /// Stream-level: no frame end within the reassembly bound.
    #[error("unterminated frame")]
    Unterminated,
}

/// A single measurement notification pushed by the tape.
///
/// Wire format, ASCII:
///
/// ```text
/// '*' DIGITS ';' DIGITS ';' DIGITS MODE CONFIRM UNIT
/// MODE: '0' length, '1' circular
/// CONFIRM: 'S' stable (user locked the reading), 'P' pending
/// UNIT: 'M' metric, 'I' imperial
/// ```
///
/// The second and third digit fields are device-internal and not surfaced,
/// but a frame missing them does not decode. The mode symbol is itself a
/// digit, so the third digit run carries the internal field plus the mode
/// as its final digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Raw value in device counts, centimeters x 100.
    pub value: u32,
    /// Measurement mode the tape is switched to.
    pub mode: MeasureMode,
    /// True once the user locks the reading.
    pub confirmed: bool,
    /// Unit system the tape is configured to report in.
    pub unit: UnitSystem,
}

impl Notification {
    /// Decode a single raw frame.
    ///
    /// Total and deterministic: the same bytes always yield the same
    /// notification or the same [`DecodeError`].
    pub fn parse(frame: &[u8]) -> std::result::Result<Self, DecodeError> {
        if str::from_utf8(frame).is_err() {
            return Err(DecodeError::NotText);
        }

        let rest = frame.strip_prefix(b"*").ok_or(DecodeError::MissingStart)?;

        let (value, rest) = take_digits(rest);
        let value = fold_value(value)?;

        let rest = rest.strip_prefix(b";").ok_or(DecodeError::MissingSeparator)?;
        let (field, rest) = take_digits(rest);
        if field.is_empty() {
            return Err(DecodeError::BadField);
        }

        let rest = rest.strip_prefix(b";").ok_or(DecodeError::MissingSeparator)?;
        let (field, rest) = take_digits(rest);
        // The run must hold at least one internal digit plus the mode digit.
        let mode = match field {
            [] => return Err(DecodeError::BadField),
            [_] => return Err(DecodeError::BadMode),
            [.., mode] => MeasureMode::try_from(*mode).map_err(|_| DecodeError::BadMode)?,
        };

        let (confirm, rest) = rest.split_first().ok_or(DecodeError::BadConfirm)?;
        let confirmed = match confirm {
            b'S' => true,
            b'P' => false,
            _ => return Err(DecodeError::BadConfirm),
        };

        let (unit, rest) = rest.split_first().ok_or(DecodeError::BadUnit)?;
        let unit = UnitSystem::try_from(*unit).map_err(|_| DecodeError::BadUnit)?;

        if !rest.is_empty() {
            return Err(DecodeError::TrailingData);
        }

        Ok(Self {
            value,
            mode,
            confirmed,
            unit,
        })
    }

    /// Scale the raw counts to centimeters, the tape's native unit.
    pub fn centimeters(&self) -> f64 {
        self.value as f64 / 100.0
    }

    pub(crate) fn starts_frame(byte: u8) -> bool {
        byte == FRAME_START
    }
}

impl TryFrom<&[u8]> for Notification {
    type Error = DecodeError;

    fn try_from(frame: &[u8]) -> std::result::Result<Self, Self::Error> {
        Self::parse(frame)
    }
}

impl FromStr for Notification {
    type Err = DecodeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s.as_bytes())
    }
}

fn take_digits(input: &[u8]) -> (&[u8], &[u8]) {
    let n = input
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(input.len());
    input.split_at(n)
}

fn fold_value(digits: &[u8]) -> std::result::Result<u32, DecodeError> {
    if digits.is_empty() {
        return Err(DecodeError::BadValue);
    }
    digits
        .iter()
        .try_fold(0u32, |acc, d| {
            acc.checked_mul(10)?.checked_add(u32::from(d - b'0'))
        })
        .ok_or(DecodeError::BadValue)
}
