use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use crate::proto::notification::Notification;

/// Centimeters-to-inches factor as the tape itself applies it.
///
/// The tape truncates the exact factor to four digits, so converted
/// readings match the device display only with this constant.
pub const CM_TO_IN: f64 = 0.3937;

/// Unit system the tape reports in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TryFromPrimitive)]
#[repr(u8)]
pub enum UnitSystem {
    #[serde(rename = "cm")]
    Metric = b'M',
    #[serde(rename = "in")]
    Imperial = b'I',
}

impl Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitSystem::Metric => f.write_str("cm"),
            UnitSystem::Imperial => f.write_str("in"),
        }
    }
}

/// Measurement mode selected on the tape.
///
/// Length mode measures along the extended tape, circular mode measures
/// a closed loop (girth).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TryFromPrimitive)]
#[repr(u8)]
pub enum MeasureMode {
    #[serde(rename = "length")]
    Length = b'0',
    #[serde(rename = "circular")]
    Circular = b'1',
}

impl Display for MeasureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureMode::Length => f.write_str("length"),
            MeasureMode::Circular => f.write_str("circular"),
        }
    }
}

/// Single reading converted to its display unit.
///
/// The wire value is always centimeters x 100; a reading reported in
/// imperial mode is converted here, so `value` is in `unit`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Value in the display unit, full precision.
    pub value: f64,
    /// Unit of `value`.
    pub unit: UnitSystem,
    /// Mode the reading was taken in.
    pub mode: MeasureMode,
}

impl From<&Notification> for Reading {
    fn from(note: &Notification) -> Self {
        let cm = note.centimeters();
        let value = match note.unit {
            UnitSystem::Metric => cm,
            UnitSystem::Imperial => cm * CM_TO_IN,
        };
        Self {
            value,
            unit: note.unit,
            mode: note.mode,
        }
    }
}

impl Default for Reading {
    fn default() -> Self {
        Self {
            value: 0.0,
            unit: UnitSystem::Metric,
            mode: MeasureMode::Length,
        }
    }
}

impl Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(2);
        if f.alternate() {
            f.write_fmt(format_args!(
                "{:>8.prec$} {} ({})",
                self.value, self.unit, self.mode
            ))
        } else {
            f.write_fmt(format_args!("{:.prec$} {}", self.value, self.unit))
        }
    }
}
