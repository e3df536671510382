use serde::{Deserialize, Serialize};

use crate::measurement::{Reading, UnitSystem};
use crate::proto::notification::Notification;

/// A confirmed measurement, recorded once per confirmation.
///
/// Carries the unit it was taken in: the tape can be switched between
/// unit systems mid-session, so the log is heterogeneous.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Value in `unit`, converted at confirmation time.
    pub value: f64,
    pub unit: UnitSystem,
}

/// Result of folding one notification into the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Update {
    /// Live value for continuous display.
    pub reading: Reading,
    /// True exactly when this notification appended a log entry.
    pub just_confirmed: bool,
}

/// One measuring session: live state plus the confirmed-measurement log.
///
/// The tape keeps re-sending a locked reading while it is held steady, so
/// the log grows only on the rising edge of the confirm flag. Releasing
/// the lock (a pending frame) re-arms the edge. Two states: idle
/// (`was_confirmed == false`) and confirmed; only the idle-to-confirmed
/// transition appends.
#[derive(Debug, Default)]
pub struct Session {
    latest: Option<Notification>,
    was_confirmed: bool,
    log: Vec<Entry>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one decoded notification into the session.
    ///
    /// Notifications must be processed in delivery order: edge detection
    /// compares against the immediately preceding processed reading.
    /// Frames that failed to decode are never processed, so a malformed
    /// frame leaves the session exactly as it was.
    pub fn process(&mut self, note: Notification) -> Update {
        let reading = Reading::from(&note);
        let rising = note.confirmed && !self.was_confirmed;
        if rising {
            self.log.push(Entry {
                value: reading.value,
                unit: reading.unit,
            });
        }
        self.was_confirmed = note.confirmed;
        self.latest = Some(note);
        Update {
            reading,
            just_confirmed: rising,
        }
    }

    /// Live snapshot; defaults to 0.00 cm, length mode, before the first
    /// notification arrives.
    pub fn reading(&self) -> Reading {
        self.latest.as_ref().map(Reading::from).unwrap_or_default()
    }

    /// Most recent successfully decoded notification.
    pub fn latest(&self) -> Option<&Notification> {
        self.latest.as_ref()
    }

    /// Confirmed measurements, in confirmation order.
    pub fn log(&self) -> &[Entry] {
        &self.log
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::measurement::MeasureMode;

    fn note(value: u32, confirmed: bool, unit: UnitSystem) -> Notification {
        Notification {
            value,
            mode: MeasureMode::Length,
            confirmed,
            unit,
        }
    }

    #[test]
    fn empty_session_reports_defaults() {
        let session = Session::new();
        let reading = session.reading();
        assert_eq!(reading.value, 0.0);
        assert_eq!(reading.unit, UnitSystem::Metric);
        assert_eq!(reading.mode, MeasureMode::Length);
        assert_eq!(format!("{:#}", reading), "    0.00 cm (length)");
        assert!(session.log().is_empty());
        assert!(session.latest().is_none());
    }

    #[test]
    fn sustained_confirmation_logs_once() {
        let mut session = Session::new();
        for _ in 0..5 {
            session.process(note(15000, true, UnitSystem::Metric));
        }
        assert_eq!(session.log().len(), 1);
        assert_eq!(
            session.log()[0],
            Entry {
                value: 150.0,
                unit: UnitSystem::Metric
            }
        );
    }

    #[test]
    fn released_confirmation_rearms_the_edge() {
        let mut session = Session::new();
        session.process(note(15000, true, UnitSystem::Metric));
        session.process(note(15000, false, UnitSystem::Metric));
        session.process(note(15000, true, UnitSystem::Metric));
        assert_eq!(session.log().len(), 2);
    }

    #[test]
    fn pending_frames_never_log() {
        let mut session = Session::new();
        for _ in 0..3 {
            let update = session.process(note(12345, false, UnitSystem::Metric));
            assert!(!update.just_confirmed);
        }
        assert!(session.log().is_empty());
    }

    #[test]
    fn just_confirmed_marks_the_edge_only() {
        let mut session = Session::new();
        assert!(!session.process(note(1, false, UnitSystem::Metric)).just_confirmed);
        assert!(session.process(note(1, true, UnitSystem::Metric)).just_confirmed);
        assert!(!session.process(note(1, true, UnitSystem::Metric)).just_confirmed);
    }

    #[test]
    fn unit_switch_logs_heterogeneous_entries() {
        let mut session = Session::new();
        session.process(note(15000, true, UnitSystem::Metric));
        session.process(note(15000, false, UnitSystem::Imperial));
        session.process(note(15000, true, UnitSystem::Imperial));

        let log = session.log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].unit, UnitSystem::Metric);
        assert_eq!(log[0].value, 150.0);
        assert_eq!(log[1].unit, UnitSystem::Imperial);
        assert!((log[1].value - 59.055).abs() < 1e-6);
    }

    #[test]
    fn zero_value_is_a_valid_reading() {
        let mut session = Session::new();
        let update = session.process(note(0, false, UnitSystem::Metric));
        assert_eq!(update.reading.value, 0.0);
        assert_eq!(update.reading.to_string(), "0.00 cm");
    }

    // The wire-level walkthrough: pending, confirmed, still confirmed.
    #[test]
    fn end_to_end_confirmation_sequence() {
        let mut session = Session::new();
        for frame in [b"*15000;0;01PM", b"*15000;0;01SM", b"*15000;0;01SM"] {
            let note = Notification::parse(frame).unwrap();
            let update = session.process(note);
            assert_eq!(update.reading.value, 150.0);
            assert_eq!(update.reading.unit, UnitSystem::Metric);
            assert_eq!(update.reading.mode, MeasureMode::Circular);
        }
        assert_eq!(
            session.log(),
            &[Entry {
                value: 150.0,
                unit: UnitSystem::Metric
            }][..]
        );
    }
}
