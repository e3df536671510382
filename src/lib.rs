//!
//! This library provides communication with a RENPHO ES-Tape smart
//! measuring tape.
//!
//! <br>
//!
//! # Details
//!
//! - The tape pushes its measurements as short ASCII notification frames.
//!   Discovery and subscription are up to the caller; any byte source
//!   delivering the frames works, e.g. a BLE-serial bridge.
//!
//! - Basic setup and live readings
//!
//!   ```no_run
//!   use tapectrl::{Device, Session, DEFAULT_BAUDRATE};
//!   #[tokio::main]
//!   async fn main() -> tapectrl::Result<()> {
//!       let path = "/dev/ttyUSB0".to_string();
//!       let mut device = Device::new(&path, DEFAULT_BAUDRATE)?;
//!       let mut session = Session::new();
//!       while let Some(note) = device.next_notification().await? {
//!           let update = session.process(note);
//!           println!("{:#}", update.reading);
//!       }
//!       Ok(())
//!   }
//!   ```
//!
//! # Supported devices
//!
//!  * RENPHO ES-Tape (Smart Tape Measure)
//!

pub mod device;
pub mod measurement;
pub mod proto;
pub mod session;

pub use device::Device;
pub use proto::{ProtoError, Result};
pub use session::Session;

#[cfg(unix)]
pub const DEFAULT_TTY: &str = "/dev/ttyUSB0";
#[cfg(windows)]
pub const DEFAULT_TTY: &str = "COM1";

/// Default baudrate for common BLE-serial bridges.
pub const DEFAULT_BAUDRATE: u32 = 115200;

/// Advertised device name to filter for during discovery.
pub const DEVICE_NAME: &str = "ES-Tape";

/// GATT service holding the measurement characteristic.
pub const MEASUREMENT_SERVICE_UUID: &str = "0783b03e-8535-b5a0-7140-a304d2495cb7";

/// Characteristic pushing measurement notifications.
pub const MEASUREMENT_CHARACTERISTIC_UUID: &str = "0783b03e-8535-b5a0-7140-a304d2495cb8";
