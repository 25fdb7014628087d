//! Serial-link collaborator seam.
//!
//! The driver core only needs "find a device whose path contains a search
//! fragment, open it at a fixed baud rate, write bytes, flush". These traits
//! capture that contract. [`SystemPorts`] is the `serialport`-backed
//! implementation used by default; tests substitute capturing mocks.

use std::io::Write;
use std::time::Duration;

use serialport::SerialPort;

use crate::error::{Error, Result};

/// Baud rate for the virtual COM port.
///
/// The USB side of the interface sets the actual DMX transfer rate; this is
/// a placeholder value the virtual serial layer requires.
pub const BAUD_RATE: u32 = 57_600;

/// Write timeout handed to the port so a wedged interface cannot stall a
/// transmission tick indefinitely.
const WRITE_TIMEOUT: Duration = Duration::from_millis(250);

/// An open serial connection to the interface.
///
/// Dropping the link closes the port.
pub trait SerialLink: Send {
    /// Writes the full buffer to the device.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;

    /// Flushes buffered output to the device.
    fn flush(&mut self) -> Result<()>;
}

/// Opens serial links for the driver.
///
/// The driver asks for a device whose path or name contains a search
/// fragment; the first match wins.
pub trait LinkProvider: Send {
    /// Finds and opens a device matching `search` at `baud`.
    ///
    /// Fails with [`Error::DeviceNotFound`] when no available device
    /// matches, or [`Error::Open`] for transport-level failures. The driver
    /// treats both as "no connection" and does not retry on its own.
    fn open_by_fragment(&mut self, search: &str, baud: u32) -> Result<Box<dyn SerialLink>>;
}

/// Default provider backed by the system serial port list.
pub struct SystemPorts;

impl LinkProvider for SystemPorts {
    fn open_by_fragment(&mut self, search: &str, baud: u32) -> Result<Box<dyn SerialLink>> {
        let ports = serialport::available_ports().map_err(Error::open)?;
        let port = ports
            .into_iter()
            .find(|p| p.port_name.contains(search))
            .ok_or_else(|| Error::device_not_found(search))?;

        let inner = serialport::new(&port.port_name, baud)
            .timeout(WRITE_TIMEOUT)
            .open()
            .map_err(Error::open)?;

        log::info!("opened serial device {}", port.port_name);
        Ok(Box::new(PortLink { inner }))
    }
}

/// Names of every serial port currently visible on the system.
///
/// Useful for picking a search fragment to hand to
/// [`DmxPro`](crate::DmxPro).
pub fn available_port_names() -> Result<Vec<String>> {
    let ports = serialport::available_ports().map_err(Error::open)?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

struct PortLink {
    inner: Box<dyn SerialPort>,
}

impl SerialLink for PortLink {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes).map_err(Error::write)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(Error::write)
    }
}
