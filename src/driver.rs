//! The public driver type.
//!
//! [`DmxPro`] owns the packet buffer, the serial link (when connected) and
//! the background transmission worker. All shared state lives behind one
//! mutex; foreground calls and the worker coordinate exclusively through it.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::Result;
use crate::link::{LinkProvider, SerialLink, SystemPorts, BAUD_RATE};
use crate::packet::DmxPacket;
use crate::transmit;

/// Frames per second sent to the interface while the buffer is dirty.
pub const FRAME_RATE: u32 = 35;

/// Transmission period, rounded to whole milliseconds.
pub const FRAME_PERIOD: Duration = Duration::from_millis((1000 / FRAME_RATE) as u64);

/// State shared between the driver and the transmission worker, guarded by
/// a single mutex.
pub(crate) struct SharedState {
    pub(crate) packet: DmxPacket,
    /// True whenever the channel region changed since the last successful
    /// write. Cleared only by the transmission worker, under this lock.
    pub(crate) dirty: bool,
    /// Present exactly while connected. The worker exits when it observes
    /// `None`; only the driver installs or removes the link.
    pub(crate) link: Option<Box<dyn SerialLink>>,
}

/// Driver for an Enttec DMX USB Pro interface.
///
/// Channel writes go into a shared packet buffer under a lock; a background
/// worker serializes the buffer and writes it to the device at
/// [`FRAME_RATE`] whenever values have changed. One driver instance drives
/// one interface and one universe of 512 channels.
///
/// Dropping the driver performs `shutdown(true)`: a blackout frame goes out
/// before the link is closed, so fixtures are never left holding the last
/// transmitted look.
///
/// # Example
///
/// ```no_run
/// use dmx_pro::DmxPro;
///
/// # fn main() -> dmx_pro::Result<()> {
/// let mut dmx = DmxPro::open("tty.usbserial")?;
/// dmx.set_channel_value(1, 255)?;
/// dmx.set_channel_value(2, 128)?;
/// dmx.shutdown(true);
/// # Ok(())
/// # }
/// ```
pub struct DmxPro {
    shared: Arc<Mutex<SharedState>>,
    provider: Box<dyn LinkProvider>,
    device_search: String,
    worker: Option<JoinHandle<()>>,
}

impl DmxPro {
    /// Creates a disconnected driver for devices matching `device_search`.
    ///
    /// Call [`reconnect`](Self::reconnect) to open the link, or use
    /// [`open`](Self::open) to construct and connect in one step.
    pub fn new(device_search: impl Into<String>) -> Self {
        Self::with_provider(device_search, Box::new(SystemPorts))
    }

    /// Creates a disconnected driver using a custom [`LinkProvider`].
    pub fn with_provider(
        device_search: impl Into<String>,
        provider: Box<dyn LinkProvider>,
    ) -> Self {
        Self {
            shared: Arc::new(Mutex::new(SharedState {
                packet: DmxPacket::new(),
                dirty: false,
                link: None,
            })),
            provider,
            device_search: device_search.into(),
            worker: None,
        }
    }

    /// Creates a driver and connects it to the first matching device.
    pub fn open(device_search: impl Into<String>) -> Result<Self> {
        let mut driver = Self::new(device_search);
        driver.reconnect()?;
        Ok(driver)
    }

    /// Connects to the first device whose path or name contains the search
    /// fragment, replacing any existing connection.
    ///
    /// When already connected and `send_zeros_first` is set, a blackout
    /// frame is pushed through the old link first, with roughly two frame
    /// periods for it to drain (bounded best-effort, not a flush barrier).
    ///
    /// On success the channel buffer is zeroed so the new link never
    /// inherits stale values, and exactly one transmission worker is
    /// spawned. On failure the driver stays disconnected and no worker is
    /// spawned; retrying is the caller's call.
    pub fn connect(&mut self, send_zeros_first: bool) -> Result<()> {
        if send_zeros_first && self.is_connected() {
            self.zero_all_channels();
            thread::sleep(FRAME_PERIOD * 2);
        }

        self.close_link();

        let link = match self.provider.open_by_fragment(&self.device_search, BAUD_RATE) {
            Ok(link) => link,
            Err(err) => {
                log::warn!("DMX connect failed: {}", err);
                return Err(err);
            }
        };

        {
            let mut state = self.shared.lock().unwrap();
            state.packet.zero_channels();
            state.dirty = true;
            state.link = Some(link);
        }
        self.worker = Some(transmit::spawn(Arc::clone(&self.shared), FRAME_PERIOD));

        log::info!("connected to DMX device matching \"{}\"", self.device_search);
        Ok(())
    }

    /// Reconnects to the device supplied at construction.
    ///
    /// Equivalent to [`connect`](Self::connect) with `send_zeros_first`.
    pub fn reconnect(&mut self) -> Result<()> {
        self.connect(true)
    }

    /// Tears down the link without sending a blackout frame first.
    pub fn disconnect(&mut self) {
        self.shutdown(false);
    }

    /// Stores a channel value, clamping it to `0..=255`.
    ///
    /// Valid in any state; while disconnected the value is stored but not
    /// transmitted. A channel outside 1..=511 is logged and rejected,
    /// leaving the buffer unchanged.
    pub fn set_channel_value(&self, channel: u16, value: i32) -> Result<()> {
        let mut state = self.shared.lock().unwrap();
        if let Err(err) = state.packet.set_channel(channel, value) {
            log::warn!("{}", err);
            return Err(err);
        }
        state.dirty = true;
        Ok(())
    }

    /// Reads back the stored value of a channel.
    pub fn channel_value(&self, channel: u16) -> Result<u8> {
        self.shared.lock().unwrap().packet.channel(channel)
    }

    /// Zeroes every channel and marks the buffer for transmission.
    ///
    /// All fixtures go dark on the next frame while connected.
    pub fn zero_all_channels(&self) {
        let mut state = self.shared.lock().unwrap();
        state.packet.zero_channels();
        state.dirty = true;
    }

    /// Whether a link to the device is currently open.
    pub fn is_connected(&self) -> bool {
        self.shared.lock().unwrap().link.is_some()
    }

    /// The search fragment supplied at construction.
    pub fn device_search(&self) -> &str {
        &self.device_search
    }

    /// Closes the connection and stops the transmission worker.
    ///
    /// With `send_zeros` set, a blackout frame is pushed out first with
    /// roughly two frame periods to drain. Returns only after the worker
    /// has exited, so no transmission can follow. Idempotent; safe to call
    /// while disconnected.
    pub fn shutdown(&mut self, send_zeros: bool) {
        if send_zeros && self.is_connected() {
            self.zero_all_channels();
            thread::sleep(FRAME_PERIOD * 2);
        }
        self.close_link();
    }

    /// Flushes and removes the link, then joins the worker.
    ///
    /// The join must happen before any replacement link is installed: the
    /// worker terminates on observing the absent link, and a replacement
    /// installed too early would be adopted by the old worker.
    fn close_link(&mut self) {
        {
            let mut state = self.shared.lock().unwrap();
            if let Some(mut link) = state.link.take() {
                if let Err(err) = link.flush() {
                    log::warn!("flush on close failed: {}", err);
                }
                log::debug!("DMX link closed");
            }
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for DmxPro {
    fn drop(&mut self) {
        self.shutdown(true);
    }
}
