//! Driver for the Enttec DMX USB Pro USB-to-DMX512 lighting interface.
//!
//! This crate keeps one universe of 512 DMX channels in a fixed-layout
//! packet buffer and streams it to the interface over a serial connection,
//! re-sending the full packet at 35 Hz whenever values have changed.
//!
//! # Getting Started
//!
//! ```no_run
//! use dmx_pro::DmxPro;
//!
//! # fn main() -> dmx_pro::Result<()> {
//! // The fragment is substring-matched against every serial port path;
//! // the first hit wins.
//! let mut dmx = DmxPro::open("tty.usbserial")?;
//!
//! // Channels are 1-indexed; values outside 0..=255 are clamped.
//! dmx.set_channel_value(1, 255)?;
//! dmx.set_channel_value(2, 127)?;
//!
//! // Fixtures go dark before the link closes.
//! dmx.shutdown(true);
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency Model
//!
//! One background worker per connection serializes and writes the packet;
//! it shares a single mutex with the foreground over the packet bytes, the
//! dirty flag and the link handle. A channel write that returns before the
//! worker's next tick is on the wire that tick, so staleness is bounded by
//! one frame period. The worker stops by observing the link's removal;
//! [`DmxPro::shutdown`] joins it before returning.
//!
//! # Disconnect Behavior
//!
//! A failed frame write is logged and retried on the next tick; it never
//! tears down the connection. Reconnection is always an explicit caller
//! action via [`DmxPro::reconnect`].

mod driver;
mod error;
pub mod link;
pub mod packet;
mod transmit;

pub use driver::{DmxPro, FRAME_PERIOD, FRAME_RATE};
pub use error::{Error, Result};
pub use link::{available_port_names, LinkProvider, SerialLink, SystemPorts, BAUD_RATE};
pub use packet::{
    DmxPacket, DATA_SIZE, END_DELIM, MAX_CHANNEL, MIN_CHANNEL, PACKET_SIZE, SEND_LABEL,
    START_DELIM,
};
