//! Crate-level error types.

use std::io;

/// Crate-level error type.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A DMX channel outside the addressable range 1..=511.
    #[error("invalid DMX channel {channel} (addressable channels are 1..=511)")]
    InvalidChannel { channel: u16 },

    /// No serial device path or name contained the search fragment.
    #[error("no serial device matching \"{search}\"")]
    DeviceNotFound { search: String },

    /// Enumerating or opening the serial device failed at the transport level.
    #[error("failed to open serial device: {source}")]
    Open {
        #[source]
        source: serialport::Error,
    },

    /// A write on the open link failed.
    #[error("serial write failed: {source}")]
    Write {
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Invalid-channel error for the given channel number.
    pub fn invalid_channel(channel: u16) -> Self {
        Self::InvalidChannel { channel }
    }

    /// Connect-time error: nothing matched the search fragment.
    pub fn device_not_found(search: impl Into<String>) -> Self {
        Self::DeviceNotFound {
            search: search.into(),
        }
    }

    /// Wrap a transport-level open or enumeration failure.
    pub fn open(source: serialport::Error) -> Self {
        Self::Open { source }
    }

    /// Wrap a failed write on an open link.
    pub fn write(source: io::Error) -> Self {
        Self::Write { source }
    }

    /// Check if this is a connect-time "nothing matched" failure.
    pub fn is_device_not_found(&self) -> bool {
        matches!(self, Self::DeviceNotFound { .. })
    }

    /// Check if this is a transient write failure.
    ///
    /// The transmission loop retries these on its next tick; they never
    /// tear down the connection.
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. })
    }
}

/// Crate-level result type.
pub type Result<T> = std::result::Result<T, Error>;
