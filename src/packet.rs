//! Fixed-layout packet buffer for the Enttec USB Pro wire format.
//!
//! The interface expects a 518-byte message: a four-byte header (start
//! delimiter, send label, payload length as a little-endian u16), a 513-byte
//! payload whose first byte is reserved, and an end delimiter. DMX channel
//! `n` (1-indexed) maps to byte offset `4 + n`.

use crate::error::{Error, Result};

/// Start-of-message delimiter.
pub const START_DELIM: u8 = 0x7E;
/// "Output Only Send DMX Packet Request" message label.
pub const SEND_LABEL: u8 = 0x06;
/// End-of-message delimiter.
pub const END_DELIM: u8 = 0xE7;
/// Payload length carried in the header: the reserved byte plus 512 slots.
pub const DATA_SIZE: u16 = 513;
/// Total message size on the wire.
pub const PACKET_SIZE: usize = 518;
/// First addressable DMX channel.
pub const MIN_CHANNEL: u16 = 1;
/// Last addressable DMX channel given the packet layout.
pub const MAX_CHANNEL: u16 = 511;

/// Channel `n` lives at byte offset `CHANNEL_BASE + n`.
const CHANNEL_BASE: usize = 4;

/// One DMX packet: fixed header and trailer around the channel region.
///
/// The framing bytes are written by [`reset`](Self::reset) and never change
/// afterwards; client calls only mutate the channel region. The buffer is a
/// plain owned array, created once and reused for the life of the driver.
///
/// The last four channels (508..=511) are known not to reach fixtures on
/// this interface. The channel-to-offset mapping is kept as-is so existing
/// client patches stay valid.
pub struct DmxPacket {
    bytes: [u8; PACKET_SIZE],
}

impl DmxPacket {
    /// Creates a packet with the framing in place and every channel at 0.
    pub fn new() -> Self {
        let mut packet = Self {
            bytes: [0; PACKET_SIZE],
        };
        packet.reset();
        packet
    }

    /// Rewrites the fixed framing bytes and zeroes the channel region.
    ///
    /// Idempotent; callable at any time.
    pub fn reset(&mut self) {
        self.bytes.fill(0);
        self.bytes[0] = START_DELIM;
        self.bytes[1] = SEND_LABEL;
        self.bytes[2..4].copy_from_slice(&DATA_SIZE.to_le_bytes());
        self.bytes[PACKET_SIZE - 1] = END_DELIM;
    }

    /// Stores a channel value, clamping it to `0..=255`.
    ///
    /// Out-of-range *values* are clamped rather than rejected; out-of-range
    /// *channels* fail with [`Error::InvalidChannel`] and leave the packet
    /// untouched.
    pub fn set_channel(&mut self, channel: u16, value: i32) -> Result<()> {
        let offset = Self::channel_offset(channel)?;
        self.bytes[offset] = value.clamp(0, 255) as u8;
        Ok(())
    }

    /// Reads back the stored value of a channel.
    pub fn channel(&self, channel: u16) -> Result<u8> {
        Ok(self.bytes[Self::channel_offset(channel)?])
    }

    /// Sets every channel byte to 0, leaving header and trailer untouched.
    ///
    /// Used for the blackout frame on shutdown and on every open so a
    /// reopened link never inherits stale values.
    pub fn zero_channels(&mut self) {
        let first = CHANNEL_BASE + MIN_CHANNEL as usize;
        let last = CHANNEL_BASE + MAX_CHANNEL as usize;
        self.bytes[first..=last].fill(0);
    }

    /// The full packet for the transmission loop to write.
    ///
    /// Must only be read while holding the same lock that guards mutation;
    /// a torn read would corrupt the wire format.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn channel_offset(channel: u16) -> Result<usize> {
        if !(MIN_CHANNEL..=MAX_CHANNEL).contains(&channel) {
            return Err(Error::invalid_channel(channel));
        }
        Ok(CHANNEL_BASE + channel as usize)
    }
}

impl Default for DmxPacket {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_framing(packet: &DmxPacket) {
        let bytes = packet.as_bytes();
        assert_eq!(bytes.len(), PACKET_SIZE);
        assert_eq!(bytes[0], 0x7E);
        assert_eq!(bytes[1], 0x06);
        // 513 little-endian
        assert_eq!(bytes[2], 0x01);
        assert_eq!(bytes[3], 0x02);
        assert_eq!(bytes[4], 0x00);
        assert_eq!(bytes[517], 0xE7);
    }

    #[test]
    fn test_new_packet_has_framing_and_zeroed_channels() {
        let packet = DmxPacket::new();
        assert_framing(&packet);
        assert!(packet.as_bytes()[5..=515].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_set_and_read_back_across_range() {
        let mut packet = DmxPacket::new();
        for channel in MIN_CHANNEL..=MAX_CHANNEL {
            let value = (channel % 256) as i32;
            packet.set_channel(channel, value).unwrap();
            assert_eq!(packet.channel(channel).unwrap(), value as u8);
        }
        assert_framing(&packet);
    }

    #[test]
    fn test_channel_maps_to_offset_four_plus_n() {
        let mut packet = DmxPacket::new();
        packet.set_channel(1, 0xAA).unwrap();
        packet.set_channel(511, 0xBB).unwrap();
        assert_eq!(packet.as_bytes()[5], 0xAA);
        assert_eq!(packet.as_bytes()[515], 0xBB);
    }

    #[test]
    fn test_values_are_clamped_not_rejected() {
        let mut packet = DmxPacket::new();
        packet.set_channel(7, 300).unwrap();
        assert_eq!(packet.channel(7).unwrap(), 255);
        packet.set_channel(7, -10).unwrap();
        assert_eq!(packet.channel(7).unwrap(), 0);
    }

    #[test]
    fn test_invalid_channels_leave_packet_unchanged() {
        let mut packet = DmxPacket::new();
        packet.set_channel(42, 99).unwrap();
        let before = packet.as_bytes().to_vec();

        for channel in [0, 512, u16::MAX] {
            let err = packet.set_channel(channel, 1).unwrap_err();
            assert!(matches!(err, Error::InvalidChannel { .. }));
        }

        assert_eq!(packet.as_bytes(), &before[..]);
    }

    #[test]
    fn test_channel_read_rejects_invalid_channels() {
        let packet = DmxPacket::new();
        assert!(packet.channel(0).is_err());
        assert!(packet.channel(512).is_err());
    }

    #[test]
    fn test_zero_channels_is_idempotent_and_spares_framing() {
        let mut packet = DmxPacket::new();
        for channel in MIN_CHANNEL..=MAX_CHANNEL {
            packet.set_channel(channel, 255).unwrap();
        }

        packet.zero_channels();
        let once = packet.as_bytes().to_vec();
        packet.zero_channels();
        assert_eq!(packet.as_bytes(), &once[..]);

        assert!(packet.as_bytes()[5..=515].iter().all(|&b| b == 0));
        assert_framing(&packet);
    }

    #[test]
    fn test_reset_restores_pristine_state() {
        let mut packet = DmxPacket::new();
        packet.set_channel(200, 123).unwrap();
        packet.reset();
        assert_framing(&packet);
        assert!(packet.as_bytes()[5..=515].iter().all(|&b| b == 0));
    }
}
