//! Fades one channel up and down until interrupted.
//!
//! Run with: `cargo run --example fader -- [device-fragment] [channel]`

use std::thread;

use dmx_pro::{DmxPro, Result, FRAME_PERIOD};

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let fragment = args.next().unwrap_or_else(|| "usbserial".to_string());
    let channel: u16 = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);

    let dmx = DmxPro::open(fragment.as_str())?;
    println!("Fading channel {}. Press Ctrl+C to stop.", channel);

    loop {
        for value in (0..=255).chain((0..=255).rev()) {
            dmx.set_channel_value(channel, value)?;
            thread::sleep(FRAME_PERIOD);
        }
    }
}
