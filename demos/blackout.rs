//! Blackout utility: zero every channel on the interface, then exit.
//!
//! Run with: `cargo run --example blackout -- [device-fragment]`

use dmx_pro::{available_port_names, DmxPro, Result};

fn main() -> Result<()> {
    env_logger::init();

    let fragment = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "usbserial".to_string());

    println!("Serial ports:");
    for name in available_port_names()? {
        println!("  {}", name);
    }

    let mut dmx = DmxPro::open(fragment.as_str())?;
    println!("Connected to device matching \"{}\", sending blackout...", fragment);

    // shutdown(true) pushes the blackout frame before closing the link.
    dmx.shutdown(true);
    Ok(())
}
