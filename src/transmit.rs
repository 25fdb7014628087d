//! Background transmission loop.
//!
//! One worker per connection. Each tick takes the shared lock, exits if the
//! link is gone, and otherwise sends the packet if it is dirty. The worker
//! owns nothing; the driver keeps the link alive until the worker has been
//! joined, and removing the link is the only way to stop the loop.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::driver::SharedState;

/// Spawns the transmission worker for a freshly installed link.
///
/// The driver calls this exactly once per successful connect, after the
/// link has been stored in the shared state.
pub(crate) fn spawn(shared: Arc<Mutex<SharedState>>, period: Duration) -> JoinHandle<()> {
    thread::spawn(move || run(&shared, period))
}

fn run(shared: &Mutex<SharedState>, period: Duration) {
    loop {
        {
            let mut state = shared.lock().unwrap();
            let SharedState { packet, dirty, link } = &mut *state;
            match link.as_mut() {
                // Link removed by the driver: the sole termination condition.
                None => break,
                Some(link) => {
                    if *dirty {
                        match link.write_bytes(packet.as_bytes()) {
                            Ok(()) => *dirty = false,
                            // Transient: dirty stays set so the next tick
                            // retries with current data.
                            Err(err) => log::warn!("DMX frame write failed: {}", err),
                        }
                    }
                }
            }
        }
        thread::sleep(period);
    }
    log::debug!("DMX transmit worker exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::link::SerialLink;
    use crate::packet::DmxPacket;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    const TEST_PERIOD: Duration = Duration::from_millis(5);

    /// Capturing link that can be told to fail a number of writes first.
    struct CaptureLink {
        writes: Arc<Mutex<Vec<Vec<u8>>>>,
        fail_writes: Arc<AtomicUsize>,
    }

    impl SerialLink for CaptureLink {
        fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) > 0 {
                self.fail_writes.fetch_sub(1, Ordering::SeqCst);
                return Err(Error::write(io::Error::other("injected write failure")));
            }
            self.writes.lock().unwrap().push(bytes.to_vec());
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn shared_with_link(
        dirty: bool,
        fail_writes: usize,
    ) -> (Arc<Mutex<SharedState>>, Arc<Mutex<Vec<Vec<u8>>>>) {
        let writes = Arc::new(Mutex::new(Vec::new()));
        let link = CaptureLink {
            writes: Arc::clone(&writes),
            fail_writes: Arc::new(AtomicUsize::new(fail_writes)),
        };
        let shared = Arc::new(Mutex::new(SharedState {
            packet: DmxPacket::new(),
            dirty,
            link: Some(Box::new(link)),
        }));
        (shared, writes)
    }

    fn remove_link_and_join(shared: &Arc<Mutex<SharedState>>, handle: JoinHandle<()>) {
        shared.lock().unwrap().link = None;
        handle.join().unwrap();
    }

    #[test]
    fn test_dirty_packet_is_written_once_then_not_repeated() {
        let (shared, writes) = shared_with_link(true, 0);
        let handle = spawn(Arc::clone(&shared), TEST_PERIOD);

        thread::sleep(TEST_PERIOD * 4);
        assert_eq!(writes.lock().unwrap().len(), 1, "clean packet resent");

        remove_link_and_join(&shared, handle);
    }

    #[test]
    fn test_written_bytes_match_packet_contents() {
        let (shared, writes) = shared_with_link(false, 0);
        {
            let mut state = shared.lock().unwrap();
            state.packet.set_channel(3, 210).unwrap();
            state.dirty = true;
        }
        let handle = spawn(Arc::clone(&shared), TEST_PERIOD);

        thread::sleep(TEST_PERIOD * 4);
        {
            let writes = writes.lock().unwrap();
            let frame = writes.last().expect("no frame written");
            assert_eq!(frame.len(), crate::packet::PACKET_SIZE);
            assert_eq!(frame[4 + 3], 210);
        }

        remove_link_and_join(&shared, handle);
    }

    #[test]
    fn test_loop_exits_when_link_removed() {
        let (shared, _writes) = shared_with_link(false, 0);
        let handle = spawn(Arc::clone(&shared), TEST_PERIOD);

        shared.lock().unwrap().link = None;

        let start = Instant::now();
        handle.join().unwrap();
        assert!(
            start.elapsed() < Duration::from_secs(1),
            "worker did not exit promptly after link removal"
        );
    }

    #[test]
    fn test_failed_write_keeps_dirty_and_retries() {
        let (shared, writes) = shared_with_link(true, 1);
        let handle = spawn(Arc::clone(&shared), TEST_PERIOD);

        // First tick fails, a later tick retries with dirty still set.
        thread::sleep(TEST_PERIOD * 6);
        {
            let writes = writes.lock().unwrap();
            assert_eq!(writes.len(), 1, "retry after failed write not observed");
        }
        assert!(!shared.lock().unwrap().dirty);

        remove_link_and_join(&shared, handle);
    }
}
