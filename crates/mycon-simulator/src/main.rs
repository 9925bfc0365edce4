//! Desktop build of the mycon receiver.
//!
//! Listens for controller packets on a UDP port and logs every key press and
//! release, the same way the firmware's main loop consumes key state.
//!
//! ```text
//! mycon-simulator [PORT] [--debug]
//! ```
//!
//! `PORT` defaults to 59630. `--debug` logs every received packet.
//! Set `RUST_LOG=info` to see output.

use std::time::Duration;

use log::{error, info};

use mycon_core::{DEFAULT_PORT, KeySnapshot, ReceiverConfig};
use mycon_simulator::HostReceiver;

/// Interval at which the "main loop" samples key state.
const FRAME_DURATION: Duration = Duration::from_millis(20);

fn main() {
    env_logger::init();

    let mut port = DEFAULT_PORT;
    let mut debug = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--debug" => debug = true,
            other => match other.parse() {
                Ok(p) => port = p,
                Err(_) => {
                    error!("Unrecognized argument {:?}", other);
                    std::process::exit(2);
                }
            },
        }
    }

    let receiver = HostReceiver::new(ReceiverConfig::default().with_debug_output(debug));
    if let Err(e) = receiver.start(port) {
        error!("{}", e);
        std::process::exit(1);
    }

    let mut previous = KeySnapshot::released();
    let mut link_alive = false;
    loop {
        let current = receiver.snapshot();
        for (key, down) in current.changes_since(&previous) {
            info!("{} {}", key.name(), if down { "pressed" } else { "released" });
        }
        previous = current;

        let alive = receiver.is_link_alive();
        if alive != link_alive {
            info!("Controller {}", if alive { "online" } else { "offline" });
            link_alive = alive;
        }

        std::thread::sleep(FRAME_DURATION);
    }
}
