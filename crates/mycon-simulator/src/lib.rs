//! Host-side key-state receiver.
//!
//! Runs the mycon sampling loop on an OS thread over a `std` UDP socket so a
//! controller can be exercised from a desktop without flashing a board.

use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::sync::{Arc, OnceLock, mpsc};
use std::thread;

use embassy_time::Instant;
use log::{error, info, warn};

use mycon_core::packet::{HEARTBEAT_REPLY, MAX_PACKET_LEN};
use mycon_core::{Key, KeyReceiver, KeySampler, KeySnapshot, ReceiverConfig, ReceiverError};

/// Key-state receiver backed by a background thread.
pub struct HostReceiver {
    receiver: Arc<KeyReceiver>,
    local_addr: OnceLock<SocketAddr>,
}

impl HostReceiver {
    pub fn new(config: ReceiverConfig) -> Self {
        Self {
            receiver: Arc::new(KeyReceiver::new(config)),
            local_addr: OnceLock::new(),
        }
    }

    /// Bind `port` on every interface and launch the sampling loop.
    ///
    /// Port 0 binds an ephemeral port; see [`HostReceiver::local_addr`].
    pub fn start(&self, port: u16) -> Result<SocketAddr, ReceiverError> {
        let sampler = KeySampler::claim(Arc::clone(&self.receiver))?;

        let socket = match bind(port) {
            Ok(socket) => socket,
            Err(e) => {
                error!("Failed to bind UDP port {}: {}", port, e);
                sampler.abandon();
                return Err(ReceiverError::BindFailure { port });
            }
        };
        let local_addr = socket
            .local_addr()
            .unwrap_or(SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port)));

        // The sampler follows once the thread exists, so a failed spawn can
        // still give the claim back.
        let (handoff, pickup) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("mycon_recv_loop".into())
            .spawn(move || {
                if let Ok(sampler) = pickup.recv() {
                    sampling_loop(socket, sampler);
                }
            });
        if let Err(e) = spawned {
            error!("Failed to spawn receive thread: {}", e);
            sampler.abandon();
            return Err(ReceiverError::SpawnFailure);
        }
        if let Err(mpsc::SendError(sampler)) = handoff.send(sampler) {
            sampler.abandon();
            return Err(ReceiverError::SpawnFailure);
        }

        let _ = self.local_addr.set(local_addr);
        info!("Listening for controller packets on {}", local_addr);
        Ok(local_addr)
    }

    /// Address the socket is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.receiver.is_key_down(key)
    }

    pub fn is_index_down(&self, index: i32) -> bool {
        self.receiver.is_index_down(index)
    }

    pub fn snapshot(&self) -> KeySnapshot {
        self.receiver.snapshot()
    }

    pub fn is_link_alive(&self) -> bool {
        self.receiver.is_link_alive()
    }

    pub fn set_debug_output(&self, enabled: bool) {
        self.receiver.set_debug_output(enabled);
    }
}

fn bind(port: u16) -> std::io::Result<UdpSocket> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))?;
    socket.set_nonblocking(true)?;
    Ok(socket)
}

fn sampling_loop(socket: UdpSocket, mut sampler: KeySampler<Arc<KeyReceiver>>) {
    let poll_interval = std::time::Duration::from_millis(sampler.config().poll_interval_ms);
    let reply_port = sampler.config().reply_port;
    let mut buf = [0u8; MAX_PACKET_LEN];

    loop {
        match socket.recv_from(&mut buf) {
            Ok((len, peer)) => {
                // Rejected packets run the timeout check inside `on_packet`.
                if let Ok(outcome) = sampler.on_packet(&buf[..len], peer, Instant::now())
                    && outcome.heartbeat
                {
                    let reply_to = SocketAddr::new(peer.ip(), reply_port);
                    if let Err(e) = socket.send_to(&HEARTBEAT_REPLY, reply_to) {
                        warn!("Heartbeat reply to {} failed: {}", reply_to, e);
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                sampler.on_idle(Instant::now());
            }
            Err(e) => {
                warn!("UDP receive failed: {}", e);
                sampler.on_idle(Instant::now());
            }
        }

        thread::sleep(poll_interval);
    }
}
