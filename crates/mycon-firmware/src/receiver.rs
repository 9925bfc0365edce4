//! UDP sampling task for the key-state receiver.
//!
//! The socket is polled without blocking once per poll interval. Between
//! polls the task sleeps, so other tasks on the executor keep running.

use core::task::Poll;

use embassy_executor::Spawner;
use embassy_futures::poll_once;
use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::{IpEndpoint, Stack};
use embassy_time::{Instant, Timer};
use log::{error, info, warn};
use static_cell::StaticCell;

use mycon_core::packet::{HEARTBEAT_REPLY, MAX_PACKET_LEN};
use mycon_core::{KeyReceiver, KeySampler, ReceiverError};

/// Datagrams buffered per direction.
const SOCKET_PACKETS: usize = 4;
const SOCKET_BUFFER_LEN: usize = SOCKET_PACKETS * MAX_PACKET_LEN;

struct SocketBuffers {
    rx_meta: [PacketMetadata; SOCKET_PACKETS],
    rx: [u8; SOCKET_BUFFER_LEN],
    tx_meta: [PacketMetadata; SOCKET_PACKETS],
    tx: [u8; SOCKET_BUFFER_LEN],
}

impl SocketBuffers {
    const fn new() -> Self {
        Self {
            rx_meta: [PacketMetadata::EMPTY; SOCKET_PACKETS],
            rx: [0; SOCKET_BUFFER_LEN],
            tx_meta: [PacketMetadata::EMPTY; SOCKET_PACKETS],
            tx: [0; SOCKET_BUFFER_LEN],
        }
    }
}

static SOCKET_BUFFERS: StaticCell<SocketBuffers> = StaticCell::new();

/// Bind `port` and spawn the sampling task for `receiver`.
///
/// Only one receiver can run per firmware image. A failed bind leaves the
/// receiver claimed; the caller is expected to treat it as fatal.
pub fn start(
    spawner: &Spawner,
    stack: Stack<'static>,
    receiver: &'static KeyReceiver,
    port: u16,
) -> Result<(), ReceiverError> {
    let sampler = KeySampler::claim(receiver)?;

    let Some(buffers) = SOCKET_BUFFERS.try_init(SocketBuffers::new()) else {
        sampler.abandon();
        return Err(ReceiverError::AlreadyStarted);
    };
    let SocketBuffers {
        rx_meta,
        rx,
        tx_meta,
        tx,
    } = buffers;

    let mut socket = UdpSocket::new(stack, rx_meta, rx, tx_meta, tx);
    if let Err(e) = socket.bind(port) {
        error!("Failed to bind UDP port {}: {:?}", port, e);
        return Err(ReceiverError::BindFailure { port });
    }

    let token = sampling_task(socket, sampler).map_err(|_| ReceiverError::SpawnFailure)?;
    spawner.spawn(token);

    info!("Listening for controller packets on UDP port {}", port);
    Ok(())
}

#[embassy_executor::task]
async fn sampling_task(socket: UdpSocket<'static>, mut sampler: KeySampler<&'static KeyReceiver>) {
    let poll_interval = sampler.config().poll_interval();
    let reply_port = sampler.config().reply_port;
    let mut buf = [0u8; MAX_PACKET_LEN];

    loop {
        match poll_once(socket.recv_from(&mut buf)) {
            Poll::Ready(Ok((len, meta))) => {
                let peer = meta.endpoint;
                // Rejected packets run the timeout check inside `on_packet`.
                if let Ok(outcome) = sampler.on_packet(&buf[..len], peer, Instant::now())
                    && outcome.heartbeat
                {
                    let reply_to = IpEndpoint::new(peer.addr, reply_port);
                    if let Err(e) = socket.send_to(&HEARTBEAT_REPLY, reply_to).await {
                        warn!("Heartbeat reply to {} failed: {:?}", reply_to, e);
                    }
                }
            }
            Poll::Ready(Err(e)) => {
                warn!("UDP receive failed: {:?}", e);
                sampler.on_idle(Instant::now());
            }
            Poll::Pending => {
                sampler.on_idle(Instant::now());
            }
        }

        Timer::after(poll_interval).await;
    }
}
