//! In-process control link: an SPSC ring of encoded packets.
//!
//! Stands in for the physical link between the two devices. Packets arrive
//! in order and none are lost while the receiver keeps draining. A sender
//! stalled behind a receiver that stopped draining gives up after
//! [`STALL_LIMIT`] and drops the packet.

use log::{debug, warn};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tp_control::PacketSink;
use tp_engine::Engine;
use tp_wire::{PacketBuf, WireError};

/// Default ring capacity in packets.
pub const LINK_CAPACITY: usize = 256;

/// How long `send` waits on a full ring before dropping the packet.
pub const STALL_LIMIT: Duration = Duration::from_millis(50);

/// Control-plane end of the link.
pub struct LinkSender {
    producer: HeapProd<PacketBuf>,
    receiver_alive: Arc<AtomicBool>,
    stall_limit: Duration,
    dropped: usize,
}

/// Synthesis-plane end of the link.
pub struct LinkReceiver {
    consumer: HeapCons<PacketBuf>,
    alive: Arc<AtomicBool>,
}

/// Outcome of draining the link into an engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub applied: usize,
    pub discarded: usize,
    pub last_error: Option<WireError>,
}

/// Create a connected sender/receiver pair holding up to `capacity` packets.
pub fn packet_link(capacity: usize) -> (LinkSender, LinkReceiver) {
    let (producer, consumer) = HeapRb::<PacketBuf>::new(capacity).split();
    let alive = Arc::new(AtomicBool::new(true));
    (
        LinkSender {
            producer,
            receiver_alive: alive.clone(),
            stall_limit: STALL_LIMIT,
            dropped: 0,
        },
        LinkReceiver { consumer, alive },
    )
}

impl LinkSender {
    /// Number of packets sent but not yet drained.
    pub fn pending(&self) -> usize {
        self.producer.occupied_len()
    }

    pub fn receiver_alive(&self) -> bool {
        self.receiver_alive.load(Ordering::Acquire)
    }

    /// Packets dropped because the receiver was gone or stalled.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn set_stall_limit(&mut self, limit: Duration) {
        self.stall_limit = limit;
    }
}

impl PacketSink for LinkSender {
    /// Waits (yielding) while the ring is full, for at most the stall limit.
    /// Packets are dropped once the receiver is gone or the limit passes.
    fn send(&mut self, packet: PacketBuf) {
        let mut packet = packet;
        let mut deadline = None;
        loop {
            match self.producer.try_push(packet) {
                Ok(()) => return,
                Err(rejected) => {
                    if !self.receiver_alive() {
                        debug!("link receiver gone, dropping packet");
                        self.dropped += 1;
                        return;
                    }
                    let now = Instant::now();
                    let deadline = *deadline.get_or_insert(now + self.stall_limit);
                    if now >= deadline {
                        warn!(
                            "packet link stalled for {:?}, dropping packet",
                            self.stall_limit
                        );
                        self.dropped += 1;
                        return;
                    }
                    packet = rejected;
                    std::thread::yield_now();
                }
            }
        }
    }
}

impl LinkReceiver {
    /// Apply every pending packet to `engine`, in order.
    ///
    /// Call between sample ticks. Faulty packets are discarded and counted;
    /// nothing here allocates.
    pub fn drain_into(&mut self, engine: &mut Engine) -> DrainReport {
        let mut report = DrainReport::default();
        while let Some(packet) = self.consumer.try_pop() {
            match engine.handle_packet(&packet) {
                Ok(()) => report.applied += 1,
                Err(e) => {
                    report.discarded += 1;
                    report.last_error = Some(e);
                }
            }
        }
        report
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }
}

impl Drop for LinkReceiver {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_ir::{GlobalState, Instrument, VoiceAssignment};
    use tp_wire::Packet;

    #[test]
    fn packets_arrive_in_order() {
        let (mut tx, mut rx) = packet_link(8);
        let mut global = GlobalState::default();
        global.master_volume = 1;
        tx.send(Packet::global(&global));
        global.master_volume = 2;
        tx.send(Packet::global(&global));
        assert_eq!(tx.pending(), 2);

        let mut engine = Engine::new();
        let report = rx.drain_into(&mut engine);
        assert_eq!(report.applied, 2);
        assert_eq!(engine.global().master_volume, 2);
        assert!(rx.is_empty());
    }

    #[test]
    fn bad_packets_counted_not_applied() {
        let (mut tx, mut rx) = packet_link(8);
        let assignment = VoiceAssignment {
            enabled: true,
            instrument: Instrument::Sine,
            note: 60,
            channel: 0,
            velocity: 100,
        };
        tx.send(Packet::generator(99, true, &assignment));
        tx.send(PacketBuf::from_slice(&[7, 7]).unwrap());
        tx.send(Packet::generator(1, true, &assignment));

        let mut engine = Engine::new();
        let report = rx.drain_into(&mut engine);
        assert_eq!(report.applied, 1);
        assert_eq!(report.discarded, 2);
        assert_eq!(report.last_error, Some(WireError::UnknownTag(7)));
        assert!(engine.voice(1).unwrap().assignment.enabled);
    }

    #[test]
    fn send_after_receiver_dropped_does_not_block() {
        let (mut tx, rx) = packet_link(1);
        tx.send(Packet::global(&GlobalState::default()));
        drop(rx);
        assert!(!tx.receiver_alive());
        tx.send(Packet::global(&GlobalState::default()));
    }

    #[test]
    fn stalled_receiver_does_not_block_sender() {
        let (mut tx, rx) = packet_link(1);
        tx.set_stall_limit(Duration::from_millis(10));
        let sender = std::thread::spawn(move || {
            tx.send(Packet::global(&GlobalState::default()));
            tx.send(Packet::global(&GlobalState::default()));
            tx
        });

        let started = Instant::now();
        while !sender.is_finished() {
            assert!(
                started.elapsed() < Duration::from_secs(2),
                "send blocked on a stalled receiver"
            );
            std::thread::sleep(Duration::from_millis(1));
        }
        let tx = sender.join().unwrap();
        assert!(rx.consumer.is_full());
        assert_eq!(tx.pending(), 1);
        assert_eq!(tx.dropped(), 1);
        assert!(tx.receiver_alive());
    }

    #[test]
    fn full_link_waits_for_consumer() {
        let (mut tx, mut rx) = packet_link(1);
        let reader = std::thread::spawn(move || {
            let mut engine = Engine::new();
            let mut applied = 0;
            while applied < 10 {
                applied += rx.drain_into(&mut engine).applied;
                std::thread::yield_now();
            }
            applied
        });
        for volume in 0..10u8 {
            let global = GlobalState {
                master_volume: volume,
                ..Default::default()
            };
            tx.send(Packet::global(&global));
        }
        assert_eq!(reader.join().unwrap(), 10);
    }
}
