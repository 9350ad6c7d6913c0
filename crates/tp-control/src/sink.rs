//! Outbound transport seam.

use alloc::vec::Vec;
use tp_wire::PacketBuf;

/// Receives encoded packets from the control plane.
///
/// The link behind it is assumed reliable and ordered. Implementations must
/// not block the caller for long; the control plane sends from its event
/// handler.
pub trait PacketSink {
    fn send(&mut self, packet: PacketBuf);
}

/// Collects packets in order, for offline hosts and tests.
impl PacketSink for Vec<PacketBuf> {
    fn send(&mut self, packet: PacketBuf) {
        self.push(packet);
    }
}

impl<S: PacketSink + ?Sized> PacketSink for &mut S {
    fn send(&mut self, packet: PacketBuf) {
        (**self).send(packet);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send_two(sink: &mut impl PacketSink) {
        sink.send(PacketBuf::from_slice(&[1]).unwrap());
        sink.send(PacketBuf::from_slice(&[2, 3]).unwrap());
    }

    #[test]
    fn vec_sink_preserves_order() {
        let mut sent: Vec<PacketBuf> = Vec::new();
        send_two(&mut sent);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].as_slice(), &[1]);
        assert_eq!(sent[1].as_slice(), &[2, 3]);
    }

    #[test]
    fn borrowed_sink_forwards() {
        let mut sent: Vec<PacketBuf> = Vec::new();
        {
            let mut borrowed = &mut sent;
            send_two(&mut borrowed);
        }
        assert_eq!(sent.len(), 2);
    }
}
