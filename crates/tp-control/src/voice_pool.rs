//! VoicePool: the control plane's record of which slot plays which note.

use tp_ir::{ChannelIndex, NoteIndex, VoiceAssignment, N_GENERATORS};

/// Identifier for a generator slot.
pub type SlotId = usize;

/// Fixed pool of generator assignments with round-robin allocation.
///
/// A slot is free whenever its `enabled` flag is clear, even if the
/// synthesis plane is still playing its release tail. Rotating the search
/// start spreads reuse across slots so a just-released slot is not
/// immediately cut off.
#[derive(Clone, Debug)]
pub struct VoicePool {
    slots: [VoiceAssignment; N_GENERATORS],
    /// Where the next vacancy search starts.
    cursor: SlotId,
}

impl VoicePool {
    /// Create a pool with every slot disabled.
    pub fn new() -> Self {
        Self {
            slots: [VoiceAssignment::default(); N_GENERATORS],
            cursor: 0,
        }
    }

    pub fn cursor(&self) -> SlotId {
        self.cursor
    }

    pub fn get(&self, slot: SlotId) -> Option<&VoiceAssignment> {
        self.slots.get(slot)
    }

    pub fn get_mut(&mut self, slot: SlotId) -> Option<&mut VoiceAssignment> {
        self.slots.get_mut(slot)
    }

    pub fn slots(&self) -> &[VoiceAssignment] {
        &self.slots
    }

    /// Count of enabled (held) slots.
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.enabled).count()
    }

    /// Find the first disabled slot at or after the cursor, wrapping once
    /// around the pool. On success the cursor moves one past the returned
    /// slot. Returns `None` when every slot is held.
    pub fn find_vacant(&mut self) -> Option<SlotId> {
        let start = self.cursor;
        let slot = (0..N_GENERATORS)
            .map(|offset| (start + offset) % N_GENERATORS)
            .find(|&slot| !self.slots[slot].enabled)?;
        self.cursor = (slot + 1) % N_GENERATORS;
        Some(slot)
    }

    /// Find the held slot playing `note` on `channel`, if any.
    pub fn find_matching(&self, note: NoteIndex, channel: ChannelIndex) -> Option<SlotId> {
        self.slots.iter().position(|s| s.holds(note, channel))
    }
}

impl Default for VoicePool {
    fn default() -> Self {
        Self::new()
    }
}
