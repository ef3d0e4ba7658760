//! Timed event queue.
//!
//! A fixed pool of slots linked into a pending list, kept in fire-time
//! order, and a free list. Events with equal times fire in the order they
//! were scheduled.

/// Pool size. Every event kind reschedules at most one successor, so the
/// pool never holds more than a handful at once.
pub const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Line or frame interrupt becomes active.
    StdIntStart,
    /// Line and frame interrupts end.
    StdIntEnd,
    MidiOutIntStart,
    MidiOutIntEnd,
    EndOfLine,
    /// Poll the host for input, once per frame.
    InputUpdate,
}

/// An event due at an absolute cycle count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub time: u64,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    event: Event,
    next: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct EventQueue {
    slots: [Slot; EVENT_CAPACITY],
    pending: Option<usize>,
    free: Option<usize>,
    len: usize,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        let mut queue = Self {
            slots: [Slot {
                event: Event {
                    kind: EventKind::EndOfLine,
                    time: 0,
                },
                next: None,
            }; EVENT_CAPACITY],
            pending: None,
            free: None,
            len: 0,
        };
        queue.clear();
        queue
    }

    /// Drop every pending event.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            slot.next = (index + 1 < EVENT_CAPACITY).then_some(index + 1);
        }
        self.free = Some(0);
        self.pending = None;
        self.len = 0;
    }

    /// Add an event, after any already due at the same time.
    ///
    /// # Panics
    ///
    /// Panics if the pool is exhausted.
    pub fn schedule(&mut self, kind: EventKind, time: u64) {
        let Some(index) = self.free else {
            panic!("event pool exhausted scheduling {kind:?} at {time}");
        };
        self.free = self.slots[index].next;
        self.slots[index].event = Event { kind, time };
        self.len += 1;

        // Find the last pending event that fires no later than this one
        let mut prev = None;
        let mut cursor = self.pending;
        while let Some(i) = cursor {
            if self.slots[i].event.time > time {
                break;
            }
            prev = Some(i);
            cursor = self.slots[i].next;
        }

        self.slots[index].next = cursor;
        match prev {
            Some(p) => self.slots[p].next = Some(index),
            None => self.pending = Some(index),
        }
    }

    /// Remove and return the first event due at or before `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<Event> {
        let index = self.pending?;
        let slot = self.slots[index];
        if slot.event.time > now {
            return None;
        }
        self.pending = slot.next;
        self.slots[index].next = self.free;
        self.free = Some(index);
        self.len -= 1;
        Some(slot.event)
    }

    /// Fire time of the earliest pending event.
    #[must_use]
    pub fn next_time(&self) -> Option<u64> {
        self.pending.map(|i| self.slots[i].event.time)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pending events in firing order.
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        let mut cursor = self.pending;
        std::iter::from_fn(move || {
            let index = cursor?;
            cursor = self.slots[index].next;
            Some(self.slots[index].event)
        })
    }
}
