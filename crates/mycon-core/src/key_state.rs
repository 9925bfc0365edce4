//! Published key state shared between the sampling loop and its readers.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::keys::{KEY_COUNT, Key};

/// Pressed/released flag for every key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeySnapshot {
    flags: [bool; KEY_COUNT],
}

impl KeySnapshot {
    /// Every key released.
    pub const fn released() -> Self {
        Self {
            flags: [false; KEY_COUNT],
        }
    }

    pub const fn from_flags(flags: [bool; KEY_COUNT]) -> Self {
        Self { flags }
    }

    pub const fn is_down(&self, key: Key) -> bool {
        self.flags[key.index()]
    }

    /// Flag at a raw index. Anything outside the key range reads as released.
    pub fn is_index_down(&self, index: i32) -> bool {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.flags.get(i))
            .copied()
            .unwrap_or(false)
    }

    pub fn set(&mut self, key: Key, down: bool) {
        self.flags[key.index()] = down;
    }

    pub fn pressed(&self) -> impl Iterator<Item = Key> + '_ {
        Key::ALL.into_iter().filter(move |&k| self.is_down(k))
    }

    /// Keys whose flag differs from `previous`, with their new flag.
    pub fn changes_since(
        &self,
        previous: &KeySnapshot,
    ) -> impl Iterator<Item = (Key, bool)> + use<'_> {
        let previous = *previous;
        Key::ALL
            .into_iter()
            .filter(move |&k| previous.is_down(k) != self.is_down(k))
            .map(move |k| (k, self.is_down(k)))
    }

    pub fn any_pressed(&self) -> bool {
        self.flags.iter().any(|&f| f)
    }

    pub const fn flags(&self) -> &[bool; KEY_COUNT] {
        &self.flags
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Published {
    keys: KeySnapshot,
    link_alive: bool,
}

/// Key state readable from any context.
///
/// The sampling loop replaces all flags in one locked copy, so a reader never
/// observes a mix of two packets.
pub struct SharedKeyState {
    published: Mutex<CriticalSectionRawMutex, Cell<Published>>,
    debug_output: AtomicBool,
    started: AtomicBool,
}

impl SharedKeyState {
    pub const fn new() -> Self {
        Self {
            published: Mutex::new(Cell::new(Published {
                keys: KeySnapshot::released(),
                link_alive: false,
            })),
            debug_output: AtomicBool::new(false),
            started: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> KeySnapshot {
        self.published.lock(|p| p.get().keys)
    }

    /// True between an accepted packet and the next timeout.
    pub fn is_link_alive(&self) -> bool {
        self.published.lock(|p| p.get().link_alive)
    }

    /// Replace every flag at once.
    pub fn publish(&self, keys: KeySnapshot, link_alive: bool) {
        self.published.lock(|p| p.set(Published { keys, link_alive }));
    }

    pub fn debug_output(&self) -> bool {
        self.debug_output.load(Ordering::Relaxed)
    }

    pub fn set_debug_output(&self, enabled: bool) {
        self.debug_output.store(enabled, Ordering::Relaxed);
    }

    /// Mark the state as owned by a running loop. Returns false if it already was.
    pub fn try_claim(&self) -> bool {
        self.started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Undo a claim whose start failed before any loop was launched.
    pub fn release_claim(&self) {
        self.started.store(false, Ordering::Release);
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }
}

impl Default for SharedKeyState {
    fn default() -> Self {
        Self::new()
    }
}
