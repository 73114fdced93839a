//! Accumulation register, byte counter and heartbeat divider.
//!
//! Slot 0 of the register is the most significant byte. Bytes enter at the
//! least significant end and move towards slot 0 one shift at a time, so after
//! `BYTES` shifts the word reads in arrival order and slot 0 holds the oldest
//! byte. Transmission stages slot 0 and shifts again, which drains the word in
//! the same order it was filled.
//!
//! Only the controller mutates these; everything outside the crate gets
//! [`RegisterView`] or plain getters.

/// `ceil(log2(n))`
const fn ceil_log2(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        usize::BITS - (n - 1).leading_zeros()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccumulationRegister<const BYTES: usize> {
    slots: [u8; BYTES],
}

impl<const BYTES: usize> AccumulationRegister<BYTES> {
    pub const WIDTH: usize = BYTES * crate::config::BITS;

    pub(crate) fn new() -> Self {
        AccumulationRegister { slots: [0; BYTES] }
    }

    /// Shift every slot one place towards the most significant end and put
    /// `byte` in the least significant slot. The byte in slot 0 falls off.
    pub(crate) fn shift_in(&mut self, byte: u8) {
        if BYTES == 0 {
            return;
        }
        self.slots.copy_within(1.., 0);
        self.slots[BYTES - 1] = byte;
    }

    pub(crate) fn overwrite(&mut self, word: &[u8; BYTES]) {
        self.slots = *word;
    }

    pub(crate) fn clear(&mut self) {
        self.slots = [0; BYTES];
    }

    /// Most significant slot, next to go out on transmit
    pub fn head(&self) -> u8 {
        self.slots.first().copied().unwrap_or(0)
    }

    /// Least significant slot, the byte most recently shifted in
    pub fn latest(&self) -> u8 {
        self.slots.last().copied().unwrap_or(0)
    }

    pub fn is_zero(&self) -> bool {
        self.slots.iter().all(|b| *b == 0)
    }

    pub fn view(&self) -> RegisterView<'_, BYTES> {
        RegisterView(&self.slots)
    }
}

/// Read-only access to the register contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterView<'a, const BYTES: usize>(&'a [u8; BYTES]);

impl<'a, const BYTES: usize> RegisterView<'a, BYTES> {
    pub fn new(word: &'a [u8; BYTES]) -> Self {
        RegisterView(word)
    }

    pub fn as_array(&self) -> &'a [u8; BYTES] {
        self.0
    }

    pub fn as_slice(&self) -> &'a [u8] {
        self.0
    }
}

/// Counts completed byte transfers in the current loop. Never exceeds `BYTES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ByteCounter<const BYTES: usize> {
    count: usize,
}

impl<const BYTES: usize> ByteCounter<BYTES> {
    /// Bits a hardware counter needs to hold `0..=BYTES`
    pub const WIDTH: u32 = ceil_log2(BYTES) + 1;

    pub(crate) fn new() -> Self {
        ByteCounter { count: 0 }
    }

    pub fn value(&self) -> usize {
        self.count
    }

    pub fn is_full(&self) -> bool {
        self.count == BYTES
    }

    pub(crate) fn clear(&mut self) {
        self.count = 0;
    }

    /// Saturates at `BYTES`. The controller leaves the loop on full so a
    /// further increment would mean a broken transition table.
    pub(crate) fn increment(&mut self) {
        if self.count < BYTES {
            self.count += 1;
        } else {
            log::warn!("byte counter increment past {}", BYTES);
        }
    }
}

/// Free running wraparound counter, pulses once per period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockDivider {
    count: u32,
    modulus: u32,
}

impl ClockDivider {
    /// A modulus of 0 is treated as 1, pulsing every tick.
    pub fn new(modulus: u32) -> Self {
        ClockDivider {
            count: 0,
            modulus: modulus.max(1),
        }
    }

    pub fn tick(&mut self) {
        self.count = (self.count + 1) % self.modulus;
    }

    pub fn clear(&mut self) {
        self.count = 0;
    }

    pub fn pulse(&self) -> bool {
        self.count == self.modulus - 1
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}
