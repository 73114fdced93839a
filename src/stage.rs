//! The processing stage seam and a few stages to plug into it.

use crc::{CRC_8_MAXIM_DOW, Crc};

use crate::datapath::RegisterView;

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_MAXIM_DOW);

/// Signals the controller drives into the stage for one tick.
#[derive(Debug, Clone, Copy)]
pub struct StageInputs<'a, const BYTES: usize> {
    pub reset: bool,
    /// One tick pulse, `word` is the payload to work on
    pub load: bool,
    /// High for the whole processing span
    pub start: bool,
    pub word: RegisterView<'a, BYTES>,
}

/// An opaque unit turning the assembled payload into a same-width result.
///
/// Once `done` goes high the stage must keep it high, with `output` stable,
/// until it is reset or loaded again.
pub trait ProcessingStage<const BYTES: usize> {
    fn done(&self) -> bool;

    fn output(&self) -> &[u8; BYTES];

    /// Replaces the default status display while `Some`.
    fn diagnostic(&self) -> Option<u16> {
        None
    }

    /// Advance one tick.
    fn clock(&mut self, inputs: StageInputs<'_, BYTES>);
}

pub type WordFn<const BYTES: usize> = fn(&[u8; BYTES]) -> [u8; BYTES];

/// Applies a function to the word on load, done the following tick.
pub struct Map<F, const BYTES: usize> {
    f: F,
    output: [u8; BYTES],
    done: bool,
}

impl<F, const BYTES: usize> Map<F, BYTES>
where
    F: FnMut(&[u8; BYTES]) -> [u8; BYTES],
{
    pub fn new(f: F) -> Self {
        Map {
            f,
            output: [0; BYTES],
            done: false,
        }
    }
}

pub fn identity<const BYTES: usize>() -> Map<WordFn<BYTES>, BYTES> {
    let f: WordFn<BYTES> = |word| *word;
    Map::new(f)
}

pub fn invert<const BYTES: usize>() -> Map<WordFn<BYTES>, BYTES> {
    let f: WordFn<BYTES> = |word| word.map(|b| !b);
    Map::new(f)
}

impl<F, const BYTES: usize> ProcessingStage<BYTES> for Map<F, BYTES>
where
    F: FnMut(&[u8; BYTES]) -> [u8; BYTES],
{
    fn done(&self) -> bool {
        self.done
    }

    fn output(&self) -> &[u8; BYTES] {
        &self.output
    }

    fn clock(&mut self, inputs: StageInputs<'_, BYTES>) {
        if inputs.reset {
            self.output = [0; BYTES];
            self.done = false;
        } else if inputs.load {
            self.output = (self.f)(inputs.word.as_array());
            self.done = true;
        }
    }
}

/// Holds back an inner stage's result until `latency` ticks of start have
/// passed since the load. The output reads as zero until then.
pub struct Delayed<S, const BYTES: usize> {
    inner: S,
    latency: u32,
    remaining: u32,
    armed: bool,
    output: [u8; BYTES],
    done: bool,
}

impl<S: ProcessingStage<BYTES>, const BYTES: usize> Delayed<S, BYTES> {
    pub fn new(inner: S, latency: u32) -> Self {
        Delayed {
            inner,
            latency,
            remaining: 0,
            armed: false,
            output: [0; BYTES],
            done: false,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn settle(&mut self) {
        if self.armed && self.remaining == 0 && self.inner.done() {
            self.output = *self.inner.output();
            self.done = true;
            self.armed = false;
        }
    }
}

impl<S: ProcessingStage<BYTES>, const BYTES: usize> ProcessingStage<BYTES> for Delayed<S, BYTES> {
    fn done(&self) -> bool {
        self.done
    }

    fn output(&self) -> &[u8; BYTES] {
        &self.output
    }

    fn diagnostic(&self) -> Option<u16> {
        if self.done { self.inner.diagnostic() } else { None }
    }

    fn clock(&mut self, inputs: StageInputs<'_, BYTES>) {
        self.inner.clock(inputs);
        if inputs.reset {
            self.remaining = 0;
            self.armed = false;
            self.output = [0; BYTES];
            self.done = false;
            return;
        }
        if inputs.load {
            self.remaining = self.latency;
            self.armed = true;
            self.output = [0; BYTES];
            self.done = false;
        } else if inputs.start && self.remaining > 0 {
            self.remaining -= 1;
        }
        self.settle();
    }
}

/// Publishes CRC-8/MAXIM-DOW of the input word (high byte) and of the result
/// (low byte) on the status display once the inner stage is done.
pub struct Checksummed<S> {
    inner: S,
    input_crc: u8,
}

impl<S> Checksummed<S> {
    pub fn new(inner: S) -> Self {
        Checksummed {
            inner,
            input_crc: 0,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: ProcessingStage<BYTES>, const BYTES: usize> ProcessingStage<BYTES> for Checksummed<S> {
    fn done(&self) -> bool {
        self.inner.done()
    }

    fn output(&self) -> &[u8; BYTES] {
        self.inner.output()
    }

    fn diagnostic(&self) -> Option<u16> {
        if !self.inner.done() {
            return None;
        }
        let out = CRC8.checksum(self.inner.output());
        Some(u16::from_be_bytes([self.input_crc, out]))
    }

    fn clock(&mut self, inputs: StageInputs<'_, BYTES>) {
        if inputs.reset {
            self.input_crc = 0;
        } else if inputs.load {
            self.input_crc = CRC8.checksum(inputs.word.as_slice());
        }
        self.inner.clock(inputs);
    }
}
