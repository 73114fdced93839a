//! Byte level collaborators: the receiver and transmitter seams, and models of
//! both that pace an `embedded-hal-nb` serial device at frame timing.

use embedded_hal_nb::serial::{Error, Read, Write};

use crate::config::LinkTiming;

/// Receiver flags and data as seen by the controller this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReceiverStatus {
    /// Last fully received byte, zero after reset
    pub byte: u8,
    /// Fully quiesced, nothing on the line
    pub idle: bool,
    /// A byte is being shifted in
    pub active: bool,
    /// High for exactly one tick per received byte
    pub done: bool,
}

pub trait ByteReceiver {
    fn status(&self) -> ReceiverStatus;

    fn clock(&mut self, reset: bool);
}

pub trait ByteTransmitter {
    /// A new byte may be accepted
    fn ready(&self) -> bool;

    /// `send` must be high for exactly one tick to commit `byte`.
    fn clock(&mut self, byte: u8, send: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RxState {
    Idle,
    Active { remaining: u32, byte: u8 },
    Done,
    Stop { remaining: u32 },
}

/// Pulls bytes from a serial device and presents them with the flag timing of
/// a UART receiver: a byte shows as active for the start and data bits, pulses
/// done for one tick, then sits in its stop bit before going idle.
#[derive(Debug)]
pub struct SerialReceiver<Rx: Read> {
    rx: Rx,
    timing: LinkTiming,
    state: RxState,
    byte: u8,
    line_errors: u32,
}

impl<Rx: Read> SerialReceiver<Rx> {
    pub fn new(rx: Rx, timing: LinkTiming) -> SerialReceiver<Rx> {
        SerialReceiver {
            rx,
            timing,
            state: RxState::Idle,
            byte: 0,
            line_errors: 0,
        }
    }

    pub fn serial(&self) -> &Rx {
        &self.rx
    }

    pub fn serial_mut(&mut self) -> &mut Rx {
        &mut self.rx
    }

    pub fn line_errors(&self) -> u32 {
        self.line_errors
    }

    /// Look for a start bit. Device errors drop the byte.
    fn poll_line(&mut self) -> RxState {
        match self.rx.read() {
            Ok(byte) => RxState::Active {
                remaining: self.timing.data_ticks().saturating_sub(1),
                byte,
            },
            Err(nb::Error::WouldBlock) => RxState::Idle,
            Err(nb::Error::Other(e)) => {
                self.line_errors = self.line_errors.saturating_add(1);
                log::warn!("receive error on line: {:?}", e.kind());
                RxState::Idle
            }
        }
    }
}

impl<Rx: Read> ByteReceiver for SerialReceiver<Rx> {
    fn status(&self) -> ReceiverStatus {
        ReceiverStatus {
            byte: self.byte,
            idle: self.state == RxState::Idle,
            active: matches!(self.state, RxState::Active { .. }),
            done: self.state == RxState::Done,
        }
    }

    fn clock(&mut self, reset: bool) {
        if reset {
            self.state = RxState::Idle;
            self.byte = 0;
            return;
        }
        self.state = match self.state {
            RxState::Idle => self.poll_line(),
            RxState::Active { remaining: 0, byte } => {
                self.byte = byte;
                RxState::Done
            }
            RxState::Active { remaining, byte } => RxState::Active {
                remaining: remaining - 1,
                byte,
            },
            RxState::Done => RxState::Stop {
                remaining: self.timing.stop_ticks().saturating_sub(1),
            },
            RxState::Stop { remaining: 0 } => RxState::Idle,
            RxState::Stop { remaining } => RxState::Stop {
                remaining: remaining - 1,
            },
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Ready,
    Busy { remaining: u32, byte: u8 },
}

/// Accepts one byte per send pulse, holds it for a frame time, then hands it to
/// the serial device. Stays busy while the device would block.
#[derive(Debug)]
pub struct SerialTransmitter<Tx: Write> {
    tx: Tx,
    timing: LinkTiming,
    state: TxState,
    line_errors: u32,
}

impl<Tx: Write> SerialTransmitter<Tx> {
    pub fn new(tx: Tx, timing: LinkTiming) -> SerialTransmitter<Tx> {
        SerialTransmitter {
            tx,
            timing,
            state: TxState::Ready,
            line_errors: 0,
        }
    }

    pub fn serial(&self) -> &Tx {
        &self.tx
    }

    pub fn serial_mut(&mut self) -> &mut Tx {
        &mut self.tx
    }

    pub fn line_errors(&self) -> u32 {
        self.line_errors
    }

    fn commit(&mut self, byte: u8) -> TxState {
        match self.tx.write(byte) {
            Ok(()) => TxState::Ready,
            Err(nb::Error::WouldBlock) => TxState::Busy { remaining: 0, byte },
            Err(nb::Error::Other(e)) => {
                self.line_errors = self.line_errors.saturating_add(1);
                log::warn!("transmit error on line: {:?}", e.kind());
                TxState::Ready
            }
        }
    }
}

impl<Tx: Write> ByteTransmitter for SerialTransmitter<Tx> {
    fn ready(&self) -> bool {
        self.state == TxState::Ready
    }

    fn clock(&mut self, byte: u8, send: bool) {
        self.state = match self.state {
            TxState::Ready if send => TxState::Busy {
                remaining: self.timing.frame_ticks().saturating_sub(1),
                byte,
            },
            TxState::Ready => TxState::Ready,
            TxState::Busy { remaining: 0, byte } => self.commit(byte),
            TxState::Busy { remaining, byte } => TxState::Busy {
                remaining: remaining - 1,
                byte,
            },
        };
    }
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use embedded_hal_nb::serial::ErrorType;

    use super::*;

    /// Serial device with a fixed script of incoming bytes.
    struct Script<const N: usize> {
        bytes: [u8; N],
        at: usize,
    }

    impl<const N: usize> ErrorType for Script<N> {
        type Error = Infallible;
    }

    impl<const N: usize> Read for Script<N> {
        fn read(&mut self) -> nb::Result<u8, Self::Error> {
            let b = self.bytes.get(self.at).copied().ok_or(nb::Error::WouldBlock)?;
            self.at += 1;
            Ok(b)
        }
    }

    /// Collects written bytes, refusing the first `stall` attempts.
    struct Sink {
        out: heapless::Vec<u8, 8>,
        stall: u32,
    }

    impl ErrorType for Sink {
        type Error = Infallible;
    }

    impl Write for Sink {
        fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
            if self.stall > 0 {
                self.stall -= 1;
                return Err(nb::Error::WouldBlock);
            }
            let _ = self.out.push(word);
            Ok(())
        }

        fn flush(&mut self) -> nb::Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn receiver_flag_sequence() {
        let mut r = SerialReceiver::new(Script { bytes: [0x5A], at: 0 }, LinkTiming::FAST);
        assert!(r.status().idle);
        r.clock(false);
        // start bit seen
        assert!(r.status().active);
        for _ in 0..8 {
            r.clock(false);
            assert!(r.status().active);
            assert!(!r.status().done);
        }
        r.clock(false);
        let s = r.status();
        assert!(s.done && !s.active && !s.idle);
        assert_eq!(s.byte, 0x5A);
        // stop bit
        r.clock(false);
        let s = r.status();
        assert!(!s.done && !s.active && !s.idle);
        assert_eq!(s.byte, 0x5A);
        r.clock(false);
        assert!(r.status().idle);
        assert_eq!(r.status().byte, 0x5A);
    }

    #[test]
    fn receiver_done_pulses_once_per_byte() {
        let mut r = SerialReceiver::new(Script { bytes: [1, 2, 3], at: 0 }, LinkTiming::FAST);
        let mut seen = heapless::Vec::<u8, 4>::new();
        for _ in 0..100 {
            r.clock(false);
            if r.status().done {
                seen.push(r.status().byte).unwrap();
            }
        }
        assert_eq!(seen.as_slice(), &[1, 2, 3]);
        assert!(r.status().idle);
    }

    #[test]
    fn receiver_reset_clears_byte() {
        let mut r = SerialReceiver::new(Script { bytes: [7], at: 0 }, LinkTiming::FAST);
        for _ in 0..10 {
            r.clock(false);
        }
        assert_eq!(r.status().byte, 7);
        r.clock(true);
        assert_eq!(r.status(), ReceiverStatus { byte: 0, idle: true, active: false, done: false });
    }

    #[test]
    fn transmitter_busy_for_a_frame() {
        let mut t = SerialTransmitter::new(
            Sink {
                out: heapless::Vec::new(),
                stall: 0,
            },
            LinkTiming::FAST,
        );
        assert!(t.ready());
        t.clock(0x42, true);
        let mut busy = 0;
        while !t.ready() {
            busy += 1;
            t.clock(0, false);
        }
        assert_eq!(busy, LinkTiming::FAST.frame_ticks());
        assert_eq!(t.serial().out.as_slice(), &[0x42]);
    }

    #[test]
    fn transmitter_waits_out_blocking_device() {
        let mut t = SerialTransmitter::new(
            Sink {
                out: heapless::Vec::new(),
                stall: 3,
            },
            LinkTiming::FAST,
        );
        t.clock(0x11, true);
        let mut busy = 0;
        while !t.ready() {
            busy += 1;
            t.clock(0, false);
        }
        assert_eq!(busy, LinkTiming::FAST.frame_ticks() + 3);
        assert_eq!(t.serial().out.as_slice(), &[0x11]);
    }
}
