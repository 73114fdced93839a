//! Host side harness: a [`Transceiver`] whose receiver and transmitter sit on
//! two in-memory [`Line`]s, driven one transaction at a time.

use embedded_io::{Read, Write};

use crate::config::{Config, LinkTiming};
use crate::line::{Line, LineError};
use crate::phase::Phase;
use crate::serial::{ByteTransmitter, SerialReceiver, SerialTransmitter};
use crate::stage::ProcessingStage;
use crate::transceiver::Transceiver;

pub type LineTransceiver<S, const BYTES: usize, const LINE: usize> =
    Transceiver<SerialReceiver<Line<LINE>>, SerialTransmitter<Line<LINE>>, S, BYTES>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchError {
    PayloadLength { expected: usize, found: usize },
    Line(LineError),
    /// The outbound line did not hold exactly one response.
    ResponseLength { expected: usize, found: usize },
    /// The tick budget ran out before the transaction finished.
    Stalled { phase: Phase, count: usize, ticks: u64 },
}

impl From<LineError> for BenchError {
    fn from(value: LineError) -> Self {
        BenchError::Line(value)
    }
}

pub struct Bench<S, const BYTES: usize, const LINE: usize> {
    core: LineTransceiver<S, BYTES, LINE>,
    ticks: u64,
}

impl<S, const BYTES: usize, const LINE: usize> Bench<S, BYTES, LINE>
where
    S: ProcessingStage<BYTES>,
{
    pub fn new(stage: S, timing: LinkTiming, config: Config) -> Self {
        let core = Transceiver::new(
            SerialReceiver::new(Line::new(), timing),
            SerialTransmitter::new(Line::new(), timing),
            stage,
            config,
        );
        Bench { core, ticks: 0 }
    }

    pub fn core(&self) -> &LineTransceiver<S, BYTES, LINE> {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut LineTransceiver<S, BYTES, LINE> {
        &mut self.core
    }

    /// Ticks clocked since construction
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn step(&mut self, reset: bool) {
        self.core.tick(reset);
        self.ticks += 1;
    }

    pub fn reset(&mut self) {
        self.step(true);
    }

    /// Queue bytes on the inbound line.
    pub fn send(&mut self, data: &[u8]) -> Result<(), BenchError> {
        self.core.receiver_mut().serial_mut().write_all(data)?;
        Ok(())
    }

    /// Take everything the transmitter has put on the outbound line.
    pub fn drain(&mut self) -> heapless::Vec<u8, LINE> {
        let line = self.core.transmitter_mut().serial_mut();
        let mut buf = [0u8; LINE];
        let mut out = heapless::Vec::new();
        // Line reads never fail and a Vec of LINE bytes holds a whole line.
        while let Ok(n) = line.read(&mut buf) {
            if n == 0 {
                break;
            }
            let _ = out.extend_from_slice(&buf[..n]);
        }
        out
    }

    /// Clock without reset until `done` holds, at most `max_ticks` times.
    pub fn run_until<F>(&mut self, max_ticks: u64, done: F) -> Result<u64, BenchError>
    where
        F: FnMut(&LineTransceiver<S, BYTES, LINE>) -> bool,
    {
        match self.core.run_until(max_ticks, done) {
            Some(n) => {
                self.ticks += n;
                Ok(n)
            }
            None => {
                self.ticks += max_ticks;
                Err(BenchError::Stalled {
                    phase: self.core.phase(),
                    count: self.core.count(),
                    ticks: max_ticks,
                })
            }
        }
    }

    /// Hold reset until a byte the transmitter already accepted has gone out,
    /// then empty both lines of whatever an earlier transaction left behind.
    fn settle(&mut self, max_ticks: u64) -> Result<(), BenchError> {
        let mut n = 0;
        loop {
            self.core.transmitter_mut().serial_mut().clear();
            if self.core.transmitter().ready() {
                break;
            }
            if n == max_ticks {
                return Err(BenchError::Stalled {
                    phase: self.core.phase(),
                    count: self.core.count(),
                    ticks: n,
                });
            }
            self.reset();
            n += 1;
        }
        self.core.receiver_mut().serial_mut().clear();
        Ok(())
    }

    /// Reset, send `payload`, and clock until the response has gone out.
    pub fn transact(
        &mut self,
        payload: &[u8],
        max_ticks: u64,
    ) -> Result<heapless::Vec<u8, BYTES>, BenchError> {
        if payload.len() != BYTES {
            return Err(BenchError::PayloadLength {
                expected: BYTES,
                found: payload.len(),
            });
        }
        self.reset();
        self.settle(max_ticks)?;
        self.send(payload)?;
        self.run_until(max_ticks, |t| t.phase() == Phase::TransmitComplete)?;
        let drained = self.drain();
        let mut out = heapless::Vec::new();
        out.extend_from_slice(&drained)
            .map_err(|_| BenchError::ResponseLength {
                expected: BYTES,
                found: drained.len(),
            })?;
        if out.len() != BYTES {
            return Err(BenchError::ResponseLength {
                expected: BYTES,
                found: out.len(),
            });
        }
        Ok(out)
    }
}
