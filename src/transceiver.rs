//! The controller core.
//!
//! [`Transceiver::tick`] is one clock edge. Every collaborator flag, the
//! register and the counter are sampled first, the control lines and the next
//! phase are computed from those samples only, and then everything is updated
//! together. Nothing computed during a tick is visible until the next one.

use crate::config::{Config, ProcessWaitPolicy};
use crate::control::{self, Conditions, ControlWord};
use crate::datapath::{AccumulationRegister, ByteCounter, ClockDivider, RegisterView};
use crate::debug::{self, DebugWord};
use crate::phase::Phase;
use crate::serial::{ByteReceiver, ByteTransmitter};
use crate::stage::{ProcessingStage, StageInputs};

/// Receives `BYTES` bytes, runs them through the processing stage and sends
/// the result back, one transaction per reset.
///
/// There is no timeout anywhere. A collaborator that never finishes parks the
/// controller in the matching wait state until the next reset.
pub struct Transceiver<R, T, S, const BYTES: usize = { crate::config::DEFAULT_BYTES }> {
    receiver: R,
    transmitter: T,
    stage: S,
    policy: ProcessWaitPolicy,
    phase: Phase,
    register: AccumulationRegister<BYTES>,
    counter: ByteCounter<BYTES>,
    rx_staging: u8,
    tx_staging: u8,
    divider: ClockDivider,
}

impl<R, T, S, const BYTES: usize> Transceiver<R, T, S, BYTES>
where
    R: ByteReceiver,
    T: ByteTransmitter,
    S: ProcessingStage<BYTES>,
{
    pub fn new(receiver: R, transmitter: T, stage: S, config: Config) -> Self {
        Transceiver {
            receiver,
            transmitter,
            stage,
            policy: config.policy,
            phase: Phase::Idle,
            register: AccumulationRegister::new(),
            counter: ByteCounter::new(),
            rx_staging: 0,
            tx_staging: 0,
            divider: ClockDivider::new(config.divider_modulus),
        }
    }

    /// Advance one clock. `reset` overrides every other transition.
    pub fn tick(&mut self, reset: bool) {
        let phase = self.phase;
        let ctl = control::outputs(phase);
        let rx = self.receiver.status();
        let stage_done = self.stage.done();
        let conditions = Conditions {
            reset,
            rx_active: rx.active,
            rx_done: rx.done,
            rx_idle: rx.idle,
            tx_ready: self.transmitter.ready(),
            stage_done,
            count_full: self.counter.is_full(),
        };
        let next = control::next_phase(phase, &conditions, self.policy);

        // The stage result is read before the stage is clocked.
        let result = if !reset && ctl.install() && next == Phase::ProcessComplete {
            Some(*self.stage.output())
        } else {
            None
        };

        self.receiver.clock(reset || ctl.receiver_reset());
        self.transmitter
            .clock(self.tx_staging, !reset && ctl.send());
        self.stage.clock(StageInputs {
            reset: reset && !ctl.hold_stage(),
            load: !reset && ctl.stage_load(),
            start: !reset && ctl.stage_start(),
            word: self.register.view(),
        });

        if reset {
            if phase != Phase::Idle {
                log::debug!("reset in {:?} at byte {}", phase, self.counter.value());
            }
            self.register.clear();
            self.counter.clear();
            self.rx_staging = 0;
            self.tx_staging = 0;
            self.divider.clear();
            self.phase = next;
            return;
        }

        if let Some(word) = result {
            self.register.overwrite(&word);
            log::debug!("installed stage result");
        } else if ctl.shift() {
            self.register.shift_in(self.rx_staging);
        }
        if ctl.count_clear() {
            self.counter.clear();
        } else if ctl.count_enable() {
            self.counter.increment();
        }
        if ctl.load_tx() {
            self.tx_staging = self.register.head();
        }
        self.rx_staging = rx.byte;
        self.divider.tick();

        if next != phase {
            log::trace!("{:?} -> {:?} at byte {}", phase, next, self.counter.value());
            match next {
                Phase::ProcessStart => log::debug!("payload of {} bytes assembled", BYTES),
                Phase::TransmitComplete => log::debug!("transaction complete"),
                _ => {}
            }
        }
        self.phase = next;
    }

    /// Clock until `done` holds or `limit` ticks have passed, without reset.
    /// Returns the number of ticks run.
    pub fn run_until<F>(&mut self, limit: u64, mut done: F) -> Option<u64>
    where
        F: FnMut(&Self) -> bool,
    {
        for n in 0..limit {
            if done(&*self) {
                return Some(n);
            }
            self.tick(false);
        }
        if done(&*self) { Some(limit) } else { None }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn count(&self) -> usize {
        self.counter.value()
    }

    pub fn register(&self) -> RegisterView<'_, BYTES> {
        self.register.view()
    }

    pub fn rx_staging(&self) -> u8 {
        self.rx_staging
    }

    pub fn tx_staging(&self) -> u8 {
        self.tx_staging
    }

    /// Control lines driven during the current tick
    pub fn control(&self) -> ControlWord {
        control::outputs(self.phase)
    }

    pub fn heartbeat(&self) -> bool {
        self.divider.pulse()
    }

    pub fn debug_word(&self) -> u16 {
        let default = DebugWord::compose(self.register.latest(), self.counter.value());
        debug::display(default, self.stage.diagnostic())
    }

    pub fn policy(&self) -> ProcessWaitPolicy {
        self.policy
    }

    pub fn receiver(&self) -> &R {
        &self.receiver
    }

    pub fn receiver_mut(&mut self) -> &mut R {
        &mut self.receiver
    }

    pub fn transmitter(&self) -> &T {
        &self.transmitter
    }

    pub fn transmitter_mut(&mut self) -> &mut T {
        &mut self.transmitter
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn into_parts(self) -> (R, T, S) {
        (self.receiver, self.transmitter, self.stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::ReceiverStatus;
    use crate::stage;

    /// Receiver that hands out scripted bytes: active for four ticks, done for
    /// one, then idle.
    struct Quick<const N: usize> {
        bytes: [u8; N],
        at: usize,
        left: u8,
        status: ReceiverStatus,
    }

    impl<const N: usize> Quick<N> {
        fn new(bytes: [u8; N]) -> Self {
            Quick {
                bytes,
                at: 0,
                left: 0,
                status: ReceiverStatus {
                    idle: true,
                    ..Default::default()
                },
            }
        }
    }

    impl<const N: usize> ByteReceiver for Quick<N> {
        fn status(&self) -> ReceiverStatus {
            self.status
        }

        fn clock(&mut self, reset: bool) {
            let s = &mut self.status;
            if reset {
                *s = ReceiverStatus {
                    idle: true,
                    ..Default::default()
                };
                self.left = 0;
            } else if s.active && self.left > 0 {
                self.left -= 1;
            } else if s.active {
                s.active = false;
                s.done = true;
                s.byte = self.bytes[self.at];
                self.at += 1;
            } else if s.done {
                s.done = false;
                s.idle = true;
            } else if self.at < N {
                s.idle = false;
                s.active = true;
                self.left = 3;
            }
        }
    }

    /// Transmitter that is ready again the tick after a send.
    struct Echo<const N: usize> {
        sent: heapless::Vec<u8, N>,
        busy: bool,
    }

    impl<const N: usize> ByteTransmitter for Echo<N> {
        fn ready(&self) -> bool {
            !self.busy
        }

        fn clock(&mut self, byte: u8, send: bool) {
            if self.busy {
                self.busy = false;
            } else if send {
                let _ = self.sent.push(byte);
                self.busy = true;
            }
        }
    }

    fn echo<const N: usize>() -> Echo<N> {
        Echo {
            sent: heapless::Vec::new(),
            busy: false,
        }
    }

    #[test]
    fn full_cycle_with_quick_collaborators() {
        let mut t: Transceiver<_, _, _, 3> =
            Transceiver::new(Quick::new([7, 8, 9]), echo::<3>(), stage::identity::<3>(), Config::DEFAULT);
        t.tick(true);
        let n = t
            .run_until(200, |t| t.phase() == Phase::TransmitComplete)
            .unwrap();
        assert!(n > 0);
        assert_eq!(t.transmitter().sent.as_slice(), &[7, 8, 9]);
        assert_eq!(t.count(), 3);
        // drained register holds only what the reset receiver shifted in
        assert!(t.register().as_slice().iter().all(|b| *b == 0));
    }

    #[test]
    fn register_holds_payload_at_process_start() {
        let mut t: Transceiver<_, _, _, 3> =
            Transceiver::new(Quick::new([1, 2, 3]), echo::<3>(), stage::invert::<3>(), Config::DEFAULT);
        t.run_until(200, |t| t.phase() == Phase::ProcessStart)
            .unwrap();
        assert_eq!(t.register().as_array(), &[1, 2, 3]);
        assert_eq!(t.count(), 3);
        t.tick(false);
        assert_eq!(t.phase(), Phase::ProcessWait);
        assert_eq!(t.count(), 0);
        t.tick(false);
        assert_eq!(t.phase(), Phase::ProcessComplete);
        assert_eq!(t.register().as_array(), &[0xFE, 0xFD, 0xFC]);
    }

    #[test]
    fn each_phase_visited_in_order() {
        let mut t: Transceiver<_, _, _, 1> =
            Transceiver::new(Quick::new([5]), echo::<1>(), stage::identity::<1>(), Config::DEFAULT);
        let mut trail = heapless::Vec::<Phase, 32>::new();
        for _ in 0..40 {
            if trail.last() != Some(&t.phase()) {
                trail.push(t.phase()).unwrap();
            }
            t.tick(false);
        }
        assert_eq!(trail.as_slice(), &Phase::ALL);
    }

    #[test]
    fn debug_word_shows_latest_and_count() {
        let mut t: Transceiver<_, _, _, 2> =
            Transceiver::new(Quick::new([0x3C, 0x4D]), echo::<2>(), stage::identity::<2>(), Config::DEFAULT);
        t.run_until(50, |t| t.count() == 1).unwrap();
        assert_eq!(t.debug_word(), 0x3C01);
    }

    #[test]
    fn heartbeat_follows_divider() {
        let config = Config {
            divider_modulus: 3,
            ..Config::DEFAULT
        };
        let mut t: Transceiver<_, _, _, 1> =
            Transceiver::new(Quick::new([]), echo::<1>(), stage::identity::<1>(), config);
        let mut beats = 0;
        for _ in 0..9 {
            t.tick(false);
            if t.heartbeat() {
                beats += 1;
            }
        }
        assert_eq!(beats, 3);
        t.tick(true);
        assert!(!t.heartbeat());
    }
}
