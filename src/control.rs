//! Controller combinational logic.
//!
//! Two pure functions, evaluated once per tick against the current phase:
//! [`outputs`] drives the control lines, [`next_phase`] picks the phase for the
//! next tick. Neither reads the other's result, so the order they are called in
//! doesn't matter.

use bilge::prelude::*;

use crate::config::ProcessWaitPolicy;
use crate::phase::Phase;

/// The control lines leaving the controller during one tick.
#[bitsize(16)]
#[derive(DebugBits, Clone, Copy, PartialEq, FromBits)]
pub struct ControlWord {
    /// Hold the byte receiver in reset
    pub receiver_reset: bool,
    /// Mask the global reset from the processing stage
    pub hold_stage: bool,
    /// Copy the register head into the transmit staging byte
    pub load_tx: bool,
    /// Send pulse to the byte transmitter
    pub send: bool,
    /// Shift the receive staging byte into the register
    pub shift: bool,
    pub count_enable: bool,
    pub count_clear: bool,
    /// Deliver the register to the processing stage
    pub stage_load: bool,
    pub stage_start: bool,
    /// Replace the register with the processing stage output
    pub install: bool,
    _reserved: u6,
}

impl ControlWord {
    pub fn quiet() -> ControlWord {
        ControlWord::from(0u16)
    }
}

pub fn outputs(phase: Phase) -> ControlWord {
    let mut w = ControlWord::quiet();
    if phase.is_transmit() {
        w.set_receiver_reset(true);
        w.set_hold_stage(true);
    }
    if phase.is_process() {
        w.set_count_clear(true);
    }
    match phase {
        Phase::ReceiveAdvance | Phase::TransmitAdvance => {
            w.set_shift(true);
            w.set_count_enable(true);
        }
        Phase::ProcessStart => {
            w.set_stage_load(true);
            w.set_stage_start(true);
        }
        Phase::ProcessWait => {
            w.set_stage_start(true);
            w.set_install(true);
        }
        Phase::TransmitLoad => w.set_load_tx(true),
        Phase::TransmitSend => w.set_send(true),
        _ => {}
    }
    w
}

/// Everything the transition function looks at besides the current phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Conditions {
    pub reset: bool,
    pub rx_active: bool,
    pub rx_done: bool,
    pub rx_idle: bool,
    pub tx_ready: bool,
    pub stage_done: bool,
    /// Byte counter has reached the payload size
    pub count_full: bool,
}

pub fn next_phase(phase: Phase, c: &Conditions, policy: ProcessWaitPolicy) -> Phase {
    if c.reset {
        return Phase::Idle;
    }
    match phase {
        Phase::Idle if c.rx_active => Phase::ReceivingWait,
        Phase::Idle => Phase::Idle,
        Phase::ReceivingWait if c.rx_done => Phase::ReceiveAdvance,
        Phase::ReceivingWait => Phase::ReceivingWait,
        Phase::ReceiveAdvance => Phase::ReceivePosted,
        Phase::ReceivePosted if c.count_full => Phase::ReceiveComplete,
        Phase::ReceivePosted => Phase::Idle,
        Phase::ReceiveComplete if c.rx_idle => Phase::ProcessStart,
        Phase::ReceiveComplete => Phase::ReceiveComplete,
        // Load is a single pulse, start stays up through ProcessWait.
        Phase::ProcessStart => Phase::ProcessWait,
        Phase::ProcessWait => match policy {
            ProcessWaitPolicy::Immediate => Phase::ProcessComplete,
            ProcessWaitPolicy::AwaitDone if c.stage_done => Phase::ProcessComplete,
            ProcessWaitPolicy::AwaitDone => Phase::ProcessWait,
        },
        Phase::ProcessComplete => Phase::TransmitLoad,
        Phase::TransmitLoad => Phase::TransmitSend,
        Phase::TransmitSend => Phase::TransmitWait,
        Phase::TransmitWait if c.tx_ready => Phase::TransmitAdvance,
        Phase::TransmitWait => Phase::TransmitWait,
        Phase::TransmitAdvance => Phase::TransmitPosted,
        Phase::TransmitPosted if c.count_full => Phase::TransmitComplete,
        Phase::TransmitPosted => Phase::TransmitLoad,
        // Only a reset leaves, handled above.
        Phase::TransmitComplete => Phase::TransmitComplete,
    }
}
