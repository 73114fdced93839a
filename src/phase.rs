use bilge::prelude::*;

/// Controller state. Encoded in four bits, two codes unused.
///
/// `Idle` is the reset phase and the `Default`.
#[bitsize(4)]
#[derive(TryFromBits, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle = 0,
    ReceivingWait = 1,
    ReceiveAdvance = 2,
    ReceivePosted = 3,
    ReceiveComplete = 4,
    ProcessStart = 5,
    ProcessWait = 6,
    ProcessComplete = 7,
    TransmitLoad = 8,
    TransmitSend = 9,
    TransmitWait = 10,
    TransmitAdvance = 11,
    TransmitPosted = 12,
    TransmitComplete = 13,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Idle
    }
}

impl Phase {
    pub const ALL: [Phase; 14] = [
        Phase::Idle,
        Phase::ReceivingWait,
        Phase::ReceiveAdvance,
        Phase::ReceivePosted,
        Phase::ReceiveComplete,
        Phase::ProcessStart,
        Phase::ProcessWait,
        Phase::ProcessComplete,
        Phase::TransmitLoad,
        Phase::TransmitSend,
        Phase::TransmitWait,
        Phase::TransmitAdvance,
        Phase::TransmitPosted,
        Phase::TransmitComplete,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Phase> {
        if code > 0x0F {
            return None;
        }
        Phase::try_from(u4::new(code)).ok()
    }

    /// Idle and the three receive states
    pub fn is_receive(self) -> bool {
        self.code() <= Phase::ReceiveComplete.code()
    }

    pub fn is_process(self) -> bool {
        matches!(
            self,
            Phase::ProcessStart | Phase::ProcessWait | Phase::ProcessComplete
        )
    }

    pub fn is_transmit(self) -> bool {
        self.code() >= Phase::TransmitLoad.code()
    }
}
