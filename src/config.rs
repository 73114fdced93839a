//! Fixed parameters of a deployed transceiver.
//!
//! Everything here is decided at build time. The payload size is carried as the
//! `BYTES` const generic on the datapath and on [`crate::Transceiver`], the
//! values below only describe the reference sizing and link.

/// Width of one register slot. Slots are `u8`, so this never changes.
pub const BITS: usize = 8;
/// Payload size of the reference design.
pub const DEFAULT_BYTES: usize = 128;
/// Nominal system clock.
pub const CLOCK_HZ: u32 = 100_000_000;
/// Nominal link symbol rate.
pub const BAUD_RATE: u32 = 115_200;
/// Wrap period of the heartbeat divider, in ticks.
pub const DIVIDER_MODULUS: u32 = 1 << 20;

/// Start bit + data bits + stop bit
pub const FRAME_BITS: u32 = BITS as u32 + 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingError {
    ZeroBaud,
    ClockBelowBaud { clock_hz: u32, baud: u32 },
}

/// How many core clock ticks one symbol on the line lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTiming {
    clocks_per_bit: u32,
}

impl LinkTiming {
    pub const NOMINAL: LinkTiming = LinkTiming {
        clocks_per_bit: CLOCK_HZ / BAUD_RATE,
    };

    /// One tick per bit. Handy for simulation where wall time doesn't matter.
    pub const FAST: LinkTiming = LinkTiming { clocks_per_bit: 1 };

    pub const fn from_rates(clock_hz: u32, baud: u32) -> Result<LinkTiming, TimingError> {
        if baud == 0 {
            return Err(TimingError::ZeroBaud);
        }
        if clock_hz < baud {
            return Err(TimingError::ClockBelowBaud { clock_hz, baud });
        }
        Ok(LinkTiming {
            clocks_per_bit: clock_hz / baud,
        })
    }

    pub const fn clocks_per_bit(&self) -> u32 {
        self.clocks_per_bit
    }

    /// Ticks from the start edge until the last data bit has been sampled
    pub const fn data_ticks(&self) -> u32 {
        self.clocks_per_bit * (1 + BITS as u32)
    }

    pub const fn stop_ticks(&self) -> u32 {
        self.clocks_per_bit
    }

    pub const fn frame_ticks(&self) -> u32 {
        self.clocks_per_bit * FRAME_BITS
    }
}

/// What the controller does in `ProcessWait`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessWaitPolicy {
    /// Hold `ProcessWait` until the stage raises done, then install its result.
    #[default]
    AwaitDone,
    /// Leave `ProcessWait` on the next tick whatever the stage reports, installing
    /// whatever its output holds at that moment. Matches the reference hardware,
    /// which only works with stages that finish within the load tick.
    Immediate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub policy: ProcessWaitPolicy,
    pub divider_modulus: u32,
}

impl Config {
    pub const DEFAULT: Config = Config {
        policy: ProcessWaitPolicy::AwaitDone,
        divider_modulus: DIVIDER_MODULUS,
    };

    pub const fn with_policy(self, policy: ProcessWaitPolicy) -> Config {
        Config { policy, ..self }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::DEFAULT
    }
}
