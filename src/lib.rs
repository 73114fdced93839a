#![no_std]

pub mod bench;
pub mod config;
pub mod control;
pub mod datapath;
pub mod debug;
pub mod line;
pub mod phase;
pub mod serial;
pub mod stage;
mod transceiver;

pub use bench::{Bench, BenchError, LineTransceiver};
pub use config::{Config, LinkTiming, ProcessWaitPolicy, TimingError, BITS, DEFAULT_BYTES};
pub use control::ControlWord;
pub use datapath::RegisterView;
pub use line::{Line, LineError};
pub use phase::Phase;
pub use serial::{ByteReceiver, ByteTransmitter, ReceiverStatus, SerialReceiver, SerialTransmitter};
pub use stage::{Checksummed, Delayed, Map, ProcessingStage, StageInputs};
pub use transceiver::Transceiver;
