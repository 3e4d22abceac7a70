#![doc = "Clock prober: measures a hardware clock source against a timed waveform."]

pub mod measurement;
pub mod prober;
pub mod report;
pub mod session;
pub mod waveform;

pub use measurement::*;
pub use prober::*;
pub use report::*;
pub use session::*;
pub use waveform::*;
