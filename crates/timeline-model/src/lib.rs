//! ScreenReel Timeline Model
//!
//! Defines the core data contracts for the timeline effects engine:
//! - **Events:** Timestamped input samples (mouse, click, key, scroll)
//! - **Clips/Tracks:** Millisecond-timed clips with trim, playback rate,
//!   and time-remap periods
//! - **Recordings:** Source media metadata plus the recorded event trace
//! - **Effects:** Zoom effect definitions and cursor rendering settings
//!
//! Everything in this crate is authored by the project editor and read-only
//! to the effects engine. Validation happens here, at ingestion: malformed
//! clips or effects never reach frame evaluation.

pub mod clip;
pub mod effect;
pub mod event;
pub mod geometry;
pub mod recording;

pub use clip::*;
pub use effect::*;
pub use event::*;
pub use geometry::*;
pub use recording::*;
