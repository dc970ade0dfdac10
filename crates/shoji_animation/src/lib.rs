//! Shoji Animation
//!
//! The widgets animate through CSS transitions owned by the host page. This
//! crate only provides what the Rust side needs to stage them:
//!
//! - **Frame scheduling**: a [`FrameScheduler`] seam with a manually driven
//!   queue and a synchronous implementation, plus [`after_frames`] for the
//!   double-animation-frame pattern
//! - **Timing**: parsing of `transition-duration` values

pub mod frame;
pub mod timing;

pub use frame::{after_frames, FrameCallback, FrameScheduler, ImmediateFrames, ManualFrames};
pub use timing::{parse_time_value, transition_duration};
