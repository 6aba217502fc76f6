//! Time subsystem.
//!
//! Provides stable, testable frame timing utilities without coupling to the runtime.
//! Intended usage:
//! - one `FrameClock` per render loop, started at load
//! - call `tick()` once per rendered frame to obtain `FrameTime`

mod frame_clock;

pub use frame_clock::{oscillate, FrameClock, FrameTime};
