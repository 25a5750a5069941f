//! Frame timing.
//!
//! One `FrameClock` per render loop; call `tick()` once per frame. The
//! animation reads `FrameTime::elapsed`, which is monotonic and unclamped.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
