//! Platform hooks.

use sam_asic::{KeyMatrix, RasterPos};

/// Callbacks from the core to the platform layer. Every hook has an empty
/// default, so a host only implements what it draws or plays.
pub trait Host {
    /// The last line of a frame has been run.
    fn frame_complete(&mut self) {}

    /// A new frame is about to start.
    fn frame_start(&mut self) {}

    /// VMPR is changing to `vmpr`. Draw up to `pos` with the old mode.
    fn change_mode(&mut self, _vmpr: u8, _pos: RasterPos) {}

    /// The screen is being re-enabled by a BORDER write of `border`.
    fn change_screen(&mut self, _border: u8, _pos: RasterPos) {}

    /// Display state is about to change: draw everything up to `pos`.
    fn update_frame(&mut self, _pos: RasterPos) {}

    /// Refresh the keyboard matrix.
    fn poll_input(&mut self, _keys: &mut KeyMatrix) {}

    /// Checked between frames by [`Sam::main_loop`](crate::Sam::main_loop).
    fn keep_running(&mut self) -> bool {
        false
    }
}

/// Headless host: ignores every hook and runs one frame at a time.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl Host for NullHost {}
