//! Frame geometry and interrupt timing.

/// T-states after power-on during which the ASIC ignores its ports.
pub const ASIC_STARTUP_DELAY: u64 = 49_152;

/// Frame geometry and interrupt timing, all in CPU T-states or lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FrameTiming {
    pub tstates_per_line: u32,
    pub height_lines: u32,
    pub top_border_lines: u32,
    pub screen_lines: u32,
    /// Left border width.
    pub border_cycles: u32,
    /// Width of the main screen area.
    pub screen_cycles: u32,
    /// Offset into the preceding line at which a line or frame interrupt
    /// becomes active.
    pub int_start_time: u32,
    pub int_active_time: u32,
    pub midi_int_active_time: u32,
    pub midi_transmit_time: u32,
    /// Delay before a screen page change reaches the display.
    pub video_delay: u32,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self {
            tstates_per_line: 384,
            height_lines: 312,
            top_border_lines: 68,
            screen_lines: 192,
            border_cycles: 64,
            screen_cycles: 256,
            int_start_time: 320,
            int_active_time: 128,
            midi_int_active_time: 16,
            midi_transmit_time: 1920,
            video_delay: 8,
        }
    }
}

impl FrameTiming {
    /// Check that the geometry is self-consistent.
    pub fn validate(&self) -> Result<(), String> {
        if self.tstates_per_line == 0 {
            return Err("line length must be non-zero".into());
        }
        if self.height_lines == 0 {
            return Err("frame height must be non-zero".into());
        }
        if self.screen_lines > 0 && self.top_border_lines == 0 {
            return Err("a screen area needs at least one border line above it".into());
        }
        let frame_lines = self.top_border_lines.checked_add(self.screen_lines);
        if frame_lines.is_none_or(|lines| lines > self.height_lines) {
            return Err(format!(
                "{} border + {} screen lines do not fit a {}-line frame",
                self.top_border_lines, self.screen_lines, self.height_lines
            ));
        }
        let line_cycles = self.border_cycles.checked_add(self.screen_cycles);
        if line_cycles.is_none_or(|cycles| cycles > self.tstates_per_line) {
            return Err(format!(
                "{} + {} T-states of border and screen do not fit a {} T-state line",
                self.border_cycles, self.screen_cycles, self.tstates_per_line
            ));
        }
        if self.int_start_time >= self.tstates_per_line {
            return Err("interrupt start must fall inside the line".into());
        }
        let frame = self.tstates_per_line.checked_mul(self.height_lines);
        if frame.is_none_or(|frame| u64::from(frame) > i32::MAX as u64 / 2) {
            return Err("frame is too long".into());
        }
        if self.midi_transmit_time > u32::MAX - 64 {
            return Err("MIDI transmit time is too long".into());
        }
        Ok(())
    }

    #[must_use]
    pub const fn tstates_per_frame(&self) -> u32 {
        self.tstates_per_line * self.height_lines
    }

    /// 64 T-state contention buckets per line, rounded up.
    #[must_use]
    pub const fn buckets_per_line(&self) -> usize {
        self.tstates_per_line.div_ceil(64) as usize
    }

    /// True for lines in the main screen area.
    #[must_use]
    pub const fn is_screen_line(&self, line: u32) -> bool {
        line >= self.top_border_lines && line < self.top_border_lines + self.screen_lines
    }

    /// Delay from a MIDI OUT write to the start of its transmit interrupt.
    ///
    /// The byte goes out on a 32 T-state serial clock, and the interrupt
    /// fires shortly before the last bit.
    #[must_use]
    pub const fn midi_out_delay(&self) -> u32 {
        let rounded = (self.midi_transmit_time + 16).next_multiple_of(32);
        (rounded + 2).saturating_sub(16 + 32 + self.midi_int_active_time)
    }
}

/// Raster position handed to the host when video state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RasterPos {
    pub line: u32,
    pub line_cycle: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_geometry_is_rejected_not_overflowed() {
        let timing = FrameTiming {
            tstates_per_line: 100_000,
            height_lines: 100_000,
            top_border_lines: 1,
            screen_lines: 1,
            ..FrameTiming::default()
        };
        assert_eq!(timing.validate(), Err("frame is too long".into()));

        let timing = FrameTiming {
            border_cycles: u32::MAX,
            ..FrameTiming::default()
        };
        assert!(timing.validate().is_err());

        let timing = FrameTiming {
            top_border_lines: u32::MAX,
            ..FrameTiming::default()
        };
        assert!(timing.validate().is_err());

        let timing = FrameTiming {
            midi_transmit_time: u32::MAX,
            ..FrameTiming::default()
        };
        assert!(timing.validate().is_err());
    }

    #[test]
    fn pal_frame() {
        let timing = FrameTiming::default();
        assert!(timing.validate().is_ok());
        assert_eq!(timing.tstates_per_frame(), 119_808);
        assert_eq!(timing.buckets_per_line(), 6);
        assert!(timing.is_screen_line(68));
        assert!(!timing.is_screen_line(260));
    }

    #[test]
    fn midi_out_delay_matches_serial_clock() {
        assert_eq!(FrameTiming::default().midi_out_delay(), 1890);
    }

    #[test]
    fn partial_buckets_round_up() {
        let timing = FrameTiming {
            tstates_per_line: 228,
            ..FrameTiming::default()
        };
        assert_eq!(timing.buckets_per_line(), 4);
    }

    #[test]
    fn rejects_impossible_geometry() {
        let zero_line = FrameTiming {
            tstates_per_line: 0,
            ..FrameTiming::default()
        };
        assert!(zero_line.validate().is_err());

        let tall_screen = FrameTiming {
            screen_lines: 300,
            ..FrameTiming::default()
        };
        assert!(tall_screen.validate().is_err());

        let wide_screen = FrameTiming {
            screen_cycles: 384,
            ..FrameTiming::default()
        };
        assert!(wide_screen.validate().is_err());
    }
}
