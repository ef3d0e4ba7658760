//! Memory contention table.
//!
//! Each entry is an OR-mask applied to the line cycle after a 3 T-state
//! access: 3 aligns the access to a 4 T-state slot, 7 to an 8 T-state slot.
//! A line is split into 64 T-state buckets and there are five rows per
//! mode family:
//!
//! | Row | Line                         |
//! |-----|------------------------------|
//! | 0   | border                       |
//! | 1   | border, next line is screen  |
//! | 2   | screen                       |
//! | 3   | screen, next line is border  |
//! | 4   | border after the screen      |
//!
//! Rows 5-9 repeat the layout for mode 1, which also contends alternate
//! blocks in the border. An access whose cycle has run past the end of the
//! line reads the row below, so it sees the next line's pattern.

use crate::FrameTiming;

const ROWS_PER_FAMILY: usize = 5;
const MODE1_BASE: usize = ROWS_PER_FAMILY;

/// Wait masks for every bucket of every row, plus the current selection.
#[derive(Debug, Clone)]
pub struct ContentionTable {
    buckets: usize,
    tstates_per_line: i32,
    masks: Vec<u8>,
    /// Contention disabled (screen off in mode 3 or 4).
    active: bool,
    /// First row of the family in use: 0, or 5 for mode 1.
    base: usize,
    /// Row within the family for the current line.
    row: usize,
}

impl ContentionTable {
    #[must_use]
    pub fn new(timing: &FrameTiming) -> Self {
        let buckets = timing.buckets_per_line();
        let screen = timing.border_cycles..timing.border_cycles + timing.screen_cycles;
        let mut masks = vec![3; 2 * ROWS_PER_FAMILY * buckets];

        for bucket in 0..buckets {
            let m = (bucket * 64) as u32;
            let in_screen = screen.contains(&m);
            let mode1_block = m & 0x40 != 0;

            let mut set = |row: usize, contended: bool| {
                masks[row * buckets + bucket] = if contended { 7 } else { 3 };
            };
            set(2, in_screen);
            set(3, in_screen);
            set(5, mode1_block);
            set(6, mode1_block);
            set(9, mode1_block);
            set(7, mode1_block || in_screen);
            set(8, mode1_block || in_screen);
        }

        Self {
            buckets,
            tstates_per_line: timing.tstates_per_line as i32,
            masks,
            active: true,
            base: 0,
            row: 0,
        }
    }

    /// Reconsider contention after a mode or screen-off change.
    pub fn update(&mut self, active: bool, mode1: bool) {
        self.active = active;
        self.base = if mode1 { MODE1_BASE } else { 0 };
    }

    /// Select the row for a new line.
    pub fn select_line(&mut self, line: u32, timing: &FrameTiming) {
        let top = timing.top_border_lines;
        let bottom = top + timing.screen_lines;
        let screen = usize::from(timing.is_screen_line(line));
        let edge = usize::from(line + 1 == top || line + 1 == bottom);
        self.row = 2 * screen + edge;
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Wait mask for an access at `line_cycle`, already advanced past the
    /// 3 T-state access itself.
    #[must_use]
    pub fn mask(&self, line_cycle: i32) -> u8 {
        let mut row = if self.active { self.base + self.row } else { 0 };
        let mut cycle = line_cycle.max(0);

        if cycle >= self.tstates_per_line {
            let last = if self.active { self.base + ROWS_PER_FAMILY - 1 } else { 0 };
            row = (row + 1).min(last);
            cycle -= self.tstates_per_line;
        }

        let bucket = ((cycle >> 6) as usize).min(self.buckets - 1);
        self.masks[row * self.buckets + bucket]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pal() -> (FrameTiming, ContentionTable) {
        let timing = FrameTiming::default();
        let table = ContentionTable::new(&timing);
        (timing, table)
    }

    #[test]
    fn masks_are_three_or_seven() {
        let (timing, mut table) = pal();
        for mode1 in [false, true] {
            for active in [false, true] {
                table.update(active, mode1);
                for line in 0..timing.height_lines {
                    table.select_line(line, &timing);
                    for cycle in -8..(2 * 384) {
                        let mask = table.mask(cycle);
                        assert!(mask == 3 || mask == 7, "line {line} cycle {cycle}: {mask}");
                    }
                }
            }
        }
    }

    #[test]
    fn screen_line_contends_only_the_screen_area() {
        let (timing, mut table) = pal();
        table.select_line(100, &timing);
        assert_eq!(table.mask(10), 3);
        assert_eq!(table.mask(64), 7);
        assert_eq!(table.mask(319), 7);
        assert_eq!(table.mask(320), 3);
    }

    #[test]
    fn border_line_is_uncontended() {
        let (timing, mut table) = pal();
        table.select_line(10, &timing);
        for cycle in 0..384 {
            assert_eq!(table.mask(cycle), 3);
        }
    }

    #[test]
    fn mode1_contends_alternate_blocks_in_border() {
        let (timing, mut table) = pal();
        table.update(true, true);
        table.select_line(10, &timing);
        assert_eq!(table.mask(0), 3);
        assert_eq!(table.mask(64), 7);
        assert_eq!(table.mask(128), 3);
        assert_eq!(table.mask(192), 7);
    }

    #[test]
    fn access_past_line_end_sees_next_line() {
        let (timing, mut table) = pal();
        // Last border line before the screen: the overrun reads a screen row
        table.select_line(67, &timing);
        assert_eq!(table.mask(64), 3);
        assert_eq!(table.mask(384 + 64), 7);

        // Last screen line: the overrun reads the border row
        table.select_line(259, &timing);
        assert_eq!(table.mask(64), 7);
        assert_eq!(table.mask(384 + 64), 3);
    }

    #[test]
    fn inactive_contention_uses_border_row() {
        let (timing, mut table) = pal();
        table.update(false, false);
        table.select_line(100, &timing);
        assert_eq!(table.mask(128), 3);
    }

    #[test]
    fn negative_cycles_clamp_to_line_start() {
        let (timing, mut table) = pal();
        table.select_line(100, &timing);
        assert_eq!(table.mask(-5), table.mask(0));
    }
}
