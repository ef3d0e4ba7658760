//! SAM bus: timed memory and port access, ASIC ports and event processing.
//!
//! # Timing
//!
//! Every memory access costs 3 T-states and is then aligned by the
//! contention mask: `line_cycle = (line_cycle + 3) | mask`. Port accesses
//! cost 4 T-states, and ASIC ports (low byte 0xF8 and up) align to the
//! next 8 T-state slot. Internal cycles are added by [`Bus::delay`].
//!
//! Elapsed time only reaches the global counter in [`SamBus::check_events`],
//! which then runs every event that has fallen due.

use emu_core::Bus;
use sam_asic::regs::{
    ATTR_PORT, BASE_ASIC_PORT, BORDER_PORT, CLOCK_PORT, CLUT_BASE_PORT, DALLAS_CLOCK_BASE,
    FLOPPY_MASK, FLOPPY1_BASE, FLOPPY2_BASE, HEPR_PORT, HMPR_MD3COL_MASK, HMPR_PORT,
    KEYBOARD_PORT, LEPR_PORT, LINE_PORT, LMPR_PORT, LPEN_PORT, LPEN_TXFMST, MIDI_PORT, PEN_MASK,
    PRINTL1_DATA, PRINTL1_STAT, PRINTL2_DATA, PRINTL2_STAT, SDIDE_DATA, SDIDE_REG, SERIAL1,
    SERIAL2, SOUND_DATA, STATUS_INT_FRAME, STATUS_INT_LINE, STATUS_INT_MIDIOUT, STATUS_PORT,
    VMPR_MODE_MASK, VMPR_PAGE_MASK, VMPR_PORT, YATBUS_BASE, YATBUS_MASK,
};
use sam_asic::{Asic, ContentionTable, FrameTiming, RasterPos, ScreenMode};
use tracing::{debug, trace};

use crate::events::{Event, EventKind, EventQueue};
use crate::host::Host;
use crate::io::Peripherals;
use crate::memory::{Memory, PhysAddr};

/// Raster position and global cycle count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock {
    /// T-states into the current line. Runs past the line length until the
    /// end-of-line event catches up.
    pub line_cycle: i32,
    /// `line_cycle` as of the last event check.
    pub prev_line_cycle: i32,
    /// 0 is the first line of the frame, which starts in the top border.
    pub line: u32,
    pub cycle_counter: u64,
}

impl Clock {
    #[must_use]
    pub const fn pos(&self) -> RasterPos {
        RasterPos {
            line: self.line,
            line_cycle: self.line_cycle,
        }
    }
}

/// Physical locations touched by data accesses since the last clear:
/// up to two reads and two writes. Opcode and operand fetches are not
/// recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessTrace {
    reads: [Option<PhysAddr>; 2],
    writes: [Option<PhysAddr>; 2],
}

impl AccessTrace {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub const fn reads(&self) -> [Option<PhysAddr>; 2] {
        self.reads
    }

    #[must_use]
    pub const fn writes(&self) -> [Option<PhysAddr>; 2] {
        self.writes
    }

    fn record(slots: &mut [Option<PhysAddr>; 2], phys: PhysAddr) {
        if let Some(slot) = slots.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some(phys);
        }
    }
}

/// The SAM bus, implementing `emu_core::Bus`.
///
/// Owns memory, the ASIC registers, the peripherals and the event queue.
/// The CPU reaches all of them through the `Bus` trait.
pub struct SamBus<H: Host> {
    pub memory: Memory,
    pub asic: Asic,
    pub devices: Peripherals,
    pub events: EventQueue,
    pub clock: Clock,
    pub trace: AccessTrace,
    pub host: H,
    timing: FrameTiming,
    contention: ContentionTable,
    /// Set by the end-of-line event when the last line has been run.
    frame_done: bool,
    /// ASIC still ignoring its ports after power-on.
    asic_startup: bool,
    asic_startup_delay: u64,
}

impl<H: Host> SamBus<H> {
    /// `timing` must already be validated.
    #[must_use]
    pub fn new(memory: Memory, timing: FrameTiming, asic_startup_delay: Option<u64>, host: H) -> Self {
        Self {
            memory,
            asic: Asic::new(),
            devices: Peripherals::default(),
            events: EventQueue::new(),
            clock: Clock::default(),
            trace: AccessTrace::default(),
            host,
            timing,
            contention: ContentionTable::new(&timing),
            frame_done: false,
            asic_startup: asic_startup_delay.is_some(),
            asic_startup_delay: asic_startup_delay.unwrap_or(0),
        }
    }

    #[must_use]
    pub const fn timing(&self) -> &FrameTiming {
        &self.timing
    }

    #[must_use]
    pub const fn frame_done(&self) -> bool {
        self.frame_done
    }

    pub(crate) fn clear_frame_done(&mut self) {
        self.frame_done = false;
    }

    #[must_use]
    pub const fn contention(&self) -> &ContentionTable {
        &self.contention
    }

    /// Reset line: restart line timing and the event queue, reset the
    /// ASIC registers and paging. The global counter keeps running.
    pub fn reset(&mut self) {
        self.clock.line_cycle = 0;
        self.clock.prev_line_cycle = 0;

        let now = self.clock.cycle_counter;
        self.events.clear();
        self.events
            .schedule(EventKind::EndOfLine, now + u64::from(self.timing.tstates_per_line));
        self.events.schedule(
            EventKind::InputUpdate,
            now + u64::from(self.timing.tstates_per_frame() / 2),
        );

        self.asic.reset();
        self.memory.page_in(&self.asic);
        self.update_contention();
        self.contention.select_line(self.clock.line, &self.timing);
        self.frame_done = false;
        self.trace.clear();
    }

    /// Wrap to the top of the next frame after the last line has run.
    pub(crate) fn wrap_frame(&mut self) {
        self.devices.frame_end();
        self.clock.line %= self.timing.height_lines;
        self.contention.select_line(self.clock.line, &self.timing);
    }

    /// Contention mask an access to `address` would see right now.
    /// 0 for uncontended memory, else 3 or 7.
    #[must_use]
    pub fn access_penalty(&self, address: u16) -> u8 {
        if self.memory.is_contended(address) {
            self.contention.mask(self.clock.line_cycle + 3)
        } else {
            0
        }
    }

    fn mem_access(&mut self, address: u16) {
        let mask = self.access_penalty(address);
        self.clock.line_cycle = (self.clock.line_cycle + 3) | i32::from(mask);
    }

    fn port_access(&mut self, port: u16) {
        self.clock.line_cycle += 4;
        if port as u8 >= BASE_ASIC_PORT {
            self.clock.line_cycle |= 7;
        }
    }

    /// Reconsider contention after a mode or screen-off change.
    pub fn update_contention(&mut self) {
        self.contention
            .update(self.asic.contention_active(), self.asic.mode() == ScreenMode::Mode1);
    }

    /// Move elapsed line time onto the global counter and run every event
    /// that is now due.
    pub fn check_events(&mut self) {
        let elapsed = self.clock.line_cycle - self.clock.prev_line_cycle;
        self.clock.cycle_counter += elapsed.max(0) as u64;
        self.clock.prev_line_cycle = self.clock.line_cycle;

        while let Some(event) = self.events.pop_due(self.clock.cycle_counter) {
            self.execute_event(event);
        }
    }

    fn execute_event(&mut self, event: Event) {
        let timing = self.timing;
        let line = self.clock.line;

        match event.kind {
            EventKind::StdIntStart => {
                let line_int = u32::from(self.asic.line_int);
                if line_int < timing.screen_lines
                    && line + 1 == line_int + timing.top_border_lines
                {
                    self.asic.status &= !STATUS_INT_LINE;
                    self.events.schedule(
                        EventKind::StdIntEnd,
                        event.time + u64::from(timing.int_active_time),
                    );
                } else if line + 1 == timing.height_lines {
                    self.asic.status &= !STATUS_INT_FRAME;
                    self.events.schedule(
                        EventKind::StdIntEnd,
                        event.time + u64::from(timing.int_active_time),
                    );
                }
            }

            EventKind::StdIntEnd => {
                self.asic.status |= STATUS_INT_FRAME | STATUS_INT_LINE;
            }

            EventKind::MidiOutIntStart => {
                self.asic.status &= !STATUS_INT_MIDIOUT;
                self.events.schedule(
                    EventKind::MidiOutIntEnd,
                    event.time + u64::from(timing.midi_int_active_time),
                );
            }

            EventKind::MidiOutIntEnd => {
                self.asic.status |= STATUS_INT_MIDIOUT;
                self.asic.lpen &= !LPEN_TXFMST;
            }

            EventKind::EndOfLine => {
                let tpl = timing.tstates_per_line as i32;
                self.clock.prev_line_cycle -= tpl;
                self.clock.line_cycle -= tpl;
                self.clock.line += 1;
                self.events.schedule(
                    EventKind::EndOfLine,
                    event.time + u64::from(timing.tstates_per_line),
                );

                let line = self.clock.line;
                if line >= timing.height_lines {
                    self.frame_done = true;
                } else {
                    self.contention.select_line(line, &timing);

                    // Lines whose right border may raise a LINE or FRAME interrupt
                    let top = timing.top_border_lines;
                    let line_window = line + 1 >= top && line + 1 < top + timing.screen_lines;
                    if line_window || line + 1 == timing.height_lines {
                        self.events.schedule(
                            EventKind::StdIntStart,
                            event.time + u64::from(timing.int_start_time),
                        );
                    }
                }
            }

            EventKind::InputUpdate => {
                self.host.poll_input(&mut self.asic.keys);
                self.events.schedule(
                    EventKind::InputUpdate,
                    event.time + u64::from(timing.tstates_per_frame()),
                );
            }
        }
    }

    /// True while the ASIC is still ignoring its ports after power-on.
    fn asic_unresponsive(&mut self, low: u8) -> bool {
        if self.asic_startup {
            self.asic_startup = self.clock.cycle_counter < self.asic_startup_delay;
        }
        self.asic_startup && low >= BASE_ASIC_PORT
    }

    /// Raster position `video_delay` T-states ahead: where a screen page
    /// change becomes visible.
    fn delayed_pos(&self) -> RasterPos {
        let mut pos = self.clock.pos();
        pos.line_cycle += self.timing.video_delay as i32;
        pos
    }

    fn port_in(&mut self, port: u16) -> u8 {
        let low = port as u8;
        let high = (port >> 8) as u8;

        if self.asic_unresponsive(low) {
            trace!(port = format_args!("{port:#06X}"), "ASIC not yet responding");
            return 0x00;
        }

        match low {
            KEYBOARD_PORT => self.asic.read_keyboard(high),
            STATUS_PORT => {
                // The status bits must include events up to this instruction
                self.check_events();
                self.asic.read_status(high)
            }
            VMPR_PORT => self.asic.vmpr_read(),
            HMPR_PORT => self.asic.hmpr,
            LMPR_PORT => self.asic.lmpr,
            CLOCK_PORT => {
                if port < DALLAS_CLOCK_BASE {
                    self.devices.sambus_clock.read(port)
                } else {
                    self.devices.dallas_clock.read(port)
                }
            }
            LPEN_PORT => {
                if port & PEN_MASK == u16::from(LPEN_PORT) {
                    self.asic.read_lpen(self.clock.pos(), &self.timing)
                } else {
                    Asic::read_hpen(self.clock.pos(), &self.timing)
                }
            }
            ATTR_PORT => Asic::read_attr(self.clock.pos(), &self.timing),
            PRINTL1_STAT | PRINTL1_DATA => self.devices.parallel1.read(port),
            PRINTL2_STAT | PRINTL2_DATA => self.devices.parallel2.read(port),
            SERIAL1 => self.devices.serial1.read(port),
            SERIAL2 => self.devices.serial2.read(port),
            MIDI_PORT => self.devices.midi.read(port),
            _ if low & FLOPPY_MASK == FLOPPY1_BASE => self.devices.floppy1.read(port),
            _ if low & FLOPPY_MASK == FLOPPY2_BASE => self.devices.floppy2.read(port),
            SDIDE_REG | SDIDE_DATA => self.devices.sdide.read(port),
            _ if low & YATBUS_MASK == YATBUS_BASE => self.devices.yatbus.read(port),
            _ => {
                trace!(port = format_args!("{port:#06X}"), "unhandled port read");
                0xFF
            }
        }
    }

    fn port_out(&mut self, port: u16, value: u8) {
        let low = port as u8;

        if self.asic_unresponsive(low) {
            trace!(port = format_args!("{port:#06X}"), value, "ASIC not yet responding");
            return;
        }

        match low {
            BORDER_PORT => self.write_border(port, value),
            VMPR_PORT => self.write_vmpr(value),
            HMPR_PORT => {
                if self.asic.hmpr != value {
                    self.write_hmpr(value);
                }
            }
            LMPR_PORT => {
                if self.asic.lmpr != value {
                    self.asic.lmpr = value;
                    self.memory.page_in(&self.asic);
                }
            }
            CLOCK_PORT => {
                if port < DALLAS_CLOCK_BASE {
                    self.devices.sambus_clock.write(port, value);
                } else {
                    self.devices.dallas_clock.write(port, value);
                }
            }
            CLUT_BASE_PORT => {
                if self.asic.write_clut((port >> 8) as u8, value) {
                    self.host.update_frame(self.clock.pos());
                }
            }
            HEPR_PORT => {
                self.asic.hepr = value;
                self.memory.page_in(&self.asic);
            }
            LEPR_PORT => {
                self.asic.lepr = value;
                self.memory.page_in(&self.asic);
            }
            LINE_PORT => self.write_line(value),
            SOUND_DATA => self.devices.sound.write(port, value),
            PRINTL1_STAT | PRINTL1_DATA => self.devices.parallel1.write(port, value),
            PRINTL2_STAT | PRINTL2_DATA => self.devices.parallel2.write(port, value),
            SERIAL1 => self.devices.serial1.write(port, value),
            SERIAL2 => self.devices.serial2.write(port, value),
            MIDI_PORT => self.write_midi(port, value),
            _ if low & FLOPPY_MASK == FLOPPY1_BASE => self.devices.floppy1.write(port, value),
            _ if low & FLOPPY_MASK == FLOPPY2_BASE => self.devices.floppy2.write(port, value),
            SDIDE_REG | SDIDE_DATA => self.devices.sdide.write(port, value),
            _ if low & YATBUS_MASK == YATBUS_BASE => self.devices.yatbus.write(port, value),
            _ => {
                trace!(port = format_args!("{port:#06X}"), value, "unhandled port write");
            }
        }
    }

    fn write_border(&mut self, port: u16, value: u8) {
        let change = self.asic.write_border(value);
        let pos = self.clock.pos();

        if change.visible() {
            self.host.update_frame(pos);
        }
        // Re-enabling the screen can leave an artefact on the line
        if change.screen_off && change.was_off {
            self.host.change_screen(value, pos);
        }
        if change.beeper {
            self.devices.beeper.write(port, value);
        }
        if change.screen_off {
            self.update_contention();
        }
    }

    fn write_vmpr(&mut self, value: u8) {
        let mode = value & VMPR_MODE_MASK;

        if self.asic.vmpr & VMPR_MODE_MASK != mode {
            if self.asic.mode_change_is_immediate(value) {
                // Modes 3 and 4 switch straight away; the page follows later
                self.host.update_frame(self.clock.pos());
                self.out_vmpr(mode | (self.asic.vmpr & !VMPR_MODE_MASK));
            } else {
                self.host.update_frame(self.delayed_pos());
                self.out_vmpr(value);
            }
            self.update_contention();
        }

        if self.asic.screen_page() != value & VMPR_PAGE_MASK {
            // The ASIC has already fetched from the old page
            self.host.update_frame(self.delayed_pos());
            self.out_vmpr(value);
        }
    }

    fn out_vmpr(&mut self, value: u8) {
        self.host.change_mode(value, self.clock.pos());
        self.asic.vmpr = value & (VMPR_MODE_MASK | VMPR_PAGE_MASK);
        debug!(
            mode = ?self.asic.mode(),
            page = self.asic.screen_page(),
            "VMPR"
        );
    }

    fn write_hmpr(&mut self, value: u8) {
        if (self.asic.hmpr ^ value) & HMPR_MD3COL_MASK != 0
            && self.asic.mode() == ScreenMode::Mode3
        {
            self.host.update_frame(self.clock.pos());
        }
        self.asic.hmpr = value;
        self.memory.page_in(&self.asic);
    }

    /// Set the line interrupt target, and decide whether the LINE bit should
    /// be active right now.
    fn write_line(&mut self, value: u8) {
        if self.asic.line_int == value {
            return;
        }
        self.asic.line_int = value;

        let timing = self.timing;
        if u32::from(value) >= timing.screen_lines {
            self.asic.status |= STATUS_INT_LINE;
            return;
        }

        // Position relative to where interrupts start, in the line before
        let mut line = self.clock.line;
        let mut cycle = self.clock.line_cycle - timing.int_start_time as i32;
        if cycle < 0 {
            cycle += timing.tstates_per_line as i32;
        } else {
            line += 1;
        }

        self.check_events();

        let active_window = cycle < timing.int_active_time as i32;
        if line == u32::from(value) + timing.top_border_lines && active_window {
            // Already active means the event check above just raised it
            if self.asic.status & STATUS_INT_LINE != 0 {
                self.asic.status &= !STATUS_INT_LINE;
                let end = (self.clock.cycle_counter + u64::from(timing.int_active_time))
                    .saturating_sub(cycle as u64);
                self.events.schedule(EventKind::StdIntEnd, end);
            }
        } else {
            self.asic.status |= STATUS_INT_LINE;
        }
    }

    fn write_midi(&mut self, port: u16, value: u8) {
        // TXFMST must reflect any transmit that has just finished
        self.check_events();

        if self.asic.lpen & LPEN_TXFMST == 0 {
            self.asic.lpen |= LPEN_TXFMST;
            self.events.schedule(
                EventKind::MidiOutIntStart,
                self.clock.cycle_counter + u64::from(self.timing.midi_out_delay()),
            );
            self.devices.midi.write(port, value);
        }
    }
}

impl<H: Host> Bus for SamBus<H> {
    fn read(&mut self, address: u16) -> u8 {
        self.mem_access(address);
        let phys = self.memory.locate(address);
        AccessTrace::record(&mut self.trace.reads, phys);
        self.memory.read_phys(phys)
    }

    fn read_code(&mut self, address: u16) -> u8 {
        self.mem_access(address);
        self.memory.read(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        self.mem_access(address);
        let phys = self.memory.locate(address);
        AccessTrace::record(&mut self.trace.writes, phys);
        self.memory.write(address, value);
    }

    fn io_read(&mut self, port: u16) -> u8 {
        self.port_access(port);
        self.port_in(port)
    }

    fn io_write(&mut self, port: u16, value: u8) {
        self.port_access(port);
        self.port_out(port, value);
    }

    fn delay(&mut self, tstates: u32) {
        self.clock.line_cycle += tstates as i32;
    }

    fn peek(&self, address: u16) -> u8 {
        self.memory.read(address)
    }

    fn poke(&mut self, address: u16, value: u8) {
        self.memory.write(address, value);
    }
}

#[cfg(test)]
mod tests {
    use sam_asic::regs::{BORD_SOFF, HMPR_MCNTRL, STATUS_INT_NONE};

    use super::*;
    use crate::host::NullHost;
    use crate::memory::{Page, ROM_SIZE};

    fn bus() -> SamBus<NullHost> {
        let memory = Memory::new(&vec![0; ROM_SIZE], 32, 4);
        let mut bus = SamBus::new(memory, FrameTiming::default(), None, NullHost);
        bus.reset();
        bus
    }

    fn at(bus: &mut SamBus<NullHost>, line: u32, line_cycle: i32) {
        bus.clock.line = line;
        bus.clock.line_cycle = line_cycle;
        bus.clock.prev_line_cycle = line_cycle;
        bus.contention.select_line(line, &bus.timing);
    }

    #[test]
    fn contended_screen_read_waits_for_slot() {
        let mut bus = bus();
        at(&mut bus, 100, 125);
        bus.read(0x4000);
        assert_eq!(bus.clock.line_cycle, 135);
    }

    #[test]
    fn external_memory_read_costs_three() {
        let mut bus = bus();
        bus.asic.hmpr = HMPR_MCNTRL;
        bus.memory.page_in(&bus.asic);
        at(&mut bus, 100, 125);
        bus.read(0x8000);
        assert_eq!(bus.clock.line_cycle, 128);
    }

    #[test]
    fn border_read_aligns_to_four() {
        let mut bus = bus();
        at(&mut bus, 10, 1);
        bus.read(0x4000);
        assert_eq!(bus.clock.line_cycle, 7);
    }

    #[test]
    fn asic_ports_align_to_eight() {
        let mut bus = bus();
        at(&mut bus, 10, 1);
        bus.io_read(0x00FE);
        assert_eq!(bus.clock.line_cycle, 7);

        at(&mut bus, 10, 1);
        bus.io_read(0x00E0);
        assert_eq!(bus.clock.line_cycle, 5);
    }

    #[test]
    fn screen_off_disables_contention_in_mode_4() {
        let mut bus = bus();
        bus.io_write(0x00FC, 0x60);
        bus.io_write(0x00FE, BORD_SOFF);
        assert!(!bus.contention.is_active());
        at(&mut bus, 100, 125);
        bus.read(0x4000);
        assert_eq!(bus.clock.line_cycle, 131);
    }

    #[test]
    fn check_events_moves_line_time_to_counter() {
        let mut bus = bus();
        let start = bus.clock.cycle_counter;
        bus.delay(100);
        bus.check_events();
        assert_eq!(bus.clock.cycle_counter, start + 100);
        assert_eq!(bus.clock.prev_line_cycle, 100);
    }

    #[test]
    fn end_of_line_wraps_line_cycle() {
        let mut bus = bus();
        bus.delay(390);
        bus.check_events();
        assert_eq!(bus.clock.line, 1);
        assert_eq!(bus.clock.line_cycle, 6);
        assert_eq!(bus.clock.prev_line_cycle, 6);
    }

    #[test]
    fn frame_interrupt_on_last_line() {
        let mut bus = bus();
        at(&mut bus, 311, 0);
        bus.events.clear();
        bus.events.schedule(EventKind::StdIntStart, 320);
        bus.delay(320);
        bus.check_events();
        assert_eq!(bus.asic.status & STATUS_INT_FRAME, 0);

        bus.delay(128);
        bus.check_events();
        assert_eq!(bus.asic.status, STATUS_INT_NONE);
    }

    #[test]
    fn status_read_runs_due_events() {
        let mut bus = bus();
        at(&mut bus, 311, 0);
        bus.events.clear();
        bus.events.schedule(EventKind::StdIntStart, 300);
        bus.delay(300);
        // The port access itself brings the counter past the event
        let status = bus.io_read(0xFFF9);
        assert_eq!(status & STATUS_INT_FRAME, 0);
    }

    #[test]
    fn line_and_frame_bits_are_independent() {
        let mut bus = bus();
        bus.asic.status &= !STATUS_INT_LINE;
        at(&mut bus, 311, 0);
        bus.events.clear();
        bus.events.schedule(EventKind::StdIntStart, 320);
        bus.delay(320);
        bus.check_events();
        assert_eq!(bus.asic.status & (STATUS_INT_LINE | STATUS_INT_FRAME), 0);
    }

    #[test]
    fn line_write_inside_window_raises_interrupt() {
        let mut bus = bus();
        // Just past the interrupt start at the end of the line above screen line 0
        at(&mut bus, 67, 330);
        bus.events.clear();
        bus.io_write(0x00F9, 0);
        assert_eq!(bus.asic.status & STATUS_INT_LINE, 0);
        let end = bus.events.iter().find(|e| e.kind == EventKind::StdIntEnd);
        assert!(end.is_some());

        // Moving the target away clears it again
        bus.io_write(0x00F9, 50);
        assert_ne!(bus.asic.status & STATUS_INT_LINE, 0);
    }

    #[test]
    fn line_write_outside_window_stays_inactive() {
        let mut bus = bus();
        at(&mut bus, 30, 10);
        bus.io_write(0x00F9, 0);
        assert_ne!(bus.asic.status & STATUS_INT_LINE, 0);
    }

    fn midi_starts(bus: &SamBus<NullHost>) -> usize {
        bus.events
            .iter()
            .filter(|e| e.kind == EventKind::MidiOutIntStart)
            .count()
    }

    #[test]
    fn midi_out_schedules_interrupt_once() {
        let mut bus = bus();
        bus.events.clear();
        bus.io_write(0x00FD, 0x90);
        assert_ne!(bus.asic.lpen & LPEN_TXFMST, 0);
        assert_eq!(midi_starts(&bus), 1);
        bus.io_write(0x00FD, 0x91);
        assert_eq!(midi_starts(&bus), 1);

        // Run past the transmit time: interrupt, then TXFMST clears
        bus.delay(1890);
        bus.check_events();
        assert_eq!(bus.asic.status & STATUS_INT_MIDIOUT, 0);
        bus.delay(16);
        bus.check_events();
        assert_ne!(bus.asic.status & STATUS_INT_MIDIOUT, 0);
        assert_eq!(bus.asic.lpen & LPEN_TXFMST, 0);
    }

    #[test]
    fn paging_ports_remap_sections() {
        let mut bus = bus();
        bus.io_write(0x00FA, 0x20 | 3);
        bus.poke(0x0000, 0x42);
        assert_eq!(
            bus.memory.read_phys(PhysAddr {
                page: Page::Ram(3),
                offset: 0
            }),
            0x42
        );
        assert_eq!(bus.io_read(0x00FA), 0x23);
        assert_eq!(bus.io_read(0x00FC), 0x80);
    }

    #[test]
    fn trace_records_data_accesses_only() {
        let mut bus = bus();
        bus.read_code(0x4000);
        assert_eq!(bus.trace.reads(), [None, None]);
        bus.read(0x4001);
        bus.write(0x8002, 1);
        let [first, second] = bus.trace.reads();
        assert_eq!(first.map(|p| p.offset), Some(1));
        assert!(second.is_none());
        assert_eq!(bus.trace.writes()[0].map(|p| p.offset), Some(2));
    }

    #[test]
    fn unhandled_ports_float_high() {
        let mut bus = bus();
        assert_eq!(bus.io_read(0x0010), 0xFF);
    }

    #[test]
    fn asic_ignores_ports_during_startup() {
        let memory = Memory::new(&vec![0; ROM_SIZE], 32, 0);
        let mut bus = SamBus::new(memory, FrameTiming::default(), Some(1000), NullHost);
        bus.reset();

        bus.io_write(0x00FA, 0x25);
        assert_eq!(bus.asic.lmpr, 0);
        assert_eq!(bus.io_read(0x00FA), 0x00);
        // Non-ASIC ports still respond
        assert_eq!(bus.io_read(0x0010), 0xFF);

        bus.delay(1000);
        bus.check_events();
        bus.io_write(0x00FA, 0x25);
        assert_eq!(bus.asic.lmpr, 0x25);
    }
}
