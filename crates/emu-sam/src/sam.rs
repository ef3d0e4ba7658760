//! Top-level SAM Coupé system.
//!
//! # Frame loop
//!
//! [`Sam::execute_chunk`] runs instructions until the last line of the frame
//! has been run or a break is requested. After each instruction the bus
//! processes due events, and a pending ASIC interrupt is offered to the CPU.
//! [`Sam::run_frame`] wraps one chunk with the host's frame hooks.
//!
//! One PAL frame is 312 lines of 384 T-states: 119,808 T-states at 6 MHz.

use emu_core::{Bus, Observable, Value};
use sam_asic::regs::STATUS_INT_NONE;
use tracing::{debug, error, info};
use zilog_z80::{Registers, Z80};

use crate::bus::SamBus;
use crate::config::SamConfig;
use crate::error::SamError;
use crate::host::{Host, NullHost};
use crate::memory::Memory;

/// SAM Coupé machine: Z80 plus bus.
pub struct Sam<H: Host = NullHost> {
    cpu: Z80,
    bus: SamBus<H>,
    /// Reset button held: the CPU does not run.
    reset_held: bool,
    /// Stop the current chunk after the next whole instruction.
    break_requested: bool,
}

impl Sam<NullHost> {
    /// A machine with no platform attached.
    pub fn headless(config: &SamConfig) -> Result<Self, SamError> {
        Self::new(config, NullHost)
    }
}

impl<H: Host> Sam<H> {
    /// Build a machine in its power-on state.
    pub fn new(config: &SamConfig, host: H) -> Result<Self, SamError> {
        if let Err(msg) = Registers::self_test() {
            error!(%msg, "register layout check failed");
            return Err(SamError::RegisterLayout(msg));
        }
        config.validate()?;

        let memory = Memory::new(&config.rom, config.ram_pages, config.external_pages);
        let mut bus = SamBus::new(memory, config.timing, config.asic_startup_delay, host);
        bus.reset();

        info!(
            ram_pages = config.ram_pages,
            external_pages = config.external_pages,
            tstates_per_frame = config.timing.tstates_per_frame(),
            "SAM Coupé powered on"
        );

        Ok(Self {
            cpu: Z80::new(),
            bus,
            reset_held: false,
            break_requested: false,
        })
    }

    /// Press the reset button. The CPU and ASIC reset immediately and the
    /// CPU stays stopped until [`Sam::release_reset`].
    pub fn press_reset(&mut self) {
        debug!("reset pressed");
        self.reset_held = true;
        self.cpu.reset();
        self.bus.reset();
    }

    pub fn release_reset(&mut self) {
        debug!("reset released");
        self.reset_held = false;
    }

    #[must_use]
    pub const fn reset_held(&self) -> bool {
        self.reset_held
    }

    /// Trigger a non-maskable interrupt.
    pub fn nmi(&mut self) {
        self.cpu.nmi(&mut self.bus);
        self.bus.check_events();
    }

    /// Stop the running chunk at the next instruction boundary.
    pub fn request_break(&mut self) {
        self.break_requested = true;
    }

    /// Run until the frame's last line has been run or a break is
    /// requested. Returns true if the frame finished.
    ///
    /// While reset is held, a frame's worth of time passes without the CPU
    /// running.
    pub fn execute_chunk(&mut self) -> bool {
        self.bus.clear_frame_done();

        if self.reset_held {
            let frame = self.bus.timing().tstates_per_frame();
            self.bus.clock.line_cycle += frame as i32;
            self.bus.check_events();
            return self.bus.frame_done();
        }

        loop {
            self.bus.trace.clear();
            self.cpu.step(&mut self.bus);
            self.bus.check_events();

            if self.bus.asic.status != STATUS_INT_NONE && self.cpu.regs.iff1 {
                self.cpu.take_interrupt(&mut self.bus);
            }

            if self.bus.frame_done() {
                // The frame end already stopped the chunk
                self.break_requested = false;
                return true;
            }
            // A prefix and its opcode are one instruction
            if self.break_requested && !self.cpu.prefix_pending() {
                self.break_requested = false;
                return false;
            }
        }
    }

    /// Execute exactly one instruction, plus any interrupt it lets in.
    /// Wraps the frame if the instruction ran its last line.
    pub fn step_instruction(&mut self) {
        self.request_break();
        self.execute_chunk();
        self.wrap_finished_frame();
    }

    /// Run one chunk, and if it reached the end of the frame, wrap to the
    /// next one around the host's frame hooks. Returns true if a frame
    /// was completed.
    pub fn run_frame(&mut self) -> bool {
        let finished = self.execute_chunk();
        self.wrap_finished_frame();
        finished
    }

    fn wrap_finished_frame(&mut self) {
        if self.bus.clock.line >= self.bus.timing().height_lines {
            self.bus.host.frame_complete();
            self.bus.wrap_frame();
            self.bus.host.frame_start();
        }
    }

    /// Run frames until the host asks to stop. Returns the number of
    /// frames completed.
    pub fn main_loop(&mut self) -> u64 {
        let mut frames = 0;
        while self.bus.host.keep_running() {
            if self.run_frame() {
                frames += 1;
            }
        }
        info!(frames, "main loop stopped");
        frames
    }

    #[must_use]
    pub const fn cpu(&self) -> &Z80 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Z80 {
        &mut self.cpu
    }

    #[must_use]
    pub const fn bus(&self) -> &SamBus<H> {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut SamBus<H> {
        &mut self.bus
    }

    #[must_use]
    pub const fn host(&self) -> &H {
        &self.bus.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.bus.host
    }

    /// Global T-state count.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.bus.clock.cycle_counter
    }
}

impl<H: Host> Observable for Sam<H> {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.cpu.query(rest)
        } else if let Some(rest) = path.strip_prefix("asic.") {
            let asic = &self.bus.asic;
            match rest {
                "status" => Some(asic.status.into()),
                "line_int" => Some(asic.line_int.into()),
                "border" => Some(asic.border.into()),
                "lmpr" => Some(asic.lmpr.into()),
                "hmpr" => Some(asic.hmpr.into()),
                "vmpr" => Some(asic.vmpr.into()),
                "lepr" => Some(asic.lepr.into()),
                "hepr" => Some(asic.hepr.into()),
                "mode" => Some(Value::U8(asic.mode() as u8 + 1)),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("timing.") {
            let clock = &self.bus.clock;
            match rest {
                "line" => Some(clock.line.into()),
                "line_cycle" => Some(clock.line_cycle.into()),
                "cycles" => Some(clock.cycle_counter.into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("memory.") {
            let addr = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
                u16::from_str_radix(hex, 16).ok()
            } else if let Some(hex) = rest.strip_prefix('$') {
                u16::from_str_radix(hex, 16).ok()
            } else {
                rest.parse().ok()
            };
            addr.map(|a| Value::U8(self.bus.peek(a)))
        } else {
            match path {
                "reset_held" => Some(self.reset_held.into()),
                _ => self.cpu.query(path),
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.<z80_paths>",
            "asic.status",
            "asic.line_int",
            "asic.border",
            "asic.lmpr",
            "asic.hmpr",
            "asic.vmpr",
            "asic.lepr",
            "asic.hepr",
            "asic.mode",
            "timing.line",
            "timing.line_cycle",
            "timing.cycles",
            "memory.<address>",
            "reset_held",
        ]
    }
}
