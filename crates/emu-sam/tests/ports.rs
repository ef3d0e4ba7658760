//! Port decoding to peripherals, keyboard and paging, driven through the Z80.

use std::cell::RefCell;
use std::rc::Rc;

use emu_core::Bus;
use emu_sam::{IoDevice, Page, Sam, SamConfig};

type Log = Rc<RefCell<Vec<(u16, Option<u8>)>>>;

/// Logs every access and answers reads with a fixed byte.
struct Recorder {
    log: Log,
    answer: u8,
}

impl IoDevice for Recorder {
    fn read(&mut self, port: u16) -> u8 {
        self.log.borrow_mut().push((port, None));
        self.answer
    }

    fn write(&mut self, port: u16, value: u8) {
        self.log.borrow_mut().push((port, Some(value)));
    }
}

fn recorder(answer: u8) -> (Box<Recorder>, Log) {
    let log = Log::default();
    let device = Recorder {
        log: Rc::clone(&log),
        answer,
    };
    (Box::new(device), log)
}

fn sam_running(program: &[u8]) -> Sam {
    let mut rom = vec![0u8; 0x8000];
    rom[..program.len()].copy_from_slice(program);
    Sam::headless(&SamConfig::default().with_rom(rom)).expect("valid config")
}

#[test]
fn floppy_ports_reach_both_drives() {
    // LD BC,0x00E1; IN A,(C); LD C,0xF3; OUT (C),A
    let mut sam = sam_running(&[0x01, 0xE1, 0x00, 0xED, 0x78, 0x0E, 0xF3, 0xED, 0x79]);
    let (drive1, log1) = recorder(0x5A);
    let (drive2, log2) = recorder(0x00);
    sam.bus_mut().devices.floppy1 = drive1;
    sam.bus_mut().devices.floppy2 = drive2;

    for _ in 0..4 {
        sam.step_instruction();
    }
    assert_eq!(sam.cpu().regs.a, 0x5A);
    assert_eq!(*log1.borrow(), [(0x00E1, None)]);
    assert_eq!(*log2.borrow(), [(0x00F3, Some(0x5A))]);
}

#[test]
fn clock_port_splits_on_high_byte() {
    // LD BC,0x10EF; OUT (C),A; LD B,0xFE; OUT (C),A
    let mut sam = sam_running(&[0x01, 0xEF, 0x10, 0xED, 0x79, 0x06, 0xFE, 0xED, 0x79]);
    let (sambus, sambus_log) = recorder(0xFF);
    let (dallas, dallas_log) = recorder(0xFF);
    sam.bus_mut().devices.sambus_clock = sambus;
    sam.bus_mut().devices.dallas_clock = dallas;

    for _ in 0..4 {
        sam.step_instruction();
    }
    assert_eq!(sambus_log.borrow().len(), 1);
    assert_eq!(dallas_log.borrow()[0].0, 0xFEEF);
}

#[test]
fn sound_and_beeper_writes() {
    // LD BC,0x01FF; LD A,0x1C; OUT (C),A; LD C,0xFE; LD A,0x10; OUT (C),A
    let mut sam = sam_running(&[
        0x01, 0xFF, 0x01, 0x3E, 0x1C, 0xED, 0x79, 0x0E, 0xFE, 0x3E, 0x10, 0xED, 0x79,
    ]);
    let (sound, sound_log) = recorder(0xFF);
    let (beeper, beeper_log) = recorder(0xFF);
    sam.bus_mut().devices.sound = sound;
    sam.bus_mut().devices.beeper = beeper;

    for _ in 0..6 {
        sam.step_instruction();
    }
    assert_eq!(*sound_log.borrow(), [(0x01FF, Some(0x1C))]);
    assert_eq!(*beeper_log.borrow(), [(0x01FE, Some(0x10))]);
    assert_eq!(sam.bus().asic.border, 0x10);
}

#[test]
fn keyboard_rows_selected_by_high_byte() {
    // LD BC,0xFEFE; IN A,(C); LD B,0xFF; IN D,(C)
    let mut sam = sam_running(&[0x01, 0xFE, 0xFE, 0xED, 0x78, 0x06, 0xFF, 0xED, 0x50]);
    sam.bus_mut().asic.keys.press(0, 2);
    sam.bus_mut().asic.keys.press(8, 4);

    for _ in 0..4 {
        sam.step_instruction();
    }
    assert_eq!(sam.cpu().regs.a & 0x1F, 0x1B);
    assert_eq!(sam.cpu().regs.d & 0x1F, 0x0F);
}

#[test]
fn external_memory_pages_through_hmpr() {
    // LD A,2; OUT (0x80),A; LD A,0x80; OUT (0xFB),A
    let config = SamConfig {
        external_pages: 4,
        ..SamConfig::default()
    };
    let mut rom = vec![0u8; 0x8000];
    rom[..8].copy_from_slice(&[0x3E, 0x02, 0xD3, 0x80, 0x3E, 0x80, 0xD3, 0xFB]);
    let mut sam = Sam::headless(&config.with_rom(rom)).expect("valid config");

    for _ in 0..4 {
        sam.step_instruction();
    }
    let sections = sam.bus().memory.sections();
    assert_eq!(sections[2], Page::External(2));
    assert_eq!(sections[3], Page::External(0));

    sam.bus_mut().poke(0x8000, 0xC3);
    assert_eq!(sam.bus().peek(0x8000), 0xC3);
    assert!(!sam.bus().memory.is_contended(0x8000));
}

#[test]
fn ide_interfaces_get_their_ports() {
    // LD BC,0x00BF; LD A,7; OUT (C),A; LD C,0xBD; IN A,(C)
    // LD C,0x4B; OUT (C),A; IN E,(C)
    let mut sam = sam_running(&[
        0x01, 0xBF, 0x00, 0x3E, 0x07, 0xED, 0x79, 0x0E, 0xBD, 0xED, 0x78, 0x0E, 0x4B, 0xED,
        0x79, 0xED, 0x58,
    ]);
    let (sdide, sdide_log) = recorder(0x34);
    let (yatbus, yatbus_log) = recorder(0x9C);
    sam.bus_mut().devices.sdide = sdide;
    sam.bus_mut().devices.yatbus = yatbus;

    for _ in 0..8 {
        sam.step_instruction();
    }
    assert_eq!(*sdide_log.borrow(), [(0x00BF, Some(0x07)), (0x00BD, None)]);
    assert_eq!(*yatbus_log.borrow(), [(0x004B, Some(0x34)), (0x004B, None)]);
    assert_eq!(sam.cpu().regs.a, 0x34);
    assert_eq!(sam.cpu().regs.e, 0x9C);
}

#[test]
fn ports_next_to_ide_are_unrouted() {
    // LD BC,0x00BE; IN A,(C); LD C,0x50; IN A,(C)
    let mut sam = sam_running(&[0x01, 0xBE, 0x00, 0xED, 0x78, 0x0E, 0x50, 0xED, 0x78]);
    let (sdide, sdide_log) = recorder(0x00);
    let (yatbus, yatbus_log) = recorder(0x00);
    sam.bus_mut().devices.sdide = sdide;
    sam.bus_mut().devices.yatbus = yatbus;

    for _ in 0..4 {
        sam.step_instruction();
    }
    assert!(sdide_log.borrow().is_empty());
    assert!(yatbus_log.borrow().is_empty());
    assert_eq!(sam.cpu().regs.a, 0xFF);
}
