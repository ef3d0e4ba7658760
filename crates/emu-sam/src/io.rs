//! Peripheral port routing.

/// A device behind one or more I/O ports.
///
/// Devices see the full 16-bit port address. Failures are the device's
/// business: all the core ever sees is the data byte.
pub trait IoDevice {
    fn read(&mut self, _port: u16) -> u8 {
        0xFF
    }

    fn write(&mut self, _port: u16, _value: u8) {}

    /// Called once per frame, after the last line.
    fn frame_end(&mut self) {}
}

/// Nothing connected: reads float high, writes vanish.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDevice;

impl IoDevice for NullDevice {}

/// Device slots the port decoder routes to.
pub struct Peripherals {
    pub floppy1: Box<dyn IoDevice>,
    pub floppy2: Box<dyn IoDevice>,
    pub parallel1: Box<dyn IoDevice>,
    pub parallel2: Box<dyn IoDevice>,
    pub serial1: Box<dyn IoDevice>,
    pub serial2: Box<dyn IoDevice>,
    pub midi: Box<dyn IoDevice>,
    pub sambus_clock: Box<dyn IoDevice>,
    pub dallas_clock: Box<dyn IoDevice>,
    /// S D Software IDE: a register latch port and a data port.
    pub sdide: Box<dyn IoDevice>,
    /// YAMOD.ATBUS IDE: eight task-file ports.
    pub yatbus: Box<dyn IoDevice>,
    /// SAA 1099 sound chip, port 0xFF writes.
    pub sound: Box<dyn IoDevice>,
    /// Receives BORDER writes that toggle the beeper bit.
    pub beeper: Box<dyn IoDevice>,
}

impl Default for Peripherals {
    fn default() -> Self {
        Self {
            floppy1: Box::new(NullDevice),
            floppy2: Box::new(NullDevice),
            parallel1: Box::new(NullDevice),
            parallel2: Box::new(NullDevice),
            serial1: Box::new(NullDevice),
            serial2: Box::new(NullDevice),
            midi: Box::new(NullDevice),
            sambus_clock: Box::new(NullDevice),
            dallas_clock: Box::new(NullDevice),
            sdide: Box::new(NullDevice),
            yatbus: Box::new(NullDevice),
            sound: Box::new(NullDevice),
            beeper: Box::new(NullDevice),
        }
    }
}

impl Peripherals {
    pub fn frame_end(&mut self) {
        for device in [
            &mut self.floppy1,
            &mut self.floppy2,
            &mut self.parallel1,
            &mut self.parallel2,
            &mut self.serial1,
            &mut self.serial2,
            &mut self.midi,
            &mut self.sambus_clock,
            &mut self.dallas_clock,
            &mut self.sdide,
            &mut self.yatbus,
            &mut self.sound,
            &mut self.beeper,
        ] {
            device.frame_end();
        }
    }
}
