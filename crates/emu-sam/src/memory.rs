//! Physical memory and paging.
//!
//! The 64K address space is four 16K sections:
//!
//! | Section | Range         | Source                                   |
//! |---------|---------------|------------------------------------------|
//! | A       | $0000-$3FFF   | ROM0, or LMPR page                       |
//! | B       | $4000-$7FFF   | LMPR page + 1                            |
//! | C       | $8000-$BFFF   | HMPR page, or LEPR external page         |
//! | D       | $C000-$FFFF   | ROM1, HMPR page + 1, or HEPR external    |
//!
//! Internal RAM and ROM share the bus with the ASIC and are contended;
//! external memory is not.

use sam_asic::Asic;
use sam_asic::regs::HMPR_MCNTRL;
use tracing::debug;

pub const PAGE_SIZE: usize = 0x4000;
pub const ROM_SIZE: usize = 2 * PAGE_SIZE;
pub const MAX_EXTERNAL_PAGES: usize = 64;

/// What a section is mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Ram(u8),
    Rom0,
    Rom1,
    External(u8),
}

impl Page {
    /// Internal memory is shared with the ASIC.
    #[must_use]
    pub const fn is_contended(self) -> bool {
        !matches!(self, Self::External(_))
    }
}

/// A physical location: page plus offset within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysAddr {
    pub page: Page,
    pub offset: u16,
}

/// Internal RAM, ROM and external memory, plus the section mapping.
pub struct Memory {
    ram: Vec<u8>,
    rom: Vec<u8>,
    external: Vec<u8>,
    ram_pages: u8,
    external_pages: u8,
    sections: [Page; 4],
    /// Section A is write protected (LMPR bit 7).
    write_protect: bool,
}

impl Memory {
    /// `rom` must already be validated as 32K.
    #[must_use]
    pub fn new(rom: &[u8], ram_pages: u8, external_pages: u8) -> Self {
        let mut memory = Self {
            ram: vec![0; usize::from(ram_pages) * PAGE_SIZE],
            rom: rom.to_vec(),
            external: vec![0; usize::from(external_pages) * PAGE_SIZE],
            ram_pages,
            external_pages,
            sections: [Page::Rom0, Page::Ram(1), Page::Ram(0), Page::Ram(1)],
            write_protect: false,
        };
        memory.page_in(&Asic::new());
        memory
    }

    #[must_use]
    pub const fn ram_pages(&self) -> u8 {
        self.ram_pages
    }

    #[must_use]
    pub const fn external_pages(&self) -> u8 {
        self.external_pages
    }

    /// Recompute every section from the paging registers.
    ///
    /// External memory takes priority over both RAM and ROM1 while MCNTRL
    /// is set.
    pub fn page_in(&mut self, asic: &Asic) {
        let lmpr_page = asic.lmpr_page();
        let hmpr_page = asic.hmpr_page();

        let a = if asic.rom0_paged() {
            Page::Rom0
        } else {
            self.ram_page(lmpr_page)
        };
        let b = self.ram_page(lmpr_page + 1);
        let mut c = self.ram_page(hmpr_page);
        let mut d = if asic.rom1_paged() {
            Page::Rom1
        } else {
            self.ram_page(hmpr_page + 1)
        };

        if asic.hmpr & HMPR_MCNTRL != 0 {
            c = Page::External(asic.lepr);
            d = Page::External(asic.hepr);
        }

        let sections = [a, b, c, d];
        if sections != self.sections {
            debug!(?sections, "paging");
        }
        self.sections = sections;
        self.write_protect = asic.write_protected();
    }

    /// RAM page numbers wrap at the installed size.
    fn ram_page(&self, page: u8) -> Page {
        Page::Ram(page % self.ram_pages)
    }

    #[must_use]
    pub const fn sections(&self) -> [Page; 4] {
        self.sections
    }

    #[must_use]
    pub fn locate(&self, address: u16) -> PhysAddr {
        PhysAddr {
            page: self.sections[usize::from(address >> 14)],
            offset: address & 0x3FFF,
        }
    }

    #[must_use]
    pub fn is_contended(&self, address: u16) -> bool {
        self.sections[usize::from(address >> 14)].is_contended()
    }

    /// Untimed read.
    #[must_use]
    pub fn read(&self, address: u16) -> u8 {
        self.read_phys(self.locate(address))
    }

    #[must_use]
    pub fn read_phys(&self, phys: PhysAddr) -> u8 {
        let offset = usize::from(phys.offset);
        match phys.page {
            Page::Ram(page) => self.ram[usize::from(page) * PAGE_SIZE + offset],
            Page::Rom0 => self.rom[offset],
            Page::Rom1 => self.rom[PAGE_SIZE + offset],
            Page::External(page) => self
                .external_index(page, offset)
                .map_or(0xFF, |index| self.external[index]),
        }
    }

    /// Untimed write. ROM and protected section A discard the value.
    pub fn write(&mut self, address: u16, value: u8) {
        if self.write_protect && address < 0x4000 {
            return;
        }
        let phys = self.locate(address);
        let offset = usize::from(phys.offset);
        match phys.page {
            Page::Ram(page) => self.ram[usize::from(page) * PAGE_SIZE + offset] = value,
            Page::Rom0 | Page::Rom1 => {}
            Page::External(page) => {
                if let Some(index) = self.external_index(page, offset) {
                    self.external[index] = value;
                }
            }
        }
    }

    /// External page numbers wrap at the fitted size. With none fitted the
    /// bus floats.
    fn external_index(&self, page: u8, offset: usize) -> Option<usize> {
        if self.external_pages == 0 {
            return None;
        }
        Some(usize::from(page % self.external_pages) * PAGE_SIZE + offset)
    }

    /// Whole internal RAM page, for the host's display.
    #[must_use]
    pub fn ram_page_slice(&self, page: u8) -> &[u8] {
        let start = usize::from(page % self.ram_pages) * PAGE_SIZE;
        &self.ram[start..start + PAGE_SIZE]
    }
}
