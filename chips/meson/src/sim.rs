// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Register image simulator.
//!
//! `RegisterImage` stands in for a clock controller on the host. It keeps a
//! plain array of registers, reports PLL lock the way the silicon does (lock
//! follows `EN && !RESET` unless the PLL is stalled), advances a virtual
//! microsecond clock on every delay and records every write so tests can
//! replay the exact sequence the engine produced.

use tock_registers::LocalRegisterCopy;

use crate::pll::{PllControl, PllGen};
use crate::regs::RegisterPort;

/// Journal capacity. Writing past it panics.
pub const JOURNAL_LEN: usize = 256;

/// One recorded register write.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Write {
    pub offset: usize,
    pub value: u32,
}

struct PllLock {
    cntl: usize,
    control: PllControl,
    stalled: bool,
}

pub struct RegisterImage<const WORDS: usize> {
    regs: [u32; WORDS],
    plls: heapless::Vec<PllLock, 8>,
    journal: heapless::Vec<Write, JOURNAL_LEN>,
    now_us: u64,
}

impl<const WORDS: usize> RegisterImage<WORDS> {
    pub const fn new() -> RegisterImage<WORDS> {
        RegisterImage {
            regs: [0; WORDS],
            plls: heapless::Vec::new(),
            journal: heapless::Vec::new(),
            now_us: 0,
        }
    }

    fn pll(&self, offset: usize) -> Option<&PllLock> {
        self.plls.iter().find(|p| p.cntl == offset)
    }

    /// Stored register value, without lock emulation.
    pub fn peek(&self, offset: usize) -> u32 {
        self.regs.get(offset / 4).copied().unwrap_or(0)
    }

    /// Preload a register, as boot firmware would. Not journaled.
    pub fn poke(&mut self, offset: usize, value: u32) {
        if let Some(reg) = self.regs.get_mut(offset / 4) {
            *reg = value;
        }
    }

    /// Emulate the lock bit of the PLL whose control register is at `cntl`.
    pub fn attach_pll(&mut self, cntl: usize, gen: PllGen) {
        let attached = self.plls.push(PllLock {
            cntl,
            control: gen.control(),
            stalled: false,
        });
        assert!(attached.is_ok(), "too many PLLs attached");
    }

    /// A stalled PLL never reports lock.
    pub fn stall_pll(&mut self, cntl: usize, stalled: bool) {
        if let Some(pll) = self.plls.iter_mut().find(|p| p.cntl == cntl) {
            pll.stalled = stalled;
        }
    }

    pub fn journal(&self) -> &[Write] {
        &self.journal
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    pub fn elapsed_us(&self) -> u64 {
        self.now_us
    }
}

impl<const WORDS: usize> Default for RegisterImage<WORDS> {
    fn default() -> Self {
        RegisterImage::new()
    }
}

impl<const WORDS: usize> RegisterPort for RegisterImage<WORDS> {
    fn read32(&mut self, offset: usize) -> u32 {
        let raw = self.peek(offset);
        let Some(pll) = self.pll(offset) else {
            return raw;
        };
        let ctl = pll.control;
        let mut reg: LocalRegisterCopy<u32, ()> = LocalRegisterCopy::new(raw);
        let locked = reg.is_set(ctl.en) && !reg.is_set(ctl.reset) && !pll.stalled;
        reg.modify(ctl.lock.val(u32::from(locked)));
        reg.get()
    }

    fn write32(&mut self, offset: usize, mut value: u32) {
        if let Some(pll) = self.pll(offset) {
            // Lock is read-only in hardware.
            value &= !(pll.control.lock.mask << pll.control.lock.shift);
        }
        self.poke(offset, value);
        self.journal.push(Write { offset, value }).expect("journal full");
    }

    fn udelay(&mut self, us: u32) {
        self.now_us += u64::from(us);
    }

    fn now_us(&mut self) -> u64 {
        self.now_us
    }
}
