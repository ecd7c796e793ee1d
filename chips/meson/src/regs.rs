// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Register access for the clock controller.
//!
//! Every clock register lives in one of a handful of register domains (the
//! HHI block of the EE power domain, the always-on block, ...). A
//! [`RegisterDomain`] owns the [`RegisterPort`] for one block behind a spin
//! lock, and every multi-register sequence runs with that lock held.
//!
//! Register fields are described by [`Parm`]: a domain, a byte offset and a
//! `tock_registers` field (shift and mask).

use core::fmt;
use core::ptr;

use spin::{Mutex, MutexGuard};
use tock_registers::fields::Field;

/// Register block a field lives in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum Domain {
    /// HHI registers of the EE domain
    Ee = 0,
    /// Always-on domain
    Ao = 1,
    /// Auxiliary block, used by a few chips for PCIe-adjacent clocks
    Aux = 2,
}

impl Domain {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A bit field inside a 32-bit clock register.
#[derive(Copy, Clone)]
pub struct Parm {
    pub domain: Domain,
    pub offset: usize,
    pub field: Field<u32, ()>,
}

impl Parm {
    /// Field of `width` bits starting at `shift`, in the EE domain.
    pub const fn new(offset: usize, shift: usize, width: u32) -> Parm {
        let mask = if width >= 32 {
            u32::MAX
        } else {
            (1u32 << width) - 1
        };
        Parm {
            domain: Domain::Ee,
            offset,
            field: Field::new(mask, shift),
        }
    }

    /// Single-bit field.
    pub const fn bit(offset: usize, bit: usize) -> Parm {
        Parm::new(offset, bit, 1)
    }

    pub const fn in_domain(self, domain: Domain) -> Parm {
        Parm {
            domain,
            offset: self.offset,
            field: self.field,
        }
    }

    pub const fn shift(&self) -> usize {
        self.field.shift
    }

    pub const fn width(&self) -> u32 {
        32 - self.field.mask.leading_zeros()
    }

    /// Largest value the field can hold.
    pub const fn max(&self) -> u32 {
        self.field.mask
    }

    /// Mask of the field in register position.
    pub const fn reg_mask(&self) -> u32 {
        self.field.mask << self.field.shift
    }

    /// Whether both fields claim a common bit of the same register.
    pub const fn overlaps(&self, other: &Parm) -> bool {
        self.domain as usize == other.domain as usize
            && self.offset == other.offset
            && self.reg_mask() & other.reg_mask() != 0
    }

    /// Extract this field from a raw register value.
    pub fn read(&self, reg: u32) -> u32 {
        self.field.read(reg)
    }

    /// Return `reg` with this field replaced by `value`.
    pub fn modify(&self, reg: u32, value: u32) -> u32 {
        self.field.val(value).modify(reg)
    }
}

impl fmt::Debug for Parm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}@{:#05x}[{}+:{}]",
            self.domain,
            self.offset,
            self.shift(),
            self.width()
        )
    }
}

/// A raw register write, used by multi-register init sequences.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RegInit {
    pub offset: usize,
    pub value: u32,
}

impl RegInit {
    pub const fn new(offset: usize, value: u32) -> RegInit {
        RegInit { offset, value }
    }
}

/// Returned by [`RegisterPort::busy_wait`] when the wall-clock budget runs
/// out before the condition holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Timeout;

/// Access to one block of 32-bit clock registers.
///
/// Offsets are byte offsets from the base of the block.
pub trait RegisterPort {
    fn read32(&mut self, offset: usize) -> u32;

    fn write32(&mut self, offset: usize, value: u32);

    /// Busy delay.
    fn udelay(&mut self, us: u32);

    /// Monotonic microsecond counter.
    fn now_us(&mut self) -> u64;

    /// Poll `done` until it returns true or `timeout_us` of wall-clock time
    /// has passed.
    fn busy_wait<F>(&mut self, timeout_us: u32, mut done: F) -> Result<(), Timeout>
    where
        Self: Sized,
        F: FnMut(&mut Self) -> bool,
    {
        let start = self.now_us();
        loop {
            if done(self) {
                return Ok(());
            }
            if self.now_us().saturating_sub(start) >= u64::from(timeout_us) {
                return Err(Timeout);
            }
            self.udelay(1);
        }
    }

    fn read_parm(&mut self, parm: &Parm) -> u32 {
        parm.read(self.read32(parm.offset))
    }

    fn write_parm(&mut self, parm: &Parm, value: u32) {
        let reg = self.read32(parm.offset);
        self.write32(parm.offset, parm.modify(reg, value));
    }

    /// Apply several field updates with a single read-modify-write per
    /// register, in order of first appearance.
    fn update_fields(&mut self, updates: &[(Parm, u32)]) {
        for (i, (first, _)) in updates.iter().enumerate() {
            if updates[..i].iter().any(|(p, _)| p.offset == first.offset) {
                continue;
            }
            let mut reg = self.read32(first.offset);
            for (parm, value) in updates[i..].iter() {
                if parm.offset == first.offset {
                    reg = parm.modify(reg, *value);
                }
            }
            self.write32(first.offset, reg);
        }
    }
}

/// One register block and the lock that serializes access to it.
pub struct RegisterDomain<P> {
    name: &'static str,
    port: Mutex<P>,
}

impl<P: RegisterPort> RegisterDomain<P> {
    pub const fn new(name: &'static str, port: P) -> RegisterDomain<P> {
        RegisterDomain {
            name,
            port: Mutex::new(port),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Take the domain lock. Hold the guard for the whole of a sequence
    /// that must not interleave with other writers.
    pub fn lock(&self) -> MutexGuard<'_, P> {
        self.port.lock()
    }
}

/// Time source for [`MmioPort`].
pub trait Timebase {
    fn now_us(&self) -> u64;
    fn udelay(&self, us: u32);
}

/// Memory mapped register block.
pub struct MmioPort<T: Timebase> {
    base: *mut u32,
    timebase: T,
}

impl<T: Timebase> MmioPort<T> {
    /// # Safety
    ///
    /// `base` must point to a mapped, 4-byte aligned register block that
    /// covers every offset the topology uses, and nothing else may treat that
    /// memory as ordinary data.
    pub const unsafe fn new(base: *mut u32, timebase: T) -> MmioPort<T> {
        MmioPort { base, timebase }
    }
}

impl<T: Timebase> RegisterPort for MmioPort<T> {
    fn read32(&mut self, offset: usize) -> u32 {
        // SAFETY: the constructor contract covers every offset we are given.
        unsafe { ptr::read_volatile(self.base.add(offset / 4)) }
    }

    fn write32(&mut self, offset: usize, value: u32) {
        // SAFETY: as for `read32`.
        unsafe { ptr::write_volatile(self.base.add(offset / 4), value) }
    }

    fn udelay(&mut self, us: u32) {
        self.timebase.udelay(us);
    }

    fn now_us(&mut self) -> u64 {
        self.timebase.now_us()
    }
}
