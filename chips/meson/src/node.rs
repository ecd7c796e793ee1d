// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Static description of clock nodes.
//!
//! A chip's topology is a `static` array of [`Clock`] values, indexed by
//! [`ClockId`]. Nothing in here changes at runtime; enable counts, cached
//! rates and switch state live in the [`Graph`](crate::graph::Graph).

use crate::composite::Composite;
use crate::cpu::{CpuClock, CpuDyn};
use crate::divider::Divider;
use crate::mpll::Mpll;
use crate::mux::Mux;
use crate::pll::Pll;
use crate::regs::Parm;

/// Clock rate in Hz.
pub type Rate = u64;

/// Dense index of a clock in its chip's table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockId(pub usize);

impl ClockId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Behavioral flags carried by a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum Flag {
    /// Rate requests the node cannot satisfy itself go to its parent
    SetRateParent = 1 << 0,
    /// Never gated by the engine, even with no users
    IgnoreUnused = 1 << 1,
    /// Always recomputed from hardware, never served from the cache
    GetRateNoCache = 1 << 2,
    /// Mux rate requests pick the closest parent rather than the highest one
    /// not above the request
    MuxRoundClosest = 1 << 3,
    /// Mux selection is owned by firmware
    MuxReadOnly = 1 << 4,
    /// Rate requests never change the selected parent
    SetRateNoReparent = 1 << 5,
    /// Two-parent mux that reprograms its idle input and then flips
    ParentAlternate = 1 << 6,
}

/// Set of [`Flag`]s.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Flags(u16);

impl Flags {
    pub const NONE: Flags = Flags(0);

    pub const fn of(flags: &[Flag]) -> Flags {
        let mut bits = 0;
        let mut i = 0;
        while i < flags.len() {
            bits |= flags[i] as u16;
            i += 1;
        }
        Flags(bits)
    }

    pub const fn with(self, flag: Flag) -> Flags {
        Flags(self.0 | flag as u16)
    }

    pub const fn contains(self, flag: Flag) -> bool {
        self.0 & flag as u16 != 0
    }
}

/// `parent * mult / div`
#[derive(Copy, Clone, Debug)]
pub struct FixedFactor {
    pub mult: u32,
    pub div: u32,
}

impl FixedFactor {
    pub fn recalc(&self, parent_rate: Rate) -> Rate {
        if self.div == 0 {
            return 0;
        }
        parent_rate * Rate::from(self.mult) / Rate::from(self.div)
    }
}

/// Single enable bit; the output follows the parent.
#[derive(Copy, Clone, Debug)]
pub struct Gate {
    pub bit: Parm,
}

#[derive(Copy, Clone, Debug)]
pub enum Kind {
    /// Root oscillator, or the constant input of an unused mux slot
    Fixed(Rate),
    FixedFactor(FixedFactor),
    Gate(Gate),
    Divider(Divider),
    Mux(Mux),
    Pll(Pll),
    Mpll(Mpll),
    /// Dual pre-divider path feeding the CPU clock
    CpuDyn(CpuDyn),
    /// Final CPU mux between the dynamic path and the system PLL
    CpuClock(CpuClock),
    Composite(Composite),
}

/// One clock node.
#[derive(Copy, Clone, Debug)]
pub struct Clock {
    pub id: ClockId,
    pub name: &'static str,
    /// Ordered inputs. For mux-like nodes the position is the logical parent
    /// index.
    pub parents: &'static [ClockId],
    pub flags: Flags,
    pub kind: Kind,
}

impl Clock {
    pub const fn new(
        id: ClockId,
        name: &'static str,
        parents: &'static [ClockId],
        kind: Kind,
    ) -> Clock {
        Clock {
            id,
            name,
            parents,
            flags: Flags::NONE,
            kind,
        }
    }

    pub const fn fixed(id: ClockId, name: &'static str, rate: Rate) -> Clock {
        Clock::new(id, name, &[], Kind::Fixed(rate))
    }

    pub const fn fixed_factor(
        id: ClockId,
        name: &'static str,
        parent: &'static [ClockId],
        mult: u32,
        div: u32,
    ) -> Clock {
        Clock::new(id, name, parent, Kind::FixedFactor(FixedFactor { mult, div }))
    }

    pub const fn gate(
        id: ClockId,
        name: &'static str,
        parent: &'static [ClockId],
        offset: usize,
        bit: usize,
    ) -> Clock {
        Clock::new(
            id,
            name,
            parent,
            Kind::Gate(Gate {
                bit: Parm::bit(offset, bit),
            }),
        )
    }

    pub const fn divider(
        id: ClockId,
        name: &'static str,
        parent: &'static [ClockId],
        div: Divider,
    ) -> Clock {
        Clock::new(id, name, parent, Kind::Divider(div))
    }

    pub const fn mux(
        id: ClockId,
        name: &'static str,
        parents: &'static [ClockId],
        mux: Mux,
    ) -> Clock {
        Clock::new(id, name, parents, Kind::Mux(mux))
    }

    pub const fn pll(
        id: ClockId,
        name: &'static str,
        parent: &'static [ClockId],
        pll: Pll,
    ) -> Clock {
        Clock::new(id, name, parent, Kind::Pll(pll))
    }

    pub const fn mpll(
        id: ClockId,
        name: &'static str,
        parent: &'static [ClockId],
        mpll: Mpll,
    ) -> Clock {
        Clock::new(id, name, parent, Kind::Mpll(mpll))
    }

    pub const fn composite(
        id: ClockId,
        name: &'static str,
        parents: &'static [ClockId],
        composite: Composite,
    ) -> Clock {
        Clock::new(id, name, parents, Kind::Composite(composite))
    }

    pub const fn cpu_dyn(
        id: ClockId,
        name: &'static str,
        parents: &'static [ClockId],
        cpu_dyn: CpuDyn,
    ) -> Clock {
        Clock::new(id, name, parents, Kind::CpuDyn(cpu_dyn))
    }

    pub const fn cpu_clock(
        id: ClockId,
        name: &'static str,
        parents: &'static [ClockId],
        cpu: CpuClock,
    ) -> Clock {
        Clock::new(id, name, parents, Kind::CpuClock(cpu))
    }

    /// Replace the node's flags.
    pub const fn flags(mut self, flags: Flags) -> Clock {
        self.flags = flags;
        self
    }

    /// Move a gate's enable bit to another register domain. Other kinds
    /// build their fields with [`Parm::in_domain`] directly.
    pub const fn in_domain(mut self, domain: crate::regs::Domain) -> Clock {
        self.kind = match self.kind {
            Kind::Gate(gate) => Kind::Gate(Gate {
                bit: gate.bit.in_domain(domain),
            }),
            other => other,
        };
        self
    }

    pub fn has(&self, flag: Flag) -> bool {
        self.flags.contains(flag)
    }

    /// Calls `f` on every register field the node touches.
    pub fn for_each_parm<F: FnMut(&Parm)>(&self, mut f: F) {
        match &self.kind {
            Kind::Fixed(_) | Kind::FixedFactor(_) => {}
            Kind::Gate(gate) => f(&gate.bit),
            Kind::Divider(div) => f(&div.field),
            Kind::Mux(mux) => f(&mux.field),
            Kind::Pll(pll) => {
                for parm in [Some(pll.m), Some(pll.n), Some(pll.od), pll.od2, pll.frac]
                    .iter()
                    .flatten()
                {
                    f(parm);
                }
            }
            Kind::Mpll(mpll) => {
                for parm in [mpll.sdm, mpll.n2, mpll.sdm_en, mpll.en_dds].iter() {
                    f(parm);
                }
            }
            Kind::CpuDyn(cpu_dyn) => {
                for path in cpu_dyn.paths.iter() {
                    f(&path.premux);
                    f(&path.postmux);
                    f(&path.div);
                }
                f(&cpu_dyn.select);
            }
            Kind::CpuClock(cpu) => f(&cpu.select),
            Kind::Composite(composite) => {
                if let Some(mux) = &composite.mux {
                    f(&mux.field);
                }
                if let Some(div) = &composite.div {
                    f(&div.field);
                }
                if let Some(gate) = &composite.gate {
                    f(&gate.bit);
                }
            }
        }
    }
}
