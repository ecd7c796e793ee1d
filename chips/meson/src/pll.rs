// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Table driven PLLs.
//!
//! # Implemented features
//!
//! - [x] Rate readback: `((parent * M + (parent * FRAC >> FRAC_SHIFT)) / N) >> OD >> OD2`
//! - [x] Rate rounding to the PLL's rate table
//! - [x] Reprogramming with reset, bounded lock polling and one retry
//! - [x] Magic initialization sequences of the gp0/hifi/pcie PLLs
//! - [x] Enable that restores the last programmed rate
//!
//! # Register layout
//!
//! The enable, reset and lock bits share one control register. Their
//! positions depend on the SoC generation:
//!
//! | generation  | LOCK | ENABLE | RESET | FRAC_SHIFT |
//! |-------------|------|--------|-------|------------|
//! | GXL, AXG    | 31   | 30     | 29    | 12         |
//! | G12A, TL1   | 31   | 28     | 29    | 17         |
//!
//! PLLs with an empty rate table belong to firmware: they can be read and
//! rounded, never programmed.

use log::{error, trace, warn};
use tock_registers::fields::Field;
use tock_registers::{register_bitfields, LocalRegisterCopy, RegisterLongName};

use crate::config::Config;
use crate::errorcode::ClkError;
use crate::graph::Graph;
use crate::node::{Clock, ClockId, Rate};
use crate::regs::{Domain, Parm, RegInit, RegisterPort, Timeout};

register_bitfields![u32,
    PLL_CNTL [
        LOCK OFFSET(31) NUMBITS(1) [],
        EN OFFSET(30) NUMBITS(1) [],
        RESET OFFSET(29) NUMBITS(1) []
    ],
    G12A_PLL_CNTL0 [
        LOCK OFFSET(31) NUMBITS(1) [],
        RESET OFFSET(29) NUMBITS(1) [],
        EN OFFSET(28) NUMBITS(1) []
    ]
];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PllGen {
    /// GXBB/GXL/GXM
    Legacy,
    Axg,
    G12a,
    Tl1,
}

#[derive(Copy, Clone)]
pub(crate) struct PllControl {
    pub(crate) lock: Field<u32, ()>,
    pub(crate) en: Field<u32, ()>,
    pub(crate) reset: Field<u32, ()>,
}

fn untyped<R: RegisterLongName>(field: Field<u32, R>) -> Field<u32, ()> {
    Field::new(field.mask, field.shift)
}

impl PllGen {
    pub const fn frac_shift(self) -> u32 {
        match self {
            PllGen::Legacy | PllGen::Axg => 12,
            PllGen::G12a | PllGen::Tl1 => 17,
        }
    }

    pub(crate) fn control(self) -> PllControl {
        match self {
            PllGen::Legacy | PllGen::Axg => PllControl {
                lock: untyped(PLL_CNTL::LOCK),
                en: untyped(PLL_CNTL::EN),
                reset: untyped(PLL_CNTL::RESET),
            },
            PllGen::G12a | PllGen::Tl1 => PllControl {
                lock: untyped(G12A_PLL_CNTL0::LOCK),
                en: untyped(G12A_PLL_CNTL0::EN),
                reset: untyped(G12A_PLL_CNTL0::RESET),
            },
        }
    }
}

/// One row of a PLL rate table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PllRate {
    pub rate: Rate,
    pub m: u32,
    pub n: u32,
    pub od: u32,
    pub od2: u32,
    pub frac: u32,
}

impl PllRate {
    pub const fn new(rate: Rate, m: u32, n: u32, od: u32) -> PllRate {
        PllRate {
            rate,
            m,
            n,
            od,
            od2: 0,
            frac: 0,
        }
    }

    pub const fn with_od2(mut self, od2: u32) -> PllRate {
        self.od2 = od2;
        self
    }

    pub const fn with_frac(mut self, frac: u32) -> PllRate {
        self.frac = frac;
        self
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Pll {
    pub gen: PllGen,
    /// Offset of the register holding the enable, reset and lock bits.
    pub cntl: usize,
    pub m: Parm,
    pub n: Parm,
    pub od: Parm,
    pub od2: Option<Parm>,
    pub frac: Option<Parm>,
    pub table: &'static [PllRate],
    /// Written in order before every reprogramming.
    pub init: &'static [RegInit],
}

/// `((parent * m + (parent * frac >> frac_shift)) / n) >> od >> od2`, or 0
/// while N reads as zero.
pub fn recalc(
    parent_rate: Rate,
    m: u32,
    n: u32,
    od: u32,
    od2: u32,
    frac: Option<u32>,
    frac_shift: u32,
) -> Rate {
    if n == 0 {
        return 0;
    }
    let mut rate = parent_rate * Rate::from(m);
    if let Some(frac) = frac {
        rate += (parent_rate * Rate::from(frac)) >> frac_shift;
    }
    (rate / Rate::from(n)) >> od >> od2
}

/// First rate not below `requested`, scanning in table order. Requests above
/// every entry get the smallest one.
pub fn ceil_or_lowest<I>(rates: I, requested: Rate) -> Option<Rate>
where
    I: Iterator<Item = Rate> + Clone,
{
    rates
        .clone()
        .find(|&rate| rate >= requested)
        .or_else(|| rates.min())
}

impl Pll {
    pub const fn new(gen: PllGen, cntl: usize, m: Parm, n: Parm, od: Parm) -> Pll {
        Pll {
            gen,
            cntl,
            m,
            n,
            od,
            od2: None,
            frac: None,
            table: &[],
            init: &[],
        }
    }

    pub const fn with_od2(mut self, od2: Parm) -> Pll {
        self.od2 = Some(od2);
        self
    }

    pub const fn with_frac(mut self, frac: Parm) -> Pll {
        self.frac = Some(frac);
        self
    }

    pub const fn with_table(mut self, table: &'static [PllRate]) -> Pll {
        self.table = table;
        self
    }

    pub const fn with_init(mut self, init: &'static [RegInit]) -> Pll {
        self.init = init;
        self
    }

    pub fn is_read_only(&self) -> bool {
        self.table.is_empty()
    }

    pub fn domain(&self) -> Domain {
        self.m.domain
    }

    pub fn entry(&self, rate: Rate) -> Option<&'static PllRate> {
        self.table.iter().find(|e| e.rate == rate)
    }

    pub fn round_rate(&self, requested: Rate) -> Option<Rate> {
        ceil_or_lowest(self.table.iter().map(|e| e.rate), requested)
    }

    pub fn lowest(&self) -> Option<Rate> {
        self.table.iter().map(|e| e.rate).min()
    }

    fn read_rate<P: RegisterPort>(&self, port: &mut P, parent_rate: Rate) -> Rate {
        recalc(
            parent_rate,
            port.read_parm(&self.m),
            port.read_parm(&self.n),
            port.read_parm(&self.od),
            self.od2.map_or(0, |od2| port.read_parm(&od2)),
            self.frac.map(|frac| port.read_parm(&frac)),
            self.gen.frac_shift(),
        )
    }

    fn status<P: RegisterPort>(&self, port: &mut P) -> LocalRegisterCopy<u32, ()> {
        LocalRegisterCopy::new(port.read32(self.cntl))
    }

    fn is_running<P: RegisterPort>(&self, port: &mut P) -> bool {
        let ctl = self.gen.control();
        let cntl = self.status(port);
        cntl.is_set(ctl.en) && cntl.is_set(ctl.lock) && !cntl.is_set(ctl.reset)
    }

    /// Full programming sequence. The caller holds the domain lock.
    fn program<P: RegisterPort>(
        &self,
        port: &mut P,
        entry: &PllRate,
        config: &Config,
    ) -> Result<(), Timeout> {
        let ctl = self.gen.control();

        for init in self.init.iter() {
            port.write32(init.offset, init.value);
        }

        let mut cntl = self.status(port);
        cntl.modify(ctl.reset.val(1) + ctl.en.val(1));
        port.write32(self.cntl, cntl.get());

        let updates: heapless::Vec<(Parm, u32), 5> = [
            (Some(self.m), entry.m),
            (Some(self.n), entry.n),
            (Some(self.od), entry.od),
            (self.od2, entry.od2),
            (self.frac, entry.frac),
        ]
        .into_iter()
        .filter_map(|(parm, value)| parm.map(|parm| (parm, value)))
        .collect();
        port.update_fields(&updates);

        port.udelay(config.pll_reset_settle_us);

        let mut cntl = self.status(port);
        cntl.modify(ctl.reset.val(0));
        port.write32(self.cntl, cntl.get());

        port.busy_wait(config.pll_lock_timeout_us, |port| self.status(port).is_set(ctl.lock))
    }

    fn power_down<P: RegisterPort>(&self, port: &mut P) {
        let ctl = self.gen.control();
        let mut cntl = self.status(port);
        cntl.modify(ctl.reset.val(1) + ctl.en.val(0));
        port.write32(self.cntl, cntl.get());
    }
}

impl<P: RegisterPort, const N: usize> Graph<'_, P, N> {
    pub(crate) fn pll_recalc(&self, id: ClockId, clock: &Clock, pll: &Pll) -> Rate {
        if self.state(id).lock_lost.get() {
            return 0;
        }
        let parent_rate = self.parent_rate(clock, 0);
        let mut port = self.domain(pll.domain()).lock();
        pll.read_rate(&mut *port, parent_rate)
    }

    pub(crate) fn pll_round_rate(&self, id: ClockId, pll: &Pll, requested: Rate) -> Rate {
        pll.round_rate(requested).unwrap_or_else(|| self.get_rate(id))
    }

    pub(crate) fn pll_set_rate(
        &self,
        id: ClockId,
        clock: &Clock,
        pll: &Pll,
        rate: Rate,
    ) -> Result<(), ClkError> {
        if pll.is_read_only() {
            return Err(ClkError::ReadOnly);
        }
        let Some(entry) = pll.entry(rate) else {
            warn!("{}: {} Hz is not in the rate table", clock.name, rate);
            return Err(ClkError::UnknownRate);
        };
        self.pll_program(id, clock, pll, entry)
    }

    fn pll_program(
        &self,
        id: ClockId,
        clock: &Clock,
        pll: &Pll,
        entry: &PllRate,
    ) -> Result<(), ClkError> {
        let state = self.state(id);
        let attempts = self.config.pll_lock_retries + 1;
        for attempt in 1..=attempts {
            trace!(
                "{}: m={} n={} od={} od2={} frac={} (attempt {})",
                clock.name,
                entry.m,
                entry.n,
                entry.od,
                entry.od2,
                entry.frac,
                attempt
            );
            let locked = {
                let mut port = self.domain(pll.domain()).lock();
                pll.program(&mut *port, entry, self.config)
            };
            match locked {
                Ok(()) => {
                    state.programmed.set(Some(entry.rate));
                    state.lock_lost.set(false);
                    return Ok(());
                }
                Err(Timeout) if attempt < attempts => {
                    warn!("{}: no lock at {} Hz, retrying", clock.name, entry.rate);
                }
                Err(Timeout) => {}
            }
        }
        state.programmed.set(None);
        state.lock_lost.set(true);
        error!("{}: failed to lock at {} Hz", clock.name, entry.rate);
        Err(ClkError::LockTimeout)
    }

    pub(crate) fn pll_enable(&self, id: ClockId, clock: &Clock, pll: &Pll) -> Result<(), ClkError> {
        if pll.is_read_only() {
            return Ok(());
        }
        let state = self.state(id);
        let parent_rate = self.parent_rate(clock, 0);
        let (running, current, unprogrammed) = {
            let mut port = self.domain(pll.domain()).lock();
            let running = pll.is_running(&mut *port);
            let unprogrammed = port.read_parm(&pll.m) == 0 || port.read_parm(&pll.n) == 0;
            (running, pll.read_rate(&mut *port, parent_rate), unprogrammed)
        };

        // Still locked at the rate we left it, or at a rate firmware chose
        // before we ever touched it.
        if running && !unprogrammed {
            match state.programmed.get() {
                Some(rate) if rate == current => return Ok(()),
                None if !state.lock_lost.get() => {
                    state.programmed.set(Some(current));
                    return Ok(());
                }
                _ => {}
            }
        }

        let target = if unprogrammed && state.programmed.get().is_none() {
            pll.lowest()
        } else {
            pll.round_rate(current)
        };
        let Some(entry) = target.and_then(|rate| pll.entry(rate)) else {
            return Err(ClkError::UnknownRate);
        };
        let result = self.pll_program(id, clock, pll, entry);
        self.invalidate_rates();
        result
    }

    pub(crate) fn pll_disable(&self, pll: &Pll) {
        if pll.is_read_only() {
            return;
        }
        let mut port = self.domain(pll.domain()).lock();
        pll.power_down(&mut *port);
    }

    pub(crate) fn pll_is_enabled(&self, pll: &Pll) -> bool {
        if pll.is_read_only() {
            return false;
        }
        let ctl = pll.gen.control();
        let mut port = self.domain(pll.domain()).lock();
        pll.status(&mut *port).is_set(ctl.en)
    }
}
