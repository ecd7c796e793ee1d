// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! CPU clock switching.
//!
//! The CPU clock is a final mux between two inputs:
//!
//! ```text
//!   xtal ──┐
//!   fclk_div2 ─┼─ premux0 ── div0 ─ postmux0 ─┐
//!   fclk_div3 ─┘                              ├─ dyn select ─┐
//!          ... premux1 ── div1 ─ postmux1 ───┘               ├─ cpu_clk
//!   sys_pll ─────────────────────────────────────────────────┘
//! ```
//!
//! The dynamic side has two identical divider paths. A new rate is written to
//! the path that is not selected and then the select bit flips, so the CPU
//! never runs from a divider that is being reprogrammed.
//!
//! The system PLL cannot be reprogrammed while the CPU runs from it. A PLL
//! change is bracketed by [`Graph::begin_switch`], which parks the CPU on the
//! dynamic path, and [`Graph::end_switch`], which moves it back once the PLL
//! has locked.

use log::{error, warn};

use crate::errorcode::ClkError;
use crate::graph::Graph;
use crate::node::{Clock, ClockId, Kind, Rate};
use crate::pll::ceil_or_lowest;
use crate::regs::{Parm, RegisterPort};

/// Parent index of the dynamic path on a [`CpuClock`].
pub const DYN_PATH: usize = 0;
/// Parent index of the system PLL on a [`CpuClock`].
pub const SYS_PLL: usize = 1;

/// One of the two dynamic divider paths.
#[derive(Copy, Clone, Debug)]
pub struct CpuPath {
    /// Source select, indexes the node's parents
    pub premux: Parm,
    /// 0: premux output, 1: divided output
    pub postmux: Parm,
    /// Divide by value + 1
    pub div: Parm,
}

impl CpuPath {
    pub const fn new(premux: Parm, postmux: Parm, div: Parm) -> CpuPath {
        CpuPath {
            premux,
            postmux,
            div,
        }
    }
}

/// Tabulated setting of a dynamic path.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CpuDynRate {
    pub rate: Rate,
    pub premux: u32,
    pub postmux: u32,
    pub div: u32,
}

impl CpuDynRate {
    pub const fn new(rate: Rate, premux: u32, postmux: u32, div: u32) -> CpuDynRate {
        CpuDynRate {
            rate,
            premux,
            postmux,
            div,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct CpuDyn {
    pub paths: [CpuPath; 2],
    /// Selects the active path
    pub select: Parm,
    pub table: &'static [CpuDynRate],
}

impl CpuDyn {
    pub fn entry(&self, rate: Rate) -> Option<&'static CpuDynRate> {
        self.table.iter().find(|e| e.rate == rate)
    }

    pub fn round_rate(&self, requested: Rate) -> Option<Rate> {
        ceil_or_lowest(self.table.iter().map(|e| e.rate), requested)
    }
}

/// Final CPU mux. Parents are `[dynamic path, system PLL]`.
#[derive(Copy, Clone, Debug)]
pub struct CpuClock {
    pub select: Parm,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SwitchState {
    Steady,
    /// Parked, the system PLL may be reprogrammed
    PreSwitch,
    /// Moving back to the system PLL
    PostSwitch,
}

fn path_output(src_rate: Rate, postmux: u32, div: u32) -> Rate {
    if postmux == 1 {
        src_rate.div_ceil(Rate::from(div) + 1)
    } else {
        src_rate
    }
}

impl<P: RegisterPort, const N: usize> Graph<'_, P, N> {
    /// Settings of the currently selected dynamic path.
    fn cpu_dyn_active(&self, cpu_dyn: &CpuDyn) -> (usize, u32, u32, u32) {
        let mut port = self.domain(cpu_dyn.select.domain).lock();
        let active = (port.read_parm(&cpu_dyn.select) & 1) as usize;
        let path = &cpu_dyn.paths[active];
        (
            active,
            port.read_parm(&path.premux),
            port.read_parm(&path.postmux),
            port.read_parm(&path.div),
        )
    }

    pub(crate) fn cpu_dyn_parent(&self, clock: &Clock, cpu_dyn: &CpuDyn) -> Option<usize> {
        let (_, premux, _, _) = self.cpu_dyn_active(cpu_dyn);
        let premux = premux as usize;
        (premux < clock.parents.len()).then_some(premux)
    }

    pub(crate) fn cpu_dyn_recalc(&self, clock: &Clock, cpu_dyn: &CpuDyn) -> Rate {
        let (_, premux, postmux, div) = self.cpu_dyn_active(cpu_dyn);
        let src_rate = self.parent_rate(clock, premux as usize);
        path_output(src_rate, postmux, div)
    }

    pub(crate) fn cpu_dyn_set_rate(
        &self,
        id: ClockId,
        clock: &Clock,
        cpu_dyn: &CpuDyn,
        rate: Rate,
    ) -> Result<(), ClkError> {
        let Some(entry) = cpu_dyn.entry(rate) else {
            warn!("{}: {} Hz is not a dynamic path rate", clock.name, rate);
            return Err(ClkError::UnknownRate);
        };
        let (_, premux, postmux, div) = self.cpu_dyn_active(cpu_dyn);
        if (premux, postmux, div) == (entry.premux, entry.postmux, entry.div) {
            return Ok(());
        }

        self.reparent(id, clock, entry.premux as usize, || {
            let mut port = self.domain(cpu_dyn.select.domain).lock();
            let active = port.read_parm(&cpu_dyn.select) & 1;
            let idle = &cpu_dyn.paths[(active ^ 1) as usize];
            port.update_fields(&[
                (idle.premux, entry.premux),
                (idle.div, entry.div),
                (idle.postmux, entry.postmux),
            ]);
            port.write_parm(&cpu_dyn.select, active ^ 1);
            Ok(())
        })
    }

    fn cpu_clock(&self, cpu: ClockId) -> Result<(&Clock, &CpuClock), ClkError> {
        let clock = self.clock(cpu)?;
        match &clock.kind {
            Kind::CpuClock(cpu_clock) => Ok((clock, cpu_clock)),
            _ => Err(ClkError::NoSupport),
        }
    }

    pub(crate) fn cpu_select(
        &self,
        cpu: ClockId,
        clock: &Clock,
        cpu_clock: &CpuClock,
        input: usize,
    ) -> Result<(), ClkError> {
        self.reparent(cpu, clock, input, || {
            let mut port = self.domain(cpu_clock.select.domain).lock();
            port.write_parm(&cpu_clock.select, input as u32);
            port.udelay(self.config.cpu_switch_settle_us);
            Ok(())
        })
    }

    /// First half of a system PLL change: if the PLL is about to run above
    /// the mid rate, park the CPU on the dynamic path.
    pub fn begin_switch(&self, cpu: ClockId, new_rate: Rate) -> Result<(), ClkError> {
        let (clock, cpu_clock) = self.cpu_clock(cpu)?;
        let state = self.state(cpu);
        if state.switch.get() != SwitchState::Steady {
            return Err(ClkError::Busy);
        }
        if new_rate > self.config.cpu_mid_rate {
            self.cpu_select(cpu, clock, cpu_clock, DYN_PATH)?;
            state.parked.set(true);
        }
        state.switch.set(SwitchState::PreSwitch);
        self.invalidate_rates();
        Ok(())
    }

    /// Second half of a system PLL change: return a parked CPU to the PLL.
    pub fn end_switch(&self, cpu: ClockId) -> Result<(), ClkError> {
        let (clock, cpu_clock) = self.cpu_clock(cpu)?;
        let state = self.state(cpu);
        if state.switch.get() != SwitchState::PreSwitch {
            return Err(ClkError::InvalidState);
        }
        state.switch.set(SwitchState::PostSwitch);
        if state.parked.get() {
            if let Err(err) = self.cpu_select(cpu, clock, cpu_clock, SYS_PLL) {
                state.switch.set(SwitchState::Steady);
                return Err(err);
            }
            state.parked.set(false);
        }
        state.switch.set(SwitchState::Steady);
        self.invalidate_rates();
        Ok(())
    }

    /// Give up on a PLL change after `begin_switch`. A parked CPU stays on
    /// the dynamic path.
    pub fn abort_switch(&self, cpu: ClockId) -> Result<(), ClkError> {
        self.cpu_clock(cpu)?;
        let state = self.state(cpu);
        if state.switch.get() != SwitchState::PreSwitch {
            return Err(ClkError::InvalidState);
        }
        state.parked.set(false);
        state.switch.set(SwitchState::Steady);
        Ok(())
    }

    pub fn switch_state(&self, cpu: ClockId) -> SwitchState {
        match self.cpu_clock(cpu) {
            Ok(_) => self.state(cpu).switch.get(),
            Err(_) => SwitchState::Steady,
        }
    }

    pub(crate) fn cpu_round_rate(&self, clock: &Clock, rate: Rate) -> Result<Rate, ClkError> {
        let input = if rate > self.config.cpu_mid_rate {
            SYS_PLL
        } else {
            DYN_PATH
        };
        let parent = *clock.parents.get(input).ok_or(ClkError::Malformed)?;
        self.round_rate(parent, rate)
    }

    /// CPU frequency step. Rates above the mid rate come from the system
    /// PLL, the rest from the dynamic path. The result is read back and
    /// checked against the configured tolerance.
    pub(crate) fn cpu_set_rate(
        &self,
        id: ClockId,
        clock: &Clock,
        rate: Rate,
    ) -> Result<(), ClkError> {
        let (dyn_path, sys_pll) = match clock.parents {
            [dyn_path, sys_pll] => (*dyn_path, *sys_pll),
            _ => return Err(ClkError::Malformed),
        };
        let state = self.state(id);

        if rate > self.config.cpu_mid_rate {
            if !state.holds_pll.get() {
                self.enable(sys_pll)?;
                state.holds_pll.set(true);
            }
            self.begin_switch(id, rate)?;
            if let Err(err) = self.set_rate(sys_pll, rate) {
                self.abort_switch(id)?;
                return Err(err);
            }
            self.end_switch(id)?;
        } else {
            self.set_rate(dyn_path, rate)?;
            self.set_parent(id, DYN_PATH)?;
            if state.holds_pll.get() {
                state.holds_pll.set(false);
                self.disable(sys_pll)?;
            }
        }

        self.invalidate_rates();
        let actual = self.get_rate(id);
        if actual.abs_diff(rate) > self.config.cpu_rate_tolerance {
            error!("{}: requested {} Hz, running at {} Hz", clock.name, rate, actual);
            return Err(ClkError::RateMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_output_postmux() {
        assert_eq!(path_output(1_000_000_000, 0, 9), 1_000_000_000);
        assert_eq!(path_output(1_000_000_000, 1, 9), 100_000_000);
        assert_eq!(path_output(666_666_666, 1, 1), 333_333_333);
    }

    #[test]
    fn dyn_table_round() {
        const TABLE: [CpuDynRate; 3] = [
            CpuDynRate::new(100_000_000, 1, 1, 9),
            CpuDynRate::new(500_000_000, 1, 1, 1),
            CpuDynRate::new(1_000_000_000, 1, 0, 0),
        ];
        let cpu_dyn = CpuDyn {
            paths: [
                CpuPath::new(
                    Parm::new(0x19c, 0, 2),
                    Parm::bit(0x19c, 2),
                    Parm::new(0x19c, 4, 6),
                ),
                CpuPath::new(
                    Parm::new(0x19c, 16, 2),
                    Parm::bit(0x19c, 18),
                    Parm::new(0x19c, 20, 6),
                ),
            ],
            select: Parm::bit(0x19c, 10),
            table: &TABLE,
        };
        assert_eq!(cpu_dyn.round_rate(200_000_000), Some(500_000_000));
        assert_eq!(cpu_dyn.round_rate(1_500_000_000), Some(100_000_000));
        assert_eq!(cpu_dyn.entry(500_000_000), Some(&TABLE[1]));
        assert_eq!(cpu_dyn.entry(600_000_000), None);
    }
}
