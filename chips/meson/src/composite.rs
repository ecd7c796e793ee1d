// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Composite clocks and the alternate-parent mux.
//!
//! A composite is an optional mux, an optional divider and an optional gate
//! presented as one node. The media blocks (VPU, VAPB, VDEC, HEVC, ...)
//! duplicate their composite into two chains, `p0` and `p1`, behind a one-bit
//! mux marked [`Flag::ParentAlternate`]. Changing the rate of such a mux
//! reprograms the chain that is not selected and then flips the mux, so the
//! consumer never sees a half-programmed divider.

use crate::divider::Divider;
use crate::errorcode::ClkError;
use crate::graph::Graph;
use crate::mux::Mux;
use crate::node::{Clock, ClockId, Flag, Gate, Rate};
use crate::regs::{Parm, RegisterPort};

#[derive(Copy, Clone, Debug)]
pub struct Composite {
    pub mux: Option<Mux>,
    pub div: Option<Divider>,
    pub gate: Option<Gate>,
}

impl Composite {
    pub const fn new() -> Composite {
        Composite {
            mux: None,
            div: None,
            gate: None,
        }
    }

    pub const fn with_mux(mut self, mux: Mux) -> Composite {
        self.mux = Some(mux);
        self
    }

    pub const fn with_div(mut self, div: Divider) -> Composite {
        self.div = Some(div);
        self
    }

    pub const fn with_gate(mut self, offset: usize, bit: usize) -> Composite {
        self.gate = Some(Gate {
            bit: Parm::bit(offset, bit),
        });
        self
    }
}

/// Parent and divider setting chosen for a rate request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Choice {
    pub(crate) rate: Rate,
    pub(crate) parent: usize,
    pub(crate) div: Option<u32>,
}

impl<P: RegisterPort, const N: usize> Graph<'_, P, N> {
    pub(crate) fn composite_parent(&self, clock: &Clock, composite: &Composite) -> Option<usize> {
        match &composite.mux {
            Some(mux) => mux.index(self.read_parm(&mux.field), clock.parents.len()),
            None => (!clock.parents.is_empty()).then_some(0),
        }
    }

    pub(crate) fn composite_recalc(&self, clock: &Clock, composite: &Composite) -> Rate {
        let Some(parent) = self.composite_parent(clock, composite) else {
            return 0;
        };
        let parent_rate = self.parent_rate(clock, parent);
        match &composite.div {
            Some(div) => div.recalc(parent_rate, self.read_parm(&div.field)),
            None => parent_rate,
        }
    }

    /// Best parent and divider for `target`. Parents that are not running
    /// are skipped; the closest rate wins and ties keep the lower index.
    pub(crate) fn composite_determine(
        &self,
        clock: &Clock,
        composite: &Composite,
        target: Rate,
    ) -> Option<Choice> {
        let current = self.composite_parent(clock, composite);
        let fixed_parent = composite.mux.is_none() || clock.has(Flag::SetRateNoReparent);
        let mut best: Option<Choice> = None;
        for parent in 0..clock.parents.len() {
            if fixed_parent && Some(parent) != current {
                continue;
            }
            let parent_rate = self.parent_rate(clock, parent);
            if parent_rate == 0 {
                continue;
            }
            let (rate, div) = match &composite.div {
                Some(divider) => match divider.best(parent_rate, target) {
                    Some((rate, val)) => (rate, Some(val)),
                    None => continue,
                },
                None => (parent_rate, None),
            };
            if best.map_or(true, |b| rate.abs_diff(target) < b.rate.abs_diff(target)) {
                best = Some(Choice { rate, parent, div });
            }
        }
        best
    }

    pub(crate) fn composite_set_rate(
        &self,
        id: ClockId,
        clock: &Clock,
        composite: &Composite,
        target: Rate,
    ) -> Result<(), ClkError> {
        let Some(choice) = self.composite_determine(clock, composite, target) else {
            return Err(ClkError::OutOfRange);
        };
        let mux = composite
            .mux
            .as_ref()
            .and_then(|mux| mux.raw(choice.parent).map(|raw| (mux.field, raw)));
        let div = composite
            .div
            .as_ref()
            .zip(choice.div)
            .map(|(div, val)| (div.field, val));
        let updates: heapless::Vec<(Parm, u32), 2> = mux.into_iter().chain(div).collect();
        let Some((first, _)) = updates.first() else {
            return Ok(());
        };
        let domain = self.domain(first.domain);

        self.reparent(id, clock, choice.parent, || {
            domain.lock().update_fields(&updates);
            Ok(())
        })
    }

    /// Rate change of a [`Flag::ParentAlternate`] mux.
    pub(crate) fn alternate_set_rate(
        &self,
        id: ClockId,
        clock: &Clock,
        mux: &Mux,
        target: Rate,
    ) -> Result<(), ClkError> {
        let Some(active) = mux.index(self.read_parm(&mux.field), clock.parents.len()) else {
            return Err(ClkError::InvalidState);
        };
        let idle = active ^ 1;
        if self.get_rate(clock.parents[active]) == target {
            return Ok(());
        }
        // The idle chain may already hold the requested setting, then only
        // the flip is needed.
        if self.get_rate(clock.parents[idle]) != target {
            self.set_rate(clock.parents[idle], target)?;
        }
        let raw = mux.raw(idle).ok_or(ClkError::InvalidParentIndex)?;
        self.reparent(id, clock, idle, || {
            self.write_parm(&mux.field, raw);
            Ok(())
        })
    }

    pub(crate) fn alternate_round_rate(
        &self,
        clock: &Clock,
        mux: &Mux,
        target: Rate,
    ) -> Result<Rate, ClkError> {
        let Some(active) = mux.index(self.read_parm(&mux.field), clock.parents.len()) else {
            return Err(ClkError::InvalidState);
        };
        if self.get_rate(clock.parents[active]) == target {
            return Ok(target);
        }
        self.round_rate(clock.parents[active ^ 1], target)
    }
}
