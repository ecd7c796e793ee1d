// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Parent selectors.

use crate::errorcode::ClkError;
use crate::graph::Graph;
use crate::node::{Clock, ClockId, Flag, Rate};
use crate::regs::{Parm, RegisterPort};

#[derive(Copy, Clone, Debug)]
pub struct Mux {
    pub field: Parm,
    /// Raw field value for each logical parent index, when the encoding is
    /// not the identity.
    pub table: Option<&'static [u32]>,
}

impl Mux {
    pub const fn new(offset: usize, shift: usize, width: u32) -> Mux {
        Mux {
            field: Parm::new(offset, shift, width),
            table: None,
        }
    }

    pub const fn with_table(mut self, table: &'static [u32]) -> Mux {
        self.table = Some(table);
        self
    }

    /// Logical parent index for a raw field value.
    pub fn index(&self, raw: u32, num_parents: usize) -> Option<usize> {
        let index = match self.table {
            Some(table) => table.iter().position(|&v| v == raw)?,
            None => raw as usize,
        };
        (index < num_parents).then_some(index)
    }

    /// Raw field value selecting logical parent `index`.
    pub fn raw(&self, index: usize) -> Option<u32> {
        match self.table {
            Some(table) => table.get(index).copied(),
            None => u32::try_from(index).ok().filter(|&v| v <= self.field.max()),
        }
    }
}

/// Choose among `count` inputs for `target`. Without `closest`, the highest
/// rate not above the target wins, falling back to the slowest input. Inputs
/// reporting 0 are not running and never win. Ties go to the lower index.
pub fn best_parent<F>(count: usize, mut rate_of: F, target: Rate, closest: bool) -> Option<usize>
where
    F: FnMut(usize) -> Rate,
{
    let mut best: Option<(usize, Rate)> = None;
    let mut slowest: Option<(usize, Rate)> = None;
    for index in 0..count {
        let rate = rate_of(index);
        if rate == 0 {
            continue;
        }
        if slowest.map_or(true, |(_, r)| rate < r) {
            slowest = Some((index, rate));
        }
        let better = match best {
            None => closest || rate <= target,
            Some((_, r)) if closest => rate.abs_diff(target) < r.abs_diff(target),
            Some((_, r)) => rate <= target && rate > r,
        };
        if better {
            best = Some((index, rate));
        }
    }
    best.or(slowest).map(|(index, _)| index)
}

impl<P: RegisterPort, const N: usize> Graph<'_, P, N> {
    pub(crate) fn mux_set_rate(
        &self,
        id: ClockId,
        clock: &Clock,
        mux: &Mux,
        target: Rate,
    ) -> Result<(), ClkError> {
        if clock.has(Flag::ParentAlternate) {
            return self.alternate_set_rate(id, clock, mux, target);
        }
        if clock.has(Flag::SetRateParent) {
            let parent = self.parent(id).ok_or(ClkError::InvalidState)?;
            return self.set_rate(parent, target).map(|_| ());
        }
        if self.get_rate(id) == target {
            return Ok(());
        }
        if clock.has(Flag::MuxReadOnly) {
            return Err(ClkError::ReadOnly);
        }
        if clock.has(Flag::SetRateNoReparent) {
            return Err(ClkError::NoSupport);
        }
        let index = best_parent(
            clock.parents.len(),
            |i| self.parent_rate(clock, i),
            target,
            clock.has(Flag::MuxRoundClosest),
        )
        .ok_or(ClkError::OutOfRange)?;
        self.set_parent(id, index)
    }

    pub(crate) fn mux_round_rate(
        &self,
        id: ClockId,
        clock: &Clock,
        mux: &Mux,
        target: Rate,
    ) -> Result<Rate, ClkError> {
        if clock.has(Flag::ParentAlternate) {
            return self.alternate_round_rate(clock, mux, target);
        }
        if clock.has(Flag::SetRateParent) {
            let parent = self.parent(id).ok_or(ClkError::InvalidState)?;
            return self.round_rate(parent, target);
        }
        let current = self.get_rate(id);
        if current == target
            || clock.has(Flag::MuxReadOnly)
            || clock.has(Flag::SetRateNoReparent)
        {
            return Ok(current);
        }
        best_parent(
            clock.parents.len(),
            |i| self.parent_rate(clock, i),
            target,
            clock.has(Flag::MuxRoundClosest),
        )
        .map(|index| self.parent_rate(clock, index))
        .ok_or(ClkError::OutOfRange)
    }
}
