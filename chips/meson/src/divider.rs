// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Integer dividers.
//!
//! The output is `DIV_ROUND_UP(parent, divisor)`. The divisor is either the
//! field value plus one (the usual Amlogic encoding), the field value itself,
//! or looked up in a table of `{val, div}` pairs.

use crate::node::Rate;
use crate::regs::Parm;

/// How the raw field value maps to a divisor when there is no table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DividerBase {
    /// divisor = value + 1
    ZeroBased,
    /// divisor = value, 0 is invalid
    OneBased,
}

/// Policy for choosing a divisor for a requested rate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Rounding {
    /// Highest achievable rate that does not exceed the request.
    Down,
    /// Achievable rate closest to the request.
    Closest,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DivEntry {
    pub val: u32,
    pub div: u32,
}

#[derive(Copy, Clone, Debug)]
pub struct Divider {
    pub field: Parm,
    pub base: DividerBase,
    pub table: Option<&'static [DivEntry]>,
    pub rounding: Rounding,
}

impl Divider {
    pub const fn new(offset: usize, shift: usize, width: u32) -> Divider {
        Divider {
            field: Parm::new(offset, shift, width),
            base: DividerBase::ZeroBased,
            table: None,
            rounding: Rounding::Down,
        }
    }

    pub const fn one_based(mut self) -> Divider {
        self.base = DividerBase::OneBased;
        self
    }

    pub const fn with_table(mut self, table: &'static [DivEntry]) -> Divider {
        self.table = Some(table);
        self
    }

    pub const fn round_closest(mut self) -> Divider {
        self.rounding = Rounding::Closest;
        self
    }

    /// Divisor encoded by a raw field value.
    pub fn divisor(&self, val: u32) -> Option<u32> {
        match self.table {
            Some(table) => table.iter().find(|e| e.val == val).map(|e| e.div),
            None => match self.base {
                DividerBase::ZeroBased => Some(val + 1),
                DividerBase::OneBased if val == 0 => None,
                DividerBase::OneBased => Some(val),
            },
        }
    }

    /// Output rate for a raw field value. An unencodable value passes the
    /// parent through.
    pub fn recalc(&self, parent_rate: Rate, val: u32) -> Rate {
        match self.divisor(val) {
            Some(div) if div > 0 => parent_rate.div_ceil(Rate::from(div)),
            _ => parent_rate,
        }
    }

    /// Every encodable `(val, divisor)` pair, smallest divisor first for the
    /// linear encodings.
    fn candidates(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let (table, linear) = match self.table {
            Some(table) => (table, 1..=0),
            None => match self.base {
                DividerBase::ZeroBased => (&[][..], 0..=self.field.max()),
                DividerBase::OneBased => (&[][..], 1..=self.field.max()),
            },
        };
        table.iter().map(|e| (e.val, e.div)).chain(
            linear.filter_map(move |val| self.divisor(val).map(|div| (val, div))),
        )
    }

    /// Pick the field value for `target` from a parent at `parent_rate`.
    /// Returns the achieved rate and the raw value.
    pub fn best(&self, parent_rate: Rate, target: Rate) -> Option<(Rate, u32)> {
        let mut best: Option<(Rate, u32)> = None;
        let mut lowest: Option<(Rate, u32)> = None;
        for (val, div) in self.candidates() {
            if div == 0 {
                continue;
            }
            let rate = parent_rate.div_ceil(Rate::from(div));
            if lowest.map_or(true, |(r, _)| rate < r) {
                lowest = Some((rate, val));
            }
            let better = match (self.rounding, best) {
                (_, None) => self.rounding == Rounding::Closest || rate <= target,
                (Rounding::Down, Some((r, _))) => rate <= target && rate > r,
                (Rounding::Closest, Some((r, _))) => rate.abs_diff(target) < r.abs_diff(target),
            };
            if better {
                best = Some((rate, val));
            }
        }
        // Nothing fits below the request: run as slow as possible.
        best.or(lowest)
    }
}
