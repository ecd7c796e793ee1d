// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Sigma-delta fractional dividers (MPLL).
//!
//! An MPLL divides its parent (normally `fixed_pll`) by `N2 + SDM / 16384`.
//! Unlike the table driven PLLs any rate inside the node's bounds is
//! accepted, and requests outside them fail instead of being rounded to a
//! table entry.

use crate::errorcode::ClkError;
use crate::graph::Graph;
use crate::node::{Clock, Rate};
use crate::regs::{Parm, RegisterPort};

/// Denominator of the fractional part.
pub const SDM_DEN: u64 = 16384;

pub const DEFAULT_MIN_RATE: Rate = 5_000_000;
pub const DEFAULT_MAX_RATE: Rate = 500_000_000;

#[derive(Copy, Clone, Debug)]
pub struct Mpll {
    pub sdm: Parm,
    pub n2: Parm,
    pub sdm_en: Parm,
    pub en_dds: Parm,
    pub min_rate: Rate,
    pub max_rate: Rate,
}

impl Mpll {
    pub const fn new(sdm: Parm, n2: Parm, sdm_en: Parm, en_dds: Parm) -> Mpll {
        Mpll {
            sdm,
            n2,
            sdm_en,
            en_dds,
            min_rate: DEFAULT_MIN_RATE,
            max_rate: DEFAULT_MAX_RATE,
        }
    }

    pub const fn with_range(mut self, min_rate: Rate, max_rate: Rate) -> Mpll {
        self.min_rate = min_rate;
        self.max_rate = max_rate;
        self
    }

    pub fn clamp(&self, rate: Rate) -> Rate {
        rate.clamp(self.min_rate, self.max_rate)
    }
}

/// `round(parent * SDM_DEN / (n2 * SDM_DEN + sdm))`
pub fn rate(parent_rate: Rate, n2: u32, sdm: u32) -> Rate {
    let den = Rate::from(n2) * SDM_DEN + Rate::from(sdm);
    if den == 0 {
        return 0;
    }
    (parent_rate * SDM_DEN + den / 2) / den
}

/// Divider settings `(n2, sdm)` for `target`. `target` must be non-zero.
pub fn params(parent_rate: Rate, target: Rate) -> (u32, u32) {
    let n2 = parent_rate / target;
    let rem = parent_rate - n2 * target;
    let sdm = (rem * SDM_DEN).div_ceil(target).min(SDM_DEN - 1);
    (n2 as u32, sdm as u32)
}

impl<P: RegisterPort, const N: usize> Graph<'_, P, N> {
    pub(crate) fn mpll_recalc(&self, clock: &Clock, mpll: &Mpll) -> Rate {
        let parent_rate = self.parent_rate(clock, 0);
        let mut port = self.domain(mpll.n2.domain).lock();
        let n2 = port.read_parm(&mpll.n2);
        let sdm = port.read_parm(&mpll.sdm);
        rate(parent_rate, n2, sdm)
    }

    pub(crate) fn mpll_set_rate(
        &self,
        clock: &Clock,
        mpll: &Mpll,
        target: Rate,
    ) -> Result<(), ClkError> {
        if target < mpll.min_rate || target > mpll.max_rate {
            return Err(ClkError::OutOfRange);
        }
        let parent_rate = self.parent_rate(clock, 0);
        let (n2, sdm) = params(parent_rate, target);
        if n2 == 0 || n2 > mpll.n2.max() {
            return Err(ClkError::OutOfRange);
        }
        let mut port = self.domain(mpll.n2.domain).lock();
        port.update_fields(&[
            (mpll.sdm, sdm),
            (mpll.n2, n2),
            (mpll.sdm_en, 1),
            (mpll.en_dds, 1),
        ]);
        Ok(())
    }
}
