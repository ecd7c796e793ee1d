// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Compile-time configuration for the clock engine.
//!
//! As in the kernel, configuration is a typed `const` object rather than a set
//! of Cargo features, so every code path is type-checked whatever the values.
//! Boards that need different timing pass their own `Config` to
//! `Graph::with_config`.

use crate::node::Rate;

/// Data structure holding compile-time configuration options.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Wall-clock budget for a PLL to report lock after reset is released.
    pub pll_lock_timeout_us: u32,

    /// How many times a PLL programming sequence is repeated after a lock
    /// timeout before the error is reported.
    pub pll_lock_retries: u32,

    /// Delay between writing the PLL dividers and releasing reset.
    pub pll_reset_settle_us: u32,

    /// Settle time after the CPU final mux changes input.
    pub cpu_switch_settle_us: u32,

    /// CPU rates above this run from the system PLL, rates at or below it
    /// from the dynamic divider path.
    pub cpu_mid_rate: Rate,

    /// Largest accepted difference between a requested CPU rate and the rate
    /// read back after the change.
    pub cpu_rate_tolerance: Rate,

    /// Whether every successful rate change is reported on the `debug` log
    /// level.
    pub trace_rate_changes: bool,
}

/// The default instance of `Config`. This is the only place in the engine
/// where Cargo features are consulted.
pub const CONFIG: Config = Config {
    pll_lock_timeout_us: 20_000,
    pll_lock_retries: 1,
    pll_reset_settle_us: 10,
    cpu_switch_settle_us: 100,
    cpu_mid_rate: 1_000_000_000,
    cpu_rate_tolerance: 10_000_000,
    trace_rate_changes: cfg!(feature = "trace_rate_changes"),
};
