// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Clock tree engine for Amlogic Meson SoCs.
//!
//! The engine models a chip's clock controller as a graph of typed nodes
//! (PLLs, MPLLs, muxes, dividers, gates, composites and the CPU clock
//! switch) and computes and applies rate changes through it. Chip crates
//! (`meson_gxl`, `meson_axg`, `meson_g12a`) supply the topology as a static
//! table; the board supplies a [`RegisterPort`] for each register block.

#![crate_name = "meson"]
#![crate_type = "rlib"]
#![no_std]

pub mod composite;
pub mod config;
pub mod cpu;
pub mod divider;
pub mod errorcode;
pub mod graph;
pub mod mpll;
pub mod mux;
pub mod node;
pub mod pll;
pub mod regs;
pub mod sim;

#[cfg(test)]
mod testing;

pub use crate::config::{Config, CONFIG};
pub use crate::errorcode::ClkError;
pub use crate::graph::{ClockSummary, Graph};
pub use crate::node::{Clock, ClockId, Flag, Flags, Kind, Rate};
pub use crate::regs::{Domain, MmioPort, Parm, RegInit, RegisterDomain, RegisterPort, Timebase};
