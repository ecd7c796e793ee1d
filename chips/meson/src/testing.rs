// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! A small topology that uses every node kind, run against the register
//! image simulator.

use crate::composite::Composite;
use crate::cpu::{CpuClock, CpuDyn, CpuDynRate, CpuPath};
use crate::divider::Divider;
use crate::mpll::Mpll;
use crate::mux::Mux;
use crate::node::{Clock, ClockId, Flag, Flags};
use crate::pll::{Pll, PllGen, PllRate};
use crate::regs::{Domain, Parm, RegInit, RegisterDomain};
use crate::sim::RegisterImage;

pub(crate) type Sim = RegisterImage<0x100>;

pub(crate) const XTAL: ClockId = ClockId(0);
pub(crate) const SYS_PLL: ClockId = ClockId(1);
pub(crate) const FIXED_PLL: ClockId = ClockId(2);
pub(crate) const FCLK_DIV2: ClockId = ClockId(3);
pub(crate) const FCLK_DIV3: ClockId = ClockId(4);
pub(crate) const FCLK_DIV4: ClockId = ClockId(5);
pub(crate) const FCLK_DIV5: ClockId = ClockId(6);
pub(crate) const FCLK_DIV7: ClockId = ClockId(7);
pub(crate) const MPLL0: ClockId = ClockId(8);
pub(crate) const GP1: ClockId = ClockId(9);
pub(crate) const CPU_DYN: ClockId = ClockId(10);
pub(crate) const CPU_CLK: ClockId = ClockId(11);
pub(crate) const MPEG_SEL: ClockId = ClockId(12);
pub(crate) const MPEG_DIV: ClockId = ClockId(13);
pub(crate) const CLK81: ClockId = ClockId(14);
pub(crate) const SPICC: ClockId = ClockId(15);
pub(crate) const VPU_P0: ClockId = ClockId(16);
pub(crate) const VPU_P1: ClockId = ClockId(17);
pub(crate) const VPU: ClockId = ClockId(18);
pub(crate) const AO_UART: ClockId = ClockId(19);
pub(crate) const UART_MUX: ClockId = ClockId(20);
pub(crate) const GP0_PLL: ClockId = ClockId(21);

pub(crate) const NR_CLKS: usize = 22;

const SYS_PLL_CNTL: usize = 0x300;
const FIXED_PLL_CNTL: usize = 0x280;
const GP0_PLL_CNTL0: usize = 0x40;
const MPLL_CNTL7: usize = 0x298;
const SYS_CPU_CLK_CNTL0: usize = 0x19c;
const MPEG_CLK_CNTL: usize = 0x174;
const GCLK_MPEG0: usize = 0x140;
const VPU_CLK_CNTL: usize = 0x1bc;
const UART_CLK_CNTL: usize = 0x1c0;
const AO_CLK_GATE0: usize = 0x40;

static SYS_PLL_TABLE: [PllRate; 5] = [
    PllRate::new(600_000_000, 100, 1, 2),
    PllRate::new(792_000_000, 132, 1, 2),
    PllRate::new(1_008_000_000, 84, 1, 1),
    PllRate::new(1_200_000_000, 100, 1, 1),
    PllRate::new(1_500_000_000, 125, 1, 1),
];

static GP0_PLL_TABLE: [PllRate; 2] = [
    PllRate::new(792_000_000, 132, 1, 2),
    PllRate::new(903_000_000, 150, 1, 2).with_frac(65536),
];

pub(crate) static GP0_PLL_INIT: [RegInit; 6] = [
    RegInit::new(0x44, 0x0000_0000),
    RegInit::new(0x48, 0x0000_0000),
    RegInit::new(0x4c, 0x4868_1c00),
    RegInit::new(0x50, 0x3377_1290),
    RegInit::new(0x54, 0x3927_2000),
    RegInit::new(0x58, 0x5654_0000),
];

static CPU_DYN_TABLE: [CpuDynRate; 7] = [
    CpuDynRate::new(24_000_000, 0, 0, 0),
    CpuDynRate::new(100_000_000, 1, 1, 9),
    CpuDynRate::new(250_000_000, 1, 1, 3),
    CpuDynRate::new(500_000_000, 1, 1, 1),
    CpuDynRate::new(666_666_666, 2, 0, 0),
    CpuDynRate::new(1_000_000_000, 1, 0, 0),
    CpuDynRate::new(1_500_000_000, 3, 0, 0),
];

static MPEG_SEL_TABLE: [u32; 3] = [6, 5, 7];

pub(crate) static CLOCKS: [Clock; NR_CLKS] = [
    Clock::fixed(XTAL, "xtal", 24_000_000),
    Clock::pll(
        SYS_PLL,
        "sys_pll",
        &[XTAL],
        Pll::new(
            PllGen::Axg,
            SYS_PLL_CNTL,
            Parm::new(SYS_PLL_CNTL, 0, 9),
            Parm::new(SYS_PLL_CNTL, 9, 5),
            Parm::new(SYS_PLL_CNTL, 16, 2),
        )
        .with_table(&SYS_PLL_TABLE),
    ),
    Clock::pll(
        FIXED_PLL,
        "fixed_pll",
        &[XTAL],
        Pll::new(
            PllGen::Axg,
            FIXED_PLL_CNTL,
            Parm::new(FIXED_PLL_CNTL, 0, 9),
            Parm::new(FIXED_PLL_CNTL, 9, 5),
            Parm::new(FIXED_PLL_CNTL, 16, 2),
        ),
    ),
    Clock::fixed_factor(FCLK_DIV2, "fclk_div2", &[FIXED_PLL], 1, 2),
    Clock::fixed_factor(FCLK_DIV3, "fclk_div3", &[FIXED_PLL], 1, 3),
    Clock::fixed_factor(FCLK_DIV4, "fclk_div4", &[FIXED_PLL], 1, 4),
    Clock::fixed_factor(FCLK_DIV5, "fclk_div5", &[FIXED_PLL], 1, 5),
    Clock::fixed_factor(FCLK_DIV7, "fclk_div7", &[FIXED_PLL], 1, 7),
    Clock::mpll(
        MPLL0,
        "mpll0",
        &[FIXED_PLL],
        Mpll::new(
            Parm::new(MPLL_CNTL7, 0, 14),
            Parm::new(MPLL_CNTL7, 16, 9),
            Parm::bit(MPLL_CNTL7, 15),
            Parm::bit(MPLL_CNTL7, 14),
        ),
    ),
    Clock::fixed(GP1, "gp1_pll", 1_500_000_000),
    Clock::cpu_dyn(
        CPU_DYN,
        "cpu_dyn",
        &[XTAL, FCLK_DIV2, FCLK_DIV3, GP1],
        CpuDyn {
            paths: [
                CpuPath::new(
                    Parm::new(SYS_CPU_CLK_CNTL0, 0, 2),
                    Parm::bit(SYS_CPU_CLK_CNTL0, 2),
                    Parm::new(SYS_CPU_CLK_CNTL0, 4, 6),
                ),
                CpuPath::new(
                    Parm::new(SYS_CPU_CLK_CNTL0, 16, 2),
                    Parm::bit(SYS_CPU_CLK_CNTL0, 18),
                    Parm::new(SYS_CPU_CLK_CNTL0, 20, 6),
                ),
            ],
            select: Parm::bit(SYS_CPU_CLK_CNTL0, 10),
            table: &CPU_DYN_TABLE,
        },
    ),
    Clock::cpu_clock(
        CPU_CLK,
        "cpu_clk",
        &[CPU_DYN, SYS_PLL],
        CpuClock {
            select: Parm::bit(SYS_CPU_CLK_CNTL0, 11),
        },
    )
    .flags(Flags::of(&[Flag::IgnoreUnused])),
    Clock::mux(
        MPEG_SEL,
        "mpeg_clk_sel",
        &[FCLK_DIV7, FCLK_DIV4, FCLK_DIV5],
        Mux::new(MPEG_CLK_CNTL, 12, 3).with_table(&MPEG_SEL_TABLE),
    )
    .flags(Flags::of(&[Flag::MuxReadOnly])),
    Clock::divider(
        MPEG_DIV,
        "mpeg_clk_div",
        &[MPEG_SEL],
        Divider::new(MPEG_CLK_CNTL, 0, 7),
    ),
    Clock::gate(CLK81, "clk81", &[MPEG_DIV], MPEG_CLK_CNTL, 7)
        .flags(Flags::of(&[Flag::IgnoreUnused])),
    Clock::gate(SPICC, "spicc", &[CLK81], GCLK_MPEG0, 8),
    Clock::composite(
        VPU_P0,
        "vpu_0",
        &[FCLK_DIV4, FCLK_DIV3, FCLK_DIV5, FCLK_DIV7],
        Composite::new()
            .with_mux(Mux::new(VPU_CLK_CNTL, 9, 3))
            .with_div(Divider::new(VPU_CLK_CNTL, 0, 7))
            .with_gate(VPU_CLK_CNTL, 8),
    ),
    Clock::composite(
        VPU_P1,
        "vpu_1",
        &[FCLK_DIV4, FCLK_DIV3, FCLK_DIV5, FCLK_DIV7],
        Composite::new()
            .with_mux(Mux::new(VPU_CLK_CNTL, 25, 3))
            .with_div(Divider::new(VPU_CLK_CNTL, 16, 7))
            .with_gate(VPU_CLK_CNTL, 24),
    ),
    Clock::mux(VPU, "vpu", &[VPU_P0, VPU_P1], Mux::new(VPU_CLK_CNTL, 31, 1))
        .flags(Flags::of(&[Flag::ParentAlternate])),
    Clock::gate(AO_UART, "ao_uart", &[XTAL], AO_CLK_GATE0, 3).in_domain(Domain::Ao),
    Clock::mux(
        UART_MUX,
        "uart_sel",
        &[XTAL, FCLK_DIV4, FCLK_DIV5],
        Mux::new(UART_CLK_CNTL, 0, 2),
    ),
    Clock::pll(
        GP0_PLL,
        "gp0_pll",
        &[XTAL],
        Pll::new(
            PllGen::G12a,
            GP0_PLL_CNTL0,
            Parm::new(GP0_PLL_CNTL0, 0, 8),
            Parm::new(GP0_PLL_CNTL0, 10, 5),
            Parm::new(GP0_PLL_CNTL0, 16, 2),
        )
        .with_frac(Parm::new(0x44, 0, 17))
        .with_table(&GP0_PLL_TABLE)
        .with_init(&GP0_PLL_INIT),
    ),
];

/// EE and AO register blocks as firmware leaves them: `fixed_pll` locked at
/// 2 GHz and clk81 running from fclk_div4 / 4.
pub(crate) fn domains() -> [RegisterDomain<Sim>; 2] {
    let mut ee = Sim::new();
    ee.attach_pll(SYS_PLL_CNTL, PllGen::Axg);
    ee.attach_pll(FIXED_PLL_CNTL, PllGen::Axg);
    ee.attach_pll(GP0_PLL_CNTL0, PllGen::G12a);
    ee.poke(FIXED_PLL_CNTL, 250 | 3 << 9 | 1 << 30);
    ee.poke(MPEG_CLK_CNTL, 5 << 12 | 1 << 7 | 3);
    [
        RegisterDomain::new("hhi", ee),
        RegisterDomain::new("ao", Sim::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::SwitchState;
    use crate::errorcode::ClkError;
    use crate::graph::Graph;
    use crate::regs::RegisterPort;

    const PATH0_FIELDS: u32 = 0x3f7;
    const VPU_P0_FIELDS: u32 = 0xfff;

    #[test]
    fn firmware_state_reads_back() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        assert_eq!(graph.get_rate(FIXED_PLL), 2_000_000_000);
        assert_eq!(graph.get_rate(FCLK_DIV3), 666_666_666);
        assert_eq!(graph.get_rate(CLK81), 125_000_000);
        assert_eq!(graph.get_rate(SPICC), 125_000_000);
        assert_eq!(graph.get_rate(CPU_CLK), 24_000_000);
        assert_eq!(graph.get_rate(VPU), 500_000_000);
        assert_eq!(graph.get_rate(SYS_PLL), 0);
        assert_eq!(graph.get_rate(MPLL0), 0);
        assert_eq!(graph.get_rate(ClockId(NR_CLKS)), 0);
    }

    #[test]
    fn sys_pll_792() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        assert_eq!(graph.round_rate(SYS_PLL, 700_000_000), Ok(792_000_000));
        assert_eq!(graph.round_rate(SYS_PLL, 2_000_000_000), Ok(600_000_000));
        assert_eq!(graph.set_rate(SYS_PLL, 792_000_000), Ok(792_000_000));

        let cntl = domains[0].lock().read32(SYS_PLL_CNTL);
        assert_eq!(cntl & 0x1ff, 132);
        assert_eq!(cntl >> 9 & 0x1f, 1);
        assert_eq!(cntl >> 16 & 0x3, 2);
        assert_eq!(cntl >> 29, 0b110);
    }

    #[test]
    fn every_table_rate_round_trips() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        for entry in SYS_PLL_TABLE.iter() {
            domains[0].lock().clear_journal();
            assert_eq!(graph.set_rate(SYS_PLL, entry.rate), Ok(entry.rate));
            assert_eq!(graph.round_rate(SYS_PLL, entry.rate), Ok(entry.rate));
        }
    }

    #[test]
    fn unknown_pll_rate_writes_nothing() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        assert_eq!(graph.set_rate(SYS_PLL, 800_000_000), Err(ClkError::UnknownRate));
        assert_eq!(graph.set_rate(FIXED_PLL, 2_000_000_000), Err(ClkError::ReadOnly));
        assert!(domains[0].lock().journal().is_empty());
        assert_eq!(graph.round_rate(FIXED_PLL, 1), Ok(2_000_000_000));
    }

    #[test]
    fn lock_timeout_retries_once() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();
        domains[0].lock().stall_pll(SYS_PLL_CNTL, true);

        assert_eq!(graph.set_rate(SYS_PLL, 792_000_000), Err(ClkError::LockTimeout));
        {
            let sim = domains[0].lock();
            let releases = sim
                .journal()
                .iter()
                .filter(|w| w.offset == SYS_PLL_CNTL && w.value >> 29 == 0b010)
                .count();
            assert_eq!(releases, 2);
            assert!(sim.elapsed_us() >= 2 * 20_000);
        }
        assert_eq!(graph.get_rate(SYS_PLL), 0);

        domains[0].lock().stall_pll(SYS_PLL_CNTL, false);
        assert_eq!(graph.set_rate(SYS_PLL, 792_000_000), Ok(792_000_000));
    }

    #[test]
    fn first_enable_programs_lowest_entry() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        assert_eq!(graph.enable(SYS_PLL), Ok(()));
        assert_eq!(graph.get_rate(SYS_PLL), 600_000_000);
        assert_eq!(graph.enable_count(SYS_PLL), 1);
        assert_eq!(graph.enable_count(XTAL), 1);
    }

    #[test]
    fn rate_survives_disable_enable() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        graph.enable(SYS_PLL).unwrap();
        assert_eq!(graph.set_rate(SYS_PLL, 1_200_000_000), Ok(1_200_000_000));
        graph.disable(SYS_PLL).unwrap();
        assert_eq!(domains[0].lock().read32(SYS_PLL_CNTL) >> 29, 0b001);
        assert_eq!(graph.enable_count(XTAL), 0);

        graph.enable(SYS_PLL).unwrap();
        assert_eq!(graph.get_rate(SYS_PLL), 1_200_000_000);
        assert_eq!(domains[0].lock().read32(SYS_PLL_CNTL) >> 29, 0b110);
    }

    #[test]
    fn enable_adopts_running_pll() {
        let domains = domains();
        domains[0]
            .lock()
            .poke(SYS_PLL_CNTL, 132 | 1 << 9 | 2 << 16 | 1 << 30);
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        graph.enable(SYS_PLL).unwrap();
        assert!(domains[0].lock().journal().is_empty());
        assert_eq!(graph.get_rate(SYS_PLL), 792_000_000);
    }

    #[test]
    fn init_sequence_precedes_programming() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        assert_eq!(graph.set_rate(GP0_PLL, 903_000_000), Ok(903_000_000));
        let sim = domains[0].lock();
        let journal = sim.journal();
        for (write, init) in journal.iter().zip(GP0_PLL_INIT.iter()) {
            assert_eq!((write.offset, write.value), (init.offset, init.value));
        }
        assert_eq!(journal[GP0_PLL_INIT.len()].offset, GP0_PLL_CNTL0);
        assert_eq!(sim.peek(0x44), 65536);
    }

    #[test]
    fn mpll_hdmi_rate() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        let rate = graph.set_rate(MPLL0, 148_500_000).unwrap();
        assert!(rate.abs_diff(148_500_000) * 16384 <= 148_500_000);
        let reg = domains[0].lock().peek(MPLL_CNTL7);
        assert_eq!(reg & 0x3fff, 7668);
        assert_eq!(reg >> 16 & 0x1ff, 13);
        assert_eq!(reg >> 14 & 0x3, 0b11);
    }

    #[test]
    fn mpll_out_of_range() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        assert_eq!(graph.set_rate(MPLL0, 1_000_000), Err(ClkError::OutOfRange));
        assert!(domains[0].lock().journal().is_empty());
        assert_eq!(graph.round_rate(MPLL0, 1_000_000), Ok(5_000_000));
        assert_eq!(graph.round_rate(MPLL0, 148_500_000), Ok(148_500_000));
    }

    #[test]
    fn mpll_custom_bounds() {
        let domains = [RegisterDomain::new("hhi", Sim::new())];
        let fixed = ClockId(0);
        let mpll = ClockId(1);
        let clocks = [
            Clock::fixed(fixed, "fixed_pll", 2_000_000_000),
            Clock::mpll(
                mpll,
                "mpll_audio",
                &[ClockId(0)],
                Mpll::new(
                    Parm::new(MPLL_CNTL7, 0, 14),
                    Parm::new(MPLL_CNTL7, 16, 9),
                    Parm::bit(MPLL_CNTL7, 15),
                    Parm::bit(MPLL_CNTL7, 14),
                )
                .with_range(10_000_000, 200_000_000),
            ),
        ];
        let graph = Graph::new(&clocks, &domains).unwrap();

        assert_eq!(graph.round_rate(mpll, 5_000_000), Ok(10_000_000));
        assert_eq!(graph.round_rate(mpll, 400_000_000), Ok(200_000_000));
        // Inside the default bounds but above this node's ceiling.
        assert_eq!(graph.set_rate(mpll, 250_000_000), Err(ClkError::OutOfRange));
        assert!(domains[0].lock().journal().is_empty());

        assert_eq!(graph.set_rate(mpll, 200_000_000), Ok(200_000_000));
        let reg = domains[0].lock().peek(MPLL_CNTL7);
        assert_eq!(reg >> 16 & 0x1ff, 10);
        assert_eq!(reg & 0x3fff, 0);
    }

    #[test]
    fn cpu_dyn_programs_idle_path() {
        let domains = domains();
        domains[0].lock().poke(SYS_CPU_CLK_CNTL0, 1);
        let graph = Graph::new(&CLOCKS, &domains).unwrap();
        assert_eq!(graph.get_rate(CPU_DYN), 1_000_000_000);

        assert_eq!(graph.set_rate(CPU_DYN, 1_500_000_000), Ok(1_500_000_000));
        let sim = domains[0].lock();
        let journal = sim.journal();
        assert_eq!(journal.len(), 2);
        for write in journal.iter() {
            assert_eq!(write.offset, SYS_CPU_CLK_CNTL0);
            assert_eq!(write.value & PATH0_FIELDS, 1);
        }
        assert_eq!(journal[0].value & 1 << 10, 0);
        assert_eq!(journal[1].value, 1 | 3 << 16 | 1 << 10);
    }

    #[test]
    fn cpu_dyn_unknown_or_current_rate_writes_nothing() {
        let domains = domains();
        domains[0].lock().poke(SYS_CPU_CLK_CNTL0, 1);
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        assert_eq!(graph.set_rate(CPU_DYN, 123_000_000), Err(ClkError::UnknownRate));
        assert_eq!(graph.set_rate(CPU_DYN, 1_000_000_000), Ok(1_000_000_000));
        assert!(domains[0].lock().journal().is_empty());
        assert_eq!(graph.round_rate(CPU_DYN, 600_000_000), Ok(666_666_666));
    }

    #[test]
    fn switch_protocol_order() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        assert_eq!(graph.end_switch(CPU_CLK), Err(ClkError::InvalidState));
        assert_eq!(graph.begin_switch(CPU_CLK, 500_000_000), Ok(()));
        assert_eq!(graph.switch_state(CPU_CLK), SwitchState::PreSwitch);
        assert_eq!(graph.begin_switch(CPU_CLK, 500_000_000), Err(ClkError::Busy));
        assert_eq!(graph.end_switch(CPU_CLK), Ok(()));
        assert_eq!(graph.switch_state(CPU_CLK), SwitchState::Steady);
        assert_eq!(graph.begin_switch(SPICC, 1), Err(ClkError::NoSupport));
        // Below the mid rate the CPU is never moved.
        assert!(domains[0].lock().journal().is_empty());
    }

    #[test]
    fn switch_parks_above_mid_rate() {
        let domains = domains();
        domains[0].lock().poke(SYS_CPU_CLK_CNTL0, 1 << 11);
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        graph.begin_switch(CPU_CLK, 1_500_000_000).unwrap();
        assert_eq!(graph.get_parent(CPU_CLK), Some(0));
        let parked_at = domains[0].lock().elapsed_us();
        assert!(parked_at >= 100);
        graph.end_switch(CPU_CLK).unwrap();
        assert_eq!(graph.get_parent(CPU_CLK), Some(1));
        assert!(domains[0].lock().elapsed_us() >= parked_at + 100);
    }

    #[test]
    fn cpu_frequency_steps() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        assert_eq!(graph.set_rate(CPU_CLK, 1_500_000_000), Ok(1_500_000_000));
        assert_eq!(graph.parent(CPU_CLK), Some(SYS_PLL));
        assert_eq!(graph.enable_count(SYS_PLL), 1);
        assert_eq!(graph.switch_state(CPU_CLK), SwitchState::Steady);

        assert_eq!(graph.set_rate(CPU_CLK, 500_000_000), Ok(500_000_000));
        assert_eq!(graph.parent(CPU_CLK), Some(CPU_DYN));
        assert_eq!(graph.enable_count(SYS_PLL), 0);
        assert_eq!(graph.round_rate(CPU_CLK, 1_100_000_000), Ok(1_200_000_000));
        assert_eq!(graph.round_rate(CPU_CLK, 400_000_000), Ok(500_000_000));
    }

    #[test]
    fn cpu_step_aborts_on_lock_failure() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        assert_eq!(graph.set_rate(CPU_CLK, 1_200_000_000), Ok(1_200_000_000));
        domains[0].lock().stall_pll(SYS_PLL_CNTL, true);

        assert_eq!(graph.set_rate(CPU_CLK, 1_500_000_000), Err(ClkError::LockTimeout));
        assert_eq!(graph.switch_state(CPU_CLK), SwitchState::Steady);
        assert_eq!(graph.parent(CPU_CLK), Some(CPU_DYN));
        assert_eq!(graph.get_rate(CPU_CLK), 24_000_000);
    }

    #[test]
    fn alternate_mux_flips_after_programming_idle_chain() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();
        graph.enable(VPU).unwrap();
        assert_eq!(graph.enable_count(VPU_P0), 1);
        domains[0].lock().clear_journal();

        assert_eq!(graph.set_rate(VPU, 250_000_000), Ok(250_000_000));
        {
            let sim = domains[0].lock();
            let journal = sim.journal();
            let flip = journal
                .iter()
                .position(|w| w.value & 1 << 31 != 0)
                .unwrap();
            for write in journal[..flip].iter() {
                assert_eq!(write.value & VPU_P0_FIELDS, 1 << 8);
            }
            // The old chain is gated only after the flip.
            assert_eq!(journal.last().unwrap().value & 1 << 8, 0);
            assert!(flip < journal.len() - 1);
        }
        assert_eq!(graph.parent(VPU), Some(VPU_P1));
        assert_eq!(graph.enable_count(VPU_P1), 1);
        assert_eq!(graph.enable_count(VPU_P0), 0);

        domains[0].lock().clear_journal();
        assert_eq!(graph.set_rate(VPU, 250_000_000), Ok(250_000_000));
        assert!(domains[0].lock().journal().is_empty());

        // The idle chain still holds 500 MHz: only the flip is needed.
        assert_eq!(graph.set_rate(VPU, 500_000_000), Ok(500_000_000));
        let sim = domains[0].lock();
        assert_eq!(sim.journal().len(), 3);
        for write in sim.journal().iter() {
            assert_eq!(write.value & 0x7f, 0);
        }
    }

    #[test]
    fn composite_picks_closest_parent() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        assert_eq!(graph.round_rate(VPU_P0, 300_000_000), Ok(285_714_285));
        assert_eq!(graph.set_rate(VPU_P0, 300_000_000), Ok(285_714_285));
        assert_eq!(graph.parent(VPU_P0), Some(FCLK_DIV7));
    }

    #[test]
    fn enable_counts_references() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        graph.enable(SPICC).unwrap();
        graph.enable(SPICC).unwrap();
        assert_eq!(graph.enable_count(SPICC), 2);
        // clk81 is never gated, so it is never referenced either.
        assert_eq!(graph.enable_count(CLK81), 0);
        assert!(graph.is_enabled(CLK81));

        graph.disable(SPICC).unwrap();
        assert_eq!(domains[0].lock().peek(GCLK_MPEG0), 1 << 8);
        graph.disable(SPICC).unwrap();
        assert_eq!(domains[0].lock().peek(GCLK_MPEG0), 0);
        assert!(!graph.is_enabled(SPICC));
        assert_eq!(graph.disable(SPICC), Err(ClkError::Already));
    }

    #[test]
    fn ignore_unused_stays_running() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        graph.enable(CLK81).unwrap();
        graph.disable(CLK81).unwrap();
        assert_eq!(domains[0].lock().peek(MPEG_CLK_CNTL) & 1 << 7, 1 << 7);
    }

    #[test]
    fn gates_in_other_domain() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        graph.enable(AO_UART).unwrap();
        assert_eq!(graph.enable_count(XTAL), 1);
        assert_eq!(domains[1].lock().peek(AO_CLK_GATE0), 1 << 3);
        assert_eq!(domains[0].lock().peek(GP0_PLL_CNTL0), 0);
    }

    #[test]
    fn disable_unused_gates_leftovers() {
        let domains = domains();
        domains[0].lock().poke(GCLK_MPEG0, 1 << 8);
        domains[1].lock().poke(AO_CLK_GATE0, 1 << 3);
        let graph = Graph::new(&CLOCKS, &domains).unwrap();
        graph.enable(AO_UART).unwrap();

        assert_eq!(graph.disable_unused(), 1);
        assert_eq!(domains[0].lock().peek(GCLK_MPEG0), 0);
        assert_eq!(domains[1].lock().peek(AO_CLK_GATE0), 1 << 3);
        assert_eq!(graph.get_rate(CLK81), 125_000_000);
    }

    #[test]
    fn set_parent_moves_references() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        graph.enable(UART_MUX).unwrap();
        assert_eq!(graph.enable_count(XTAL), 1);
        graph.set_parent(UART_MUX, 1).unwrap();
        assert_eq!(graph.get_rate(UART_MUX), 500_000_000);
        assert_eq!(graph.enable_count(FCLK_DIV4), 1);
        // Still referenced through fixed_pll.
        assert_eq!(graph.enable_count(XTAL), 1);
        assert_eq!(graph.enable_count(FIXED_PLL), 1);

        assert_eq!(graph.set_parent(UART_MUX, 3), Err(ClkError::InvalidParentIndex));
        assert_eq!(graph.set_parent(MPEG_SEL, 0), Err(ClkError::ReadOnly));
        assert_eq!(graph.set_parent(SPICC, 0), Err(ClkError::NoSupport));
    }

    #[test]
    fn mux_rate_selects_parent() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        assert_eq!(graph.round_rate(UART_MUX, 450_000_000), Ok(400_000_000));
        assert_eq!(graph.set_rate(UART_MUX, 450_000_000), Ok(400_000_000));
        assert_eq!(graph.get_parent(UART_MUX), Some(2));
        assert_eq!(graph.set_rate(MPEG_SEL, 400_000_000), Err(ClkError::ReadOnly));
    }

    #[test]
    fn passthrough_nodes() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();

        assert_eq!(graph.set_rate(SPICC, 125_000_000), Ok(125_000_000));
        assert_eq!(graph.set_rate(SPICC, 100_000_000), Err(ClkError::NoSupport));
        assert_eq!(graph.set_rate(XTAL, 24_000_000), Ok(24_000_000));
        assert_eq!(graph.round_rate(FCLK_DIV4, 1), Ok(500_000_000));
    }

    #[test]
    fn lookup_and_summary() {
        let domains = domains();
        let graph = Graph::new(&CLOCKS, &domains).unwrap();
        graph.enable(SPICC).unwrap();

        assert_eq!(graph.find("sys_pll"), Some(SYS_PLL));
        assert_eq!(graph.find("nope"), None);
        assert_eq!(graph.name(VPU), Some("vpu"));
        assert_eq!(graph.enable(ClockId(NR_CLKS)), Err(ClkError::InvalidClock));

        let mut lines = 0;
        let mut enabled = 0;
        graph.summary(|line| {
            lines += 1;
            if line.enable_count > 0 {
                enabled += 1;
            }
            if line.id == SPICC {
                assert_eq!(line.rate, 125_000_000);
                assert_eq!(line.parent, Some(CLK81));
            }
        });
        assert_eq!(lines, NR_CLKS);
        assert_eq!(enabled, 1);
    }

    #[test]
    fn validation_errors() {
        let domains = [RegisterDomain::new("hhi", Sim::new())];
        let a = ClockId(0);
        let b = ClockId(1);

        let misplaced = [Clock::fixed(b, "xtal", 24_000_000)];
        assert_eq!(
            Graph::new(&misplaced, &domains).err(),
            Some(ClkError::MisplacedId)
        );

        let duplicate = [
            Clock::fixed(a, "xtal", 24_000_000),
            Clock::fixed(b, "xtal", 24_000_000),
        ];
        assert_eq!(
            Graph::new(&duplicate, &domains).err(),
            Some(ClkError::DuplicateName)
        );

        let dangling = [Clock::gate(a, "g", &[ClockId(5)], 0x140, 0)];
        assert_eq!(
            Graph::new(&dangling, &domains).err(),
            Some(ClkError::DanglingParent)
        );

        let cycle = [
            Clock::gate(a, "a", &[ClockId(1)], 0x140, 0),
            Clock::gate(b, "b", &[ClockId(0)], 0x140, 1),
        ];
        assert_eq!(
            Graph::new(&cycle, &domains).err(),
            Some(ClkError::CycleDetected)
        );

        let missing = [
            Clock::fixed(a, "xtal", 24_000_000),
            Clock::gate(b, "ao", &[ClockId(0)], 0x40, 0).in_domain(Domain::Ao),
        ];
        assert_eq!(
            Graph::new(&missing, &domains).err(),
            Some(ClkError::MissingDomain)
        );

        let zero_div = [
            Clock::fixed(a, "xtal", 24_000_000),
            Clock::fixed_factor(b, "bad", &[ClockId(0)], 1, 0),
        ];
        assert_eq!(
            Graph::new(&zero_div, &domains).err(),
            Some(ClkError::Malformed)
        );

        let lonely_cpu = [
            Clock::fixed(a, "xtal", 24_000_000),
            Clock::cpu_clock(
                b,
                "cpu",
                &[ClockId(0)],
                CpuClock {
                    select: Parm::bit(0x19c, 11),
                },
            ),
        ];
        assert_eq!(
            Graph::new(&lonely_cpu, &domains).err(),
            Some(ClkError::Malformed)
        );
    }

    #[test]
    fn overlapping_pll_fields_are_rejected() {
        let domains = [RegisterDomain::new("hhi", Sim::new())];
        let table = [
            Clock::fixed(ClockId(0), "xtal", 24_000_000),
            Clock::pll(
                ClockId(1),
                "pll",
                &[ClockId(0)],
                Pll::new(
                    PllGen::Legacy,
                    0x300,
                    Parm::new(0x300, 0, 9),
                    Parm::new(0x300, 9, 5),
                    Parm::new(0x300, 10, 2),
                ),
            ),
        ];
        assert_eq!(
            Graph::new(&table, &domains).err(),
            Some(ClkError::Malformed)
        );
    }
}
