// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Clock tree of the Amlogic G12A family (S905D2, S905X2, S905Y2).
//!
//! The G12A PLLs use the second-generation control layout: enable on bit 28
//! and a 17-bit fractional field in the second control word. The media
//! blocks (video decoders, VPU, VAPB) run behind glitch-free alternate muxes,
//! so their rate changes program the idle chain and then flip.
//!
//! ```rust,ignore
//! // SAFETY: `HHI_BASE` maps the HHI block and nothing else aliases it.
//! let hhi = unsafe { MmioPort::new(HHI_BASE as *mut u32, &TIMER) };
//! let domains = [RegisterDomain::new("hhi", hhi)];
//! let clocks = meson_g12a::graph(&domains)?;
//! clocks.set_rate(meson_g12a::VDEC, 400_000_000)?;
//! clocks.enable(meson_g12a::VDEC)?;
//! ```

#![crate_name = "meson_g12a"]
#![crate_type = "rlib"]
#![no_std]

use log::info;
use meson::composite::Composite;
use meson::cpu::{CpuClock, CpuDyn, CpuDynRate, CpuPath};
use meson::divider::Divider;
use meson::mpll::Mpll;
use meson::mux::Mux;
use meson::pll::{Pll, PllGen, PllRate};
use meson::{
    ClkError, Clock, ClockId, Flag, Flags, Graph, Parm, RegInit, RegisterDomain, RegisterPort,
};

// HHI register offsets
const GP0_PLL_CNTL0: usize = 0x40;
const GP0_PLL_CNTL1: usize = 0x44;
const GP0_PLL_CNTL2: usize = 0x48;
const GP0_PLL_CNTL3: usize = 0x4c;
const GP0_PLL_CNTL4: usize = 0x50;
const GP0_PLL_CNTL5: usize = 0x54;
const GP0_PLL_CNTL6: usize = 0x58;
const GCLK_MPEG0: usize = 0x140;
const GCLK_MPEG1: usize = 0x144;
const GCLK_MPEG2: usize = 0x148;
const MPEG_CLK_CNTL: usize = 0x174;
const SYS_CPU_CLK_CNTL0: usize = 0x19c;
const VPU_CLKC_CNTL: usize = 0x1b4;
const VPU_CLK_CNTL: usize = 0x1bc;
const VDEC_CLK_CNTL: usize = 0x1e0;
const VDEC2_CLK_CNTL: usize = 0x1e4;
const VDEC3_CLK_CNTL: usize = 0x1e8;
const VDEC4_CLK_CNTL: usize = 0x1ec;
const VAPBCLK_CNTL: usize = 0x1f4;
const BT656_CLK_CNTL: usize = 0x1f8;
const VPU_CLKB_CNTL: usize = 0x20c;
const VDIN_MEAS_CLK_CNTL: usize = 0x250;
const MPLL_CNTL1: usize = 0x27c;
const MPLL_CNTL3: usize = 0x284;
const MPLL_CNTL5: usize = 0x28c;
const MPLL_CNTL7: usize = 0x294;
const FIX_PLL_CNTL0: usize = 0x2a0;
const FIX_PLL_CNTL1: usize = 0x2a4;
const HIFI_PLL_CNTL0: usize = 0x2d8;
const HIFI_PLL_CNTL1: usize = 0x2dc;
const HIFI_PLL_CNTL2: usize = 0x2e0;
const HIFI_PLL_CNTL3: usize = 0x2e4;
const HIFI_PLL_CNTL4: usize = 0x2e8;
const HIFI_PLL_CNTL5: usize = 0x2ec;
const HIFI_PLL_CNTL6: usize = 0x2f0;
const SYS_PLL_CNTL0: usize = 0x2f4;

pub const XTAL: ClockId = ClockId(0);
/// Tied-off mux input.
pub const NULL: ClockId = ClockId(1);
pub const SYS_PLL: ClockId = ClockId(2);
pub const FIXED_PLL: ClockId = ClockId(3);
pub const FCLK_DIV2: ClockId = ClockId(4);
pub const FCLK_DIV2P5: ClockId = ClockId(5);
pub const FCLK_DIV3: ClockId = ClockId(6);
pub const FCLK_DIV4: ClockId = ClockId(7);
pub const FCLK_DIV5: ClockId = ClockId(8);
pub const FCLK_DIV7: ClockId = ClockId(9);
pub const GP0_PLL: ClockId = ClockId(10);
pub const HIFI_PLL: ClockId = ClockId(11);
pub const MPLL0: ClockId = ClockId(12);
pub const MPLL1: ClockId = ClockId(13);
pub const MPLL2: ClockId = ClockId(14);
pub const MPLL3: ClockId = ClockId(15);
pub const MPEG_SEL: ClockId = ClockId(16);
pub const MPEG_DIV: ClockId = ClockId(17);
pub const CLK81: ClockId = ClockId(18);
pub const CPU_FIXEDPLL: ClockId = ClockId(19);
pub const CPU_CLK: ClockId = ClockId(20);

// Media clocks
pub const VDEC_P0: ClockId = ClockId(21);
pub const VDEC_P1: ClockId = ClockId(22);
pub const VDEC: ClockId = ClockId(23);
pub const HCODEC_P0: ClockId = ClockId(24);
pub const HCODEC_P1: ClockId = ClockId(25);
pub const HCODEC: ClockId = ClockId(26);
pub const HEVC_P0: ClockId = ClockId(27);
pub const HEVC_P1: ClockId = ClockId(28);
pub const HEVC: ClockId = ClockId(29);
pub const HEVCF_P0: ClockId = ClockId(30);
pub const HEVCF_P1: ClockId = ClockId(31);
pub const HEVCF: ClockId = ClockId(32);
pub const VPU_P0: ClockId = ClockId(33);
pub const VPU_P1: ClockId = ClockId(34);
pub const VPU: ClockId = ClockId(35);
pub const VAPB_P0: ClockId = ClockId(36);
pub const VAPB_P1: ClockId = ClockId(37);
pub const VAPB: ClockId = ClockId(38);
pub const VPU_CLKC_P0: ClockId = ClockId(39);
pub const VPU_CLKC_P1: ClockId = ClockId(40);
pub const VPU_CLKC: ClockId = ClockId(41);
pub const GE2D: ClockId = ClockId(42);
pub const VPU_CLKB_TMP: ClockId = ClockId(43);
pub const VPU_CLKB: ClockId = ClockId(44);
pub const BT656: ClockId = ClockId(45);
pub const DSI_MEAS: ClockId = ClockId(46);

// EE gates, all fed by clk81
pub const DDR: ClockId = ClockId(47);
pub const DOS: ClockId = ClockId(48);
pub const SPICC0: ClockId = ClockId(49);
pub const I2C: ClockId = ClockId(50);
pub const UART0: ClockId = ClockId(51);
pub const SPICC1: ClockId = ClockId(52);
pub const EMMC_A: ClockId = ClockId(53);
pub const EMMC_B: ClockId = ClockId(54);
pub const EMMC_C: ClockId = ClockId(55);
pub const AUDIO: ClockId = ClockId(56);
pub const ETH_CORE: ClockId = ClockId(57);
pub const UART1: ClockId = ClockId(58);
pub const USB_GENERAL: ClockId = ClockId(59);
pub const AHB_ARB0: ClockId = ClockId(60);
pub const MMC_PCLK: ClockId = ClockId(61);
pub const UART2: ClockId = ClockId(62);
pub const VPU_INTR: ClockId = ClockId(63);
pub const GIC: ClockId = ClockId(64);

pub const NR_CLKS: usize = 65;

const XTAL_RATE: u64 = 24_000_000;

pub static SYS_PLL_TABLE: [PllRate; 10] = [
    PllRate::new(1_008_000_000, 168, 1, 2),
    PllRate::new(1_104_000_000, 184, 1, 2),
    PllRate::new(1_200_000_000, 200, 1, 2),
    PllRate::new(1_296_000_000, 216, 1, 2),
    PllRate::new(1_398_000_000, 233, 1, 2),
    PllRate::new(1_512_000_000, 126, 1, 1),
    PllRate::new(1_608_000_000, 134, 1, 1),
    PllRate::new(1_704_000_000, 142, 1, 1),
    PllRate::new(1_800_000_000, 150, 1, 1),
    PllRate::new(1_908_000_000, 159, 1, 1),
];

pub static GP0_PLL_TABLE: [PllRate; 5] = [
    PllRate::new(504_000_000, 168, 1, 3),
    PllRate::new(792_000_000, 132, 1, 2),
    PllRate::new(846_000_000, 141, 1, 2),
    PllRate::new(903_000_000, 150, 1, 2).with_frac(65536),
    PllRate::new(1_200_000_000, 200, 1, 2),
];

pub static GP0_PLL_INIT: [RegInit; 6] = [
    RegInit::new(GP0_PLL_CNTL1, 0x0000_0000),
    RegInit::new(GP0_PLL_CNTL2, 0x0000_0000),
    RegInit::new(GP0_PLL_CNTL3, 0x4868_1c00),
    RegInit::new(GP0_PLL_CNTL4, 0x3377_1290),
    RegInit::new(GP0_PLL_CNTL5, 0x3927_2000),
    RegInit::new(GP0_PLL_CNTL6, 0x5654_0000),
];

pub static HIFI_PLL_TABLE: [PllRate; 2] = [
    PllRate::new(1_179_000_000, 98, 1, 1).with_frac(32768),
    PllRate::new(1_536_000_000, 128, 1, 1),
];

pub static HIFI_PLL_INIT: [RegInit; 6] = [
    RegInit::new(HIFI_PLL_CNTL1, 0x0000_0000),
    RegInit::new(HIFI_PLL_CNTL2, 0x0000_0000),
    RegInit::new(HIFI_PLL_CNTL3, 0x6a28_5c00),
    RegInit::new(HIFI_PLL_CNTL4, 0x6577_1290),
    RegInit::new(HIFI_PLL_CNTL5, 0x3927_2000),
    RegInit::new(HIFI_PLL_CNTL6, 0x5654_0000),
];

pub static CPU_FIXEDPLL_TABLE: [CpuDynRate; 7] = [
    CpuDynRate::new(24_000_000, 0, 0, 0),
    CpuDynRate::new(100_000_000, 1, 1, 9),
    CpuDynRate::new(250_000_000, 1, 1, 3),
    CpuDynRate::new(333_333_333, 2, 1, 1),
    CpuDynRate::new(500_000_000, 1, 1, 1),
    CpuDynRate::new(666_666_666, 2, 0, 0),
    CpuDynRate::new(1_000_000_000, 1, 0, 0),
];

/// Raw selector values of the wired clk81 inputs; 1 is tied low.
static MPEG_SEL_TABLE: [u32; 7] = [0, 2, 3, 4, 5, 6, 7];

const XTAL_IN: &[ClockId] = &[XTAL];
const FIXED_PLL_OUT: &[ClockId] = &[FIXED_PLL];
const CLK81_OUT: &[ClockId] = &[CLK81];

const MEAS_PARENTS: &[ClockId] = &[
    XTAL, FCLK_DIV4, FCLK_DIV3, FCLK_DIV5, NULL, NULL, FCLK_DIV2, FCLK_DIV7,
];
const DEC_PARENTS: &[ClockId] = &[
    FCLK_DIV2P5,
    FCLK_DIV3,
    FCLK_DIV4,
    FCLK_DIV5,
    FCLK_DIV7,
    HIFI_PLL,
    GP0_PLL,
    XTAL,
];
const VPU_PARENTS: &[ClockId] =
    &[FCLK_DIV3, FCLK_DIV4, FCLK_DIV5, FCLK_DIV7, NULL, NULL, NULL, NULL];
const VAPB_PARENTS: &[ClockId] = &[
    FCLK_DIV4,
    FCLK_DIV3,
    FCLK_DIV5,
    FCLK_DIV7,
    MPLL1,
    NULL,
    MPLL2,
    FCLK_DIV2P5,
];
const VPU_CLKC_PARENTS: &[ClockId] =
    &[FCLK_DIV4, FCLK_DIV3, FCLK_DIV5, FCLK_DIV7, NULL, NULL, NULL, NULL];

const PLL_FLAGS: Flags = Flags::of(&[Flag::GetRateNoCache]);
const CPU_FLAGS: Flags = Flags::of(&[Flag::GetRateNoCache, Flag::IgnoreUnused]);
const MEDIA_FLAGS: Flags = Flags::of(&[Flag::GetRateNoCache]);
const ALTERNATE_FLAGS: Flags = Flags::of(&[Flag::ParentAlternate, Flag::GetRateNoCache]);

const fn g12a_pll(cntl0: usize, cntl1: usize) -> Pll {
    Pll::new(
        PllGen::G12a,
        cntl0,
        Parm::new(cntl0, 0, 8),
        Parm::new(cntl0, 10, 5),
        Parm::new(cntl0, 16, 3),
    )
    .with_frac(Parm::new(cntl1, 0, 17))
}

const fn mpll(cntl: usize) -> Mpll {
    Mpll::new(
        Parm::new(cntl, 0, 14),
        Parm::new(cntl, 20, 9),
        Parm::bit(cntl, 30),
        Parm::bit(cntl, 31),
    )
}

/// Mux, divider and gate of one media chain. The low chain of a register
/// sits at bits 0..=9, the high chain at bits 16..=25.
const fn media(offset: usize, high: bool) -> Composite {
    let base = if high { 16 } else { 0 };
    Composite::new()
        .with_mux(Mux::new(offset, base + 9, 3))
        .with_div(Divider::new(offset, base, 7))
        .with_gate(offset, base + 8)
}

pub static CLOCKS: [Clock; NR_CLKS] = [
    Clock::fixed(XTAL, "xtal", XTAL_RATE),
    Clock::fixed(NULL, "null", 0),
    Clock::pll(
        SYS_PLL,
        "sys_pll",
        XTAL_IN,
        g12a_pll(SYS_PLL_CNTL0, SYS_PLL_CNTL0 + 4).with_table(&SYS_PLL_TABLE),
    )
    .flags(PLL_FLAGS),
    Clock::pll(
        FIXED_PLL,
        "fixed_pll",
        XTAL_IN,
        g12a_pll(FIX_PLL_CNTL0, FIX_PLL_CNTL1),
    )
    .flags(PLL_FLAGS),
    Clock::fixed_factor(FCLK_DIV2, "fclk_div2", FIXED_PLL_OUT, 1, 2),
    Clock::fixed_factor(FCLK_DIV2P5, "fclk_div2p5", FIXED_PLL_OUT, 2, 5),
    Clock::fixed_factor(FCLK_DIV3, "fclk_div3", FIXED_PLL_OUT, 1, 3),
    Clock::fixed_factor(FCLK_DIV4, "fclk_div4", FIXED_PLL_OUT, 1, 4),
    Clock::fixed_factor(FCLK_DIV5, "fclk_div5", FIXED_PLL_OUT, 1, 5),
    Clock::fixed_factor(FCLK_DIV7, "fclk_div7", FIXED_PLL_OUT, 1, 7),
    Clock::pll(
        GP0_PLL,
        "gp0_pll",
        XTAL_IN,
        g12a_pll(GP0_PLL_CNTL0, GP0_PLL_CNTL1)
            .with_table(&GP0_PLL_TABLE)
            .with_init(&GP0_PLL_INIT),
    )
    .flags(PLL_FLAGS),
    Clock::pll(
        HIFI_PLL,
        "hifi_pll",
        XTAL_IN,
        g12a_pll(HIFI_PLL_CNTL0, HIFI_PLL_CNTL1)
            .with_table(&HIFI_PLL_TABLE)
            .with_init(&HIFI_PLL_INIT),
    )
    .flags(PLL_FLAGS),
    Clock::mpll(MPLL0, "mpll0", FIXED_PLL_OUT, mpll(MPLL_CNTL1)),
    Clock::mpll(MPLL1, "mpll1", FIXED_PLL_OUT, mpll(MPLL_CNTL3)),
    Clock::mpll(MPLL2, "mpll2", FIXED_PLL_OUT, mpll(MPLL_CNTL5)),
    Clock::mpll(MPLL3, "mpll3", FIXED_PLL_OUT, mpll(MPLL_CNTL7)),
    Clock::mux(
        MPEG_SEL,
        "mpeg_clk_sel",
        &[XTAL, FCLK_DIV7, MPLL1, MPLL2, FCLK_DIV4, FCLK_DIV3, FCLK_DIV5],
        Mux::new(MPEG_CLK_CNTL, 12, 3).with_table(&MPEG_SEL_TABLE),
    )
    .flags(Flags::of(&[Flag::MuxReadOnly, Flag::IgnoreUnused])),
    Clock::divider(
        MPEG_DIV,
        "mpeg_clk_div",
        &[MPEG_SEL],
        Divider::new(MPEG_CLK_CNTL, 0, 7),
    )
    .flags(Flags::of(&[Flag::SetRateParent, Flag::IgnoreUnused])),
    Clock::gate(CLK81, "clk81", &[MPEG_DIV], MPEG_CLK_CNTL, 7)
        .flags(Flags::of(&[Flag::SetRateParent, Flag::IgnoreUnused])),
    Clock::cpu_dyn(
        CPU_FIXEDPLL,
        "cpu_fixedpll_p",
        &[XTAL, FCLK_DIV2, FCLK_DIV3],
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
            table: &CPU_FIXEDPLL_TABLE,
        },
    )
    .flags(CPU_FLAGS),
    Clock::cpu_clock(
        CPU_CLK,
        "cpu_clk",
        &[CPU_FIXEDPLL, SYS_PLL],
        CpuClock {
            select: Parm::bit(SYS_CPU_CLK_CNTL0, 11),
        },
    )
    .flags(CPU_FLAGS),
    // Video decoder
    Clock::composite(VDEC_P0, "vdec_p0_composite", DEC_PARENTS, media(VDEC_CLK_CNTL, false))
        .flags(MEDIA_FLAGS),
    Clock::composite(VDEC_P1, "vdec_p1_composite", DEC_PARENTS, media(VDEC3_CLK_CNTL, false))
        .flags(MEDIA_FLAGS),
    Clock::mux(VDEC, "vdec_mux", &[VDEC_P0, VDEC_P1], Mux::new(VDEC3_CLK_CNTL, 15, 1))
        .flags(ALTERNATE_FLAGS),
    Clock::composite(HCODEC_P0, "hcodec_p0_composite", DEC_PARENTS, media(VDEC_CLK_CNTL, true))
        .flags(MEDIA_FLAGS),
    Clock::composite(HCODEC_P1, "hcodec_p1_composite", DEC_PARENTS, media(VDEC3_CLK_CNTL, true))
        .flags(MEDIA_FLAGS),
    Clock::mux(HCODEC, "hcodec_mux", &[HCODEC_P0, HCODEC_P1], Mux::new(VDEC3_CLK_CNTL, 31, 1))
        .flags(ALTERNATE_FLAGS),
    Clock::composite(HEVC_P0, "hevc_p0_composite", DEC_PARENTS, media(VDEC2_CLK_CNTL, true))
        .flags(MEDIA_FLAGS),
    Clock::composite(HEVC_P1, "hevc_p1_composite", DEC_PARENTS, media(VDEC4_CLK_CNTL, true))
        .flags(MEDIA_FLAGS),
    Clock::mux(HEVC, "hevc_mux", &[HEVC_P0, HEVC_P1], Mux::new(VDEC4_CLK_CNTL, 31, 1))
        .flags(ALTERNATE_FLAGS),
    Clock::composite(HEVCF_P0, "hevcf_p0_composite", DEC_PARENTS, media(VDEC2_CLK_CNTL, false))
        .flags(MEDIA_FLAGS),
    Clock::composite(HEVCF_P1, "hevcf_p1_composite", DEC_PARENTS, media(VDEC4_CLK_CNTL, false))
        .flags(MEDIA_FLAGS),
    Clock::mux(HEVCF, "hevcf_mux", &[HEVCF_P0, HEVCF_P1], Mux::new(VDEC4_CLK_CNTL, 15, 1))
        .flags(ALTERNATE_FLAGS),
    // Video processing unit
    Clock::composite(VPU_P0, "vpu_p0_composite", VPU_PARENTS, media(VPU_CLK_CNTL, false))
        .flags(MEDIA_FLAGS),
    Clock::composite(VPU_P1, "vpu_p1_composite", VPU_PARENTS, media(VPU_CLK_CNTL, true))
        .flags(MEDIA_FLAGS),
    Clock::mux(VPU, "vpu_mux", &[VPU_P0, VPU_P1], Mux::new(VPU_CLK_CNTL, 31, 1))
        .flags(ALTERNATE_FLAGS),
    Clock::composite(VAPB_P0, "vapb_p0_composite", VAPB_PARENTS, media(VAPBCLK_CNTL, false))
        .flags(MEDIA_FLAGS),
    Clock::composite(VAPB_P1, "vapb_p1_composite", VAPB_PARENTS, media(VAPBCLK_CNTL, true))
        .flags(MEDIA_FLAGS),
    Clock::mux(VAPB, "vapb_mux", &[VAPB_P0, VAPB_P1], Mux::new(VAPBCLK_CNTL, 31, 1))
        .flags(ALTERNATE_FLAGS),
    Clock::composite(
        VPU_CLKC_P0,
        "vpu_clkc_p0_composite",
        VPU_CLKC_PARENTS,
        media(VPU_CLKC_CNTL, false),
    )
    .flags(MEDIA_FLAGS),
    Clock::composite(
        VPU_CLKC_P1,
        "vpu_clkc_p1_composite",
        VPU_CLKC_PARENTS,
        media(VPU_CLKC_CNTL, true),
    )
    .flags(MEDIA_FLAGS),
    Clock::mux(
        VPU_CLKC,
        "vpu_clkc_mux",
        &[VPU_CLKC_P0, VPU_CLKC_P1],
        Mux::new(VPU_CLKC_CNTL, 31, 1),
    )
    .flags(ALTERNATE_FLAGS),
    Clock::gate(GE2D, "ge2d_gate", &[VAPB], VAPBCLK_CNTL, 30).flags(MEDIA_FLAGS),
    Clock::composite(
        VPU_CLKB_TMP,
        "vpu_clkb_tmp_composite",
        &[VPU, FCLK_DIV4, FCLK_DIV5, FCLK_DIV7],
        Composite::new()
            .with_mux(Mux::new(VPU_CLKB_CNTL, 20, 2))
            .with_div(Divider::new(VPU_CLKB_CNTL, 16, 4))
            .with_gate(VPU_CLKB_CNTL, 24),
    )
    .flags(MEDIA_FLAGS),
    Clock::composite(
        VPU_CLKB,
        "vpu_clkb_composite",
        &[VPU_CLKB_TMP],
        Composite::new()
            .with_div(Divider::new(VPU_CLKB_CNTL, 0, 8))
            .with_gate(VPU_CLKB_CNTL, 8),
    )
    .flags(MEDIA_FLAGS),
    Clock::composite(
        BT656,
        "bt656_composite",
        &[FCLK_DIV2, FCLK_DIV3, FCLK_DIV5, FCLK_DIV7],
        Composite::new()
            .with_mux(Mux::new(BT656_CLK_CNTL, 9, 2))
            .with_div(Divider::new(BT656_CLK_CNTL, 0, 7))
            .with_gate(BT656_CLK_CNTL, 7),
    )
    .flags(MEDIA_FLAGS),
    Clock::composite(
        DSI_MEAS,
        "dsi_meas_composite",
        MEAS_PARENTS,
        Composite::new()
            .with_mux(Mux::new(VDIN_MEAS_CLK_CNTL, 21, 3))
            .with_div(Divider::new(VDIN_MEAS_CLK_CNTL, 12, 7))
            .with_gate(VDIN_MEAS_CLK_CNTL, 20),
    )
    .flags(MEDIA_FLAGS),
    // Peripheral gates
    Clock::gate(DDR, "ddr", CLK81_OUT, GCLK_MPEG0, 0),
    Clock::gate(DOS, "dos", CLK81_OUT, GCLK_MPEG0, 1),
    Clock::gate(SPICC0, "spicc_0", CLK81_OUT, GCLK_MPEG0, 8),
    Clock::gate(I2C, "i2c", CLK81_OUT, GCLK_MPEG0, 9),
    Clock::gate(UART0, "uart0", CLK81_OUT, GCLK_MPEG0, 13),
    Clock::gate(SPICC1, "spicc_1", CLK81_OUT, GCLK_MPEG0, 14),
    Clock::gate(EMMC_A, "emmc_a", CLK81_OUT, GCLK_MPEG0, 24),
    Clock::gate(EMMC_B, "emmc_b", CLK81_OUT, GCLK_MPEG0, 25),
    Clock::gate(EMMC_C, "emmc_c", CLK81_OUT, GCLK_MPEG0, 26),
    Clock::gate(AUDIO, "audio", CLK81_OUT, GCLK_MPEG1, 0),
    Clock::gate(ETH_CORE, "eth_core", CLK81_OUT, GCLK_MPEG1, 3),
    Clock::gate(UART1, "uart1", CLK81_OUT, GCLK_MPEG1, 16),
    Clock::gate(USB_GENERAL, "usb_general", CLK81_OUT, GCLK_MPEG1, 26),
    Clock::gate(AHB_ARB0, "ahb_arb0", CLK81_OUT, GCLK_MPEG1, 29),
    Clock::gate(MMC_PCLK, "mmc_pclk", CLK81_OUT, GCLK_MPEG2, 11),
    Clock::gate(UART2, "uart2", CLK81_OUT, GCLK_MPEG2, 15),
    Clock::gate(VPU_INTR, "vpu_intr", CLK81_OUT, GCLK_MPEG2, 25),
    Clock::gate(GIC, "gic", CLK81_OUT, GCLK_MPEG2, 30),
];

/// Validate the G12A table against `domains` (HHI only) and build the clock
/// graph.
pub fn graph<P: RegisterPort>(
    domains: &[RegisterDomain<P>],
) -> Result<Graph<'_, P, NR_CLKS>, ClkError> {
    let graph = Graph::new(&CLOCKS, domains)?;
    info!("g12a: {} clocks registered", NR_CLKS);
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meson::sim::RegisterImage;

    type Sim = RegisterImage<0x100>;

    /// HHI as firmware leaves it: `fixed_pll` locked at 2 GHz and clk81
    /// running from fclk_div3 / 4.
    fn domains() -> [RegisterDomain<Sim>; 1] {
        let mut hhi = Sim::new();
        for cntl in [SYS_PLL_CNTL0, GP0_PLL_CNTL0, HIFI_PLL_CNTL0, FIX_PLL_CNTL0] {
            hhi.attach_pll(cntl, PllGen::G12a);
        }
        hhi.poke(FIX_PLL_CNTL0, 250 | 3 << 10 | 1 << 28);
        hhi.poke(MPEG_CLK_CNTL, 6 << 12 | 1 << 7 | 3);
        [RegisterDomain::new("hhi", hhi)]
    }

    #[test]
    fn firmware_state() {
        let domains = domains();
        let graph = graph(&domains).unwrap();

        assert_eq!(graph.get_rate(FIXED_PLL), 2_000_000_000);
        assert_eq!(graph.get_rate(FCLK_DIV2P5), 800_000_000);
        assert_eq!(graph.get_rate(CLK81), 166_666_667);
        assert_eq!(graph.get_rate(NULL), 0);
        assert_eq!(graph.get_rate(CPU_CLK), XTAL_RATE);
        // Both chains reset to fclk_div2p5, undivided.
        assert_eq!(graph.get_rate(VDEC), 800_000_000);
        assert_eq!(graph.get_parent(VDEC), Some(0));
    }

    #[test]
    fn every_table_rate_reads_back() {
        let domains = domains();
        let graph = graph(&domains).unwrap();

        let tables: [(ClockId, &[PllRate]); 3] = [
            (SYS_PLL, &SYS_PLL_TABLE),
            (GP0_PLL, &GP0_PLL_TABLE),
            (HIFI_PLL, &HIFI_PLL_TABLE),
        ];
        for (id, table) in tables {
            for entry in table.iter() {
                domains[0].lock().clear_journal();
                assert_eq!(graph.round_rate(id, entry.rate), Ok(entry.rate));
                assert_eq!(graph.set_rate(id, entry.rate), Ok(entry.rate));
            }
        }
        assert_eq!(graph.set_rate(FIXED_PLL, 1_000_000_000), Err(ClkError::ReadOnly));
    }

    #[test]
    fn gp0_fraction_uses_wide_field() {
        let domains = domains();
        let graph = graph(&domains).unwrap();

        assert_eq!(graph.set_rate(GP0_PLL, 903_000_000), Ok(903_000_000));
        let sim = domains[0].lock();
        // The init sequence clears CNTL1 before the fraction is written.
        assert_eq!(sim.journal()[0].offset, GP0_PLL_CNTL1);
        assert_eq!(sim.peek(GP0_PLL_CNTL1) & 0x1_ffff, 65536);
        assert_eq!(sim.peek(GP0_PLL_CNTL0) & 0xff, 150);
    }

    #[test]
    fn cpu_runs_from_sys_pll_above_1ghz() {
        let domains = domains();
        let graph = graph(&domains).unwrap();

        assert_eq!(graph.set_rate(CPU_CLK, 1_512_000_000), Ok(1_512_000_000));
        assert_eq!(graph.parent(CPU_CLK), Some(SYS_PLL));
        assert_eq!(
            domains[0].lock().peek(SYS_PLL_CNTL0),
            126 | 1 << 10 | 1 << 16 | 1 << 28
        );

        assert_eq!(graph.set_rate(CPU_CLK, 500_000_000), Ok(500_000_000));
        assert_eq!(graph.parent(CPU_CLK), Some(CPU_FIXEDPLL));
        assert_eq!(domains[0].lock().peek(SYS_PLL_CNTL0) >> 28, 0b0010);
    }

    #[test]
    fn mpll_enable_bits_on_top() {
        let domains = domains();
        let graph = graph(&domains).unwrap();

        assert_eq!(graph.set_rate(MPLL1, 50_000_000), Ok(50_000_000));
        assert_eq!(domains[0].lock().peek(MPLL_CNTL3), 40 << 20 | 1 << 30 | 1 << 31);
        assert_eq!(domains[0].lock().peek(MPLL_CNTL1), 0);
    }

    #[test]
    fn vdec_programs_idle_chain_then_flips() {
        let domains = domains();
        let graph = graph(&domains).unwrap();
        domains[0].lock().clear_journal();

        assert_eq!(graph.set_rate(VDEC, 400_000_000), Ok(400_000_000));
        assert_eq!(graph.get_parent(VDEC), Some(1));
        assert_eq!(graph.parent(VDEC_P1), Some(FCLK_DIV2P5));

        let sim = domains[0].lock();
        assert!(sim.journal().iter().all(|w| w.offset == VDEC3_CLK_CNTL));
        assert_eq!(sim.journal().last().map(|w| w.value), Some(1 << 15 | 1));
        assert_eq!(sim.peek(VDEC_CLK_CNTL), 0);
    }

    #[test]
    fn vdec_idle_chain_already_at_rate() {
        let domains = domains();
        domains[0].lock().poke(VDEC3_CLK_CNTL, 3 << 9);
        let graph = graph(&domains).unwrap();

        // p1 already runs fclk_div5.
        assert_eq!(graph.get_rate(VDEC_P1), 400_000_000);
        domains[0].lock().clear_journal();
        assert_eq!(graph.set_rate(VDEC, 400_000_000), Ok(400_000_000));
        assert_eq!(domains[0].lock().journal().len(), 1);
        assert_eq!(domains[0].lock().peek(VDEC3_CLK_CNTL), 1 << 15 | 3 << 9);

        // Same rate again is a no-op.
        domains[0].lock().clear_journal();
        assert_eq!(graph.set_rate(VDEC, 400_000_000), Ok(400_000_000));
        assert!(domains[0].lock().journal().is_empty());
    }

    #[test]
    fn ge2d_enables_vapb_chain() {
        let domains = domains();
        let graph = graph(&domains).unwrap();

        graph.enable(GE2D).unwrap();
        assert_eq!(domains[0].lock().peek(VAPBCLK_CNTL), 1 << 30 | 1 << 8);
        assert_eq!(graph.enable_count(VAPB_P0), 1);
        assert_eq!(graph.enable_count(FCLK_DIV4), 1);
        assert_eq!(graph.get_rate(GE2D), 500_000_000);

        graph.disable(GE2D).unwrap();
        assert_eq!(domains[0].lock().peek(VAPBCLK_CNTL), 0);
        assert_eq!(graph.enable_count(FCLK_DIV4), 0);
    }

    #[test]
    fn vpu_clkb_chain() {
        let domains = domains();
        domains[0].lock().poke(VPU_CLKB_CNTL, 1 << 20 | 1 << 16 | 1);
        let graph = graph(&domains).unwrap();

        assert_eq!(graph.get_rate(VPU_CLKB_TMP), 250_000_000);
        assert_eq!(graph.get_rate(VPU_CLKB), 125_000_000);
    }

    #[test]
    fn null_inputs_are_never_chosen() {
        let domains = domains();
        let graph = graph(&domains).unwrap();

        assert_eq!(graph.set_rate(DSI_MEAS, 1_000_000_000), Ok(1_000_000_000));
        assert_eq!(graph.parent(DSI_MEAS), Some(FCLK_DIV2));
        // Below every setting: fclk_div7 / 128 is the slowest input.
        assert_eq!(graph.round_rate(VPU_P0, 1_000), Ok(2_232_143));
    }
}
