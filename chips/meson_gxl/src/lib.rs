// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Clock tree of the Amlogic GXL family (S905X, S905D, S805X).
//!
//! All clocks live in the HHI register block. `fixed_pll` and `hdmi_pll`
//! are owned by firmware; `sys_pll` feeds the CPU through the final CPU mux
//! and clk81 is the peripheral bus clock every gate hangs off.

#![crate_name = "meson_gxl"]
#![crate_type = "rlib"]
#![no_std]

use log::info;
use meson::cpu::{CpuClock, CpuDyn, CpuDynRate, CpuPath};
use meson::divider::Divider;
use meson::mpll::Mpll;
use meson::mux::Mux;
use meson::pll::{Pll, PllGen, PllRate};
use meson::{
    ClkError, Clock, ClockId, Flag, Flags, Graph, Parm, RegInit, RegisterDomain, RegisterPort,
};

// HHI register offsets
const GP0_PLL_CNTL: usize = 0x40;
const GP0_PLL_CNTL2: usize = 0x44;
const GP0_PLL_CNTL3: usize = 0x48;
const GP0_PLL_CNTL4: usize = 0x4c;
const GP0_PLL_CNTL5: usize = 0x50;
const GP0_PLL_CNTL1: usize = 0x58;
const GCLK_MPEG0: usize = 0x140;
const GCLK_MPEG1: usize = 0x144;
const GCLK_MPEG2: usize = 0x148;
const GCLK_OTHER: usize = 0x150;
const GCLK_AO: usize = 0x154;
const MPEG_CLK_CNTL: usize = 0x174;
const SYS_CPU_CLK_CNTL0: usize = 0x19c;
const MPLL_CNTL: usize = 0x280;
const MPLL_CNTL7: usize = 0x298;
const MPLL_CNTL8: usize = 0x29c;
const MPLL_CNTL9: usize = 0x2a0;
const MPLL3_CNTL0: usize = 0x2e0;
const SYS_PLL_CNTL: usize = 0x300;
const HDMI_PLL_CNTL: usize = 0x320;
const HDMI_PLL_CNTL2: usize = 0x324;

pub const XTAL: ClockId = ClockId(0);
pub const SYS_PLL: ClockId = ClockId(1);
pub const HDMI_PLL: ClockId = ClockId(2);
pub const FIXED_PLL: ClockId = ClockId(3);
pub const FCLK_DIV2: ClockId = ClockId(4);
pub const FCLK_DIV3: ClockId = ClockId(5);
pub const FCLK_DIV4: ClockId = ClockId(6);
pub const FCLK_DIV5: ClockId = ClockId(7);
pub const FCLK_DIV7: ClockId = ClockId(8);
pub const GP0_PLL: ClockId = ClockId(9);
pub const MPEG_SEL: ClockId = ClockId(10);
pub const MPEG_DIV: ClockId = ClockId(11);
pub const CLK81: ClockId = ClockId(12);
pub const MPLL0: ClockId = ClockId(13);
pub const MPLL1: ClockId = ClockId(14);
pub const MPLL2: ClockId = ClockId(15);
pub const MPLL3: ClockId = ClockId(16);
pub const CPU_FIXEDPLL: ClockId = ClockId(17);
pub const CPU_CLK: ClockId = ClockId(18);

// EE gates, all fed by clk81
pub const DDR: ClockId = ClockId(19);
pub const DOS: ClockId = ClockId(20);
pub const ISA: ClockId = ClockId(21);
pub const PL301: ClockId = ClockId(22);
pub const PERIPHS: ClockId = ClockId(23);
pub const SPICC: ClockId = ClockId(24);
pub const I2C: ClockId = ClockId(25);
pub const SANA: ClockId = ClockId(26);
pub const SMART_CARD: ClockId = ClockId(27);
pub const RNG0: ClockId = ClockId(28);
pub const UART0: ClockId = ClockId(29);
pub const SDHC: ClockId = ClockId(30);
pub const STREAM: ClockId = ClockId(31);
pub const ASYNC_FIFO: ClockId = ClockId(32);
pub const SDIO: ClockId = ClockId(33);
pub const ABUF: ClockId = ClockId(34);
pub const HIU_IFACE: ClockId = ClockId(35);
pub const BT656: ClockId = ClockId(36);
pub const ASSIST_MISC: ClockId = ClockId(37);
pub const EMMC_A: ClockId = ClockId(38);
pub const EMMC_B: ClockId = ClockId(39);
pub const EMMC_C: ClockId = ClockId(40);
pub const DMA: ClockId = ClockId(41);
pub const ACODEC: ClockId = ClockId(42);
pub const SPI: ClockId = ClockId(43);
pub const PCLK_TVFE: ClockId = ClockId(44);
pub const I2S_SPDIF: ClockId = ClockId(45);
pub const ETH: ClockId = ClockId(46);
pub const DEMUX: ClockId = ClockId(47);
pub const AIU_GLUE: ClockId = ClockId(48);
pub const IEC958: ClockId = ClockId(49);
pub const I2S_OUT: ClockId = ClockId(50);
pub const AMCLK: ClockId = ClockId(51);
pub const AIFIFO2: ClockId = ClockId(52);
pub const MIXER: ClockId = ClockId(53);
pub const MIXER_IFACE: ClockId = ClockId(54);
pub const ADC: ClockId = ClockId(55);
pub const BLKMV: ClockId = ClockId(56);
pub const AIU_TOP: ClockId = ClockId(57);
pub const UART1: ClockId = ClockId(58);
pub const G2D: ClockId = ClockId(59);
pub const USB0: ClockId = ClockId(60);
pub const USB1: ClockId = ClockId(61);
pub const RESET: ClockId = ClockId(62);
pub const NAND: ClockId = ClockId(63);
pub const DOS_PARSER: ClockId = ClockId(64);
pub const USB_GENERAL: ClockId = ClockId(65);
pub const VDIN1: ClockId = ClockId(66);
pub const AHB_ARB0: ClockId = ClockId(67);
pub const EFUSE: ClockId = ClockId(68);
pub const BOOT_ROM: ClockId = ClockId(69);
pub const AHB_DATA_BUS: ClockId = ClockId(70);
pub const AHB_CTRL_BUS: ClockId = ClockId(71);
pub const HDCP22_PCLK: ClockId = ClockId(72);
pub const HDMITX_PCLK: ClockId = ClockId(73);
pub const PDM_PCLK: ClockId = ClockId(74);
pub const BT656_PCLK: ClockId = ClockId(75);
pub const USB1_TO_DDR: ClockId = ClockId(76);
pub const USB0_TO_DDR: ClockId = ClockId(77);
pub const AIU_PCLK: ClockId = ClockId(78);
pub const MMC_PCLK: ClockId = ClockId(79);
pub const DVIN: ClockId = ClockId(80);
pub const UART2: ClockId = ClockId(81);
pub const SARADC: ClockId = ClockId(82);
pub const VPU_INTR: ClockId = ClockId(83);
pub const SEC_AHB_AHB3_BRIDGE: ClockId = ClockId(84);
pub const APB3_AO: ClockId = ClockId(85);
pub const MCLK_TVFE: ClockId = ClockId(86);
pub const CLK81_GIC: ClockId = ClockId(87);
pub const VCLK2_VENCI0: ClockId = ClockId(88);
pub const VCLK2_VENCI1: ClockId = ClockId(89);
pub const VCLK2_VENCP0: ClockId = ClockId(90);
pub const VCLK2_VENCP1: ClockId = ClockId(91);
pub const VCLK2_VENCT0: ClockId = ClockId(92);
pub const VCLK2_VENCT1: ClockId = ClockId(93);
pub const VCLK2_OTHER: ClockId = ClockId(94);
pub const VCLK2_ENCI: ClockId = ClockId(95);
pub const VCLK2_ENCP: ClockId = ClockId(96);
pub const DAC_CLK: ClockId = ClockId(97);
pub const AOCLK_GATE: ClockId = ClockId(98);
pub const IEC958_GATE: ClockId = ClockId(99);
pub const ENC480P: ClockId = ClockId(100);
pub const RNG1: ClockId = ClockId(101);
pub const VCLK2_ENCT: ClockId = ClockId(102);
pub const VCLK2_ENCL: ClockId = ClockId(103);
pub const VCLK2_VENCLMMC: ClockId = ClockId(104);
pub const VCLK2_VENCL: ClockId = ClockId(105);
pub const VCLK2_OTHER1: ClockId = ClockId(106);
pub const EDP: ClockId = ClockId(107);
pub const AO_MEDIA_CPU: ClockId = ClockId(108);
pub const AO_AHB_SRAM: ClockId = ClockId(109);
pub const AO_AHB_BUS: ClockId = ClockId(110);
pub const AO_IFACE: ClockId = ClockId(111);
pub const AO_I2C: ClockId = ClockId(112);

pub const NR_CLKS: usize = 113;

const XTAL_RATE: u64 = 24_000_000;

/// The register keeps only one N bit next to OD at bit 10; every entry uses
/// N = 1. Entries below 600 MHz and above 1632 MHz rely on the CPU post
/// dividers and do not read back at their nominal rate.
pub static SYS_PLL_TABLE: [PllRate; 88] = [
    PllRate::new(24_000_000, 56, 1, 2),
    PllRate::new(48_000_000, 64, 1, 2),
    PllRate::new(72_000_000, 72, 1, 2),
    PllRate::new(96_000_000, 64, 1, 2),
    PllRate::new(120_000_000, 80, 1, 2),
    PllRate::new(144_000_000, 96, 1, 2),
    PllRate::new(168_000_000, 56, 1, 1),
    PllRate::new(192_000_000, 64, 1, 1),
    PllRate::new(216_000_000, 72, 1, 1),
    PllRate::new(240_000_000, 80, 1, 1),
    PllRate::new(264_000_000, 88, 1, 1),
    PllRate::new(288_000_000, 96, 1, 1),
    PllRate::new(312_000_000, 52, 1, 2),
    PllRate::new(336_000_000, 56, 1, 2),
    PllRate::new(360_000_000, 60, 1, 2),
    PllRate::new(384_000_000, 64, 1, 2),
    PllRate::new(408_000_000, 68, 1, 2),
    PllRate::new(432_000_000, 72, 1, 2),
    PllRate::new(456_000_000, 76, 1, 2),
    PllRate::new(480_000_000, 80, 1, 2),
    PllRate::new(504_000_000, 84, 1, 2),
    PllRate::new(528_000_000, 88, 1, 2),
    PllRate::new(552_000_000, 92, 1, 2),
    PllRate::new(576_000_000, 96, 1, 2),
    PllRate::new(600_000_000, 50, 1, 1),
    PllRate::new(624_000_000, 52, 1, 1),
    PllRate::new(648_000_000, 54, 1, 1),
    PllRate::new(672_000_000, 56, 1, 1),
    PllRate::new(696_000_000, 58, 1, 1),
    PllRate::new(720_000_000, 60, 1, 1),
    PllRate::new(744_000_000, 62, 1, 1),
    PllRate::new(768_000_000, 64, 1, 1),
    PllRate::new(792_000_000, 66, 1, 1),
    PllRate::new(816_000_000, 68, 1, 1),
    PllRate::new(840_000_000, 70, 1, 1),
    PllRate::new(864_000_000, 72, 1, 1),
    PllRate::new(888_000_000, 74, 1, 1),
    PllRate::new(912_000_000, 76, 1, 1),
    PllRate::new(936_000_000, 78, 1, 1),
    PllRate::new(960_000_000, 80, 1, 1),
    PllRate::new(984_000_000, 82, 1, 1),
    PllRate::new(1_008_000_000, 84, 1, 1),
    PllRate::new(1_032_000_000, 86, 1, 1),
    PllRate::new(1_056_000_000, 88, 1, 1),
    PllRate::new(1_080_000_000, 90, 1, 1),
    PllRate::new(1_104_000_000, 92, 1, 1),
    PllRate::new(1_128_000_000, 94, 1, 1),
    PllRate::new(1_152_000_000, 96, 1, 1),
    PllRate::new(1_176_000_000, 98, 1, 1),
    PllRate::new(1_200_000_000, 50, 1, 0),
    PllRate::new(1_224_000_000, 51, 1, 0),
    PllRate::new(1_248_000_000, 52, 1, 0),
    PllRate::new(1_272_000_000, 53, 1, 0),
    PllRate::new(1_296_000_000, 54, 1, 0),
    PllRate::new(1_320_000_000, 55, 1, 0),
    PllRate::new(1_344_000_000, 56, 1, 0),
    PllRate::new(1_368_000_000, 57, 1, 0),
    PllRate::new(1_392_000_000, 58, 1, 0),
    PllRate::new(1_416_000_000, 59, 1, 0),
    PllRate::new(1_440_000_000, 60, 1, 0),
    PllRate::new(1_464_000_000, 61, 1, 0),
    PllRate::new(1_488_000_000, 62, 1, 0),
    PllRate::new(1_512_000_000, 63, 1, 0),
    PllRate::new(1_536_000_000, 64, 1, 0),
    PllRate::new(1_560_000_000, 65, 1, 0),
    PllRate::new(1_584_000_000, 66, 1, 0),
    PllRate::new(1_608_000_000, 67, 1, 0),
    PllRate::new(1_632_000_000, 68, 1, 0),
    PllRate::new(1_656_000_000, 68, 1, 0),
    PllRate::new(1_680_000_000, 68, 1, 0),
    PllRate::new(1_704_000_000, 68, 1, 0),
    PllRate::new(1_728_000_000, 69, 1, 0),
    PllRate::new(1_752_000_000, 69, 1, 0),
    PllRate::new(1_776_000_000, 69, 1, 0),
    PllRate::new(1_800_000_000, 69, 1, 0),
    PllRate::new(1_824_000_000, 70, 1, 0),
    PllRate::new(1_848_000_000, 70, 1, 0),
    PllRate::new(1_872_000_000, 70, 1, 0),
    PllRate::new(1_896_000_000, 70, 1, 0),
    PllRate::new(1_920_000_000, 71, 1, 0),
    PllRate::new(1_944_000_000, 71, 1, 0),
    PllRate::new(1_968_000_000, 71, 1, 0),
    PllRate::new(1_992_000_000, 71, 1, 0),
    PllRate::new(2_016_000_000, 72, 1, 0),
    PllRate::new(2_040_000_000, 72, 1, 0),
    PllRate::new(2_064_000_000, 72, 1, 0),
    PllRate::new(2_088_000_000, 72, 1, 0),
    PllRate::new(2_112_000_000, 73, 1, 0),
];

pub static GP0_PLL_TABLE: [PllRate; 87] = [
    PllRate::new(240_000_000, 40, 1, 2),
    PllRate::new(246_000_000, 41, 1, 2),
    PllRate::new(252_000_000, 42, 1, 2),
    PllRate::new(258_000_000, 43, 1, 2),
    PllRate::new(264_000_000, 44, 1, 2),
    PllRate::new(270_000_000, 45, 1, 2),
    PllRate::new(276_000_000, 46, 1, 2),
    PllRate::new(282_000_000, 47, 1, 2),
    PllRate::new(288_000_000, 48, 1, 2),
    PllRate::new(294_000_000, 49, 1, 2),
    PllRate::new(300_000_000, 50, 1, 2),
    PllRate::new(306_000_000, 51, 1, 2),
    PllRate::new(312_000_000, 52, 1, 2),
    PllRate::new(318_000_000, 53, 1, 2),
    PllRate::new(324_000_000, 54, 1, 2),
    PllRate::new(330_000_000, 55, 1, 2),
    PllRate::new(336_000_000, 56, 1, 2),
    PllRate::new(342_000_000, 57, 1, 2),
    PllRate::new(348_000_000, 58, 1, 2),
    PllRate::new(354_000_000, 59, 1, 2),
    PllRate::new(360_000_000, 60, 1, 2),
    PllRate::new(366_000_000, 61, 1, 2),
    PllRate::new(372_000_000, 62, 1, 2),
    PllRate::new(378_000_000, 63, 1, 2),
    PllRate::new(384_000_000, 64, 1, 2),
    PllRate::new(390_000_000, 65, 1, 3),
    PllRate::new(396_000_000, 66, 1, 3),
    PllRate::new(402_000_000, 67, 1, 3),
    PllRate::new(408_000_000, 68, 1, 3),
    PllRate::new(480_000_000, 40, 1, 1),
    PllRate::new(492_000_000, 41, 1, 1),
    PllRate::new(504_000_000, 42, 1, 1),
    PllRate::new(516_000_000, 43, 1, 1),
    PllRate::new(528_000_000, 44, 1, 1),
    PllRate::new(540_000_000, 45, 1, 1),
    PllRate::new(552_000_000, 46, 1, 1),
    PllRate::new(564_000_000, 47, 1, 1),
    PllRate::new(576_000_000, 48, 1, 1),
    PllRate::new(588_000_000, 49, 1, 1),
    PllRate::new(600_000_000, 50, 1, 1),
    PllRate::new(612_000_000, 51, 1, 1),
    PllRate::new(624_000_000, 52, 1, 1),
    PllRate::new(636_000_000, 53, 1, 1),
    PllRate::new(648_000_000, 54, 1, 1),
    PllRate::new(660_000_000, 55, 1, 1),
    PllRate::new(672_000_000, 56, 1, 1),
    PllRate::new(684_000_000, 57, 1, 1),
    PllRate::new(696_000_000, 58, 1, 1),
    PllRate::new(708_000_000, 59, 1, 1),
    PllRate::new(720_000_000, 60, 1, 1),
    PllRate::new(732_000_000, 61, 1, 1),
    PllRate::new(744_000_000, 62, 1, 1),
    PllRate::new(756_000_000, 63, 1, 1),
    PllRate::new(768_000_000, 64, 1, 1),
    PllRate::new(780_000_000, 65, 1, 1),
    PllRate::new(792_000_000, 66, 1, 1),
    PllRate::new(804_000_000, 67, 1, 1),
    PllRate::new(816_000_000, 68, 1, 1),
    PllRate::new(960_000_000, 40, 1, 0),
    PllRate::new(984_000_000, 41, 1, 0),
    PllRate::new(1_008_000_000, 42, 1, 0),
    PllRate::new(1_032_000_000, 43, 1, 0),
    PllRate::new(1_056_000_000, 44, 1, 0),
    PllRate::new(1_080_000_000, 45, 1, 0),
    PllRate::new(1_104_000_000, 46, 1, 0),
    PllRate::new(1_128_000_000, 47, 1, 0),
    PllRate::new(1_152_000_000, 48, 1, 0),
    PllRate::new(1_176_000_000, 49, 1, 0),
    PllRate::new(1_200_000_000, 50, 1, 0),
    PllRate::new(1_224_000_000, 51, 1, 0),
    PllRate::new(1_248_000_000, 52, 1, 0),
    PllRate::new(1_272_000_000, 53, 1, 0),
    PllRate::new(1_296_000_000, 54, 1, 0),
    PllRate::new(1_320_000_000, 55, 1, 0),
    PllRate::new(1_344_000_000, 56, 1, 0),
    PllRate::new(1_368_000_000, 57, 1, 0),
    PllRate::new(1_392_000_000, 58, 1, 0),
    PllRate::new(1_416_000_000, 59, 1, 0),
    PllRate::new(1_440_000_000, 60, 1, 0),
    PllRate::new(1_464_000_000, 61, 1, 0),
    PllRate::new(1_488_000_000, 62, 1, 0),
    PllRate::new(1_512_000_000, 63, 1, 0),
    PllRate::new(1_536_000_000, 64, 1, 0),
    PllRate::new(1_560_000_000, 65, 1, 0),
    PllRate::new(1_584_000_000, 66, 1, 0),
    PllRate::new(1_608_000_000, 67, 1, 0),
    PllRate::new(1_632_000_000, 68, 1, 0),
];

pub static GP0_PLL_INIT: [RegInit; 5] = [
    RegInit::new(GP0_PLL_CNTL1, 0xc084_b000),
    RegInit::new(GP0_PLL_CNTL2, 0xb750_20be),
    RegInit::new(GP0_PLL_CNTL3, 0x0a59_a288),
    RegInit::new(GP0_PLL_CNTL4, 0xc000_004d),
    RegInit::new(GP0_PLL_CNTL5, 0x0007_8000),
];

/// Settings of the fixed-PLL divider paths in front of the CPU mux.
/// Parents are `xtal`, `fclk_div2`, `fclk_div3`.
pub static CPU_FIXEDPLL_TABLE: [CpuDynRate; 7] = [
    CpuDynRate::new(24_000_000, 0, 0, 0),
    CpuDynRate::new(100_000_000, 1, 1, 9),
    CpuDynRate::new(250_000_000, 1, 1, 3),
    CpuDynRate::new(333_333_333, 2, 1, 1),
    CpuDynRate::new(500_000_000, 1, 1, 1),
    CpuDynRate::new(666_666_666, 2, 0, 0),
    CpuDynRate::new(1_000_000_000, 1, 0, 0),
];

static MPEG_SEL_TABLE: [u32; 3] = [6, 5, 7];

const XTAL_IN: &[ClockId] = &[XTAL];
const FIXED_PLL_OUT: &[ClockId] = &[FIXED_PLL];
const CLK81_OUT: &[ClockId] = &[CLK81];

const PLL_FLAGS: Flags = Flags::of(&[Flag::GetRateNoCache]);
const CPU_FLAGS: Flags = Flags::of(&[Flag::GetRateNoCache, Flag::IgnoreUnused]);

pub static CLOCKS: [Clock; NR_CLKS] = [
    Clock::fixed(XTAL, "xtal", XTAL_RATE),
    Clock::pll(
        SYS_PLL,
        "sys_pll",
        XTAL_IN,
        Pll::new(
            PllGen::Legacy,
            SYS_PLL_CNTL,
            Parm::new(SYS_PLL_CNTL, 0, 9),
            Parm::new(SYS_PLL_CNTL, 9, 1),
            Parm::new(SYS_PLL_CNTL, 10, 2),
        )
        .with_table(&SYS_PLL_TABLE),
    )
    .flags(PLL_FLAGS),
    Clock::pll(
        HDMI_PLL,
        "hdmi_pll",
        XTAL_IN,
        Pll::new(
            PllGen::Legacy,
            HDMI_PLL_CNTL,
            Parm::new(HDMI_PLL_CNTL, 0, 9),
            Parm::new(HDMI_PLL_CNTL, 9, 5),
            Parm::new(HDMI_PLL_CNTL2, 16, 2),
        )
        .with_od2(Parm::new(HDMI_PLL_CNTL2, 22, 2))
        .with_frac(Parm::new(HDMI_PLL_CNTL2, 0, 12)),
    )
    .flags(PLL_FLAGS),
    Clock::pll(
        FIXED_PLL,
        "fixed_pll",
        XTAL_IN,
        Pll::new(
            PllGen::Legacy,
            MPLL_CNTL,
            Parm::new(MPLL_CNTL, 0, 9),
            Parm::new(MPLL_CNTL, 9, 5),
            Parm::new(MPLL_CNTL, 16, 2),
        ),
    )
    .flags(PLL_FLAGS),
    Clock::fixed_factor(FCLK_DIV2, "fclk_div2", FIXED_PLL_OUT, 1, 2),
    Clock::fixed_factor(FCLK_DIV3, "fclk_div3", FIXED_PLL_OUT, 1, 3),
    Clock::fixed_factor(FCLK_DIV4, "fclk_div4", FIXED_PLL_OUT, 1, 4),
    Clock::fixed_factor(FCLK_DIV5, "fclk_div5", FIXED_PLL_OUT, 1, 5),
    Clock::fixed_factor(FCLK_DIV7, "fclk_div7", FIXED_PLL_OUT, 1, 7),
    Clock::pll(
        GP0_PLL,
        "gp0_pll",
        XTAL_IN,
        Pll::new(
            PllGen::Legacy,
            GP0_PLL_CNTL,
            Parm::new(GP0_PLL_CNTL, 0, 9),
            Parm::new(GP0_PLL_CNTL, 9, 5),
            Parm::new(GP0_PLL_CNTL, 16, 2),
        )
        .with_table(&GP0_PLL_TABLE)
        .with_init(&GP0_PLL_INIT),
    )
    .flags(PLL_FLAGS),
    // Bits 14:12 select among eight inputs; only three are wired up.
    Clock::mux(
        MPEG_SEL,
        "mpeg_clk_sel",
        &[FCLK_DIV3, FCLK_DIV4, FCLK_DIV5],
        Mux::new(MPEG_CLK_CNTL, 12, 3).with_table(&MPEG_SEL_TABLE),
    )
    .flags(Flags::of(&[
        Flag::MuxReadOnly,
        Flag::SetRateNoReparent,
        Flag::IgnoreUnused,
    ])),
    Clock::divider(
        MPEG_DIV,
        "mpeg_clk_div",
        &[MPEG_SEL],
        Divider::new(MPEG_CLK_CNTL, 0, 7),
    )
    .flags(Flags::of(&[Flag::SetRateParent, Flag::IgnoreUnused])),
    Clock::gate(CLK81, "clk81", &[MPEG_DIV], MPEG_CLK_CNTL, 7)
        .flags(Flags::of(&[Flag::SetRateParent, Flag::IgnoreUnused])),
    Clock::mpll(
        MPLL0,
        "mpll0",
        FIXED_PLL_OUT,
        Mpll::new(
            Parm::new(MPLL_CNTL7, 0, 14),
            Parm::new(MPLL_CNTL7, 16, 9),
            Parm::bit(MPLL_CNTL7, 15),
            Parm::bit(MPLL_CNTL7, 14),
        ),
    ),
    Clock::mpll(
        MPLL1,
        "mpll1",
        FIXED_PLL_OUT,
        Mpll::new(
            Parm::new(MPLL_CNTL8, 0, 14),
            Parm::new(MPLL_CNTL8, 16, 9),
            Parm::bit(MPLL_CNTL8, 15),
            Parm::bit(MPLL_CNTL8, 14),
        ),
    ),
    Clock::mpll(
        MPLL2,
        "mpll2",
        FIXED_PLL_OUT,
        Mpll::new(
            Parm::new(MPLL_CNTL9, 0, 14),
            Parm::new(MPLL_CNTL9, 16, 9),
            Parm::bit(MPLL_CNTL9, 15),
            Parm::bit(MPLL_CNTL9, 14),
        ),
    ),
    Clock::mpll(
        MPLL3,
        "mpll3",
        FIXED_PLL_OUT,
        Mpll::new(
            Parm::new(MPLL3_CNTL0, 12, 14),
            Parm::new(MPLL3_CNTL0, 2, 9),
            Parm::bit(MPLL3_CNTL0, 11),
            Parm::bit(MPLL3_CNTL0, 0),
        ),
    ),
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
    Clock::gate(DDR, "ddr", CLK81_OUT, GCLK_MPEG0, 0),
    Clock::gate(DOS, "dos", CLK81_OUT, GCLK_MPEG0, 1),
    Clock::gate(ISA, "isa", CLK81_OUT, GCLK_MPEG0, 5),
    Clock::gate(PL301, "pl301", CLK81_OUT, GCLK_MPEG0, 6),
    Clock::gate(PERIPHS, "periphs", CLK81_OUT, GCLK_MPEG0, 7),
    Clock::gate(SPICC, "spicc", CLK81_OUT, GCLK_MPEG0, 8),
    Clock::gate(I2C, "i2c", CLK81_OUT, GCLK_MPEG0, 9),
    Clock::gate(SANA, "sana", CLK81_OUT, GCLK_MPEG0, 10),
    Clock::gate(SMART_CARD, "smart_card", CLK81_OUT, GCLK_MPEG0, 11),
    Clock::gate(RNG0, "rng0", CLK81_OUT, GCLK_MPEG0, 12),
    Clock::gate(UART0, "uart0", CLK81_OUT, GCLK_MPEG0, 13),
    Clock::gate(SDHC, "sdhc", CLK81_OUT, GCLK_MPEG0, 14),
    Clock::gate(STREAM, "stream", CLK81_OUT, GCLK_MPEG0, 15),
    Clock::gate(ASYNC_FIFO, "async_fifo", CLK81_OUT, GCLK_MPEG0, 16),
    Clock::gate(SDIO, "sdio", CLK81_OUT, GCLK_MPEG0, 17),
    Clock::gate(ABUF, "abuf", CLK81_OUT, GCLK_MPEG0, 18),
    Clock::gate(HIU_IFACE, "hiu_iface", CLK81_OUT, GCLK_MPEG0, 19),
    Clock::gate(BT656, "bt656", CLK81_OUT, GCLK_MPEG0, 22),
    Clock::gate(ASSIST_MISC, "assist_misc", CLK81_OUT, GCLK_MPEG0, 23),
    Clock::gate(EMMC_A, "emmc_a", CLK81_OUT, GCLK_MPEG0, 24),
    Clock::gate(EMMC_B, "emmc_b", CLK81_OUT, GCLK_MPEG0, 25),
    Clock::gate(EMMC_C, "emmc_c", CLK81_OUT, GCLK_MPEG0, 26),
    Clock::gate(DMA, "dma", CLK81_OUT, GCLK_MPEG0, 27),
    Clock::gate(ACODEC, "acodec", CLK81_OUT, GCLK_MPEG0, 28),
    Clock::gate(SPI, "spi", CLK81_OUT, GCLK_MPEG0, 30),
    Clock::gate(PCLK_TVFE, "pclk_tvfe", CLK81_OUT, GCLK_MPEG1, 0),
    Clock::gate(I2S_SPDIF, "i2s_spdif", CLK81_OUT, GCLK_MPEG1, 2),
    Clock::gate(ETH, "eth", CLK81_OUT, GCLK_MPEG1, 3),
    Clock::gate(DEMUX, "demux", CLK81_OUT, GCLK_MPEG1, 4),
    Clock::gate(AIU_GLUE, "aiu_glue", CLK81_OUT, GCLK_MPEG1, 6),
    Clock::gate(IEC958, "iec958", CLK81_OUT, GCLK_MPEG1, 7),
    Clock::gate(I2S_OUT, "i2s_out", CLK81_OUT, GCLK_MPEG1, 8),
    Clock::gate(AMCLK, "amclk", CLK81_OUT, GCLK_MPEG1, 9),
    Clock::gate(AIFIFO2, "aififo2", CLK81_OUT, GCLK_MPEG1, 10),
    Clock::gate(MIXER, "mixer", CLK81_OUT, GCLK_MPEG1, 11),
    Clock::gate(MIXER_IFACE, "mixer_iface", CLK81_OUT, GCLK_MPEG1, 12),
    Clock::gate(ADC, "adc", CLK81_OUT, GCLK_MPEG1, 13),
    Clock::gate(BLKMV, "blkmv", CLK81_OUT, GCLK_MPEG1, 14),
    Clock::gate(AIU_TOP, "aiu_top", CLK81_OUT, GCLK_MPEG1, 15),
    Clock::gate(UART1, "uart1", CLK81_OUT, GCLK_MPEG1, 16),
    Clock::gate(G2D, "g2d", CLK81_OUT, GCLK_MPEG1, 20),
    Clock::gate(USB0, "usb0", CLK81_OUT, GCLK_MPEG1, 21),
    Clock::gate(USB1, "usb1", CLK81_OUT, GCLK_MPEG1, 22),
    Clock::gate(RESET, "reset", CLK81_OUT, GCLK_MPEG1, 23),
    Clock::gate(NAND, "nand", CLK81_OUT, GCLK_MPEG1, 24),
    Clock::gate(DOS_PARSER, "dos_parser", CLK81_OUT, GCLK_MPEG1, 25),
    Clock::gate(USB_GENERAL, "usb_general", CLK81_OUT, GCLK_MPEG1, 26),
    Clock::gate(VDIN1, "vdin1", CLK81_OUT, GCLK_MPEG1, 28),
    Clock::gate(AHB_ARB0, "ahb_arb0", CLK81_OUT, GCLK_MPEG1, 29),
    Clock::gate(EFUSE, "efuse", CLK81_OUT, GCLK_MPEG1, 30),
    Clock::gate(BOOT_ROM, "boot_rom", CLK81_OUT, GCLK_MPEG1, 31),
    Clock::gate(AHB_DATA_BUS, "ahb_data_bus", CLK81_OUT, GCLK_MPEG2, 1),
    Clock::gate(AHB_CTRL_BUS, "ahb_ctrl_bus", CLK81_OUT, GCLK_MPEG2, 2),
    Clock::gate(HDCP22_PCLK, "hdcp22_pclk", CLK81_OUT, GCLK_MPEG2, 3),
    Clock::gate(HDMITX_PCLK, "hdmitx_pclk", CLK81_OUT, GCLK_MPEG2, 4),
    Clock::gate(PDM_PCLK, "pdm_pclk", CLK81_OUT, GCLK_MPEG2, 5),
    Clock::gate(BT656_PCLK, "bt656_pclk", CLK81_OUT, GCLK_MPEG2, 6),
    Clock::gate(USB1_TO_DDR, "usb1_to_ddr", CLK81_OUT, GCLK_MPEG2, 8),
    Clock::gate(USB0_TO_DDR, "usb0_to_ddr", CLK81_OUT, GCLK_MPEG2, 9),
    Clock::gate(AIU_PCLK, "aiu_pclk", CLK81_OUT, GCLK_MPEG2, 10),
    Clock::gate(MMC_PCLK, "mmc_pclk", CLK81_OUT, GCLK_MPEG2, 11),
    Clock::gate(DVIN, "dvin", CLK81_OUT, GCLK_MPEG2, 12),
    Clock::gate(UART2, "uart2", CLK81_OUT, GCLK_MPEG2, 15),
    Clock::gate(SARADC, "saradc", CLK81_OUT, GCLK_MPEG2, 22),
    Clock::gate(VPU_INTR, "vpu_intr", CLK81_OUT, GCLK_MPEG2, 25),
    Clock::gate(SEC_AHB_AHB3_BRIDGE, "sec_ahb_ahb3_bridge", CLK81_OUT, GCLK_MPEG2, 26),
    Clock::gate(APB3_AO, "apb3_ao", CLK81_OUT, GCLK_MPEG2, 27),
    Clock::gate(MCLK_TVFE, "mclk_tvfe", CLK81_OUT, GCLK_MPEG2, 28),
    Clock::gate(CLK81_GIC, "clk81_gic", CLK81_OUT, GCLK_MPEG2, 30),
    Clock::gate(VCLK2_VENCI0, "vclk2_venci0", CLK81_OUT, GCLK_OTHER, 1),
    Clock::gate(VCLK2_VENCI1, "vclk2_venci1", CLK81_OUT, GCLK_OTHER, 2),
    Clock::gate(VCLK2_VENCP0, "vclk2_vencp0", CLK81_OUT, GCLK_OTHER, 3),
    Clock::gate(VCLK2_VENCP1, "vclk2_vencp1", CLK81_OUT, GCLK_OTHER, 4),
    Clock::gate(VCLK2_VENCT0, "vclk2_venct0", CLK81_OUT, GCLK_OTHER, 5),
    Clock::gate(VCLK2_VENCT1, "vclk2_venct1", CLK81_OUT, GCLK_OTHER, 6),
    Clock::gate(VCLK2_OTHER, "vclk2_other", CLK81_OUT, GCLK_OTHER, 7),
    Clock::gate(VCLK2_ENCI, "vclk2_enci", CLK81_OUT, GCLK_OTHER, 8),
    Clock::gate(VCLK2_ENCP, "vclk2_encp", CLK81_OUT, GCLK_OTHER, 9),
    Clock::gate(DAC_CLK, "dac_clk", CLK81_OUT, GCLK_OTHER, 10),
    Clock::gate(AOCLK_GATE, "aoclk_gate", CLK81_OUT, GCLK_OTHER, 14),
    Clock::gate(IEC958_GATE, "iec958_gate", CLK81_OUT, GCLK_OTHER, 16),
    Clock::gate(ENC480P, "enc480p", CLK81_OUT, GCLK_OTHER, 20),
    Clock::gate(RNG1, "rng1", CLK81_OUT, GCLK_OTHER, 21),
    Clock::gate(VCLK2_ENCT, "vclk2_enct", CLK81_OUT, GCLK_OTHER, 22),
    Clock::gate(VCLK2_ENCL, "vclk2_encl", CLK81_OUT, GCLK_OTHER, 23),
    Clock::gate(VCLK2_VENCLMMC, "vclk2_venclmmc", CLK81_OUT, GCLK_OTHER, 24),
    Clock::gate(VCLK2_VENCL, "vclk2_vencl", CLK81_OUT, GCLK_OTHER, 25),
    Clock::gate(VCLK2_OTHER1, "vclk2_other1", CLK81_OUT, GCLK_OTHER, 26),
    Clock::gate(EDP, "edp", CLK81_OUT, GCLK_OTHER, 31),
    Clock::gate(AO_MEDIA_CPU, "ao_media_cpu", CLK81_OUT, GCLK_AO, 0),
    Clock::gate(AO_AHB_SRAM, "ao_ahb_sram", CLK81_OUT, GCLK_AO, 1),
    Clock::gate(AO_AHB_BUS, "ao_ahb_bus", CLK81_OUT, GCLK_AO, 2),
    Clock::gate(AO_IFACE, "ao_iface", CLK81_OUT, GCLK_AO, 3),
    Clock::gate(AO_I2C, "ao_i2c", CLK81_OUT, GCLK_AO, 4),
];

/// Validate the GXL table against `domains` (one HHI block) and build the
/// clock graph.
pub fn graph<P: RegisterPort>(
    domains: &[RegisterDomain<P>],
) -> Result<Graph<'_, P, NR_CLKS>, ClkError> {
    let graph = Graph::new(&CLOCKS, domains)?;
    info!("gxl: {} clocks registered", NR_CLKS);
    Ok(graph)
}
