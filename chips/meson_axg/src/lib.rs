// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Clock tree of the Amlogic AXG family (A113D, A113X).
//!
//! Besides the system and fixed PLLs the AXG carries three PLLs that need a
//! magic initialization sequence before every reprogramming: `gp0_pll`,
//! `hifi_pll` (audio) and `pcie_pll`. Peripheral gates sit in the HHI block,
//! the always-on peripherals in the AO block.

#![crate_name = "meson_axg"]
#![crate_type = "rlib"]
#![no_std]

use log::info;
use meson::composite::Composite;
use meson::divider::Divider;
use meson::mpll::Mpll;
use meson::mux::Mux;
use meson::pll::{Pll, PllGen, PllRate};
use meson::{
    ClkError, Clock, ClockId, Domain, Flag, Flags, Graph, Parm, RegInit, RegisterDomain,
    RegisterPort,
};

// HHI register offsets
const GP0_PLL_CNTL: usize = 0x40;
const GP0_PLL_CNTL2: usize = 0x44;
const GP0_PLL_CNTL3: usize = 0x48;
const GP0_PLL_CNTL4: usize = 0x4c;
const GP0_PLL_CNTL5: usize = 0x50;
const GP0_PLL_CNTL1: usize = 0x58;
const HIFI_PLL_CNTL: usize = 0x80;
const HIFI_PLL_CNTL2: usize = 0x84;
const HIFI_PLL_CNTL3: usize = 0x88;
const HIFI_PLL_CNTL4: usize = 0x8c;
const HIFI_PLL_CNTL5: usize = 0x90;
const PCIE_PLL_CNTL: usize = 0xd8;
const PCIE_PLL_CNTL1: usize = 0xdc;
const PCIE_PLL_CNTL2: usize = 0xe0;
const PCIE_PLL_CNTL3: usize = 0xe4;
const PCIE_PLL_CNTL4: usize = 0xe8;
const PCIE_PLL_CNTL5: usize = 0xec;
const PCIE_PLL_CNTL6: usize = 0xf0;
const GCLK_MPEG0: usize = 0x140;
const GCLK_MPEG1: usize = 0x144;
const GCLK_MPEG2: usize = 0x148;
const GCLK_AO: usize = 0x154;
const MPEG_CLK_CNTL: usize = 0x174;
const NAND_CLK_CNTL: usize = 0x25c;
const SD_EMMC_CLK_CNTL: usize = 0x264;
const MPLL_CNTL: usize = 0x280;
const MPLL_CNTL2: usize = 0x284;
const MPLL_CNTL7: usize = 0x29c;
const MPLL_CNTL8: usize = 0x2a0;
const MPLL_CNTL9: usize = 0x2a4;
const MPLL_CNTL10: usize = 0x2a8;
const SYS_PLL_CNTL: usize = 0x300;

// AO register offsets
const RTI_GEN_CNTL_REG0: usize = 0x40;

pub const XTAL: ClockId = ClockId(0);
pub const SYS_PLL: ClockId = ClockId(1);
pub const FIXED_PLL: ClockId = ClockId(2);
pub const FCLK_DIV2: ClockId = ClockId(3);
pub const FCLK_DIV3: ClockId = ClockId(4);
pub const FCLK_DIV4: ClockId = ClockId(5);
pub const FCLK_DIV5: ClockId = ClockId(6);
pub const FCLK_DIV7: ClockId = ClockId(7);
pub const GP0_PLL: ClockId = ClockId(8);
pub const HIFI_PLL: ClockId = ClockId(9);
pub const PCIE_PLL: ClockId = ClockId(10);
pub const MPLL0: ClockId = ClockId(11);
pub const MPLL1: ClockId = ClockId(12);
pub const MPLL2: ClockId = ClockId(13);
pub const MPLL3: ClockId = ClockId(14);
pub const MPEG_SEL: ClockId = ClockId(15);
pub const MPEG_DIV: ClockId = ClockId(16);
pub const CLK81: ClockId = ClockId(17);
pub const SD_EMMC_B: ClockId = ClockId(18);
pub const SD_EMMC_C: ClockId = ClockId(19);

// EE gates
pub const DDR: ClockId = ClockId(20);
pub const AUDIO_LOCKER: ClockId = ClockId(21);
pub const MIPI_DSI_HOST: ClockId = ClockId(22);
pub const ISA: ClockId = ClockId(23);
pub const PL301: ClockId = ClockId(24);
pub const PERIPHS: ClockId = ClockId(25);
pub const SPICC0: ClockId = ClockId(26);
pub const I2C: ClockId = ClockId(27);
pub const RNG0: ClockId = ClockId(28);
pub const UART0: ClockId = ClockId(29);
pub const MIPI_DSI_PHY: ClockId = ClockId(30);
pub const SPICC1: ClockId = ClockId(31);
pub const PCIE_A: ClockId = ClockId(32);
pub const PCIE_B: ClockId = ClockId(33);
pub const HIU_REG: ClockId = ClockId(34);
pub const ASSIST_MISC: ClockId = ClockId(35);
pub const EMMC_B: ClockId = ClockId(36);
pub const EMMC_C: ClockId = ClockId(37);
pub const DMA: ClockId = ClockId(38);
pub const SPI: ClockId = ClockId(39);
pub const AUDIO: ClockId = ClockId(40);
pub const ETH_CORE: ClockId = ClockId(41);
pub const UART1: ClockId = ClockId(42);
pub const G2D: ClockId = ClockId(43);
pub const USB0: ClockId = ClockId(44);
pub const USB1: ClockId = ClockId(45);
pub const RESET: ClockId = ClockId(46);
pub const USB_GENERAL: ClockId = ClockId(47);
pub const AHB_ARB0: ClockId = ClockId(48);
pub const EFUSE: ClockId = ClockId(49);
pub const BOOT_ROM: ClockId = ClockId(50);
pub const AHB_DATA_BUS: ClockId = ClockId(51);
pub const AHB_CTRL_BUS: ClockId = ClockId(52);
pub const USB1_TO_DDR: ClockId = ClockId(53);
pub const USB0_TO_DDR: ClockId = ClockId(54);
pub const MMC_PCLK: ClockId = ClockId(55);
pub const VPU_INTR: ClockId = ClockId(56);
pub const SEC_AHB_AHB3_BRIDGE: ClockId = ClockId(57);
pub const GIC: ClockId = ClockId(58);
pub const AO_MEDIA_CPU: ClockId = ClockId(59);
pub const AO_AHB_SRAM: ClockId = ClockId(60);
pub const AO_AHB_BUS: ClockId = ClockId(61);
pub const AO_IFACE: ClockId = ClockId(62);
pub const AO_I2C: ClockId = ClockId(63);

// AO gates
pub const AO_REMOTE: ClockId = ClockId(64);
pub const AO_I2C_MASTER: ClockId = ClockId(65);
pub const AO_I2C_SLAVE: ClockId = ClockId(66);
pub const AO_UART1: ClockId = ClockId(67);
pub const AO_UART2: ClockId = ClockId(68);
pub const AO_IR_BLASTER: ClockId = ClockId(69);
pub const AO_SARADC: ClockId = ClockId(70);

pub const NR_CLKS: usize = 71;

const XTAL_RATE: u64 = 24_000_000;

pub static SYS_PLL_TABLE: [PllRate; 10] = [
    PllRate::new(600_000_000, 100, 1, 2),
    PllRate::new(696_000_000, 116, 1, 2),
    PllRate::new(792_000_000, 132, 1, 2),
    PllRate::new(900_000_000, 150, 1, 2),
    PllRate::new(1_008_000_000, 84, 1, 1),
    PllRate::new(1_104_000_000, 92, 1, 1),
    PllRate::new(1_200_000_000, 100, 1, 1),
    PllRate::new(1_296_000_000, 108, 1, 1),
    PllRate::new(1_416_000_000, 118, 1, 1),
    PllRate::new(1_512_000_000, 126, 1, 1),
];

pub static GP0_PLL_TABLE: [PllRate; 7] = [
    PllRate::new(240_000_000, 40, 1, 2),
    PllRate::new(480_000_000, 40, 1, 1),
    PllRate::new(600_000_000, 50, 1, 1),
    PllRate::new(960_000_000, 40, 1, 0),
    PllRate::new(972_000_000, 40, 1, 0).with_frac(2048),
    PllRate::new(1_200_000_000, 50, 1, 0),
    PllRate::new(1_536_000_000, 64, 1, 0),
];

pub static GP0_PLL_INIT: [RegInit; 5] = [
    RegInit::new(GP0_PLL_CNTL1, 0xc084_b000),
    RegInit::new(GP0_PLL_CNTL2, 0xb750_20be),
    RegInit::new(GP0_PLL_CNTL3, 0x0a59_a288),
    RegInit::new(GP0_PLL_CNTL4, 0xc000_004d),
    RegInit::new(GP0_PLL_CNTL5, 0x0007_8000),
];

pub static HIFI_PLL_TABLE: [PllRate; 3] = [
    PllRate::new(589_500_000, 49, 1, 1).with_frac(512),
    PllRate::new(1_179_000_000, 49, 1, 0).with_frac(512),
    PllRate::new(1_536_000_000, 64, 1, 0),
];

pub static HIFI_PLL_INIT: [RegInit; 3] = [
    RegInit::new(HIFI_PLL_CNTL2, 0xc084_b000),
    RegInit::new(HIFI_PLL_CNTL3, 0xb750_20be),
    RegInit::new(HIFI_PLL_CNTL4, 0x0a6a_3a88),
];

/// PCIe reference: a 1.6 GHz DCO divided down through both output dividers.
pub static PCIE_PLL_TABLE: [PllRate; 2] = [
    PllRate::new(100_000_000, 200, 3, 1).with_od2(3),
    PllRate::new(200_000_000, 200, 3, 1).with_od2(2),
];

pub static PCIE_PLL_INIT: [RegInit; 6] = [
    RegInit::new(PCIE_PLL_CNTL1, 0x0084_a2aa),
    RegInit::new(PCIE_PLL_CNTL2, 0xb750_20be),
    RegInit::new(PCIE_PLL_CNTL3, 0x0a47_488e),
    RegInit::new(PCIE_PLL_CNTL4, 0xc000_004d),
    RegInit::new(PCIE_PLL_CNTL5, 0x0007_8000),
    RegInit::new(PCIE_PLL_CNTL6, 0x0023_23c6),
];

/// Raw selector values of the wired clk81 inputs; 1 is tied low.
static MPEG_SEL_TABLE: [u32; 7] = [0, 2, 3, 4, 5, 6, 7];

const XTAL_IN: &[ClockId] = &[XTAL];
const FIXED_PLL_OUT: &[ClockId] = &[FIXED_PLL];
const CLK81_OUT: &[ClockId] = &[CLK81];
const SD_EMMC_PARENTS: &[ClockId] = &[XTAL, FCLK_DIV2, FCLK_DIV3, FCLK_DIV5, FCLK_DIV7];

const fn mpll(cntl: usize) -> Mpll {
    Mpll::new(
        Parm::new(cntl, 0, 14),
        Parm::new(cntl, 16, 9),
        Parm::bit(cntl, 15),
        Parm::bit(cntl, 14),
    )
}

const fn axg_pll(cntl: usize, m_width: u32) -> Pll {
    Pll::new(
        PllGen::Axg,
        cntl,
        Parm::new(cntl, 0, m_width),
        Parm::new(cntl, 9, 5),
        Parm::new(cntl, 16, 2),
    )
}

pub static CLOCKS: [Clock; NR_CLKS] = [
    Clock::fixed(XTAL, "xtal", XTAL_RATE),
    Clock::pll(
        SYS_PLL,
        "sys_pll",
        XTAL_IN,
        axg_pll(SYS_PLL_CNTL, 9).with_table(&SYS_PLL_TABLE),
    ),
    Clock::pll(
        FIXED_PLL,
        "fixed_pll",
        XTAL_IN,
        axg_pll(MPLL_CNTL, 9).with_frac(Parm::new(MPLL_CNTL2, 0, 12)),
    )
    .flags(Flags::of(&[Flag::GetRateNoCache])),
    Clock::fixed_factor(FCLK_DIV2, "fclk_div2", FIXED_PLL_OUT, 1, 2),
    Clock::fixed_factor(FCLK_DIV3, "fclk_div3", FIXED_PLL_OUT, 1, 3),
    Clock::fixed_factor(FCLK_DIV4, "fclk_div4", FIXED_PLL_OUT, 1, 4),
    Clock::fixed_factor(FCLK_DIV5, "fclk_div5", FIXED_PLL_OUT, 1, 5),
    Clock::fixed_factor(FCLK_DIV7, "fclk_div7", FIXED_PLL_OUT, 1, 7),
    Clock::pll(
        GP0_PLL,
        "gp0_pll",
        XTAL_IN,
        axg_pll(GP0_PLL_CNTL, 9)
            .with_frac(Parm::new(GP0_PLL_CNTL1, 0, 12))
            .with_table(&GP0_PLL_TABLE)
            .with_init(&GP0_PLL_INIT),
    ),
    Clock::pll(
        HIFI_PLL,
        "hifi_pll",
        XTAL_IN,
        axg_pll(HIFI_PLL_CNTL, 8)
            .with_frac(Parm::new(HIFI_PLL_CNTL5, 0, 12))
            .with_table(&HIFI_PLL_TABLE)
            .with_init(&HIFI_PLL_INIT),
    ),
    Clock::pll(
        PCIE_PLL,
        "pcie_pll",
        XTAL_IN,
        axg_pll(PCIE_PLL_CNTL, 9)
            .with_od2(Parm::new(PCIE_PLL_CNTL6, 6, 2))
            .with_frac(Parm::new(PCIE_PLL_CNTL1, 0, 12))
            .with_table(&PCIE_PLL_TABLE)
            .with_init(&PCIE_PLL_INIT),
    ),
    Clock::mpll(MPLL0, "mpll0", FIXED_PLL_OUT, mpll(MPLL_CNTL7)),
    Clock::mpll(MPLL1, "mpll1", FIXED_PLL_OUT, mpll(MPLL_CNTL8)),
    Clock::mpll(MPLL2, "mpll2", FIXED_PLL_OUT, mpll(MPLL_CNTL9)),
    Clock::mpll(MPLL3, "mpll3", FIXED_PLL_OUT, mpll(MPLL_CNTL10)),
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
    Clock::composite(
        SD_EMMC_B,
        "sd_emmc_b",
        SD_EMMC_PARENTS,
        Composite::new()
            .with_mux(Mux::new(SD_EMMC_CLK_CNTL, 25, 3))
            .with_div(Divider::new(SD_EMMC_CLK_CNTL, 16, 7).round_closest())
            .with_gate(SD_EMMC_CLK_CNTL, 23),
    ),
    Clock::composite(
        SD_EMMC_C,
        "sd_emmc_c",
        SD_EMMC_PARENTS,
        Composite::new()
            .with_mux(Mux::new(NAND_CLK_CNTL, 9, 3))
            .with_div(Divider::new(NAND_CLK_CNTL, 0, 7).round_closest())
            .with_gate(NAND_CLK_CNTL, 7),
    ),
    Clock::gate(DDR, "ddr", CLK81_OUT, GCLK_MPEG0, 0),
    Clock::gate(AUDIO_LOCKER, "audio_locker", CLK81_OUT, GCLK_MPEG0, 2),
    Clock::gate(MIPI_DSI_HOST, "mipi_dsi_host", CLK81_OUT, GCLK_MPEG0, 3),
    Clock::gate(ISA, "isa", CLK81_OUT, GCLK_MPEG0, 5),
    Clock::gate(PL301, "pl301", CLK81_OUT, GCLK_MPEG0, 6),
    Clock::gate(PERIPHS, "periphs", CLK81_OUT, GCLK_MPEG0, 7),
    Clock::gate(SPICC0, "spicc0", CLK81_OUT, GCLK_MPEG0, 8),
    Clock::gate(I2C, "i2c", CLK81_OUT, GCLK_MPEG0, 9),
    Clock::gate(RNG0, "rng0", CLK81_OUT, GCLK_MPEG0, 12),
    Clock::gate(UART0, "uart0", CLK81_OUT, GCLK_MPEG0, 13),
    Clock::gate(MIPI_DSI_PHY, "mipi_dsi_phy", CLK81_OUT, GCLK_MPEG0, 14),
    Clock::gate(SPICC1, "spicc1", CLK81_OUT, GCLK_MPEG0, 15),
    Clock::gate(PCIE_A, "pcie_a", CLK81_OUT, GCLK_MPEG0, 16),
    Clock::gate(PCIE_B, "pcie_b", CLK81_OUT, GCLK_MPEG0, 17),
    Clock::gate(HIU_REG, "hiu_reg", CLK81_OUT, GCLK_MPEG0, 19),
    Clock::gate(ASSIST_MISC, "assist_misc", CLK81_OUT, GCLK_MPEG0, 23),
    Clock::gate(EMMC_B, "emmc_b", CLK81_OUT, GCLK_MPEG0, 25),
    Clock::gate(EMMC_C, "emmc_c", CLK81_OUT, GCLK_MPEG0, 26),
    Clock::gate(DMA, "dma", CLK81_OUT, GCLK_MPEG0, 27),
    Clock::gate(SPI, "spi", CLK81_OUT, GCLK_MPEG0, 30),
    Clock::gate(AUDIO, "audio", CLK81_OUT, GCLK_MPEG1, 0),
    Clock::gate(ETH_CORE, "eth_core", CLK81_OUT, GCLK_MPEG1, 3),
    Clock::gate(UART1, "uart1", CLK81_OUT, GCLK_MPEG1, 16),
    Clock::gate(G2D, "g2d", CLK81_OUT, GCLK_MPEG1, 20),
    Clock::gate(USB0, "usb0", CLK81_OUT, GCLK_MPEG1, 21),
    Clock::gate(USB1, "usb1", CLK81_OUT, GCLK_MPEG1, 22),
    Clock::gate(RESET, "reset", CLK81_OUT, GCLK_MPEG1, 23),
    Clock::gate(USB_GENERAL, "usb_general", CLK81_OUT, GCLK_MPEG1, 26),
    Clock::gate(AHB_ARB0, "ahb_arb0", CLK81_OUT, GCLK_MPEG1, 29),
    Clock::gate(EFUSE, "efuse", CLK81_OUT, GCLK_MPEG1, 30),
    Clock::gate(BOOT_ROM, "boot_rom", CLK81_OUT, GCLK_MPEG1, 31),
    Clock::gate(AHB_DATA_BUS, "ahb_data_bus", CLK81_OUT, GCLK_MPEG2, 1),
    Clock::gate(AHB_CTRL_BUS, "ahb_ctrl_bus", CLK81_OUT, GCLK_MPEG2, 2),
    Clock::gate(USB1_TO_DDR, "usb1_to_ddr", CLK81_OUT, GCLK_MPEG2, 8),
    Clock::gate(USB0_TO_DDR, "usb0_to_ddr", CLK81_OUT, GCLK_MPEG2, 9),
    Clock::gate(MMC_PCLK, "mmc_pclk", CLK81_OUT, GCLK_MPEG2, 11),
    Clock::gate(VPU_INTR, "vpu_intr", CLK81_OUT, GCLK_MPEG2, 25),
    Clock::gate(SEC_AHB_AHB3_BRIDGE, "sec_ahb_ahb3_bridge", CLK81_OUT, GCLK_MPEG2, 26),
    Clock::gate(GIC, "gic", CLK81_OUT, GCLK_MPEG2, 30),
    Clock::gate(AO_MEDIA_CPU, "ao_media_cpu", CLK81_OUT, GCLK_AO, 0),
    Clock::gate(AO_AHB_SRAM, "ao_ahb_sram", CLK81_OUT, GCLK_AO, 1),
    Clock::gate(AO_AHB_BUS, "ao_ahb_bus", CLK81_OUT, GCLK_AO, 2),
    Clock::gate(AO_IFACE, "ao_iface", CLK81_OUT, GCLK_AO, 3),
    Clock::gate(AO_I2C, "ao_i2c", CLK81_OUT, GCLK_AO, 4),
    Clock::gate(AO_REMOTE, "ao_remote", CLK81_OUT, RTI_GEN_CNTL_REG0, 0)
        .in_domain(Domain::Ao),
    Clock::gate(AO_I2C_MASTER, "ao_i2c_master", CLK81_OUT, RTI_GEN_CNTL_REG0, 1)
        .in_domain(Domain::Ao),
    Clock::gate(AO_I2C_SLAVE, "ao_i2c_slave", CLK81_OUT, RTI_GEN_CNTL_REG0, 2)
        .in_domain(Domain::Ao),
    Clock::gate(AO_UART1, "ao_uart1", CLK81_OUT, RTI_GEN_CNTL_REG0, 3)
        .in_domain(Domain::Ao),
    Clock::gate(AO_UART2, "ao_uart2", CLK81_OUT, RTI_GEN_CNTL_REG0, 5)
        .in_domain(Domain::Ao),
    Clock::gate(AO_IR_BLASTER, "ao_ir_blaster", CLK81_OUT, RTI_GEN_CNTL_REG0, 6)
        .in_domain(Domain::Ao),
    Clock::gate(AO_SARADC, "ao_saradc", CLK81_OUT, RTI_GEN_CNTL_REG0, 7)
        .in_domain(Domain::Ao),
];

/// Validate the AXG table against `domains` (HHI, then AO) and build the
/// clock graph.
pub fn graph<P: RegisterPort>(
    domains: &[RegisterDomain<P>],
) -> Result<Graph<'_, P, NR_CLKS>, ClkError> {
    let graph = Graph::new(&CLOCKS, domains)?;
    info!("axg: {} clocks registered", NR_CLKS);
    Ok(graph)
}
