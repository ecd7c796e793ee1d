// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! The clock graph.
//!
//! A [`Graph`] binds a chip's static [`Clock`] table to the register domains
//! it lives in and keeps the runtime bookkeeping the table cannot hold:
//! enable counts, cached rates, the last rate a PLL was programmed to and the
//! state of a CPU switch.
//!
//! Every public operation takes `&self`. Bookkeeping is kept in [`Cell`]s, so
//! a graph is used from one thread of control; register sequences are
//! serialized by the lock of their [`RegisterDomain`]. No domain lock is held
//! while the graph recurses into another node.
//!
//! Usage
//! -----
//!
//! ```rust,ignore
//! let domains = [RegisterDomain::new("hhi", hhi_port)];
//! let graph = Graph::new(&CLOCKS, &domains)?;
//! graph.enable(SPICC)?;
//! graph.set_rate(SYS_PLL, 792_000_000)?;
//! ```

use core::cell::Cell;

use log::{debug, error, info, warn};

use crate::config::{Config, CONFIG};
use crate::cpu::SwitchState;
use crate::errorcode::ClkError;
use crate::node::{Clock, ClockId, Flag, Kind, Rate};
use crate::regs::{Domain, Parm, RegisterDomain, RegisterPort};

/// Runtime state of one node.
pub(crate) struct NodeState {
    pub(crate) enable_count: Cell<u32>,
    /// Cached output rate, cleared by every mutation.
    pub(crate) rate: Cell<Option<Rate>>,
    /// Rate a PLL was last programmed to by the graph.
    pub(crate) programmed: Cell<Option<Rate>>,
    /// Set after a PLL failed every lock attempt.
    pub(crate) lock_lost: Cell<bool>,
    pub(crate) switch: Cell<SwitchState>,
    /// CPU parked on the dynamic path by `begin_switch`.
    pub(crate) parked: Cell<bool>,
    /// CPU holds a reference on the system PLL.
    pub(crate) holds_pll: Cell<bool>,
}

impl NodeState {
    const fn new() -> NodeState {
        NodeState {
            enable_count: Cell::new(0),
            rate: Cell::new(None),
            programmed: Cell::new(None),
            lock_lost: Cell::new(false),
            switch: Cell::new(SwitchState::Steady),
            parked: Cell::new(false),
            holds_pll: Cell::new(false),
        }
    }
}

/// One line of [`Graph::summary`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClockSummary {
    pub id: ClockId,
    pub name: &'static str,
    pub rate: Rate,
    pub enable_count: u32,
    pub enabled: bool,
    pub parent: Option<ClockId>,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Mark {
    New,
    Active,
    Done,
}

pub struct Graph<'a, P: RegisterPort, const N: usize> {
    clocks: &'a [Clock; N],
    domains: &'a [RegisterDomain<P>],
    pub(crate) config: &'a Config,
    state: [NodeState; N],
}

impl<'a, P: RegisterPort, const N: usize> Graph<'a, P, N> {
    /// Validate `clocks` and build a graph with the default configuration.
    /// `domains` is indexed by [`Domain::index`].
    pub fn new(
        clocks: &'a [Clock; N],
        domains: &'a [RegisterDomain<P>],
    ) -> Result<Graph<'a, P, N>, ClkError> {
        Graph::with_config(clocks, domains, &CONFIG)
    }

    pub fn with_config(
        clocks: &'a [Clock; N],
        domains: &'a [RegisterDomain<P>],
        config: &'a Config,
    ) -> Result<Graph<'a, P, N>, ClkError> {
        validate(clocks, domains.len())?;
        Ok(Graph {
            clocks,
            domains,
            config,
            state: core::array::from_fn(|_| NodeState::new()),
        })
    }

    pub fn len(&self) -> usize {
        N
    }

    pub fn is_empty(&self) -> bool {
        N == 0
    }

    pub fn clock(&self, id: ClockId) -> Result<&'a Clock, ClkError> {
        self.clocks.get(id.index()).ok_or(ClkError::InvalidClock)
    }

    pub fn find(&self, name: &str) -> Option<ClockId> {
        self.clocks.iter().find(|c| c.name == name).map(|c| c.id)
    }

    pub fn name(&self, id: ClockId) -> Option<&'static str> {
        self.clocks.get(id.index()).map(|c| c.name)
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    /// Callers pass ids that were checked by [`Graph::clock`].
    pub(crate) fn state(&self, id: ClockId) -> &NodeState {
        &self.state[id.index()]
    }

    /// Domains were checked against the table at construction.
    pub(crate) fn domain(&self, domain: Domain) -> &RegisterDomain<P> {
        &self.domains[domain.index()]
    }

    pub(crate) fn read_parm(&self, parm: &Parm) -> u32 {
        self.domain(parm.domain).lock().read_parm(parm)
    }

    pub(crate) fn write_parm(&self, parm: &Parm, value: u32) {
        self.domain(parm.domain).lock().write_parm(parm, value)
    }

    pub(crate) fn parent_rate(&self, clock: &Clock, index: usize) -> Rate {
        clock.parents.get(index).map_or(0, |&p| self.get_rate(p))
    }

    pub(crate) fn invalidate_rates(&self) {
        for state in self.state.iter() {
            state.rate.set(None);
        }
    }

    // Rates

    /// Current output rate in Hz, 0 for an unknown id or a PLL that lost
    /// lock.
    pub fn get_rate(&self, id: ClockId) -> Rate {
        let Ok(clock) = self.clock(id) else {
            return 0;
        };
        let state = self.state(id);
        if !clock.has(Flag::GetRateNoCache) {
            if let Some(rate) = state.rate.get() {
                return rate;
            }
        }
        let rate = self.recalc_rate(id, clock);
        state.rate.set(Some(rate));
        rate
    }

    fn recalc_rate(&self, id: ClockId, clock: &Clock) -> Rate {
        match &clock.kind {
            Kind::Fixed(rate) => *rate,
            Kind::FixedFactor(ff) => ff.recalc(self.parent_rate(clock, 0)),
            Kind::Gate(_) => self.parent_rate(clock, 0),
            Kind::Divider(div) => {
                let val = self.read_parm(&div.field);
                div.recalc(self.parent_rate(clock, 0), val)
            }
            Kind::Mux(_) | Kind::CpuClock(_) => match self.get_parent(id) {
                Some(index) => self.parent_rate(clock, index),
                None => 0,
            },
            Kind::Pll(pll) => self.pll_recalc(id, clock, pll),
            Kind::Mpll(mpll) => self.mpll_recalc(clock, mpll),
            Kind::CpuDyn(cpu_dyn) => self.cpu_dyn_recalc(clock, cpu_dyn),
            Kind::Composite(composite) => self.composite_recalc(clock, composite),
        }
    }

    /// Rate `set_rate(id, rate)` would settle on, without touching the
    /// hardware.
    pub fn round_rate(&self, id: ClockId, rate: Rate) -> Result<Rate, ClkError> {
        let clock = self.clock(id)?;
        match &clock.kind {
            Kind::Fixed(_) | Kind::FixedFactor(_) | Kind::Gate(_) => {
                if !clock.has(Flag::SetRateParent) {
                    return Ok(self.get_rate(id));
                }
                let parent = *clock.parents.first().ok_or(ClkError::NoSupport)?;
                match &clock.kind {
                    Kind::FixedFactor(ff) if ff.mult != 0 => {
                        let wanted = rate * Rate::from(ff.div) / Rate::from(ff.mult);
                        Ok(ff.recalc(self.round_rate(parent, wanted)?))
                    }
                    Kind::FixedFactor(_) => Err(ClkError::NoSupport),
                    _ => self.round_rate(parent, rate),
                }
            }
            Kind::Divider(div) => div
                .best(self.parent_rate(clock, 0), rate)
                .map(|(rate, _)| rate)
                .ok_or(ClkError::OutOfRange),
            Kind::Mux(mux) => self.mux_round_rate(id, clock, mux, rate),
            Kind::Pll(pll) => Ok(self.pll_round_rate(id, pll, rate)),
            Kind::Mpll(mpll) => Ok(mpll.clamp(rate)),
            Kind::CpuDyn(cpu_dyn) => cpu_dyn.round_rate(rate).ok_or(ClkError::UnknownRate),
            Kind::CpuClock(_) => self.cpu_round_rate(clock, rate),
            Kind::Composite(composite) => self
                .composite_determine(clock, composite, rate)
                .map(|choice| choice.rate)
                .ok_or(ClkError::OutOfRange),
        }
    }

    /// Change the rate of `id`. Returns the rate the node runs at afterwards.
    pub fn set_rate(&self, id: ClockId, rate: Rate) -> Result<Rate, ClkError> {
        let clock = self.clock(id)?;
        let result = match &clock.kind {
            Kind::Fixed(_) | Kind::FixedFactor(_) | Kind::Gate(_) => {
                self.passthrough_set_rate(id, clock, rate)
            }
            Kind::Divider(div) => match div.best(self.parent_rate(clock, 0), rate) {
                Some((_, val)) => {
                    self.write_parm(&div.field, val);
                    Ok(())
                }
                None => Err(ClkError::OutOfRange),
            },
            Kind::Mux(mux) => self.mux_set_rate(id, clock, mux, rate),
            Kind::Pll(pll) => self.pll_set_rate(id, clock, pll, rate),
            Kind::Mpll(mpll) => self.mpll_set_rate(clock, mpll, rate),
            Kind::CpuDyn(cpu_dyn) => self.cpu_dyn_set_rate(id, clock, cpu_dyn, rate),
            Kind::CpuClock(_) => self.cpu_set_rate(id, clock, rate),
            Kind::Composite(composite) => self.composite_set_rate(id, clock, composite, rate),
        };
        self.invalidate_rates();

        match result {
            Ok(()) => {
                let achieved = self.get_rate(id);
                if self.config.trace_rate_changes {
                    debug!("{}: {} Hz (requested {} Hz)", clock.name, achieved, rate);
                }
                Ok(achieved)
            }
            Err(err) => {
                error!("{}: set_rate({}) failed: {}", clock.name, rate, err);
                Err(err)
            }
        }
    }

    /// Nodes without a rate control of their own.
    fn passthrough_set_rate(
        &self,
        id: ClockId,
        clock: &Clock,
        rate: Rate,
    ) -> Result<(), ClkError> {
        if !clock.has(Flag::SetRateParent) {
            return if self.get_rate(id) == rate {
                Ok(())
            } else {
                Err(ClkError::NoSupport)
            };
        }
        let parent = *clock.parents.first().ok_or(ClkError::NoSupport)?;
        let parent_rate = match &clock.kind {
            Kind::FixedFactor(ff) if ff.mult == 0 => return Err(ClkError::NoSupport),
            Kind::FixedFactor(ff) => rate * Rate::from(ff.div) / Rate::from(ff.mult),
            _ => rate,
        };
        self.set_rate(parent, parent_rate).map(|_| ())
    }

    // Enable state

    /// Take a reference on `id`. The first reference references the current
    /// parent and then turns the node's hardware enable on.
    pub fn enable(&self, id: ClockId) -> Result<(), ClkError> {
        let clock = self.clock(id)?;
        let state = self.state(id);
        let count = state.enable_count.get();
        if count > 0 {
            state.enable_count.set(count + 1);
            return Ok(());
        }

        let parent = self.parent(id);
        if let Some(parent) = parent {
            self.take_parent_ref(parent)?;
        }
        if let Err(err) = self.hw_enable(id, clock) {
            if let Some(parent) = parent {
                let _ = self.drop_parent_ref(parent);
            }
            return Err(err);
        }
        state.enable_count.set(1);
        self.invalidate_rates();
        Ok(())
    }

    /// Drop a reference on `id`. The last reference turns the hardware
    /// enable off, unless the node is [`Flag::IgnoreUnused`], and then
    /// releases the parent.
    pub fn disable(&self, id: ClockId) -> Result<(), ClkError> {
        let clock = self.clock(id)?;
        let state = self.state(id);
        let count = state.enable_count.get();
        if count == 0 {
            warn!("{}: disable without a matching enable", clock.name);
            return Err(ClkError::Already);
        }
        state.enable_count.set(count - 1);
        if count > 1 {
            return Ok(());
        }

        if !clock.has(Flag::IgnoreUnused) {
            self.hw_disable(clock);
        }
        if let Some(parent) = self.parent(id) {
            self.drop_parent_ref(parent)?;
        }
        self.invalidate_rates();
        Ok(())
    }

    pub fn is_enabled(&self, id: ClockId) -> bool {
        match self.clock(id) {
            Ok(clock) => clock.has(Flag::IgnoreUnused) || self.enable_count(id) > 0,
            Err(_) => false,
        }
    }

    pub fn enable_count(&self, id: ClockId) -> u32 {
        match self.clock(id) {
            Ok(_) => self.state(id).enable_count.get(),
            Err(_) => 0,
        }
    }

    // Parents that never get gated carry no references either.
    fn take_parent_ref(&self, parent: ClockId) -> Result<(), ClkError> {
        if self.clock(parent)?.has(Flag::IgnoreUnused) {
            return Ok(());
        }
        self.enable(parent)
    }

    fn drop_parent_ref(&self, parent: ClockId) -> Result<(), ClkError> {
        if self.clock(parent)?.has(Flag::IgnoreUnused) {
            return Ok(());
        }
        self.disable(parent)
    }

    fn hw_enable(&self, id: ClockId, clock: &Clock) -> Result<(), ClkError> {
        match &clock.kind {
            Kind::Gate(gate) => self.write_parm(&gate.bit, 1),
            Kind::Composite(composite) => {
                if let Some(gate) = &composite.gate {
                    self.write_parm(&gate.bit, 1);
                }
            }
            Kind::Pll(pll) => return self.pll_enable(id, clock, pll),
            Kind::Mpll(mpll) => self.write_parm(&mpll.en_dds, 1),
            _ => {}
        }
        Ok(())
    }

    fn hw_disable(&self, clock: &Clock) {
        match &clock.kind {
            Kind::Gate(gate) => self.write_parm(&gate.bit, 0),
            Kind::Composite(composite) => {
                if let Some(gate) = &composite.gate {
                    self.write_parm(&gate.bit, 0);
                }
            }
            Kind::Pll(pll) => self.pll_disable(pll),
            Kind::Mpll(mpll) => self.write_parm(&mpll.en_dds, 0),
            _ => {}
        }
    }

    fn hw_is_enabled(&self, clock: &Clock) -> bool {
        match &clock.kind {
            Kind::Gate(gate) => self.read_parm(&gate.bit) != 0,
            Kind::Composite(composite) => composite
                .gate
                .as_ref()
                .is_some_and(|gate| self.read_parm(&gate.bit) != 0),
            Kind::Pll(pll) => self.pll_is_enabled(pll),
            Kind::Mpll(mpll) => self.read_parm(&mpll.en_dds) != 0,
            _ => false,
        }
    }

    /// Gate every node that nobody referenced but whose hardware enable is
    /// still on, typically left behind by the boot firmware. Returns how many
    /// nodes were gated.
    pub fn disable_unused(&self) -> usize {
        let mut gated = 0;
        for clock in self.clocks.iter() {
            if clock.has(Flag::IgnoreUnused) || self.state(clock.id).enable_count.get() > 0 {
                continue;
            }
            if self.hw_is_enabled(clock) {
                self.hw_disable(clock);
                gated += 1;
            }
        }
        if gated > 0 {
            info!("disable_unused: gated {} clocks", gated);
        }
        self.invalidate_rates();
        gated
    }

    // Parents

    /// Index of the selected parent.
    pub fn get_parent(&self, id: ClockId) -> Option<usize> {
        let clock = self.clock(id).ok()?;
        match &clock.kind {
            Kind::Mux(mux) => mux.index(self.read_parm(&mux.field), clock.parents.len()),
            Kind::Composite(composite) => self.composite_parent(clock, composite),
            Kind::CpuClock(cpu) => {
                let index = self.read_parm(&cpu.select) as usize;
                (index < clock.parents.len()).then_some(index)
            }
            Kind::CpuDyn(cpu_dyn) => self.cpu_dyn_parent(clock, cpu_dyn),
            _ => (!clock.parents.is_empty()).then_some(0),
        }
    }

    /// Id of the selected parent.
    pub fn parent(&self, id: ClockId) -> Option<ClockId> {
        let clock = self.clock(id).ok()?;
        self.get_parent(id)
            .and_then(|index| clock.parents.get(index).copied())
    }

    pub fn set_parent(&self, id: ClockId, index: usize) -> Result<(), ClkError> {
        let clock = self.clock(id)?;
        if index >= clock.parents.len() {
            return Err(ClkError::InvalidParentIndex);
        }
        let mux = match &clock.kind {
            Kind::Mux(mux) => mux,
            Kind::Composite(composite) => composite.mux.as_ref().ok_or(ClkError::NoSupport)?,
            Kind::CpuClock(cpu) => return self.cpu_select(id, clock, cpu, index),
            _ => return Err(ClkError::NoSupport),
        };
        if clock.has(Flag::MuxReadOnly) {
            return Err(ClkError::ReadOnly);
        }
        let raw = mux.raw(index).ok_or(ClkError::InvalidParentIndex)?;
        self.reparent(id, clock, index, || {
            self.write_parm(&mux.field, raw);
            Ok(())
        })
    }

    /// Move `id` to parent `index`, running `switch` to change the hardware.
    /// An enabled node references its new parent before the switch and
    /// releases the old one after it.
    pub(crate) fn reparent<F>(
        &self,
        id: ClockId,
        clock: &Clock,
        index: usize,
        switch: F,
    ) -> Result<(), ClkError>
    where
        F: FnOnce() -> Result<(), ClkError>,
    {
        let new_parent = *clock
            .parents
            .get(index)
            .ok_or(ClkError::InvalidParentIndex)?;
        let old_parent = self.parent(id);
        let moving = self.state(id).enable_count.get() > 0 && old_parent != Some(new_parent);

        if moving {
            self.take_parent_ref(new_parent)?;
        }
        if let Err(err) = switch() {
            if moving {
                let _ = self.drop_parent_ref(new_parent);
            }
            return Err(err);
        }
        if moving {
            if let Some(old_parent) = old_parent {
                self.drop_parent_ref(old_parent)?;
            }
        }
        self.invalidate_rates();
        Ok(())
    }

    /// Report every node in table order.
    pub fn summary<F: FnMut(&ClockSummary)>(&self, mut f: F) {
        for clock in self.clocks.iter() {
            f(&ClockSummary {
                id: clock.id,
                name: clock.name,
                rate: self.get_rate(clock.id),
                enable_count: self.state(clock.id).enable_count.get(),
                enabled: self.is_enabled(clock.id),
                parent: self.parent(clock.id),
            });
        }
    }
}

fn validate<const N: usize>(clocks: &[Clock; N], num_domains: usize) -> Result<(), ClkError> {
    for (index, clock) in clocks.iter().enumerate() {
        if let Err(err) = validate_node(clocks, index, clock, num_domains) {
            error!("clock table: {}: {}", clock.name, err);
            return Err(err);
        }
    }

    let mut marks = [Mark::New; N];
    for index in 0..N {
        if let Err(err) = visit(clocks, index, &mut marks) {
            error!("clock table: cycle through {}", clocks[index].name);
            return Err(err);
        }
    }
    Ok(())
}

fn validate_node(
    clocks: &[Clock],
    index: usize,
    clock: &Clock,
    num_domains: usize,
) -> Result<(), ClkError> {
    if clock.id.index() != index {
        return Err(ClkError::MisplacedId);
    }
    if clocks[..index].iter().any(|c| c.name == clock.name) {
        return Err(ClkError::DuplicateName);
    }
    if clock.parents.iter().any(|p| p.index() >= clocks.len()) {
        return Err(ClkError::DanglingParent);
    }

    let mut missing = false;
    let mut first_domain: Option<Domain> = None;
    let mut spread = false;
    clock.for_each_parm(|parm| {
        missing |= parm.domain.index() >= num_domains;
        match first_domain {
            None => first_domain = Some(parm.domain),
            Some(domain) => spread |= domain != parm.domain,
        }
    });
    if missing {
        return Err(ClkError::MissingDomain);
    }

    let parents = clock.parents.len();
    let malformed = match &clock.kind {
        Kind::Fixed(_) => parents != 0,
        Kind::FixedFactor(ff) => ff.div == 0 || parents != 1,
        Kind::Gate(_) | Kind::Divider(_) => parents != 1,
        Kind::Mpll(_) => parents != 1 || spread,
        Kind::Mux(_) => parents == 0 || (clock.has(Flag::ParentAlternate) && parents != 2),
        Kind::Pll(pll) => {
            let fields = [Some(pll.m), Some(pll.n), Some(pll.od), pll.od2, pll.frac];
            let overlap = fields.iter().flatten().enumerate().any(|(i, a)| {
                fields.iter().flatten().skip(i + 1).any(|b| a.overlaps(b))
            });
            parents != 1 || spread || overlap
        }
        Kind::CpuDyn(cpu_dyn) => {
            parents == 0
                || spread
                || cpu_dyn
                    .table
                    .iter()
                    .any(|e| e.premux as usize >= parents)
        }
        Kind::CpuClock(_) => parents != 2,
        Kind::Composite(composite) => {
            parents == 0 || (composite.mux.is_none() && parents != 1) || spread
        }
    };
    let misplaced_alternate =
        clock.has(Flag::ParentAlternate) && !matches!(clock.kind, Kind::Mux(_));
    if malformed || misplaced_alternate {
        return Err(ClkError::Malformed);
    }
    Ok(())
}

/// Depth-first walk along parent edges.
fn visit(clocks: &[Clock], index: usize, marks: &mut [Mark]) -> Result<(), ClkError> {
    match marks[index] {
        Mark::Done => return Ok(()),
        Mark::Active => return Err(ClkError::CycleDetected),
        Mark::New => {}
    }
    marks[index] = Mark::Active;
    for parent in clocks[index].parents.iter() {
        visit(clocks, parent.index(), marks)?;
    }
    marks[index] = Mark::Done;
    Ok(())
}
