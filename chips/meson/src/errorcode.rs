// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Standard error enum for clock operations.
//!
//! Construction errors (`DanglingParent`, `CycleDetected`, ...) are only
//! returned by `Graph::new` and mean the topology table is broken. All other
//! variants are operational and leave the graph usable.

use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum ClkError {
    /// The requested rate is not present in the node's rate table
    UnknownRate = 0,
    /// The requested rate lies outside the node's bounds
    OutOfRange = 1,
    /// The PLL did not report lock within the configured budget
    LockTimeout = 2,
    /// A node references a parent id that does not exist
    DanglingParent = 3,
    /// The parent relation contains a cycle
    CycleDetected = 4,
    /// A parent index outside the node's parent list
    InvalidParentIndex = 5,
    /// Two nodes share a name
    DuplicateName = 6,
    /// A node's id does not match its position in the table
    MisplacedId = 7,
    /// A register field names a domain that was not supplied
    MissingDomain = 8,
    /// A node payload is internally inconsistent
    Malformed = 9,
    /// No node with that id
    InvalidClock = 10,
    /// The node is owned by firmware and cannot be changed
    ReadOnly = 11,
    /// Operation is not supported by this node kind
    NoSupport = 12,
    /// A switch sequence is already in progress
    Busy = 13,
    /// Operation is not valid in the node's current state
    InvalidState = 14,
    /// The state requested is already set
    Already = 15,
    /// The hardware settled on a rate too far from the request
    RateMismatch = 16,
}

impl ClkError {
    /// Whether this error can only come out of topology validation.
    pub fn is_construction(self) -> bool {
        matches!(
            self,
            ClkError::DanglingParent
                | ClkError::CycleDetected
                | ClkError::DuplicateName
                | ClkError::MisplacedId
                | ClkError::MissingDomain
                | ClkError::Malformed
        )
    }
}

impl From<ClkError> for usize {
    fn from(err: ClkError) -> usize {
        err as usize
    }
}

/// Negative errno, for callers that speak the Linux clock API convention.
impl From<ClkError> for i32 {
    fn from(err: ClkError) -> i32 {
        const EPERM: i32 = 1;
        const EIO: i32 = 5;
        const EBUSY: i32 = 16;
        const ENODEV: i32 = 19;
        const EINVAL: i32 = 22;
        const ERANGE: i32 = 34;
        const ELOOP: i32 = 40;
        const EOPNOTSUPP: i32 = 95;
        const EALREADY: i32 = 114;
        const ETIMEDOUT: i32 = 110;

        -match err {
            ClkError::UnknownRate => EINVAL,
            ClkError::OutOfRange => ERANGE,
            ClkError::LockTimeout => ETIMEDOUT,
            ClkError::DanglingParent => ENODEV,
            ClkError::CycleDetected => ELOOP,
            ClkError::InvalidParentIndex => EINVAL,
            ClkError::DuplicateName => EINVAL,
            ClkError::MisplacedId => EINVAL,
            ClkError::MissingDomain => ENODEV,
            ClkError::Malformed => EINVAL,
            ClkError::InvalidClock => ENODEV,
            ClkError::ReadOnly => EPERM,
            ClkError::NoSupport => EOPNOTSUPP,
            ClkError::Busy => EBUSY,
            ClkError::InvalidState => EINVAL,
            ClkError::Already => EALREADY,
            ClkError::RateMismatch => EIO,
        }
    }
}

impl fmt::Display for ClkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ClkError::UnknownRate => "rate not in table",
            ClkError::OutOfRange => "rate out of range",
            ClkError::LockTimeout => "pll failed to lock",
            ClkError::DanglingParent => "dangling parent reference",
            ClkError::CycleDetected => "cycle in clock tree",
            ClkError::InvalidParentIndex => "invalid parent index",
            ClkError::DuplicateName => "duplicate clock name",
            ClkError::MisplacedId => "clock id does not match table position",
            ClkError::MissingDomain => "register domain not supplied",
            ClkError::Malformed => "malformed clock description",
            ClkError::InvalidClock => "no such clock",
            ClkError::ReadOnly => "clock is read-only",
            ClkError::NoSupport => "operation not supported",
            ClkError::Busy => "switch in progress",
            ClkError::InvalidState => "invalid state for operation",
            ClkError::Already => "already in requested state",
            ClkError::RateMismatch => "rate mismatch after change",
        };
        f.write_str(msg)
    }
}
