// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Shared support for the harness tests.
//!
//! Scripted probes stand in for the classifier without a network; the
//! server helpers bind real listeners on ephemeral ports.

#![allow(dead_code)]

pub mod probes;
pub mod servers;
