// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod aws;
pub mod bridge;
pub mod command;
pub mod config;
pub mod configuration;
pub mod envelope;
pub mod error;
#[cfg(test)]
pub mod test_support;
