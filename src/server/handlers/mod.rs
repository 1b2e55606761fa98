// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! HTTP handlers

pub mod chat;
pub mod health;
pub mod models;
pub mod threads;
pub mod tools;
