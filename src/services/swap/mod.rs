// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

pub mod augment;
pub mod engine;
pub mod lifecycle;
pub mod outcome;
pub mod resolver;
pub mod session;
