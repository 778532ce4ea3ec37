// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

pub mod config;
pub mod error;
pub mod logging;
pub mod market_data;
pub mod peers;
pub mod pipeline;
pub mod prices;
pub mod progress;
pub mod reference;
pub mod snapshot;
pub mod statements;
pub mod web;
pub mod workbook;
pub mod yahoo;
