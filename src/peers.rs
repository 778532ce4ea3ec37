// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Peer auto-selection by progressively relaxing the classification filter.

use crate::reference::{EquityRow, EquityTable};
use std::collections::HashSet;

/// Number of classification levels kept by each attempt, most specific first:
/// (macro, sector, industry, basic) -> (macro, sector, industry) -> (macro, sector)
/// -> (macro) -> no filter.
const RELAXATION_STEPS: [usize; 5] = [4, 3, 2, 1, 0];

/// Symbols of `table` matching the first `depth` levels of `target`, target first.
///
/// A level whose target value is missing matches nothing, so only the target
/// survives that attempt.
pub fn filter_peers(table: &EquityTable, target: &EquityRow, depth: usize) -> Vec<String> {
    let wanted = target.levels();

    let mut seen = HashSet::new();
    let mut peers = vec![target.symbol.clone()];
    seen.insert(target.symbol.clone());

    for row in table.rows() {
        let levels = row.levels();
        let matches = (0..depth).all(|i| match (wanted[i], levels[i]) {
            (Some(want), Some(have)) => want == have,
            _ => false,
        });
        if matches && seen.insert(row.symbol.clone()) {
            peers.push(row.symbol.clone());
        }
    }

    peers
}

/// Pick peer candidates for `target`, widening the filter until at least
/// `min_peers` symbols (target included) are found. If even the unfiltered
/// table is short, the unfiltered set is returned.
pub fn select_peers(table: &EquityTable, target: &EquityRow, min_peers: usize) -> Vec<String> {
    for depth in RELAXATION_STEPS {
        let peers = filter_peers(table, target, depth);
        if peers.len() >= min_peers {
            tracing::debug!(
                "Selected {} peers for {} at filter depth {}",
                peers.len(),
                target.symbol,
                depth
            );
            return peers;
        }
    }
    filter_peers(table, target, 0)
}
