// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::bigint::BigNum;

/// Fork-choice comparison: a candidate displaces the head when its chain is
/// strictly longer, or equally long with a numerically smaller hash.
///
/// Deterministic over any arrival order, so agents that have seen the same
/// block set always agree on the head.
pub(crate) fn preferred(
    candidate_len: u64,
    candidate: &BigNum,
    head_len: u64,
    head: &BigNum,
) -> bool {
    candidate_len > head_len || (candidate_len == head_len && candidate < head)
}
