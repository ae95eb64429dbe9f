// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! The in-memory block DAG and everything derived from it.
//!
//! [`ChainStore`] owns the accepted blocks, the parent/child links, the
//! per-block chain lengths, the pending buffer for out-of-order arrivals,
//! the current head, and the memoized balance/paid caches. All mutation
//! happens through [`ChainStore::admit`] and [`ChainStore::create_block`];
//! adapters wrap the store in a lock and keep I/O outside of it, so the
//! admission pipeline itself never suspends.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, warn};

use crate::bigint::BigNum;
use crate::blocks::{Block, Change, ROOT_HASH};
use crate::chain::validation::{
    self, ChangeError, Pairing, PAYMENT_RANGE, PAYOUT_RANGE,
};
use crate::chain::weight;
use crate::crypto;
use crate::registry::UserRegistry;

/// Every account starts with this many tickets at ROOT.
pub const STARTING_TICKETS: i64 = 20;

/// What [`ChainStore::admit`] did with a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmitOutcome {
    /// Inserted, head updated if it won fork choice, pending drained.
    Accepted { hash: BigNum },
    /// Already stored; identity is content-derived, the first copy stays.
    Duplicate,
    /// Bad signature or invalid semantics; dropped without a trace.
    Rejected,
    /// Signature-valid but its parent is unknown; buffered. The caller
    /// should ask its peer for the missing parent.
    Parked { missing: BigNum },
}

/// Block store, fork choice, caches, and pending buffer in one owned value.
pub struct ChainStore {
    registry: UserRegistry,
    blocks: HashMap<BigNum, Block>,
    /// `lengths[h] = lengths[parent(h)] + 1`; ROOT is pre-seeded at 0.
    lengths: HashMap<BigNum, u64>,
    children: HashMap<BigNum, HashSet<BigNum>>,
    head: BigNum,
    /// missing parent hash → blocks waiting on it, in arrival order.
    pending: HashMap<BigNum, Vec<Block>>,
    balances: HashMap<BigNum, HashMap<String, i64>>,
    paid: HashMap<BigNum, HashMap<String, HashSet<String>>>,
}

impl ChainStore {
    pub fn new(registry: UserRegistry) -> Self {
        let root_balances = registry
            .names()
            .map(|name| (name.to_owned(), STARTING_TICKETS))
            .collect();
        Self {
            registry,
            blocks: HashMap::new(),
            lengths: HashMap::from([(ROOT_HASH.clone(), 0)]),
            children: HashMap::new(),
            head: ROOT_HASH.clone(),
            pending: HashMap::new(),
            balances: HashMap::from([(ROOT_HASH.clone(), root_balances)]),
            paid: HashMap::from([(ROOT_HASH.clone(), HashMap::new())]),
        }
    }

    pub fn registry(&self) -> &UserRegistry {
        &self.registry
    }

    /// Change-hash of the current head (ROOT while the chain is empty).
    pub fn head(&self) -> &BigNum {
        &self.head
    }

    pub fn contains(&self, hash: &BigNum) -> bool {
        self.blocks.contains_key(hash)
    }

    /// ROOT-aware lookup: `None` for ROOT and for anything unknown.
    pub fn block(&self, hash: &BigNum) -> Option<&Block> {
        self.blocks.get(hash)
    }

    /// Chain length of a stored block; 0 for ROOT.
    pub fn chain_len(&self, hash: &BigNum) -> u64 {
        self.lengths.get(hash).copied().unwrap_or(0)
    }

    pub fn children(&self, hash: &BigNum) -> Option<&HashSet<BigNum>> {
        self.children.get(hash)
    }

    /// All accepted blocks, live or not.
    pub fn blocks(&self) -> impl Iterator<Item = (&BigNum, &Block)> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// End-to-end admission pipeline for blocks from peers or local
    /// submissions. Negative outcomes are silent by design: gossip must
    /// never bounce errors back across the network. The only outward
    /// effect is the `missing` hash in [`AdmitOutcome::Parked`], which the
    /// gossip layer turns into a fetch request on the channel the block
    /// came from.
    pub fn admit(&mut self, block: Block) -> AdmitOutcome {
        let hash = block.change.hash();
        if self.blocks.contains_key(&hash) {
            return AdmitOutcome::Duplicate;
        }
        if !self.signature_ok(&block, &hash) {
            debug!(%hash, src = %block.change.src, "dropping block with bad signature");
            return AdmitOutcome::Rejected;
        }
        let parent = block.change.old.clone();
        if parent != *ROOT_HASH && !self.blocks.contains_key(&parent) {
            debug!(%hash, missing = %parent, "parking block until its parent arrives");
            self.pending.entry(parent.clone()).or_default().push(block);
            return AdmitOutcome::Parked { missing: parent };
        }
        if let Err(reason) = self.validate_change(&block.change) {
            debug!(%hash, %reason, "dropping invalid block");
            return AdmitOutcome::Rejected;
        }
        self.insert_block(hash.clone(), block);
        self.drain_pending(&hash);
        AdmitOutcome::Accepted { hash }
    }

    /// Builds and signs a block applying `src → dst: n` on top of the
    /// current head. Does not admit it; the caller decides when.
    pub fn create_block(
        &mut self,
        src: &str,
        dst: &str,
        n: i64,
        memo: &str,
        privkey: &BigNum,
    ) -> Result<Block, ChangeError> {
        let change = Change {
            dst: dst.to_owned(),
            memo: memo.to_owned(),
            n,
            old: self.head.clone(),
            src: src.to_owned(),
        };
        self.validate_change(&change)?;
        let modulus = self
            .registry
            .pubkey(src)
            .ok_or_else(|| ChangeError::UnknownUser(src.to_owned()))?;
        let hash = change.hash();
        let signature = crypto::sign(&hash, privkey, modulus);
        if !crypto::verify(&hash, &signature, modulus) {
            return Err(ChangeError::WrongKey);
        }
        Ok(Block { change, signature })
    }

    /// Checks a change against the registry, the role rules, the amount
    /// limits, and (for payouts) the paid state at its parent. The first
    /// failed rule wins.
    pub fn validate_change(&mut self, change: &Change) -> Result<(), ChangeError> {
        if !self.registry.is_known(&change.src) {
            return Err(ChangeError::UnknownUser(change.src.clone()));
        }
        if !self.registry.is_known(&change.dst) {
            return Err(ChangeError::UnknownUser(change.dst.clone()));
        }
        let pairing =
            validation::classify(&change.src, &change.dst).ok_or(ChangeError::NotAuthorized)?;
        match pairing {
            Pairing::Payment { player, booth } => {
                if validation::is_namesake(player, booth) {
                    return Err(ChangeError::NotAuthorized);
                }
                if !PAYMENT_RANGE.contains(&change.n) {
                    return Err(ChangeError::InvalidAmount);
                }
            }
            Pairing::Payout { player, booth } => {
                if validation::is_namesake(player, booth) {
                    return Err(ChangeError::NotAuthorized);
                }
                if !PAYOUT_RANGE.contains(&change.n) {
                    return Err(ChangeError::InvalidAmount);
                }
                let paid = self.paid_at(&change.old);
                if !paid.get(player).is_some_and(|set| set.contains(booth)) {
                    return Err(ChangeError::NotPaid);
                }
            }
        }
        Ok(())
    }

    /// Ticket balances as of block `hash`. Lazily fills the memo cache for
    /// every uncached ancestor on the way down; entries never invalidate
    /// because a block's ancestry is immutable once stored. The returned
    /// map is the caller's to mutate.
    pub fn balances_at(&mut self, hash: &BigNum) -> HashMap<String, i64> {
        if !self.balances.contains_key(hash) && !self.blocks.contains_key(hash) {
            warn!(%hash, "balance query for unknown block");
            return HashMap::new();
        }
        // Iterative walk: chains can be hundreds of thousands of blocks
        // deep, far past any sane recursion limit.
        let mut path: Vec<(BigNum, String, String, i64)> = Vec::new();
        let mut cursor = hash.clone();
        while !self.balances.contains_key(&cursor) {
            let Some(block) = self.blocks.get(&cursor) else {
                warn!(ancestor = %cursor, "block store is missing an ancestor");
                return HashMap::new();
            };
            path.push((
                cursor.clone(),
                block.change.src.clone(),
                block.change.dst.clone(),
                block.change.n,
            ));
            cursor = block.change.old.clone();
        }
        let mut acc = self.balances.get(&cursor).cloned().unwrap_or_default();
        for (node, src, dst, n) in path.into_iter().rev() {
            *acc.entry(src).or_insert(STARTING_TICKETS) -= n;
            *acc.entry(dst).or_insert(STARTING_TICKETS) += n;
            self.balances.insert(node, acc.clone());
        }
        acc
    }

    /// Per-player set of booths currently paid, as of block `hash`. Same
    /// memoization contract as [`ChainStore::balances_at`].
    pub fn paid_at(&mut self, hash: &BigNum) -> HashMap<String, HashSet<String>> {
        if !self.paid.contains_key(hash) && !self.blocks.contains_key(hash) {
            warn!(%hash, "paid-state query for unknown block");
            return HashMap::new();
        }
        let mut path: Vec<(BigNum, String, String)> = Vec::new();
        let mut cursor = hash.clone();
        while !self.paid.contains_key(&cursor) {
            let Some(block) = self.blocks.get(&cursor) else {
                warn!(ancestor = %cursor, "block store is missing an ancestor");
                return HashMap::new();
            };
            path.push((
                cursor.clone(),
                block.change.src.clone(),
                block.change.dst.clone(),
            ));
            cursor = block.change.old.clone();
        }
        let mut acc = self.paid.get(&cursor).cloned().unwrap_or_default();
        for (node, src, dst) in path.into_iter().rev() {
            if let Some(pairing) = validation::classify(&src, &dst) {
                match pairing {
                    Pairing::Payment { player, booth } => {
                        acc.entry(player.to_owned()).or_default().insert(booth.to_owned());
                    }
                    Pairing::Payout { player, booth } => {
                        acc.entry(player.to_owned()).or_default().remove(booth);
                    }
                }
            }
            self.paid.insert(node, acc.clone());
        }
        acc
    }

    /// Balances at the head, omitting accounts still at the starting
    /// amount.
    pub fn accounts(&mut self) -> HashMap<String, i64> {
        let head = self.head.clone();
        self.balances_at(&head)
            .into_iter()
            .filter(|(_, tickets)| *tickets != STARTING_TICKETS)
            .collect()
    }

    /// True iff `hash` is on the path from the head back to ROOT.
    ///
    /// Walks head-ancestors only down to the target's own chain length, so
    /// a recently submitted block near the head is answered in a handful
    /// of steps no matter how long the chain is.
    pub fn is_live(&self, hash: &BigNum) -> bool {
        if !self.blocks.contains_key(hash) {
            return false;
        }
        let target_len = self.chain_len(hash);
        let mut cursor = &self.head;
        while self.chain_len(cursor) > target_len {
            match self.blocks.get(cursor) {
                Some(block) => cursor = &block.change.old,
                None => return false,
            }
        }
        cursor == hash
    }

    fn signature_ok(&self, block: &Block, hash: &BigNum) -> bool {
        self.registry
            .pubkey(&block.change.src)
            .is_some_and(|key| crypto::verify(hash, &block.signature, key))
    }

    fn insert_block(&mut self, hash: BigNum, block: Block) {
        let length = self.chain_len(&block.change.old) + 1;
        self.children
            .entry(block.change.old.clone())
            .or_default()
            .insert(hash.clone());
        self.lengths.insert(hash.clone(), length);
        self.blocks.insert(hash.clone(), block);
        self.update_head(hash, length);
    }

    fn update_head(&mut self, hash: BigNum, length: u64) {
        let head_len = self.chain_len(&self.head);
        if weight::preferred(length, &hash, head_len, &self.head) {
            debug!(head = %hash, length, "head advanced");
            self.head = hash;
        }
    }

    /// Re-offers every block that was waiting on `start`, breadth-first
    /// through any chain of buffered descendants. Blocks that no longer
    /// validate are dropped silently; the rest become live before control
    /// returns to the caller.
    fn drain_pending(&mut self, start: &BigNum) {
        let mut ready = VecDeque::from([start.clone()]);
        while let Some(parent) = ready.pop_front() {
            let Some(waiters) = self.pending.remove(&parent) else {
                continue;
            };
            for block in waiters {
                let hash = block.change.hash();
                if self.blocks.contains_key(&hash) {
                    continue;
                }
                if let Err(reason) = self.validate_change(&block.change) {
                    debug!(%hash, %reason, "dropping parked block that no longer validates");
                    continue;
                }
                self.insert_block(hash.clone(), block);
                ready.push_back(hash);
            }
        }
    }
}
