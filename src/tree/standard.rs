// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Standard tree (`standard-v1` dump format).
//!
//! # File Format
//! ```text
//! {
//!   "format": "standard-v1",
//!   "leafEncoding": ["address", "address"],
//!   "tree": ["0x<root>", ..., "0x<leaf>"],
//!   "values": [{ "value": ["0x..", "0x.."], "treeIndex": 7 }, ...]
//! }
//! ```
//! `values` keeps the caller's original entry order. Leaves are placed in the
//! tree sorted by hash.

use std::io::Read;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};
use crate::hash::{hash_pair, leaf_hash};
use crate::multiproof::{multi_proof_for_positions, MultiProof};
use crate::tree::MerkleTree;
use crate::types::{Address, Entry, Hash32};

pub const FORMAT: &str = "standard-v1";
pub const LEAF_ENCODING: [&str; 2] = ["address", "address"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardTreeData {
    pub format: String,
    pub leaf_encoding: Vec<String>,
    pub tree: Vec<Hash32>,
    pub values: Vec<StandardValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardValue {
    pub value: (Address, Address),
    pub tree_index: usize,
}

#[derive(Debug, Clone)]
pub struct StandardTree {
    tree: Vec<Hash32>,
    entries: Vec<Entry>,
    tree_indices: Vec<usize>,
    /// leaf hash -> value index
    hash_lookup: FxHashMap<Hash32, usize>,
}

impl StandardTree {
    /// Builds a tree over `entries`, keeping their order as the value order.
    pub fn of(entries: &[Entry]) -> Result<Self> {
        if entries.is_empty() {
            return Err(KernelError::MalformedTree("expected non-zero number of leaves".to_string()));
        }

        let mut hashed: Vec<(usize, Hash32)> = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, leaf_hash(e)))
            .collect();
        hashed.sort_by(|a, b| a.1.cmp(&b.1));

        let n = hashed.len();
        let len = 2 * n - 1;
        let mut tree = vec![Hash32::ZERO; len];
        let mut tree_indices = vec![0usize; n];

        for (k, (value_index, hash)) in hashed.iter().enumerate() {
            let pos = len - 1 - k;
            tree[pos] = *hash;
            tree_indices[*value_index] = pos;
        }
        for i in (0..len - n).rev() {
            tree[i] = hash_pair(&tree[2 * i + 1], &tree[2 * i + 2]);
        }

        Ok(Self::assemble(tree, entries.to_vec(), tree_indices))
    }

    /// Reads and validates a `standard-v1` dump.
    pub fn load<R: Read>(reader: R) -> Result<Self> {
        let data: StandardTreeData = serde_json::from_reader(reader)?;
        Self::from_data(data)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let data: StandardTreeData = serde_json::from_str(json)?;
        Self::from_data(data)
    }

    pub fn from_data(data: StandardTreeData) -> Result<Self> {
        if data.format != FORMAT {
            return Err(KernelError::MalformedTree(format!("unknown format {:?}", data.format)));
        }
        if data.leaf_encoding != LEAF_ENCODING {
            return Err(KernelError::MalformedTree(format!(
                "unsupported leaf encoding {:?}",
                data.leaf_encoding
            )));
        }

        let (entries, tree_indices): (Vec<Entry>, Vec<usize>) = data
            .values
            .into_iter()
            .map(|v| (Entry::from(v.value), v.tree_index))
            .unzip();

        let tree = Self::assemble(data.tree, entries, tree_indices);
        tree.validate()?;
        Ok(tree)
    }

    fn assemble(tree: Vec<Hash32>, entries: Vec<Entry>, tree_indices: Vec<usize>) -> Self {
        let hash_lookup = tree_indices
            .iter()
            .enumerate()
            .filter_map(|(value_index, &pos)| tree.get(pos).map(|h| (*h, value_index)))
            .collect();

        Self {
            tree,
            entries,
            tree_indices,
            hash_lookup,
        }
    }

    /// Full structural check: node count, leaf placement, every hash.
    pub fn validate(&self) -> Result<()> {
        let n = self.entries.len();
        if n == 0 {
            // An empty dump has no root and nothing to prove.
            if !self.tree.is_empty() {
                return Err(KernelError::MalformedTree(format!(
                    "{} nodes but no values",
                    self.tree.len()
                )));
            }
            return Ok(());
        }
        if self.tree.len() != 2 * n - 1 {
            return Err(KernelError::MalformedTree(format!(
                "{} nodes cannot hold {} leaves",
                self.tree.len(),
                n
            )));
        }

        let len = self.tree.len();
        let mut seen = vec![false; len];
        for (value_index, (entry, &pos)) in self.entries.iter().zip(&self.tree_indices).enumerate() {
            if pos >= len || 2 * pos + 1 < len {
                return Err(KernelError::MalformedTree(format!(
                    "value {} points at non-leaf position {}",
                    value_index, pos
                )));
            }
            if std::mem::replace(&mut seen[pos], true) {
                return Err(KernelError::MalformedTree(format!("leaf position {} used twice", pos)));
            }
            if self.tree[pos] != leaf_hash(entry) {
                return Err(KernelError::MalformedTree(format!(
                    "value {} does not hash to leaf {}",
                    value_index, pos
                )));
            }
        }

        for i in 0..len - n {
            if self.tree[i] != hash_pair(&self.tree[2 * i + 1], &self.tree[2 * i + 2]) {
                return Err(KernelError::MalformedTree(format!("node {} does not match its children", i)));
            }
        }
        Ok(())
    }

    /// Serializable dump, inverse of [`StandardTree::from_data`].
    pub fn dump(&self) -> StandardTreeData {
        StandardTreeData {
            format: FORMAT.to_string(),
            leaf_encoding: LEAF_ENCODING.iter().map(|s| s.to_string()).collect(),
            tree: self.tree.clone(),
            values: self
                .entries
                .iter()
                .zip(&self.tree_indices)
                .map(|(e, &tree_index)| StandardValue {
                    value: e.as_tuple(),
                    tree_index,
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.dump())?)
    }

    pub fn entries(&self) -> impl Iterator<Item = (usize, &Entry)> {
        self.entries.iter().enumerate()
    }
}

impl MerkleTree for StandardTree {
    /// Zero for a tree loaded from an empty dump.
    fn root(&self) -> Hash32 {
        self.tree.first().copied().unwrap_or(Hash32::ZERO)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn entry(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    fn multi_proof(&self, indices: &[usize]) -> Result<MultiProof> {
        let len = self.entries.len();
        let mut requested = vec![false; len];
        let mut positions = Vec::with_capacity(indices.len());
        for &index in indices {
            if index >= len {
                return Err(KernelError::LeafOutOfRange { index, len });
            }
            if std::mem::replace(&mut requested[index], true) {
                return Err(KernelError::DuplicateLeaf(index));
            }
            positions.push(self.tree_indices[index]);
        }

        let raw = multi_proof_for_positions(&self.tree, &positions)?;
        let leaves = raw
            .leaf_positions
            .iter()
            .map(|pos| {
                self.hash_lookup
                    .get(&self.tree[*pos])
                    .map(|&value_index| self.entries[value_index])
                    .ok_or_else(|| KernelError::MalformedTree(format!("no value for leaf position {}", pos)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(MultiProof {
            leaves,
            proof: raw.proof,
            proof_flags: raw.proof_flags,
        })
    }
}
