//! SHA-256 Merkle aggregation.
//!
//! Leaves are hashed individually, then adjacent pairs are concatenated and
//! re-hashed level by level. A level with an odd number of nodes pairs its
//! last node with itself. A single leaf's root is just that leaf's hash.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::base58::digest_to_hex;
use crate::constants::DIGEST_LEN;
use crate::error::{Result, ZkStorageError};

type Node = [u8; DIGEST_LEN];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MerkleRoot(pub [u8; DIGEST_LEN]);

impl MerkleRoot {
    pub fn to_bytes(&self) -> [u8; DIGEST_LEN] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        digest_to_hex(&self.0)
    }
}

impl AsRef<[u8]> for MerkleRoot {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for MerkleRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

pub fn build_root<L: AsRef<[u8]>>(leaves: &[L]) -> Result<MerkleRoot> {
    MerkleTree::new(leaves).map(|tree| tree.root())
}

/// All levels of the tree, leaf hashes first.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    levels: Vec<Vec<Node>>,
}

impl MerkleTree {
    pub fn new<L: AsRef<[u8]>>(leaves: &[L]) -> Result<Self> {
        if leaves.is_empty() {
            return Err(ZkStorageError::EmptyTree);
        }

        let leaf_hashes: Vec<Node> = leaves.iter().map(|leaf| hash_leaf(leaf.as_ref())).collect();
        let mut levels = vec![leaf_hashes];
        while let Some(level) = levels.last().filter(|level| level.len() > 1) {
            let next = level
                .chunks(2)
                .map(|pair| hash_pair(&pair[0], pair.get(1).unwrap_or(&pair[0])))
                .collect();
            levels.push(next);
        }
        Ok(Self { levels })
    }

    pub fn root(&self) -> MerkleRoot {
        // `new` guarantees a non-empty top level
        MerkleRoot(self.levels[self.levels.len() - 1][0])
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaf_count() {
            return None;
        }
        let mut siblings = Vec::with_capacity(self.levels.len() - 1);
        let mut position = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = position ^ 1;
            siblings.push(*level.get(sibling).unwrap_or(&level[position]));
            position /= 2;
        }
        Some(MerkleProof { index, siblings })
    }
}

/// Sibling path from a leaf up to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    pub index: usize,
    pub siblings: Vec<[u8; DIGEST_LEN]>,
}

impl MerkleProof {
    pub fn verify(&self, leaf: &[u8], root: &MerkleRoot) -> bool {
        let mut node = hash_leaf(leaf);
        let mut position = self.index;
        for sibling in &self.siblings {
            node = if position % 2 == 0 {
                hash_pair(&node, sibling)
            } else {
                hash_pair(sibling, &node)
            };
            position /= 2;
        }
        node == root.0
    }
}

fn hash_leaf(leaf: &[u8]) -> Node {
    Sha256::digest(leaf).into()
}

fn hash_pair(left: &Node, right: &Node) -> Node {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}
