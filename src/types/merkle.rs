// Merkle - State root over every ledger record
use super::primitives::{hash256, BlockNumber, Hash};
use rs_merkle::{Hasher, MerkleTree};
use serde::{Deserialize, Serialize};

/// Blake3-based hasher for Merkle trees (same hash256 as commits)
#[derive(Clone)]
pub struct Blake3Hasher;

impl Hasher for Blake3Hasher {
    type Hash = [u8; 32];

    fn hash(data: &[u8]) -> Self::Hash {
        hash256(data)
    }
}

/// State root of the ledger as observed at a block height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRoot {
    /// The Merkle root hash
    pub root: Hash,

    /// Block height the root was taken at
    pub block_number: BlockNumber,
}

impl StateRoot {
    pub fn new(root: Hash, block_number: BlockNumber) -> Self {
        Self { root, block_number }
    }
}

/// Inclusion proof for a single ledger record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleProof {
    /// The encoded record being proven
    pub leaf: Vec<u8>,

    pub leaf_index: usize,

    /// Number of leaves in the tree the proof was generated from
    pub total_leaves: usize,

    /// Sibling hashes
    pub proof: Vec<[u8; 32]>,

    /// The root this proof verifies against
    pub root: Hash,
}

impl MerkleProof {
    /// Verify this Merkle proof against its own root
    pub fn verify(&self) -> bool {
        let leaf_hash = Blake3Hasher::hash(&self.leaf);
        rs_merkle::MerkleProof::<Blake3Hasher>::new(self.proof.clone()).verify(
            *self.root.as_bytes(),
            &[self.leaf_index],
            &[leaf_hash],
            self.total_leaves,
        )
    }
}

/// Merkle tree builder for state roots
pub struct StateMerkleTree {
    tree: MerkleTree<Blake3Hasher>,

    /// Leaves data (for proof generation)
    leaves: Vec<Vec<u8>>,
}

impl StateMerkleTree {
    /// Leaves must be supplied in a deterministic order
    pub fn new(leaves: Vec<Vec<u8>>) -> Self {
        let leaf_hashes: Vec<[u8; 32]> = leaves
            .iter()
            .map(|leaf| Blake3Hasher::hash(leaf))
            .collect();

        let tree = MerkleTree::<Blake3Hasher>::from_leaves(&leaf_hashes);

        Self { tree, leaves }
    }

    pub fn root(&self) -> Hash {
        match self.tree.root() {
            Some(root_hash) => Hash::from_bytes(root_hash),
            None => Hash::ZERO, // Empty tree
        }
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Index of the first leaf equal to `leaf`
    pub fn position(&self, leaf: &[u8]) -> Option<usize> {
        self.leaves.iter().position(|l| l.as_slice() == leaf)
    }

    /// Generate inclusion proof for a leaf at given index
    pub fn generate_proof(&self, leaf_index: usize) -> Option<MerkleProof> {
        let leaf = self.leaves.get(leaf_index)?;
        let proof = self.tree.proof(&[leaf_index]);

        Some(MerkleProof {
            leaf: leaf.clone(),
            leaf_index,
            total_leaves: self.leaves.len(),
            proof: proof.proof_hashes().to_vec(),
            root: self.root(),
        })
    }

    /// Verify a proof against this tree
    pub fn verify_proof(&self, proof: &MerkleProof) -> bool {
        proof.root == self.root() && proof.verify()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<Vec<u8>> {
        (0..n).map(|i| format!("record{}", i).into_bytes()).collect()
    }

    #[test]
    fn test_merkle_tree_creation() {
        let tree = StateMerkleTree::new(records(4));
        assert_ne!(tree.root(), Hash::ZERO);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_merkle_proof_generation_and_verification() {
        let tree = StateMerkleTree::new(records(4));

        let proof = tree.generate_proof(1).unwrap();
        assert!(proof.verify());
        assert!(tree.verify_proof(&proof));
    }

    #[test]
    fn test_merkle_proof_odd_leaf_count() {
        let tree = StateMerkleTree::new(records(5));

        for index in 0..5 {
            let proof = tree.generate_proof(index).unwrap();
            assert!(tree.verify_proof(&proof), "leaf {} must verify", index);
        }
        assert!(tree.generate_proof(5).is_none());
    }

    #[test]
    fn test_merkle_proof_invalid_modification() {
        let tree = StateMerkleTree::new(records(4));
        let mut proof = tree.generate_proof(1).unwrap();

        proof.leaf = b"record1_modified".to_vec();

        assert!(!proof.verify());
    }

    #[test]
    fn test_merkle_proof_wrong_root() {
        let tree1 = StateMerkleTree::new(records(2));
        let tree2 = StateMerkleTree::new(vec![b"other0".to_vec(), b"other1".to_vec()]);

        let proof = tree1.generate_proof(0).unwrap();
        assert!(!tree2.verify_proof(&proof));
    }

    #[test]
    fn test_empty_tree() {
        let tree = StateMerkleTree::new(vec![]);
        assert_eq!(tree.root(), Hash::ZERO);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_order_changes_root() {
        let mut reversed = records(3);
        reversed.reverse();
        assert_ne!(
            StateMerkleTree::new(records(3)).root(),
            StateMerkleTree::new(reversed).root()
        );
    }
}
