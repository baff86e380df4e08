// Node Delegate Pool - Délégation vers un noeud précis d'un subnet
use super::delegate_pool::{PoolKey, SharePool};
use crate::types::{SubnetId, SubnetNodeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// (subnet, node) pool key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub subnet_id: SubnetId,
    pub subnet_node_id: SubnetNodeId,
}

impl NodeKey {
    pub fn new(subnet_id: SubnetId, subnet_node_id: SubnetNodeId) -> Self {
        Self {
            subnet_id,
            subnet_node_id,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.subnet_id, self.subnet_node_id)
    }
}

impl PoolKey for NodeKey {}

/// Same share mechanics as the subnet pool, one pool per node
pub type NodeDelegatePool = SharePool<NodeKey>;
