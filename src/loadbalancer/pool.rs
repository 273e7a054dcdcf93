use crate::endpoint::BoxEndpoint;
use crate::error::{ProxyError, Result};

/// A protected callable unit for one instance
pub struct PoolMember<Req, Resp> {
    name: String,
    endpoint: BoxEndpoint<Req, Resp>,
}

impl<Req, Resp> PoolMember<Req, Resp> {
    pub fn new(name: impl Into<String>, endpoint: BoxEndpoint<Req, Resp>) -> Self {
        Self {
            name: name.into(),
            endpoint,
        }
    }

    /// Instance name used in logs and errors
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &BoxEndpoint<Req, Resp> {
        &self.endpoint
    }
}

/// Fixed, ordered set of instance endpoints. Never empty.
pub struct InstancePool<Req, Resp> {
    members: Vec<PoolMember<Req, Resp>>,
}

impl<Req, Resp> InstancePool<Req, Resp> {
    /// Create a pool; an empty member list is rejected
    pub fn new(members: Vec<PoolMember<Req, Resp>>) -> Result<Self> {
        if members.is_empty() {
            return Err(ProxyError::NoEndpoints);
        }
        Ok(Self { members })
    }

    pub fn members(&self) -> &[PoolMember<Req, Resp>] {
        &self.members
    }

    pub fn get(&self, index: usize) -> Option<&PoolMember<Req, Resp>> {
        self.members.get(index)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Instance names in pool order
    pub fn names(&self) -> Vec<String> {
        self.members.iter().map(|m| m.name.clone()).collect()
    }
}
