use crate::containers::KeyedVec;
use crate::engine::variables::DomainId;

/// The values assigned to every domain when a solution was found.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Solution {
    values: KeyedVec<DomainId, i32>,
}

impl Solution {
    pub(crate) fn new(values: KeyedVec<DomainId, i32>) -> Solution {
        Solution { values }
    }

    /// The value of the domain in this solution.
    pub fn value(&self, domain: DomainId) -> i32 {
        self.values[domain]
    }

    pub fn num_domains(&self) -> usize {
        self.values.len()
    }

    pub fn contains_domain_id(&self, domain: DomainId) -> bool {
        self.values.get(domain).is_some()
    }
}
