//! Set of domains already handed to the scanner.

use std::collections::HashSet;

use crate::dns::DomainName;

/// Domains dispatched for assessment during this process lifetime.
///
/// Insert-only. Membership is case-insensitive because [`DomainName`] is
/// normalized on construction.
#[derive(Debug, Default, Clone)]
pub struct SeenDomains {
    domains: HashSet<DomainName>,
}

impl SeenDomains {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn contains(&self, domain: &DomainName) -> bool {
        self.domains.contains(domain)
    }

    /// Record a domain. Returns `true` if it was not already present.
    #[inline]
    pub fn insert(&mut self, domain: DomainName) -> bool {
        self.domains.insert(domain)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
