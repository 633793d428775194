//! Normalized DNS query names.

use std::fmt;

/// A DNS query name in canonical form.
///
/// Names are stored lowercase with a single trailing period removed, so two
/// names that differ only in case or in their fully-qualified suffix compare
/// equal and hash to the same bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomainName(String);

impl DomainName {
    /// Normalize a raw query name.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let lowered = raw.as_ref().to_ascii_lowercase();
        let name = lowered.strip_suffix('.').unwrap_or(&lowered);
        Self(name.to_string())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name looks like a reverse lookup.
    ///
    /// This is a plain substring test on `in-addr`, so forward names that
    /// happen to contain it (`my-in-addr.example`) are treated as reverse
    /// lookups too.
    #[inline]
    pub fn is_reverse_lookup(&self) -> bool {
        self.0.contains("in-addr")
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DomainName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
