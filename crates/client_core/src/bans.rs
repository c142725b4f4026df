use shared::protocol::BannedPerson;

/// Ban history of one subject, in the order the backend returned it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BanHistory {
    entries: Vec<BannedPerson>,
}

impl BanHistory {
    pub fn new(entries: Vec<BannedPerson>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[BannedPerson] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Last non-deleted entry in list order. No timestamp sorting happens here.
    pub fn current(&self) -> Option<&BannedPerson> {
        self.latest(false)
    }

    pub fn latest(&self, include_deleted: bool) -> Option<&BannedPerson> {
        self.entries
            .iter()
            .rev()
            .find(|entry| include_deleted || !entry.ban.deleted)
    }
}

impl From<Vec<BannedPerson>> for BanHistory {
    fn from(entries: Vec<BannedPerson>) -> Self {
        Self::new(entries)
    }
}

#[cfg(test)]
#[path = "tests/bans_tests.rs"]
mod tests;
