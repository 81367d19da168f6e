use std::collections::HashMap;

use gochat_types::{Gender, UserInfo};

/// An online participant other than the local user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub identifier: String,
    pub gender: Gender,
}

impl RosterEntry {
    pub fn new(identifier: impl Into<String>, gender: Gender) -> Self {
        Self {
            identifier: identifier.into(),
            gender,
        }
    }
}

impl From<UserInfo> for RosterEntry {
    fn from(user: UserInfo) -> Self {
        Self {
            identifier: user.username,
            gender: user.gender.unwrap_or_default(),
        }
    }
}

/// Who is online, as of the latest snapshot.
///
/// Keeps snapshot order for display. The local identifier is never listed.
#[derive(Debug)]
pub struct Roster {
    local: String,
    entries: Vec<RosterEntry>,
    index: HashMap<String, usize>,
}

impl Roster {
    pub fn new(local: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Discard the current roster and install `snapshot`.
    ///
    /// A repeated identifier keeps its first position and its last attributes.
    pub fn replace_snapshot<I>(&mut self, snapshot: I)
    where
        I: IntoIterator<Item = RosterEntry>,
    {
        let mut entries: Vec<RosterEntry> = Vec::new();
        let mut index = HashMap::new();

        for entry in snapshot {
            if entry.identifier == self.local {
                continue;
            }
            match index.get(&entry.identifier) {
                Some(&pos) => entries[pos] = entry,
                None => {
                    index.insert(entry.identifier.clone(), entries.len());
                    entries.push(entry);
                }
            }
        }

        self.entries = entries;
        self.index = index;
    }

    pub fn get(&self, identifier: &str) -> Option<&RosterEntry> {
        self.index.get(identifier).map(|&pos| &self.entries[pos])
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.index.contains_key(identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RosterEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}
