use std::fmt;

use gitdag_types::ObjectHash;

/// An entry of the scheduler's FIFO worklist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkItem {
    /// Resolve, translate and dispatch this object.
    Object(ObjectHash),
    /// Every dependency of this object is satisfied; record it as migrated
    /// and notify the objects waiting on it.
    Complete(ObjectHash),
}

impl WorkItem {
    /// The object this item concerns.
    pub fn hash(&self) -> &ObjectHash {
        match self {
            Self::Object(h) | Self::Complete(h) => h,
        }
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(h) => write!(f, "object {}", h.short_hex()),
            Self::Complete(h) => write!(f, "complete {}", h.short_hex()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_variant() {
        let h = ObjectHash::from_raw([0xab; 20]);
        assert_eq!(WorkItem::Object(h).to_string(), "object abababab");
        assert_eq!(WorkItem::Complete(h).to_string(), "complete abababab");
        assert_eq!(WorkItem::Complete(h).hash(), &h);
    }
}
