use landgen_shared::RecordId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An offer's restriction over one kind of record.
///
/// In the store an empty linked-record list means "applies to everything";
/// that convention is decoded once, here, and never re-derived from emptiness.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<RecordId>", into = "Vec<RecordId>")]
pub enum Targeting {
    #[default]
    Unrestricted,
    RestrictedTo(BTreeSet<RecordId>),
}

impl Targeting {
    pub fn only<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<RecordId>,
    {
        Targeting::from(ids.into_iter().map(Into::into).collect::<Vec<_>>())
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Targeting::Unrestricted)
    }

    /// Whether a record with this id falls inside the target set
    pub fn admits(&self, id: &RecordId) -> bool {
        match self {
            Targeting::Unrestricted => true,
            Targeting::RestrictedTo(ids) => ids.contains(id),
        }
    }

    pub fn ids(&self) -> Option<&BTreeSet<RecordId>> {
        match self {
            Targeting::Unrestricted => None,
            Targeting::RestrictedTo(ids) => Some(ids),
        }
    }

    /// Human summary used in log lines and outcome messages
    pub fn describe(&self) -> String {
        match self {
            Targeting::Unrestricted => "ALL".to_string(),
            Targeting::RestrictedTo(ids) => ids
                .iter()
                .map(RecordId::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl From<Vec<RecordId>> for Targeting {
    fn from(ids: Vec<RecordId>) -> Self {
        let ids: BTreeSet<RecordId> = ids.into_iter().filter(|id| !id.is_blank()).collect();
        if ids.is_empty() {
            Targeting::Unrestricted
        } else {
            Targeting::RestrictedTo(ids)
        }
    }
}

impl From<Targeting> for Vec<RecordId> {
    fn from(targeting: Targeting) -> Self {
        match targeting {
            Targeting::Unrestricted => Vec::new(),
            Targeting::RestrictedTo(ids) => ids.into_iter().collect(),
        }
    }
}
