//! Capabilities shared by staged domain objects.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::issue::{Issue, IssueSet};

/// Key of a verbatim record in the staging store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VerbatimKey(pub u64);

impl fmt::Display for VerbatimKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Objects carrying a per-dataset business identifier.
pub trait HasIdentity {
    fn id(&self) -> Option<&str>;
}

/// Objects that remember the raw record they were interpreted from.
pub trait HasVerbatimProvenance {
    fn verbatim_key(&self) -> Option<VerbatimKey>;
    fn set_verbatim_key(&mut self, key: VerbatimKey);
}

/// Objects accumulating data quality issues.
pub trait HasIssues {
    fn issues(&self) -> &IssueSet;
    fn issues_mut(&mut self) -> &mut IssueSet;

    fn add_issue(&mut self, issue: Issue) {
        self.issues_mut().insert(issue);
    }

    fn has_issue(&self, issue: Issue) -> bool {
        self.issues().contains(&issue)
    }
}

/// Implements the three capabilities for a struct with `id`,
/// `verbatim_key` and `issues` fields.
macro_rules! impl_capabilities {
    ($ty:ty) => {
        impl $crate::capability::HasIdentity for $ty {
            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }
        }

        impl $crate::capability::HasVerbatimProvenance for $ty {
            fn verbatim_key(&self) -> Option<$crate::capability::VerbatimKey> {
                self.verbatim_key
            }

            fn set_verbatim_key(&mut self, key: $crate::capability::VerbatimKey) {
                self.verbatim_key = Some(key);
            }
        }

        impl $crate::capability::HasIssues for $ty {
            fn issues(&self) -> &$crate::issue::IssueSet {
                &self.issues
            }

            fn issues_mut(&mut self) -> &mut $crate::issue::IssueSet {
                &mut self.issues
            }
        }
    };
}

pub(crate) use impl_capabilities;
