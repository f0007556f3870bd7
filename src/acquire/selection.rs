use std::collections::BTreeSet;
use std::fmt;

/// Which seasons or voices to process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Subset(BTreeSet<u32>),
}

impl Selection {
    /// An empty list means no restriction
    pub fn from_ids(ids: impl IntoIterator<Item = u32>) -> Self {
        let ids: BTreeSet<u32> = ids.into_iter().collect();
        if ids.is_empty() {
            Selection::All
        } else {
            Selection::Subset(ids)
        }
    }

    /// Site ids are compared numerically; an id that is not a number only
    /// passes the `All` selection.
    pub fn includes(&self, id: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Subset(ids) => id
                .trim()
                .parse::<u32>()
                .map(|n| ids.contains(&n))
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => write!(f, "all"),
            Selection::Subset(ids) => {
                let ids: Vec<String> = ids.iter().map(u32::to_string).collect();
                write!(f, "[{}]", ids.join(", "))
            }
        }
    }
}
