use bubble_core::{BubbleId, CodecError, GraphError};

/// Why an editor operation was refused. The graph is unchanged whenever one
/// of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("bubble text is empty")]
    EmptyText,

    #[error("bubble {0} does not exist")]
    UnknownBubble(BubbleId),

    #[error("{parent} already has the maximum of {limit} branches")]
    BranchLimit { parent: BubbleId, limit: usize },

    #[error("bubble {0} is being deleted")]
    Locked(BubbleId),

    #[error("bubble {0} is not a hyper bubble")]
    NotHyper(BubbleId),

    #[error("bubble {from} links to {target}, which no longer exists")]
    MissingLinkTarget { from: BubbleId, target: BubbleId },

    #[error("bubble {0} has no link set")]
    NoLink(BubbleId),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("undo snapshot failed: {0}")]
    Snapshot(String),
}
