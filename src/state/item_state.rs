/// Frontier item state definitions
///
/// Every dequeued `(url, depth)` pair moves through
/// `Queued → Classifying → {Downloading | Expanding | Dropped}`.
use std::fmt;

/// Why a frontier item or discovered link was not followed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// Deeper than the configured maximum depth
    DepthExceeded,
    /// Matches an excluded path segment
    Excluded,
    /// Host outside the start URL's domain
    ForeignDomain,
    /// Missing the start URL's locale segment
    ForeignLanguage,
    /// Already in the visited set
    AlreadyVisited,
    /// Resource already downloaded (tracking file or file on disk)
    AlreadyDownloaded,
    /// Page fetch failed or returned a non-200 status
    FetchFailed,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::DepthExceeded => "depth exceeded",
            Self::Excluded => "excluded path",
            Self::ForeignDomain => "foreign domain",
            Self::ForeignLanguage => "foreign language",
            Self::AlreadyVisited => "already visited",
            Self::AlreadyDownloaded => "already downloaded",
            Self::FetchFailed => "fetch failed",
        };
        f.write_str(label)
    }
}

/// State of a single frontier item during traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    /// Waiting in the frontier
    Queued,

    /// Dequeued, decision pending
    Classifying,

    // ===== Terminal States =====
    /// Downloadable resource handed to the download path
    Downloading,

    /// Page fetched and its links followed
    Expanding,

    /// Discarded without further work
    Dropped(DropReason),
}

impl ItemState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Queued | Self::Classifying)
    }

    /// Checks if a transition to another state is allowed
    pub fn can_transition_to(&self, target: &ItemState) -> bool {
        match self {
            Self::Queued => matches!(target, Self::Classifying),
            Self::Classifying => target.is_terminal(),
            _ => false,
        }
    }
}
