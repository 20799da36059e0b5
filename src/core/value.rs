//! The value capability required of fetched data.
//!
//! `collect` builds a node whose resolved value is a sequence of its
//! children's values, and `traverse` iterates a resolved collection to fan
//! out further requests. Both need the engine's value type to know how to
//! build and take apart sequences of itself, which is what [`FetchValue`]
//! captures. The other engine requirements (`Clone + Send + Sync + 'static`)
//! ride along as supertraits so public signatures stay to a single bound.
//!
//! [`serde_json::Value`] implements the trait out of the box (arrays are the
//! sequence form) and is the expected value type for callers who do not want
//! to define their own.

/// Capability set for values flowing through the engine.
///
/// `from_seq` and `into_seq` must round-trip: `into_seq(from_seq(items))`
/// yields `Some(items)` again.
pub trait FetchValue: Clone + Send + Sync + 'static {
    /// Build the sequence form of this value type from an ordered list.
    fn from_seq(items: Vec<Self>) -> Self;

    /// Take a value apart into its elements, or `None` if this value is not
    /// a sequence.
    fn into_seq(self) -> Option<Vec<Self>>;
}

impl FetchValue for serde_json::Value {
    fn from_seq(items: Vec<Self>) -> Self {
        Self::Array(items)
    }

    fn into_seq(self) -> Option<Vec<Self>> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }
}
