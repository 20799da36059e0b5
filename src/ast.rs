//! The deferred-computation tree and its builders.
//!
//! A computation is described up front as a [`Node`] tree and resolved later
//! by the engine. Four shapes compose recursively:
//!
//! - **Resolved** - a finished value; terminal.
//! - **Pending** - a pure transform applied positionally once every child
//!   resolves.
//! - **PendingFlat** - like Pending, but the transform produces *more*
//!   computation: its result is itself a node whose resolution is
//!   substituted in place (monadic join).
//! - **Unfetched** - a raw [`DataSource`] request that has not gone over the
//!   wire yet; leaf.
//!
//! Trees are immutable values. [`Node::inject`] consumes a tree and builds a
//! new, more-resolved one against the current [`Cache`]; nothing is ever
//! mutated in place, so partially resolved trees from different rounds never
//! alias each other.
//!
//! Callers do not construct variants directly. The builders [`value`],
//! [`request`], [`map`], [`mapcat`], [`collect`], and [`traverse`] are the
//! whole construction surface, which keeps the tree's invariants (for
//! example, that a `Resolved` node never holds further computation) checked
//! at build time rather than at every traversal.

use std::fmt;
use std::sync::Arc;

use crate::cache::Cache;
use crate::core::error::MusterError;
use crate::core::source::DataSource;
use crate::core::value::FetchValue;

/// Pure positional transform for `Pending` nodes.
type Transform<V> = Arc<dyn Fn(Vec<V>) -> V + Send + Sync>;

/// Transform for `PendingFlat` nodes; produces further computation.
type FlatTransform<V, E> = Arc<dyn Fn(Vec<V>) -> Result<Node<V, E>, MusterError> + Send + Sync>;

enum Repr<V, E> {
    Resolved(V),
    Pending {
        transform: Transform<V>,
        children: Vec<Node<V, E>>,
    },
    PendingFlat {
        transform: FlatTransform<V, E>,
        children: Vec<Node<V, E>>,
    },
    Unfetched(Arc<dyn DataSource<V, E>>),
}

/// A deferred computation over remote data.
///
/// `V` is the value type ([`FetchValue`]) and `E` the environment handed to
/// every fetch. Build trees with the free functions in this module and hand
/// them to [`execute`](crate::execute) or [`run`](crate::run).
pub struct Node<V, E = ()> {
    repr: Repr<V, E>,
}

impl<V, E> Node<V, E> {
    fn new(repr: Repr<V, E>) -> Self {
        Self { repr }
    }

    /// Whether this node is a terminal, fully computed value.
    pub fn is_resolved(&self) -> bool {
        matches!(self.repr, Repr::Resolved(_))
    }

    /// The resolved value, if this node is terminal.
    pub fn resolved(&self) -> Option<&V> {
        match &self.repr {
            Repr::Resolved(value) => Some(value),
            _ => None,
        }
    }

    /// Consumes the node, yielding its value if terminal and the node back
    /// otherwise.
    pub(crate) fn into_resolved(self) -> Result<V, Self> {
        match self.repr {
            Repr::Resolved(value) => Ok(value),
            repr => Err(Self::new(repr)),
        }
    }

    /// Collects every not-yet-requested source in the tree, in document
    /// order. Composite nodes contribute the union of their children;
    /// resolved subtrees contribute nothing.
    pub(crate) fn pending_sources(&self) -> Vec<Arc<dyn DataSource<V, E>>> {
        match &self.repr {
            Repr::Resolved(_) => Vec::new(),
            Repr::Unfetched(source) => vec![Arc::clone(source)],
            Repr::Pending { children, .. } | Repr::PendingFlat { children, .. } => {
                children.iter().flat_map(Self::pending_sources).collect()
            }
        }
    }
}

impl<V: FetchValue, E> Node<V, E> {
    /// Substitutes cached values into the tree, producing a new tree.
    ///
    /// - `Resolved` passes through untouched; injection is idempotent.
    /// - `Unfetched` becomes `Resolved` on a cache hit. On a miss it is
    ///   wrapped as a single-child identity `Pending`, which marks it as
    ///   needing a round trip while keeping the leaf discoverable by
    ///   [`pending_sources`](Self::pending_sources).
    /// - `Pending` resolves once every injected child is resolved, by
    ///   applying its transform to the children's values positionally.
    /// - `PendingFlat` additionally injects whatever node its transform
    ///   produced, so a produced request resolves straight from cache when
    ///   possible and otherwise waits for the next round.
    ///
    /// # Errors
    ///
    /// Fails only when a flat transform reports a defect, such as
    /// [`MusterError::NotASequence`] from `traverse`.
    pub(crate) fn inject(self, cache: &Cache<V>) -> Result<Self, MusterError> {
        let repr = match self.repr {
            Repr::Resolved(value) => Repr::Resolved(value),
            Repr::Unfetched(source) => match cache.get(source.kind(), &source.identity()) {
                Some(value) => Repr::Resolved(value.clone()),
                None => Repr::Pending {
                    transform: identity_transform(),
                    children: vec![Self::new(Repr::Unfetched(source))],
                },
            },
            Repr::Pending { transform, children } => {
                let children = inject_children(children, cache)?;
                match resolved_values(&children) {
                    Some(values) => Repr::Resolved(transform(values)),
                    None => Repr::Pending { transform, children },
                }
            }
            Repr::PendingFlat { transform, children } => {
                let children = inject_children(children, cache)?;
                match resolved_values(&children) {
                    Some(values) => return transform(values)?.inject(cache),
                    None => Repr::PendingFlat { transform, children },
                }
            }
        };
        Ok(Self::new(repr))
    }
}

fn inject_children<V: FetchValue, E>(
    children: Vec<Node<V, E>>,
    cache: &Cache<V>,
) -> Result<Vec<Node<V, E>>, MusterError> {
    children.into_iter().map(|child| child.inject(cache)).collect()
}

/// The children's values when every child is resolved, `None` otherwise.
fn resolved_values<V: Clone, E>(children: &[Node<V, E>]) -> Option<Vec<V>> {
    children
        .iter()
        .map(|child| match &child.repr {
            Repr::Resolved(value) => Some(value.clone()),
            _ => None,
        })
        .collect()
}

fn identity_transform<V>() -> Transform<V> {
    Arc::new(|mut values: Vec<V>| {
        values.pop().expect("round-trip wrapper always has exactly one child")
    })
}

/// Wraps a plain value as a terminal, already-resolved node.
///
/// The closed node type makes the classic misuse (wrapping a node as a
/// value) unrepresentable: this function only accepts `V`.
pub fn value<V, E>(value: V) -> Node<V, E> {
    Node::new(Repr::Resolved(value))
}

/// Wraps a [`DataSource`] as an unfetched leaf request.
pub fn request<V, E>(source: impl DataSource<V, E> + 'static) -> Node<V, E> {
    Node::new(Repr::Unfetched(Arc::new(source)))
}

/// Applies a pure transform to the values of `nodes` once they all resolve.
///
/// Values are passed positionally, in the order the nodes were given. When
/// called with a single transformable node the new transform is composed
/// onto the node's existing one instead of adding a wrapper layer, so
/// chained `map`s stay a single node deep.
pub fn map<V: 'static, E, F>(transform: F, nodes: Vec<Node<V, E>>) -> Node<V, E>
where
    F: Fn(Vec<V>) -> V + Send + Sync + 'static,
{
    let mut nodes = nodes;
    if nodes.len() == 1 {
        let only = nodes.remove(0);
        return match only.repr {
            Repr::Pending { transform: inner, children } => {
                let composed = move |values: Vec<V>| transform(vec![inner(values)]);
                Node::new(Repr::Pending {
                    transform: Arc::new(composed),
                    children,
                })
            }
            repr => Node::new(Repr::Pending {
                transform: Arc::new(transform),
                children: vec![Node::new(repr)],
            }),
        };
    }
    Node::new(Repr::Pending {
        transform: Arc::new(transform),
        children: nodes,
    })
}

/// Like [`map`], but the transform returns more computation.
///
/// Once every input resolves, the produced node is resolved in place: a
/// returned [`request`] is fetched in a later round, a returned [`value`]
/// finishes immediately, and deeper compositions recurse.
pub fn mapcat<V, E, F>(transform: F, nodes: Vec<Node<V, E>>) -> Node<V, E>
where
    F: Fn(Vec<V>) -> Node<V, E> + Send + Sync + 'static,
{
    Node::new(Repr::PendingFlat {
        transform: Arc::new(move |values| Ok(transform(values))),
        children: nodes,
    })
}

/// Gathers `nodes` into a single node resolving to the sequence of their
/// values, in input order. An empty input resolves to the empty sequence
/// without any fetching.
pub fn collect<V, E>(nodes: Vec<Node<V, E>>) -> Node<V, E>
where
    V: FetchValue,
{
    if nodes.is_empty() {
        return value(V::from_seq(Vec::new()));
    }
    map(V::from_seq, nodes)
}

/// Applies `transform` to each element of a fetched collection and gathers
/// the resulting nodes.
///
/// Once `collection` resolves, its value is taken apart with
/// [`FetchValue::into_seq`], `transform` maps every element to a new node
/// (a further request, a plain value, or any composition), and the results
/// are [`collect`]ed in element order.
///
/// Resolution fails with [`MusterError::NotASequence`] if the collection's
/// value has no sequence form.
pub fn traverse<V, E, F>(transform: F, collection: Node<V, E>) -> Node<V, E>
where
    V: FetchValue,
    F: Fn(V) -> Node<V, E> + Send + Sync + 'static,
{
    let flat = move |mut values: Vec<V>| {
        let source = values.pop().expect("traverse always has exactly one child");
        let items = source.into_seq().ok_or(MusterError::NotASequence)?;
        Ok(collect(items.into_iter().map(&transform).collect()))
    };
    Node::new(Repr::PendingFlat {
        transform: Arc::new(flat),
        children: vec![collection],
    })
}

impl<V: Clone, E> Clone for Node<V, E> {
    fn clone(&self) -> Self {
        let repr = match &self.repr {
            Repr::Resolved(value) => Repr::Resolved(value.clone()),
            Repr::Pending { transform, children } => Repr::Pending {
                transform: Arc::clone(transform),
                children: children.clone(),
            },
            Repr::PendingFlat { transform, children } => Repr::PendingFlat {
                transform: Arc::clone(transform),
                children: children.clone(),
            },
            Repr::Unfetched(source) => Repr::Unfetched(Arc::clone(source)),
        };
        Self::new(repr)
    }
}

impl<V: fmt::Debug, E> fmt::Debug for Node<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Resolved(value) => f.debug_tuple("Resolved").field(value).finish(),
            Repr::Pending { children, .. } => {
                f.debug_struct("Pending").field("children", children).finish_non_exhaustive()
            }
            Repr::PendingFlat { children, .. } => {
                f.debug_struct("PendingFlat").field("children", children).finish_non_exhaustive()
            }
            Repr::Unfetched(source) => f
                .debug_struct("Unfetched")
                .field("kind", &source.kind())
                .field("key", &source.identity())
                .finish(),
        }
    }
}
