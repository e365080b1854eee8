//! Result types for loc-extract

/// Ordered set of nodes matched by a query, in document order.
///
/// Nodes are handles into the tree owned by the engine that produced
/// them; the set never owns the nodes themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSet<N> {
    nodes: Vec<N>,
}

impl<N> NodeSet<N> {
    pub fn new(nodes: Vec<N>) -> Self {
        Self { nodes }
    }

    pub fn empty() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, N> {
        self.nodes.iter()
    }
}

impl<N> Default for NodeSet<N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<N> FromIterator<N> for NodeSet<N> {
    fn from_iter<I: IntoIterator<Item = N>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<N> IntoIterator for NodeSet<N> {
    type Item = N;
    type IntoIter = std::vec::IntoIter<N>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a, N> IntoIterator for &'a NodeSet<N> {
    type Item = &'a N;
    type IntoIter = std::slice::Iter<'a, N>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

/// Counts reported after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Nodes selected by the query
    pub matched: usize,
    /// Lines written; matches with empty text are skipped
    pub printed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let set: NodeSet<u32> = [3, 1, 2].into_iter().collect();
        assert_eq!(set.len(), 3);
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![3, 1, 2]);
    }

    #[test]
    fn empty_set() {
        let set: NodeSet<u32> = NodeSet::default();
        assert!(set.is_empty());
        assert_eq!(set.into_iter().count(), 0);
    }
}
