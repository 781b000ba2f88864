use crate::weighted::WeightedGraph;
use std::collections::{BTreeMap, HashMap};

/// Disjoint set forest with union by rank and path compression.
///
/// Elements are numbered `0..n`. Each root keeps the size of its set, and
/// the forest keeps track of the number of sets. A segmentation of an
/// image is a forest over its pixels in row-major order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisjointSetForest {
    parent: Vec<usize>,
    rank: Vec<u32>,
    size: Vec<usize>,
    components: usize,
}

impl DisjointSetForest {
    /// Create a forest of `number_of_elements` singletons
    pub fn new(number_of_elements: usize) -> Self {
        Self {
            parent: (0..number_of_elements).collect(),
            rank: vec![0; number_of_elements],
            size: vec![1; number_of_elements],
            components: number_of_elements,
        }
    }

    /// Build the forest where elements with equal labels are in the same set
    pub fn from_labels(labels: &[usize]) -> Self {
        let mut forest = Self::new(labels.len());
        let mut representative: HashMap<usize, usize> = HashMap::new();

        for (element, &label) in labels.iter().enumerate() {
            match representative.get(&label) {
                Some(&rep) => {
                    forest.union(rep, element);
                }
                None => {
                    representative.insert(label, element);
                }
            }
        }

        forest
    }

    /// Representative of the set containing `element`, compressing the path
    pub fn find(&mut self, element: usize) -> usize {
        let root = self.root(element);

        let mut current = element;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }

        root
    }

    /// Representative of the set containing `element`, without modifying the forest
    pub fn root(&self, element: usize) -> usize {
        let mut current = element;
        while self.parent[current] != current {
            current = self.parent[current];
        }
        current
    }

    /// Whether two elements are in the same set
    pub fn same_set(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }

    /// Merge the sets containing `a` and `b`, returning the new root
    pub fn union(&mut self, a: usize, b: usize) -> usize {
        let root_a = self.find(a);
        let root_b = self.find(b);

        if root_a == root_b {
            return root_a;
        }

        let (new_root, child) = match self.rank[root_a].cmp(&self.rank[root_b]) {
            std::cmp::Ordering::Less => (root_b, root_a),
            std::cmp::Ordering::Greater => (root_a, root_b),
            std::cmp::Ordering::Equal => {
                self.rank[root_a] += 1;
                (root_a, root_b)
            }
        };

        self.parent[child] = new_root;
        self.size[new_root] += self.size[child];
        self.components -= 1;

        new_root
    }

    /// Size of the set containing `element`
    pub fn component_size(&self, element: usize) -> usize {
        self.size[self.root(element)]
    }

    pub fn number_of_elements(&self) -> usize {
        self.parent.len()
    }

    pub fn number_of_components(&self) -> usize {
        self.components
    }

    /// Map each root to a dense index in `0..number_of_components()`,
    /// ordered by ascending root
    pub fn root_indexes(&self) -> BTreeMap<usize, usize> {
        let mut roots: Vec<usize> = (0..self.number_of_elements())
            .filter(|&element| self.parent[element] == element)
            .collect();
        roots.sort_unstable();

        roots
            .into_iter()
            .enumerate()
            .map(|(index, root)| (root, index))
            .collect()
    }

    /// Dense index of the set of each element, numbered by first appearance
    pub fn component_labels(&self) -> Vec<usize> {
        let mut ids: HashMap<usize, usize> = HashMap::new();
        (0..self.number_of_elements())
            .map(|element| {
                let root = self.root(element);
                let next = ids.len();
                *ids.entry(root).or_insert(next)
            })
            .collect()
    }

    /// Dense index of the set of each element, following [`root_indexes`](Self::root_indexes)
    pub fn segment_indexes(&self) -> Vec<usize> {
        let indexes = self.root_indexes();
        (0..self.number_of_elements())
            .map(|element| indexes[&self.root(element)])
            .collect()
    }

    /// Members of each set, indexed as in [`root_indexes`](Self::root_indexes)
    pub fn components(&self) -> Vec<Vec<usize>> {
        let indexes = self.root_indexes();
        let mut components = vec![Vec::new(); indexes.len()];
        for element in 0..self.number_of_elements() {
            components[indexes[&self.root(element)]].push(element);
        }
        components
    }

    /// Fuse sets of at most `min_size` elements with their neighbours along
    /// the edges of `graph`. When a mask is given, only edges between two
    /// masked elements are considered.
    pub fn fuse_small_components(
        &mut self,
        graph: &WeightedGraph,
        min_size: usize,
        mask: Option<&[bool]>,
    ) {
        for edge in graph.edges() {
            if let Some(mask) = mask {
                if !mask[edge.source] || !mask[edge.destination] {
                    continue;
                }
            }

            let source = self.find(edge.source);
            let destination = self.find(edge.destination);

            if source != destination
                && (self.size[source] <= min_size || self.size[destination] <= min_size)
            {
                self.union(source, destination);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_initial_forest_has_singletons() {
        let mut forest = DisjointSetForest::new(5);
        for element in 0..5 {
            assert_eq!(forest.find(element), element);
            assert_eq!(forest.component_size(element), 1);
        }
        assert_eq!(forest.number_of_components(), 5);
    }

    #[test]
    fn test_union_by_rank() {
        let mut forest = DisjointSetForest::new(4);
        let root = forest.union(0, 1);
        assert_eq!(root, 0);
        // rank(0) = 1 > rank(2) = 0, 2 goes under 0
        assert_eq!(forest.union(2, 0), 0);
        assert_eq!(forest.component_size(2), 3);
        assert_eq!(forest.number_of_components(), 2);
        // joining already joined elements is a no-op
        assert_eq!(forest.union(1, 2), 0);
        assert_eq!(forest.number_of_components(), 2);
    }

    #[test]
    fn test_root_indexes_and_labels() {
        let mut forest = DisjointSetForest::new(6);
        forest.union(4, 5);
        forest.union(1, 3);

        let indexes = forest.root_indexes();
        assert_eq!(indexes.len(), 4);
        assert_eq!(indexes.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2, 4]);
        assert_eq!(forest.component_labels(), vec![0, 1, 2, 1, 3, 3]);
        assert_eq!(forest.segment_indexes(), vec![0, 1, 2, 1, 3, 3]);
        assert_eq!(
            forest.components(),
            vec![vec![0], vec![1, 3], vec![2], vec![4, 5]]
        );
    }

    #[test]
    fn test_from_labels() {
        let mut forest = DisjointSetForest::from_labels(&[2, 0, 2, 1, 0]);
        assert_eq!(forest.number_of_components(), 3);
        assert!(forest.same_set(0, 2));
        assert!(forest.same_set(1, 4));
        assert!(!forest.same_set(0, 3));
    }

    #[test]
    fn test_fuse_small_components_respects_mask() {
        // path 0 - 1 - 2 - 3
        let mut graph = WeightedGraph::new(4);
        graph.add_edge(0, 1, 1.0);
        graph.add_edge(1, 2, 1.0);
        graph.add_edge(2, 3, 1.0);

        let mut forest = DisjointSetForest::new(4);
        forest.union(0, 1);
        let mask = [true, true, true, false];
        forest.fuse_small_components(&graph, 1, Some(&mask));

        assert!(forest.same_set(1, 2));
        assert!(!forest.same_set(2, 3));
        assert_eq!(forest.number_of_components(), 2);
    }

    proptest! {
        #[test]
        fn proptest_unions_join_sets(pairs in proptest::collection::vec((0usize..64, 0usize..64), 0..80)) {
            let mut forest = DisjointSetForest::new(64);
            for &(a, b) in &pairs {
                forest.union(a, b);
            }
            for &(a, b) in &pairs {
                prop_assert_eq!(forest.find(a), forest.find(b));
            }

            let sizes: usize = forest
                .root_indexes()
                .keys()
                .map(|&root| forest.component_size(root))
                .sum();
            prop_assert_eq!(sizes, 64);
            prop_assert_eq!(forest.root_indexes().len(), forest.number_of_components());
        }
    }
}
