//! Binary trie index over fingerprint codes.
//!
//! Every inserted fingerprint becomes a 256-level path from the root; the
//! node at the end of a full path is a leaf carrying the group-assignment
//! history for that exact code. Lookup walks the query code bit by bit and
//! may spend a bounded budget of bit mismatches ("deviance") to reach
//! leaves of nearby codes.
//!
//! The trie performs no locking of its own; concurrent writers must be
//! serialized by the caller (the pipeline holds writers behind an
//! exclusive permit and only ever searches under shared access).

use crate::fingerprint::{Fingerprint, FINGERPRINT_BITS};

/// Opaque group identifier. Strictly increasing, never reused.
pub type GroupId = u64;

/// One node of the fingerprint trie.
///
/// Internal nodes own up to two children, keyed by bit value. A node is a
/// leaf once a fingerprint has been fully inserted along its path, at
/// which point `assignments` is non-empty; internal nodes carry no
/// payload.
#[derive(Debug, Default)]
pub struct TrieNode {
    zero: Option<Box<TrieNode>>,
    one: Option<Box<TrieNode>>,
    /// Append-only group-assignment history, most recent last.
    assignments: Vec<GroupId>,
}

impl TrieNode {
    fn is_leaf(&self) -> bool {
        !self.assignments.is_empty()
    }

    /// The leaf's current representative group id (most recent
    /// assignment), or `None` on internal nodes.
    #[must_use]
    pub fn group(&self) -> Option<GroupId> {
        self.assignments.last().copied()
    }

    /// Number of assignment records written at this leaf.
    #[must_use]
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// Assignment history, most recent first.
    pub fn assignments(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.assignments.iter().rev().copied()
    }
}

/// Trie index mapping 256-bit fingerprint codes to group assignments.
///
/// Nodes are created lazily on first insertion along a path and never
/// deleted; the index is append-only for the lifetime of a grouping run.
#[derive(Debug, Default)]
pub struct FingerprintTrie {
    root: TrieNode,
}

impl FingerprintTrie {
    /// Create an empty trie.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `code`, recording `group` at its leaf.
    ///
    /// Walks the full 256-bit path from the root, creating missing nodes,
    /// then appends an assignment record. Inserting a code that is already
    /// present appends to the existing leaf's history instead of creating
    /// a second leaf.
    pub fn insert(&mut self, code: &Fingerprint, group: GroupId) {
        let mut node = &mut self.root;
        for i in 0..FINGERPRINT_BITS {
            let slot = if code.bit(i) == 0 {
                &mut node.zero
            } else {
                &mut node.one
            };
            node = slot.get_or_insert_with(Box::default);
        }
        node.assignments.push(group);
    }

    /// All leaves whose codes differ from `code` in at most `deviance`
    /// bits, in traversal order.
    ///
    /// At each level the child matching the query bit is descended with
    /// the budget unchanged; the opposite child is descended only while
    /// budget remains, consuming one unit. Matches from the matching
    /// branch precede matches from the deviant branch, so an exact match
    /// (when present) is always first. No ranking or deduplication is
    /// applied.
    #[must_use]
    pub fn find_neighbors(&self, code: &Fingerprint, deviance: u32) -> Vec<&TrieNode> {
        let mut found = Vec::new();
        collect_neighbors(&self.root, code, deviance, 0, &mut found);
        found
    }

    /// Representative group id of the first leaf within `deviance` bits of
    /// `code`, if any.
    #[must_use]
    pub fn nearest_group(&self, code: &Fingerprint, deviance: u32) -> Option<GroupId> {
        self.find_neighbors(code, deviance)
            .first()
            .and_then(|leaf| leaf.group())
    }

    /// Count leaves via full traversal.
    ///
    /// With `count_assignments` set, sums assignment-history lengths
    /// instead (total entries recorded vs unique codes indexed). Reporting
    /// only; not used on the grouping hot path.
    #[must_use]
    pub fn leaf_count(&self, count_assignments: bool) -> usize {
        count_leaves(&self.root, count_assignments)
    }

    /// Whether any fingerprint has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.zero.is_none() && self.root.one.is_none() && !self.root.is_leaf()
    }
}

fn collect_neighbors<'a>(
    node: &'a TrieNode,
    code: &Fingerprint,
    deviance: u32,
    depth: usize,
    found: &mut Vec<&'a TrieNode>,
) {
    if node.is_leaf() {
        found.push(node);
        return;
    }
    if depth >= FINGERPRINT_BITS {
        // A full path always ends in a leaf; there are no further bits to
        // match below this point.
        return;
    }

    let (matching, deviant) = if code.bit(depth) == 0 {
        (node.zero.as_deref(), node.one.as_deref())
    } else {
        (node.one.as_deref(), node.zero.as_deref())
    };

    if let Some(child) = matching {
        collect_neighbors(child, code, deviance, depth + 1, found);
    }
    if deviance > 0 {
        if let Some(child) = deviant {
            collect_neighbors(child, code, deviance - 1, depth + 1, found);
        }
    }
}

fn count_leaves(node: &TrieNode, count_assignments: bool) -> usize {
    if node.is_leaf() {
        return if count_assignments {
            node.assignments.len()
        } else {
            1
        };
    }

    let mut total = 0;
    if let Some(child) = node.zero.as_deref() {
        total += count_leaves(child, count_assignments);
    }
    if let Some(child) = node.one.as_deref() {
        total += count_leaves(child, count_assignments);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::FINGERPRINT_BYTES;

    /// A code with the given bits (MSB-first indices) set.
    fn code_with_bits(bits: &[usize]) -> Fingerprint {
        let mut bytes = [0u8; FINGERPRINT_BYTES];
        for &bit in bits {
            bytes[bit / 8] |= 1 << (7 - (bit % 8));
        }
        Fingerprint::from_bytes(bytes)
    }

    #[test]
    fn test_empty_trie() {
        let trie = FingerprintTrie::new();
        assert!(trie.is_empty());
        assert_eq!(trie.leaf_count(false), 0);
        assert_eq!(trie.leaf_count(true), 0);
        assert!(trie.find_neighbors(&code_with_bits(&[]), 10).is_empty());
        assert_eq!(trie.nearest_group(&code_with_bits(&[]), 10), None);
    }

    #[test]
    fn test_exact_match() {
        let mut trie = FingerprintTrie::new();
        let code = code_with_bits(&[0, 17, 255]);
        trie.insert(&code, 7);

        assert!(!trie.is_empty());
        assert_eq!(trie.nearest_group(&code, 0), Some(7));
        assert_eq!(trie.leaf_count(false), 1);
    }

    #[test]
    fn test_zero_deviance_rejects_near_codes() {
        let mut trie = FingerprintTrie::new();
        trie.insert(&code_with_bits(&[]), 1);

        // One bit away: visible only with budget.
        let near = code_with_bits(&[0]);
        assert_eq!(trie.nearest_group(&near, 0), None);
        assert_eq!(trie.nearest_group(&near, 1), Some(1));
    }

    #[test]
    fn test_deviance_monotonicity() {
        let mut trie = FingerprintTrie::new();
        trie.insert(&code_with_bits(&[]), 1); // distance 0 from query
        trie.insert(&code_with_bits(&[0]), 2); // distance 1
        trie.insert(&code_with_bits(&[0, 1]), 3); // distance 2

        let query = code_with_bits(&[]);
        let groups_at = |d: u32| -> Vec<GroupId> {
            trie.find_neighbors(&query, d)
                .iter()
                .filter_map(|leaf| leaf.group())
                .collect()
        };

        assert_eq!(groups_at(0), vec![1]);
        assert_eq!(groups_at(1), vec![1, 2]);
        assert_eq!(groups_at(2), vec![1, 2, 3]);

        // More budget never loses matches.
        for d in 0..4 {
            let narrow = groups_at(d);
            let wide = groups_at(d + 1);
            assert!(narrow.iter().all(|g| wide.contains(g)));
        }
    }

    #[test]
    fn test_matching_branch_results_come_first() {
        let mut trie = FingerprintTrie::new();
        let exact = code_with_bits(&[]);
        let near = code_with_bits(&[0]);
        trie.insert(&near, 2);
        trie.insert(&exact, 1);

        // Even though the near code was inserted first, the exact leaf is
        // found on the matching branch and returned ahead of it.
        let groups: Vec<GroupId> = trie
            .find_neighbors(&exact, 5)
            .iter()
            .filter_map(|leaf| leaf.group())
            .collect();
        assert_eq!(groups, vec![1, 2]);
        assert_eq!(trie.nearest_group(&exact, 5), Some(1));
    }

    #[test]
    fn test_budget_spent_on_mismatched_bits() {
        let mut trie = FingerprintTrie::new();
        // Two mismatches relative to the query, in separate bytes.
        trie.insert(&code_with_bits(&[3, 100]), 9);

        let query = code_with_bits(&[]);
        assert_eq!(trie.nearest_group(&query, 1), None);
        assert_eq!(trie.nearest_group(&query, 2), Some(9));
    }

    #[test]
    fn test_exact_match_idempotence() {
        let mut trie = FingerprintTrie::new();
        let code = code_with_bits(&[42, 43]);

        trie.insert(&code, 1);
        assert_eq!(trie.leaf_count(false), 1);
        assert_eq!(trie.leaf_count(true), 1);

        trie.insert(&code, 2);
        assert_eq!(trie.leaf_count(false), 1, "no second leaf for a duplicate code");
        assert_eq!(trie.leaf_count(true), 2, "assignment history grows instead");

        // The representative id is the most recent assignment, and the
        // history is exposed most-recent-first.
        let leaves = trie.find_neighbors(&code, 0);
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].group(), Some(2));
        assert_eq!(leaves[0].assignment_count(), 2);
        assert_eq!(leaves[0].assignments().collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn test_leaf_count_over_many_codes() {
        let mut trie = FingerprintTrie::new();
        for i in 0..50u64 {
            // Distinct codes: vary a whole byte so the paths split early.
            let mut bytes = [0u8; FINGERPRINT_BYTES];
            bytes[0] = i as u8;
            bytes[16] = 0xA5;
            trie.insert(&Fingerprint::from_bytes(bytes), i);
        }
        assert_eq!(trie.leaf_count(false), 50);
        assert_eq!(trie.leaf_count(true), 50);
    }

    #[test]
    fn test_all_matches_within_bound_returned() {
        let mut trie = FingerprintTrie::new();
        trie.insert(&code_with_bits(&[10]), 1);
        trie.insert(&code_with_bits(&[20]), 2);
        trie.insert(&code_with_bits(&[10, 20, 30]), 3);

        // Both single-bit codes are one mismatch from the query; the
        // three-bit code is out of budget. At the first split (bit 10) the
        // matching branch holds the bit-20 code, so it is returned first.
        let query = code_with_bits(&[]);
        let groups: Vec<GroupId> = trie
            .find_neighbors(&query, 2)
            .iter()
            .filter_map(|leaf| leaf.group())
            .collect();
        assert_eq!(groups, vec![2, 1]);
    }
}
