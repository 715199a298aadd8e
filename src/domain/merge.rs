//! Shallow depth-first merge of configuration trees
//!
//! `other` takes priority. Subtrees that only exist in `other` are shared by
//! handle, not copied.
//!
//! | self        | other        | result                              |
//! |-------------|--------------|-------------------------------------|
//! | empty       | anything     | self becomes a shallow copy of other |
//! | anything    | empty        | unchanged                           |
//! | branch      | branch       | per-key recursion, missing keys shared |
//! | leaf        | leaf         | other's value wins                  |
//! | leaf/branch | branch/leaf  | unchanged, recorded as conflict     |

use std::rc::Rc;

use tracing::{debug, instrument};

use super::node::ConfigTree;
use super::path::join;

/// Outcome of a merge.
///
/// Paths are dotted; the root is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Leaves whose value was replaced by a different one.
    pub overwritten: Vec<String>,
    /// Nodes left untouched because leaf and branch met.
    pub conflicts: Vec<String>,
}

impl MergeReport {
    /// True if no shape conflict was skipped.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

impl ConfigTree {
    /// Merge `other` into `self` in place.
    ///
    /// Shape conflicts are skipped silently; the returned report lists them.
    #[instrument(level = "trace", skip_all)]
    pub fn merge(&mut self, other: &ConfigTree) -> MergeReport {
        let mut report = MergeReport::default();
        self.merge_at("", other, &mut report);
        report
    }

    /// Consume `self`, merge `other` into it and return the result.
    pub fn merged(mut self, other: &ConfigTree) -> Self {
        let _ = self.merge(other);
        self
    }

    fn merge_at(&mut self, prefix: &str, other: &ConfigTree, report: &mut MergeReport) {
        if self.is_empty() {
            *self = other.clone();
            return;
        }
        if other.is_empty() {
            return;
        }

        match (self, other) {
            (ConfigTree::Branch(mine), ConfigTree::Branch(theirs)) => {
                for (key, their_child) in theirs {
                    match mine.get_mut(key) {
                        Some(my_child) => {
                            if !Rc::ptr_eq(my_child, their_child) {
                                Rc::make_mut(my_child).merge_at(
                                    &join(prefix, key),
                                    their_child,
                                    report,
                                );
                            }
                        }
                        None => {
                            mine.insert(key.clone(), Rc::clone(their_child));
                        }
                    }
                }
            }
            (ConfigTree::Leaf(mine), ConfigTree::Leaf(theirs)) => {
                if mine != theirs {
                    report.overwritten.push(prefix.to_string());
                    *mine = theirs.clone();
                }
            }
            _ => {
                debug!(path = prefix, "leaf/branch conflict, keeping existing node");
                report.conflicts.push(prefix.to_string());
            }
        }
    }
}
