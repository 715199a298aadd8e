use termtree::Tree;
use tracing::instrument;

use crate::domain::ConfigTree;

/// Render a configuration tree for terminal display.
pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for ConfigTree {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        build_tree(".".to_string(), self)
    }
}

fn build_tree(label: String, node: &ConfigTree) -> Tree<String> {
    match node {
        ConfigTree::Leaf(value) => Tree::new(format!("{label} = {value}")),
        ConfigTree::Branch(children) => {
            let leaves: Vec<_> = children
                .iter()
                .map(|(key, child)| build_tree(key.clone(), child))
                .collect();
            Tree::new(label).with_leaves(leaves)
        }
    }
}
