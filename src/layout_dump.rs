use crate::tree::Tree;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub root: String,
    pub nodes: Vec<NodeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: usize,
    pub full_name: String,
    pub label: String,
    pub parent: Option<usize>,
    pub depth: usize,
    pub folded: bool,
    pub visible: bool,
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub abs_x: f64,
    pub abs_y: f64,
}

impl LayoutDump {
    pub fn from_tree(tree: &Tree) -> Self {
        let nodes = tree
            .ids()
            .map(|id| {
                let node = tree.node(id);
                NodeDump {
                    id: id.index(),
                    full_name: node.full_name().to_string(),
                    label: node.name().to_string(),
                    parent: node.parent().map(|p| p.index()),
                    depth: node.depth(),
                    folded: node.is_folded(),
                    visible: tree.is_visible(id),
                    x: node.visual.x,
                    y: node.visual.y,
                    r: node.visual.r,
                    abs_x: node.visual.abs_x,
                    abs_y: node.visual.abs_y,
                }
            })
            .collect();

        LayoutDump {
            root: tree.node(tree.root()).full_name().to_string(),
            nodes,
        }
    }
}

pub fn write_layout_dump(path: &Path, tree: &Tree) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_tree(tree);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_lists_every_node_with_parent_links() {
        let mut tree = Tree::new("p").unwrap();
        let a = tree.add_child(tree.root(), "A").unwrap();
        tree.add_child(a, "B").unwrap();
        let dump = LayoutDump::from_tree(&tree);
        assert_eq!(dump.root, "p");
        assert_eq!(dump.nodes.len(), 3);
        assert_eq!(dump.nodes[2].parent, Some(a.index()));
        let json = serde_json::to_value(&dump).unwrap();
        assert_eq!(json["nodes"][1]["full_name"], "p.A");
    }
}
