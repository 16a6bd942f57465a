//! Mount sinks
//!
//! The renderer is agnostic to what an element is. It only needs to append
//! nodes, replace one in place and remove one.

use super::node::{Node, NodeId};

/// Destination for rendered nodes
pub trait MountSink {
    /// Append a node at the end, returning its handle
    fn append(&mut self, node: Node) -> NodeId;

    /// Swap the node behind `id` in place. Unknown ids are ignored.
    fn replace(&mut self, id: NodeId, node: Node);

    /// Remove the node behind `id`. Unknown ids are ignored.
    fn remove(&mut self, id: NodeId);
}

/// In-memory ordered node list
#[derive(Debug, Default, Clone)]
pub struct DocumentSink {
    nodes: Vec<(NodeId, Node)>,
    next_id: NodeId,
}

impl DocumentSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().map(|(_, node)| node)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.position(id).map(|i| &self.nodes[i].1)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether any skeleton placeholder is still mounted
    pub fn has_skeleton(&self) -> bool {
        self.nodes().any(Node::is_skeleton)
    }

    /// Live components, in document order
    pub fn components(&self) -> Vec<&Node> {
        self.nodes().filter(|n| n.is_component()).collect()
    }

    /// Markup of the whole document
    pub fn to_markup(&self) -> String {
        self.nodes().map(Node::to_markup).collect()
    }

    fn position(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|(node_id, _)| *node_id == id)
    }
}

impl MountSink for DocumentSink {
    fn append(&mut self, node: Node) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.push((id, node));
        id
    }

    fn replace(&mut self, id: NodeId, node: Node) {
        if let Some(i) = self.position(id) {
            self.nodes[i].1 = node;
        }
    }

    fn remove(&mut self, id: NodeId) {
        if let Some(i) = self.position(id) {
            self.nodes.remove(i);
        }
    }
}

impl<S: MountSink + ?Sized> MountSink for &mut S {
    fn append(&mut self, node: Node) -> NodeId {
        (**self).append(node)
    }

    fn replace(&mut self, id: NodeId, node: Node) {
        (**self).replace(id, node)
    }

    fn remove(&mut self, id: NodeId) {
        (**self).remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(html: &str) -> Node {
        Node::Text {
            html: html.to_string(),
            inline: Vec::new(),
        }
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut doc = DocumentSink::new();
        let a = doc.append(text("a"));
        doc.append(text("b"));
        doc.replace(a, text("A"));
        assert_eq!(doc.to_markup(), "Ab");
    }

    #[test]
    fn test_ids_stay_stable_after_remove() {
        let mut doc = DocumentSink::new();
        let a = doc.append(text("a"));
        let b = doc.append(text("b"));
        doc.remove(a);
        doc.replace(b, text("B"));
        doc.remove(a);

        assert_eq!(doc.len(), 1);
        assert_eq!(doc.get(b), Some(&text("B")));
        assert_eq!(doc.to_markup(), "B");
    }
}
