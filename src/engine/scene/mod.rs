// Retained scene graph of transform nodes

use glam::Vec3;

/// Handle to a node in the scene graph
///
/// Generational: handles to removed nodes go stale instead of aliasing
/// whatever reuses the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// A single transform node
#[derive(Debug)]
struct Node {
    generation: u32,
    alive: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// World position; the z component doubles as draw depth for 2D scenes
    position: Vec3,
    /// Rotation around the z axis, in radians
    rotation: f32,
}

impl Node {
    fn fresh(generation: u32) -> Self {
        Self {
            generation,
            alive: true,
            parent: None,
            children: Vec::new(),
            position: Vec3::ZERO,
            rotation: 0.0,
        }
    }
}

/// Scene graph owning all transform nodes
///
/// Stale or foreign handles degrade to no-ops on mutation and `None` on
/// reads, so holding a handle past removal is harmless.
pub struct SceneGraph {
    nodes: Vec<Node>,
    free: Vec<u32>,
    root: NodeId,
}

impl SceneGraph {
    /// Create a scene graph containing only the root node
    pub fn new() -> Self {
        let root = NodeId {
            index: 0,
            generation: 0,
        };
        Self {
            nodes: vec![Node::fresh(0)],
            free: Vec::new(),
            root,
        }
    }

    /// The implicit root every attached subtree hangs off
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a new detached node
    pub fn create_node(&mut self) -> NodeId {
        if let Some(index) = self.free.pop() {
            let generation = self.nodes[index as usize].generation + 1;
            self.nodes[index as usize] = Node::fresh(generation);
            NodeId { index, generation }
        } else {
            let index = self.nodes.len() as u32;
            self.nodes.push(Node::fresh(0));
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    /// Attach a node under a parent, detaching it from any current parent
    pub fn attach(&mut self, child: NodeId, parent: NodeId) {
        if !self.contains(child) || !self.contains(parent) || child == parent {
            return;
        }
        self.detach(child);
        self.nodes[child.index as usize].parent = Some(parent);
        self.nodes[parent.index as usize].children.push(child);
    }

    /// Detach a node from its parent; no-op if already detached
    pub fn detach(&mut self, node: NodeId) {
        if !self.contains(node) {
            return;
        }
        let Some(parent) = self.nodes[node.index as usize].parent.take() else {
            return;
        };
        let siblings = &mut self.nodes[parent.index as usize].children;
        if let Some(pos) = siblings.iter().position(|&c| c == node) {
            siblings.swap_remove(pos);
        }
    }

    /// Remove a node, detaching it and orphaning its children
    ///
    /// The root cannot be removed.
    pub fn remove(&mut self, node: NodeId) {
        if !self.contains(node) || node == self.root {
            return;
        }
        self.detach(node);
        let children = std::mem::take(&mut self.nodes[node.index as usize].children);
        for child in children {
            self.nodes[child.index as usize].parent = None;
        }
        self.nodes[node.index as usize].alive = false;
        self.free.push(node.index);
    }

    /// Whether the handle refers to a live node
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes
            .get(node.index as usize)
            .map(|n| n.alive && n.generation == node.generation)
            .unwrap_or(false)
    }

    /// The node's parent, if attached
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|n| n.parent)
    }

    /// Whether the node currently has a parent
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.parent(node).is_some()
    }

    /// World position of the node
    pub fn position(&self, node: NodeId) -> Option<Vec3> {
        self.get(node).map(|n| n.position)
    }

    /// Set the world position of the node
    pub fn set_position(&mut self, node: NodeId, position: Vec3) {
        if let Some(n) = self.get_mut(node) {
            n.position = position;
        }
    }

    /// Z-axis rotation of the node, in radians
    pub fn rotation(&self, node: NodeId) -> Option<f32> {
        self.get(node).map(|n| n.rotation)
    }

    /// Set the z-axis rotation of the node, in radians
    pub fn set_rotation(&mut self, node: NodeId, rotation: f32) {
        if let Some(n) = self.get_mut(node) {
            n.rotation = rotation;
        }
    }

    /// Number of live nodes, including the root
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    fn get(&self, node: NodeId) -> Option<&Node> {
        if self.contains(node) {
            Some(&self.nodes[node.index as usize])
        } else {
            None
        }
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut Node> {
        if self.contains(node) {
            Some(&mut self.nodes[node.index as usize])
        } else {
            None
        }
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
