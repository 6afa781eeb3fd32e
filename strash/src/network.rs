use std::borrow::Cow;

use zwohash::HashMap;

use crate::{error::NetworkError, AigNode, NodeRef};

#[derive(Debug)]
struct Input {
    node: u32,
    name: Option<String>,
}

#[derive(Debug)]
struct Latch {
    node: u32,
    next: Option<NodeRef>,
    name: Option<String>,
}

#[derive(Debug)]
struct Output {
    driver: NodeRef,
    name: Option<String>,
}

/// A structurally hashed and-inverter graph.
///
/// The network owns all of its nodes. Node index 0 is always the constant
/// node; inputs, latch output placeholders and and gates follow in creation
/// order. Every and gate is created through [`and2`][Self::and2], which
/// applies the constant and single-variable simplification laws and
/// deduplicates structurally equal gates, so the network never contains two
/// distinct gates with the same canonical fanin pair.
///
/// Acyclicity holds by construction: a gate can only reference nodes that
/// already exist, so every fanin has a strictly smaller node index.
#[derive(Debug)]
pub struct Network {
    nodes: Vec<AigNode>,
    strash: HashMap<[NodeRef; 2], u32>,
    inputs: Vec<Input>,
    latches: Vec<Latch>,
    outputs: Vec<Output>,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    /// Creates an empty network containing only the constant node.
    pub fn new() -> Self {
        Network {
            nodes: vec![AigNode::Const],
            strash: HashMap::default(),
            inputs: vec![],
            latches: vec![],
            outputs: vec![],
        }
    }

    /// The constant-false reference.
    #[inline]
    pub fn const_false(&self) -> NodeRef {
        NodeRef::FALSE
    }

    /// The constant-true reference.
    #[inline]
    pub fn const_true(&self) -> NodeRef {
        NodeRef::TRUE
    }

    fn alloc(&mut self, node: AigNode) -> u32 {
        let index = self.nodes.len();
        assert!(
            index <= NodeRef::MAX_INDEX as usize,
            "node index space exhausted"
        );
        self.nodes.push(node);
        index as u32
    }

    /// Creates a new primary input and returns a reference to it.
    pub fn add_input(&mut self) -> NodeRef {
        let pos = self.inputs.len() as u32;
        let node = self.alloc(AigNode::Input { pos });
        self.inputs.push(Input { node, name: None });
        NodeRef::new(node, false)
    }

    /// Creates a new latch output placeholder and returns a reference to
    /// it. The next-state driver is bound later with
    /// [`bind_latch_next`][Self::bind_latch_next].
    pub fn add_latch(&mut self) -> NodeRef {
        let pos = self.latches.len() as u32;
        let node = self.alloc(AigNode::Latch { pos });
        self.latches.push(Latch {
            node,
            next: None,
            name: None,
        });
        NodeRef::new(node, false)
    }

    /// Returns the unique and gate of `a` and `b`, creating it only when no
    /// structurally equal gate exists.
    ///
    /// Constant and single-variable cases never allocate: `and2(x, x)` is
    /// `x`, `and2(x, !x)` is false, false absorbs and true is the neutral
    /// element. Otherwise the fanin pair is canonicalized (higher node
    /// index first) and looked up in the structural-hash table.
    ///
    /// This is the only way gates enter the network; all graph invariants
    /// are enforced here.
    ///
    /// Panics when a fanin does not reference a node of this network.
    pub fn and2(&mut self, a: NodeRef, b: NodeRef) -> NodeRef {
        assert!(
            (a.index() as usize) < self.nodes.len() && (b.index() as usize) < self.nodes.len(),
            "fanin does not reference a node of this network"
        );

        if a.index() == b.index() {
            return if a == b { a } else { NodeRef::FALSE };
        }
        if a == NodeRef::FALSE || b == NodeRef::FALSE {
            return NodeRef::FALSE;
        }
        if a == NodeRef::TRUE {
            return b;
        }
        if b == NodeRef::TRUE {
            return a;
        }

        let fanins = if a.index() > b.index() { [a, b] } else { [b, a] };

        if let Some(&index) = self.strash.get(&fanins) {
            return NodeRef::new(index, false);
        }

        let index = self.alloc(AigNode::And { fanins });
        self.strash.insert(fanins, index);
        NodeRef::new(index, false)
    }

    /// Binds the next-state driver of latch `pos`. Each latch is bound
    /// exactly once.
    pub fn bind_latch_next(&mut self, pos: usize, driver: NodeRef) -> Result<(), NetworkError> {
        let latch = self
            .latches
            .get_mut(pos)
            .ok_or(NetworkError::NoSuchLatch(pos))?;
        if latch.next.is_some() {
            return Err(NetworkError::NextAlreadyBound(pos));
        }
        latch.next = Some(driver);
        Ok(())
    }

    /// Appends a primary output driven by `driver` and returns its
    /// position.
    pub fn add_output(&mut self, driver: NodeRef) -> usize {
        let pos = self.outputs.len();
        self.outputs.push(Output { driver, name: None });
        pos
    }

    /// Number of nodes, including the constant.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of primary inputs.
    #[inline]
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Number of latches.
    #[inline]
    pub fn latch_count(&self) -> usize {
        self.latches.len()
    }

    /// Number of primary outputs.
    #[inline]
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Number of and gates.
    #[inline]
    pub fn and_count(&self) -> usize {
        self.nodes.len() - 1 - self.inputs.len() - self.latches.len()
    }

    /// The node stored at `index`.
    ///
    /// Panics when `index` is out of bounds.
    #[inline]
    pub fn node(&self, index: u32) -> &AigNode {
        &self.nodes[index as usize]
    }

    /// Iterates over all nodes in index order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = (u32, &AigNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (index as u32, node))
    }

    /// The canonical fanin pair of `r` when it references an and gate.
    pub fn fanins(&self, r: NodeRef) -> Option<[NodeRef; 2]> {
        match self.nodes.get(r.index() as usize) {
            Some(AigNode::And { fanins }) => Some(*fanins),
            _ => None,
        }
    }

    /// Reference to input `pos`.
    ///
    /// Panics when `pos` is out of bounds.
    pub fn input(&self, pos: usize) -> NodeRef {
        NodeRef::new(self.inputs[pos].node, false)
    }

    /// Reference to the output placeholder of latch `pos`.
    ///
    /// Panics when `pos` is out of bounds.
    pub fn latch(&self, pos: usize) -> NodeRef {
        NodeRef::new(self.latches[pos].node, false)
    }

    /// The next-state driver of latch `pos`, when already bound.
    pub fn latch_next(&self, pos: usize) -> Option<NodeRef> {
        self.latches.get(pos).and_then(|latch| latch.next)
    }

    /// The driver of output `pos`.
    ///
    /// Panics when `pos` is out of bounds.
    pub fn output_driver(&self, pos: usize) -> NodeRef {
        self.outputs[pos].driver
    }

    /// Assigns a name to input `pos`, replacing any previous name.
    pub fn set_input_name(&mut self, pos: usize, name: impl Into<String>) {
        self.inputs[pos].name = Some(name.into());
    }

    /// Assigns a name to latch `pos`, replacing any previous name.
    pub fn set_latch_name(&mut self, pos: usize, name: impl Into<String>) {
        self.latches[pos].name = Some(name.into());
    }

    /// Assigns a name to output `pos`, replacing any previous name.
    pub fn set_output_name(&mut self, pos: usize, name: impl Into<String>) {
        self.outputs[pos].name = Some(name.into());
    }

    /// The explicitly assigned name of input `pos`, if any.
    pub fn input_name(&self, pos: usize) -> Option<&str> {
        self.inputs[pos].name.as_deref()
    }

    /// The explicitly assigned name of latch `pos`, if any.
    pub fn latch_name(&self, pos: usize) -> Option<&str> {
        self.latches[pos].name.as_deref()
    }

    /// The explicitly assigned name of output `pos`, if any.
    pub fn output_name(&self, pos: usize) -> Option<&str> {
        self.outputs[pos].name.as_deref()
    }

    /// The name of input `pos`, falling back to a generated short name.
    pub fn input_label(&self, pos: usize) -> Cow<'_, str> {
        match &self.inputs[pos].name {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("i{pos}")),
        }
    }

    /// The name of latch `pos`, falling back to a generated short name.
    pub fn latch_label(&self, pos: usize) -> Cow<'_, str> {
        match &self.latches[pos].name {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("l{pos}")),
        }
    }

    /// The name of output `pos`, falling back to a generated short name.
    pub fn output_label(&self, pos: usize) -> Cow<'_, str> {
        match &self.outputs[pos].name {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("o{pos}")),
        }
    }

    /// Removes every and gate that is not reachable from any output or
    /// latch next-state driver, and returns how many were removed.
    ///
    /// The constant node and all inputs and latches are always kept.
    /// Surviving gates keep their relative order, so the fanin-index
    /// invariant is preserved; all outstanding `NodeRef`s into this network
    /// other than those stored on the network itself are invalidated.
    pub fn sweep(&mut self) -> usize {
        let mut keep = vec![false; self.nodes.len()];
        keep[0] = true;
        for input in &self.inputs {
            keep[input.node as usize] = true;
        }
        for latch in &self.latches {
            keep[latch.node as usize] = true;
            if let Some(next) = latch.next {
                keep[next.index() as usize] = true;
            }
        }
        for output in &self.outputs {
            keep[output.driver.index() as usize] = true;
        }

        // Fanins have smaller indices, so one reverse scan marks the whole
        // transitive fanin cone.
        for index in (1..self.nodes.len()).rev() {
            if !keep[index] {
                continue;
            }
            if let AigNode::And { fanins } = self.nodes[index] {
                keep[fanins[0].index() as usize] = true;
                keep[fanins[1].index() as usize] = true;
            }
        }

        let mut remap = vec![u32::MAX; self.nodes.len()];
        let mut write = 0usize;
        for read in 0..self.nodes.len() {
            if !keep[read] {
                continue;
            }
            remap[read] = write as u32;
            let mut node = self.nodes[read];
            if let AigNode::And { fanins } = &mut node {
                for fanin in fanins {
                    *fanin = remap_ref(&remap, *fanin);
                }
            }
            self.nodes[write] = node;
            write += 1;
        }
        let removed = self.nodes.len() - write;
        self.nodes.truncate(write);

        self.strash.clear();
        for (index, node) in self.nodes.iter().enumerate() {
            if let AigNode::And { fanins } = node {
                self.strash.insert(*fanins, index as u32);
            }
        }

        for input in &mut self.inputs {
            input.node = remap[input.node as usize];
        }
        for latch in &mut self.latches {
            latch.node = remap[latch.node as usize];
            if let Some(next) = &mut latch.next {
                *next = remap_ref(&remap, *next);
            }
        }
        for output in &mut self.outputs {
            output.driver = remap_ref(&remap, output.driver);
        }

        removed
    }

    /// Scans the whole network and verifies its structural invariants:
    /// constant placement, strictly decreasing fanin indices, canonical
    /// fanin order, uniqueness of every gate in the structural-hash table
    /// and bound latch drivers.
    pub fn check(&self) -> Result<(), NetworkError> {
        if !matches!(self.nodes.first(), Some(AigNode::Const)) {
            return Err(NetworkError::MissingConstant);
        }
        for (index, node) in self.nodes.iter().enumerate().skip(1) {
            match node {
                AigNode::Const => {
                    return Err(NetworkError::MisplacedConstant {
                        node: index as u32,
                    })
                }
                AigNode::And { fanins } => {
                    for fanin in fanins {
                        if fanin.index() as usize >= index {
                            return Err(NetworkError::FaninOrder {
                                node: index as u32,
                                fanin: fanin.index(),
                            });
                        }
                    }
                    if fanins[0].index() <= fanins[1].index() {
                        return Err(NetworkError::NonCanonicalAnd {
                            node: index as u32,
                        });
                    }
                    if self.strash.get(fanins) != Some(&(index as u32)) {
                        return Err(NetworkError::DuplicateAnd {
                            node: index as u32,
                        });
                    }
                }
                AigNode::Input { .. } | AigNode::Latch { .. } => {}
            }
        }
        for (pos, latch) in self.latches.iter().enumerate() {
            if latch.next.is_none() {
                return Err(NetworkError::UnboundLatch(pos));
            }
        }
        Ok(())
    }
}

fn remap_ref(remap: &[u32], r: NodeRef) -> NodeRef {
    NodeRef::new(remap[r.index() as usize], r.is_complemented())
}
