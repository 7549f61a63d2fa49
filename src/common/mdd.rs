use std::collections::BTreeSet;

use super::Point;

/// Which decision-diagram artifacts the planner should attach to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MddRequest {
    None,
    Counted,
    Full,
    Both,
}

impl MddRequest {
    pub fn wants_counted(self) -> bool {
        matches!(self, MddRequest::Counted | MddRequest::Both)
    }

    pub fn wants_full(self) -> bool {
        matches!(self, MddRequest::Full | MddRequest::Both)
    }

    pub fn is_none(self) -> bool {
        self == MddRequest::None
    }
}

/// Per-layer cardinalities: index `2t` holds the node count of layer `t`,
/// index `2t + 1` the edge count between layers `t` and `t + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountedMdd(pub Vec<usize>);

impl CountedMdd {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A layer is thin when the agent has a single option there. Past the end
    /// the agent is parked at its goal, so only waiting remains.
    pub fn is_thin(&self, layer: usize) -> bool {
        self.0.get(layer).map_or(true, |&count| count == 1)
    }
}

/// Explicit per-layer point sets of every optimal path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mdd {
    pub layers: Vec<BTreeSet<Point>>,
}

impl Mdd {
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// The single point of `layer`, if the layer has exactly one.
    pub fn singleton(&self, layer: usize) -> Option<Point> {
        match self.layers.get(layer) {
            Some(points) if points.len() == 1 => points.iter().next().copied(),
            _ => None,
        }
    }

    pub fn is_singleton_at_position(&self, layer: usize, position: Point) -> bool {
        self.singleton(layer) == Some(position)
    }
}
