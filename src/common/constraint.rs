use std::collections::BTreeSet;

use super::Point;

/// Unordered pair of adjacent points, stored with the smaller point first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge(Point, Point);

impl Edge {
    pub fn new(a: Point, b: Point) -> Self {
        if a <= b {
            Edge(a, b)
        } else {
            Edge(b, a)
        }
    }

    pub fn endpoints(&self) -> (Point, Point) {
        (self.0, self.1)
    }
}

/// Forbids `agent` from occupying `position` at `time_step`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexConstraint {
    pub agent: usize,
    pub time_step: usize,
    pub position: Point,
}

/// Forbids `agent` from traversing `edge`, in either direction, between
/// `time_step` and `time_step + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeConstraint {
    pub agent: usize,
    pub time_step: usize,
    pub edge: Edge,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Constraint {
    Vertex(VertexConstraint),
    Edge(EdgeConstraint),
}

impl Constraint {
    pub fn agent(&self) -> usize {
        match self {
            Constraint::Vertex(c) => c.agent,
            Constraint::Edge(c) => c.agent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexConflict {
    pub agents: (usize, usize),
    pub time_step: usize,
    pub position: Point,
}

/// Two agents swapping positions between `time_step` and `time_step + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeConflict {
    pub agents: (usize, usize),
    pub time_step: usize,
    pub edge: Edge,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Conflict {
    Vertex(VertexConflict),
    Edge(EdgeConflict),
}

impl Conflict {
    pub fn agents(&self) -> (usize, usize) {
        match self {
            Conflict::Vertex(c) => c.agents,
            Conflict::Edge(c) => c.agents,
        }
    }

    pub fn time_step(&self) -> usize {
        match self {
            Conflict::Vertex(c) => c.time_step,
            Conflict::Edge(c) => c.time_step,
        }
    }

    /// Index into a counted MDD: vertex layers sit at even, edge layers at odd positions.
    pub fn mdd_layer(&self) -> usize {
        match self {
            Conflict::Vertex(c) => 2 * c.time_step,
            Conflict::Edge(c) => 2 * c.time_step + 1,
        }
    }

    /// The constraint that resolves this conflict for `agent`.
    pub fn to_constraint(&self, agent: usize) -> Constraint {
        match self {
            Conflict::Vertex(c) => Constraint::Vertex(VertexConstraint {
                agent,
                time_step: c.time_step,
                position: c.position,
            }),
            Conflict::Edge(c) => Constraint::Edge(EdgeConstraint {
                agent,
                time_step: c.time_step,
                edge: c.edge,
            }),
        }
    }
}

/// Accumulated constraints of a search node. Equality and hashing are
/// structural, so the insertion order never matters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ConstraintSet {
    pub vertex: BTreeSet<VertexConstraint>,
    pub edge: BTreeSet<EdgeConstraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the constraint was already present.
    pub fn insert(&mut self, constraint: Constraint) -> bool {
        match constraint {
            Constraint::Vertex(c) => self.vertex.insert(c),
            Constraint::Edge(c) => self.edge.insert(c),
        }
    }

    /// Copy of `self` with one more constraint.
    pub fn with(&self, constraint: Constraint) -> Self {
        let mut extended = self.clone();
        extended.insert(constraint);
        extended
    }

    pub fn len(&self) -> usize {
        self.vertex.len() + self.edge.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertex.is_empty() && self.edge.is_empty()
    }

    pub fn vertex_for(&self, agent: usize) -> impl Iterator<Item = &VertexConstraint> {
        self.vertex.iter().filter(move |c| c.agent == agent)
    }

    pub fn edge_for(&self, agent: usize) -> impl Iterator<Item = &EdgeConstraint> {
        self.edge.iter().filter(move |c| c.agent == agent)
    }
}
