mod astar;
mod mdd;

pub use astar::a_star_search;
pub use mdd::construct_mdd;

use std::collections::HashMap;

use crate::common::{Path, Point};

/// `(position, time) -> position at time - 1`.
type Trace = HashMap<(Point, usize), Point>;

fn construct_path(trace: &Trace, mut current: (Point, usize)) -> Path {
    let mut path = vec![current.0];
    while let Some(&previous) = trace.get(&current) {
        path.push(previous);
        current = (previous, current.1 - 1);
    }
    path.reverse();
    path
}
