use anyhow::{anyhow, Context};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::str::FromStr;

use crate::common::Point;

#[derive(Debug, Clone)]
pub struct Tile {
    passable: bool,
    pub neighbors: Vec<Point>, // Accessible neighbors, including the tile itself (wait)
}

impl Tile {
    pub fn is_passable(&self) -> bool {
        self.passable
    }
}

/// Read-only 4-connected grid. Points are `(row, column)`.
#[derive(Debug, Clone)]
pub struct Map {
    pub height: usize,
    pub width: usize,
    pub grid: Vec<Vec<Tile>>,
}

impl Map {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("failed to read map {path}"))?;
        content
            .parse()
            .with_context(|| format!("failed to parse map {path}"))
    }

    /// Builds a map from bare rows, `.` marks a free cell and anything else a wall.
    pub fn from_rows(rows: &[&str]) -> Self {
        let grid = rows
            .iter()
            .map(|row| {
                row.chars()
                    .map(|ch| Tile {
                        passable: is_free_cell(ch),
                        neighbors: Vec::new(),
                    })
                    .collect()
            })
            .collect::<Vec<Vec<Tile>>>();

        let mut map = Map {
            height: grid.len(),
            width: grid.first().map_or(0, |row| row.len()),
            grid,
        };
        map.initialize_neighbors();
        map
    }

    fn initialize_neighbors(&mut self) {
        for x in 0..self.height {
            for y in 0..self.width {
                if self.grid[x][y].passable {
                    self.grid[x][y].neighbors = self.get_neighbors(x, y);
                }
            }
        }
    }

    pub fn get_neighbors(&self, x: usize, y: usize) -> Vec<Point> {
        let directions = [(-1, 0), (1, 0), (0, -1), (0, 1), (0, 0)]; // Up, down, left, right, stay
        let mut neighbors = Vec::new();

        for &(dx, dy) in &directions {
            let new_x = x as i64 + dx;
            let new_y = y as i64 + dy;
            if new_x >= 0
                && new_y >= 0
                && self.is_passable(new_x as usize, new_y as usize)
            {
                neighbors.push((new_x as usize, new_y as usize));
            }
        }

        neighbors
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.height && y < self.width && y < self.grid[x].len()
    }

    pub fn is_passable(&self, x: usize, y: usize) -> bool {
        self.in_bounds(x, y) && self.grid[x][y].is_passable()
    }

    /// Exact distance to `goal` from every cell, `usize::MAX` where unreachable.
    pub fn heuristic_dji(&self, goal: Point) -> Vec<Vec<usize>> {
        let mut heuristic = vec![vec![usize::MAX; self.width]; self.height];
        if !self.is_passable(goal.0, goal.1) {
            return heuristic;
        }
        let mut heap = BinaryHeap::new();

        heuristic[goal.0][goal.1] = 0;
        heap.push((Reverse(0), goal));

        while let Some((Reverse(cost), (x, y))) = heap.pop() {
            if cost > heuristic[x][y] {
                continue;
            }

            for &(new_x, new_y) in &self.grid[x][y].neighbors {
                let next_cost = cost + 1;
                if next_cost < heuristic[new_x][new_y] {
                    heap.push((Reverse(next_cost), (new_x, new_y)));
                    heuristic[new_x][new_y] = next_cost;
                }
            }
        }

        heuristic
    }
}

fn is_free_cell(ch: char) -> bool {
    matches!(ch, '.' | 'G' | 'S')
}

fn header_value(line: Option<&str>, key: &str) -> anyhow::Result<usize> {
    let line = line.ok_or_else(|| anyhow!("missing `{key}` header"))?;
    let mut parts = line.split_whitespace();
    if parts.next() != Some(key) {
        return Err(anyhow!("expected `{key}` header, got `{line}`"));
    }
    parts
        .next()
        .ok_or_else(|| anyhow!("missing value for `{key}`"))?
        .parse::<usize>()
        .with_context(|| format!("invalid value for `{key}`"))
}

impl FromStr for Map {
    type Err = anyhow::Error;

    /// Parses the MovingAI `.map` format.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s.lines();

        let _type = lines.next().ok_or_else(|| anyhow!("empty map file"))?;
        let height = header_value(lines.next(), "height")?;
        let width = header_value(lines.next(), "width")?;
        let _map = lines.next().ok_or_else(|| anyhow!("missing `map` header"))?;

        let rows: Vec<&str> = lines.take(height).collect();
        if rows.len() != height {
            return Err(anyhow!("expected {height} rows, found {}", rows.len()));
        }
        if let Some(row) = rows.iter().find(|row| row.chars().count() != width) {
            return Err(anyhow!("row `{row}` does not have width {width}"));
        }

        Ok(Map::from_rows(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_map() {
        let map = Map::from_file("map_file/test/test.map").unwrap();

        assert_eq!(map.height, 5);
        assert_eq!(map.width, 5);

        assert!(!map.is_passable(0, 0));
        assert!(map.is_passable(1, 1));
        assert!(!map.is_passable(2, 2));
        assert!(!map.is_passable(5, 0));

        let neighbors = map.get_neighbors(1, 1);
        assert_eq!(neighbors.len(), 3);
        assert!(neighbors.contains(&(2, 1)));
        assert!(neighbors.contains(&(1, 2)));
        assert!(neighbors.contains(&(1, 1)));
    }

    #[test]
    fn test_reject_malformed_header() {
        let text = "type octile\nheight 2\nwidth x\nmap\n..\n..\n";
        assert!(text.parse::<Map>().is_err());
    }

    #[test]
    fn test_reject_short_map() {
        let text = "type octile\nheight 3\nwidth 2\nmap\n..\n..\n";
        assert!(text.parse::<Map>().is_err());
    }

    #[test]
    fn test_heuristic_dji() {
        let map = Map::from_rows(&["...", ".@.", "..."]);
        let h = map.heuristic_dji((0, 0));

        assert_eq!(h[0][0], 0);
        assert_eq!(h[2][2], 4);
        assert_eq!(h[1][2], 3);
        assert_eq!(h[1][1], usize::MAX);
    }

    #[test]
    fn test_heuristic_to_blocked_goal() {
        let map = Map::from_rows(&["..", ".@"]);
        let h = map.heuristic_dji((1, 1));
        assert!(h.iter().flatten().all(|&d| d == usize::MAX));
    }
}
