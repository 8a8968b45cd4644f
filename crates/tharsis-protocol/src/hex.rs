use serde::{Deserialize, Serialize};

/// Axial coordinates for a hex grid (q, r). The implicit cube coordinate is `s = -q - r`.
///
/// The Mars board is the disk of radius 4 around the origin: 61 cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hex {
    pub q: i32,
    pub r: i32,
}

impl Hex {
    pub const DIRECTIONS: [Hex; 6] = [
        Hex { q: 1, r: 0 },  // East
        Hex { q: 1, r: -1 }, // Northeast
        Hex { q: 0, r: -1 }, // Northwest
        Hex { q: -1, r: 0 }, // West
        Hex { q: -1, r: 1 }, // Southwest
        Hex { q: 0, r: 1 },  // Southeast
    ];

    pub const ORIGIN: Hex = Hex { q: 0, r: 0 };

    #[inline]
    pub const fn s(self) -> i32 {
        -self.q - self.r
    }

    pub fn neighbors(self) -> impl Iterator<Item = Hex> {
        Self::DIRECTIONS.into_iter().map(move |d| self + d)
    }

    #[inline]
    pub fn distance(self, other: Hex) -> i32 {
        ((self.q - other.q).abs() + (self.r - other.r).abs() + (self.s() - other.s()).abs()) / 2
    }

    /// All hexes with distance `<= radius` from the origin, in a deterministic
    /// row order. `disk(4)` enumerates the 61 board cells.
    pub fn disk(radius: i32) -> impl Iterator<Item = Hex> {
        DiskIter::new(radius)
    }
}

impl std::ops::Add for Hex {
    type Output = Hex;

    fn add(self, other: Hex) -> Hex {
        Hex {
            q: self.q + other.q,
            r: self.r + other.r,
        }
    }
}

struct DiskIter {
    radius: i32,
    dq: i32,
    dr: i32,
    dr_max: i32,
}

impl DiskIter {
    fn new(radius: i32) -> Self {
        let radius = radius.max(0);
        let dq = -radius;
        let (dr_min, dr_max) = dr_bounds(dq, radius);
        Self {
            radius,
            dq,
            dr: dr_min,
            dr_max,
        }
    }
}

impl Iterator for DiskIter {
    type Item = Hex;

    fn next(&mut self) -> Option<Self::Item> {
        if self.dq > self.radius {
            return None;
        }

        let out = Hex {
            q: self.dq,
            r: self.dr,
        };

        self.dr += 1;
        if self.dr > self.dr_max {
            self.dq += 1;
            if self.dq <= self.radius {
                let (dr_min, dr_max) = dr_bounds(self.dq, self.radius);
                self.dr = dr_min;
                self.dr_max = dr_max;
            }
        }

        Some(out)
    }
}

#[inline]
fn dr_bounds(dq: i32, radius: i32) -> (i32, i32) {
    // For axial coords (dq, dr), the third cube delta is ds = -dq - dr.
    // Constraint: max(|dq|, |dr|, |ds|) <= radius
    let dr_min = (-radius).max(-dq - radius);
    let dr_max = radius.min(-dq + radius);
    (dr_min, dr_max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_distance_matches_expected() {
        let a = Hex { q: 0, r: 0 };
        let b = Hex { q: 3, r: -1 };
        assert_eq!(a.distance(b), 3);
    }

    #[test]
    fn hex_neighbors_has_six_adjacent() {
        let center = Hex { q: 2, r: -1 };
        let neighbors: Vec<_> = center.neighbors().collect();
        assert_eq!(neighbors.len(), 6);
        assert!(neighbors.iter().all(|n| center.distance(*n) == 1));
    }

    #[test]
    fn disk_counts_match_redblob_formula() {
        for radius in 0..=4 {
            let count = Hex::disk(radius).count() as i32;
            let expected = 1 + 3 * radius * (radius + 1);
            assert_eq!(count, expected);
        }
    }

    #[test]
    fn board_disk_has_61_cells() {
        let cells: Vec<_> = Hex::disk(4).collect();
        assert_eq!(cells.len(), 61);
        assert!(cells.iter().all(|h| h.distance(Hex::ORIGIN) <= 4));
    }
}
