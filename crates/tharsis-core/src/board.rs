use std::collections::HashMap;

use tharsis_protocol::{Hex, PlacedTile, PlayerIndex, TileKind};

use crate::error::ActionError;

/// Resources printed on a board cell, granted to the placer when a tile
/// lands there.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellBonus {
    pub steel: u32,
    pub titanium: u32,
    pub plants: u32,
    pub cards: u32,
}

impl CellBonus {
    pub fn is_empty(&self) -> bool {
        self.steel == 0 && self.titanium == 0 && self.plants == 0 && self.cards == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutCell {
    pub cell: Hex,
    pub bonus: CellBonus,
    /// Reserved cells take oceans and nothing else.
    pub ocean_reserved: bool,
}

/// The fixed 61-cell board: the radius-4 hex disk with per-cell bonuses
/// and ocean reservations.
#[derive(Clone, Debug)]
pub struct BoardLayout {
    cells: Vec<LayoutCell>,
    index: HashMap<Hex, usize>,
}

pub const BOARD_RADIUS: i32 = 4;

impl BoardLayout {
    pub fn standard() -> Self {
        let cells: Vec<LayoutCell> = Hex::disk(BOARD_RADIUS).map(standard_cell).collect();
        let index = cells
            .iter()
            .enumerate()
            .map(|(i, c)| (c.cell, i))
            .collect();
        Self { cells, index }
    }

    pub fn cells(&self) -> &[LayoutCell] {
        &self.cells
    }

    pub fn cell(&self, cell: Hex) -> Option<&LayoutCell> {
        self.index.get(&cell).map(|&i| &self.cells[i])
    }

    pub fn contains(&self, cell: Hex) -> bool {
        self.index.contains_key(&cell)
    }

    pub fn is_reserved(&self, cell: Hex) -> bool {
        self.cell(cell).is_some_and(|c| c.ocean_reserved)
    }

    pub fn bonus(&self, cell: Hex) -> CellBonus {
        self.cell(cell).map(|c| c.bonus).unwrap_or_default()
    }

    /// Full placement legality for one tile kind at one cell. Does not
    /// look at global parameters; ocean capacity is checked where the
    /// placement was queued.
    pub fn check_placement(
        &self,
        tiles: &[PlacedTile],
        kind: TileKind,
        cell: Hex,
        owner: PlayerIndex,
    ) -> Result<(), ActionError> {
        let layout_cell = self.cell(cell).ok_or(ActionError::OffBoard)?;
        if tile_at(tiles, cell).is_some() {
            return Err(ActionError::CellOccupied);
        }
        match kind {
            TileKind::Ocean => {
                if !layout_cell.ocean_reserved {
                    return Err(ActionError::NotOceanReserved);
                }
            }
            TileKind::City => {
                if layout_cell.ocean_reserved {
                    return Err(ActionError::OceanReservedCell);
                }
                let near_city = cell
                    .neighbors()
                    .any(|n| matches!(tile_at(tiles, n), Some(t) if t.kind == TileKind::City));
                if near_city {
                    return Err(ActionError::CityAdjacency);
                }
            }
            TileKind::Greenery => {
                if layout_cell.ocean_reserved {
                    return Err(ActionError::OceanReservedCell);
                }
                let near_own = cell.neighbors().any(|n| owns_tile_at(tiles, n, owner));
                if !near_own && self.own_adjacent_cell_exists(tiles, owner) {
                    return Err(ActionError::GreeneryAdjacency);
                }
            }
        }
        Ok(())
    }

    /// Whether any open, non-reserved cell borders one of `owner`'s tiles.
    /// When none does, a greenery may go anywhere legal.
    fn own_adjacent_cell_exists(&self, tiles: &[PlacedTile], owner: PlayerIndex) -> bool {
        self.cells.iter().any(|c| {
            !c.ocean_reserved
                && tile_at(tiles, c.cell).is_none()
                && c.cell.neighbors().any(|n| owns_tile_at(tiles, n, owner))
        })
    }
}

pub fn tile_at(tiles: &[PlacedTile], cell: Hex) -> Option<&PlacedTile> {
    tiles.iter().find(|t| t.cell == cell)
}

fn owns_tile_at(tiles: &[PlacedTile], cell: Hex, owner: PlayerIndex) -> bool {
    matches!(tile_at(tiles, cell), Some(t) if t.owner == Some(owner))
}

/// Oceans bordering `cell`; each pays the placer 2 credits.
pub fn adjacent_oceans(tiles: &[PlacedTile], cell: Hex) -> u32 {
    cell.neighbors()
        .filter(|n| matches!(tile_at(tiles, *n), Some(t) if t.kind == TileKind::Ocean))
        .count() as u32
}

/// Greeneries bordering `cell`; cities score one point per neighbor.
pub fn adjacent_greeneries(tiles: &[PlacedTile], cell: Hex) -> u32 {
    cell.neighbors()
        .filter(|n| matches!(tile_at(tiles, *n), Some(t) if t.kind == TileKind::Greenery))
        .count() as u32
}

pub fn count_owned(tiles: &[PlacedTile], owner: PlayerIndex) -> usize {
    tiles.iter().filter(|t| t.owner == Some(owner)).count()
}

pub fn count_kind_owned(tiles: &[PlacedTile], kind: TileKind, owner: PlayerIndex) -> usize {
    tiles
        .iter()
        .filter(|t| t.kind == kind && t.owner == Some(owner))
        .count()
}

fn standard_cell(cell: Hex) -> LayoutCell {
    let ocean_reserved = matches!(
        (cell.q, cell.r),
        (0, -4)
            | (1, -4)
            | (2, -4)
            | (2, -3)
            | (3, -3)
            | (4, -4)
            | (4, -3)
            | (-1, -1)
            | (0, -1)
            | (-2, 3)
            | (-1, 3)
            | (0, 3)
    );
    let none = CellBonus::default();
    let bonus = match (cell.q, cell.r) {
        (-4, 0) | (-3, 0) => CellBonus { steel: 2, ..none },
        (-4, 2) | (-3, -1) | (2, -3) | (3, -2) => CellBonus { steel: 1, ..none },
        (3, -4) | (4, -4) => CellBonus { titanium: 2, ..none },
        (-2, -2) | (1, 3) => CellBonus { titanium: 1, ..none },
        (0, 0) | (1, 0) | (0, 1) => CellBonus { plants: 2, ..none },
        (-1, -1) | (0, -1) | (1, -1) | (-1, 1) | (1, 1) => CellBonus { plants: 1, ..none },
        (-2, 2) | (-1, 2) | (0, 2) | (0, 3) | (-1, 4) => CellBonus { plants: 1, ..none },
        (3, 1) => CellBonus { cards: 2, ..none },
        (-4, 4) | (-2, 4) | (2, 2) => CellBonus { cards: 1, ..none },
        _ => none,
    };
    LayoutCell {
        cell,
        bonus,
        ocean_reserved,
    }
}
