use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::tilemap::{TileCoord, TileId, TileMap};

/// Asphalt.
pub const ROAD: TileId = 49;
/// Drivable green area next to the road.
pub const VERGE: TileId = 3;
/// Chequered start line marking.
pub const START_LINE: TileId = 85;
/// Finish line marking.
pub const FINISH_LINE: TileId = 99;
/// Open field (not drivable).
pub const FIELD: TileId = 1;
/// Tree (not drivable).
pub const TREE: TileId = 12;
/// House (not drivable).
pub const HOUSE: TileId = 20;

/// Demo circuit size in tiles (square).
pub const CIRCUIT_SIZE: u32 = 128;

/// Road width of each leg in tiles.
const LANE_WIDTH: u32 = 3;
/// West leg spans these columns.
const WEST_X: u32 = 42;
/// East leg starts at this column.
const EAST_X: u32 = 86;
/// North leg starts at this row.
const NORTH_Y: u32 = 20;
/// South leg starts at this row.
const SOUTH_Y: u32 = 100;

/// Generate the demo circuit: a clockwise rectangular loop whose west leg
/// carries the start line (row 97) and whose south leg carries the finish
/// line (column 46). Scenery off the road is seeded.
pub fn generate_circuit(seed: u64) -> TileMap {
    let size = CIRCUIT_SIZE as usize;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut grid = vec![vec![FIELD; size]; size];

    // Scenery first, road carved over it
    for row in grid.iter_mut() {
        for cell in row.iter_mut() {
            let roll = rng.random_range(0u8..100);
            *cell = if roll < 6 {
                HOUSE
            } else if roll < 14 {
                TREE
            } else {
                FIELD
            };
        }
    }

    let x_end = EAST_X + LANE_WIDTH;
    let y_end = SOUTH_Y + LANE_WIDTH;

    // Verge ring one tile wider than the road
    fill(&mut grid, WEST_X - 1, NORTH_Y - 1, x_end + 1, y_end + 1, VERGE);
    fill(
        &mut grid,
        WEST_X + LANE_WIDTH + 1,
        NORTH_Y + LANE_WIDTH + 1,
        EAST_X - 1,
        SOUTH_Y - 1,
        FIELD,
    );

    // Four legs
    fill(&mut grid, WEST_X, NORTH_Y, WEST_X + LANE_WIDTH, y_end, ROAD);
    fill(&mut grid, EAST_X, NORTH_Y, x_end, y_end, ROAD);
    fill(&mut grid, WEST_X, NORTH_Y, x_end, NORTH_Y + LANE_WIDTH, ROAD);
    fill(&mut grid, WEST_X, SOUTH_Y, x_end, y_end, ROAD);

    for x in WEST_X..WEST_X + LANE_WIDTH {
        grid[97][x as usize] = START_LINE;
    }
    for y in SOUTH_Y..y_end {
        grid[y as usize][46] = FINISH_LINE;
    }

    let rows = grid
        .into_iter()
        .map(|row| row.into_iter().map(i64::from).collect::<Vec<_>>());
    TileMap::from_rows(rows).expect("generated circuit uses valid tile ids")
}

/// Corner waypoints of the demo circuit in driving order, starting from the
/// start line and ending just past the finish line.
pub fn circuit_waypoints() -> Vec<TileCoord> {
    let mid = LANE_WIDTH as i32 / 2;
    let west = WEST_X as i32 + mid;
    let east = EAST_X as i32 + mid;
    let north = NORTH_Y as i32 + mid;
    let south = SOUTH_Y as i32 + mid;
    vec![
        TileCoord::new(west, north),
        TileCoord::new(east, north),
        TileCoord::new(east, south),
        TileCoord::new(west, south),
    ]
}

/// Fill the half-open tile rectangle `[x0, x1) x [y0, y1)`.
fn fill(grid: &mut [Vec<TileId>], x0: u32, y0: u32, x1: u32, y1: u32, tile: TileId) {
    for row in grid.iter_mut().take(y1 as usize).skip(y0 as usize) {
        for cell in row.iter_mut().take(x1 as usize).skip(x0 as usize) {
            *cell = tile;
        }
    }
}
