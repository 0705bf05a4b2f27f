pub mod clock;
pub mod highscore;
pub mod input;
pub mod tilemap;
pub mod track;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::tilemap::{TileId, TileMap};
    use crate::track::{FIELD, FINISH_LINE, ROAD, START_LINE, VERGE};

    /// Build a map from ASCII art, one string per row.
    ///
    /// `.` road, `,` verge, `S` start line, `F` finish line, `#` field.
    pub fn map_from_ascii(rows: &[&str]) -> TileMap {
        let rows = rows.iter().map(|row| {
            row.chars()
                .map(|c| i64::from(ascii_tile(c)))
                .collect::<Vec<_>>()
        });
        TileMap::from_rows(rows).expect("ascii map must be rectangular")
    }

    fn ascii_tile(c: char) -> TileId {
        match c {
            '.' => ROAD,
            ',' => VERGE,
            'S' => START_LINE,
            'F' => FINISH_LINE,
            '#' => FIELD,
            other => panic!("unknown map glyph '{other}'"),
        }
    }

    /// A `width` x `height` map filled with road.
    pub fn open_map(width: usize, height: usize) -> TileMap {
        TileMap::from_rows(vec![vec![i64::from(ROAD); width]; height])
            .expect("open map is valid")
    }

    /// A `width` x `height` map filled with undrivable field.
    pub fn field_map(width: usize, height: usize) -> TileMap {
        TileMap::from_rows(vec![vec![i64::from(FIELD); width]; height])
            .expect("field map is valid")
    }
}
