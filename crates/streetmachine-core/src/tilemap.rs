use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Identifier of a tile sprite in the atlas.
pub type TileId = u8;

/// Highest tile id present in the sprite atlas.
pub const MAX_TILE_ID: TileId = 126;

/// Tile ids that count as street or green area.
pub const DEFAULT_ALLOWED_TILES: &[TileId] = &[
    49, 50, 51, 52, 53, 55, 56, 57, 58, 59, 60, 63, 64, 66, 68, 69, 70, 71, 72, 75, 76, 85, 99,
    123, 3,
];

/// A cell position on the tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile containing the given pixel position (floor division).
    pub fn from_pixels(x: f32, y: f32, tile_size: u32) -> Self {
        let size = tile_size as f32;
        Self {
            x: (x / size).floor() as i32,
            y: (y / size).floor() as i32,
        }
    }

    /// Top-left pixel of this tile.
    pub fn to_pixels(self, tile_size: u32) -> (f32, f32) {
        let size = tile_size as f32;
        (self.x as f32 * size, self.y as f32 * size)
    }
}

/// Errors produced while building or loading a tile map.
#[derive(Debug)]
pub enum MapError {
    Empty,
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    InvalidTile {
        x: usize,
        y: usize,
        value: i64,
    },
    Parse {
        line: usize,
        message: String,
    },
    Io(std::io::Error),
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "map has no tiles"),
            Self::Ragged {
                row,
                expected,
                found,
            } => write!(f, "row {row} has {found} tiles, expected {expected}"),
            Self::InvalidTile { x, y, value } => {
                write!(f, "tile ({x}, {y}) has id {value}, expected 1..={MAX_TILE_ID}")
            },
            Self::Parse { line, message } => write!(f, "line {line}: {message}"),
            Self::Io(e) => write!(f, "failed to read map: {e}"),
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MapError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Immutable grid of tile ids, stored row-major (y * width + x).
///
/// Serializes as an array of rows and validates through `from_rows` when
/// deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<i64>>", into = "Vec<Vec<i64>>")]
pub struct TileMap {
    width: u32,
    height: u32,
    tiles: Vec<TileId>,
}

impl TileMap {
    /// Build a map from rows of raw values, validating shape and id range.
    pub fn from_rows<R, V>(rows: R) -> Result<Self, MapError>
    where
        R: IntoIterator<Item = V>,
        V: AsRef<[i64]>,
    {
        let mut width = None;
        let mut tiles = Vec::new();
        let mut height = 0usize;

        for (y, row) in rows.into_iter().enumerate() {
            let row = row.as_ref();
            let expected = *width.get_or_insert(row.len());
            if row.len() != expected {
                return Err(MapError::Ragged {
                    row: y,
                    expected,
                    found: row.len(),
                });
            }
            for (x, &value) in row.iter().enumerate() {
                if !(1..=i64::from(MAX_TILE_ID)).contains(&value) {
                    return Err(MapError::InvalidTile { x, y, value });
                }
                tiles.push(value as TileId);
            }
            height += 1;
        }

        match width {
            Some(w) if w > 0 => Ok(Self {
                width: w as u32,
                height: height as u32,
                tiles,
            }),
            _ => Err(MapError::Empty),
        }
    }

    /// Parse map text: either a JSON array of rows, or one row per line with
    /// comma and/or whitespace separated ids. Blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Result<Self, MapError> {
        let trimmed = text.trim_start();
        if trimmed.starts_with('[') {
            let rows: Vec<Vec<i64>> =
                serde_json::from_str(trimmed).map_err(|e| MapError::Parse {
                    line: e.line(),
                    message: e.to_string(),
                })?;
            return Self::from_rows(rows);
        }

        let mut rows = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let row = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<i64>().map_err(|e| MapError::Parse {
                        line: idx + 1,
                        message: format!("'{s}': {e}"),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }
        Self::from_rows(rows)
    }

    /// Read and parse a map file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let map = Self::parse(&text)?;
        tracing::info!(
            path = %path.as_ref().display(),
            width = map.width,
            height = map.height,
            "Loaded tile map"
        );
        Ok(map)
    }

    /// Width in tiles.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_width(&self, tile_size: u32) -> f32 {
        (self.width * tile_size) as f32
    }

    pub fn pixel_height(&self, tile_size: u32) -> f32 {
        (self.height * tile_size) as f32
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Tile at `(x, y)`.
    ///
    /// # Panics
    /// Panics when the coordinate lies outside the map. Callers clamp positions
    /// before lookup, so reaching this is an invariant violation.
    pub fn tile_at(&self, x: i32, y: i32) -> TileId {
        assert!(
            self.contains(x, y),
            "tile ({x}, {y}) outside {}x{} map",
            self.width,
            self.height
        );
        self.tiles[y as usize * self.width as usize + x as usize]
    }

    /// Checked lookup for tools and debug views.
    pub fn get(&self, x: i32, y: i32) -> Option<TileId> {
        self.contains(x, y)
            .then(|| self.tiles[y as usize * self.width as usize + x as usize])
    }

    /// Whether the tile under `coord` may be driven on.
    pub fn is_drivable(&self, coord: TileCoord, allowed: &AllowedSet) -> bool {
        allowed.contains(self.tile_at(coord.x, coord.y))
    }

    /// Iterate rows as slices, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[TileId]> {
        self.tiles.chunks(self.width as usize)
    }
}

impl TryFrom<Vec<Vec<i64>>> for TileMap {
    type Error = MapError;

    fn try_from(rows: Vec<Vec<i64>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<TileMap> for Vec<Vec<i64>> {
    fn from(map: TileMap) -> Self {
        map.rows()
            .map(|row| row.iter().map(|&id| i64::from(id)).collect())
            .collect()
    }
}

/// Set of tile ids that are legal to drive on. Independent of day/night/winter skin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedSet {
    ids: BTreeSet<TileId>,
}

impl Default for AllowedSet {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_TILES.iter().copied())
    }
}

impl AllowedSet {
    pub fn new(ids: impl IntoIterator<Item = TileId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_rows() {
        let map = TileMap::parse("49, 49, 7\n# comment\n\n7 49 49\n").unwrap();
        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 2);
        assert_eq!(map.tile_at(2, 0), 7);
        assert_eq!(map.tile_at(0, 1), 7);
    }

    #[test]
    fn parse_json_rows() {
        let map = TileMap::parse("[[1, 2], [3, 4]]").unwrap();
        assert_eq!(map.tile_at(1, 1), 4);
        assert_eq!(map.rows().count(), 2);
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = TileMap::parse("1 2 3\n1 2\n").unwrap_err();
        assert!(matches!(
            err,
            MapError::Ragged {
                row: 1,
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn out_of_range_ids_rejected() {
        let err = TileMap::parse("1 0\n").unwrap_err();
        assert!(matches!(err, MapError::InvalidTile { x: 1, y: 0, value: 0 }));
        let err = TileMap::parse("127\n").unwrap_err();
        assert!(matches!(err, MapError::InvalidTile { value: 127, .. }));
    }

    #[test]
    fn garbage_reports_line() {
        let err = TileMap::parse("1 2\n1 x\n").unwrap_err();
        assert!(matches!(err, MapError::Parse { line: 2, .. }));
    }

    #[test]
    fn empty_map_rejected() {
        assert!(matches!(TileMap::parse("\n# nothing\n"), Err(MapError::Empty)));
        assert!(matches!(TileMap::parse("[]"), Err(MapError::Empty)));
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn tile_at_out_of_range_panics() {
        let map = TileMap::parse("1 1\n1 1\n").unwrap();
        map.tile_at(2, 0);
    }

    #[test]
    fn checked_get_returns_none_outside() {
        let map = TileMap::parse("1 1\n1 1\n").unwrap();
        assert_eq!(map.get(-1, 0), None);
        assert_eq!(map.get(1, 1), Some(1));
    }

    #[test]
    fn default_allowed_set_matches_street_tiles() {
        let allowed = AllowedSet::default();
        assert_eq!(allowed.len(), 25);
        assert!(allowed.contains(49));
        assert!(allowed.contains(3));
        assert!(allowed.contains(123));
        assert!(!allowed.contains(1));
        assert!(!allowed.contains(54));
    }

    #[test]
    fn drivability_uses_allowed_set() {
        let map = TileMap::parse("49 7\n").unwrap();
        let allowed = AllowedSet::default();
        assert!(map.is_drivable(TileCoord::new(0, 0), &allowed));
        assert!(!map.is_drivable(TileCoord::new(1, 0), &allowed));
    }

    #[test]
    fn serde_json_uses_row_format() {
        let map = TileMap::parse("49 7\n3 49\n").unwrap();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, "[[49,7],[3,49]]");
        let back: TileMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn deserialize_rejects_invalid_maps() {
        let err = serde_json::from_str::<TileMap>("[[49, 49], [49]]").unwrap_err();
        assert!(err.to_string().contains("row 1"), "{err}");
        assert!(serde_json::from_str::<TileMap>("[[49, 0]]").is_err());
        assert!(serde_json::from_str::<TileMap>("[]").is_err());
        // The field layout is no longer accepted
        let raw = r#"{"width": 9, "height": 9, "tiles": [49]}"#;
        assert!(serde_json::from_str::<TileMap>(raw).is_err());
    }

    #[test]
    fn pixel_to_tile_floors() {
        assert_eq!(TileCoord::from_pixels(704.0, 1584.0, 16), TileCoord::new(44, 99));
        assert_eq!(TileCoord::from_pixels(719.9, 1599.9, 16), TileCoord::new(44, 99));
        assert_eq!(TileCoord::from_pixels(720.0, 1600.0, 16), TileCoord::new(45, 100));
        assert_eq!(TileCoord::new(44, 101).to_pixels(16), (704.0, 1616.0));
    }
}
