/// Errors surfaced by the race crate.
#[derive(Debug)]
pub enum RaceError {
    /// A debug entry point was called while debugging is disabled.
    DebugDisabled,
    /// The configuration could not be read or failed validation.
    Config { path: String, message: String },
    /// The map does not extend past the viewport on some axis.
    MapTooSmall {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
    },
    /// A pose or fence refers to a tile outside the map.
    OffMap { what: &'static str, x: i32, y: i32 },
}

impl std::fmt::Display for RaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DebugDisabled => write!(f, "debug controls are disabled"),
            Self::Config { path, message } => write!(f, "invalid config {path}: {message}"),
            Self::MapTooSmall {
                width,
                height,
                min_width,
                min_height,
            } => write!(
                f,
                "map is {width}x{height} tiles, needs at least {min_width}x{min_height}"
            ),
            Self::OffMap { what, x, y } => write!(f, "{what} tile ({x}, {y}) is outside the map"),
        }
    }
}

impl std::error::Error for RaceError {}
