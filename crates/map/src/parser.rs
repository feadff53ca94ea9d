use crate::scene::SceneStore;
use crate::symbol::SymbolTable;
use glam::Vec3;
use std::path::{Path, PathBuf};

/// Errors from reading a map source.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("map not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read map {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A character the symbol table had no rule for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IgnoredCell {
    pub symbol: char,
    pub row: usize,
    pub column: usize,
}

/// Statistics gathered while scanning a map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    /// Number of lines scanned.
    pub rows: usize,
    /// Length in characters of the longest line.
    pub widest_row: usize,
    /// Cells that matched a symbol rule.
    pub recognized: usize,
    /// Non-whitespace cells with no rule. Whitespace is never reported.
    pub ignored: Vec<IgnoredCell>,
}

/// Output of a parse: the scene plus the scan report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedMap {
    pub scene: SceneStore,
    pub report: ParseReport,
}

/// Single-pass parser from map lines to a [`SceneStore`].
#[derive(Debug, Clone, Default)]
pub struct MapParser {
    table: SymbolTable,
}

impl MapParser {
    pub fn new(table: SymbolTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    /// Scan `lines` row by row. Row index becomes Z, column index becomes X.
    pub fn parse_lines<I, S>(&self, lines: I) -> ParsedMap
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = ParsedMap::default();

        for (row, line) in lines.into_iter().enumerate() {
            let mut width = 0;
            for (column, symbol) in line.as_ref().chars().enumerate() {
                width = column + 1;
                let Some(rule) = self.table.lookup(symbol) else {
                    if !symbol.is_whitespace() {
                        parsed.report.ignored.push(IgnoredCell {
                            symbol,
                            row,
                            column,
                        });
                    }
                    continue;
                };
                let position = Vec3::new(column as f32, 0.0, row as f32);
                for (category, placement) in rule.emit(position) {
                    parsed.scene.push(category, placement);
                }
                parsed.report.recognized += 1;
            }
            parsed.report.rows = row + 1;
            parsed.report.widest_row = parsed.report.widest_row.max(width);
        }

        tracing::debug!(
            rows = parsed.report.rows,
            recognized = parsed.report.recognized,
            ignored = parsed.report.ignored.len(),
            "map scanned"
        );
        parsed
    }

    /// Parse a whole map held in memory. Both `\n` and `\r\n` line endings work.
    pub fn parse_str(&self, text: &str) -> ParsedMap {
        self.parse_lines(text.lines())
    }

    /// Read and parse the map file at `path`.
    ///
    /// Bytes that are not valid UTF-8 are replaced and then skipped like any
    /// other unknown character.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<ParsedMap, MapError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                MapError::NotFound(path.to_path_buf())
            } else {
                MapError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let parsed = self.parse_str(&text);
        tracing::info!(
            "loaded map {}: {}",
            path.display(),
            parsed.scene.counts()
        );
        Ok(parsed)
    }
}

/// Parse `lines` with the standard symbol table.
pub fn parse_lines<I, S>(lines: I) -> SceneStore
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    MapParser::default().parse_lines(lines).scene
}

/// Load the map at `path` with the standard symbol table.
pub fn load_map(path: impl AsRef<Path>) -> Result<SceneStore, MapError> {
    MapParser::default().load(path).map(|parsed| parsed.scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolRule;
    use std::io::Write;
    use tilescape_common::Category;

    fn v(x: f32, z: f32) -> Vec3 {
        Vec3::new(x, 0.0, z)
    }

    #[test]
    fn wall_dot_door_row() {
        let scene = parse_lines(["W.D"]);

        assert_eq!(scene.walls().len(), 1);
        assert_eq!(scene.walls()[0].position, v(0.0, 0.0));
        assert_eq!(scene.walls()[0].rotation, 0.0);

        assert_eq!(scene.doors().len(), 1);
        assert_eq!(scene.doors()[0].position, v(2.0, 0.0));
        assert_eq!(scene.doors()[0].rotation, 0.0);

        assert_eq!(scene.floors().len(), 1);
        assert_eq!(scene.floors()[0].position, v(2.0, 0.0));

        assert!(scene.lights().is_empty());
        assert!(scene.models().is_empty());
    }

    #[test]
    fn rotated_door() {
        let scene = parse_lines(["d"]);
        assert_eq!(scene.doors().len(), 1);
        assert_eq!(scene.doors()[0].position, Vec3::ZERO);
        assert_eq!(scene.doors()[0].rotation, 90.0);
        assert_eq!(scene.floors().len(), 1);
        assert_eq!(scene.floors()[0].position, Vec3::ZERO);
        assert_eq!(scene.floors()[0].rotation, 0.0);
    }

    #[test]
    fn zero_lines_gives_empty_scene() {
        let scene = parse_lines(Vec::<String>::new());
        assert!(scene.is_empty());
        for category in Category::ALL {
            assert!(scene.get(category).is_empty());
        }
    }

    #[test]
    fn row_index_is_depth() {
        let scene = parse_lines(["W", "O"]);
        assert_eq!(scene.walls()[0].position, v(0.0, 0.0));
        assert_eq!(scene.floors()[0].position, v(0.0, 1.0));
    }

    #[test]
    fn record_count_matches_symbols_plus_companion_floors() {
        let map = ["WDdOlM", "MMlW", "dDO"];
        let scene = parse_lines(map);

        let mut recognized = 0;
        let mut companions = 0;
        for c in map.iter().flat_map(|l| l.chars()) {
            recognized += 1;
            if matches!(c, 'D' | 'd' | 'l' | 'M') {
                companions += 1;
            }
        }
        assert_eq!(scene.total(), recognized + companions);

        let counts = scene.counts();
        assert_eq!(counts.walls, 2);
        assert_eq!(counts.doors, 4);
        assert_eq!(counts.lights, 2);
        assert_eq!(counts.models, 3);
        assert_eq!(counts.floors, 2 + 4 + 2 + 3);
    }

    #[test]
    fn parsing_is_deterministic() {
        let map = ["WWWWW", "WOlOW", "WdMDW", "WWWWW"];
        let a = parse_lines(map);
        let b = parse_lines(map);
        assert_eq!(a, b);
    }

    #[test]
    fn scan_order_is_row_major() {
        let scene = parse_lines(["O.O", "O"]);
        let positions: Vec<Vec3> = scene.floors().iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![v(0.0, 0.0), v(2.0, 0.0), v(0.0, 1.0)]);
    }

    #[test]
    fn ragged_rows_are_fine() {
        let parsed = MapParser::default().parse_lines(["W", "", "WWWW", "W"]);
        assert_eq!(parsed.scene.walls().len(), 6);
        assert_eq!(parsed.scene.walls()[5].position, v(0.0, 3.0));
        assert_eq!(parsed.report.rows, 4);
        assert_eq!(parsed.report.widest_row, 4);
    }

    #[test]
    fn unknown_characters_are_reported_but_skipped() {
        let parsed = MapParser::default().parse_lines(["W x", "?O"]);
        assert_eq!(parsed.scene.total(), 2);
        assert_eq!(parsed.report.recognized, 2);
        assert_eq!(
            parsed.report.ignored,
            vec![
                IgnoredCell {
                    symbol: 'x',
                    row: 0,
                    column: 2
                },
                IgnoredCell {
                    symbol: '?',
                    row: 1,
                    column: 0
                },
            ]
        );
    }

    #[test]
    fn columns_count_characters_not_bytes() {
        let scene = parse_lines(["éW"]);
        assert_eq!(scene.walls()[0].position, v(1.0, 0.0));
    }

    #[test]
    fn crlf_line_endings() {
        let parsed = MapParser::default().parse_str("W\r\nO\r\n");
        assert_eq!(parsed.scene.walls().len(), 1);
        assert_eq!(parsed.scene.floors()[0].position, v(0.0, 1.0));
        assert!(parsed.report.ignored.is_empty());
    }

    #[test]
    fn custom_symbol_table() {
        let mut table = SymbolTable::standard();
        table.insert(SymbolRule::new('#', Category::Wall).rotated(45.0).on_floor());
        let scene = MapParser::new(table).parse_lines(["#"]).scene;
        assert_eq!(scene.walls()[0].rotation, 45.0);
        assert_eq!(scene.floors().len(), 1);
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_map(dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, MapError::NotFound(_)));
        assert!(err.to_string().contains("nope.txt"));
    }

    #[test]
    fn load_directory_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_map(dir.path()).unwrap_err();
        assert!(!matches!(err, MapError::NotFound(_)));
    }

    #[test]
    fn load_empty_file_is_ok_and_empty() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let scene = load_map(file.path()).unwrap();
        assert!(scene.is_empty());
    }

    #[test]
    fn load_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "WWW").unwrap();
        writeln!(file, "WlW").unwrap();
        writeln!(file, "WMW").unwrap();
        file.flush().unwrap();

        let parsed = MapParser::default().load(file.path()).unwrap();
        assert_eq!(parsed.scene.walls().len(), 7);
        assert_eq!(parsed.scene.lights()[0].position, v(1.0, 1.0));
        assert_eq!(parsed.scene.models()[0].position, v(1.0, 2.0));
        assert_eq!(parsed.scene.floors().len(), 2);
        assert_eq!(parsed.report.rows, 3);
    }
}
