//! This module implements the static model of a crossword-filling problem: the grid's cells, the
//! slots (CSP variables) derived from them, and the overlap table linking crossing slots. None of
//! this changes once a fill begins.

use std::collections::HashMap;
use thiserror::Error;

use crate::types::WordId;
use crate::word_list::{normalize_word, WordList};

/// An identifier for a given slot, based on its index in the `GridConfig`'s `slot_configs` field.
pub type SlotId = usize;

/// Zero-indexed x and y coords for a cell in the grid, where y = 0 in the top row. In other words,
/// `(column, row)`.
pub type GridCoord = (usize, usize);

/// The direction that a slot is facing.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

/// The contents of a single grid square.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Cell {
    /// A blocked square that no word passes through.
    Block,
    /// A blank square to be filled.
    Empty,
    /// A blank square whose letter was given in the template.
    Filled(char),
}

impl Cell {
    #[must_use]
    pub fn is_blank(self) -> bool {
        self != Cell::Block
    }

    #[must_use]
    pub fn letter(self) -> Option<char> {
        match self {
            Cell::Filled(ch) => Some(ch),
            Cell::Block | Cell::Empty => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridConfigError {
    #[error("Grid must have at least one row")]
    EmptyTemplate,

    #[error("Unrecognized character {ch:?} at row {y}, column {x}")]
    InvalidCell { ch: char, x: usize, y: usize },

    #[error("More than two entries cross at row {y}, column {x}")]
    OverlappingEntries { x: usize, y: usize },
}

/// A struct representing a crossing between one slot and another, referencing the other slot's id
/// and the location of the intersection within the other slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// A struct representing the aspects of a slot in the grid that are static during filling.
#[derive(Debug, Clone)]
pub struct SlotConfig {
    pub id: SlotId,
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,

    /// For each cell of the slot, the crossing slot passing through it (if any).
    pub crossings: Vec<Option<Crossing>>,
}

impl SlotConfig {
    /// Generate the coords for each cell of this slot.
    #[must_use]
    pub fn cell_coords(&self) -> Vec<GridCoord> {
        self.slot_spec().cell_coords()
    }

    /// Generate the indices of this slot's cells in a flat cell array like `GridConfig.cells`.
    #[must_use]
    pub fn cell_fill_indices(&self, grid_width: usize) -> Vec<usize> {
        self.cell_coords()
            .iter()
            .map(|loc| loc.0 + loc.1 * grid_width)
            .collect()
    }

    /// Get the letters given in the template for this slot's cells.
    #[must_use]
    pub fn fill(&self, cells: &[Cell], grid_width: usize) -> Vec<Option<char>> {
        self.cell_fill_indices(grid_width)
            .iter()
            .map(|&idx| cells[idx].letter())
            .collect()
    }

    /// Generate a `SlotSpec` identifying this slot.
    #[must_use]
    pub fn slot_spec(&self) -> SlotSpec {
        SlotSpec {
            start_cell: self.start_cell,
            direction: self.direction,
            length: self.length,
        }
    }

    /// Generate a string key like "1,2,down,5" identifying this slot, for logging.
    #[must_use]
    pub fn slot_key(&self) -> String {
        self.slot_spec().to_key()
    }
}

/// A struct holding references to all of the information needed as input to a crossword filling
/// operation.
#[derive(Clone, Copy)]
pub struct GridConfig<'a> {
    /// The vocabulary used to fill the grid; see `word_list.rs`.
    pub word_list: &'a WordList,

    /// A flat array of grid squares, in order of row and then column.
    pub cells: &'a [Cell],

    /// Config representing all of the slots in the grid and their crossings.
    pub slot_configs: &'a [SlotConfig],

    /// The width and height of the grid.
    pub width: usize,
    pub height: usize,
}

impl<'a> GridConfig<'a> {
    /// The overlap between two slots, as `(cell index in x, cell index in y)`, or `None` if they
    /// don't share a cell.
    #[must_use]
    pub fn overlap(&self, x: SlotId, y: SlotId) -> Option<(usize, usize)> {
        if x == y {
            return None;
        }
        self.slot_configs[x]
            .crossings
            .iter()
            .enumerate()
            .find_map(|(cell_idx, crossing)| match crossing {
                Some(crossing) if crossing.other_slot_id == y => {
                    Some((cell_idx, crossing.other_slot_cell))
                }
                _ => None,
            })
    }

    /// The ids of all slots that share a cell with the given slot, in the order of the cells they
    /// cross.
    #[must_use]
    pub fn neighbors(&self, slot_id: SlotId) -> Vec<SlotId> {
        let mut result: Vec<SlotId> = Vec::with_capacity(self.slot_configs[slot_id].length);
        for crossing in self.slot_configs[slot_id].crossings.iter().flatten() {
            if !result.contains(&crossing.other_slot_id) {
                result.push(crossing.other_slot_id);
            }
        }
        result
    }

    /// The number of slots crossing the given slot.
    #[must_use]
    pub fn degree(&self, slot_id: SlotId) -> usize {
        self.neighbors(slot_id).len()
    }

    /// Every directed arc `(x, y)` between overlapping slots, ordered by `x` and then by the cell of
    /// `x` where the crossing occurs.
    #[must_use]
    pub fn arcs(&self) -> Vec<(SlotId, SlotId)> {
        (0..self.slot_configs.len())
            .flat_map(|slot_id| {
                self.neighbors(slot_id)
                    .into_iter()
                    .map(move |neighbor| (slot_id, neighbor))
            })
            .collect()
    }

    /// Is the cell at the given coords blank (i.e., part of some word)?
    #[must_use]
    pub fn is_blank(&self, (x, y): GridCoord) -> bool {
        self.cells[x + y * self.width].is_blank()
    }
}

/// A struct that owns a copy of each piece of information needed by `GridConfig`.
pub struct OwnedGridConfig {
    pub word_list: WordList,
    pub cells: Vec<Cell>,
    pub slot_configs: Vec<SlotConfig>,
    pub width: usize,
    pub height: usize,
}

impl OwnedGridConfig {
    #[must_use]
    pub fn to_config_ref(&self) -> GridConfig {
        GridConfig {
            word_list: &self.word_list,
            cells: &self.cells,
            slot_configs: &self.slot_configs,
            width: self.width,
            height: self.height,
        }
    }
}

/// A struct identifying a specific slot in the grid.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct SlotSpec {
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,
}

impl SlotSpec {
    /// Represent this slot as a string like "1,2,down,5".
    #[must_use]
    pub fn to_key(&self) -> String {
        let direction = match self.direction {
            Direction::Across => "across",
            Direction::Down => "down",
        };
        format!(
            "{},{},{},{}",
            self.start_cell.0, self.start_cell.1, direction, self.length,
        )
    }

    /// Generate the coords for each cell of this entry.
    #[must_use]
    pub fn cell_coords(&self) -> Vec<GridCoord> {
        (0..self.length)
            .map(|cell_idx| match self.direction {
                Direction::Across => (self.start_cell.0 + cell_idx, self.start_cell.1),
                Direction::Down => (self.start_cell.0, self.start_cell.1 + cell_idx),
            })
            .collect()
    }
}

/// Given `SlotSpec` structs specifying the positions of the slots in a grid, generate
/// `SlotConfig`s containing derived information about crossings.
pub fn generate_slot_configs(entries: &[SlotSpec]) -> Result<Vec<SlotConfig>, GridConfigError> {
    // Build a map from cell location to entries involved, which we can then use to calculate
    // crossings. Each value is a list of (entry index, cell index within entry).
    let mut entries_by_loc: HashMap<GridCoord, Vec<(usize, usize)>> = HashMap::new();

    for (entry_idx, entry) in entries.iter().enumerate() {
        for (cell_idx, &loc) in entry.cell_coords().iter().enumerate() {
            let cell_entries = entries_by_loc.entry(loc).or_default();
            cell_entries.push((entry_idx, cell_idx));
            if cell_entries.len() > 2 {
                return Err(GridConfigError::OverlappingEntries { x: loc.0, y: loc.1 });
            }
        }
    }

    let mut slot_configs: Vec<SlotConfig> = Vec::with_capacity(entries.len());

    for (entry_idx, entry) in entries.iter().enumerate() {
        let crossings: Vec<Option<Crossing>> = entry
            .cell_coords()
            .iter()
            .map(|loc| {
                let &(other_slot_id, other_slot_cell) = entries_by_loc[loc]
                    .iter()
                    .find(|&&(e, _)| e != entry_idx)?;

                Some(Crossing {
                    other_slot_id,
                    other_slot_cell,
                })
            })
            .collect();

        slot_configs.push(SlotConfig {
            id: entry_idx,
            start_cell: entry.start_cell,
            direction: entry.direction,
            length: entry.length,
            crossings,
        });
    }

    Ok(slot_configs)
}

/// Parse a template string into a flat cell array plus its width and height. `#` is a block, `_`
/// or `.` is an empty square, and a letter is a square prefilled with that letter.
pub fn parse_template(template: &str) -> Result<(Vec<Cell>, usize, usize), GridConfigError> {
    let rows: Vec<Vec<char>> = template
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.chars().collect())
        .collect();

    let Some(width) = rows.iter().map(Vec::len).max() else {
        return Err(GridConfigError::EmptyTemplate);
    };
    let height = rows.len();

    let mut cells = Vec::with_capacity(width * height);
    for (y, row) in rows.iter().enumerate() {
        for (x, &ch) in row.iter().enumerate() {
            cells.push(match ch {
                '#' => Cell::Block,
                '_' | '.' => Cell::Empty,
                ch if ch.is_alphabetic() => {
                    let normalized_string = normalize_word(&ch.to_string());
                    let mut normalized = normalized_string.chars();
                    match (normalized.next(), normalized.next()) {
                        (Some(letter), None) => Cell::Filled(letter),
                        _ => return Err(GridConfigError::InvalidCell { ch, x, y }),
                    }
                }
                ch => return Err(GridConfigError::InvalidCell { ch, x, y }),
            });
        }
        // Short rows are blocked out to the full width.
        cells.extend((row.len()..width).map(|_| Cell::Block));
    }

    Ok((cells, width, height))
}

/// Generate a list of `SlotSpec`s from a flat cell array: every maximal run of at least two blank
/// cells, across entries first (top to bottom) and then down entries (left to right).
#[must_use]
pub fn generate_slots_from_cells(cells: &[Cell], width: usize, height: usize) -> Vec<SlotSpec> {
    fn build_words(
        lines: impl Iterator<Item = Vec<(GridCoord, bool)>>,
        direction: Direction,
    ) -> Vec<SlotSpec> {
        let mut result: Vec<SlotSpec> = vec![];

        for line in lines {
            let mut current_word_coords: Vec<GridCoord> = vec![];

            for (coord, is_blank) in line.into_iter().chain([((0, 0), false)]) {
                if is_blank {
                    current_word_coords.push(coord);
                    continue;
                }
                if current_word_coords.len() > 1 {
                    result.push(SlotSpec {
                        start_cell: current_word_coords[0],
                        direction,
                        length: current_word_coords.len(),
                    });
                }
                current_word_coords.clear();
            }
        }

        result
    }

    let is_blank = |x: usize, y: usize| cells[x + y * width].is_blank();

    let rows = (0..height).map(|y| (0..width).map(|x| ((x, y), is_blank(x, y))).collect());
    let columns = (0..width).map(|x| (0..height).map(|y| ((x, y), is_blank(x, y))).collect());

    let mut slot_specs = build_words(rows, Direction::Across);
    slot_specs.extend(build_words(columns, Direction::Down));
    slot_specs
}

/// Generate a list of `SlotSpec`s from a template string; see `parse_template` for the format.
pub fn generate_slots_from_template_string(
    template: &str,
) -> Result<Vec<SlotSpec>, GridConfigError> {
    let (cells, width, height) = parse_template(template)?;
    Ok(generate_slots_from_cells(&cells, width, height))
}

/// Generate an `OwnedGridConfig` representing a grid with specified entries.
pub fn generate_grid_config(
    word_list: WordList,
    entries: &[SlotSpec],
    cells: Vec<Cell>,
    width: usize,
    height: usize,
) -> Result<OwnedGridConfig, GridConfigError> {
    let slot_configs = generate_slot_configs(entries)?;

    Ok(OwnedGridConfig {
        word_list,
        cells,
        slot_configs,
        width,
        height,
    })
}

/// Generate an `OwnedGridConfig` from a template string; see `parse_template` for the format.
pub fn generate_grid_config_from_template_string(
    word_list: WordList,
    template: &str,
) -> Result<OwnedGridConfig, GridConfigError> {
    let (cells, width, height) = parse_template(template)?;
    let slot_specs = generate_slots_from_cells(&cells, width, height);

    generate_grid_config(word_list, &slot_specs, cells, width, height)
}

/// A struct recording a slot assignment made during a fill process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub slot_id: SlotId,
    pub word_id: WordId,
}

/// Lay the given choices out on the grid, returning a row-major matrix where `None` means either
/// a block or a square no choice covers.
#[must_use]
pub fn letter_grid(config: &GridConfig, choices: &[Choice]) -> Vec<Vec<Option<char>>> {
    let mut grid: Vec<Vec<Option<char>>> = config
        .cells
        .chunks(config.width)
        .map(|row| row.iter().map(|cell| cell.letter()).collect())
        .collect();

    for &Choice { slot_id, word_id } in choices {
        let slot_config = &config.slot_configs[slot_id];
        let word = &config.word_list.words[word_id];

        for (&(x, y), &glyph) in slot_config.cell_coords().iter().zip(&word.glyphs) {
            grid[y][x] = Some(config.word_list.glyphs[glyph]);
        }
    }

    grid
}

/// Turn the given grid config and fill choices into a rendered string, with `█` for blocks and a
/// space for any square left unfilled.
#[must_use]
pub fn render_grid(config: &GridConfig, choices: &[Choice]) -> String {
    letter_grid(config, choices)
        .iter()
        .enumerate()
        .map(|(y, line)| {
            line.iter()
                .enumerate()
                .map(|(x, cell)| {
                    if config.is_blank((x, y)) {
                        cell.unwrap_or(' ')
                    } else {
                        '█'
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use crate::grid_config::{
        generate_grid_config_from_template_string, generate_slot_configs,
        generate_slots_from_template_string, parse_template, render_grid, Cell, Choice, Crossing,
        Direction, GridConfigError, SlotSpec,
    };
    use crate::word_list::WordList;

    const STRUCTURE_0: &str = "
        #___#
        #_##_
        #_##_
        #_##_
        #____
    ";

    #[test]
    fn test_parse_template() {
        let (cells, width, height) = parse_template("#_.\nab#").unwrap();

        assert_eq!((width, height), (3, 2));
        assert_eq!(
            cells,
            vec![
                Cell::Block,
                Cell::Empty,
                Cell::Empty,
                Cell::Filled('A'),
                Cell::Filled('B'),
                Cell::Block,
            ]
        );
    }

    #[test]
    fn test_parse_template_prefilled_letters_are_normalized() {
        let (cells, _, _) = parse_template("é_").unwrap();
        assert_eq!(cells, vec![Cell::Filled('É'), Cell::Empty]);

        // A letter that uppercases to more than one character can't fill a single square.
        assert_eq!(
            parse_template("_ß"),
            Err(GridConfigError::InvalidCell { ch: 'ß', x: 1, y: 0 })
        );
    }

    #[test]
    fn test_short_rows_are_padded_with_blocks() {
        let (cells, width, height) = parse_template("__\n___\n_").unwrap();

        assert_eq!((width, height), (3, 3));
        assert_eq!(
            cells,
            vec![
                Cell::Empty,
                Cell::Empty,
                Cell::Block,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Block,
                Cell::Block,
            ]
        );

        let slot_specs = generate_slots_from_template_string("__\n___\n_").unwrap();
        assert_eq!(
            slot_specs.iter().map(SlotSpec::to_key).collect::<Vec<_>>(),
            vec!["0,0,across,2", "0,1,across,3", "0,0,down,3", "1,0,down,2"]
        );
    }

    #[test]
    fn test_parse_template_errors() {
        assert_eq!(parse_template("\n  \n"), Err(GridConfigError::EmptyTemplate));
        assert_eq!(
            parse_template("_?_"),
            Err(GridConfigError::InvalidCell { ch: '?', x: 1, y: 0 })
        );
    }

    #[test]
    fn test_generate_slots_from_template_string() {
        let slot_specs = generate_slots_from_template_string(STRUCTURE_0).unwrap();

        assert_eq!(
            slot_specs
                .iter()
                .map(SlotSpec::to_key)
                .collect::<Vec<_>>(),
            vec!["1,0,across,3", "1,4,across,4", "1,0,down,5", "4,1,down,4"]
        );
    }

    #[test]
    fn test_single_cells_are_not_slots() {
        let slot_specs = generate_slots_from_template_string("_#_\n###\n_#_").unwrap();
        assert!(slot_specs.is_empty());
    }

    #[test]
    fn test_overlaps() {
        let grid_config =
            generate_grid_config_from_template_string(WordList::from_words(&[]), STRUCTURE_0)
                .unwrap();
        let config = grid_config.to_config_ref();

        // 1-across and 1-down share their first square.
        assert_eq!(config.overlap(0, 2), Some((0, 0)));
        assert_eq!(config.overlap(2, 0), Some((0, 0)));

        // The bottom across entry crosses the end of both down entries.
        assert_eq!(config.overlap(1, 2), Some((0, 4)));
        assert_eq!(config.overlap(2, 1), Some((4, 0)));
        assert_eq!(config.overlap(1, 3), Some((3, 3)));
        assert_eq!(config.overlap(3, 1), Some((3, 3)));

        assert_eq!(config.overlap(0, 1), None);
        assert_eq!(config.overlap(0, 3), None);
        assert_eq!(config.overlap(2, 2), None);

        assert_eq!(config.neighbors(1), vec![2, 3]);
        assert_eq!(config.degree(0), 1);
        assert_eq!(config.degree(1), 2);

        assert_eq!(
            config.arcs(),
            vec![(0, 2), (1, 2), (1, 3), (2, 0), (2, 1), (3, 1)]
        );

        assert_eq!(
            config.slot_configs[0].crossings,
            vec![
                Some(Crossing {
                    other_slot_id: 2,
                    other_slot_cell: 0,
                }),
                None,
                None,
            ]
        );
    }

    #[test]
    fn test_overlapping_entries_are_rejected() {
        let entries = vec![
            SlotSpec {
                start_cell: (0, 0),
                direction: Direction::Across,
                length: 3,
            },
            SlotSpec {
                start_cell: (1, 0),
                direction: Direction::Across,
                length: 3,
            },
        ];

        assert_eq!(
            generate_slot_configs(&entries).map(|configs| configs.len()),
            Ok(2)
        );

        let mut entries = entries;
        entries.push(SlotSpec {
            start_cell: (1, 0),
            direction: Direction::Down,
            length: 2,
        });

        assert_eq!(
            generate_slot_configs(&entries).map(|configs| configs.len()),
            Err(GridConfigError::OverlappingEntries { x: 1, y: 0 })
        );
    }

    #[test]
    fn test_slot_keys() {
        let grid_config =
            generate_grid_config_from_template_string(WordList::from_words(&[]), STRUCTURE_0)
                .unwrap();

        assert_eq!(grid_config.slot_configs[1].slot_key(), "1,4,across,4");
        assert_eq!(grid_config.slot_configs[3].slot_key(), "4,1,down,4");
    }

    #[test]
    fn test_render_grid() {
        let word_list = WordList::from_words(&["six", "nine", "seven", "five"]);
        let grid_config =
            generate_grid_config_from_template_string(word_list, STRUCTURE_0).unwrap();
        let config = grid_config.to_config_ref();

        let choices = vec![
            Choice {
                slot_id: 0,
                word_id: 0,
            },
            Choice {
                slot_id: 1,
                word_id: 1,
            },
            Choice {
                slot_id: 2,
                word_id: 2,
            },
        ];

        assert_eq!(
            render_grid(&config, &choices),
            ["█SIX█", "█E██ ", "█V██ ", "█E██ ", "█NINE"].join("\n")
        );
    }

    #[test]
    fn test_render_grid_keeps_prefilled_letters() {
        let grid_config =
            generate_grid_config_from_template_string(WordList::from_words(&[]), "c__\n#__")
                .unwrap();

        assert_eq!(
            render_grid(&grid_config.to_config_ref(), &[]),
            "C  \n█  "
        );
    }
}
