//! Win-line precomputation against brute-force enumeration.

use connect_four::lines::LineTable;
use connect_four::{
    Board, BoardId, Coord, Game, GameEnd, GameId, GameState, Player, PlayerId, WIN_LENGTH, rules,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

type CellSet = BTreeSet<(usize, usize)>;

/// Every run of four cells in all eight directions, as unordered sets.
fn brute_force_lines(width: usize, height: usize) -> BTreeSet<CellSet> {
    let directions: [(isize, isize); 8] = [
        (-1, 0),
        (1, 0),
        (0, -1),
        (0, 1),
        (-1, -1),
        (-1, 1),
        (1, -1),
        (1, 1),
    ];
    let mut lines = BTreeSet::new();
    for row in 0..height as isize {
        for col in 0..width as isize {
            for (dr, dc) in directions {
                let cells: Option<CellSet> = (0..WIN_LENGTH as isize)
                    .map(|step| {
                        let (r, c) = (row + dr * step, col + dc * step);
                        let inside = r >= 0 && c >= 0 && r < height as isize && c < width as isize;
                        inside.then_some((r as usize, c as usize))
                    })
                    .collect();
                if let Some(cells) = cells {
                    lines.insert(cells);
                }
            }
        }
    }
    lines
}

/// Brute-force lines through `cell` whose four cells share one owner.
fn complete_lines_through(board: &Board, cell: Coord) -> BTreeSet<CellSet> {
    brute_force_lines(board.width(), board.height())
        .into_iter()
        .filter(|line| line.contains(&(cell.row, cell.col)))
        .filter(|line| {
            let owners: BTreeSet<Option<&PlayerId>> = line
                .iter()
                .map(|&(row, col)| board.occupant(Coord::new(row, col)))
                .collect();
            owners.len() == 1 && owners.iter().all(Option::is_some)
        })
        .collect()
}

fn table_lines(table: &LineTable) -> Vec<CellSet> {
    table
        .anchored
        .iter()
        .flatten()
        .flatten()
        .map(|line| line.cells().iter().map(|c| (c.row, c.col)).collect())
        .collect()
}

#[test]
fn test_standard_board_has_69_lines() {
    assert_eq!(LineTable::build(7, 6).line_count(), 69);
    assert_eq!(brute_force_lines(7, 6).len(), 69);
}

#[test]
fn test_small_board_has_no_lines() {
    assert_eq!(LineTable::build(3, 3).line_count(), 0);
}

proptest! {
    #[test]
    fn test_anchored_lines_match_brute_force(width in 1usize..10, height in 1usize..10) {
        let table = LineTable::build(width, height);
        let stored = table_lines(&table);
        let unique: BTreeSet<CellSet> = stored.iter().cloned().collect();

        prop_assert_eq!(stored.len(), unique.len(), "a line is stored twice");
        prop_assert_eq!(unique, brute_force_lines(width, height));
    }

    #[test]
    fn test_lines_are_anchored_at_a_member(width in 1usize..10, height in 1usize..10) {
        let table = LineTable::build(width, height);
        for (row, cells) in table.anchored.iter().enumerate() {
            for (col, lines) in cells.iter().enumerate() {
                for line in lines {
                    prop_assert_eq!(line.anchor(), Coord::new(row, col));
                    prop_assert!(line.contains(Coord::new(row, col)));
                }
            }
        }
    }

    #[test]
    fn test_crossing_lines_cover_every_member(width in 4usize..9, height in 4usize..9) {
        let table = LineTable::build(width, height);
        for line in table.anchored.iter().flatten().flatten() {
            for cell in line.cells() {
                prop_assert!(table.crossing[cell.row][cell.col].contains(line));
            }
        }
    }

    #[test]
    fn test_winning_line_is_a_real_line(seed in any::<u64>()) {
        let board = Board::new(BoardId::new("b"), 7, 6).expect("board");
        let mut game = Game::new(GameId::new("g"), board).with_seed(seed);
        game.add_players([Player::ai("r1", "Robo"), Player::ai("r2", "Bender")])
            .expect("players");
        game.start(true).expect("start");

        let all = brute_force_lines(7, 6);
        match game.state() {
            GameState::Won => {
                let line = game.winning_line().expect("winning line");
                let cells: CellSet = line.cells().iter().map(|c| (c.row, c.col)).collect();
                prop_assert!(all.contains(&cells));
                prop_assert!(rules::is_complete(game.board(), line));

                let last = game.placed_cells().last().copied().expect("a move");
                prop_assert!(line.contains(last), "line {} misses last move {}", line, last);
                let last_mover = game.turns().all().last().expect("a turn").player_id().clone();
                prop_assert_eq!(game.winner(), Some(&last_mover));
            }
            GameState::Tied => {
                prop_assert!(rules::find_winning_line(game.board(), game.placed_cells()).is_none());
                prop_assert!(game.board().available_columns().is_empty());
            }
            other => prop_assert!(false, "game did not finish: {}", other),
        }
    }

    #[test]
    fn test_fast_path_matches_brute_force(
        width in 1usize..9,
        height in 1usize..9,
        columns in prop::collection::vec(0usize..9, 0..80),
    ) {
        let mut board = Board::new(BoardId::new("b"), width, height).expect("board");
        let players = [PlayerId::new("a"), PlayerId::new("b")];

        for (turn, column) in columns.into_iter().map(|c| c % width).enumerate() {
            let Ok(row) = board.resolve_drop_row(column) else {
                continue;
            };
            let mover = &players[turn % players.len()];
            board.place(row, column, mover.clone()).expect("place");
            let location = Coord::new(row, column);

            let expected = complete_lines_through(&board, location);
            match rules::check_move(&board, location) {
                GameEnd::Won { line, winner } => {
                    let cells: CellSet = line.cells().iter().map(|c| (c.row, c.col)).collect();
                    prop_assert!(expected.contains(&cells), "{} is not a complete line", line);
                    prop_assert_eq!(&winner, mover);
                }
                GameEnd::Tied => {
                    prop_assert!(expected.is_empty());
                    prop_assert!(board.available_columns().is_empty());
                }
                GameEnd::InProgress => {
                    prop_assert!(expected.is_empty(), "missed {:?} through {}", expected, location);
                    prop_assert!(!board.available_columns().is_empty());
                }
            }
        }
    }
}
