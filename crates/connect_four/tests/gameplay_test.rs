//! End-to-end games through the public API.

use connect_four::{
    Board, BoardError, BoardId, Coord, Game, GameError, GameId, GameState, Player, PlayerId,
};
use proptest::prelude::*;
use std::collections::HashMap;

fn new_game(width: usize, height: usize, seed: u64) -> Game {
    let board = Board::new(BoardId::new("board"), width, height).expect("board");
    let mut game = Game::new(GameId::new("game"), board).with_seed(seed);
    game.add_players([Player::human("ann", "Ann"), Player::human("bo", "Bo")])
        .expect("players");
    game.start(true).expect("start");
    game
}

fn holder(game: &Game) -> PlayerId {
    game.current_player().cloned().expect("turn holder")
}

#[test]
fn test_vertical_win_in_first_column() {
    let mut game = new_game(7, 6, 1);
    let first = holder(&game);

    for _ in 0..3 {
        game.drop_piece(&first, 0).expect("first player drop");
        let second = holder(&game);
        game.drop_piece(&second, 1).expect("second player drop");
    }
    assert_eq!(game.state(), GameState::Started);

    let landed = game.drop_piece(&first, 0).expect("winning drop");
    assert_eq!(landed, Coord::new(2, 0));
    assert_eq!(game.state(), GameState::Won);
    assert_eq!(game.winner(), Some(&first));

    let line = game.winning_line().expect("winning line");
    let cells: Vec<[usize; 2]> = line.cells().iter().map(|&c| c.into()).collect();
    assert_eq!(cells, vec![[5, 0], [4, 0], [3, 0], [2, 0]]);
    assert_eq!(
        serde_json::to_string(line).expect("serialize"),
        "[[5,0],[4,0],[3,0],[2,0]]"
    );
}

#[test]
fn test_no_moves_after_win() {
    let mut game = new_game(7, 6, 2);
    let first = holder(&game);
    for _ in 0..3 {
        game.drop_piece(&first, 3).expect("drop");
        let second = holder(&game);
        game.drop_piece(&second, 4).expect("drop");
    }
    game.drop_piece(&first, 3).expect("winning drop");

    let err = game.drop_piece(&first, 5).expect_err("game over");
    assert!(matches!(err, GameError::InvalidGameState { state: GameState::Won, .. }));
}

#[test]
fn test_full_column_rejected_without_side_effects() {
    let mut game = new_game(7, 6, 3);
    for _ in 0..6 {
        let mover = holder(&game);
        game.drop_piece(&mover, 2).expect("drop");
    }
    assert_eq!(game.state(), GameState::Started);

    let mover = holder(&game);
    let before = game.snapshot();
    let err = game.drop_piece(&mover, 2).expect_err("column full");
    assert_eq!(
        err,
        GameError::InvalidPiecePlacement {
            source: BoardError::ColumnFull { column: 2 }
        }
    );
    assert_eq!(game.snapshot(), before);
    assert!(!game.board().available_columns().contains(&2));
}

#[test]
fn test_turn_order_cycles_through_roster() {
    let board = Board::new(BoardId::new("board"), 9, 9).expect("board");
    let mut game = Game::new(GameId::new("game"), board).with_seed(5);
    game.add_players((0..4).map(|i| Player::human(format!("p{i}"), format!("P{i}"))))
        .expect("players");
    game.start(true).expect("start");

    let order_of = |game: &Game, id: &PlayerId| {
        game.player(id).and_then(|p| *p.play_order()).expect("ordered")
    };

    let mut seen = Vec::new();
    for col in [0, 2, 4, 6, 8, 0, 2, 4] {
        let mover = holder(&game);
        seen.push(order_of(&game, &mover));
        game.drop_piece(&mover, col).expect("drop");
    }
    assert_eq!(seen, vec![0, 1, 2, 3, 0, 1, 2, 3]);
}

#[test]
fn test_play_order_permutations_are_uniform() {
    let board = Board::new(BoardId::new("board"), 7, 6).expect("board");
    let mut game = Game::new(GameId::new("game"), board).with_seed(99);
    game.add_players([
        Player::human("a", "A"),
        Player::human("b", "B"),
        Player::human("c", "C"),
    ])
    .expect("players");

    let mut counts: HashMap<Vec<usize>, usize> = HashMap::new();
    for _ in 0..6000 {
        game.start(false).expect("start");
        let order: Vec<usize> = game
            .players()
            .iter()
            .map(|p| p.play_order().expect("ordered"))
            .collect();
        *counts.entry(order).or_default() += 1;
    }

    assert_eq!(counts.len(), 6, "every permutation appears: {counts:?}");
    for (order, count) in &counts {
        assert!((800..1200).contains(count), "{order:?} dealt {count} times");
    }
}

#[test]
fn test_sequence_ids_are_monotonic_and_queryable() {
    let mut game = new_game(7, 6, 8);
    for col in [0, 1, 2, 3, 4] {
        let mover = holder(&game);
        game.drop_piece(&mover, col).expect("drop");
    }

    let ids: Vec<u64> = game.turns().all().iter().map(|t| *t.sequence_id()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);

    let after_three: Vec<u64> = game.turns().since(3).iter().map(|t| *t.sequence_id()).collect();
    assert_eq!(after_three, vec![4, 5]);
    assert!(game.turns().since(5).is_empty());
    assert_eq!(game.turns().since(0).len(), 5);
}

#[test]
fn test_invalid_board_dimensions() {
    let err = Board::new(BoardId::new("b"), 0, 6).expect_err("zero width");
    assert_eq!(err, BoardError::InvalidDimensions { width: 0, height: 6 });
}

proptest! {
    #[test]
    fn test_small_board_always_ties(columns in proptest::collection::vec(0usize..3, 9..40), seed in any::<u64>()) {
        let mut game = new_game(3, 3, seed);
        for col in columns {
            if game.state() != GameState::Started {
                break;
            }
            let mover = holder(&game);
            // Full columns are rejected and the same player tries again.
            let _ = game.drop_piece(&mover, col);
        }
        while game.state() == GameState::Started {
            let mover = holder(&game);
            let col = game.board().available_columns()[0];
            game.drop_piece(&mover, col).expect("drop");
        }

        prop_assert_eq!(game.state(), GameState::Tied);
        prop_assert!(game.winning_line().is_none());
        prop_assert_eq!(game.turns().len(), 9);
    }

    #[test]
    fn test_rejected_drops_never_mutate(seed in any::<u64>(), column in 7usize..20) {
        let mut game = new_game(7, 6, seed);
        let mover = holder(&game);
        let before = game.snapshot();
        prop_assert!(game.drop_piece(&mover, column).is_err());
        prop_assert_eq!(game.snapshot(), before);
    }
}
