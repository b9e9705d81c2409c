//! Rebuilding games from snapshots and turn history.

use connect_four::{
    Board, BoardId, Coord, Game, GameError, GameId, GamePlayer, GameSnapshot, GameState, Player,
    PlayerId, TurnRecord,
};

fn played_game(columns: &[usize]) -> Game {
    let board = Board::new(BoardId::new("board"), 7, 6).expect("board");
    let mut game = Game::new(GameId::new("game"), board).with_seed(17);
    game.add_players([Player::human("ann", "Ann"), Player::human("bo", "Bo")])
        .expect("players");
    game.start(true).expect("start");
    for &col in columns {
        let mover = game.current_player().cloned().expect("turn holder");
        game.drop_piece(&mover, col).expect("drop");
    }
    game
}

fn replayed(game: &Game) -> Result<Game, GameError> {
    let empty = Board::new(game.board().id().clone(), game.board().width(), game.board().height())
        .expect("board");
    Game::replay(
        game.id().clone(),
        empty,
        game.players().to_vec(),
        game.turns().all().to_vec(),
    )
}

#[test]
fn test_replay_reproduces_in_progress_game() {
    let game = played_game(&[3, 3, 4, 2, 6]);
    let rebuilt = replayed(&game).expect("replay");

    assert_eq!(rebuilt.state(), GameState::Started);
    assert_eq!(rebuilt.board().occupants(), game.board().occupants());
    assert_eq!(rebuilt.placed_cells(), game.placed_cells());
    assert_eq!(rebuilt.current_player(), game.current_player());
    assert_eq!(rebuilt.turns().last_sequence_id(), 5);
}

#[test]
fn test_replay_derives_win() {
    let game = played_game(&[0, 1, 0, 1, 0, 1, 0]);
    assert_eq!(game.state(), GameState::Won);

    let rebuilt = replayed(&game).expect("replay");
    assert_eq!(rebuilt.state(), GameState::Won);
    assert_eq!(rebuilt.winning_line(), game.winning_line());
    assert_eq!(rebuilt.winner(), game.winner());
}

#[test]
fn test_replay_without_order_is_new() {
    let board = Board::new(BoardId::new("board"), 7, 6).expect("board");
    let players = vec![
        GamePlayer::unordered(Player::human("ann", "Ann")),
        GamePlayer::unordered(Player::human("bo", "Bo")),
    ];
    let game = Game::replay(GameId::new("game"), board, players, Vec::new()).expect("replay");
    assert_eq!(game.state(), GameState::New);
    assert_eq!(game.players().len(), 2);
}

#[test]
fn test_replay_rejects_floating_piece() {
    let game = played_game(&[3]);
    let mut turns = game.turns().all().to_vec();
    let first = turns.remove(0);
    turns.push(TurnRecord::new(
        *first.sequence_id(),
        first.game_id().clone(),
        first.player_id().clone(),
        Coord::new(2, 3),
        *first.created_at(),
    ));

    let empty = Board::new(BoardId::new("board"), 7, 6).expect("board");
    let err = Game::replay(game.id().clone(), empty, game.players().to_vec(), turns)
        .expect_err("piece in mid-air");
    assert!(matches!(err, GameError::InvariantViolation { .. }));
}

#[test]
fn test_replay_rejects_unknown_player() {
    let game = played_game(&[3]);
    let first = &game.turns().all()[0];
    let forged = TurnRecord::new(
        1,
        game.id().clone(),
        PlayerId::new("mallory"),
        *first.location(),
        *first.created_at(),
    );
    let empty = Board::new(BoardId::new("board"), 7, 6).expect("board");
    let err = Game::replay(game.id().clone(), empty, game.players().to_vec(), vec![forged])
        .expect_err("unknown player");
    assert!(matches!(err, GameError::NotFound { .. }));
}

#[test]
fn test_snapshot_round_trips_through_json() {
    let game = played_game(&[0, 1, 0, 1, 0, 1, 0]);
    let snapshot = game.snapshot();

    let json = serde_json::to_string(&snapshot).expect("serialize");
    let decoded: GameSnapshot = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(decoded, snapshot);

    let restored = Game::from_snapshot(decoded).expect("restore");
    assert_eq!(restored.state(), GameState::Won);
    assert_eq!(restored.winner(), game.winner());
    // Win lines are recomputed on load rather than stored.
    let anchor = restored.board().cell(Coord::new(5, 0)).expect("cell");
    assert!(!anchor.win_lines().is_empty());
}

#[test]
fn test_snapshot_turns_since() {
    let game = played_game(&[0, 1, 2, 3]);
    let snapshot = game.snapshot();
    let later: Vec<u64> = snapshot.turns_since(2).iter().map(|t| *t.sequence_id()).collect();
    assert_eq!(later, vec![3, 4]);
}

#[test]
fn test_from_snapshot_rejects_tampered_state() {
    let game = played_game(&[0, 1]);
    let mut value = serde_json::to_value(game.snapshot()).expect("serialize");
    value["placed_cells"] = serde_json::json!([]);
    let tampered: GameSnapshot = serde_json::from_value(value).expect("deserialize");

    let err = Game::from_snapshot(tampered).expect_err("tampered");
    assert!(matches!(err, GameError::InvariantViolation { .. }));
}
