mod common;

use std::sync::atomic::Ordering;

use chess_sync_server::game::{Board, Color, Game, GameStatus, Move, Piece, PieceType};
use chess_sync_server::models::{ClientMessage, ConnectionId, GameId, Role, ServerMessage};
use chess_sync_server::SyncError;

use common::{mv, sq, Harness};

#[test]
fn roles_are_assigned_in_join_order() {
    let h = Harness::with_games(&[7]);
    let x = h.client("xavier");
    let y = h.client("yara");
    let z = h.client("zed");

    assert_eq!(h.connect(&x, 7).unwrap(), Role::White);
    assert_eq!(h.connect(&y, 7).unwrap(), Role::Black);
    assert_eq!(h.connect(&z, 7).unwrap(), Role::Spectator);

    // the joiner gets the board, everyone else hears about the join
    assert_eq!(z.sink.snapshot_count(), 1);
    assert!(x.sink.notifications().contains(&"zed joined as SPECTATOR".to_string()));
    assert!(y.sink.notifications().contains(&"zed joined as SPECTATOR".to_string()));
    assert!(!z.sink.notifications().contains(&"zed joined as SPECTATOR".to_string()));
}

#[test]
fn opening_move_updates_the_authoritative_game() {
    let h = Harness::with_games(&[7]);
    let white = h.client("white");
    let black = h.client("black");
    let watcher = h.client("watcher");
    h.connect(&white, 7).unwrap();
    h.connect(&black, 7).unwrap();
    h.connect(&watcher, 7).unwrap();
    for c in [&white, &black, &watcher] {
        c.sink.clear();
    }

    h.play(&white, 7, "e2", "e4").unwrap();

    let game = h.game(7);
    assert_eq!(game.side_to_move(), Color::Black);
    assert_eq!(game.board().get(sq("e2")), None);
    assert_eq!(
        game.board().get(sq("e4")),
        Some(Piece::new(Color::White, PieceType::Pawn))
    );

    for c in [&white, &black, &watcher] {
        assert_eq!(c.sink.snapshot_count(), 1);
    }
    assert!(white.sink.notifications().is_empty());
    assert_eq!(black.sink.notifications(), vec!["white moved e2 to e4".to_string()]);
    assert_eq!(watcher.sink.notifications(), vec!["white moved e2 to e4".to_string()]);
}

#[test]
fn black_cannot_move_on_whites_turn() {
    let h = Harness::with_games(&[7]);
    let white = h.client("white");
    let black = h.client("black");
    h.connect(&white, 7).unwrap();
    h.connect(&black, 7).unwrap();
    white.sink.clear();

    let err = h.play(&black, 7, "e7", "e5").unwrap_err();
    assert!(matches!(err, SyncError::NotYourTurn));
    assert_eq!(h.game(7), Game::new());
    assert!(white.sink.messages().is_empty());
}

#[test]
fn spectators_cannot_move() {
    let h = Harness::with_games(&[7]);
    let clients: Vec<_> = ["a", "b", "c"].iter().map(|n| h.client(n)).collect();
    for c in &clients {
        h.connect(c, 7).unwrap();
    }
    let err = h.play(&clients[2], 7, "e2", "e4").unwrap_err();
    assert!(matches!(err, SyncError::SpectatorsCannotMove));
    assert_eq!(h.game(7), Game::new());
}

#[test]
fn illegal_move_is_rejected_without_broadcast() {
    let h = Harness::with_games(&[7]);
    let white = h.client("white");
    let black = h.client("black");
    h.connect(&white, 7).unwrap();
    h.connect(&black, 7).unwrap();
    black.sink.clear();

    let err = h.play(&white, 7, "e2", "e5").unwrap_err();
    assert!(matches!(err, SyncError::IllegalMove(_)));
    let err = h.play(&white, 7, "e7", "e5").unwrap_err();
    assert!(matches!(err, SyncError::IllegalMove(_)));
    assert_eq!(h.game(7).side_to_move(), Color::White);
    assert!(black.sink.messages().is_empty());
}

#[test]
fn outsiders_and_bad_tokens_are_rejected() {
    let h = Harness::with_games(&[7, 8]);
    let white = h.client("white");
    let outsider = h.client("outsider");
    h.connect(&white, 7).unwrap();
    h.connect(&outsider, 8).unwrap();

    let err = h.play(&outsider, 7, "e2", "e4").unwrap_err();
    assert!(matches!(err, SyncError::NotAJoinedParticipant(GameId(7))));

    // the right connection with someone else's token
    let err = h
        .sync
        .handle_move(white.conn, GameId(7), &outsider.token, mv("e2", "e4"))
        .unwrap_err();
    assert!(matches!(err, SyncError::NotAJoinedParticipant(_)));

    let err = h
        .sync
        .handle_move(white.conn, GameId(7), "forged", mv("e2", "e4"))
        .unwrap_err();
    assert!(matches!(err, SyncError::InvalidIdentity));

    let err = h
        .sync
        .handle_connect(ConnectionId::new(), white.dyn_sink(), GameId(7), "forged")
        .unwrap_err();
    assert!(matches!(err, SyncError::InvalidIdentity));
}

#[test]
fn connecting_to_missing_game_fails() {
    let h = Harness::with_games(&[]);
    let c = h.client("c");
    let err = h.connect(&c, 42).unwrap_err();
    assert!(matches!(err, SyncError::GameNotFound(GameId(42))));
    assert_eq!(h.sync.registry().room_count(), 0);
    assert_eq!(h.sync.registry().bound_game(c.conn), None);
}

#[test]
fn back_rank_mate_ends_the_game_for_everyone() {
    let h = Harness::with_games(&[]);
    let mut board = Board::new();
    for (s, color, kind) in [
        ("g1", Color::White, PieceType::King),
        ("a1", Color::White, PieceType::Rook),
        ("f2", Color::White, PieceType::Pawn),
        ("g2", Color::White, PieceType::Pawn),
        ("h2", Color::White, PieceType::Pawn),
        ("g8", Color::Black, PieceType::King),
        ("f7", Color::Black, PieceType::Pawn),
        ("g7", Color::Black, PieceType::Pawn),
        ("h7", Color::Black, PieceType::Pawn),
    ] {
        board.set(sq(s), Some(Piece::new(color, kind)));
    }
    h.store
        .inner
        .insert(GameId(7), Game::from_position(board, Color::White));

    let white = h.client("white");
    let black = h.client("black");
    let watcher = h.client("watcher");
    h.connect(&white, 7).unwrap();
    h.connect(&black, 7).unwrap();
    h.connect(&watcher, 7).unwrap();

    h.play(&white, 7, "a1", "a8").unwrap();

    let game = h.game(7);
    assert!(game.is_in_checkmate(Color::Black));
    assert_eq!(game.status(), GameStatus::Checkmate);

    let notice = "Checkmate: BLACK is mated, WHITE wins".to_string();
    for c in [&white, &black, &watcher] {
        assert!(c.sink.notifications().contains(&notice));
    }

    // nothing more is accepted once the game is over
    let err = h.play(&black, 7, "g8", "h8").unwrap_err();
    assert!(matches!(err, SyncError::GameOver(GameId(7))));
}

#[test]
fn stalemate_draws_the_game_for_everyone() {
    let h = Harness::with_games(&[]);
    let mut board = Board::new();
    for (s, color, kind) in [
        ("h1", Color::White, PieceType::King),
        ("b5", Color::White, PieceType::Queen),
        ("a8", Color::Black, PieceType::King),
    ] {
        board.set(sq(s), Some(Piece::new(color, kind)));
    }
    h.store
        .inner
        .insert(GameId(8), Game::from_position(board, Color::White));

    let white = h.client("white");
    let black = h.client("black");
    let watcher = h.client("watcher");
    h.connect(&white, 8).unwrap();
    h.connect(&black, 8).unwrap();
    h.connect(&watcher, 8).unwrap();

    h.play(&white, 8, "b5", "b6").unwrap();

    let game = h.game(8);
    assert!(game.is_in_stalemate(Color::Black));
    assert_eq!(game.status(), GameStatus::Stalemate);

    let notice = "Stalemate: BLACK has no legal move, the game is drawn".to_string();
    for c in [&white, &black, &watcher] {
        assert!(c.sink.notifications().contains(&notice));
    }
    assert!(!black
        .sink
        .notifications()
        .contains(&"BLACK is in check".to_string()));

    let err = h.play(&black, 8, "a8", "b8").unwrap_err();
    assert!(matches!(err, SyncError::GameOver(GameId(8))));
}

#[test]
fn check_is_announced() {
    let h = Harness::with_games(&[1]);
    let white = h.client("white");
    let black = h.client("black");
    h.connect(&white, 1).unwrap();
    h.connect(&black, 1).unwrap();
    for (c, from, to) in [
        (&white, "e2", "e4"),
        (&black, "f7", "f6"),
        (&white, "d1", "h5"),
    ] {
        h.play(c, 1, from, to).unwrap();
    }
    assert_eq!(h.game(1).status(), GameStatus::Check);
    assert!(black.sink.notifications().contains(&"BLACK is in check".to_string()));
}

#[test]
fn promotion_travels_through_the_protocol() {
    let h = Harness::with_games(&[]);
    let mut board = Board::new();
    board.set(sq("b7"), Some(Piece::new(Color::White, PieceType::Pawn)));
    board.set(sq("e1"), Some(Piece::new(Color::White, PieceType::King)));
    board.set(sq("h5"), Some(Piece::new(Color::Black, PieceType::King)));
    h.store
        .inner
        .insert(GameId(3), Game::from_position(board, Color::White));

    let white = h.client("white");
    h.connect(&white, 3).unwrap();
    h.sync
        .handle_move(
            white.conn,
            GameId(3),
            &white.token,
            Move::promoting(sq("b7"), sq("b8"), PieceType::Rook),
        )
        .unwrap();
    assert_eq!(
        h.game(3).board().get(sq("b8")),
        Some(Piece::new(Color::White, PieceType::Rook))
    );
}

#[test]
fn failed_save_is_not_broadcast() {
    let h = Harness::with_games(&[7]);
    let white = h.client("white");
    let black = h.client("black");
    h.connect(&white, 7).unwrap();
    h.connect(&black, 7).unwrap();
    white.sink.clear();
    black.sink.clear();

    h.store.fail_saves.store(true, Ordering::SeqCst);
    let err = h.play(&white, 7, "e2", "e4").unwrap_err();
    assert!(matches!(err, SyncError::Storage(_)));
    assert!(white.sink.messages().is_empty());
    assert!(black.sink.messages().is_empty());
    assert_eq!(h.game(7), Game::new());

    h.store.fail_saves.store(false, Ordering::SeqCst);
    h.play(&white, 7, "e2", "e4").unwrap();
}

#[test]
fn dead_recipient_does_not_block_others() {
    let h = Harness::with_games(&[7]);
    let white = h.client("white");
    let black = h.client("black");
    let watcher = h.client("watcher");
    h.connect(&white, 7).unwrap();
    h.connect(&black, 7).unwrap();
    h.connect(&watcher, 7).unwrap();
    watcher.sink.clear();

    black.sink.close();
    h.play(&white, 7, "d2", "d4").unwrap();

    assert_eq!(watcher.sink.snapshot_count(), 1);
    assert_eq!(h.game(7).side_to_move(), Color::Black);
}

#[test]
fn leaving_frees_the_seat_and_is_idempotent() {
    let h = Harness::with_games(&[7]);
    let white = h.client("white");
    let black = h.client("black");
    h.connect(&white, 7).unwrap();
    h.connect(&black, 7).unwrap();

    h.sync.handle_leave(white.conn, GameId(7), &white.token).unwrap();
    assert!(black.sink.notifications().contains(&"white left the game".to_string()));
    assert_eq!(h.sync.registry().bound_game(white.conn), None);

    // leaving twice, or after disconnect, changes nothing
    h.sync.handle_leave(white.conn, GameId(7), &white.token).unwrap();
    h.sync.handle_disconnect(white.conn);
    let left = black
        .sink
        .notifications()
        .iter()
        .filter(|n| n.as_str() == "white left the game")
        .count();
    assert_eq!(left, 1);

    let err = h.play(&white, 7, "e2", "e4").unwrap_err();
    assert!(matches!(err, SyncError::NotAJoinedParticipant(_)));

    // the white seat is open again
    let newcomer = h.client("newcomer");
    assert_eq!(h.connect(&newcomer, 7).unwrap(), Role::White);
}

#[test]
fn disconnect_cleans_up_and_retires_empty_rooms() {
    let h = Harness::with_games(&[7]);
    let white = h.client("white");
    let black = h.client("black");
    h.connect(&white, 7).unwrap();
    h.connect(&black, 7).unwrap();

    h.sync.handle_disconnect(white.conn);
    assert!(black.sink.notifications().contains(&"white left the game".to_string()));
    h.sync.handle_disconnect(black.conn);

    assert_eq!(h.sync.registry().room_count(), 0);
    assert_eq!(h.sync.registry().connection_count(), 0);

    // rejoining after leaving is a fresh join
    assert_eq!(h.connect(&black, 7).unwrap(), Role::White);
}

#[test]
fn connecting_elsewhere_leaves_the_old_room() {
    let h = Harness::with_games(&[1, 2]);
    let roamer = h.client("roamer");
    let stayer = h.client("stayer");
    h.connect(&roamer, 1).unwrap();
    h.connect(&stayer, 1).unwrap();

    assert_eq!(h.connect(&roamer, 2).unwrap(), Role::White);
    assert_eq!(h.sync.registry().bound_game(roamer.conn), Some(GameId(2)));
    assert!(stayer.sink.notifications().contains(&"roamer left the game".to_string()));

    let err = h.play(&roamer, 1, "e2", "e4").unwrap_err();
    assert!(matches!(err, SyncError::NotAJoinedParticipant(GameId(1))));
}

#[test]
fn resignation_ends_the_game() {
    let h = Harness::with_games(&[5]);
    let white = h.client("white");
    let black = h.client("black");
    let watcher = h.client("watcher");
    h.connect(&white, 5).unwrap();
    h.connect(&black, 5).unwrap();
    h.connect(&watcher, 5).unwrap();

    let err = h
        .sync
        .handle_resign(watcher.conn, GameId(5), &watcher.token)
        .unwrap_err();
    assert!(matches!(err, SyncError::SpectatorsCannotResign));

    h.sync.handle_resign(black.conn, GameId(5), &black.token).unwrap();
    assert_eq!(h.game(5).status(), GameStatus::Resigned);
    for c in [&white, &black, &watcher] {
        assert!(c
            .sink
            .notifications()
            .contains(&"BLACK resigned, WHITE wins".to_string()));
    }

    let err = h.play(&white, 5, "e2", "e4").unwrap_err();
    assert!(matches!(err, SyncError::GameOver(_)));
    let err = h
        .sync
        .handle_resign(white.conn, GameId(5), &white.token)
        .unwrap_err();
    assert!(matches!(err, SyncError::GameOver(_)));
}

#[test]
fn dispatch_reports_errors_to_the_sender_only() {
    let h = Harness::with_games(&[7]);
    let white = h.client("white");
    let black = h.client("black");
    let white_sink = white.dyn_sink();
    let black_sink = black.dyn_sink();

    h.sync.dispatch(
        white.conn,
        &white_sink,
        ClientMessage::Connect {
            game_id: GameId(7),
            auth_token: white.token.clone(),
        },
    );
    h.sync.dispatch(
        black.conn,
        &black_sink,
        ClientMessage::Connect {
            game_id: GameId(7),
            auth_token: black.token.clone(),
        },
    );
    white.sink.clear();
    black.sink.clear();

    h.sync.dispatch(
        black.conn,
        &black_sink,
        ClientMessage::MakeMove {
            game_id: GameId(7),
            auth_token: black.token.clone(),
            chess_move: mv("e7", "e5"),
        },
    );

    assert_eq!(black.sink.errors(), vec!["it is not your turn".to_string()]);
    assert!(white.sink.messages().is_empty());

    let unknown = ClientMessage::parse(r#"{"message_type":"chat"}"#).unwrap_err();
    h.sync.report(black.conn, black_sink.as_ref(), &unknown);
    assert!(matches!(
        black.sink.messages().last(),
        Some(ServerMessage::Error { error_message })
            if error_message == "unknown message type: chat"
    ));
}

#[test]
fn moves_alternate_between_seats() {
    let h = Harness::with_games(&[9]);
    let white = h.client("white");
    let black = h.client("black");
    h.connect(&white, 9).unwrap();
    h.connect(&black, 9).unwrap();

    let line = [
        (&white, "e2", "e4"),
        (&black, "e7", "e5"),
        (&white, "g1", "f3"),
        (&black, "b8", "c6"),
    ];
    for (i, (c, from, to)) in line.iter().enumerate() {
        h.play(c, 9, from, to).unwrap();
        let expected = if i % 2 == 0 { Color::Black } else { Color::White };
        assert_eq!(h.game(9).side_to_move(), expected);
    }

    assert!(matches!(
        h.play(&black, 9, "d7", "d5").unwrap_err(),
        SyncError::NotYourTurn
    ));
    h.play(&white, 9, "f1", "c4").unwrap();
}
