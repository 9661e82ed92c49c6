/// Opponent turns against a scripted engine: requests, replies, failures,
/// stale replies and leaving the opponent mode.
mod common;

use std::time::Duration;

use chess_core::{ChessMove, Color, NotationError, Position, Role, Square, StandardRules};
use game_session::{
    ClickOutcome, EngineError, EngineEvent, EngineReply, GameSession, GameSettings,
    InputRejection, ReplyOutcome, SelectionState, SessionOptions,
};

use common::{as_engine, next_event, settle, ScriptedEngine};

fn vs_engine(
    human: Color,
    engine: &std::sync::Arc<ScriptedEngine>,
) -> (GameSession, game_session::EngineEvents) {
    GameSession::new(
        StandardRules,
        GameSettings::human_vs_opponent(human),
        as_engine(engine),
    )
    .unwrap()
}

fn human_move(session: &mut GameSession, from: Square, to: Square) {
    assert_eq!(session.click(from), ClickOutcome::Selected(from));
    assert!(matches!(session.click(to), ClickOutcome::Committed { .. }));
}

#[tokio::test]
async fn test_scenario_b_click_on_opponent_piece() {
    let engine = ScriptedEngine::moves(&[]);
    let (mut session, _events) = vs_engine(Color::White, &engine);

    assert_eq!(session.click(Square::E7), ClickOutcome::Ignored);
    assert_eq!(session.position(), &Position::starting());
    assert_eq!(session.selection(), SelectionState::Idle);
    assert!(session.highlights().is_empty());
    assert_eq!(engine.requests(), 0);
}

#[tokio::test]
async fn test_engine_replies_after_human_move() {
    let engine = ScriptedEngine::moves(&["e7e5"]);
    let (mut session, mut events) = vs_engine(Color::White, &engine);

    human_move(&mut session, Square::E2, Square::E4);
    assert!(session.is_thinking());
    assert_eq!(
        session.click(Square::D2),
        ClickOutcome::Rejected(InputRejection::OpponentThinking)
    );

    let event = next_event(&mut events).await;
    let outcome = session.handle_engine_event(event);
    assert_eq!(
        outcome,
        ReplyOutcome::Applied {
            mv: ChessMove::new(Square::E7, Square::E5),
            san: "e5".to_string()
        }
    );
    assert!(!session.is_thinking());
    assert!(session.input_accepted());
    assert_eq!(session.position().side_to_move(), Color::White);
    assert_eq!(session.history().len(), 2);
    assert_eq!(engine.requests(), 1);
    assert_eq!(
        engine.requested_fens(),
        vec![session.history()[0].fen_after.clone()]
    );
}

#[tokio::test]
async fn test_engine_moves_first_when_human_plays_black() {
    let engine = ScriptedEngine::moves(&["d2d4"]);
    let (mut session, mut events) = vs_engine(Color::Black, &engine);

    assert!(session.is_thinking());
    assert_eq!(engine.requested_fens(), vec![Position::starting().fen().to_string()]);

    let event = next_event(&mut events).await;
    assert!(matches!(
        session.handle_engine_event(event),
        ReplyOutcome::Applied { .. }
    ));
    assert_eq!(session.position().side_to_move(), Color::Black);
    assert_eq!(session.click(Square::D7), ClickOutcome::Selected(Square::D7));
}

#[tokio::test]
async fn test_scenario_d_rejected_reply_readmits_human() {
    // e2e4 is not a black move.
    let engine = ScriptedEngine::moves(&["e2e4"]);
    let (mut session, mut events) = vs_engine(Color::White, &engine);

    human_move(&mut session, Square::E2, Square::E4);
    let before = session.position().clone();
    let mut thinking = session.thinking();
    assert!(*thinking.borrow_and_update());

    let event = next_event(&mut events).await;
    let outcome = session.handle_engine_event(event);
    assert_eq!(
        outcome,
        ReplyOutcome::Rejected(ChessMove::new(Square::E2, Square::E4))
    );

    assert_eq!(session.position(), &before);
    assert_eq!(session.history().len(), 1);
    assert!(!session.is_thinking());
    assert!(thinking.has_changed().unwrap());
    assert!(!*thinking.borrow_and_update());
    assert!(session.is_stalled());
    assert!(session.input_accepted());

    // No automatic retry.
    settle().await;
    assert_eq!(engine.requests(), 1);

    // The human may move for the engine's side.
    human_move(&mut session, Square::E7, Square::E5);
    assert_eq!(session.history().len(), 2);
    assert!(!session.is_stalled());
    assert!(!session.is_thinking());
}

#[tokio::test]
async fn test_malformed_and_failed_replies_are_dropped() {
    let engine = ScriptedEngine::new(vec![
        Ok(EngineReply::bare("(none)")),
        Err(EngineError::Unavailable("process died".into())),
        Ok(EngineReply::bare("c7c5")),
    ]);
    let (mut session, mut events) = vs_engine(Color::White, &engine);
    human_move(&mut session, Square::E2, Square::E4);
    let before = session.position().clone();

    let event = next_event(&mut events).await;
    assert_eq!(
        session.handle_engine_event(event),
        ReplyOutcome::Malformed(NotationError::NoMove)
    );
    assert_eq!(session.position(), &before);
    assert!(session.is_stalled());

    assert!(session.retry_opponent());
    assert!(session.is_thinking());
    let event = next_event(&mut events).await;
    assert!(matches!(
        session.handle_engine_event(event),
        ReplyOutcome::Failed(EngineError::Unavailable(_))
    ));
    assert_eq!(session.position(), &before);

    assert!(session.retry_opponent());
    let event = next_event(&mut events).await;
    assert!(matches!(
        session.handle_engine_event(event),
        ReplyOutcome::Applied { .. }
    ));
    assert_eq!(engine.requests(), 3);
    assert!(!session.retry_opponent());
}

#[tokio::test]
async fn test_request_timeout_counts_as_failure() {
    // Held and never released.
    let engine = ScriptedEngine::held(vec![Ok(EngineReply::bare("e7e5"))]);
    let options = SessionOptions::default().request_timeout(Duration::from_millis(50));
    let (mut session, mut events) = GameSession::with_options(
        StandardRules,
        GameSettings::human_vs_opponent(Color::White),
        as_engine(&engine),
        options,
    )
    .unwrap();

    human_move(&mut session, Square::E2, Square::E4);
    let event = next_event(&mut events).await;
    assert!(matches!(
        session.handle_engine_event(event),
        ReplyOutcome::Failed(EngineError::Timeout(_))
    ));
    assert!(!session.is_thinking());
    assert!(session.input_accepted());
}

#[tokio::test]
async fn test_single_request_in_flight() {
    let engine = ScriptedEngine::held(vec![Ok(EngineReply::bare("e7e5"))]);
    let (mut session, mut events) = vs_engine(Color::White, &engine);

    human_move(&mut session, Square::E2, Square::E4);
    for cell in [Square::D2, Square::E7, Square::E5] {
        assert_eq!(
            session.click(cell),
            ClickOutcome::Rejected(InputRejection::OpponentThinking)
        );
    }
    assert!(!session.retry_opponent());
    settle().await;
    assert_eq!(engine.requests(), 1);

    engine.release();
    let event = next_event(&mut events).await;
    assert!(matches!(
        session.handle_engine_event(event),
        ReplyOutcome::Applied { .. }
    ));
    settle().await;
    assert_eq!(engine.requests(), 1);
}

#[tokio::test]
async fn test_reset_abandons_the_request() {
    let engine = ScriptedEngine::held(vec![Ok(EngineReply::bare("e7e5"))]);
    let (mut session, mut events) = vs_engine(Color::White, &engine);

    human_move(&mut session, Square::E2, Square::E4);
    session.reset();
    assert!(!session.is_thinking());
    assert_eq!(session.position(), &Position::starting());

    engine.release();
    let late = tokio::time::timeout(Duration::from_millis(100), events.recv()).await;
    if let Ok(Some(event)) = late {
        assert_eq!(session.handle_engine_event(event), ReplyOutcome::Stale);
    }
    assert!(session.history().is_empty());
    assert!(!engine.is_disposed());
}

#[tokio::test]
async fn test_scenario_e_leaving_opponent_mode() {
    let engine = ScriptedEngine::held(vec![Ok(EngineReply::bare("e7e5"))]);
    let (mut session, mut events) = vs_engine(Color::White, &engine);

    human_move(&mut session, Square::E2, Square::E4);
    assert!(session.is_thinking());

    session
        .reconfigure(GameSettings::human_vs_human(), None)
        .unwrap();
    assert!(engine.is_disposed());
    assert!(!session.is_thinking());
    assert_eq!(session.position(), &Position::starting());

    engine.release();
    let late = tokio::time::timeout(Duration::from_millis(100), events.recv()).await;
    if let Ok(Some(event)) = late {
        assert_eq!(session.handle_engine_event(event), ReplyOutcome::Stale);
    }

    // A reply forged for the old session is ignored too.
    let forged = EngineEvent {
        generation: 1,
        request_id: 1,
        result: Ok(EngineReply::bare("e7e5")),
    };
    assert_eq!(session.handle_engine_event(forged), ReplyOutcome::Stale);
    assert!(session.history().is_empty());

    // Both sides are now human.
    human_move(&mut session, Square::E2, Square::E4);
    human_move(&mut session, Square::E7, Square::E5);
}

#[tokio::test]
async fn test_reconfigure_to_a_new_engine() {
    let first = ScriptedEngine::moves(&[]);
    let second = ScriptedEngine::moves(&["g1f3"]);
    let (mut session, mut events) = vs_engine(Color::White, &first);

    session
        .reconfigure(GameSettings::human_vs_opponent(Color::Black), as_engine(&second))
        .unwrap();
    assert!(first.is_disposed());
    assert!(!second.is_disposed());
    assert!(session.is_thinking());

    let event = next_event(&mut events).await;
    assert!(matches!(
        session.handle_engine_event(event),
        ReplyOutcome::Applied { ref san, .. } if san == "Nf3"
    ));
    assert_eq!(first.requests(), 0);
}

#[tokio::test]
async fn test_shutdown_disposes_engine() {
    let engine = ScriptedEngine::held(vec![Ok(EngineReply::bare("e7e5"))]);
    let (mut session, _events) = vs_engine(Color::White, &engine);
    human_move(&mut session, Square::E2, Square::E4);

    session.shutdown();
    assert!(engine.is_disposed());
    assert!(!session.is_thinking());
}

#[tokio::test]
async fn test_engine_analysis_reaches_snapshot() {
    let engine = ScriptedEngine::new(vec![Ok(EngineReply {
        best_move: "e7e5".to_string(),
        cp: Some(-30),
        mate: None,
        pv: vec!["e7e5".to_string(), "g1f3".to_string()],
    })]);
    let (mut session, mut events) = vs_engine(Color::White, &engine);
    human_move(&mut session, Square::E2, Square::E4);

    let event = next_event(&mut events).await;
    session.handle_engine_event(event);

    let snap = session.snapshot();
    assert_eq!(snap.move_history, "1. e4 1... e5");
    assert_eq!(snap.human_color.as_deref(), Some("White"));
    let analysis = snap.analysis.expect("analysis recorded");
    // Black to move scored -30, so white is 0.3 pawns better.
    assert!((analysis.evaluation - 0.3).abs() < 1e-9);
    assert!(analysis.winning_percentage < 50.0);
    assert_eq!(analysis.suggested_moves, vec!["e7e5", "g1f3"]);
}

#[tokio::test]
async fn test_retry_drops_a_started_selection() {
    let engine = ScriptedEngine::moves(&["e2e4", "e7e5"]);
    let (mut session, mut events) = vs_engine(Color::White, &engine);
    human_move(&mut session, Square::E2, Square::E4);

    let event = next_event(&mut events).await;
    assert!(matches!(
        session.handle_engine_event(event),
        ReplyOutcome::Rejected(_)
    ));
    assert_eq!(session.click(Square::E7), ClickOutcome::Selected(Square::E7));

    assert!(session.retry_opponent());
    assert_eq!(session.selection(), SelectionState::Idle);
    let event = next_event(&mut events).await;
    assert!(matches!(
        session.handle_engine_event(event),
        ReplyOutcome::Applied { .. }
    ));
}

fn vs_engine_from(
    fen: &str,
    engine: &std::sync::Arc<ScriptedEngine>,
) -> (GameSession, game_session::EngineEvents) {
    GameSession::with_options(
        StandardRules,
        GameSettings::human_vs_opponent(Color::White),
        as_engine(engine),
        SessionOptions::with_fen(fen).unwrap(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_engine_promotion_without_letter_becomes_queen() {
    let engine = ScriptedEngine::moves(&["d2d1"]);
    let (mut session, mut events) = vs_engine_from("4k3/8/8/8/8/8/3p4/7K w - - 0 1", &engine);
    human_move(&mut session, Square::H1, Square::G2);

    let event = next_event(&mut events).await;
    assert_eq!(
        session.handle_engine_event(event),
        ReplyOutcome::Applied {
            mv: ChessMove::new(Square::D2, Square::D1).with_promotion(Role::Queen),
            san: "d1=Q".to_string()
        }
    );
    let piece = session.position().piece_at(Square::D1).unwrap();
    assert_eq!(piece.color, Color::Black);
    assert_eq!(piece.role, Role::Queen);
    assert!(!session.is_stalled());
    assert!(session.input_accepted());
}

#[tokio::test]
async fn test_engine_promotion_letter_is_kept() {
    let engine = ScriptedEngine::moves(&["e2e1n"]);
    let (mut session, mut events) = vs_engine_from("4k3/8/8/8/8/8/4p3/7K w - - 0 1", &engine);
    human_move(&mut session, Square::H1, Square::G2);

    let event = next_event(&mut events).await;
    assert_eq!(
        session.handle_engine_event(event),
        ReplyOutcome::Applied {
            mv: ChessMove::new(Square::E2, Square::E1).with_promotion(Role::Knight),
            san: "e1=N+".to_string()
        }
    );
    let piece = session.position().piece_at(Square::E1).unwrap();
    assert_eq!(piece.role, Role::Knight);
}
