//! Terminal chess against Stockfish (or a second human).
//!
//! Reads one command per line from stdin; the board goes to stdout, logs to
//! stderr.

use std::sync::Arc;

use chess_core::pgn::{export_pgn, result_token};
use chess_core::{color_name, Color, StandardRules, STARTING_FEN};
use game_session::{
    ClickOutcome, GameSession, OpponentEngine, PromotionOutcome, ReplyOutcome, SessionOptions,
};
use opponent::board::render_board;
use opponent::commands::{Command, HELP};
use opponent::{OpponentConfig, StockfishOpponent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let config = OpponentConfig::load()?.with_args(std::env::args().skip(1))?;
    let settings = config.settings()?;

    let engine: Option<Arc<dyn OpponentEngine>> = if settings.is_vs_opponent() {
        info!(stockfish_path = %config.stockfish_path, "Starting Stockfish");
        Some(Arc::new(StockfishOpponent::spawn(&config).await?))
    } else {
        None
    };

    let options = SessionOptions::default().request_timeout(config.request_timeout);
    let (mut session, mut events) =
        GameSession::with_options(StandardRules, settings, engine.clone(), options)?;

    println!("{}", HELP);
    show(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => run(&mut session, command),
                    Err(e) => println!("{e} (type 'help')"),
                }
            }
            Some(event) = events.recv() => {
                match session.handle_engine_event(event) {
                    ReplyOutcome::Applied { san, .. } => println!("Engine plays {san}"),
                    ReplyOutcome::Stale => continue,
                    other => {
                        warn!(outcome = ?other, "Engine reply dropped");
                        println!("The engine did not move ({other:?}). Make its move yourself or type 'retry'.");
                    }
                }
                show(&session);
            }
        }
    }

    session.shutdown();
    if let Some(engine) = engine {
        engine.dispose().await;
    }
    info!("Bye");
    Ok(())
}

fn run(session: &mut GameSession, command: Command) {
    match command {
        Command::Click(square) => match session.click(square) {
            ClickOutcome::Rejected(reason) => println!("Not now: {reason}"),
            ClickOutcome::PromotionPending { .. } => {
                println!("Promote to? (promote q|r|b|n, or cancel)")
            }
            ClickOutcome::Committed { san, .. } => {
                println!("You play {san}");
                show(session);
            }
            ClickOutcome::Ignored => {}
            ClickOutcome::Selected(_) | ClickOutcome::Deselected => show(session),
        },
        Command::Promote(role) => {
            let outcome = session.choose_promotion(Some(role));
            report_promotion(session, outcome);
        }
        Command::Cancel => {
            let outcome = session.choose_promotion(None);
            report_promotion(session, outcome);
        }
        Command::Reset => {
            session.reset();
            show(session);
        }
        Command::Retry => {
            if !session.retry_opponent() {
                println!("Nothing to retry");
            }
            show(session);
        }
        Command::Status => println!("{}", status_line(session)),
        Command::Snapshot => match session.snapshot().to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => warn!(error = %e, "Snapshot serialization failed"),
        },
        Command::Pgn => println!("{}", pgn(session)),
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

fn report_promotion(session: &GameSession, outcome: PromotionOutcome) {
    match outcome {
        PromotionOutcome::Committed { san, .. } => println!("You play {san}"),
        PromotionOutcome::Rejected(mv) => println!("Promotion {mv} is not legal"),
        PromotionOutcome::Cancelled => println!("Promotion cancelled"),
        PromotionOutcome::NotPending => {
            println!("No promotion pending");
            return;
        }
    }
    show(session);
}

fn show(session: &GameSession) {
    print!("\n{}", render_board(session.position(), session.highlights()));
    println!("{}", status_line(session));
}

fn status_line(session: &GameSession) -> String {
    let mut line = format!(
        "{} | {} to move | {}",
        session.settings().mode_label(),
        color_name(session.position().side_to_move()),
        session.status().label()
    );
    if session.is_thinking() {
        line.push_str(" | engine thinking...");
    } else if session.is_stalled() {
        line.push_str(" | engine stalled");
    }
    line
}

fn pgn(session: &GameSession) -> String {
    let (white, black) = match session.settings().human_side() {
        Some(Color::White) => ("Human", "Stockfish"),
        Some(_) => ("Stockfish", "Human"),
        None => ("Human", "Human"),
    };
    let mut tags = vec![
        ("Event", "Casual game".to_string()),
        ("Date", chrono::Utc::now().format("%Y.%m.%d").to_string()),
        ("White", white.to_string()),
        ("Black", black.to_string()),
    ];
    let initial = session.initial_position().fen();
    if initial != STARTING_FEN {
        tags.push(("SetUp", "1".to_string()));
        tags.push(("FEN", initial.to_string()));
    }
    let result = result_token(session.status(), session.position().side_to_move());
    export_pgn(&tags, &session.san_moves(), result)
}
