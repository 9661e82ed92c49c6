#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use game_session::{EngineError, EngineEvent, EngineEvents, EngineReply, OpponentEngine};
use tokio::sync::Semaphore;

/// Opponent double that answers from a queue of scripted replies.
///
/// A held engine keeps every request pending until [`ScriptedEngine::release`]
/// is called once per request.
pub struct ScriptedEngine {
    replies: Mutex<VecDeque<Result<EngineReply, EngineError>>>,
    gate: Option<Arc<Semaphore>>,
    fens: Mutex<Vec<String>>,
    requests: AtomicUsize,
    disposed: AtomicBool,
}

impl ScriptedEngine {
    pub fn new(replies: Vec<Result<EngineReply, EngineError>>) -> Arc<Self> {
        Arc::new(Self::build(replies, None))
    }

    pub fn held(replies: Vec<Result<EngineReply, EngineError>>) -> Arc<Self> {
        Arc::new(Self::build(replies, Some(Arc::new(Semaphore::new(0)))))
    }

    /// Replies with the given moves, in order.
    pub fn moves(moves: &[&str]) -> Arc<Self> {
        Self::new(moves.iter().map(|m| Ok(EngineReply::bare(*m))).collect())
    }

    fn build(replies: Vec<Result<EngineReply, EngineError>>, gate: Option<Arc<Semaphore>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            gate,
            fens: Mutex::new(Vec::new()),
            requests: AtomicUsize::new(0),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn requested_fens(&self) -> Vec<String> {
        self.fens.lock().unwrap().clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl OpponentEngine for ScriptedEngine {
    fn request_best_move(&self, fen: String) -> BoxFuture<'static, Result<EngineReply, EngineError>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.fens.lock().unwrap().push(fen);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(EngineError::Unavailable("no scripted reply".into())));
        let gate = self.gate.clone();
        async move {
            if let Some(gate) = gate {
                gate.acquire().await.unwrap().forget();
            }
            reply
        }
        .boxed()
    }

    fn dispose(&self) -> BoxFuture<'static, ()> {
        self.disposed.store(true, Ordering::SeqCst);
        async {}.boxed()
    }
}

pub fn as_engine(engine: &Arc<ScriptedEngine>) -> Option<Arc<dyn OpponentEngine>> {
    let engine: Arc<dyn OpponentEngine> = engine.clone();
    Some(engine)
}

/// Next engine completion, failing the test after two seconds.
pub async fn next_event(events: &mut EngineEvents) -> EngineEvent {
    tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("engine event did not arrive")
        .expect("engine event channel closed")
}

/// Let spawned tasks run.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
