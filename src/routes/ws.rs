//! WebSocket upgrade + message loop. The server pushes a snapshot on connect and
//! after every state change; client messages are parsed as JSON and forwarded to
//! the quiz manager. Replies that are not snapshots go out one per request.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::session::Transition;
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "trivia_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn send(socket: &mut WebSocket, msg: &ServerWsMessage) -> Result<(), axum::Error> {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  socket.send(Message::Text(out)).await
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "trivia_backend", "WebSocket connected");
  let mut updates = state.manager.read().await.subscribe();

  let first = ServerWsMessage::Snapshot { snapshot: Box::new(updates.borrow_and_update().clone()) };
  if let Err(e) = send(&mut socket, &first).await {
    error!(target: "trivia_backend", error = %e, "WS send error");
    return;
  }

  loop {
    tokio::select! {
      changed = updates.changed() => {
        if changed.is_err() {
          break;
        }
        let snapshot = Box::new(updates.borrow_and_update().clone());
        if let Err(e) = send(&mut socket, &ServerWsMessage::Snapshot { snapshot }).await {
          error!(target: "trivia_backend", error = %e, "WS send error");
          break;
        }
      }
      incoming = socket.recv() => {
        let Some(Ok(msg)) = incoming else { break };
        match msg {
          Message::Text(txt) => {
            let reply = match serde_json::from_str::<ClientWsMessage>(&txt) {
              Ok(incoming) => {
                debug!(target: "trivia_backend", "WS received: {:?}", &incoming);
                handle_client_ws(incoming, &state).await
              }
              Err(e) => Some(ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }),
            };
            if let Some(reply) = reply {
              if let Err(e) = send(&mut socket, &reply).await {
                error!(target: "trivia_backend", error = %e, "WS send error");
                break;
              }
            }
          }
          Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
          Message::Close(_) => break,
          _ => {}
        }
      }
    }
  }
  info!(target: "trivia_backend", "WebSocket disconnected");
}

fn ignored(op: &'static str, t: Transition) -> Option<ServerWsMessage> {
  match t {
    Transition::Applied => None,
    Transition::Ignored(reason) => Some(ServerWsMessage::Ignored { op, reason }),
  }
}

/// Applied transitions answer through the snapshot push, so they return `None` here.
pub(crate) async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> Option<ServerWsMessage> {
  match msg {
    ClientWsMessage::Ping => Some(ServerWsMessage::Pong),

    ClientWsMessage::Load(load) => {
      let query = load.resolve(state.default_query);
      match state.load_questions(query).await {
        Ok(()) => None,
        Err(e) => Some(ServerWsMessage::Error { message: e.to_string() }),
      }
    }

    ClientWsMessage::Select { answer } => ignored("select", state.manager.write().await.select(answer)),

    ClientWsMessage::Confirm { record } => {
      let mut m = state.manager.write().await;
      let t = m.confirm();
      if t.applied() && record {
        m.record_current_answer();
      }
      ignored("confirm", t)
    }

    ClientWsMessage::Advance => ignored("advance", state.manager.write().await.advance()),

    ClientWsMessage::RecordAnswer => {
      ignored("record_answer", state.manager.write().await.record_current_answer())
    }

    ClientWsMessage::Choices => Some(ServerWsMessage::Choices {
      choices: state.manager.read().await.shuffled_choices(),
    }),

    ClientWsMessage::Save => match state.manager.write().await.save_result() {
      Some(result) => Some(ServerWsMessage::Saved { result }),
      None => Some(ServerWsMessage::Error { message: "No quiz run to save".into() }),
    },

    ClientWsMessage::DeleteHistory { id } => {
      let deleted = state.manager.write().await.delete_history_entry(id);
      Some(ServerWsMessage::Deleted { id, deleted })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::AppConfig;
  use crate::domain::{Difficulty, Question};
  use crate::session::Misuse;
  use crate::storage::MemoryStore;
  use uuid::Uuid;

  fn state() -> AppState {
    AppState::with_storage(&AppConfig::default(), Arc::new(MemoryStore::new())).unwrap()
  }

  fn questions(n: usize) -> Vec<Question> {
    (0..n)
      .map(|i| Question {
        id: Uuid::new_v4(),
        category: "History".into(),
        kind: "multiple".into(),
        difficulty: Difficulty::Easy,
        prompt: format!("Q{}", i),
        correct_answer: format!("right {}", i),
        incorrect_answers: vec!["a".into(), "b".into(), "c".into()],
      })
      .collect()
  }

  #[tokio::test]
  async fn ping_gets_pong() {
    let state = state();
    assert!(matches!(handle_client_ws(ClientWsMessage::Ping, &state).await, Some(ServerWsMessage::Pong)));
  }

  #[tokio::test]
  async fn misuse_replies_ignored_without_push() {
    let state = state();
    state.manager.write().await.load(questions(2));
    let rx = state.manager.read().await.subscribe();

    let reply = handle_client_ws(ClientWsMessage::Advance, &state).await;
    assert!(matches!(
      reply,
      Some(ServerWsMessage::Ignored { op: "advance", reason: Misuse::NotConfirmed })
    ));
    assert!(!rx.has_changed().unwrap());

    let reply = handle_client_ws(ClientWsMessage::Confirm { record: true }, &state).await;
    assert!(reply.is_none());
    assert!(rx.has_changed().unwrap());

    let reply = handle_client_ws(ClientWsMessage::Select { answer: "a".into() }, &state).await;
    assert!(matches!(
      reply,
      Some(ServerWsMessage::Ignored { op: "select", reason: Misuse::AlreadyConfirmed })
    ));
  }

  #[tokio::test]
  async fn applied_transitions_push_snapshots() {
    let state = state();
    state.manager.write().await.load(questions(1));
    let mut rx = state.manager.read().await.subscribe();

    assert!(handle_client_ws(ClientWsMessage::Select { answer: "right 0".into() }, &state).await.is_none());
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().selected_answer.as_deref(), Some("right 0"));

    assert!(handle_client_ws(ClientWsMessage::Confirm { record: false }, &state).await.is_none());
    let snap = rx.borrow_and_update().clone();
    assert_eq!(snap.score, 1);
    assert_eq!(snap.recorded_answers, vec![None]);

    assert!(handle_client_ws(ClientWsMessage::RecordAnswer, &state).await.is_none());
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().recorded_answers, vec![Some("right 0".to_string())]);

    assert!(handle_client_ws(ClientWsMessage::Advance, &state).await.is_none());
    assert!(rx.borrow_and_update().finished);
  }

  #[tokio::test]
  async fn choices_include_correct_answer() {
    let state = state();
    state.manager.write().await.load(questions(1));
    match handle_client_ws(ClientWsMessage::Choices, &state).await {
      Some(ServerWsMessage::Choices { choices }) => {
        assert_eq!(choices.len(), 4);
        assert!(choices.contains(&"right 0".to_string()));
      }
      other => panic!("unexpected reply: {:?}", other),
    }
  }

  #[tokio::test]
  async fn save_without_run_is_error() {
    let state = state();
    let rx = state.manager.read().await.subscribe();
    let reply = handle_client_ws(ClientWsMessage::Save, &state).await;
    assert!(matches!(reply, Some(ServerWsMessage::Error { .. })));
    assert!(!rx.has_changed().unwrap());
  }

  #[tokio::test]
  async fn save_then_delete_history_entry() {
    let state = state();
    state.manager.write().await.load(questions(1));
    handle_client_ws(ClientWsMessage::Select { answer: "right 0".into() }, &state).await;
    handle_client_ws(ClientWsMessage::Confirm { record: true }, &state).await;

    let id = match handle_client_ws(ClientWsMessage::Save, &state).await {
      Some(ServerWsMessage::Saved { result }) => {
        assert_eq!(result.score, 1);
        assert_eq!(result.attempt_number, 1);
        result.id
      }
      other => panic!("unexpected reply: {:?}", other),
    };

    match handle_client_ws(ClientWsMessage::DeleteHistory { id }, &state).await {
      Some(ServerWsMessage::Deleted { id: got, deleted }) => {
        assert_eq!(got, id);
        assert!(deleted);
      }
      other => panic!("unexpected reply: {:?}", other),
    }
    assert!(state.manager.read().await.history().is_empty());

    let reply = handle_client_ws(ClientWsMessage::DeleteHistory { id }, &state).await;
    assert!(matches!(reply, Some(ServerWsMessage::Deleted { deleted: false, .. })));
  }

  #[tokio::test]
  async fn failed_load_replies_error() {
    let mut cfg = AppConfig::default();
    cfg.trivia.base_url = "http://127.0.0.1:9".into();
    let state = AppState::with_storage(&cfg, Arc::new(MemoryStore::new())).unwrap();
    let reply = handle_client_ws(ClientWsMessage::Load(Default::default()), &state).await;
    assert!(matches!(reply, Some(ServerWsMessage::Error { .. })));
    assert!(matches!(
      state.manager.read().await.snapshot().load_status,
      crate::manager::LoadStatus::Failed { .. }
    ));
  }
}
