//! WebSocket upgrade + message loop. Each connection drives at most one quiz
//! session; closing the socket discards it without persisting anything.
//! We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use crate::error::SessionError;
use crate::logic::open_session;
use crate::protocol::{question_out, topic_out, ClientWsMessage, ServerWsMessage};
use crate::session::{Advance, Phase, Session};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "retention_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "retention_backend", "WebSocket connected");
  let mut session: Option<Session> = None;
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "retention_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state, &mut session).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "retention_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  if session.as_ref().is_some_and(|s| s.result().is_none()) {
    info!(target: "quiz", "Unfinished session discarded on disconnect");
  }
  info!(target: "retention_backend", "WebSocket disconnected");
}

#[instrument(level = "info", skip(state, session))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState, session: &mut Option<Session>) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::Open { topic_id } => match open_session(state, &topic_id).await {
      Ok(Some(s)) => {
        let reply = review_message(&s);
        *session = Some(s);
        reply
      }
      Ok(None) => ServerWsMessage::Error { message: format!("Unknown topicId: {}", topic_id) },
      Err(e) => {
        error!(target: "topic_store", error = %e, "WS open failed");
        ServerWsMessage::Error { message: e.to_string() }
      }
    },

    ClientWsMessage::Abandon => {
      if session.take().is_some() {
        info!(target: "quiz", "Session abandoned");
      }
      ServerWsMessage::Abandoned
    }

    other => {
      let Some(s) = session.as_mut() else {
        return ServerWsMessage::Error { message: "No open session; send `open` first.".into() };
      };
      match drive_session(other, state, s).await {
        Ok(reply) => reply,
        Err(e) => {
          if e.is_user_facing() {
            warn!(target: "quiz", error = %e, "WS session action refused");
          } else {
            error!(target: "quiz", error = %e, "WS session action failed");
          }
          ServerWsMessage::Error { message: e.to_string() }
        }
      }
    }
  }
}

async fn drive_session(msg: ClientWsMessage, state: &AppState, s: &mut Session) -> Result<ServerWsMessage, SessionError> {
  match msg {
    ClientWsMessage::Focus { concept_id } => {
      s.focus(concept_id.as_deref())?;
      Ok(review_message(s))
    }
    ClientWsMessage::Start => {
      s.start()?;
      current_question_message(s)
    }
    ClientWsMessage::Reveal => Ok(ServerWsMessage::Card { reference: s.reveal()?.to_string() }),
    ClientWsMessage::Answer { answer } => {
      let feedback = s.answer(&answer)?;
      info!(target: "quiz", question_id = %feedback.question_id, correct = feedback.correct, "WS answer evaluated");
      Ok(ServerWsMessage::Feedback { feedback })
    }
    ClientWsMessage::Advance => {
      let step = {
        let store = state.store.write().await;
        s.advance(&store)?
      };
      match step {
        Advance::Next { .. } => current_question_message(s),
        Advance::Finished(result) => Ok(ServerWsMessage::Result {
          result,
          topic: topic_out(s.topic().clone(), Utc::now()),
          tally: s.tally(),
        }),
      }
    }
    // Handled by the caller before a session is required.
    ClientWsMessage::Ping | ClientWsMessage::Open { .. } | ClientWsMessage::Abandon => {
      Err(SessionError::WrongPhase { expected: "any", actual: s.phase().name() })
    }
  }
}

fn review_message(s: &Session) -> ServerWsMessage {
  let focus_concept_id = match s.phase() {
    Phase::Review { focus, .. } => focus.clone(),
    _ => None,
  };
  ServerWsMessage::Review {
    topic: topic_out(s.topic().clone(), Utc::now()),
    question_count: s.questions().len(),
    focus_concept_id,
  }
}

/// Out-of-range indexes surface as an error message rather than a crash.
fn current_question_message(s: &Session) -> Result<ServerWsMessage, SessionError> {
  let q = s.current().ok_or(SessionError::NoCurrentQuestion)?;
  let progress = s.progress().ok_or(SessionError::NoCurrentQuestion)?;
  Ok(ServerWsMessage::Question {
    question: question_out(q),
    progress,
    answered: s.recorded_answer(&q.id).map(str::to_string),
  })
}
