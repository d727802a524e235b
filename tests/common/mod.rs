//! Shared helpers: a local stand-in for the trivia provider and question fixtures.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{extract::Query, http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;
use uuid::Uuid;

use trivia_backend::domain::{Difficulty, Question};

pub const SAMPLE_BODY: &str = r#"{
  "response_code": 0,
  "results": [
    {
      "category": "Science &amp; Nature",
      "type": "multiple",
      "difficulty": "easy",
      "question": "What is the chemical symbol for &quot;gold&quot;?",
      "correct_answer": "Au",
      "incorrect_answers": ["Ag", "Gd", "G&#039;o"]
    },
    {
      "category": "General Knowledge",
      "type": "multiple",
      "difficulty": "easy",
      "question": "How many legs does a spider have?",
      "correct_answer": "8",
      "incorrect_answers": ["6", "10", "12"]
    }
  ]
}"#;

/// A running stub provider. Records the query string of every request.
pub struct StubProvider {
  pub base_url: String,
  pub queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

/// Serve `body` with `status` at `/api.php` on an ephemeral local port.
pub async fn spawn_provider(status: StatusCode, body: &'static str) -> StubProvider {
  let queries: Arc<Mutex<Vec<HashMap<String, String>>>> = Arc::default();
  let seen = queries.clone();
  let app = Router::new().route(
    "/api.php",
    get(move |Query(q): Query<HashMap<String, String>>| {
      let seen = seen.clone();
      async move {
        seen.lock().unwrap().push(q);
        (status, [("content-type", "application/json")], body)
      }
    }),
  );

  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });

  StubProvider { base_url: format!("http://{}", addr), queries }
}

/// `n` questions whose correct answer for index `i` is `"right {i}"`.
pub fn questions(n: usize) -> Vec<Question> {
  (0..n)
    .map(|i| Question {
      id: Uuid::new_v4(),
      category: "General Knowledge".into(),
      kind: "multiple".into(),
      difficulty: Difficulty::Easy,
      prompt: format!("Question {}", i),
      correct_answer: format!("right {}", i),
      incorrect_answers: vec![format!("wrong {}a", i), format!("wrong {}b", i), format!("wrong {}c", i)],
    })
    .collect()
}
