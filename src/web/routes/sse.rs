// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use axum::{
    extract::{Query, State},
    response::sse::{Event, Sse},
};
use futures::StreamExt;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::pipeline::{self, RunContext};
use crate::progress::{ChannelReporter, RunEvent};
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RunParams {
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Serialize)]
struct SseMessage {
    #[serde(rename = "type")]
    msg_type: String,
    step: Option<u8>,
    message: Option<String>,
    progress: Option<Progress>,
    error: Option<String>,
    run_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
struct Progress {
    current: usize,
    total: usize,
    symbol: String,
}

impl SseMessage {
    fn new(msg_type: &str) -> Self {
        Self {
            msg_type: msg_type.to_string(),
            step: None,
            message: None,
            progress: None,
            error: None,
            run_id: None,
        }
    }
}

/// SSE endpoint running the whole pipeline for one symbol
pub async fn run_sse(
    State(state): State<AppState>,
    Query(params): Query<RunParams>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        let run_state = state.clone();
        let symbol = params.symbol;
        // the reporter lives inside this future so the forwarder ends with the run
        let run = async move {
            let reporter = ChannelReporter::new(event_tx);
            let ctx = RunContext {
                config: run_state.config.as_ref(),
                market: run_state.market.as_ref(),
                statements: run_state.statements.as_ref(),
            };
            pipeline::run(&ctx, &symbol, &reporter).await
        };

        let forward_tx = tx.clone();
        let forward = async move {
            while let Some(event) = event_rx.recv().await {
                let _ = forward_tx.send(create_run_event(event)).await;
            }
        };

        let (result, ()) = tokio::join!(run, forward);

        match result {
            Ok(output) => {
                let message = format!("{} is ready", output.file_name);
                let id = state.store(output).await;
                let _ = tx.send(create_success_event(id, &message)).await;
            }
            Err(e) => {
                tracing::warn!("Run failed: {}", e);
                let _ = tx.send(create_error_event(&e.to_string())).await;
            }
        }
    });

    let stream = ReceiverStream::new(rx).map(Ok);
    Sse::new(stream)
}

// Helper functions to create SSE events

fn to_event(msg: SseMessage) -> Event {
    Event::default()
        .json_data(&msg)
        .unwrap_or_else(|e| Event::default().data(format!("{{\"type\":\"error\",\"error\":\"{}\"}}", e)))
}

fn create_run_event(event: RunEvent) -> Event {
    let msg = match event {
        RunEvent::Step { step, message } => SseMessage {
            step: Some(step),
            message: Some(message),
            ..SseMessage::new("step")
        },
        RunEvent::Progress {
            current,
            total,
            symbol,
        } => SseMessage {
            progress: Some(Progress {
                current,
                total,
                symbol,
            }),
            ..SseMessage::new("progress")
        },
        RunEvent::Warning { message } => SseMessage {
            message: Some(message),
            ..SseMessage::new("warning")
        },
    };
    to_event(msg)
}

fn create_success_event(id: Uuid, message: &str) -> Event {
    to_event(SseMessage {
        message: Some(message.to_string()),
        run_id: Some(id),
        ..SseMessage::new("success")
    })
}

fn create_error_event(error: &str) -> Event {
    to_event(SseMessage {
        error: Some(error.to_string()),
        ..SseMessage::new("error")
    })
}
