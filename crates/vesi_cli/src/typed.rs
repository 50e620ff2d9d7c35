//! Keyboard input. Runs on its own thread because the line editor blocks.

use crate::gauge;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::thread::JoinHandle;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;
use vesi_core::{InputOrigin, Utterance};
use vesi_reasoning::TurnReply;

const PROMPT: &str = "User > ";

/// Read lines until EOF, Ctrl-C or an exit word. Each line waits for its
/// own reply before the prompt comes back.
pub fn spawn_typed_input(
    tx: mpsc::Sender<Utterance>,
    mut replies: broadcast::Receiver<TurnReply>,
    verbose: bool,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("vesi-typed".into())
        .spawn(move || {
            let mut editor = match DefaultEditor::new() {
                Ok(e) => e,
                Err(e) => {
                    tracing::error!("Line editor unavailable: {}", e);
                    let _ = tx.blocking_send(Utterance::new(InputOrigin::Typed, "exit"));
                    return;
                }
            };

            loop {
                let line = match editor.readline(PROMPT) {
                    Ok(line) => line,
                    Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                        let _ = tx.blocking_send(Utterance::new(InputOrigin::Typed, "exit"));
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Input error: {}", e);
                        let _ = tx.blocking_send(Utterance::new(InputOrigin::Typed, "exit"));
                        break;
                    }
                };

                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(text);

                let utterance = Utterance::new(InputOrigin::Typed, text);
                let id = utterance.id;
                let exiting = utterance.ends_session();
                if tx.blocking_send(utterance).is_err() {
                    break;
                }
                if exiting {
                    break;
                }

                match wait_for(&mut replies, id) {
                    Some(reply) => {
                        print!("{}", gauge::render(&reply, verbose));
                        if reply.closing {
                            break;
                        }
                    }
                    None => break,
                }
            }
        })
}

fn wait_for(replies: &mut broadcast::Receiver<TurnReply>, id: Uuid) -> Option<TurnReply> {
    loop {
        match replies.blocking_recv() {
            Ok(reply) if reply.request_id == id || reply.closing => return Some(reply),
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("Console missed {} replies", n);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}
