//! Console frontend.
//!
//! Reads commands line by line from any async reader, simulates the bolt
//! motor with timers, and writes notifications and replies as JSON lines.
//! Logging goes through `tracing` (stderr in the binary), so the output
//! stream stays machine-readable.

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use boltlock_core::{ActionRequest, AttributeDisposition, DeviceEvent, Notification, Response, UserLookup};
use serde_json::{Value, json};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    sync::mpsc,
    task::JoinHandle,
};

use crate::{
    console::{self, Command},
    driver::Driver,
    error::AppError,
};

/// Bound on queued console input.
const INPUT_QUEUE: usize = 64;

/// Input to the console driver, from the reader task or a motor timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    /// Event for the device.
    Event(DeviceEvent),
    /// Fail the next motion.
    Jam,
    /// A line that did not parse.
    Rejected {
        /// The line as typed
        line: String,
        /// Why it was rejected
        reason: String,
    },
    /// Stop.
    Quit,
}

/// Console driver with a simulated motor.
#[derive(Debug)]
pub struct ConsoleDriver<W> {
    input_rx: mpsc::Receiver<ConsoleInput>,
    input_tx: mpsc::Sender<ConsoleInput>,
    output: W,
    echo: VecDeque<Value>,
    motion: Duration,
    jam_next: bool,
}

impl<W: AsyncWrite + Unpin + Send> ConsoleDriver<W> {
    /// Create a driver writing to `output`, with motions taking `motion`.
    pub fn new(output: W, motion: Duration) -> Self {
        let (input_tx, input_rx) = mpsc::channel(INPUT_QUEUE);
        Self { input_rx, input_tx, output, echo: VecDeque::new(), motion, jam_next: false }
    }

    /// Sender for injecting input directly.
    pub fn input(&self) -> mpsc::Sender<ConsoleInput> {
        self.input_tx.clone()
    }

    /// Spawn a task that parses lines from `reader` into input.
    ///
    /// The task sends [`ConsoleInput::Quit`] at end of input.
    pub fn spawn_reader<R>(&self, reader: R) -> JoinHandle<()>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let tx = self.input_tx.clone();

        tokio::spawn(async move {
            let mut lines = reader.lines();
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(err) => {
                        tracing::warn!(%err, "console read failed");
                        break;
                    },
                };

                let input = match console::parse(&line) {
                    Command::Empty => continue,
                    Command::Jam => ConsoleInput::Jam,
                    Command::Quit => break,
                    Command::Unknown { input } => {
                        ConsoleInput::Rejected { line: input, reason: "unknown command".into() }
                    },
                    Command::InvalidArgs { command, error } => ConsoleInput::Rejected {
                        line: line.clone(),
                        reason: format!("{command}: {error}"),
                    },
                    command => match command.into_event() {
                        Some(event) => ConsoleInput::Event(event),
                        None => continue,
                    },
                };

                if tx.send(input).await.is_err() {
                    return;
                }
            }

            let _ = tx.send(ConsoleInput::Quit).await;
        })
    }

    /// Give back the output writer.
    pub fn into_output(self) -> W {
        self.output
    }

    async fn write_line(&mut self, value: &Value) -> Result<(), AppError> {
        let mut line = serde_json::to_vec(value)?;
        line.push(b'\n');
        self.output.write_all(&line).await?;
        self.output.flush().await?;
        Ok(())
    }
}

impl<W: AsyncWrite + Unpin + Send> Driver for ConsoleDriver<W> {
    type Error = AppError;

    async fn next_event(&mut self) -> Result<Option<DeviceEvent>, Self::Error> {
        loop {
            match self.input_rx.recv().await {
                Some(ConsoleInput::Event(event)) => return Ok(Some(event)),
                Some(ConsoleInput::Jam) => {
                    tracing::info!("next motion will fail");
                    self.jam_next = true;
                    self.echo.push_back(json!({ "jammed": true }));
                },
                Some(ConsoleInput::Rejected { line, reason }) => {
                    tracing::debug!(%line, %reason, "rejected console input");
                    self.echo.push_back(json!({ "error": reason, "input": line }));
                },
                Some(ConsoleInput::Quit) | None => return Ok(None),
            }
        }
    }

    fn drive_bolt(&mut self, request: ActionRequest) -> Result<(), Self::Error> {
        let success = !std::mem::take(&mut self.jam_next);
        let motion = self.motion;
        let tx = self.input_tx.clone();

        tracing::debug!(request = %request.id, ?motion, success, "motor running");
        tokio::spawn(async move {
            tokio::time::sleep(motion).await;
            let done = DeviceEvent::ActuatorComplete { request: request.id, success };
            let _ = tx.send(ConsoleInput::Event(done)).await;
        });
        Ok(())
    }

    async fn publish(&mut self, notification: Notification) -> Result<(), Self::Error> {
        let value = serde_json::to_value(notification)?;
        self.write_line(&value).await
    }

    async fn respond(&mut self, response: Response) -> Result<(), Self::Error> {
        self.write_line(&response_json(&response)).await
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        while let Some(value) = self.echo.pop_front() {
            self.write_line(&value).await?;
        }
        Ok(())
    }

    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

fn response_json(response: &Response) -> Value {
    match response {
        Response::Attribute { endpoint, disposition } => match disposition {
            AttributeDisposition::Forwarded(outcome) => {
                json!({ "response": "attribute", "endpoint": endpoint, "outcome": outcome })
            },
            AttributeDisposition::Ignored(reason) => {
                json!({ "response": "attribute", "endpoint": endpoint, "ignored": reason.to_string() })
            },
        },
        Response::Command { endpoint, action, response } => {
            json!({ "response": "command", "endpoint": endpoint, "action": action, "result": response })
        },
        Response::User { slot, result } => match result {
            Ok(UserLookup::Found(record)) => json!({ "response": "user", "slot": slot, "user": record }),
            Ok(UserLookup::NotFound) => json!({ "response": "user", "slot": slot, "user": null }),
            Err(err) => json!({ "response": "user", "slot": slot, "error": err.to_string() }),
        },
        Response::UserSet { slot, result } => slot_result("user_set", *slot, result.as_ref()),
        Response::UserCleared { slot, result } => slot_result("user_cleared", *slot, result.as_ref()),
        Response::State { state, in_flight } => {
            json!({ "response": "state", "state": state, "in_flight": in_flight })
        },
    }
}

fn slot_result(kind: &str, slot: u16, result: Result<&(), &boltlock_core::CredentialError>) -> Value {
    match result {
        Ok(()) => json!({ "response": kind, "slot": slot, "ok": true }),
        Err(err) => json!({ "response": kind, "slot": slot, "ok": false, "error": err.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use boltlock_core::{CommandResponse, InitiateOutcome, LockAction, RequestId, RoutingError};

    use super::*;

    #[test]
    fn command_response_json() {
        let response = Response::Command {
            endpoint: 1,
            action: LockAction::Lock,
            response: CommandResponse {
                accepted: true,
                outcome: Some(InitiateOutcome::Started(RequestId(3))),
                error: None,
            },
        };

        let value = response_json(&response);
        assert_eq!(value["response"], "command");
        assert_eq!(value["endpoint"], 1);
        assert_eq!(value["result"]["accepted"], true);
        assert_eq!(value["result"]["error"], Value::Null);
    }

    #[test]
    fn ignored_attribute_json() {
        let response = Response::Attribute {
            endpoint: 7,
            disposition: AttributeDisposition::Ignored(RoutingError::UnhandledEndpoint(7)),
        };

        let value = response_json(&response);
        assert_eq!(value["endpoint"], 7);
        assert!(value["ignored"].as_str().unwrap().contains('7'));
    }

    #[test]
    fn empty_user_json() {
        let value = response_json(&Response::User { slot: 2, result: Ok(UserLookup::NotFound) });
        assert_eq!(value["user"], Value::Null);
    }
}
