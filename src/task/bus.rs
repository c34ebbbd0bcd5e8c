// src/task/bus.rs

//! Client side of the scheduler bus.
//!
//! The scheduler is told about task lifecycle changes through a single
//! message, `stop_task`. Messages are fire-and-forget: one JSON line per TCP
//! connection, no acknowledgement is read back.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

use crate::errors::{Result, TaskvisorError};

/// Ask the scheduler to stop a task, optionally disabling or deleting it.
///
/// With both flags false this is a restart: the scheduler stops the task and
/// picks up the rebuilt executable on its next run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StopTaskRequest {
    pub task_id: i64,
    pub disable: bool,
    pub delete: bool,
}

impl StopTaskRequest {
    pub fn disable(task_id: i64) -> Self {
        Self {
            task_id,
            disable: true,
            delete: false,
        }
    }

    pub fn delete(task_id: i64) -> Self {
        Self {
            task_id,
            disable: false,
            delete: true,
        }
    }

    pub fn restart(task_id: i64) -> Self {
        Self {
            task_id,
            disable: false,
            delete: false,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BusMessage<'a> {
    StopTask(&'a StopTaskRequest),
}

pub trait BusClient: Send + Sync {
    fn stop_task<'a>(
        &'a self,
        request: StopTaskRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Sends bus messages over plain TCP.
#[derive(Debug, Clone)]
pub struct TcpBusClient {
    address: String,
    connect_timeout: Duration,
}

impl TcpBusClient {
    pub fn new(address: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            connect_timeout,
        }
    }

    async fn send_line(&self, line: String) -> Result<()> {
        let connect = TcpStream::connect(&self.address);
        let mut stream = tokio::time::timeout(self.connect_timeout, connect)
            .await
            .map_err(|_| {
                TaskvisorError::Bus(format!(
                    "connecting to {} timed out after {:?}",
                    self.address, self.connect_timeout
                ))
            })?
            .map_err(|e| TaskvisorError::Bus(format!("connecting to {}: {e}", self.address)))?;

        stream
            .write_all(line.as_bytes())
            .await
            .map_err(|e| TaskvisorError::Bus(format!("sending to {}: {e}", self.address)))?;
        stream.shutdown().await.ok();
        Ok(())
    }
}

impl BusClient for TcpBusClient {
    fn stop_task<'a>(
        &'a self,
        request: StopTaskRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let line = encode_line(&request)?;
            debug!(address = %self.address, task_id = request.task_id, "sending stop_task");
            self.send_line(line).await
        })
    }
}

fn encode_line(request: &StopTaskRequest) -> Result<String> {
    let mut line = serde_json::to_string(&BusMessage::StopTask(request))
        .map_err(|e| TaskvisorError::Bus(format!("encoding stop_task: {e}")))?;
    line.push('\n');
    Ok(line)
}
