use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use taskvisor::errors::{Result, TaskvisorError};
use taskvisor::task::{BusClient, StopTaskRequest};

/// Records every request instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct FakeBus {
    sent: Arc<Mutex<Vec<StopTaskRequest>>>,
    unreachable: Arc<Mutex<bool>>,
}

impl FakeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<StopTaskRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        *self.unreachable.lock().unwrap() = unreachable;
    }
}

impl BusClient for FakeBus {
    fn stop_task<'a>(
        &'a self,
        request: StopTaskRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if *self.unreachable.lock().unwrap() {
                return Err(TaskvisorError::Bus("fake bus is unreachable".to_string()));
            }
            self.sent.lock().unwrap().push(request);
            Ok(())
        })
    }
}
