use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use taskvisor::errors::{Result, TaskvisorError};
use taskvisor::exec::{ToolInvocation, ToolOutput, ToolRunner};

type Effect = Arc<dyn Fn(&ToolInvocation) + Send + Sync>;

/// A fake tool runner that:
/// - records every invocation
/// - fails for programs marked with [`FakeToolRunner::fail_program`]
/// - otherwise runs an optional side effect (e.g. "install" a binary into a
///   mock filesystem) and succeeds.
#[derive(Clone, Default)]
pub struct FakeToolRunner {
    invocations: Arc<Mutex<Vec<ToolInvocation>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    effect: Option<Effect>,
}

impl std::fmt::Debug for FakeToolRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeToolRunner")
            .field("invocations", &self.invocations)
            .finish_non_exhaustive()
    }
}

impl FakeToolRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_effect(mut self, effect: impl Fn(&ToolInvocation) + Send + Sync + 'static) -> Self {
        self.effect = Some(Arc::new(effect));
        self
    }

    pub fn fail_program(&self, program: &str) {
        self.failing.lock().unwrap().insert(program.to_string());
    }

    pub fn invocations(&self) -> Vec<ToolInvocation> {
        self.invocations.lock().unwrap().clone()
    }
}

impl ToolRunner for FakeToolRunner {
    fn run(
        &self,
        invocation: ToolInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput>> + Send + '_>> {
        Box::pin(async move {
            self.invocations.lock().unwrap().push(invocation.clone());
            if self.failing.lock().unwrap().contains(&invocation.program) {
                return Err(TaskvisorError::ExternalTool {
                    program: invocation.command_line(),
                    status: "exit status: 1".to_string(),
                    output: "scripted failure".to_string(),
                });
            }
            if let Some(effect) = &self.effect {
                effect(&invocation);
            }
            Ok(ToolOutput::default())
        })
    }
}
