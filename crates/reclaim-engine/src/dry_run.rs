use tracing::info;

use crate::command::{CommandOutput, Effect, Invocation, SystemCommand};
use crate::error::ExecutionError;

#[derive(Debug)]
pub struct DryRunExecutor<E> {
    inner: E,
    planned: Vec<Invocation>,
}

impl<E> DryRunExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            planned: Vec::new(),
        }
    }

    pub fn into_planned(self) -> Vec<Invocation> {
        self.planned
    }
}

impl<E> SystemCommand for DryRunExecutor<E>
where
    E: SystemCommand,
{
    fn run(&mut self, invocation: &Invocation) -> Result<CommandOutput, ExecutionError> {
        match invocation.effect {
            Effect::Query => self.inner.run(invocation),
            Effect::Mutation => {
                info!(command = %invocation, "dry run: would run");
                self.planned.push(invocation.clone());
                Ok(CommandOutput::default())
            }
        }
    }
}
