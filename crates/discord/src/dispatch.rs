use std::sync::Arc;

use animebot_core::{
    outcome_text, AuthorizationDecision, AuthorizationGate, InvocationContext, ResponseFormatter,
};
use animebot_search::QueryExecutor;
use async_trait::async_trait;
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinSet};
use tracing::{debug, info, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResponderError {
    #[error("platform rejected the reply: {0}")]
    Platform(String),
}

/// The three replies an invocation can produce on the chat platform.
#[async_trait]
pub trait InteractionResponder: Send + Sync {
    /// Immediate reply visible only to the invoking user.
    async fn deny(&self, message: &str) -> Result<(), ResponderError>;
    /// Deferred acknowledgment; must land before the platform's ack deadline.
    async fn acknowledge(&self) -> Result<(), ResponderError>;
    /// Follow-up that replaces the "thinking" indicator.
    async fn follow_up(&self, message: &str) -> Result<(), ResponderError>;
}

pub struct Invocation {
    pub context: InvocationContext,
    pub responder: Arc<dyn InteractionResponder>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DispatchState {
    Received,
    Authorizing,
    Denied,
    Acknowledged,
    Executing,
    Formatting,
    Delivered,
}

impl DispatchState {
    pub fn can_transition_to(self, next: DispatchState) -> bool {
        use DispatchState::*;

        matches!(
            (self, next),
            (Received, Authorizing)
                | (Authorizing, Denied)
                | (Authorizing, Acknowledged)
                | (Acknowledged, Executing)
                | (Executing, Formatting)
                | (Formatting, Delivered)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Denied | Self::Delivered)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("illegal dispatch transition {from:?} -> {to:?}")]
    IllegalTransition { from: DispatchState, to: DispatchState },
    #[error("denial could not be sent: {0}")]
    Deny(#[source] ResponderError),
    #[error("acknowledgment failed: {0}")]
    Acknowledge(#[source] ResponderError),
    #[error("follow-up delivery failed: {0}")]
    Deliver(#[source] ResponderError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchReport {
    pub correlation_id: String,
    pub trail: Vec<DispatchState>,
    /// Text sent as the follow-up; `None` for denied invocations.
    pub reply: Option<String>,
}

impl DispatchReport {
    pub fn final_state(&self) -> DispatchState {
        self.trail.last().copied().unwrap_or(DispatchState::Received)
    }
}

struct Trail {
    correlation_id: String,
    states: Vec<DispatchState>,
}

impl Trail {
    fn new(correlation_id: &str) -> Self {
        Self { correlation_id: correlation_id.to_owned(), states: vec![DispatchState::Received] }
    }

    fn current(&self) -> DispatchState {
        self.states.last().copied().unwrap_or(DispatchState::Received)
    }

    fn advance(&mut self, next: DispatchState) -> Result<(), DispatchError> {
        let current = self.current();
        if !current.can_transition_to(next) {
            return Err(DispatchError::IllegalTransition { from: current, to: next });
        }
        debug!(
            event_name = "dispatch.transition",
            correlation_id = %self.correlation_id,
            from = ?current,
            to = ?next,
            "dispatch state advanced"
        );
        self.states.push(next);
        Ok(())
    }

    fn finish(self, reply: Option<String>) -> DispatchReport {
        DispatchReport { correlation_id: self.correlation_id, trail: self.states, reply }
    }
}

/// Runs one `/ai` invocation from authorization through delivery.
pub struct CommandDispatcher {
    gate: AuthorizationGate,
    executor: QueryExecutor,
    formatter: ResponseFormatter,
    denial_message: String,
}

impl CommandDispatcher {
    pub fn new(
        gate: AuthorizationGate,
        executor: QueryExecutor,
        formatter: ResponseFormatter,
        denial_message: impl Into<String>,
    ) -> Self {
        Self { gate, executor, formatter, denial_message: denial_message.into() }
    }

    pub async fn dispatch(&self, invocation: Invocation) -> Result<DispatchReport, DispatchError> {
        let Invocation { context, responder } = invocation;
        let mut trail = Trail::new(&context.correlation_id);

        info!(
            event_name = "dispatch.invocation.received",
            correlation_id = %context.correlation_id,
            user_id = %context.invoking_user_id,
            scope = %context.scope_label(),
            query_chars = context.query_text.chars().count(),
            "ai command received"
        );

        trail.advance(DispatchState::Authorizing)?;
        if let AuthorizationDecision::Denied { reason } =
            self.gate.authorize(context.originating_scope_id)
        {
            trail.advance(DispatchState::Denied)?;
            info!(
                event_name = "dispatch.invocation.denied",
                correlation_id = %context.correlation_id,
                user_id = %context.invoking_user_id,
                reason = ?reason,
                "ai command denied outside the allowed server"
            );
            responder.deny(&self.denial_message).await.map_err(DispatchError::Deny)?;
            return Ok(trail.finish(None));
        }

        // Nothing slow may run before this point.
        responder.acknowledge().await.map_err(DispatchError::Acknowledge)?;
        trail.advance(DispatchState::Acknowledged)?;

        trail.advance(DispatchState::Executing)?;
        let outcome = self.executor.run(&context.query_text).await;

        trail.advance(DispatchState::Formatting)?;
        let reply = self.formatter.format(&outcome_text(outcome), context.is_direct_message());

        responder.follow_up(&reply).await.map_err(DispatchError::Deliver)?;
        trail.advance(DispatchState::Delivered)?;

        info!(
            event_name = "dispatch.invocation.delivered",
            correlation_id = %context.correlation_id,
            reply_chars = reply.chars().count(),
            "ai command answered"
        );

        Ok(trail.finish(Some(reply)))
    }

    /// Consumes invocations until every sender is dropped.
    ///
    /// Each invocation runs as its own task so a slow search never holds up
    /// the next one. Returns after the in-flight tasks have finished.
    pub async fn run(self: Arc<Self>, mut receiver: mpsc::Receiver<Invocation>) {
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                next = receiver.recv() => match next {
                    Some(invocation) => {
                        let dispatcher = Arc::clone(&self);
                        in_flight.spawn(async move {
                            dispatcher.dispatch_logged(invocation).await;
                        });
                    }
                    None => break,
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    log_join(joined);
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            log_join(joined);
        }
        info!(event_name = "dispatch.stopped", "invocation channel closed");
    }

    async fn dispatch_logged(&self, invocation: Invocation) {
        let correlation_id = invocation.context.correlation_id.clone();
        match self.dispatch(invocation).await {
            Ok(report) => debug!(
                event_name = "dispatch.invocation.finished",
                correlation_id = %correlation_id,
                final_state = ?report.final_state(),
                "invocation finished"
            ),
            Err(error) => warn!(
                event_name = "dispatch.invocation.failed",
                correlation_id = %correlation_id,
                error = %error,
                "invocation abandoned"
            ),
        }
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(error) = joined {
        warn!(event_name = "dispatch.task.panicked", error = %error, "invocation task crashed");
    }
}
