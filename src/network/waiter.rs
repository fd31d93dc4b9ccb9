//! Response Waiter
//!
//! Blocks one caller until its request resolves or the reply ceiling passes.

use std::sync::Arc;

use crossbeam::channel::{Receiver, RecvTimeoutError};

use crate::engine::Engine;
use crate::protocol::{CommandResult, CorrelationTag, ResultKind, ReturnCode};

/// Handle returned by [`Client::submit`](crate::Client::submit)
///
/// Dropping the waiter, waited on or not, releases its tag.
pub struct ResponseWaiter {
    tag: CorrelationTag,
    kind: ResultKind,
    reply: Receiver<CommandResult>,
    engine: Arc<Engine>,
}

impl ResponseWaiter {
    pub(crate) fn new(
        engine: Arc<Engine>,
        tag: CorrelationTag,
        kind: ResultKind,
        reply: Receiver<CommandResult>,
    ) -> Self {
        Self {
            tag,
            kind,
            reply,
            engine,
        }
    }

    pub fn tag(&self) -> &CorrelationTag {
        &self.tag
    }

    /// Block until the result is published or the timeout ceiling passes
    ///
    /// A timeout counts toward the throttle heuristic; an answer from the
    /// server resets that count.
    pub fn wait(self) -> CommandResult {
        let ceiling = self.engine.config().response_timeout;
        match self.reply.recv_timeout(ceiling) {
            Ok(result) => self.settle(result),
            Err(RecvTimeoutError::Timeout) => {
                self.engine.forget(self.tag.as_str());
                // The reader may have published between the timeout and forget
                if let Ok(result) = self.reply.try_recv() {
                    return self.settle(result);
                }
                tracing::debug!("No reply for {} within {:?}", self.tag, ceiling);
                self.engine.record_timeout();
                CommandResult::generic(ReturnCode::RequestTimedOut)
            }
            Err(RecvTimeoutError::Disconnected) => {
                CommandResult::build(self.kind, ReturnCode::ConnectionClosed, None)
            }
        }
    }

    fn settle(&self, result: CommandResult) -> CommandResult {
        if !result.return_code().is_local() {
            self.engine.record_success();
        }
        result
    }
}

impl Drop for ResponseWaiter {
    fn drop(&mut self) {
        self.engine.forget(self.tag.as_str());
        self.engine.tags().release(&self.tag);
    }
}
