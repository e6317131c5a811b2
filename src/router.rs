//! Authorization gate and command dispatch.
//!
//! Every inbound message ends in exactly one reply; no failure inside a
//! handler escapes [`Router::handle`].

use std::any::Any;
use std::collections::HashSet;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::commands::{Action, CommandRegistry, Services};
use crate::error::{failure_reply, CommandError};
use crate::executor::Runner;
use crate::platform::{IncomingMessage, ReplySender};
use crate::reply::Reply;

pub const MISSING_COMMAND: &str = "Where's a command?";

pub struct Router {
    authorized: HashSet<u64>,
    registry: CommandRegistry,
    services: Services,
    runner: Arc<dyn Runner>,
}

impl Router {
    pub fn new(
        authorized: impl IntoIterator<Item = u64>,
        registry: CommandRegistry,
        services: Services,
        runner: Arc<dyn Runner>,
    ) -> Self {
        Self {
            authorized: authorized.into_iter().collect(),
            registry,
            services,
            runner,
        }
    }

    pub fn is_authorized(&self, sender_id: u64) -> bool {
        self.authorized.contains(&sender_id)
    }

    /// Handles one message and delivers its reply through `sender`.
    pub async fn serve(&self, msg: &IncomingMessage, sender: &dyn ReplySender) {
        let reply = self.handle(msg).await;
        if let Err(e) = sender.send(msg.chat_id, reply).await {
            error!("Failed to send reply to chat {}: {:#}", msg.chat_id, e);
        }
    }

    /// Produces the reply for a message. Unauthorized senders are answered
    /// before the text is even looked at.
    pub async fn handle(&self, msg: &IncomingMessage) -> Reply {
        if !self.is_authorized(msg.sender_id) {
            warn!("Rejected message from unauthorized user {}", msg.sender_id);
            return Reply::plain(format!("Not authorized {}", msg.sender_id));
        }

        let tokens: Vec<&str> = msg.text.split_whitespace().collect();
        let Some((keyword, args)) = tokens.split_first() else {
            return Reply::plain(MISSING_COMMAND);
        };

        let command = self.registry.resolve(keyword);
        info!(
            "User {} issued {:?} with {} argument(s)",
            msg.sender_id,
            command,
            args.len()
        );

        let reply = guarded(async {
            match command.plan(args, &self.services)? {
                Action::Reply(reply) => Ok(reply),
                Action::Execute(cmd) => {
                    let result = self.runner.run(&cmd).await?;
                    Ok(Reply::plain(result.to_string()))
                }
            }
        })
        .await;

        reply.normalized()
    }
}

/// Runs a handler future, turning both typed errors and panics into replies.
pub async fn guarded<F>(fut: F) -> Reply
where
    F: Future<Output = Result<Reply, CommandError>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(reply)) => reply,
        Ok(Err(err)) => {
            debug!("Command failed: {}", err);
            err.into_reply()
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!("Command handler panicked: {}", message);
            failure_reply(message)
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
