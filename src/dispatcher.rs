//! Request lifecycle: one in-flight chat request at a time

use crate::conversation::{Conversation, Message};
use crate::error::DispatchError;
use crate::transport::ChatTransport;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, info, warn};

/// Bot reply shown in place of any failure
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Why a submission was not sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Nothing left after trimming
    Empty,
    /// A request is already in flight
    Busy,
}

/// Result of handing user input to the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Dispatched,
    Rejected(Rejection),
}

type PendingReply = oneshot::Receiver<Result<String, DispatchError>>;

/// Owns the conversation and the single in-flight request.
///
/// Loading is exactly "a reply is pending": it becomes true on a dispatched
/// submit and false when that request settles, whatever the outcome.
pub struct Dispatcher {
    transport: Arc<dyn ChatTransport>,
    conversation: Conversation,
    pending: Option<PendingReply>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            conversation: Conversation::new(),
            pending: None,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Append the trimmed input as a user message and start the request.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self, input: &str) -> SubmitOutcome {
        let text = input.trim();
        if text.is_empty() {
            return SubmitOutcome::Rejected(Rejection::Empty);
        }
        if self.is_loading() {
            debug!("submission ignored while a request is in flight");
            return SubmitOutcome::Rejected(Rejection::Busy);
        }

        self.conversation.append(Message::user(text));

        debug!(chars = text.chars().count(), "dispatching chat request");

        let (tx, rx) = oneshot::channel();
        let transport = Arc::clone(&self.transport);
        let text = text.to_string();
        tokio::spawn(async move {
            let result = transport.send(&text).await;
            let _ = tx.send(result);
        });

        self.pending = Some(rx);
        SubmitOutcome::Dispatched
    }

    /// Settle the in-flight request if it has finished. Returns true when a
    /// reply was appended.
    pub fn poll_reply(&mut self) -> bool {
        let Some(rx) = self.pending.as_mut() else {
            return false;
        };

        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Closed) => Err(DispatchError::Dropped),
        };

        self.settle(result);
        true
    }

    /// Wait for the in-flight request, if any, and settle it
    pub async fn wait_reply(&mut self) -> bool {
        let Some(rx) = self.pending.as_mut() else {
            return false;
        };

        let result = rx.await.unwrap_or(Err(DispatchError::Dropped));
        self.settle(result);
        true
    }

    /// Submit and wait for the reply
    pub async fn send(&mut self, input: &str) -> SubmitOutcome {
        let outcome = self.submit(input);
        if outcome == SubmitOutcome::Dispatched {
            self.wait_reply().await;
        }
        outcome
    }

    fn settle(&mut self, result: Result<String, DispatchError>) {
        self.pending = None;

        match result {
            Ok(reply) => {
                info!(chars = reply.chars().count(), "chat reply received");
                self.conversation.append(Message::bot(reply));
            }
            Err(error) => {
                warn!(%error, "chat request failed");
                self.conversation.append(Message::bot(FALLBACK_REPLY));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use futures::future::BoxFuture;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Replays canned results, optionally holding each request until released
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<String, DispatchError>>>,
        sent: Mutex<Vec<String>>,
        calls: AtomicUsize,
        gate: Option<Notify>,
    }

    impl ScriptedTransport {
        fn replying(replies: Vec<Result<String, DispatchError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                ..Default::default()
            })
        }

        fn gated(replies: Vec<Result<String, DispatchError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                gate: Some(Notify::new()),
                ..Default::default()
            })
        }

        fn release(&self) {
            if let Some(gate) = &self.gate {
                gate.notify_one();
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ChatTransport for ScriptedTransport {
        fn send<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<String, DispatchError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.sent.lock().unwrap().push(text.to_string());
                if let Some(gate) = &self.gate {
                    gate.notified().await;
                }
                self.replies
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or(Err(DispatchError::MissingResponse))
            })
        }
    }

    struct PanickingTransport;

    impl ChatTransport for PanickingTransport {
        fn send<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<String, DispatchError>> {
            Box::pin(futures::future::lazy(|_| -> Result<String, DispatchError> {
                panic!("transport blew up")
            }))
        }
    }

    #[tokio::test]
    async fn successful_reply_appends_user_then_bot() {
        let transport = ScriptedTransport::replying(vec![Ok("Hi there".to_string())]);
        let mut dispatcher = Dispatcher::new(transport.clone());

        let outcome = dispatcher.send("Hello").await;

        assert_eq!(outcome, SubmitOutcome::Dispatched);
        assert_eq!(
            dispatcher.conversation().all(),
            &[Message::user("Hello"), Message::bot("Hi there")]
        );
        assert!(!dispatcher.is_loading());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn input_is_trimmed_before_sending() {
        let transport = ScriptedTransport::replying(vec![Ok("ok".to_string())]);
        let mut dispatcher = Dispatcher::new(transport.clone());

        dispatcher.send("   Hello \n").await;

        assert_eq!(dispatcher.conversation().all()[0], Message::user("Hello"));
        assert_eq!(*transport.sent.lock().unwrap(), vec!["Hello".to_string()]);
    }

    #[tokio::test]
    async fn blank_input_is_rejected_without_request() {
        let transport = ScriptedTransport::replying(vec![]);
        let mut dispatcher = Dispatcher::new(transport.clone());

        for input in ["", "   ", "\t\n"] {
            assert_eq!(
                dispatcher.send(input).await,
                SubmitOutcome::Rejected(Rejection::Empty)
            );
        }

        assert!(dispatcher.conversation().is_empty());
        assert!(!dispatcher.is_loading());
        tokio::task::yield_now().await;
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn every_failure_becomes_the_fallback_reply() {
        let failures = vec![
            Err(DispatchError::Remote("x".to_string())),
            Err(DispatchError::Status(500)),
            Err(DispatchError::MissingResponse),
            Err(DispatchError::MalformedBody(
                serde_json::from_str::<serde_json::Value>("not json").unwrap_err(),
            )),
        ];
        let count = failures.len();
        let transport = ScriptedTransport::replying(failures);
        let mut dispatcher = Dispatcher::new(transport);

        for _ in 0..count {
            dispatcher.send("Hello").await;
        }

        let messages = dispatcher.conversation().all();
        assert_eq!(messages.len(), count * 2);
        for pair in messages.chunks(2) {
            assert_eq!(pair[0], Message::user("Hello"));
            assert_eq!(pair[1], Message::bot(FALLBACK_REPLY));
        }
        assert!(!dispatcher.is_loading());
    }

    #[tokio::test]
    async fn loading_spans_exactly_the_request() {
        let transport = ScriptedTransport::gated(vec![Ok("done".to_string())]);
        let mut dispatcher = Dispatcher::new(transport.clone());
        assert!(!dispatcher.is_loading());

        assert_eq!(dispatcher.submit("Hello"), SubmitOutcome::Dispatched);
        assert!(dispatcher.is_loading());

        for _ in 0..5 {
            tokio::task::yield_now().await;
            assert!(!dispatcher.poll_reply());
            assert!(dispatcher.is_loading());
        }

        transport.release();
        assert!(dispatcher.wait_reply().await);
        assert!(!dispatcher.is_loading());
        assert_eq!(dispatcher.conversation().last(), Some(&Message::bot("done")));
    }

    #[tokio::test]
    async fn second_submission_while_loading_has_no_effect() {
        let transport = ScriptedTransport::gated(vec![Ok("first".to_string()), Ok("second".to_string())]);
        let mut dispatcher = Dispatcher::new(transport.clone());

        assert_eq!(dispatcher.submit("one"), SubmitOutcome::Dispatched);
        tokio::task::yield_now().await;
        assert_eq!(
            dispatcher.submit("two"),
            SubmitOutcome::Rejected(Rejection::Busy)
        );
        assert_eq!(dispatcher.conversation().len(), 1);

        transport.release();
        dispatcher.wait_reply().await;

        assert_eq!(transport.calls(), 1);
        assert_eq!(
            dispatcher.conversation().all(),
            &[Message::user("one"), Message::bot("first")]
        );
    }

    #[tokio::test]
    async fn poll_reply_settles_once_finished() {
        let transport = ScriptedTransport::replying(vec![Ok("polled".to_string())]);
        let mut dispatcher = Dispatcher::new(transport);

        dispatcher.submit("Hello");
        let mut settled = false;
        for _ in 0..100 {
            tokio::task::yield_now().await;
            if dispatcher.poll_reply() {
                settled = true;
                break;
            }
        }

        assert!(settled);
        assert!(!dispatcher.is_loading());
        assert!(!dispatcher.poll_reply());
        assert_eq!(dispatcher.conversation().last().map(|m| m.role), Some(Role::Bot));
    }

    #[tokio::test]
    async fn dead_request_task_still_releases_loading() {
        let mut dispatcher = Dispatcher::new(Arc::new(PanickingTransport));

        dispatcher.send("Hello").await;

        assert!(!dispatcher.is_loading());
        assert_eq!(
            dispatcher.conversation().all(),
            &[Message::user("Hello"), Message::bot(FALLBACK_REPLY)]
        );
    }

    #[tokio::test]
    async fn wait_without_pending_request_is_a_no_op() {
        let mut dispatcher = Dispatcher::new(ScriptedTransport::replying(vec![]));
        assert!(!dispatcher.wait_reply().await);
        assert!(!dispatcher.poll_reply());
        assert!(dispatcher.conversation().is_empty());
    }
}
