//! Deep-dive dialogue: a focused conversation about one transcript excerpt.
//!
//! A [`DialogueSession`] is either open (waiting for the user) or awaiting a
//! reply. Sending a message appends the user turn and an empty assistant turn,
//! then fills the assistant turn with streamed increments in arrival order.
//! Saving the session turns it into a deep-dive note; discarding it drops it.

use crate::notes::DEEP_DIVE_SAVED;
use crate::services::{ChatSummarizer, DeepDiveChat};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// Text of an assistant turn whose reply could not be delivered.
pub const REPLY_FAILED: &str =
    "Sorry, I lost the connection while answering. Please try sending your message again.";

/// Who spoke a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Identifier of a turn within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(u64);

/// One message in a deep dive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueTurn {
    pub id: TurnId,
    pub role: Role,
    pub text: String,
}

/// Where the session is in its send/reply cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueState {
    /// Ready for the next user message.
    Open,
    /// A reply is being streamed into the last turn.
    AwaitingResponse,
}

/// Why a message was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejected {
    /// The message was empty or whitespace.
    Blank,
    /// A reply is still in flight.
    Busy,
    /// No deep dive is open.
    Closed,
}

impl fmt::Display for SendRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendRejected::Blank => write!(f, "message is empty"),
            SendRejected::Busy => write!(f, "still waiting for the previous reply"),
            SendRejected::Closed => write!(f, "no deep dive is open"),
        }
    }
}

/// How a reply finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyEnd {
    Completed,
    Failed,
}

/// Everything the chat service needs to answer one user message.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub anchor_text: String,
    /// Completed turns before the new user message, oldest first.
    pub history: Vec<DialogueTurn>,
    pub user_message: String,
    /// The placeholder turn the reply streams into.
    pub reply_id: TurnId,
}

/// A deep-dive conversation anchored to one excerpt.
#[derive(Debug, Clone)]
pub struct DialogueSession {
    anchor_text: String,
    turns: Vec<DialogueTurn>,
    next_turn: u64,
    in_flight: Option<TurnId>,
}

impl DialogueSession {
    /// Open a session seeded with the assistant's greeting.
    pub fn open(anchor_text: &str, greeting: String) -> Self {
        let mut session = Self {
            anchor_text: anchor_text.to_string(),
            turns: Vec::new(),
            next_turn: 0,
            in_flight: None,
        };
        session.push_turn(Role::Assistant, greeting);
        session
    }

    pub fn anchor_text(&self) -> &str {
        &self.anchor_text
    }

    /// All turns in order, including a reply still being streamed.
    pub fn turns(&self) -> &[DialogueTurn] {
        &self.turns
    }

    pub fn state(&self) -> DialogueState {
        if self.in_flight.is_some() {
            DialogueState::AwaitingResponse
        } else {
            DialogueState::Open
        }
    }

    /// Turns that are finished, leaving out an in-flight reply.
    pub fn completed_turns(&self) -> Vec<DialogueTurn> {
        self.turns
            .iter()
            .filter(|t| Some(t.id) != self.in_flight)
            .cloned()
            .collect()
    }

    /// Append the user's message and an empty reply placeholder.
    ///
    /// Rejected without touching the turns if `text` is blank or a reply is
    /// already in flight.
    pub fn begin_send(&mut self, text: &str) -> Result<Exchange, SendRejected> {
        if text.trim().is_empty() {
            return Err(SendRejected::Blank);
        }
        if self.in_flight.is_some() {
            return Err(SendRejected::Busy);
        }

        let history = self.turns.clone();
        self.push_turn(Role::User, text.to_string());
        let reply_id = self.push_turn(Role::Assistant, String::new());
        self.in_flight = Some(reply_id);

        Ok(Exchange {
            anchor_text: self.anchor_text.clone(),
            history,
            user_message: text.to_string(),
            reply_id,
        })
    }

    /// Append a streamed increment to the in-flight reply.
    ///
    /// Returns false if `reply` is not the reply currently being streamed.
    pub fn push_chunk(&mut self, reply: TurnId, chunk: &str) -> bool {
        if self.in_flight != Some(reply) {
            return false;
        }
        match self.turns.iter_mut().find(|t| t.id == reply) {
            Some(turn) => {
                turn.text.push_str(chunk);
                true
            }
            None => false,
        }
    }

    /// Freeze the in-flight reply and reopen the session.
    ///
    /// A failed reply, or one that finished without any text, is replaced by
    /// [`REPLY_FAILED`].
    pub fn finish_reply(&mut self, reply: TurnId, end: ReplyEnd) -> ReplyEnd {
        if self.in_flight != Some(reply) {
            return end;
        }
        self.in_flight = None;

        let Some(turn) = self.turns.iter_mut().find(|t| t.id == reply) else {
            return end;
        };

        if end == ReplyEnd::Failed || turn.text.trim().is_empty() {
            turn.text = REPLY_FAILED.to_string();
            ReplyEnd::Failed
        } else {
            ReplyEnd::Completed
        }
    }

    /// Send a message and stream the reply into the session.
    pub async fn send_message(
        &mut self,
        chat: &dyn DeepDiveChat,
        text: &str,
    ) -> Result<ReplyEnd, SendRejected> {
        self.send_message_observed(chat, text, |_| {}).await
    }

    /// Like [`send_message`](Self::send_message), calling `observe` with each
    /// increment after it has been applied.
    #[instrument(skip(self, chat, text, observe), fields(turns = self.turns.len()))]
    pub async fn send_message_observed(
        &mut self,
        chat: &dyn DeepDiveChat,
        text: &str,
        mut observe: impl FnMut(&str) + Send,
    ) -> Result<ReplyEnd, SendRejected> {
        let exchange = self.begin_send(text)?;
        let reply = exchange.reply_id;
        let mut guard = PendingReply {
            session: &mut *self,
            reply,
        };

        let mut stream = match chat
            .stream_deep_dive(&exchange.anchor_text, &exchange.history, &exchange.user_message)
            .await
        {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Deep dive request failed: {}", e);
                return Ok(guard.session.finish_reply(reply, ReplyEnd::Failed));
            }
        };

        let mut chunks = 0usize;
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => {
                    if guard.session.push_chunk(reply, &chunk) {
                        chunks += 1;
                        observe(&chunk);
                    }
                }
                Err(e) => {
                    warn!("Deep dive stream interrupted after {} chunks: {}", chunks, e);
                    return Ok(guard.session.finish_reply(reply, ReplyEnd::Failed));
                }
            }
        }

        debug!("Deep dive reply complete ({} chunks)", chunks);
        Ok(guard.session.finish_reply(reply, ReplyEnd::Completed))
    }

    /// Summarize the conversation and end the session.
    ///
    /// Returns the anchor text and the note content. A failed summary falls
    /// back to [`DEEP_DIVE_SAVED`].
    #[instrument(skip(self, summarizer), fields(turns = self.turns.len()))]
    pub async fn save(self, summarizer: &dyn ChatSummarizer) -> (String, String) {
        let history = self.completed_turns();

        let content = match summarizer.summarize_chat(&self.anchor_text, &history).await {
            Ok(summary) if !summary.trim().is_empty() => summary,
            Ok(_) => {
                warn!("Chat summary was empty, saving without it");
                DEEP_DIVE_SAVED.to_string()
            }
            Err(e) => {
                warn!("Chat summary failed, saving without it: {}", e);
                DEEP_DIVE_SAVED.to_string()
            }
        };

        info!("Deep dive saved after {} turns", history.len());
        (self.anchor_text, content)
    }

    fn push_turn(&mut self, role: Role, text: String) -> TurnId {
        let id = TurnId(self.next_turn);
        self.next_turn += 1;
        self.turns.push(DialogueTurn { id, role, text });
        id
    }
}

/// Fails a reply whose send future is dropped before it finishes.
struct PendingReply<'a> {
    session: &'a mut DialogueSession,
    reply: TurnId,
}

impl Drop for PendingReply<'_> {
    fn drop(&mut self) {
        if self.session.in_flight == Some(self.reply) {
            warn!("Deep dive reply abandoned before it finished");
            self.session.finish_reply(self.reply, ReplyEnd::Failed);
        }
    }
}
