//! A communication channel used to send/receive messages to/from another participant.

use std::{fmt, future::Future, time::Duration};

use serde::{Serialize, de::DeserializeOwned};
use tokio::{
    sync::mpsc::{Receiver, Sender, channel, error::SendError},
    time::timeout,
};
use tracing::trace;

/// Errors related to sending / receiving / (de-)serializing messages.
#[derive(Debug, thiserror::Error)]
#[error("channel error while {phase}: {reason}")]
pub struct Error {
    /// The phase of the session during which the error occurred.
    pub phase: String,
    /// The specific error that was raised.
    pub reason: ErrorKind,
}

/// The specific error that occurred when trying to send / receive a message.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The (serialized) message could not be received over the channel.
    #[error("could not receive message: {0}")]
    RecvError(String),
    /// The (serialized) message could not be sent over the channel.
    #[error("could not send message: {0}")]
    SendError(String),
    /// The message could not be (de-)serialized.
    #[error("could not (de-)serialize message: {0}")]
    SerdeError(String),
}

/// A communication channel used to send/receive messages to/from another participant.
pub trait Channel {
    /// The error that can occur sending messages over the channel.
    type SendError: fmt::Debug;
    /// The error that can occur receiving messages over the channel.
    type RecvError: fmt::Debug;

    /// Sends a message to the participant with the given index.
    fn send_bytes_to(
        &mut self,
        to: usize,
        msg: Vec<u8>,
    ) -> impl Future<Output = Result<(), Self::SendError>> + Send;

    /// Awaits a message from the participant with the given index.
    fn recv_bytes_from(
        &mut self,
        from: usize,
    ) -> impl Future<Output = Result<Vec<u8>, Self::RecvError>> + Send;
}

/// Serializes and sends a message to another participant.
pub(crate) async fn send_to(
    channel: &mut impl Channel,
    to: usize,
    phase: &str,
    msg: &impl Serialize,
) -> Result<(), Error> {
    let msg = bincode::serialize(msg).map_err(|e| Error {
        phase: format!("sending {phase}"),
        reason: ErrorKind::SerdeError(format!("{e:?}")),
    })?;
    trace!(to, phase, bytes = msg.len(), "sending message");
    channel.send_bytes_to(to, msg).await.map_err(|e| Error {
        phase: format!("sending {phase}"),
        reason: ErrorKind::SendError(format!("{e:?}")),
    })
}

/// Receives and deserializes a message from another participant.
pub(crate) async fn recv_from<T: DeserializeOwned>(
    channel: &mut impl Channel,
    from: usize,
    phase: &str,
) -> Result<T, Error> {
    let msg = channel.recv_bytes_from(from).await.map_err(|e| Error {
        phase: format!("receiving {phase}"),
        reason: ErrorKind::RecvError(format!("{e:?}")),
    })?;
    trace!(from, phase, bytes = msg.len(), "received message");
    bincode::deserialize(&msg).map_err(|e| Error {
        phase: format!("receiving {phase}"),
        reason: ErrorKind::SerdeError(format!("{e:?}")),
    })
}

/// A simple in-process channel using [`Sender`] and [`Receiver`].
#[derive(Debug)]
pub struct SimpleChannel {
    s: Vec<Option<Sender<Vec<u8>>>>,
    r: Vec<Option<Receiver<Vec<u8>>>>,
    timeout: Duration,
}

impl SimpleChannel {
    /// Creates channels for `participants` participants to communicate with each other.
    pub fn channels(participants: usize) -> Vec<Self> {
        Self::channels_with_timeout(participants, Duration::from_secs(60))
    }

    /// Creates channels whose receive calls fail after waiting `timeout` for a message.
    pub fn channels_with_timeout(participants: usize, timeout: Duration) -> Vec<Self> {
        let buffer_capacity = 16;
        let mut channels: Vec<SimpleChannel> = (0..participants)
            .map(|_| SimpleChannel {
                s: (0..participants).map(|_| None).collect(),
                r: (0..participants).map(|_| None).collect(),
                timeout,
            })
            .collect();
        for a in 0..participants {
            for b in (a + 1)..participants {
                let (send_a_to_b, recv_a_to_b) = channel(buffer_capacity);
                let (send_b_to_a, recv_b_to_a) = channel(buffer_capacity);
                channels[a].s[b] = Some(send_a_to_b);
                channels[b].s[a] = Some(send_b_to_a);
                channels[a].r[b] = Some(recv_b_to_a);
                channels[b].r[a] = Some(recv_a_to_b);
            }
        }
        channels
    }
}

/// The error raised by `send` calls of a [`SimpleChannel`].
#[derive(Debug)]
pub enum SimpleSendError {
    /// There is no channel to the participant.
    NoSuchParticipant(usize),
    /// The receiving side has been dropped.
    Closed(SendError<Vec<u8>>),
}

/// The error raised by `recv` calls of a [`SimpleChannel`].
#[derive(Debug)]
pub enum SimpleRecvError {
    /// There is no channel from the participant.
    NoSuchParticipant(usize),
    /// The channel has been closed.
    Closed,
    /// No message was received before the timeout.
    TimeoutElapsed,
}

impl Channel for SimpleChannel {
    type SendError = SimpleSendError;
    type RecvError = SimpleRecvError;

    async fn send_bytes_to(&mut self, to: usize, msg: Vec<u8>) -> Result<(), SimpleSendError> {
        let sender = self
            .s
            .get(to)
            .and_then(Option::as_ref)
            .ok_or(SimpleSendError::NoSuchParticipant(to))?;
        sender.send(msg).await.map_err(SimpleSendError::Closed)
    }

    async fn recv_bytes_from(&mut self, from: usize) -> Result<Vec<u8>, SimpleRecvError> {
        let receiver = self
            .r
            .get_mut(from)
            .and_then(Option::as_mut)
            .ok_or(SimpleRecvError::NoSuchParticipant(from))?;
        match timeout(self.timeout, receiver.recv()).await {
            Ok(Some(msg)) => Ok(msg),
            Ok(None) => Err(SimpleRecvError::Closed),
            Err(_) => Err(SimpleRecvError::TimeoutElapsed),
        }
    }
}
