//! Consumer-side delivery.
//!
//! A [`ChangeSink`] is the event channel of one observation session. Two
//! ready-made sinks ship with the crate:
//! - [`FnSink`] wraps a closure
//! - [`ChannelSink`] forwards into a tokio mpsc channel whose receiver is
//!   exposed as a [`ChangeStream`]

use std::fmt;
use std::pin::Pin;
use std::task::Context;
use std::task::Poll;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;
use tracing::trace;
use tracing::warn;

use crate::ChangeEvent;
use crate::Error;
use crate::Result;


/// Receives the change stream of one session.
///
/// Called without any engine lock held, possibly from the thread that mutated
/// the store. Implementations may call back into the engine.
pub trait ChangeSink: Send + Sync {
    fn deliver(
        &self,
        event: ChangeEvent,
    );

    /// Terminal error for the session (currently only `InitializationFailed`)
    fn fail(
        &self,
        error: Error,
    ) {
        warn!(code = error.code(), %error, "Observation error reported to sink");
    }
}

/// Closure-backed sink; errors are logged.
pub struct FnSink<F> {
    f: F,
}

impl<F> FnSink<F>
where
    F: Fn(ChangeEvent) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> ChangeSink for FnSink<F>
where
    F: Fn(ChangeEvent) + Send + Sync,
{
    fn deliver(
        &self,
        event: ChangeEvent,
    ) {
        (self.f)(event)
    }
}

impl<F> fmt::Debug for FnSink<F> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str("FnSink")
    }
}

#[derive(Debug)]
enum Sender {
    Bounded(mpsc::Sender<Result<ChangeEvent>>),
    Unbounded(mpsc::UnboundedSender<Result<ChangeEvent>>),
}

/// Sink half of [`channel`].
///
/// A bounded channel never blocks the notifying thread: when the buffer is
/// full the event is dropped with a warning.
#[derive(Debug)]
pub struct ChannelSink {
    tx: Sender,
}

impl ChannelSink {
    fn send(
        &self,
        item: Result<ChangeEvent>,
    ) {
        match &self.tx {
            Sender::Bounded(tx) => match tx.try_send(item) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("Change stream buffer full; event dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    trace!("Change stream receiver dropped");
                }
            },
            Sender::Unbounded(tx) => {
                if tx.send(item).is_err() {
                    trace!("Change stream receiver dropped");
                }
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        match &self.tx {
            Sender::Bounded(tx) => tx.is_closed(),
            Sender::Unbounded(tx) => tx.is_closed(),
        }
    }
}

impl ChangeSink for ChannelSink {
    fn deliver(
        &self,
        event: ChangeEvent,
    ) {
        self.send(Ok(event));
    }

    fn fail(
        &self,
        error: Error,
    ) {
        self.send(Err(error));
    }
}

/// Receiving half of [`channel`]: a `Stream` of events, errors in-band.
pub struct ChangeStream {
    inner: Pin<Box<dyn Stream<Item = Result<ChangeEvent>> + Send>>,
}

impl Stream for ChangeStream {
    type Item = Result<ChangeEvent>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for ChangeStream {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str("ChangeStream")
    }
}

/// Create a sink/stream pair. `buffer_size == 0` means unbounded.
pub fn channel(buffer_size: usize) -> (ChannelSink, ChangeStream) {
    if buffer_size == 0 {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            ChannelSink {
                tx: Sender::Unbounded(tx),
            },
            ChangeStream {
                inner: Box::pin(UnboundedReceiverStream::new(rx)),
            },
        )
    } else {
        let (tx, rx) = mpsc::channel(buffer_size);
        (
            ChannelSink {
                tx: Sender::Bounded(tx),
            },
            ChangeStream {
                inner: Box::pin(ReceiverStream::new(rx)),
            },
        )
    }
}
