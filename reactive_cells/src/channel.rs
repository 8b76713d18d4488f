//! A single-slot notification channel.
//!
//! Effects and resource drivers are long-lived async tasks that wait for the
//! next notification from the graph. The channel coalesces any number of
//! notifications between polls into one wake-up, which is what turns a burst
//! of writes into a single rerun.

use core::sync::atomic::Ordering::Relaxed;
use futures::{task::AtomicWaker, Stream};
use std::{
    fmt::Debug,
    pin::Pin,
    sync::{atomic::AtomicBool, Arc, Weak},
    task::{Context, Poll},
};

#[derive(Debug)]
pub(crate) struct Sender(Arc<Inner>);

#[derive(Debug)]
pub(crate) struct Receiver(Weak<Inner>);

#[derive(Debug, Default)]
struct Inner {
    waker: AtomicWaker,
    set: AtomicBool,
}

impl Drop for Inner {
    fn drop(&mut self) {
        // The receiving task owns everything it captured and sits parked on
        // this waker. Waking it one final time makes the stream yield `None`
        // (the weak upgrade fails), which ends the task and releases its
        // captures.
        self.waker.wake();
    }
}

pub(crate) fn channel() -> (Sender, Receiver) {
    let inner = Arc::new(Inner::default());
    let rx = Arc::downgrade(&inner);
    (Sender(inner), Receiver(rx))
}

impl Sender {
    pub fn notify(&mut self) {
        self.0.set.store(true, Relaxed);
        self.0.waker.wake();
    }
}

impl Stream for Receiver {
    type Item = ();

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        if let Some(inner) = self.0.upgrade() {
            inner.waker.register(cx.waker());

            if inner.set.swap(false, Relaxed) {
                Poll::Ready(Some(()))
            } else {
                Poll::Pending
            }
        } else {
            Poll::Ready(None)
        }
    }
}
