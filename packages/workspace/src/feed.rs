//! Realtime feed subscriptions.
//!
//! A [`Subscription`] owns the task that pumps events into it. Calling
//! [`Subscription::unsubscribe`] or dropping the handle stops that task, so
//! a listener can never outlive the code that asked for it.

use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Buffered events per subscription before the producer waits
pub const FEED_BUFFER: usize = 64;

pub struct Subscription<T> {
    receiver: mpsc::Receiver<T>,
    task: Option<JoinHandle<()>>,
}

impl<T> Subscription<T> {
    pub fn new(receiver: mpsc::Receiver<T>, task: JoinHandle<()>) -> Self {
        Self {
            receiver,
            task: Some(task),
        }
    }

    /// Channel pair plus the subscription end, for producers that spawn
    /// their pump after creating the channel
    pub fn channel() -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
        mpsc::channel(FEED_BUFFER)
    }

    /// Wait for the next event; `None` once the feed has ended
    pub async fn next(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Next already-delivered event, without waiting
    pub fn try_next(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Drain everything delivered so far and keep the newest
    pub fn latest(&mut self) -> Option<T> {
        let mut last = None;
        while let Some(event) = self.try_next() {
            last = Some(event);
        }
        last
    }

    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.receiver.close();
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}
