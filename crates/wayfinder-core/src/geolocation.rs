//! Position sources and the scoped position subscription.

use crate::error::GeolocationError;
use crate::models::PathPoint;
use std::future::Future;
use tokio::sync::{mpsc, oneshot};

/// Buffered samples per subscription before the producer waits.
pub const WATCH_BUFFER: usize = 16;

pub type PositionSample = Result<PathPoint, GeolocationError>;

/// Device location, either one-shot or as a continuous subscription.
pub trait Geolocation {
    fn current_position(&self) -> impl Future<Output = Result<PathPoint, GeolocationError>>;

    fn watch_position(&self) -> Result<PositionWatch, GeolocationError>;
}

/// Consumer side of a position subscription.
///
/// Dropping the watch cancels the subscription; no explicit stop call is needed
/// on any exit path.
#[derive(Debug)]
pub struct PositionWatch {
    updates: mpsc::Receiver<PositionSample>,
    cancel: Option<oneshot::Sender<()>>,
}

/// Producer side of a position subscription.
#[derive(Debug)]
pub struct WatchFeed {
    updates: mpsc::Sender<PositionSample>,
    cancelled: oneshot::Receiver<()>,
}

impl PositionWatch {
    pub fn channel() -> (WatchFeed, PositionWatch) {
        let (tx, rx) = mpsc::channel(WATCH_BUFFER);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        (
            WatchFeed {
                updates: tx,
                cancelled: cancel_rx,
            },
            PositionWatch {
                updates: rx,
                cancel: Some(cancel_tx),
            },
        )
    }

    /// Next sample, or `None` once the producer has gone away.
    pub async fn next(&mut self) -> Option<PositionSample> {
        self.updates.recv().await
    }
}

impl Drop for PositionWatch {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
            tracing::debug!("Position watch released");
        }
        self.updates.close();
    }
}

impl WatchFeed {
    /// Deliver a sample. Returns false once the watch has been released.
    pub async fn send(&self, sample: PositionSample) -> bool {
        self.updates.send(sample).await.is_ok()
    }

    pub fn is_cancelled(&mut self) -> bool {
        !matches!(
            self.cancelled.try_recv(),
            Err(oneshot::error::TryRecvError::Empty)
        )
    }

    /// Resolves when the consumer releases the watch.
    pub async fn cancelled(&mut self) {
        let _ = (&mut self.cancelled).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn samples_flow_until_watch_is_dropped() {
        let (mut feed, mut watch) = PositionWatch::channel();
        assert!(feed.send(Ok(PathPoint::new(1.0, 2.0))).await);
        assert_eq!(watch.next().await, Some(Ok(PathPoint::new(1.0, 2.0))));
        assert!(!feed.is_cancelled());

        drop(watch);
        assert!(feed.is_cancelled());
        assert!(!feed.send(Ok(PathPoint::new(1.0, 2.0))).await);
    }

    #[tokio::test]
    async fn cancelled_resolves_on_release() {
        let (mut feed, watch) = PositionWatch::channel();
        let producer = tokio::spawn(async move {
            feed.cancelled().await;
            true
        });
        drop(watch);
        assert!(producer.await.unwrap());
    }

    #[tokio::test]
    async fn watch_ends_when_producer_goes_away() {
        let (feed, mut watch) = PositionWatch::channel();
        drop(feed);
        assert_eq!(watch.next().await, None);
    }
}
