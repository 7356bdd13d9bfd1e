//! Single producer / single consumer over a bounded buffer

use std::future::Future;

use futures::{pin_mut, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// Counters reported by [`producer_consumer`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerConsumerReport {
    /// Items the producer handed to the buffer
    pub produced: usize,

    /// Items the consumer processed
    pub consumed: usize,

    /// Most items observed waiting in the buffer
    pub peak_buffered: usize,
}

/// Pump `items` through a buffer of `capacity` into `consume`
///
/// The producer suspends whenever the buffer is full, so a slow consumer
/// throttles a fast producer. Returns once the producer is exhausted and the
/// consumer has drained the buffer.
pub async fn producer_consumer<T, S, C, Fut>(
    capacity: usize,
    items: S,
    mut consume: C,
) -> ProducerConsumerReport
where
    S: Stream<Item = T>,
    C: FnMut(T) -> Fut,
    Fut: Future<Output = ()>,
{
    let (tx, mut rx) = mpsc::channel(capacity.max(1));

    let produce = async move {
        let mut produced = 0;
        let mut peak_buffered = 0;
        pin_mut!(items);

        while let Some(item) = items.next().await {
            if tx.send(item).await.is_err() {
                break;
            }
            produced += 1;
            peak_buffered = peak_buffered.max(tx.max_capacity() - tx.capacity());
            debug!(produced, "Produced item");
        }
        (produced, peak_buffered)
    };

    let drain = async move {
        let mut consumed = 0;
        while let Some(item) = rx.recv().await {
            consume(item).await;
            consumed += 1;
            debug!(consumed, "Consumed item");
        }
        consumed
    };

    let ((produced, peak_buffered), consumed) = tokio::join!(produce, drain);

    ProducerConsumerReport {
        produced,
        consumed,
        peak_buffered,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::stream;

    use super::*;

    #[tokio::test]
    async fn test_every_item_consumed_in_order() {
        let mut seen = Vec::new();
        let report = producer_consumer(5, stream::iter(1..=10), |item| {
            seen.push(item);
            async {}
        })
        .await;

        assert_eq!(report.produced, 10);
        assert_eq!(report.consumed, 10);
        assert_eq!(seen, (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_slow_consumer_fills_buffer() {
        let report = producer_consumer(3, stream::iter(0..12), |_| {
            tokio::time::sleep(Duration::from_millis(5))
        })
        .await;

        assert_eq!(report.consumed, 12);
        assert!(report.peak_buffered <= 3);
        assert!(report.peak_buffered >= 2);
    }

    #[tokio::test]
    async fn test_empty_stream() {
        let report =
            producer_consumer(2, stream::iter(Vec::<u8>::new()), |_| async {}).await;
        assert_eq!(report, ProducerConsumerReport::default());
    }
}
