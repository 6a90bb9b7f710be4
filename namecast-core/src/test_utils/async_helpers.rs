//! Async test helpers
//!
//! Receiving from channels without letting a missing message hang a test.

use tokio::sync::{broadcast, mpsc};
use tokio::time::{timeout, Duration};

/// Helper for receiving from a channel with a timeout
pub async fn recv_timeout<T>(
    rx: &mut mpsc::Receiver<T>,
    duration: Duration,
) -> Result<T, RecvTimeoutError> {
    timeout(duration, rx.recv())
        .await
        .map_err(|_| RecvTimeoutError::Timeout)?
        .ok_or(RecvTimeoutError::Closed)
}

/// Next value from a broadcast receiver, skipping over lag
pub async fn next_event<T: Clone>(
    rx: &mut broadcast::Receiver<T>,
    duration: Duration,
) -> Result<T, RecvTimeoutError> {
    timeout(duration, async {
        loop {
            match rx.recv().await {
                Ok(value) => return Ok(value),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return Err(RecvTimeoutError::Closed),
            }
        }
    })
    .await
    .map_err(|_| RecvTimeoutError::Timeout)?
}

/// Collect `count` values from a broadcast receiver
pub async fn collect_events<T: Clone>(
    rx: &mut broadcast::Receiver<T>,
    count: usize,
    per_event_timeout: Duration,
) -> Result<Vec<T>, RecvTimeoutError> {
    let mut events = Vec::with_capacity(count);
    for _ in 0..count {
        events.push(next_event(rx, per_event_timeout).await?);
    }
    Ok(events)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvTimeoutError {
    Timeout,
    Closed,
}

impl std::fmt::Display for RecvTimeoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecvTimeoutError::Timeout => write!(f, "receive operation timed out"),
            RecvTimeoutError::Closed => write!(f, "channel closed"),
        }
    }
}

impl std::error::Error for RecvTimeoutError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recv_timeout_success() {
        let (tx, mut rx) = mpsc::channel(1);
        tx.send(42).await.unwrap();

        let result = recv_timeout(&mut rx, Duration::from_millis(100)).await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn test_recv_timeout_timeout() {
        let (_tx, mut rx) = mpsc::channel::<i32>(1);

        let result = recv_timeout(&mut rx, Duration::from_millis(10)).await;
        assert_eq!(result, Err(RecvTimeoutError::Timeout));
    }

    #[tokio::test]
    async fn test_next_event_closed() {
        let (tx, mut rx) = broadcast::channel::<u8>(4);
        drop(tx);

        let result = next_event(&mut rx, Duration::from_millis(100)).await;
        assert_eq!(result, Err(RecvTimeoutError::Closed));
    }
}
