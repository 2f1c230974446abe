use std::time::Duration;

use tokio::sync::mpsc;

/// Forward the last value of each burst once `quiet` has passed without a
/// newer one.
///
/// A burst still pending when the input closes is flushed before the output
/// closes.
pub fn debounce<T: Send + 'static>(
    mut input: mpsc::Receiver<T>,
    quiet: Duration,
) -> mpsc::Receiver<T> {
    let (tx, output) = mpsc::channel(16);
    tokio::spawn(async move {
        while let Some(mut latest) = input.recv().await {
            loop {
                match tokio::time::timeout(quiet, input.recv()).await {
                    Ok(Some(value)) => latest = value,
                    Ok(None) => {
                        let _ = tx.send(latest).await;
                        return;
                    }
                    Err(_) => break,
                }
            }
            if tx.send(latest).await.is_err() {
                return;
            }
        }
    });
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn bursts_collapse_to_last_value() {
        let (tx, rx) = mpsc::channel(16);
        let mut out = debounce(rx, Duration::from_millis(250));
        for q in ["g", "gh", "gh o"] {
            tx.send(q).await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_millis(300)).await;
        tx.send("later").await.unwrap();
        drop(tx);

        assert_eq!(out.recv().await, Some("gh o"));
        assert_eq!(out.recv().await, Some("later"));
        assert_eq!(out.recv().await, None);
    }
}
