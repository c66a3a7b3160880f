use std::future::Future;
use std::time::Duration;

use crate::error::ClientError;

/// Pick the first entry of `ours` that `theirs` also offers.
pub fn negotiate_subprotocol<'a>(ours: &'a [String], theirs: &[String]) -> Option<&'a str> {
    ours.iter()
        .find(|candidate| theirs.contains(*candidate))
        .map(String::as_str)
}

/// Await `fut`, failing with `Timeout { stage }` once `limit` has elapsed.
pub async fn with_timeout<T>(
    limit: Duration,
    stage: &'static str,
    fut: impl Future<Output = Result<T, ClientError>>,
) -> Result<T, ClientError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| ClientError::Timeout { stage })?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_local_match_wins() {
        let ours = list(&["v2.saltyrtc.org", "v1.saltyrtc.org"]);
        let theirs = list(&["v1.saltyrtc.org", "v2.saltyrtc.org"]);
        assert_eq!(negotiate_subprotocol(&ours, &theirs), Some("v2.saltyrtc.org"));
    }

    #[test]
    fn test_no_common_subprotocol() {
        let ours = list(&["v1.saltyrtc.org"]);
        assert_eq!(negotiate_subprotocol(&ours, &list(&["v0"])), None);
        assert_eq!(negotiate_subprotocol(&ours, &[]), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_elapses() {
        let result: Result<(), _> = with_timeout(
            Duration::from_millis(50),
            "nothing",
            std::future::pending(),
        )
        .await;
        assert!(matches!(result, Err(ClientError::Timeout { stage: "nothing" })));
    }
}
