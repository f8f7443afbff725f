//! Per-operation deadlines.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{ResourceError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Read => write!(f, "read"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Upper bound on how long each operation may take, remote calls included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    #[serde(with = "secs")]
    pub create: Duration,
    #[serde(with = "secs")]
    pub read: Duration,
    #[serde(with = "secs")]
    pub update: Duration,
    #[serde(with = "secs")]
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: Duration::from_secs(30 * 60),
            read: Duration::from_secs(5 * 60),
            update: Duration::from_secs(30 * 60),
            delete: Duration::from_secs(30 * 60),
        }
    }
}

impl Timeouts {
    pub fn for_operation(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }

    /// Runs `fut` under the deadline for `operation`.
    ///
    /// The work is bound to a child of `stop`: cancelling `stop` aborts it, and
    /// the child scope is cancelled on every exit path, so nothing started
    /// inside outlives the call.
    pub async fn run<T, F>(&self, operation: Operation, stop: &CancellationToken, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let limit = self.for_operation(operation);
        let scope = stop.child_token();
        let _release = scope.clone().drop_guard();

        tokio::select! {
            biased;
            _ = scope.cancelled() => Err(ResourceError::Cancelled { operation }),
            res = tokio::time::timeout(limit, fut) => match res {
                Ok(out) => out,
                Err(_) => Err(ResourceError::DeadlineExceeded { operation, after: limit }),
            },
        }
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let t = Timeouts::default();
        assert_eq!(t.for_operation(Operation::Create), Duration::from_secs(1800));
        assert_eq!(t.for_operation(Operation::Read), Duration::from_secs(300));
        assert_eq!(t.for_operation(Operation::Update), Duration::from_secs(1800));
        assert_eq!(t.for_operation(Operation::Delete), Duration::from_secs(1800));
    }

    #[tokio::test]
    async fn test_run_returns_inner_result() {
        let stop = CancellationToken::new();
        let out = Timeouts::default()
            .run(Operation::Read, &stop, async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(out, 7);
        assert!(!stop.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let timeouts = Timeouts {
            read: Duration::from_secs(1),
            ..Timeouts::default()
        };
        let stop = CancellationToken::new();
        let err = timeouts
            .run(Operation::Read, &stop, async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResourceError::DeadlineExceeded {
                operation: Operation::Read,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_stop_token_cancels() {
        let stop = CancellationToken::new();
        stop.cancel();
        let err = Timeouts::default()
            .run(Operation::Delete, &stop, std::future::pending::<Result<()>>())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "delete was cancelled");
    }

    #[test]
    fn test_serde_in_seconds() {
        let t: Timeouts =
            serde_json::from_str(r#"{"create":60,"read":10,"update":60,"delete":30}"#).unwrap();
        assert_eq!(t.read, Duration::from_secs(10));
        assert_eq!(serde_json::to_value(t).unwrap()["delete"], 30);
    }
}
