//! Attribute values that may not be known yet.
//!
//! Detectors frequently learn some attributes only after I/O completes (a
//! machine id read from disk, a cloud metadata lookup). Such values are
//! carried as [`MaybePending::Pending`] and settle exactly once; every clone
//! of the slot observes the same outcome.
use futures_util::future::{join_all, BoxFuture, FutureExt, Shared};
use opentelemetry::{otel_debug, Key, KeyValue, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type Settlement = Result<Value, Arc<str>>;

/// A value that becomes known once its detection future completes.
///
/// The wrapped future runs at most once, no matter how many clones of the
/// handle are awaited. A failed future settles the value as absent.
#[derive(Clone)]
pub struct PendingValue {
    future: Shared<BoxFuture<'static, Settlement>>,
}

impl PendingValue {
    /// Wraps a detection future.
    pub fn new<F, E>(future: F) -> Self
    where
        F: Future<Output = Result<Value, E>> + Send + 'static,
        E: fmt::Display,
    {
        PendingValue {
            future: future
                .map(|result| result.map_err(|err| Arc::<str>::from(err.to_string())))
                .boxed()
                .shared(),
        }
    }

    /// True once the detection future has completed, successfully or not.
    pub fn is_settled(&self) -> bool {
        self.future.peek().is_some()
    }

    async fn settle(&self) -> Settlement {
        self.future.clone().await
    }
}

impl fmt::Debug for PendingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.future.peek() {
            None => f.write_str("Pending"),
            Some(Ok(value)) => f.debug_tuple("Settled").field(value).finish(),
            Some(Err(reason)) => f.debug_tuple("Failed").field(reason).finish(),
        }
    }
}

/// A raw attribute slot: either a known value or one still being detected.
#[derive(Clone, Debug)]
pub enum MaybePending {
    /// The value was known when the slot was created.
    Resolved(Value),
    /// The value is produced by a detection future.
    Pending(PendingValue),
}

/// What a slot holds right now, without waiting.
#[derive(Debug, PartialEq)]
pub(crate) enum Current<'a> {
    Value(&'a Value),
    Absent,
    Pending,
}

impl MaybePending {
    /// Creates a slot whose value is produced by `future`.
    pub fn pending<F, E>(future: F) -> Self
    where
        F: Future<Output = Result<Value, E>> + Send + 'static,
        E: fmt::Display,
    {
        MaybePending::Pending(PendingValue::new(future))
    }

    /// True while the slot is waiting on a detection future.
    ///
    /// A pending slot whose future has completed is no longer pending, even
    /// if detection failed.
    pub fn is_pending(&self) -> bool {
        match self {
            MaybePending::Resolved(_) => false,
            MaybePending::Pending(pending) => !pending.is_settled(),
        }
    }

    pub(crate) fn current(&self) -> Current<'_> {
        match self {
            MaybePending::Resolved(value) => Current::Value(value),
            MaybePending::Pending(pending) => match pending.future.peek() {
                None => Current::Pending,
                Some(Ok(value)) => Current::Value(value),
                Some(Err(_)) => Current::Absent,
            },
        }
    }

    async fn outcome(&self) -> Settlement {
        match self {
            MaybePending::Resolved(value) => Ok(value.clone()),
            MaybePending::Pending(pending) => pending.settle().await,
        }
    }
}

impl From<Value> for MaybePending {
    fn from(value: Value) -> Self {
        MaybePending::Resolved(value)
    }
}

impl From<PendingValue> for MaybePending {
    fn from(pending: PendingValue) -> Self {
        MaybePending::Pending(pending)
    }
}

/// Waits for every pending value in `attributes` to settle.
///
/// The result keeps the input order. Pending values are replaced by what
/// they settled to and values whose detection failed are dropped. Nothing
/// suspends when every value is already settled.
pub async fn resolve_all(attributes: &[(Key, MaybePending)]) -> Vec<KeyValue> {
    let outcomes = join_all(attributes.iter().map(|(_, value)| value.outcome())).await;

    attributes
        .iter()
        .zip(outcomes)
        .filter_map(|((key, _), outcome)| match outcome {
            Ok(value) => Some(KeyValue::new(key.clone(), value)),
            Err(reason) => {
                otel_debug!(
                    name: "Resource.AsyncAttributeFailed",
                    key = key.as_str(),
                    reason = &*reason
                );
                None
            }
        })
        .collect()
}

/// Replaces `key`'s slot if present, otherwise appends it.
pub(crate) fn upsert(attributes: &mut Vec<(Key, MaybePending)>, key: Key, value: MaybePending) {
    match attributes.iter_mut().find(|(existing, _)| *existing == key) {
        Some((_, slot)) => *slot = value,
        None => attributes.push((key, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_executor::block_on;
    use futures_util::future;
    use tokio::sync::oneshot;

    #[test]
    fn resolved_values_are_never_pending() {
        let value = MaybePending::from(Value::from("a"));
        assert!(!value.is_pending());
        assert_eq!(value.current(), Current::Value(&Value::from("a")));
    }

    #[test]
    fn pending_value_settles_once_awaited() {
        let (tx, rx) = oneshot::channel::<Value>();
        let slot = MaybePending::pending(rx);
        assert!(slot.is_pending());
        assert_eq!(slot.current(), Current::Pending);

        tx.send(Value::from(42)).unwrap();
        let resolved = block_on(resolve_all(&[(Key::new("answer"), slot.clone())]));

        assert_eq!(resolved, vec![KeyValue::new("answer", 42)]);
        assert!(!slot.is_pending());
        assert_eq!(slot.current(), Current::Value(&Value::from(42)));
    }

    #[test]
    fn failed_values_are_dropped() {
        let attributes = vec![
            (Key::new("ok"), MaybePending::from(Value::from(true))),
            (
                Key::new("broken"),
                MaybePending::pending(future::ready(Err::<Value, _>("lookup failed"))),
            ),
        ];

        let resolved = block_on(resolve_all(&attributes));

        assert_eq!(resolved, vec![KeyValue::new("ok", true)]);
        assert_eq!(attributes[1].1.current(), Current::Absent);
        assert!(!attributes[1].1.is_pending());
    }

    #[test]
    fn resolving_twice_returns_the_same_values() {
        let attributes = vec![
            (Key::new("a"), MaybePending::from(Value::from("x"))),
            (
                Key::new("b"),
                MaybePending::pending(async { Ok::<_, String>(Value::from(1.5)) }),
            ),
        ];

        let first = block_on(resolve_all(&attributes));
        let second = block_on(resolve_all(&attributes));

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn clones_share_one_settlement() {
        let slot = MaybePending::pending(async { Ok::<_, String>(Value::from("shared")) });
        let copy = slot.clone();

        block_on(resolve_all(&[(Key::new("k"), slot)]));

        assert_eq!(copy.current(), Current::Value(&Value::from("shared")));
    }

    #[test]
    fn upsert_replaces_existing_keys_in_place() {
        let mut attributes = vec![
            (Key::new("a"), MaybePending::from(Value::from(1))),
            (Key::new("b"), MaybePending::from(Value::from(2))),
        ];

        upsert(&mut attributes, Key::new("a"), Value::from(3).into());
        upsert(&mut attributes, Key::new("c"), Value::from(4).into());

        let keys: Vec<_> = attributes.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(attributes[0].1.current(), Current::Value(&Value::from(3)));
    }
}
