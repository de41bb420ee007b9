//! Entities: typed, identity-bearing parts of a resource.
//!
//! An entity splits its attributes in two tiers. The *identifier* names the
//! thing being described (a pod uid, a host id) and is fixed at
//! construction. The descriptive *attributes* add detail and may still be
//! pending when the entity is created.
mod merge;

pub use merge::merge_entities;

use crate::attribute::{resolve_all, upsert, Current, MaybePending};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use opentelemetry::{otel_debug, Key, KeyValue, Value};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};

/// The raw shape of an entity as produced by a detector.
///
/// Also serves as the builder for [`Entity`].
#[derive(Debug)]
pub struct DetectedEntity {
    entity_type: Cow<'static, str>,
    schema_url: Option<Cow<'static, str>>,
    identifier: Vec<KeyValue>,
    attributes: Vec<(Key, MaybePending)>,
}

impl DetectedEntity {
    /// Starts describing an entity of the given type.
    pub fn new(entity_type: impl Into<Cow<'static, str>>) -> Self {
        DetectedEntity {
            entity_type: entity_type.into(),
            schema_url: None,
            identifier: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Sets the schema url the attribute keys follow.
    pub fn with_schema_url(mut self, schema_url: impl Into<Cow<'static, str>>) -> Self {
        self.schema_url = Some(schema_url.into());
        self
    }

    /// Adds identifying attributes. A repeated key replaces the earlier value.
    pub fn with_identifier<I: IntoIterator<Item = KeyValue>>(mut self, identifier: I) -> Self {
        for kv in identifier {
            match self.identifier.iter_mut().find(|existing| existing.key == kv.key) {
                Some(existing) => existing.value = kv.value,
                None => self.identifier.push(kv),
            }
        }
        self
    }

    /// Adds descriptive attributes whose values are already known.
    pub fn with_attributes<I: IntoIterator<Item = KeyValue>>(mut self, attributes: I) -> Self {
        for kv in attributes {
            upsert(&mut self.attributes, kv.key, kv.value.into());
        }
        self
    }

    /// Adds a descriptive attribute whose value is produced by `future`.
    pub fn with_async_attribute<F, E>(mut self, key: impl Into<Key>, future: F) -> Self
    where
        F: Future<Output = Result<Value, E>> + Send + 'static,
        E: fmt::Display,
    {
        upsert(
            &mut self.attributes,
            key.into(),
            MaybePending::pending(future),
        );
        self
    }

    /// Builds the entity.
    pub fn build(self) -> Entity {
        Entity::from_detected(self)
    }
}

/// The shape of an entity, without its values.
///
/// Captured when a resource is built; descriptive keys whose values were
/// still pending at that moment are not listed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityRef {
    /// The entity type.
    pub entity_type: Cow<'static, str>,
    /// Keys of the identifying attributes.
    pub identifying_attribute_keys: Vec<Key>,
    /// Keys of the descriptive attributes known at capture time.
    pub descriptive_attribute_keys: Vec<Key>,
}

/// A typed group of identifying and descriptive attributes.
///
/// Cloning is cheap; clones share the descriptive attributes and settle
/// together.
#[derive(Clone)]
pub struct Entity {
    inner: Arc<EntityInner>,
}

struct EntityInner {
    entity_type: Cow<'static, str>,
    schema_url: Option<Cow<'static, str>>,
    identifier: Vec<KeyValue>,
    attributes: Vec<(Key, MaybePending)>,
    resolved: OnceLock<HashMap<Key, Value>>,
    settling: OnceLock<Shared<BoxFuture<'static, Vec<KeyValue>>>>,
}

impl Entity {
    /// Starts building an entity of the given type.
    pub fn builder(entity_type: impl Into<Cow<'static, str>>) -> DetectedEntity {
        DetectedEntity::new(entity_type)
    }

    /// Creates an entity from a detection result.
    pub fn from_detected(detected: DetectedEntity) -> Self {
        Entity {
            inner: Arc::new(EntityInner {
                entity_type: detected.entity_type,
                schema_url: detected.schema_url,
                identifier: detected.identifier,
                attributes: detected.attributes,
                resolved: OnceLock::new(),
                settling: OnceLock::new(),
            }),
        }
    }

    /// The type used to group entities when merging.
    pub fn entity_type(&self) -> &str {
        &self.inner.entity_type
    }

    /// The schema url the attribute keys follow, if any.
    pub fn schema_url(&self) -> Option<&str> {
        self.inner.schema_url.as_deref()
    }

    /// The identifying attributes, in the order they were given.
    pub fn identifier(&self) -> &[KeyValue] {
        &self.inner.identifier
    }

    /// The descriptive attributes that have settled.
    ///
    /// Values still being detected are left out. Once every value has
    /// settled the map is computed once and reused.
    pub fn attributes(&self) -> HashMap<Key, Value> {
        if let Some(resolved) = self.inner.resolved.get() {
            return resolved.clone();
        }

        let mut pending = false;
        let mut attributes = HashMap::with_capacity(self.inner.attributes.len());
        for (key, value) in &self.inner.attributes {
            match value.current() {
                Current::Value(value) => {
                    attributes.insert(key.clone(), value.clone());
                }
                Current::Absent => {}
                Current::Pending => pending = true,
            }
        }

        if pending {
            otel_debug!(
                name: "Entity.AttributesAccessedBeforeSettled",
                entity_type = self.entity_type(),
                message = "Entity attributes read before async attributes settled; pending values are skipped"
            );
            attributes
        } else {
            self.inner.resolved.get_or_init(|| attributes).clone()
        }
    }

    /// True while any descriptive attribute is still being detected.
    pub fn async_attributes_pending(&self) -> bool {
        self.inner.resolved.get().is_none()
            && self
                .inner
                .attributes
                .iter()
                .any(|(_, value)| value.is_pending())
    }

    /// Waits until every descriptive attribute has settled.
    ///
    /// Concurrent callers share one resolution. Returns without suspending
    /// when nothing is pending.
    pub async fn wait_for_async_attributes(&self) {
        if self.inner.resolved.get().is_some() {
            return;
        }

        let settling = self
            .inner
            .settling
            .get_or_init(|| {
                let attributes = self.inner.attributes.clone();
                async move { resolve_all(&attributes).await }
                    .boxed()
                    .shared()
            })
            .clone();
        let resolved = settling.await;

        let _ = self
            .inner
            .resolved
            .set(resolved.into_iter().map(|kv| (kv.key, kv.value)).collect());
    }

    /// Summarizes the entity's shape as of now.
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef {
            entity_type: self.inner.entity_type.clone(),
            identifying_attribute_keys: self
                .inner
                .identifier
                .iter()
                .map(|kv| kv.key.clone())
                .collect(),
            descriptive_attribute_keys: self
                .inner
                .attributes
                .iter()
                .filter(|(_, value)| matches!(value.current(), Current::Value(_)))
                .map(|(key, _)| key.clone())
                .collect(),
        }
    }

    /// True when both identifiers hold exactly the same keys and values.
    pub(crate) fn has_same_identifier(&self, other: &Entity) -> bool {
        let ours = &self.inner.identifier;
        let theirs = &other.inner.identifier;
        ours.len() == theirs.len()
            && ours
                .iter()
                .all(|kv| theirs.iter().any(|other| other.key == kv.key && other.value == kv.value))
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("entity_type", &self.inner.entity_type)
            .field("schema_url", &self.inner.schema_url)
            .field("identifier", &self.inner.identifier)
            .field("attributes", &self.inner.attributes)
            .finish()
    }
}
