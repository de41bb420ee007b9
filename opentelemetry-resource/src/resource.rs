//! The resource: everything known about the entity producing telemetry.
//!
//! A [`Resource`] keeps the raw attribute slots and the entities it was
//! built from. [`Resource::attributes`] flattens both into one map:
//!
//! 1. For each entity, in order, its identifying attributes are written over
//!    whatever is already there, then its descriptive attributes are written
//!    where the key is still free.
//! 2. Raw attributes are written in list order where the key is still free.
//!    Pending raw attributes are skipped.
//!
//! The flattened map is cached once nothing is pending. Reads made while
//! values are still being detected recompute it every time.
use crate::attribute::{resolve_all, upsert, Current, MaybePending};
use crate::defaults::{default_resource, ServiceDefaults};
use crate::entity::{merge_entities, DetectedEntity, Entity, EntityRef};
use futures_util::future::{join, join_all, BoxFuture, FutureExt, Shared};
use opentelemetry::{otel_debug, otel_error, Key, KeyValue, Value};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};

/// The raw output of a detector: attributes, possibly pending, and entities.
#[derive(Debug, Default)]
pub struct DetectedResource {
    attributes: Vec<(Key, MaybePending)>,
    entities: Vec<DetectedEntity>,
}

impl DetectedResource {
    /// An empty detection result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an attribute. A repeated key replaces the earlier value.
    pub fn with_attribute(mut self, kv: KeyValue) -> Self {
        upsert(&mut self.attributes, kv.key, kv.value.into());
        self
    }

    /// Adds attributes. A repeated key replaces the earlier value.
    pub fn with_attributes<I: IntoIterator<Item = KeyValue>>(self, attributes: I) -> Self {
        attributes
            .into_iter()
            .fold(self, |detected, kv| detected.with_attribute(kv))
    }

    /// Adds an attribute whose value is produced by `future`.
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

    /// Adds an entity.
    pub fn with_entity(mut self, entity: DetectedEntity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Adds entities, keeping their order.
    pub fn with_entities<I: IntoIterator<Item = DetectedEntity>>(mut self, entities: I) -> Self {
        self.entities.extend(entities);
        self
    }

    /// True when neither attributes nor entities were detected.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.entities.is_empty()
    }
}

/// Builds a [`Resource`] on top of a base resource.
///
/// Attributes and entities added to the builder take precedence over the
/// base.
#[derive(Debug)]
pub struct ResourceBuilder {
    base: Resource,
    detected: DetectedResource,
}

impl ResourceBuilder {
    /// Adds an attribute. A repeated key replaces the earlier value.
    pub fn with_attribute(mut self, kv: KeyValue) -> Self {
        self.detected = self.detected.with_attribute(kv);
        self
    }

    /// Adds attributes. A repeated key replaces the earlier value.
    pub fn with_attributes<I: IntoIterator<Item = KeyValue>>(mut self, attributes: I) -> Self {
        self.detected = self.detected.with_attributes(attributes);
        self
    }

    /// Adds an attribute whose value is produced by `future`.
    pub fn with_async_attribute<F, E>(mut self, key: impl Into<Key>, future: F) -> Self
    where
        F: Future<Output = Result<Value, E>> + Send + 'static,
        E: fmt::Display,
    {
        self.detected = self.detected.with_async_attribute(key, future);
        self
    }

    /// Adds an entity.
    pub fn with_entity(mut self, entity: DetectedEntity) -> Self {
        self.detected = self.detected.with_entity(entity);
        self
    }

    /// Sets `service.name`.
    pub fn with_service_name(self, name: impl Into<Value>) -> Self {
        self.with_attribute(KeyValue::new(
            opentelemetry_semantic_conventions::attribute::SERVICE_NAME,
            name.into(),
        ))
    }

    /// Builds the resource, merged over the base.
    pub fn build(self) -> Resource {
        Resource::from_detected(self.detected).merge(&self.base)
    }
}

/// An immutable description of the entity producing telemetry.
///
/// Cloning is cheap; clones share state, including settlement of pending
/// attributes.
#[derive(Clone)]
pub struct Resource {
    inner: Arc<ResourceInner>,
}

struct ResourceInner {
    attributes: Vec<(Key, MaybePending)>,
    entities: Vec<Entity>,
    entity_refs: Vec<EntityRef>,
    settled: OnceLock<HashMap<Key, Value>>,
    settling: OnceLock<Shared<BoxFuture<'static, ()>>>,
}

impl Resource {
    /// A resource with no attributes and no entities.
    pub fn empty() -> Self {
        Self::from_parts(Vec::new(), Vec::new())
    }

    /// A builder whose base is the default resource of a fresh
    /// [`ServiceDefaults`].
    ///
    /// Each call derives the default service name from the executable again.
    /// Use [`Resource::builder_with_defaults`] to reuse the process defaults.
    pub fn builder() -> ResourceBuilder {
        Self::builder_with_defaults(&ServiceDefaults::new())
    }

    /// A builder whose base is the default resource of `defaults`.
    pub fn builder_with_defaults(defaults: &ServiceDefaults) -> ResourceBuilder {
        ResourceBuilder {
            base: default_resource(defaults),
            detected: DetectedResource::new(),
        }
    }

    /// A builder with an empty base.
    pub fn builder_empty() -> ResourceBuilder {
        ResourceBuilder {
            base: Resource::empty(),
            detected: DetectedResource::new(),
        }
    }

    /// Creates a resource from known attribute values. A repeated key
    /// replaces the earlier value.
    pub fn from_attributes<I: IntoIterator<Item = KeyValue>>(attributes: I) -> Self {
        Self::from_detected(DetectedResource::new().with_attributes(attributes))
    }

    /// Creates a resource from a detection result.
    pub fn from_detected(detected: DetectedResource) -> Self {
        let entities = detected
            .entities
            .into_iter()
            .map(Entity::from_detected)
            .collect();
        Self::from_parts(detected.attributes, entities)
    }

    fn from_parts(attributes: Vec<(Key, MaybePending)>, entities: Vec<Entity>) -> Self {
        let entity_refs = entities.iter().map(Entity::entity_ref).collect();
        Resource {
            inner: Arc::new(ResourceInner {
                attributes,
                entities,
                entity_refs,
                settled: OnceLock::new(),
                settling: OnceLock::new(),
            }),
        }
    }

    /// Merges `other` into a new resource. `self` wins on conflicts.
    ///
    /// Raw attributes of `self` are placed before those of `other`, so the
    /// first-writer-wins flattening prefers `self`; a pending value of `self`
    /// hides the matching value of `other` once it settles. Entities of
    /// `self` are merged as the higher-priority list. Merging with `None`
    /// returns `self`.
    pub fn merge<'a>(&self, other: impl Into<Option<&'a Resource>>) -> Self {
        let Some(other) = other.into() else {
            return self.clone();
        };

        let mut attributes =
            Vec::with_capacity(self.inner.attributes.len() + other.inner.attributes.len());
        attributes.extend(self.inner.attributes.iter().cloned());
        attributes.extend(other.inner.attributes.iter().cloned());

        let entities = merge_entities([self.entities(), other.entities()]);

        Self::from_parts(attributes, entities)
    }

    /// The flattened attribute map.
    ///
    /// While attributes are still pending this returns what has settled so
    /// far and logs an error-level diagnostic.
    pub fn attributes(&self) -> HashMap<Key, Value> {
        if let Some(settled) = self.inner.settled.get() {
            return settled.clone();
        }

        let pending = self.async_attributes_pending();
        if pending {
            otel_error!(
                name: "Resource.AttributesAccessedBeforeSettled",
                message = "Accessing resource attributes before async attributes settled"
            );
        }

        let attributes = self.flatten();
        if pending || self.async_attributes_pending() {
            attributes
        } else {
            self.inner.settled.get_or_init(|| attributes).clone()
        }
    }

    /// Looks up one flattened attribute.
    pub fn get(&self, key: &Key) -> Option<Value> {
        match self.inner.settled.get() {
            Some(settled) => settled.get(key).cloned(),
            None => self.attributes().remove(key),
        }
    }

    /// Number of flattened attributes.
    pub fn len(&self) -> usize {
        match self.inner.settled.get() {
            Some(settled) => settled.len(),
            None => self.attributes().len(),
        }
    }

    /// True when the flattened view has no attributes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True while any raw attribute or entity attribute is still pending.
    pub fn async_attributes_pending(&self) -> bool {
        self.inner.settled.get().is_none()
            && (self
                .inner
                .attributes
                .iter()
                .any(|(_, value)| value.is_pending())
                || self
                    .inner
                    .entities
                    .iter()
                    .any(Entity::async_attributes_pending))
    }

    /// Waits until every raw attribute and every entity has settled.
    ///
    /// Concurrent callers share one resolution, and the flattened map is
    /// cached once it completes. A pending value that never completes
    /// keeps this future pending forever.
    pub async fn wait_for_async_attributes(&self) {
        if self.inner.settled.get().is_some() {
            return;
        }

        let settling = self
            .inner
            .settling
            .get_or_init(|| {
                let attributes = self.inner.attributes.clone();
                let entities = self.inner.entities.clone();
                async move {
                    let entities_settled =
                        join_all(entities.iter().map(|entity| entity.wait_for_async_attributes()));
                    join(resolve_all(&attributes), entities_settled).await;
                }
                .boxed()
                .shared()
            })
            .clone();
        settling.await;

        let attributes = self.flatten();
        let _ = self.inner.settled.set(attributes);
    }

    /// The entities, highest priority first.
    pub fn entities(&self) -> &[Entity] {
        &self.inner.entities
    }

    /// The shapes of the entities, captured when this resource was built.
    pub fn entity_refs(&self) -> &[EntityRef] {
        &self.inner.entity_refs
    }

    /// The raw attribute slots, highest priority first.
    pub fn iter_raw(&self) -> impl Iterator<Item = (&Key, &MaybePending)> {
        self.inner.attributes.iter().map(|(key, value)| (key, value))
    }

    fn flatten(&self) -> HashMap<Key, Value> {
        let mut attributes = HashMap::new();

        for entity in &self.inner.entities {
            for kv in entity.identifier() {
                attributes.insert(kv.key.clone(), kv.value.clone());
            }
            for (key, value) in entity.attributes() {
                attributes.entry(key).or_insert(value);
            }
        }

        for (key, value) in &self.inner.attributes {
            match value.current() {
                Current::Value(value) => {
                    attributes
                        .entry(key.clone())
                        .or_insert_with(|| value.clone());
                }
                Current::Absent => {}
                Current::Pending => {
                    otel_debug!(
                        name: "Resource.PendingAttributeSkipped",
                        key = key.as_str()
                    );
                }
            }
        }

        attributes
    }
}

impl Default for Resource {
    fn default() -> Self {
        Resource::empty()
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("attributes", &self.inner.attributes)
            .field("entities", &self.inner.entities)
            .field("settled", &self.inner.settled.get().is_some())
            .finish()
    }
}
