//! Phase one: the mutable registry converters register into

use super::descriptor::ResourceDescriptor;
use super::resolve::FrozenRegistry;
use super::ExportWarning;
use crate::domain::ResourceKind;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

pub(crate) type Key = (ResourceKind, String);

enum Slot {
    /// Claimed by a conversion that has not finished yet
    Pending,
    /// Visited, but nothing is exported for it (absent, excluded or unsupported)
    Skipped,
    Registered(Arc<ResourceDescriptor>),
}

#[derive(Default)]
struct Inner {
    slots: HashMap<Key, Slot>,
    order: Vec<Key>,
    warnings: Vec<ExportWarning>,
    frozen: bool,
}

/// Concurrency-safe directory of descriptors, keyed by `(kind, source id)`
///
/// Every key moves through `unvisited -> pending -> registered` at most once per run. The
/// pending state is held by a [`Claim`]; [`ResourceRegistry::claim`] is the atomic
/// check-and-insert that guarantees a single conversion per key even when concurrent
/// exports reach the same entity, and that stops recursion on reference cycles.
///
/// No lock is held across an `.await`: every method takes the mutex for a single map
/// operation.
#[derive(Default)]
pub struct ResourceRegistry {
    inner: Mutex<Inner>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reserves a key for conversion
    ///
    /// Returns `None` when the key is already pending, registered or skipped, in which case
    /// the caller must not fetch or convert the entity.
    pub fn claim(&self, kind: ResourceKind, source_id: &str) -> Option<Claim<'_>> {
        let mut inner = self.lock();
        if inner.frozen {
            tracing::warn!(kind = %kind, id = %source_id, "Claim after registry was frozen");
            return None;
        }

        let key = (kind, source_id.to_string());
        if inner.slots.contains_key(&key) {
            tracing::trace!(kind = %kind, id = %source_id, "Already visited");
            return None;
        }
        inner.slots.insert(key.clone(), Slot::Pending);
        drop(inner);

        Some(Claim {
            registry: self,
            key,
            settled: false,
        })
    }

    /// Stores a descriptor for an unclaimed key
    ///
    /// Returns `false`, leaving the registry unchanged, if the key has already been visited.
    pub fn register(&self, descriptor: ResourceDescriptor) -> bool {
        let key = (descriptor.kind, descriptor.source_id.clone());
        let mut inner = self.lock();
        if inner.frozen || inner.slots.contains_key(&key) {
            tracing::debug!(
                kind = %key.0,
                id = %key.1,
                "Ignoring duplicate registration"
            );
            return false;
        }
        inner
            .slots
            .insert(key.clone(), Slot::Registered(Arc::new(descriptor)));
        inner.order.push(key);
        true
    }

    /// Whether a descriptor has been registered for the key
    pub fn contains(&self, kind: ResourceKind, source_id: &str) -> bool {
        matches!(
            self.lock().slots.get(&(kind, source_id.to_string())),
            Some(Slot::Registered(_))
        )
    }

    /// Lookup expression of a registered entity
    ///
    /// Phase one only needs this to decide whether an id embedded in free text refers to
    /// something already exported; rendering goes through [`FrozenRegistry`].
    pub fn lookup(&self, kind: ResourceKind, source_id: &str) -> Option<String> {
        match self.lock().slots.get(&(kind, source_id.to_string())) {
            Some(Slot::Registered(descriptor)) => Some(descriptor.lookup.clone()),
            _ => None,
        }
    }

    /// Number of registered descriptors
    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records a non-fatal problem for the export summary
    pub fn warn(&self, warning: ExportWarning) {
        tracing::warn!(warning = %warning, "Export warning");
        self.lock().warnings.push(warning);
    }

    /// Ends registration and hands the descriptors to the render phase
    ///
    /// Claims still pending (a conversion that never finished) are discarded with a warning.
    /// Later claims and registrations are refused.
    pub fn freeze(&self) -> FrozenRegistry {
        let mut inner = self.lock();
        inner.frozen = true;

        let slots = std::mem::take(&mut inner.slots);
        let order = std::mem::take(&mut inner.order);
        let warnings = std::mem::take(&mut inner.warnings);
        drop(inner);

        let mut registered = HashMap::with_capacity(order.len());
        let mut skipped = HashSet::new();
        for (key, slot) in slots {
            match slot {
                Slot::Registered(descriptor) => {
                    registered.insert(key, descriptor);
                }
                Slot::Skipped => {
                    skipped.insert(key);
                }
                Slot::Pending => {
                    tracing::warn!(kind = %key.0, id = %key.1, "Discarding unfinished claim");
                }
            }
        }

        let ordered = order
            .iter()
            .filter_map(|key| registered.get(key).cloned())
            .collect();

        FrozenRegistry::new(ordered, skipped, warnings)
    }

    fn settle(&self, key: &Key, slot: Option<Slot>) {
        let mut inner = self.lock();
        if inner.frozen {
            if slot.is_some() {
                tracing::warn!(kind = %key.0, id = %key.1, "Settling claim after freeze ignored");
            }
            return;
        }
        match slot {
            Some(Slot::Registered(descriptor)) => {
                inner
                    .slots
                    .insert(key.clone(), Slot::Registered(descriptor));
                inner.order.push(key.clone());
            }
            Some(other) => {
                inner.slots.insert(key.clone(), other);
            }
            None => {
                if matches!(inner.slots.get(key), Some(Slot::Pending)) {
                    inner.slots.remove(key);
                }
            }
        }
    }
}

/// Exclusive right to convert one key
///
/// Consumed by [`Claim::register`] or [`Claim::skip`]. Dropping an unsettled claim (for
/// example when a fetch fails) releases the key so it may be claimed again.
#[must_use = "a claim releases its key when dropped"]
pub struct Claim<'a> {
    registry: &'a ResourceRegistry,
    key: Key,
    settled: bool,
}

impl Claim<'_> {
    pub fn kind(&self) -> ResourceKind {
        self.key.0
    }

    pub fn source_id(&self) -> &str {
        &self.key.1
    }

    /// Stores the descriptor for the claimed key
    ///
    /// # Errors
    ///
    /// Returns a registry error if the descriptor's key differs from the claimed one.
    pub fn register(mut self, descriptor: ResourceDescriptor) -> crate::domain::Result<()> {
        if descriptor.kind != self.key.0 || descriptor.source_id != self.key.1 {
            return Err(crate::domain::OctoformError::Registry(format!(
                "Claim for {} '{}' cannot register {} '{}'",
                self.key.0, self.key.1, descriptor.kind, descriptor.source_id
            )));
        }
        self.settled = true;
        self.registry
            .settle(&self.key, Some(Slot::Registered(Arc::new(descriptor))));
        Ok(())
    }

    /// Marks the key visited without exporting anything for it
    pub fn skip(mut self) {
        self.settled = true;
        self.registry.settle(&self.key, Some(Slot::Skipped));
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::debug!(kind = %self.key.0, id = %self.key.1, "Releasing unsettled claim");
            self.registry.settle(&self.key, None);
        }
    }
}
