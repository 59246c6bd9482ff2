//! Kind registry.
//!
//! A [`Scheme`] maps the `kind` string of a document to a factory for the
//! matching record type. It is built once, then shared by reference with the
//! decoders and dispatch client.
//!
//! ```
//! use dpservice::api::{Interface, Route};
//! use dpservice::Scheme;
//!
//! let mut scheme = Scheme::new();
//! scheme.register::<Interface>().unwrap();
//! scheme.register::<Route>().unwrap();
//!
//! let object = scheme.new_by_kind("Route").unwrap();
//! assert_eq!(scheme.kind_of(&object).unwrap(), "Route");
//! assert!(scheme.new_by_kind("Gadget").is_err());
//! ```

use std::collections::HashMap;

use crate::api::{
    FirewallRule, Interface, LoadBalancer, LoadBalancerPrefix, LoadBalancerTarget, Nat,
    NeighborNat, Object, Prefix, Record, Route, VirtualIp,
};
use crate::{Error, Result};

type Factory = fn() -> Object;

fn new_record<T: Record>() -> Object {
    T::default().into()
}

/// Registry of record kinds.
#[derive(Debug, Clone, Default)]
pub struct Scheme {
    factories: HashMap<&'static str, Factory>,
}

impl Scheme {
    /// Create an empty scheme.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scheme with every record kind registered.
    pub fn with_defaults() -> Self {
        let mut scheme = Self::new();
        scheme.add_defaults();
        scheme
    }

    fn add_defaults(&mut self) {
        // Each type is registered once into an empty map, so this cannot collide.
        let _ = self.register::<Interface>();
        let _ = self.register::<Prefix>();
        let _ = self.register::<Route>();
        let _ = self.register::<VirtualIp>();
        let _ = self.register::<Nat>();
        let _ = self.register::<NeighborNat>();
        let _ = self.register::<LoadBalancer>();
        let _ = self.register::<LoadBalancerTarget>();
        let _ = self.register::<LoadBalancerPrefix>();
        let _ = self.register::<FirewallRule>();
    }

    /// Register a record type under its kind.
    ///
    /// Fails if the kind (and therefore the type) is already registered.
    pub fn register<T: Record>(&mut self) -> Result<()> {
        if self.factories.contains_key(T::KIND) {
            return Err(Error::DuplicateKind {
                kind: T::KIND.to_string(),
            });
        }
        self.factories.insert(T::KIND, new_record::<T>);
        Ok(())
    }

    /// Returns true if `kind` is registered.
    pub fn is_registered(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Kind of a record, provided its type is registered in this scheme.
    pub fn kind_of(&self, object: &Object) -> Result<&'static str> {
        let kind = object.kind();
        if self.is_registered(kind) {
            Ok(kind)
        } else {
            Err(Error::UnregisteredKind {
                kind: kind.to_string(),
            })
        }
    }

    /// Fresh default-valued record of the type registered under `kind`.
    pub fn new_by_kind(&self, kind: &str) -> Result<Object> {
        self.factories
            .get(kind)
            .map(|factory| factory())
            .ok_or_else(|| Error::UnknownKind {
                kind: kind.to_string(),
            })
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.factories.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }
}
