//! Record types and the [`Object`] sum type.
//!
//! Every record serializes as a self-describing document:
//!
//! ```yaml
//! kind: Interface
//! metadata:
//!   id: vm1
//! spec:
//!   vni: 100
//!   primaryIpv4: 10.0.0.1
//! ```
//!
//! The `kind` field selects the concrete type through a
//! [`Scheme`](crate::scheme::Scheme); `metadata` holds the identity the
//! dataplane addresses the record by and `spec` the desired configuration.
//! `status` is only present on records that carry a service status.

mod types;

pub use types::*;

use std::io::Read;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::decoder::Decoder;
use crate::{Error, Result};

/// Minimal view of a document used to learn its kind before decoding it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TypeMeta {
    /// The document's kind, empty if the field is absent.
    #[serde(default)]
    pub kind: String,
}

/// Status embedded in dataplane responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
    /// Zero on success.
    pub code: u32,
    /// Human-readable message.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl Status {
    /// Returns true if neither a code nor a message is set.
    pub fn is_empty(&self) -> bool {
        self.code == 0 && self.message.is_empty()
    }
}

/// A concrete record type that can be decoded by kind and sent to the dataplane.
///
/// Each type carries exactly one kind constant, so registering a type twice
/// in a scheme is the same as registering its kind twice.
pub trait Record:
    Default + Clone + std::fmt::Debug + Serialize + DeserializeOwned + Into<Object>
{
    /// The `kind` string identifying this type in documents.
    const KIND: &'static str;

    /// Display identity of this record. Never used for lookups.
    fn key(&self) -> String;
}

/// Defines a record struct with the common `kind`/`metadata`/`spec`/`status`
/// layout, its `Default` (with `kind` filled in) and a `new` constructor.
macro_rules! record {
    (
        $(#[$attr:meta])*
        $name:ident { metadata: $meta:ty, spec: $spec:ty $(,)? }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            /// Always equal to the type's kind constant.
            #[serde(default)]
            pub kind: String,
            /// Identity of the record.
            #[serde(default)]
            pub metadata: $meta,
            /// Desired configuration.
            #[serde(default)]
            pub spec: $spec,
            /// Status reported by the service, if any.
            #[serde(default, skip_serializing_if = "Status::is_empty")]
            pub status: Status,
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new(<$meta>::default(), <$spec>::default())
            }
        }

        impl $name {
            /// Create a record with the given identity and configuration.
            pub fn new(metadata: $meta, spec: $spec) -> Self {
                Self {
                    kind: <$name as Record>::KIND.to_string(),
                    metadata,
                    spec,
                    status: Status::default(),
                }
            }
        }
    };
}

pub(crate) use record;

/// Defines the [`Object`] enum over every record type.
macro_rules! objects {
    ($($variant:ident),+ $(,)?) => {
        /// Any record produced by the kind decoder.
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(untagged)]
        pub enum Object {
            $(
                #[allow(missing_docs)]
                $variant($variant),
            )+
        }

        impl Object {
            /// Kinds of every record type, in declaration order.
            pub const KINDS: &'static [&'static str] = &[$(<$variant as Record>::KIND),+];

            /// The kind constant of the wrapped record's type.
            pub fn kind(&self) -> &'static str {
                match self {
                    $(Object::$variant(_) => <$variant as Record>::KIND,)+
                }
            }

            /// Display identity of the wrapped record.
            pub fn key(&self) -> String {
                match self {
                    $(Object::$variant(record) => record.key(),)+
                }
            }

            /// Status reported by the service for the wrapped record.
            pub fn status(&self) -> &Status {
                match self {
                    $(Object::$variant(record) => &record.status,)+
                }
            }

            /// Decode the next document into the wrapped record.
            pub(crate) fn decode_from<R: Read>(&mut self, decoder: &mut Decoder<R>) -> Result<()> {
                match self {
                    $(
                        Object::$variant(record) => {
                            *record = decoder.decode()?.ok_or(Error::UnexpectedEof {
                                kind: <$variant as Record>::KIND,
                            })?;
                        }
                    )+
                }
                Ok(())
            }
        }

        $(
            impl From<$variant> for Object {
                fn from(record: $variant) -> Self {
                    Object::$variant(record)
                }
            }
        )+
    };
}

objects!(
    Interface,
    Prefix,
    Route,
    VirtualIp,
    Nat,
    NeighborNat,
    LoadBalancer,
    LoadBalancerTarget,
    LoadBalancerPrefix,
    FirewallRule,
);

impl Object {
    /// `kind/key` with the kind lowercased, e.g. `interface/vm1`.
    pub fn name(&self) -> String {
        format!("{}/{}", self.kind().to_ascii_lowercase(), self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_carries_kind() {
        assert_eq!(Interface::default().kind, "Interface");
        assert_eq!(VirtualIp::default().kind, "VirtualIP");
        assert_eq!(FirewallRule::default().kind, "FirewallRule");
    }

    #[test]
    fn test_object_kind_matches_record() {
        let object: Object = Route::default().into();
        assert_eq!(object.kind(), Route::KIND);
        assert_eq!(Object::KINDS.len(), 10);
    }

    #[test]
    fn test_object_name() {
        let mut vip = VirtualIp::default();
        vip.metadata.interface_id = "vm1".into();
        assert_eq!(Object::from(vip).name(), "virtualip/vm1");
    }

    #[test]
    fn test_status_skipped_when_empty() {
        let json = serde_json::to_value(Interface::default()).unwrap();
        assert!(json.get("status").is_none());
        assert_eq!(json["kind"], "Interface");
    }

    #[test]
    fn test_type_meta_ignores_other_fields() {
        let meta: TypeMeta =
            serde_json::from_str(r#"{"kind":"Route","metadata":{"vni":7},"spec":{}}"#).unwrap();
        assert_eq!(meta.kind, "Route");

        let missing: TypeMeta = serde_json::from_str(r#"{"metadata":{}}"#).unwrap();
        assert_eq!(missing.kind, "");
    }
}
