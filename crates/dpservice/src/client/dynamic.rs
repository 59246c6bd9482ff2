//! Dispatch of arbitrary objects to typed dataplane calls.
//!
//! # Example
//!
//! ```ignore
//! use dpservice::client::{ApplyOptions, DynamicClient, GrpcClient, Operation};
//! use dpservice::sources::Sources;
//! use dpservice::Scheme;
//!
//! let scheme = Scheme::with_defaults();
//! let grpc = GrpcClient::connect("localhost:1337", Duration::from_secs(4)).await?;
//! let mut client = DynamicClient::new(grpc, &scheme);
//!
//! let mut sources = Sources::new(["objects/"]);
//! while let Some(source) = sources.next_source()? {
//!     let result = client
//!         .apply(Operation::Delete, source.objects(&scheme), ApplyOptions::default())
//!         .await?;
//!     for err in &result.errors {
//!         eprintln!("{err}");
//!     }
//! }
//! ```

use tracing::{debug, info, warn};

use super::DataplaneApi;
use crate::api::Object;
use crate::scheme::Scheme;
use crate::{Error, Result};

/// What to do with each object of a bulk run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Delete,
}

impl Operation {
    /// Imperative form, used in error context.
    pub fn verb(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Delete => "delete",
        }
    }

    /// Past tense, used when reporting success.
    pub fn past_tense(&self) -> &'static str {
        match self {
            Operation::Create => "added",
            Operation::Delete => "deleted",
        }
    }
}

/// Options for bulk runs.
#[derive(Debug, Clone, Copy)]
pub struct ApplyOptions {
    /// Decode and validate objects without calling the service.
    pub dry_run: bool,
    /// Skip objects the service rejects instead of aborting the run.
    pub continue_on_error: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            continue_on_error: true,
        }
    }
}

/// Result of a bulk run.
#[derive(Debug, Default)]
pub struct ApplyResult {
    /// Objects as returned by the service, in input order.
    pub applied: Vec<Object>,
    /// Objects the service rejected.
    pub errors: Vec<ApplyError>,
    /// Summary of what was done.
    pub summary: Vec<String>,
}

impl ApplyResult {
    /// Check if every object was applied.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of objects attempted.
    pub fn attempted(&self) -> usize {
        self.applied.len() + self.errors.len()
    }

    /// Get a human-readable summary.
    pub fn summary_text(&self) -> String {
        if self.summary.is_empty() {
            "No changes made".to_string()
        } else {
            self.summary.join("\n")
        }
    }

    /// Fold another run into this one.
    pub fn merge(&mut self, other: ApplyResult) {
        self.applied.extend(other.applied);
        self.errors.extend(other.errors);
        self.summary.extend(other.summary);
    }

    /// Error describing the failed objects, if any.
    pub fn to_error(&self) -> Option<Error> {
        if self.errors.is_empty() {
            return None;
        }
        Some(Error::Partial {
            failed: self.errors.len(),
            total: self.attempted(),
            server: self.errors.iter().all(|e| e.error.is_server_error()),
        })
    }
}

/// An object that failed during a bulk run.
#[derive(Debug)]
pub struct ApplyError {
    /// What operation was being performed.
    pub operation: String,
    /// The underlying error.
    pub error: Error,
}

impl std::fmt::Display for ApplyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.operation, self.error)
    }
}

/// Sends arbitrary objects to the matching [`DataplaneApi`] call.
///
/// Only objects whose kind is registered in the client's scheme are
/// dispatched; anything else is an [`Error::UnsupportedObject`].
#[derive(Debug)]
pub struct DynamicClient<'s, C> {
    client: C,
    scheme: &'s Scheme,
}

impl<'s, C: DataplaneApi> DynamicClient<'s, C> {
    /// Wrap a typed client.
    pub fn new(client: C, scheme: &'s Scheme) -> Self {
        Self { client, scheme }
    }

    /// The typed client, for calls that are not object based.
    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// The scheme objects are checked against.
    pub fn scheme(&self) -> &'s Scheme {
        self.scheme
    }

    /// Unwrap the typed client.
    pub fn into_inner(self) -> C {
        self.client
    }

    /// Display identity of `object`, empty if its kind is not registered.
    pub fn object_key(&self, object: &Object) -> String {
        match self.scheme.kind_of(object) {
            Ok(_) => object.key(),
            Err(_) => String::new(),
        }
    }

    fn ensure_supported(&self, object: &Object) -> Result<()> {
        self.scheme
            .kind_of(object)
            .map(|_| ())
            .map_err(|_| Error::UnsupportedObject {
                kind: object.kind().to_string(),
            })
    }

    /// Create `object` and return it as stored by the service.
    pub async fn create(&mut self, object: &Object) -> Result<Object> {
        self.ensure_supported(object)?;
        debug!(kind = object.kind(), key = %object.key(), "creating object");

        let created = match object {
            Object::Interface(iface) => self.client.create_interface(iface).await?.into(),
            Object::Prefix(prefix) => self.client.create_prefix(prefix).await?.into(),
            Object::Route(route) => self.client.create_route(route).await?.into(),
            Object::VirtualIp(vip) => self.client.create_virtual_ip(vip).await?.into(),
            Object::Nat(nat) => self.client.create_nat(nat).await?.into(),
            Object::NeighborNat(nat) => self.client.create_neighbor_nat(nat).await?.into(),
            Object::LoadBalancer(lb) => self.client.create_load_balancer(lb).await?.into(),
            Object::LoadBalancerTarget(target) => {
                self.client.create_load_balancer_target(target).await?.into()
            }
            Object::LoadBalancerPrefix(prefix) => {
                self.client.create_load_balancer_prefix(prefix).await?.into()
            }
            Object::FirewallRule(rule) => self.client.create_firewall_rule(rule).await?.into(),
        };
        Ok(created)
    }

    /// Delete the service state identified by `object`.
    pub async fn delete(&mut self, object: &Object) -> Result<()> {
        self.ensure_supported(object)?;
        debug!(kind = object.kind(), key = %object.key(), "deleting object");

        match object {
            Object::Interface(iface) => self.client.delete_interface(&iface.metadata.id).await,
            Object::Prefix(prefix) => {
                self.client
                    .delete_prefix(&prefix.metadata.interface_id, &prefix.spec.prefix)
                    .await
            }
            Object::Route(route) => self.client.delete_route(route).await,
            Object::VirtualIp(vip) => {
                self.client
                    .delete_virtual_ip(&vip.metadata.interface_id)
                    .await
            }
            Object::Nat(nat) => self.client.delete_nat(&nat.metadata.interface_id).await,
            Object::NeighborNat(nat) => self.client.delete_neighbor_nat(nat).await,
            Object::LoadBalancer(lb) => self.client.delete_load_balancer(&lb.metadata.id).await,
            Object::LoadBalancerTarget(target) => {
                self.client
                    .delete_load_balancer_target(
                        &target.metadata.load_balancer_id,
                        target.spec.target_ip,
                    )
                    .await
            }
            Object::LoadBalancerPrefix(prefix) => {
                self.client
                    .delete_load_balancer_prefix(&prefix.metadata.interface_id, &prefix.spec.prefix)
                    .await
            }
            Object::FirewallRule(rule) => {
                self.client
                    .delete_firewall_rule(&rule.metadata.interface_id, &rule.metadata.rule_id)
                    .await
            }
        }
    }

    /// Apply `operation` to every object in order.
    ///
    /// Errors yielded by `objects` (decode and source errors) abort the run.
    /// With `continue_on_error`, objects the service rejects are recorded in
    /// [`ApplyResult::errors`] and the run continues; transport failures and
    /// unsupported objects still abort.
    pub async fn apply<I>(
        &mut self,
        operation: Operation,
        objects: I,
        options: ApplyOptions,
    ) -> Result<ApplyResult>
    where
        I: IntoIterator<Item = Result<Object>>,
    {
        let mut result = ApplyResult::default();

        for object in objects {
            let object = object?;
            let op = format!("{} {}", operation.verb(), object.name());

            if options.dry_run {
                result.summary.push(format!("Would {op}"));
                result.applied.push(object);
                continue;
            }

            let outcome = match operation {
                Operation::Create => self.create(&object).await,
                Operation::Delete => self.delete(&object).await.map(|()| object),
            };
            match outcome {
                Ok(applied) => {
                    info!(operation = %op, "applied");
                    result
                        .summary
                        .push(format!("{} {}", applied.name(), operation.past_tense()));
                    result.applied.push(applied);
                }
                Err(e) if options.continue_on_error && e.is_per_record() => {
                    warn!(operation = %op, error = %e, "skipping object");
                    result.errors.push(ApplyError {
                        operation: op,
                        error: e,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(result)
    }

    /// Create every object, skipping the ones the service rejects.
    pub async fn create_all<I>(&mut self, objects: I) -> Result<ApplyResult>
    where
        I: IntoIterator<Item = Result<Object>>,
    {
        self.apply(Operation::Create, objects, ApplyOptions::default())
            .await
    }

    /// Delete every object, skipping the ones the service rejects.
    pub async fn delete_all<I>(&mut self, objects: I) -> Result<ApplyResult>
    where
        I: IntoIterator<Item = Result<Object>>,
    {
        self.apply(Operation::Delete, objects, ApplyOptions::default())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_result_error() {
        let mut result = ApplyResult::default();
        assert!(result.is_success());
        assert!(result.to_error().is_none());

        result.applied.push(crate::api::Interface::default().into());
        result.errors.push(ApplyError {
            operation: "delete interface/vm2".into(),
            error: Error::Server {
                code: 202,
                message: "not found".into(),
            },
        });

        let err = result.to_error().unwrap();
        assert_eq!(err.to_string(), "1 of 2 objects failed");
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            result.errors[0].to_string(),
            "delete interface/vm2: server error: not found (code 202)"
        );
    }

    #[test]
    fn test_operation_words() {
        assert_eq!(Operation::Create.verb(), "create");
        assert_eq!(Operation::Create.past_tense(), "added");
        assert_eq!(Operation::Delete.past_tense(), "deleted");
    }
}
