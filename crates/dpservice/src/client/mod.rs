//! Dataplane API clients.
//!
//! [`DataplaneApi`] is the typed surface of the service, one method per RPC,
//! speaking in records from [`crate::api`]. [`GrpcClient`] implements it over
//! tonic. [`DynamicClient`] sits on top and dispatches arbitrary decoded
//! [`Object`](crate::Object)s to the matching method.

mod convert;
mod dynamic;
mod grpc;

pub use dynamic::{ApplyError, ApplyOptions, ApplyResult, DynamicClient, Operation};
pub use grpc::{DEFAULT_ADDRESS, DEFAULT_CONNECT_TIMEOUT, GrpcClient};

use std::net::IpAddr;

use ipnet::IpNet;

use crate::Result;
use crate::api::{
    FirewallRule, Init, Interface, LoadBalancer, LoadBalancerPrefix, LoadBalancerTarget, Nat,
    NeighborNat, Prefix, Route, Version, VirtualIp,
};

/// Typed operations of the dataplane service.
///
/// Create methods return the record as stored by the service, including
/// fields it assigns (underlay routes, virtual functions, rule IDs).
/// A non-zero status in a response is returned as
/// [`Error::ServerWithContext`](crate::Error::ServerWithContext).
#[allow(async_fn_in_trait)]
pub trait DataplaneApi {
    // Service
    async fn check_initialized(&mut self) -> Result<Init>;
    async fn initialize(&mut self) -> Result<Init>;
    async fn get_version(&mut self) -> Result<Version>;

    // Interfaces
    async fn list_interfaces(&mut self) -> Result<Vec<Interface>>;
    async fn get_interface(&mut self, id: &str) -> Result<Interface>;
    async fn create_interface(&mut self, iface: &Interface) -> Result<Interface>;
    async fn delete_interface(&mut self, id: &str) -> Result<()>;

    // Prefixes
    async fn list_prefixes(&mut self, interface_id: &str) -> Result<Vec<Prefix>>;
    async fn create_prefix(&mut self, prefix: &Prefix) -> Result<Prefix>;
    async fn delete_prefix(&mut self, interface_id: &str, prefix: &IpNet) -> Result<()>;

    // Load balancer prefixes
    async fn list_load_balancer_prefixes(
        &mut self,
        interface_id: &str,
    ) -> Result<Vec<LoadBalancerPrefix>>;
    async fn create_load_balancer_prefix(
        &mut self,
        prefix: &LoadBalancerPrefix,
    ) -> Result<LoadBalancerPrefix>;
    async fn delete_load_balancer_prefix(&mut self, interface_id: &str, prefix: &IpNet)
    -> Result<()>;

    // Virtual IPs
    async fn get_virtual_ip(&mut self, interface_id: &str) -> Result<VirtualIp>;
    async fn create_virtual_ip(&mut self, vip: &VirtualIp) -> Result<VirtualIp>;
    async fn delete_virtual_ip(&mut self, interface_id: &str) -> Result<()>;

    // Routes
    async fn list_routes(&mut self, vni: u32) -> Result<Vec<Route>>;
    async fn create_route(&mut self, route: &Route) -> Result<Route>;
    async fn delete_route(&mut self, route: &Route) -> Result<()>;

    // NAT
    async fn get_nat(&mut self, interface_id: &str) -> Result<Nat>;
    async fn create_nat(&mut self, nat: &Nat) -> Result<Nat>;
    async fn delete_nat(&mut self, interface_id: &str) -> Result<()>;

    // Neighbor NAT
    async fn list_neighbor_nats(&mut self, nat_ip: IpAddr) -> Result<Vec<NeighborNat>>;
    async fn create_neighbor_nat(&mut self, nat: &NeighborNat) -> Result<NeighborNat>;
    async fn delete_neighbor_nat(&mut self, nat: &NeighborNat) -> Result<()>;

    // Load balancers
    async fn get_load_balancer(&mut self, id: &str) -> Result<LoadBalancer>;
    async fn create_load_balancer(&mut self, lb: &LoadBalancer) -> Result<LoadBalancer>;
    async fn delete_load_balancer(&mut self, id: &str) -> Result<()>;

    // Load balancer targets
    async fn list_load_balancer_targets(&mut self, lb_id: &str)
    -> Result<Vec<LoadBalancerTarget>>;
    async fn create_load_balancer_target(
        &mut self,
        target: &LoadBalancerTarget,
    ) -> Result<LoadBalancerTarget>;
    async fn delete_load_balancer_target(&mut self, lb_id: &str, target_ip: IpAddr)
    -> Result<()>;

    // Firewall rules
    async fn list_firewall_rules(&mut self, interface_id: &str) -> Result<Vec<FirewallRule>>;
    async fn get_firewall_rule(&mut self, interface_id: &str, rule_id: &str)
    -> Result<FirewallRule>;
    async fn create_firewall_rule(&mut self, rule: &FirewallRule) -> Result<FirewallRule>;
    async fn delete_firewall_rule(&mut self, interface_id: &str, rule_id: &str) -> Result<()>;
}
