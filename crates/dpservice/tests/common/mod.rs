//! Common test utilities for integration tests.
//!
//! Provides `MockDataplane`, an in-memory [`DataplaneApi`] that records every
//! call and fails the ones it was told to.

use std::collections::HashSet;
use std::net::IpAddr;

use dpservice::api::*;
use dpservice::client::DataplaneApi;
use dpservice::{Error, Result};
use ipnet::IpNet;

/// Server error code returned for configured failures.
pub const MOCK_ERROR_CODE: u32 = 301;

/// Records calls as `"<method> <key>"` strings.
#[derive(Debug, Default)]
pub struct MockDataplane {
    pub calls: Vec<String>,
    failing: HashSet<String>,
}

impl MockDataplane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call whose recorded string is in `calls`.
    pub fn failing<I, S>(calls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            calls: Vec::new(),
            failing: calls.into_iter().map(Into::into).collect(),
        }
    }

    fn record(&mut self, method: &str, key: impl std::fmt::Display) -> Result<()> {
        let call = format!("{method} {key}");
        self.calls.push(call.clone());
        if self.failing.contains(&call) {
            return Err(Error::Server {
                code: MOCK_ERROR_CODE,
                message: "mock failure".into(),
            }
            .with_context(call));
        }
        Ok(())
    }
}

fn underlay() -> Option<IpAddr> {
    Some("fc00::1".parse().unwrap())
}

impl DataplaneApi for MockDataplane {
    async fn check_initialized(&mut self) -> Result<Init> {
        self.record("check_initialized", "")?;
        Ok(Init {
            uuid: "mock".into(),
        })
    }

    async fn initialize(&mut self) -> Result<Init> {
        self.record("initialize", "")?;
        Ok(Init {
            uuid: "mock".into(),
        })
    }

    async fn get_version(&mut self) -> Result<Version> {
        self.record("get_version", "")?;
        Ok(Version::default())
    }

    async fn list_interfaces(&mut self) -> Result<Vec<Interface>> {
        self.record("list_interfaces", "")?;
        Ok(Vec::new())
    }

    async fn get_interface(&mut self, id: &str) -> Result<Interface> {
        self.record("get_interface", id)?;
        Ok(Interface::new(
            InterfaceMeta { id: id.into() },
            InterfaceSpec::default(),
        ))
    }

    async fn create_interface(&mut self, iface: &Interface) -> Result<Interface> {
        self.record("create_interface", iface.key())?;
        let mut created = iface.clone();
        created.spec.underlay_route = underlay();
        Ok(created)
    }

    async fn delete_interface(&mut self, id: &str) -> Result<()> {
        self.record("delete_interface", id)
    }

    async fn list_prefixes(&mut self, interface_id: &str) -> Result<Vec<Prefix>> {
        self.record("list_prefixes", interface_id)?;
        Ok(Vec::new())
    }

    async fn create_prefix(&mut self, prefix: &Prefix) -> Result<Prefix> {
        self.record("create_prefix", prefix.key())?;
        let mut created = prefix.clone();
        created.spec.underlay_route = underlay();
        Ok(created)
    }

    async fn delete_prefix(&mut self, interface_id: &str, prefix: &IpNet) -> Result<()> {
        self.record("delete_prefix", format!("{interface_id}/{prefix}"))
    }

    async fn list_load_balancer_prefixes(
        &mut self,
        interface_id: &str,
    ) -> Result<Vec<LoadBalancerPrefix>> {
        self.record("list_load_balancer_prefixes", interface_id)?;
        Ok(Vec::new())
    }

    async fn create_load_balancer_prefix(
        &mut self,
        prefix: &LoadBalancerPrefix,
    ) -> Result<LoadBalancerPrefix> {
        self.record("create_load_balancer_prefix", prefix.key())?;
        Ok(prefix.clone())
    }

    async fn delete_load_balancer_prefix(
        &mut self,
        interface_id: &str,
        prefix: &IpNet,
    ) -> Result<()> {
        self.record("delete_load_balancer_prefix", format!("{interface_id}/{prefix}"))
    }

    async fn get_virtual_ip(&mut self, interface_id: &str) -> Result<VirtualIp> {
        self.record("get_virtual_ip", interface_id)?;
        Ok(VirtualIp::default())
    }

    async fn create_virtual_ip(&mut self, vip: &VirtualIp) -> Result<VirtualIp> {
        self.record("create_virtual_ip", vip.key())?;
        Ok(vip.clone())
    }

    async fn delete_virtual_ip(&mut self, interface_id: &str) -> Result<()> {
        self.record("delete_virtual_ip", interface_id)
    }

    async fn list_routes(&mut self, vni: u32) -> Result<Vec<Route>> {
        self.record("list_routes", vni)?;
        Ok(Vec::new())
    }

    async fn create_route(&mut self, route: &Route) -> Result<Route> {
        self.record("create_route", route.key())?;
        Ok(route.clone())
    }

    async fn delete_route(&mut self, route: &Route) -> Result<()> {
        self.record("delete_route", route.key())
    }

    async fn get_nat(&mut self, interface_id: &str) -> Result<Nat> {
        self.record("get_nat", interface_id)?;
        Ok(Nat::default())
    }

    async fn create_nat(&mut self, nat: &Nat) -> Result<Nat> {
        self.record("create_nat", nat.key())?;
        Ok(nat.clone())
    }

    async fn delete_nat(&mut self, interface_id: &str) -> Result<()> {
        self.record("delete_nat", interface_id)
    }

    async fn list_neighbor_nats(&mut self, nat_ip: IpAddr) -> Result<Vec<NeighborNat>> {
        self.record("list_neighbor_nats", nat_ip)?;
        Ok(Vec::new())
    }

    async fn create_neighbor_nat(&mut self, nat: &NeighborNat) -> Result<NeighborNat> {
        self.record("create_neighbor_nat", nat.key())?;
        Ok(nat.clone())
    }

    async fn delete_neighbor_nat(&mut self, nat: &NeighborNat) -> Result<()> {
        self.record("delete_neighbor_nat", nat.key())
    }

    async fn get_load_balancer(&mut self, id: &str) -> Result<LoadBalancer> {
        self.record("get_load_balancer", id)?;
        Ok(LoadBalancer::default())
    }

    async fn create_load_balancer(&mut self, lb: &LoadBalancer) -> Result<LoadBalancer> {
        self.record("create_load_balancer", lb.key())?;
        Ok(lb.clone())
    }

    async fn delete_load_balancer(&mut self, id: &str) -> Result<()> {
        self.record("delete_load_balancer", id)
    }

    async fn list_load_balancer_targets(
        &mut self,
        lb_id: &str,
    ) -> Result<Vec<LoadBalancerTarget>> {
        self.record("list_load_balancer_targets", lb_id)?;
        Ok(Vec::new())
    }

    async fn create_load_balancer_target(
        &mut self,
        target: &LoadBalancerTarget,
    ) -> Result<LoadBalancerTarget> {
        self.record("create_load_balancer_target", target.key())?;
        Ok(target.clone())
    }

    async fn delete_load_balancer_target(&mut self, lb_id: &str, target_ip: IpAddr) -> Result<()> {
        self.record("delete_load_balancer_target", format!("{lb_id}/{target_ip}"))
    }

    async fn list_firewall_rules(&mut self, interface_id: &str) -> Result<Vec<FirewallRule>> {
        self.record("list_firewall_rules", interface_id)?;
        Ok(Vec::new())
    }

    async fn get_firewall_rule(&mut self, interface_id: &str, rule_id: &str) -> Result<FirewallRule> {
        self.record("get_firewall_rule", format!("{interface_id}/{rule_id}"))?;
        Ok(FirewallRule::default())
    }

    async fn create_firewall_rule(&mut self, rule: &FirewallRule) -> Result<FirewallRule> {
        self.record("create_firewall_rule", rule.key())?;
        Ok(rule.clone())
    }

    async fn delete_firewall_rule(&mut self, interface_id: &str, rule_id: &str) -> Result<()> {
        self.record("delete_firewall_rule", format!("{interface_id}/{rule_id}"))
    }
}
