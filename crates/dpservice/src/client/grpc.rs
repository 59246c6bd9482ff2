//! gRPC implementation of [`DataplaneApi`].

use std::net::IpAddr;
use std::time::Duration;

use ipnet::IpNet;
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

use super::DataplaneApi;
use super::convert::{
    firewall_rule_from_proto, id_from_bytes, ip_from_proto, ip_to_proto, neighbor_nat_from_proto,
    prefix_from_proto, prefix_to_proto, route_from_proto,
};
use crate::api::{
    FirewallRule, Init, Interface, LbPort, LoadBalancer, LoadBalancerMeta, LoadBalancerPrefix,
    LoadBalancerSpec, LoadBalancerTarget, LoadBalancerTargetMeta, LoadBalancerTargetSpec, Nat,
    NatMeta, NatSpec, NeighborNat, Prefix, PrefixMeta, PrefixSpec, Record, Route, Version,
    VirtualIp, VirtualIpMeta, VirtualIpSpec,
};
use crate::proto;
use crate::proto::dataplane_client::DataplaneClient;
use crate::util::addr::{ip_from_octets, ip_octets};
use crate::{Error, Result};

/// Address the service listens on by default.
pub const DEFAULT_ADDRESS: &str = "localhost:1337";

/// Default time allowed for establishing the connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(4);

const CLIENT_NAME: &str = "dpservice-cli";

/// Calls an RPC, attaches `operation` to failures and checks the embedded status.
macro_rules! rpc {
    ($client:expr, $method:ident, $request:expr, $operation:expr) => {{
        let operation: String = $operation;
        debug!(rpc = stringify!($method), %operation, "calling dataplane");
        let response = $client
            .inner
            .$method($request)
            .await
            .map_err(|status| Error::Rpc(status).with_context(operation.clone()))?
            .into_inner();
        check_status(response.status.as_ref(), &operation)?;
        response
    }};
}

fn check_status(status: Option<&proto::Status>, operation: &str) -> Result<()> {
    match status {
        Some(status) if status.code != 0 => Err(Error::Server {
            code: status.code,
            message: status.message.clone(),
        }
        .with_context(operation)),
        _ => Ok(()),
    }
}

/// Dataplane client over a single gRPC channel.
#[derive(Debug, Clone)]
pub struct GrpcClient {
    inner: DataplaneClient<Channel>,
    address: String,
}

impl GrpcClient {
    /// Connect to the service at `address` (`host:port` or a full URI).
    ///
    /// Fails with [`Error::ConnectTimeout`] if the connection is not up
    /// within `timeout`.
    pub async fn connect(address: &str, timeout: Duration) -> Result<Self> {
        let uri = if address.contains("://") {
            address.to_string()
        } else {
            format!("http://{address}")
        };
        let endpoint = Endpoint::new(uri)
            .map_err(|source| Error::Connect {
                address: address.to_string(),
                source,
            })?
            .connect_timeout(timeout);

        debug!(%address, ?timeout, "connecting to dataplane");
        let channel = tokio::time::timeout(timeout, endpoint.connect())
            .await
            .map_err(|_| Error::ConnectTimeout {
                address: address.to_string(),
                seconds: timeout.as_secs(),
            })?
            .map_err(|source| Error::Connect {
                address: address.to_string(),
                source,
            })?;

        Ok(Self {
            inner: DataplaneClient::new(channel),
            address: address.to_string(),
        })
    }

    /// The address this client is connected to.
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl DataplaneApi for GrpcClient {
    // ========================================================================
    // Service
    // ========================================================================

    async fn check_initialized(&mut self) -> Result<Init> {
        let response = rpc!(
            self,
            check_initialized,
            proto::CheckInitializedRequest {},
            "check initialized".into()
        );
        Ok(Init {
            uuid: response.uuid,
        })
    }

    async fn initialize(&mut self) -> Result<Init> {
        let response = rpc!(
            self,
            initialize,
            proto::InitializeRequest {},
            "initialize".into()
        );
        Ok(Init {
            uuid: response.uuid,
        })
    }

    async fn get_version(&mut self) -> Result<Version> {
        let request = proto::GetVersionRequest {
            client_protocol: env!("CARGO_PKG_VERSION").to_string(),
            client_name: CLIENT_NAME.to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
        };
        let response = rpc!(self, get_version, request.clone(), "get version".into());
        Ok(Version {
            client_protocol: request.client_protocol,
            client_name: request.client_name,
            client_version: request.client_version,
            service_protocol: response.service_protocol,
            service_version: response.service_version,
        })
    }

    // ========================================================================
    // Interfaces
    // ========================================================================

    async fn list_interfaces(&mut self) -> Result<Vec<Interface>> {
        let response = rpc!(
            self,
            list_interfaces,
            proto::ListInterfacesRequest {},
            "list interfaces".into()
        );
        response
            .interfaces
            .into_iter()
            .map(Interface::try_from)
            .collect()
    }

    async fn get_interface(&mut self, id: &str) -> Result<Interface> {
        let request = proto::GetInterfaceRequest {
            interface_id: id.as_bytes().to_vec(),
        };
        let response = rpc!(self, get_interface, request, format!("get interface {id}"));
        response
            .interface
            .ok_or_else(|| Error::InvalidMessage(format!("no interface returned for {id}")))?
            .try_into()
    }

    async fn create_interface(&mut self, iface: &Interface) -> Result<Interface> {
        let response = rpc!(
            self,
            create_interface,
            proto::CreateInterfaceRequest::from(iface),
            format!("create interface {}", iface.key())
        );
        let mut created = iface.clone();
        created.spec.underlay_route = ip_from_octets(&response.underlay_route)?;
        created.spec.virtual_function = response.vf.map(Into::into);
        Ok(created)
    }

    async fn delete_interface(&mut self, id: &str) -> Result<()> {
        let request = proto::DeleteInterfaceRequest {
            interface_id: id.as_bytes().to_vec(),
        };
        rpc!(self, delete_interface, request, format!("delete interface {id}"));
        Ok(())
    }

    // ========================================================================
    // Prefixes
    // ========================================================================

    async fn list_prefixes(&mut self, interface_id: &str) -> Result<Vec<Prefix>> {
        let request = proto::ListPrefixesRequest {
            interface_id: interface_id.as_bytes().to_vec(),
        };
        let response = rpc!(
            self,
            list_prefixes,
            request,
            format!("list prefixes of {interface_id}")
        );
        response
            .prefixes
            .iter()
            .map(|prefix| {
                Ok(Prefix::new(
                    PrefixMeta {
                        interface_id: interface_id.to_string(),
                    },
                    PrefixSpec {
                        prefix: prefix_from_proto(prefix)?,
                        underlay_route: ip_from_octets(&prefix.underlay_route)?,
                    },
                ))
            })
            .collect()
    }

    async fn create_prefix(&mut self, prefix: &Prefix) -> Result<Prefix> {
        let request = proto::CreatePrefixRequest {
            interface_id: prefix.metadata.interface_id.as_bytes().to_vec(),
            prefix: Some(prefix_to_proto(&prefix.spec.prefix)),
        };
        let response = rpc!(
            self,
            create_prefix,
            request,
            format!("create prefix {}", prefix.key())
        );
        let mut created = prefix.clone();
        created.spec.underlay_route = ip_from_octets(&response.underlay_route)?;
        Ok(created)
    }

    async fn delete_prefix(&mut self, interface_id: &str, prefix: &IpNet) -> Result<()> {
        let request = proto::DeletePrefixRequest {
            interface_id: interface_id.as_bytes().to_vec(),
            prefix: Some(prefix_to_proto(prefix)),
        };
        rpc!(
            self,
            delete_prefix,
            request,
            format!("delete prefix {interface_id}/{prefix}")
        );
        Ok(())
    }

    // ========================================================================
    // Load balancer prefixes
    // ========================================================================

    async fn list_load_balancer_prefixes(
        &mut self,
        interface_id: &str,
    ) -> Result<Vec<LoadBalancerPrefix>> {
        let request = proto::ListLoadBalancerPrefixesRequest {
            interface_id: interface_id.as_bytes().to_vec(),
        };
        let response = rpc!(
            self,
            list_load_balancer_prefixes,
            request,
            format!("list load balancer prefixes of {interface_id}")
        );
        response
            .prefixes
            .iter()
            .map(|prefix| {
                Ok(LoadBalancerPrefix::new(
                    PrefixMeta {
                        interface_id: interface_id.to_string(),
                    },
                    PrefixSpec {
                        prefix: prefix_from_proto(prefix)?,
                        underlay_route: ip_from_octets(&prefix.underlay_route)?,
                    },
                ))
            })
            .collect()
    }

    async fn create_load_balancer_prefix(
        &mut self,
        prefix: &LoadBalancerPrefix,
    ) -> Result<LoadBalancerPrefix> {
        let request = proto::CreateLoadBalancerPrefixRequest {
            interface_id: prefix.metadata.interface_id.as_bytes().to_vec(),
            prefix: Some(prefix_to_proto(&prefix.spec.prefix)),
        };
        let response = rpc!(
            self,
            create_load_balancer_prefix,
            request,
            format!("create load balancer prefix {}", prefix.key())
        );
        let mut created = prefix.clone();
        created.spec.underlay_route = ip_from_octets(&response.underlay_route)?;
        Ok(created)
    }

    async fn delete_load_balancer_prefix(
        &mut self,
        interface_id: &str,
        prefix: &IpNet,
    ) -> Result<()> {
        let request = proto::DeleteLoadBalancerPrefixRequest {
            interface_id: interface_id.as_bytes().to_vec(),
            prefix: Some(prefix_to_proto(prefix)),
        };
        rpc!(
            self,
            delete_load_balancer_prefix,
            request,
            format!("delete load balancer prefix {interface_id}/{prefix}")
        );
        Ok(())
    }

    // ========================================================================
    // Virtual IPs
    // ========================================================================

    async fn get_virtual_ip(&mut self, interface_id: &str) -> Result<VirtualIp> {
        let request = proto::GetVipRequest {
            interface_id: interface_id.as_bytes().to_vec(),
        };
        let response = rpc!(
            self,
            get_vip,
            request,
            format!("get virtual ip of {interface_id}")
        );
        Ok(VirtualIp::new(
            VirtualIpMeta {
                interface_id: interface_id.to_string(),
            },
            VirtualIpSpec {
                ip: ip_from_proto(response.vip_ip.as_ref(), "virtual ip")?,
                underlay_route: ip_from_octets(&response.underlay_route)?,
            },
        ))
    }

    async fn create_virtual_ip(&mut self, vip: &VirtualIp) -> Result<VirtualIp> {
        let request = proto::CreateVipRequest {
            interface_id: vip.metadata.interface_id.as_bytes().to_vec(),
            vip_ip: Some(ip_to_proto(vip.spec.ip)),
        };
        let response = rpc!(
            self,
            create_vip,
            request,
            format!("create virtual ip {}", vip.key())
        );
        let mut created = vip.clone();
        created.spec.underlay_route = ip_from_octets(&response.underlay_route)?;
        Ok(created)
    }

    async fn delete_virtual_ip(&mut self, interface_id: &str) -> Result<()> {
        let request = proto::DeleteVipRequest {
            interface_id: interface_id.as_bytes().to_vec(),
        };
        rpc!(
            self,
            delete_vip,
            request,
            format!("delete virtual ip of {interface_id}")
        );
        Ok(())
    }

    // ========================================================================
    // Routes
    // ========================================================================

    async fn list_routes(&mut self, vni: u32) -> Result<Vec<Route>> {
        let request = proto::ListRoutesRequest { vni };
        let response = rpc!(self, list_routes, request, format!("list routes of vni {vni}"));
        response
            .routes
            .iter()
            .map(|route| route_from_proto(vni, route))
            .collect()
    }

    async fn create_route(&mut self, route: &Route) -> Result<Route> {
        let request = proto::CreateRouteRequest {
            vni: route.metadata.vni,
            route: Some(route.into()),
        };
        rpc!(
            self,
            create_route,
            request,
            format!("create route {}", route.key())
        );
        Ok(route.clone())
    }

    async fn delete_route(&mut self, route: &Route) -> Result<()> {
        let request = proto::DeleteRouteRequest {
            vni: route.metadata.vni,
            route: Some(route.into()),
        };
        rpc!(
            self,
            delete_route,
            request,
            format!("delete route {}", route.key())
        );
        Ok(())
    }

    // ========================================================================
    // NAT
    // ========================================================================

    async fn get_nat(&mut self, interface_id: &str) -> Result<Nat> {
        let request = proto::GetNatRequest {
            interface_id: interface_id.as_bytes().to_vec(),
        };
        let response = rpc!(self, get_nat, request, format!("get nat of {interface_id}"));
        Ok(Nat::new(
            NatMeta {
                interface_id: interface_id.to_string(),
            },
            NatSpec {
                nat_ip: ip_from_proto(response.nat_ip.as_ref(), "nat ip")?,
                min_port: response.min_port,
                max_port: response.max_port,
                underlay_route: ip_from_octets(&response.underlay_route)?,
            },
        ))
    }

    async fn create_nat(&mut self, nat: &Nat) -> Result<Nat> {
        let request = proto::CreateNatRequest {
            interface_id: nat.metadata.interface_id.as_bytes().to_vec(),
            nat_ip: Some(ip_to_proto(nat.spec.nat_ip)),
            min_port: nat.spec.min_port,
            max_port: nat.spec.max_port,
        };
        let response = rpc!(self, create_nat, request, format!("create nat {}", nat.key()));
        let mut created = nat.clone();
        created.spec.underlay_route = ip_from_octets(&response.underlay_route)?;
        Ok(created)
    }

    async fn delete_nat(&mut self, interface_id: &str) -> Result<()> {
        let request = proto::DeleteNatRequest {
            interface_id: interface_id.as_bytes().to_vec(),
        };
        rpc!(
            self,
            delete_nat,
            request,
            format!("delete nat of {interface_id}")
        );
        Ok(())
    }

    // ========================================================================
    // Neighbor NAT
    // ========================================================================

    async fn list_neighbor_nats(&mut self, nat_ip: IpAddr) -> Result<Vec<NeighborNat>> {
        let request = proto::ListNeighborNatsRequest {
            nat_ip: Some(ip_to_proto(nat_ip)),
        };
        let response = rpc!(
            self,
            list_neighbor_nats,
            request,
            format!("list neighbor nats of {nat_ip}")
        );
        response
            .nats
            .iter()
            .map(|nat| neighbor_nat_from_proto(nat_ip, nat))
            .collect()
    }

    async fn create_neighbor_nat(&mut self, nat: &NeighborNat) -> Result<NeighborNat> {
        let request = proto::CreateNeighborNatRequest {
            nat_ip: Some(ip_to_proto(nat.metadata.nat_ip)),
            vni: nat.spec.vni,
            min_port: nat.spec.min_port,
            max_port: nat.spec.max_port,
            underlay_route: ip_octets(nat.spec.underlay_route),
        };
        rpc!(
            self,
            create_neighbor_nat,
            request,
            format!("create neighbor nat {}", nat.key())
        );
        Ok(nat.clone())
    }

    async fn delete_neighbor_nat(&mut self, nat: &NeighborNat) -> Result<()> {
        let request = proto::DeleteNeighborNatRequest {
            nat_ip: Some(ip_to_proto(nat.metadata.nat_ip)),
            vni: nat.spec.vni,
            min_port: nat.spec.min_port,
            max_port: nat.spec.max_port,
        };
        rpc!(
            self,
            delete_neighbor_nat,
            request,
            format!("delete neighbor nat {}", nat.key())
        );
        Ok(())
    }

    // ========================================================================
    // Load balancers
    // ========================================================================

    async fn get_load_balancer(&mut self, id: &str) -> Result<LoadBalancer> {
        let request = proto::GetLoadBalancerRequest {
            loadbalancer_id: id.as_bytes().to_vec(),
        };
        let response = rpc!(
            self,
            get_load_balancer,
            request,
            format!("get load balancer {id}")
        );
        Ok(LoadBalancer::new(
            LoadBalancerMeta { id: id.to_string() },
            LoadBalancerSpec {
                vni: response.vni,
                lb_vip_ip: ip_from_proto(response.loadbalanced_ip.as_ref(), "load balancer ip")?,
                lbports: response
                    .loadbalanced_ports
                    .iter()
                    .map(LbPort::try_from)
                    .collect::<Result<_>>()?,
                underlay_route: ip_from_octets(&response.underlay_route)?,
            },
        ))
    }

    async fn create_load_balancer(&mut self, lb: &LoadBalancer) -> Result<LoadBalancer> {
        let request = proto::CreateLoadBalancerRequest {
            loadbalancer_id: lb.metadata.id.as_bytes().to_vec(),
            vni: lb.spec.vni,
            loadbalanced_ip: Some(ip_to_proto(lb.spec.lb_vip_ip)),
            loadbalanced_ports: lb.spec.lbports.iter().map(Into::into).collect(),
        };
        let response = rpc!(
            self,
            create_load_balancer,
            request,
            format!("create load balancer {}", lb.key())
        );
        let mut created = lb.clone();
        created.spec.underlay_route = ip_from_octets(&response.underlay_route)?;
        Ok(created)
    }

    async fn delete_load_balancer(&mut self, id: &str) -> Result<()> {
        let request = proto::DeleteLoadBalancerRequest {
            loadbalancer_id: id.as_bytes().to_vec(),
        };
        rpc!(
            self,
            delete_load_balancer,
            request,
            format!("delete load balancer {id}")
        );
        Ok(())
    }

    // ========================================================================
    // Load balancer targets
    // ========================================================================

    async fn list_load_balancer_targets(
        &mut self,
        lb_id: &str,
    ) -> Result<Vec<LoadBalancerTarget>> {
        let request = proto::ListLoadBalancerTargetsRequest {
            loadbalancer_id: lb_id.as_bytes().to_vec(),
        };
        let response = rpc!(
            self,
            list_load_balancer_targets,
            request,
            format!("list targets of load balancer {lb_id}")
        );
        response
            .target_ips
            .iter()
            .map(|ip| {
                Ok(LoadBalancerTarget::new(
                    LoadBalancerTargetMeta {
                        load_balancer_id: lb_id.to_string(),
                    },
                    LoadBalancerTargetSpec {
                        target_ip: ip_from_proto(Some(ip), "target ip")?,
                    },
                ))
            })
            .collect()
    }

    async fn create_load_balancer_target(
        &mut self,
        target: &LoadBalancerTarget,
    ) -> Result<LoadBalancerTarget> {
        let request = proto::CreateLoadBalancerTargetRequest {
            loadbalancer_id: target.metadata.load_balancer_id.as_bytes().to_vec(),
            target_ip: Some(ip_to_proto(target.spec.target_ip)),
        };
        rpc!(
            self,
            create_load_balancer_target,
            request,
            format!("create load balancer target {}", target.key())
        );
        Ok(target.clone())
    }

    async fn delete_load_balancer_target(&mut self, lb_id: &str, target_ip: IpAddr) -> Result<()> {
        let request = proto::DeleteLoadBalancerTargetRequest {
            loadbalancer_id: lb_id.as_bytes().to_vec(),
            target_ip: Some(ip_to_proto(target_ip)),
        };
        rpc!(
            self,
            delete_load_balancer_target,
            request,
            format!("delete load balancer target {lb_id}/{target_ip}")
        );
        Ok(())
    }

    // ========================================================================
    // Firewall rules
    // ========================================================================

    async fn list_firewall_rules(&mut self, interface_id: &str) -> Result<Vec<FirewallRule>> {
        let request = proto::ListFirewallRulesRequest {
            interface_id: interface_id.as_bytes().to_vec(),
        };
        let response = rpc!(
            self,
            list_firewall_rules,
            request,
            format!("list firewall rules of {interface_id}")
        );
        response
            .rules
            .into_iter()
            .map(|rule| firewall_rule_from_proto(interface_id, rule))
            .collect()
    }

    async fn get_firewall_rule(&mut self, interface_id: &str, rule_id: &str) -> Result<FirewallRule> {
        let request = proto::GetFirewallRuleRequest {
            interface_id: interface_id.as_bytes().to_vec(),
            rule_id: rule_id.as_bytes().to_vec(),
        };
        let response = rpc!(
            self,
            get_firewall_rule,
            request,
            format!("get firewall rule {interface_id}/{rule_id}")
        );
        let rule = response.rule.ok_or_else(|| {
            Error::InvalidMessage(format!("no rule returned for {interface_id}/{rule_id}"))
        })?;
        firewall_rule_from_proto(interface_id, rule)
    }

    async fn create_firewall_rule(&mut self, rule: &FirewallRule) -> Result<FirewallRule> {
        let request = proto::CreateFirewallRuleRequest {
            interface_id: rule.metadata.interface_id.as_bytes().to_vec(),
            rule: Some(rule.into()),
        };
        let response = rpc!(
            self,
            create_firewall_rule,
            request,
            format!("create firewall rule {}", rule.key())
        );
        let mut created = rule.clone();
        if !response.rule_id.is_empty() {
            created.metadata.rule_id = id_from_bytes(response.rule_id)?;
        }
        Ok(created)
    }

    async fn delete_firewall_rule(&mut self, interface_id: &str, rule_id: &str) -> Result<()> {
        let request = proto::DeleteFirewallRuleRequest {
            interface_id: interface_id.as_bytes().to_vec(),
            rule_id: rule_id.as_bytes().to_vec(),
        };
        rpc!(
            self,
            delete_firewall_rule,
            request,
            format!("delete firewall rule {interface_id}/{rule_id}")
        );
        Ok(())
    }
}
