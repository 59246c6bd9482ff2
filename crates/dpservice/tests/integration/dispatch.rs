//! Dynamic client dispatch tests against the mock dataplane.

use std::net::IpAddr;

use dpservice::api::*;
use dpservice::client::{ApplyOptions, DynamicClient, Operation};
use dpservice::{Error, Object, Result, Scheme};
use pretty_assertions::assert_eq;

use crate::common::{MOCK_ERROR_CODE, MockDataplane};

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

/// One object of every kind.
fn all_kinds() -> Vec<Object> {
    vec![
        Interface::new(
            InterfaceMeta { id: "vm1".into() },
            InterfaceSpec {
                vni: 100,
                device: "net_tap2".into(),
                ..Default::default()
            },
        )
        .into(),
        Prefix::new(
            PrefixMeta {
                interface_id: "vm1".into(),
            },
            PrefixSpec {
                prefix: "10.0.8.0/24".parse().unwrap(),
                underlay_route: None,
            },
        )
        .into(),
        Route::new(
            RouteMeta { vni: 100 },
            RouteSpec {
                prefix: "10.100.0.0/16".parse().unwrap(),
                next_hop: NextHop {
                    vni: 200,
                    ip: ip("fc00::2"),
                },
            },
        )
        .into(),
        VirtualIp::new(
            VirtualIpMeta {
                interface_id: "vm1".into(),
            },
            VirtualIpSpec {
                ip: ip("20.0.0.1"),
                underlay_route: None,
            },
        )
        .into(),
        Nat::new(
            NatMeta {
                interface_id: "vm1".into(),
            },
            NatSpec {
                nat_ip: ip("30.0.0.1"),
                min_port: 1000,
                max_port: 2000,
                underlay_route: None,
            },
        )
        .into(),
        NeighborNat::new(
            NeighborNatMeta {
                nat_ip: ip("30.0.0.1"),
            },
            NeighborNatSpec {
                vni: 100,
                min_port: 2000,
                max_port: 3000,
                underlay_route: Some(ip("fc00::9")),
            },
        )
        .into(),
        LoadBalancer::new(
            LoadBalancerMeta { id: "lb1".into() },
            LoadBalancerSpec {
                vni: 100,
                lb_vip_ip: ip("40.0.0.1"),
                lbports: vec!["tcp/80".parse().unwrap()],
                underlay_route: None,
            },
        )
        .into(),
        LoadBalancerTarget::new(
            LoadBalancerTargetMeta {
                load_balancer_id: "lb1".into(),
            },
            LoadBalancerTargetSpec {
                target_ip: ip("fc00::10"),
            },
        )
        .into(),
        LoadBalancerPrefix::new(
            PrefixMeta {
                interface_id: "vm1".into(),
            },
            PrefixSpec {
                prefix: "40.0.0.1/32".parse().unwrap(),
                underlay_route: None,
            },
        )
        .into(),
        FirewallRule::new(
            FirewallRuleMeta {
                interface_id: "vm1".into(),
                rule_id: "fr1".into(),
            },
            FirewallRuleSpec {
                priority: 1000,
                ..Default::default()
            },
        )
        .into(),
    ]
}

fn ok(objects: Vec<Object>) -> impl Iterator<Item = Result<Object>> {
    objects.into_iter().map(Ok)
}

#[tokio::test]
async fn test_create_every_kind() {
    let scheme = Scheme::with_defaults();
    let mut client = DynamicClient::new(MockDataplane::new(), &scheme);

    let result = client.create_all(ok(all_kinds())).await.unwrap();
    assert!(result.is_success());
    assert_eq!(result.applied.len(), 10);

    let calls = &client.client_mut().calls;
    assert_eq!(
        calls,
        &[
            "create_interface vm1",
            "create_prefix vm1/10.0.8.0/24",
            "create_route 100-10.100.0.0/16:200-fc00::2",
            "create_virtual_ip vm1",
            "create_nat vm1",
            "create_neighbor_nat 30.0.0.1/100/2000-3000",
            "create_load_balancer lb1",
            "create_load_balancer_target lb1/fc00::10",
            "create_load_balancer_prefix vm1/40.0.0.1/32",
            "create_firewall_rule vm1/fr1",
        ]
    );

    // Fields assigned by the service come back in the applied objects.
    let Object::Interface(iface) = &result.applied[0] else {
        panic!("expected interface");
    };
    assert_eq!(iface.spec.underlay_route, Some(ip("fc00::1")));
    assert_eq!(result.summary[0], "interface/vm1 added");
}

#[tokio::test]
async fn test_delete_every_kind() {
    let scheme = Scheme::with_defaults();
    let mut client = DynamicClient::new(MockDataplane::new(), &scheme);

    let result = client.delete_all(ok(all_kinds())).await.unwrap();
    assert!(result.is_success());

    let calls = &client.client_mut().calls;
    assert_eq!(
        calls,
        &[
            "delete_interface vm1",
            "delete_prefix vm1/10.0.8.0/24",
            "delete_route 100-10.100.0.0/16:200-fc00::2",
            "delete_virtual_ip vm1",
            "delete_nat vm1",
            "delete_neighbor_nat 30.0.0.1/100/2000-3000",
            "delete_load_balancer lb1",
            "delete_load_balancer_target lb1/fc00::10",
            "delete_load_balancer_prefix vm1/40.0.0.1/32",
            "delete_firewall_rule vm1/fr1",
        ]
    );
    assert_eq!(result.summary.last().unwrap(), "firewallrule/vm1/fr1 deleted");
}

#[tokio::test]
async fn test_unregistered_kind_is_unsupported() {
    let mut scheme = Scheme::new();
    scheme.register::<Interface>().unwrap();
    let mut client = DynamicClient::new(MockDataplane::new(), &scheme);

    let objects = all_kinds();
    let route = &objects[2];

    assert_eq!(client.object_key(route), "");
    assert_eq!(client.object_key(&objects[0]), "vm1");

    let err = client.create(route).await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedObject { ref kind } if kind == "Route"));
    assert!(client.client_mut().calls.is_empty());
}

#[tokio::test]
async fn test_bulk_delete_continues_after_failure() {
    let scheme = Scheme::with_defaults();
    let mock = MockDataplane::failing(["delete_interface vm2"]);
    let mut client = DynamicClient::new(mock, &scheme);

    let objects: Vec<Object> = ["vm1", "vm2", "vm3"]
        .into_iter()
        .map(|id| Interface::new(InterfaceMeta { id: id.into() }, InterfaceSpec::default()).into())
        .collect();

    let result = client.delete_all(ok(objects)).await.unwrap();

    assert_eq!(
        client.client_mut().calls,
        ["delete_interface vm1", "delete_interface vm2", "delete_interface vm3"]
    );
    assert_eq!(result.applied.len(), 2);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].operation, "delete interface/vm2");
    assert_eq!(result.errors[0].error.server_code(), Some(MOCK_ERROR_CODE));

    let err = result.to_error().unwrap();
    assert_eq!(err.to_string(), "1 of 3 objects failed");
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_abort_on_error() {
    let scheme = Scheme::with_defaults();
    let mock = MockDataplane::failing(["create_interface vm1"]);
    let mut client = DynamicClient::new(mock, &scheme);

    let options = ApplyOptions {
        continue_on_error: false,
        ..Default::default()
    };
    let err = client
        .apply(Operation::Create, ok(all_kinds()), options)
        .await
        .unwrap_err();

    assert!(err.is_server_error());
    assert_eq!(client.client_mut().calls.len(), 1);
}

#[tokio::test]
async fn test_decode_error_aborts() {
    let scheme = Scheme::with_defaults();
    let mut client = DynamicClient::new(MockDataplane::new(), &scheme);

    let objects = vec![
        Ok(all_kinds().remove(0)),
        Err(Error::UnknownKind {
            kind: "Teapot".into(),
        }),
        Ok(all_kinds().remove(1)),
    ];
    let err = client.create_all(objects).await.unwrap_err();

    assert!(matches!(err, Error::UnknownKind { .. }));
    assert_eq!(client.client_mut().calls, ["create_interface vm1"]);
}

#[tokio::test]
async fn test_dry_run_skips_calls() {
    let scheme = Scheme::with_defaults();
    let mut client = DynamicClient::new(MockDataplane::new(), &scheme);

    let options = ApplyOptions {
        dry_run: true,
        ..Default::default()
    };
    let result = client
        .apply(Operation::Delete, ok(all_kinds()), options)
        .await
        .unwrap();

    assert!(client.client_mut().calls.is_empty());
    assert_eq!(result.summary[0], "Would delete interface/vm1");
    assert_eq!(result.applied.len(), 10);
}
