//! Decoding integration tests.

use std::io::Cursor;

use dpservice::decoder::{Decoder, Format, KindDecoder};
use dpservice::{Error, Object, Scheme};
use pretty_assertions::assert_eq;

const JSON_STREAM: &str = r#"
{"kind":"Interface","metadata":{"id":"vm1"},"spec":{"vni":100,"device":"net_tap2","primaryIpv4":"10.0.0.1"}}
{"kind":"Route","metadata":{"vni":100},"spec":{"prefix":"10.100.0.0/16","nextHop":{"vni":200,"ip":"fc00::2"}}}
{"kind":"Prefix","metadata":{"interfaceId":"vm1"},"spec":{"prefix":"10.0.8.0/24"}}
"#;

const YAML_STREAM: &str = "\
kind: Interface
metadata:
  id: vm2
spec:
  vni: 7
---
kind: FirewallRule
metadata:
  interfaceId: vm2
  ruleId: fr1
spec:
  trafficDirection: Ingress
  action: Accept
  priority: 1000
  protocolFilter:
    protocol: tcp
    dstPortLower: 443
    dstPortUpper: 443
";

fn decode_all(input: &str, format: Format) -> Vec<dpservice::Result<Object>> {
    let scheme = Scheme::with_defaults();
    let decoder = Decoder::new(Cursor::new(input.as_bytes().to_vec()), format);
    KindDecoder::new(decoder, &scheme).collect()
}

#[test]
fn test_decode_json_stream() {
    let objects: Vec<Object> = decode_all(JSON_STREAM, Format::Json)
        .into_iter()
        .collect::<dpservice::Result<_>>()
        .unwrap();

    assert_eq!(objects.len(), 3);

    let Object::Interface(iface) = &objects[0] else {
        panic!("expected interface, got {:?}", objects[0]);
    };
    assert_eq!(iface.metadata.id, "vm1");
    assert_eq!(iface.spec.vni, 100);
    assert_eq!(iface.spec.primary_ipv4, Some("10.0.0.1".parse().unwrap()));

    let Object::Route(route) = &objects[1] else {
        panic!("expected route, got {:?}", objects[1]);
    };
    assert_eq!(route.metadata.vni, 100);
    assert_eq!(route.spec.next_hop.vni, 200);
    assert_eq!(route.spec.next_hop.ip, "fc00::2".parse::<std::net::IpAddr>().unwrap());

    // Nothing from the route document leaks into the prefix.
    let Object::Prefix(prefix) = &objects[2] else {
        panic!("expected prefix, got {:?}", objects[2]);
    };
    assert_eq!(prefix.metadata.interface_id, "vm1");
    assert_eq!(prefix.spec.prefix.to_string(), "10.0.8.0/24");
    assert_eq!(prefix.spec.underlay_route, None);
}

#[test]
fn test_decode_yaml_stream() {
    let objects: Vec<Object> = decode_all(YAML_STREAM, Format::Yaml)
        .into_iter()
        .collect::<dpservice::Result<_>>()
        .unwrap();

    let names: Vec<String> = objects.iter().map(Object::name).collect();
    assert_eq!(names, ["interface/vm2", "firewallrule/vm2/fr1"]);

    let Object::FirewallRule(rule) = &objects[1] else {
        panic!("expected firewall rule");
    };
    assert_eq!(rule.spec.priority, 1000);
    assert_eq!(
        rule.spec.protocol_filter.as_ref().map(ToString::to_string),
        Some("tcp src * dst 443-443".to_string())
    );
}

#[test]
fn test_decode_unknown_kind_stops() {
    let input = r#"
{"kind":"Interface","metadata":{"id":"vm1"}}
{"kind":"Teapot","metadata":{}}
{"kind":"Interface","metadata":{"id":"vm3"}}
"#;
    let results = decode_all(input, Format::Json);

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(
        &results[1],
        Err(Error::UnknownKind { kind }) if kind == "Teapot"
    ));
}

#[test]
fn test_decode_missing_kind() {
    let results = decode_all(r#"{"metadata":{"id":"vm1"}}"#, Format::Json);
    assert!(matches!(
        &results[..],
        [Err(Error::UnknownKind { kind })] if kind.is_empty()
    ));
}

#[test]
fn test_decode_malformed_json() {
    let results = decode_all(r#"{"kind":"Interface","metadata":"#, Format::Json);
    assert!(matches!(&results[..], [Err(Error::Json(_))]));
}
