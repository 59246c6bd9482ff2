//! Table rendering.

use std::fmt::Display;
use std::io::Write;

use prettytable::format::consts::FORMAT_CLEAN;
use prettytable::{Cell, Row, Table};

use super::{OutputOptions, Printable};
use crate::Result;
use crate::api::Object;

fn opt<T: Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map_or_else(|| "-".to_string(), ToString::to_string)
}

fn cells(values: &[String]) -> Row {
    Row::new(values.iter().map(|v| Cell::new(v)).collect())
}

/// Print `items` as tables, starting a new table whenever the columns change.
pub(super) fn print_table<W: Write, T: Printable>(
    w: &mut W,
    items: &[T],
    opts: &OutputOptions,
) -> Result<()> {
    let mut start = 0;
    while start < items.len() {
        let columns = items[start].columns();
        let end = items[start..]
            .iter()
            .position(|item| item.columns() != columns)
            .map_or(items.len(), |n| start + n);

        if start > 0 {
            writeln!(w)?;
        }

        let mut table = Table::new();
        table.set_format(*FORMAT_CLEAN);
        if !opts.no_headers {
            table.set_titles(Row::new(columns.iter().map(|c| Cell::new(c)).collect()));
        }
        for item in &items[start..end] {
            table.add_row(cells(&item.row()));
        }
        table.print(w)?;

        start = end;
    }
    Ok(())
}

impl Printable for Object {
    fn name(&self) -> String {
        Object::name(self)
    }

    fn columns(&self) -> &'static [&'static str] {
        match self {
            Object::Interface(_) => &["ID", "VNI", "DEVICE", "IPV4", "IPV6", "UNDERLAY ROUTE"],
            Object::Prefix(_) | Object::LoadBalancerPrefix(_) => {
                &["INTERFACE ID", "PREFIX", "UNDERLAY ROUTE"]
            }
            Object::Route(_) => &["VNI", "PREFIX", "NEXT HOP VNI", "NEXT HOP IP"],
            Object::VirtualIp(_) => &["INTERFACE ID", "IP", "UNDERLAY ROUTE"],
            Object::Nat(_) => &["INTERFACE ID", "NAT IP", "MIN PORT", "MAX PORT", "UNDERLAY ROUTE"],
            Object::NeighborNat(_) => &["NAT IP", "VNI", "MIN PORT", "MAX PORT", "UNDERLAY ROUTE"],
            Object::LoadBalancer(_) => &["ID", "VNI", "VIP", "PORTS", "UNDERLAY ROUTE"],
            Object::LoadBalancerTarget(_) => &["LOAD BALANCER ID", "TARGET IP"],
            Object::FirewallRule(_) => &[
                "INTERFACE ID",
                "RULE ID",
                "DIRECTION",
                "ACTION",
                "PRIORITY",
                "SOURCE",
                "DESTINATION",
                "FILTER",
            ],
        }
    }

    fn row(&self) -> Vec<String> {
        match self {
            Object::Interface(iface) => vec![
                iface.metadata.id.clone(),
                iface.spec.vni.to_string(),
                iface.spec.device.clone(),
                opt(&iface.spec.primary_ipv4),
                opt(&iface.spec.primary_ipv6),
                opt(&iface.spec.underlay_route),
            ],
            Object::Prefix(prefix) => vec![
                prefix.metadata.interface_id.clone(),
                prefix.spec.prefix.to_string(),
                opt(&prefix.spec.underlay_route),
            ],
            Object::LoadBalancerPrefix(prefix) => vec![
                prefix.metadata.interface_id.clone(),
                prefix.spec.prefix.to_string(),
                opt(&prefix.spec.underlay_route),
            ],
            Object::Route(route) => vec![
                route.metadata.vni.to_string(),
                route.spec.prefix.to_string(),
                route.spec.next_hop.vni.to_string(),
                route.spec.next_hop.ip.to_string(),
            ],
            Object::VirtualIp(vip) => vec![
                vip.metadata.interface_id.clone(),
                vip.spec.ip.to_string(),
                opt(&vip.spec.underlay_route),
            ],
            Object::Nat(nat) => vec![
                nat.metadata.interface_id.clone(),
                nat.spec.nat_ip.to_string(),
                nat.spec.min_port.to_string(),
                nat.spec.max_port.to_string(),
                opt(&nat.spec.underlay_route),
            ],
            Object::NeighborNat(nat) => vec![
                nat.metadata.nat_ip.to_string(),
                nat.spec.vni.to_string(),
                nat.spec.min_port.to_string(),
                nat.spec.max_port.to_string(),
                opt(&nat.spec.underlay_route),
            ],
            Object::LoadBalancer(lb) => vec![
                lb.metadata.id.clone(),
                lb.spec.vni.to_string(),
                lb.spec.lb_vip_ip.to_string(),
                lb.spec
                    .lbports
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
                opt(&lb.spec.underlay_route),
            ],
            Object::LoadBalancerTarget(target) => vec![
                target.metadata.load_balancer_id.clone(),
                target.spec.target_ip.to_string(),
            ],
            Object::FirewallRule(rule) => vec![
                rule.metadata.interface_id.clone(),
                rule.metadata.rule_id.clone(),
                rule.spec.traffic_direction.to_string(),
                rule.spec.action.to_string(),
                rule.spec.priority.to_string(),
                opt(&rule.spec.source_prefix),
                opt(&rule.spec.destination_prefix),
                opt(&rule.spec.protocol_filter),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Interface, InterfaceMeta, InterfaceSpec, LoadBalancerTarget};
    use crate::output::{OutputFormat, print_many};

    fn render(items: &[Object], opts: OutputOptions) -> String {
        let mut out = Vec::new();
        print_many(&mut out, items, OutputFormat::Table, &opts, None).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_table_groups_by_kind() {
        let items: Vec<Object> = vec![
            Interface::new(
                InterfaceMeta { id: "vm1".into() },
                InterfaceSpec {
                    vni: 7,
                    primary_ipv4: Some("10.0.0.1".parse().unwrap()),
                    ..Default::default()
                },
            )
            .into(),
            LoadBalancerTarget::default().into(),
        ];

        let out = render(&items, OutputOptions::default());
        assert!(out.contains("UNDERLAY ROUTE"));
        assert!(out.contains("10.0.0.1"));
        assert!(out.contains("LOAD BALANCER ID"));
        assert_eq!(out.matches("VNI").count(), 1);
    }

    #[test]
    fn test_table_no_headers() {
        let items: Vec<Object> = vec![Interface::default().into()];
        let out = render(
            &items,
            OutputOptions {
                no_headers: true,
                ..Default::default()
            },
        );
        assert!(!out.contains("DEVICE"));
        assert!(out.contains('-'));
    }

    #[test]
    fn test_opt_placeholder() {
        assert_eq!(opt::<u8>(&None), "-");
        assert_eq!(opt(&Some(3)), "3");
    }
}
