//! CLI argument parsing tests for dpservice-cli.
//!
//! These tests verify that command-line arguments are correctly parsed
//! without requiring a running dataplane.

use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dpservice-cli"));
    cmd.env_remove("DPSERVICE_ADDRESS");
    cmd
}

/// Address nothing listens on, with a short timeout.
fn unreachable(cmd: &mut Command) -> &mut Command {
    cmd.args(["--address", "127.0.0.1:1", "--connect-timeout", "1"])
}

mod global_flags {
    use super::*;

    #[test]
    fn test_help() {
        cli()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("dpservice dataplane"))
            .stdout(predicate::str::contains("--address"))
            .stdout(predicate::str::contains("--output"));
    }

    #[test]
    fn test_version() {
        cli()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("dpservice-cli"));
    }

    #[test]
    fn test_invalid_subcommand() {
        cli()
            .arg("invalid_command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn test_invalid_output_format() {
        cli()
            .args(["-o", "xml", "list", "interfaces"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown output format"));
    }

    #[test]
    fn test_address_env_shown_in_help() {
        cli()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("DPSERVICE_ADDRESS"));
    }
}

mod add_command {
    use super::*;

    #[test]
    fn test_add_help_lists_resources() {
        cli()
            .args(["add", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("interface"))
            .stdout(predicate::str::contains("firewallrule"))
            .stdout(predicate::str::contains("--filename"));
    }

    #[test]
    fn test_create_alias() {
        cli().args(["create", "--help"]).assert().success();
    }

    #[test]
    fn test_add_interface_requires_vni() {
        cli()
            .args(["add", "interface", "--id", "vm1", "--device", "net_tap2"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--vni"));
    }

    #[test]
    fn test_add_prefix_rejects_bad_prefix() {
        cli()
            .args([
                "add",
                "prefix",
                "--interface-id",
                "vm1",
                "--prefix",
                "10.0.0.0/40",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid prefix length"));
    }

    #[test]
    fn test_add_loadbalancer_rejects_bad_port() {
        cli()
            .args([
                "add",
                "loadbalancer",
                "--id",
                "lb1",
                "--vni",
                "100",
                "--vip",
                "10.0.0.1",
                "--lbports",
                "tcp/80,gre/1",
            ])
            .assert()
            .failure();
    }

    #[test]
    fn test_add_files_and_resource_conflict() {
        cli()
            .args(["add", "-f", "objects.yaml", "interface", "--id", "vm1"])
            .assert()
            .failure();
    }

    #[test]
    fn test_add_unreachable_service() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("objects.yaml");
        std::fs::write(&path, "kind: Interface\nmetadata:\n  id: vm1\n").unwrap();

        unreachable(&mut cli())
            .args(["add", "-f"])
            .arg(&path)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Error:"));
    }
}

mod delete_command {
    use super::*;

    #[test]
    fn test_delete_help() {
        cli()
            .args(["delete", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("lbtarget"));
    }

    #[test]
    fn test_delete_route_requires_next_hop() {
        cli()
            .args([
                "delete",
                "route",
                "--vni",
                "100",
                "--prefix",
                "10.0.0.0/24",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--next-hop-vni"));
    }

    #[test]
    fn test_delete_interface_unreachable() {
        unreachable(&mut cli())
            .args(["delete", "interface", "--id", "vm1"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("127.0.0.1:1"));
    }
}

mod get_command {
    use super::*;

    #[test]
    fn test_get_help() {
        cli()
            .args(["get", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("version"))
            .stdout(predicate::str::contains("init"));
    }

    #[test]
    fn test_get_firewallrule_requires_rule_id() {
        cli()
            .args(["get", "firewallrule", "--interface-id", "vm1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--rule-id"));
    }
}

mod list_command {
    use super::*;

    #[test]
    fn test_list_help() {
        cli()
            .args(["list", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("neighbornats"));
    }

    #[test]
    fn test_list_neighbornats_requires_address() {
        cli()
            .args(["list", "neighbornats", "--nat-ip", "not-an-ip"])
            .assert()
            .failure();
    }
}
