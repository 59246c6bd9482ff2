//! Output formatting (JSON/YAML/name/table).
//!
//! ```
//! use dpservice::api::{Interface, InterfaceMeta, InterfaceSpec};
//! use dpservice::output::{print_many, OutputFormat, OutputOptions};
//! use dpservice::Object;
//!
//! let iface: Object = Interface::new(
//!     InterfaceMeta { id: "vm1".into() },
//!     InterfaceSpec { vni: 100, ..Default::default() },
//! )
//! .into();
//!
//! let mut out = Vec::new();
//! print_many(&mut out, &[iface], OutputFormat::Name, &OutputOptions::default(), Some("added")).unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "interface/vm1 added\n");
//! ```

mod table;

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde::Serialize;

use crate::Result;
use crate::api::{Init, Version};

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Pretty print (for JSON).
    pub pretty: bool,
    /// Omit column titles (for tables).
    pub no_headers: bool,
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// `kind/key` per line.
    #[default]
    Name,
    /// JSON object, or array for lists.
    Json,
    /// YAML documents separated by `---`.
    Yaml,
    /// Aligned columns, one table per kind.
    Table,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Name => "name",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Table => "table",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "name" => Ok(OutputFormat::Name),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "table" | "wide" => Ok(OutputFormat::Table),
            _ => Err(format!(
                "unknown output format {s:?} (expected json, yaml, name or table)"
            )),
        }
    }
}

/// Trait for types that can be printed in every [`OutputFormat`].
pub trait Printable: Serialize {
    /// Identifier printed by the `name` format.
    fn name(&self) -> String;

    /// Table column titles. Items with equal titles share a table.
    fn columns(&self) -> &'static [&'static str];

    /// Table cells, one per column.
    fn row(&self) -> Vec<String>;
}

impl Printable for Version {
    fn name(&self) -> String {
        format!("{} {}", self.service_protocol, self.service_version)
    }

    fn columns(&self) -> &'static [&'static str] {
        &["CLIENT PROTOCOL", "CLIENT VERSION", "SERVICE PROTOCOL", "SERVICE VERSION"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.client_protocol.clone(),
            self.client_version.clone(),
            self.service_protocol.clone(),
            self.service_version.clone(),
        ]
    }
}

impl Printable for Init {
    fn name(&self) -> String {
        self.uuid.clone()
    }

    fn columns(&self) -> &'static [&'static str] {
        &["UUID"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.uuid.clone()]
    }
}

fn write_json<W: Write, T: Serialize + ?Sized>(w: &mut W, value: &T, opts: &OutputOptions) -> Result<()> {
    if opts.pretty {
        serde_json::to_writer_pretty(&mut *w, value)?;
    } else {
        serde_json::to_writer(&mut *w, value)?;
    }
    writeln!(w)?;
    Ok(())
}

/// Print a single item.
pub fn print_one<W: Write, T: Printable>(
    w: &mut W,
    item: &T,
    format: OutputFormat,
    opts: &OutputOptions,
) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(w, item, opts),
        OutputFormat::Yaml => {
            serde_yaml_ng::to_writer(&mut *w, item)?;
            Ok(())
        }
        OutputFormat::Name => {
            writeln!(w, "{}", item.name())?;
            Ok(())
        }
        OutputFormat::Table => table::print_table(w, std::slice::from_ref(item), opts),
    }
}

/// Print a list of items, with an optional action suffix for the `name` format.
pub fn print_many<W: Write, T: Printable>(
    w: &mut W,
    items: &[T],
    format: OutputFormat,
    opts: &OutputOptions,
    action: Option<&str>,
) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(w, items, opts),
        OutputFormat::Yaml => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    writeln!(w, "---")?;
                }
                serde_yaml_ng::to_writer(&mut *w, item)?;
            }
            Ok(())
        }
        OutputFormat::Name => {
            for item in items {
                match action {
                    Some(action) => writeln!(w, "{} {}", item.name(), action)?,
                    None => writeln!(w, "{}", item.name())?,
                }
            }
            Ok(())
        }
        OutputFormat::Table => table::print_table(w, items, opts),
    }
}
