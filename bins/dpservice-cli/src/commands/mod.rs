//! Command implementations.

pub mod add;
pub mod delete;
pub mod get;
pub mod init;
pub mod list;

use std::io::{self, Write};
use std::time::Duration;

use anyhow::Context as _;
use dpservice::client::{ApplyOptions, ApplyResult, DynamicClient, GrpcClient, Operation};
use dpservice::output::{self, OutputFormat, OutputOptions, Printable};
use dpservice::sources::Sources;
use dpservice::{Object, Scheme};
use ipnet::IpNet;
use tracing::debug;

/// Settings shared by every command.
pub struct Context {
    pub address: String,
    pub connect_timeout: Duration,
    pub format: OutputFormat,
    pub opts: OutputOptions,
}

impl Context {
    pub async fn connect(&self) -> dpservice::Result<GrpcClient> {
        let client = GrpcClient::connect(&self.address, self.connect_timeout).await?;
        debug!(address = client.address(), "connected");
        Ok(client)
    }

    pub fn print_one<T: Printable>(&self, item: &T) -> anyhow::Result<()> {
        let mut stdout = io::stdout().lock();
        output::print_one(&mut stdout, item, self.format, &self.opts)?;
        stdout.flush()?;
        Ok(())
    }

    pub fn print_many<T: Printable>(&self, items: &[T]) -> anyhow::Result<()> {
        let mut stdout = io::stdout().lock();
        output::print_many(&mut stdout, items, self.format, &self.opts, None)?;
        stdout.flush()?;
        Ok(())
    }

    /// Print objects a create or delete went through for.
    ///
    /// The `name` format appends the action; the others print the objects
    /// themselves, unwrapped when there is only one.
    pub fn print_applied(&self, objects: &[Object], operation: Operation) -> anyhow::Result<()> {
        let mut stdout = io::stdout().lock();
        match (self.format, objects) {
            (OutputFormat::Name, _) => output::print_many(
                &mut stdout,
                objects,
                self.format,
                &self.opts,
                Some(operation.past_tense()),
            )?,
            (_, [object]) => output::print_one(&mut stdout, object, self.format, &self.opts)?,
            _ => output::print_many(&mut stdout, objects, self.format, &self.opts, None)?,
        }
        stdout.flush()?;
        Ok(())
    }

    /// Create or delete one object built from flags.
    pub async fn apply_one(&self, operation: Operation, object: Object) -> anyhow::Result<()> {
        let scheme = Scheme::with_defaults();
        let mut client = DynamicClient::new(self.connect().await?, &scheme);

        let applied = match operation {
            Operation::Create => client.create(&object).await?,
            Operation::Delete => {
                client.delete(&object).await?;
                object
            }
        };
        self.print_applied(std::slice::from_ref(&applied), operation)
    }

    /// Create or delete every object found at `locations`.
    ///
    /// Objects the service rejects are skipped and reported; the command
    /// still fails once all sources are processed.
    pub async fn apply_files(&self, operation: Operation, locations: &[String]) -> anyhow::Result<()> {
        let scheme = Scheme::with_defaults();
        let mut client = DynamicClient::new(self.connect().await?, &scheme);
        let mut sources = Sources::new(locations.iter().cloned());
        let mut result = ApplyResult::default();

        while let Some(source) = sources.next_source()? {
            let name = source.name().to_string();
            let run = client
                .apply(operation, source.objects(&scheme), ApplyOptions::default())
                .await;
            match run {
                Ok(run) => result.merge(run),
                Err(e) => {
                    // Show what got through before the failure.
                    self.print_applied(&result.applied, operation)?;
                    return Err(e).with_context(|| format!("{} objects from {name}", operation.verb()));
                }
            }
        }

        self.print_applied(&result.applied, operation)?;
        match result.to_error() {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

/// Parse a prefix, accepting a bare address as a host prefix.
pub fn parse_prefix(s: &str) -> Result<IpNet, String> {
    dpservice::util::parse_prefix(s).map_err(|e| e.to_string())
}
