//! Stock checker CLI backend.

use std::process::Stdio;

use async_trait::async_trait;
use restock_models::{Availability, ItemId, StoreId};
use tokio::process::Command;
use tracing::{debug, trace};

use crate::error::{LookupError, Result};
use crate::report::availability_for;
use crate::traits::InventoryLookup;

/// Runs a stock checker CLI once per lookup.
///
/// The configured command is invoked as
/// `<command...> --store=<store> --reporter json <item>` and its stdout is
/// parsed as a stock report. The child is killed if the lookup future is
/// dropped (e.g. by a timeout).
#[derive(Debug, Clone)]
pub struct CommandLookup {
    command: Vec<String>,
}

impl CommandLookup {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    /// Full argument list passed after the program name.
    pub fn args_for(&self, store: &StoreId, item: &ItemId) -> Vec<String> {
        let mut args: Vec<String> = self.command.iter().skip(1).cloned().collect();
        args.push(format!("--store={}", store));
        args.push("--reporter".to_string());
        args.push("json".to_string());
        args.push(item.to_string());
        args
    }
}

#[async_trait]
impl InventoryLookup for CommandLookup {
    fn name(&self) -> &str {
        "command"
    }

    async fn lookup(&self, store: &StoreId, item: &ItemId) -> Result<Availability> {
        let program = self
            .command
            .first()
            .ok_or_else(|| LookupError::CommandFailed("empty command".to_string()))?;
        let args = self.args_for(store, item);

        debug!(program = %program, args = ?args, "running stock checker");
        let output = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;
        trace!(
            status = %output.status,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "stock checker completed"
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(LookupError::CommandFailed(if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            }));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        availability_for(&stdout, item)
    }
}
