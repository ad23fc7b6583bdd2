use std::sync::{Mutex, PoisonError};

use notary_ledger::{InMemoryLedger, KeyValueLedger, Transaction};
use notary_registry::{RegistryResult, RegistryService};
use notary_types::{HistoryEntry, TxId};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, info_span, warn};

use crate::config::HostConfig;
use crate::error::HostResult;
use crate::function::Function;

/// Result of a successful invocation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Response {
    /// Id of the transaction the invocation ran in.
    pub tx_id: TxId,
    /// JSON payload, `None` for operations that return nothing.
    pub payload: Option<Value>,
}

/// Runs registry invocations against a ledger, one transaction each.
///
/// Invocations are serialized: each holds the host's invocation lock from
/// the start of its transaction until the commit, so concurrent callers
/// never interleave read-modify-writes of the same records.
pub struct Host<L: KeyValueLedger = InMemoryLedger> {
    ledger: L,
    config: HostConfig,
    invocations: Mutex<()>,
}

impl Host<InMemoryLedger> {
    /// A host over an empty in-memory ledger.
    pub fn in_memory(config: HostConfig) -> HostResult<Self> {
        Self::new(InMemoryLedger::new(), config)
    }
}

impl<L: KeyValueLedger> Host<L> {
    pub fn new(ledger: L, config: HostConfig) -> HostResult<Self> {
        config.validate()?;
        Ok(Self {
            ledger,
            config,
            invocations: Mutex::new(()),
        })
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn into_ledger(self) -> L {
        self.ledger
    }

    /// Run `function` with positional string arguments.
    ///
    /// Argument errors are raised before the transaction opens. Any error from
    /// the operation drops the transaction, so a failed invocation leaves the
    /// ledger exactly as it was.
    pub fn invoke<S: AsRef<str>>(&self, function: &str, args: &[S]) -> HostResult<Response> {
        let function: Function = function.parse()?;
        function.check_args(args)?;

        let span = info_span!("invoke", node = %self.config.node_id, function = function.name());
        let _span = span.enter();

        // Guards no data, so a panic in another invocation leaves nothing to repair.
        let _serial = self
            .invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let tx = Transaction::begin(&self.ledger);
        let tx_id = tx.tx_id();
        let payload = {
            let registry = RegistryService::new(&tx, self.config.registry.clone());
            match dispatch(&registry, function, args) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(tx_id = %tx_id, kind = %e.kind(), error = %e, "invocation failed");
                    return Err(e);
                }
            }
        };

        let writes = tx.pending_writes()?;
        if writes == 0 {
            debug!(tx_id = %tx_id, "read-only invocation");
            return Ok(Response { tx_id, payload });
        }
        tx.commit()?;
        info!(tx_id = %tx_id, writes, "invocation committed");
        Ok(Response { tx_id, payload })
    }
}

fn dispatch<L, S>(
    registry: &RegistryService<'_, L>,
    function: Function,
    args: &[S],
) -> HostResult<Option<Value>>
where
    L: KeyValueLedger + ?Sized,
    S: AsRef<str>,
{
    let arg = |i: usize| args[i].as_ref();
    let payload = match function {
        Function::Init => {
            registry.init()?;
            None
        }
        Function::AddUser => {
            let balance = function.integer_arg(args, 3)?;
            Some(to_json(&registry.add_user(arg(0), arg(1), arg(2), balance)?)?)
        }
        Function::Deposit => {
            let amount = function.integer_arg(args, 1)?;
            Some(to_json(&registry.deposit(arg(0), amount)?)?)
        }
        Function::DeleteUser => Some(to_json(&registry.delete_user(arg(0))?)?),
        Function::GetUser => Some(to_json(&registry.get_user(arg(0))?)?),
        Function::GetUserHistory => {
            let entries = registry
                .user_history(arg(0))?
                .collect::<RegistryResult<Vec<HistoryEntry<_>>>>()?;
            Some(to_json(&entries)?)
        }
        Function::AddAsset => Some(to_json(&registry.add_asset(arg(0), arg(1), arg(2))?)?),
        Function::TransferAsset => {
            let amount = function.integer_arg(args, 3)?;
            Some(to_json(&registry.transfer_asset(arg(0), arg(1), arg(2), amount)?)?)
        }
        Function::GetAsset => Some(to_json(&registry.get_asset(arg(0))?)?),
        Function::GetAssetHistory => {
            let entries = registry
                .asset_history(arg(0))?
                .collect::<RegistryResult<Vec<HistoryEntry<_>>>>()?;
            Some(to_json(&entries)?)
        }
        Function::ListAllUsers => Some(to_json(&registry.list_all_users()?)?),
        Function::ListAllAssets => Some(to_json(&registry.list_all_assets()?)?),
        Function::DeleteAsset => Some(to_json(&registry.delete_asset(arg(0))?)?),
        Function::VerifyIndexes => Some(to_json(&registry.verify_indexes()?)?),
    };
    Ok(payload)
}

fn to_json<T: Serialize>(value: &T) -> HostResult<Value> {
    Ok(serde_json::to_value(value)?)
}
