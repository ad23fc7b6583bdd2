use std::collections::HashSet;

use notary_ledger::{KeyValueLedger, WriteBatch};
use notary_store::{EntityStore, IndexList, Record, RecordCodec, StoreError};
use notary_types::{validate_entity_id, Asset, TxId, User, UserProfile};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::audit::{IndexAudit, RegistryAudit};
use crate::config::{OverdraftPolicy, RegistryConfig, UserDeletionPolicy};
use crate::error::{RegistryError, RegistryResult};
use crate::history::{HistoryProjection, HistoryProjector};

/// The three records written by a completed transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    #[serde(rename = "From")]
    pub from: User,
    #[serde(rename = "To")]
    pub to: User,
    #[serde(rename = "Asset")]
    pub asset: Asset,
}

/// Outcome of deleting a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserDeletion {
    #[serde(rename = "UserID")]
    pub user_id: String,
    /// Assets removed with the user under [`UserDeletionPolicy::Cascade`].
    #[serde(rename = "DeletedAssets")]
    pub deleted_assets: Vec<String>,
    /// Assets left referencing the deleted user under [`UserDeletionPolicy::Orphan`].
    #[serde(rename = "OrphanedAssets")]
    pub orphaned_assets: Vec<String>,
}

/// User/asset registry over one ledger view.
///
/// Owns the invariant that each index list holds exactly the keys of the
/// live records of its class: every create appends, every delete retracts.
/// The service holds no locks and assumes none; pass a
/// [`Transaction`](notary_ledger::Transaction) as the ledger to get
/// all-or-nothing behaviour for each call.
pub struct RegistryService<'l, L: KeyValueLedger + ?Sized> {
    ledger: &'l L,
    config: RegistryConfig,
}

impl<'l, L: KeyValueLedger + ?Sized> RegistryService<'l, L> {
    pub fn new(ledger: &'l L, config: RegistryConfig) -> Self {
        Self { ledger, config }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn users(&self) -> EntityStore<'l, User, L> {
        EntityStore::new(self.ledger)
    }

    fn assets(&self) -> EntityStore<'l, Asset, L> {
        EntityStore::new(self.ledger)
    }

    fn user_index(&self) -> IndexList<'l, L> {
        IndexList::new(self.ledger, self.config.user_index_key.as_str())
    }

    fn asset_index(&self) -> IndexList<'l, L> {
        IndexList::new(self.ledger, self.config.asset_index_key.as_str())
    }

    /// Write empty index records where none exist.
    pub fn init(&self) -> RegistryResult<()> {
        let users_created = self.user_index().init()?;
        let assets_created = self.asset_index().init()?;
        info!(users_created, assets_created, "registry indexes initialized");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Users
    // ---------------------------------------------------------------

    pub fn add_user(
        &self,
        id: &str,
        name: &str,
        surname: &str,
        initial_balance: i64,
    ) -> RegistryResult<User> {
        self.check_new_id("user id", id)?;
        if initial_balance < 0 && self.config.overdraft == OverdraftPolicy::Reject {
            return Err(RegistryError::invalid(format!(
                "initial balance of {id} must not be negative, got {initial_balance}"
            )));
        }

        let user = User::new(id, name, surname, initial_balance);
        match self.users().create(id, &user) {
            Err(StoreError::AlreadyExists { .. }) => {
                warn!(user_id = id, "duplicate user rejected");
                return Err(RegistryError::invalid(format!("user {id} already exists")));
            }
            result => result?,
        }
        self.user_index().append(id)?;
        info!(user_id = id, balance = initial_balance, "user added");
        Ok(user)
    }

    /// Add `amount` to a user's balance. Negative amounts withdraw.
    pub fn deposit(&self, user_id: &str, amount: i64) -> RegistryResult<User> {
        self.require_user(user_id)?;
        let overdraft = self.config.overdraft;
        let user = self.users().try_update(user_id, |user: &mut User| -> RegistryResult<()> {
            let balance = user.balance.checked_add(amount).ok_or_else(|| {
                RegistryError::invalid(format!(
                    "deposit of {amount} overflows the balance of {user_id}"
                ))
            })?;
            if balance < 0 && overdraft == OverdraftPolicy::Reject {
                return Err(RegistryError::InsufficientFunds {
                    user_id: user_id.to_string(),
                    balance: user.balance,
                    amount: amount.saturating_neg(),
                });
            }
            user.balance = balance;
            Ok(())
        })?;
        info!(user_id, amount, balance = user.balance, "deposit applied");
        Ok(user)
    }

    /// The user joined with every asset it owns, in asset-index order.
    pub fn get_user(&self, id: &str) -> RegistryResult<UserProfile> {
        let user = self.require_user(id)?;
        let assets = self.assets_owned_by(id)?;
        debug!(user_id = id, assets = assets.len(), "user profile read");
        Ok(UserProfile::new(user, assets))
    }

    /// Delete a user and retract it from the user index. What happens to
    /// its assets follows [`RegistryConfig::user_deletion`].
    pub fn delete_user(&self, id: &str) -> RegistryResult<UserDeletion> {
        self.require_user(id)?;
        let owned: Vec<String> = self
            .assets_owned_by(id)?
            .into_iter()
            .map(|a| a.asset_id)
            .collect();

        let mut deletion = UserDeletion {
            user_id: id.to_string(),
            deleted_assets: Vec::new(),
            orphaned_assets: Vec::new(),
        };
        match self.config.user_deletion {
            UserDeletionPolicy::RejectIfOwnsAssets if !owned.is_empty() => {
                warn!(user_id = id, assets = owned.len(), "refusing to delete user owning assets");
                return Err(RegistryError::invalid(format!(
                    "user {id} still owns assets: {}",
                    owned.join(", ")
                )));
            }
            UserDeletionPolicy::RejectIfOwnsAssets => {}
            UserDeletionPolicy::Cascade => {
                for asset_id in &owned {
                    self.remove_asset(asset_id)?;
                }
                deletion.deleted_assets = owned;
            }
            UserDeletionPolicy::Orphan => {
                deletion.orphaned_assets = owned;
            }
        }

        self.users().delete(id)?;
        self.retract(&self.user_index(), id)?;
        info!(
            user_id = id,
            cascaded = deletion.deleted_assets.len(),
            orphaned = deletion.orphaned_assets.len(),
            "user deleted"
        );
        Ok(deletion)
    }

    /// Every indexed user, in index order. Fails on the first index entry
    /// without a live user record.
    pub fn list_all_users(&self) -> RegistryResult<Vec<User>> {
        self.list_indexed::<User, Asset>(&self.user_index())
    }

    /// Every recorded version of a user, tombstones included. A deleted
    /// user keeps its history; an id that names an asset does not have one.
    pub fn user_history(&self, id: &str) -> RegistryResult<HistoryProjection<'l, User>> {
        self.history_of::<User, Asset>(id)
    }

    // ---------------------------------------------------------------
    // Assets
    // ---------------------------------------------------------------

    /// Create an asset owned by an existing user.
    pub fn add_asset(
        &self,
        id: &str,
        asset_type: &str,
        owner_user_id: &str,
    ) -> RegistryResult<Asset> {
        self.check_new_id("asset id", id)?;
        self.require_user(owner_user_id)?;

        let asset = Asset::new(id, asset_type, owner_user_id);
        self.assets().create(id, &asset)?;
        self.asset_index().append(id)?;
        info!(asset_id = id, owner = owner_user_id, "asset added");
        Ok(asset)
    }

    pub fn get_asset(&self, id: &str) -> RegistryResult<Asset> {
        let asset = self.require_asset(id)?;
        debug!(asset_id = id, "asset read");
        Ok(asset)
    }

    /// Delete an asset and retract it from the asset index.
    pub fn delete_asset(&self, id: &str) -> RegistryResult<Asset> {
        let asset = self.require_asset(id)?;
        self.remove_asset(id)?;
        info!(asset_id = id, "asset deleted");
        Ok(asset)
    }

    /// Every indexed asset, in index order. Fails on the first index entry
    /// without a live asset record.
    pub fn list_all_assets(&self) -> RegistryResult<Vec<Asset>> {
        self.list_indexed::<Asset, User>(&self.asset_index())
    }

    pub fn asset_history(&self, id: &str) -> RegistryResult<HistoryProjection<'l, Asset>> {
        self.history_of::<Asset, User>(id)
    }

    // ---------------------------------------------------------------
    // Transfer
    // ---------------------------------------------------------------

    /// Move `asset_id` to `to_user_id` and `amount` from the sender's
    /// balance to the receiver's.
    ///
    /// All three records are read and every precondition is checked before
    /// anything is written; the three writes then go to the ledger as one
    /// [`WriteBatch`].
    pub fn transfer_asset(
        &self,
        from_user_id: &str,
        to_user_id: &str,
        asset_id: &str,
        amount: i64,
    ) -> RegistryResult<TransferReceipt> {
        if amount < 0 {
            return Err(RegistryError::invalid(format!(
                "transfer amount must not be negative, got {amount}"
            )));
        }
        if from_user_id == to_user_id {
            return Err(RegistryError::invalid(format!(
                "cannot transfer from {from_user_id} to itself"
            )));
        }

        let mut from = self.require_user(from_user_id)?;
        let mut to = self.require_user(to_user_id)?;
        let mut asset = self.require_asset(asset_id)?;

        if self.config.require_current_owner && !asset.is_owned_by(from_user_id) {
            warn!(
                asset_id,
                owner = %asset.owner_user_id,
                from = from_user_id,
                "transfer by non-owner rejected"
            );
            return Err(RegistryError::invalid(format!(
                "asset {asset_id} is owned by {}, not {from_user_id}",
                asset.owner_user_id
            )));
        }

        let debited = from.balance.checked_sub(amount).ok_or_else(|| {
            RegistryError::invalid(format!(
                "debit of {amount} overflows the balance of {from_user_id}"
            ))
        })?;
        if debited < 0 && self.config.overdraft == OverdraftPolicy::Reject {
            return Err(RegistryError::InsufficientFunds {
                user_id: from_user_id.to_string(),
                balance: from.balance,
                amount,
            });
        }
        let credited = to.balance.checked_add(amount).ok_or_else(|| {
            RegistryError::invalid(format!(
                "credit of {amount} overflows the balance of {to_user_id}"
            ))
        })?;

        from.balance = debited;
        to.balance = credited;
        asset.owner_user_id = to_user_id.to_string();

        let batch = WriteBatch::new(TxId::new())
            .put(from_user_id, RecordCodec::encode_record(&from)?)
            .put(to_user_id, RecordCodec::encode_record(&to)?)
            .put(asset_id, RecordCodec::encode_record(&asset)?);
        self.ledger.write_batch(&batch)?;

        info!(
            from = from_user_id,
            to = to_user_id,
            asset_id,
            amount,
            "asset transferred"
        );
        Ok(TransferReceipt { from, to, asset })
    }

    // ---------------------------------------------------------------
    // Index audit
    // ---------------------------------------------------------------

    /// Report dangling and duplicate entries in both indexes without failing
    /// on them.
    pub fn verify_indexes(&self) -> RegistryResult<RegistryAudit> {
        let audit = RegistryAudit {
            users: self.audit_index::<User, Asset>(&self.user_index())?,
            assets: self.audit_index::<Asset, User>(&self.asset_index())?,
        };
        if !audit.is_clean() {
            warn!(
                dangling_users = audit.users.dangling.len(),
                dangling_assets = audit.assets.dangling.len(),
                "index drift detected"
            );
        }
        Ok(audit)
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    fn check_new_id(&self, what: &str, id: &str) -> RegistryResult<()> {
        validate_entity_id(id, &self.config.reserved_keys())
            .map_err(|e| RegistryError::invalid(format!("{what}: {e}")))
    }

    /// Look up a record of class `T` at `id`.
    ///
    /// Users and assets share one keyspace, so a key holding a record of the
    /// other class `O` reads as absent rather than malformed. Ids that could
    /// never be created (reserved or invalid) are absent too.
    fn lookup<T: Record, O: Record>(&self, id: &str) -> RegistryResult<Option<T>> {
        if validate_entity_id(id, &self.config.reserved_keys()).is_err() {
            return Ok(None);
        }
        match EntityStore::<T, L>::new(self.ledger).find(id) {
            Ok(found) => Ok(found),
            Err(StoreError::Decode { .. })
                if matches!(EntityStore::<O, L>::new(self.ledger).find(id), Ok(Some(_))) =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// History of `id` as class `T`. Invalid or reserved ids, and keys that
    /// currently hold a record of the other class `O`, are not found.
    fn history_of<T: Record, O: Record>(
        &self,
        id: &str,
    ) -> RegistryResult<HistoryProjection<'l, T>> {
        let not_found = || RegistryError::NotFound {
            kind: T::KIND,
            key: id.to_string(),
        };
        if validate_entity_id(id, &self.config.reserved_keys()).is_err() {
            return Err(not_found());
        }
        if self.ledger.exists(id)? && self.lookup::<T, O>(id)?.is_none() {
            return Err(not_found());
        }
        HistoryProjector::project(self.ledger, T::KIND, id)
    }

    fn require_user(&self, id: &str) -> RegistryResult<User> {
        self.lookup::<User, Asset>(id)?
            .ok_or_else(|| RegistryError::NotFound {
                kind: User::KIND,
                key: id.to_string(),
            })
    }

    fn require_asset(&self, id: &str) -> RegistryResult<Asset> {
        self.lookup::<Asset, User>(id)?
            .ok_or_else(|| RegistryError::NotFound {
                kind: Asset::KIND,
                key: id.to_string(),
            })
    }

    fn assets_owned_by(&self, user_id: &str) -> RegistryResult<Vec<Asset>> {
        Ok(self
            .list_all_assets()?
            .into_iter()
            .filter(|a| a.is_owned_by(user_id))
            .collect())
    }

    fn remove_asset(&self, id: &str) -> RegistryResult<()> {
        self.assets().delete(id)?;
        self.retract(&self.asset_index(), id)
    }

    fn retract(&self, index: &IndexList<'l, L>, key: &str) -> RegistryResult<()> {
        if !index.remove(key)? {
            warn!(index = index.list_key(), key, "deleted record was not indexed");
        }
        Ok(())
    }

    fn list_indexed<T: Record, O: Record>(
        &self,
        index: &IndexList<'l, L>,
    ) -> RegistryResult<Vec<T>> {
        index
            .load()?
            .into_iter()
            .map(|key| {
                self.lookup::<T, O>(&key)?.ok_or_else(|| {
                    warn!(index = index.list_key(), key = %key, "dangling index entry");
                    RegistryError::DanglingIndexEntry {
                        index: index.list_key().to_string(),
                        kind: T::KIND,
                        key,
                    }
                })
            })
            .collect()
    }

    fn audit_index<T: Record, O: Record>(
        &self,
        index: &IndexList<'l, L>,
    ) -> RegistryResult<IndexAudit> {
        let keys = index.load()?;
        let mut seen = HashSet::new();
        let mut dangling = Vec::new();
        let mut duplicates = Vec::new();

        for key in &keys {
            if !seen.insert(key.as_str()) {
                if !duplicates.contains(key) {
                    duplicates.push(key.clone());
                }
                continue;
            }
            match self.lookup::<T, O>(key) {
                Ok(Some(_)) => {}
                Ok(None) | Err(RegistryError::Malformed { .. }) => dangling.push(key.clone()),
                Err(e) => return Err(e),
            }
        }

        Ok(IndexAudit {
            index: index.list_key().to_string(),
            listed: keys.len(),
            dangling,
            duplicates,
        })
    }
}
