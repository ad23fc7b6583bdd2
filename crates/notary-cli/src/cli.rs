use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "notary",
    about = "Notary registry: users, assets and their ledger history",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Ledger state file, created on first write
    #[arg(long, global = true, default_value = "notary-state.json")]
    pub state: PathBuf,

    /// Host configuration (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write empty user and asset indexes
    Init,
    /// Register a user
    AddUser(AddUserArgs),
    /// Add to (or, with a negative amount, withdraw from) a user's balance
    Deposit(AmountArgs),
    /// Delete a user
    DeleteUser(UserArgs),
    /// Show a user and the assets it owns
    GetUser(UserArgs),
    /// Show every recorded version of a user
    UserHistory(UserArgs),
    /// Register an asset owned by an existing user
    AddAsset(AddAssetArgs),
    /// Move an asset and a payment between users
    Transfer(TransferArgs),
    /// Show an asset
    GetAsset(AssetArgs),
    /// Show every recorded version of an asset
    AssetHistory(AssetArgs),
    /// List users in index order
    ListUsers,
    /// List assets in index order
    ListAssets,
    /// Delete an asset
    DeleteAsset(AssetArgs),
    /// Check both indexes for dangling and duplicate entries
    Verify,
    /// Call a registry function by name
    Invoke(InvokeArgs),
}

#[derive(Args)]
pub struct AddUserArgs {
    pub user_id: String,
    pub name: String,
    pub surname: String,
    #[arg(default_value_t = 0, allow_negative_numbers = true)]
    pub balance: i64,
}

#[derive(Args)]
pub struct AmountArgs {
    pub user_id: String,
    #[arg(allow_negative_numbers = true)]
    pub amount: i64,
}

#[derive(Args)]
pub struct UserArgs {
    pub user_id: String,
}

#[derive(Args)]
pub struct AddAssetArgs {
    pub asset_id: String,
    pub asset_type: String,
    pub owner_user_id: String,
}

#[derive(Args)]
pub struct TransferArgs {
    pub from_user_id: String,
    pub to_user_id: String,
    pub asset_id: String,
    #[arg(default_value_t = 0)]
    pub amount: i64,
}

#[derive(Args)]
pub struct AssetArgs {
    pub asset_id: String,
}

#[derive(Args)]
pub struct InvokeArgs {
    /// Function name, e.g. TransferAsset or exchangeasset
    pub function: String,
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Command {
    /// Host function name and positional arguments for this command.
    pub fn invocation(&self) -> (String, Vec<String>) {
        let (function, args): (&str, Vec<String>) = match self {
            Command::Init => ("Init", vec![]),
            Command::AddUser(a) => (
                "AddUser",
                vec![
                    a.user_id.clone(),
                    a.name.clone(),
                    a.surname.clone(),
                    a.balance.to_string(),
                ],
            ),
            Command::Deposit(a) => ("Deposit", vec![a.user_id.clone(), a.amount.to_string()]),
            Command::DeleteUser(a) => ("DeleteUser", vec![a.user_id.clone()]),
            Command::GetUser(a) => ("GetUser", vec![a.user_id.clone()]),
            Command::UserHistory(a) => ("GetUserHistory", vec![a.user_id.clone()]),
            Command::AddAsset(a) => (
                "AddAsset",
                vec![a.asset_id.clone(), a.asset_type.clone(), a.owner_user_id.clone()],
            ),
            Command::Transfer(a) => (
                "TransferAsset",
                vec![
                    a.from_user_id.clone(),
                    a.to_user_id.clone(),
                    a.asset_id.clone(),
                    a.amount.to_string(),
                ],
            ),
            Command::GetAsset(a) => ("GetAsset", vec![a.asset_id.clone()]),
            Command::AssetHistory(a) => ("GetAssetHistory", vec![a.asset_id.clone()]),
            Command::ListUsers => ("ListAllUsers", vec![]),
            Command::ListAssets => ("ListAllAssets", vec![]),
            Command::DeleteAsset(a) => ("DeleteAsset", vec![a.asset_id.clone()]),
            Command::Verify => ("VerifyIndexes", vec![]),
            Command::Invoke(a) => (a.function.as_str(), a.args.clone()),
        };
        (function.to_string(), args)
    }
}
