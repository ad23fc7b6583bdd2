use std::fmt;
use std::str::FromStr;

use crate::error::HostError;

/// A registry operation callable through the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Function {
    Init,
    AddUser,
    Deposit,
    DeleteUser,
    GetUser,
    GetUserHistory,
    AddAsset,
    TransferAsset,
    GetAsset,
    GetAssetHistory,
    ListAllUsers,
    ListAllAssets,
    DeleteAsset,
    VerifyIndexes,
}

impl Function {
    pub const ALL: [Function; 14] = [
        Function::Init,
        Function::AddUser,
        Function::Deposit,
        Function::DeleteUser,
        Function::GetUser,
        Function::GetUserHistory,
        Function::AddAsset,
        Function::TransferAsset,
        Function::GetAsset,
        Function::GetAssetHistory,
        Function::ListAllUsers,
        Function::ListAllAssets,
        Function::DeleteAsset,
        Function::VerifyIndexes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Function::Init => "Init",
            Function::AddUser => "AddUser",
            Function::Deposit => "Deposit",
            Function::DeleteUser => "DeleteUser",
            Function::GetUser => "GetUser",
            Function::GetUserHistory => "GetUserHistory",
            Function::AddAsset => "AddAsset",
            Function::TransferAsset => "TransferAsset",
            Function::GetAsset => "GetAsset",
            Function::GetAssetHistory => "GetAssetHistory",
            Function::ListAllUsers => "ListAllUsers",
            Function::ListAllAssets => "ListAllAssets",
            Function::DeleteAsset => "DeleteAsset",
            Function::VerifyIndexes => "VerifyIndexes",
        }
    }

    /// Legacy lowercase name accepted in place of [`name`](Self::name).
    pub fn alias(self) -> Option<&'static str> {
        match self {
            Function::Init | Function::VerifyIndexes => None,
            Function::AddUser => Some("adduser"),
            Function::Deposit => Some("addAmount"),
            Function::DeleteUser => Some("deleteuser"),
            Function::GetUser => Some("getuser"),
            Function::GetUserHistory => Some("getuserhistory"),
            Function::AddAsset => Some("addasset"),
            Function::TransferAsset => Some("exchangeasset"),
            Function::GetAsset => Some("getasset"),
            Function::GetAssetHistory => Some("getassethistory"),
            Function::ListAllUsers => Some("getallusers"),
            Function::ListAllAssets => Some("getallassets"),
            Function::DeleteAsset => Some("deleteasset"),
        }
    }

    /// Positional parameter names, in call order.
    pub fn params(self) -> &'static [&'static str] {
        match self {
            Function::Init
            | Function::ListAllUsers
            | Function::ListAllAssets
            | Function::VerifyIndexes => &[],
            Function::AddUser => &["user_id", "name", "surname", "balance"],
            Function::Deposit => &["user_id", "amount"],
            Function::DeleteUser | Function::GetUser | Function::GetUserHistory => &["user_id"],
            Function::AddAsset => &["asset_id", "asset_type", "owner_user_id"],
            Function::TransferAsset => &["from_user_id", "to_user_id", "asset_id", "amount"],
            Function::GetAsset | Function::GetAssetHistory | Function::DeleteAsset => &["asset_id"],
        }
    }

    pub fn arity(self) -> usize {
        self.params().len()
    }

    /// Whether the function never writes.
    pub fn is_read_only(self) -> bool {
        matches!(
            self,
            Function::GetUser
                | Function::GetUserHistory
                | Function::GetAsset
                | Function::GetAssetHistory
                | Function::ListAllUsers
                | Function::ListAllAssets
                | Function::VerifyIndexes
        )
    }

    /// Check the argument count against [`params`](Self::params).
    pub fn check_args<S: AsRef<str>>(self, args: &[S]) -> Result<(), HostError> {
        if args.len() == self.arity() {
            return Ok(());
        }
        Err(HostError::ArgumentCount {
            function: self.name(),
            params: self.params().join(", "),
            expected: self.arity(),
            got: args.len(),
        })
    }

    /// Parse the integer argument at `index`.
    pub fn integer_arg<S: AsRef<str>>(self, args: &[S], index: usize) -> Result<i64, HostError> {
        let raw = args[index].as_ref();
        raw.parse().map_err(|_| HostError::InvalidNumber {
            function: self.name(),
            param: self.params()[index],
            value: raw.to_string(),
        })
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Function {
    type Err = HostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Function::ALL
            .into_iter()
            .find(|f| f.name() == s || f.alias() == Some(s))
            .ok_or_else(|| HostError::UnknownFunction(s.to_string()))
    }
}
