use serde::{Deserialize, Serialize};

/// An authenticated account as the identity provider reports it.
/// `email_verified` is the provider's live claim and is the only source the UI gates on.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
}
