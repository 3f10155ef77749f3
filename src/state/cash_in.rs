use serde::{Deserialize, Serialize};

use super::LinearId;
use crate::encoding::{Canonical, CanonicalWriter};
use crate::identity::Party;

/// Cash moved from an affiliate account into a wallet account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashInState {
    pub linear_id: LinearId,
    pub affiliate_account: String,
    pub wallet_account: String,
    /// Decimal amount as entered; not interpreted by the ledger
    pub amount: String,
    pub sender: Party,
    pub receiver: Party,
}

impl Canonical for CashInState {
    fn encode(&self, out: &mut CanonicalWriter) {
        out.value(&self.linear_id)
            .str(&self.affiliate_account)
            .str(&self.wallet_account)
            .str(&self.amount)
            .value(&self.sender)
            .value(&self.receiver);
    }
}
