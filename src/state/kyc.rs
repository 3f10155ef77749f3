use serde::{Deserialize, Serialize};

use super::LinearId;
use crate::encoding::{Canonical, CanonicalWriter};
use crate::identity::Party;

/// Personal details captured during customer onboarding
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycProfile {
    pub lastname: String,
    pub firstname: String,
    pub middlename: String,
    pub birthday: String,
    pub permanent_address: String,
    pub current_address: String,
    pub fathername: String,
    pub mothername: String,
    pub gender: String,
    pub contact_no: String,
    pub marital_status: String,
    pub nationality: String,
    pub occupation: String,
    pub income: String,
}

impl Canonical for KycProfile {
    fn encode(&self, out: &mut CanonicalWriter) {
        for field in [
            &self.lastname,
            &self.firstname,
            &self.middlename,
            &self.birthday,
            &self.permanent_address,
            &self.current_address,
            &self.fathername,
            &self.mothername,
            &self.gender,
            &self.contact_no,
            &self.marital_status,
            &self.nationality,
            &self.occupation,
            &self.income,
        ] {
            out.str(field);
        }
    }
}

/// A customer's KYC record, shared between the wallet and the verifying bank
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycState {
    pub linear_id: LinearId,
    pub account_id: u64,
    pub profile: KycProfile,
    pub sender: Party,
    pub receiver: Party,
}

impl Canonical for KycState {
    fn encode(&self, out: &mut CanonicalWriter) {
        out.value(&self.linear_id)
            .u64(self.account_id)
            .value(&self.profile)
            .value(&self.sender)
            .value(&self.receiver);
    }
}
