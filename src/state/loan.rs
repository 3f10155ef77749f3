use serde::{Deserialize, Serialize};

use super::LinearId;
use crate::encoding::{Canonical, CanonicalWriter};
use crate::identity::Party;

/// What a borrower submits when requesting a loan
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub wallet_account_id: u64,
    pub purpose: String,
    pub amount: String,
    pub payment_terms: String,
    pub occupation: String,
    pub gross_income: String,
    /// KYC record backing the application
    pub kyc_id: LinearId,
}

/// The lender's verdict on a pending loan
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanDecision {
    pub approve: bool,
    /// Justification recorded with the verdict; must not be empty
    pub remarks: String,
    pub credit_score: Option<String>,
}

/// A loan between a wallet holder (sender) and a lender (receiver).
///
/// Created pending by a request, then superseded by exactly one decided
/// version. `date_approved` and `date_rejected` are mutually exclusive and set
/// according to `approved`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanState {
    pub linear_id: LinearId,
    pub wallet_account_id: u64,
    pub purpose: String,
    pub amount: String,
    pub payment_terms: String,
    pub occupation: String,
    pub gross_income: String,
    pub kyc_id: LinearId,
    pub approved: bool,
    pub date_requested: u64,
    pub date_approved: Option<u64>,
    pub date_rejected: Option<u64>,
    pub remarks: String,
    pub credit_score: Option<String>,
    pub paid_remarks: Option<String>,
    pub date_paid: Option<u64>,
    pub sender: Party,
    pub receiver: Party,
}

impl LoanState {
    /// A fresh pending loan
    pub fn request(application: LoanApplication, sender: Party, receiver: Party, now: u64) -> Self {
        LoanState {
            linear_id: LinearId::generate(),
            wallet_account_id: application.wallet_account_id,
            purpose: application.purpose,
            amount: application.amount,
            payment_terms: application.payment_terms,
            occupation: application.occupation,
            gross_income: application.gross_income,
            kyc_id: application.kyc_id,
            approved: false,
            date_requested: now,
            date_approved: None,
            date_rejected: None,
            remarks: String::new(),
            credit_score: None,
            paid_remarks: None,
            date_paid: None,
            sender,
            receiver,
        }
    }

    /// The next version of this loan after `decision`.
    ///
    /// Everything not touched by the decision is carried forward; `self` is
    /// left as it was.
    pub fn decide(&self, decision: LoanDecision, now: u64) -> LoanState {
        LoanState {
            approved: decision.approve,
            date_approved: decision.approve.then_some(now),
            date_rejected: (!decision.approve).then_some(now),
            remarks: decision.remarks,
            credit_score: decision.credit_score,
            ..self.clone()
        }
    }

    /// Still awaiting a decision
    pub fn is_pending(&self) -> bool {
        self.date_approved.is_none() && self.date_rejected.is_none()
    }
}

impl Canonical for LoanState {
    fn encode(&self, out: &mut CanonicalWriter) {
        out.value(&self.linear_id)
            .u64(self.wallet_account_id)
            .str(&self.purpose)
            .str(&self.amount)
            .str(&self.payment_terms)
            .str(&self.occupation)
            .str(&self.gross_income)
            .value(&self.kyc_id)
            .bool(self.approved)
            .u64(self.date_requested)
            .opt_u64(self.date_approved)
            .opt_u64(self.date_rejected)
            .str(&self.remarks)
            .opt_str(self.credit_score.as_deref())
            .opt_str(self.paid_remarks.as_deref())
            .opt_u64(self.date_paid)
            .value(&self.sender)
            .value(&self.receiver);
    }
}
