use super::{command_for, CashInCommand, CommandData, Requirements, VerifyResult};
use crate::state::{ContractId, State};
use crate::transaction::Transaction;

pub(super) fn verify(tx: &Transaction) -> VerifyResult {
    let Some((CommandData::CashIn(command), signers)) = command_for(tx, ContractId::CashIn) else {
        return Ok(());
    };
    let req = Requirements::new(ContractId::CashIn);

    match command {
        CashInCommand::Send => {
            let output = req.single_output(tx, State::as_cash_in)?;
            req.issuance(tx, &output.sender, &output.receiver, signers)?;
            req.using(
                "The affiliate account cannot be empty.",
                !output.affiliate_account.is_empty(),
            )?;
            req.using(
                "The wallet account cannot be empty.",
                !output.wallet_account.is_empty(),
            )
        }
    }
}
