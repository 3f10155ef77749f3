use super::{command_for, CommandData, LoanCommand, Requirements, VerifyResult};
use crate::state::{ContractId, State};
use crate::transaction::Transaction;

pub(super) fn verify(tx: &Transaction) -> VerifyResult {
    let Some((CommandData::Loan(command), signers)) = command_for(tx, ContractId::Loan) else {
        return Ok(());
    };
    let req = Requirements::new(ContractId::Loan);

    match command {
        LoanCommand::Request => {
            let output = req.single_output(tx, State::as_loan)?;
            req.issuance(tx, &output.sender, &output.receiver, signers)?;
            req.using("The loan purpose cannot be empty.", !output.purpose.is_empty())?;
            req.using("The loan amount cannot be empty.", !output.amount.is_empty())?;
            req.using(
                "A new loan request cannot already be decided.",
                output.is_pending(),
            )
        }
        LoanCommand::Approve => verify_decision(&req, tx),
    }
}

fn verify_decision(req: &Requirements, tx: &Transaction) -> VerifyResult {
    let input = match tx.inputs.as_slice() {
        [only] => only.state.as_loan(),
        _ => None,
    };
    let Some(input) = input else {
        return Err(req.violation("A loan decision must consume exactly one loan record."));
    };
    let output = req.single_output(tx, State::as_loan)?;

    req.using(
        "The decided loan must keep the linear id of the request.",
        input.linear_id == output.linear_id,
    )?;
    if output.approved {
        req.present(
            "An approved loan must carry an approval date.",
            output.date_approved,
        )?;
        req.using(
            "An approved loan cannot carry a rejection date.",
            output.date_rejected.is_none(),
        )?;
    } else {
        req.present(
            "A rejected loan must carry a rejection date.",
            output.date_rejected,
        )?;
        req.using(
            "A rejected loan cannot carry an approval date.",
            output.date_approved.is_none(),
        )?;
    }
    req.using("Remarks cannot be empty.", !output.remarks.is_empty())
}
