use super::{command_for, CommandData, KycCommand, Requirements, VerifyResult};
use crate::state::{ContractId, State};
use crate::transaction::Transaction;

pub(super) fn verify(tx: &Transaction) -> VerifyResult {
    let Some((CommandData::Kyc(command), signers)) = command_for(tx, ContractId::Kyc) else {
        return Ok(());
    };
    let req = Requirements::new(ContractId::Kyc);

    match command {
        KycCommand::Submit => {
            let output = req.single_output(tx, State::as_kyc)?;
            req.issuance(tx, &output.sender, &output.receiver, signers)?;
            req.using(
                "The last name cannot be empty.",
                !output.profile.lastname.is_empty(),
            )?;
            req.using(
                "The first name cannot be empty.",
                !output.profile.firstname.is_empty(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::contract::{verify, CommandData, KycCommand};
    use crate::identity::Party;
    use crate::state::fixtures::*;
    use crate::state::{KycProfile, KycState, LinearId};
    use crate::transaction::{Transaction, TransactionBuilder};

    fn profile() -> KycProfile {
        KycProfile {
            lastname: "Dela Cruz".to_string(),
            firstname: "Juan".to_string(),
            birthday: "1990-01-01".to_string(),
            nationality: "Filipino".to_string(),
            ..Default::default()
        }
    }

    fn submit(profile: KycProfile, sender: &Party, receiver: &Party) -> Transaction {
        let (_, notary) = party(9, "O=Notary");
        TransactionBuilder::new(notary)
            .add_output_state(KycState {
                linear_id: LinearId::generate(),
                account_id: 91,
                profile,
                sender: sender.clone(),
                receiver: receiver.clone(),
            })
            .add_command(
                CommandData::Kyc(KycCommand::Submit),
                vec![sender.owning_key, receiver.owning_key],
            )
            .to_transaction()
    }

    #[test]
    fn test_valid_submit() {
        let (_, wallet) = party(1, "O=Wallet");
        let (_, bank) = party(2, "O=Bank");
        assert!(verify(&submit(profile(), &wallet, &bank)).is_ok());
    }

    #[test]
    fn test_names_required() {
        let (_, wallet) = party(1, "O=Wallet");
        let (_, bank) = party(2, "O=Bank");

        let err = verify(&submit(
            KycProfile {
                lastname: String::new(),
                ..profile()
            },
            &wallet,
            &bank,
        ))
        .unwrap_err();
        assert_eq!(err.reason, "The last name cannot be empty.");

        let err = verify(&submit(
            KycProfile {
                firstname: String::new(),
                ..profile()
            },
            &wallet,
            &bank,
        ))
        .unwrap_err();
        assert_eq!(err.reason, "The first name cannot be empty.");
    }

    #[test]
    fn test_submit_to_self_rejected() {
        let (_, wallet) = party(1, "O=Wallet");
        let err = verify(&submit(profile(), &wallet, &wallet)).unwrap_err();
        assert!(err.reason.contains("same entity"));
    }
}
