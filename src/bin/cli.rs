//! Accord CLI tool
//!
//! Key management, offline verification of exported transactions, and an
//! in-process demo network.

use accord::config::NodeConfig;
use accord::crypto::KeyPair;
use accord::flow::{Committed, FlowError, Proposal, ResponderOutcome, Sessions};
use accord::node::{connect, Network, Node};
use accord::state::{ContractId, KycProfile, LinearId, LoanApplication, LoanDecision};
use accord::transaction::verify_transaction_standalone;
use accord::vault::Vault;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Accord: multi-party ledger transactions with notarised finality
#[derive(Parser)]
#[command(name = "accord")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to identity file (default: ~/.accord/identity.key)
    #[arg(short, long)]
    identity: Option<PathBuf>,

    /// Path to config file (default: ~/.accord/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new identity keypair
    Init {
        /// Force overwrite existing identity
        #[arg(short, long)]
        force: bool,
    },

    /// Display your legal name and public key
    Identity,

    /// Verify an exported transaction
    Verify {
        /// Path to transaction JSON file
        transaction_file: PathBuf,
    },

    /// Print the effective configuration
    Config,

    /// Run a wallet, a bank and a notary in-process
    Demo {
        /// Write the approved loan transaction here
        #[arg(short, long)]
        export: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("accord=info")),
        )
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(|| data_dir().join("config.json"));
    let config = NodeConfig::load_or_default(&config_path).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let identity_path = cli
        .identity
        .or_else(|| config.identity_path.clone())
        .unwrap_or_else(|| data_dir().join("identity.key"));

    match cli.command {
        Commands::Init { force } => cmd_init(&identity_path, &config_path, &config, force),
        Commands::Identity => cmd_identity(&identity_path, &config),
        Commands::Verify { transaction_file } => cmd_verify(&transaction_file),
        Commands::Config => println!("{}", config.to_json()),
        Commands::Demo { export } => cmd_demo(&config, export.as_deref()).await,
    }
}

fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".accord")
}

fn load_identity(path: &Path) -> KeyPair {
    let bytes = fs::read(path).unwrap_or_else(|_| {
        eprintln!("Error: No identity found at {:?}", path);
        eprintln!("Run 'accord init' to create one.");
        std::process::exit(1);
    });

    KeyPair::from_bytes(&bytes).unwrap_or_else(|e| {
        eprintln!("Error: Invalid identity file: {}", e);
        std::process::exit(1);
    })
}

fn write_file(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap_or_else(|e| {
            eprintln!("Error creating directory: {}", e);
            std::process::exit(1);
        });
    }

    fs::write(path, contents).unwrap_or_else(|e| {
        eprintln!("Error writing {:?}: {}", path, e);
        std::process::exit(1);
    });
}

fn cmd_init(path: &Path, config_path: &Path, config: &NodeConfig, force: bool) {
    if path.exists() && !force {
        eprintln!("Identity already exists at {:?}", path);
        eprintln!("Use --force to overwrite.");
        std::process::exit(1);
    }

    let keys = KeyPair::generate();
    write_file(path, &keys.to_bytes());
    if !config_path.exists() {
        write_file(config_path, config.to_json().as_bytes());
    }

    println!("Identity created successfully!");
    println!();
    println!("Legal name: {}", config.legal_name);
    println!("Owning key (register this on the network map):");
    println!("{}", keys.public_key().to_hex());
    println!();
    println!("Identity saved to: {:?}", path);
    println!("Config at: {:?}", config_path);
    println!();
    println!("IMPORTANT: Back up your identity file securely!");
}

fn cmd_identity(path: &Path, config: &NodeConfig) {
    let keys = load_identity(path);

    println!("Legal name: {}", config.legal_name);
    println!("Owning key: {}", keys.public_key().to_hex());
}

fn cmd_verify(path: &Path) {
    let json = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading transaction: {}", e);
        std::process::exit(1);
    });

    let report = verify_transaction_standalone(&json).unwrap_or_else(|e| {
        eprintln!("[INVALID] {}", e);
        std::process::exit(1);
    });

    println!("=== Transaction Verification Report ===");
    println!();
    println!("Transaction Id: {}", report.tx_id);
    match &report.contract_verdict {
        Ok(()) => println!("Contracts:      [VALID]"),
        Err(violation) => println!("Contracts:      [REJECTED] {}", violation),
    }
    println!("Notarised:      {}", if report.is_notarised { "yes" } else { "no" });
    println!();
    println!("--- Participants ---");
    for party in &report.signed_parties {
        println!("  [SIGNED]  {} ({})", party.name, party.owning_key.short());
    }
    for party in &report.unsigned_parties {
        println!("  [PENDING] {} ({})", party.name, party.owning_key.short());
    }
    if !report.missing_keys.is_empty() {
        println!();
        println!("Missing signatures from {} key(s)", report.missing_keys.len());
    }
    println!();

    if report.is_complete() {
        println!("Result: transaction is valid and fully signed.");
    } else {
        println!("Result: transaction is NOT complete.");
        std::process::exit(2);
    }
}

/// One proposal from `from`, answered by `to`
async fn transact(from: &Node, to: &Node, proposal: &Proposal) -> Result<Committed, FlowError> {
    let (ours, mut theirs) = connect(from, to);
    let responder = to.responder();
    let mut initiator = from.initiator(Sessions::from_iter([ours]));

    let (result, answered) = tokio::join!(initiator.run(proposal), responder.respond(&mut theirs));
    if let Err(e) = answered {
        warn!(party = %to.party(), error = %e, "responder failed");
    }
    result
}

fn report(step: &str, result: &Result<Committed, FlowError>) {
    match result {
        Ok(committed) => println!(
            "  {} committed as {} ({} undelivered)",
            step,
            committed.transaction.id().short(),
            committed.undelivered.len()
        ),
        Err(e) => println!("  {} rejected [{}]: {}", step, e.kind(), e),
    }
}

async fn cmd_demo(config: &NodeConfig, export: Option<&Path>) {
    println!("=== Accord-Lite Demo ===");
    println!();

    let network = Network::new(
        "O=Notary, L=Manila, C=PH",
        KeyPair::generate(),
        config.flow.clone(),
    );
    let wallet = network.node("O=Koala Wallet, L=Manila, C=PH", KeyPair::generate());
    let bank = network.node("O=Partner Bank, L=Makati, C=PH", KeyPair::generate());
    let bank_name = bank.party().name.clone();
    println!("Wallet: {}", wallet.party().owning_key.short());
    println!("Bank:   {}", bank.party().owning_key.short());
    println!();

    println!("--- Step 1: Cash-in ---");
    let cash_in = Proposal::CashIn {
        counterparty: bank_name.clone(),
        affiliate_account: "AFF-0001".to_string(),
        wallet_account: "WAL-0091".to_string(),
        amount: "5000.00".to_string(),
    };
    report("cash-in", &transact(&wallet, &bank, &cash_in).await);

    println!("--- Step 2: KYC ---");
    let kyc = Proposal::Kyc {
        counterparty: bank_name.clone(),
        account_id: 91,
        profile: KycProfile {
            lastname: "Dela Cruz".to_string(),
            firstname: "Juan".to_string(),
            nationality: "Filipino".to_string(),
            occupation: "Shop owner".to_string(),
            ..Default::default()
        },
    };
    let kyc_result = transact(&wallet, &bank, &kyc).await;
    report("kyc", &kyc_result);
    let kyc_id = kyc_result
        .ok()
        .and_then(|c| c.transaction.tx.outputs.first().map(|s| s.linear_id()))
        .unwrap_or_else(LinearId::generate);

    println!("--- Step 3: Loan request ---");
    let request = Proposal::LoanRequest {
        counterparty: bank_name.clone(),
        application: LoanApplication {
            wallet_account_id: 91,
            purpose: "Store inventory".to_string(),
            amount: "25000".to_string(),
            payment_terms: "12 months".to_string(),
            occupation: "Shop owner".to_string(),
            gross_income: "30000".to_string(),
            kyc_id,
        },
    };
    let requested = transact(&wallet, &bank, &request).await;
    report("loan request", &requested);
    let Some(loan_id) = requested
        .ok()
        .and_then(|c| c.transaction.tx.outputs.first().map(|s| s.linear_id()))
    else {
        eprintln!("Demo stopped: loan request failed");
        std::process::exit(1);
    };

    println!("--- Step 4: Rejected without remarks ---");
    let careless = Proposal::LoanDecision {
        linear_id: loan_id,
        decision: LoanDecision {
            approve: true,
            remarks: String::new(),
            credit_score: None,
        },
    };
    report("approval", &transact(&bank, &wallet, &careless).await);

    println!("--- Step 5: Two racing decisions ---");
    let decide = |approve: bool, remarks: &str| Proposal::LoanDecision {
        linear_id: loan_id,
        decision: LoanDecision {
            approve,
            remarks: remarks.to_string(),
            credit_score: Some("720".to_string()),
        },
    };
    let (first_ours, mut first_theirs) = connect(&bank, &wallet);
    let (second_ours, mut second_theirs) = connect(&bank, &wallet);
    let responder = wallet.responder().expecting(ContractId::Loan);
    let mut first = bank.initiator(Sessions::from_iter([first_ours]));
    let mut second = bank.initiator(Sessions::from_iter([second_ours]));

    let race = async {
        let approved = first.negotiate(&decide(true, "Good standing")).await?;
        let rejected = second.negotiate(&decide(false, "Changed our mind")).await?;
        let winner = first.finalise(approved).await;
        let loser = second.finalise(rejected).await;
        Ok::<_, FlowError>((winner, loser))
    };
    let (race, first_answer, second_answer) = tokio::join!(
        race,
        responder.respond(&mut first_theirs),
        responder.respond(&mut second_theirs)
    );
    let (winner, loser) = race.unwrap_or_else(|e| {
        eprintln!("Demo stopped: {}", e);
        std::process::exit(1);
    });
    report("approval", &winner);
    report("rejection", &loser);
    if let Ok(ResponderOutcome::Recorded(stx)) = &first_answer {
        println!("  wallet recorded {}", stx.id().short());
    }
    if let Ok(ResponderOutcome::Abandoned { reason }) = &second_answer {
        println!("  wallet saw the losing flow abandoned: {}", reason);
    }

    println!();
    println!("--- Vaults ---");
    for node in [&wallet, &bank] {
        let live = node.vault().unconsumed(None).unwrap_or_default();
        println!("  {}: {} live record(s)", node.party(), live.len());
    }

    if let (Some(path), Ok(committed)) = (export, &winner) {
        fs::write(path, committed.transaction.export()).unwrap_or_else(|e| {
            eprintln!("Error exporting transaction: {}", e);
            std::process::exit(1);
        });
        println!();
        println!("Approved loan exported to {:?}; check it with 'accord verify'.", path);
    }
}
