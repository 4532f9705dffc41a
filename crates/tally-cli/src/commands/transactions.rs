//! Transactions command - list ledger entries.

use clap::Args;
use console::style;

use tally_core::{Ingestor, Transaction, TransactionFilter, TransactionKind};

use super::{load_config, OutputFormat, DEFAULT_USER};

/// Arguments for the transactions command.
#[derive(Args)]
pub struct TransactionsArgs {
    /// Owner of the transactions
    #[arg(short, long, default_value = DEFAULT_USER)]
    user: String,

    /// Only `income` or `expense` entries
    #[arg(short, long)]
    kind: Option<TransactionKind>,

    /// Only entries in this category (case-insensitive)
    #[arg(long)]
    category: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

pub async fn run(args: TransactionsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let ingestor = Ingestor::records_from_config(&config)?;

    let filter = TransactionFilter {
        kind: args.kind,
        category: args.category,
    };
    let transactions = ingestor.transactions(&args.user, &filter)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&transactions)?),
        OutputFormat::Csv => print!("{}", format_csv(&transactions)?),
        OutputFormat::Text => {
            if transactions.is_empty() {
                println!("{} No transactions for {}", style("ℹ").blue(), args.user);
            }
            for tx in &transactions {
                println!(
                    "{}  {:<7}  {:>10}  {:<16}  {}",
                    tx.date.format("%Y-%m-%d"),
                    kind_label(tx),
                    tx.amount,
                    tx.category,
                    tx.description
                );
            }
        }
    }

    Ok(())
}

fn kind_label(tx: &Transaction) -> &'static str {
    match tx.kind {
        TransactionKind::Income => "income",
        TransactionKind::Expense => "expense",
    }
}

fn format_csv(transactions: &[Transaction]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "id",
        "date",
        "kind",
        "amount",
        "category",
        "description",
        "receipt_id",
    ])?;

    for tx in transactions {
        wtr.write_record([
            &tx.id.to_string(),
            &tx.date.to_rfc3339(),
            kind_label(tx),
            &tx.amount.to_string(),
            &tx.category,
            &tx.description,
            &tx.receipt_id.map(|id| id.to_string()).unwrap_or_default(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}
