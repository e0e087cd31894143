//! split-engine CLI
//!
//! Split expenses and settle a group's debts from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Per-expense shares
//! split-engine allocate --input group.json
//!
//! # Net balances, as JSON
//! split-engine balances --input group.json --format json
//!
//! # Settling transactions, overriding the group's strategy
//! split-engine settle --input group.json --strategy direct
//!
//! # Generate a random group history for testing
//! split-engine generate --participants 6 --expenses 40 --seed 7
//! ```
//!
//! Set `RUST_LOG=split_engine=debug` for diagnostics on stderr.

use chrono::NaiveDate;
use split_engine::allocation::ShareAllocator;
use split_engine::analysis::spending::SpendingSummary;
use split_engine::core::amount::{format_minor, DEFAULT_DECIMALS};
use split_engine::core::expense::{Expense, ExpenseSet, SplitPolicy};
use split_engine::core::participant::ParticipantId;
use split_engine::settlement::{
    aggregate_balances, GroupSettings, SettlementEngine, SettlementStrategy,
};
use split_engine::simulation::expense_generator::{generate_random_expenses, ExpenseNetworkConfig};
use std::fs;
use std::process;
use uuid::Uuid;

fn print_usage() {
    eprintln!(
        r#"split-engine — deterministic expense splitting and debt settlement

USAGE:
    split-engine <COMMAND> [OPTIONS]

COMMANDS:
    allocate    Show each expense's exact per-participant shares
    balances    Aggregate net balances over all expenses
    settle      Compute the transactions that settle all balances
    summary     Show group spending and each participant's share of it
    generate    Generate a random group history (for testing)
    help        Show this message

OPTIONS (allocate, balances, settle, summary):
    --input <FILE>         Path to JSON group file
    --format <FORMAT>      Output format: text (default) or json
    --decimals <N>         Decimal places of the currency (default: 2)
    --strategy <NAME>      settle only: direct or simplified
                           (default: the group's simplify_debts setting)

OPTIONS (generate):
    --participants <N>     Number of participants (default: 5)
    --expenses <N>         Number of expenses (default: 20)
    --seed <N>             Seed for a reproducible history
    --output <FILE>        Write to file instead of stdout

EXAMPLES:
    split-engine settle --input group.json
    split-engine settle --input group.json --strategy direct --format json
    split-engine balances --input group.json --decimals 0
    split-engine generate --participants 4 --expenses 10 --output group.json"#
    );
}

/// JSON schema for an input expense. Amounts are in minor units.
#[derive(serde::Deserialize)]
struct ExpenseInput {
    #[serde(default)]
    id: Option<Uuid>,
    amount: i64,
    #[serde(default = "default_policy")]
    split_policy: SplitPolicy,
    #[serde(default)]
    is_reimbursement: bool,
    payers: Vec<PayerInput>,
    paid_for: Vec<PaidForInput>,
    #[serde(default)]
    date: Option<NaiveDate>,
}

#[derive(serde::Deserialize)]
struct PayerInput {
    participant: String,
    amount: i64,
}

#[derive(serde::Deserialize)]
struct PaidForInput {
    participant: String,
    #[serde(default = "default_weight")]
    weight: i64,
}

fn default_policy() -> SplitPolicy {
    SplitPolicy::Evenly
}

fn default_weight() -> i64 {
    1
}

#[derive(serde::Deserialize)]
struct GroupFile {
    #[serde(default)]
    settings: GroupSettings,
    expenses: Vec<ExpenseInput>,
}

/// JSON output schema for a participant's balance.
#[derive(serde::Serialize)]
struct BalanceOutput {
    participant: String,
    paid: i64,
    owed: i64,
    total: i64,
    status: String,
}

#[derive(serde::Serialize)]
struct AllocationOutput {
    expense: String,
    amount: i64,
    split_policy: String,
    shares: Vec<ShareOutput>,
}

#[derive(serde::Serialize)]
struct ShareOutput {
    participant: String,
    share: i64,
}

struct CommonOptions {
    input: String,
    json: bool,
    decimals: u32,
    strategy: Option<SettlementStrategy>,
}

fn parse_common(args: &[String], allow_strategy: bool) -> CommonOptions {
    let mut input_path = None;
    let mut format = "text".to_string();
    let mut decimals = DEFAULT_DECIMALS;
    let mut strategy = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--input requires a file path");
                    process::exit(1);
                }));
            }
            "--format" => {
                i += 1;
                format = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--format requires 'text' or 'json'");
                    process::exit(1);
                });
            }
            "--decimals" => {
                i += 1;
                decimals = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| {
                        eprintln!("--decimals requires a number");
                        process::exit(1);
                    });
            }
            "--strategy" if allow_strategy => {
                i += 1;
                let name = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--strategy requires 'direct' or 'simplified'");
                    process::exit(1);
                });
                strategy = Some(name.parse::<SettlementStrategy>().unwrap_or_else(|e| {
                    eprintln!("{}", e);
                    process::exit(1);
                }));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let input = input_path.unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });

    CommonOptions {
        input,
        json: format == "json",
        decimals,
        strategy,
    }
}

fn load_group(path: &str) -> (GroupSettings, ExpenseSet) {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        process::exit(1);
    });

    let file: GroupFile = serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "settings": {{ "simplify_debts": true }},
  "expenses": [
    {{ "amount": 9000, "split_policy": "evenly",
      "payers": [{{ "participant": "alice", "amount": 9000 }}],
      "paid_for": [{{ "participant": "alice" }}, {{ "participant": "bob" }}] }}
  ]
}}"#
        );
        process::exit(1);
    });

    let expenses = file
        .expenses
        .into_iter()
        .map(|input| {
            let mut expense = match input.id {
                Some(id) => Expense::with_id(id, input.amount, input.split_policy),
                None => Expense::new(input.amount, input.split_policy),
            };
            if input.is_reimbursement {
                expense = expense.as_reimbursement();
            }
            if let Some(date) = input.date {
                expense = expense.with_date(date);
            }
            for payer in input.payers {
                expense = expense.paid_by(ParticipantId::new(payer.participant), payer.amount);
            }
            for entry in input.paid_for {
                expense = expense.paid_for(ParticipantId::new(entry.participant), entry.weight);
            }
            expense
        })
        .collect();

    (file.settings, expenses)
}

fn fail(err: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", err);
    process::exit(1);
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| fail(e))
}

fn cmd_allocate(args: &[String]) {
    let opts = parse_common(args, false);
    let (_, expenses) = load_group(&opts.input);

    let mut outputs = Vec::new();
    for expense in expenses.iter() {
        let shares = ShareAllocator::allocate(expense).unwrap_or_else(|e| fail(e));
        if opts.json {
            outputs.push(AllocationOutput {
                expense: expense.id().to_string(),
                amount: expense.amount(),
                split_policy: expense.split_policy().to_string(),
                shares: shares
                    .iter()
                    .map(|(p, s)| ShareOutput {
                        participant: p.to_string(),
                        share: s,
                    })
                    .collect(),
            });
        } else {
            println!(
                "Expense {} ({} {}{})",
                expense.id(),
                format_minor(expense.amount(), opts.decimals),
                expense.split_policy(),
                if expense.is_reimbursement() {
                    ", reimbursement"
                } else {
                    ""
                }
            );
            for (participant, share) in shares.iter() {
                println!("  {:<15} {:>12}", participant, format_minor(share, opts.decimals));
            }
        }
    }

    if opts.json {
        println!("{}", to_json(&outputs));
    }
}

fn cmd_balances(args: &[String]) {
    let opts = parse_common(args, false);
    let (_, expenses) = load_group(&opts.input);
    let balances = aggregate_balances(&expenses).unwrap_or_else(|e| fail(e));

    let rows: Vec<BalanceOutput> = balances
        .iter()
        .map(|(participant, balance)| {
            let total = balance
                .net()
                .unwrap_or_else(|| fail(format!("balance of {participant} overflowed")));
            BalanceOutput {
                participant: participant.to_string(),
                paid: balance.paid,
                owed: balance.owed,
                total,
                status: if total > 0 {
                    "CREDITOR".to_string()
                } else if total < 0 {
                    "DEBTOR".to_string()
                } else {
                    "SETTLED".to_string()
                },
            }
        })
        .collect();

    if opts.json {
        println!("{}", to_json(&rows));
    } else {
        println!("=== Balances ===");
        for row in rows {
            println!(
                "  {:<15} paid {:>12}  owed {:>12}  total {:>12}  [{}]",
                row.participant,
                format_minor(row.paid, opts.decimals),
                format_minor(row.owed, opts.decimals),
                format_minor(row.total, opts.decimals),
                row.status
            );
        }
    }
}

fn cmd_settle(args: &[String]) {
    let opts = parse_common(args, true);
    let (mut settings, expenses) = load_group(&opts.input);
    if let Some(strategy) = opts.strategy {
        settings = settings.with_strategy(strategy);
    }

    let plan = SettlementEngine::plan(&expenses, &settings).unwrap_or_else(|e| fail(e));

    if opts.json {
        println!("{}", to_json(&plan));
    } else {
        println!("=== Settlement ({}) ===", plan.strategy);
        if plan.is_settled() {
            println!("Nothing to settle.");
            return;
        }
        for t in &plan.transactions {
            println!(
                "  {:<15} owes {:<15} {:>12}",
                t.from,
                t.to,
                format_minor(t.amount, opts.decimals)
            );
        }
        println!(
            "\n{} transactions, {} in total",
            plan.transaction_count(),
            format_minor(plan.total_transferred(), opts.decimals)
        );
    }
}

fn cmd_summary(args: &[String]) {
    let opts = parse_common(args, false);
    let (_, expenses) = load_group(&opts.input);
    let summary = SpendingSummary::from_expenses(&expenses)
        .unwrap_or_else(|e| fail(e))
        .with_decimals(opts.decimals);

    if opts.json {
        println!("{}", to_json(&summary));
    } else {
        println!("{}", summary);
    }
}

fn cmd_generate(args: &[String]) {
    let mut config = ExpenseNetworkConfig::default();
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--participants" => {
                i += 1;
                config.participant_count = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| {
                        eprintln!("--participants requires a number");
                        process::exit(1);
                    });
            }
            "--expenses" => {
                i += 1;
                config.expense_count = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| {
                        eprintln!("--expenses requires a number");
                        process::exit(1);
                    });
            }
            "--seed" => {
                i += 1;
                config.seed = Some(args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--seed requires a number");
                    process::exit(1);
                }));
            }
            "--output" => {
                i += 1;
                output_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--output requires a file path");
                    process::exit(1);
                }));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let set = generate_random_expenses(&config);

    #[derive(serde::Serialize)]
    struct OutputFile<'a> {
        settings: GroupSettings,
        expenses: &'a [Expense],
    }

    let json = to_json(&OutputFile {
        settings: GroupSettings::default(),
        expenses: set.expenses(),
    });

    if let Some(path) = output_path {
        fs::write(&path, &json).unwrap_or_else(|e| {
            eprintln!("Error writing to '{}': {}", path, e);
            process::exit(1);
        });
        eprintln!(
            "Generated {} expenses across {} participants → {}",
            set.len(),
            config.participant_count,
            path
        );
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "allocate" => cmd_allocate(rest),
        "balances" => cmd_balances(rest),
        "settle" => cmd_settle(rest),
        "summary" => cmd_summary(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
