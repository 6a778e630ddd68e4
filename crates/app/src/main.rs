//! Command-line harness around the form session engine.
//!
//! Feeds a WebApp-style query string through the same bootstrap, editing and
//! submission path the Mini App uses, printing the state summary and, on
//! `--submit`, the payload a Telegram host would receive.

use std::collections::HashMap;

use clap::Parser;

use api_types::TransactionType;
use form_engine::{Bootstrap, FormSession, SubmitOutcome, WebAppHost};

#[derive(Debug, Parser)]
#[command(name = "alcancia", about = "Budget form session driver")]
struct Args {
    /// WebApp URL query string (without the leading '?').
    #[arg(long, env = "BOOTSTRAP_QUERY", default_value = "")]
    query: String,

    /// Log level for the engine and this binary.
    #[arg(long, default_value = "info")]
    level: String,

    /// Validate and print the submit payload instead of only the summary.
    #[arg(long)]
    submit: bool,
}

/// Host that prints the payload where the Telegram client would receive it.
struct StdoutHost;

impl WebAppHost for StdoutHost {
    fn ready(&self) {
        tracing::debug!("host ready");
    }

    fn expand(&self) {
        tracing::debug!("host expanded");
    }

    fn send_data(&self, payload: &str) {
        println!("{payload}");
    }

    fn close(&self) {
        tracing::debug!("host closed");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "alcancia={level},form_engine={level}",
            level = args.level
        ))
        .init();

    let params: HashMap<String, String> = serde_urlencoded::from_str(&args.query)?;
    let mut session = FormSession::new(Bootstrap::from_params(&params));

    let host = StdoutHost;
    session.start(&host);
    print_summary(&session);

    if args.submit {
        match session.submit(&host) {
            SubmitOutcome::Sent => tracing::info!("payload sent"),
            SubmitOutcome::Blocked(errors) => {
                for error in &errors {
                    eprintln!("error: {error}");
                }
                std::process::exit(1);
            }
            SubmitOutcome::Detached => tracing::warn!("no host attached"),
        }
    }

    Ok(())
}

fn print_summary(session: &FormSession) {
    let user = session.user();
    println!(
        "action: {:?} | user: {} <{}> (salary day {})",
        session.action(),
        user.name,
        user.email,
        user.salary_day
    );

    for (key, budget) in session.budgets().iter() {
        println!(
            "budget {key}: {} [{}] ideal {:?}",
            budget.name,
            TransactionType::label_for(Some(budget.transaction_type_id)),
            budget.ideal_amount
        );
    }

    for st in session.subtransaction_types() {
        println!(
            "subtransaction type: {} [{}] ideal {:?}{}",
            st.name,
            TransactionType::label_for(Some(st.transaction_type_id)),
            st.ideal_amount,
            if st.is_initial { " (initial)" } else { "" }
        );
    }

    for tx in session.transactions() {
        println!(
            "transaction {:?}: subcategory {} amount {} on {:?}",
            tx.id, tx.subcategory_id, tx.amount, tx.date
        );
    }

    if let Some(stats) = session.statistics() {
        for row in &stats.month_totals_by_type {
            println!("month total {}: {}", row.type_name, row.total);
        }
        if let Some(rate) = stats.savings_rate_for_month {
            println!("savings rate: {rate}");
        }
    }
}
