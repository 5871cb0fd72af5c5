use crate::commands::{experience_label, money, money_decimal, short, Out};
use crate::model::Transaction;
use crate::session::Summary;
use crate::{Config, Result, Session};
use chrono::Utc;

/// Shows the balance, savings progress, the trailing 7 days, level and rank.
pub async fn show(config: Config) -> Result<Out<Summary>> {
    let session = Session::from_config(&config).await;
    let summary = session.summary(Utc::now());

    let target = if summary.savings_target.is_zero() {
        "no target set".to_string()
    } else {
        format!(
            "{}% of {}",
            short(summary.savings_progress),
            money_decimal(summary.savings_target)
        )
    };
    let message = format!(
        "Hello, {}!\n\
        Balance:      {}\n\
        Savings:      {}\n\
        Last 7 days:  income {}, expense {}\n\
        Level:        {} ({}), {}",
        summary.username,
        money(summary.balance),
        target,
        money(summary.weekly.income),
        money(summary.weekly.expense),
        summary.level,
        summary.rank,
        experience_label(session.policy(), summary.level, summary.experience),
    );
    Ok(Out::new(message, summary))
}

/// Lists all transactions, newest first, with the positions used by `delete`.
pub async fn list(config: Config) -> Result<Out<Vec<Transaction>>> {
    let session = Session::from_config(&config).await;
    let transactions = session.transactions().to_vec();
    if transactions.is_empty() {
        return Ok(Out::new("No transactions yet", transactions));
    }

    let mut message = format!(
        "{} transaction{}, newest first:",
        transactions.len(),
        if transactions.len() == 1 { "" } else { "s" }
    );
    for (position, t) in transactions.iter().enumerate() {
        let sign = if t.signed_amount() < 0 { "-" } else { "+" };
        message.push_str(&format!(
            "\n{position:>4}  {}  {sign}{:>14}  {}  ({})",
            t.timestamp().format("%Y-%m-%d %H:%M"),
            money(t.amount().value()),
            t.description(),
            t.id()
        ));
    }
    Ok(Out::new(message, transactions))
}
