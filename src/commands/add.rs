use crate::args::AddArgs;
use crate::commands::{experience_label, money, short, Out};
use crate::model::{Amount, Transaction, TransactionKind};
use crate::{Config, Result, Session};
use std::str::FromStr;

/// Records an income or expense dated now.
///
/// # Errors
/// - `ErrorType::Validation` if the kind, the amount or the description is invalid.
/// - `ErrorType::Persistence` if the transaction could not be saved.
pub async fn add(config: Config, args: AddArgs) -> Result<Out<Transaction>> {
    let kind = TransactionKind::parse(args.kind())?;
    let amount = Amount::from_str(args.amount())?;
    let mut session = Session::from_config(&config).await;
    let level_before = session.level();

    let transaction = session
        .add_transaction(&args.description(), amount.value(), kind)
        .await?;

    let mut message = format!(
        "Added {} of {} '{}', experience {}{}. Level {}, {}.",
        transaction.kind(),
        money(transaction.amount().value()),
        transaction.description(),
        if transaction.experience_delta().is_sign_negative() {
            ""
        } else {
            "+"
        },
        short(transaction.experience_delta()),
        session.level(),
        experience_label(session.policy(), session.level(), session.experience())
    );
    if session.level() > level_before {
        message.push_str(&format!(
            " Level up! You are now level {} ({}).",
            session.level(),
            session.rank()
        ));
    }
    Ok(Out::new(message, transaction))
}
