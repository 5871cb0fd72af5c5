use crate::args::DeleteArgs;
use crate::commands::{money, Out};
use crate::error::{pub_bail, ErrorType};
use crate::model::Transaction;
use crate::{Config, Result, Session};

/// Deletes one transaction, by position (0 is the newest) or by id, and reverses the experience
/// it earned or cost.
///
/// # Errors
/// - `ErrorType::Index` if there is no such transaction.
/// - `ErrorType::Persistence` if the deletion could not be saved.
pub async fn delete(config: Config, args: DeleteArgs) -> Result<Out<Transaction>> {
    let mut session = Session::from_config(&config).await;
    let removed = match (args.position(), args.id()) {
        (_, Some(id)) => session.delete_transaction_by_id(id).await?,
        (Some(position), None) => session.delete_transaction(position).await?,
        (None, None) => pub_bail!(
            ErrorType::Validation,
            "Either a position or an id is required"
        ),
    };
    let message = format!(
        "Deleted {} of {} '{}'. Balance is now {}",
        removed.kind(),
        money(removed.amount().value()),
        removed.description(),
        money(session.balance())
    );
    Ok(Out::new(message, removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::AddArgs;
    use crate::commands::add;
    use crate::test::TestEnv;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_delete_by_position_and_id() {
        let env = TestEnv::new().await;
        add(env.config(), AddArgs::new("income", "100000", "Gaji"))
            .await
            .unwrap();
        let coffee = add(env.config(), AddArgs::new("expense", "20000", "Kopi"))
            .await
            .unwrap();
        let coffee_id = coffee.structure().unwrap().id();

        let out = delete(env.config(), DeleteArgs::by_id(coffee_id))
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().description(), "Kopi");
        assert!(out.message().contains("20,000"), "{}", out.message());
        assert!(out.message().contains("now 100,000"), "{}", out.message());

        let out = delete(env.config(), DeleteArgs::by_position(0))
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().description(), "Gaji");
        let session = env.session().await;
        assert!(session.transactions().is_empty());
        assert_eq!(session.experience(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let env = TestEnv::new().await;
        let err = delete(env.config(), DeleteArgs::by_position(0))
            .await
            .unwrap_err();
        assert!(err.is_index());
    }
}
