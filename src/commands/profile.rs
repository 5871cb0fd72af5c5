use crate::args::{RenameArgs, TargetArgs};
use crate::commands::{money_decimal, short, Out};
use crate::{Config, Result, Session};
use rust_decimal::Decimal;

/// Sets the savings target. Zero clears it.
///
/// # Errors
/// - `ErrorType::Validation` if the amount is not a non-negative number.
/// - `ErrorType::Persistence` if the target could not be saved.
pub async fn target(config: Config, args: TargetArgs) -> Result<Out<Decimal>> {
    let target = Session::parse_target(args.amount())?;
    let mut session = Session::from_config(&config).await;
    session.set_savings_target(target).await?;
    let message = if target.is_zero() {
        "Cleared the savings target".to_string()
    } else {
        format!(
            "Savings target set to {}, {}% reached",
            money_decimal(session.savings_target()),
            short(session.savings_progress())
        )
    };
    Ok(Out::new(message, session.savings_target()))
}

/// Changes the display name.
///
/// # Errors
/// - `ErrorType::Validation` if the name is blank.
/// - `ErrorType::Persistence` if the name could not be saved.
pub async fn rename(config: Config, args: RenameArgs) -> Result<Out<String>> {
    let mut session = Session::from_config(&config).await;
    session.rename_user(&args.name()).await?;
    let name = session.username().to_string();
    Ok(Out::new(format!("Hello, {name}!"), name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::AddArgs;
    use crate::commands::add;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_target() {
        let env = TestEnv::new().await;
        add(env.config(), AddArgs::new("income", "250000", "Gaji"))
            .await
            .unwrap();
        let out = target(env.config(), TargetArgs::new("1,000,000"))
            .await
            .unwrap();
        assert!(out.message().contains("1,000,000"), "{}", out.message());
        assert!(out.message().contains("25%"), "{}", out.message());

        let out = target(env.config(), TargetArgs::new("0")).await.unwrap();
        assert!(out.message().contains("Cleared"));
        assert_eq!(env.session().await.savings_progress(), Decimal::ZERO);

        let err = target(env.config(), TargetArgs::new("lots"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_rename() {
        let env = TestEnv::new().await;
        let out = rename(env.config(), RenameArgs::new("  Budi Santoso "))
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap(), "Budi Santoso");
        assert_eq!(env.session().await.username(), "Budi Santoso");

        let err = rename(env.config(), RenameArgs::new(" ")).await.unwrap_err();
        assert!(err.is_validation());
    }
}
