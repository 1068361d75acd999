use clap::Subcommand;
use dategate_core::{Config, Database, OptInFlag, StoredOptIn};
use serde_json::json;

#[derive(Subcommand)]
pub enum OptinAction {
    /// Print the stored flag as JSON
    Get,
    /// Record acceptance on this device
    Accept,
    /// Forget acceptance on this device
    Revoke,
}

pub fn run(action: OptinAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let flag = StoredOptIn::new(Database::open()?, config.optin.key.clone());

    match action {
        OptinAction::Get => {
            let out = json!({
                "key": flag.key(),
                "raw": flag.raw()?,
                "accepted": flag.read(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OptinAction::Accept => {
            flag.accept()?;
            println!("accepted");
        }
        OptinAction::Revoke => {
            if flag.revoke()? {
                println!("revoked");
            } else {
                println!("not accepted");
            }
        }
    }
    Ok(())
}
