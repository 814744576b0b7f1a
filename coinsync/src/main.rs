mod clients;
mod errors;
mod settings;
mod sync;

use coinledger::utils::setup_logger;
use log::{error, info};
use std::process::ExitCode;

use crate::errors::SyncError;
use crate::settings::{config_path, Settings};
use crate::sync::{ChangeSummary, Syncer};

async fn sync_accounts() -> Result<Vec<ChangeSummary>, SyncError> {
    let config_path = config_path();
    let settings = Settings::new(&config_path)?;
    setup_logger(settings.log_level)?;
    info!("coinsync configuration path:{}", &config_path);

    let syncer = Syncer::from_settings(&settings)?;
    syncer.run(&settings.budget_name, &settings.accounts).await
}

#[tokio::main]
async fn main() -> ExitCode {
    match sync_accounts().await {
        Ok(summaries) => {
            println!("================");
            println!("Updated {} accounts:", summaries.len());
            for summary in summaries {
                println!("  {}", summary);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            // the logger may not be installed yet when configuration fails
            error!("sync failed: {}", err);
            eprintln!("sync failed: {}", err);
            ExitCode::FAILURE
        }
    }
}
