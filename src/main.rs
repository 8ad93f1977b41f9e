use std::path::Path;

use anyhow::Context;
use clap::Parser;
use log::{error, info};
use nordigen::cli::{Cli, Commands};
use nordigen::config::{Settings, load_configuration};
use nordigen::log::init_logging;
use nordigen::{NordigenClient, RequisitionOptions, Token};
use serde::Serialize;
use url::Url;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    init_logging()?;

    let cli = Cli::parse();
    let settings = load_configuration(Path::new(&cli.config_file))?;
    let client = NordigenClient::from_settings(&settings)?;

    if let Err(e) = run(&client, &settings, cli.command).await {
        error!(error:% = e; "Command failed");
        return Err(e);
    }
    Ok(())
}

async fn run(client: &NordigenClient, settings: &Settings, command: Commands) -> Result<(), anyhow::Error> {
    match command {
        Commands::Token { secret_id, secret_key } => {
            let secret_id = secret_id
                .or_else(|| settings.secret_id.clone())
                .context("No secret ID given and none configured")?;
            let secret_key = secret_key
                .or_else(|| settings.secret_key.clone())
                .context("No secret key given and none configured")?;

            let token = client.new_token(&secret_id, &secret_key).await?;
            print_json(&token)
        },
        Commands::RefreshToken { refresh } => {
            let token = client.refresh_token(&refresh).await?;
            print_json(&token)
        },
        Commands::Institutions { access_token, country } => {
            let institutions = client.list_institutions(&bearer(access_token), &country).await?;
            print_json(&institutions)
        },
        Commands::CreateRequisition {
            access_token,
            institution_id,
            redirect,
            agreement,
            reference,
            user_language,
            account_selection,
            redirect_immediate,
        } => {
            let redirect = Url::parse(&redirect).context("Invalid redirect URL")?;
            let options = RequisitionOptions {
                agreement,
                reference,
                user_language,
                ssn: None,
                account_selection,
                redirect_immediate,
            };

            let requisition = client
                .create_requisition(&bearer(access_token), &redirect, &institution_id, Some(&options))
                .await?;
            info!(link:% = requisition.link; "Open the link to give consent");
            print_json(&requisition)
        },
        Commands::Requisition { access_token, id } => {
            let requisition = client.get_requisition(&bearer(access_token), &id).await?;
            print_json(&requisition)
        },
        Commands::DeleteRequisition { access_token, id } => {
            let confirmation = client.delete_requisition(&bearer(access_token), &id).await?;
            print_json(&confirmation)
        },
        Commands::Transactions {
            access_token,
            account_id,
            pending,
        } => {
            let token = bearer(access_token);
            if pending {
                print_json(&client.get_transactions(&token, &account_id).await?)
            } else {
                print_json(&client.get_booked_transactions(&token, &account_id).await?)
            }
        },
    }
}

fn bearer(access: String) -> Token {
    Token {
        access,
        ..Default::default()
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), anyhow::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
