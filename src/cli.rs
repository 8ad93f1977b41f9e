use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "nordigen")]
#[command(about = "Nordigen open-banking API client", long_about = None)]
pub struct Cli {
    #[arg(
        short,
        long,
        global = true,
        help = "Path to the configuration file",
        default_value = "data/config.toml"
    )]
    pub config_file: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Issue a new access/refresh token pair
    Token {
        #[arg(long, env = "NORDIGEN_SECRET_ID", help = "Secret ID (falls back to the configuration)")]
        secret_id: Option<String>,
        #[arg(long, env = "NORDIGEN_SECRET_KEY", help = "Secret key (falls back to the configuration)")]
        secret_key: Option<String>,
    },
    /// Exchange a refresh token for a new access token
    RefreshToken {
        #[arg(short, long, env = "NORDIGEN_REFRESH_TOKEN", help = "Refresh token")]
        refresh: String,
    },
    /// List the institutions available in a country
    Institutions {
        #[arg(short = 't', long, env = "NORDIGEN_ACCESS_TOKEN", help = "Access token")]
        access_token: String,
        #[arg(short = 'C', long, help = "ISO 3166 country code, e.g. PT")]
        country: String,
    },
    /// Create a requisition and print the consent link
    CreateRequisition {
        #[arg(short = 't', long, env = "NORDIGEN_ACCESS_TOKEN", help = "Access token")]
        access_token: String,
        #[arg(short, long, help = "Institution ID, e.g. SANDBOXFINANCE_SFIN0000")]
        institution_id: String,
        #[arg(short, long, help = "URL the end user is sent back to")]
        redirect: String,
        #[arg(long, help = "Optional end user agreement ID")]
        agreement: Option<String>,
        #[arg(long, help = "Optional unique reference")]
        reference: Option<String>,
        #[arg(long, help = "Optional two-letter UI language")]
        user_language: Option<String>,
        #[arg(long, help = "Let the end user select the accounts to share")]
        account_selection: bool,
        #[arg(long, help = "Skip the confirmation screen after the consent")]
        redirect_immediate: bool,
    },
    /// Show a requisition
    Requisition {
        #[arg(short = 't', long, env = "NORDIGEN_ACCESS_TOKEN", help = "Access token")]
        access_token: String,
        #[arg(short, long, help = "Requisition ID")]
        id: String,
    },
    /// Delete a requisition
    DeleteRequisition {
        #[arg(short = 't', long, env = "NORDIGEN_ACCESS_TOKEN", help = "Access token")]
        access_token: String,
        #[arg(short, long, help = "Requisition ID")]
        id: String,
    },
    /// List the transactions of an account
    Transactions {
        #[arg(short = 't', long, env = "NORDIGEN_ACCESS_TOKEN", help = "Access token")]
        access_token: String,
        #[arg(short, long, help = "Account ID")]
        account_id: String,
        #[arg(short, long, help = "Include pending transactions")]
        pending: bool,
    },
}
