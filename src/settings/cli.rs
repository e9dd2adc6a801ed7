use super::Parser;

#[derive(Parser, Debug)]
#[command(about = "Send authenticated requests to the CRM backend")]
pub struct Cli {
    #[arg(long)]
    pub settings: Option<String>,

    /// Access token to start the session with.
    #[arg(long)]
    pub token: Option<String>,

    #[arg(long, default_value = "GET")]
    pub method: String,

    /// Paths relative to the API base URL; sent concurrently.
    pub paths: Vec<String>,
}
