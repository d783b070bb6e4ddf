use std::net::IpAddr;

use clap::{Args, Subcommand};

use crate::connector::DEFAULT_CHAT_URL;

/// Options shared by the client-side commands.
#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// Chat endpoint of a running proxy
    #[arg(long, default_value = DEFAULT_CHAT_URL)]
    pub url: String,

    /// Logical model name (see `models`)
    #[arg(short, long, default_value = "mistral")]
    pub model: String,

    /// Abort a reply that takes longer than this many seconds
    #[arg(long, default_value = "60")]
    pub timeout_secs: u64,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the completion proxy (POST /api/chat)
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,

        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Answer with an offline echo model instead of calling upstream
        #[arg(long)]
        mock_upstream: bool,
    },

    /// Interactive chat against a running proxy
    Chat {
        #[command(flatten)]
        client: ClientArgs,
    },

    /// Send a single prompt and print the reply
    Ask {
        prompt: String,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// List logical model names and the upstream models they map to
    Models,
}
