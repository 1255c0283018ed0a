//! Command-line argument parsing

use crate::authentication::rest::{
    DEFAULT_ENROLL_ENDPOINT, DEFAULT_LOGIN_ENDPOINT, DEFAULT_LOGOUT_ENDPOINT,
};
use crate::error::{PipeError, Result};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "aerogear-pipes")]
#[command(about = "Read and write REST resources through authenticated pipes")]
#[command(version)]
pub struct Args {
    /// Backend base URL
    #[arg(
        long = "base-url",
        short = 'b',
        help = "Base URL of the backend, e.g. http://localhost:8080/todo-server"
    )]
    pub base_url: String,

    #[arg(long = "login-endpoint", default_value = DEFAULT_LOGIN_ENDPOINT)]
    pub login_endpoint: String,

    #[arg(long = "logout-endpoint", default_value = DEFAULT_LOGOUT_ENDPOINT)]
    pub logout_endpoint: String,

    #[arg(long = "enroll-endpoint", default_value = DEFAULT_ENROLL_ENDPOINT)]
    pub enroll_endpoint: String,

    /// Timeout in seconds for network operations
    #[arg(
        long = "timeout",
        short = 't',
        help = "Timeout for network operations in seconds [default: 60, or AEROGEAR_TIMEOUT]"
    )]
    pub timeout: Option<u64>,

    /// Skip TLS verification
    #[arg(
        long = "skip-tls",
        short = 'k',
        help = "Skip TLS certificate verification"
    )]
    pub skip_tls: bool,

    /// Verbose output
    #[arg(long = "verbose", short = 'v', help = "Enable verbose output")]
    pub verbose: bool,

    /// Quiet mode
    #[arg(long = "quiet", short = 'q', help = "Only print results and errors")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and print the session token preview
    Login {
        #[arg(long, short = 'u')]
        username: String,
        #[arg(long, short = 'p')]
        password: String,
    },
    /// Register a new account; the new account is logged in on success
    Enroll {
        /// Registration field as key=value, repeatable
        #[arg(long = "field", short = 'f', value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },
    /// Fetch every element of a resource
    Read {
        resource: String,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Create or update one element given as JSON
    Save {
        resource: String,
        /// JSON object; an id field selects update instead of create
        item: String,
        #[arg(long = "record-id", default_value = "id")]
        record_id: String,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Delete one element by id
    Remove {
        resource: String,
        id: String,
        #[command(flatten)]
        credentials: Credentials,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Login { .. } => "Login",
            Command::Enroll { .. } => "Enroll",
            Command::Read { .. } => "Read",
            Command::Save { .. } => "Save",
            Command::Remove { .. } => "Remove",
        }
    }
}

/// Optional login performed before a pipe operation
#[derive(clap::Args, Debug, Clone, Default)]
pub struct Credentials {
    #[arg(long, short = 'u')]
    pub username: Option<String>,
    #[arg(long, short = 'p')]
    pub password: Option<String>,
}

impl Credentials {
    pub fn pair(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some((username, password)),
            _ => None,
        }
    }
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url).map_err(|e| {
            PipeError::Validation(format!("Invalid base URL '{}': {}", self.base_url, e))
        })?;

        if self.timeout == Some(0) {
            return Err(PipeError::Validation(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if self.verbose && self.quiet {
            return Err(PipeError::Validation(
                "--verbose and --quiet cannot be used together".to_string(),
            ));
        }

        let credentials = match &self.command {
            Command::Read { credentials, .. }
            | Command::Save { credentials, .. }
            | Command::Remove { credentials, .. } => Some(credentials),
            Command::Login { .. } | Command::Enroll { .. } => None,
        };
        if let Some(credentials) = credentials {
            if credentials.username.is_some() != credentials.password.is_some() {
                return Err(PipeError::Validation(
                    "--username and --password must be given together".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.trim().to_string(), value.to_string()))
}
