use clap::{Arg, Command}; // Import necessary modules from clap for command-line argument parsing
use std::process;
use std::sync::Arc;

use wayfarer_identity::auth::service::{
    CreateAccountRequest, ForgotPasswordRequest, RegisterRequest, ResetPasswordRequest,
    UpdateAccountRequest,
};
use wayfarer_identity::email::{ConsoleMailer, SmtpCredentials, SmtpMailer};
use wayfarer_identity::utils::logging::initialize_logging;
use wayfarer_identity::utils::time::unix_now;
use wayfarer_identity::{
    AccountService, AccountStore, Mailer, Principal, ServiceConfig, ServiceError, ACCOUNTS_FILE,
};

fn main() {
    if let Err(e) = initialize_logging() {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    // Define the command-line interface using clap
    let matches = Command::new("wayfarer-identity")
        .about("Identity and password-reset service for the Wayfarer travel planner")
        .subcommand(
            Command::new("register")
                .about("Register a new account (role is always user)")
                .arg(Arg::new("username").help("Desired username").required(true))
                .arg(Arg::new("email").help("Email address").required(true))
                .arg(
                    Arg::new("password")
                        .long("password")
                        .help("Password; prompted securely when omitted")
                        .value_name("PASSWORD"),
                ),
        )
        .subcommand(
            Command::new("create")
                .about("Create an account with a chosen role (admin only)")
                .arg(Arg::new("username").help("Desired username").required(true))
                .arg(Arg::new("email").help("Email address").required(true))
                .arg(
                    Arg::new("role")
                        .long("role")
                        .help("Role for the new account (user or admin)")
                        .value_name("ROLE"),
                )
                .arg(
                    Arg::new("password")
                        .long("password")
                        .help("Password; prompted securely when omitted")
                        .value_name("PASSWORD"),
                )
                .arg(acting_arg()),
        )
        .subcommand(
            Command::new("list")
                .about("List all accounts (admin only)")
                .arg(acting_arg()),
        )
        .subcommand(
            Command::new("update")
                .about("Update an account's username, email or role (admin only)")
                .arg(
                    Arg::new("id")
                        .help("Id of the account to update")
                        .required(true)
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("username")
                        .long("username")
                        .help("New username")
                        .value_name("USERNAME"),
                )
                .arg(
                    Arg::new("email")
                        .long("email")
                        .help("New email address")
                        .value_name("EMAIL"),
                )
                .arg(
                    Arg::new("role")
                        .long("role")
                        .help("New role (unrecognized values are ignored)")
                        .value_name("ROLE"),
                )
                .arg(acting_arg()),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete an account (admin only)")
                .arg(
                    Arg::new("id")
                        .help("Id of the account to delete")
                        .required(true)
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(acting_arg()),
        )
        .subcommand(
            Command::new("forgot")
                .about("Request a password-reset email")
                .arg(Arg::new("email").help("Email address").required(true)),
        )
        .subcommand(
            Command::new("admin-reset")
                .about("Send a password-reset email to another account (admin only)")
                .arg(
                    Arg::new("id")
                        .help("Id of the target account")
                        .required(true)
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(acting_arg()),
        )
        .subcommand(
            Command::new("redeem")
                .about("Redeem a reset token and set a new password")
                .arg(Arg::new("token").help("Reset token").required(true))
                .arg(
                    Arg::new("password")
                        .long("password")
                        .help("New password; prompted securely when omitted")
                        .value_name("PASSWORD"),
                ),
        )
        .subcommand(Command::new("purge").about("Sweep expired reset tokens from the store"))
        .get_matches();

    // Load the store, pick a mailer, and wire up the service
    let store = match AccountStore::load_from_file(ACCOUNTS_FILE) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("Failed to load account store: {}", e);
            process::exit(1);
        }
    };
    let service = AccountService::new(
        Arc::clone(&store),
        mailer_from_env(),
        ServiceConfig::from_env(),
    );

    // Handle the chosen subcommand
    if let Some(sub_matches) = matches.subcommand_matches("register") {
        let req = RegisterRequest {
            username: required(sub_matches, "username"),
            email: required(sub_matches, "email"),
            password: password_or_prompt(sub_matches, "Enter password:"),
        };
        respond(service.register(&req));
    } else if let Some(sub_matches) = matches.subcommand_matches("create") {
        let acting = resolve_principal(&store, &required(sub_matches, "acting"));
        let req = CreateAccountRequest {
            username: required(sub_matches, "username"),
            email: required(sub_matches, "email"),
            password: password_or_prompt(sub_matches, "Enter password for the new account:"),
            role: sub_matches.get_one::<String>("role").cloned(),
        };
        respond(service.create_account(&acting, &req));
    } else if let Some(sub_matches) = matches.subcommand_matches("list") {
        let acting = resolve_principal(&store, &required(sub_matches, "acting"));
        respond(service.list_accounts(&acting));
    } else if let Some(sub_matches) = matches.subcommand_matches("update") {
        let acting = resolve_principal(&store, &required(sub_matches, "acting"));
        let id = *sub_matches.get_one::<u64>("id").unwrap();
        let req = UpdateAccountRequest {
            username: sub_matches.get_one::<String>("username").cloned(),
            email: sub_matches.get_one::<String>("email").cloned(),
            role: sub_matches.get_one::<String>("role").cloned(),
        };
        respond(service.update_account(&acting, id, &req));
    } else if let Some(sub_matches) = matches.subcommand_matches("delete") {
        let acting = resolve_principal(&store, &required(sub_matches, "acting"));
        let id = *sub_matches.get_one::<u64>("id").unwrap();
        respond(service.delete_account(&acting, id));
    } else if let Some(sub_matches) = matches.subcommand_matches("forgot") {
        let req = ForgotPasswordRequest {
            email: required(sub_matches, "email"),
        };
        respond(service.forgot_password(&req));
    } else if let Some(sub_matches) = matches.subcommand_matches("admin-reset") {
        let acting = resolve_principal(&store, &required(sub_matches, "acting"));
        let id = *sub_matches.get_one::<u64>("id").unwrap();
        respond(service.admin_reset_password(&acting, id));
    } else if let Some(sub_matches) = matches.subcommand_matches("redeem") {
        let token = required(sub_matches, "token");
        let req = ResetPasswordRequest {
            password: password_or_prompt(sub_matches, "Enter new password:"),
        };
        respond(service.reset_password_with_token(&token, &req));
    } else if matches.subcommand_matches("purge").is_some() {
        let swept = store.purge_expired_tokens(unix_now());
        println!("Swept {} expired token(s)", swept);
    } else {
        eprintln!("No command given; run with --help for usage");
        process::exit(2);
    }

    // Persist whatever the command changed
    if let Err(e) = store.save_to_file(ACCOUNTS_FILE) {
        eprintln!("Failed to save account store: {}", e);
        process::exit(1);
    }
}

/// Every admin command names the acting account explicitly; the service
/// never reads an ambient identity
fn acting_arg() -> Arg {
    Arg::new("acting")
        .long("acting")
        .help("Username of the account performing this operation")
        .value_name("USERNAME")
        .required(true)
}

fn required(matches: &clap::ArgMatches, name: &str) -> String {
    matches.get_one::<String>(name).cloned().unwrap_or_default()
}

/// Resolve the acting username to a principal, or bail out
fn resolve_principal(store: &AccountStore, username: &str) -> Principal {
    match store.find_by_username(username) {
        Some(account) => Principal::new(account.id, account.role),
        None => {
            eprintln!("Unknown acting user: {}", username);
            process::exit(1);
        }
    }
}

/// Take the password from the flag or prompt for it without echo
fn password_or_prompt(matches: &clap::ArgMatches, prompt: &str) -> String {
    if let Some(password) = matches.get_one::<String>("password") {
        return password.clone();
    }
    println!("{}", prompt);
    match rpassword::read_password() {
        Ok(password) => password,
        Err(e) => {
            eprintln!("Failed to read password: {}", e);
            process::exit(1);
        }
    }
}

/// Use the SMTP relay when it is configured, otherwise print emails to the
/// console so the reset link is visible during development
fn mailer_from_env() -> Arc<dyn Mailer> {
    let host = std::env::var("SMTP_HOST").ok();
    let username = std::env::var("SMTP_USERNAME").ok();
    let password = std::env::var("SMTP_PASSWORD").ok();

    match (host, username, password) {
        (Some(host), Some(username), Some(password)) => {
            let port = std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587);
            Arc::new(SmtpMailer::new(SmtpCredentials {
                username,
                password,
                host,
                port,
            }))
        }
        _ => Arc::new(ConsoleMailer),
    }
}

/// Print the success payload as JSON, or the error with its status
fn respond<T: serde::Serialize>(result: Result<T, ServiceError>) {
    match result {
        Ok(payload) => match serde_json::to_string_pretty(&payload) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize response: {}", e);
                process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Error ({}): {}", e.status(), e);
            process::exit(1);
        }
    }
}
