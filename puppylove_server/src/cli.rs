use std::{env, env::VarError};

// Printed verbatim. The admin token and the redis URL (which may carry a password) are left out on purpose.
const DISPLAY_ENVS: [&str; 9] = [
    "RUST_LOG",
    "PLV_HOST",
    "PLV_PORT",
    "PLV_DATABASE_URL",
    "PLV_MODERATION_QUEUE",
    "PLV_MAIL_QUEUE",
    "PLV_PROFILE_QUEUE",
    "PLV_ASSETS_DIR",
    "PLV_MAX_DELIVERIES",
];

/// The server takes no arguments. If any are given, print the help text and the current configuration instead, and
/// return true so that the caller can exit.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    println!("Current environment values (EXCLUDING variables that contain secrets):");
    for name in DISPLAY_ENVS {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<25} {val}");
    }
}
