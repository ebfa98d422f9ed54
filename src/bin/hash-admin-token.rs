use std::io::{self, BufRead};

use site_backend::routes::admin::hash_admin_token;

fn main() {
    let token = env_token().or_else(stdin_token).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --bin hash-admin-token <TOKEN>");
        eprintln!("       echo <TOKEN> | cargo run --bin hash-admin-token");
        std::process::exit(1);
    });

    let hashed = hash_admin_token(&token);
    println!("\nHash     : {}\n", hashed);
    println!("# Paste this into your .env:");
    println!("ADMIN_TOKEN_HASH={}", hashed);
}

fn env_token() -> Option<String> {
    std::env::args().nth(1).filter(|t| !t.trim().is_empty())
}

fn stdin_token() -> Option<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok()?;
    let token = line.trim().to_string();
    (!token.is_empty()).then_some(token)
}
