use crate::output::Output;
use color_eyre::Result;
use dialoguer::{Confirm, Input, Password, Select};

/// Prompt for a string value with optional default
pub fn prompt_string(prompt: &str, default: Option<&str>) -> Result<String> {
    let mut input_builder = Input::<String>::new().with_prompt(prompt).allow_empty(true);

    if let Some(default_value) = default {
        input_builder = input_builder.default(default_value.to_string());
    }

    input_builder
        .interact_text()
        .map(|s| s.trim().to_string())
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read input: {}", e))
}

/// Prompt for a password twice (masked input)
pub fn prompt_password(prompt: &str) -> Result<String> {
    Password::new()
        .with_prompt(prompt)
        .with_confirmation(format!("Confirm {}", prompt), "Passwords do not match")
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read password: {}", e))
}

/// Read a long pasted secret without echo; access tokens are too long to type twice
pub fn prompt_secret(prompt: &str) -> Result<String> {
    rpassword::prompt_password(format!("{}: ", prompt))
        .map(|s| s.trim().to_string())
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read secret: {}", e))
}

/// Prompt for yes/no with optional default
pub fn prompt_yes_no(prompt: &str, default: Option<bool>) -> Result<bool> {
    let mut confirm_builder = Confirm::new().with_prompt(prompt);

    if let Some(default_value) = default {
        confirm_builder = confirm_builder.default(default_value);
    }

    confirm_builder
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read confirmation: {}", e))
}

/// Pick one of `items`; returns its index
pub fn prompt_select(prompt: &str, items: &[&str], default: usize) -> Result<usize> {
    Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(default)
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read selection: {}", e))
}

/// Prompt for a number with optional default, re-asking until it parses
pub fn prompt_number(prompt: &str, default: Option<u64>, output: &Output) -> Result<u64> {
    loop {
        let mut input_builder = Input::<String>::new().with_prompt(prompt);

        if let Some(default_value) = default {
            input_builder = input_builder.default(default_value.to_string());
        }

        let input_str = input_builder
            .interact_text()
            .map_err(|e| color_eyre::eyre::eyre!("Failed to read input: {}", e))?;

        match parse_number(&input_str, default) {
            Some(num) => return Ok(num),
            None => output.error("Invalid input. Please enter a whole number."),
        }
    }
}

fn parse_number(input: &str, default: Option<u64>) -> Option<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return default;
    }
    trimmed.parse::<u64>().ok()
}
