use super::prompts;
use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use library_audit_config::{validate_anilist_token, AniListConfig, Config, CredentialStore, KitsuConfig, PathManager};
use library_audit_models::MediaKind;
use owo_colors::OwoColorize;
use serde_json::json;

pub fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    match cmd {
        ConfigCommands::Show { full } => show_config(&path_manager, full, output),
        ConfigCommands::Anilist { username } => configure_anilist(&path_manager, username, output),
        ConfigCommands::Kitsu { username } => configure_kitsu(&path_manager, username, output),
        ConfigCommands::Audit {
            media_kind,
            search_delay_ms,
            page_delay_ms,
            exclude_novels,
        } => configure_audit(
            &path_manager,
            AuditFlags {
                media_kind: media_kind.map(MediaKind::from),
                search_delay_ms,
                page_delay_ms,
                exclude_novels,
            },
            output,
        ),
        ConfigCommands::Interactive => run_interactive_config(&path_manager, output),
    }
}

fn load_config(path_manager: &PathManager) -> Result<Config> {
    let config_file = path_manager.config_file();
    Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))
}

fn save_config(path_manager: &PathManager, config: &Config) -> Result<()> {
    let config_file = path_manager.config_file();
    config
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))
}

fn load_credentials(path_manager: &PathManager) -> Result<CredentialStore> {
    let credentials_file = path_manager.credentials_file();
    let mut cred_store = CredentialStore::new(credentials_file.clone());
    cred_store
        .load()
        .map_err(|e| eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;
    Ok(cred_store)
}

fn save_credentials(cred_store: &CredentialStore, path_manager: &PathManager) -> Result<()> {
    cred_store.save().map_err(|e| {
        eyre!(
            "Failed to save credentials to {}: {}",
            path_manager.credentials_file().display(),
            e
        )
    })
}

fn show_config(path_manager: &PathManager, full: bool, output: &Output) -> Result<()> {
    let config_file = path_manager.config_file();
    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Run 'dualshelf config' to create it.");
        return Ok(());
    }

    let config = load_config(path_manager)?;
    let cred_store = load_credentials(path_manager)?;

    let secret = |value: Option<&String>| match value {
        Some(v) if full => v.clone(),
        Some(v) => mask_string(v),
        None => "<not set>".to_string(),
    };
    let anilist_username = config.anilist_username().unwrap_or("<not set>").to_string();
    let kitsu_username = config.kitsu_username().unwrap_or("<not set>").to_string();
    let anilist_token = secret(cred_store.get_anilist_access_token());
    let kitsu_password = secret(cred_store.get_kitsu_password());
    let kitsu_token_expires = cred_store
        .get_kitsu_token_expires()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "<none cached>".to_string());

    if !output.is_human() {
        output.json(&json!({
            "config_file": config_file.display().to_string(),
            "credentials_file": path_manager.credentials_file().display().to_string(),
            "anilist": { "username": anilist_username, "access_token": anilist_token },
            "kitsu": {
                "username": kitsu_username,
                "password": kitsu_password,
                "token_expires": kitsu_token_expires,
            },
            "audit": {
                "media_kind": config.audit.media_kind,
                "search_delay_ms": config.audit.search_delay_ms,
                "page_delay_ms": config.audit.page_delay_ms,
                "exclude_novels": config.audit.exclude_novels,
            },
        }));
        return Ok(());
    }

    output.println(format!("\n{}", "Configuration".bright_cyan().bold()));

    let mut files = Table::new();
    files.set_header(vec![
        Cell::new("Config File").add_attribute(comfy_table::Attribute::Bold),
        Cell::new(config_file.display().to_string()),
    ]);
    files.add_row(vec![
        Cell::new("Credentials File"),
        Cell::new(path_manager.credentials_file().display().to_string()),
    ]);
    styled(&mut files);
    output.table(&files);

    let mut accounts = section_table("Accounts");
    accounts.add_row(vec![Cell::new("AniList username"), Cell::new(anilist_username)]);
    accounts.add_row(vec![Cell::new("AniList access token"), Cell::new(anilist_token)]);
    accounts.add_row(vec![Cell::new("Kitsu login"), Cell::new(kitsu_username)]);
    accounts.add_row(vec![Cell::new("Kitsu password"), Cell::new(kitsu_password)]);
    accounts.add_row(vec![Cell::new("Kitsu token expires"), Cell::new(kitsu_token_expires)]);
    output.table(&accounts);

    let mut audit = section_table("Audit Options");
    audit.add_row(vec![Cell::new("Media kind"), Cell::new(config.audit.media_kind)]);
    audit.add_row(vec![
        Cell::new("Search delay"),
        Cell::new(format!("{} ms", config.audit.search_delay_ms)),
    ]);
    audit.add_row(vec![
        Cell::new("Page delay"),
        Cell::new(format!("{} ms", config.audit.page_delay_ms)),
    ]);
    audit.add_row(vec![
        Cell::new("Exclude novels"),
        Cell::new(check_mark(config.audit.exclude_novels)),
    ]);
    output.table(&audit);

    let services = config.get_configured_services();
    if services.len() < 2 {
        output.warn("Both an AniList and a Kitsu account are needed before running 'dualshelf audit'.");
    }

    Ok(())
}

fn configure_anilist(path_manager: &PathManager, username_arg: Option<String>, output: &Output) -> Result<()> {
    path_manager
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create configuration directories: {}", e))?;
    let mut config = load_config(path_manager)?;

    print_section_header("AniList Account Setup", output);
    print_instruction_list(
        &[
            "Register an API client at https://anilist.co/settings/developer",
            "Use https://anilist.co/api/v2/oauth/pin as the redirect URL",
            "Open https://anilist.co/api/v2/oauth/authorize?client_id=<id>&response_type=token and copy the token",
        ],
        output,
    );
    output.println("");

    let username = match username_arg {
        Some(user) => user.trim().to_string(),
        None => prompts::prompt_string("AniList username", config.anilist_username())?,
    };
    if username.is_empty() {
        return Err(eyre!("Username is required"));
    }

    let token = loop {
        let input = prompts::prompt_secret("AniList access token")?;
        match validate_anilist_token(&input) {
            Ok(()) => break input,
            Err(e) => {
                output.error(format!("Validation error: {}", e));
                output.info("Paste the whole token; it is hidden as you type.");
            }
        }
    };

    config.anilist = Some(AniListConfig {
        username: username.clone(),
    });
    save_config(path_manager, &config)?;

    let mut cred_store = load_credentials(path_manager)?;
    cred_store.set_anilist_access_token(token);
    save_credentials(&cred_store, path_manager)?;

    output.success("AniList account saved!");
    output.println(format!("  Username: {}", username));
    Ok(())
}

fn configure_kitsu(path_manager: &PathManager, username_arg: Option<String>, output: &Output) -> Result<()> {
    path_manager
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create configuration directories: {}", e))?;
    let mut config = load_config(path_manager)?;

    print_section_header("Kitsu Account Setup", output);
    output.println("Kitsu has no personal tokens; your password is exchanged for one when an audit runs.");
    output.println("");

    let username = match username_arg {
        Some(user) => user.trim().to_string(),
        None => loop {
            let input = prompts::prompt_string("Kitsu login (email)", config.kitsu_username())?;
            match validate_login(&input) {
                Ok(()) => break input,
                Err(e) => output.error(format!("Validation error: {}", e)),
            }
        },
    };
    if username.is_empty() {
        return Err(eyre!("Login is required"));
    }

    let password = prompts::prompt_password("Kitsu password")?;
    if password.is_empty() {
        return Err(eyre!("Password is required"));
    }

    config.kitsu = Some(KitsuConfig {
        username: username.clone(),
    });
    save_config(path_manager, &config)?;

    let mut cred_store = load_credentials(path_manager)?;
    cred_store.set_kitsu_password(password);
    // A cached token belongs to the previous login
    cred_store.clear_kitsu_token();
    save_credentials(&cred_store, path_manager)?;

    output.success("Kitsu account saved!");
    output.println(format!("  Login: {}", username));
    Ok(())
}

/// Values given on the command line; anything absent is prompted for only when no flag was given
struct AuditFlags {
    media_kind: Option<MediaKind>,
    search_delay_ms: Option<u64>,
    page_delay_ms: Option<u64>,
    exclude_novels: Option<bool>,
}

impl AuditFlags {
    fn none() -> Self {
        Self {
            media_kind: None,
            search_delay_ms: None,
            page_delay_ms: None,
            exclude_novels: None,
        }
    }

    fn any(&self) -> bool {
        self.media_kind.is_some()
            || self.search_delay_ms.is_some()
            || self.page_delay_ms.is_some()
            || self.exclude_novels.is_some()
    }
}

fn configure_audit(path_manager: &PathManager, flags: AuditFlags, output: &Output) -> Result<()> {
    let mut config = load_config(path_manager)?;

    if flags.any() {
        apply_audit_flags(&mut config, &flags);
    } else {
        print_section_header("Audit Options", output);
        output.println("Searches and page fetches are spaced out to stay under the services' rate limits.");
        output.println("");

        let kinds = ["manga", "anime"];
        let current = if config.audit.media_kind == MediaKind::Anime { 1 } else { 0 };
        let picked = prompts::prompt_select("Which library should 'dualshelf audit' check by default?", &kinds, current)?;
        config.audit.media_kind = MediaKind::parse_lenient(kinds[picked]);

        config.audit.search_delay_ms = prompts::prompt_number(
            "Delay between catalog searches (ms)",
            Some(config.audit.search_delay_ms),
            output,
        )?;
        config.audit.page_delay_ms = prompts::prompt_number(
            "Delay between library pages (ms)",
            Some(config.audit.page_delay_ms),
            output,
        )?;
        config.audit.exclude_novels = prompts::prompt_yes_no(
            "Skip light novels when auditing manga?",
            Some(config.audit.exclude_novels),
        )?;
    }

    save_config(path_manager, &config)?;
    output.success("Audit options saved!");
    Ok(())
}

fn apply_audit_flags(config: &mut Config, flags: &AuditFlags) {
    if let Some(kind) = flags.media_kind {
        config.audit.media_kind = kind;
    }
    if let Some(delay) = flags.search_delay_ms {
        config.audit.search_delay_ms = delay;
    }
    if let Some(delay) = flags.page_delay_ms {
        config.audit.page_delay_ms = delay;
    }
    if let Some(exclude) = flags.exclude_novels {
        config.audit.exclude_novels = exclude;
    }
}

pub fn run_interactive_config(path_manager: &PathManager, output: &Output) -> Result<()> {
    output.println(format!("{}", "DualShelf setup".bold().bright_cyan()));

    let config = load_config(path_manager)?;
    let configured = config.get_configured_services();

    if !configured.iter().any(|s| s == "anilist")
        || prompts::prompt_yes_no("Update the AniList account?", Some(false))?
    {
        configure_anilist(path_manager, None, output)?;
    }
    if !configured.iter().any(|s| s == "kitsu") || prompts::prompt_yes_no("Update the Kitsu account?", Some(false))? {
        configure_kitsu(path_manager, None, output)?;
    }
    configure_audit(path_manager, AuditFlags::none(), output)?;

    output.println("");
    output.success("Setup complete. Run 'dualshelf audit' to compare your libraries.");
    Ok(())
}

fn mask_string(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.is_empty() {
        return "<not set>".to_string();
    }
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

/// Kitsu accepts either an email address or a username
fn validate_login(input: &str) -> Result<(), &'static str> {
    let input = input.trim();
    if input.is_empty() {
        return Err("Login cannot be empty");
    }
    if input.chars().any(char::is_whitespace) {
        return Err("Login cannot contain spaces");
    }
    Ok(())
}

fn check_mark(value: bool) -> String {
    if value {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

fn styled(table: &mut Table) {
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
}

fn section_table(title: &str) -> Table {
    let mut table = Table::new();
    table.set_header(vec![Cell::new(title)
        .fg(comfy_table::Color::Cyan)
        .add_attribute(comfy_table::Attribute::Bold)]);
    styled(&mut table);
    table
}

fn print_section_header(title: &str, output: &Output) {
    output.println("");
    output.println(format!("{}", title.bold().bright_cyan()));
    output.println(format!("{}", "─".repeat(title.chars().count()).bright_cyan()));
}

fn print_instruction_list(items: &[&str], output: &Output) {
    for (idx, item) in items.iter().enumerate() {
        output.println(format!("  {}. {}", idx + 1, item));
    }
}
