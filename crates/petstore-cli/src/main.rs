//! Pet Store CLI - administer owners, pets and adoptions

use anyhow::{Context, anyhow};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use petstore_core::application::{AppResult, ApplicationError, ErrorKind};
use petstore_core::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(name = "petstore")]
#[command(author, version, about = "Pet store administration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to <config dir>/petstore/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the configured one
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Login to act as
    #[arg(short, long, global = true, env = "PETSTORE_USER")]
    user: Option<String>,

    /// Password for --user
    #[arg(
        short,
        long,
        global = true,
        env = "PETSTORE_PASSWORD",
        hide_env_values = true
    )]
    password: Option<String>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and its first administrator
    Init {
        /// Administrator login
        #[arg(long)]
        admin: String,
        /// Administrator password
        #[arg(long)]
        admin_password: String,
    },

    /// Manage owners
    Owners {
        #[command(subcommand)]
        action: OwnerAction,
    },

    /// Manage pets
    Pets {
        #[command(subcommand)]
        action: PetAction,
    },

    /// Run the adoption workflow
    Adopt {
        #[command(subcommand)]
        action: AdoptAction,
    },

    /// Show the authenticated user
    Whoami,

    /// Show owner and pet counts
    Summary,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum OwnerAction {
    /// Register an owner
    Register {
        name: String,
        #[arg(short, long)]
        email: Option<String>,
        /// Login for the owner's user account
        #[arg(long, requires = "owner_password")]
        login: Option<String>,
        /// Password for the owner's user account
        #[arg(long, requires = "login")]
        owner_password: Option<String>,
    },
    /// List owners
    List {
        /// Only owners of pets with this name
        #[arg(long)]
        pet: Option<String>,
    },
    /// Show owner details
    Show { id: i64 },
    /// Update an owner
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        /// New email; an empty value clears it
        #[arg(long)]
        email: Option<String>,
        /// New password for the owner's user account
        #[arg(long)]
        new_password: Option<String>,
    },
    /// Remove an owner
    Remove { id: i64 },
}

#[derive(Subcommand)]
enum PetAction {
    /// Register a pet
    Add {
        name: String,
        #[arg(short, long, value_parser = parse_species)]
        species: Species,
        /// Birth date (YYYY-MM-DD)
        #[arg(short, long)]
        birth: NaiveDate,
        #[arg(long)]
        breed: Option<String>,
    },
    /// List pets visible to the caller
    List,
    /// List pets free to be adopted
    Available,
    /// Show pet details
    Show { id: i64 },
    /// Update a pet
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_parser = parse_species)]
        species: Option<Species>,
        /// New breed; an empty value clears it
        #[arg(long)]
        breed: Option<String>,
        #[arg(long)]
        birth: Option<NaiveDate>,
    },
    /// Remove a pet
    Remove { id: i64 },
    /// Show a pet's history
    History { id: i64 },
}

#[derive(Subcommand)]
enum AdoptAction {
    /// Reserve a pet for an owner
    Start {
        pet_id: i64,
        /// Adopting owner (defaults to the caller's own record)
        #[arg(long)]
        owner: Option<i64>,
    },
    /// Complete a pending adoption
    Finish { pet_id: i64 },
    /// Withdraw a pending adoption
    Cancel { pet_id: i64 },
    /// Show adoption records
    Records {
        #[arg(long, conflicts_with = "owner", required_unless_present = "owner")]
        pet: Option<i64>,
        #[arg(long)]
        owner: Option<i64>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

fn parse_species(s: &str) -> std::result::Result<Species, String> {
    Species::from_str(s).ok_or_else(|| {
        let known: Vec<&str> = Species::ALL.iter().map(|s| s.as_str()).collect();
        format!("unknown species '{}' (expected one of: {})", s, known.join(", "))
    })
}

/// Process exit code for a failed command
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ApplicationError>().map(|e| e.kind()) {
        Some(ErrorKind::Validation) => 2,
        Some(ErrorKind::NotFound) => 3,
        Some(ErrorKind::InvalidState) => 4,
        Some(ErrorKind::Authorization) => 5,
        Some(ErrorKind::Conflict) => 6,
        _ => 1,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(1);
        }
    };

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("petstore=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn config_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => Config::config_path(),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load_from(&config_path(cli)?)?;
    if let Some(database) = &cli.database {
        config.database.path = database.clone();
    }
    Ok(config)
}

async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let out = Output { format: cli.format };

    if let Commands::Config { action } = &cli.command {
        return cmd_config(&config_path(&cli)?, action, out);
    }

    let db = Database::new(config.database_config())
        .await
        .with_context(|| format!("Failed to open database {}", config.database.path.display()))?;
    debug!(path = %db.path().display(), "Database opened");

    let identities = IdentityStore::new(db.clone());

    if let Commands::Init {
        admin,
        admin_password,
    } = &cli.command
    {
        return cmd_init(&identities, &db, admin, admin_password, out).await;
    }

    let principal = match &cli.user {
        Some(login) => {
            let password = cli
                .password
                .as_deref()
                .ok_or_else(|| anyhow!("--password (or PETSTORE_PASSWORD) is required with --user"))?;
            identities
                .authenticate(&Credentials::new(login.as_str(), password))
                .await?
        }
        None => Principal::Anonymous,
    };

    let ctx = ServiceContext::with_role_policy(db).conflict_retries(config.service.conflict_retries);
    let store = PetStore::new(ctx);

    match cli.command {
        Commands::Owners { action } => cmd_owners(&store, &principal, action, out).await,
        Commands::Pets { action } => cmd_pets(&store, &principal, action, out).await,
        Commands::Adopt { action } => cmd_adopt(&store, &principal, action, out).await,
        Commands::Whoami => {
            let user = store.users.current_user(&principal).await?;
            out.emit(&user, || {
                println!("{} ({})", user.login, user.role);
                if let Some(owner_id) = user.owner_id {
                    println!("  Owner ID: {}", owner_id);
                }
            })
        }
        Commands::Summary => {
            let summary = store.pets.store_summary(&principal).await?;
            out.emit(&summary, || {
                println!("Owners: {}", summary.owners);
                println!("Pets:");
                println!("  available: {}", summary.available);
                println!("  pending: {}", summary.pending);
                println!("  adopted: {}", summary.adopted);
                println!("  removed: {}", summary.removed);
            })
        }
        Commands::Init { .. } | Commands::Config { .. } => Ok(()),
    }
}

// ============================================================================
// Output
// ============================================================================

#[derive(Clone, Copy)]
struct Output {
    format: OutputFormat,
}

impl Output {
    /// Print `value` as JSON, or run `text` for the text format
    fn emit<T: Serialize + ?Sized>(&self, value: &T, text: impl FnOnce()) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(value)?);
            }
            OutputFormat::Text => text(),
        }
        Ok(())
    }
}

fn print_owner(owner: &Owner) {
    println!("Owner: {}", owner.name);
    println!("  ID: {}", owner.id);
    if let Some(email) = &owner.email {
        println!("  Email: {}", email);
    }
    if let Some(login) = &owner.login {
        println!("  Login: {}", login);
    }
    println!("  Created: {}", owner.created_at.format("%Y-%m-%d %H:%M:%S"));
}

fn print_pet(pet: &Pet) {
    let today = Utc::now().date_naive();
    println!("Pet: {}", pet.name);
    println!("  ID: {}", pet.id);
    match &pet.breed {
        Some(breed) => println!("  Species: {} ({})", pet.species, breed),
        None => println!("  Species: {}", pet.species),
    }
    println!("  Born: {} ({} years)", pet.birth, pet.age_in_years(today));
    println!("  Status: {}", pet.status);
    if let Some(owner_id) = pet.owner_id {
        println!("  Owner ID: {}", owner_id);
    }
}

fn print_pet_list(pets: &[Pet]) {
    if pets.is_empty() {
        println!("No pets found.");
    }
    for pet in pets {
        println!(
            "  {:>5}  {:<20} {:<8} {}",
            pet.id,
            pet.name,
            pet.species.as_str(),
            pet.status
        );
    }
}

fn print_records(records: &[AdoptionRecord]) {
    if records.is_empty() {
        println!("No adoption records.");
        return;
    }
    for record in records {
        println!(
            "  #{} pet {} -> owner {} on {}",
            record.id,
            record.pet_id,
            record.owner_id,
            record.adopted_at.format("%Y-%m-%d")
        );
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_init(
    identities: &IdentityStore,
    db: &Database,
    login: &str,
    password: &str,
    out: Output,
) -> anyhow::Result<()> {
    let admin = identities.bootstrap_admin(login, password).await?;
    out.emit(&admin, || {
        println!("Store initialized at {}", db.path().display());
        println!("  Administrator: {}", admin.login);
    })
}

async fn cmd_owners(
    store: &PetStore,
    principal: &Principal,
    action: OwnerAction,
    out: Output,
) -> anyhow::Result<()> {
    let owners = &store.owners;
    match action {
        OwnerAction::Register {
            name,
            email,
            login,
            owner_password,
        } => {
            let mut new_owner = NewOwner::new(name);
            if let Some(email) = email {
                new_owner = new_owner.with_email(email);
            }
            if let (Some(login), Some(password)) = (login, owner_password) {
                new_owner = new_owner.with_credentials(Credentials::new(login, password));
            }
            let owner = owners.register_owner(principal, new_owner).await?;
            out.emit(&owner, || {
                println!("Owner registered.");
                print_owner(&owner);
            })
        }
        OwnerAction::List { pet } => {
            let list = match pet {
                Some(pet_name) => owners.find_owners_by_pet_name(principal, &pet_name).await?,
                None => owners.list_owners(principal).await?,
            };
            out.emit(&list, || {
                if list.is_empty() {
                    println!("No owners found.");
                }
                for owner in &list {
                    match &owner.login {
                        Some(login) => println!("  {:>5}  {} [{}]", owner.id, owner.name, login),
                        None => println!("  {:>5}  {}", owner.id, owner.name),
                    }
                }
            })
        }
        OwnerAction::Show { id } => {
            let owner = owners.get_owner(principal, id).await?;
            out.emit(&owner, || print_owner(&owner))
        }
        OwnerAction::Update {
            id,
            name,
            email,
            new_password,
        } => {
            let update = OwnerUpdate {
                name,
                email: email.map(|e| Some(e).filter(|e| !e.trim().is_empty())),
                password: new_password.map(Zeroizing::new),
            };
            let owner = owners.update_owner(principal, id, update).await?;
            out.emit(&owner, || {
                println!("Owner updated.");
                print_owner(&owner);
            })
        }
        OwnerAction::Remove { id } => {
            owners.remove_owner(principal, id).await?;
            out.emit(&serde_json::json!({ "removed": id }), || {
                println!("Owner {} removed.", id);
            })
        }
    }
}

async fn cmd_pets(
    store: &PetStore,
    principal: &Principal,
    action: PetAction,
    out: Output,
) -> anyhow::Result<()> {
    let pets = &store.pets;
    match action {
        PetAction::Add {
            name,
            species,
            birth,
            breed,
        } => {
            let mut new_pet = NewPet::new(name, species, birth);
            if let Some(breed) = breed {
                new_pet = new_pet.with_breed(breed);
            }
            let pet = pets.register_pet(principal, new_pet).await?;
            out.emit(&pet, || {
                println!("Pet registered.");
                print_pet(&pet);
            })
        }
        PetAction::List => {
            let list = pets.list_pets(principal).await?;
            out.emit(&list, || print_pet_list(&list))
        }
        PetAction::Available => {
            let list = pets.list_available_pets(principal).await?;
            out.emit(&list, || print_pet_list(&list))
        }
        PetAction::Show { id } => {
            let pet = pets.get_pet(principal, id).await?;
            out.emit(&pet, || print_pet(&pet))
        }
        PetAction::Update {
            id,
            name,
            species,
            breed,
            birth,
        } => {
            let update = PetUpdate {
                name,
                species,
                breed: breed.map(|b| Some(b).filter(|b| !b.trim().is_empty())),
                birth,
            };
            let pet = pets.update_pet(principal, id, update).await?;
            out.emit(&pet, || {
                println!("Pet updated.");
                print_pet(&pet);
            })
        }
        PetAction::Remove { id } => {
            let pet = pets.remove_pet(principal, id).await?;
            out.emit(&pet, || println!("Pet {} ({}) removed.", pet.id, pet.name))
        }
        PetAction::History { id } => {
            let events = pets.pet_history(principal, id).await?;
            out.emit(&events, || {
                for event in &events {
                    println!(
                        "  {}  {:<20} by {}",
                        event.created_at.format("%Y-%m-%d %H:%M:%S"),
                        event.event_type.as_str(),
                        event.actor
                    );
                }
            })
        }
    }
}

/// Owner to adopt for: the explicit one, else the caller's own record
fn adopting_owner(principal: &Principal, owner: Option<i64>) -> AppResult<i64> {
    owner.or_else(|| principal.owner_id()).ok_or_else(|| {
        ApplicationError::validation("owner", "--owner is required for callers without an owner record")
    })
}

async fn cmd_adopt(
    store: &PetStore,
    principal: &Principal,
    action: AdoptAction,
    out: Output,
) -> anyhow::Result<()> {
    let adoptions = &store.adoptions;
    match action {
        AdoptAction::Start { pet_id, owner } => {
            let owner_id = adopting_owner(principal, owner)?;
            let intent = adoptions
                .initiate_adoption(principal, pet_id, owner_id)
                .await?;
            out.emit(&intent, || {
                println!("Pet {} reserved for owner {}.", intent.pet_id, intent.owner_id);
            })
        }
        AdoptAction::Finish { pet_id } => {
            let record = adoptions.finalize_adoption(principal, pet_id).await?;
            out.emit(&record, || {
                println!(
                    "Pet {} adopted by owner {} (record #{}).",
                    record.pet_id, record.owner_id, record.id
                );
            })
        }
        AdoptAction::Cancel { pet_id } => {
            let pet = adoptions.cancel_adoption(principal, pet_id).await?;
            out.emit(&pet, || {
                println!("Adoption of pet {} cancelled; it is {} again.", pet.id, pet.status);
            })
        }
        AdoptAction::Records { pet, owner } => {
            let records = match (pet, owner) {
                (Some(pet_id), _) => adoptions.adoption_records_for_pet(principal, pet_id).await?,
                (None, Some(owner_id)) => {
                    adoptions
                        .adoption_records_for_owner(principal, owner_id)
                        .await?
                }
                (None, None) => Vec::new(),
            };
            out.emit(&records, || print_records(&records))
        }
    }
}

fn cmd_config(path: &Path, action: &ConfigAction, out: Output) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load_from(path)?;
            let value = config.get(key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_from(path)?;
            config.set(key, value)?;
            config.save_to(path)?;
            println!("Set {} = {}", key, value);
        }
        ConfigAction::List => {
            let config = Config::load_from(path)?;
            let items = config.list()?;
            let map: serde_json::Map<String, serde_json::Value> = items
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            out.emit(&map, || {
                for (key, value) in &items {
                    println!("{} = {}", key, value);
                }
            })?;
        }
        ConfigAction::Reset => {
            Config::reset_at(path)?;
            println!("Configuration reset to defaults.");
        }
        ConfigAction::Path => {
            println!("{}", path.display());
        }
    }
    Ok(())
}
