//! partsdb CLI - parts catalog maintenance over a SQLite store
//!
//! Commands:
//! - `init`: create the catalog schema and install the shipped routines
//! - `vendor` / `part` / `drawing`: single-entity maintenance
//! - `link` / `unlink`: vendor-part supply links
//! - `parts`: every part with the names of its vendors
//! - `routine`: register and invoke store-resident routines
//! - `schema`: describe tables, columns and foreign keys

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use partsdb_core::config::DEFAULT_SECTION;
use partsdb_core::{
    default_log_level, init_logging, CatalogService, DirRoutineSource, RoutineKind, StoreConfig,
    StoreLocation,
};

mod output;

#[derive(Parser, Debug)]
#[command(name = "partsdb", author, version, about = "Parts catalog store maintenance")]
struct Cli {
    /// TOML settings file with a `[database]` section
    #[arg(long, global = true, conflicts_with = "db")]
    config: Option<PathBuf>,

    /// SQLite database file (`:memory:` for a throwaway, pre-initialized store)
    #[arg(long, global = true, env = "PARTSDB_PATH")]
    db: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "PARTSDB_LOG")]
    log_level: Option<String>,

    /// Absolute directory for rotating log files (default: stderr)
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the catalog schema and install the shipped routines
    Init,
    /// Vendor operations (add, add-many, list, rename, delete)
    Vendor {
        #[command(subcommand)]
        command: VendorCommands,
    },
    /// Part operations (add, list, delete)
    Part {
        #[command(subcommand)]
        command: PartCommands,
    },
    /// List every part with the names of its vendors
    Parts,
    /// Part drawing operations (set, get)
    Drawing {
        #[command(subcommand)]
        command: DrawingCommands,
    },
    /// Link an existing vendor to an existing part
    Link { vendor_id: i64, part_id: i64 },
    /// Remove a vendor-part link
    Unlink { vendor_id: i64, part_id: i64 },
    /// Store-resident routines (register, list, call)
    Routine {
        #[command(subcommand)]
        command: RoutineCommands,
    },
    /// Describe tables, columns and foreign keys
    Schema,
}

#[derive(Subcommand, Debug)]
enum VendorCommands {
    /// Create one vendor
    Add { name: String },
    /// Create several vendors in one transaction
    AddMany {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// List vendors by id
    List,
    /// Rename a vendor
    Rename { vendor_id: i64, name: String },
    /// Delete a vendor and its links
    Delete { vendor_id: i64 },
}

#[derive(Subcommand, Debug)]
enum PartCommands {
    /// Create a part, optionally linked to vendors in the same transaction
    Add {
        name: String,
        /// Vendor ids to link (repeatable)
        #[arg(long = "vendor", short = 'v')]
        vendors: Vec<i64>,
    },
    /// List parts by id
    List,
    /// Delete a part with its drawing and links
    Delete { part_id: i64 },
}

#[derive(Subcommand, Debug)]
enum DrawingCommands {
    /// Store a drawing file for a part, replacing any previous one
    Set {
        part_id: i64,
        file: PathBuf,
        /// File extension to record (defaults to the file's own)
        #[arg(long)]
        ext: Option<String>,
    },
    /// Write a part's drawing to a file
    Get { part_id: i64, out: PathBuf },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum KindArg {
    Function,
    Procedure,
}

impl From<KindArg> for RoutineKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Function => RoutineKind::Function,
            KindArg::Procedure => RoutineKind::Procedure,
        }
    }
}

#[derive(Subcommand, Debug)]
enum RoutineCommands {
    /// Register `<dir>/<name>.sql` as a routine
    Register {
        name: String,
        #[arg(long, value_enum)]
        kind: KindArg,
        /// Directory holding routine source files
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// List registered routines
    List,
    /// Parts supplied by one vendor (`get_parts_by_vendor`)
    CallPartsByVendor { vendor_id: i64 },
    /// Create vendor, part and link in one call (`add_new_part`)
    AddNewPart {
        part_name: String,
        vendor_name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    init_logging(&level, cli.log_dir.as_deref()).map_err(|err| anyhow!(err))?;

    let service = open_service(store_config(&cli)?)?;
    run(&service, cli.command)
}

/// Opens the configured store. An in-memory store lives only as long as this
/// process, so it is initialized before any command runs.
fn open_service(config: StoreConfig) -> Result<CatalogService> {
    let is_memory = config.location == StoreLocation::Memory;
    let service = CatalogService::open(config).context("failed to open store")?;
    if is_memory {
        let applied = service.ensure_schema()?;
        let routines = service.install_builtin_routines()?;
        info!(
            "event=cli_memory_store module=cli status=ok applied={applied} routines={routines}"
        );
    }
    Ok(service)
}

fn store_config(cli: &Cli) -> Result<StoreConfig> {
    if let Some(path) = &cli.config {
        return StoreConfig::load(path, DEFAULT_SECTION)
            .with_context(|| format!("failed to load config {}", path.display()));
    }
    match &cli.db {
        Some(path) if path.as_os_str() == partsdb_core::config::MEMORY_PATH => {
            Ok(StoreConfig::memory())
        }
        Some(path) => Ok(StoreConfig::file(path)),
        None => bail!("no store given; pass --db <path> or --config <file>"),
    }
}

fn run(service: &CatalogService, command: Commands) -> Result<()> {
    match command {
        Commands::Init => {
            let applied = service.ensure_schema()?;
            let routines = service.install_builtin_routines()?;
            info!("event=cli_init module=cli status=ok applied={applied} routines={routines}");
            println!("schema ready ({applied} step(s) applied, {routines} routine(s) installed)");
        }
        Commands::Vendor { command } => run_vendor(service, command)?,
        Commands::Part { command } => run_part(service, command)?,
        Commands::Parts => output::print_parts_with_vendors(&service.list_parts_with_vendors()?),
        Commands::Drawing { command } => run_drawing(service, command)?,
        Commands::Link { vendor_id, part_id } => {
            service.link_vendor_part(vendor_id, part_id)?;
            println!("linked vendor {vendor_id} to part {part_id}");
        }
        Commands::Unlink { vendor_id, part_id } => {
            if !service.unlink_vendor_part(vendor_id, part_id)? {
                bail!("vendor {vendor_id} is not linked to part {part_id}");
            }
            println!("unlinked vendor {vendor_id} from part {part_id}");
        }
        Commands::Routine { command } => run_routine(service, command)?,
        Commands::Schema => output::print_schema(&service.describe_schema()?),
    }
    Ok(())
}

fn run_vendor(service: &CatalogService, command: VendorCommands) -> Result<()> {
    match command {
        VendorCommands::Add { name } => {
            let id = service.create_vendor(&name)?;
            println!("vendor {id} created");
        }
        VendorCommands::AddMany { names } => {
            let ids = service.create_vendors(&names)?;
            println!("{} vendor(s) created", ids.len());
        }
        VendorCommands::List => output::print_vendors(&service.list_vendors()?),
        VendorCommands::Rename { vendor_id, name } => {
            match service.update_vendor(vendor_id, &name)? {
                Some(vendor) => {
                    println!("vendor {} renamed to {}", vendor.vendor_id, vendor.vendor_name)
                }
                None => bail!("vendor {vendor_id} not found"),
            }
        }
        VendorCommands::Delete { vendor_id } => {
            if !service.delete_vendor(vendor_id)? {
                bail!("vendor {vendor_id} not found");
            }
            println!("vendor {vendor_id} deleted");
        }
    }
    Ok(())
}

fn run_part(service: &CatalogService, command: PartCommands) -> Result<()> {
    match command {
        PartCommands::Add { name, vendors } => {
            let vendor_ids: BTreeSet<i64> = vendors.into_iter().collect();
            let id = service.add_part_with_vendors(&name, &vendor_ids)?;
            println!("part {id} created with {} vendor link(s)", vendor_ids.len());
        }
        PartCommands::List => output::print_parts(&service.list_parts()?),
        PartCommands::Delete { part_id } => {
            if !service.delete_part(part_id)? {
                bail!("part {part_id} not found");
            }
            println!("part {part_id} deleted");
        }
    }
    Ok(())
}

fn run_drawing(service: &CatalogService, command: DrawingCommands) -> Result<()> {
    match command {
        DrawingCommands::Set { part_id, file, ext } => {
            let extension = match ext {
                Some(ext) => ext,
                None => file_extension(&file)?,
            };
            let data = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let size = data.len();
            service.set_part_drawing(part_id, &extension, data)?;
            println!("drawing for part {part_id} stored ({size} bytes, .{extension})");
        }
        DrawingCommands::Get { part_id, out } => {
            let drawing = service
                .get_part_drawing(part_id)?
                .ok_or_else(|| anyhow!("part {part_id} has no drawing"))?;
            std::fs::write(&out, &drawing.drawing_data)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!(
                "drawing for part {part_id} written to {} (.{})",
                out.display(),
                drawing.file_extension
            );
        }
    }
    Ok(())
}

fn run_routine(service: &CatalogService, command: RoutineCommands) -> Result<()> {
    match command {
        RoutineCommands::Register { name, kind, dir } => {
            let source = DirRoutineSource::new(dir);
            service.register_routine_from_source(&source, &name, kind.into())?;
            println!("routine {name} registered");
        }
        RoutineCommands::List => output::print_routines(&service.list_routines()?),
        RoutineCommands::CallPartsByVendor { vendor_id } => {
            output::print_parts(&service.get_parts_by_vendor(vendor_id)?)
        }
        RoutineCommands::AddNewPart {
            part_name,
            vendor_name,
        } => {
            service.add_new_part(&part_name, &vendor_name)?;
            println!("part {part_name} added for vendor {vendor_name}");
        }
    }
    Ok(())
}

fn file_extension(path: &Path) -> Result<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("{} has no file extension; pass --ext", path.display()))
}

#[cfg(test)]
mod tests {
    use super::{open_service, run, Commands, VendorCommands};
    use partsdb_core::StoreConfig;

    #[test]
    fn memory_store_is_ready_for_any_command() {
        let service = open_service(StoreConfig::memory()).unwrap();

        run(
            &service,
            Commands::Vendor {
                command: VendorCommands::Add {
                    name: "3M Co.".to_string(),
                },
            },
        )
        .unwrap();
        run(
            &service,
            Commands::Vendor {
                command: VendorCommands::List,
            },
        )
        .unwrap();

        assert_eq!(service.list_vendors().unwrap().len(), 1);
        assert_eq!(service.list_routines().unwrap().len(), 2);
    }

    #[test]
    fn file_store_is_left_for_init() {
        let dir = tempfile::tempdir().unwrap();
        let service = open_service(StoreConfig::file(dir.path().join("parts.db"))).unwrap();

        assert!(service.list_vendors().is_err());
        run(&service, Commands::Init).unwrap();
        assert!(service.list_vendors().unwrap().is_empty());
    }
}
