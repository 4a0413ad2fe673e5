//! Storehouse CLI - migrations, seeding and the admin changelists.
//!
//! # Usage
//!
//! ```bash
//! # Apply the tags and store migrations
//! storehouse migrate
//!
//! # Load fixtures
//! storehouse seed crates/cli/fixtures/catalog.yaml
//!
//! # Products with low stock in collection 1, by inventory
//! storehouse list products --filter collection=1 --filter inventory=low --sort inventory_status
//!
//! # Zero the inventory of products 1 and 2
//! storehouse action products clear_inventory --ids 1,2
//!
//! # Tags on product 5
//! storehouse tags show product 5
//! ```
//!
//! # Environment Variables
//!
//! - `STOREHOUSE_DATABASE_URL` (or `DATABASE_URL`) - `SQLite` connection string
//! - `STOREHOUSE_LIST_PER_PAGE` - changelist page size
//! - `STOREHOUSE_LOG_JSON` - emit JSON logs
//! - `RUST_LOG` - log filter

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use storehouse_store::{AdminSite, StoreConfig};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "storehouse")]
#[command(author, version, about = "Storehouse CLI tools")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,
    /// Load fixtures from a YAML file
    Seed {
        /// Path to the fixture file
        file: String,
    },
    /// Show one page of a model's changelist
    List {
        /// Model (`product`, `customer`, `order`, `collection`)
        model: String,

        /// Page number, starting at 1
        #[arg(short, long)]
        page: Option<u32>,

        /// Column keys to sort by, `-key` for descending
        #[arg(short, long)]
        sort: Option<String>,

        /// Filter as `key=value`; repeatable
        #[arg(short, long = "filter")]
        filters: Vec<String>,

        /// Search text
        #[arg(short = 'q', long)]
        search: Option<String>,
    },
    /// Change a list-editable field
    Edit {
        /// Model
        model: String,
        /// Object id
        id: i32,
        /// Column key
        field: String,
        /// New value
        value: String,
    },
    /// Run a bulk action on selected objects
    Action {
        /// Model
        model: String,
        /// Action name (e.g. `clear_inventory`, `delete_selected`)
        name: String,
        /// Comma-separated object ids
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<i32>,
    },
    /// Show an order with its items
    Order {
        /// Order id
        id: i32,
    },
    /// Inspect and apply tags
    Tags {
        #[command(subcommand)]
        action: TagsAction,
    },
    /// Reporting queries
    Report {
        #[command(subcommand)]
        report: ReportKind,
    },
}

#[derive(Subcommand)]
enum TagsAction {
    /// Tags on an object
    Show {
        /// Entity kind (`product`, `store.order`, ...)
        kind: String,
        /// Object id
        id: i32,
    },
    /// Tag an object, creating the tag if needed
    Add {
        /// Entity kind
        kind: String,
        /// Object id
        id: i32,
        /// Tag label
        label: String,
    },
    /// Remove a tag from an object
    Remove {
        /// Entity kind
        kind: String,
        /// Object id
        id: i32,
        /// Tag label
        label: String,
    },
}

#[derive(Subcommand)]
enum ReportKind {
    /// Count, min, max, average and sum of unit prices
    Prices {
        /// Restrict to one collection
        #[arg(short, long)]
        collection: Option<i32>,
    },
    /// Latest orders with their items
    Recent {
        /// Number of orders
        #[arg(short, long, default_value_t = 5)]
        limit: u32,
    },
    /// Products that have been ordered
    Ordered,
}

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storehouse_store=info,storehouse_cli=info".into());

    // Logs go to stderr so command output on stdout stays parseable.
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(false);
            tracing::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(config.log_json);

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &StoreConfig) -> Result<(), Box<dyn std::error::Error>> {
    let pool = storehouse_store::create_pool(config).await?;
    tracing::debug!(?config, "connected");

    let json = cli.json;
    match cli.command {
        Commands::Migrate => commands::migrate::run(&pool).await?,
        Commands::Seed { file } => {
            let summary = commands::seed::from_file(&pool, &file).await?;
            output::render(json, &summary, output::seed_summary)?;
        }
        command => {
            let site = AdminSite::new(pool.clone()).with_list_per_page(config.list_per_page);
            run_admin(command, &site, json).await?;
        }
    }
    Ok(())
}

async fn run_admin(
    command: Commands,
    site: &AdminSite,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::List {
            model,
            page,
            sort,
            filters,
            search,
        } => {
            let query = commands::admin::list_query(page, sort, &filters, search)?;
            let page = site.changelist(model.parse()?, &query).await?;
            output::render(json, &page, output::list_page)?;
        }
        Commands::Edit {
            model,
            id,
            field,
            value,
        } => {
            let row = site
                .update_editable(model.parse()?, id, &field, &value)
                .await?;
            output::render(json, &row, output::list_row)?;
        }
        Commands::Action { model, name, ids } => {
            let outcome = site.run_action(model.parse()?, &name, &ids).await?;
            output::render(json, &outcome, |o| o.message.clone())?;
        }
        Commands::Order { id } => {
            let detail = site
                .order_change(storehouse_core::OrderId::new(id))
                .await?;
            output::render(json, &detail, output::order_detail)?;
        }
        Commands::Tags { action } => match action {
            TagsAction::Show { kind, id } => {
                let view = commands::tags::show(site, &kind, id).await?;
                output::render(json, &view, output::tag_view)?;
            }
            TagsAction::Add { kind, id, label } => {
                let view = commands::tags::add(site, &kind, id, &label).await?;
                output::render(json, &view, output::tag_view)?;
            }
            TagsAction::Remove { kind, id, label } => {
                let view = commands::tags::remove(site, &kind, id, &label).await?;
                output::render(json, &view, output::tag_view)?;
            }
        },
        Commands::Report { report } => match report {
            ReportKind::Prices { collection } => {
                let summary = commands::reports::prices(site.pool(), collection).await?;
                output::render(json, &summary, output::price_summary)?;
            }
            ReportKind::Recent { limit } => {
                let orders = commands::reports::recent(site.pool(), limit).await?;
                output::render(json, &orders, |orders| {
                    orders
                        .iter()
                        .map(output::order_detail)
                        .collect::<Vec<_>>()
                        .join("\n\n")
                })?;
            }
            ReportKind::Ordered => {
                let products = commands::reports::ordered(site.pool()).await?;
                output::render(json, &products, |products| {
                    products
                        .iter()
                        .map(|p| format!("{:>4}  {}  {}", p.id, p.title, p.unit_price))
                        .collect::<Vec<_>>()
                        .join("\n")
                })?;
            }
        },
        Commands::Migrate | Commands::Seed { .. } => {}
    }
    Ok(())
}
