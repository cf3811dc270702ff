mod config;
mod filter_args;

use std::{sync::Arc, time::Duration};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    catalogs::{customers_catalog, home_layouts_catalog, orders_catalog, returns_catalog},
    transport::ordered_products,
    AdminApiClient, CategoryProductPositions, FilterCatalog, ListFetcher, ListLoader, ListSession,
    MoveOutcome, OrderedCollection, OrderedItem, PersistMode, PositionKey, PositionStore,
    ProductFilter, QueryController, Resource, ScreenEvent, ScreenPreferences,
};
use serde_json::json;
use shared::{
    domain::{ItemId, PivotId, SortDir},
    protocol::CategoryProduct,
};
use storage::Storage;
use tokio::sync::broadcast;
use tracing::{info, warn};

use config::{load_settings, prepare_preferences_url, Settings};
use filter_args::{parse_columns, parse_filter, ProductFilterArgs};

#[derive(Parser, Debug)]
#[command(name = "market-admin", about = "Market Connect admin list and ordering tools")]
struct Cli {
    /// Overrides the backend url from admin.toml and the environment.
    #[arg(long)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetches one page of a list screen.
    List {
        screen: Screen,
        /// Repeatable `key=value`; ranges as `from..to`, multi-selects comma separated.
        #[arg(long = "filter")]
        filters: Vec<String>,
        /// Zero-based page index.
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        per_page: Option<u32>,
        #[arg(long)]
        sort_by: Option<String>,
        #[arg(long)]
        sort_dir: Option<SortDir>,
    },
    /// Prints a category's products in position order.
    Products {
        #[arg(long)]
        category_id: i64,
        #[command(flatten)]
        show: ProductFilterArgs,
    },
    /// Moves a product inside a category and saves the new order.
    MoveProduct {
        #[arg(long)]
        category_id: i64,
        #[arg(long)]
        from: usize,
        #[arg(long)]
        to: usize,
        /// Save through the single-item endpoint instead of a bulk write.
        #[arg(long)]
        per_item: bool,
        #[command(flatten)]
        show: ProductFilterArgs,
    },
    /// Rewrites every product position of a category in its current order.
    BulkSave {
        #[arg(long)]
        category_id: i64,
        #[command(flatten)]
        show: ProductFilterArgs,
    },
    SetPosition {
        #[arg(long)]
        category_id: i64,
        #[arg(long)]
        pivot_id: i64,
        #[arg(long)]
        position: u32,
        #[command(flatten)]
        show: ProductFilterArgs,
    },
    RemoveProduct {
        #[arg(long)]
        category_id: i64,
        #[arg(long)]
        product_id: i64,
        #[command(flatten)]
        show: ProductFilterArgs,
    },
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Subcommand, Debug)]
enum PrefsAction {
    Get {
        #[arg(long)]
        screen: Screen,
    },
    Set {
        #[arg(long)]
        screen: Screen,
        #[arg(long)]
        filters_open: Option<bool>,
        /// Comma separated, in display order.
        #[arg(long)]
        columns: Option<String>,
        #[arg(long)]
        per_page: Option<u32>,
    },
    Reset {
        #[arg(long)]
        screen: Screen,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Screen {
    Orders,
    Customers,
    Returns,
    HomeLayouts,
}

impl Screen {
    fn name(self) -> &'static str {
        match self {
            Screen::Orders => "orders",
            Screen::Customers => "customers",
            Screen::Returns => "returns",
            Screen::HomeLayouts => "home_layouts",
        }
    }

    fn resource(self) -> Resource {
        match self {
            Screen::Orders => Resource::orders(),
            Screen::Customers => Resource::customers(),
            Screen::Returns => Resource::returns(),
            Screen::HomeLayouts => Resource::home_layouts(),
        }
    }

    fn catalog(self) -> FilterCatalog {
        match self {
            Screen::Orders => orders_catalog(),
            Screen::Customers => customers_catalog(),
            Screen::Returns => returns_catalog(),
            Screen::HomeLayouts => home_layouts_catalog(),
        }
    }

    fn default_sort(self) -> Option<&'static str> {
        match self {
            Screen::Orders => Some("created_at"),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }

    match cli.command {
        Command::List {
            screen,
            filters,
            page,
            per_page,
            sort_by,
            sort_dir,
        } => {
            let request = ListArgs {
                screen,
                filters,
                page,
                per_page,
                sort_by,
                sort_dir,
            };
            run_list(&settings, request).await?;
        }
        Command::Products { category_id, show } => {
            let collection = open_category(&settings, category_id, PersistMode::PerItem).await?;
            print_order(&collection.items(), &show.to_filter())?;
        }
        Command::MoveProduct {
            category_id,
            from,
            to,
            per_item,
            show,
        } => {
            let mode = if per_item {
                PersistMode::PerItem
            } else {
                PersistMode::Bulk {
                    debounce: settings.debounce_policy().delay,
                }
            };
            let collection = open_category(&settings, category_id, mode).await?;
            let mut events = collection.subscribe_events();
            if collection.move_item(from, to)? == MoveOutcome::Unchanged {
                info!(category_id, from, "product already at requested index");
            }
            collection.wait_idle().await;
            report_events(&mut events)?;
            print_order(&collection.items(), &show.to_filter())?;
        }
        Command::BulkSave { category_id, show } => {
            let collection = open_category(&settings, category_id, PersistMode::PerItem).await?;
            collection.bulk_save().await?;
            print_order(&collection.items(), &show.to_filter())?;
        }
        Command::SetPosition {
            category_id,
            pivot_id,
            position,
            show,
        } => {
            let collection = open_category(&settings, category_id, PersistMode::PerItem).await?;
            collection
                .update_position(PositionKey::Pivot(PivotId(pivot_id)), position)
                .await?;
            print_order(&collection.items(), &show.to_filter())?;
        }
        Command::RemoveProduct {
            category_id,
            product_id,
            show,
        } => {
            let collection = open_category(&settings, category_id, PersistMode::PerItem).await?;
            let client = AdminApiClient::new(settings.client_config()?)?;
            client
                .remove_category_product(category_id, ItemId(product_id))
                .await?;
            collection.remove_item(PositionKey::Item(ItemId(product_id)))?;
            info!(category_id, product_id, "product removed from category");
            print_order(&collection.items(), &show.to_filter())?;
        }
        Command::Prefs { action } => run_prefs(&settings, action).await?,
    }

    Ok(())
}

struct ListArgs {
    screen: Screen,
    filters: Vec<String>,
    page: Option<u32>,
    per_page: Option<u32>,
    sort_by: Option<String>,
    sort_dir: Option<SortDir>,
}

async fn run_list(settings: &Settings, args: ListArgs) -> Result<()> {
    let screen = args.screen;
    let preferences = open_preferences(settings).await;
    let saved = match &preferences {
        Some(store) => ScreenPreferences::load(store, screen.name()).await,
        None => ScreenPreferences::default(),
    };

    let catalog = Arc::new(screen.catalog());
    let mut controller = QueryController::with_defaults(
        Arc::clone(&catalog),
        saved.effective_per_page(),
        screen.default_sort(),
        SortDir::default(),
    )?;
    for arg in &args.filters {
        let (key, value) = parse_filter(&catalog, arg)?;
        controller.set_filter(&key, Some(value))?;
    }
    if args.sort_by.is_some() || args.sort_dir.is_some() {
        let sort_by = args.sort_by.as_deref().or(screen.default_sort());
        controller.set_sort(sort_by, args.sort_dir.unwrap_or_default());
    }
    if let Some(per_page) = args.per_page {
        controller.set_per_page(per_page)?;
    }
    if let Some(page) = args.page {
        controller.set_page(page);
    }

    let fetcher: Arc<dyn ListFetcher<serde_json::Value>> =
        Arc::new(AdminApiClient::new(settings.client_config()?)?);
    let loader = Arc::new(
        ListLoader::new(fetcher, screen.resource())
            .with_timeout(Duration::from_secs(settings.request_timeout_secs.max(1))),
    );
    let session = ListSession::start(controller, Arc::clone(&loader), settings.debounce_policy());
    let request = session.snapshot();
    let chips = session.chips();
    session.close().await;

    let state = loader.state();
    if let Some(message) = state.last_error {
        bail!("failed to load {}: {message}", screen.name());
    }

    let output = json!({
        "screen": screen.name(),
        "page": request.page,
        "per_page": request.per_page,
        "total": state.total,
        "chips": chips,
        "items": state.items,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run_prefs(settings: &Settings, action: PrefsAction) -> Result<()> {
    let url = prepare_preferences_url(&settings.preferences_db)?;
    let store = Storage::new(&url).await?;

    let (screen, prefs) = match action {
        PrefsAction::Get { screen } => (screen, ScreenPreferences::load(&store, screen.name()).await),
        PrefsAction::Set {
            screen,
            filters_open,
            columns,
            per_page,
        } => {
            let mut prefs = ScreenPreferences::load(&store, screen.name()).await;
            if let Some(filters_open) = filters_open {
                prefs.filters_open = filters_open;
            }
            if let Some(columns) = columns {
                prefs.columns = parse_columns(&columns)?;
            }
            if let Some(per_page) = per_page {
                if per_page == 0 {
                    bail!("per-page must be greater than zero");
                }
                prefs.per_page = Some(per_page);
            }
            prefs.save(&store, screen.name()).await?;
            (screen, prefs)
        }
        PrefsAction::Reset { screen } => {
            ScreenPreferences::reset(&store, screen.name()).await?;
            (screen, ScreenPreferences::default())
        }
    };

    let output = json!({ "screen": screen.name(), "preferences": prefs });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// A missing preferences database never blocks listing.
async fn open_preferences(settings: &Settings) -> Option<Storage> {
    let opened = match prepare_preferences_url(&settings.preferences_db) {
        Ok(url) => Storage::new(&url).await,
        Err(err) => Err(err),
    };
    match opened {
        Ok(storage) => Some(storage),
        Err(err) => {
            warn!(error = %err, "preferences unavailable; using screen defaults");
            None
        }
    }
}

async fn open_category(
    settings: &Settings,
    category_id: i64,
    mode: PersistMode,
) -> Result<OrderedCollection<CategoryProduct>> {
    let client = AdminApiClient::new(settings.client_config()?)?;
    let detail = client.category(category_id).await?;
    info!(category_id, products = detail.products.len(), "category loaded");
    let store: Arc<dyn PositionStore> = Arc::new(CategoryProductPositions::new(client));
    Ok(OrderedCollection::new(ordered_products(detail), store, mode))
}

fn report_events(events: &mut broadcast::Receiver<ScreenEvent>) -> Result<()> {
    while let Ok(event) = events.try_recv() {
        match event {
            ScreenEvent::OrderRolledBack { message } => {
                bail!("save failed, order restored: {message}")
            }
            event if event.is_error() => warn!(?event, "save reported an error"),
            event => info!(?event, "save finished"),
        }
    }
    Ok(())
}

fn print_order(items: &[OrderedItem<CategoryProduct>], filter: &ProductFilter) -> Result<()> {
    if filter.is_active() {
        info!(?filter, total = items.len(), "showing filtered products");
    }
    let rows: Vec<_> = filter
        .apply(items)
        .iter()
        .map(|item| {
            json!({
                "position": item.position,
                "product_id": item.id,
                "pivot_id": item.pivot_id,
                "sku": item.data.sku,
                "name": item.data.display_name(),
                "draft": item.data.draft,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
