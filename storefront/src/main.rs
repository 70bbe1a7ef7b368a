use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use shared::{CreateProductRequest, Product};
use storefront::catalog::{filter_by_name, page, page_count, ProductPage};
use storefront::dashboard::{item_count, line_label, AdminCatalog, RECENT_ORDER_WINDOW};
use storefront::{place_order, Cart, CartChange, HttpShopApi, PlacementOutcome, ShopApi, Totals};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "storefront")]
struct Args {
    #[arg(long, env = "SHOP_API_URL", default_value = "http://localhost:3001")]
    api_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the catalog, optionally filtered by product name
    Products {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Show a single product
    Product { id: String },
    /// Build a cart from `<product-id>:<quantity>` pairs and place the order
    Checkout {
        #[arg(long = "item", value_parser = parse_item, required = true)]
        items: Vec<(Uuid, i32)>,
    },
    /// List placed orders
    Orders,
    /// Revenue and order summary
    Dashboard,
    AddProduct {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        stock: i32,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        image: Option<String>,
    },
    DeleteProduct { id: String },
}

fn parse_item(raw: &str) -> Result<(Uuid, i32), String> {
    let (id, quantity) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected <product-id>:<quantity>, got {}", raw))?;
    let id = Uuid::parse_str(id).map_err(|e| format!("invalid product id {}: {}", id, e))?;
    let quantity = quantity
        .parse::<i32>()
        .map_err(|e| format!("invalid quantity {}: {}", quantity, e))?;
    Ok((id, quantity))
}

fn money(amount: f64) -> String {
    format!("${:.2}", amount)
}

fn print_products<'a>(products: impl IntoIterator<Item = &'a Product>) {
    let mut shown = 0;
    for product in products {
        let stock = if product.stock > 0 {
            format!("{} in stock", product.stock)
        } else {
            "out of stock".to_string()
        };
        println!("{}  {:<30} {:>10}  {}", product.id, product.name, money(product.price), stock);
        shown += 1;
    }
    if shown == 0 {
        println!("No products found");
    }
}

fn print_cart(cart: &Cart) {
    for item in cart.items() {
        println!(
            "  {} x {:<30} {:>10}",
            item.quantity(),
            item.product().name,
            money(item.line_total())
        );
    }
    let totals = Totals::for_cart(cart);
    println!("  Subtotal: {}", money(totals.subtotal));
    println!("  Discount (10%): -{}", money(totals.discount));
    println!("  Shipping: Free");
    println!("  Total: {}", money(totals.total));
}

async fn checkout(api: &dyn ShopApi, items: Vec<(Uuid, i32)>) -> Result<()> {
    let products = api.list_products().await?;
    let mut cart = Cart::new();

    for (id, quantity) in items {
        let Some(product) = products.iter().find(|p| p.id == id) else {
            println!("Skipping unknown product {}", id);
            continue;
        };
        match cart.add(product, quantity) {
            CartChange::StockLimit { available } => {
                println!("Only {} of {} available, not added", available, product.name);
            }
            CartChange::Ignored => println!("Ignoring {} x {}", quantity, product.name),
            _ => {}
        }
    }

    print_cart(&cart);

    match place_order(api, &mut cart).await {
        PlacementOutcome::Placed { order, redirect_after, .. } => {
            println!("Order {} placed successfully!", order.id);
            tokio::time::sleep(redirect_after).await;
            print_products(&api.list_products().await?);
            Ok(())
        }
        PlacementOutcome::EmptyCart => bail!("Your cart is empty"),
        PlacementOutcome::Failed => bail!("Failed to place order. Please try again."),
    }
}

async fn show_orders(api: &dyn ShopApi) -> Result<()> {
    let orders = api.list_orders().await?;
    if orders.is_empty() {
        println!("No orders yet");
    }
    for order in &orders {
        println!(
            "Order {}  {}  {} item(s)  {}",
            order.id,
            order.created_at.format("%Y-%m-%d %H:%M"),
            item_count(order),
            money(order.total_amount)
        );
        for line in &order.products {
            match &line.product {
                Some(product) => println!("    {} x {} @ {}", line.quantity, line_label(line), money(product.price)),
                None => println!("    {} x {}", line.quantity, line_label(line)),
            }
        }
    }
    Ok(())
}

async fn show_dashboard(api: &dyn ShopApi) -> Result<()> {
    let admin = AdminCatalog::load(api).await?;
    let summary = admin.summary();

    println!("Total revenue: {}", money(summary.total_revenue));
    println!("Orders: {}", summary.order_count);
    println!("Products: {}", summary.product_count);
    println!("Stock units: {}", summary.stock_units);
    println!("Items sold: {}", summary.items_sold);
    println!("Last {} orders:", RECENT_ORDER_WINDOW);
    for recent in &summary.recent_orders {
        println!(
            "  {}  {} item(s)  {}",
            recent.id,
            recent.item_count,
            money(recent.total_amount)
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
    let args = Args::parse();
    let api = HttpShopApi::new(args.api_url);

    match args.command {
        Command::Products { search, page: number } => {
            let products = api.list_products().await?;
            let matches = filter_by_name(&products, search.as_deref().unwrap_or(""));
            print_products(page(&matches, number).iter().copied());
            let pages = page_count(matches.len());
            if pages > 1 {
                println!("Page {} of {}", number.clamp(1, pages), pages);
            }
        }
        Command::Product { id } => match ProductPage::load(&api, &id).await? {
            ProductPage::Found(product) => {
                println!("{}", product.name);
                println!("Price: {}", money(product.price));
                println!("Stock: {}", product.stock);
                if let Some(description) = &product.description {
                    println!("{}", description);
                }
                if let Some(image) = &product.image {
                    println!("Image: {}", image);
                }
            }
            ProductPage::NotFound => println!("Product not found"),
        },
        Command::Checkout { items } => checkout(&api, items).await?,
        Command::Orders => show_orders(&api).await?,
        Command::Dashboard => show_dashboard(&api).await?,
        Command::AddProduct { name, price, stock, description, image } => {
            let request = CreateProductRequest { name, description, price, image, stock };
            if let Err(e) = request.validate() {
                bail!("{}", e);
            }
            let mut admin = AdminCatalog::load(&api).await?;
            let product = admin.add_product(&api, &request).await?;
            println!("Created product {} ({})", product.name, product.id);
        }
        Command::DeleteProduct { id } => {
            let Ok(id) = Uuid::parse_str(&id) else {
                bail!("Product not found");
            };
            let mut admin = AdminCatalog::load(&api).await?;
            match admin.delete_product(&api, id).await {
                Ok(()) => println!("Deleted product {}; {} remaining", id, admin.products().len()),
                Err(e) if e.is_not_found() => bail!("Product not found"),
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}
