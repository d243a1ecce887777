use std::{fs::File, path::PathBuf, process::ExitCode, str::FromStr};

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use rust_decimal::Decimal;
use salesdesk::{
    config::{self, AppConfig},
    db,
    entities::{CustomerModel, NewCustomer, NewProduct, NewSale, ProductModel, SaleDetail},
    services::{
        export::{export_to_path, ExportFormat},
        reports::{chart_series, render_bars, series_from_csv, top_n, ChartSeries, ChartView},
        seed::insert_sample_data,
    },
    AppState, ServiceError,
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

const BAR_WIDTH: usize = 40;

#[derive(Parser)]
#[command(
    name = "salesdesk",
    about = "Record products, customers and sales, chart revenue and ask a local model about it",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[arg(long, global = true, help = "Database URL; overrides configuration")]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the products, customers and sales tables if missing
    InitDb,
    /// Record counts and total revenue
    Dashboard,
    #[command(subcommand)]
    Products(ProductsCommands),
    #[command(subcommand)]
    Customers(CustomersCommands),
    #[command(subcommand)]
    Sales(SalesCommands),
    /// Revenue summary with charts by product, category and date
    Report(ReportArgs),
    /// Chart a sales CSV with sale_date and amount columns
    ChartCsv(ChartCsvArgs),
    /// Ask the model for a short report on current sales
    Insights,
    /// Ask the model a free-form question
    Chat(ChatArgs),
    /// Dump all tables to a file
    Export(ExportArgs),
    /// Load demo products, customers and sales
    Seed,
}

#[derive(Subcommand)]
enum ProductsCommands {
    List,
    Add(ProductArgs),
    Update(UpdateProductArgs),
    Delete(DeleteArgs),
}

#[derive(Subcommand)]
enum CustomersCommands {
    List,
    Add(CustomerArgs),
    Update(UpdateCustomerArgs),
    Delete(DeleteArgs),
}

#[derive(Subcommand)]
enum SalesCommands {
    List,
    Add(SaleArgs),
    Delete(DeleteArgs),
}

#[derive(Args)]
struct ProductArgs {
    #[arg(long, help = "Display name for the product")]
    name: String,
    #[arg(long, help = "Optional category used for category reports")]
    category: Option<String>,
    #[arg(long, value_parser = parse_decimal, help = "Unit price")]
    price: Decimal,
}

impl From<ProductArgs> for NewProduct {
    fn from(args: ProductArgs) -> Self {
        NewProduct {
            name: args.name,
            category: args.category,
            price: args.price,
        }
    }
}

#[derive(Args)]
struct UpdateProductArgs {
    #[arg(long, help = "Product identifier")]
    id: i32,
    #[command(flatten)]
    fields: ProductArgs,
}

#[derive(Args)]
struct CustomerArgs {
    #[arg(long, help = "Customer name")]
    name: String,
    #[arg(long, help = "Optional email address")]
    email: Option<String>,
    #[arg(long, help = "Optional phone number")]
    phone: Option<String>,
}

impl From<CustomerArgs> for NewCustomer {
    fn from(args: CustomerArgs) -> Self {
        NewCustomer {
            name: args.name,
            email: args.email,
            phone: args.phone,
        }
    }
}

#[derive(Args)]
struct UpdateCustomerArgs {
    #[arg(long, help = "Customer identifier")]
    id: i32,
    #[command(flatten)]
    fields: CustomerArgs,
}

#[derive(Args)]
struct SaleArgs {
    #[arg(long, help = "Identifier of the product sold")]
    product_id: i32,
    #[arg(long, help = "Identifier of the buying customer")]
    customer_id: i32,
    #[arg(long, value_parser = parse_date, help = "Sale date (YYYY-MM-DD); defaults to today")]
    date: Option<NaiveDate>,
    #[arg(long, value_parser = parse_decimal, help = "Sale amount")]
    amount: Decimal,
}

#[derive(Args)]
struct DeleteArgs {
    #[arg(long, help = "Identifier of the record to delete")]
    id: i32,
    #[arg(long, action = ArgAction::SetTrue, help = "Confirm the deletion")]
    yes: bool,
}

#[derive(Args)]
struct ReportArgs {
    #[arg(long, help = "Limit the product chart to the top N products")]
    top: Option<usize>,
}

#[derive(Args)]
struct ChartCsvArgs {
    #[arg(help = "Path to the CSV file")]
    path: PathBuf,
}

#[derive(Args)]
struct ChatArgs {
    #[arg(required = true, num_args = 1.., help = "Question for the assistant")]
    message: Vec<String>,
}

#[derive(Args)]
struct ExportArgs {
    #[arg(value_parser = ExportFormat::from_str, help = "csv or txt")]
    format: ExportFormat,
    #[arg(help = "Destination file")]
    path: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    config::init_tracing(config.log_level(), config.log_json);
    if let Some(url) = cli.database_url.clone() {
        config.database_url = url;
    }

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: AppConfig) -> Result<(), ServiceError> {
    let json = cli.json;
    let state = AppState::initialize(config).await?;

    match cli.command {
        Commands::InitDb => {
            db::run_migrations(&state.db).await?;
            println!("Database ready at {}", state.config.database_url());
            Ok(())
        }
        Commands::Dashboard => {
            let stats = state.report_service().dashboard().await?;
            if json {
                print_json(&stats)?;
            } else {
                println!("Products:      {}", stats.products);
                println!("Customers:     {}", stats.customers);
                println!("Sales:         {}", stats.sales);
                println!("Total revenue: {:.2}", stats.total_revenue);
            }
            Ok(())
        }
        Commands::Products(command) => handle_products_command(&state, command, json).await,
        Commands::Customers(command) => handle_customers_command(&state, command, json).await,
        Commands::Sales(command) => handle_sales_command(&state, command, json).await,
        Commands::Report(args) => handle_report(&state, args, json).await,
        Commands::ChartCsv(args) => {
            let series = series_from_csv(File::open(&args.path)?)?;
            if json {
                print_json(&series)?;
            } else {
                render_all(&series);
            }
            Ok(())
        }
        Commands::Insights => {
            let text = state.insight_service().analyze_sales().await;
            print_text(&text, json)
        }
        Commands::Chat(args) => {
            let text = state.insight_service().chat(&args.message.join(" ")).await;
            print_text(&text, json)
        }
        Commands::Export(args) => {
            let rows = export_to_path(state.store.as_ref(), args.format, &args.path).await?;
            if json {
                print_json(&json!({ "path": args.path, "rows": rows }))?;
            } else {
                println!("Exported {} records to {}", rows, args.path.display());
            }
            Ok(())
        }
        Commands::Seed => {
            let report = insert_sample_data(state.store.as_ref()).await?;
            if json {
                print_json(&report)?;
            } else {
                println!(
                    "Sample data loaded: {} products, {} customers, {} sales",
                    report.products, report.customers, report.sales
                );
            }
            Ok(())
        }
    }
}

async fn handle_products_command(
    state: &AppState,
    command: ProductsCommands,
    json: bool,
) -> Result<(), ServiceError> {
    let service = state.product_service();
    match command {
        ProductsCommands::List => {
            let products = service.list().await?;
            if json {
                print_json(&products)?;
            } else if products.is_empty() {
                println!("No products yet");
            } else {
                products.iter().for_each(render_product);
            }
        }
        ProductsCommands::Add(args) => {
            let product = service.create(args.into()).await?;
            show_product(&product, json)?;
        }
        ProductsCommands::Update(args) => {
            let product = service.update(args.id, args.fields.into()).await?;
            show_product(&product, json)?;
        }
        ProductsCommands::Delete(args) => {
            confirm(&args, "product")?;
            service.delete(args.id).await?;
            println!("Deleted product {} and its sales", args.id);
        }
    }
    Ok(())
}

async fn handle_customers_command(
    state: &AppState,
    command: CustomersCommands,
    json: bool,
) -> Result<(), ServiceError> {
    let service = state.customer_service();
    match command {
        CustomersCommands::List => {
            let customers = service.list().await?;
            if json {
                print_json(&customers)?;
            } else if customers.is_empty() {
                println!("No customers yet");
            } else {
                customers.iter().for_each(render_customer);
            }
        }
        CustomersCommands::Add(args) => {
            let customer = service.create(args.into()).await?;
            show_customer(&customer, json)?;
        }
        CustomersCommands::Update(args) => {
            let customer = service.update(args.id, args.fields.into()).await?;
            show_customer(&customer, json)?;
        }
        CustomersCommands::Delete(args) => {
            confirm(&args, "customer")?;
            service.delete(args.id).await?;
            println!("Deleted customer {} and their sales", args.id);
        }
    }
    Ok(())
}

async fn handle_sales_command(
    state: &AppState,
    command: SalesCommands,
    json: bool,
) -> Result<(), ServiceError> {
    let service = state.sale_service();
    match command {
        SalesCommands::List => {
            let sales = service.list_details().await?;
            if json {
                print_json(&sales)?;
            } else if sales.is_empty() {
                println!("No sales yet");
            } else {
                sales.iter().for_each(render_sale);
            }
        }
        SalesCommands::Add(args) => {
            let sale = service
                .record(NewSale::new(
                    args.product_id,
                    args.customer_id,
                    args.date,
                    args.amount,
                ))
                .await?;
            if json {
                print_json(&sale)?;
            } else {
                println!(
                    "Recorded sale {} • product {} • customer {} • {} • {:.2}",
                    sale.id, sale.product_id, sale.customer_id, sale.sale_date, sale.amount
                );
            }
        }
        SalesCommands::Delete(args) => {
            confirm(&args, "sale")?;
            service.delete(args.id).await?;
            println!("Deleted sale {}", args.id);
        }
    }
    Ok(())
}

/// Every product is charted unless `--top` asks for fewer.
fn limit_product_chart(series: Vec<ChartSeries>, top: Option<usize>) -> Vec<ChartSeries> {
    series
        .into_iter()
        .map(|s| match (s.view, top) {
            (ChartView::RevenueByProduct, Some(n)) => top_n(s, n),
            _ => s,
        })
        .collect()
}

async fn handle_report(state: &AppState, args: ReportArgs, json: bool) -> Result<(), ServiceError> {
    let analysis = state.analytics_service().analyze().await?;
    let series = limit_product_chart(chart_series(&analysis), args.top);

    if json {
        return print_json(&json!({ "summary": analysis.summary, "series": series }));
    }

    let summary = &analysis.summary;
    if summary.is_empty() {
        println!("No sales found. Add some data or run `salesdesk seed`.");
        return Ok(());
    }

    println!("Sales:         {}", summary.sale_count);
    println!("Total revenue: {:.2}", summary.total_revenue);
    if let Some(average) = summary.average_sale {
        println!("Average sale:  {:.2}", average);
    }
    if let Some(top) = &summary.top_product {
        println!("Top product:   {}", top);
    }
    println!();
    render_all(&series);
    Ok(())
}

fn confirm(args: &DeleteArgs, entity: &str) -> Result<(), ServiceError> {
    if args.yes {
        Ok(())
    } else {
        Err(ServiceError::InvalidInput(format!(
            "Deleting {} {} also removes its sales; re-run with --yes to confirm",
            entity, args.id
        )))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ServiceError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_text(text: &str, json: bool) -> Result<(), ServiceError> {
    if json {
        print_json(&json!({ "response": text }))
    } else {
        println!("{}", text);
        Ok(())
    }
}

fn render_all(series: &[ChartSeries]) {
    if series.is_empty() {
        println!("Nothing to chart");
    }
    for s in series {
        println!("{}", render_bars(s, BAR_WIDTH));
    }
}

fn show_product(product: &ProductModel, json: bool) -> Result<(), ServiceError> {
    if json {
        print_json(product)
    } else {
        render_product(product);
        Ok(())
    }
}

fn show_customer(customer: &CustomerModel, json: bool) -> Result<(), ServiceError> {
    if json {
        print_json(customer)
    } else {
        render_customer(customer);
        Ok(())
    }
}

fn render_product(product: &ProductModel) {
    println!(
        "- Product {} • {} • {} • {:.2}",
        product.id,
        product.name,
        product.category.as_deref().unwrap_or("-"),
        product.price
    );
}

fn render_customer(customer: &CustomerModel) {
    println!(
        "- Customer {} • {} • {} • {}",
        customer.id,
        customer.name,
        customer.email.as_deref().unwrap_or("-"),
        customer.phone.as_deref().unwrap_or("-")
    );
}

fn render_sale(sale: &SaleDetail) {
    println!(
        "- Sale {} • {} • {} • {} • {:.2}",
        sale.id, sale.sale_date, sale.product, sale.customer, sale.amount
    );
}

fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw).map_err(|_| format!("invalid decimal '{raw}'"))
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{raw}', expected YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use salesdesk::services::analytics::{GroupedTotal, SalesAnalysis, SalesSummary};

    fn analysis_with_products(count: usize) -> SalesAnalysis {
        let by_product: Vec<GroupedTotal<String>> = (0..count)
            .map(|i| GroupedTotal::new(format!("item{i:02}"), Decimal::from(100 - i as i64)))
            .collect();
        SalesAnalysis {
            summary: SalesSummary {
                sale_count: count as u64,
                total_revenue: Decimal::ZERO,
                average_sale: None,
                top_product: None,
            },
            by_product,
            by_category: vec![],
            by_date: vec![],
        }
    }

    #[test]
    fn report_charts_every_product_by_default() {
        let cli = Cli::try_parse_from(["salesdesk", "report"]).unwrap();
        let Commands::Report(args) = cli.command else {
            panic!("expected the report command");
        };
        assert_eq!(args.top, None);

        let series = limit_product_chart(chart_series(&analysis_with_products(12)), args.top);
        assert_eq!(series[0].view, ChartView::RevenueByProduct);
        assert_eq!(series[0].points.len(), 12);
    }

    #[test]
    fn report_top_limits_the_product_chart() {
        let cli = Cli::try_parse_from(["salesdesk", "report", "--top", "3"]).unwrap();
        let Commands::Report(args) = cli.command else {
            panic!("expected the report command");
        };

        let series = limit_product_chart(chart_series(&analysis_with_products(12)), args.top);
        let labels: Vec<_> = series[0].points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["item00", "item01", "item02"]);
    }
}
