use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use filter_state::{adapter, url_state, ActiveFilter, FilterSchema, ODataOperator};
use idempiere_rest::{EntityRepository, ErpConfig, HttpClient, PaginatedResponse, Pagination};
use odata_query::ast::{self, CompareOp, MethodOp, Scalar};
use odata_query::{OrderBy, QueryBuilder, SortDir};

/// erpq - query tool for the campus ERP REST API
#[derive(Parser)]
#[command(name = "erpq")]
#[command(about = "Query tool for the campus ERP REST API")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a list query against an entity endpoint
    Query(QueryArgs),
    /// Fetch a single record by id
    Get {
        /// Entity endpoint, e.g. models/c_bpartner
        entity: String,
        /// Record id
        id: i64,
    },
    /// Print a filter schema's fields and operators
    Schema {
        /// Filter schema YAML
        file: PathBuf,
    },
    /// Check configuration
    Check,
}

#[derive(Args)]
struct QueryArgs {
    /// Entity endpoint, e.g. models/c_bpartner
    entity: String,

    /// Equality predicate, repeatable (FIELD=VALUE)
    #[arg(long = "eq", value_name = "FIELD=VALUE")]
    eq: Vec<String>,

    /// Substring predicate, repeatable (FIELD=VALUE)
    #[arg(long = "contains", value_name = "FIELD=VALUE")]
    contains: Vec<String>,

    /// Sort clause, repeatable ("Field" or "Field desc")
    #[arg(long)]
    order: Vec<String>,

    /// Columns to return
    #[arg(long, value_delimiter = ',')]
    select: Vec<String>,

    /// 1-based page
    #[arg(long, default_value_t = 1)]
    page: u64,

    /// Records per page (defaults to the configured page size)
    #[arg(long)]
    page_size: Option<u64>,

    /// Browser-style filter state, filters and search only
    /// (f[Field][op]=value&q=term); interpreted against --schema
    #[arg(long, value_name = "QUERY_STRING")]
    state: Option<String>,

    /// Filter schema YAML used with --state
    #[arg(long, value_name = "FILE")]
    schema: Option<PathBuf>,

    /// Ask the server to echo the generated SQL
    #[arg(long)]
    show_sql: bool,

    /// Print the query string instead of executing it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = ErpConfig::load_or_default(cli.config.as_deref())?;

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Check) {
        Commands::Query(args) => run_query(&config, args).await,
        Commands::Get { entity, id } => run_get(&config, &entity, id).await,
        Commands::Schema { file } => print_schema(&file),
        Commands::Check => check_config(&config),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Repository over raw JSON records; the CLI prints them as-is.
fn repository(config: &ErpConfig, entity: &str) -> Result<EntityRepository<Value, Value>> {
    let client = Arc::new(HttpClient::new(config)?);
    Ok(EntityRepository::new(client, entity, |record: Value| record))
}

async fn run_query(config: &ErpConfig, args: QueryArgs) -> Result<()> {
    let page_size = args.page_size.unwrap_or(config.default_page_size);

    if let Some(state) = &args.state {
        if !args.eq.is_empty() || !args.contains.is_empty() {
            return Err(anyhow!("--state cannot be combined with --eq/--contains"));
        }
        return run_state_query(config, &args, state, page_size).await;
    }

    let mut builder = QueryBuilder::new().paginate(args.page, page_size);
    for pair in &args.eq {
        let (field, value) = split_pair(pair)?;
        builder = builder.and(ast::filter(field, CompareOp::Eq, parse_scalar(value)));
    }
    for pair in &args.contains {
        let (field, value) = split_pair(pair)?;
        builder = builder.and(ast::method_filter(MethodOp::Contains, field, value));
    }
    if !args.order.is_empty() {
        let clauses = args
            .order
            .iter()
            .map(|clause| parse_order(clause))
            .collect::<Result<Vec<_>>>()?;
        builder = builder.order_by_multiple(clauses);
    }
    if !args.select.is_empty() {
        builder = builder.select(args.select.iter().cloned());
    }
    if args.show_sql {
        builder = builder.with_show_sql(false);
    }

    if args.dry_run {
        println!("{}", builder.to_query_string());
        return Ok(());
    }

    let repo = repository(config, &args.entity)?;
    let page = repo.try_query(builder.config()).await?;
    print_page(&page)
}

/// Replays a browser URL against the API: decode the filter state, split
/// it into server-side and client-side parts, fetch, trim.
async fn run_state_query(
    config: &ErpConfig,
    args: &QueryArgs,
    state: &str,
    page_size: u64,
) -> Result<()> {
    let schema = match &args.schema {
        Some(path) => load_schema(path)?,
        None => {
            // An empty schema makes the adapter drop every decoded filter.
            tracing::warn!("--state given without --schema; all filters in the URL will be ignored");
            FilterSchema::new()
        }
    };

    let decoded = url_state::decode(state, &schema);
    let mut filters = decoded.filters;
    if !decoded.search.is_empty() {
        // Same default search column the repository uses.
        filters.push(ActiveFilter::new(
            "Name",
            ODataOperator::Contains,
            decoded.search.as_str(),
        ));
    }
    tracing::debug!(filters = filters.len(), "decoded filter state");

    if args.dry_run {
        let rendered = adapter::build_odata_filter(&filters, &schema).unwrap_or_default();
        println!("$filter={rendered}");
        return Ok(());
    }

    let repo = repository(config, &args.entity)?.with_schema(schema);
    let page = repo
        .query_filtered(&filters, Pagination::new(args.page, page_size))
        .await;
    print_page(&page)
}

async fn run_get(config: &ErpConfig, entity: &str, id: i64) -> Result<()> {
    let repo = repository(config, entity)?;
    match repo.get_by_id(id).await {
        Some(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        None => Err(anyhow!("{entity}/{id} not found")),
    }
}

fn print_schema(path: &Path) -> Result<()> {
    let schema = load_schema(path)?;
    let mut names: Vec<&String> = schema.0.keys().collect();
    names.sort();
    for name in names {
        let meta = &schema.0[name];
        let side = if meta.client_side { " (client-side)" } else { "" };
        println!("{name}: {} [{}]{side}", meta.label, meta.field_type.as_str());
        let ops = meta
            .operators
            .iter()
            .map(|op| op.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "  operators: {ops} (default {})",
            meta.default_operator().as_str()
        );
        if !meta.options.is_empty() {
            let options = meta
                .options
                .iter()
                .map(|option| format!("{}={}", option.value, option.label))
                .collect::<Vec<_>>()
                .join(", ");
            println!("  options: {options}");
        }
        if let Some(reference) = &meta.reference {
            println!(
                "  reference: {} ({} -> {})",
                reference.entity, reference.key_column, reference.display_column
            );
        }
    }
    Ok(())
}

fn check_config(config: &ErpConfig) -> Result<()> {
    // Constructing the client validates the base URL and timeout.
    HttpClient::new(config).context("configuration rejected")?;
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}

fn print_page(page: &PaginatedResponse<Value>) -> Result<()> {
    for record in &page.records {
        println!("{}", serde_json::to_string(record)?);
    }
    eprintln!(
        "page {}/{} ({} records total)",
        page.page, page.total_pages, page.total_records
    );
    if let Some(sql) = &page.sql {
        eprintln!("sql: {sql}");
    }
    Ok(())
}

fn load_schema(path: &Path) -> Result<FilterSchema> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("invalid schema {}", path.display()))
}

fn split_pair(pair: &str) -> Result<(&str, &str)> {
    pair.split_once('=')
        .ok_or_else(|| anyhow!("expected FIELD=VALUE, got '{pair}'"))
}

/// Booleans and integers go bare on the wire; everything else is a string.
fn parse_scalar(raw: &str) -> Scalar {
    if let Ok(flag) = raw.parse::<bool>() {
        return Scalar::from(flag);
    }
    if let Ok(number) = raw.parse::<i64>() {
        return Scalar::from(number);
    }
    Scalar::from(raw)
}

fn parse_order(clause: &str) -> Result<OrderBy> {
    let mut parts = clause.split_whitespace();
    let field = parts.next().ok_or_else(|| anyhow!("empty order clause"))?;
    let dir = match parts.next() {
        None | Some("asc") => SortDir::Asc,
        Some("desc") => SortDir::Desc,
        Some(other) => return Err(anyhow!("unknown sort direction '{other}'")),
    };
    Ok(OrderBy::new(field, dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use odata_query::serialize::render_filter;

    #[test]
    fn test_parse_scalar_types() {
        assert_eq!(
            render_filter(&ast::filter("A", CompareOp::Eq, parse_scalar("true"))),
            "A eq true"
        );
        assert_eq!(
            render_filter(&ast::filter("A", CompareOp::Eq, parse_scalar("42"))),
            "A eq 42"
        );
        assert_eq!(
            render_filter(&ast::filter("A", CompareOp::Eq, parse_scalar("Joe"))),
            "A eq 'Joe'"
        );
    }

    #[test]
    fn test_parse_order_clauses() {
        assert_eq!(parse_order("Name").unwrap().to_string(), "Name asc");
        assert_eq!(parse_order("Name desc").unwrap().to_string(), "Name desc");
        assert!(parse_order("Name sideways").is_err());
    }

    #[test]
    fn test_split_pair_requires_equals() {
        assert_eq!(split_pair("A=1").unwrap(), ("A", "1"));
        assert!(split_pair("A").is_err());
    }

    #[test]
    fn test_state_filters_all_dropped_without_schema() {
        // Decoding succeeds, but against an empty schema the adapter keeps
        // nothing on either side; run_state_query warns about this case.
        let schema = FilterSchema::new();
        let decoded = url_state::decode("f[IsActive]=true&q=smith", &schema);
        assert_eq!(decoded.filters.len(), 1);

        assert_eq!(adapter::build_odata_filter(&decoded.filters, &schema), None);
        assert!(adapter::client_side_filters(&decoded.filters, &schema).is_empty());
    }
}
