use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use catalog_core::{CatalogEngine, EngineConfig, ListingRequest, SuggestRequest};
use catalog_store::{MemoryCatalog, MemoryTerms, Product, ProductStore, TermEntry};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use indicatif::ProgressBar;
use output::{OutputFormat, Renderer};
use progress::spinner;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser, Clone)]
#[command(
    name = "catalogo",
    version,
    about = "Search, inspect and synchronize the wholesale product catalog from the shell."
)]
struct Cli {
    /// Preferred renderer for command output.
    #[arg(long, global = true, value_enum, default_value = "markdown")]
    format: OutputFormat,
    /// JSON dump of products to load into the in-memory catalog.
    #[arg(long, global = true)]
    products: Option<PathBuf>,
    /// JSON dump of the synonym dictionary.
    #[arg(long, global = true)]
    synonyms: Option<PathBuf>,
    /// Engine configuration file (TOML/JSON), overridable via CATALOGO_* env vars.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Disable ANSI colors in CLI output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Suppress non-critical CLI output.
    #[arg(long, global = true)]
    quiet: bool,
    /// Disable progress indicators for long-running tasks.
    #[arg(long, global = true)]
    no_progress: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand, Clone)]
enum Command {
    /// Run a catalog listing query with filters and pagination.
    Search(Box<SearchArgs>),
    /// Suggest products similar to a reference product.
    Suggest {
        /// Reference product code.
        codigo: String,
        /// Maximum suggestions to return (clamped to 1..=50).
        #[arg(long)]
        limit: Option<i64>,
        /// Stock constraint: public, agotado or all.
        #[arg(long)]
        stock: Option<String>,
        /// Comma-separated warehouse allow-list.
        #[arg(long)]
        bodegas: Option<String>,
        /// Comma-separated stand allow-list.
        #[arg(long)]
        stands: Option<String>,
    },
    /// Show one product with its aggregated existence.
    Show {
        /// Product code.
        codigo: String,
    },
    /// Upsert a JSON dump of products into the loaded catalog and
    /// report the outcome.
    Sync {
        /// Path to a JSON array of products.
        file: PathBuf,
    },
    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, clap::Args, Clone, Default)]
struct SearchArgs {
    /// Free-text query (synonym-expanded graduated search).
    query: Option<String>,
    /// Typeahead query; ignored when a free-text query is present.
    #[arg(long)]
    title: Option<String>,
    /// Exact product code.
    #[arg(long)]
    codigo: Option<String>,
    /// Exact barcode.
    #[arg(long)]
    barras: Option<String>,
    /// Description substring.
    #[arg(long)]
    descripcion: Option<String>,
    /// Hierarchy chains, e.g. "B-6-2" or "B62;C7".
    #[arg(long)]
    cadena: Option<String>,
    #[arg(long)]
    cod_fami: Option<String>,
    #[arg(long)]
    cod_grupo: Option<String>,
    #[arg(long)]
    cod_subgrupo: Option<String>,
    /// Brand identifier.
    #[arg(long)]
    marca: Option<String>,
    /// Manufacturer identifier.
    #[arg(long)]
    fabricante: Option<String>,
    /// Featured flag: si/no (anything else is ignored).
    #[arg(long)]
    desta: Option<String>,
    /// Fast-moving flag: si/no.
    #[arg(long)]
    masve: Option<String>,
    /// New-product flag: si/no.
    #[arg(long)]
    nuevo: Option<String>,
    /// Promotion flag: si/no.
    #[arg(long)]
    promo: Option<String>,
    /// Catalog promotion: true/false or a promo code.
    #[arg(long)]
    promo_catalogo: Option<String>,
    /// Catalog reference flag.
    #[arg(long)]
    ref_catalogo: Option<String>,
    /// Stock constraint: public, agotado or all.
    #[arg(long)]
    stock: Option<String>,
    /// Comma-separated warehouse allow-list.
    #[arg(long)]
    bodegas: Option<String>,
    /// Comma-separated stand allow-list.
    #[arg(long)]
    stands: Option<String>,
    /// Exclude one product code from the results.
    #[arg(long)]
    exclude: Option<String>,
    /// Aggregated-existence ceiling.
    #[arg(long)]
    max_exist: Option<f64>,
    /// Product-quantity ceiling.
    #[arg(long)]
    max_cantidad: Option<f64>,
    /// Only products missing the extended description.
    #[arg(long)]
    sin_descripcion: bool,
    /// Only products missing at least one dimension.
    #[arg(long)]
    sin_medidas: bool,
    #[arg(long)]
    page: Option<i64>,
    #[arg(long)]
    size: Option<i64>,
    /// Sort key: alpha or total.
    #[arg(long)]
    order: Option<String>,
    /// Sort direction: asc or desc.
    #[arg(long)]
    dir: Option<String>,
}

impl SearchArgs {
    fn into_request(self) -> ListingRequest {
        ListingRequest {
            q: self.query,
            title: self.title,
            codigo: self.codigo,
            barras: self.barras,
            descripcion: self.descripcion,
            cadena: self.cadena,
            cod_fami: self.cod_fami,
            cod_grupo: self.cod_grupo,
            cod_subgrupo: self.cod_subgrupo,
            marca_id: self.marca,
            fabricante_id: self.fabricante,
            desta: self.desta,
            masve: self.masve,
            nuevo: self.nuevo,
            promo: self.promo,
            promo_catalogo: self.promo_catalogo,
            ref_catalogo: self.ref_catalogo,
            stock: self.stock,
            bodegas: self.bodegas,
            stands: self.stands,
            exclude: self.exclude,
            max_exist: self.max_exist,
            max_cantidad: self.max_cantidad,
            sin_descripcion: self.sin_descripcion.then(|| "true".to_string()),
            sin_medidas: self.sin_medidas.then(|| "true".to_string()),
            page: self.page,
            size: self.size,
            order: self.order,
            dir: self.dir,
            ..ListingRequest::default()
        }
    }
}

impl Cli {
    fn progress_enabled(&self) -> bool {
        !self.quiet && !self.no_progress
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    if let Command::Completions { shell } = &cli.command {
        let mut command = Cli::command();
        clap_complete::generate(*shell, &mut command, "catalogo", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_engine_config(cli.config.as_deref())?;
    let catalog = Arc::new(load_catalog(&cli).await?);
    let terms = Arc::new(load_terms(&cli).await?);
    let engine = CatalogEngine::new(catalog.clone(), terms, config);
    let renderer = Renderer::new(cli.format);

    match cli.command.clone() {
        Command::Search(args) => {
            let request = (*args).into_request();
            let page = engine.list(&request).await?;
            if !cli.quiet {
                renderer.page(&page)?;
            }
        }
        Command::Suggest {
            codigo,
            limit,
            stock,
            bodegas,
            stands,
        } => {
            let suggestions = engine
                .suggest(&SuggestRequest {
                    codigo: codigo.clone(),
                    limit,
                    stock,
                    bodegas,
                    stands,
                })
                .await
                .with_context(|| format!("suggestion lookup for `{codigo}` failed"))?;
            if !cli.quiet {
                renderer.suggestions(&suggestions)?;
            }
        }
        Command::Show { codigo } => {
            let hit = engine
                .get(&codigo)
                .await
                .with_context(|| format!("lookup for `{codigo}` failed"))?;
            if !cli.quiet {
                renderer.product(&hit)?;
            }
        }
        Command::Sync { file } => {
            let label = format!("Synchronizing `{}`...", file.display());
            let spinner = spinner(cli.progress_enabled(), label);
            let products = read_products(&file).await?;
            let outcome = catalog.upsert(products).await?;
            finish_spinner(
                spinner,
                Some(format!(
                    "Synchronized {} products ({} new, {} replaced)",
                    outcome.received, outcome.upserted, outcome.replaced
                )),
            );
            if !cli.quiet {
                renderer.sync_outcome(&outcome)?;
            }
        }
        Command::Completions { .. } => {}
    }

    Ok(())
}

fn load_engine_config(path: Option<&std::path::Path>) -> Result<EngineConfig> {
    let mut builder = config::Config::builder()
        .set_default("primary_warehouses", vec!["01", "06"])
        .context("invalid default configuration")?;
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }
    builder
        .add_source(config::Environment::with_prefix("CATALOGO"))
        .build()
        .context("failed to load configuration")?
        .try_deserialize()
        .context("invalid engine configuration")
}

async fn load_catalog(cli: &Cli) -> Result<MemoryCatalog> {
    let catalog = MemoryCatalog::new();
    if let Some(path) = &cli.products {
        let label = format!("Loading products from `{}`...", path.display());
        let spinner = spinner(cli.progress_enabled(), label);
        let products = read_products(path).await?;
        let outcome = catalog.upsert(products).await?;
        if !outcome.errors.is_empty() {
            info!(
                target: "catalogo_cli",
                skipped = outcome.errors.len(),
                "some products were skipped during load"
            );
        }
        finish_spinner(spinner, Some(format!("Loaded {} products", catalog.len())));
    }
    Ok(catalog)
}

async fn load_terms(cli: &Cli) -> Result<MemoryTerms> {
    let terms = MemoryTerms::new();
    if let Some(path) = &cli.synonyms {
        let label = format!("Loading synonyms from `{}`...", path.display());
        let spinner = spinner(cli.progress_enabled(), label);
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let entries: Vec<TermEntry> = serde_json::from_slice(&bytes)
            .with_context(|| format!("invalid synonym JSON in {}", path.display()))?;
        terms.load(entries);
        finish_spinner(spinner, Some(format!("Loaded {} terms", terms.len())));
    }
    Ok(terms)
}

async fn read_products(path: &std::path::Path) -> Result<Vec<Product>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("invalid product JSON in {}", path.display()))
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,catalogo_cli=info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .without_time()
        .with_ansi(!cli.no_color)
        .compact()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!("failed to initialize logging: {error}"))
}

fn finish_spinner(spinner: Option<ProgressBar>, message: Option<String>) {
    if let Some(progress) = spinner {
        if let Some(msg) = message {
            progress.finish_with_message(msg);
        } else {
            progress.finish_and_clear();
        }
    }
}

mod output {
    use std::fmt::Write;

    use anyhow::Result;
    use catalog_core::{Page, ProductHit, Suggestions};
    use catalog_store::UpsertOutcome;
    use clap::ValueEnum;

    #[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
    pub enum OutputFormat {
        Json,
        Markdown,
        Table,
        Text,
    }

    #[derive(Copy, Clone, Debug)]
    pub struct Renderer {
        format: OutputFormat,
    }

    impl Renderer {
        pub fn new(format: OutputFormat) -> Self {
            Self { format }
        }

        pub fn page(&self, page: &Page) -> Result<()> {
            match self.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(page)?);
                }
                OutputFormat::Markdown => {
                    println!(
                        "Page {} of {} ({} products)",
                        page.page, page.total_pages, page.total_docs
                    );
                    println!();
                    println!("| Codigo | Descripcion | Precio | Total |");
                    println!("| --- | --- | ---: | ---: |");
                    for hit in &page.data {
                        println!(
                            "| `{}` | {} | {} | {} |",
                            hit.product.codigo,
                            sanitize(&hit.product.descripcion),
                            hit.product.precio,
                            hit.total_exist
                        );
                    }
                }
                OutputFormat::Table => {
                    let rows: Vec<Vec<String>> = page
                        .data
                        .iter()
                        .map(|hit| {
                            vec![
                                hit.product.codigo.clone(),
                                truncate(&sanitize(&hit.product.descripcion), 60),
                                hit.product.precio.clone(),
                                hit.total_exist.to_string(),
                            ]
                        })
                        .collect();
                    render_table(&["Codigo", "Descripcion", "Precio", "Total"], &rows);
                    println!(
                        "({} products, page {} of {})",
                        page.total_docs, page.page, page.total_pages
                    );
                }
                OutputFormat::Text => {
                    for hit in &page.data {
                        println!(
                            "{} — {} (total {})",
                            hit.product.codigo,
                            hit.product.descripcion,
                            hit.total_exist
                        );
                    }
                    println!(
                        "{} products, page {} of {}",
                        page.total_docs, page.page, page.total_pages
                    );
                }
            }
            Ok(())
        }

        pub fn suggestions(&self, suggestions: &Suggestions) -> Result<()> {
            match self.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(suggestions)?);
                }
                OutputFormat::Markdown => {
                    println!(
                        "Suggestions for `{}` — {} ({} candidates)",
                        suggestions.base.codigo,
                        sanitize(&suggestions.base.descripcion),
                        suggestions.total
                    );
                    println!();
                    println!("| Codigo | Descripcion | Score | Price Δ% | Total |");
                    println!("| --- | --- | ---: | ---: | ---: |");
                    for entry in &suggestions.data {
                        println!(
                            "| `{}` | {} | {} | {:.2} | {} |",
                            entry.hit.product.codigo,
                            sanitize(&entry.hit.product.descripcion),
                            entry.score,
                            entry.price_diff_pct,
                            entry.hit.total_exist
                        );
                    }
                }
                OutputFormat::Table => {
                    let rows: Vec<Vec<String>> = suggestions
                        .data
                        .iter()
                        .map(|entry| {
                            vec![
                                entry.hit.product.codigo.clone(),
                                truncate(&sanitize(&entry.hit.product.descripcion), 60),
                                entry.score.to_string(),
                                format!("{:.2}", entry.price_diff_pct),
                                entry.hit.total_exist.to_string(),
                            ]
                        })
                        .collect();
                    render_table(
                        &["Codigo", "Descripcion", "Score", "Price diff", "Total"],
                        &rows,
                    );
                }
                OutputFormat::Text => {
                    println!(
                        "Suggestions for {} ({} candidates):",
                        suggestions.base.codigo, suggestions.total
                    );
                    for entry in &suggestions.data {
                        println!(
                            "  {} — {} (score {}, price diff {:.2})",
                            entry.hit.product.codigo,
                            entry.hit.product.descripcion,
                            entry.score,
                            entry.price_diff_pct
                        );
                    }
                }
            }
            Ok(())
        }

        pub fn product(&self, hit: &ProductHit) -> Result<()> {
            match self.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(hit)?);
                }
                OutputFormat::Markdown => {
                    println!("## `{}`", hit.product.codigo);
                    println!();
                    println!("| Property | Value |");
                    println!("| --- | --- |");
                    println!("| Descripcion | {} |", sanitize(&hit.product.descripcion));
                    println!("| Familia | {} {} |", hit.product.cod_fami, hit.product.nom_fami);
                    println!("| Grupo | {} {} |", hit.product.cod_grupo, hit.product.nom_grupo);
                    println!(
                        "| Subgrupo | {} {} |",
                        hit.product.cod_subgrupo, hit.product.nom_subgrupo
                    );
                    println!("| Marca | {} |", hit.product.nom_marca);
                    println!("| Fabricante | {} |", hit.product.nom_fabricante);
                    println!("| Precio | {} |", hit.product.precio);
                    println!("| Total existencia | {} |", hit.total_exist);
                    println!("| Bodega 01 | {} |", hit.bodega_01);
                    println!("| Bodega 06 | {} |", hit.bodega_06);
                }
                OutputFormat::Table => {
                    let rows = vec![
                        vec!["Codigo".to_string(), hit.product.codigo.clone()],
                        vec!["Descripcion".to_string(), hit.product.descripcion.clone()],
                        vec!["Precio".to_string(), hit.product.precio.clone()],
                        vec!["Total existencia".to_string(), hit.total_exist.to_string()],
                        vec!["Bodega 01".to_string(), hit.bodega_01.to_string()],
                        vec!["Bodega 06".to_string(), hit.bodega_06.to_string()],
                    ];
                    render_table(&["Property", "Value"], &rows);
                }
                OutputFormat::Text => {
                    println!("{} — {}", hit.product.codigo, hit.product.descripcion);
                    println!(
                        "  precio {} | total {} | 01: {} | 06: {}",
                        hit.product.precio, hit.total_exist, hit.bodega_01, hit.bodega_06
                    );
                }
            }
            Ok(())
        }

        pub fn sync_outcome(&self, outcome: &UpsertOutcome) -> Result<()> {
            match self.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(outcome)?);
                }
                OutputFormat::Markdown => {
                    println!("| Property | Value |");
                    println!("| --- | --- |");
                    println!("| Received | {} |", outcome.received);
                    println!("| New | {} |", outcome.upserted);
                    println!("| Replaced | {} |", outcome.replaced);
                    println!("| Errors | {} |", outcome.errors.len());
                    for error in &outcome.errors {
                        println!("| Error at {} | {} |", error.index, error.reason);
                    }
                }
                OutputFormat::Table => {
                    let rows = vec![
                        vec!["Received".to_string(), outcome.received.to_string()],
                        vec!["New".to_string(), outcome.upserted.to_string()],
                        vec!["Replaced".to_string(), outcome.replaced.to_string()],
                        vec!["Errors".to_string(), outcome.errors.len().to_string()],
                    ];
                    render_table(&["Property", "Value"], &rows);
                }
                OutputFormat::Text => {
                    println!(
                        "Received {}: {} new, {} replaced, {} errors",
                        outcome.received,
                        outcome.upserted,
                        outcome.replaced,
                        outcome.errors.len()
                    );
                    for error in &outcome.errors {
                        println!("  item {}: {}", error.index, error.reason);
                    }
                }
            }
            Ok(())
        }
    }

    fn render_table(headers: &[&str], rows: &[Vec<String>]) {
        let mut widths: Vec<usize> = headers.iter().map(|header| header.len()).collect();
        for row in rows {
            for (idx, cell) in row.iter().enumerate() {
                widths[idx] = widths[idx].max(cell.len());
            }
        }

        fn render_line(columns: &[&str], widths: &[usize]) -> String {
            let mut line = String::new();
            for (idx, value) in columns.iter().enumerate() {
                let width = widths[idx];
                let _ = write!(line, "| {:width$} ", value, width = width);
            }
            line.push('|');
            line
        }

        let header_line = render_line(headers, &widths);
        println!("{header_line}");
        let separator: String = widths
            .iter()
            .map(|width| format!("|{:-^1$}", "", width + 2))
            .collect::<Vec<_>>()
            .join("");
        println!("{separator}|");

        for row in rows {
            let cols: Vec<&str> = row.iter().map(String::as_str).collect();
            println!("{}", render_line(&cols, &widths));
        }
    }

    fn sanitize(value: &str) -> String {
        value
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn truncate(value: &str, max: usize) -> String {
        if value.len() <= max {
            value.to_string()
        } else {
            let mut truncated = value
                .chars()
                .take(max.saturating_sub(1))
                .collect::<String>();
            truncated.push('…');
            truncated
        }
    }
}

mod progress {
    use std::time::Duration;

    use indicatif::{ProgressBar, ProgressStyle};

    pub fn spinner(message_enabled: bool, message: impl Into<String>) -> Option<ProgressBar> {
        if !message_enabled {
            return None;
        }
        let progress = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        progress.set_style(style);
        progress.set_message(message.into());
        progress.enable_steady_tick(Duration::from_millis(80));
        Some(progress)
    }
}
