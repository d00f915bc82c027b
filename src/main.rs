use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use travelbook::config::{self, BookConfig};
use travelbook::generate::BookGenerator;
use travelbook::imaging::{HttpFetcher, ImageLoader, LoaderOptions};
use travelbook::pages::GeneratorDeps;
use travelbook::{output, types};

/// Package version, with the commit appended for builds from a checkout.
static VERSION: LazyLock<String> = LazyLock::new(|| match option_env!("TRAVELBOOK_GIT_HASH") {
    Some(hash) => format!("{} ({hash})", env!("CARGO_PKG_VERSION")),
    None => env!("CARGO_PKG_VERSION").to_string(),
});

#[derive(Parser)]
#[command(name = "travelbook")]
#[command(about = "Turn travel records into a printable travel book")]
#[command(long_about = "\
Turn travel records into a printable travel book

Records are a JSON array of travels (or an object with a `travels` array).
Each travel has a name, country, year, cover image, gallery, waypoints and
rich-text sections (HTML or Markdown).

Book layout:

  cover → table of contents → per travel: travel spread, gallery, route map
        → checklists → closing page

Pages are paginated HTML sized for print. With --pdf the book is also
printed through headless Chrome.

Run 'travelbook gen-config' to generate a documented book.toml.")]
#[command(version = VERSION.as_str())]
struct Cli {
    /// Book configuration file
    #[arg(long, default_value = "book.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Travel records (JSON)
    records: PathBuf,

    /// Where to write the book HTML
    #[arg(long, short, default_value = "book.html")]
    output: PathBuf,

    /// Also print the book to this PDF file
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Leave image references as they are instead of loading and embedding them
    #[arg(long)]
    no_images: bool,

    /// Origin for site-relative image paths (e.g. https://example.com)
    #[arg(long)]
    origin: Option<String>,

    /// Chrome/Chromium binary for --pdf (auto-detected when unset)
    #[arg(long)]
    chrome: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Build the book from travel records
    Generate(GenerateArgs),
    /// Validate the configuration and records without building
    Check {
        /// Travel records (JSON)
        records: Option<PathBuf>,
    },
    /// Print a stock book.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Generate(args) => {
            let config = config::load_config(&cli.config)?;
            let records = types::load_records(&args.records)?;

            let mut deps = GeneratorDeps::default();
            if !args.no_images {
                let fetcher = Arc::new(HttpFetcher::new()?);
                let options = LoaderOptions::from_config(&config.loader);
                deps.image_loader = Some(Arc::new(ImageLoader::new(fetcher, options)));
            }
            let mut generator = BookGenerator::new(deps);
            if let Some(origin) = args.origin {
                generator = generator.with_origin(origin);
            }

            println!("==> Generating from {}", args.records.display());
            let book = generator.generate(&records, &config.book).await?;
            std::fs::write(&args.output, &book.html)?;
            output::print_generate_output(&book.summary);
            println!("==> HTML → {}", args.output.display());

            if let Some(pdf) = &args.pdf {
                println!("==> Printing PDF");
                print_pdf(&book.html, &config, pdf, args.chrome).await?;
            }
        }
        Command::Check { records } => {
            println!("==> Checking {}", cli.config.display());
            let config = config::load_config(&cli.config)?;
            let records = match &records {
                Some(path) => types::load_records(path)?,
                None => Vec::new(),
            };
            config.render.normalize()?;
            output::print_check_output(&config, &records);
            println!("==> Configuration is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

#[cfg(feature = "chrome")]
async fn print_pdf(
    html: &str,
    config: &BookConfig,
    path: &Path,
    chrome: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    use travelbook::render::chrome::ChromeLoader;
    use travelbook::render::{LazyRenderer, PdfRenderer, RenderInput};

    let renderer = LazyRenderer::new(ChromeLoader::new(chrome));
    let blob = renderer
        .render(&RenderInput::Html(html.to_string()), &config.render)
        .await?;
    std::fs::write(path, &blob.bytes)?;
    output::print_pdf_output(path, blob.len());
    Ok(())
}

#[cfg(not(feature = "chrome"))]
async fn print_pdf(
    _html: &str,
    _config: &BookConfig,
    _path: &Path,
    _chrome: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    Err("travelbook was built without the `chrome` feature; --pdf is unavailable".into())
}
