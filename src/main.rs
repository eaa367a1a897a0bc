use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vitrine::config;
use vitrine::gallery::{self, fetch_manifest};
use vitrine::i18n::{LanguageContext, page_key, switcher_links};
use vitrine::includes::{FOOTER_PLACEHOLDER, HEADER_PLACEHOLDER, audit_fragments};
use vitrine::output;
use vitrine::page::PageSession;
use vitrine::render::{PreviewPage, render_preview};
use vitrine::source::DirSource;
use vitrine::storage::{MemoryCookieJar, MemoryStore};
use vitrine::surface::MemorySurface;
use vitrine::types::Locale;

fn version_string() -> &'static str {
    let on_tag = env!("VITRINE_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("VITRINE_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "vitrine")]
#[command(about = "Inspect and preview a multilingual portfolio site")]
#[command(long_about = "\
Inspect and preview a multilingual portfolio site

The site directory is what the web server serves. Galleries read a single
JSON manifest; the shared header and footer come from per-locale fragments.

Site structure:

  site/
  ├── config.toml                  # Vitrine config (optional)
  ├── data.json                    # Content manifest, keyed by category
  ├── includes/
  │   ├── cabecalho.html           # pt header (rodape.html is the footer)
  │   ├── header.html              # en header (footer.html)
  │   └── cabecera.html            # es header (pie-de-pagina.html)
  ├── pt/fotos-horizontais.html    # Pages live under their locale directory
  ├── en/photos-horizontal.html
  └── es/fotos-horizontales.html

Manifest categories: fotografias, videos, designs, apresentacoes.
Titles come from the entry's `titles` map, else from the file name
(Praia_Beach_Playa.jpg → pt \"Praia\", en \"Beach\", es \"Playa\").

Run 'vitrine gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    site: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate the manifest, fragments and config without rendering
    Check {
        /// Language used for titles
        #[arg(long)]
        locale: Option<Locale>,
    },
    /// Render a page's gallery, as a visitor would see it, to a static HTML file
    Preview {
        /// Page path, e.g. /en/designs.html
        page: String,
        /// Batches to reveal, counting the first
        #[arg(long, default_value_t = 1)]
        batches: usize,
        /// Open the lightbox on this tile index
        #[arg(long)]
        open: Option<usize>,
        /// Simulate a visitor who accepted all cookies
        #[arg(long)]
        accept_all: bool,
        /// Output file
        #[arg(long, default_value = "preview.html")]
        out: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Check { locale } => {
            let site_config = config::load_config(&cli.site)?;
            println!("==> Checking {}", cli.site.display());
            let source = DirSource::new(&cli.site);
            let manifest = fetch_manifest(&source, &site_config.manifest_path)?;
            let audit = audit_fragments(&cli.site, &site_config.includes);
            let lang = LanguageContext::new(
                locale.unwrap_or(site_config.i18n.default_locale),
                &site_config.i18n,
            );
            let has_config_file = cli.site.join("config.toml").exists();
            output::print_check_output(&manifest, &audit, &lang, has_config_file);
            if audit.missing().next().is_some() {
                println!("==> Site has missing fragments");
            } else {
                println!("==> Site is valid");
            }
        }
        Command::Preview {
            page,
            batches,
            open,
            accept_all,
            out,
        } => {
            let site_config = config::load_config(&cli.site)?;
            let target = gallery::gallery_for_page(page_key(&page))
                .ok_or_else(|| format!("'{page}' has no gallery"))?;
            let containers = [HEADER_PLACEHOLDER, target.container, FOOTER_PLACEHOLDER];
            let surface = MemorySurface::with_containers(&containers);
            let mut store = MemoryStore::new();
            let mut session = PageSession::new(
                site_config,
                &page,
                &mut store,
                surface,
                MemoryCookieJar::new(),
            );

            session.boot(&DirSource::new(&cli.site));
            if accept_all {
                session.accept_all();
            }
            session.reveal_batches(batches.saturating_sub(1));
            if let Some(index) = open {
                session.activate_tile(target.container, index);
            }

            let status = session
                .gallery
                .status(target.container)
                .ok_or("gallery did not load")?;
            let locale = session.lang.current();
            let switcher = switcher_links(&page, locale);
            let title = session.lang.translate(target.category.label_key());
            let html = render_preview(&PreviewPage {
                title: &title,
                locale,
                switcher: &switcher,
                surface: &session.surface,
                containers: &containers,
                status: Some(format!("{} / {}", status.shown, status.total)),
            });
            std::fs::write(&out, html.into_string())?;
            output::print_preview_output(&status, &out.display().to_string());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
