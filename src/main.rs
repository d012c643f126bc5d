use clap::{Parser, Subcommand};
use inkpress::{config, output, pipeline};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "inkpress")]
#[command(about = "Static blog builder with scheduled publishing")]
#[command(long_about = "\
Static blog builder with scheduled publishing

Markdown files with YAML frontmatter become directory-style HTML pages,
index.md files become paginated lists of the articles below them, and
numbered .emb.md files are released once their timestamp passes.

Content structure:

  content/
  ├── index.md                 # List of every article on the site
  ├── about.md                 # Article → about/index.htm
  └── posts/
      ├── index.md             # List → posts/index.htm, posts/2/index.htm, …
      ├── hello.md             # Article, built once `published` has passed
      ├── next.1.emb.md        # Replaces next.md once `modified` has passed
      └── next.2.emb.md        # Later revision of the same article

Run 'inkpress gen-config' to generate a documented inkpress.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Output directory (overrides output_path)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Release due scheduled files and build the site
    Build {
        /// Content directory (overrides source_path)
        source_path: Option<PathBuf>,
    },
    /// Validate config, templates and content without writing anything
    Check {
        /// Content directory (overrides source_path)
        source_path: Option<PathBuf>,
    },
    /// Print a stock inkpress.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Build { source_path } => {
            let site_config = config::load_config(&cli.config)?;
            let mut settings = site_config.resolve(source_path.as_deref())?;
            if let Some(output) = cli.output {
                settings.output = output;
            }
            init_thread_pool(&site_config.processing);

            println!(
                "==> Building {} → {}",
                settings.source.display(),
                settings.output.display()
            );
            let report = pipeline::build(&settings, chrono::Utc::now())?;
            output::print_build_report(&report, &settings.output);
        }
        Command::Check { source_path } => {
            let site_config = config::load_config(&cli.config)?;
            let settings = site_config.resolve(source_path.as_deref())?;
            let now = chrono::Utc::now();
            println!("==> Checking {}", settings.source.display());
            let report = pipeline::check(&settings, now)?;
            output::print_check_report(&report, now);
            println!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
