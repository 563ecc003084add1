use clap::{Parser, Subcommand};
use responsive_images::optimize::{self, Confirmation};
use responsive_images::{config, output, variants};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "responsive-images")]
#[command(about = "Responsive WebP/JPEG variants and safe in-place optimization")]
#[command(long_about = "\
Responsive WebP/JPEG variants and safe in-place optimization

Input is a flat directory of .jpg, .jpeg and .png images.

  site/
  ├── images/                  # --source
  │   ├── config.toml          # Optional, see gen-config
  │   ├── David.jpg
  │   └── responsive/          # variants: David-480.webp, David-480.jpg, ...
  ├── images_optimized/        # optimize: staged copies
  └── images_backup/           # optimize: verbatim originals

Variants are never wider than their source and existing files are never
rewritten, so re-running is always safe. Originals are only replaced by
'apply', after every one of them has been backed up.

Run 'responsive-images gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Directory of source images
    #[arg(long, default_value = "images", global = true)]
    source: PathBuf,

    /// Config file (default: config.toml in the source directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate responsive WebP + JPEG variants for every image
    Variants {
        /// Variants directory (overrides config)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Back up originals, then write optimized copies to a staging directory
    Optimize,
    /// Replace originals with their optimized copies
    Apply {
        /// Replace without asking for confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let tool_config = match &cli.config {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config(&cli.source)?,
    };

    match cli.command {
        Command::Variants { output } => {
            let output_dir = output.unwrap_or_else(|| tool_config.variants_dir(&cli.source));
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_variant_event(&event);
                }
            });
            let result = variants::run(
                &cli.source,
                &output_dir,
                &tool_config.variant_config(),
                Some(tx),
            );
            printer.join().ok();
            let result = result?;
            println!();
            println!("{}", result.stats);
            println!(
                "Manifest: {}",
                output_dir.join(variants::MANIFEST_FILENAME).display()
            );
        }
        Command::Optimize => {
            let optimized_dir = tool_config.optimized_dir(&cli.source);
            let backup_dir = tool_config.backup_dir(&cli.source);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_optimize_event(&event);
                }
            });
            let totals = optimize::optimize(
                &cli.source,
                &optimized_dir,
                &backup_dir,
                &tool_config.optimize_config(),
                Some(tx),
            );
            printer.join().ok();
            let totals = totals?;
            println!();
            println!("{}", totals);
            println!(
                "Review {}, then run 'responsive-images apply' to replace the originals.",
                optimized_dir.display()
            );
        }
        Command::Apply { yes } => {
            let optimized_dir = tool_config.optimized_dir(&cli.source);
            let backup_dir = tool_config.backup_dir(&cli.source);
            let plan = optimize::plan_apply(&optimized_dir, &cli.source, &backup_dir, &|p: &Path| {
                p.exists()
            })?;
            output::print_apply_plan(&plan);

            let confirmation = if yes {
                Confirmation::Confirmed
            } else {
                ask_confirmation()?
            };
            if confirmation == Confirmation::Declined {
                println!("Nothing changed.");
                return Ok(());
            }

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_apply_event(&event);
                }
            });
            let report = optimize::apply(
                &optimized_dir,
                &cli.source,
                &backup_dir,
                confirmation,
                Some(tx),
            );
            printer.join().ok();
            let report = report?;
            println!();
            println!("{}", report);
            println!("Originals are kept in {}", backup_dir.display());
        }
        Command::GenConfig => unreachable!("handled before config loading"),
    }

    Ok(())
}

/// Ask on stdin; anything but `y`/`yes` declines.
fn ask_confirmation() -> io::Result<Confirmation> {
    print!("Replace the originals? [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Confirmation::Confirmed,
        _ => Confirmation::Declined,
    })
}
