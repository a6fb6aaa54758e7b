use anyhow::Result;
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::SystemTime;
use tracing::debug;

use snapsweep_core::{
    Asset, AssetFilter, BatchSizeEstimator, DeletionList, EstimatorConfig, FileStore, FilterConfig,
    FsPhotoLibrary, LibraryConfig, PhotoFeed, PhotoSweeper, SizeLookup, StatisticsLedger,
    SweepConfig, format_bytes,
};

/// 扫描命令的参数配置
#[derive(Debug)]
struct ScanCommandArgs {
    path: PathBuf,
    page_size: usize,
    pages: Option<usize>,
    older_days: Option<u32>,
    larger_than: Option<String>,
    sort_by_size: bool,
    max_depth: Option<usize>,
    include_hidden: bool,
    follow_symlinks: bool,
}

/// 清理命令的参数配置
#[derive(Debug)]
struct SweepCommandArgs {
    path: PathBuf,
    older_days: Option<u32>,
    larger_than: Option<String>,
    max_depth: Option<usize>,
    include_hidden: bool,
    follow_symlinks: bool,
    all: bool,
    dry_run: bool,
    yes: bool,
    budget_ms: u64,
    store_dir: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "snapsweep")]
#[command(about = "Swipe through your photos and reclaim disk space")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Override the statistics store directory
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List photos in a directory, newest first
    Scan {
        /// Directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Photos per page
        #[arg(short, long, default_value = "50")]
        page_size: usize,

        /// Number of pages to list (all if omitted)
        #[arg(short = 'n', long)]
        pages: Option<usize>,

        /// Only photos older than N days
        #[arg(short = 'o', long)]
        older_days: Option<u32>,

        /// Only photos at least this large (e.g. 500KB, 2MB)
        #[arg(short = 'l', long)]
        larger_than: Option<String>,

        /// Sort by size (largest first)
        #[arg(short = 'S', long)]
        sort_by_size: bool,

        /// Maximum directory depth to scan
        #[arg(short, long)]
        max_depth: Option<usize>,

        /// Don't ignore hidden files/directories
        #[arg(long)]
        include_hidden: bool,

        /// Follow symlinks
        #[arg(long)]
        follow_symlinks: bool,
    },
    /// Review photos one by one, then delete the marked batch
    Sweep {
        /// Directory to review
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Only photos older than N days
        #[arg(short = 'o', long)]
        older_days: Option<u32>,

        /// Only photos at least this large (e.g. 500KB, 2MB)
        #[arg(short = 'l', long)]
        larger_than: Option<String>,

        /// Maximum directory depth to scan
        #[arg(short, long)]
        max_depth: Option<usize>,

        /// Don't ignore hidden files/directories
        #[arg(long)]
        include_hidden: bool,

        /// Follow symlinks
        #[arg(long)]
        follow_symlinks: bool,

        /// Mark every photo without prompting
        #[arg(short, long)]
        all: bool,

        /// Dry run - show what would be deleted without deleting
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,

        /// Time budget for size estimation (milliseconds)
        #[arg(long, default_value = "5000")]
        budget_ms: u64,
    },
    /// Show lifetime deletion statistics
    Stats {
        /// Clear all recorded sessions
        #[arg(long)]
        clear: bool,
    },
}

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // 设置日志级别
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "snapsweep_core={log_level},snapsweep_cli={log_level}"
        ))
        .init();

    let store_dir = cli.store_dir;

    match cli.command {
        Commands::Scan {
            path,
            page_size,
            pages,
            older_days,
            larger_than,
            sort_by_size,
            max_depth,
            include_hidden,
            follow_symlinks,
        } => handle_scan_command(ScanCommandArgs {
            path,
            page_size,
            pages,
            older_days,
            larger_than,
            sort_by_size,
            max_depth,
            include_hidden,
            follow_symlinks,
        }),
        Commands::Sweep {
            path,
            older_days,
            larger_than,
            max_depth,
            include_hidden,
            follow_symlinks,
            all,
            dry_run,
            yes,
            budget_ms,
        } => handle_sweep_command(SweepCommandArgs {
            path,
            older_days,
            larger_than,
            max_depth,
            include_hidden,
            follow_symlinks,
            all,
            dry_run,
            yes,
            budget_ms,
            store_dir,
        }),
        Commands::Stats { clear } => handle_stats_command(clear, store_dir),
    }
}

fn handle_scan_command(args: ScanCommandArgs) -> Result<()> {
    let config = create_library_config(args.max_depth, args.include_hidden, args.follow_symlinks);
    let library = FsPhotoLibrary::open(&args.path, &config)?;

    let mut feed = PhotoFeed::new(args.page_size);
    match args.pages {
        Some(pages) => {
            for i in 0..pages {
                feed.load(&library, i > 0)?;
                if !feed.has_more() {
                    break;
                }
            }
        }
        None => {
            feed.load_all(&library)?;
        }
    }

    let filter = create_filter(args.older_days, args.larger_than.as_deref())?;
    let mut assets = filter.filter_assets(feed.assets().to_vec(), &library);

    if args.sort_by_size {
        let estimator = BatchSizeEstimator::default();
        assets.sort_by_key(|a| std::cmp::Reverse(asset_size(a, &library, &estimator)));
    }

    display_assets(&assets, &library, &args.path);
    Ok(())
}

fn handle_sweep_command(args: SweepCommandArgs) -> Result<()> {
    let config = create_library_config(args.max_depth, args.include_hidden, args.follow_symlinks);
    let mut library = FsPhotoLibrary::open(&args.path, &config)?;

    let mut feed = PhotoFeed::new(50);
    feed.load_all(&library)?;
    debug!("加载了 {} 张照片待审阅", feed.len());

    let filter = create_filter(args.older_days, args.larger_than.as_deref())?;
    let candidates = filter.filter_assets(feed.assets().to_vec(), &library);

    if candidates.is_empty() {
        println!("No photos found to review.");
        return Ok(());
    }

    // 逐张审阅或一次性全部标记
    let marklist = if args.all {
        let mut list = DeletionList::new();
        for asset in candidates {
            list.mark(asset);
        }
        list
    } else {
        review_assets(&candidates, &library)?
    };

    if marklist.is_empty() {
        println!("Nothing marked for deletion.");
        return Ok(());
    }

    let estimator_config = EstimatorConfig {
        budget_ms: args.budget_ms,
        ..Default::default()
    };

    // 显示将要删除的批次
    let estimator = BatchSizeEstimator::new(estimator_config.clone());
    let estimate = estimator.estimate_batch(marklist.assets(), &library);
    println!(
        "\n{} photos marked for deletion ({}{}).",
        marklist.len(),
        format_bytes(estimate.total_bytes),
        if estimate.timed_out { ", estimated" } else { "" }
    );

    // 确认删除
    if !args.yes && !args.dry_run && !confirm_sweep(marklist.len(), estimate.total_bytes)? {
        println!("Sweep cancelled.");
        return Ok(());
    }

    let mut ledger = open_ledger(args.store_dir)?;
    let sweeper = PhotoSweeper::new(SweepConfig {
        dry_run: args.dry_run,
        estimator: estimator_config,
    });

    let result = sweeper.sweep(&mut library, marklist.assets(), &mut ledger)?;
    display_sweep_result(&result, &ledger);

    Ok(())
}

fn handle_stats_command(clear: bool, store_dir: Option<PathBuf>) -> Result<()> {
    let mut ledger = open_ledger(store_dir)?;

    if clear {
        ledger.clear_history();
        println!("Statistics cleared.");
        return Ok(());
    }

    if ledger.sessions().is_empty() {
        println!("No deletion sessions recorded yet.");
        return Ok(());
    }

    println!(
        "Lifetime: {} photos deleted, {} freed\n",
        ledger.total_photos_deleted(),
        format_bytes(ledger.total_space_freed())
    );

    println!("{:<25} {:<10} {:<15}", "Date", "Photos", "Space freed");
    println!("{}", "-".repeat(50));
    for session in ledger.sessions() {
        println!(
            "{:<25} {:<10} {:<15}",
            session.date.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            session.photos_deleted,
            format_bytes(session.space_freed)
        );
    }

    Ok(())
}

fn create_library_config(
    max_depth: Option<usize>,
    include_hidden: bool,
    follow_symlinks: bool,
) -> LibraryConfig {
    LibraryConfig {
        max_depth: max_depth.or(LibraryConfig::default().max_depth),
        follow_links: follow_symlinks,
        ignore_hidden: !include_hidden,
    }
}

fn create_filter(older_days: Option<u32>, larger_than: Option<&str>) -> Result<AssetFilter> {
    let larger_than = larger_than
        .map(AssetFilter::parse_size_string)
        .transpose()?;

    Ok(AssetFilter::new(FilterConfig {
        older_than_days: older_days,
        larger_than,
    }))
}

fn open_ledger(store_dir: Option<PathBuf>) -> Result<StatisticsLedger> {
    let store = match store_dir {
        Some(dir) => FileStore::open(dir)?,
        None => FileStore::open_default()?,
    };
    Ok(StatisticsLedger::load(store))
}

/// 单张照片的显示大小：权威大小优先，查不到时用几何估计
fn asset_size<L>(asset: &Asset, lookup: &L, estimator: &BatchSizeEstimator) -> u64
where
    L: SizeLookup + ?Sized,
{
    match lookup.size_of(asset) {
        Ok(Some(bytes)) => bytes,
        _ => estimator.geometric_estimate(asset),
    }
}

fn format_date(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format("%Y-%m-%d").to_string()
}

fn display_assets(assets: &[Asset], library: &FsPhotoLibrary, base_path: &std::path::Path) {
    if assets.is_empty() {
        println!("No photos found.");
        return;
    }

    let estimator = BatchSizeEstimator::default();

    println!("\nFound {} photos:", assets.len());
    println!(
        "{:<32} {:<12} {:<12} {:<20}",
        "Photo", "Size", "Date", "Path"
    );
    println!("{}", "-".repeat(76));

    for asset in assets {
        println!(
            "{:<32} {:<12} {:<12} {:<20}",
            asset.file_name(),
            format_bytes(asset_size(asset, library, &estimator)),
            format_date(asset.created),
            asset.relative_path(base_path).display()
        );
    }

    let total = estimator.estimate_batch(assets, library);
    println!("{}", "-".repeat(76));
    println!("Total size: {}", format_bytes(total.total_bytes));
}

/// 逐张审阅照片并构建删除列表
fn review_assets(candidates: &[Asset], library: &FsPhotoLibrary) -> Result<DeletionList> {
    let estimator = BatchSizeEstimator::default();
    let mut marklist = DeletionList::new();

    println!(
        "Reviewing {} photos. [d]elete / [k]eep / [u]ndo last / [q]uit review\n",
        candidates.len()
    );

    for (index, asset) in candidates.iter().enumerate() {
        let size = asset_size(asset, library, &estimator);
        loop {
            print!(
                "[{}/{}] {} ({}, {}): ",
                index + 1,
                candidates.len(),
                asset.file_name(),
                format_bytes(size),
                format_date(asset.created)
            );
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            match input.trim().to_lowercase().as_str() {
                "d" | "delete" => {
                    marklist.mark(asset.clone());
                    break;
                }
                // 回车默认保留
                "k" | "keep" | "" => break,
                "u" | "undo" => {
                    // 取消最近一次标记
                    if let Some(last) = marklist.assets().last().map(|a| a.id.clone()) {
                        marklist.unmark(&last);
                        println!("Unmarked last photo.");
                    } else {
                        println!("Nothing to undo.");
                    }
                }
                "q" | "quit" => return Ok(marklist),
                _ => println!("Please answer d, k, u or q."),
            }
        }
    }

    Ok(marklist)
}

fn confirm_sweep(count: usize, bytes: u64) -> Result<bool> {
    print!(
        "\nThis will delete {} photos and free up {}. Continue? [y/N]: ",
        count,
        format_bytes(bytes)
    );

    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().to_lowercase() == "y" || input.trim().to_lowercase() == "yes")
}

fn display_sweep_result(result: &snapsweep_core::SweepResult, ledger: &StatisticsLedger) {
    if result.dry_run {
        println!("\nDry run - nothing was deleted.");
        println!("Would delete {} photos", result.photos_deleted);
        println!("Would free {}", result.format_size());
        return;
    }

    println!("\nSweep completed!");
    println!("Photos deleted: {}", result.photos_deleted);
    println!("Space freed: {}", result.format_size());
    println!(
        "Lifetime: {} photos, {} freed",
        ledger.total_photos_deleted(),
        format_bytes(ledger.total_space_freed())
    );
}
