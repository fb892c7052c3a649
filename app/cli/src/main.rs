use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use lanekit::{
    BitCombine, ElementWidth, KernelConfig, KernelStats, SimdConfig, SimdDispatcher,
};
use log::{debug, info, warn};
use std::fs;
use std::io::{self, Read, Write};
use std::time::Instant;

/// Lanekit: tiered SIMD kernels for flat arrays
#[derive(Parser)]
#[command(name = "lanekit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Disable SIMD acceleration and use scalar kernels
    #[arg(long, global = true)]
    no_simd: bool,

    /// Disable the AVX2 tier but keep narrower SIMD tiers enabled
    #[arg(long, global = true)]
    no_avx2: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Element type for typed operations
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ElementType {
    /// Unsigned 8-bit bytes
    U8,
    /// Signed 8-bit integers
    I8,
    /// Unsigned 32-bit little-endian integers
    U32,
    /// Signed 32-bit little-endian integers
    I32,
    /// Unsigned 64-bit little-endian integers
    U64,
    /// 64-bit little-endian IEEE floats
    F64,
}

impl ElementType {
    fn as_str(&self) -> &'static str {
        match self {
            ElementType::U8 => "u8",
            ElementType::I8 => "i8",
            ElementType::U32 => "u32",
            ElementType::I32 => "i32",
            ElementType::U64 => "u64",
            ElementType::F64 => "f64",
        }
    }

    fn size(&self) -> usize {
        match self {
            ElementType::U8 | ElementType::I8 => 1,
            ElementType::U32 | ElementType::I32 => 4,
            ElementType::U64 | ElementType::F64 => 8,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Display detected CPU features and the selected SIMD level
    Info {
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Report min, max, set bits, and sortedness of the input in one pass
    Stats {
        /// Input file (use '-' for stdin)
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        input: String,

        /// How to interpret the input bytes
        #[arg(short = 't', long, value_enum, default_value = "u8")]
        r#type: ElementType,

        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Report the minimum and maximum element of the input
    Minmax {
        /// Input file (use '-' for stdin)
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        input: String,

        /// How to interpret the input bytes
        #[arg(short = 't', long, value_enum, default_value = "u8")]
        r#type: ElementType,

        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Count set bits after combining each byte with an operand
    Popcount {
        /// Input file (use '-' for stdin)
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        input: String,

        /// Bitwise combine applied before counting
        #[arg(short, long, default_value = "identity")]
        combine: String,

        /// Operand byte broadcast across the input (decimal or 0x-prefixed hex)
        #[arg(short = 'p', long, default_value = "0")]
        operand: String,

        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether the input is sorted in non-decreasing order
    Sorted {
        /// Input file (use '-' for stdin)
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        input: String,

        /// How to interpret the input bytes
        #[arg(short = 't', long, value_enum, default_value = "u8")]
        r#type: ElementType,
    },

    /// Compare two files for bitwise equality
    Equal {
        /// First input file
        #[arg(value_name = "FILE_A")]
        file_a: String,

        /// Second input file
        #[arg(value_name = "FILE_B")]
        file_b: String,
    },

    /// Reverse the input in place as fixed-width elements
    Reverse {
        /// Input file (use '-' for stdin)
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        input: String,

        /// Output file (use '-' for stdout)
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        output: String,

        /// Element width in bytes (1, 2, 3, 4, 5, 6, 8, or 16)
        #[arg(short, long, default_value = "1")]
        width: usize,
    },

    /// Sort the input bytes in ascending order
    Sort {
        /// Input file (use '-' for stdin)
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        input: String,

        /// Output file (use '-' for stdout)
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        output: String,

        /// Treat bytes as signed i8 values
        #[arg(short, long)]
        signed: bool,

        /// Element count below which insertion sort is used
        #[arg(long, value_name = "N")]
        threshold: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let dispatcher = build_dispatcher(cli.no_simd, cli.no_avx2, &cli.command);
    debug!("Selected SIMD level: {}", dispatcher.level());

    match cli.command {
        Commands::Info { json } => info_command(&dispatcher, json),
        Commands::Stats {
            input,
            r#type,
            json,
        } => stats_command(&dispatcher, &input, r#type, json, cli.quiet),
        Commands::Minmax {
            input,
            r#type,
            json,
        } => minmax_command(&dispatcher, &input, r#type, json, cli.quiet),
        Commands::Popcount {
            input,
            combine,
            operand,
            json,
        } => popcount_command(&dispatcher, &input, &combine, &operand, json, cli.quiet),
        Commands::Sorted { input, r#type } => {
            sorted_command(&dispatcher, &input, r#type, cli.quiet)
        }
        Commands::Equal { file_a, file_b } => {
            equal_command(&dispatcher, &file_a, &file_b, cli.quiet)
        }
        Commands::Reverse {
            input,
            output,
            width,
        } => reverse_command(&dispatcher, &input, &output, width, cli.quiet),
        Commands::Sort {
            input,
            output,
            signed,
            ..
        } => sort_command(&dispatcher, &input, &output, signed, cli.quiet),
    }
}

/// Set up logging based on verbosity flags
fn setup_logging(verbose: bool, quiet: bool) {
    let log_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    debug!("Logging initialized at {} level", log_level);
}

/// Build the dispatcher from the global and per-command flags
fn build_dispatcher(no_simd: bool, no_avx2: bool, command: &Commands) -> SimdDispatcher {
    let mut config = KernelConfig::default();
    if no_simd {
        config = config.with_simd_config(SimdConfig::disabled());
    } else if no_avx2 {
        config = config.with_simd_config(SimdConfig::new().with_avx2(false));
    }
    if let Commands::Sort {
        threshold: Some(threshold),
        ..
    } = command
    {
        config = config.with_insertion_sort_threshold(*threshold);
    }
    SimdDispatcher::with_config(config)
}

/// Read input from file or stdin
fn read_input(input: &str) -> Result<Vec<u8>> {
    if input == "-" {
        let mut buffer = Vec::new();
        io::stdin()
            .read_to_end(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else {
        fs::read(input).with_context(|| format!("Failed to read input file: {}", input))
    }
}

/// Write output to file or stdout
fn write_output(output: &str, content: &[u8]) -> Result<()> {
    if output == "-" {
        io::stdout()
            .write_all(content)
            .context("Failed to write to stdout")?;
        io::stdout().flush().context("Failed to flush stdout")?;
    } else {
        fs::write(output, content)
            .with_context(|| format!("Failed to write output file: {}", output))?;
    }
    Ok(())
}

/// Decode the input bytes as little-endian elements of the requested type
fn decode_elements<T, const N: usize>(
    data: &[u8],
    type_name: &str,
    from_le: fn([u8; N]) -> T,
) -> Result<Vec<T>> {
    if data.len() % N != 0 {
        anyhow::bail!(
            "Input length {} is not a multiple of the {} element size {}",
            data.len(),
            type_name,
            N
        );
    }
    Ok(data
        .chunks_exact(N)
        .map(|chunk| {
            let mut bytes = [0u8; N];
            bytes.copy_from_slice(chunk);
            from_le(bytes)
        })
        .collect())
}

/// Execute the info command
fn info_command(dispatcher: &SimdDispatcher, json: bool) -> Result<()> {
    let features = dispatcher.features();

    if json {
        let value = serde_json::json!({
            "level": dispatcher.level().to_string(),
            "accelerated": dispatcher.is_accelerated(),
            "features": {
                "avx2": features.avx2,
                "sse42": features.sse42,
                "neon": features.neon,
            },
            "insertion_sort_threshold": dispatcher.config().insertion_sort_threshold,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("=== Lanekit SIMD Information ===\n");
    println!("Selected level: {}", dispatcher.level());
    println!("Accelerated: {}", dispatcher.is_accelerated());
    println!("\n--- CPU Features ---");
    println!("  AVX2:   {}", if features.avx2 { "yes" } else { "no" });
    println!("  SSE4.2: {}", if features.sse42 { "yes" } else { "no" });
    println!("  NEON:   {}", if features.neon { "yes" } else { "no" });
    println!("\n--- Configuration ---");
    println!(
        "  Insertion sort threshold: {} elements",
        dispatcher.config().insertion_sort_threshold
    );
    Ok(())
}

/// Execute the stats command
fn stats_command(
    dispatcher: &SimdDispatcher,
    input: &str,
    element_type: ElementType,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let start_time = Instant::now();
    let data = read_input(input)?;
    debug!("Read {} bytes from input", data.len());

    let stats = KernelStats::new();
    let progress = create_progress_bar(quiet, "Scanning");

    // Sortedness is only defined for the types the kernels support;
    // the remaining types report it as unavailable.
    let (min_repr, max_repr, sorted) = match element_type {
        ElementType::U8 => (
            dispatcher.min_u8(&data).map(|v| v.to_string()),
            dispatcher.max_u8(&data).map(|v| v.to_string()),
            Some(dispatcher.is_sorted_u8(&data)),
        ),
        ElementType::I8 => {
            let values = decode_elements(&data, "i8", i8::from_le_bytes)?;
            (
                dispatcher.min_i8(&values).map(|v| v.to_string()),
                dispatcher.max_i8(&values).map(|v| v.to_string()),
                None,
            )
        }
        ElementType::U32 => {
            let values = decode_elements(&data, "u32", u32::from_le_bytes)?;
            (
                dispatcher.min_u32(&values).map(|v| v.to_string()),
                dispatcher.max_u32(&values).map(|v| v.to_string()),
                Some(dispatcher.is_sorted_u32(&values)),
            )
        }
        ElementType::I32 => {
            let values = decode_elements(&data, "i32", i32::from_le_bytes)?;
            (
                dispatcher.min_i32(&values).map(|v| v.to_string()),
                dispatcher.max_i32(&values).map(|v| v.to_string()),
                Some(dispatcher.is_sorted_i32(&values)),
            )
        }
        ElementType::U64 => {
            let values = decode_elements(&data, "u64", u64::from_le_bytes)?;
            (
                dispatcher.min_u64(&values).map(|v| v.to_string()),
                dispatcher.max_u64(&values).map(|v| v.to_string()),
                None,
            )
        }
        ElementType::F64 => {
            let values = decode_elements(&data, "f64", f64::from_le_bytes)?;
            (
                dispatcher.min_f64(&values).map(|v| v.to_string()),
                dispatcher.max_f64(&values).map(|v| v.to_string()),
                Some(dispatcher.is_sorted_f64(&values)),
            )
        }
    };
    let set_bits = dispatcher.count_bits(&data, BitCombine::Identity, 0);
    stats.record_reduction(3 * data.len() as u64);
    progress.finish_and_clear();

    let duration = start_time.elapsed();
    let elements = data.len() / element_type.size();

    if json {
        let value = serde_json::json!({
            "type": element_type.as_str(),
            "bytes": data.len(),
            "elements": elements,
            "min": min_repr,
            "max": max_repr,
            "set_bits": set_bits,
            "sorted": sorted,
            "level": dispatcher.level().to_string(),
            "stats": stats.snapshot(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("type:     {}", element_type.as_str());
    println!("elements: {}", elements);
    println!("min:      {}", min_repr.as_deref().unwrap_or("n/a"));
    println!("max:      {}", max_repr.as_deref().unwrap_or("n/a"));
    println!("set bits: {}", set_bits);
    match sorted {
        Some(true) => println!("sorted:   yes"),
        Some(false) => println!("sorted:   no"),
        None => println!("sorted:   n/a"),
    }

    if !quiet {
        print_summary(dispatcher, &stats, elements, duration);
    }
    Ok(())
}

/// Execute the minmax command
fn minmax_command(
    dispatcher: &SimdDispatcher,
    input: &str,
    element_type: ElementType,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let start_time = Instant::now();
    let data = read_input(input)?;
    debug!("Read {} bytes from input", data.len());

    let stats = KernelStats::new();
    let progress = create_progress_bar(quiet, "Reducing");

    // Two reductions per invocation, one for each extreme.
    let (min_repr, max_repr) = match element_type {
        ElementType::U8 => {
            stats.record_reduction(2 * data.len() as u64);
            (
                dispatcher.min_u8(&data).map(|v| v.to_string()),
                dispatcher.max_u8(&data).map(|v| v.to_string()),
            )
        }
        ElementType::I8 => {
            let values = decode_elements(&data, "i8", i8::from_le_bytes)?;
            stats.record_reduction(2 * data.len() as u64);
            (
                dispatcher.min_i8(&values).map(|v| v.to_string()),
                dispatcher.max_i8(&values).map(|v| v.to_string()),
            )
        }
        ElementType::U32 => {
            let values = decode_elements(&data, "u32", u32::from_le_bytes)?;
            stats.record_reduction(2 * data.len() as u64);
            (
                dispatcher.min_u32(&values).map(|v| v.to_string()),
                dispatcher.max_u32(&values).map(|v| v.to_string()),
            )
        }
        ElementType::I32 => {
            let values = decode_elements(&data, "i32", i32::from_le_bytes)?;
            stats.record_reduction(2 * data.len() as u64);
            (
                dispatcher.min_i32(&values).map(|v| v.to_string()),
                dispatcher.max_i32(&values).map(|v| v.to_string()),
            )
        }
        ElementType::U64 => {
            let values = decode_elements(&data, "u64", u64::from_le_bytes)?;
            stats.record_reduction(2 * data.len() as u64);
            (
                dispatcher.min_u64(&values).map(|v| v.to_string()),
                dispatcher.max_u64(&values).map(|v| v.to_string()),
            )
        }
        ElementType::F64 => {
            let values = decode_elements(&data, "f64", f64::from_le_bytes)?;
            stats.record_reduction(2 * data.len() as u64);
            (
                dispatcher.min_f64(&values).map(|v| v.to_string()),
                dispatcher.max_f64(&values).map(|v| v.to_string()),
            )
        }
    };
    progress.finish_and_clear();

    if data.is_empty() {
        warn!("Input is empty");
    }

    let duration = start_time.elapsed();
    let elements = data.len() / element_type.size();

    if json {
        let value = serde_json::json!({
            "type": element_type.as_str(),
            "elements": elements,
            "min": min_repr,
            "max": max_repr,
            "level": dispatcher.level().to_string(),
            "stats": stats.snapshot(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match (min_repr, max_repr) {
        (Some(min), Some(max)) => {
            println!("min: {}", min);
            println!("max: {}", max);
        }
        _ => println!("empty input"),
    }

    if !quiet {
        print_summary(dispatcher, &stats, elements, duration);
    }
    Ok(())
}

/// Execute the popcount command
fn popcount_command(
    dispatcher: &SimdDispatcher,
    input: &str,
    combine: &str,
    operand: &str,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let start_time = Instant::now();

    let combine: BitCombine = combine
        .parse()
        .with_context(|| format!("Unknown combine operation: {}", combine))?;
    let operand = parse_operand(operand)?;

    let data = read_input(input)?;
    debug!("Read {} bytes from input", data.len());

    let stats = KernelStats::new();
    let progress = create_progress_bar(quiet, "Counting bits");
    let count = dispatcher.count_bits(&data, combine, operand);
    stats.record_reduction(data.len() as u64);
    progress.finish_and_clear();

    let duration = start_time.elapsed();

    if json {
        let value = serde_json::json!({
            "combine": combine.to_string(),
            "operand": operand,
            "bytes": data.len(),
            "total_bits": 8 * data.len() as u64,
            "set_bits": count,
            "level": dispatcher.level().to_string(),
            "stats": stats.snapshot(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", count);

    if !quiet {
        print_summary(dispatcher, &stats, data.len(), duration);
    }
    Ok(())
}

/// Execute the sorted command
fn sorted_command(
    dispatcher: &SimdDispatcher,
    input: &str,
    element_type: ElementType,
    quiet: bool,
) -> Result<()> {
    let data = read_input(input)?;
    debug!("Read {} bytes from input", data.len());

    let sorted = match element_type {
        ElementType::U8 => dispatcher.is_sorted_u8(&data),
        ElementType::U32 => {
            let values = decode_elements(&data, "u32", u32::from_le_bytes)?;
            dispatcher.is_sorted_u32(&values)
        }
        ElementType::I32 => {
            let values = decode_elements(&data, "i32", i32::from_le_bytes)?;
            dispatcher.is_sorted_i32(&values)
        }
        ElementType::F64 => {
            let values = decode_elements(&data, "f64", f64::from_le_bytes)?;
            dispatcher.is_sorted_f64(&values)
        }
        ElementType::I8 | ElementType::U64 => {
            anyhow::bail!(
                "Sortedness checking does not support the {} type",
                element_type.as_str()
            );
        }
    };

    if !quiet {
        println!("{}", if sorted { "sorted" } else { "not sorted" });
    }

    // Shell-friendly: exit 0 when sorted, 1 otherwise.
    if sorted {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

/// Execute the equal command
fn equal_command(
    dispatcher: &SimdDispatcher,
    file_a: &str,
    file_b: &str,
    quiet: bool,
) -> Result<()> {
    let a = read_input(file_a)?;
    let b = read_input(file_b)?;

    // Unequal lengths are simply unequal content at the CLI boundary.
    let equal = a.len() == b.len() && dispatcher.bits_equal(&a, &b);

    if !quiet {
        println!("{}", if equal { "equal" } else { "not equal" });
    }

    if equal {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

/// Execute the reverse command
fn reverse_command(
    dispatcher: &SimdDispatcher,
    input: &str,
    output: &str,
    width: usize,
    quiet: bool,
) -> Result<()> {
    let start_time = Instant::now();

    let width = ElementWidth::try_from(width).context("Unsupported element width")?;

    let mut data = read_input(input)?;
    debug!("Read {} bytes from input", data.len());

    let stats = KernelStats::new();
    let progress = create_progress_bar(quiet, "Reversing");
    dispatcher.reverse_elements(&mut data, width)?;
    stats.record_reversal(data.len() as u64);
    progress.finish_and_clear();

    write_output(output, &data)?;

    if !quiet && output != "-" {
        print_summary(
            dispatcher,
            &stats,
            data.len() / width.bytes(),
            start_time.elapsed(),
        );
    }
    Ok(())
}

/// Execute the sort command
fn sort_command(
    dispatcher: &SimdDispatcher,
    input: &str,
    output: &str,
    signed: bool,
    quiet: bool,
) -> Result<()> {
    let start_time = Instant::now();

    let mut data = read_input(input)?;
    debug!("Read {} bytes from input", data.len());

    let stats = KernelStats::new();
    let progress = create_progress_bar(quiet, "Sorting");
    if signed {
        // Reinterpret in place; i8 and u8 have identical layout.
        let values = unsafe {
            std::slice::from_raw_parts_mut(data.as_mut_ptr() as *mut i8, data.len())
        };
        dispatcher.sort_i8(values);
    } else {
        dispatcher.sort_u8(&mut data);
    }
    stats.record_sort(data.len() as u64);
    progress.finish_and_clear();

    write_output(output, &data)?;

    if !quiet && output != "-" {
        print_summary(dispatcher, &stats, data.len(), start_time.elapsed());
    }
    Ok(())
}

/// Parse an operand byte in decimal or 0x-prefixed hex
fn parse_operand(operand: &str) -> Result<u8> {
    let parsed = if let Some(hex) = operand.strip_prefix("0x") {
        u8::from_str_radix(hex, 16)
    } else {
        operand.parse()
    };
    parsed.with_context(|| format!("Invalid operand byte: {}", operand))
}

/// Print a per-invocation summary to stderr
fn print_summary(
    dispatcher: &SimdDispatcher,
    stats: &KernelStats,
    elements: usize,
    duration: std::time::Duration,
) {
    let snapshot = stats.snapshot();
    let throughput = if duration.as_secs_f64() > 0.0 {
        (snapshot.bytes_scanned as f64 / 1_048_576.0) / duration.as_secs_f64()
    } else {
        0.0
    };
    eprintln!("  Level:       {}", dispatcher.level());
    eprintln!("  Elements:    {}", elements);
    eprintln!("  Scanned:     {}", format_bytes(snapshot.bytes_scanned as usize));
    eprintln!("  Time:        {:.3}s", duration.as_secs_f64());
    eprintln!("  Throughput:  {:.2} MB/s", throughput);

    info!(
        "Completed {} kernel call(s) in {:.3}s",
        snapshot.total_calls(),
        duration.as_secs_f64()
    );
}

/// Create a progress bar (spinner) for operations
fn create_progress_bar(quiet: bool, message: &str) -> ProgressBar {
    if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Format bytes in human-readable format
fn format_bytes(bytes: usize) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}
