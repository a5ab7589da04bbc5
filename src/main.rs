use anyhow::Context;
use clap::Parser;
use is_terminal::IsTerminal;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use loq::{ErrorStrategy, InputFormat, OutputFormat, PipelineConfig, QueryPipeline};

#[derive(Parser)]
#[command(name = "loq")]
#[command(about = "Rewrite structured log streams with chainable query pipes")]
#[command(version)]
struct Args {
    /// Pipe chain, e.g. 'collapse_nums if (level:error) at _msg | delete tmp'
    #[arg(value_name = "QUERY")]
    query: String,

    /// Input file (default: stdin)
    #[arg(short = 'i', long = "input")]
    input_file: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long = "output")]
    output_file: Option<PathBuf>,

    /// Input record format
    #[arg(long = "input-format", value_enum, default_value = "jsonl")]
    input_format: InputFormat,

    /// Output record format
    #[arg(long = "output-format", value_enum, default_value = "jsonl")]
    output_format: OutputFormat,

    /// Rows per block (unit of parallel processing)
    #[arg(long, default_value = "1024")]
    block_size: usize,

    /// Blocks buffered per parallel round
    #[arg(long, default_value = "16")]
    batch_blocks: usize,

    /// Buffer size for I/O
    #[arg(long, default_value = "65536")]
    buffer_size: usize,

    /// Fail on the first malformed input line instead of skipping it
    #[arg(long)]
    fail_fast: bool,

    /// Print processing statistics to stderr as JSON
    #[arg(long)]
    stats: bool,

    /// Debug mode - report skipped lines and the parsed pipeline
    #[arg(long)]
    debug: bool,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    if args.block_size == 0 || args.batch_blocks == 0 {
        anyhow::bail!("--block-size and --batch-blocks must be positive");
    }
    if args.input_file.is_none() && io::stdin().is_terminal() {
        anyhow::bail!("no input: pass --input FILE or pipe data to stdin");
    }

    let config = PipelineConfig {
        error_strategy: if args.fail_fast {
            ErrorStrategy::FailFast
        } else {
            ErrorStrategy::Skip
        },
        debug: args.debug,
        block_size: args.block_size,
        batch_blocks: args.batch_blocks,
        input_format: args.input_format,
        output_format: args.output_format,
    };

    let mut pipeline = QueryPipeline::from_query(&args.query, config)
        .with_context(|| format!("cannot parse query {:?}", args.query))?;

    if args.debug {
        let rendered: Vec<String> = pipeline.pipes().iter().map(|p| p.to_string()).collect();
        eprintln!("loq: parsed pipeline: {}", rendered.join(" | "));
    }

    let input: Box<dyn BufRead> = if let Some(input_path) = &args.input_file {
        let file = File::open(input_path)
            .with_context(|| format!("failed to open input file '{}'", input_path.display()))?;
        Box::new(BufReader::with_capacity(args.buffer_size, file))
    } else {
        Box::new(BufReader::with_capacity(args.buffer_size, io::stdin()))
    };

    let mut output: Box<dyn Write> = if let Some(output_path) = &args.output_file {
        let file = File::create(output_path)
            .with_context(|| format!("failed to create output file '{}'", output_path.display()))?;
        Box::new(io::BufWriter::with_capacity(args.buffer_size, file))
    } else {
        Box::new(io::BufWriter::with_capacity(args.buffer_size, io::stdout()))
    };

    let stats = pipeline
        .process_stream(input, &mut output)
        .context("processing failed")?;

    output.flush().context("cannot flush output")?;

    if args.stats {
        eprintln!(
            "{}",
            serde_json::to_string(&stats).context("cannot serialize stats")?
        );
    }

    Ok(())
}
