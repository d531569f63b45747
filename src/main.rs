// Copyright (c) 2024 Mudit Bhargava
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//

// main.rs
//
// Command-line entry point: replays a memory-access trace through a
// two-level cache hierarchy and reports the resulting statistics.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use cachesim_rust::hierarchy::CacheHierarchy;
use cachesim_rust::trace::read_trace;

#[derive(Parser)]
#[command(name = "cachesim")]
#[command(about = "A two-level set-associative CPU cache simulator with stride-based prefetching")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a memory-access trace through the L1/L2 hierarchy
    Run {
        /// Trace file (`op address` per line, e.g. `r 0x1000`); reads stdin if omitted
        #[arg(short, long)]
        trace: Option<PathBuf>,

        /// Ignore --trace/stdin and replay a small built-in stride-friendly trace
        #[arg(long)]
        demo: bool,

        /// log2 of L1 total capacity in bytes
        #[arg(long, default_value_t = 12)]
        c1: u32,
        /// log2 of L1 block size in bytes
        #[arg(long, default_value_t = 5)]
        b1: u32,
        /// log2 of L1 associativity
        #[arg(long, default_value_t = 3)]
        s1: u32,
        /// log2 of L2 total capacity in bytes
        #[arg(long, default_value_t = 15)]
        c2: u32,
        /// log2 of L2 block size in bytes
        #[arg(long, default_value_t = 6)]
        b2: u32,
        /// log2 of L2 associativity
        #[arg(long, default_value_t = 5)]
        s2: u32,
        /// Prefetch degree (blocks issued per stride confirmation)
        #[arg(short, long, default_value_t = 2)]
        k: u32,

        /// Emit the statistics record as JSON instead of a human-readable report
        #[arg(long)]
        json: bool,

        /// Log level (error, warn, info, debug, trace)
        #[arg(short, long, default_value = "warn")]
        log_level: String,
    },
}

fn init_logger(level: &str) {
    let filter = level.parse().unwrap_or(log::LevelFilter::Warn);
    env_logger::Builder::new().filter_level(filter).format_timestamp(None).init();
}

fn open_trace(path: Option<&PathBuf>) -> io::Result<Box<dyn BufRead>> {
    match path {
        Some(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// A small built-in stride-friendly trace, used by `--demo` in place of a
/// real trace file: four reads 64 bytes apart (enough to confirm a stride
/// and exercise the prefetcher) followed by a write-then-read pair.
fn demo_trace() -> &'static str {
    "r 0x100000\n\
     r 0x100040\n\
     r 0x100080\n\
     r 0x1000c0\n\
     w 0x2000\n\
     r 0x2000\n"
}

fn run(
    trace: Option<&PathBuf>,
    demo: bool,
    c1: u32,
    b1: u32,
    s1: u32,
    c2: u32,
    b2: u32,
    s2: u32,
    k: u32,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let events = if demo {
        read_trace(io::Cursor::new(demo_trace()))?
    } else {
        read_trace(open_trace(trace)?)?
    };

    let mut hierarchy = CacheHierarchy::setup(c1, b1, s1, c2, b2, s2, k)?;
    for event in &events {
        hierarchy.access(event.op, event.address)?;
    }
    let stats = hierarchy.complete();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}", "cache simulation complete".cyan().bold());
        print!("{}", stats.print_statistics());
        println!("{}", format!("amat = {:.6}", stats.avg_access_time).green());
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { trace, demo, c1, b1, s1, c2, b2, s2, k, json, log_level } => {
            init_logger(&log_level);
            if let Err(err) = run(trace.as_ref(), demo, c1, b1, s1, c2, b2, s2, k, json) {
                eprintln!("{} {}", "error:".red().bold(), err);
                std::process::exit(1);
            }
        },
    }
}
