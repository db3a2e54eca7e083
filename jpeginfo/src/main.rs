// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use jpeg_coeffs::decode::{DecodeOptions, DecodedJpeg, Decoder};

#[derive(Parser)]
#[command(about = "Prints the tables and DCT coefficients of a baseline JPEG file")]
struct Opt {
    /// Input JPEG file
    input: PathBuf,

    /// Prints every decoded structure
    #[clap(short, long)]
    verbose: bool,

    /// Prints the first N coefficient blocks of each scan
    #[clap(long, value_name = "N")]
    dump_blocks: Option<usize>,

    /// Skips APP segments instead of failing on them
    #[clap(long)]
    skip_app_segments: bool,

    /// Stops after this many scans
    #[clap(long)]
    max_scans: Option<usize>,
}

fn load(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).wrap_err_with(|| format!("Cannot read {}", path.display()))
}

fn print_summary(decoded: &DecodedJpeg) {
    match &decoded.frame {
        Some(frame) => {
            println!(
                "{}x{}, {}-bit, {} components",
                frame.width,
                frame.height,
                frame.precision,
                frame.components.len()
            );
            for c in &frame.components {
                println!(
                    "  component {}: sampling {}x{}, quantization table {}",
                    c.id, c.h_sampling, c.v_sampling, c.quant_table
                );
            }
        }
        None => println!("no frame header"),
    }
    for (id, table) in decoded.quant_tables.iter() {
        println!(
            "quantization table {id}: {dim}x{dim}, {precision:?}",
            dim = table.dim(),
            precision = table.precision
        );
    }
    for (id, class, table) in decoded.huffman_tables.iter() {
        println!(
            "Huffman table {id} {class:?}: {} symbols",
            table.values().len()
        );
    }
    if !decoded.comment.is_empty() {
        println!("comment: {:?}", decoded.comment);
    }
    for segment in &decoded.app_segments {
        println!("APP{}: {} bytes", segment.index, segment.data.len());
    }
    for (i, scan) in decoded.scans.iter().enumerate() {
        let ids: Vec<u8> = scan.header.components.iter().map(|c| c.id).collect();
        println!(
            "scan {i}: components {ids:?}, {} MCUs, {} blocks",
            scan.num_mcus,
            scan.blocks.len()
        );
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    #[cfg(feature = "tracing-subscriber")]
    {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(EnvFilter::from_default_env())
            .init();
    }

    let opt = Opt::parse();
    let data = load(&opt.input)?;
    let options = DecodeOptions {
        skip_application_segments: opt.skip_app_segments,
        max_scans: opt.max_scans,
    };
    let mut decoder = Decoder::new(&data, options);
    let decoded = decoder.decode().wrap_err_with(|| {
        let marker = decoder
            .current_marker()
            .map_or_else(|| "no marker".to_string(), |m| m.to_string());
        format!(
            "Decoding stopped at byte offset {} in {marker}",
            decoder.position()
        )
    })?;

    if opt.verbose {
        println!("{decoded:#?}");
    } else {
        print_summary(&decoded);
    }

    if let Some(count) = opt.dump_blocks {
        for (i, scan) in decoded.scans.iter().enumerate() {
            for (j, block) in scan.blocks.iter().take(count).enumerate() {
                println!("scan {i} block {j} (component {}):", block.component_id);
                for row in block.matrix.rows() {
                    let row: Vec<String> = row.iter().map(|v| format!("{v:5}")).collect();
                    println!("{}", row.join(""));
                }
            }
        }
    }
    Ok(())
}
