// Smaf Dump Tool
// Copyright (c) 2026 The Project Smaf Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

use std::fs::File;

use smaf_core::errors::Result;
use smaf_core::io::ReadStream;
use smaf_format::{Chunk, Smaf};

use clap::{Arg, ArgAction};
use log::info;

#[derive(Copy, Clone)]
enum OutputMode {
    Describe,
    Json,
    Traverse,
}

fn decode(path: &str) -> Result<Smaf> {
    info!("decoding {}", path);

    let file = File::open(path)?;
    Smaf::read(ReadStream::new(file))
}

fn print_traversal(smaf: &Smaf) {
    smaf.traverse(|chunk: &Chunk| println!("{}", chunk.header()));
}

fn run(path: &str, mode: OutputMode) -> Result<()> {
    let smaf = decode(path)?;

    match mode {
        OutputMode::Describe => println!("{}", smaf),
        OutputMode::Traverse => print_traversal(&smaf),
        OutputMode::Json => match serde_json::to_string_pretty(&smaf) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                eprintln!("Failed to serialize chunk tree: {}", err);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

fn main() {
    pretty_env_logger::init();

    let matches = clap::Command::new("Smaf Dump")
        .version("1.0")
        .about("Print the chunk tree of a SMAF file")
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .conflicts_with("traverse")
                .help("Print the chunk tree as JSON"),
        )
        .arg(
            Arg::new("traverse")
                .long("traverse")
                .short('t')
                .action(ArgAction::SetTrue)
                .help("Print one line per chunk in depth-first order"),
        )
        .arg(Arg::new("INPUT").help("The input file path").required(true).index(1))
        .get_matches();

    let path = match matches.get_one::<String>("INPUT") {
        Some(path) => path,
        None => unreachable!(),
    };

    let mode = if matches.get_flag("json") {
        OutputMode::Json
    }
    else if matches.get_flag("traverse") {
        OutputMode::Traverse
    }
    else {
        OutputMode::Describe
    };

    if let Err(err) = run(path, mode) {
        eprintln!("Error: {}", err);
        std::process::exit(2);
    }
}
