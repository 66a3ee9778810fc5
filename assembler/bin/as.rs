extern crate mos6502_assembler;

use std::fs;
use std::path::Path;
use std::process;

use clap::{App, Arg, ArgMatches};
use log::{error, info};

use mos6502_assembler::instructions::InstructionTable;
use mos6502_assembler::parse::parse;
use mos6502_assembler::{layer, Assembler, LeniencyLevel};

fn main() {
    env_logger::init();

    let matches = App::new("assemble_6502")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Assembles MOS 6502 source into machine code.")
        .arg(Arg::with_name("INPUT")
            .help("The assembly source file")
            .required(true)
            .index(1))
        .arg(Arg::with_name("listing")
            .short("l")
            .long("listing")
            .help("Prints an address listing instead of a hex string"))
        .arg(Arg::with_name("output")
            .short("o")
            .long("output")
            .value_name("FILE")
            .takes_value(true)
            .help("Writes the assembled image as raw bytes to FILE"))
        .arg(Arg::with_name("strict")
            .long("strict")
            .help("Rejects labels that are defined more than once"))
        .arg(Arg::with_name("no-color")
            .long("no-color")
            .help("Prints diagnostics without color"))
        .get_matches();

    if run(&matches).is_err() {
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<(), ()> {
    let input = matches.value_of("INPUT").ok_or(())?;
    let color = !matches.is_present("no-color");
    let leniency = if matches.is_present("strict") { LeniencyLevel::Strict } else { LeniencyLevel::Lenient };

    let source = fs::read_to_string(Path::new(input))
        .map_err(|e| error!("could not read {}: {}", input, e))?;

    let root = parse(&source).map_err(|errors| {
        for error in errors {
            eprintln!("{}", error.render(Some(input), color));
        }
    })?;

    let instructions = InstructionTable::mos6502();
    let assembled = Assembler::new(&instructions, leniency)
        .assemble(&root)
        .map_err(|error| eprintln!("{}", error.render(Some(input), color)))?;

    match matches.value_of("output") {
        Some(output) => {
            let segments = layer::segments(&assembled);
            let image = layer::image(&segments).unwrap_or(layer::Segment { origin: 0, bytes: Vec::new() });
            fs::write(output, &image.bytes)
                .map_err(|e| error!("could not write {}: {}", output, e))?;
            info!("wrote {} bytes starting at ${:04X} to {}", image.bytes.len(), image.origin, output);
        }
        None if matches.is_present("listing") => println!("{}", layer::listing(&assembled)),
        None => println!("{}", layer::to_hex_string(&assembled)),
    }
    Ok(())
}
