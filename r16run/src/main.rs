#[macro_use]
extern crate clap;

use clap::{Arg, ArgGroup};
use r16::constants;

fn main() {
    let default_memory = constants::DEFAULT_MEMORY_SIZE.to_string();
    let default_stack = constants::DEFAULT_STACK_SIZE.to_string();

    let matches = app_from_crate!()
        .arg(
            Arg::with_name("OBJECTS")
                .help("Sets the object files to link and run")
                .multiple(true)
                .index(1),
        )
        .arg(
            Arg::with_name("assembly")
                .short("a")
                .long("assembly")
                .takes_value(true)
                .multiple(true)
                .value_name("ASSEMBLY")
                .help("Sets the assembly files to assemble, link and run"),
        )
        .arg(
            Arg::with_name("memory")
                .short("m")
                .long("memory")
                .takes_value(true)
                .value_name("MEMORY")
                .default_value(&default_memory)
                .help("Sets the size of the memory in bytes"),
        )
        .arg(
            Arg::with_name("stack")
                .short("s")
                .long("stack")
                .takes_value(true)
                .value_name("STACK")
                .default_value(&default_stack)
                .help("Sets the size of the stack in bytes"),
        )
        .arg(
            Arg::with_name("registers")
                .short("r")
                .long("registers")
                .help("Prints the register values after the run"),
        )
        .group(
            ArgGroup::with_name("input")
                .args(&["OBJECTS", "assembly"])
                .required(true),
        )
        .get_matches();

    let memory_size = value_t!(matches.value_of("memory"), u32).unwrap_or_else(|e| e.exit());
    let stack_size = value_t!(matches.value_of("stack"), u32).unwrap_or_else(|e| e.exit());

    let result = match matches.values_of("OBJECTS") {
        Some(objects) => {
            let paths: Vec<&str> = objects.collect();
            r16run::run_object_files(&paths[..], memory_size, stack_size)
        }
        None => {
            let paths: Vec<&str> = matches.values_of("assembly").unwrap().collect();
            r16run::run_source_files(&paths[..], memory_size, stack_size)
        }
    };

    match result {
        Ok(processor) => {
            if matches.is_present("registers") {
                print_registers(&processor);
            }
            println!("Program finished successfully.");
        }
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    }
}

fn print_registers(processor: &r16::Processor) {
    println!("Register values after execution:");
    for index in 0..constants::REGISTER_COUNT {
        println!("R{} = {}", index, processor.register(index));
    }
}
