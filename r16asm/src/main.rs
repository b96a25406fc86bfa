#[macro_use]
extern crate clap;

use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::Arg;

#[derive(Debug)]
enum IoErrorContext {
    ReadInput,
    WriteOutput,
}

#[derive(Debug)]
enum Error {
    Asm(r16asm::Error),
    Io(std::io::Error, IoErrorContext, PathBuf),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err, context, path) => writeln!(
                f,
                "{} file \"{}\" failed: {}",
                match context {
                    IoErrorContext::ReadInput => "Reading input",
                    IoErrorContext::WriteOutput => "Writing output",
                },
                path.display(),
                err
            ),
            Error::Asm(err) => {
                writeln!(f, "Assembling input failed:")?;
                write!(f, "{}", err)
            }
        }
    }
}

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("Sets the input file to use")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("OUTPUT")
                .help("Sets the object file to write to"),
        )
        .get_matches();

    let input = matches.value_of("INPUT").unwrap();
    let output = matches.value_of("output");

    if let Err(err) = run(input, output) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn run(input: &str, output: Option<&str>) -> Result<(), Error> {
    let input_path = Path::new(input);

    let input_file = File::open(input_path)
        .map_err(|err| Error::Io(err, IoErrorContext::ReadInput, input_path.to_owned()))?;
    let mut reader = BufReader::new(input_file);
    let mut source = String::new();

    reader
        .read_to_string(&mut source)
        .map_err(|err| Error::Io(err, IoErrorContext::ReadInput, input_path.to_owned()))?;

    let object = r16asm::assemble(&source).map_err(Error::Asm)?;

    let output_path: PathBuf = output
        .map(PathBuf::from)
        .unwrap_or_else(|| input_path.with_extension("obj"));

    r16obj::write_file(&output_path, &object)
        .map_err(|err| Error::Io(err, IoErrorContext::WriteOutput, output_path))?;

    Ok(())
}
