#[macro_use]
extern crate clap;

use std::path::PathBuf;

use clap::Arg;

#[derive(Debug)]
enum Error {
    Io(std::io::Error, PathBuf),
    Link(r16ld::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err, path) => write!(f, "File \"{}\": {}", path.display(), err),
            Error::Link(err) => write!(f, "Linking failed: {}", err),
        }
    }
}

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("OBJECTS")
                .help("Sets the object files to link, in link order")
                .required(true)
                .multiple(true),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("OUTPUT")
                .default_value("image.bin")
                .help("Sets the image file to write to"),
        )
        .get_matches();

    let objects: Vec<&str> = matches.values_of("OBJECTS").unwrap().collect();
    let output = matches.value_of("output").unwrap();

    if let Err(err) = run(&objects[..], output) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn run(paths: &[&str], output: &str) -> Result<(), Error> {
    let mut linker = r16ld::Linker::new();
    for path in paths {
        let object =
            r16obj::read_file(path).map_err(|err| Error::Io(err, PathBuf::from(path)))?;
        linker.add_object(object);
    }

    let image = linker.link().map_err(Error::Link)?;

    std::fs::write(output, &image[..])
        .map_err(|err| Error::Io(err, PathBuf::from(output)))?;
    Ok(())
}
