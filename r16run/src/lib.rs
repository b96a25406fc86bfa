//! Driver for the r16 toolchain.
//!
//! Ties the pipeline together: any mix of source texts, source files or
//! object files is assembled or loaded, linked in the given order and
//! executed. The halted [`Processor`](../r16/struct.Processor.html) is
//! returned so callers can inspect registers and memory.

use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use std::{fmt, fs};

use r16::Processor;
use r16obj::ObjectArtifact;


#[derive(Debug)]
pub enum Error {
    Io(std::io::Error, PathBuf),
    Asm(r16asm::Error, Option<PathBuf>),
    Link(r16ld::Error),
    Vm(r16::Fault),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err, path) => write!(f, "File \"{}\": {}", path.display(), err),
            Error::Asm(err, Some(path)) => write!(f, "{}: {}", path.display(), err),
            Error::Asm(err, None) => write!(f, "{}", err),
            Error::Link(err) => write!(f, "{}", err),
            Error::Vm(fault) => write!(f, "Runtime fault: {}", fault),
        }
    }
}

impl StdError for Error {}

/// Runs an already linked memory image.
pub fn run_image(image: &[u8], memory_size: u32, stack_size: u32) -> Result<Processor, Error> {
    let mut processor = Processor::new(image, memory_size, stack_size).map_err(Error::Vm)?;
    processor.run().map_err(Error::Vm)?;
    Ok(processor)
}

/// Links the objects in the given order, then runs the image.
pub fn run_objects(
    objects: Vec<ObjectArtifact>,
    memory_size: u32,
    stack_size: u32,
) -> Result<Processor, Error> {
    let image = r16ld::link(&objects[..]).map_err(Error::Link)?;
    run_image(&image[..], memory_size, stack_size)
}

/// Assembles each source text, links them in order and runs.
pub fn run_sources(
    sources: &[&str],
    memory_size: u32,
    stack_size: u32,
) -> Result<Processor, Error> {
    let mut objects = Vec::with_capacity(sources.len());
    for source in sources {
        objects.push(r16asm::assemble(source).map_err(|err| Error::Asm(err, None))?);
    }
    run_objects(objects, memory_size, stack_size)
}

/// Reads and assembles each source file, links them in order and runs.
pub fn run_source_files<P: AsRef<Path>>(
    paths: &[P],
    memory_size: u32,
    stack_size: u32,
) -> Result<Processor, Error> {
    let mut objects = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let source =
            fs::read_to_string(path).map_err(|err| Error::Io(err, path.to_owned()))?;
        let object = r16asm::assemble(&source)
            .map_err(|err| Error::Asm(err, Some(path.to_owned())))?;
        objects.push(object);
    }
    run_objects(objects, memory_size, stack_size)
}

/// Reads each object file, links them in order and runs.
pub fn run_object_files<P: AsRef<Path>>(
    paths: &[P],
    memory_size: u32,
    stack_size: u32,
) -> Result<Processor, Error> {
    let mut objects = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        objects.push(r16obj::read_file(path).map_err(|err| Error::Io(err, path.to_owned()))?);
    }
    run_objects(objects, memory_size, stack_size)
}
