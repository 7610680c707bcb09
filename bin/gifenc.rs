#![forbid(unsafe_code)]
use std::io::{Read, Write};
use std::path::PathBuf;
use std::{env, ffi, fs, io, process};

use rastergif::{BitOrder, EncodeOptions, Encoder, PixelBuffer, PixelFormat, Rgb};

fn main() -> CodingResult {
    CodingResult::catch_panic(|| {
        let flags = Flags::from_args(env::args_os()).unwrap_or_else(|ParamError| explain());
        run_coding(flags)
    })
}

fn run_coding(flags: Flags) -> Result<(), io::Error> {
    if flags.verbose {
        simple_logger::init_with_level(log::Level::Debug)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    }

    let data = match &flags.input {
        Input::File(file) => fs::read(file)?,
        Input::Stdin => {
            let mut data = vec![];
            io::stdin().lock().read_to_end(&mut data)?;
            data
        }
    };

    let colormap = match &flags.colormap {
        Some(file) => read_colormap(file)?,
        None if flags.depth == 1 => vec![[0, 0, 0], [255, 255, 255]],
        None => (0..=255u8).map(|i| [i, i, i]).collect(),
    };

    let format = PixelFormat::from_depth(flags.depth, &colormap, flags.bit_order)?;
    let mut pixels = PixelBuffer::new(&data, flags.width, flags.height, format);
    if let Some(stride) = flags.stride {
        pixels = pixels.with_stride(stride);
    }

    let options = EncodeOptions::new()
        .with_transparent(flags.transparent)
        .with_interlace(flags.interlace);
    let bytes = Encoder::with_options(options).encode_to_vec(&pixels)?;

    match &flags.output {
        Output::Stdout => {
            let out = io::stdout();
            let mut out = out.lock();
            out.write_all(&bytes)?;
            out.flush()
        }
        Output::File(path) => {
            let written = fs::File::create(path).and_then(|mut file| {
                file.write_all(&bytes)?;
                file.sync_all()
            });
            if written.is_err() {
                // Do not leave a truncated image behind.
                let _ = fs::remove_file(path);
            }
            written
        }
    }
}

/// A colormap file holds consecutive red, green, blue bytes.
fn read_colormap(file: &PathBuf) -> Result<Vec<Rgb>, io::Error> {
    let raw = fs::read(file)?;
    if raw.len() % 3 != 0 || raw.len() > 256 * 3 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "colormap must hold at most 256 RGB triples",
        ));
    }
    Ok(raw.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
}

struct Flags {
    input: Input,
    output: Output,
    width: usize,
    height: usize,
    depth: u8,
    stride: Option<usize>,
    bit_order: BitOrder,
    colormap: Option<PathBuf>,
    transparent: Option<u8>,
    interlace: bool,
    verbose: bool,
}

struct ParamError;

#[derive(Debug)]
enum Input {
    File(PathBuf),
    Stdin,
}

#[derive(Debug)]
enum Output {
    File(PathBuf),
    Stdout,
}

fn explain<T>() -> T {
    println!(
        "Usage: gifenc --width <w> --height <h> [--depth <bits>] <file>\n\
        Arguments:\n\
        -d\t bits per pixel: 1, 8 (default), 16, 24 or 32\n\
        -c\t colormap file of RGB triples for depth 1 and 8\n\
        -o\t output file, stdout by default\n\
        <file>\tfilepath or '-' for stdin"
    );
    process::exit(1);
}

impl Default for Flags {
    fn default() -> Flags {
        Flags {
            input: Input::Stdin,
            output: Output::Stdout,
            width: 0,
            height: 0,
            depth: 8,
            stride: None,
            bit_order: BitOrder::Msb,
            colormap: None,
            transparent: None,
            interlace: false,
            verbose: false,
        }
    }
}

fn command() -> clap::Command<'static> {
    clap::Command::new("gifenc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Encode raw pixel captures as GIF")
        .arg(
            clap::Arg::new("width")
                .short('W')
                .long("width")
                .takes_value(true)
                .required(true)
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            clap::Arg::new("height")
                .short('H')
                .long("height")
                .takes_value(true)
                .required(true)
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            clap::Arg::new("depth")
                .short('d')
                .long("depth")
                .takes_value(true)
                .value_parser(clap::value_parser!(u8)),
        )
        .arg(
            clap::Arg::new("stride")
                .short('s')
                .long("stride")
                .takes_value(true)
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            clap::Arg::new("bit_order")
                .short('b')
                .long("bit-order")
                .takes_value(true)
                .value_parser(["l", "m", "least", "most"]),
        )
        .arg(
            clap::Arg::new("colormap")
                .short('c')
                .long("colormap")
                .takes_value(true)
                .value_parser(clap::builder::ValueParser::path_buf()),
        )
        .arg(
            clap::Arg::new("transparent")
                .short('t')
                .long("transparent")
                .takes_value(true)
                .value_parser(clap::value_parser!(u8)),
        )
        .arg(
            clap::Arg::new("interlace")
                .short('i')
                .long("interlace")
                .takes_value(false),
        )
        .arg(
            clap::Arg::new("verbose")
                .short('v')
                .long("verbose")
                .takes_value(false),
        )
        .arg(
            clap::Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .value_parser(clap::builder::ValueParser::path_buf()),
        )
        .arg(
            clap::Arg::new("file")
                .default_value("-")
                .value_parser(clap::builder::ValueParser::path_buf()),
        )
}

impl Flags {
    fn from_args(mut args: impl Iterator<Item = ffi::OsString>) -> Result<Self, ParamError> {
        let mut flags = Flags::default();
        let matches = command().get_matches_from(args.by_ref());

        flags.width = *matches.get_one::<usize>("width").ok_or(ParamError)?;
        flags.height = *matches.get_one::<usize>("height").ok_or(ParamError)?;

        if let Some(&depth) = matches.get_one::<u8>("depth") {
            flags.depth = depth;
        }

        flags.stride = matches.get_one::<usize>("stride").copied();
        flags.transparent = matches.get_one::<u8>("transparent").copied();
        flags.colormap = matches.get_one::<PathBuf>("colormap").cloned();
        flags.interlace = matches.contains_id("interlace");
        flags.verbose = matches.contains_id("verbose");

        match matches.get_one::<String>("bit_order").map(String::as_str) {
            Some("m") => flags.bit_order = BitOrder::Msb,
            Some("l") => flags.bit_order = BitOrder::Lsb,
            Some("most") => flags.bit_order = BitOrder::Msb,
            Some("least") => flags.bit_order = BitOrder::Lsb,
            Some(_) => unreachable!("unparsed bit order"),
            _ => {}
        }

        match matches.get_one::<PathBuf>("file") {
            None => flags.input = Input::Stdin,
            Some(p) if *p == PathBuf::from("-") => flags.input = Input::Stdin,
            Some(p) => flags.input = Input::File(p.clone()),
        }

        if let Some(p) = matches.get_one::<PathBuf>("output") {
            flags.output = Output::File(p.clone());
        }

        Ok(flags)
    }
}

enum CodingResult {
    Ok,
    Err(io::Error),
    Panic,
}

impl CodingResult {
    fn catch_panic(op: fn() -> Result<(), io::Error>) -> Self {
        std::panic::catch_unwind(|| match op() {
            Ok(()) => CodingResult::Ok,
            Err(err) => CodingResult::Err(err),
        })
        .unwrap_or(CodingResult::Panic)
    }
}

impl std::process::Termination for CodingResult {
    fn report(self) -> std::process::ExitCode {
        match self {
            CodingResult::Ok => std::process::ExitCode::SUCCESS,
            CodingResult::Err(err) => {
                eprintln!("{}", err);
                std::process::ExitCode::FAILURE
            }
            CodingResult::Panic => {
                eprintln!(
                    "The process failed irrecoverably! This should never happen and is a bug."
                );
                std::process::ExitCode::from(128)
            }
        }
    }
}
