use std::fs;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use wasmkit::error::{ErrorSink, PrintingErrors};
use wasmkit::features::{Feature, Features};
use wasmkit::module::Module;
use wasmkit::parser::Section;
use wasmkit::visitor::{ModuleVisitor, VisitResult};
use wasmkit::{parser, text, valid, visitor};

#[derive(Parser)]
#[command(name = "wasmkit")]
#[command(about = "WebAssembly module toolkit")]
struct Cli {
    /// Enable only the listed features (repeatable). All features are
    /// enabled when omitted.
    #[arg(long = "enable", value_name = "FEATURE", global = true)]
    enable: Vec<Feature>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print module information
    Dump {
        /// Paths to WebAssembly modules
        files: Vec<String>,

        /// Show only section headers (names, offsets, sizes)
        #[arg(long)]
        header: bool,
    },

    /// Check that modules decode and validate
    Validate {
        /// Paths to WebAssembly modules
        files: Vec<String>,
    },

    /// Convert binary modules to the text format
    Wasm2wat {
        /// Paths to WebAssembly modules
        files: Vec<String>,

        /// Write output here instead of stdout (single input only)
        #[arg(short = 'o', long = "output")]
        output: Option<String>,

        /// Print integer literals in hexadecimal
        #[arg(long)]
        hex: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let features = if cli.enable.is_empty() {
        Features::all()
    } else {
        let mut features = Features::mvp();
        for feature in cli.enable {
            features.enable(feature);
        }
        features
    };

    match cli.command {
        Commands::Dump { files, header } => run_on_files(&files, |file, bytes| {
            dump_module(file, bytes, header, &features)
        }),
        Commands::Validate { files } => {
            run_on_files(&files, |file, bytes| validate_module(file, bytes, &features))
        }
        Commands::Wasm2wat { files, output, hex } => {
            if output.is_some() && files.len() > 1 {
                eprintln!("error: --output requires a single input file");
                return ExitCode::FAILURE;
            }
            let base = if hex { text::Base::Hex } else { text::Base::Decimal };
            run_on_files(&files, |file, bytes| {
                wasm2wat(file, bytes, output.as_deref(), base, &features)
            })
        }
    }
}

/// Run one step per input file; any failure turns into a nonzero exit.
fn run_on_files(files: &[String], mut step: impl FnMut(&str, &[u8]) -> bool) -> ExitCode {
    if files.is_empty() {
        eprintln!("error: no input files");
        return ExitCode::FAILURE;
    }
    let mut ok = true;
    for file in files {
        let bytes = match fs::read(file) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("{file}: error reading file: {e}");
                ok = false;
                continue;
            }
        };
        if !step(file, &bytes) {
            ok = false;
        }
    }
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Collects section headers during a lazy one-pass walk.
#[derive(Default)]
struct HeaderDump {
    lines: Vec<String>,
    counts: Vec<(usize, u32)>,
}

impl ModuleVisitor for HeaderDump {
    fn begin_section(&mut self, section: &Section<'_>) -> VisitResult {
        self.lines.push(format!(
            "{:>9} {} count: ",
            section.id.name(),
            section.range
        ));
        self.counts.push((self.lines.len() - 1, 0));
        Ok(())
    }

    fn on_type(&mut self, _: u32, _: &wasmkit::types::At<wasmkit::types::FunctionType>) -> VisitResult {
        self.bump();
        Ok(())
    }

    fn on_import(&mut self, _: u32, _: &wasmkit::types::At<wasmkit::module::Import>) -> VisitResult {
        self.bump();
        Ok(())
    }

    fn on_function(&mut self, _: u32, _: &wasmkit::types::At<u32>) -> VisitResult {
        self.bump();
        Ok(())
    }

    fn on_table(&mut self, _: u32, _: &wasmkit::types::At<wasmkit::types::TableType>) -> VisitResult {
        self.bump();
        Ok(())
    }

    fn on_memory(&mut self, _: u32, _: &wasmkit::types::At<wasmkit::types::MemoryType>) -> VisitResult {
        self.bump();
        Ok(())
    }

    fn on_event(&mut self, _: u32, _: &wasmkit::types::At<wasmkit::types::EventType>) -> VisitResult {
        self.bump();
        Ok(())
    }

    fn on_global(&mut self, _: u32, _: &wasmkit::types::At<wasmkit::module::Global>) -> VisitResult {
        self.bump();
        Ok(())
    }

    fn on_export(&mut self, _: u32, _: &wasmkit::types::At<wasmkit::module::Export>) -> VisitResult {
        self.bump();
        Ok(())
    }

    fn on_element(&mut self, _: u32, _: &wasmkit::types::At<wasmkit::module::ElementSegment>) -> VisitResult {
        self.bump();
        Ok(())
    }

    fn on_code(&mut self, _: u32, _: &wasmkit::types::At<wasmkit::module::FunctionBody>) -> VisitResult {
        self.bump();
        Ok(())
    }

    fn on_data(&mut self, _: u32, _: &wasmkit::types::At<wasmkit::module::DataSegment>) -> VisitResult {
        self.bump();
        Ok(())
    }
}

impl HeaderDump {
    fn bump(&mut self) {
        if let Some((_, count)) = self.counts.last_mut() {
            *count += 1;
        }
    }

    fn print(&self) {
        for (i, line) in self.lines.iter().enumerate() {
            let count = self
                .counts
                .iter()
                .find(|(line_idx, _)| *line_idx == i)
                .map(|(_, c)| *c)
                .unwrap_or(0);
            println!("{line}{count}");
        }
    }
}

fn dump_module(file: &str, bytes: &[u8], header: bool, features: &Features) -> bool {
    println!("{file}:");
    if header {
        let mut errors = PrintingErrors::new();
        let mut dump = HeaderDump::default();
        let ok = visitor::visit(bytes, features, &mut dump, &mut errors);
        dump.print();
        return ok;
    }
    match parser::parse(bytes, features) {
        Ok(module) => {
            print!("{}", module.details());
            true
        }
        Err(e) => {
            eprintln!("{e}");
            false
        }
    }
}

fn validate_module(file: &str, bytes: &[u8], features: &Features) -> bool {
    let module: Module = match parser::parse(bytes, features) {
        Ok(module) => module,
        Err(e) => {
            eprintln!("{file}: {e}");
            return false;
        }
    };
    let mut errors = PrintingErrors::new();
    errors.push_context(file.to_string());
    let ok = valid::validate(&module, features, &mut errors);
    errors.pop_context();
    ok
}

fn wasm2wat(
    file: &str,
    bytes: &[u8],
    output: Option<&str>,
    base: text::Base,
    features: &Features,
) -> bool {
    let module = match parser::parse(bytes, features) {
        Ok(module) => module,
        Err(e) => {
            eprintln!("{file}: {e}");
            return false;
        }
    };
    let wat = text::write_module_with_base(&module, base);
    match output {
        Some(path) => match fs::write(path, wat) {
            Ok(()) => true,
            Err(e) => {
                eprintln!("{path}: error writing file: {e}");
                false
            }
        },
        None => {
            print!("{wat}");
            true
        }
    }
}
