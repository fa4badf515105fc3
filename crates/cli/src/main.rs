mod manifest;

use clap::Parser;
use dispatch_codegen::{DispatchTable, Generation, lower_fragment};
use log::{error, info};
use manifest::{Manifest, ManifestError, TableInput};
use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
    process::ExitCode,
};

#[derive(Parser)]
#[command(name = "dispatch-gen")]
#[command(about = "Packed dispatch table generator for the EVM", long_about = None)]
#[command(version)]
struct Cli {
    /// Table manifest (use '-' or omit for stdin)
    input: Option<PathBuf>,

    /// Skip the documentation blocks
    #[arg(long)]
    no_docs: bool,

    /// Print the assembly size of every fragment
    #[arg(long)]
    sizes: bool,
}

fn read_input(input: Option<PathBuf>) -> io::Result<String> {
    match input {
        Some(path) if path.to_str() != Some("-") => fs::read_to_string(path),
        _ => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn generate(manifest: &Manifest) -> Result<Generation, ManifestError> {
    let mut generation = Generation::new();
    for spec in &manifest.tables {
        let config = spec.config();
        let bound = match spec.input()? {
            TableInput::Functions(entries) => generation.bind_functions(config, &entries),
            TableInput::Values(values) => generation.bind_values(config, &values),
        };
        // A failing table is reported and skipped, the others are still generated.
        if let Err(err) = bound {
            error!("table `{}`: {err}", spec.name);
        }
    }
    Ok(generation)
}

fn print_table(table: &DispatchTable, cli: &Cli) {
    if !cli.no_docs {
        print!("{}", table.doc_comment());
    }
    for wrapper in &table.wrappers {
        match &wrapper.storage {
            Some(storage) => {
                println!("// wrapper {} -> {}({storage})", wrapper.label, wrapper.target)
            }
            None => println!("// wrapper {} -> {}", wrapper.label, wrapper.target),
        }
    }
    for fragment in table.position.iter().chain(table.ops.iter()) {
        println!("{fragment}");
        if cli.sizes {
            println!("// {} assembly item(s)", lower_fragment(fragment).asm.len());
        }
    }
    println!();
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let source = match read_input(cli.input.clone()) {
        Ok(source) => source,
        Err(err) => {
            error!("failed to read manifest: {err}");
            return ExitCode::FAILURE;
        }
    };
    let generation = match Manifest::parse(&source).and_then(|manifest| generate(&manifest)) {
        Ok(generation) => generation,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    for table in generation.tables() {
        print_table(table, &cli);
    }
    for (name, value) in generation.constants().iter() {
        println!("const {name} = {value:#x}");
    }
    info!("generated {} table(s)", generation.tables().len());
    ExitCode::SUCCESS
}
