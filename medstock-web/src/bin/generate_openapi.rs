//! Generate the OpenAPI specification file
//!
//! Writes the pretty-printed JSON document served at `/api-docs/openapi.json`.

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use medstock_web::openapi::get_openapi_json;

#[derive(Parser)]
#[command(name = "generate-openapi")]
struct Args {
    /// Output file
    #[arg(short, long, default_value = "medstock-web/docs/openapi.json")]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(dir) = args.output.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }

    fs::write(&args.output, get_openapi_json()?)?;
    println!("Generated: {}", args.output.display());

    Ok(())
}
