use crate::classifier::DEFAULT_CACHE_CAPACITY;
use crate::generator::{SwaggerGenerator, DEFAULT_URL_PREFIX};
use crate::manifest::Manifest;
use crate::openapi_builder::Info;
use crate::parser::AstParser;
use crate::scanner::FileScanner;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use crate::type_resolver::TypeResolver;
use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Generate an OpenAPI document from a route manifest and the Rust types it names
#[derive(Parser, Debug)]
#[command(name = "openapi-from-routes")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Route manifest (YAML or JSON)
    #[arg(value_name = "MANIFEST")]
    pub manifest_path: PathBuf,

    /// Directory of Rust sources defining the payload types
    #[arg(short = 's', long = "source", value_name = "DIR")]
    pub source_dir: Option<PathBuf>,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Also write swagger.json and a Swagger UI page into this directory
    #[arg(long = "static-dir", value_name = "DIR")]
    pub static_dir: Option<PathBuf>,

    /// URL prefix the static directory is served under
    #[arg(long = "url-prefix", default_value = DEFAULT_URL_PREFIX)]
    pub url_prefix: String,

    /// API title (overrides the manifest)
    #[arg(long)]
    pub title: Option<String>,

    /// API version (overrides the manifest)
    #[arg(long = "api-version")]
    pub api_version: Option<String>,

    /// API description (overrides the manifest)
    #[arg(long)]
    pub description: Option<String>,

    /// Number of classified types to cache
    #[arg(long = "cache-capacity", default_value_t = DEFAULT_CACHE_CAPACITY)]
    pub cache_capacity: usize,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

/// Validate already-parsed arguments
pub fn validate_args(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.manifest_path.is_file() {
        bail!("Manifest not found: {}", args.manifest_path.display());
    }

    if let Some(source_dir) = &args.source_dir {
        if !source_dir.is_dir() {
            bail!("Source path is not a directory: {}", source_dir.display());
        }
    }

    info!("Manifest: {}", args.manifest_path.display());
    info!("Output format: {:?}", args.output_format);
    match &args.output_path {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }

    Ok(args)
}

/// Merge the manifest info with command line overrides
pub fn resolve_info(manifest_info: Option<Info>, args: &CliArgs) -> Info {
    let mut info = manifest_info.unwrap_or_default();
    if let Some(title) = &args.title {
        info.title = title.clone();
    }
    if let Some(version) = &args.api_version {
        info.version = version.clone();
    }
    if let Some(description) = &args.description {
        info.description = description.clone();
    }
    info
}

fn load_types(source_dir: Option<&Path>) -> Result<TypeResolver> {
    let Some(source_dir) = source_dir else {
        debug!("No source directory, payload types resolve from primitives only");
        return Ok(TypeResolver::default());
    };

    info!("Scanning {} for payload types...", source_dir.display());
    let scan_result = FileScanner::new(source_dir).scan()?;
    if scan_result.rust_files.is_empty() {
        warn!("No Rust files found in {}", source_dir.display());
    }

    let parsed_files = AstParser::parse_files(&scan_result.rust_files);
    info!(
        "Parsed {} of {} Rust files",
        parsed_files.len(),
        scan_result.rust_files.len()
    );

    Ok(TypeResolver::new(parsed_files))
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting OpenAPI document generation...");

    let manifest = Manifest::from_path(&args.manifest_path)?;
    let base_dir = args
        .manifest_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let mut resolver = load_types(args.source_dir.as_deref())?;
    let info = resolve_info(manifest.info.clone(), &args);
    let mut router = manifest.into_router(&mut resolver, &base_dir)?;

    let mut generator = SwaggerGenerator::with_cache_capacity(args.cache_capacity);
    let document = generator
        .generate(&router, &info)
        .context("Failed to generate OpenAPI document")?;
    info!(
        "Built OpenAPI document with {} paths",
        document.paths.len()
    );

    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    match &args.output_path {
        Some(output_path) => {
            write_to_file(&content, output_path)?;
            info!("Wrote OpenAPI document to {}", output_path.display());
        }
        None => println!("{}", content),
    }

    if let Some(static_dir) = &args.static_dir {
        let swagger_path = generator.register(&mut router, &info, static_dir, &args.url_prefix)?;
        info!(
            "Documentation bundle at {} served under {}",
            swagger_path.display(),
            args.url_prefix
        );
    }

    Ok(())
}
