use clap::{Parser, Subcommand, ValueEnum};

use crate::query::{FieldKind, parse_field_spec};

#[derive(Parser, Debug)]
#[command(name = "hospital-finder")]
#[command(about = "Hospital lookup API (nearest, name search, filtered listing)", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API.
    Serve(ServeArgs),
    /// Load hospitals from a JSON or NDJSON file into MongoDB and create indexes.
    Seed(SeedArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct MongoArgs {
    /// MongoDB connection string.
    #[arg(long = "mongodb-uri", env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub uri: String,

    #[arg(long, env = "MONGODB_DATABASE", default_value = "hospital_finder")]
    pub database: String,

    #[arg(long, env = "MONGODB_COLLECTION", default_value = "hospitals")]
    pub collection: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// MongoDB collection (requires a 2dsphere index, created on start-up).
    Mongo,
    /// In-process copy of --data-file; for local development.
    Memory,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub mongo: MongoArgs,

    #[arg(long, value_enum, default_value_t = StoreKind::Mongo)]
    pub store: StoreKind,

    /// Hospitals file (JSON array or NDJSON) backing the memory store.
    #[arg(long, required_if_eq("store", "memory"))]
    pub data_file: Option<String>,

    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, default_value_t = 8787)]
    pub port: u16,

    /// Extra filterable field as name:kind (kind: text, number, bool). Repeatable.
    #[arg(long = "filter-field", value_parser = parse_field_spec)]
    pub filter_fields: Vec<(String, FieldKind)>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SeedArgs {
    #[command(flatten)]
    pub mongo: MongoArgs,

    /// Hospitals file (JSON array or NDJSON).
    #[arg(long)]
    pub file: String,

    /// Drop the collection before inserting.
    #[arg(long)]
    pub drop: bool,
}
