use clap::{Parser, Subcommand};
use natal_geo::config;
use natal_geo::location::{
    extract_country_from_location, format_coordinates_for_display, is_searchable_location,
    precision_level, validate_coordinates, BirthDataWithCoordinates, CoordinateSource,
    Coordinates, FallbackLookup, FallbackTable, GeocodingService, Resolution,
    MIN_LOCATION_SEARCH_LENGTH,
};
use natal_geo::logging;
use serde::Serialize;
use std::path::PathBuf;

/// natal-geo: coordinates for birth and event locations
///
/// Validates supplied coordinates and falls back to a table of known
/// places when they are missing or unusable.
///
/// Examples:
///   natal-geo resolve "Zamboanga del Sur, Philippines"
///   natal-geo resolve "Manila, Philippines" --lat 14.5995 --lon 120.9842
///   natal-geo validate --lat 0 --lon 0
///   natal-geo table --check
///   natal-geo serve --port 8080
#[derive(Parser)]
#[command(name = "natal-geo", version, about, long_about = None)]
struct Cli {
    /// Fallback table JSON file (overrides NATAL_GEO_TABLE and ~/.natal-geo/locations.json).
    #[arg(long, global = true)]
    table: Option<PathBuf>,

    /// Debug logging to stderr.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve coordinates for a birth location.
    Resolve {
        /// Free-text location, e.g. "Cebu, Philippines".
        location: String,

        /// Supplied latitude, if the location search returned one.
        #[arg(long, allow_hyphen_values = true, default_value = "")]
        lat: String,

        /// Supplied longitude, if the location search returned one.
        #[arg(long, allow_hyphen_values = true, default_value = "")]
        lon: String,

        /// Birth date (YYYY-MM-DD).
        #[arg(long, short = 'd', default_value = "")]
        date: String,

        /// Birth time (HH:MM).
        #[arg(long, short = 't', default_value = "")]
        time: String,
    },

    /// Validate a coordinate pair.
    Validate {
        #[arg(long, allow_hyphen_values = true)]
        lat: String,

        #[arg(long, allow_hyphen_values = true)]
        lon: String,
    },

    /// Look a location up in the fallback table only.
    Lookup { location: String },

    /// Inspect the fallback table.
    Table {
        /// Only entries with a keyword containing this text.
        #[arg(long)]
        keyword: Option<String>,

        /// Print summary counts.
        #[arg(long)]
        stats: bool,

        /// Print supported countries/regions.
        #[arg(long)]
        regions: bool,

        /// Validate the table; exit 1 on errors.
        #[arg(long)]
        check: bool,
    },

    /// Serve the JSON API.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, short = 'p', default_value_t = 8080)]
        port: u16,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let table = config::load_table(cli.table.as_deref()).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    match cli.command {
        Command::Resolve { location, lat, lon, date, time } => {
            let birth = BirthDataWithCoordinates {
                date_of_birth: date,
                time_of_birth: time,
                location_of_birth: location,
                coordinates: Coordinates::new(lat, lon),
            };
            run_resolve(GeocodingService::new(table), &birth);
        }
        Command::Validate { lat, lon } => {
            let coordinates = Coordinates::new(lat, lon);
            let result = validate_coordinates(&coordinates);
            eprintln!(
                "  \u{1F4D0} {} (precision {})",
                format_coordinates_for_display(&coordinates),
                precision_level(&coordinates)
            );
            print_json(&result);
            if !result.is_valid {
                std::process::exit(1);
            }
        }
        Command::Lookup { location } => {
            if !is_searchable_location(&location) {
                eprintln!(
                    "Error: Location must be at least {} characters",
                    MIN_LOCATION_SEARCH_LENGTH
                );
                std::process::exit(1);
            }
            match table.find_fallback_coordinates(&location) {
                Some(found) => print_json(&found),
                None => {
                    eprintln!("Error: No fallback entry matches '{}'", location);
                    std::process::exit(1);
                }
            }
        }
        Command::Table { keyword, stats, regions, check } => {
            run_table(&table, keyword.as_deref(), stats, regions, check);
        }
        Command::Serve { host, port } => {
            let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
                eprintln!("Error: Cannot start runtime: {}", e);
                std::process::exit(1);
            });
            let service = GeocodingService::new(table);
            if let Err(e) = runtime.block_on(natal_geo::server::start(&host, port, service)) {
                eprintln!("Server error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run_resolve(service: GeocodingService, birth: &BirthDataWithCoordinates) {
    let has_timing = !birth.date_of_birth.is_empty() || !birth.time_of_birth.is_empty();
    if has_timing && birth.birth_datetime().is_none() {
        eprintln!(
            "Error: Invalid birth date/time '{} {}'. Use YYYY-MM-DD and HH:MM.",
            birth.date_of_birth, birth.time_of_birth
        );
        std::process::exit(1);
    }

    let resolved = match service.process_coordinates(birth) {
        Resolution::Resolved(r) => r,
        unresolved @ Resolution::Unresolved { .. } => {
            if let Err(e) = unresolved.into_result() {
                eprintln!("Error: {}", e);
            }
            eprintln!();
            eprintln!("  The location is not in the fallback table. Pick it from the");
            eprintln!("  location search results, or pass --lat/--lon explicitly.");
            std::process::exit(1);
        }
    };

    // ── Banner ──────────────────────────────────────────────────

    let provenance = match (&resolved.source, &resolved.description) {
        (CoordinateSource::Fallback, Some(desc)) => format!("fallback: {}", desc),
        (source, _) => source.to_string(),
    };
    eprintln!("  \u{1F4CD} {}", birth.location_of_birth);
    eprintln!(
        "  \u{1F4D0} {} ({}, confidence {})",
        format_coordinates_for_display(&resolved.coordinates),
        provenance,
        resolved.validation_result.confidence
    );
    if let Some(country) = extract_country_from_location(&birth.location_of_birth) {
        eprintln!("  \u{1F30D} {}", country);
    }
    for warning in &resolved.validation_result.warnings {
        eprintln!("  \u{26A0}\u{FE0F}  {}", warning);
    }

    print_json(&resolved);
}

fn run_table(table: &FallbackTable, keyword: Option<&str>, stats: bool, regions: bool, check: bool) {
    if check {
        let result = table.validate_configuration();
        print_json(&result);
        if !result.is_valid {
            std::process::exit(1);
        }
        return;
    }
    if stats {
        print_json(&table.configuration_stats());
        return;
    }
    if regions {
        print_json(&table.supported_regions());
        return;
    }
    match keyword {
        Some(k) => print_json(&table.fallback_locations_by_keyword(k)),
        None => print_json(&table.locations()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: Cannot serialize output: {}", e);
            std::process::exit(1);
        }
    }
}
