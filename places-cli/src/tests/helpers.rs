//! Test helpers for building catalogs and driving the CLI in-process.

use super::*;
use serde_json::Value;
use tempfile::TempDir;

/// Temporary workspace holding a database path and a catalog file.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    pub(super) fn database(&self) -> Utf8PathBuf {
        self.path("data/places.db")
    }

    /// Write `payload` as a catalog file and return its path.
    pub(super) fn write_catalog(&self, name: &str, payload: &Value) -> Utf8PathBuf {
        let path = self.path(name);
        let text = serde_json::to_string_pretty(payload).expect("serialize catalog");
        std::fs::write(&path, text).expect("write catalog");
        path
    }

    /// Run `places <args> --database <db>` and return its parsed stdout.
    pub(super) fn run(&self, args: &[&str]) -> Result<Value, CliError> {
        let mut argv = vec!["places".to_owned()];
        argv.extend(args.iter().map(|arg| (*arg).to_owned()));
        argv.extend([format!("--{ARG_DATABASE}"), self.database().into_string()]);
        let cli = Cli::try_parse_from(argv)?;
        let mut stdout = Vec::new();
        run_command(cli.command, &mut stdout)?;
        Ok(serde_json::from_slice(&stdout).expect("stdout is JSON"))
    }

    pub(super) fn run_ok(&self, args: &[&str]) -> Value {
        self.run(args)
            .unwrap_or_else(|err| panic!("places {args:?} failed: {err}"))
    }

    /// Ingest [`four_site_catalog`] and refresh every neighbour cache.
    pub(super) fn seeded(self) -> Self {
        let catalog = self.write_catalog("catalog.json", &four_site_catalog());
        self.run_ok(&["ingest", "--catalog", catalog.as_str()]);
        self.run_ok(&["refresh"]);
        self
    }
}

/// Four sites along the equator plus one distant museum.
///
/// From A the nearest order is D, B, C and the category matches are B and D.
pub(super) fn four_site_catalog() -> Value {
    serde_json::json!([
        { "id": "A", "name": "Plaza", "categories": ["food"], "latitude": 0.0, "longitude": 0.0 },
        { "id": "B", "name": "Market", "categories": ["food"], "latitude": 0.0, "longitude": 1.0 },
        { "id": "C", "name": "Gallery", "categories": ["museum"], "latitude": 10.0, "longitude": 10.0 },
        {
            "id": "D",
            "name": "Museum café",
            "description": "Coffee among the exhibits",
            "categories": ["food", "museum"],
            "latitude": 0.0,
            "longitude": 0.5
        }
    ])
}

/// Site ids of a JSON list of `{ "site_id": .. }` or `{ "id": .. }` entries,
/// or of a plain list of ids.
pub(super) fn ids(value: &Value) -> Vec<String> {
    value
        .as_array()
        .expect("JSON array")
        .iter()
        .map(|entry| {
            entry
                .get("site_id")
                .or_else(|| entry.get("id"))
                .unwrap_or(entry)
                .as_str()
                .expect("string id")
                .to_owned()
        })
        .collect()
}
