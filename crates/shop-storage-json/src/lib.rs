use std::{
    cmp::Reverse,
    collections::BTreeMap,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shop_core::{
    storage::{counter_key, ensure_unique, highest_in, same_number},
    CoreError, InvoiceStore,
};
use shop_domain::{Invoice, InvoiceNumber};

pub const INVOICE_SCHEMA_VERSION: u32 = 1;
const INVOICES_FILE: &str = "invoices.json";
const COUNTERS_FILE: &str = "counters.json";
const JSON_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const DEFAULT_RETENTION: usize = 10;

#[derive(Debug, Serialize, Deserialize)]
struct InvoiceFile {
    schema_version: u32,
    #[serde(default)]
    invoices: Vec<Invoice>,
}

#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub path: PathBuf,
}

/// Filesystem-backed JSON persistence for invoices.
///
/// Layout under `root`: `invoices.json`, `counters.json` (next-sequence
/// counters keyed `<prefix>-<year>`) and `backups/`. Every read-modify-write
/// runs under one mutex and files are replaced atomically, so a single process
/// never loses updates. Separate processes sharing a root are not coordinated.
pub struct JsonInvoiceStore {
    root: PathBuf,
    retention: usize,
    guard: Mutex<()>,
}

impl JsonInvoiceStore {
    pub fn new(root: PathBuf) -> Result<Self, CoreError> {
        Self::with_retention(root, DEFAULT_RETENTION)
    }

    pub fn with_retention(root: PathBuf, retention: usize) -> Result<Self, CoreError> {
        fs::create_dir_all(root.join("backups"))?;
        Ok(Self {
            root,
            retention: retention.max(1),
            guard: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn invoices_path(&self) -> PathBuf {
        self.root.join(INVOICES_FILE)
    }

    pub fn counters_path(&self) -> PathBuf {
        self.root.join(COUNTERS_FILE)
    }

    fn backups_dir(&self) -> PathBuf {
        self.root.join("backups")
    }

    /// Copies the current invoice file into `backups/` and prunes old copies.
    pub fn backup(&self, note: Option<&str>) -> Result<BackupInfo, CoreError> {
        let _lock = self.lock()?;
        let invoices = self.read_invoices()?;
        let stamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let base = match sanitize_note(note) {
            Some(label) => format!("invoices_{label}_{stamp}"),
            None => format!("invoices_{stamp}"),
        };
        let (name, path) = self.free_backup_name(&base);
        write_json(&path, &invoice_file(invoices))?;
        self.prune_backups()?;
        Ok(BackupInfo {
            created_at: backup_timestamp(&name),
            name,
            path,
        })
    }

    /// Backups, newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>, CoreError> {
        let dir = self.backups_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(JSON_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(BackupInfo {
                    name: name.to_string(),
                    created_at: backup_timestamp(name),
                    path: path.clone(),
                });
            }
        }
        entries.sort_by_key(|info| {
            Reverse((info.created_at, backup_counter(&info.name), info.name.clone()))
        });
        Ok(entries)
    }

    /// `base.json`, or `base-N.json` with the first free N when backups share a second.
    fn free_backup_name(&self, base: &str) -> (String, PathBuf) {
        let dir = self.backups_dir();
        let mut name = format!("{base}.{JSON_EXTENSION}");
        let mut counter = 1u32;
        while dir.join(&name).exists() {
            counter += 1;
            name = format!("{base}-{counter}.{JSON_EXTENSION}");
        }
        let path = dir.join(&name);
        (name, path)
    }

    fn prune_backups(&self) -> Result<(), CoreError> {
        for stale in self.list_backups()?.into_iter().skip(self.retention) {
            fs::remove_file(stale.path)?;
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, CoreError> {
        self.guard
            .lock()
            .map_err(|_| CoreError::Storage("invoice store lock poisoned".into()))
    }

    fn read_invoices(&self) -> Result<Vec<Invoice>, CoreError> {
        let path = self.invoices_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file: InvoiceFile = read_json(&path)?;
        if file.schema_version > INVOICE_SCHEMA_VERSION {
            return Err(CoreError::Storage(format!(
                "invoice file schema {} is newer than supported {}",
                file.schema_version, INVOICE_SCHEMA_VERSION
            )));
        }
        Ok(file.invoices)
    }

    fn write_invoices(&self, invoices: Vec<Invoice>) -> Result<(), CoreError> {
        write_json(&self.invoices_path(), &invoice_file(invoices))
    }

    fn read_counters(&self) -> Result<BTreeMap<String, u32>, CoreError> {
        let path = self.counters_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        read_json(&path)
    }
}

impl InvoiceStore for JsonInvoiceStore {
    fn next_sequence(&self, prefix: &str, year: i32) -> Result<u32, CoreError> {
        let _lock = self.lock()?;
        let mut counters = self.read_counters()?;
        let key = counter_key(prefix, year);
        let current = match counters.get(&key) {
            Some(value) => *value,
            None => highest_in(&self.read_invoices()?, prefix, year).unwrap_or(0),
        };
        let next = current
            .checked_add(1)
            .ok_or_else(|| CoreError::Storage(format!("sequence exhausted for {key}")))?;
        counters.insert(key, next);
        write_json(&self.counters_path(), &counters)?;
        Ok(next)
    }

    fn highest_sequence(&self, prefix: &str, year: i32) -> Result<Option<u32>, CoreError> {
        let _lock = self.lock()?;
        Ok(highest_in(&self.read_invoices()?, prefix, year))
    }

    fn insert(&self, invoice: &Invoice) -> Result<(), CoreError> {
        let _lock = self.lock()?;
        let mut invoices = self.read_invoices()?;
        ensure_unique(&invoices, invoice)?;
        invoices.push(invoice.clone());
        self.write_invoices(invoices)
    }

    fn update(&self, invoice: &Invoice) -> Result<(), CoreError> {
        let _lock = self.lock()?;
        let mut invoices = self.read_invoices()?;
        let slot = invoices
            .iter_mut()
            .find(|existing| existing.id == invoice.id)
            .ok_or_else(|| CoreError::InvoiceNotFound(invoice.id.to_string()))?;
        *slot = invoice.clone();
        self.write_invoices(invoices)
    }

    fn get(&self, id: Uuid) -> Result<Option<Invoice>, CoreError> {
        let _lock = self.lock()?;
        Ok(self
            .read_invoices()?
            .into_iter()
            .find(|invoice| invoice.id == id))
    }

    fn find_by_number(&self, number: &InvoiceNumber) -> Result<Option<Invoice>, CoreError> {
        let _lock = self.lock()?;
        Ok(self
            .read_invoices()?
            .into_iter()
            .find(|invoice| same_number(&invoice.invoice_number, number)))
    }

    fn list(&self) -> Result<Vec<Invoice>, CoreError> {
        let _lock = self.lock()?;
        self.read_invoices()
    }
}

fn invoice_file(invoices: Vec<Invoice>) -> InvoiceFile {
    InvoiceFile {
        schema_version: INVOICE_SCHEMA_VERSION,
        invoices,
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, CoreError> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CoreError> {
    let json =
        serde_json::to_string_pretty(value).map_err(|err| CoreError::Serde(err.to_string()))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn sanitize_note(note: Option<&str>) -> Option<String> {
    let mut label = String::new();
    for ch in note?.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            label.push(ch.to_ascii_lowercase());
        } else if !label.is_empty() && !label.ends_with('-') {
            label.push('-');
        }
    }
    let label = label.trim_end_matches('-').to_string();
    (!label.is_empty()).then_some(label)
}

/// Splits a trailing `-N` collision counter off a backup file stem.
fn split_counter(stem: &str) -> (&str, u32) {
    match stem.rsplit_once('-') {
        Some((head, tail)) if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()) => {
            (head, tail.parse().unwrap_or(1))
        }
        _ => (stem, 1),
    }
}

fn backup_counter(name: &str) -> u32 {
    name.strip_suffix(&format!(".{JSON_EXTENSION}"))
        .map_or(1, |stem| split_counter(stem).1)
}

fn backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let (stem, _) = split_counter(name.strip_suffix(&format!(".{JSON_EXTENSION}"))?);
    let mut segments = stem.rsplitn(3, '_');
    let time = segments.next()?;
    let date = segments.next()?;
    if !is_digits(date, 8) || !is_digits(time, 6) {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{date}{time}"), "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}
