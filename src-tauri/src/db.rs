use sama_core::purchase_form::PurchaseForm;
use sama_core::Database;
use std::path::PathBuf;
use std::sync::Mutex;
use tauri::{AppHandle, Manager};

const DB_FILE: &str = "sama_magasin.db";

/// Opens the database under the platform's app data directory.
pub fn open(app_handle: &AppHandle) -> Result<Database, String> {
    let app_dir = app_handle
        .path()
        .app_data_dir()
        .map_err(|e| format!("Dossier de données introuvable : {e}"))?;

    let db_path: PathBuf = app_dir.join(DB_FILE);
    Database::open(db_path).map_err(|e| e.to_string())
}

/// The purchase screen being edited. One per window.
pub struct FormState {
    pub form: Mutex<PurchaseForm>,
}

impl Default for FormState {
    fn default() -> Self {
        FormState {
            form: Mutex::new(PurchaseForm::new(chrono::Local::now().date_naive())),
        }
    }
}

pub trait DatabaseExt {
    fn db(&self) -> &Database;
    fn purchase_form(&self) -> &FormState;
}

impl DatabaseExt for AppHandle {
    fn db(&self) -> &Database {
        self.state::<Database>().inner()
    }

    fn purchase_form(&self) -> &FormState {
        self.state::<FormState>().inner()
    }
}
