use thiserror::Error;

/// Every message is meant to be shown to the user as is.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} introuvable (id {id})")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{0}")]
    Conflict(String),

    #[error("Stock insuffisant pour {product} au dépôt {depot} : demandé {requested}, disponible {available}")]
    InsufficientStock {
        product: String,
        depot: String,
        requested: i64,
        available: i64,
    },

    #[error("Erreur de base de données : {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Erreur lors de la génération du document : {0}")]
    Template(#[from] askama::Error),

    #[error("Erreur de fichier : {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Error::NotFound { entity, id }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        // Report the first message in field order so the toast is stable.
        let mut fields: Vec<_> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| (field.to_string(), errs))
            .collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let message = fields
            .iter()
            .flat_map(|(_, errs)| errs.iter())
            .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| errors.to_string());

        Error::Validation(message)
    }
}
