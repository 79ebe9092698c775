use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Concordance resolver error: {0}")]
    Resolver(String),

    #[error("No concordances found for {0}")]
    NoConcordances(String),

    #[error("Multiple {authority} concordances found for {uuid}")]
    MultiplePrimaries { authority: String, uuid: String },

    #[error("Source store error: {0}")]
    Store(String),

    #[error("Primary source {0} missing from store")]
    CanonicalMissing(String),

    #[error("Graph writer returned {status}: {body}")]
    Writer { status: u16, body: String },

    #[error("Search writer returned {status}")]
    Search { status: u16 },

    #[error("Cache purger returned {status}")]
    Purger { status: u16 },

    #[error("Event queue error: {0}")]
    Events(String),

    #[error("Stream append error: {0}")]
    Stream(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
