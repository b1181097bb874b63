/// Core error type for the relay engine.
///
/// The adapter crate maps transport failures into this type so the core
/// can handle outcomes consistently (user-facing notice vs logged fault).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// No admin identity configured; inquiries get a notice, nothing is relayed.
    #[error("admin is not configured")]
    NotConfigured,

    /// Neither direct lookup nor any fallback rule produced a recipient.
    #[error("recipient not found")]
    UnresolvedRecipient,

    /// The transport rejected a send (e.g. the recipient blocked the bot).
    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
