pub mod client;
pub mod fetcher;
pub mod host;
pub mod types;

pub use client::TelegramClient;
pub use fetcher::TelegramFetcher;
pub use host::BotHost;
pub use types::{Chat, Message, TelegramFile, Update, User, Voice};
