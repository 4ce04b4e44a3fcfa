pub mod null_store;
pub mod store_trait;
pub mod supabase;

pub use null_store::NullStore;
pub use store_trait::{ActivityStore, UserProfile, VOICE_MESSAGE_ACTION};
pub use supabase::SupabaseStore;
